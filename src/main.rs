use std::path::Path;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use nanotox::client::{HttpPredictionClient, PredictionService};
use nanotox::config::{ClientConfig, Command, Config, SceneConfig, server_address};
use nanotox::contact::{ContactForm, ContactService};
use nanotox::form::FormData;
use nanotox::scene::{HeadlessRenderer, Mesh, SceneAdapter, SurfaceSize};
use nanotox::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,nanotox=debug".into());
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::debug!("Starting with config: {:?}", config);

    let client_config = ClientConfig::from(&config);

    match config.command {
        Command::Predict { fields, form } => {
            let client = HttpPredictionClient::new(&client_config)?;
            let form = load_form(form.as_deref(), fields)?;

            match client.predict(&form).await {
                Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                Err(err) => bail!("{}", err.user_message()),
            }
        }
        Command::Health => {
            let client = HttpPredictionClient::new(&client_config)?;
            if !client.check_health().await {
                bail!("Prediction service at {} is unhealthy", client_config.api_base_url);
            }
            println!("healthy");
        }
        Command::Contact {
            name,
            email,
            message,
            attachment,
        } => {
            let client = HttpPredictionClient::new(&client_config)?;
            let outcome = client
                .submit_contact(&ContactForm {
                    name,
                    email,
                    message,
                    attachment,
                })
                .await;
            if !outcome.success {
                bail!("{}", outcome.message);
            }
            println!("{}", outcome.message);
        }
        Command::Serve { host, port } => {
            let client = HttpPredictionClient::new(&client_config)?;
            tracing::info!(
                api_base_url = %client_config.api_base_url,
                policy = ?client.policy(),
                "Prediction client created"
            );
            server::serve(&server_address(&host, port), AppState::from_client(client)).await?;
        }
        Command::Scene {
            frames,
            fps,
            width,
            height,
            resize_width,
            resize_height,
        } => {
            let resize = resize_width.zip(resize_height);
            run_scene(frames, SceneConfig::from_fps(fps), SurfaceSize::new(width, height), resize)
                .await?;
        }
    }

    Ok(())
}

/// Merges an optional JSON form file with `--field` overrides.
fn load_form(path: Option<&Path>, fields: Vec<(String, String)>) -> anyhow::Result<FormData> {
    let mut form = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading form file {}", path.display()))?;
            serde_json::from_str::<FormData>(&raw)
                .with_context(|| format!("parsing form file {}", path.display()))?
        }
        None => FormData::new(),
    };

    for (field, value) in fields {
        form.insert(field, value);
    }

    if form.is_empty() {
        bail!("No form values given; pass --form or --field");
    }
    Ok(form)
}

async fn run_scene(
    frames: u32,
    scene_config: SceneConfig,
    size: SurfaceSize,
    resize: Option<(u32, u32)>,
) -> anyhow::Result<()> {
    let frame_interval = scene_config.frame_interval;
    let (surface, surface_rx) = watch::channel(size);

    let mut scene = SceneAdapter::new(surface_rx, HeadlessRenderer::new(), scene_config)?;
    scene.add_object(Mesh::cube(1.0, 0x00ff00).at([-2.5, 0.0, 0.0]))?;
    scene.add_object(Mesh::sphere(1.0, 0x0077ff))?;
    scene.add_object(Mesh::torus(1.0, 0.4, 0xff7700).at([2.5, 0.0, 0.0]))?;

    scene.start_animation_with(|scene| {
        for mesh in scene.meshes_mut() {
            mesh.rotate([0.01, 0.01, 0.0]);
        }
    })?;
    tracing::info!(frames, ?frame_interval, "Demo scene animating");

    let first_half = frames / 2;
    tokio::time::sleep(frame_interval * first_half).await;
    if let Some((width, height)) = resize {
        tracing::info!(width, height, "Resizing surface");
        surface.send_replace(SurfaceSize::new(width, height));
    }
    tokio::time::sleep(frame_interval * (frames - first_half)).await;

    scene.stop_animation();
    let stats = scene.with_renderer(|renderer| renderer.stats().clone());
    scene.dispose();

    tracing::info!(frames = stats.frames, "Demo scene finished");
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
