use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::client::FailurePolicy;

pub const DEFAULT_API_BASE_URL: &str = "https://web-production-8aaeb.up.railway.app";

/// Frame rates above this are clamped, keeping the frame interval at 1 ms or more.
pub const MAX_FPS: u32 = 1000;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Base URL of the toxicity prediction service
    #[arg(long, env = "NANOTOX_API_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Behaviour when a prediction cannot be obtained from the service
    #[arg(long, env = "ON_FAILURE", value_enum, default_value_t = FailurePolicy::Raise)]
    pub on_failure: FailurePolicy,

    /// Request timeout in seconds (transport default when unset)
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Submit one prediction and print the assessment as JSON
    Predict {
        /// Form value in the format "coreSize=20"; repeatable
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// JSON file holding a map of form field names to values
        #[arg(long)]
        form: Option<PathBuf>,
    },

    /// Check whether the prediction service is reachable
    Health,

    /// Send a message through the contact endpoint
    Contact {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        message: String,

        /// File whose name is attached to the message
        #[arg(long)]
        attachment: Option<PathBuf>,
    },

    /// Serve the JSON gateway consumed by the form pages
    Serve {
        /// Server host to bind to
        #[arg(long, env = "HOST", default_value = "127.0.0.1")]
        host: String,

        /// Server port to bind to
        #[arg(long, env = "PORT", default_value = "8000")]
        port: u16,
    },

    /// Run the headless 3D demo scene for a number of frames
    Scene {
        #[arg(long, default_value = "120")]
        frames: u32,

        #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=1000))]
        fps: u32,

        #[arg(long, default_value = "800")]
        width: u32,

        #[arg(long, default_value = "600")]
        height: u32,

        /// Surface width to switch to halfway through the run
        #[arg(long, requires = "resize_height")]
        resize_width: Option<u32>,

        /// Surface height to switch to halfway through the run
        #[arg(long, requires = "resize_width")]
        resize_height: Option<u32>,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {raw:?}"))?;
    if field.is_empty() {
        return Err(format!("empty field name in {raw:?}"));
    }
    Ok((field.to_string(), value.to_string()))
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub on_failure: FailurePolicy,
    pub request_timeout: Option<Duration>,
}

impl From<&Config> for ClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_base_url: config.api_base_url.clone(),
            on_failure: config.on_failure,
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub frame_interval: Duration,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl SceneConfig {
    pub fn from_fps(fps: u32) -> Self {
        Self {
            frame_interval: Duration::from_secs(1) / fps.clamp(1, MAX_FPS),
        }
    }
}

pub fn server_address(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_predict_fields() {
        let config = Config::try_parse_from([
            "nanotox",
            "--on-failure",
            "fallback",
            "predict",
            "--field",
            "coreSize=20",
            "--field",
            "proteinCorona=Present",
        ])
        .unwrap();

        assert_eq!(config.on_failure, FailurePolicy::Fallback);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        match config.command {
            Command::Predict { fields, form } => {
                assert_eq!(
                    fields,
                    vec![
                        ("coreSize".to_string(), "20".to_string()),
                        ("proteinCorona".to_string(), "Present".to_string()),
                    ]
                );
                assert!(form.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_field_without_value_separator() {
        assert!(Config::try_parse_from(["nanotox", "predict", "--field", "coreSize"]).is_err());
        assert_eq!(parse_field("zetaPotential=-30").unwrap().1, "-30");
        assert_eq!(parse_field("note=a=b").unwrap().1, "a=b");
    }

    #[test]
    fn client_config_from_cli() {
        let config = Config::try_parse_from([
            "nanotox",
            "--api-base-url",
            "http://localhost:9000",
            "--request-timeout-secs",
            "30",
            "health",
        ])
        .unwrap();
        let client = ClientConfig::from(&config);

        assert_eq!(client.api_base_url, "http://localhost:9000");
        assert_eq!(client.on_failure, FailurePolicy::Raise);
        assert_eq!(client.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn frame_interval_from_fps() {
        assert_eq!(SceneConfig::from_fps(50).frame_interval, Duration::from_millis(20));
        assert_eq!(SceneConfig::from_fps(0).frame_interval, Duration::from_secs(1));
        assert_eq!(SceneConfig::from_fps(u32::MAX).frame_interval, Duration::from_millis(1));
    }

    #[test]
    fn fps_outside_range_is_rejected() {
        assert!(Config::try_parse_from(["nanotox", "scene", "--fps", "0"]).is_err());
        assert!(Config::try_parse_from(["nanotox", "scene", "--fps", "4294967295"]).is_err());

        let config = Config::try_parse_from(["nanotox", "scene", "--fps", "1000"]).unwrap();
        assert!(matches!(config.command, Command::Scene { fps: 1000, .. }));
    }
}
