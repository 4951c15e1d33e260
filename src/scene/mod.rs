//! Lifecycle wrapper around a 3D scene for the demo page.
//!
//! A [`SceneAdapter`] owns a scene graph, a perspective camera and a
//! [`Renderer`]. It follows its drawing surface's size for as long as it
//! lives and renders on a fixed frame interval while animating:
//!
//! ```text
//! Constructed -> Animating <-> Stopped -> Disposed
//! ```
//!
//! Dropping the adapter disposes it.

mod camera;
mod mesh;
mod renderer;

pub use camera::PerspectiveCamera;
pub use mesh::{BasicMaterial, Geometry, Mesh};
pub use renderer::{HeadlessRenderer, RenderStats, Renderer, SurfaceSize};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::SceneConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(Uuid);

#[derive(Debug, Default)]
pub struct SceneGraph {
    objects: Vec<(ObjectId, Mesh)>,
}

impl SceneGraph {
    pub fn add(&mut self, mesh: Mesh) -> ObjectId {
        let id = ObjectId(Uuid::new_v4());
        self.objects.push((id, mesh));
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Mesh> {
        let index = self.objects.iter().position(|(object, _)| *object == id)?;
        Some(self.objects.remove(index).1)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Mesh> {
        self.objects
            .iter()
            .find(|(object, _)| *object == id)
            .map(|(_, mesh)| mesh)
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.objects.iter().map(|(_, mesh)| mesh)
    }

    pub fn meshes_mut(&mut self) -> impl Iterator<Item = &mut Mesh> {
        self.objects.iter_mut().map(|(_, mesh)| mesh)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Constructed,
    Animating,
    Stopped,
    Disposed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("surface has no drawable area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
    #[error("frame interval must be non-zero")]
    ZeroFrameInterval,
    #[error("scene has been disposed")]
    Disposed,
}

type FrameCallback = Box<dyn FnMut(&mut SceneGraph) + Send>;

struct Shared<R> {
    scene: SceneGraph,
    camera: PerspectiveCamera,
    renderer: R,
}

impl<R: Renderer> Shared<R> {
    fn resize(&mut self, size: SurfaceSize) {
        if size.is_empty() {
            tracing::debug!(?size, "Ignoring resize to an empty surface");
            return;
        }
        self.camera.aspect = size.aspect();
        self.camera.update_projection_matrix();
        self.renderer.set_size(size);
    }

    fn draw(&mut self, on_frame: &mut Option<FrameCallback>) {
        if let Some(on_frame) = on_frame {
            on_frame(&mut self.scene);
        }
        self.renderer.render(&self.scene, &self.camera);
    }
}

fn lock<R>(shared: &Mutex<Shared<R>>) -> MutexGuard<'_, Shared<R>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

struct AnimationLoop {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct SceneAdapter<R: Renderer> {
    shared: Arc<Mutex<Shared<R>>>,
    config: SceneConfig,
    resize_listener: Option<JoinHandle<()>>,
    animation: Option<AnimationLoop>,
    state: SceneState,
}

impl<R: Renderer> SceneAdapter<R> {
    /// Binds a renderer to `surface`. Every later value published on the
    /// surface is treated as a resize until the adapter is disposed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        mut surface: watch::Receiver<SurfaceSize>,
        mut renderer: R,
        config: SceneConfig,
    ) -> Result<Self, SceneError> {
        if config.frame_interval.is_zero() {
            return Err(SceneError::ZeroFrameInterval);
        }

        let size = *surface.borrow_and_update();
        if size.is_empty() {
            return Err(SceneError::EmptySurface {
                width: size.width,
                height: size.height,
            });
        }

        renderer.set_size(size);
        let shared = Arc::new(Mutex::new(Shared {
            scene: SceneGraph::default(),
            camera: PerspectiveCamera::with_aspect(size.aspect()),
            renderer,
        }));

        let listener_shared = Arc::clone(&shared);
        let resize_listener = tokio::spawn(async move {
            while surface.changed().await.is_ok() {
                let size = *surface.borrow_and_update();
                tracing::debug!(width = size.width, height = size.height, "Surface resized");
                lock(&listener_shared).resize(size);
            }
        });

        tracing::debug!(
            width = size.width,
            height = size.height,
            frame_interval = ?config.frame_interval,
            "Scene constructed"
        );

        Ok(Self {
            shared,
            config,
            resize_listener: Some(resize_listener),
            animation: None,
            state: SceneState::Constructed,
        })
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn add_object(&mut self, mesh: Mesh) -> Result<ObjectId, SceneError> {
        self.ensure_live()?;
        Ok(lock(&self.shared).scene.add(mesh))
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<Mesh> {
        lock(&self.shared).scene.remove(id)
    }

    pub fn start_animation(&mut self) -> Result<(), SceneError> {
        self.start(None)
    }

    /// Like [`Self::start_animation`], running `on_frame` before every render.
    pub fn start_animation_with<F>(&mut self, on_frame: F) -> Result<(), SceneError>
    where
        F: FnMut(&mut SceneGraph) + Send + 'static,
    {
        self.start(Some(Box::new(on_frame)))
    }

    fn start(&mut self, mut on_frame: Option<FrameCallback>) -> Result<(), SceneError> {
        self.ensure_live()?;
        if self.animation.is_some() {
            tracing::debug!("Animation already running, restarting");
            self.stop_animation();
        }

        lock(&self.shared).draw(&mut on_frame);

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let shared = Arc::clone(&self.shared);
        let period = self.config.frame_interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let mut shared = lock(&shared);
                        if token.is_cancelled() {
                            break;
                        }
                        shared.draw(&mut on_frame);
                    }
                }
            }
            tracing::trace!("Animation loop exited");
        });

        self.animation = Some(AnimationLoop { cancel, task });
        self.state = SceneState::Animating;
        Ok(())
    }

    /// Cancels the pending frame. No frame is rendered after this returns.
    pub fn stop_animation(&mut self) {
        let Some(animation) = self.animation.take() else {
            return;
        };

        animation.cancel.cancel();
        // Waits out a frame that is already drawing.
        drop(lock(&self.shared));
        drop(animation.task);

        if self.state == SceneState::Animating {
            self.state = SceneState::Stopped;
        }
    }

    pub fn dispose(&mut self) {
        if self.state == SceneState::Disposed {
            return;
        }

        self.stop_animation();
        if let Some(listener) = self.resize_listener.take() {
            listener.abort();
        }

        let mut shared = lock(&self.shared);
        shared.renderer.dispose();
        shared.renderer.detach();
        drop(shared);

        self.state = SceneState::Disposed;
        tracing::debug!("Scene disposed");
    }

    pub fn camera(&self) -> PerspectiveCamera {
        lock(&self.shared).camera.clone()
    }

    /// Runs `f` with the scene locked. Frames and resizes wait until it
    /// returns, so `f` must not call back into the adapter.
    pub fn with_scene<T>(&self, f: impl FnOnce(&SceneGraph) -> T) -> T {
        f(&lock(&self.shared).scene)
    }

    /// Same locking rules as [`Self::with_scene`].
    pub fn with_renderer<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&lock(&self.shared).renderer)
    }

    fn ensure_live(&self) -> Result<(), SceneError> {
        if self.state == SceneState::Disposed {
            Err(SceneError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl<R: Renderer> Drop for SceneAdapter<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}
