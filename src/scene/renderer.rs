use serde::{Deserialize, Serialize};

use super::camera::PerspectiveCamera;
use super::SceneGraph;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Drawing backend owned by a [`super::SceneAdapter`].
pub trait Renderer: Send + 'static {
    fn set_size(&mut self, size: SurfaceSize);

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera);

    /// Releases GPU or other backend resources.
    fn dispose(&mut self);

    /// Removes the drawing surface from its host.
    fn detach(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderStats {
    pub frames: u64,
    pub triangles_last_frame: u64,
    pub objects_last_frame: usize,
    pub viewport: SurfaceSize,
    pub last_aspect: f32,
}

/// Renderer that draws nothing but records what it would have drawn.
#[derive(Debug, Clone)]
pub struct HeadlessRenderer {
    pub antialias: bool,
    pub clear_color: [f32; 4],
    stats: RenderStats,
    disposed: bool,
    attached: bool,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            antialias: true,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            stats: RenderStats::default(),
            disposed: false,
            attached: true,
        }
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl Renderer for HeadlessRenderer {
    fn set_size(&mut self, size: SurfaceSize) {
        self.stats.viewport = size;
    }

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) {
        if self.disposed {
            tracing::warn!("Render called on a disposed renderer");
            return;
        }

        self.stats.frames += 1;
        self.stats.objects_last_frame = scene.len();
        self.stats.triangles_last_frame = scene
            .meshes()
            .map(|mesh| u64::from(mesh.geometry.triangle_count()))
            .sum();
        self.stats.last_aspect = camera.aspect;
        tracing::trace!(frame = self.stats.frames, "Frame rendered");
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }

    fn detach(&mut self) {
        self.attached = false;
    }
}
