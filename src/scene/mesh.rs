pub const DEFAULT_OPACITY: f32 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Box {
        size: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
}

impl Geometry {
    pub fn triangle_count(&self) -> u32 {
        match *self {
            Geometry::Box { .. } => 12,
            // The pole rows collapse to a single triangle per segment.
            Geometry::Sphere {
                width_segments,
                height_segments,
                ..
            } => width_segments * (2 * height_segments).saturating_sub(2),
            Geometry::Torus {
                radial_segments,
                tubular_segments,
                ..
            } => 2 * radial_segments * tubular_segments,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicMaterial {
    pub color: u32,
    pub wireframe: bool,
    pub transparent: bool,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: BasicMaterial,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

impl Mesh {
    pub fn basic(geometry: Geometry, color: u32, wireframe: bool) -> Self {
        Self {
            geometry,
            material: BasicMaterial {
                color,
                wireframe,
                transparent: true,
                opacity: DEFAULT_OPACITY,
            },
            position: [0.0; 3],
            rotation: [0.0; 3],
        }
    }

    pub fn cube(size: f32, color: u32) -> Self {
        Self::basic(Geometry::Box { size }, color, false)
    }

    pub fn sphere(radius: f32, color: u32) -> Self {
        Self::basic(
            Geometry::Sphere {
                radius,
                width_segments: 32,
                height_segments: 32,
            },
            color,
            false,
        )
    }

    pub fn torus(radius: f32, tube: f32, color: u32) -> Self {
        Self::basic(
            Geometry::Torus {
                radius,
                tube,
                radial_segments: 16,
                tubular_segments: 100,
            },
            color,
            false,
        )
    }

    pub fn at(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn rotate(&mut self, delta: [f32; 3]) {
        for (angle, delta) in self.rotation.iter_mut().zip(delta) {
            *angle = (*angle + delta) % std::f32::consts::TAU;
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::cube(1.0, 0x00ff00)
    }
}
