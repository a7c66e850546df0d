//! Water surface waves.
//!
//! Three Gerstner-style waves are summed in the water program's domain
//! stage. The editable quantity is each wave's heading angle; the 2D
//! direction the shader consumes is derived from it every frame.

use glam::Vec2;

pub const WAVE_COUNT: usize = 3;

/// Editable parameters of one wave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wave {
    pub amplitude: f32,
    pub frequency: f32,
    pub speed: f32,
    /// Heading in degrees.
    pub angle_deg: f32,
    pub steepness: f32,
}

impl Wave {
    /// `(sin a, cos a)` of the heading.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        let (sin, cos) = self.angle_deg.to_radians().sin_cos();
        Vec2::new(sin, cos)
    }
}

/// Per-frame snapshot of a wave as the shader sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveDescriptor {
    pub time: f32,
    pub amplitude: f32,
    pub frequency: f32,
    pub speed: f32,
    pub direction: Vec2,
    pub steepness: f32,
}

/// The three waves plus the shared clock.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveSet {
    pub waves: [Wave; WAVE_COUNT],
    time: f32,
}

impl Default for WaveSet {
    fn default() -> Self {
        Self {
            waves: [
                Wave {
                    amplitude: 0.186,
                    frequency: 0.59,
                    speed: 0.45,
                    angle_deg: 45.0,
                    steepness: 0.0,
                },
                Wave {
                    amplitude: 0.44,
                    frequency: 0.28,
                    speed: 1.0,
                    angle_deg: 245.0,
                    steepness: 1.0,
                },
                Wave {
                    amplitude: 0.28,
                    frequency: 0.91,
                    speed: 2.0,
                    angle_deg: 180.0,
                    steepness: 1.0,
                },
            ],
            time: 0.0,
        }
    }
}

impl WaveSet {
    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn descriptors(&self) -> [WaveDescriptor; WAVE_COUNT] {
        self.waves.map(|wave| WaveDescriptor {
            time: self.time,
            amplitude: wave.amplitude,
            frequency: wave.frequency,
            speed: wave.speed,
            direction: wave.direction(),
            steepness: wave.steepness,
        })
    }
}
