//! Pointer-driven camera: smoothed look-around plus a slow continuous roll.

use glam::{Mat4, Vec2};

/// Time added per frame. Animation speed is tied to frame rate.
pub const FIXED_TIME_STEP: f32 = 0.01;
/// Fraction of the remaining pointer distance closed each frame.
pub const POINTER_SMOOTHING: f32 = 0.05;
pub const FOV_Y_DEGREES: f32 = 60.0;
pub const NEAR_PLANE: f32 = 1.0;
pub const FAR_PLANE: f32 = 4000.0;
/// Degrees of yaw/pitch at full pointer deflection.
pub const POINTER_LOOK_DEGREES: f32 = 20.0;
pub const ROLL_DEGREES_PER_TIME: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Maps a cursor position in pixels to `[-1, 1]` on both axes.
/// The y axis is not flipped: the top edge maps to -1.
pub fn normalize_pointer(x: f64, y: f64, viewport: Viewport) -> Vec2 {
    let w = viewport.width.max(1) as f64;
    let h = viewport.height.max(1) as f64;
    Vec2::new((x / w * 2.0 - 1.0) as f32, (y / h * 2.0 - 1.0) as f32)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraState {
    raw_pointer: Vec2,
    smoothed_pointer: Vec2,
    time: f32,
}

impl CameraState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pointer_target(&mut self, target: Vec2) {
        self.raw_pointer = target;
    }

    pub fn raw_pointer(&self) -> Vec2 {
        self.raw_pointer
    }

    pub fn smoothed_pointer(&self) -> Vec2 {
        self.smoothed_pointer
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// One frame of state: advance the clock, then ease the smoothed pointer
    /// toward the raw pointer.
    pub fn advance(&mut self) {
        self.time += FIXED_TIME_STEP;
        self.smoothed_pointer += (self.raw_pointer - self.smoothed_pointer) * POINTER_SMOOTHING;
    }

    /// Yaw, then pitch, then roll, composed left to right.
    pub fn view_matrix(&self) -> Mat4 {
        let yaw = (-self.smoothed_pointer.x * POINTER_LOOK_DEGREES).to_radians();
        let pitch = (-self.smoothed_pointer.y * POINTER_LOOK_DEGREES).to_radians();
        let roll = (self.time * ROLL_DEGREES_PER_TIME).to_radians();
        Mat4::IDENTITY
            * Mat4::from_rotation_y(yaw)
            * Mat4::from_rotation_x(pitch)
            * Mat4::from_rotation_z(roll)
    }
}

pub fn projection_matrix(aspect: f32) -> Mat4 {
    Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
}
