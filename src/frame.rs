//! Per-frame update: camera step, uniform packing, draw, re-arm.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::camera::{projection_matrix, CameraState, Viewport};
use crate::particles::{ParticleField, RenderParams, StarAttribute};

/// Everything the star shader reads per frame. Mirrors `FrameUniforms` in
/// `shaders/starfield.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    pub color_core: [f32; 3],
    pub morph_factor: f32,
    pub color_rim: [f32; 3],
    pub time: f32,
    pub speed: f32,
    pub base_size: f32,
    pub viewport: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Scalar(f32),
    Vec3([f32; 3]),
    Mat4([[f32; 4]; 4]),
}

impl FrameUniforms {
    pub fn new(camera: &CameraState, render: &RenderParams, viewport: Viewport) -> Self {
        Self {
            projection: projection_matrix(viewport.aspect()).to_cols_array_2d(),
            model_view: camera.view_matrix().to_cols_array_2d(),
            color_core: render.color_core_normalized(),
            morph_factor: render.morph_factor,
            color_rim: render.color_rim_normalized(),
            time: camera.time(),
            speed: render.speed,
            base_size: render.base_size,
            viewport: [viewport.width as f32, viewport.height as f32],
        }
    }

    /// The same values keyed by shader uniform name, for backends that bind
    /// uniforms one at a time.
    pub fn named_values(&self) -> [(&'static str, UniformValue); 8] {
        [
            ("u_mixFactor", UniformValue::Scalar(self.morph_factor)),
            ("u_time", UniformValue::Scalar(self.time)),
            ("u_speed", UniformValue::Scalar(self.speed)),
            ("u_baseSize", UniformValue::Scalar(self.base_size)),
            ("u_colorCore", UniformValue::Vec3(self.color_core)),
            ("u_colorRim", UniformValue::Vec3(self.color_rim)),
            ("u_projectionMatrix", UniformValue::Mat4(self.projection)),
            ("u_modelViewMatrix", UniformValue::Mat4(self.model_view)),
        ]
    }
}

/// Receives star data and draw requests.
pub trait StarBackend {
    /// Replaces the whole contents of one attribute buffer.
    fn upload_attribute(&mut self, attribute: StarAttribute, data: &[f32]);

    fn upload_field(&mut self, field: &ParticleField) {
        for attribute in StarAttribute::ALL {
            self.upload_attribute(attribute, field.attribute(attribute));
        }
    }

    fn clear(&mut self);

    fn set_uniforms(&mut self, uniforms: &FrameUniforms);

    /// Draws `count` stars from the currently uploaded buffers.
    fn draw_points(&mut self, count: u32);
}

/// "Run me again on the next refresh."
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

#[derive(Debug, Default)]
pub struct FrameDriver {
    frames: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame and re-arms the scheduler. Returns the uniforms that
    /// were sent to the backend.
    pub fn run_frame<B, S>(
        &mut self,
        camera: &mut CameraState,
        render: &RenderParams,
        viewport: Viewport,
        star_count: u32,
        backend: &mut B,
        scheduler: &mut S,
    ) -> FrameUniforms
    where
        B: StarBackend + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        backend.clear();
        camera.advance();

        let uniforms = FrameUniforms::new(camera, render, viewport);
        backend.set_uniforms(&uniforms);
        backend.draw_points(star_count);

        self.frames += 1;
        if self.frames % 600 == 0 {
            tracing::trace!(frames = self.frames, time = camera.time(), "frame heartbeat");
        }

        scheduler.request_frame();
        uniforms
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Upload { attribute: StarAttribute, len: usize },
    Clear,
    Uniforms(FrameUniforms),
    Draw(u32),
}

/// In-memory backend that keeps uploaded buffers and a log of every call.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    buffers: HashMap<StarAttribute, Vec<f32>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self, attribute: StarAttribute) -> Option<&[f32]> {
        self.buffers.get(&attribute).map(Vec::as_slice)
    }

    pub fn last_uniforms(&self) -> Option<&FrameUniforms> {
        self.calls.iter().rev().find_map(|call| match call {
            BackendCall::Uniforms(u) => Some(u),
            _ => None,
        })
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Draw(_)))
            .count()
    }
}

impl StarBackend for RecordingBackend {
    fn upload_attribute(&mut self, attribute: StarAttribute, data: &[f32]) {
        self.buffers.insert(attribute, data.to_vec());
        self.calls.push(BackendCall::Upload {
            attribute,
            len: data.len(),
        });
    }

    fn clear(&mut self) {
        self.calls.push(BackendCall::Clear);
    }

    fn set_uniforms(&mut self, uniforms: &FrameUniforms) {
        self.calls.push(BackendCall::Uniforms(*uniforms));
    }

    fn draw_points(&mut self, count: u32) {
        self.calls.push(BackendCall::Draw(count));
    }
}

/// Scheduler for hosts that pump frames themselves (tests, headless runs).
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: bool,
    requested: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the pending request, if any.
    pub fn take_request(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.pending = true;
        self.requested += 1;
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::{
        BackendCall, FrameDriver, FrameUniforms, ManualScheduler, RecordingBackend, UniformValue,
    };
    use crate::camera::{CameraState, Viewport};
    use crate::particles::RenderParams;

    #[test]
    fn frame_uniforms_are_176_bytes() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 176);
    }

    #[test]
    fn frame_steps_run_in_order_and_rearm() {
        let mut driver = FrameDriver::new();
        let mut camera = CameraState::new();
        let mut backend = RecordingBackend::new();
        let mut scheduler = ManualScheduler::new();

        driver.run_frame(
            &mut camera,
            &RenderParams::default(),
            Viewport::new(1280, 720),
            42,
            &mut backend,
            &mut scheduler,
        );

        assert_eq!(backend.calls.len(), 3);
        assert_eq!(backend.calls[0], BackendCall::Clear);
        assert!(matches!(backend.calls[1], BackendCall::Uniforms(_)));
        assert_eq!(backend.calls[2], BackendCall::Draw(42));
        assert!(scheduler.take_request());
        assert!(!scheduler.take_request());
        assert_eq!(driver.frames(), 1);
    }

    #[test]
    fn uniforms_carry_render_params() {
        let mut camera = CameraState::new();
        camera.set_pointer_target(Vec2::new(0.3, 0.3));
        let render = RenderParams {
            morph_factor: 0.25,
            speed: 120.0,
            base_size: 7.0,
            color_core: [255, 255, 255],
            color_rim: [0, 0, 255],
        };
        let mut backend = RecordingBackend::new();
        let uniforms = FrameDriver::new().run_frame(
            &mut camera,
            &render,
            Viewport::new(100, 100),
            1,
            &mut backend,
            &mut ManualScheduler::new(),
        );

        assert_eq!(uniforms.morph_factor, 0.25);
        assert_eq!(uniforms.speed, 120.0);
        assert_eq!(uniforms.base_size, 7.0);
        assert_eq!(uniforms.color_core, [1.0, 1.0, 1.0]);
        assert_eq!(uniforms.color_rim, [0.0, 0.0, 1.0]);
        assert!((uniforms.time - 0.01).abs() < 1e-7);
        assert_eq!(backend.last_uniforms(), Some(&uniforms));

        let named = uniforms.named_values();
        assert_eq!(named[0], ("u_mixFactor", UniformValue::Scalar(0.25)));
        assert_eq!(named[7].0, "u_modelViewMatrix");
    }
}
