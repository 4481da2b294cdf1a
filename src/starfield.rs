//! Ties the generator, field store, camera and controls together behind the
//! handful of entry points the host calls.

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;

use crate::camera::{normalize_pointer, CameraState, Viewport};
use crate::config::StarfieldConfig;
use crate::controls::ControlPanel;
use crate::error::ConfigResult;
use crate::frame::{FrameDriver, FrameScheduler, FrameUniforms, StarBackend};
use crate::particles::{FieldStore, GenerationParams, ParticleField};

pub struct Starfield<R: Rng> {
    star_count: u32,
    rng: R,
    store: FieldStore,
    camera: CameraState,
    viewport: Viewport,
    controls: ControlPanel,
    driver: FrameDriver,
}

impl<R: Rng> Starfield<R> {
    /// Validates `config` and generates the initial field. Nothing is uploaded
    /// until [`Starfield::upload`] or a regeneration.
    pub fn new(config: &StarfieldConfig, mut rng: R) -> ConfigResult<Self> {
        config.validate()?;
        let star_count = config.star_count();
        let field = ParticleField::generate(star_count, &config.generation, &mut rng)?;
        tracing::info!(star_count, "star field created");

        Ok(Self {
            star_count,
            rng,
            store: FieldStore::new(field),
            camera: CameraState::new(),
            viewport: Viewport::new(config.window.width, config.window.height),
            controls: ControlPanel::new(config.generation, config.render),
            driver: FrameDriver::new(),
        })
    }

    pub fn star_count(&self) -> u32 {
        self.star_count
    }

    pub fn field(&self) -> Arc<ParticleField> {
        self.store.snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn controls(&self) -> &ControlPanel {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut ControlPanel {
        &mut self.controls
    }

    /// Pushes the current field to the backend in full.
    pub fn upload<B: StarBackend + ?Sized>(&self, backend: &mut B) {
        backend.upload_field(self.store.current());
    }

    /// Rebuilds both arrangements with `params` and uploads them before
    /// returning, so the next frame only ever sees a complete field.
    fn regenerate_with<B: StarBackend + ?Sized>(
        &mut self,
        params: &GenerationParams,
        backend: &mut B,
    ) -> ConfigResult<()> {
        let field = ParticleField::generate(self.star_count, params, &mut self.rng)?;
        backend.upload_field(&field);
        self.store.replace(field);
        tracing::debug!(revision = self.store.revision(), "field regenerated");
        Ok(())
    }

    pub fn regenerate<B: StarBackend + ?Sized>(&mut self, backend: &mut B) -> ConfigResult<()> {
        let params = *self.controls.generation();
        self.regenerate_with(&params, backend)
    }

    /// Called when a control interaction ends. Returns whether the field
    /// was regenerated.
    pub fn commit_controls<B>(&mut self, backend: &mut B) -> ConfigResult<bool>
    where
        B: StarBackend + ?Sized,
    {
        match self.controls.finish_change() {
            Some(params) => {
                self.regenerate_with(&params, backend)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Pointer target already normalized to `[-1, 1]`.
    pub fn set_pointer(&mut self, target: Vec2) {
        self.camera.set_pointer_target(target);
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.camera.set_pointer_target(normalize_pointer(x, y, self.viewport));
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
    }

    pub fn frame<B, S>(&mut self, backend: &mut B, scheduler: &mut S) -> FrameUniforms
    where
        B: StarBackend + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        self.driver.run_frame(
            &mut self.camera,
            self.controls.render(),
            self.viewport,
            self.star_count,
            backend,
            scheduler,
        )
    }
}
