//! Control-panel state. Widgets write through setters; generation changes
//! are held until the interaction finishes.

use std::ops::RangeInclusive;

use crate::particles::{GenerationParams, RenderParams};

pub const CLUSTER_COUNT_RANGE: RangeInclusive<u32> = 1..=200;
pub const CLUSTER_SPREAD_RANGE: RangeInclusive<f32> = 100.0..=1000.0;
pub const FRACTAL_POWER_RANGE: RangeInclusive<f32> = 1.0..=5.0;
pub const MORPH_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const MORPH_STEP: f32 = 0.01;
pub const SPEED_RANGE: RangeInclusive<f32> = 0.0..=300.0;
pub const BASE_SIZE_RANGE: RangeInclusive<f32> = 1.0..=30.0;

#[derive(Debug, Clone)]
pub struct ControlPanel {
    generation: GenerationParams,
    render: RenderParams,
    pending_generation: bool,
}

impl ControlPanel {
    pub fn new(generation: GenerationParams, render: RenderParams) -> Self {
        Self {
            generation,
            render,
            pending_generation: false,
        }
    }

    pub fn generation(&self) -> &GenerationParams {
        &self.generation
    }

    pub fn render(&self) -> &RenderParams {
        &self.render
    }

    pub fn has_pending_generation(&self) -> bool {
        self.pending_generation
    }

    pub fn set_cluster_count(&mut self, count: u32) {
        let count = count.clamp(*CLUSTER_COUNT_RANGE.start(), *CLUSTER_COUNT_RANGE.end());
        if count != self.generation.cluster_count {
            self.generation.cluster_count = count;
            self.pending_generation = true;
        }
    }

    pub fn set_cluster_spread(&mut self, spread: f32) {
        if let Some(spread) = clamp_finite("cluster_spread", spread, &CLUSTER_SPREAD_RANGE) {
            if spread != self.generation.cluster_spread {
                self.generation.cluster_spread = spread;
                self.pending_generation = true;
            }
        }
    }

    pub fn set_fractal_power(&mut self, power: f32) {
        if let Some(power) = clamp_finite("fractal_power", power, &FRACTAL_POWER_RANGE) {
            if power != self.generation.fractal_power {
                self.generation.fractal_power = power;
                self.pending_generation = true;
            }
        }
    }

    /// Interaction on a generation control ended. Returns the parameters to
    /// regenerate with, once per committed change.
    pub fn finish_change(&mut self) -> Option<GenerationParams> {
        if std::mem::take(&mut self.pending_generation) {
            tracing::info!(
                cluster_count = self.generation.cluster_count,
                cluster_spread = self.generation.cluster_spread,
                fractal_power = self.generation.fractal_power,
                "generation parameters committed"
            );
            Some(self.generation)
        } else {
            None
        }
    }

    pub fn set_morph_factor(&mut self, morph: f32) {
        if let Some(morph) = clamp_finite("morph_factor", morph, &MORPH_RANGE) {
            self.render.morph_factor = (morph / MORPH_STEP).round() * MORPH_STEP;
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        if let Some(speed) = clamp_finite("speed", speed, &SPEED_RANGE) {
            self.render.speed = speed;
        }
    }

    pub fn set_base_size(&mut self, size: f32) {
        if let Some(size) = clamp_finite("base_size", size, &BASE_SIZE_RANGE) {
            self.render.base_size = size;
        }
    }

    pub fn set_color_core(&mut self, rgb: [u8; 3]) {
        self.render.color_core = rgb;
    }

    pub fn set_color_rim(&mut self, rgb: [u8; 3]) {
        self.render.color_rim = rgb;
    }
}

fn clamp_finite(name: &str, value: f32, range: &RangeInclusive<f32>) -> Option<f32> {
    if !value.is_finite() {
        tracing::warn!(control = name, value, "ignoring non-finite control value");
        return None;
    }
    Some(value.clamp(*range.start(), *range.end()))
}

#[cfg(test)]
mod tests {
    use super::ControlPanel;
    use crate::particles::{GenerationParams, RenderParams};

    fn panel() -> ControlPanel {
        ControlPanel::new(GenerationParams::default(), RenderParams::default())
    }

    #[test]
    fn generation_change_commits_once() {
        let mut panel = panel();
        panel.set_cluster_count(120);
        panel.set_cluster_count(121);
        assert!(panel.has_pending_generation());

        let committed = panel.finish_change().unwrap();
        assert_eq!(committed.cluster_count, 121);
        assert!(panel.finish_change().is_none());
    }

    #[test]
    fn unchanged_value_does_not_mark_pending() {
        let mut panel = panel();
        panel.set_fractal_power(GenerationParams::default().fractal_power);
        assert!(panel.finish_change().is_none());
    }

    #[test]
    fn setters_clamp_to_slider_ranges() {
        let mut panel = panel();
        panel.set_cluster_count(0);
        panel.set_cluster_spread(5_000.0);
        panel.set_fractal_power(0.2);
        panel.set_speed(-4.0);
        panel.set_base_size(99.0);

        let generation = panel.generation();
        assert_eq!(generation.cluster_count, 1);
        assert_eq!(generation.cluster_spread, 1000.0);
        assert_eq!(generation.fractal_power, 1.0);
        assert_eq!(panel.render().speed, 0.0);
        assert_eq!(panel.render().base_size, 30.0);
    }

    #[test]
    fn render_changes_never_request_regeneration() {
        let mut panel = panel();
        panel.set_morph_factor(0.333);
        panel.set_color_core([1, 2, 3]);
        panel.set_color_rim([4, 5, 6]);
        assert!(!panel.has_pending_generation());
        assert!((panel.render().morph_factor - 0.33).abs() < 1e-6);
        assert_eq!(panel.render().color_rim, [4, 5, 6]);
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let mut panel = panel();
        panel.set_cluster_spread(f32::NAN);
        panel.set_speed(f32::INFINITY);
        assert_eq!(panel.generation().cluster_spread, 350.0);
        assert_eq!(panel.render().speed, 30.0);
        assert!(!panel.has_pending_generation());
    }
}
