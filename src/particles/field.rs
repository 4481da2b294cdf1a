use std::f64::consts::PI;
use std::time::Instant;

use rand::Rng;

use super::config::GenerationParams;
use super::layout::StarAttribute;
use crate::error::{ConfigError, ConfigResult};

/// Side length of the grid cube in world units.
pub const GRID_EXTENT: f64 = 2200.0;
pub const GRID_OFFSET: f64 = 1100.0;
/// Full width of the per-axis grid jitter, i.e. +/-25 units.
pub const GRID_JITTER: f64 = 50.0;
/// Cluster centers land in roughly `[-2700, 900]` per axis.
pub const CLUSTER_FIELD_EXTENT: f64 = 1800.0;

/// Lattice used by the uniform arrangement.
///
/// `dim` is the exact cube root of the star count. For counts that are not
/// perfect cubes the float modulo leaves the lattice off-integer and the last
/// layer partially filled, which is accepted as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub dim: f64,
    pub spacing: f64,
    pub offset: f64,
}

impl GridLayout {
    pub fn for_count(count: u32) -> Self {
        let dim = (count as f64).cbrt();
        Self {
            dim,
            spacing: GRID_EXTENT / dim,
            offset: GRID_OFFSET,
        }
    }

    /// Pre-jitter grid position of star `index`.
    pub fn lattice_point(&self, index: u32) -> [f64; 3] {
        let i = index as f64;
        let d = self.dim;
        [
            (i % d) * self.spacing - self.offset,
            ((i / d).floor() % d) * self.spacing - self.offset,
            (i / (d * d)).floor() * self.spacing - self.offset,
        ]
    }
}

/// Stable pseudo-center of a cluster, hashed from its id through `sin`/`cos`.
///
/// Evaluated in `f64`: arguments reach tens of millions, where `f32` has no
/// fractional precision left and the hash would change.
pub fn cluster_center(cluster_id: u32) -> [f64; 3] {
    let id = cluster_id as f64;
    [
        ((id * 43758.5453).sin() - 0.5) * CLUSTER_FIELD_EXTENT,
        ((id * 23421.6312).cos() - 0.5) * CLUSTER_FIELD_EXTENT,
        ((id * 87654.1234).sin() - 0.5) * CLUSTER_FIELD_EXTENT,
    ]
}

/// One star of the cluster arrangement together with the values it was
/// derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterStar {
    pub cluster_id: u32,
    pub radius: f64,
    pub position: [f64; 3],
    pub size: f64,
    pub color_variation: f64,
}

/// Draws one cluster star. Consumes exactly six uniform samples, in the
/// order cluster id, radius, theta, phi, size, color variation.
pub fn sample_cluster_star<R: Rng + ?Sized>(params: &GenerationParams, rng: &mut R) -> ClusterStar {
    let spread = params.cluster_spread as f64;

    let cluster_id = (rng.gen::<f64>() * params.cluster_count as f64).floor() as u32;
    let center = cluster_center(cluster_id);

    let radius = rng.gen::<f64>().powf(params.fractal_power as f64) * spread;

    // phi is drawn uniformly, not by solid angle, so stars bunch at the poles.
    let theta = rng.gen::<f64>() * PI * 2.0;
    let phi = rng.gen::<f64>() * PI;

    let position = [
        center[0] + radius * phi.sin() * theta.cos(),
        center[1] + radius * phi.sin() * theta.sin(),
        center[2] + radius * phi.cos(),
    ];

    let dist_factor = 1.0 - radius / spread;
    let size = rng.gen::<f64>() * 1.5 + 0.5 + dist_factor * 2.0;
    let color_variation = rng.gen::<f64>();

    ClusterStar {
        cluster_id,
        radius,
        position,
        size,
        color_variation,
    }
}

/// Immutable snapshot of every per-star attribute array.
///
/// Index `i` addresses the same star in all four arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    positions_uniform: Vec<f32>,
    positions_fractal: Vec<f32>,
    sizes: Vec<f32>,
    color_variations: Vec<f32>,
}

impl ParticleField {
    /// Builds both arrangements for `count` stars.
    ///
    /// The grid pass runs over all stars before the cluster pass; a seeded
    /// `rng` therefore reproduces the field exactly.
    pub fn generate<R: Rng + ?Sized>(
        count: u32,
        params: &GenerationParams,
        rng: &mut R,
    ) -> ConfigResult<Self> {
        if count == 0 {
            return Err(ConfigError::Validation(
                "particle count must be at least 1".to_string(),
            ));
        }
        params.validate()?;

        let started = Instant::now();
        let n = count as usize;
        let mut positions_uniform = Vec::with_capacity(n * 3);
        let mut positions_fractal = Vec::with_capacity(n * 3);
        let mut sizes = Vec::with_capacity(n);
        let mut color_variations = Vec::with_capacity(n);

        let grid = GridLayout::for_count(count);
        for i in 0..count {
            for axis in grid.lattice_point(i) {
                let jitter = (rng.gen::<f64>() - 0.5) * GRID_JITTER;
                positions_uniform.push((axis + jitter) as f32);
            }
        }

        for _ in 0..count {
            let star = sample_cluster_star(params, rng);
            positions_fractal.extend(star.position.iter().map(|v| *v as f32));
            sizes.push(star.size as f32);
            color_variations.push(star.color_variation as f32);
        }

        tracing::debug!(
            count,
            cluster_count = params.cluster_count,
            cluster_spread = params.cluster_spread,
            fractal_power = params.fractal_power,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "generated particle field"
        );

        Ok(Self {
            positions_uniform,
            positions_fractal,
            sizes,
            color_variations,
        })
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn positions_uniform(&self) -> &[f32] {
        &self.positions_uniform
    }

    pub fn positions_fractal(&self) -> &[f32] {
        &self.positions_fractal
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn color_variations(&self) -> &[f32] {
        &self.color_variations
    }

    pub fn attribute(&self, attribute: StarAttribute) -> &[f32] {
        match attribute {
            StarAttribute::PositionUniform => &self.positions_uniform,
            StarAttribute::PositionFractal => &self.positions_fractal,
            StarAttribute::Size => &self.sizes,
            StarAttribute::ColorVariation => &self.color_variations,
        }
    }

    pub fn uniform_position(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [
            self.positions_uniform[i],
            self.positions_uniform[i + 1],
            self.positions_uniform[i + 2],
        ]
    }

    pub fn fractal_position(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [
            self.positions_fractal[i],
            self.positions_fractal[i + 1],
            self.positions_fractal[i + 2],
        ]
    }
}
