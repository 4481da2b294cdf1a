use std::mem::size_of;

/// Per-star vertex attributes, each backed by its own GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StarAttribute {
    PositionUniform,
    PositionFractal,
    Size,
    ColorVariation,
}

impl StarAttribute {
    pub const ALL: [StarAttribute; 4] = [
        Self::PositionUniform,
        Self::PositionFractal,
        Self::Size,
        Self::ColorVariation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::PositionUniform => "a_posUniform",
            Self::PositionFractal => "a_posFractal",
            Self::Size => "a_size",
            Self::ColorVariation => "a_colorVar",
        }
    }

    /// Floats per star.
    pub fn components(self) -> usize {
        match self {
            Self::PositionUniform | Self::PositionFractal => 3,
            Self::Size | Self::ColorVariation => 1,
        }
    }

    pub fn shader_location(self) -> u32 {
        match self {
            Self::PositionUniform => 0,
            Self::PositionFractal => 1,
            Self::Size => 2,
            Self::ColorVariation => 3,
        }
    }

    pub fn stride_bytes(self) -> u64 {
        (self.components() * size_of::<f32>()) as u64
    }

    pub fn vertex_format(self) -> wgpu::VertexFormat {
        match self.components() {
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StarBufferLayout {
    pub star_count: u32,
}

impl StarBufferLayout {
    pub fn new(star_count: u32) -> Self {
        Self { star_count }
    }

    pub fn buffer_bytes(&self, attribute: StarAttribute) -> u64 {
        attribute.stride_bytes() * self.star_count as u64
    }

    pub fn total_bytes(&self) -> u64 {
        StarAttribute::ALL
            .iter()
            .map(|a| self.buffer_bytes(*a))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{StarAttribute, StarBufferLayout};

    #[test]
    fn buffer_sizes_follow_component_counts() {
        let layout = StarBufferLayout::new(1_000);
        assert_eq!(layout.buffer_bytes(StarAttribute::PositionUniform), 12_000);
        assert_eq!(layout.buffer_bytes(StarAttribute::Size), 4_000);
        // 3 + 3 + 1 + 1 floats per star
        assert_eq!(layout.total_bytes(), 32_000);
    }

    #[test]
    fn shader_locations_are_unique() {
        let mut locations: Vec<u32> = StarAttribute::ALL
            .iter()
            .map(|a| a.shader_location())
            .collect();
        locations.dedup();
        assert_eq!(locations.len(), 4);
    }
}
