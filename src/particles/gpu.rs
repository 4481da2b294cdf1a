use std::borrow::Cow;
use std::mem::size_of;
use std::sync::mpsc;

use bytemuck::{bytes_of, cast_slice};

use super::field::ParticleField;
use super::layout::{StarAttribute, StarBufferLayout};
use crate::error::GpuError;
use crate::frame::{FrameUniforms, StarBackend};

/// Deep-space blue behind the stars.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

/// Corners of the quad each star is expanded into.
const QUAD_VERTICES: u32 = 4;

pub struct StarfieldGpu {
    layout: StarBufferLayout,
    attribute_buffers: Vec<wgpu::Buffer>,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl StarfieldGpu {
    pub fn init(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        star_count: u32,
    ) -> Self {
        let layout = StarBufferLayout::new(star_count);
        let attribute_buffers = create_attribute_buffers(device, layout);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("starfield.uniform"),
            size: size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("starfield.bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("starfield.bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("starfield.pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader_source = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/shaders/starfield.wgsl"
        ));
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("starfield.shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(shader_source)),
        });

        let vertex_attributes: Vec<[wgpu::VertexAttribute; 1]> = StarAttribute::ALL
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    format: a.vertex_format(),
                    offset: 0,
                    shader_location: a.shader_location(),
                }]
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = StarAttribute::ALL
            .iter()
            .zip(&vertex_attributes)
            .map(|(a, attributes)| wgpu::VertexBufferLayout {
                array_stride: a.stride_bytes(),
                step_mode: wgpu::VertexStepMode::Instance,
                attributes,
            })
            .collect();

        let additive = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("starfield.pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &vertex_buffers,
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState {
                        color: additive,
                        alpha: additive,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        tracing::debug!(
            star_count,
            attribute_bytes = layout.total_bytes(),
            "starfield pipeline ready"
        );

        Self {
            layout,
            attribute_buffers,
            uniform_buffer,
            bind_group,
            pipeline,
        }
    }

    pub fn star_count(&self) -> u32 {
        self.layout.star_count
    }

    pub fn attribute_buffer(&self, attribute: StarAttribute) -> &wgpu::Buffer {
        &self.attribute_buffers[attribute.shader_location() as usize]
    }

    /// Replaces one attribute buffer's contents. Buffers are reallocated when
    /// the star count changes.
    pub fn write_attribute(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        attribute: StarAttribute,
        data: &[f32],
    ) {
        let star_count = (data.len() / attribute.components()) as u32;
        if star_count != self.layout.star_count {
            tracing::debug!(
                from = self.layout.star_count,
                to = star_count,
                "reallocating star buffers"
            );
            self.layout = StarBufferLayout::new(star_count);
            self.attribute_buffers = create_attribute_buffers(device, self.layout);
        }
        queue.write_buffer(self.attribute_buffer(attribute), 0, cast_slice(data));
    }

    pub fn upload_field(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        field: &ParticleField,
    ) {
        for attribute in StarAttribute::ALL {
            self.write_attribute(device, queue, attribute, field.attribute(attribute));
        }
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &FrameUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytes_of(uniforms));
    }

    pub fn encode_draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
        count: u32,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("starfield.draw.pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let count = count.min(self.layout.star_count);
        if count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        for (slot, buffer) in self.attribute_buffers.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        pass.draw(0..QUAD_VERTICES, 0..count);
    }

    /// Copies the first `sample_count` stars of one attribute back to the CPU.
    pub fn readback_attribute_sample(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        attribute: StarAttribute,
        sample_count: u32,
    ) -> Result<Vec<f32>, GpuError> {
        let sample_count = sample_count.min(self.layout.star_count);
        if sample_count == 0 {
            return Ok(Vec::new());
        }

        let bytes_to_copy = sample_count as u64 * attribute.stride_bytes();
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("starfield.debug.staging"),
            size: bytes_to_copy,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("starfield.debug.copy.encoder"),
        });
        encoder.copy_buffer_to_buffer(
            self.attribute_buffer(attribute),
            0,
            &staging,
            0,
            bytes_to_copy,
        );
        queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);

        let map_result = rx.recv().map_err(|_| GpuError::ChannelClosed)?;
        map_result.map_err(|_| GpuError::MapFailed)?;

        let data = slice.get_mapped_range();
        let out = cast_slice::<u8, f32>(&data).to_vec();
        drop(data);
        staging.unmap();

        Ok(out)
    }
}

fn create_attribute_buffers(device: &wgpu::Device, layout: StarBufferLayout) -> Vec<wgpu::Buffer> {
    StarAttribute::ALL
        .iter()
        .map(|attribute| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(attribute.name()),
                // zero-sized vertex buffers are invalid
                size: layout.buffer_bytes(*attribute).max(attribute.stride_bytes()),
                usage: wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        })
        .collect()
}

/// One frame's worth of GPU work, seen through [`StarBackend`].
///
/// `clear` is deferred into the load op of the next draw pass. Commands are
/// recorded into `encoder`; the caller submits.
pub struct GpuFrame<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    gpu: &'a mut StarfieldGpu,
    encoder: &'a mut wgpu::CommandEncoder,
    target: &'a wgpu::TextureView,
    clear_pending: bool,
}

impl<'a> GpuFrame<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        gpu: &'a mut StarfieldGpu,
        encoder: &'a mut wgpu::CommandEncoder,
        target: &'a wgpu::TextureView,
    ) -> Self {
        Self {
            device,
            queue,
            gpu,
            encoder,
            target,
            clear_pending: false,
        }
    }
}

impl StarBackend for GpuFrame<'_> {
    fn upload_attribute(&mut self, attribute: StarAttribute, data: &[f32]) {
        self.gpu.write_attribute(self.device, self.queue, attribute, data);
    }

    fn clear(&mut self) {
        self.clear_pending = true;
    }

    fn set_uniforms(&mut self, uniforms: &FrameUniforms) {
        self.gpu.write_uniforms(self.queue, uniforms);
    }

    fn draw_points(&mut self, count: u32) {
        let load = if std::mem::take(&mut self.clear_pending) {
            wgpu::LoadOp::Clear(CLEAR_COLOR)
        } else {
            wgpu::LoadOp::Load
        };
        self.gpu
            .encode_draw(&mut *self.encoder, self.target, load, count);
    }
}

/// Upload-only backend for regenerations that happen outside a frame.
pub struct GpuUploader<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub gpu: &'a mut StarfieldGpu,
}

impl StarBackend for GpuUploader<'_> {
    fn upload_attribute(&mut self, attribute: StarAttribute, data: &[f32]) {
        self.gpu.write_attribute(self.device, self.queue, attribute, data);
    }

    fn clear(&mut self) {}

    fn set_uniforms(&mut self, uniforms: &FrameUniforms) {
        self.gpu.write_uniforms(self.queue, uniforms);
    }

    fn draw_points(&mut self, _count: u32) {}
}

#[cfg(test)]
mod tests {
    use super::CLEAR_COLOR;
    use crate::frame::FrameUniforms;

    #[test]
    fn uniform_block_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
    }

    #[test]
    fn clear_color_is_opaque() {
        assert_eq!(CLEAR_COLOR.a, 1.0);
    }
}
