use rand::rngs::StdRng;
use rand::SeedableRng;
use starfield_morph::context::GpuContext;
use starfield_morph::frame::ManualScheduler;
use starfield_morph::particles::{GpuFrame, StarAttribute, StarfieldGpu};
use starfield_morph::{Starfield, StarfieldConfig};

const TARGET_SIZE: u32 = 256;
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

fn main() {
    if let Err(err) = pollster::block_on(run()) {
        eprintln!("gpu_smoke failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let context = GpuContext::headless().await?;

    let config = StarfieldConfig {
        particle_count: Some(8192),
        seed: Some(1),
        ..StarfieldConfig::default()
    };
    let mut starfield = Starfield::new(&config, StdRng::seed_from_u64(1))?;
    starfield.resize(TARGET_SIZE, TARGET_SIZE);

    let mut gpu = StarfieldGpu::init(&context.device, TARGET_FORMAT, starfield.star_count());
    gpu.upload_field(&context.device, &context.queue, &starfield.field());

    let target = context.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("starfield.smoke.target"),
        size: wgpu::Extent3d {
            width: TARGET_SIZE,
            height: TARGET_SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let mut scheduler = ManualScheduler::new();
    for _ in 0..120 {
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("starfield.smoke.encoder"),
            });
        {
            let mut backend =
                GpuFrame::new(&context.device, &context.queue, &mut gpu, &mut encoder, &view);
            starfield.frame(&mut backend, &mut scheduler);
        }
        context.queue.submit(Some(encoder.finish()));
    }

    let sample = gpu.readback_attribute_sample(
        &context.device,
        &context.queue,
        StarAttribute::Size,
        128,
    )?;
    let matches = sample
        .iter()
        .zip(starfield.field().sizes())
        .filter(|(gpu_size, cpu_size)| gpu_size == cpu_size)
        .count();

    println!(
        "gpu_smoke ok: star_count={} frames={} sampled={} matching_sizes={}",
        gpu.star_count(),
        scheduler.requested(),
        sample.len(),
        matches
    );

    Ok(())
}
