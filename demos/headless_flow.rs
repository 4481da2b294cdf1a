use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use starfield_morph::frame::{FrameScheduler, ManualScheduler, RecordingBackend};
use starfield_morph::{Starfield, StarfieldConfig};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let frames = parse_arg(&args, "--frames").unwrap_or(600u32);
    let seed = parse_arg(&args, "--seed").unwrap_or(7u64);

    let config = StarfieldConfig {
        particle_count: Some(parse_arg(&args, "--particles").unwrap_or(20_000)),
        seed: Some(seed),
        ..StarfieldConfig::default()
    };

    let mut starfield = match Starfield::new(&config, StdRng::seed_from_u64(seed)) {
        Ok(starfield) => starfield,
        Err(err) => {
            eprintln!("headless_flow failed: {err}");
            std::process::exit(1);
        }
    };
    let mut backend = RecordingBackend::new();
    let mut scheduler = ManualScheduler::new();
    starfield.upload(&mut backend);

    println!(
        "Headless flow: {} frames, {} stars, seed {}",
        frames,
        starfield.star_count(),
        seed
    );

    starfield.set_pointer(Vec2::new(0.6, -0.4));
    scheduler.request_frame();

    let mut frame = 0u32;
    while frame < frames && scheduler.take_request() {
        // sweep the morph back and forth like someone dragging the slider
        let phase = frame as f32 / frames.max(1) as f32;
        starfield
            .controls_mut()
            .set_morph_factor(1.0 - (phase * std::f32::consts::TAU).cos().abs());

        if frame == frames / 2 {
            starfield.controls_mut().set_cluster_count(8);
            starfield.controls_mut().set_fractal_power(4.0);
            match starfield.commit_controls(&mut backend) {
                Ok(true) => println!("  regenerated at frame {frame}"),
                Ok(false) => {}
                Err(err) => {
                    eprintln!("regeneration failed: {err}");
                    std::process::exit(1);
                }
            }
        }

        let uniforms = starfield.frame(&mut backend, &mut scheduler);
        if frame % 120 == 0 {
            let pointer = starfield.camera().smoothed_pointer();
            println!(
                "  frame={} time={:.2} morph={:.2} pointer=({:.3}, {:.3})",
                frame, uniforms.time, uniforms.morph_factor, pointer.x, pointer.y
            );
        }
        frame += 1;
    }

    println!(
        "Done. draws={} field revision={}",
        backend.draw_count(),
        starfield.revision()
    );
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|v| v == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse::<T>().ok())
}
