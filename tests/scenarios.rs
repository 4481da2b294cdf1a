use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use starfield_morph::camera::CameraState;
use starfield_morph::frame::{BackendCall, ManualScheduler, RecordingBackend};
use starfield_morph::particles::{
    cluster_center, GenerationParams, GridLayout, ParticleField, StarAttribute,
};
use starfield_morph::{Starfield, StarfieldConfig};

#[test]
fn eight_stars_single_cluster() {
    let params = GenerationParams {
        cluster_count: 1,
        cluster_spread: 100.0,
        fractal_power: 1.0,
    };
    let mut rng = StdRng::seed_from_u64(2024);
    let field = ParticleField::generate(8, &params, &mut rng).unwrap();

    assert_eq!(field.positions_uniform().len(), 24);
    assert_eq!(field.positions_fractal().len(), 24);
    assert_eq!(field.sizes().len(), 8);
    assert_eq!(field.color_variations().len(), 8);

    let grid = GridLayout::for_count(8);
    let lattice = grid.lattice_point(5);
    let jittered = field.uniform_position(5);
    for axis in 0..3 {
        assert!((jittered[axis] as f64 - lattice[axis]).abs() <= 25.0 + 1e-3);
    }

    // one cluster: every star sits within the spread of the same center
    let center = cluster_center(0);
    for i in 0..8 {
        let p = field.fractal_position(i);
        let dist = (0..3)
            .map(|a| (p[a] as f64 - center[a]).powi(2))
            .sum::<f64>()
            .sqrt();
        assert!(dist <= 100.0 + 1e-3, "star {i} is {dist} from center");
    }
}

#[test]
fn pointer_settles_on_fixed_target() {
    let mut camera = CameraState::new();
    camera.set_pointer_target(Vec2::ONE);
    let mut frames = 0;
    while (Vec2::ONE - camera.smoothed_pointer()).max_element() >= 1e-3 {
        camera.advance();
        frames += 1;
        assert!(frames < 1_000);
    }
    // 0.95^n < 1e-3 first holds at n = 135
    assert!((134..=136).contains(&frames), "settled after {frames} frames");
}

#[test]
fn seeded_starfields_match() {
    let config = StarfieldConfig {
        particle_count: Some(300),
        ..StarfieldConfig::default()
    };
    let a = Starfield::new(&config, StdRng::seed_from_u64(9)).unwrap();
    let b = Starfield::new(&config, StdRng::seed_from_u64(9)).unwrap();
    assert_eq!(*a.field(), *b.field());
}

#[test]
fn regeneration_completes_before_next_frame() {
    let config = StarfieldConfig {
        particle_count: Some(216),
        ..StarfieldConfig::default()
    };
    let mut starfield = Starfield::new(&config, StdRng::seed_from_u64(4)).unwrap();
    let mut backend = RecordingBackend::new();
    let mut scheduler = ManualScheduler::new();
    starfield.upload(&mut backend);

    starfield.frame(&mut backend, &mut scheduler);
    starfield.controls_mut().set_cluster_spread(900.0);
    starfield.commit_controls(&mut backend).unwrap();
    starfield.frame(&mut backend, &mut scheduler);

    // 4 initial uploads, frame, 4 regeneration uploads, frame
    let kinds: Vec<&str> = backend
        .calls
        .iter()
        .map(|c| match c {
            BackendCall::Upload { .. } => "upload",
            BackendCall::Clear => "clear",
            BackendCall::Uniforms(_) => "uniforms",
            BackendCall::Draw(_) => "draw",
        })
        .collect();
    assert_eq!(
        kinds,
        [
            "upload", "upload", "upload", "upload", "clear", "uniforms", "draw", "upload",
            "upload", "upload", "upload", "clear", "uniforms", "draw",
        ]
    );
    assert_eq!(
        backend.buffer(StarAttribute::PositionFractal).map(<[f32]>::len),
        Some(216 * 3)
    );
    assert_eq!(scheduler.requested(), 2);
}
