use std::process::ExitCode;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use starfield_morph::config::DEFAULT_CONFIG_PATH;
use starfield_morph::context::GpuContext;
use starfield_morph::frame::FrameScheduler;
use starfield_morph::particles::{GpuFrame, GpuUploader, StarfieldGpu};
use starfield_morph::telemetry::init_logging;
use starfield_morph::{GpuError, Starfield, StarfieldConfig, StarfieldError};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let config_path = parse_arg::<String>(&args, "--config")
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match load_config(&config_path, &args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("starfield-morph: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.log_level);

    exit_code(&run(config))
}

fn load_config(path: &str, args: &[String]) -> Result<StarfieldConfig, StarfieldError> {
    let mut config = StarfieldConfig::load_or_default(path)?;
    config.apply_env_overrides()?;
    if let Some(count) = parse_arg(args, "--particles") {
        config.particle_count = Some(count);
    }
    if let Some(seed) = parse_arg(args, "--seed") {
        config.seed = Some(seed);
    }
    config.validate()?;
    Ok(config)
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|v| v == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse::<T>().ok())
}

fn run(config: StarfieldConfig) -> Result<(), StarfieldError> {
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let starfield = Starfield::new(&config, rng)?;

    let event_loop = EventLoop::new()?;
    // Frames are driven by redraw requests, paced by the display.
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = Viewer::new(config, starfield);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[derive(Debug)]
enum SurfaceRecovery {
    Reconfigure,
    Skip,
    Fatal(GpuError),
}

fn recover_surface(err: &wgpu::SurfaceError) -> SurfaceRecovery {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceRecovery::Reconfigure,
        wgpu::SurfaceError::OutOfMemory => SurfaceRecovery::Fatal(GpuError::OutOfMemory),
        _ => SurfaceRecovery::Skip,
    }
}

fn exit_code(result: &Result<(), StarfieldError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "starfield-morph failed");
            ExitCode::FAILURE
        }
    }
}

struct RedrawScheduler<'a>(&'a Window);

impl FrameScheduler for RedrawScheduler<'_> {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

struct Renderer {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    context: GpuContext,
    gpu: StarfieldGpu,
}

impl Renderer {
    fn new(window: Arc<Window>, star_count: u32) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let context = pollster::block_on(GpuContext::with_instance(instance, Some(&surface)))?;

        let mut surface_config = surface
            .get_default_config(&context.adapter, size.width.max(1), size.height.max(1))
            .ok_or(GpuError::SurfaceUnsupported)?;
        surface_config.present_mode = wgpu::PresentMode::AutoVsync;
        surface.configure(&context.device, &surface_config);

        let gpu = StarfieldGpu::init(&context.device, surface_config.format, star_count);
        Ok(Self {
            surface,
            surface_config,
            context,
            gpu,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.context.device, &self.surface_config);
    }

    fn uploader(&mut self) -> GpuUploader<'_> {
        GpuUploader {
            device: &self.context.device,
            queue: &self.context.queue,
            gpu: &mut self.gpu,
        }
    }
}

struct Viewer {
    config: StarfieldConfig,
    starfield: Starfield<StdRng>,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    fatal: Option<StarfieldError>,
}

impl Viewer {
    fn new(config: StarfieldConfig, starfield: Starfield<StdRng>) -> Self {
        Self {
            config,
            starfield,
            window: None,
            renderer: None,
            fatal: None,
        }
    }

    /// Stops the loop; `main` reports `err` once `run_app` returns.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: StarfieldError) {
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), StarfieldError> {
        let attributes = Window::default_attributes()
            .with_title("starfield-morph")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        self.starfield.resize(size.width, size.height);

        let mut renderer = Renderer::new(Arc::clone(&window), self.starfield.star_count())?;
        self.starfield.upload(&mut renderer.uploader());

        window.request_redraw();
        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, state: ElementState) -> Result<(), StarfieldError> {
        let pressed = state == ElementState::Pressed;
        let generation = *self.starfield.controls().generation();
        let render = *self.starfield.controls().render();
        let controls = self.starfield.controls_mut();

        match code {
            KeyCode::ArrowUp if pressed => {
                controls.set_cluster_count(generation.cluster_count.saturating_add(5))
            }
            KeyCode::ArrowDown if pressed => {
                controls.set_cluster_count(generation.cluster_count.saturating_sub(5))
            }
            KeyCode::ArrowRight if pressed => {
                controls.set_cluster_spread(generation.cluster_spread + 50.0)
            }
            KeyCode::ArrowLeft if pressed => {
                controls.set_cluster_spread(generation.cluster_spread - 50.0)
            }
            KeyCode::PageUp if pressed => {
                controls.set_fractal_power(generation.fractal_power + 0.25)
            }
            KeyCode::PageDown if pressed => {
                controls.set_fractal_power(generation.fractal_power - 0.25)
            }
            KeyCode::KeyM if pressed => controls.set_morph_factor(render.morph_factor + 0.05),
            KeyCode::KeyN if pressed => controls.set_morph_factor(render.morph_factor - 0.05),
            KeyCode::Space if pressed => {
                controls.set_morph_factor(if render.morph_factor > 0.5 { 0.0 } else { 1.0 })
            }
            KeyCode::KeyS if pressed => controls.set_speed(render.speed + 10.0),
            KeyCode::KeyA if pressed => controls.set_speed(render.speed - 10.0),
            KeyCode::KeyW if pressed => controls.set_base_size(render.base_size + 1.0),
            KeyCode::KeyQ if pressed => controls.set_base_size(render.base_size - 1.0),
            KeyCode::KeyR if !pressed => {
                if let Some(renderer) = self.renderer.as_mut() {
                    self.starfield.regenerate(&mut renderer.uploader())?;
                }
            }
            // Releasing a generation key ends the interaction.
            KeyCode::ArrowUp
            | KeyCode::ArrowDown
            | KeyCode::ArrowLeft
            | KeyCode::ArrowRight
            | KeyCode::PageUp
            | KeyCode::PageDown => {
                if let Some(renderer) = self.renderer.as_mut() {
                    self.starfield.commit_controls(&mut renderer.uploader())?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer)) = (self.window.as_ref(), self.renderer.as_mut()) else {
            return;
        };

        let frame = match renderer.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                match recover_surface(&err) {
                    SurfaceRecovery::Reconfigure => {
                        let size = window.inner_size();
                        renderer.resize(size.width, size.height);
                        window.request_redraw();
                    }
                    SurfaceRecovery::Skip => {
                        tracing::warn!(%err, "skipping frame");
                        window.request_redraw();
                    }
                    SurfaceRecovery::Fatal(fatal) => self.fail(event_loop, fatal.into()),
                }
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let Renderer { context, gpu, .. } = renderer;
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("starfield.frame.encoder"),
            });
        {
            let mut backend =
                GpuFrame::new(&context.device, &context.queue, gpu, &mut encoder, &view);
            let mut scheduler = RedrawScheduler(window);
            self.starfield.frame(&mut backend, &mut scheduler);
        }
        context.queue.submit(Some(encoder.finish()));
        frame.present();
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_window(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                self.starfield.resize(size.width, size.height);
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.starfield.pointer_moved(position.x, position.y);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if let Err(err) = self.handle_key(code, state) {
                    self.fail(event_loop, err);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
