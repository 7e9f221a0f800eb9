use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use rand::prelude::*;
use wgpu::util::DeviceExt;
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use viz_core::{
    connection_lines, overlay, particle_vertices, ControlPointMap, CurveField, PackedTexture,
    ParticleUniforms, ParticleVertex, RandomTexture, State, VizConfig, DEFAULT_RANDOM_SEED,
    ROTATION_STEP,
};

struct Args {
    control_points: Option<PathBuf>,
    seed: u64,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        control_points: None,
        seed: DEFAULT_RANDOM_SEED,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seed" => {
                let value = it.next().context("--seed needs a value")?;
                args.seed = value
                    .parse()
                    .with_context(|| format!("invalid seed '{value}'"))?;
            }
            _ => args.control_points = Some(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

/// Everything the frame loop mutates besides GPU resources.
struct App {
    field: CurveField,
    state: State,
    rng: StdRng,
    started: Instant,
    rotation: f32,
    show_connections: bool,
    control_points_path: Option<PathBuf>,
    curves_dirty: bool,
}

impl App {
    fn new(args: Args) -> anyhow::Result<Self> {
        let config = VizConfig {
            random_seed: args.seed,
            ..VizConfig::default()
        };
        let n = config.num_instruments;
        let mut field = CurveField::new(config);
        let mut rng = StdRng::seed_from_u64(args.seed);
        let state = State::random(n, 0.0, &mut rng);
        field.set_state(&state)?;

        if let Some(path) = &args.control_points {
            if path.exists() {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let points = ControlPointMap::parse(&text, n)?;
                let total: usize = points.iter().map(|(_, _, pts)| pts.len()).sum();
                log::info!("loaded {total} control points from {}", path.display());
                field.set_control_points(points);
            } else {
                log::info!("{} not found, starting without control points", path.display());
            }
        }

        Ok(Self {
            field,
            state,
            rng,
            started: Instant::now(),
            rotation: 0.0,
            show_connections: false,
            control_points_path: args.control_points,
            curves_dirty: true,
        })
    }

    fn elapsed(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    fn randomize_state(&mut self) {
        let n = self.field.num_instruments();
        self.state = State::random(n, self.elapsed(), &mut self.rng);
        log::info!("new random state:\n{}", self.state);
    }

    fn scatter_control_points(&mut self) {
        self.field.scatter_control_points(&mut self.rng);
        self.curves_dirty = true;
    }

    fn clear_control_points(&mut self) {
        self.field
            .set_control_points(ControlPointMap::new(self.field.num_instruments()));
        self.curves_dirty = true;
    }

    fn save_control_points(&self) -> anyhow::Result<()> {
        let Some(path) = &self.control_points_path else {
            log::warn!("no control point file given on the command line; not saving");
            return Ok(());
        };
        std::fs::write(path, self.field.control_points().to_string())
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("saved control points to {}", path.display());
        Ok(())
    }

    /// Feed this frame's state into the curve field.
    fn update(&mut self) -> anyhow::Result<()> {
        self.field.set_state(&self.state)?;
        self.curves_dirty = true;
        Ok(())
    }

    fn handle_key(&mut self, key: &Key) {
        match key {
            Key::Character(c) => match c.as_str() {
                "d" | "D" => {
                    self.show_connections = !self.show_connections;
                    let status = if self.show_connections { "on" } else { "off" };
                    log::info!("connection overlay {status}");
                }
                "r" | "R" => self.randomize_state(),
                "c" | "C" => self.scatter_control_points(),
                "x" | "X" => self.clear_control_points(),
                "s" | "S" => {
                    if let Err(e) = self.save_control_points() {
                        log::error!("save failed: {e:?}");
                    }
                }
                _ => {}
            },
            Key::Named(NamedKey::ArrowLeft) => self.rotation += ROTATION_STEP,
            Key::Named(NamedKey::ArrowRight) => self.rotation -= ROTATION_STEP,
            _ => {}
        }
    }
}

struct GpuState<'w> {
    window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    particle_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
    particle_vb: wgpu::Buffer,
    particle_capacity: usize,
    line_vb: wgpu::Buffer,
    line_capacity: usize,
    control_points_tex: wgpu::Texture,
    rand_size: [f32; 2],
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

fn create_data_texture(
    device: &wgpu::Device,
    label: &str,
    width: usize,
    height: usize,
    format: wgpu::TextureFormat,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1) as u32,
            height: height.max(1) as u32,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn write_data_texture(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    bytes: &[u8],
    width: usize,
    height: usize,
    bytes_per_texel: usize,
) {
    if width == 0 || height == 0 {
        return;
    }
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytes,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some((width * bytes_per_texel) as u32),
            rows_per_image: Some(height as u32),
        },
        wgpu::Extent3d {
            width: width as u32,
            height: height as u32,
            depth_or_array_layers: 1,
        },
    );
}

fn data_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

impl<'w> GpuState<'w> {
    async fn new(window: &'w winit::window::Window, app: &App) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps.formats[0];
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particles"),
            source: wgpu::ShaderSource::Wgsl(viz_core::PARTICLES_WGSL.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniforms"),
            size: std::mem::size_of::<ParticleUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Unit quad, two triangles, corners in -1..1 for the blob falloff
        let quad_vertices: [f32; 12] = [
            -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0,
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vb"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let particle_capacity = app.field.config().num_particles.max(1);
        let particle_vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle_vb"),
            size: (std::mem::size_of::<ParticleVertex>() * particle_capacity) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let n = app.field.num_instruments();
        let line_capacity = (2 * n * n).max(1);
        let line_vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("line_vb"),
            size: (std::mem::size_of::<overlay::LineVertex>() * line_capacity) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let packed: &PackedTexture = app.field.texture();
        let control_points_tex = create_data_texture(
            &device,
            "control_points",
            packed.width(),
            packed.height(),
            wgpu::TextureFormat::Rgba32Float,
        );
        let randoms = RandomTexture::new(app.field.config());
        let rand_tex = create_data_texture(
            &device,
            "randoms",
            randoms.width(),
            randoms.height(),
            wgpu::TextureFormat::R32Float,
        );
        write_data_texture(
            &queue,
            &rand_tex,
            randoms.as_bytes(),
            randoms.width(),
            randoms.height(),
            std::mem::size_of::<f32>(),
        );
        log::info!(
            "control point texture {}x{}, random texture {}x{}",
            packed.width(),
            packed.height(),
            randoms.width(),
            randoms.height()
        );

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                data_texture_entry(1),
                data_texture_entry(2),
            ],
        });
        let cp_view = control_points_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let rand_view = rand_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bg"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&cp_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&rand_view),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };

        let particle_buffers = [
            // slot 0: quad corners
            wgpu::VertexBufferLayout {
                array_stride: (std::mem::size_of::<f32>() * 2) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            // slot 1: (from, to, index, strength) per particle
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<ParticleVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 0,
                    shader_location: 1,
                }],
            },
        ];
        let particle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("particle_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_particle"),
                buffers: &particle_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_particle"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(additive),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        let line_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<overlay::LineVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32,
                    offset: 8,
                    shader_location: 1,
                },
            ],
        }];
        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_line"),
                buffers: &line_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_line"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            particle_pipeline,
            line_pipeline,
            uniform_buffer,
            quad_vb,
            particle_vb,
            particle_capacity,
            line_vb,
            line_capacity,
            control_points_tex,
            rand_size: randoms.size(),
            bind_group,
            width: size.width.max(1),
            height: size.height.max(1),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.width = new_size.width;
        self.height = new_size.height;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    fn upload_curves(&self, packed: &PackedTexture) {
        write_data_texture(
            &self.queue,
            &self.control_points_tex,
            packed.as_bytes(),
            packed.width(),
            packed.height(),
            std::mem::size_of::<viz_core::Texel>(),
        );
    }

    fn render(&mut self, app: &mut App) -> Result<(), wgpu::SurfaceError> {
        if app.curves_dirty {
            self.upload_curves(app.field.texture());
            app.curves_dirty = false;
        }

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let config = app.field.config();
        let uniforms = ParticleUniforms {
            control_points_size: app.field.texture().size(),
            rand_size: self.rand_size,
            randoms_per_particle: config.randoms_per_particle as u32,
            texture_row_size: config.texture_row_size as u32,
            time: app.elapsed(),
            rotation: app.rotation,
            aspect: self.width as f32 / self.height as f32,
            num_instruments: config.num_instruments as u32,
            _pad: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut particles = particle_vertices(&app.state, config.num_particles);
        particles.truncate(self.particle_capacity);
        self.queue
            .write_buffer(&self.particle_vb, 0, bytemuck::cast_slice(&particles));

        let mut lines = Vec::new();
        if app.show_connections {
            lines = overlay::line_vertices(&connection_lines(&app.state));
            lines.truncate(self.line_capacity);
            self.queue
                .write_buffer(&self.line_vb, 0, bytemuck::cast_slice(&lines));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rpass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_bind_group(0, &self.bind_group, &[]);
            if !particles.is_empty() {
                rpass.set_pipeline(&self.particle_pipeline);
                rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
                rpass.set_vertex_buffer(1, self.particle_vb.slice(..));
                rpass.draw(0..6, 0..particles.len() as u32);
            }
            if !lines.is_empty() {
                rpass.set_pipeline(&self.line_pipeline);
                rpass.set_vertex_buffer(0, self.line_vb.slice(..));
                rpass.draw(0..lines.len() as u32, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let mut app = App::new(parse_args()?)?;

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Ensemble Visualizer (native)")
        .build(&event_loop)?;

    let mut gpu = pollster::block_on(GpuState::new(&window, &app))?;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent {
            event: WindowEvent::Resized(size),
            ..
        } => gpu.resize(size),
        Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } => elwt.exit(),
        Event::WindowEvent {
            event:
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                },
            ..
        } => match logical_key {
            Key::Named(NamedKey::Escape) => elwt.exit(),
            key => app.handle_key(&key),
        },
        Event::AboutToWait => {
            if let Err(e) = app.update() {
                log::error!("state update failed: {e:?}");
                elwt.exit();
                return;
            }
            match gpu.render(&mut app) {
                Ok(_) => gpu.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost) => gpu.resize(gpu.window.inner_size()),
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(_) => {}
            }
        }
        _ => {}
    })?;
    Ok(())
}
