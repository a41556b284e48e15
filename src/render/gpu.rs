//! wgpu compute backend.
//!
//! Runs `shaders/raycast.wgsl`, one invocation per output pixel. Layer textures are uploaded
//! once into a single storage buffer and reused for as long as the same textures are
//! rendered; only the per-frame homographies and blend parameters change between frames.

use crate::{
    foundation::{
        core::Vec4,
        error::{LifError, LifResult},
    },
    render::{
        FrameRGBA, RenderBackend, RenderSettings,
        uniforms::{FrameUniforms, LayerUniforms},
    },
    scene::{MAX_LAYERS, MAX_VIEWS},
};

pub(crate) const RAYCAST_SHADER: &str = include_str!("shaders/raycast.wgsl");

const WORKGROUP_SIZE: u32 = 16;
const LAYER_SLOTS: usize = MAX_VIEWS * MAX_LAYERS;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuLayer {
    p0: [f32; 4],
    p1: [f32; 4],
    p2: [f32; 4],
    c: [f32; 4],
    rgb: [u32; 4],
    depth: [u32; 4],
    inv_range: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuParams {
    background: [f32; 4],
    size: [u32; 4],
    counts: [u32; 4],
    mixing: [f32; 4],
}

struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params: wgpu::Buffer,
    layers: wgpu::Buffer,
}

/// Texel storage for the textures of the last rendered frame.
struct TexelUpload {
    /// Identity of every uploaded texture, in upload order.
    key: Vec<(usize, usize)>,
    buffer: wgpu::Buffer,
    /// `(rgb offset, depth offset)` per layer slot.
    offsets: Vec<(u32, u32)>,
}

struct OutputBuffers {
    pixels: u64,
    storage: wgpu::Buffer,
    readback: wgpu::Buffer,
}

pub struct GpuBackend {
    settings: RenderSettings,
    state: Option<GpuState>,
    texels: Option<TexelUpload>,
    output: Option<OutputBuffers>,
}

impl GpuBackend {
    /// The device is requested lazily on the first render.
    pub fn new(settings: RenderSettings) -> LifResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            state: None,
            texels: None,
            output: None,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn ensure_init(&mut self) -> LifResult<()> {
        if self.state.is_some() {
            return Ok(());
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| match e {
            wgpu::RequestAdapterError::NotFound { .. } => {
                LifError::render("no gpu adapter available")
            }
            other => LifError::render(format!("wgpu request_adapter failed: {other:?}")),
        })?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("lifcast_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| LifError::render(format!("wgpu request_device failed: {e:?}")))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lifcast_raycast_shader"),
            source: wgpu::ShaderSource::Wgsl(RAYCAST_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lifcast_raycast_layout"),
            entries: &[
                buffer_entry(0, wgpu::BufferBindingType::Storage { read_only: true }),
                buffer_entry(1, wgpu::BufferBindingType::Storage { read_only: true }),
                buffer_entry(2, wgpu::BufferBindingType::Uniform),
                buffer_entry(3, wgpu::BufferBindingType::Storage { read_only: false }),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lifcast_raycast_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("lifcast_raycast_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lifcast_params"),
            size: std::mem::size_of::<GpuParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let layers = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lifcast_layers"),
            size: (std::mem::size_of::<GpuLayer>() * LAYER_SLOTS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        tracing::debug!(adapter = ?adapter.get_info().name, "gpu backend initialized");
        self.state = Some(GpuState {
            device,
            queue,
            pipeline,
            bind_group_layout,
            params,
            layers,
        });
        Ok(())
    }

    fn ensure_texels(&mut self, frame: &FrameUniforms<'_>) -> LifResult<()> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| LifError::render("gpu backend not initialized"))?;

        let slots = layer_slots(frame);
        let key: Vec<(usize, usize)> = slots
            .iter()
            .flatten()
            .flat_map(|l| {
                [
                    texture_key(l.layer.rgb.texels()),
                    texture_key(l.layer.depth.texture().texels()),
                ]
            })
            .collect();
        if self.texels.as_ref().is_some_and(|t| t.key == key) {
            return Ok(());
        }

        let mut data: Vec<[f32; 4]> = Vec::new();
        let mut offsets = vec![(0u32, 0u32); LAYER_SLOTS];
        for (slot, layer) in slots.iter().enumerate() {
            let Some(layer) = layer else { continue };
            let rgb = texel_offset(data.len())?;
            data.extend(layer.layer.rgb.texels().iter().map(|t| t.to_array()));
            let depth = texel_offset(data.len())?;
            data.extend(
                layer
                    .layer
                    .depth
                    .texture()
                    .texels()
                    .iter()
                    .map(|t| t.to_array()),
            );
            offsets[slot] = (rgb, depth);
        }
        if data.is_empty() {
            data.push([0.0; 4]);
        }

        let buffer = state.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lifcast_texels"),
            size: std::mem::size_of_val(data.as_slice()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        state
            .queue
            .write_buffer(&buffer, 0, bytemuck::cast_slice(&data));
        tracing::debug!(texels = data.len(), "uploaded layer textures");

        self.texels = Some(TexelUpload {
            key,
            buffer,
            offsets,
        });
        Ok(())
    }

    fn ensure_output(&mut self, pixels: u64) -> LifResult<()> {
        if self.output.as_ref().is_some_and(|o| o.pixels == pixels) {
            return Ok(());
        }
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| LifError::render("gpu backend not initialized"))?;
        let size = pixels
            .checked_mul(4)
            .ok_or_else(|| LifError::render("output buffer size overflow"))?;

        let storage = state.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lifcast_output"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback = state.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lifcast_readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.output = Some(OutputBuffers {
            pixels,
            storage,
            readback,
        });
        Ok(())
    }
}

impl RenderBackend for GpuBackend {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(width = frame.extent.width, height = frame.extent.height)
    )]
    fn render(&mut self, frame: &FrameUniforms<'_>) -> LifResult<FrameRGBA> {
        let width = frame.extent.width;
        let height = frame.extent.height;

        self.ensure_init()?;
        self.ensure_texels(frame)?;
        self.ensure_output(u64::from(width) * u64::from(height))?;

        let (Some(state), Some(texels), Some(output)) =
            (self.state.as_ref(), self.texels.as_ref(), self.output.as_ref())
        else {
            return Err(LifError::render("gpu backend not initialized"));
        };

        let gpu_layers = pack_layers(frame, &texels.offsets);
        state
            .queue
            .write_buffer(&state.layers, 0, bytemuck::cast_slice(&gpu_layers));
        let params = pack_params(frame);
        state
            .queue
            .write_buffer(&state.params, 0, bytemuck::bytes_of(&params));

        let bind_group = state.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lifcast_raycast_bind_group"),
            layout: &state.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: texels.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: state.layers.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: state.params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: output.storage.as_entire_binding(),
                },
            ],
        });

        let mut encoder = state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lifcast_raycast_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("lifcast_raycast_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&state.pipeline);
            pass.set_bind_group(0, Some(&bind_group), &[]);
            pass.dispatch_workgroups(
                width.div_ceil(WORKGROUP_SIZE),
                height.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }
        let size = output.pixels * 4;
        encoder.copy_buffer_to_buffer(&output.storage, 0, &output.readback, 0, size);
        state.queue.submit(Some(encoder.finish()));

        let buffer_slice = output.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        state
            .device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| LifError::render(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| LifError::render("readback channel closed"))?
            .map_err(|e| LifError::render(format!("readback map failed: {e:?}")))?;

        let mapped = buffer_slice.get_mapped_range();
        let data = mapped.to_vec();
        drop(mapped);
        output.readback.unmap();

        Ok(FrameRGBA {
            width,
            height,
            data,
            premultiplied: true,
        })
    }
}

fn buffer_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Layers laid out as `view * MAX_LAYERS + layer`.
fn layer_slots<'f, 'a>(frame: &'f FrameUniforms<'a>) -> [Option<&'f LayerUniforms<'a>>; LAYER_SLOTS] {
    let mut slots = [None; LAYER_SLOTS];
    for (v, view) in frame.views.iter().enumerate().take(MAX_VIEWS) {
        for (l, layer) in view.layers.iter().enumerate().take(MAX_LAYERS) {
            slots[v * MAX_LAYERS + l] = Some(layer);
        }
    }
    slots
}

fn texture_key(texels: &[Vec4]) -> (usize, usize) {
    (texels.as_ptr() as usize, texels.len())
}

fn texel_offset(len: usize) -> LifResult<u32> {
    u32::try_from(len).map_err(|_| LifError::render("layer textures exceed gpu index range"))
}

fn pack_layers(frame: &FrameUniforms<'_>, offsets: &[(u32, u32)]) -> [GpuLayer; LAYER_SLOTS] {
    let mut out = [GpuLayer::default(); LAYER_SLOTS];
    for (slot, layer) in layer_slots(frame).iter().enumerate() {
        let Some(layer) = layer else { continue };
        let Some(h) = layer.homography else { continue };
        let p = h.matrix();
        let c = h.offset();
        let rgb = layer.layer.rgb.extent();
        let depth = layer.layer.depth.extent();
        let range = layer.layer.depth.range();
        let (rgb_offset, depth_offset) = offsets[slot];
        out[slot] = GpuLayer {
            p0: p.x_axis.extend(0.0).to_array(),
            p1: p.y_axis.extend(0.0).to_array(),
            p2: p.z_axis.extend(0.0).to_array(),
            c: c.extend(0.0).to_array(),
            rgb: [rgb_offset, rgb.width, rgb.height, 1],
            depth: [depth_offset, depth.width, depth.height, 0],
            inv_range: [range.inv_z_min, range.inv_z_max, 0.0, 0.0],
        };
    }
    out
}

fn pack_params(frame: &FrameUniforms<'_>) -> GpuParams {
    let count = |v: usize| {
        frame
            .views
            .get(v)
            .map_or(0, |view| view.layers.len().min(MAX_LAYERS) as u32)
    };
    GpuParams {
        background: frame.background.to_array(),
        size: [
            frame.extent.width,
            frame.extent.height,
            frame.views.len().min(MAX_VIEWS) as u32,
            u32::from(frame.thresholds.full_disagreement),
        ],
        counts: [count(0), count(1), 0, 0],
        mixing: [
            frame.stereo_weight,
            frame.feather,
            frame.thresholds.alpha_difference,
            0.0,
        ],
    }
}
