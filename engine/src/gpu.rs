//! Accelerator compute engine for array-style workloads.
//!
//! Device, kernel and bind-group layout are acquired lazily on the first
//! job and cached across jobs; buffers are allocated per call, sized to
//! that call's input.

use futures::channel::oneshot;
use log::{debug, info};

use crate::error::{EngineErr, Result};

/// Invocations per workgroup. Must match `@workgroup_size` in the kernel.
const WORKGROUP_SIZE: u32 = 64;

/// Elementwise square kernel. Lanes past the input length return early,
/// so padding in the final workgroup is inert.
const SQUARE_KERNEL: &str = r#"
@group(0) @binding(0) var<storage, read> input_array: array<f32>;
@group(0) @binding(1) var<storage, read_write> output_array: array<f32>;

@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {
    let index = global_id.x;
    if (index >= arrayLength(&input_array)) {
        return;
    }
    let value = input_array[index];
    output_array[index] = value * value;
}
"#;

/// Cached device handle and compiled kernel.
///
/// Never shared outside the engine; at most one exists per process.
struct GpuSession {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuSession {
    /// Acquires a device and compiles the square kernel.
    ///
    /// # Errors
    /// Returns `AcceleratorUnavailable` if no compatible adapter or
    /// device can be obtained.
    async fn acquire() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| EngineErr::AcceleratorUnavailable(format!("no suitable adapter: {e}")))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .map_err(|e| {
                EngineErr::AcceleratorUnavailable(format!("device request failed: {e}"))
            })?;

        info!("acquired accelerator: {}", adapter.get_info().name);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("square kernel"),
            source: wgpu::ShaderSource::Wgsl(SQUARE_KERNEL.into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("square bind group layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("square pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("square pipeline"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
        })
    }

    /// Uploads `input`, dispatches the square kernel, and reads the
    /// result back through a staging buffer.
    ///
    /// Accelerator memory is not assumed host-mappable, so the output is
    /// copied into a `MAP_READ` staging buffer before mapping.
    async fn run_square(&self, input: &[f32]) -> Result<Vec<f32>> {
        let size = size_of_val(input) as u64;

        let input_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("square input"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.queue
            .write_buffer(&input_buffer, 0, bytemuck::cast_slice(input));

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("square output"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("square staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("square bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: input_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("square encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("square pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);

            let workgroups = (input.len() as u32).div_ceil(WORKGROUP_SIZE);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, size);

        self.queue.submit(Some(encoder.finish()));

        let slice = staging_buffer.slice(..);
        let (sender, receiver) = oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            sender.send(result).ok();
        });

        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| EngineErr::AcceleratorLost(format!("device poll failed: {e}")))?;

        receiver
            .await
            .map_err(|_| EngineErr::AcceleratorLost("map callback dropped".to_string()))?
            .map_err(|e| EngineErr::AcceleratorLost(format!("staging map failed: {e}")))?;

        let mapped = slice.get_mapped_range();
        let out = bytemuck::cast_slice(&mapped).to_vec();
        drop(mapped);
        staging_buffer.unmap();

        Ok(out)
    }
}

/// Accelerator compute engine.
///
/// Owns the process-wide accelerator session; device acquisition and
/// kernel compilation are amortized across calls.
#[derive(Default)]
pub struct GpuEngine {
    session: Option<GpuSession>,
}

impl GpuEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Squares every element of `input`, length-preserving.
    ///
    /// IEEE-754 single precision throughout; NaN and Inf square per IEEE
    /// rules and are returned, not treated as errors.
    ///
    /// # Errors
    /// `AcceleratorUnavailable` if no device can be acquired,
    /// `AcceleratorLost` if the device fails mid-dispatch. On loss the
    /// cached session is dropped so the next call reacquires.
    pub async fn square_array(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        // Zero workgroups to dispatch; also avoids zero-sized buffers.
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let session = match self.session.take() {
            Some(session) => session,
            None => GpuSession::acquire().await?,
        };

        let out = session.run_square(input).await;
        self.session = retain_session(session, &out);

        out
    }

    /// Whether a device and compiled kernel are currently cached.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Drops the cached accelerator session; the next job reacquires.
    pub fn reset(&mut self) {
        self.session = None;
    }
}

/// Maps a dispatch outcome to the session worth keeping. Device loss
/// discards the session so the next job lazily reacquires; every other
/// outcome returns it to the cache.
fn retain_session<S>(session: S, out: &Result<Vec<f32>>) -> Option<S> {
    match out {
        Err(EngineErr::AcceleratorLost(reason)) => {
            debug!("dropping accelerator session after loss: {reason}");
            None
        }
        _ => Some(session),
    }
}
