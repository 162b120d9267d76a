use std::borrow::Cow;
use std::fmt;
use wgpu::util::DeviceExt;

use crate::config::default_backends;
use crate::error::{Error, Result};
use crate::matrix::{Matrix, Pattern};

/// Edge length of the square workgroup declared in the shader.
pub const WORKGROUP_SIZE: u32 = 16;

/// What the benchmark reports about the selected device.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    /// Maximum compute invocations per workgroup. wgpu does not expose a
    /// compute-unit count, so this is the closest parallelism figure.
    pub parallelism: u32,
}

impl fmt::Display for DeviceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Device: {}", self.name)?;
        write!(f, "Max invocations per workgroup: {}", self.parallelism)
    }
}

/// A matrix resident in device memory.
pub struct DeviceMatrix {
    buffer: wgpu::Buffer,
    rows: usize,
    cols: usize,
}

impl DeviceMatrix {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn len(&self) -> usize {
        self.rows * self.cols
    }
}

struct Kernel {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// Adapter, device and compiled kernels for the parallel multiplier.
pub struct GpuContext {
    info: wgpu::AdapterInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,
    matmul: Kernel,
    fill: Kernel,
}

/// Handle to a submitted multiplication. Results are only readable after
/// [`Completion::wait`].
#[must_use = "a submitted multiplication must be waited on to read its result"]
pub struct Completion<'a> {
    ctx: &'a GpuContext,
    staging: wgpu::Buffer,
    rows: usize,
    cols: usize,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

// Zero-sized bindings are invalid, so empty matrices still get one element.
fn buffer_size(elements: usize) -> u64 {
    (elements.max(1) * std::mem::size_of::<f32>()) as u64
}

fn dim_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Kernel(format!("dimension {} does not fit in u32", value)))
}

fn pattern_id(pattern: Pattern) -> u32 {
    match pattern {
        Pattern::Zeros => 0,
        Pattern::Ones => 1,
        Pattern::RowIndex => 2,
    }
}

impl GpuContext {
    /// Opens the default adapter with the default power preference.
    pub async fn new() -> Result<Self> {
        Self::with_power_preference(wgpu::PowerPreference::default()).await
    }

    pub fn new_blocking() -> Result<Self> {
        pollster::block_on(Self::new())
    }

    pub async fn with_power_preference(power_preference: wgpu::PowerPreference) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: default_backends(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(Error::AdapterNotFound)?;

        let info = adapter.get_info();
        log::info!("Selected adapter {} ({:?}, {:?})", info.name, info.backend, info.device_type);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Matmul Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Matrix Multiplication Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("../shaders/matrix_multiplication.wgsl"))),
        });

        let matmul = Self::create_kernel(
            &device,
            &shader,
            "matmul",
            &[storage_entry(0, true), storage_entry(1, true), storage_entry(2, false), uniform_entry(3)],
        );
        let fill = Self::create_kernel(&device, &shader, "fill_pattern", &[storage_entry(2, false), uniform_entry(3)]);

        Ok(Self { info, device, queue, matmul, fill })
    }

    fn create_kernel(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        entry_point: &str,
        entries: &[wgpu::BindGroupLayoutEntry],
    ) -> Kernel {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(entry_point),
            entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(entry_point),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(entry_point),
            layout: Some(&pipeline_layout),
            module: shader,
            entry_point,
            cache: None,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        });

        Kernel { pipeline, bind_group_layout }
    }

    pub fn info(&self) -> DeviceReport {
        DeviceReport {
            name: self.info.name.clone(),
            backend: self.info.backend,
            device_type: self.info.device_type,
            parallelism: self.device.limits().max_compute_invocations_per_workgroup,
        }
    }

    fn check_capacity(&self, elements: usize) -> Result<()> {
        let bytes = buffer_size(elements);
        let limit = u64::from(self.device.limits().max_storage_buffer_binding_size);
        if bytes > limit {
            return Err(Error::BufferTooLarge { bytes, limit });
        }
        Ok(())
    }

    fn workgroups(&self, rows: usize, cols: usize) -> Result<(u32, u32)> {
        let x = dim_u32(cols)?.div_ceil(WORKGROUP_SIZE);
        let y = dim_u32(rows)?.div_ceil(WORKGROUP_SIZE);
        let max = self.device.limits().max_compute_workgroups_per_dimension;
        if x > max || y > max {
            return Err(Error::Kernel(format!(
                "dispatch of {}x{} workgroups exceeds the per-dimension limit of {}",
                x, y, max
            )));
        }
        Ok((x, y))
    }

    fn dims_buffer(&self, dims: [u32; 4]) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Dims Uniform"),
            contents: bytemuck::cast_slice(&dims),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }

    fn storage_buffer(&self, label: &str, elements: usize) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: buffer_size(elements),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    async fn check_errors(&self) -> Result<()> {
        match self.device.pop_error_scope().await {
            Some(err) => Err(Error::Kernel(err.to_string())),
            None => Ok(()),
        }
    }

    /// Copies a host matrix into device memory.
    pub async fn upload(&self, matrix: &Matrix) -> Result<DeviceMatrix> {
        self.check_capacity(matrix.len())?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let buffer = self.storage_buffer("Device Matrix", matrix.len());
        if !matrix.is_empty() {
            self.queue.write_buffer(&buffer, 0, bytemuck::cast_slice(matrix.as_slice()));
        }
        self.check_errors().await?;

        Ok(DeviceMatrix { buffer, rows: matrix.rows(), cols: matrix.cols() })
    }

    /// Initializes a device matrix in place with a fill kernel.
    pub async fn fill(&self, pattern: Pattern, rows: usize, cols: usize) -> Result<DeviceMatrix> {
        self.check_capacity(rows * cols)?;
        let (x, y) = self.workgroups(rows, cols)?;
        let dims = [dim_u32(rows)?, 0, dim_u32(cols)?, pattern_id(pattern)];

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let buffer = self.storage_buffer("Device Matrix", rows * cols);
        let dims = self.dims_buffer(dims);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Fill Bind Group"),
            layout: &self.fill.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 2, resource: buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: dims.as_entire_binding() },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Fill Command Encoder"),
        });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Fill Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.fill.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(x, y, 1);
        }
        self.queue.submit(Some(encoder.finish()));
        self.check_errors().await?;

        log::debug!("Filled {}x{} device matrix with {:?}", rows, cols, pattern);
        Ok(DeviceMatrix { buffer, rows, cols })
    }

    /// Launches `a * b` with one invocation per output element and returns
    /// without waiting for the device.
    pub async fn submit(&self, a: &DeviceMatrix, b: &DeviceMatrix) -> Result<Completion<'_>> {
        if a.cols != b.rows {
            return Err(Error::ShapeMismatch { lhs: a.shape(), rhs: b.shape(), out: (a.rows, b.cols) });
        }
        let (rows, inner, cols) = (a.rows, a.cols, b.cols);
        self.check_capacity(rows * cols)?;
        let (x, y) = self.workgroups(rows, cols)?;
        let dims = [dim_u32(rows)?, dim_u32(inner)?, dim_u32(cols)?, 0];
        log::debug!("Dispatching {}x{} workgroups for a {}x{} result", x, y, rows, cols);

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let output = self.storage_buffer("Output Buffer", rows * cols);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer"),
            size: buffer_size(rows * cols),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let dims = self.dims_buffer(dims);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Matmul Bind Group"),
            layout: &self.matmul.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: a.buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: b.buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: output.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: dims.as_entire_binding() },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Matmul Command Encoder"),
        });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Matmul Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.matmul.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(x, y, 1);
        }
        encoder.copy_buffer_to_buffer(&output, 0, &staging, 0, buffer_size(rows * cols));
        self.queue.submit(Some(encoder.finish()));
        self.check_errors().await?;

        Ok(Completion { ctx: self, staging, rows, cols })
    }

    /// Uploads both operands, multiplies and writes the result into `c`.
    pub async fn multiply(&self, a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()> {
        if c.shape() != (a.rows(), b.cols()) {
            return Err(Error::ShapeMismatch { lhs: a.shape(), rhs: b.shape(), out: c.shape() });
        }
        let a = self.upload(a).await?;
        let b = self.upload(b).await?;
        self.submit(&a, &b).await?.wait(c).await
    }

    /// Reads a device matrix back to the host.
    pub async fn download(&self, matrix: &DeviceMatrix) -> Result<Matrix> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer"),
            size: buffer_size(matrix.len()),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Download Command Encoder"),
        });
        encoder.copy_buffer_to_buffer(&matrix.buffer, 0, &staging, 0, buffer_size(matrix.len()));
        self.queue.submit(Some(encoder.finish()));
        self.check_errors().await?;

        let mut out = Matrix::zeros(matrix.rows, matrix.cols);
        Completion { ctx: self, staging, rows: matrix.rows, cols: matrix.cols }.wait(&mut out).await?;
        Ok(out)
    }
}

impl Completion<'_> {
    /// Blocks until the device has finished and copies the result into `out`.
    pub async fn wait(self, out: &mut Matrix) -> Result<()> {
        if out.shape() != (self.rows, self.cols) {
            return Err(Error::ShapeMismatch { lhs: (self.rows, self.cols), rhs: (self.rows, self.cols), out: out.shape() });
        }

        let slice = self.staging.slice(..);
        let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver only disappears if `wait` itself was dropped.
            let _ = sender.send(result);
        });
        self.ctx.device.poll(wgpu::Maintain::Wait);

        receiver.receive().await.ok_or(Error::ChannelClosed)??;

        {
            let data = slice.get_mapped_range();
            let values: &[f32] = bytemuck::cast_slice(&data);
            let len = out.len();
            out.as_mut_slice().copy_from_slice(&values[..len]);
        }
        self.staging.unmap();
        Ok(())
    }
}
