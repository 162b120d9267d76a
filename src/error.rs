/// Errors raised while preparing or running a multiplication.
///
/// A verification mismatch is not an error; see [`crate::verify::Verdict`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No compatible compute adapter found")]
    AdapterNotFound,

    #[error("Failed to open device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("Kernel launch failed: {0}")]
    Kernel(String),

    #[error("Failed to read results back from the device: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),

    #[error("Device dropped the readback channel before completion")]
    ChannelClosed,

    #[error("Matrix of {bytes} bytes exceeds the device storage binding limit of {limit} bytes")]
    BufferTooLarge { bytes: u64, limit: u64 },

    #[error("Shape mismatch: cannot multiply {lhs:?} by {rhs:?} into {out:?}")]
    ShapeMismatch {
        lhs: (usize, usize),
        rhs: (usize, usize),
        out: (usize, usize),
    },
}

impl Error {
    /// True for failures of the adapter, device or kernel, as opposed to
    /// caller mistakes such as mismatched shapes.
    pub fn is_device_failure(&self) -> bool {
        !matches!(self, Error::ShapeMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
