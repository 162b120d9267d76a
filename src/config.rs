use crate::verify::Tolerance;

/// Side length of the square matrices multiplied by the benchmark binary.
pub const MATRIX_DIM: usize = 1000;

/// Settings for one benchmark run. The binary always uses `Default`.
#[derive(Debug, Clone, Copy)]
pub struct BenchConfig {
    pub dim: usize,
    pub tolerance: Tolerance,
    pub power_preference: wgpu::PowerPreference,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            dim: MATRIX_DIM,
            tolerance: Tolerance::default(),
            power_preference: wgpu::PowerPreference::default(),
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "macos", target_os = "ios"))] {
        /// Backends probed when opening a device.
        pub fn default_backends() -> wgpu::Backends {
            wgpu::Backends::METAL
        }
    } else {
        /// Backends probed when opening a device.
        pub fn default_backends() -> wgpu::Backends {
            wgpu::Backends::all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_benchmark() {
        let config = BenchConfig::default();
        assert_eq!(config.dim, 1000);
        assert_eq!(config.tolerance, Tolerance::Relative(f32::EPSILON));
        assert!(!default_backends().is_empty());
    }
}
