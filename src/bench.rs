use std::fmt;

use crate::config::BenchConfig;
use crate::cpu::multiply_serial;
use crate::error::Result;
use crate::gpu::GpuContext;
use crate::matrix::{init_matrices, Matrix, Pattern};
use crate::timing::{timed, TimeInterval};
use crate::verify::{verify_results, Verdict};

/// Timings and verdict of one serial-versus-parallel run.
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub serial_secs: f64,
    /// Output allocation, dispatch, wait and readback into host memory.
    pub parallel_secs: f64,
    pub verdict: Verdict,
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>20}{}s", "Serial time: ", self.serial_secs)?;
        writeln!(f, "{:>20}{}s", "Parallel time: ", self.parallel_secs)?;
        write!(f, "{}", self.verdict)
    }
}

/// Multiplies the ones matrix by the row-index ramp on the device and on
/// the host, timing each, and compares the two results.
///
/// The device operands are initialized on the device; the host operands are
/// initialized on the host. Only device failures are returned as errors.
pub async fn run(ctx: &GpuContext, config: &BenchConfig) -> Result<BenchReport> {
    let n = config.dim;
    let mut a = Matrix::zeros(n, n);
    let mut b = Matrix::zeros(n, n);
    let mut c_serial = Matrix::zeros(n, n);
    let mut c_parallel = Matrix::zeros(n, n);
    init_matrices(&mut a, &mut b, &mut c_serial, &mut c_parallel);

    let a_dev = ctx.fill(Pattern::Ones, n, n).await?;
    let b_dev = ctx.fill(Pattern::RowIndex, n, n).await?;

    let t_par = TimeInterval::new();
    ctx.submit(&a_dev, &b_dev).await?.wait(&mut c_parallel).await?;
    let parallel_secs = t_par.elapsed();
    log::info!("Parallel multiplication of {}x{} finished in {:.6}s (dispatch and readback)", n, n, parallel_secs);

    let (serial, serial_secs) = timed(|| multiply_serial(&a, &b, &mut c_serial));
    serial?;
    log::info!("Serial multiplication of {}x{} finished in {:.6}s", n, n, serial_secs);

    let verdict = verify_results(&c_serial, &c_parallel, config.tolerance);
    Ok(BenchReport { serial_secs, parallel_secs, verdict })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::DeviceReport;

    #[test]
    fn report_layout() {
        let report = BenchReport { serial_secs: 1.5, parallel_secs: 0.25, verdict: Verdict::Match };
        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "       Serial time: 1.5s");
        assert_eq!(lines[1], "     Parallel time: 0.25s");
        assert_eq!(lines[2], "Results match.");
    }

    #[test]
    fn device_report_layout() {
        let device = DeviceReport {
            name: "Test Adapter".into(),
            backend: wgpu::Backend::Vulkan,
            device_type: wgpu::DeviceType::DiscreteGpu,
            parallelism: 256,
        };
        assert_eq!(device.to_string(), "Device: Test Adapter\nMax invocations per workgroup: 256");
    }
}
