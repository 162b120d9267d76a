// main.rs

use matmul_bench::bench;
use matmul_bench::config::BenchConfig;
use matmul_bench::gpu::GpuContext;

async fn run(config: BenchConfig) -> matmul_bench::Result<()> {
    let ctx = GpuContext::with_power_preference(config.power_preference).await?;
    println!("{}", ctx.info());

    let report = bench::run(&ctx, &config).await?;
    println!("{}", report);
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(err) = run(BenchConfig::default()).await {
        log::error!("{:?}", err);
        println!("An error occurred while multiplying matrices: {}", err);
        std::process::abort();
    }
}
