//! Sample command implementation.
//!
//! Runs the samplers a few times and prints the usage line each tick would
//! write. Nothing is logged to file and no alert is dispatched.

use std::time::{Duration, Instant};

use proxy_usage_monitor::logwriter::format_usage_line;
use proxy_usage_monitor::HostingEnvironment;

use super::{build_monitor, ConfigSource};

pub async fn command_sample(source: ConfigSource, iterations: usize) -> anyhow::Result<()> {
    let config = source.load()?;
    let monitor = build_monitor(config, HostingEnvironment::detect())?;
    let date_format = monitor.config().logging.date_format.clone();

    println!("🧪 Proxy Usage Monitor - Sample Mode");
    println!("====================================");

    for iteration in 1..=iterations.max(1) {
        // CPU load is a delta; give it a window to measure.
        tokio::time::sleep(Duration::from_secs(1)).await;

        let start = Instant::now();
        let snapshot = monitor.collect().await;
        println!("\n🔄 Iteration {}/{}:", iteration, iterations.max(1));
        println!("   {}", format_usage_line(&snapshot, &date_format));
        println!(
            "   ⏱️  Sample duration: {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    println!("\n✅ Sampling completed");
    Ok(())
}
