use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use mecanum_drive_runtime::config::{CMD_TIMEOUT, LOOP_HZ};
use mecanum_drive_runtime::runtime::{self, RuntimeOptions};

/// Mecanum drivetrain runtime
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Control loop frequency in Hz (1-1000)
    #[arg(long, default_value_t = LOOP_HZ, value_parser = clap::value_parser!(u64).range(1..=1000))]
    loop_hz: u64,

    /// Zero the drive command after this long without a new one
    #[arg(long, default_value_t = CMD_TIMEOUT.as_millis() as u64)]
    cmd_timeout_ms: u64,

    /// Wrap the heading difference into (-pi, pi] when estimating angular velocity
    #[arg(long)]
    wrap_heading: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();
    let options = RuntimeOptions {
        loop_hz: args.loop_hz,
        cmd_timeout: Duration::from_millis(args.cmd_timeout_ms),
        wrap_heading: args.wrap_heading,
    };

    if let Err(e) = runtime::run(options).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
