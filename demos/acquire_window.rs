// Continuous window acquisition example
//
// This example reads windows of line-delimited readings from a serial device
// and prints per-channel statistics for each window.

use clap::Parser;
use polars::prelude::DataFrame;
use sensor_core_rs::{AcquisitionConfig, AcquisitionSession};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "acquire_window")]
#[command(version = "1.0")]
#[command(about = "Acquire windows of multi-channel data from a serial device")]
struct Args {
    /// Serial port to read from
    port: String,

    /// Baud rate
    #[arg(short, long, default_value_t = 115_200)]
    baud_rate: u32,

    /// Number of channels per timepoint
    #[arg(short = 'c', long, default_value_t = 1)]
    num_channels: usize,

    /// Number of timepoints per window
    #[arg(short, long, default_value_t = 10)]
    window_size: usize,

    /// Per-line read timeout in milliseconds
    #[arg(short, long, default_value_t = 100)]
    timeout_ms: u64,

    /// Number of windows to acquire
    #[arg(short = 'n', long, default_value_t = 5)]
    windows: usize,

    /// Enable verbose logging
    #[arg(short, long, help = "Show debug information and detailed logs")]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let config = AcquisitionConfig::builder(&args.port, args.baud_rate)
        .num_channels(args.num_channels)
        .window_size(args.window_size)
        .read_timeout(Duration::from_millis(args.timeout_ms))
        .build()?;

    println!("Window Acquisition");
    println!("==================");
    println!(
        "Port: {} @ {} baud, {} channel(s) x {} timepoint(s)\n",
        config.port(),
        config.baud_rate(),
        config.num_channels(),
        config.window_size()
    );

    let mut session = AcquisitionSession::new(config);
    session.open()?;

    for i in 0..args.windows {
        match session.acquire(None)? {
            Some(window) => {
                println!("[Window {}] {} valid row(s)", i, window.rows());
                print_channel_summary(&window.to_dataframe()?)?;
            }
            None => println!("[Window {}] no data", i),
        }
        if let Some(warning) = session.last_warning() {
            println!("   warning: {}", warning);
        }
    }

    session.close()?;
    Ok(())
}

// Helper function to print basic statistics about each channel
fn print_channel_summary(data: &DataFrame) -> Result<(), Box<dyn std::error::Error>> {
    for column in data.get_columns() {
        let values: Vec<f64> = column.f64()?.into_no_null_iter().collect();
        if values.is_empty() {
            continue;
        }

        let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        println!(
            "   {}: {:.3} to {:.3} (mean: {:.3})",
            column.name(),
            min,
            max,
            mean
        );
    }

    Ok(())
}
