mod frames;

use clap::Parser;
use frames::SensorState;
use rand::Rng;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// Emits Arduino-format humidity/temperature frames, for driving the
/// recorder without hardware attached.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Serial port to write frames to; frames go to stdout when omitted
    #[arg(long, env = "SERIAL_PORT")]
    port: Option<String>,

    #[arg(long, env = "BAUD_RATE", default_value_t = 9600)]
    baud: u32,

    /// Milliseconds between frames
    #[arg(long, default_value_t = 2000)]
    interval_ms: u64,

    /// Fraction of frames emitted with a failed checksum flag
    #[arg(long, default_value_t = 0.05)]
    invalid_ratio: f64,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let invalid_ratio = args.invalid_ratio.clamp(0.0, 1.0);

    info!("Starting sensor simulator");
    info!(
        "Output: {}, interval: {}ms, invalid ratio: {}",
        args.port.as_deref().unwrap_or("stdout"),
        args.interval_ms,
        invalid_ratio
    );

    let mut out: Box<dyn Write> = match &args.port {
        Some(port) => {
            let port = serialport::new(port, args.baud).open().unwrap_or_else(|e| {
                error!("Failed to open serial port: {}", e);
                std::process::exit(1);
            });
            Box::new(port)
        }
        None => Box::new(io::stdout()),
    };

    let mut rng = rand::thread_rng();
    let mut state = SensorState::new();
    let mut counter = 0u64;

    loop {
        state.step(&mut rng);
        let valid = !rng.gen_bool(invalid_ratio);
        let frame = state.frame(valid);

        match writeln!(out, "{}", frame).and_then(|_| out.flush()) {
            Ok(()) => {
                counter += 1;
                if counter % 100 == 0 {
                    info!("Emitted {} frames", counter);
                }
            }
            Err(e) => {
                warn!("Failed to write frame: {}", e);
            }
        }

        thread::sleep(Duration::from_millis(args.interval_ms));
    }
}
