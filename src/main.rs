use clap::Parser;
use log::{error, info, warn};
use sensor_chrdev::config::{Config, load_dotenv};
use sensor_chrdev::input::run_sensor_simulation;
use sensor_chrdev::{
    DeviceAddress, Interrupt, ReadMode, ReaderSession, Result, SensorError, SensorRegistry,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Stream live readings from simulated sensors.
#[derive(Parser, Debug)]
#[command(name = "sensor-chrdev", version, about)]
struct Args {
    /// Device nodes to read, e.g. sensor0-temp or /dev/sensor1-batt
    #[arg(default_value = "sensor0-temp")]
    devices: Vec<DeviceAddress>,

    /// JSON configuration file
    #[arg(short, long, env = "SENSOR_CONFIG")]
    config: Option<PathBuf>,

    /// Number of simulated sensors (overrides the configuration)
    #[arg(long)]
    sensors: Option<u32>,

    /// Sampling period in milliseconds (overrides the configuration)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Bytes requested per read call
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// Stop each reader after this many lines
    #[arg(long)]
    lines: Option<usize>,

    /// Poll instead of sleeping on the sensor
    #[arg(long)]
    non_blocking: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let path = args
        .config
        .clone()
        .or_else(|| Config::default_path().filter(|p| p.exists()));

    let mut config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    config.apply_env();

    if let Some(count) = args.sensors {
        config.sensors.count = count;
    }
    if let Some(interval) = args.interval_ms {
        config.simulation.interval_ms = interval;
    }
    config.validate()?;
    Ok(config)
}

/// Pump complete lines from one session to stdout until interrupted.
fn stream_lines(
    session: ReaderSession,
    chunk_size: usize,
    max_lines: Option<usize>,
    mode: ReadMode,
    poll: Duration,
    interrupt: Interrupt,
) -> Result<usize> {
    let address = session.address();
    let mut line = Vec::new();
    let mut lines = 0;

    while max_lines.is_none_or(|max| lines < max) {
        match session.read_to(&mut line, chunk_size, mode, &interrupt) {
            Ok(_) => {}
            Err(SensorError::WouldBlock) if !interrupt.is_raised() => {
                std::thread::sleep(poll);
                continue;
            }
            Err(SensorError::WouldBlock | SensorError::Interrupted) => break,
            Err(e) => return Err(e),
        }

        if session.cursor() == 0 {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "{}: {}", address, String::from_utf8_lossy(&line))?;
            stdout.flush()?;
            line.clear();
            lines += 1;
        }
    }

    session.close();
    Ok(lines)
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_logger();

    let args = Args::parse();
    info!("Starting sensor-chrdev");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded:");
    info!("  Sensors: {}", config.sensors.count);
    info!("  Sampling interval: {} ms", config.simulation.interval_ms);
    info!("  Calibration table length: {}", config.calibration.table_len);

    let registry = match SensorRegistry::from_config(&config) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Failed to set up sensors: {}", e);
            std::process::exit(1);
        }
    };

    let simulation = run_sensor_simulation(
        registry.clone(),
        config.simulation.clone(),
        config.calibration.table_len,
    );

    let mode = if args.non_blocking {
        ReadMode::NonBlocking
    } else {
        ReadMode::Blocking
    };
    let poll = Duration::from_millis(config.simulation.interval_ms / 2 + 1);
    let interrupt = Interrupt::new();

    let mut readers = Vec::new();
    for address in &args.devices {
        let session = match registry.open(*address) {
            Ok(session) => session,
            Err(e) => {
                warn!("Cannot open {}: {}", address, e);
                continue;
            }
        };
        let interrupt = interrupt.clone();
        let (chunk_size, lines) = (args.chunk_size, args.lines);
        readers.push(tokio::task::spawn_blocking(move || {
            stream_lines(session, chunk_size, lines, mode, poll, interrupt)
        }));
    }

    if readers.is_empty() {
        error!("No readable devices given");
    } else {
        info!("Reading {} devices, press Ctrl+C to exit", readers.len());
    }

    let on_signal = interrupt.clone();
    let signal_task = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                on_signal.raise();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    for reader in readers {
        match reader.await {
            Ok(Ok(lines)) => info!("Reader finished after {} lines", lines),
            Ok(Err(e)) => error!("Reader failed: {}", e),
            Err(e) => error!("Reader task panicked: {}", e),
        }
    }
    signal_task.abort();

    simulation.abort();
    match simulation.await {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => {}
        Err(e) => error!("Simulation task panicked: {}", e),
    }

    match Arc::try_unwrap(registry) {
        Ok(registry) => registry.teardown(),
        Err(_) => warn!("Registry still shared at shutdown"),
    }
    info!("sensor-chrdev stopped");
}
