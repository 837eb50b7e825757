//! blaeck-tcp Demo Server
//!
//! Serves a handful of synthetic signals over the BlaeckTCP protocol.

use std::thread;
use std::time::{Duration, Instant};

use blaeck_tcp::{CommandHookPolicy, Config, Engine, ProtocolVersion, TcpServer, TimestampMode, Variable};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// blaeck-tcp Server
#[derive(Parser, Debug)]
#[command(name = "blaeck-server")]
#[command(about = "Telemetry demo device speaking BlaeckTCP")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:23")]
    listen: String,

    /// Number of client slots
    #[arg(short = 'c', long, default_value = "4")]
    max_clients: usize,

    /// Bit mask of client slots receiving data (default: all)
    #[arg(short = 'm', long)]
    data_mask: Option<u32>,

    /// Start periodic data at this interval in ms without waiting for ACTIVATE
    #[arg(short, long)]
    interval: Option<u64>,

    /// Attach microsecond timestamps to data messages
    #[arg(long)]
    timestamps: bool,

    /// Speak the older V4 wire format
    #[arg(long)]
    v4: bool,

    /// Send only signals that changed since the last periodic send
    #[arg(long)]
    updated_only: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,blaeck_tcp=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .listen_addr(&args.listen)
        .max_clients(args.max_clients)
        .device_name("blaeck-tcp demo")
        .hw_version("host")
        .fw_version(blaeck_tcp::VERSION)
        .command_hook_policy(CommandHookPolicy::UnrecognizedOnly)
        .timestamp_mode(if args.timestamps { TimestampMode::Micros } else { TimestampMode::None })
        .protocol_version(if args.v4 { ProtocolVersion::V4 } else { ProtocolVersion::V5 });
    if let Some(mask) = args.data_mask {
        builder = builder.data_client_mask(mask);
    }

    let config = match builder.build() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = match TcpServer::bind(&config.listen_addr) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start listener on {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listen address: {}", config.listen_addr);

    let mut engine = Engine::new(config, server);

    let uptime = Variable::new(0u32);
    let sine = Variable::new(0.0f32);
    let counter = Variable::new(0i16);
    let toggle = Variable::new(false);

    let registered = engine
        .add_signal("uptime_ms", &uptime)
        .and_then(|_| engine.add_signal("sine", &sine))
        .and_then(|_| engine.add_signal("counter", &counter))
        .and_then(|_| engine.add_signal("toggle", &toggle));
    if let Err(e) = registered {
        tracing::error!("Failed to register signals: {}", e);
        std::process::exit(1);
    }

    engine.set_command_hook(|frame: &blaeck_tcp::protocol::CommandFrame| {
        tracing::info!("Application command '{}' (p0 = {}, text = '{}')", frame.verb, frame.params[0], frame.text);
    });

    if let Some(interval) = args.interval {
        engine.set_timed_data(true, interval);
    }

    let start = Instant::now();
    let mut last_toggle = 0u128;

    loop {
        let elapsed = start.elapsed();
        uptime.set(elapsed.as_millis() as u32);
        sine.set((elapsed.as_secs_f32() * std::f32::consts::TAU / 5.0).sin());
        engine.mark_signal_updated(0);
        engine.mark_signal_updated(1);

        if elapsed.as_millis() - last_toggle >= 1000 {
            last_toggle = elapsed.as_millis();
            counter.modify(|c| *c = c.wrapping_add(1));
            toggle.modify(|t| *t = !*t);
            engine.mark_signal_updated(2);
            engine.mark_signal_updated(3);
        }

        if args.updated_only {
            engine.tick_updated();
        } else {
            engine.tick();
        }

        thread::sleep(Duration::from_millis(1));
    }
}
