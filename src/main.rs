//! Drishti - headless map console
//!
//! Connects to the topic bridge, feeds the map and transform streams into a
//! [`MapConsole`] and drives it at display rate:
//!
//! - **Receiver thread**: reads bridge frames, decodes grid/transform
//!   messages, sends [`InboundEvent`]s over a bounded channel
//! - **Operator thread**: parses command lines from stdin (see
//!   [`drishti::operator`]) and sends them over a second channel
//! - **Main thread**: owns the console and the command publisher;
//!   multiplexes both channels, the display-frame ticker, the status
//!   ticker, the snapshot ticker and the reconnect timer
//!
//! When the bridge drops, the link is released and reopened after
//! `connection.reconnect_delay_ms`; each new link starts from an empty
//! transform tree. The rendered frame is written to PNG periodically and on
//! exit.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{after, never, select, tick};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use drishti::config::DrishtiConfig;
use drishti::console::MapConsole;
use drishti::error::Result;
use drishti::io::{BridgeLink, CommandPublisher, InboundEvent};
use drishti::operator;
use drishti::utils::setup_ctrl_c_handler;

/// How often the status line is checked for changes.
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

type Publisher = CommandPublisher<Option<BridgeLink>>;

#[derive(Parser)]
#[command(name = "drishti")]
#[command(about = "Headless operator map console for a topic bridge")]
struct Args {
    /// Configuration file (defaults to drishti.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bridge IP address override
    #[arg(long)]
    bridge_ip: Option<String>,

    /// Bridge port override
    #[arg(long)]
    port: Option<u16>,

    /// Start with pose/goal gestures enabled (toggle later with `nav on|off`)
    #[arg(long)]
    navigation: bool,

    /// Snapshot path override
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("drishti=info")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("Drishti failed: {}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<DrishtiConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            DrishtiConfig::load(path)?
        }
        None if Path::new("drishti.toml").exists() => {
            info!("Loading configuration from drishti.toml");
            DrishtiConfig::load(Path::new("drishti.toml"))?
        }
        None => {
            info!("Using default configuration");
            DrishtiConfig::default()
        }
    };

    if let Some(ip) = &args.bridge_ip {
        config.connection.bridge_ip = ip.clone();
    }
    if let Some(port) = args.port {
        config.connection.port = port;
    }
    if args.navigation {
        config.navigation.enabled = true;
    }
    if let Some(path) = &args.snapshot {
        config.display.snapshot_path = path.to_string_lossy().into_owned();
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;

    info!("Drishti v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Surface {}x{} @ {:.0} Hz, navigation {}",
        config.display.width,
        config.display.height,
        config.display.frame_rate_hz,
        if config.navigation.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    let running = setup_ctrl_c_handler()?;
    let mut console = MapConsole::new(&config);
    let mut publisher: Publisher = CommandPublisher::new(None, &config);

    attach_link(&config, &running, &mut console, &mut publisher)?;
    let mut inputs = operator::spawn_stdin_reader()?;

    let snapshot_path = PathBuf::from(&config.display.snapshot_path);
    let frame_tick = tick(config.display.frame_interval());
    let status_tick = tick(STATUS_INTERVAL);
    let snapshot_tick = if config.display.snapshot_interval_secs > 0 {
        tick(Duration::from_secs(config.display.snapshot_interval_secs))
    } else {
        never()
    };
    let mut reconnect = never();

    let mut last_status = String::new();
    let mut frames_drawn: u64 = 0;
    let mut reconnects: u32 = 0;

    while running.load(Ordering::Relaxed) {
        // Cloned per iteration so closing a link leaves no receiver alive
        let events = publisher
            .sink()
            .as_ref()
            .map(|link| link.events().clone())
            .unwrap_or_else(never);
        let mut link_lost = false;
        let mut input_closed = false;
        let mut retry_due = false;

        select! {
            recv(events) -> event => match event {
                Ok(InboundEvent::Grid(grid)) => {
                    console.handle_grid(&grid);
                }
                Ok(InboundEvent::Transforms { entries, is_static }) => {
                    let accepted = console.handle_transforms(&entries, Instant::now());
                    if is_static {
                        debug!("Static transforms: {}/{} accepted", accepted, entries.len());
                    }
                }
                Ok(InboundEvent::Disconnected) | Err(_) => link_lost = true,
            },
            recv(inputs) -> input => match input {
                Ok(input) => {
                    operator::apply(input, &mut console, &mut publisher);
                }
                Err(_) => input_closed = true,
            },
            recv(reconnect) -> _ => retry_due = true,
            recv(frame_tick) -> _ => {
                if console.on_frame() {
                    frames_drawn += 1;
                }
            },
            recv(status_tick) -> _ => {
                let status = console.status_text();
                if status != last_status {
                    info!("{}", status);
                    last_status = status;
                }
            },
            recv(snapshot_tick) -> _ => {
                if let Err(e) = console.save_snapshot(&snapshot_path) {
                    warn!("Snapshot failed: {}", e);
                }
            },
        }
        drop(events);

        if input_closed {
            debug!("Operator input closed");
            inputs = never();
        }
        if retry_due {
            reconnect = never();
            match attach_link(&config, &running, &mut console, &mut publisher) {
                Ok(()) => reconnects += 1,
                Err(e) => {
                    warn!("Reconnect failed: {}", e);
                    if let Some(delay) = config.connection.reconnect_delay() {
                        reconnect = after(delay);
                    }
                }
            }
        }
        if link_lost {
            warn!("Bridge disconnected");
            publisher.release();
            match config.connection.reconnect_delay() {
                Some(delay) => {
                    info!("Reconnecting in {:?}", delay);
                    reconnect = after(delay);
                }
                None => break,
            }
        }
    }

    // Teardown: every step is idempotent
    info!("Shutting down...");
    running.store(false, Ordering::SeqCst);
    publisher.release();

    console.render_now();
    match console.save_snapshot(&snapshot_path) {
        Ok(()) => info!("Final frame written to {}", snapshot_path.display()),
        Err(e) => warn!("Final snapshot failed: {}", e),
    }
    console.detach();

    let stats = console.stats();
    info!(
        "Drishti finished: {} frames drawn, {} reconnects, {} commands sent ({} dropped), {} grids ({} rejected), {} transform batches ({} entries rejected)",
        frames_drawn,
        reconnects,
        publisher.sent(),
        publisher.dropped(),
        stats.grids_accepted,
        stats.grids_rejected,
        stats.transform_batches,
        stats.transforms_rejected
    );
    Ok(())
}

/// Open a link, start a fresh transform tree and let commands through.
fn attach_link(
    config: &DrishtiConfig,
    running: &Arc<AtomicBool>,
    console: &mut MapConsole,
    publisher: &mut Publisher,
) -> Result<()> {
    info!("Connecting to {}", config.address());
    let link = BridgeLink::open(config, running.clone())?;
    console.reset_transforms();
    publisher.attach(link)
}
