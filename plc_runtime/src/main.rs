//! # PLC Runtime Binary
//!
//! Binds a glue map, runs the loopback control program every scan cycle
//! and drives the built-in services around it.
//!
//! # Usage
//!
//! ```bash
//! # Run until Ctrl-C
//! plc_runtime --config config/runtime.toml --glue config/glue.toml
//!
//! # Run 100 cycles with debug logging
//! plc_runtime -c config/runtime.toml -g config/glue.toml --cycles 100 -v
//! ```

use clap::Parser;
use plc_common::config::{ConfigLoader, LogLevel};
use plc_common::consts::{DEFAULT_CONFIG_PATH, DEFAULT_GLUE_PATH};
use plc_runtime::config::{GlueMap, RuntimeConfig};
use plc_runtime::core::{RuntimeCore, check_checksum};
use plc_runtime::image::ProcessImage;
use plc_runtime::program::LoopbackProgram;
use plc_runtime::services::builtin_services;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// PLC Runtime - glue binding and scan-cycle orchestration
#[derive(Parser, Debug)]
#[command(name = "plc_runtime")]
#[command(version)]
#[command(about = "PLC runtime core: glue binding, scan cycle and service lifecycle")]
#[command(long_about = None)]
struct Args {
    /// Path to runtime configuration file (runtime.toml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Path to generated glue map (glue.toml)
    #[arg(short, long, default_value = DEFAULT_GLUE_PATH)]
    glue: PathBuf,

    /// Stop after N scan cycles (overrides runtime.max_cycles)
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Logging needs the configured level, so load the config first and
    // report its failure once tracing is up.
    let config = RuntimeConfig::load_validated(&args.config);
    let level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);

    let result = config
        .map_err(Box::<dyn std::error::Error>::from)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("Runtime startup failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args, config: RuntimeConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "PLC runtime v{} starting as '{}'...",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    info!("Loading glue map from {:?}", args.glue);
    let glue = GlueMap::load_validated(&args.glue)?;
    let image = ProcessImage::from_map(&glue)?;
    let binding = image.bind()?;
    check_checksum(&config.runtime, &binding)?;

    let registry = builtin_services(&binding, &config)?;
    let program = LoopbackProgram::new(&binding);
    let mut core = RuntimeCore::new(&binding, registry, program, &config.runtime);

    // Setup signal handler. The loop exits at the next cycle boundary and
    // shutdown() then stops and finalizes services.
    let running = core.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    core.start()?;
    let max_cycles = args.cycles.or(config.runtime.max_cycles);
    core.run(max_cycles);
    let stats = core.stats();
    info!(
        "Cycle stats: {} cycles, avg={}us, max={}us, overruns={}",
        stats.cycle_count,
        stats.avg_cycle_us(),
        stats.max_cycle_us,
        stats.overruns
    );
    core.shutdown();

    info!("PLC runtime shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
