//! Jewelry try-on entry point.
//!
//! # Usage
//!
//! ```bash
//! # Serve the try-on page and its models on port 3000 (default)
//! tryon serve --root public
//!
//! # Run a full session against a synthetic camera and simulated pose model
//! tryon simulate --frames 300 --cycle-every 60
//! ```

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use tryon_lib::core::asset_registry::FileAssetLoader;
use tryon_lib::core::scene_renderer::TracingRenderer;
use tryon_lib::platform::capture::SyntheticCamera;
use tryon_lib::platform::pose::SimulatedMediaPipe;
use tryon_lib::{rotate_selection, spawn_session, Config, JewelryCategory, RunningSession};

/// Augmented-reality jewelry try-on
#[derive(Parser, Debug)]
#[command(name = "tryon")]
#[command(author, version, about = "Augmented-reality jewelry try-on", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// JSON configuration file, created with defaults if missing
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the application root over HTTP (default if no subcommand)
    Serve {
        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Bind address
        #[arg(short, long)]
        bind: Option<String>,

        /// Directory to serve
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Run a try-on session with a synthetic camera and simulated pose model
    Simulate {
        /// Number of camera frames to process
        #[arg(short, long, default_value = "300")]
        frames: u64,

        /// Switch to the next jewelry category every N frames
        #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
        cycle_every: u64,

        /// Simulate losing the body every N frames
        #[arg(long, default_value = "45", value_parser = clap::value_parser!(u64).range(1..))]
        dropout_every: u64,

        /// Category selected at start
        #[arg(long)]
        select: Option<JewelryCategory>,

        /// Directory holding the jewelry assets
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("tryon v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => Config::load(path).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?,
        None => Config::default(),
    };

    match cli.command {
        None => run_server(config).await?,
        Some(Commands::Serve { port, bind, root }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(root) = root {
                config.app_root = root;
            }
            run_server(config).await?;
        }
        Some(Commands::Simulate {
            frames,
            cycle_every,
            dropout_every,
            select,
            root,
        }) => {
            if let Some(category) = select {
                config.initial_category = category;
            }
            if let Some(root) = root {
                config.app_root = root;
            }
            run_simulation(config, frames, cycle_every, dropout_every).await?;
        }
    }

    Ok(())
}

/// Serve static files until interrupted
async fn run_server(config: Config) -> anyhow::Result<()> {
    config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    if !config.app_root.is_dir() {
        warn!(
            "Application root {} is not a directory; every request will return 404",
            config.app_root.display()
        );
    }

    for (category, path) in &config.asset_paths {
        if !config.app_root.join(path).is_file() {
            warn!("Asset for {} not found at {}", category, path.display());
        }
    }

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    tryon_lib::core::static_server::serve(addr, &config.app_root).await?;

    Ok(())
}

/// Run one simulated session, rotating the selection as it goes
async fn run_simulation(
    config: Config,
    frames: u64,
    cycle_every: u64,
    dropout_every: u64,
) -> anyhow::Result<()> {
    config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    let fps = config.target_fps;
    let pose = SimulatedMediaPipe::new(&config.pose, fps)?.with_dropout_every(dropout_every);
    let camera = SyntheticCamera::new(config.capture_width, config.capture_height, fps)
        .with_frame_limit(frames);
    let loader = Arc::new(FileAssetLoader::new(&config.app_root));

    info!("Loading assets from: {}", config.app_root.display());
    let RunningSession {
        handle,
        mut progress,
        task,
    } = spawn_session(&config, pose, TracingRenderer::new(), camera, loader);

    // The session ends by itself once the camera has delivered every frame.
    tokio::select! {
        last = rotate_selection(&handle, &mut progress, config.initial_category, cycle_every) => {
            info!("Simulation finished with {} selected", last);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            handle.shutdown();
        }
    }

    let summary = task.await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
