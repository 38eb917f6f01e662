mod commands;
mod config;
mod engine;
mod terminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tryon_core::Category;
use tryon_hw::Camera;
use tryon_session::{assets, DriveFolderSource};

#[derive(Parser)]
#[command(name = "tryon", about = "Virtual jewelry try-on over a live webcam feed")]
struct Cli {
    /// Camera device (overrides TRYON_CAMERA_DEVICE)
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Directory for snapshots (overrides TRYON_SNAPSHOT_DIR)
    #[arg(long, global = true)]
    snapshot_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive try-on session (default)
    Run,
    /// Fetch and print the asset listing for a category
    List {
        /// earrings or necklaces
        category: Category,
    },
    /// List V4L2 capture devices
    Devices,
    /// Run camera diagnostics
    Test,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::from_env();
    if let Some(device) = cli.device {
        config.camera_device = device;
    }
    if let Some(dir) = cli.snapshot_dir {
        config.snapshot_dir = dir;
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => engine::run(config).await?,
        Commands::List { category } => list_assets(&config, category).await?,
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("No V4L2 capture devices found");
            }
            for dev in devices {
                println!("{}  {} ({}, {})", dev.path, dev.name, dev.driver, dev.bus);
            }
        }
        Commands::Test => camera_test(&config)?,
    }

    Ok(())
}

async fn list_assets(config: &config::Config, category: Category) -> Result<()> {
    let client = reqwest::Client::builder().build()?;
    let source = DriveFolderSource::new(client, config.folders.clone());
    let refs = assets::fetch_assets(&source, category).await?;
    for (i, asset) in refs.iter().enumerate() {
        println!("{:>2}. {}  {}", i + 1, asset.id, asset.url);
    }
    Ok(())
}

fn camera_test(config: &config::Config) -> Result<()> {
    println!("Running camera diagnostics on {}...", config.camera_device);
    let camera = match Camera::open_with_size(
        &config.camera_device,
        config.capture_width,
        config.capture_height,
    ) {
        Ok(c) => c,
        Err(e) => {
            println!("{}", e.user_message());
            return Err(e.into());
        }
    };
    println!(
        "  format: {:?} {}x{}",
        camera.pixel_format(),
        camera.width,
        camera.height
    );

    let mut stream = camera.stream()?;
    for _ in 0..config.warmup_frames {
        let _ = stream.next_frame();
    }
    let frame = stream.next_frame()?;
    println!("  frame:  #{} {}x{}", frame.sequence, frame.width, frame.height);
    println!("  brightness: {:.1}", frame.avg_brightness());
    if frame.is_dark(0.95) {
        println!("  warning: frame is almost entirely dark (lens covered?)");
    }
    Ok(())
}
