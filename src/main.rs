//! Reelplay
//!
//! A minimal desktop video player: open a local file, decode frames with
//! FFmpeg, render them into an egui window, control playback with buttons
//! and sliders.

mod app;
mod playback;
mod render;
mod video;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use app::PlayerApp;

/// Minimal desktop video player
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video file to open on startup
    file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Reelplay starting...");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 600.0])
            .with_min_inner_size([480.0, 360.0])
            .with_title("Reelplay")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Reelplay",
        native_options,
        Box::new(move |cc| Ok(Box::new(PlayerApp::new(cc, args.file)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))?;

    Ok(())
}
