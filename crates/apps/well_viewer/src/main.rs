mod camera_path;

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use reqwest::Client;
use streaming::{
    ChunkRegistry, DisplaySnapshot, GridIndex, HttpChunkService, HttpTerrainSampler,
    StreamSession, StreamingConfig,
};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wells::{FlatTerrain, TerrainSampler};

use crate::camera_path::{CameraPath, ScriptedViewport};

#[derive(Parser, Debug)]
#[command(author, version, about = "Stream well-log chunks along a scripted camera path")]
struct Args {
    /// Chunk service base URL (serves /chunks and /chunk)
    #[arg(long)]
    service_url: String,

    /// Terrain sampler endpoint; without it every well sits on a flat surface
    #[arg(long)]
    terrain_url: Option<String>,

    /// JSON file with streaming config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Register every grid cell instead of calling the listing endpoint
    #[arg(long)]
    listing_from_grid: bool,

    /// JSON array of {lat, lon, height, dwellMs}
    camera_script: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref()).await?;
    let script = tokio::fs::read_to_string(&args.camera_script).await?;
    let path = CameraPath::from_json(&script)?;
    let Some(start) = path.start() else {
        return Err(format!("{} has no waypoints", args.camera_script.display()).into());
    };

    let http = Client::new();
    let service = Arc::new(HttpChunkService::from_base_url(http.clone(), &args.service_url));
    let terrain: Arc<dyn TerrainSampler> = match &args.terrain_url {
        Some(url) => Arc::new(HttpTerrainSampler::new(http.clone(), url.clone())),
        None => {
            let surface = env_var_f64("WELLS_SURFACE_M", 0.0);
            info!("no terrain service; using a flat surface at {surface} m");
            Arc::new(FlatTerrain(surface))
        }
    };

    let registry = ChunkRegistry::new();
    let listed = if args.listing_from_grid {
        registry
            .initialize(&GridIndex::new(config.bounds, config.splits))
            .await
    } else {
        registry.initialize(service.as_ref()).await
    };
    if let Err(err) = listed {
        warn!("{err}; running without region data");
    }

    let viewport = Arc::new(ScriptedViewport::new(start));
    let (session, display) = StreamSession::new(
        &config,
        Arc::new(registry),
        viewport.clone(),
        service,
        terrain,
    );
    let logger = tokio::spawn(log_snapshots(display));

    let (events_tx, events_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let session_task = tokio::spawn(session.run(events_rx, shutdown_rx));

    info!(
        "playing {} waypoints against {}",
        path.waypoints().len(),
        args.service_url
    );
    let played = path.play(&viewport, &events_tx).await;

    // The session may already be gone if it stopped on its own.
    let _ = shutdown_tx.send(true);
    let stats = session_task.await?;
    logger.await?;
    played?;

    info!("stream stats: {}", serde_json::to_string(&stats)?);
    Ok(())
}

async fn log_snapshots(mut display: watch::Receiver<DisplaySnapshot>) {
    while display.changed().await.is_ok() {
        let snap = display.borrow_and_update().clone();
        let chunk = snap
            .chunk
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        info!(
            "display r{}: chunk {chunk}, {} wells, records visible: {}, aggregated: {}",
            snap.revision,
            snap.well_count(),
            snap.records_visible,
            snap.aggregated_visible
        );
    }
}

async fn load_config(path: Option<&Path>) -> Result<StreamingConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            serde_json::from_str::<StreamingConfig>(&text)?
        }
        None => StreamingConfig::default(),
    };

    config.splits = env_var_usize("WELLS_SPLITS", config.splits);
    config.bounds.min.lat = env_var_f64("WELLS_MIN_LAT", config.bounds.min.lat);
    config.bounds.min.lon = env_var_f64("WELLS_MIN_LON", config.bounds.min.lon);
    config.bounds.max.lat = env_var_f64("WELLS_MAX_LAT", config.bounds.max.lat);
    config.bounds.max.lon = env_var_f64("WELLS_MAX_LON", config.bounds.max.lon);
    config.poll_interval_ms = env_var_u64("WELLS_POLL_MS", config.poll_interval_ms);
    config.records_max_height_m =
        env_var_f64("WELLS_RECORDS_MAX_HEIGHT_M", config.records_max_height_m);
    config.aggregated_min_height_m =
        env_var_f64("WELLS_AGGREGATED_MIN_HEIGHT_M", config.aggregated_min_height_m);
    config.clear_on_chunk_change =
        env_var_bool("WELLS_CLEAR_ON_CHUNK_CHANGE", config.clear_on_chunk_change);

    config.validate()?;
    Ok(config)
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_bool(key: &str, default: bool) -> bool {
    match env::var(key).ok().as_deref() {
        Some("1" | "true" | "yes") => true,
        Some("0" | "false" | "no") => false,
        _ => default,
    }
}
