// src/main.rs

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use checkin_scan::api::http_router;
use checkin_scan::camera::{CameraSource, FileCamera, SnapshotCamera};
use checkin_scan::config::{CONFIG, ScanConfig};
use checkin_scan::decoder::RxingDecoder;
use checkin_scan::scan::{
    self, Classification, FacingMode, ScanController, ScanEvent, ScanSettings, TerminalSink,
    TileConfig,
};
use checkin_scan::state::AppState;
use checkin_scan::upload::UploadClient;

#[derive(Parser)]
#[command(name = "checkin-scan")]
#[command(about = "Patient ID and accession number barcode scanning for check-in")]
#[command(version)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(long, global = true, env = "SCAN_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the upload endpoint
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Take a single frame and scan it
    Scan {
        #[command(flatten)]
        camera: CameraArgs,

        /// Send the frame to the upload endpoint instead of decoding locally
        #[arg(long)]
        upload: bool,

        /// Upload endpoint (default: SCAN_UPLOAD_URL)
        #[arg(long)]
        upload_url: Option<String>,
    },

    /// Scan continuously until both identifiers are found or Ctrl-C
    Watch {
        #[command(flatten)]
        camera: CameraArgs,

        /// Milliseconds between frames (default: SCAN_CONTINUOUS_INTERVAL_MS)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Classify barcode texts without a camera
    Classify {
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

#[derive(Args)]
struct CameraArgs {
    /// Directory of still frames to scan (default: SCAN_CAMERA_DIR)
    #[arg(long)]
    camera_dir: Option<PathBuf>,

    /// HTTP snapshot endpoint; takes precedence over --camera-dir
    #[arg(long)]
    snapshot_url: Option<String>,

    /// environment (rear) or user (front)
    #[arg(long)]
    facing: Option<FacingMode>,

    /// Skip the tiled second pass
    #[arg(long)]
    no_tiles: bool,
}

impl CameraArgs {
    fn facing(&self, config: &ScanConfig) -> FacingMode {
        self.facing.unwrap_or(config.facing)
    }

    fn source(&self, config: &ScanConfig) -> Result<Arc<dyn CameraSource>> {
        let snapshot_url = self
            .snapshot_url
            .as_deref()
            .or_else(|| config.snapshot_url());

        if let Some(url) = snapshot_url {
            let camera = SnapshotCamera::new(url, config.upload_timeout())
                .context("Failed to build snapshot client")?
                .facing(self.facing(config))
                .require_secure(config.require_secure_camera);
            return Ok(Arc::new(camera));
        }

        let dir = self
            .camera_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.camera_dir));
        Ok(Arc::new(FileCamera::new(dir)))
    }

    fn settings(&self, config: &ScanConfig) -> ScanSettings {
        let tiles = if self.no_tiles {
            TileConfig::disabled()
        } else {
            config.tile_config()
        };
        ScanSettings {
            facing: self.facing(config),
            tiles,
            ..ScanSettings::default()
        }
    }

    fn controller(&self, config: &ScanConfig) -> Result<ScanController> {
        Ok(ScanController::new(
            self.source(config)?,
            Arc::new(RxingDecoder::new()),
            Arc::new(TerminalSink),
            self.settings(config),
        ))
    }
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug {
            "checkin_scan=debug,tower_http=debug"
        } else {
            "checkin_scan=info,tower_http=info"
        })
    });
    fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config: &ScanConfig = &CONFIG;

    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Scan {
            camera,
            upload,
            upload_url,
        } => scan_once(config, camera, upload, upload_url).await,
        Commands::Watch {
            camera,
            interval_ms,
        } => watch(config, camera, interval_ms).await,
        Commands::Classify { texts } => {
            classify(&texts);
            Ok(())
        }
    }
}

async fn serve(config: &ScanConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let bind_address = format!(
        "{}:{}",
        host.unwrap_or_else(|| config.host.clone()),
        port.unwrap_or(config.port)
    );

    let app_state = Arc::new(AppState::from_config(config, Arc::new(RxingDecoder::new())));
    let app = http_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!("Upload endpoint listening on http://{}/upload", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn scan_once(
    config: &ScanConfig,
    camera: CameraArgs,
    upload: bool,
    upload_url: Option<String>,
) -> Result<()> {
    let mut controller = camera.controller(config)?;
    controller.start_camera(camera.facing(config)).await?;

    let report = if upload || upload_url.is_some() {
        let url = upload_url.unwrap_or_else(|| config.upload_url.clone());
        let client = UploadClient::new(url, config.upload_timeout())?;
        controller.upload_scan(&client).await?
    } else {
        controller.scan().await?
    };

    if !report.decoded.is_empty() {
        info!("Decoded: {}", report.decoded.join(", "));
    }
    controller.shutdown();
    Ok(())
}

async fn watch(config: &ScanConfig, camera: CameraArgs, interval_ms: Option<u64>) -> Result<()> {
    let interval = interval_ms
        .map(|ms| Duration::from_millis(ms.max(10)))
        .unwrap_or_else(|| config.continuous_interval());

    let mut controller = camera.controller(config)?;
    controller.start_camera(camera.facing(config)).await?;

    let (handle, mut events) = scan::spawn_continuous(controller, interval);
    let token = handle.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    while let Some(event) = events.next().await {
        match event {
            ScanEvent::Frame { .. } => {}
            ScanEvent::Error { sequence, error } => {
                warn!("Frame {:?}: {}", sequence, error);
            }
            ScanEvent::Completed {
                patient_id,
                accession_number,
            } => {
                info!("Complete: patient {} / accession {}", patient_id, accession_number);
            }
            ScanEvent::Cancelled => info!("Stopped"),
            ScanEvent::Stopped { error } => error!("Camera lost: {}", error),
        }
    }

    let mut controller = handle.join().await?;
    controller.shutdown();
    Ok(())
}

fn classify(texts: &[String]) {
    for text in texts {
        let normalized = scan::normalize(text);
        let label = match scan::classify(text) {
            Classification::PatientId => "Patient ID",
            Classification::AccessionNumber => "Accession #",
            Classification::Unclassified => "unclassified",
        };
        println!("{normalized}\t{label}");
    }
}
