//! Video detection worker binary.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use adscan_media::{TargetDetector, YoloDetector, YoloDetectorConfig};
use adscan_worker::{config::RunConfig, export, outdir, pipeline, report, WorkerResult};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("adscan_worker=info".parse().unwrap())
        .add_directive("adscan_media=info".parse().unwrap())
        .add_directive("ort=warn".parse().unwrap())
        .add_directive("onnxruntime=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let input = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            error!("Usage: adscan-worker <video-file> (targets via ADSCAN_TARGET_CLASSES)");
            std::process::exit(1);
        }
    };

    let config = match RunConfig::from_env(input) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Run config: {:?}", config);

    if let Err(e) = run(config).await {
        error!("Run failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: RunConfig) -> WorkerResult<()> {
    let started = Instant::now();

    let run_dir = outdir::next_run_dir(&config.output_base)?;

    // Fatal configuration checks happen up front: model load and target
    // class resolution both abort before any artifact is written.
    let detector = YoloDetector::new(YoloDetectorConfig {
        model_path: config.model_path.clone(),
        class_names: config.load_class_names()?,
        confidence_threshold: config.confidence_threshold,
        ..Default::default()
    })?;
    let detector = TargetDetector::new(Box::new(detector), &config.target_classes)?;

    let pass = pipeline::run_detection_pass(&config, &run_dir, &detector).await?;
    let reports = export::export_segments(&config, &run_dir, &pass.video, &pass.segments).await?;

    let summary = report::build_summary(&config, &pass.video, reports);
    report::write_summary(&run_dir, &config, &summary).await?;

    info!(
        "Done: {}/{} clips saved, target on screen {:.2}s of {:.2}s, elapsed {:.2}s",
        summary.exported_count(),
        summary.segments.len(),
        summary.total_target_secs(),
        pass.video.duration,
        started.elapsed().as_secs_f64()
    );

    Ok(())
}
