//! Solanum command line interface
//! Potato leaf detection on images, videos, cameras and YouTube streams

mod config;
mod model;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use config::AppConfig;
use serde_json::json;
use solanum_core::RecordId;
use solanum_eye::annotate::Annotator;
use solanum_eye::{Detector, SingleShotDetection, SourceDescriptor, SourceOpener, Step, StreamingSession};
use solanum_storage::HistoryStore;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "solanum")]
#[command(about = "Potato leaf detection with a persistent detection history", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.solanum/config.toml when present)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// History database directory
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect objects in a single image
    Detect {
        /// Image file
        image: PathBuf,

        /// Confidence threshold in (0, 1]
        #[arg(long)]
        confidence: Option<f32>,

        /// Save the annotated image to history
        #[arg(long, short)]
        save: bool,

        /// Write the annotated image to a file
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Run detection continuously over a video, webcam or YouTube stream
    Stream(StreamArgs),

    /// Detection history
    #[command(subcommand)]
    History(HistoryCommands),
}

#[derive(Args)]
struct StreamArgs {
    #[command(flatten)]
    source: StreamSource,

    /// Confidence threshold in (0, 1]
    #[arg(long)]
    confidence: Option<f32>,

    /// Stop after this many processed frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Save every Nth processed frame to history
    #[arg(long)]
    capture_every: Option<u64>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct StreamSource {
    /// Stored video file
    #[arg(long)]
    video: Option<PathBuf>,

    /// Camera device index
    #[arg(long)]
    webcam: Option<u32>,

    /// YouTube video URL
    #[arg(long)]
    youtube: Option<String>,
}

impl StreamSource {
    fn descriptor(&self) -> anyhow::Result<SourceDescriptor> {
        match (&self.video, self.webcam, &self.youtube) {
            (Some(path), None, None) => Ok(SourceDescriptor::video(path)),
            (None, Some(device), None) => Ok(SourceDescriptor::webcam(device)),
            (None, None, Some(url)) => Ok(SourceDescriptor::youtube(url.as_str())),
            _ => anyhow::bail!("choose exactly one of --video, --webcam or --youtube"),
        }
    }
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List records, oldest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete one record
    Delete { id: u64 },

    /// Write a record's annotated image to a PNG file
    Export { id: u64, out: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.history {
        config.history.path = path.clone();
    }
    config.validate()?;

    match cli.command {
        Commands::Detect {
            image,
            confidence,
            save,
            out,
        } => detect(&config, image, confidence, save, out)?,
        Commands::Stream(args) => stream(&config, args).await?,
        Commands::History(cmd) => history(&config, cmd)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_detector(config: &AppConfig) -> anyhow::Result<Arc<Detector>> {
    let model = model::load(&config.model)?;
    let annotator = match &config.eye.label_font {
        Some(path) => Annotator::with_font_file(path)?,
        None => Annotator::new(),
    };
    info!("Using model {}", model.name());
    Ok(Arc::new(Detector::with_annotator(model, annotator)))
}

fn detect(
    config: &AppConfig,
    image: PathBuf,
    confidence: Option<f32>,
    save: bool,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let detector = build_detector(config)?;
    let opener = Arc::new(SourceOpener::with_defaults(&config.eye));
    let history = Arc::new(HistoryStore::open(&config.history));
    let single_shot = SingleShotDetection::new(opener, detector, history);

    let descriptor = SourceDescriptor::image(image);
    let inference = single_shot.run(&descriptor, confidence.unwrap_or(config.eye.confidence))?;
    for line in inference.summary() {
        println!("{}", line);
    }

    if let Some(out) = out {
        inference
            .annotated
            .save(&out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        println!("Annotated image written to {}", out.display());
    }

    if save {
        match single_shot.commit(descriptor.source_type(), &descriptor.label(), &inference.annotated) {
            Ok(id) => println!("Saved as record {}", id),
            Err(e) => eprintln!("Detection not recorded: {}", e),
        }
    }
    Ok(())
}

async fn stream(config: &AppConfig, args: StreamArgs) -> anyhow::Result<()> {
    let descriptor = args.source.descriptor()?;
    let confidence = args.confidence.unwrap_or(config.eye.confidence);
    let detector = build_detector(config)?;
    let opener = Arc::new(SourceOpener::with_defaults(&config.eye));
    let history = Arc::new(HistoryStore::open(&config.history));
    let session = Arc::new(StreamingSession::new(opener, detector, history, config.eye.frame_rate));

    session.start(&descriptor, confidence)?;
    println!("Streaming {:?} (Ctrl-C to stop)", descriptor);

    let stopper = session.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping stream");
            // stop() waits for an in-flight frame read.
            let _ = tokio::task::spawn_blocking(move || stopper.stop()).await;
        }
    });

    let runner = session.clone();
    let max_frames = args.max_frames;
    let capture_every = args.capture_every.filter(|n| *n > 0);
    let state = tokio::task::spawn_blocking(move || {
        let mut processed = 0u64;
        runner.run(|step| {
            match step {
                Step::Frame(inference) => {
                    processed += 1;
                    println!("frame {}: {}", inference.frame_index, inference.summary().join("; "));
                    if capture_every.is_some_and(|n| processed % n == 0) {
                        match runner.capture_current() {
                            Ok(id) => println!("frame {} saved as record {}", inference.frame_index, id),
                            Err(e) => warn!("Capture failed: {}", e),
                        }
                    }
                }
                Step::Skipped { frame_index, error } => {
                    eprintln!("frame {} skipped: {}", frame_index, error);
                }
                Step::Finished(_) => {}
            }
            if max_frames.is_some_and(|max| processed >= max) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    })
    .await
    .context("Streaming task panicked")?;
    signal.abort();

    let stats = session.stats();
    println!(
        "Stream {}: {} frames processed, {} skipped, {} captured",
        state, stats.frames_processed, stats.frames_skipped, stats.captures
    );
    Ok(())
}

fn history(config: &AppConfig, cmd: HistoryCommands) -> anyhow::Result<()> {
    let store = HistoryStore::open_strict(&config.history)?;

    match cmd {
        HistoryCommands::List { json } => {
            let records = store.list()?;
            if json {
                let rows: Vec<_> = records
                    .iter()
                    .map(|r| {
                        json!({
                            "id": r.id.0,
                            "source_type": r.source_type,
                            "source_path": r.source_path,
                            "image_bytes": r.detected_image.len(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if records.is_empty() {
                println!("No detections recorded.");
            } else {
                println!("{:>6}  {:<8}  {:>10}  SOURCE", "ID", "TYPE", "BYTES");
                for r in &records {
                    println!(
                        "{:>6}  {:<8}  {:>10}  {}",
                        r.id.0,
                        r.source_type.label(),
                        r.detected_image.len(),
                        r.source_path
                    );
                }
            }
        }
        HistoryCommands::Delete { id } => {
            if store.delete_by_id(RecordId(id))? {
                println!("Deleted record {}", id);
            } else {
                println!("No record with id {}", id);
            }
        }
        HistoryCommands::Export { id, out } => {
            let record = store
                .get(RecordId(id))?
                .with_context(|| format!("No record with id {}", id))?;
            std::fs::write(&out, &record.detected_image)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Record {} written to {}", id, out.display());
        }
    }
    Ok(())
}
