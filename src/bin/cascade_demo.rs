//! cascade_demo - run the detection cascade on synthetic frames

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use cascade_rs::{
    AnyOf, BoundingBox, CascadeConfig, CascadePipeline, ConstantClassifier, FrameLimit, FrameSink,
    LabelFont, LogSink, ScriptedDetector, SnapshotSink, SyntheticSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML configuration file (defaults apply when omitted).
    #[arg(long, env = "CASCADE_CONFIG")]
    config: Option<PathBuf>,
    /// Number of frames to process.
    #[arg(long, default_value_t = 30)]
    frames: u64,
    /// Synthetic frame width.
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Synthetic frame height.
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Override detector.confidence_threshold.
    #[arg(long)]
    confidence_threshold: Option<f32>,
    /// Override nms.iou_threshold.
    #[arg(long)]
    iou_threshold: Option<f32>,
    /// Override verifier.accept_threshold.
    #[arg(long)]
    accept_threshold: Option<f32>,
    /// Score the stand-in classifier returns for every crop.
    #[arg(long, default_value_t = 0.9)]
    classifier_score: f32,
    /// Write annotated PNG frames into this directory.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
    /// Snapshot every N-th frame.
    #[arg(long, default_value_t = 10)]
    snapshot_every: u64,
    /// TrueType font for snapshot labels (a system font is used when omitted).
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.frames == 0 {
        return Err(anyhow!("frames must be >= 1"));
    }

    let mut config = match &args.config {
        Some(path) => CascadeConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CascadeConfig::default(),
    };
    if let Some(v) = args.confidence_threshold {
        config.detector.confidence_threshold = v;
    }
    if let Some(v) = args.iou_threshold {
        config.nms.iou_threshold = v;
    }
    if let Some(v) = args.accept_threshold {
        config.verifier.accept_threshold = v;
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;
    }

    let detector = ScriptedDetector::new(demo_script());
    let classifier = ConstantClassifier::new(args.classifier_score);
    let mut pipeline = CascadePipeline::new(detector, classifier, &config)?;

    // The stream ends one frame past the limit, so the exit signal always wins.
    let mut source = SyntheticSource::new(args.width, args.height).with_limit(args.frames + 1);
    let mut sink: Box<dyn FrameSink> = match &args.snapshot_dir {
        Some(dir) => {
            let mut snapshots = SnapshotSink::new(dir, args.snapshot_every)?;
            if let Some(path) = &args.font {
                let font = LabelFont::load(path)
                    .with_context(|| format!("loading font {}", path.display()))?;
                snapshots = snapshots.with_font(font);
            }
            Box::new(snapshots)
        }
        None => Box::new(LogSink),
    };
    let mut exit = AnyOf(stop, FrameLimit::new(args.frames));

    log::info!(
        "cascade_demo starting: {} frames at {}x{}",
        args.frames,
        args.width,
        args.height
    );
    let summary = pipeline.run(&mut source, sink.as_mut(), &mut exit)?;

    println!(
        "frames: {}  verified detections: {}  fps: {:.1}",
        summary.frames, summary.verified, summary.fps
    );
    Ok(())
}

/// A short repeating scene: overlapping duplicates, a weak box, an edge box
/// and an empty frame.
fn demo_script() -> Vec<Vec<BoundingBox>> {
    vec![
        vec![
            BoundingBox::new(0.10, 0.20, 0.40, 0.60, 0.92),
            BoundingBox::new(0.12, 0.21, 0.41, 0.62, 0.81),
            BoundingBox::new(0.60, 0.55, 0.85, 0.95, 0.35),
        ],
        vec![
            BoundingBox::new(0.15, 0.22, 0.45, 0.62, 0.88),
            BoundingBox::new(0.70, 0.10, 0.95, 0.40, 0.67),
        ],
        vec![BoundingBox::new(0.90, 0.90, 1.20, 1.10, 0.75)],
        vec![],
    ]
}
