use anyhow::{Context, Result};
use clap::Parser;
use silueta::capture::{CaptureSource, WebcamCapture};
use silueta::config::Config;
use silueta::game::{GameEngine, WinJudge};
use silueta::mask;
use silueta::output::{self, OutputSink, V4L2Output};
use silueta::scoring::Scorer;
use silueta::segmentation::{self, BackgroundModel, ForegroundEstimator, SegmentationModel};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Capture resolution width
    #[arg(long, default_value_t = 1280)]
    capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 720)]
    capture_height: u32,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Path to the target silhouette image
    #[arg(short, long)]
    target: String,

    /// Path to the segmentation model (ONNX file)
    /// If not provided, the game runs on background subtraction alone
    #[arg(long)]
    model: Option<String>,

    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Output v4l2loopback device path for the composited game view
    #[arg(short, long)]
    output_device: Option<String>,

    /// Directory for victory snapshots
    #[arg(long, default_value = "snapshots")]
    snapshot_dir: String,

    /// Disable the mirror flip on captured frames
    #[arg(long)]
    no_mirror: bool,

    /// Show the body mask (white silhouette) instead of the composited view
    #[arg(long)]
    show_mask: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Silueta starting");
    tracing::info!("Capture: {}x{}", args.capture_width, args.capture_height);
    tracing::info!("Target FPS: {}", args.fps);

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut capture = WebcamCapture::new(
        args.input_device,
        args.capture_width,
        args.capture_height,
        !args.no_mirror,
    )
    .context("Failed to initialize webcam capture")?;

    let target = mask::load_target(&args.target).context("Failed to load target silhouette")?;

    let model: Option<Box<dyn SegmentationModel>> = match &args.model {
        Some(model_path) => {
            let model = segmentation::create_default_model(model_path, &config.segmentation)
                .context("Failed to load segmentation model")?;
            Some(model)
        }
        None => {
            tracing::info!("No model given, running on background subtraction alone");
            None
        }
    };

    let estimator = ForegroundEstimator::new(
        model,
        BackgroundModel::new(config.background.clone()),
        config.segmentation.clone(),
        config.refine.clone(),
    );
    let scorer = Scorer::new(target, config.scoring.clone(), config.refine.clone());
    let judge = WinJudge::new(&config.win);
    let mut engine = GameEngine::new(estimator, scorer, judge);

    let snapshot_dir = PathBuf::from(&args.snapshot_dir);
    std::fs::create_dir_all(&snapshot_dir)
        .with_context(|| format!("Failed to create snapshot dir {}", snapshot_dir.display()))?;
    engine.set_on_win(Box::new(move |frame| {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = snapshot_dir.join(format!("victory_{timestamp}.png"));
        match frame.save(&path) {
            Ok(()) => tracing::info!("Snapshot saved: {}", path.display()),
            Err(e) => tracing::error!("Failed to save snapshot: {e}"),
        }
    }));

    let mut output = match &args.output_device {
        Some(path) => Some(
            V4L2Output::new(path, args.capture_width, args.capture_height)
                .context("Failed to initialize v4l2loopback output")?,
        ),
        None => None,
    };

    run_loop(
        &mut capture,
        &mut engine,
        output.as_mut(),
        args.fps,
        args.show_mask,
    )
}

fn run_loop<C, O>(
    capture: &mut C,
    engine: &mut GameEngine,
    mut output: Option<&mut O>,
    target_fps: u32,
    show_mask: bool,
) -> Result<()>
where
    C: CaptureSource,
    O: OutputSink,
{
    let frame_duration = Duration::from_secs_f32(1.0 / target_fps as f32);
    let mut frame_count = 0u64;
    let mut dropped = 0u64;
    let mut total_capture_time = Duration::ZERO;
    let mut total_tick_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    tracing::info!("Starting game loop, press Ctrl+C to stop");

    loop {
        let loop_start = Instant::now();

        let capture_start = Instant::now();
        let frame = capture.next_frame().context("Capture source failed")?;
        total_capture_time += capture_start.elapsed();

        let Some(frame) = frame else {
            // No observation this tick; nothing is scored or mutated
            dropped += 1;
            std::thread::sleep(frame_duration);
            continue;
        };

        let tick_start = Instant::now();
        let tick = engine.tick(&frame, Instant::now());
        total_tick_time += tick_start.elapsed();

        if let Some(sink) = output.as_mut() {
            let output_start = Instant::now();
            let view = if show_mask {
                output::mask_view(&tick.body_mask)
            } else {
                output::compose_view(&frame, &tick.body_mask, engine.target())
            };
            sink.write_frame(&view).context("Failed to write frame")?;
            total_output_time += output_start.elapsed();
        }

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_tick_ms = total_tick_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            tracing::info!(
                "Frame {}: coverage={:.1}%, excess={:.1}%, winning={}, capture={:.1}ms, tick={:.1}ms, output={:.1}ms, dropped={}",
                frame_count,
                tick.score.coverage_percent,
                tick.score.excess_percent,
                engine.win_state().is_winning,
                avg_capture_ms,
                avg_tick_ms,
                avg_output_ms,
                dropped,
            );
        }

        // Frame rate limiting
        let elapsed = loop_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
}
