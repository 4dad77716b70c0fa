//! Demonstration binary: runs a synthetic guided-motion session through the
//! full evaluation pipeline and prints the graded summary.

use anyhow::Result;
use clap::Parser;
use log::info;
use nalgebra::Vector3;
use weldtrack::{
    certificate,
    config::EngineConfig,
    engine::TrainerEngine,
    metrics::MotionSample,
    technique::{self, Technique},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Technique to score (stringer, weave, whip)
    #[arg(short, long, default_value = "stringer")]
    technique: String,

    /// Session duration in seconds
    #[arg(short, long, default_value = "10.0")]
    duration: f64,

    /// Frame/sample rate in Hz
    #[arg(short, long, default_value = "5.0")]
    rate: f64,

    /// Work-angle wobble amplitude in degrees
    #[arg(short, long, default_value = "2.0")]
    wobble: f64,

    /// Completion date (YYYYMMDD) to stamp into the certificate code
    #[arg(long)]
    date: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

/// Frame dimensions for the synthetic camera
const FRAME_WIDTH: usize = 640;
const FRAME_HEIGHT: usize = 480;

/// Paint a black frame with four bright dots forming a square marker
fn paint_marker_frame(center_x: usize, center_y: usize, half_side: usize) -> Vec<u8> {
    let mut frame = vec![0u8; FRAME_WIDTH * FRAME_HEIGHT * 4];
    for px in frame.chunks_exact_mut(4) {
        px[3] = 255;
    }

    let corners = [
        (center_x - half_side, center_y - half_side),
        (center_x + half_side, center_y - half_side),
        (center_x + half_side, center_y + half_side),
        (center_x - half_side, center_y + half_side),
    ];
    for (x, y) in corners {
        let idx = (y * FRAME_WIDTH + x) * 4;
        frame[idx] = 255;
        frame[idx + 1] = 255;
        frame[idx + 2] = 255;
    }
    frame
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Welding technique trainer - synthetic session");

    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {config_path}");
        match EngineConfig::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {e}. Using defaults.");
                EngineConfig::default()
            }
        }
    } else {
        EngineConfig::default()
    };
    config.validate()?;

    let technique: Technique = args.technique.parse()?;
    let mut engine = TrainerEngine::new(&config);

    engine.start_session(technique, 0.0)?;

    // Drive the pipeline: a 60px square marker drifting right at 10px/s,
    // steady acceleration (zero jerk), work angle wobbling around 75 degrees.
    let dt_ms = 1000.0 / args.rate;
    let ticks = (args.duration * args.rate) as usize;
    let drift_px_per_tick = (10.0 / args.rate).round().max(1.0) as usize;

    for i in 0..ticks {
        let now_ms = i as f64 * dt_ms;

        let center_x = 200 + i * drift_px_per_tick;
        if center_x + 40 >= FRAME_WIDTH {
            break;
        }
        let frame = paint_marker_frame(center_x, 240, 30);
        engine.process_frame(&frame, FRAME_WIDTH, FRAME_HEIGHT, now_ms);

        let beta = 75.0 + args.wobble * (now_ms / 1000.0).sin();
        let sample = MotionSample {
            timestamp_ms: now_ms,
            acceleration: Vector3::new(0.0, 0.0, 9.8),
            rotation_rate: Some(Vector3::new(0.0, beta, 0.0)),
            magnetic_field: None,
        };
        let metrics = engine.push_sample(sample)?;
        log::debug!(
            "t={now_ms:.0}ms angle={:.1} distance={:.1} speed={:.1} quality={:.1}",
            metrics.angle,
            metrics.distance,
            metrics.speed,
            metrics.quality
        );
    }

    let session = engine.stop_session(args.duration * 1000.0)?;
    let averages = session.metric_averages();
    let grade = session.grade.map_or("-", |g| g.as_str());

    println!("Session {}", session.id);
    println!("  technique:  {}", session.technique);
    println!("  duration:   {:.1}s", session.duration_ms / 1000.0);
    println!("  samples:    {}", averages.sample_count);
    println!("  angle:      {:.1}", averages.angle);
    println!("  distance:   {:.1}", averages.distance);
    println!("  speed:      {:.1}", averages.speed);
    println!("  smoothness: {:.1}", averages.smoothness);
    println!("  final:      {:.1} ({grade})", session.final_score);

    let guessed = technique::classify(&session.samples, &session.observations);
    println!("  classifier: {guessed}");

    if let Some(date) = &args.date {
        let code = certificate::encode(session.technique, session.final_score, date)?;
        println!("  code:       {code}");
    }

    Ok(())
}
