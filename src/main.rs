//! Wordclip - Subtitle Word Clip Extractor
//!
//! Entry point: parses the command line, loads configuration and runs the
//! requested command, rendering batch progress in the terminal.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use wordclip::cli::{Args, Commands};
use wordclip::config::{Config, roll_duration};
use wordclip::media::MediaProcessorFactory;
use wordclip::planner::format_timestamp;
use wordclip::progress::JobState;
use wordclip::subtitle::format_srt_time;
use wordclip::worker::ClipWorker;
use wordclip::workflow::{ClipOutcome, ClipRequest, Workflow};

const DEFAULT_CONFIG: &str = "wordclip.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG);
                Config::from_file(DEFAULT_CONFIG)?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Preview { subtitles, word } => {
            // Matching never runs ffmpeg, so skip the availability check
            let workflow = Workflow::with_processor(MediaProcessorFactory::create_processor(config.media));
            let matches = workflow.preview(&subtitles, &word)?;

            if matches.is_empty() {
                println!("No Matches: no instances of '{}' found in subtitles.", word);
                return Ok(());
            }

            println!("Found {} instance(s) of '{}':\n", matches.len(), word);
            for (i, m) in matches.iter().enumerate() {
                println!("#{} at {}  ({} --> {})",
                    i + 1, format_timestamp(m.start), format_srt_time(m.start), format_srt_time(m.end));
                println!("  {}\n", m.text);
            }
        }
        Commands::Tracks { video } => {
            let workflow = Workflow::new(config.media)?;
            let tracks = workflow.list_audio_tracks(&video).await?;

            if tracks.is_empty() {
                println!("No audio tracks found; clips will use ffmpeg's default stream selection.");
                return Ok(());
            }

            println!("Found {} audio track(s):\n", tracks.len());
            println!("{:<14} {}", "--audio-track", "Stream");
            println!("{}", "-".repeat(60));
            println!("{:<14} All audio tracks (default)", "(none)");
            for track in &tracks {
                println!("{:<14} {}", track.audio_index, track.display());
            }
        }
        Commands::Create { video, subtitles, word, output_dir, pre, post, merge, audio_track } => {
            let mut request = ClipRequest::new(video, subtitles, &word, &config.clip)?;
            if let Some(dir) = output_dir {
                request.output_dir = dir;
            }
            if let Some(seconds) = pre {
                request.pre_roll = roll_duration("pre", seconds)?;
            }
            if let Some(seconds) = post {
                request.post_roll = roll_duration("post", seconds)?;
            }
            request.merge |= merge;
            request.audio_track = audio_track;

            let workflow = Arc::new(Workflow::new(config.media)?);
            run_batch(workflow, request).await?;
        }
        Commands::InitConfig { output } => {
            if output.exists() {
                anyhow::bail!("{} already exists", output.display());
            }
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
        Commands::Check => {
            let workflow = Workflow::new(config.media)?;
            let version = workflow.media().get_version_info().await?;
            println!("{}", version);
            println!("ffmpeg and ffprobe are available");
        }
    }

    Ok(())
}

/// Run one batch on the worker, drawing progress until it finishes
async fn run_batch(workflow: Arc<Workflow>, request: ClipRequest) -> Result<()> {
    let worker = ClipWorker::spawn(workflow);
    let mut handle = worker.submit(request).await?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Starting...");

    let mut cancelled = false;
    let result = loop {
        tokio::select! {
            Some(state) = handle.progress.recv() => render_state(&pb, &state),
            result = &mut handle.outcome => break result,
            _ = tokio::signal::ctrl_c() => {
                if cancelled {
                    // Leaving the runtime drops the running ffmpeg child, which kills it
                    pb.abandon_with_message("Aborted");
                    anyhow::bail!("Aborted by a second interrupt");
                }
                warn!("Interrupted, stopping after the current clip (press Ctrl-C again to abort)");
                pb.set_message("Cancelling after the current clip...");
                handle.cancel();
                cancelled = true;
            }
        }
    };
    pb.finish_and_clear();
    worker.shutdown().await;

    match result? {
        ClipOutcome::NoMatches { word } => {
            println!("No Matches: no instances of '{}' found in subtitles.", word);
        }
        ClipOutcome::Completed { word_folder, clips, merged } => {
            println!("Created {} clip(s) in:\n{}", clips.len(), word_folder.display());
            let cwd = std::env::current_dir()?;
            for clip in &clips {
                let shown = pathdiff::diff_paths(clip, &cwd).unwrap_or_else(|| clip.clone());
                println!("  {}", shown.display());
            }
            if let Some(merged) = merged {
                let name = merged.file_name().unwrap_or_default().to_string_lossy();
                println!("\nMerged video: {}", name);
            }
        }
    }

    Ok(())
}

fn render_state(pb: &ProgressBar, state: &JobState) {
    match state {
        JobState::Idle => pb.set_message(""),
        JobState::Matching => pb.set_message("Searching subtitles..."),
        JobState::Encoding { current, total } => {
            pb.set_length(*total as u64);
            pb.set_position(current.saturating_sub(1) as u64);
            pb.set_message("Processing...");
        }
        JobState::Merging { clips } => {
            pb.set_position(*clips as u64);
            pb.set_message("Merging clips...");
        }
        JobState::Complete { clips } => {
            pb.set_position(clips.len() as u64);
            pb.set_message("Complete!");
        }
        JobState::Failed(reason) => pb.set_message(format!("Failed: {}", reason)),
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".wordclip").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "wordclip.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output shares stderr with the progress bar
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber.try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("wordclip.log").display());

    Ok(())
}
