use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every subtitle line containing the word
    Preview {
        /// Subtitle file (SRT)
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Word to find
        #[arg(short, long)]
        word: String,
    },

    /// List the audio tracks of a video
    Tracks {
        /// Input video file
        #[arg(short, long)]
        video: PathBuf,
    },

    /// Cut one clip per occurrence of the word
    Create {
        /// Input video file
        #[arg(short, long)]
        video: PathBuf,

        /// Subtitle file (SRT)
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Word to find
        #[arg(short, long)]
        word: String,

        /// Output folder; clips go to <output-dir>/clips_<word>
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Seconds before each occurrence
        #[arg(long)]
        pre: Option<f64>,

        /// Seconds after each occurrence
        #[arg(long)]
        post: Option<f64>,

        /// Merge all clips into one video
        #[arg(short, long)]
        merge: bool,

        /// Audio track to keep, as listed by `tracks` (default: all audio tracks)
        #[arg(short, long)]
        audio_track: Option<usize>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "wordclip.toml")]
        output: PathBuf,
    },

    /// Check that ffmpeg and ffprobe are available
    Check,
}
