// Media processing behind a trait
//
// - Commands: argument builders for ffmpeg/ffprobe
// - Processor: runs them and maps failures to clip errors
// - Probe: audio stream listing

pub mod commands;
pub mod processor;
pub mod probe;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;
pub use probe::*;

use crate::config::MediaConfig;
use crate::error::Result;
use crate::planner::ClipJob;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Re-encode the window of one clip job into its output file
    async fn extract_clip(
        &self,
        video_path: &Path,
        job: &ClipJob,
        audio_track: Option<usize>,
    ) -> Result<()>;

    /// Join the clips listed in a concat manifest without re-encoding
    async fn concat_clips(
        &self,
        manifest_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// List the audio streams of a video
    async fn probe_audio_tracks(&self, video_path: &Path) -> Result<Vec<AudioTrackInfo>>;

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
