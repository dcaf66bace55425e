use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::{info, debug};

use crate::config::MediaConfig;
use crate::error::{ClipError, Result};
use crate::planner::ClipJob;
use super::{MediaProcessorTrait, MediaCommandBuilder, AudioTrackInfo, failure_text, parse_probe_output};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn extract_clip(
        &self,
        video_path: &Path,
        job: &ClipJob,
        audio_track: Option<usize>,
    ) -> Result<()> {
        debug!("Extracting clip {} ({:?} - {:?}) -> {}",
               job.index, job.adjusted_start, job.adjusted_end, job.output_path.display());

        let command = self.command_builder.extract_clip(
            video_path,
            job,
            audio_track,
            &self.config.video_codec,
            &self.config.audio_codec,
            &self.config.encode_options,
        );

        let output = command.run().await.map_err(|e| ClipError::Transcode {
            index: job.index,
            message: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(ClipError::Transcode {
                index: job.index,
                message: failure_text(&output),
            });
        }

        Ok(())
    }

    async fn concat_clips(
        &self,
        manifest_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!("Merging clips from {} -> {}", manifest_path.display(), output_path.display());

        let output = self.command_builder
            .concatenate_clips(manifest_path, output_path)
            .run()
            .await
            .map_err(|e| ClipError::Merge(e.to_string()))?;

        if !output.status.success() {
            return Err(ClipError::Merge(failure_text(&output)));
        }

        info!("Merge completed");
        Ok(())
    }

    async fn probe_audio_tracks(&self, video_path: &Path) -> Result<Vec<AudioTrackInfo>> {
        debug!("Probing audio tracks of {}", video_path.display());

        let json = self.command_builder
            .probe_audio_streams(video_path)
            .capture()
            .await
            .map_err(|e| ClipError::Probe(e.to_string()))?;

        let tracks = parse_probe_output(&json)?;
        info!("Found {} audio track(s) in {}", tracks.len(), video_path.display());
        Ok(tracks)
    }

    /// Check that both ffmpeg and ffprobe can be started
    fn check_availability(&self) -> Result<()> {
        for binary in [&self.config.binary_path, &self.config.probe_path] {
            let output = Command::new(binary)
                .arg("-version")
                .output()
                .map_err(|e| ClipError::Media(format!("{} not found: {}", binary, e)))?;

            if !output.status.success() {
                return Err(ClipError::Media(format!("{} version check failed", binary)));
            }
        }

        info!("Media processor is available");
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let version_info = self.command_builder.version_check().capture().await?;
        // First line carries the version
        let first_line = version_info.lines().next().unwrap_or("Unknown version");
        Ok(first_line.to_string())
    }
}
