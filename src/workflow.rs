use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use crate::config::{ClipConfig, MediaConfig, roll_duration};
use crate::error::{ClipError, Result};
use crate::media::{AudioTrackInfo, MediaProcessorFactory, MediaProcessorTrait, render_concat_manifest};
use crate::planner::{merged_path, plan_clips, sanitize_word, word_folder};
use crate::progress::{CancelSignal, JobState, ProgressReporter};
use crate::subtitle::{SubtitleMatch, find_word_in_subtitles};

const CONCAT_MANIFEST: &str = "concat_list.txt";

/// Everything one batch job needs, captured up front.
#[derive(Debug, Clone)]
pub struct ClipRequest {
    pub video: PathBuf,
    pub subtitles: PathBuf,
    pub word: String,
    pub output_dir: PathBuf,
    pub pre_roll: Duration,
    pub post_roll: Duration,
    pub merge: bool,
    /// Audio-only index (`0:a:N`); `None` keeps every audio track
    pub audio_track: Option<usize>,
}

impl ClipRequest {
    /// Request seeded with the padding, merge flag and output folder from config
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        video: P,
        subtitles: Q,
        word: &str,
        defaults: &ClipConfig,
    ) -> Result<Self> {
        Ok(Self {
            video: video.into(),
            subtitles: subtitles.into(),
            word: word.to_string(),
            output_dir: defaults.output_dir.clone(),
            pre_roll: roll_duration("pre_roll", defaults.pre_roll)?,
            post_roll: roll_duration("post_roll", defaults.post_roll)?,
            merge: defaults.merge,
            audio_track: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipOutcome {
    /// The word does not occur; nothing was written
    NoMatches { word: String },
    Completed {
        word_folder: PathBuf,
        clips: Vec<PathBuf>,
        merged: Option<PathBuf>,
    },
}

pub struct Workflow {
    media: Box<dyn MediaProcessorTrait>,
}

impl Workflow {
    pub fn new(config: MediaConfig) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config);

        // Check dependencies
        media.check_availability()?;

        Ok(Self::with_processor(media))
    }

    pub fn with_processor(media: Box<dyn MediaProcessorTrait>) -> Self {
        Self { media }
    }

    pub fn media(&self) -> &dyn MediaProcessorTrait {
        self.media.as_ref()
    }

    /// Matches of `word` in a subtitle file, without touching any video
    pub fn preview<P: AsRef<Path>>(&self, subtitles: P, word: &str) -> Result<Vec<SubtitleMatch>> {
        let subtitles = subtitles.as_ref();
        require_word(word)?;
        require_file(subtitles)?;
        find_word_in_subtitles(subtitles, word)
    }

    /// Audio streams of a video
    pub async fn list_audio_tracks<P: AsRef<Path>>(&self, video: P) -> Result<Vec<AudioTrackInfo>> {
        let video = video.as_ref();
        require_file(video)?;
        self.media.probe_audio_tracks(video).await
    }

    /// Run one batch job: match, encode every clip in order, then merge if asked.
    ///
    /// The first failing step aborts the job. Clips written before the
    /// failure stay on disk.
    pub async fn create_clips(
        &self,
        request: &ClipRequest,
        progress: &ProgressReporter,
        cancel: &CancelSignal,
    ) -> Result<ClipOutcome> {
        require_word(&request.word)?;
        require_file(&request.video)?;
        require_file(&request.subtitles)?;

        progress.report(JobState::Matching);
        let matches = find_word_in_subtitles(&request.subtitles, &request.word)?;

        if matches.is_empty() {
            info!("No instances of '{}' found in subtitles", request.word);
            progress.report(JobState::Idle);
            return Ok(ClipOutcome::NoMatches { word: request.word.clone() });
        }

        if let Some(track) = request.audio_track {
            self.validate_audio_track(&request.video, track).await?;
        }

        let safe_word = sanitize_word(&request.word);
        let folder = word_folder(&request.output_dir, &safe_word);
        fs::create_dir_all(&folder).await?;

        let jobs = plan_clips(&matches, request.pre_roll, request.post_roll, &folder);
        let total = jobs.len();
        info!("Creating {} clip(s) in {}", total, folder.display());

        let mut clips = Vec::with_capacity(total);
        for job in &jobs {
            if cancel.is_cancelled() {
                warn!("Job cancelled before clip {} of {}", job.index, total);
                return Err(ClipError::Cancelled);
            }
            progress.report(JobState::Encoding { current: job.index, total });
            self.media.extract_clip(&request.video, job, request.audio_track).await?;
            clips.push(job.output_path.clone());
        }

        let merged = if request.merge && clips.len() > 1 {
            if cancel.is_cancelled() {
                warn!("Job cancelled before merging");
                return Err(ClipError::Cancelled);
            }
            progress.report(JobState::Merging { clips: clips.len() });
            let output = merged_path(&folder, &safe_word);
            self.merge_clips(&folder, &clips, &output).await?;
            Some(output)
        } else {
            None
        };

        info!("Created {} clip(s) in {}", clips.len(), folder.display());
        progress.report(JobState::Complete { clips: clips.clone() });

        Ok(ClipOutcome::Completed {
            word_folder: folder,
            clips,
            merged,
        })
    }

    /// Write the concat manifest next to the clips, join them, remove the manifest
    async fn merge_clips(&self, folder: &Path, clips: &[PathBuf], output: &Path) -> Result<()> {
        let manifest = folder.join(CONCAT_MANIFEST);
        fs::write(&manifest, render_concat_manifest(clips)).await?;

        let result = self.media.concat_clips(&manifest, output).await;

        if let Err(e) = fs::remove_file(&manifest).await {
            warn!("Failed to remove {}: {}", manifest.display(), e);
        }

        result
    }

    async fn validate_audio_track(&self, video: &Path, track: usize) -> Result<()> {
        match self.media.probe_audio_tracks(video).await {
            Ok(tracks) if !tracks.is_empty() && track >= tracks.len() => {
                Err(ClipError::InvalidInput(format!(
                    "audio track {} does not exist, {} has {} audio track(s)",
                    track,
                    video.display(),
                    tracks.len()
                )))
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Could not probe audio tracks, passing track {} through: {}", track, e);
                Ok(())
            }
        }
    }
}

fn require_word(word: &str) -> Result<()> {
    if word.is_empty() {
        return Err(ClipError::InvalidInput("a word to search for is required".to_string()));
    }
    Ok(())
}

fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ClipError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}
