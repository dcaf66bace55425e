use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{ClipError, Result};

fn default_probe_path() -> String {
    "ffprobe".to_string()
}

fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("WordClipperOutput")
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub clip: ClipConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary, used to list audio tracks
    #[serde(default = "default_probe_path")]
    pub probe_path: String,
    /// Video codec for re-encoded clips
    pub video_codec: String,
    /// Audio codec for re-encoded clips
    pub audio_codec: String,
    /// Additional encoding options placed before each clip's output path
    /// Common options: ["-preset", "fast", "-crf", "23", "-pix_fmt", "yuv420p"]
    #[serde(default)]
    pub encode_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipConfig {
    /// Seconds cut before each match
    pub pre_roll: f64,
    /// Seconds kept after each match
    pub post_roll: f64,
    /// Merge all clips into one video by default
    #[serde(default)]
    pub merge: bool,
    /// Folder that receives the clips_<word> subfolders
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            probe_path: default_probe_path(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            encode_options: vec![],
        }
    }
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            pre_roll: 1.0,
            post_roll: 1.0,
            merge: false,
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClipError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)?;

        roll_duration("pre_roll", config.clip.pre_roll)?;
        roll_duration("post_roll", config.clip.post_roll)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ClipError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ClipError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

/// Converts a padding value in seconds, rejecting negative and non-finite input.
pub fn roll_duration(name: &str, seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| ClipError::Config(format!("{} must be a non-negative number of seconds, got {}", name, seconds)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_form() {
        let config = Config::default();
        assert_eq!(config.media.binary_path, "ffmpeg");
        assert_eq!(config.media.probe_path, "ffprobe");
        assert_eq!(config.media.video_codec, "libx264");
        assert_eq!(config.media.audio_codec, "aac");
        assert_eq!(config.clip.pre_roll, 1.0);
        assert_eq!(config.clip.post_roll, 1.0);
        assert!(!config.clip.merge);
        assert!(config.clip.output_dir.ends_with("WordClipperOutput"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordclip.toml");

        let mut config = Config::default();
        config.clip.pre_roll = 2.5;
        config.media.encode_options = vec!["-crf".to_string(), "23".to_string()];
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.clip.pre_roll, 2.5);
        assert_eq!(loaded.media.encode_options, vec!["-crf", "23"]);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordclip.toml");
        std::fs::write(&path, "[clip]\npre_roll = 0.5\npost_roll = 2.0\n").unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.clip.pre_roll, 0.5);
        assert_eq!(loaded.media.binary_path, "ffmpeg");
        assert!(loaded.clip.output_dir.ends_with("WordClipperOutput"));
    }

    #[test]
    fn test_negative_roll_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordclip.toml");
        std::fs::write(&path, "[clip]\npre_roll = -1.0\npost_roll = 1.0\n").unwrap();

        assert!(matches!(Config::from_file(&path), Err(ClipError::Config(_))));
        assert!(roll_duration("post_roll", f64::NAN).is_err());
        assert_eq!(roll_duration("pre_roll", 1.5).unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_malformed_file_is_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordclip.toml");
        std::fs::write(&path, "[clip\npre_roll = ").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ClipError::Toml(_)));
        assert!(err.to_string().starts_with("TOML parsing error"));
    }
}
