use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ClipError, Result};
use crate::planner::ClipJob;

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Only report errors on stderr
    pub fn quiet(self) -> Self {
        self.arg("-loglevel").arg("error")
    }

    /// Start reading the next input at this offset
    pub fn seek(self, offset: Duration) -> Self {
        self.arg("-ss").arg(seconds_arg(offset))
    }

    /// Limit output length
    pub fn duration(self, length: Duration) -> Self {
        self.arg("-t").arg(seconds_arg(length))
    }

    /// Select a stream for the output, e.g. `0:a:1`
    pub fn map_stream<S: Into<String>>(self, spec: S) -> Self {
        self.arg("-map").arg(spec)
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy every stream without re-encoding
    pub fn copy_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Run the command and collect its output, failing only if it cannot be spawned.
    ///
    /// The child gets its own process group so a terminal interrupt reaches
    /// only this program, which decides whether the running clip finishes.
    /// Dropping the future kills the child.
    pub async fn run(&self) -> Result<Output> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut command = Command::new(&self.binary_path);
        command.args(&self.args).kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        command
            .output()
            .await
            .map_err(|e| ClipError::Media(format!("Failed to execute {}: {}", self.binary_path, e)))
    }

    /// Execute the command and return its stdout
    pub async fn capture(&self) -> Result<String> {
        let output = self.run().await?;

        if !output.status.success() {
            return Err(ClipError::Media(format!(
                "{} failed: {}",
                self.description,
                failure_text(&output)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Diagnostic text of a failed process: stderr, or the exit status when stderr is empty
pub fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("process exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

/// Seconds with millisecond precision, as ffmpeg expects for -ss and -t
pub fn seconds_arg(offset: Duration) -> String {
    format!("{:.3}", offset.as_secs_f64())
}

/// Concat demuxer manifest listing clips by file name, in order.
///
/// Clips are expected to sit next to the manifest.
pub fn render_concat_manifest(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| {
            let name = clip
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| clip.to_string_lossy().into_owned());
            format!("file '{}'\n", name.replace('\'', "'\\''"))
        })
        .collect()
}

/// Builder for the commands this tool runs
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, probe_path: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            probe_path: probe_path.into(),
        }
    }

    /// Build the re-encode command for one clip.
    ///
    /// With an audio track selected only that track and the first video
    /// track are mapped; otherwise ffmpeg picks streams itself.
    pub fn extract_clip<P: AsRef<Path>>(
        &self,
        video_path: P,
        job: &ClipJob,
        audio_track: Option<usize>,
        video_codec: &str,
        audio_codec: &str,
        additional_options: &[String],
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.binary_path, format!("Clip {} extraction", job.index))
            .seek(job.adjusted_start)
            .input(video_path)
            .duration(job.duration());

        if let Some(track) = audio_track {
            cmd = cmd
                .map_stream("0:v:0")
                .map_stream(format!("0:a:{}", track));
        }

        cmd.video_codec(video_codec)
            .audio_codec(audio_codec)
            .args(additional_options.iter().cloned())
            .quiet()
            .overwrite()
            .output(&job.output_path)
    }

    /// Build the stream-copy concatenation command
    pub fn concatenate_clips<P: AsRef<Path>>(&self, manifest_path: P, output_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Clip concatenation")
            .arg("-f").arg("concat")
            .arg("-safe").arg("0")
            .input(manifest_path)
            .copy_streams()
            .quiet()
            .overwrite()
            .output(output_path)
    }

    /// Build the audio stream probe command (JSON output)
    pub fn probe_audio_streams<P: AsRef<Path>>(&self, video_path: P) -> MediaCommand {
        MediaCommand::new(&self.probe_path, "Audio track probe")
            .args(["-v", "error", "-select_streams", "a", "-show_streams", "-of", "json"])
            .output(video_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ClipJob {
        ClipJob {
            index: 3,
            adjusted_start: Duration::from_millis(12_500),
            adjusted_end: Duration::from_millis(15_750),
            output_path: PathBuf::from("out/clip_003_0-00-13.mp4"),
        }
    }

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg", "ffprobe")
    }

    #[test]
    fn test_extract_clip_all_audio() {
        let cmd = builder().extract_clip("movie.mkv", &job(), None, "libx264", "aac", &[]);
        assert_eq!(cmd.binary_path, "ffmpeg");
        assert_eq!(
            cmd.args,
            vec![
                "-ss", "12.500", "-i", "movie.mkv", "-t", "3.250",
                "-c:v", "libx264", "-c:a", "aac",
                "-loglevel", "error", "-y", "out/clip_003_0-00-13.mp4",
            ]
        );
        assert!(!cmd.args.contains(&"-map".to_string()));
    }

    #[test]
    fn test_extract_clip_selected_track() {
        let extra = vec!["-crf".to_string(), "23".to_string()];
        let cmd = builder().extract_clip("movie.mkv", &job(), Some(1), "libx264", "aac", &extra);
        assert_eq!(
            cmd.args,
            vec![
                "-ss", "12.500", "-i", "movie.mkv", "-t", "3.250",
                "-map", "0:v:0", "-map", "0:a:1",
                "-c:v", "libx264", "-c:a", "aac", "-crf", "23",
                "-loglevel", "error", "-y", "out/clip_003_0-00-13.mp4",
            ]
        );
    }

    #[test]
    fn test_concatenate_clips() {
        let cmd = builder().concatenate_clips("clips/concat_list.txt", "clips/merged_hi.mp4");
        assert_eq!(
            cmd.args,
            vec![
                "-f", "concat", "-safe", "0", "-i", "clips/concat_list.txt",
                "-c", "copy", "-loglevel", "error", "-y", "clips/merged_hi.mp4",
            ]
        );
    }

    #[test]
    fn test_probe_command() {
        let cmd = builder().probe_audio_streams("movie.mkv");
        assert_eq!(cmd.binary_path, "ffprobe");
        assert_eq!(cmd.args.last().map(String::as_str), Some("movie.mkv"));
        assert!(cmd.args.windows(2).any(|w| w[0] == "-select_streams" && w[1] == "a"));
    }

    #[test]
    fn test_concat_manifest_order_and_quoting() {
        let clips = vec![
            PathBuf::from("/out/clips_hi/clip_001_0-00-01.mp4"),
            PathBuf::from("/out/clips_hi/clip_002_it's.mp4"),
        ];
        assert_eq!(
            render_concat_manifest(&clips),
            "file 'clip_001_0-00-01.mp4'\nfile 'clip_002_it'\\''s.mp4'\n"
        );
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_child_runs_in_its_own_process_group() {
        // Prints the shell's pid and the process group from /proc/<pid>/stat
        let out = MediaCommand::new("sh", "Process group check")
            .arg("-c")
            .arg("echo $$ $(cut -d' ' -f5 /proc/$$/stat)")
            .capture()
            .await
            .unwrap();
        let ids: Vec<&str> = out.split_whitespace().collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], ids[1]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_reports_stderr_on_failure() {
        let err = MediaCommand::new("sh", "Failing step")
            .arg("-c")
            .arg("echo broken input >&2; exit 3")
            .capture()
            .await
            .unwrap_err();
        assert!(matches!(err, ClipError::Media(ref m) if m.contains("Failing step failed: broken input")));
    }

    #[test]
    fn test_seconds_arg() {
        assert_eq!(seconds_arg(Duration::ZERO), "0.000");
        assert_eq!(seconds_arg(Duration::from_millis(61_005)), "61.005");
    }
}
