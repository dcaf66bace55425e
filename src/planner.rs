use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::subtitle::SubtitleMatch;

/// One encode job cut around a subtitle match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipJob {
    /// 1-based position in the batch
    pub index: usize,
    pub adjusted_start: Duration,
    pub adjusted_end: Duration,
    pub output_path: PathBuf,
}

impl ClipJob {
    pub fn duration(&self) -> Duration {
        self.adjusted_end.saturating_sub(self.adjusted_start)
    }
}

/// Keep characters that are safe in a folder name: alphanumerics, space, '-' and '_'.
pub fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(|&c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Whole seconds as H:MM:SS, hours unpadded.
pub fn format_timestamp(offset: Duration) -> String {
    let total = offset.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

pub fn word_folder(output_dir: &Path, safe_word: &str) -> PathBuf {
    output_dir.join(format!("clips_{}", safe_word))
}

pub fn merged_path(word_folder: &Path, safe_word: &str) -> PathBuf {
    word_folder.join(format!("merged_{}.mp4", safe_word))
}

/// Expand each match by the padding and assign its output file.
pub fn plan_clips(
    matches: &[SubtitleMatch],
    pre_roll: Duration,
    post_roll: Duration,
    word_folder: &Path,
) -> Vec<ClipJob> {
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let index = i + 1;
            let stamp = format_timestamp(m.start).replace(':', "-");
            ClipJob {
                index,
                adjusted_start: m.start.saturating_sub(pre_roll),
                adjusted_end: m.end + post_roll,
                output_path: word_folder.join(format!("clip_{:03}_{}.mp4", index, stamp)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(start_ms: u64, end_ms: u64) -> SubtitleMatch {
        SubtitleMatch {
            start: Duration::from_millis(start_ms),
            end: Duration::from_millis(end_ms),
            text: "hello".to_string(),
        }
    }

    #[test]
    fn test_hello_world_window() {
        let jobs = plan_clips(&[at(1_000, 2_000)], Duration::from_secs(1), Duration::from_secs(1), Path::new("out"));
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].adjusted_start, Duration::ZERO);
        assert_eq!(jobs[0].adjusted_end, Duration::from_secs(3));
        assert_eq!(jobs[0].duration(), Duration::from_secs(3));
        assert_eq!(jobs[0].output_path, Path::new("out").join("clip_001_0-00-01.mp4"));
    }

    #[test]
    fn test_start_clamped_at_zero() {
        let jobs = plan_clips(&[at(300, 900)], Duration::from_secs(5), Duration::ZERO, Path::new("out"));
        assert_eq!(jobs[0].adjusted_start, Duration::ZERO);
        assert_eq!(jobs[0].adjusted_end, Duration::from_millis(900));
    }

    #[test]
    fn test_window_arithmetic_over_many_matches() {
        let pre = Duration::from_millis(1_500);
        let post = Duration::from_millis(750);
        let matches: Vec<_> = (0..50u64).map(|i| at(i * 700, i * 700 + 400)).collect();

        for (job, m) in plan_clips(&matches, pre, post, Path::new("out")).iter().zip(&matches) {
            assert_eq!(job.adjusted_start, m.start.saturating_sub(pre));
            assert_eq!(job.adjusted_end, m.end + post);
            assert!(job.adjusted_end > job.adjusted_start);
        }
    }

    #[test]
    fn test_output_names_are_numbered() {
        let jobs = plan_clips(
            &[at(3_723_000, 3_724_000), at(10_000, 11_000)],
            Duration::ZERO,
            Duration::ZERO,
            Path::new("clips_hi"),
        );
        assert_eq!(jobs[0].index, 1);
        assert!(jobs[0].output_path.ends_with("clip_001_1-02-03.mp4"));
        assert_eq!(jobs[1].index, 2);
        assert!(jobs[1].output_path.ends_with("clip_002_0-00-10.mp4"));
    }

    #[test]
    fn test_sanitize_word() {
        assert_eq!(sanitize_word("hello"), "hello");
        assert_eq!(sanitize_word("  what's up?! "), "whats up");
        assert_eq!(sanitize_word("a/b\\c:d"), "abcd");
        assert_eq!(sanitize_word("x-ray_vision"), "x-ray_vision");
        assert_eq!(sanitize_word("café"), "café");
    }

    #[test]
    fn test_output_layout() {
        let folder = word_folder(Path::new("/tmp/out"), "hello");
        assert_eq!(folder, Path::new("/tmp/out/clips_hello"));
        assert_eq!(merged_path(&folder, "hello"), Path::new("/tmp/out/clips_hello/merged_hello.mp4"));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Duration::from_millis(1_999)), "0:00:01");
        assert_eq!(format_timestamp(Duration::from_secs(3_661)), "1:01:01");
        assert_eq!(format_timestamp(Duration::from_secs(36_000)), "10:00:00");
    }
}
