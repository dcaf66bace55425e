use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ClipError, Result};

static TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d+):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("timing line pattern is valid")
});

/// One timed caption block, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// A caption whose text contains the searched word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleMatch {
    pub start: Duration,
    pub end: Duration,
    /// Caption text with line breaks folded into spaces
    pub text: String,
}

/// Parse SRT content into entries.
///
/// Blocks without a timing line are skipped. Content that is not blank but
/// yields no entries at all is rejected.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleEntry>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut entries = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in content.lines().chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if block.is_empty() {
            continue;
        }
        match parse_block(&block, entries.len() + 1) {
            Some(entry) => entries.push(entry),
            None => warn!("Skipping subtitle block without timing line: {:?}", block.first()),
        }
        block.clear();
    }

    if entries.is_empty() && !content.trim().is_empty() {
        return Err(ClipError::InvalidInput("no subtitle entries found".to_string()));
    }

    debug!("Parsed {} subtitle entries", entries.len());
    Ok(entries)
}

fn parse_block(lines: &[&str], fallback_index: usize) -> Option<SubtitleEntry> {
    let timing_pos = lines.iter().position(|line| TIMING_LINE.is_match(line))?;
    let caps = TIMING_LINE.captures(lines[timing_pos])?;

    // Hour digits are unbounded, so out-of-range times reject the block
    let millis = |offset: usize| -> Option<u64> {
        let field = |i: usize| caps.get(offset + i)?.as_str().parse::<u64>().ok();
        field(1)?
            .checked_mul(3_600_000)?
            .checked_add(field(2)? * 60_000)?
            .checked_add(field(3)? * 1_000)?
            .checked_add(field(4)?)
    };
    let start = Duration::from_millis(millis(0)?);
    let end = Duration::from_millis(millis(4)?);

    let index = timing_pos
        .checked_sub(1)
        .and_then(|i| lines[i].trim().parse::<usize>().ok())
        .unwrap_or(fallback_index);

    let text = lines[timing_pos + 1..]
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");

    Some(SubtitleEntry { index, start, end, text })
}

/// Read a subtitle file, decoding as UTF-8 and falling back to Latin-1.
pub fn read_subtitle_file<P: AsRef<Path>>(path: P) -> Result<Vec<SubtitleEntry>> {
    let path = path.as_ref();
    let read_error = |reason: String| ClipError::Read {
        path: path.display().to_string(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| read_error(e.to_string()))?;

    let content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("{} is not valid UTF-8 ({}), retrying as Latin-1", path.display(), e.utf8_error());
            e.into_bytes().iter().map(|&b| char::from(b)).collect()
        }
    };

    parse_srt(&content).map_err(|e| read_error(e.to_string()))
}

/// Every entry containing `word`, case-insensitively, in file order.
pub fn find_matches(entries: &[SubtitleEntry], word: &str) -> Vec<SubtitleMatch> {
    let needle = word.to_lowercase();

    entries
        .iter()
        .filter(|entry| entry.text.to_lowercase().contains(&needle))
        .map(|entry| SubtitleMatch {
            start: entry.start,
            end: entry.end,
            text: entry.text.replace('\n', " "),
        })
        .collect()
}

/// Find all instances of a word in a subtitle file
pub fn find_word_in_subtitles<P: AsRef<Path>>(path: P, word: &str) -> Result<Vec<SubtitleMatch>> {
    let path = path.as_ref();
    let entries = read_subtitle_file(path)?;
    let matches = find_matches(&entries, word);
    info!("Found {} instance(s) of '{}' in {}", matches.len(), word, path.display());
    Ok(matches)
}

/// Format a time offset in SRT time format (HH:MM:SS,mmm)
pub fn format_srt_time(offset: Duration) -> String {
    let total_milliseconds = offset.as_millis() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
