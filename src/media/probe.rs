use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ClipError, Result};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    index: usize,
    codec_type: Option<String>,
    codec_name: Option<String>,
    channels: Option<u32>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// One audio stream of the source video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrackInfo {
    /// Stream index across all streams in the file
    pub stream_index: usize,
    /// Position among audio streams only, as used by `-map 0:a:N`
    pub audio_index: usize,
    pub language: String,
    pub title: String,
    pub codec: String,
    pub channels: Option<u32>,
}

impl AudioTrackInfo {
    pub fn display(&self) -> String {
        let mut text = format!("Track {}: {}", self.stream_index, self.language);
        if !self.title.is_empty() {
            text.push_str(&format!(" ({})", self.title));
        }
        let channels = self.channels.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string());
        text.push_str(&format!(" - {} {}ch", self.codec, channels));
        text
    }
}

/// Map ffprobe `-show_streams -of json` output to audio tracks
pub fn parse_probe_output(json: &str) -> Result<Vec<AudioTrackInfo>> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| ClipError::Probe(format!("Failed to parse ffprobe output: {}", e)))?;

    let tracks = probe
        .streams
        .into_iter()
        .filter(|stream| stream.codec_type.as_deref() == Some("audio"))
        .enumerate()
        .map(|(audio_index, mut stream)| AudioTrackInfo {
            stream_index: stream.index,
            audio_index,
            language: stream.tags.remove("language").unwrap_or_else(|| "unknown".to_string()),
            title: stream.tags.remove("title").unwrap_or_default(),
            codec: stream.codec_name.unwrap_or_else(|| "unknown".to_string()),
            channels: stream.channels,
        })
        .collect();

    Ok(tracks)
}
