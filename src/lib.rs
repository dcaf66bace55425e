//! Wordclip - Subtitle Word Clip Extractor
//!
//! Finds every subtitle line containing a word and cuts the matching
//! stretch of video with ffmpeg, optionally merging the clips into one file.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod planner;
pub mod progress;
pub mod subtitle;
pub mod worker;
pub mod workflow;
