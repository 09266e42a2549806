//! VocalCoach Core — offline singing-practice pitch analysis engine.
//!
//! This crate provides:
//! - **models**: Data structures (PitchTrack, Event, Summary, KeyOffset, LyricLine, configs).
//! - **numeric**: Shared percentile/mean/std utilities (type-7 percentile).
//! - **pitch**: PitchExtractor — YIN and FFT-peak fundamental-frequency extraction.
//! - **align**: Aligner — nearest-frame mapping plus bounded-lag autosync.
//! - **compare**: Comparator — per-frame cents error.
//! - **segment**: EventSegmenter — coalesced, minimum-duration pitch events.
//! - **summarize**: Summarizer — distribution statistics and verdict.
//! - **keyoffset**: KeyOffsetAnalyzer — octave/key-shift diagnosis.
//! - **lyrics**: LyricAligner — LRC/SRT/plain-text lyric timing.
//! - **io**: JSON artifact (de)serialization for the external interfaces.
//! - **pipeline**: Top-level orchestration wiring the components together.

pub mod align;
pub mod compare;
pub mod io;
pub mod keyoffset;
pub mod lyrics;
pub mod models;
pub mod numeric;
pub mod pipeline;
pub mod pitch;
pub mod segment;
pub mod summarize;

// Re-export key types for convenience.
pub use models::*;
