//! Data models for the VocalCoach analysis engine.
//!
//! `PitchTrack`, `Event`, `Summary`, `KeyOffset` and `LyricLine` are the
//! artifacts exchanged across components and (de)serialized at the process
//! boundary. Missingness is always explicit (`Option<f32>`), never `NaN`.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default symmetric tolerance band, in cents, for on-pitch classification.
pub const DEFAULT_TOL_CENTS: f32 = 40.0;

/// Default minimum duration (seconds) for a segmented event to be kept.
pub const DEFAULT_MIN_EVENT_DURATION: f64 = 0.20;

/// Default minimum voiced seconds required before a verdict is issued.
pub const DEFAULT_MIN_SECONDS_FOR_VERDICT: f64 = 15.0;

/// Default bound (seconds) on the autosync lag search.
pub const DEFAULT_AUTOSYNC_MAX: f64 = 3.0;

/// Default silence gap (seconds) treated as a voiced-segment boundary.
pub const DEFAULT_LYRIC_GAP_SEC: f64 = 0.60;

/// Default minimum duration (seconds) for a lyric line.
pub const DEFAULT_MIN_LINE_DURATION: f64 = 0.40;

// ---------------------------------------------------------------------------
//  Cancellation & progress
// ---------------------------------------------------------------------------

/// Cancellation token — shared atomic bool for cooperative cancellation.
pub type CancelToken = Arc<AtomicBool>;

/// Create a new cancellation token.
pub fn new_cancel_token() -> CancelToken {
    Arc::new(AtomicBool::new(false))
}

/// Check if cancelled; return Err if so.
pub fn check_cancelled(cancel: &Option<CancelToken>) -> Result<(), AnalysisError> {
    if let Some(token) = cancel {
        if token.load(Ordering::Relaxed) {
            return Err(AnalysisError::Cancelled);
        }
    }
    Ok(())
}

/// Progress callback type: (current_step, total_steps, phase_name).
pub type ProgressCallback = Box<dyn Fn(usize, usize, &str) + Send + Sync>;

// ---------------------------------------------------------------------------
//  Errors
// ---------------------------------------------------------------------------

/// Error taxonomy for the analysis pipeline.
///
/// Only [`crate::lyrics::align_lyrics`] returns this as an `Err`; every other
/// component recovers its error kinds internally and returns a plain value
/// (an empty track, an `insufficient_data` summary, a zero-frame key offset).
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("input shape error: {0}")]
    InputShape(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("numeric edge case: {0}")]
    NumericEdge(String),
    #[error("operation cancelled")]
    Cancelled,
}

// ---------------------------------------------------------------------------
//  PitchTrack
// ---------------------------------------------------------------------------

/// Extraction method tag stamped onto a [`PitchTrack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchAlgo {
    Yin,
    Pyin,
    FftPeak,
}

/// One analysis frame: a timestamp and an optional fundamental frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchFrame {
    pub t: f64,
    #[serde(rename = "f0_hz")]
    pub f0: Option<f32>,
}

/// A uniformly-spaced fundamental-frequency track.
///
/// `sr` and `hop` are constant within a track; `frame_period()` derives the
/// spacing between consecutive `t` values. An empty `track` is valid and
/// propagates as "no data" rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchTrack {
    pub algo: PitchAlgo,
    pub sr: u32,
    pub hop: u32,
    pub track: Vec<PitchFrame>,
}

impl PitchTrack {
    pub fn empty(algo: PitchAlgo, sr: u32, hop: u32) -> Self {
        Self {
            algo,
            sr,
            hop,
            track: Vec::new(),
        }
    }

    /// Seconds spanned by one hop, i.e. the spacing between frames.
    pub fn frame_period(&self) -> f64 {
        self.hop as f64 / self.sr as f64
    }

    pub fn len(&self) -> usize {
        self.track.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    /// f0 values only, in order, preserving `None`s.
    pub fn f0s(&self) -> Vec<Option<f32>> {
        self.track.iter().map(|f| f.f0).collect()
    }

    /// Timestamps only, in order.
    pub fn times(&self) -> Vec<f64> {
        self.track.iter().map(|f| f.t).collect()
    }
}

// ---------------------------------------------------------------------------
//  Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PitchLow,
    PitchHigh,
    UnvoicedMiss,
}

/// A coalesced, minimum-duration run of frames sharing one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub start: f64,
    pub end: f64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cents: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cents: Option<f32>,
}

// ---------------------------------------------------------------------------
//  Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    MostlyOk,
    NeedsWork,
    OverallLow,
    OverallHigh,
    Inconsistent,
    InsufficientData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub tol_cents: f32,
    pub frames: usize,
    pub seconds: f64,
    pub mean_cents: Option<f32>,
    pub median_cents: Option<f32>,
    pub std_cents: Option<f32>,
    pub percent_within_tol: f32,
    pub percent_low: f32,
    pub percent_high: f32,
    pub p10_cents: Option<f32>,
    pub p90_cents: Option<f32>,
    pub unvoiced_miss_seconds: Option<f64>,
    pub verdict: Verdict,
    pub reason: &'static str,
    pub tips: &'static [&'static str],
}

// ---------------------------------------------------------------------------
//  KeyOffset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyVerdict {
    OctaveShift,
    KeyShift,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyOffset {
    pub frames: usize,
    pub median_cents: Option<f32>,
    pub semitone_offset: Option<i32>,
    pub octave_k: Option<i32>,
    pub wrapped_median_cents: Option<f32>,
    pub wrapped_within_40c: Option<f32>,
    pub verdict: Option<KeyVerdict>,
}

impl KeyOffset {
    /// The "no overlap" result returned when zero cents values were present.
    pub fn no_data() -> Self {
        Self {
            frames: 0,
            median_cents: None,
            semitone_offset: None,
            octave_k: None,
            wrapped_median_cents: None,
            wrapped_within_40c: None,
            verdict: None,
        }
    }
}

// ---------------------------------------------------------------------------
//  LyricLine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

// ---------------------------------------------------------------------------
//  Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchAlgoChoice {
    Yin,
    FftPeak,
}

/// Configuration for [`crate::pitch::extract`].
///
/// `energy_threshold` has a different meaning per algorithm: for the YIN path
/// it is a multiplier against the frame RMS median (default `0.3`); for the
/// FFT-peak path it is an absolute RMS floor. This asymmetry is intentional —
/// see the design notes on unifying the two thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchConfig {
    pub algo: PitchAlgoChoice,
    pub hop: usize,
    pub frame_len: usize,
    pub fmin: f32,
    pub fmax: f32,
    pub energy_threshold: f32,
    pub max_seconds: Option<f64>,
}

impl PitchConfig {
    pub fn yin_default() -> Self {
        Self {
            algo: PitchAlgoChoice::Yin,
            hop: 256,
            frame_len: 512,
            fmin: 65.0,
            fmax: 1046.5,
            energy_threshold: 0.3,
            max_seconds: None,
        }
    }

    pub fn fft_peak_default() -> Self {
        Self {
            algo: PitchAlgoChoice::FftPeak,
            hop: 2048,
            frame_len: 4096,
            fmin: 80.0,
            fmax: 800.0,
            energy_threshold: 0.01,
            max_seconds: None,
        }
    }
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self::yin_default()
    }
}

/// Configuration for [`crate::align::align`]'s autosync search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AutosyncConfig {
    pub max_shift_s: f64,
}

impl Default for AutosyncConfig {
    fn default() -> Self {
        Self {
            max_shift_s: DEFAULT_AUTOSYNC_MAX,
        }
    }
}

/// Configuration shared by the comparator, event segmenter and summarizer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub tol_cents: f32,
    pub min_event_duration_s: f64,
    pub min_seconds_for_verdict: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tol_cents: DEFAULT_TOL_CENTS,
            min_event_duration_s: DEFAULT_MIN_EVENT_DURATION,
            min_seconds_for_verdict: DEFAULT_MIN_SECONDS_FOR_VERDICT,
        }
    }
}

/// Configuration for [`crate::lyrics::align_lyrics`]'s untimed distribution path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LyricConfig {
    pub gap_sec: f64,
    pub min_line_duration_s: f64,
}

impl Default for LyricConfig {
    fn default() -> Self {
        Self {
            gap_sec: DEFAULT_LYRIC_GAP_SEC,
            min_line_duration_s: DEFAULT_MIN_LINE_DURATION,
        }
    }
}
