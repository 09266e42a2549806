//! KeyOffsetAnalyzer: decomposes the median cents error into a coarse
//! 1200-cent octave component and a wrapped residual, distinguishing an
//! octave shift from a half-step key shift.

use crate::compare::{present_values, CentsArray};
use crate::models::{KeyOffset, KeyVerdict};
use crate::numeric;

/// Analyze `cents` for an octave/key offset. Returns a zero-frame
/// [`KeyOffset`] when no cents values are present.
pub fn analyze(cents: &CentsArray) -> KeyOffset {
    let present = present_values(cents);
    if present.is_empty() {
        return KeyOffset::no_data();
    }

    let median = numeric::median(&present).unwrap_or(0.0);
    let semitone_offset = (median / 100.0).round() as i32;
    // (-600, +600] is half-open on the low side: at an exact tie (median a
    // multiple of 1200 plus 600), this keeps the wrapped residual at +600
    // instead of spilling over to the excluded -600.
    let octave_k = ((median - 600.0) / 1200.0).ceil() as i32;

    let wrapped: Vec<f32> = present.iter().map(|c| c - 1200.0 * octave_k as f32).collect();
    let wrapped_median = numeric::median(&wrapped);
    let wrapped_within_40c = numeric::fraction_where(&wrapped, |c| c.abs() <= 40.0);

    let verdict = if octave_k.abs() >= 1 && (median - 1200.0 * octave_k as f32).abs() < 200.0 {
        KeyVerdict::OctaveShift
    } else {
        KeyVerdict::KeyShift
    };

    KeyOffset {
        frames: present.len(),
        median_cents: Some(median),
        semitone_offset: Some(semitone_offset),
        octave_k: Some(octave_k),
        wrapped_median_cents: wrapped_median,
        wrapped_within_40c: Some(wrapped_within_40c),
        verdict: Some(verdict),
    }
}
