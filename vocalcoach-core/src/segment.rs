//! EventSegmenter: turns per-frame low/high/unvoiced-miss classifications
//! into coalesced, minimum-duration-gated events.

use crate::align::AlignedUser;
use crate::compare::CentsArray;
use crate::models::{Event, EventType};

/// Segment the three frame-level masks (low, high, unvoiced-miss) into
/// events, rejecting any run shorter than `min_duration` seconds. Output is
/// sorted by `start` ascending.
pub fn segment(
    cents: &CentsArray,
    ref_f0: &[Option<f32>],
    usr_aligned: &AlignedUser,
    ref_times: &[f64],
    tol_cents: f32,
    min_duration: f64,
) -> Vec<Event> {
    let n = cents.len();
    if n == 0 {
        return Vec::new();
    }
    let frame_period = if n >= 2 { ref_times[1] - ref_times[0] } else { 0.0 };

    let low: Vec<bool> = cents.iter().map(|c| matches!(c, Some(v) if *v < -tol_cents)).collect();
    let high: Vec<bool> = cents.iter().map(|c| matches!(c, Some(v) if *v > tol_cents)).collect();
    let unvoiced_miss: Vec<bool> = ref_f0
        .iter()
        .zip(usr_aligned.iter())
        .map(|(r, u)| r.is_some() && u.is_none())
        .collect();

    let mut events = Vec::new();
    events.extend(runs_to_events(
        &low,
        EventType::PitchLow,
        cents,
        ref_times,
        frame_period,
        min_duration,
    ));
    events.extend(runs_to_events(
        &high,
        EventType::PitchHigh,
        cents,
        ref_times,
        frame_period,
        min_duration,
    ));
    events.extend(runs_to_events(
        &unvoiced_miss,
        EventType::UnvoicedMiss,
        cents,
        ref_times,
        frame_period,
        min_duration,
    ));

    events.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));
    events
}

fn runs_to_events(
    mask: &[bool],
    event_type: EventType,
    cents: &CentsArray,
    ref_times: &[f64],
    frame_period: f64,
    min_duration: f64,
) -> Vec<Event> {
    let mut out = Vec::new();
    let n = mask.len();
    let mut i = 0;
    while i < n {
        if !mask[i] {
            i += 1;
            continue;
        }
        let start_idx = i;
        let mut end_idx = i + 1;
        while end_idx < n && mask[end_idx] {
            end_idx += 1;
        }

        let start = ref_times[start_idx];
        let end = ref_times[end_idx - 1] + frame_period;

        if end - start >= min_duration {
            out.push(build_event(event_type, start, end, &cents[start_idx..end_idx]));
        }

        i = end_idx;
    }
    out
}

fn build_event(event_type: EventType, start: f64, end: f64, segment_cents: &[Option<f32>]) -> Event {
    match event_type {
        EventType::UnvoicedMiss => Event {
            start,
            end,
            event_type,
            avg_cents: None,
            max_cents: None,
        },
        EventType::PitchLow | EventType::PitchHigh => {
            let present: Vec<f32> = segment_cents.iter().filter_map(|c| *c).collect();
            let avg = if present.is_empty() {
                None
            } else {
                Some(round1(present.iter().sum::<f32>() / present.len() as f32))
            };
            let extremum = match event_type {
                EventType::PitchLow => present.iter().cloned().fold(f32::INFINITY, f32::min),
                EventType::PitchHigh => present.iter().cloned().fold(f32::NEG_INFINITY, f32::max),
                EventType::UnvoicedMiss => unreachable!(),
            };
            let max_cents = if present.is_empty() { None } else { Some(round1(extremum)) };
            Event {
                start,
                end,
                event_type,
                avg_cents: avg,
                max_cents,
            }
        }
    }
}

fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}
