//! JSON artifact I/O for the four exchanges named in the external-interfaces
//! contract: reading a pre-computed `PitchTrack`, and writing
//! `events.json` / `summary.json` / `key_offset.json`.
//!
//! Rounding matches the contract: event times to 3 decimals, cents to 1
//! decimal; summary probabilities to 4 decimals, cents to 1-3 decimals.

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::models::{Event, KeyOffset, PitchTrack, Summary};

/// Parse a `PitchTrack` from the JSON shape documented in the external
/// interfaces: `{"algo","sr","hop","track":[{"t","f0_hz"}]}`.
pub fn pitch_track_from_json(text: &str) -> Result<PitchTrack> {
    serde_json::from_str(text).context("parsing PitchTrack JSON")
}

pub fn pitch_track_to_json(track: &PitchTrack) -> Result<String> {
    serde_json::to_string_pretty(track).context("serializing PitchTrack JSON")
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn round_to_f32(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}

/// `events.json`: an array of Event objects, times rounded to 3 decimals and
/// cents to 1 decimal.
pub fn events_to_json(events: &[Event]) -> Value {
    Value::Array(
        events
            .iter()
            .map(|e| {
                let mut obj = json!({
                    "start": round_to(e.start, 3),
                    "end": round_to(e.end, 3),
                    "type": e.event_type,
                });
                if let Some(avg) = e.avg_cents {
                    obj["avg_cents"] = json!(round_to_f32(avg, 1));
                }
                if let Some(max) = e.max_cents {
                    obj["max_cents"] = json!(round_to_f32(max, 1));
                }
                obj
            })
            .collect(),
    )
}

/// `summary.json`: a single object with probabilities at 4 decimals and
/// cents values at 1-3 decimals.
pub fn summary_to_json(summary: &Summary) -> Value {
    json!({
        "tol_cents": round_to_f32(summary.tol_cents, 1),
        "frames": summary.frames,
        "seconds": round_to(summary.seconds, 3),
        "mean_cents": summary.mean_cents.map(|v| round_to_f32(v, 1)),
        "median_cents": summary.median_cents.map(|v| round_to_f32(v, 1)),
        "std_cents": summary.std_cents.map(|v| round_to_f32(v, 1)),
        "percent_within_tol": round_to_f32(summary.percent_within_tol, 4),
        "percent_low": round_to_f32(summary.percent_low, 4),
        "percent_high": round_to_f32(summary.percent_high, 4),
        "p10_cents": summary.p10_cents.map(|v| round_to_f32(v, 1)),
        "p90_cents": summary.p90_cents.map(|v| round_to_f32(v, 1)),
        "unvoiced_miss_seconds": summary.unvoiced_miss_seconds.map(|v| round_to(v, 3)),
        "verdict": summary.verdict,
        "reason": summary.reason,
        "tips": summary.tips,
    })
}

/// `key_offset.json`.
pub fn key_offset_to_json(key_offset: &KeyOffset) -> Value {
    json!({
        "frames": key_offset.frames,
        "median_cents": key_offset.median_cents.map(|v| round_to_f32(v, 1)),
        "semitone_offset": key_offset.semitone_offset,
        "octave_k": key_offset.octave_k,
        "wrapped_median_cents": key_offset.wrapped_median_cents.map(|v| round_to_f32(v, 1)),
        "wrapped_within_40c": key_offset.wrapped_within_40c.map(|v| round_to_f32(v, 4)),
        "verdict": key_offset.verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventType, Verdict};

    #[test]
    fn pitch_track_round_trips_through_json() {
        let json = r#"{"algo":"yin","sr":44100,"hop":256,"track":[{"t":0.0,"f0_hz":220.0},{"t":0.00580,"f0_hz":null}]}"#;
        let track = pitch_track_from_json(json).unwrap();
        assert_eq!(track.sr, 44100);
        assert_eq!(track.len(), 2);
        assert_eq!(track.track[1].f0, None);

        let back = pitch_track_to_json(&track).unwrap();
        let reparsed = pitch_track_from_json(&back).unwrap();
        assert_eq!(reparsed.len(), track.len());
    }

    #[test]
    fn events_to_json_rounds_times_and_cents() {
        let events = vec![Event {
            start: 1.23456,
            end: 2.98765,
            event_type: EventType::PitchLow,
            avg_cents: Some(-12.345),
            max_cents: Some(-20.05),
        }];
        let json = events_to_json(&events);
        assert_eq!(json[0]["start"], 1.235);
        assert_eq!(json[0]["end"], 2.988);
        assert_eq!(json[0]["avg_cents"], -12.3);
    }

    #[test]
    fn summary_to_json_includes_verdict_and_tips() {
        let summary = Summary {
            tol_cents: 40.0,
            frames: 100,
            seconds: 1.0,
            mean_cents: Some(1.0),
            median_cents: Some(1.0),
            std_cents: Some(1.0),
            percent_within_tol: 0.9999,
            percent_low: 0.0001,
            percent_high: 0.0,
            p10_cents: Some(-1.0),
            p90_cents: Some(1.0),
            unvoiced_miss_seconds: None,
            verdict: Verdict::MostlyOk,
            reason: "ok",
            tips: &["keep going"],
        };
        let json = summary_to_json(&summary);
        assert_eq!(json["verdict"], "mostly_ok");
        assert_eq!(json["tips"][0], "keep going");
        assert_eq!(json["percent_within_tol"], 0.9999);
    }

    #[test]
    fn key_offset_to_json_handles_no_data() {
        let ko = KeyOffset::no_data();
        let json = key_offset_to_json(&ko);
        assert_eq!(json["frames"], 0);
        assert!(json["verdict"].is_null());
    }
}
