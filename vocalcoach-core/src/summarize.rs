//! Summarizer: distribution statistics over the cents array plus a verdict
//! from fixed thresholds.

use crate::compare::{present_values, CentsArray};
use crate::models::{Event, EventType, Summary, Verdict};
use crate::numeric;

/// Compute a [`Summary`] over `cents`. `events`, if supplied, contributes
/// `unvoiced_miss_seconds`; without it the field is `None`.
pub fn summarize(
    cents: &CentsArray,
    tol_cents: f32,
    min_seconds_for_verdict: f64,
    frame_period: f64,
    events: Option<&[Event]>,
) -> Summary {
    let present = present_values(cents);
    let frames = present.len();
    let seconds = frames as f64 * frame_period;

    let mean_cents = numeric::mean(&present);
    let median_cents = numeric::median(&present);
    let std_cents = numeric::population_std(&present);
    let p10_cents = numeric::percentile(&present, 0.10);
    let p90_cents = numeric::percentile(&present, 0.90);

    let percent_within_tol = numeric::fraction_where(&present, |c| c.abs() <= tol_cents);
    let percent_low = numeric::fraction_where(&present, |c| c < -tol_cents);
    let percent_high = numeric::fraction_where(&present, |c| c > tol_cents);

    let unvoiced_miss_seconds = events.map(|evs| {
        evs.iter()
            .filter(|e| e.event_type == EventType::UnvoicedMiss)
            .map(|e| e.end - e.start)
            .sum()
    });

    let verdict = decide_verdict(
        seconds,
        min_seconds_for_verdict,
        frames,
        median_cents,
        mean_cents,
        percent_low,
        percent_high,
        percent_within_tol,
        std_cents,
    );
    let (reason, tips) = verdict_text(verdict);

    Summary {
        tol_cents,
        frames,
        seconds,
        mean_cents,
        median_cents,
        std_cents,
        percent_within_tol,
        percent_low,
        percent_high,
        p10_cents,
        p90_cents,
        unvoiced_miss_seconds,
        verdict,
        reason,
        tips,
    }
}

#[allow(clippy::too_many_arguments)]
fn decide_verdict(
    seconds: f64,
    min_seconds_for_verdict: f64,
    frames: usize,
    median_cents: Option<f32>,
    mean_cents: Option<f32>,
    percent_low: f32,
    percent_high: f32,
    percent_within_tol: f32,
    std_cents: Option<f32>,
) -> Verdict {
    if frames == 0 || seconds < min_seconds_for_verdict {
        return Verdict::InsufficientData;
    }

    let bias = median_cents.or(mean_cents).unwrap_or(0.0);
    let bias_diff = percent_high - percent_low;

    if bias <= -20.0 || bias_diff <= -0.15 {
        return Verdict::OverallLow;
    }
    if bias >= 20.0 || bias_diff >= 0.15 {
        return Verdict::OverallHigh;
    }
    if percent_within_tol < 0.55 || std_cents.unwrap_or(0.0) > 120.0 {
        return Verdict::Inconsistent;
    }
    if percent_within_tol >= 0.85 {
        return Verdict::MostlyOk;
    }
    Verdict::NeedsWork
}

fn verdict_text(verdict: Verdict) -> (&'static str, &'static [&'static str]) {
    match verdict {
        Verdict::InsufficientData => (
            "Not enough voiced overlap between the reference and your recording to judge pitch accuracy.",
            &["Sing along with more of the song, and make sure your microphone picks up your voice clearly."],
        ),
        Verdict::OverallLow => (
            "Your pitch runs consistently flat against the reference.",
            &[
                "Warm up before singing — cold vocal cords tend to sit flat.",
                "Try humming the starting note of each phrase before you sing it.",
            ],
        ),
        Verdict::OverallHigh => (
            "Your pitch runs consistently sharp against the reference.",
            &[
                "Relax your throat and avoid pushing for the note.",
                "Practice the melody slowly before singing at full tempo.",
            ],
        ),
        Verdict::Inconsistent => (
            "Your pitch accuracy varies a lot across the song.",
            &[
                "Break the song into short phrases and drill the hardest ones.",
                "Record yourself and compare phrase by phrase to find where it drifts.",
            ],
        ),
        Verdict::MostlyOk => (
            "Your pitch tracks the reference closely throughout.",
            &["Keep practicing at this level and try a harder song."],
        ),
        Verdict::NeedsWork => (
            "Your pitch is in the right neighborhood but not yet consistently on target.",
            &[
                "Focus on the sustained notes first — they're easiest to judge and fix.",
                "Slow the song down while practicing, then return to full speed.",
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents_for_seconds(value: f32, n: usize) -> CentsArray {
        vec![Some(value); n]
    }

    #[test]
    fn empty_cents_is_insufficient_data() {
        let summary = summarize(&vec![], 40.0, 15.0, 0.01, None);
        assert_eq!(summary.verdict, Verdict::InsufficientData);
        assert_eq!(summary.frames, 0);
    }

    #[test]
    fn short_duration_is_insufficient_data_even_with_data() {
        // 10 frames at 0.01s period = 0.1s, below the 15s minimum
        let cents = cents_for_seconds(0.0, 10);
        let summary = summarize(&cents, 40.0, 15.0, 0.01, None);
        assert_eq!(summary.verdict, Verdict::InsufficientData);
    }

    #[test]
    fn consistently_flat_is_overall_low() {
        let n = 2000; // 2000 * 0.01 = 20s
        let cents = cents_for_seconds(-30.0, n);
        let summary = summarize(&cents, 40.0, 15.0, 0.01, None);
        assert_eq!(summary.verdict, Verdict::OverallLow);
    }

    #[test]
    fn consistently_sharp_is_overall_high() {
        let n = 2000;
        let cents = cents_for_seconds(30.0, n);
        let summary = summarize(&cents, 40.0, 15.0, 0.01, None);
        assert_eq!(summary.verdict, Verdict::OverallHigh);
    }

    #[test]
    fn mostly_within_tolerance_is_mostly_ok() {
        let n = 2000;
        let cents = cents_for_seconds(5.0, n);
        let summary = summarize(&cents, 40.0, 15.0, 0.01, None);
        assert_eq!(summary.verdict, Verdict::MostlyOk);
        assert!((summary.percent_within_tol - 1.0).abs() < 1e-6);
    }

    #[test]
    fn high_variance_is_inconsistent() {
        let n = 2000;
        let mut cents: CentsArray = Vec::with_capacity(n);
        for i in 0..n {
            let v = if i % 2 == 0 { 200.0 } else { -200.0 };
            cents.push(Some(v));
        }
        let summary = summarize(&cents, 40.0, 15.0, 0.01, None);
        assert_eq!(summary.verdict, Verdict::Inconsistent);
    }

    #[test]
    fn unvoiced_miss_seconds_sums_only_that_event_type() {
        let n = 2000;
        let cents = cents_for_seconds(5.0, n);
        let events = vec![
            Event {
                start: 0.0,
                end: 2.0,
                event_type: EventType::UnvoicedMiss,
                avg_cents: None,
                max_cents: None,
            },
            Event {
                start: 5.0,
                end: 5.5,
                event_type: EventType::PitchHigh,
                avg_cents: Some(50.0),
                max_cents: Some(60.0),
            },
        ];
        let summary = summarize(&cents, 40.0, 15.0, 0.01, Some(&events));
        assert_eq!(summary.unvoiced_miss_seconds, Some(2.0));
    }

    #[test]
    fn percentages_sum_to_one() {
        let n = 100;
        let mut cents: CentsArray = Vec::new();
        for i in 0..n {
            cents.push(Some((i as f32) - 50.0));
        }
        let summary = summarize(&cents, 40.0, 15.0, 0.01, None);
        let total = summary.percent_low + summary.percent_within_tol + summary.percent_high;
        assert!((total - 1.0).abs() < 1e-4);
    }
}
