//! Comparator: computes the per-frame cents difference between the
//! reference track and an aligned user f0 series. Does no thresholding —
//! classification into low/high/missing is the event segmenter's job.

use crate::align::AlignedUser;
use crate::models::PitchTrack;

/// Per-frame cents error, parallel to `ref_track.track`. `None` wherever
/// either operand is absent or non-positive.
pub type CentsArray = Vec<Option<f32>>;

/// `1200 · log2(user / ref)` per frame; `None` if either value is missing or
/// `<= 0`.
pub fn compare(ref_track: &PitchTrack, aligned_usr_f0: &AlignedUser) -> CentsArray {
    ref_track
        .track
        .iter()
        .zip(aligned_usr_f0.iter())
        .map(|(ref_frame, usr_f0)| cents(ref_frame.f0, *usr_f0))
        .collect()
}

fn cents(ref_f0: Option<f32>, usr_f0: Option<f32>) -> Option<f32> {
    match (ref_f0, usr_f0) {
        (Some(r), Some(u)) if r > 0.0 && u > 0.0 => Some(1200.0 * (u / r).log2()),
        _ => None,
    }
}

/// Present (non-missing) cents values only, in order.
pub fn present_values(cents: &CentsArray) -> Vec<f32> {
    cents.iter().filter_map(|c| *c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PitchAlgo, PitchFrame};

    fn ref_track(f0s: &[Option<f32>]) -> PitchTrack {
        PitchTrack {
            algo: PitchAlgo::Yin,
            sr: 44100,
            hop: 256,
            track: f0s
                .iter()
                .enumerate()
                .map(|(i, &f0)| PitchFrame { t: i as f64 * 256.0 / 44100.0, f0 })
                .collect(),
        }
    }

    #[test]
    fn same_frequency_yields_zero_cents() {
        let r = ref_track(&[Some(220.0)]);
        let result = compare(&r, &vec![Some(220.0)]);
        assert_eq!(result.len(), 1);
        assert!(result[0].unwrap().abs() < 1e-4);
    }

    #[test]
    fn doubled_frequency_yields_plus_1200() {
        let r = ref_track(&[Some(220.0)]);
        let result = compare(&r, &vec![Some(440.0)]);
        assert!((result[0].unwrap() - 1200.0).abs() < 1e-3);
    }

    #[test]
    fn halved_frequency_yields_minus_1200() {
        let r = ref_track(&[Some(220.0)]);
        let result = compare(&r, &vec![Some(110.0)]);
        assert!((result[0].unwrap() - (-1200.0)).abs() < 1e-3);
    }

    #[test]
    fn missing_ref_or_usr_yields_missing() {
        let r = ref_track(&[None, Some(220.0)]);
        let result = compare(&r, &vec![Some(220.0), None]);
        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn non_positive_values_yield_missing() {
        let r = ref_track(&[Some(-1.0), Some(0.0)]);
        let result = compare(&r, &vec![Some(220.0), Some(220.0)]);
        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn present_values_strips_missing() {
        let cents = vec![Some(1.0), None, Some(2.0)];
        assert_eq!(present_values(&cents), vec![1.0, 2.0]);
    }
}
