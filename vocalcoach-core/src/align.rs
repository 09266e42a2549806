//! Aligner: maps a user pitch track onto the reference time grid, optionally
//! pre-shifting the user timeline by a global offset discovered via
//! cross-correlation of voiced-activity masks ("autosync").

use crate::models::{AutosyncConfig, PitchTrack};

/// f0 value (or absence) for each index of the reference track.
pub type AlignedUser = Vec<Option<f32>>;

/// Align `usr` onto `ref_track`'s time grid.
///
/// If `autosync` is set, a global shift `Δt` is first chosen to maximize the
/// voiced-activity overlap between the two tracks (bounded by
/// `config.max_shift_s`), then added to every user timestamp before the
/// nearest-frame lookup. Returns a vector with one entry per reference frame.
pub fn align(ref_track: &PitchTrack, usr: &PitchTrack, autosync: bool, config: &AutosyncConfig) -> AlignedUser {
    if ref_track.is_empty() || usr.is_empty() {
        return vec![None; ref_track.len()];
    }

    let shift = if autosync {
        autosync_shift(ref_track, usr, config)
    } else {
        0.0
    };

    nearest_frame_lookup(&ref_track.times(), &shifted_times(usr, shift), &usr.f0s())
}

/// Discover the best global time shift `Δt ∈ [-max_shift_s, +max_shift_s]`
/// maximizing the dot product of voiced-activity indicators. Search
/// granularity is one reference frame period. Ties prefer the smallest
/// `|Δt|`, and among equal magnitudes the negative shift.
pub fn autosync_shift(ref_track: &PitchTrack, usr: &PitchTrack, config: &AutosyncConfig) -> f64 {
    let frame_period = ref_track.frame_period();
    if frame_period <= 0.0 {
        return 0.0;
    }
    let max_k = (config.max_shift_s / frame_period).floor() as i64;
    if max_k <= 0 {
        return 0.0;
    }

    let ref_times = ref_track.times();
    let ref_indicator: Vec<f32> = ref_track
        .track
        .iter()
        .map(|f| if f.f0.is_some() { 1.0 } else { 0.0 })
        .collect();
    let usr_times = usr.times();
    let usr_f0 = usr.f0s();

    let mut best_score = f32::NEG_INFINITY;
    let mut best_shift = 0.0f64;

    // Scan 0, -1, +1, -2, +2, ... so that among equal scores the first-seen
    // (smallest magnitude, negative-preferred) candidate is kept — only a
    // strict improvement overwrites `best_score`.
    for k in candidate_order(max_k) {
        let dt = k as f64 * frame_period;
        let shifted = shifted_times_raw(&usr_times, dt);
        let aligned = nearest_frame_lookup(&ref_times, &shifted, &usr_f0);
        let score: f32 = ref_indicator
            .iter()
            .zip(aligned.iter())
            .map(|(&r, u)| r * if u.is_some() { 1.0 } else { 0.0 })
            .sum();
        if score > best_score {
            best_score = score;
            best_shift = dt;
        }
    }

    best_shift
}

fn candidate_order(max_k: i64) -> Vec<i64> {
    let mut order = vec![0i64];
    for k in 1..=max_k {
        order.push(-k);
        order.push(k);
    }
    order
}

fn shifted_times(track: &PitchTrack, shift: f64) -> Vec<f64> {
    shifted_times_raw(&track.times(), shift)
}

fn shifted_times_raw(times: &[f64], shift: f64) -> Vec<f64> {
    times.iter().map(|t| t + shift).collect()
}

/// For each `ref_times[i]`, pick the `usr_times` entry closest to it and
/// return the corresponding `usr_f0`. `usr_times` is assumed sorted
/// ascending (as produced by a monotonic [`PitchTrack`], shifted uniformly).
fn nearest_frame_lookup(ref_times: &[f64], usr_times: &[f64], usr_f0: &[Option<f32>]) -> AlignedUser {
    if usr_times.is_empty() {
        return vec![None; ref_times.len()];
    }

    ref_times
        .iter()
        .map(|&t| {
            let idx = closest_index(usr_times, t);
            usr_f0[idx]
        })
        .collect()
}

/// Binary-search for the index in a sorted slice whose value is closest to
/// `target`, comparing the candidate at the insertion point against its
/// predecessor.
fn closest_index(sorted: &[f64], target: f64) -> usize {
    let pos = sorted.partition_point(|&t| t < target);
    if pos == 0 {
        return 0;
    }
    if pos >= sorted.len() {
        return sorted.len() - 1;
    }
    let before = sorted[pos - 1];
    let after = sorted[pos];
    if (target - before).abs() <= (after - target).abs() {
        pos - 1
    } else {
        pos
    }
}
