//! PitchExtractor: converts mono PCM into a uniformly-spaced f0 track.
//!
//! Two interchangeable strategies are offered behind [`extract`]: a YIN-style
//! autocorrelation estimator (dense, used offline for reference tracks) and
//! an FFT-peak estimator with parabolic interpolation (cheap, used for
//! per-upload analysis). Neither ever panics or returns an error — both
//! degrade to an empty track or per-frame unvoiced marks.

use rustfft::{FftPlanner, num_complex::Complex32};

use crate::models::{PitchAlgo, PitchAlgoChoice, PitchConfig, PitchFrame, PitchTrack};

/// Extract a pitch track from already-decoded mono PCM.
///
/// `pcm` must be mono float samples at `sr` Hz. Dispatches to the YIN or
/// FFT-peak strategy per `config.algo`.
pub fn extract(pcm: &[f32], sr: u32, config: &PitchConfig) -> PitchTrack {
    let pcm = clamp_to_max_seconds(pcm, sr, config.max_seconds);

    match config.algo {
        PitchAlgoChoice::Yin => extract_yin(pcm, sr, config),
        PitchAlgoChoice::FftPeak => extract_fft_peak(pcm, sr, config),
    }
}

fn clamp_to_max_seconds(pcm: &[f32], sr: u32, max_seconds: Option<f64>) -> &[f32] {
    match max_seconds {
        Some(secs) if secs > 0.0 => {
            let max_samples = (secs * sr as f64).round() as usize;
            &pcm[..pcm.len().min(max_samples)]
        }
        _ => pcm,
    }
}

// ---------------------------------------------------------------------------
//  YIN path
// ---------------------------------------------------------------------------

/// Dense YIN-style extraction: a per-frame difference-function estimate in
/// `[fmin, fmax]`, gated by an RMS voicing mask relative to the track's
/// median frame energy.
pub fn extract_yin(pcm: &[f32], sr: u32, config: &PitchConfig) -> PitchTrack {
    let hop = config.hop.max(1);
    let frame_len = config.frame_len.max(256);

    if pcm.is_empty() || frame_len > pcm.len() {
        return PitchTrack::empty(PitchAlgo::Yin, sr, hop as u32);
    }

    let n_frames = (pcm.len() - frame_len) / hop + 1;
    let mut raw_f0 = Vec::with_capacity(n_frames);
    let mut rms = Vec::with_capacity(n_frames);

    for i in 0..n_frames {
        let start = i * hop;
        let frame = &pcm[start..start + frame_len];
        rms.push(frame_rms(frame));
        raw_f0.push(yin_frequency(frame, sr, config.fmin, config.fmax));
    }

    let median_rms = median_f32(&rms);
    let floor = median_rms * config.energy_threshold;

    let track = (0..n_frames)
        .map(|i| {
            let t = (i * hop) as f64 / sr as f64;
            let voiced = rms[i] >= floor;
            let f0 = if voiced { raw_f0[i] } else { None };
            PitchFrame { t, f0 }
        })
        .collect();

    PitchTrack {
        algo: PitchAlgo::Yin,
        sr,
        hop: hop as u32,
        track,
    }
}

/// Difference-function pitch estimate for one frame, restricted to `[fmin,
/// fmax]` and refined by parabolic interpolation around the first dip below
/// threshold (avoids octave errors the way a naive global minimum would not).
fn yin_frequency(frame: &[f32], sr: u32, fmin: f32, fmax: f32) -> Option<f32> {
    let half = frame.len() / 2;
    if half < 2 {
        return None;
    }

    let tau_min = ((sr as f32 / fmax).floor() as usize).max(1);
    let tau_max = ((sr as f32 / fmin).ceil() as usize).min(half - 1);
    if tau_min >= tau_max {
        return None;
    }

    let mut diff = vec![0.0f32; half];
    for tau in 1..half {
        let mut acc = 0.0f32;
        for i in 0..half {
            let delta = frame[i] - frame[i + tau];
            acc += delta * delta;
        }
        diff[tau] = acc;
    }

    let mut cmnd = vec![1.0f32; half];
    let mut running_sum = 0.0f32;
    for tau in 1..half {
        running_sum += diff[tau];
        cmnd[tau] = if running_sum != 0.0 {
            diff[tau] * tau as f32 / running_sum
        } else {
            1.0
        };
    }

    const CLARITY_THRESHOLD: f32 = 0.2;
    let search_lo = tau_min.max(2);
    let search_hi = tau_max.min(half - 2);
    if search_lo >= search_hi {
        return None;
    }

    let min_val = cmnd[search_lo..=search_hi]
        .iter()
        .cloned()
        .fold(f32::INFINITY, f32::min);
    let threshold = min_val + 0.05;

    let mut period = 0usize;
    for tau in (search_lo + 1)..search_hi {
        if cmnd[tau] < threshold && cmnd[tau] < cmnd[tau - 1] {
            period = tau;
            break;
        }
    }
    if period == 0 || cmnd[period] > CLARITY_THRESHOLD {
        return None;
    }

    let y1 = cmnd[period - 1];
    let y2 = cmnd[period];
    let y3 = cmnd[period + 1];
    let denom = y1 - 2.0 * y2 + y3;
    let period_f = if denom != 0.0 {
        period as f32 + (y1 - y3) / (2.0 * denom)
    } else {
        period as f32
    };
    if period_f <= 0.0 {
        return None;
    }

    let freq = sr as f32 / period_f;
    if freq.is_finite() && freq >= fmin && freq <= fmax {
        Some(freq)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
//  FFT-peak path
// ---------------------------------------------------------------------------

/// Cheap per-upload extraction: Hamming-windowed FFT magnitude per frame,
/// peak bin within `[fmin, fmax]` refined by three-point parabolic
/// interpolation in log-magnitude space.
pub fn extract_fft_peak(pcm: &[f32], sr: u32, config: &PitchConfig) -> PitchTrack {
    let hop = config.hop.max(1);
    let frame_len = config.frame_len.max(256);

    if pcm.is_empty() || frame_len > pcm.len() {
        return PitchTrack::empty(PitchAlgo::FftPeak, sr, hop as u32);
    }

    let window = hamming_window(frame_len);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_len);

    let n_frames = (pcm.len() - frame_len) / hop + 1;
    let mut track = Vec::with_capacity(n_frames);

    let mut scratch: Vec<Complex32> = vec![Complex32::new(0.0, 0.0); frame_len];
    for i in 0..n_frames {
        let start = i * hop;
        let frame = &pcm[start..start + frame_len];
        let t = start as f64 / sr as f64;

        let rms = frame_rms(frame);
        if rms < config.energy_threshold {
            track.push(PitchFrame { t, f0: None });
            continue;
        }

        for (j, sample) in frame.iter().enumerate() {
            scratch[j] = Complex32::new(sample * window[j], 0.0);
        }
        fft.process(&mut scratch);

        let n_bins = frame_len / 2;
        let magnitudes: Vec<f32> = scratch[..n_bins].iter().map(|c| c.norm()).collect();

        let f0 = fft_peak_frequency(&magnitudes, sr, frame_len, config.fmin, config.fmax);
        track.push(PitchFrame { t, f0 });
    }

    PitchTrack {
        algo: PitchAlgo::FftPeak,
        sr,
        hop: hop as u32,
        track,
    }
}

fn fft_peak_frequency(
    magnitudes: &[f32],
    sr: u32,
    frame_len: usize,
    fmin: f32,
    fmax: f32,
) -> Option<f32> {
    if magnitudes.len() < 3 {
        return None;
    }
    let bin_hz = sr as f32 / frame_len as f32;
    let lo_bin = ((fmin / bin_hz).floor() as usize).max(1);
    let hi_bin = ((fmax / bin_hz).ceil() as usize).min(magnitudes.len() - 2);
    if lo_bin >= hi_bin {
        return None;
    }

    let (peak_bin, _) = magnitudes[lo_bin..=hi_bin]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))?;
    let peak_bin = lo_bin + peak_bin;

    refine_from_spectrum(magnitudes, peak_bin, bin_hz)
}

/// Three-point parabolic interpolation in log-magnitude space around
/// `peak_bin`, falling back to the un-refined bin frequency on any
/// degenerate input (zero magnitude, flat neighborhood).
fn refine_from_spectrum(magnitudes: &[f32], peak_bin: usize, bin_hz: f32) -> Option<f32> {
    if peak_bin == 0 || peak_bin >= magnitudes.len() - 1 {
        return Some(peak_bin as f32 * bin_hz);
    }

    let y1 = magnitudes[peak_bin - 1].max(1e-12).ln();
    let y2 = magnitudes[peak_bin].max(1e-12).ln();
    let y3 = magnitudes[peak_bin + 1].max(1e-12).ln();

    if !y1.is_finite() || !y2.is_finite() || !y3.is_finite() {
        return Some(peak_bin as f32 * bin_hz);
    }

    let denom = 2.0 * y2 - y1 - y3;
    if denom.abs() < 1e-6 {
        return Some(peak_bin as f32 * bin_hz);
    }

    let shift = (y3 - y1) / (2.0 * denom);
    let freq = (peak_bin as f32 + shift) * bin_hz;
    if freq.is_finite() && freq > 0.0 {
        Some(freq)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
//  Shared helpers
// ---------------------------------------------------------------------------

fn frame_rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32).sqrt()
}

fn median_f32(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn hamming_window(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / (len - 1) as f32).cos())
        .collect()
}

/// Generate a sine wave at `freq` Hz for `seconds` at `sr`, for tests.
#[cfg(test)]
fn sine(freq: f32, seconds: f32, sr: u32) -> Vec<f32> {
    let n = (seconds * sr as f32) as usize;
    (0..n)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
        .collect()
}
