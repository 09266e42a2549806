//! Top-level orchestration: wires PitchExtractor → Aligner → Comparator →
//! {EventSegmenter, Summarizer, KeyOffsetAnalyzer} into one call, with the
//! same progress-callback and cooperative-cancellation conventions used
//! elsewhere in this codebase.

use anyhow::Result;
use log::info;

use crate::align::{self, AlignedUser};
use crate::compare::{self, CentsArray};
use crate::keyoffset;
use crate::models::{
    check_cancelled, AutosyncConfig, CancelToken, Event, KeyOffset, PitchTrack, ProgressCallback, ScoringConfig, Summary,
};
use crate::segment;
use crate::summarize;

/// Everything a single analysis request produces.
pub struct AnalysisResult {
    pub aligned_usr: AlignedUser,
    pub cents: CentsArray,
    pub events: Vec<Event>,
    pub summary: Summary,
    pub key_offset: KeyOffset,
}

/// Run the full pipeline against pre-extracted reference and user pitch
/// tracks. Pure beyond the progress callback: no file I/O, no audio
/// decoding (both happen in the caller, outside the core).
pub fn run_pipeline(
    ref_track: &PitchTrack,
    usr_track: &PitchTrack,
    autosync: bool,
    autosync_config: &AutosyncConfig,
    scoring: &ScoringConfig,
    progress: &Option<ProgressCallback>,
    cancel: &Option<CancelToken>,
) -> Result<AnalysisResult> {
    const TOTAL_STEPS: usize = 5;

    macro_rules! prog {
        ($step:expr, $msg:expr) => {
            if let Some(cb) = progress {
                cb($step, TOTAL_STEPS, $msg);
            }
        };
    }

    prog!(0, "Aligning user track onto reference timeline...");
    check_cancelled(cancel)?;
    let aligned_usr = align::align(ref_track, usr_track, autosync, autosync_config);

    prog!(1, "Comparing pitch in cents...");
    check_cancelled(cancel)?;
    let cents = compare::compare(ref_track, &aligned_usr);

    prog!(2, "Segmenting pitch events...");
    check_cancelled(cancel)?;
    let ref_f0 = ref_track.f0s();
    let ref_times = ref_track.times();
    let events = segment::segment(
        &cents,
        &ref_f0,
        &aligned_usr,
        &ref_times,
        scoring.tol_cents,
        scoring.min_event_duration_s,
    );

    prog!(3, "Summarizing pitch accuracy...");
    check_cancelled(cancel)?;
    let summary = summarize::summarize(
        &cents,
        scoring.tol_cents,
        scoring.min_seconds_for_verdict,
        ref_track.frame_period(),
        Some(&events),
    );

    prog!(4, "Diagnosing key/octave offset...");
    check_cancelled(cancel)?;
    let key_offset = keyoffset::analyze(&cents);

    info!(
        "analysis complete: {} frames, verdict={:?}, {} events",
        summary.frames,
        summary.verdict,
        events.len()
    );

    Ok(AnalysisResult {
        aligned_usr,
        cents,
        events,
        summary,
        key_offset,
    })
}
