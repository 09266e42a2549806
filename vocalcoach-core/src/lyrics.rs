//! LyricAligner: assigns time intervals to lyric lines, either respecting
//! embedded timestamps (LRC/SRT/Timed) or distributing plain-text lines
//! across the reference's voiced segments.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{AnalysisError, LyricConfig, LyricLine, PitchTrack};

/// Where a set of lyric lines comes from.
pub enum LyricSource {
    Lrc(String),
    Srt(String),
    Plain(String),
    Timed(Vec<LyricLine>),
}

static LRC_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d+):(\d{2}(?:\.\d+)?)\]").expect("LRC_TAG_RE is a valid pattern")
});

static SRT_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,}):(\d{2}):(\d{2})[,.](\d{1,3})\s*-->\s*(\d{1,}):(\d{2}):(\d{2})[,.](\d{1,3})")
        .expect("SRT_TIME_RE is a valid pattern")
});

const LAST_LRC_LINE_DURATION: f64 = 3.0;

/// Produce the final, post-condition-satisfying lyric line list for `source`
/// against `ref`'s voiced structure.
pub fn align_lyrics(ref_track: &PitchTrack, source: LyricSource, config: &LyricConfig) -> Result<Vec<LyricLine>, AnalysisError> {
    let lines = match source {
        LyricSource::Lrc(text) => parse_lrc(&text)?,
        LyricSource::Srt(text) => parse_srt(&text)?,
        LyricSource::Timed(lines) => lines,
        LyricSource::Plain(text) => {
            let texts: Vec<String> = text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect();
            distribute_untimed(ref_track, &texts, config)
        }
    };
    Ok(normalize_lines(lines, config.min_line_duration_s))
}

// ---------------------------------------------------------------------------
//  LRC
// ---------------------------------------------------------------------------

fn parse_lrc(text: &str) -> Result<Vec<LyricLine>, AnalysisError> {
    struct Entry {
        start: f64,
        text: String,
    }

    let mut entries = Vec::new();
    for raw_line in text.lines() {
        let tags: Vec<_> = LRC_TAG_RE.captures_iter(raw_line).collect();
        if tags.is_empty() {
            continue;
        }
        let body = LRC_TAG_RE.replace_all(raw_line, "").trim().to_string();
        for cap in tags {
            let minutes: f64 = cap[1].parse().map_err(|_| AnalysisError::Parse(format!("bad LRC minutes in {raw_line:?}")))?;
            let seconds: f64 = cap[2].parse().map_err(|_| AnalysisError::Parse(format!("bad LRC seconds in {raw_line:?}")))?;
            entries.push(Entry {
                start: minutes * 60.0 + seconds,
                text: body.clone(),
            });
        }
    }

    if entries.is_empty() {
        return Err(AnalysisError::Parse("no [mm:ss.xx] tags found in LRC source".into()));
    }

    entries.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));

    let n = entries.len();
    Ok(entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let end = if i + 1 < n {
                entries[i + 1].start
            } else {
                e.start + LAST_LRC_LINE_DURATION
            };
            LyricLine {
                start: e.start,
                end,
                text: e.text.clone(),
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
//  SRT
// ---------------------------------------------------------------------------

fn parse_srt(text: &str) -> Result<Vec<LyricLine>, AnalysisError> {
    let mut lines = Vec::new();

    for block in text.replace("\r\n", "\n").split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        let mut block_lines = block.lines();

        let mut first = block_lines.next().unwrap_or("").trim();
        if first.parse::<u64>().is_ok() {
            first = block_lines.next().unwrap_or("").trim();
        }

        let caps = SRT_TIME_RE
            .captures(first)
            .ok_or_else(|| AnalysisError::Parse(format!("unparseable SRT time range: {first:?}")))?;
        let start = srt_timestamp_to_seconds(&caps, 1);
        let end = srt_timestamp_to_seconds(&caps, 5);

        let text: String = block_lines.collect::<Vec<_>>().join(" ").trim().to_string();
        lines.push(LyricLine { start, end, text });
    }

    if lines.is_empty() {
        return Err(AnalysisError::Parse("no SRT blocks found".into()));
    }
    lines.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));
    Ok(lines)
}

fn srt_timestamp_to_seconds(caps: &regex::Captures, group_offset: usize) -> f64 {
    let hh: f64 = caps[group_offset].parse().unwrap_or(0.0);
    let mm: f64 = caps[group_offset + 1].parse().unwrap_or(0.0);
    let ss: f64 = caps[group_offset + 2].parse().unwrap_or(0.0);
    let ms_str = &caps[group_offset + 3];
    let ms: f64 = ms_str.parse().unwrap_or(0.0);
    let ms = if ms_str.len() == 2 { ms * 10.0 } else { ms };
    hh * 3600.0 + mm * 60.0 + ss + ms / 1000.0
}

// ---------------------------------------------------------------------------
//  Plain untimed distribution
// ---------------------------------------------------------------------------

/// Maximal runs of voiced frames, merged across silence gaps shorter than
/// `gap_sec`, then filtered to runs at least `min_line_duration_s` long.
fn voiced_segments(ref_track: &PitchTrack, gap_sec: f64, min_line_duration_s: f64) -> Vec<(f64, f64)> {
    if ref_track.is_empty() {
        return Vec::new();
    }
    let frame_period = ref_track.frame_period();
    let times = ref_track.times();

    let mut raw: Vec<(f64, f64)> = Vec::new();
    let mut i = 0;
    let n = ref_track.len();
    while i < n {
        if ref_track.track[i].f0.is_none() {
            i += 1;
            continue;
        }
        let start_idx = i;
        let mut end_idx = i + 1;
        while end_idx < n && ref_track.track[end_idx].f0.is_some() {
            end_idx += 1;
        }
        raw.push((times[start_idx], times[end_idx - 1] + frame_period));
        i = end_idx;
    }

    let mut merged: Vec<(f64, f64)> = Vec::new();
    for (start, end) in raw {
        if let Some(last) = merged.last_mut() {
            if start - last.1 < gap_sec {
                last.1 = end;
                continue;
            }
        }
        merged.push((start, end));
    }

    merged.retain(|(s, e)| e - s >= min_line_duration_s);
    merged
}

fn distribute_untimed(ref_track: &PitchTrack, texts: &[String], config: &LyricConfig) -> Vec<LyricLine> {
    let n = texts.len();
    if n == 0 {
        return Vec::new();
    }

    let mut segments = voiced_segments(ref_track, config.gap_sec, config.min_line_duration_s);

    if segments.is_empty() {
        let total = (2.0 * n as f64).max(180.0);
        let per_line = total / n as f64;
        return texts
            .iter()
            .enumerate()
            .map(|(i, text)| LyricLine {
                start: i as f64 * per_line,
                end: (i as f64 + 1.0) * per_line,
                text: text.clone(),
            })
            .collect();
    }

    if segments.len() > n {
        segments = merge_segments_to_count(&segments, n);
    } else if segments.len() < n {
        segments = split_segments_to_count(&segments, n);
    }

    segments
        .into_iter()
        .zip(texts.iter())
        .map(|((start, end), text)| LyricLine { start, end, text: text.clone() })
        .collect()
}

/// Merge contiguous segments into `target` groups, proportionally sized by
/// index so earlier/later segments bag together rather than at random.
fn merge_segments_to_count(segments: &[(f64, f64)], target: usize) -> Vec<(f64, f64)> {
    if target == 0 || segments.is_empty() {
        return Vec::new();
    }
    let mut groups: Vec<Vec<(f64, f64)>> = vec![Vec::new(); target];
    for (i, seg) in segments.iter().enumerate() {
        let group_idx = (i * target) / segments.len();
        groups[group_idx.min(target - 1)].push(*seg);
    }
    groups
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(|g| {
            let start = g.first().unwrap().0;
            let end = g.last().unwrap().1;
            (start, end)
        })
        .collect()
}

/// Repeatedly bisect the longest segment until the count reaches `target`.
fn split_segments_to_count(segments: &[(f64, f64)], target: usize) -> Vec<(f64, f64)> {
    let mut segments = segments.to_vec();
    while segments.len() < target {
        let (idx, _) = segments
            .iter()
            .enumerate()
            .max_by(|a, b| (a.1 .1 - a.1 .0).partial_cmp(&(b.1 .1 - b.1 .0)).unwrap_or(std::cmp::Ordering::Equal))
            .expect("segments is non-empty while segments.len() < target");
        let (start, end) = segments[idx];
        let mid = (start + end) / 2.0;
        segments.splice(idx..=idx, [(start, mid), (mid, end)]);
    }
    segments
}

// ---------------------------------------------------------------------------
//  Format detection
// ---------------------------------------------------------------------------

/// Detect which [`LyricSource`] a file's extension/content most likely is.
/// Extension wins when recognized; otherwise sniffs the first few lines.
pub fn detect_format(path_ext: Option<&str>, content: &str) -> &'static str {
    match path_ext.map(|e| e.to_ascii_lowercase()) {
        Some(ref ext) if ext == "lrc" => return "lrc",
        Some(ref ext) if ext == "srt" => return "srt",
        Some(ref ext) if ext == "txt" => return "txt",
        _ => {}
    }
    let head: String = content.lines().take(5).collect::<Vec<_>>().join("\n");
    if head.contains('[') && head.contains(']') {
        "lrc"
    } else if head.contains("-->") {
        "srt"
    } else {
        "txt"
    }
}

// ---------------------------------------------------------------------------
//  Post-condition normalization
// ---------------------------------------------------------------------------

fn normalize_lines(mut lines: Vec<LyricLine>, min_line_duration_s: f64) -> Vec<LyricLine> {
    lines.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));

    let n = lines.len();
    for i in 0..n {
        let next_start = if i + 1 < n { Some(lines[i + 1].start) } else { None };
        if let Some(next) = next_start {
            if lines[i].end > next {
                lines[i].end = next;
            }
        }
        if lines[i].end - lines[i].start < min_line_duration_s {
            let extended = lines[i].start + min_line_duration_s;
            lines[i].end = match next_start {
                Some(next) => extended.min(next),
                None => extended,
            };
        }
    }
    lines
}

// ---------------------------------------------------------------------------
//  Writers
// ---------------------------------------------------------------------------

pub fn write_lrc(lines: &[LyricLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&seconds_to_lrc_tag(line.start));
        out.push_str(line.text.trim());
        out.push('\n');
    }
    out
}

pub fn write_srt(lines: &[LyricLine]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&(i + 1).to_string());
        out.push('\n');
        out.push_str(&seconds_to_srt_timestamp(line.start));
        out.push_str(" --> ");
        out.push_str(&seconds_to_srt_timestamp(line.end));
        out.push('\n');
        let text = line.text.trim();
        out.push_str(if text.is_empty() { " " } else { text });
        out.push_str("\n\n");
    }
    out
}

/// Compact overlay representation: `{"s":start,"e":end,"t":text}` per line.
pub fn write_overlay_json(lines: &[LyricLine]) -> serde_json::Value {
    serde_json::Value::Array(
        lines
            .iter()
            .map(|l| serde_json::json!({ "s": l.start, "e": l.end, "t": l.text }))
            .collect(),
    )
}

/// `hh:mm:ss,ms`, matching the source's unclamped hour formatting: a
/// duration ≥ 100 hours widens past two digits rather than wrapping.
fn seconds_to_srt_timestamp(sec: f64) -> String {
    let total_ms = (sec * 1000.0).round() as i64;
    let ms = total_ms.rem_euclid(1000);
    let total_sec = total_ms.div_euclid(1000);
    let hh = total_sec / 3600;
    let mm = (total_sec % 3600) / 60;
    let ss = total_sec % 60;
    format!("{hh:02}:{mm:02}:{ss:02},{ms:03}")
}

/// `[mm:ss.xx]` with hundredths-of-a-second precision.
fn seconds_to_lrc_tag(sec: f64) -> String {
    let total_cs = (sec * 100.0).round() as i64;
    let cs = total_cs.rem_euclid(100);
    let total_sec = total_cs.div_euclid(100);
    let mm = total_sec / 60;
    let ss = total_sec % 60;
    format!("[{mm:02}:{ss:02}.{cs:02}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PitchAlgo, PitchFrame};

    fn voiced_track(segments: &[(f64, f64)], total_len_s: f64, period: f64) -> PitchTrack {
        let n = (total_len_s / period) as usize;
        let track = (0..n)
            .map(|i| {
                let t = i as f64 * period;
                let voiced = segments.iter().any(|(s, e)| t >= *s && t < *e);
                PitchFrame { t, f0: if voiced { Some(220.0) } else { None } }
            })
            .collect();
        PitchTrack { algo: PitchAlgo::Yin, sr: (1.0 / period) as u32, hop: 1, track }
    }

    #[test]
    fn parse_lrc_basic() {
        let src = "[00:01.00]hello\n[00:02.50]world\n";
        let lines = parse_lrc(src).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "hello");
        assert!((lines[0].start - 1.0).abs() < 1e-6);
        assert!((lines[0].end - 2.5).abs() < 1e-6);
        assert!((lines[1].end - (2.5 + LAST_LRC_LINE_DURATION)).abs() < 1e-6);
    }

    #[test]
    fn parse_lrc_rejects_tagless_content() {
        assert!(parse_lrc("just plain text, no tags").is_err());
    }

    #[test]
    fn parse_srt_basic() {
        let src = "1\n00:00:01,000 --> 00:00:02,500\nhello there\n\n2\n00:00:02,500 --> 00:00:04,000\nworld\n";
        let lines = parse_srt(src).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "hello there");
        assert!((lines[0].start - 1.0).abs() < 1e-6);
        assert!((lines[0].end - 2.5).abs() < 1e-6);
    }

    #[test]
    fn parse_srt_rejects_malformed_block() {
        let src = "1\nnot a time range\nhello\n";
        assert!(parse_srt(src).is_err());
    }

    #[test]
    fn untimed_distribution_matches_segment_count() {
        let segs = [(0.5, 2.0), (3.0, 5.5), (6.0, 8.0)];
        let track = voiced_track(&segs, 9.0, 0.01);
        let config = LyricConfig::default();
        let texts = vec!["a".into(), "b".into(), "c".into()];
        let lines = distribute_untimed(&track, &texts, &config);
        assert_eq!(lines.len(), 3);
        for (line, (s, e)) in lines.iter().zip(segs.iter()) {
            assert!((line.start - s).abs() < 0.05, "start {} vs {}", line.start, s);
            assert!((line.end - e).abs() < 0.05, "end {} vs {}", line.end, e);
        }
    }

    #[test]
    fn untimed_distribution_merges_when_more_segments_than_lines() {
        let segs = [(0.0, 1.0), (1.5, 2.5), (3.0, 4.0), (4.5, 5.5)];
        let track = voiced_track(&segs, 6.0, 0.01);
        let config = LyricConfig::default();
        let texts = vec!["a".into(), "b".into()];
        let lines = distribute_untimed(&track, &texts, &config);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn untimed_distribution_splits_when_fewer_segments_than_lines() {
        let segs = [(0.0, 4.0)];
        let track = voiced_track(&segs, 5.0, 0.01);
        let config = LyricConfig::default();
        let texts = vec!["a".into(), "b".into(), "c".into()];
        let lines = distribute_untimed(&track, &texts, &config);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn untimed_distribution_falls_back_to_uniform_without_reference_segments() {
        let track = PitchTrack::empty(PitchAlgo::Yin, 100, 1);
        let config = LyricConfig::default();
        let texts = vec!["a".into(), "b".into()];
        let lines = distribute_untimed(&track, &texts, &config);
        assert_eq!(lines.len(), 2);
        assert!((lines[0].end - lines[1].start).abs() < 1e-9);
    }

    #[test]
    fn normalize_trims_overlaps_and_enforces_min_duration() {
        let lines = vec![
            LyricLine { start: 0.0, end: 5.0, text: "a".into() },
            LyricLine { start: 1.0, end: 1.05, text: "b".into() },
        ];
        let normalized = normalize_lines(lines, 0.4);
        assert!(normalized[0].end <= normalized[1].start);
        assert!(normalized[1].end - normalized[1].start >= 0.4 - 1e-9);
    }

    #[test]
    fn detect_format_prefers_extension() {
        assert_eq!(detect_format(Some("lrc"), "anything"), "lrc");
        assert_eq!(detect_format(Some("srt"), "anything"), "srt");
    }

    #[test]
    fn detect_format_sniffs_content_without_extension() {
        assert_eq!(detect_format(None, "[00:01.00]hi"), "lrc");
        assert_eq!(detect_format(None, "1\n00:00:01,000 --> 00:00:02,000\nhi"), "srt");
        assert_eq!(detect_format(None, "just some lyrics"), "txt");
    }

    #[test]
    fn srt_timestamp_formatting_is_unclamped_past_hour() {
        let ts = seconds_to_srt_timestamp(100.0 * 3600.0 + 1.234);
        assert!(ts.starts_with("100:00:01,2"), "got {ts}");
    }

    #[test]
    fn lrc_tag_formatting_round_trips_hundredths() {
        assert_eq!(seconds_to_lrc_tag(65.5), "[01:05.50]");
    }

    #[test]
    fn write_overlay_json_uses_compact_keys() {
        let lines = vec![LyricLine { start: 1.0, end: 2.0, text: "hi".into() }];
        let json = write_overlay_json(&lines);
        assert_eq!(json[0]["s"], 1.0);
        assert_eq!(json[0]["e"], 2.0);
        assert_eq!(json[0]["t"], "hi");
    }
}
