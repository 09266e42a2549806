//! VocalCoach CLI — headless singing-practice pitch analysis.
//!
//! Usage:
//!     vocalcoach pitch reference.wav --out ref_pitch.json
//!     vocalcoach compare --ref ref_pitch.json --usr usr_pitch.json --json
//!     vocalcoach lyrics --ref ref_pitch.json --lyrics song.lrc --out-dir ./out
//!     vocalcoach info reference.wav

mod audio_io;

use clap::{Parser, Subcommand};
use std::fs;
use std::path::Path;
use std::time::Instant;

use vocalcoach_core::io::{events_to_json, key_offset_to_json, pitch_track_from_json, pitch_track_to_json, summary_to_json};
use vocalcoach_core::lyrics::{align_lyrics, detect_format, write_lrc, write_overlay_json, write_srt, LyricSource};
use vocalcoach_core::models::*;
use vocalcoach_core::pipeline::run_pipeline;

#[derive(Parser)]
#[command(
    name = "vocalcoach",
    version,
    about = "VocalCoach — offline singing-practice pitch analysis CLI",
    long_about = "Extract pitch from audio, compare a practice take against a reference, \
                  score the result, and align lyrics to the reference timeline. \
                  Use --json on any subcommand for pipeline integration."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a PitchTrack from an audio file
    Pitch {
        /// Audio file to analyze
        file: String,

        /// Pitch extraction algorithm
        #[arg(long, value_enum, default_value = "yin")]
        algo: AlgoArg,

        /// Write the resulting PitchTrack JSON here (stdout if omitted)
        #[arg(long)]
        out: Option<String>,

        /// Cap analysis to this many seconds of audio
        #[arg(long)]
        max_seconds: Option<f64>,

        /// Output a human progress report instead of a bare JSON file
        #[arg(long)]
        json: bool,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Align a user PitchTrack onto a reference and score the match
    Compare {
        /// Reference PitchTrack JSON file
        #[arg(long)]
        r#ref: String,

        /// User PitchTrack JSON file
        #[arg(long)]
        usr: String,

        /// Search for the best time lag before comparing
        #[arg(long)]
        autosync: bool,

        /// Pitch-match tolerance in cents
        #[arg(long)]
        tol_cents: Option<f32>,

        /// Write events.json, summary.json, key_offset.json into this directory
        #[arg(long)]
        out_dir: Option<String>,

        /// Output results as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Align lyric lines (LRC/SRT/plain text) to a reference timeline
    Lyrics {
        /// Reference PitchTrack JSON file
        #[arg(long)]
        r#ref: String,

        /// Lyric source file (.lrc, .srt, or plain text)
        #[arg(long)]
        lyrics: String,

        /// Write lyrics.json / .lrc / .srt / _overlay.json into this directory
        #[arg(long)]
        out_dir: Option<String>,

        /// Output results as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show basic info about an audio file (duration, sample rate)
    Info {
        /// Audio files to inspect
        #[arg(required = true)]
        files: Vec<String>,

        /// Output as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AlgoArg {
    Yin,
    FftPeak,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Pitch { verbose, .. }
        | Commands::Compare { verbose, .. }
        | Commands::Lyrics { verbose, .. }
        | Commands::Info { verbose, .. } => *verbose,
    };
    let level = if verbose { "debug" } else { "info" };
    // SAFETY: Called before any threads are spawned, at program start.
    unsafe {
        std::env::set_var("RUST_LOG", format!("vocalcoach={}", level));
    }
    env_logger::init();

    match cli.command {
        Commands::Pitch { file, algo, out, max_seconds, json, .. } => cmd_pitch(file, algo, out, max_seconds, json),
        Commands::Compare { r#ref, usr, autosync, tol_cents, out_dir, json, .. } => {
            cmd_compare(r#ref, usr, autosync, tol_cents, out_dir, json)
        }
        Commands::Lyrics { r#ref, lyrics, out_dir, json, .. } => cmd_lyrics(r#ref, lyrics, out_dir, json),
        Commands::Info { files, json, .. } => cmd_info(files, json),
    }
}

// ---------------------------------------------------------------------------
//  Commands
// ---------------------------------------------------------------------------

fn cmd_pitch(file: String, algo: AlgoArg, out: Option<String>, max_seconds: Option<f64>, json: bool) -> anyhow::Result<()> {
    let t0 = Instant::now();

    let mut config = match algo {
        AlgoArg::Yin => PitchConfig::yin_default(),
        AlgoArg::FftPeak => PitchConfig::fft_peak_default(),
    };
    config.max_seconds = max_seconds;

    let target_sr = 44100u32;
    if !json {
        eprintln!("[1/2] Decoding {}...", file);
    }
    let pcm = audio_io::load_mono_pcm(&file, target_sr)?;

    if !json {
        eprintln!("[2/2] Extracting pitch ({:?})...", algo);
    }
    let track = vocalcoach_core::pitch::extract(&pcm, target_sr, &config);
    let elapsed = t0.elapsed().as_secs_f64();

    let text = pitch_track_to_json(&track)?;
    match out {
        Some(path) => {
            fs::write(&path, &text)?;
            if !json {
                eprintln!("PitchTrack written: {} ({} frames, {:.2}s)", path, track.len(), elapsed);
            }
        }
        None => println!("{}", text),
    }

    Ok(())
}

fn cmd_compare(
    ref_path: String,
    usr_path: String,
    autosync: bool,
    tol_cents: Option<f32>,
    out_dir: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let t0 = Instant::now();

    let ref_track = pitch_track_from_json(&fs::read_to_string(&ref_path)?)?;
    let usr_track = pitch_track_from_json(&fs::read_to_string(&usr_path)?)?;

    let scoring = ScoringConfig {
        tol_cents: tol_cents.unwrap_or(DEFAULT_TOL_CENTS),
        ..Default::default()
    };
    let autosync_config = AutosyncConfig::default();

    let progress: Option<ProgressCallback> = if !json {
        Some(Box::new(|step, total, msg| {
            eprintln!("[{}/{}] {}", step + 1, total, msg);
        }))
    } else {
        None
    };

    let result = run_pipeline(&ref_track, &usr_track, autosync, &autosync_config, &scoring, &progress, &None)?;
    let elapsed = t0.elapsed().as_secs_f64();

    if let Some(dir) = &out_dir {
        fs::create_dir_all(dir)?;
        fs::write(Path::new(dir).join("events.json"), serde_json::to_string_pretty(&events_to_json(&result.events))?)?;
        fs::write(Path::new(dir).join("summary.json"), serde_json::to_string_pretty(&summary_to_json(&result.summary))?)?;
        fs::write(
            Path::new(dir).join("key_offset.json"),
            serde_json::to_string_pretty(&key_offset_to_json(&result.key_offset))?,
        )?;
        if !json {
            eprintln!("Artifacts written to {}", dir);
        }
    }

    if json {
        let output = serde_json::json!({
            "events": events_to_json(&result.events),
            "summary": summary_to_json(&result.summary),
            "key_offset": key_offset_to_json(&result.key_offset),
            "elapsed_s": elapsed,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_compare_report(&result.summary, &result.key_offset, &result.events, elapsed);
    }

    Ok(())
}

fn cmd_lyrics(ref_path: String, lyrics_path: String, out_dir: Option<String>, json: bool) -> anyhow::Result<()> {
    let t0 = Instant::now();

    let ref_track = pitch_track_from_json(&fs::read_to_string(&ref_path)?)?;
    let content = fs::read_to_string(&lyrics_path)?;
    let ext = Path::new(&lyrics_path).extension().and_then(|e| e.to_str());

    let source = match detect_format(ext, &content) {
        "lrc" => LyricSource::Lrc(content),
        "srt" => LyricSource::Srt(content),
        _ => LyricSource::Plain(content),
    };

    let config = LyricConfig::default();
    let lines = align_lyrics(&ref_track, source, &config)?;
    let elapsed = t0.elapsed().as_secs_f64();

    if let Some(dir) = &out_dir {
        fs::create_dir_all(dir)?;
        fs::write(Path::new(dir).join("lyrics.json"), serde_json::to_string_pretty(&lines)?)?;
        fs::write(Path::new(dir).join("lyrics.lrc"), write_lrc(&lines))?;
        fs::write(Path::new(dir).join("lyrics.srt"), write_srt(&lines))?;
        fs::write(
            Path::new(dir).join("lyrics_overlay.json"),
            serde_json::to_string_pretty(&write_overlay_json(&lines))?,
        )?;
        if !json {
            eprintln!("Lyric artifacts written to {}", dir);
        }
    }

    if json {
        let output = serde_json::json!({ "lines": lines, "elapsed_s": elapsed });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        eprintln!("Aligned {} lyric line(s) in {:.2}s:", lines.len(), elapsed);
        for line in &lines {
            println!("  [{:>6.2} - {:>6.2}] {}", line.start, line.end, line.text);
        }
    }

    Ok(())
}

fn cmd_info(files: Vec<String>, json: bool) -> anyhow::Result<()> {
    let mut infos = Vec::new();

    for file in &files {
        match audio_io::load_mono_pcm(file, 44100) {
            Ok(pcm) => {
                let seconds = pcm.len() as f64 / 44100.0;
                infos.push(serde_json::json!({
                    "file": file,
                    "duration_s": seconds,
                    "sample_rate": 44100,
                }));
            }
            Err(e) => {
                infos.push(serde_json::json!({ "file": file, "error": e.to_string() }));
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
    } else {
        for info in &infos {
            if let Some(err) = info.get("error") {
                println!("{}: ERROR: {}", info["file"], err);
            } else {
                println!(
                    "{}: {:.2}s @ {} Hz",
                    info["file"],
                    info["duration_s"].as_f64().unwrap_or(0.0),
                    info["sample_rate"]
                );
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
//  Reporting
// ---------------------------------------------------------------------------

fn print_compare_report(summary: &Summary, key_offset: &KeyOffset, events: &[Event], elapsed: f64) {
    println!("=== VocalCoach Comparison Report ===");
    println!("Frames analyzed:    {}", summary.frames);
    println!("Duration:           {:.2}s", summary.seconds);
    println!("Verdict:            {:?}", summary.verdict);
    println!("  {}", summary.reason);
    for tip in summary.tips {
        println!("  - {}", tip);
    }
    if let Some(mean) = summary.mean_cents {
        println!("Mean error:         {:.1} cents", mean);
    }
    if let Some(std) = summary.std_cents {
        println!("Std dev:            {:.1} cents", std);
    }
    println!("Within tolerance:   {:.1}%", summary.percent_within_tol * 100.0);
    println!("Events detected:    {}", events.len());
    if let Some(verdict) = key_offset.verdict {
        println!("Key/octave offset:  {:?} (median {:.1} cents)", verdict, key_offset.median_cents.unwrap_or(0.0));
    }
    println!("Elapsed:            {:.2}s", elapsed);
}
