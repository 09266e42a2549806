//! Audio decoding at the CLI boundary: compressed containers and WAV files
//! become mono `f32` PCM at a known sample rate. The core crate never sees
//! compressed bytes — this module is the "external collaborator" the core's
//! contract assumes is already done.

use anyhow::{anyhow, Context, Result};
use rubato::{FftFixedIn, Resampler};
use std::path::Path;

/// Decode `path` (any container symphonia understands, or WAV) to mono
/// `f32` PCM, resampled to `target_sr` if it differs from the file's own
/// sample rate.
pub fn load_mono_pcm(path: &str, target_sr: u32) -> Result<Vec<f32>> {
    let (samples, sr, channels) = if Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
    {
        load_wav_file(path)?
    } else {
        load_audio_symphonia(path)?
    };

    let mono = to_mono(&samples, channels);
    if sr == target_sr {
        Ok(mono)
    } else {
        resample_mono(&mono, sr, target_sr)
    }
}

fn load_audio_symphonia(path: &str) -> Result<(Vec<f32>, u32, u32)> {
    use symphonia::core::audio::Signal;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = std::fs::File::open(path).with_context(|| format!("cannot open file: {path}"))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("cannot probe format: {path}"))?;

    let mut format = probed.format;
    let track = format.default_track().ok_or_else(|| anyhow!("no audio track in {path}"))?;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params.sample_rate.unwrap_or(48000);
    let channels = codec_params.channels.map(|c| c.count() as u32).unwrap_or(2);
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .with_context(|| format!("cannot create decoder for {path}"))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() != track_id {
                    continue;
                }
                match decoder.decode(&packet) {
                    Ok(buf) => {
                        let ch = buf.spec().channels.count();
                        let frames = buf.frames();
                        match buf {
                            symphonia::core::audio::AudioBufferRef::F32(ref b) => {
                                for frame in 0..frames {
                                    for c in 0..ch {
                                        all_samples.push(b.chan(c)[frame]);
                                    }
                                }
                            }
                            symphonia::core::audio::AudioBufferRef::S32(ref b) => {
                                let scale = 1.0 / i32::MAX as f32;
                                for frame in 0..frames {
                                    for c in 0..ch {
                                        all_samples.push(b.chan(c)[frame] as f32 * scale);
                                    }
                                }
                            }
                            symphonia::core::audio::AudioBufferRef::S16(ref b) => {
                                let scale = 1.0 / i16::MAX as f32;
                                for frame in 0..frames {
                                    for c in 0..ch {
                                        all_samples.push(b.chan(c)[frame] as f32 * scale);
                                    }
                                }
                            }
                            symphonia::core::audio::AudioBufferRef::U8(ref b) => {
                                for frame in 0..frames {
                                    for c in 0..ch {
                                        all_samples.push((b.chan(c)[frame] as f32 - 128.0) / 128.0);
                                    }
                                }
                            }
                            _ => {
                                log::debug!("unsupported sample format in {path}, skipping packet");
                            }
                        }
                    }
                    Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                        log::debug!("decode error (skipping): {msg}");
                        continue;
                    }
                    Err(e) => return Err(anyhow!("decode error in {path}: {e}")),
                }
            }
            Err(symphonia::core::errors::Error::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                log::debug!("format read ended: {e}");
                break;
            }
        }
    }

    Ok((all_samples, sample_rate, channels))
}

fn load_wav_file(path: &str) -> Result<(Vec<f32>, u32, u32)> {
    let reader = hound::WavReader::open(path).with_context(|| format!("cannot open WAV: {path}"))?;
    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels as u32;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.into_samples::<f32>().filter_map(|s| s.ok()).collect(),
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            let max_val = (1u32 << (bits - 1)) as f32;
            reader.into_samples::<i32>().filter_map(|s| s.ok()).map(|s| s as f32 / max_val).collect()
        }
    };

    Ok((samples, sample_rate, channels))
}

fn to_mono(samples: &[f32], channels: u32) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let ch = channels as usize;
    let frames = samples.len() / ch;
    let mut mono = Vec::with_capacity(frames);
    for i in 0..frames {
        let sum: f32 = (0..ch).map(|c| samples[i * ch + c]).sum();
        mono.push(sum / ch as f32);
    }
    mono
}

fn resample_mono(data: &[f32], source_sr: u32, target_sr: u32) -> Result<Vec<f32>> {
    if source_sr == target_sr || data.is_empty() {
        return Ok(data.to_vec());
    }

    let ratio = target_sr as f64 / source_sr as f64;
    let chunk_size = 1024;

    let mut resampler = FftFixedIn::<f32>::new(source_sr as usize, target_sr as usize, chunk_size, 2, 1)
        .context("failed to create resampler")?;

    let mut output = Vec::with_capacity((data.len() as f64 * ratio * 1.1) as usize);
    let mut pos = 0;

    while pos < data.len() {
        let end = (pos + chunk_size).min(data.len());
        let mut chunk = data[pos..end].to_vec();
        if chunk.len() < chunk_size {
            chunk.resize(chunk_size, 0.0);
        }
        let input = vec![chunk];
        let resampled = resampler.process(&input, None)?;
        output.extend_from_slice(&resampled[0]);
        pos += chunk_size;
    }

    let expected_len = (data.len() as f64 * ratio).round() as usize;
    output.truncate(expected_len);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_mono_averages_channels() {
        let stereo = vec![1.0, 3.0, 2.0, 4.0];
        let mono = to_mono(&stereo, 2);
        assert_eq!(mono, vec![2.0, 3.0]);
    }

    #[test]
    fn to_mono_passthrough_for_mono_input() {
        let data = vec![1.0, 2.0, 3.0];
        assert_eq!(to_mono(&data, 1), data);
    }

    #[test]
    fn resample_identity_when_rates_match() {
        let data = vec![1.0, 2.0, 3.0];
        let out = resample_mono(&data, 44100, 44100).unwrap();
        assert_eq!(out, data);
    }
}
