//! WAV file I/O for testing and offline rendering.
//!
//! Uses `hound` to read input material and write processed audio, so the
//! engine can be auditioned without a host. Output is always 32-bit float.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

use crate::{AmpError, SignalProcessor};

/// Default render rate when no input file dictates one.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

fn wav_spec(channels: u16, sample_rate: u32) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Generate a sine wave test signal.
pub fn sine_wave(freq_hz: f64, duration_secs: f64, sample_rate: u32) -> Vec<f64> {
    let n = (duration_secs * sample_rate as f64) as usize;
    let mut buf = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64 / sample_rate as f64;
        buf.push(0.5 * (2.0 * std::f64::consts::PI * freq_hz * t).sin());
    }
    buf
}

/// Generate a guitar-like test signal (sum of harmonics with decay).
pub fn guitar_pluck(freq_hz: f64, duration_secs: f64, sample_rate: u32) -> Vec<f64> {
    let n = (duration_secs * sample_rate as f64) as usize;
    let mut buf = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64 / sample_rate as f64;
        let envelope = (-3.0 * t).exp();
        let fundamental = (2.0 * std::f64::consts::PI * freq_hz * t).sin();
        let h2 = 0.5 * (2.0 * std::f64::consts::PI * 2.0 * freq_hz * t).sin();
        let h3 = 0.25 * (2.0 * std::f64::consts::PI * 3.0 * freq_hz * t).sin();
        let h4 = 0.125 * (2.0 * std::f64::consts::PI * 4.0 * freq_hz * t).sin();
        buf.push(0.4 * envelope * (fundamental + h2 + h3 + h4));
    }
    buf
}

/// Read a WAV file into per-channel f64 buffers.
///
/// Accepts 32-bit float and 16/24/32-bit integer PCM; integer samples are
/// normalized to ±1.0.
pub fn read_wav(path: &Path) -> Result<(Vec<Vec<f64>>, u32), AmpError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_channels = spec.channels as usize;
    if num_channels == 0 {
        return Err(AmpError::UnsupportedWav("zero channels".into()));
    }

    let interleaved: Vec<f64> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ (16 | 24 | 32)) => {
            let scale = (1i64 << (bits - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => {
            return Err(AmpError::UnsupportedWav(format!(
                "{bits}-bit {format:?} samples"
            )))
        }
    };

    let mut channels = vec![Vec::with_capacity(interleaved.len() / num_channels); num_channels];
    for frame in interleaved.chunks_exact(num_channels) {
        for (ch, &sample) in channels.iter_mut().zip(frame.iter()) {
            ch.push(sample);
        }
    }
    Ok((channels, spec.sample_rate))
}

/// Write per-channel f64 buffers to a 32-bit float WAV file.
pub fn write_wav(channels: &[Vec<f64>], path: &Path, sample_rate: u32) -> Result<(), AmpError> {
    let num_channels = channels.len() as u16;
    let mut writer = WavWriter::create(path, wav_spec(num_channels, sample_rate))?;
    let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    for i in 0..frames {
        for ch in channels {
            writer.write_sample(ch[i] as f32)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Process a mono buffer through a per-sample processor and write the
/// result to a WAV file.
pub fn render_to_wav<P: SignalProcessor>(
    processor: &mut P,
    input: &[f64],
    path: &Path,
    sample_rate: u32,
) -> Result<(), AmpError> {
    processor.set_sample_rate(sample_rate as f64);
    processor.reset();

    let mut writer = WavWriter::create(path, wav_spec(1, sample_rate))?;
    for &sample in input {
        let out = processor.process(sample);
        writer.write_sample(out as f32)?;
    }
    writer.finalize()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
