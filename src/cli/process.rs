use ampkernel::waveshaper::{MAX_GAIN_DB, MIN_GAIN_DB};
use ampkernel::{wav, AmpError, DistortionEngine};
use std::path::Path;
use std::process;

/// Block size used for offline rendering.
const BLOCK: usize = 512;

/// Resolved knob settings for a render run.
struct Knobs {
    gain_db: f64,
    tone: f64,
    volume: f64,
}

impl Default for Knobs {
    fn default() -> Self {
        Self {
            gain_db: 24.0,
            tone: ampkernel::circuits::PostGainCircuit::DEFAULT_TONE,
            volume: ampkernel::circuits::PostGainCircuit::DEFAULT_VOLUME,
        }
    }
}

/// Parse `name=value` overrides. Unknown names and malformed values are
/// hard errors — silently ignoring a typo on a render is worse.
fn parse_knobs(args: &[String]) -> Result<Knobs, AmpError> {
    let mut knobs = Knobs::default();
    for arg in args {
        let (name, value) = arg.split_once('=').ok_or_else(|| AmpError::InvalidKnob {
            input: arg.clone(),
            reason: "expected name=value".into(),
        })?;
        let value: f64 = value.parse().map_err(|_| AmpError::InvalidKnob {
            input: arg.clone(),
            reason: "value is not a number".into(),
        })?;
        match name.to_ascii_lowercase().as_str() {
            "gain" => knobs.gain_db = value,
            "tone" => knobs.tone = value,
            "volume" => knobs.volume = value,
            _ => {
                return Err(AmpError::InvalidKnob {
                    input: arg.clone(),
                    reason: "known knobs: gain, tone, volume".into(),
                })
            }
        }
    }
    Ok(knobs)
}

pub fn run(input_path: &str, output_path: &str, knob_args: &[String]) {
    let knobs = parse_knobs(knob_args).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    let (mut channels, sample_rate) =
        wav::read_wav(Path::new(input_path)).unwrap_or_else(|e| {
            eprintln!("Error reading {input_path}: {e}");
            process::exit(1);
        });
    let frames = channels.first().map(|c| c.len()).unwrap_or(0);
    eprintln!(
        "Input:  {} ({} frames, {} ch, {} Hz)",
        input_path,
        frames,
        channels.len(),
        sample_rate,
    );

    let mut engine = DistortionEngine::new(channels.len());
    engine.prepare(sample_rate as f64, BLOCK);
    engine.set_gain(knobs.gain_db);
    engine.set_tone(knobs.tone);
    engine.set_volume(knobs.volume);

    for (ch, buffer) in channels.iter_mut().enumerate() {
        for chunk in buffer.chunks_mut(BLOCK) {
            engine.process_block(ch, chunk);
        }
    }

    wav::write_wav(&channels, Path::new(output_path), sample_rate).unwrap_or_else(|e| {
        eprintln!("Error writing {output_path}: {e}");
        process::exit(1);
    });

    eprintln!(
        "  gain:   {:.1} dB (range {MIN_GAIN_DB}..{MAX_GAIN_DB})",
        knobs.gain_db
    );
    eprintln!("  tone:   {:.0} ohm", knobs.tone);
    eprintln!("  volume: {:.0} ohm", knobs.volume);
    eprintln!("Output: {output_path} ({frames} frames)");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
