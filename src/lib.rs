//! ampkernel — a guitar-amp distortion core built on Wave Digital Filters.
//!
//! Two WDF ladder circuits bracket an oversampled tanh waveshaper, modeling
//! the input conditioning, saturation, and tone/volume stages of a
//! high-gain amp channel.
//!
//! # Modules
//!
//! - [`components`] — WDF one-port leaves (R, L, C, diode, fused pairs)
//! - [`adaptors`] — three-port series/parallel adaptors and the ladder arena
//! - [`circuits`] — the fixed pre-gain and post-gain circuit topologies
//! - [`oversampling`] — 4× half-band FIR oversampler for the nonlinearity
//! - [`waveshaper`] — gain-staged tanh saturation stage
//! - [`pipeline`] — per-channel strip and the multichannel engine
//! - [`wav`] — WAV file I/O for offline rendering and testing

pub mod adaptors;
pub mod circuits;
pub mod components;
pub mod oversampling;
pub mod pipeline;
pub mod wav;
pub mod waveshaper;

pub use pipeline::{ChannelStrip, DistortionEngine};

/// Per-sample audio processor trait.
///
/// Implemented by the WDF circuits so they compose with the WAV render
/// helpers and benches. Block-oriented stages (waveshaper, engine) expose
/// their own block APIs instead.
pub trait SignalProcessor {
    /// Process a single sample.
    fn process(&mut self, input: f64) -> f64;

    /// Set sample rate (call before processing).
    fn set_sample_rate(&mut self, sample_rate: f64);

    /// Reset all internal state.
    fn reset(&mut self);
}

/// Errors from the offline (non-realtime) surface: file I/O and CLI
/// parameter parsing. The audio path itself never errors — degenerate
/// values are clamped at parameter-set time.
#[derive(Debug, thiserror::Error)]
pub enum AmpError {
    #[error("WAV I/O error: {0}")]
    Wav(#[from] hound::Error),

    #[error("unsupported WAV layout: {0}")]
    UnsupportedWav(String),

    #[error("invalid knob setting `{input}`: {reason}")]
    InvalidKnob { input: String, reason: String },
}

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::{PostGainCircuit, PreGainCircuit};

    #[test]
    fn full_channel_distorts_a_pluck() {
        let fs = 48_000;
        let input = wav::guitar_pluck(82.41, 0.5, fs);

        let mut engine = DistortionEngine::new(1);
        engine.prepare(fs as f64, 512);
        engine.set_gain(36.0);

        let mut out = input.clone();
        for chunk in out.chunks_mut(512) {
            engine.process_block(0, chunk);
        }

        let peak_in = input.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        let peak_out = out.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        assert!(peak_out > 1e-4, "engine should produce signal: {peak_out}");
        assert!(
            peak_out < peak_in * 5.0,
            "output shouldn't blow up: in {peak_in}, out {peak_out}"
        );
    }

    #[test]
    fn circuits_compose_through_the_trait() {
        fn run(p: &mut dyn SignalProcessor, n: usize) -> f64 {
            p.set_sample_rate(48_000.0);
            p.reset();
            let mut last = 0.0;
            for i in 0..n {
                last = p.process((i as f64 * 0.05).sin() * 0.2);
            }
            last
        }

        let mut pre = PreGainCircuit::new();
        let mut post = PostGainCircuit::new();
        assert!(run(&mut pre, 256).is_finite());
        assert!(run(&mut post, 256).is_finite());
    }

    #[test]
    fn engine_handles_odd_block_sizes() {
        let mut engine = DistortionEngine::new(1);
        engine.prepare(44_100.0, 512);

        // Anything up to the prepared maximum is fair game.
        for len in [1usize, 7, 64, 100, 511, 512] {
            let mut block = vec![0.25; len];
            engine.process_block(0, &mut block);
            assert!(
                block.iter().all(|y| y.is_finite()),
                "block of {len} produced non-finite output"
            );
        }
    }
}
