//! Channel strips and the multichannel engine.
//!
//! One [`ChannelStrip`] is the full mono distortion path:
//! waveshaper → pre-gain circuit → post-gain circuit.
//! [`DistortionEngine`] owns one strip per channel; channels never share
//! state, so a stereo engine is just two independent mono paths with the
//! same knob settings.

use crate::circuits::{PostGainCircuit, PreGainCircuit};
use crate::waveshaper::Waveshaper;
use crate::SignalProcessor;

// ---------------------------------------------------------------------------
// Single-channel strip
// ---------------------------------------------------------------------------

/// The complete mono distortion path.
#[derive(Debug, Clone)]
pub struct ChannelStrip {
    waveshaper: Waveshaper,
    pre_gain: PreGainCircuit,
    post_gain: PostGainCircuit,
}

impl ChannelStrip {
    pub fn new() -> Self {
        Self {
            waveshaper: Waveshaper::new(),
            pre_gain: PreGainCircuit::new(),
            post_gain: PostGainCircuit::new(),
        }
    }

    /// Set sample rate, size scratch buffers, and flush all state.
    /// Call before processing; re-preparing between streams must not leak
    /// audio from the previous one, so wave registers and FIR memory are
    /// zeroed here. Knob settings survive.
    pub fn prepare(&mut self, sample_rate: f64, max_block: usize) {
        self.waveshaper.prepare(max_block);
        self.pre_gain.set_sample_rate(sample_rate);
        self.post_gain.set_sample_rate(sample_rate);
        self.reset();
    }

    /// Process a block in place: shape, then both WDF stages per sample.
    pub fn process_block(&mut self, block: &mut [f64]) {
        self.waveshaper.process_block(block);
        for x in block.iter_mut() {
            let shaped = self.pre_gain.process(*x);
            *x = self.post_gain.process(shaped);
        }
    }

    pub fn set_gain(&mut self, gain_db: f64) {
        self.waveshaper.set_gain(gain_db);
    }

    pub fn set_tone(&mut self, ohms: f64) {
        self.post_gain.set_tone(ohms);
    }

    pub fn set_volume(&mut self, ohms: f64) {
        self.post_gain.set_volume(ohms);
    }

    pub fn gain(&self) -> f64 {
        self.waveshaper.gain()
    }

    pub fn tone(&self) -> f64 {
        self.post_gain.tone()
    }

    pub fn volume(&self) -> f64 {
        self.post_gain.volume()
    }

    /// Flush all reactive and FIR state.
    pub fn reset(&mut self) {
        self.waveshaper.reset();
        self.pre_gain.reset();
        self.post_gain.reset();
    }
}

impl Default for ChannelStrip {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Multichannel engine
// ---------------------------------------------------------------------------

/// N independent channel strips sharing knob settings.
#[derive(Debug, Clone)]
pub struct DistortionEngine {
    channels: Vec<ChannelStrip>,
}

impl DistortionEngine {
    pub fn new(num_channels: usize) -> Self {
        Self {
            channels: vec![ChannelStrip::new(); num_channels],
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Prepare every channel for the given rate and block size.
    pub fn prepare(&mut self, sample_rate: f64, max_block: usize) {
        for ch in &mut self.channels {
            ch.prepare(sample_rate, max_block);
        }
    }

    /// Process one channel's block in place.
    ///
    /// # Panics
    /// Panics if `channel` is out of range.
    pub fn process_block(&mut self, channel: usize, block: &mut [f64]) {
        self.channels[channel].process_block(block);
    }

    /// Fan the drive knob out to every channel.
    pub fn set_gain(&mut self, gain_db: f64) {
        for ch in &mut self.channels {
            ch.set_gain(gain_db);
        }
    }

    /// Fan the tone knob out to every channel.
    pub fn set_tone(&mut self, ohms: f64) {
        for ch in &mut self.channels {
            ch.set_tone(ohms);
        }
    }

    /// Fan the volume knob out to every channel.
    pub fn set_volume(&mut self, ohms: f64) {
        for ch in &mut self.channels {
            ch.set_volume(ohms);
        }
    }

    /// Flush every channel's state.
    pub fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.reset();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(n: usize, amp: f64, freq: f64, fs: f64) -> Vec<f64> {
        (0..n)
            .map(|i| amp * (2.0 * std::f64::consts::PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn engine_is_bit_deterministic() {
        let input = sine(2048, 0.4, 330.0, 44100.0);

        let run = || -> Vec<f64> {
            let mut engine = DistortionEngine::new(1);
            engine.prepare(44100.0, 256);
            engine.set_gain(24.0);
            engine.set_tone(4000.0);
            engine.set_volume(8000.0);
            let mut out = input.clone();
            for chunk in out.chunks_mut(256) {
                engine.process_block(0, chunk);
            }
            out
        };

        assert_eq!(run(), run(), "same input and knobs must reproduce bit-for-bit");
    }

    #[test]
    fn channels_are_independent() {
        let mut engine = DistortionEngine::new(2);
        engine.prepare(44100.0, 512);
        engine.set_gain(30.0);

        // Hammer channel 0 with a loud signal, keep channel 1 silent.
        let mut loud = sine(512, 0.8, 220.0, 44100.0);
        let mut silent = vec![0.0; 512];
        engine.process_block(0, &mut loud);
        engine.process_block(1, &mut silent);

        for (i, y) in silent.iter().enumerate() {
            assert!(
                y.abs() < 1e-12,
                "channel 1 leaked energy from channel 0 at sample {i}: {y}"
            );
        }
    }

    #[test]
    fn strip_produces_bounded_output() {
        let mut strip = ChannelStrip::new();
        strip.prepare(48000.0, 1024);
        strip.set_gain(48.0);

        let mut block = sine(1024, 1.0, 440.0, 48000.0);
        strip.process_block(&mut block);
        for (i, y) in block.iter().enumerate() {
            assert!(y.is_finite(), "sample {i} not finite: {y}");
            assert!(y.abs() < 1.0, "sample {i} unreasonably hot: {y}");
        }
    }

    #[test]
    fn reset_restores_initial_state() {
        let input = sine(1024, 0.3, 441.0, 44100.0);

        let mut strip = ChannelStrip::new();
        strip.prepare(44100.0, 1024);
        strip.set_gain(18.0);

        let mut first = input.clone();
        strip.process_block(&mut first);
        strip.reset();
        let mut second = input.clone();
        strip.process_block(&mut second);

        assert_eq!(first, second, "reset must flush all reactive state");
    }

    #[test]
    fn prepare_flushes_previous_stream_state() {
        let input = sine(512, 0.4, 441.0, 44100.0);

        // Run a stream, then re-prepare for a new one.
        let mut reused = ChannelStrip::new();
        reused.prepare(44100.0, 512);
        reused.set_gain(24.0);
        let mut warmup = input.clone();
        reused.process_block(&mut warmup);
        reused.prepare(44100.0, 512);

        let mut fresh = ChannelStrip::new();
        fresh.prepare(44100.0, 512);
        fresh.set_gain(24.0);

        let mut a = input.clone();
        let mut b = input.clone();
        reused.process_block(&mut a);
        fresh.process_block(&mut b);
        assert_eq!(a, b, "re-prepared strip must match a fresh one bit-for-bit");
    }

    #[test]
    fn knobs_fan_out_to_all_channels() {
        let mut engine = DistortionEngine::new(2);
        engine.prepare(44100.0, 256);
        engine.set_tone(3000.0);
        engine.set_volume(6000.0);
        engine.set_gain(12.0);

        let input = sine(256, 0.4, 441.0, 44100.0);
        let mut left = input.clone();
        let mut right = input.clone();
        engine.process_block(0, &mut left);
        engine.process_block(1, &mut right);
        assert_eq!(left, right, "identical knobs and input must match across channels");
    }
}
