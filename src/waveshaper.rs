//! Oversampled tanh waveshaper — the distortion stage itself.
//!
//! Gain staging per block, with everything nonlinear inside the 4×
//! oversampled domain:
//! 1. fixed pre-gain +30 dB
//! 2. `y = tanh(10^(gain_db/20) · x)`
//! 3. ×0.7 scale
//! 4. fixed post-gain −20 dB back at the base rate
//!
//! The drive knob only scales the tanh argument, so at low settings the
//! stage is nearly linear and at high settings it squares the wave off.

use crate::oversampling::Oversampler;

/// Fixed input boost ahead of the nonlinearity, +30 dB.
const PRE_GAIN: f64 = 31.622776601683793;

/// Fixed make-up attenuation after decimation, −20 dB.
const POST_GAIN: f64 = 0.1;

/// Post-tanh scale keeping the saturated level out of the rails.
const SHAPE_SCALE: f64 = 0.7;

/// Drive range in dB, matching the amp's front-panel knob.
pub const MIN_GAIN_DB: f64 = 0.0;
pub const MAX_GAIN_DB: f64 = 48.0;

#[derive(Debug, Clone)]
pub struct Waveshaper {
    gain_db: f64,
    /// Cached `10^(gain_db/20)`.
    drive: f64,
    oversampler: Oversampler,
}

impl Waveshaper {
    pub fn new() -> Self {
        Self::with_gain(MIN_GAIN_DB)
    }

    pub fn with_gain(gain_db: f64) -> Self {
        let gain_db = gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB);
        Self {
            gain_db,
            drive: 10f64.powf(gain_db / 20.0),
            oversampler: Oversampler::new(),
        }
    }

    /// Size the oversampler scratch for blocks up to `max_block` samples.
    pub fn prepare(&mut self, max_block: usize) {
        self.oversampler.prepare(max_block);
    }

    /// Drive in dB, clamped to the knob range.
    pub fn set_gain(&mut self, gain_db: f64) {
        self.gain_db = gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB);
        self.drive = 10f64.powf(self.gain_db / 20.0);
    }

    pub fn gain(&self) -> f64 {
        self.gain_db
    }

    /// Shape a block in place.
    pub fn process_block(&mut self, block: &mut [f64]) {
        let drive = self.drive;
        self.oversampler
            .process_block(block, |x| (drive * (x * PRE_GAIN)).tanh() * SHAPE_SCALE);
        for x in block.iter_mut() {
            *x *= POST_GAIN;
        }
    }

    /// Clear the oversampler's FIR memory.
    pub fn reset(&mut self) {
        self.oversampler.reset();
    }
}

impl Default for Waveshaper {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
