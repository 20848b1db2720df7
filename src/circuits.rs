//! Fixed amp-channel circuit topologies built on the ladder arena.
//!
//! Two analog stages bracket the waveshaper:
//! - [`PreGainCircuit`] — input conditioning high-pass (fc ≈ 34 Hz) driven
//!   from a 100 Ω source into an open-circuit load.
//! - [`PostGainCircuit`] — coupling cap, series tone resistor, and a C‖R
//!   potential divider into a 100 Ω load; tone and volume are live knobs.

use crate::adaptors::{Adaptor, Ladder};
use crate::components::{Component, ComponentKind};
use crate::SignalProcessor;

/// Sample rate circuits assume until `set_sample_rate` is called.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Source impedance driving both circuits.
const SOURCE_RESISTANCE: f64 = 100.0;

// ---------------------------------------------------------------------------
// Pre-gain conditioning circuit
// ---------------------------------------------------------------------------

/// Series R (10 kΩ) into a series C (470 nF) terminated open.
///
/// Output is the terminated node's port-2 wave.  With the open terminal the
/// stage sits just below 2× gain with a gentle low-cut around 34 Hz.
#[derive(Debug, Clone)]
pub struct PreGainCircuit {
    ladder: Ladder,
    sample_rate: f64,
}

impl PreGainCircuit {
    pub fn new() -> Self {
        let mut ladder = Ladder::new(SOURCE_RESISTANCE);
        ladder.push(Adaptor::series_chain(Component::new(
            ComponentKind::Resistor,
            10_000.0,
            0.0,
        )));
        ladder.push(Adaptor::series_open(Component::new(
            ComponentKind::Capacitor,
            470e-9,
            0.0,
        )));
        let mut circuit = Self {
            ladder,
            sample_rate: DEFAULT_SAMPLE_RATE,
        };
        circuit.ladder.reset(circuit.sample_rate);
        circuit
    }

    /// Process one sample through the ladder.
    #[inline]
    pub fn process_sample(&mut self, x: f64) -> f64 {
        self.ladder.process_sample(x)
    }
}

impl Default for PreGainCircuit {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalProcessor for PreGainCircuit {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        self.process_sample(input)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        // Resistances track the new rate; wave registers survive.
        for i in 0..self.ladder.len() {
            self.ladder
                .node_mut(i)
                .component_mut()
                .set_sample_rate(sample_rate);
        }
        self.ladder.initialize();
    }

    fn reset(&mut self) {
        self.ladder.reset(self.sample_rate);
    }
}

// ---------------------------------------------------------------------------
// Post-gain tone/volume circuit
// ---------------------------------------------------------------------------

/// Node positions inside the post-gain ladder.
const NODE_TONE: usize = 1;
const NODE_VOLUME: usize = 3;

/// Coupling capacitor (1 µF), series tone resistor, 22 nF shunt, and a
/// volume resistor terminated into 100 Ω.
///
/// Tone and volume are resistances in ohms; both setters reinitialize the
/// scattering coefficients synchronously without flushing wave registers,
/// so a knob turn mid-stream cannot click.
#[derive(Debug, Clone)]
pub struct PostGainCircuit {
    ladder: Ladder,
    sample_rate: f64,
    tone: f64,
    volume: f64,
}

impl PostGainCircuit {
    pub const DEFAULT_TONE: f64 = 5000.0;
    pub const DEFAULT_VOLUME: f64 = 10_000.0;

    pub fn new() -> Self {
        Self::with_knobs(Self::DEFAULT_TONE, Self::DEFAULT_VOLUME)
    }

    pub fn with_knobs(tone: f64, volume: f64) -> Self {
        let mut ladder = Ladder::new(SOURCE_RESISTANCE);
        ladder.push(Adaptor::series_chain(Component::new(
            ComponentKind::Capacitor,
            1e-6,
            0.0,
        )));
        ladder.push(Adaptor::series_chain(Component::new(
            ComponentKind::Resistor,
            tone,
            0.0,
        )));
        ladder.push(Adaptor::parallel_chain(Component::new(
            ComponentKind::Capacitor,
            22e-9,
            0.0,
        )));
        ladder.push(Adaptor::parallel_terminated(
            Component::new(ComponentKind::Resistor, volume, 0.0),
            100.0,
        ));
        let mut circuit = Self {
            ladder,
            sample_rate: DEFAULT_SAMPLE_RATE,
            tone,
            volume,
        };
        circuit.ladder.reset(circuit.sample_rate);
        circuit
    }

    #[inline]
    pub fn process_sample(&mut self, x: f64) -> f64 {
        self.ladder.process_sample(x)
    }

    /// Series tone resistance in ohms.
    pub fn tone(&self) -> f64 {
        self.tone
    }

    /// Volume divider resistance in ohms.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Set the tone resistance and re-derive coefficients in place.
    pub fn set_tone(&mut self, ohms: f64) {
        self.tone = ohms;
        let fs = self.sample_rate;
        self.ladder
            .node_mut(NODE_TONE)
            .component_mut()
            .set_value(ohms, fs);
        self.ladder.initialize();
    }

    /// Set the volume resistance and re-derive coefficients in place.
    pub fn set_volume(&mut self, ohms: f64) {
        self.volume = ohms;
        let fs = self.sample_rate;
        self.ladder
            .node_mut(NODE_VOLUME)
            .component_mut()
            .set_value(ohms, fs);
        self.ladder.initialize();
    }
}

impl Default for PostGainCircuit {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalProcessor for PostGainCircuit {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        self.process_sample(input)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        for i in 0..self.ladder.len() {
            self.ladder
                .node_mut(i)
                .component_mut()
                .set_sample_rate(sample_rate);
        }
        self.ladder.initialize();
    }

    fn reset(&mut self) {
        self.ladder.reset(self.sample_rate);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
