//! 4× oversampling for the waveshaper's nonlinear stage.
//!
//! Saturation generates harmonics that fold back below Nyquist at base
//! sample rates, producing inharmonic aliasing. This module runs the
//! nonlinearity at 4× the base rate:
//! 1. Upsample ×2 twice (zero-stuff, half-band filter, ×2 gain)
//! 2. Apply the nonlinear function per oversampled sample
//! 3. Filter and decimate ×2 twice back to the base rate
//!
//! Each 2× stage uses a 31-tap Kaiser windowed-sinc half-band FIR
//! (≥ 60 dB stopband, linear phase). The cascade delays the signal by
//! 22.5 base-rate samples. Filter state persists across blocks; `reset`
//! clears it. No allocation after `prepare`.

/// Taps per half-band stage. Odd so the filter has an integer group delay
/// and a true center tap.
const TAPS: usize = 31;

/// Kaiser beta for a ≥ 60 dB stopband: 0.1102 · (60 − 8.7).
const KAISER_BETA: f64 = 5.65326;

/// Zeroth-order modified Bessel function of the first kind, by power
/// series. Converges in well under 30 terms for the argument range the
/// Kaiser window uses.
fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..=30 {
        term *= (half / k as f64) * (half / k as f64);
        sum += term;
        if term < sum * 1e-18 {
            break;
        }
    }
    sum
}

/// 31-tap half-band interpolation/decimation prototype: windowed sinc with
/// cutoff at a quarter of the (oversampled) rate, normalized to unity DC
/// gain so the cascade is exactly DC-transparent.
fn half_band_taps() -> [f64; TAPS] {
    let center = (TAPS - 1) as f64 / 2.0;
    let denom = bessel_i0(KAISER_BETA);
    let mut taps = [0.0; TAPS];
    for (n, tap) in taps.iter_mut().enumerate() {
        let t = n as f64 - center;
        let sinc = if t == 0.0 {
            0.5
        } else {
            (std::f64::consts::FRAC_PI_2 * t).sin() / (std::f64::consts::PI * t)
        };
        let r = t / center;
        let window = bessel_i0(KAISER_BETA * (1.0 - r * r).max(0.0).sqrt()) / denom;
        *tap = sinc * window;
    }
    let sum: f64 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= sum;
    }
    taps
}

/// FIR delay line for one direction of one half-band stage.
#[derive(Debug, Clone)]
struct FirState {
    delay: [f64; TAPS],
}

impl FirState {
    fn new() -> Self {
        Self { delay: [0.0; TAPS] }
    }

    #[inline]
    fn push(&mut self, x: f64, taps: &[f64; TAPS]) -> f64 {
        self.delay.copy_within(0..TAPS - 1, 1);
        self.delay[0] = x;
        let mut acc = 0.0;
        for (d, t) in self.delay.iter().zip(taps.iter()) {
            acc += d * t;
        }
        acc
    }

    fn reset(&mut self) {
        self.delay = [0.0; TAPS];
    }
}

/// Fixed 4× oversampler wrapping a nonlinear per-sample function.
///
/// Usage:
/// ```ignore
/// let mut os = Oversampler::new();
/// os.prepare(block_len);
/// os.process_block(&mut block, |x| x.tanh());
/// ```
#[derive(Debug, Clone)]
pub struct Oversampler {
    taps: [f64; TAPS],
    up1: FirState,
    up2: FirState,
    down2: FirState,
    down1: FirState,
    /// 2× intermediate rate scratch.
    mid: Vec<f64>,
    /// 4× rate scratch.
    high: Vec<f64>,
}

/// Oversampling ratio of the nonlinear stage.
pub const OVERSAMPLE_RATIO: usize = 4;

impl Oversampler {
    pub fn new() -> Self {
        Self {
            taps: half_band_taps(),
            up1: FirState::new(),
            up2: FirState::new(),
            down2: FirState::new(),
            down1: FirState::new(),
            mid: Vec::new(),
            high: Vec::new(),
        }
    }

    /// Size the scratch buffers for blocks up to `max_block` samples.
    pub fn prepare(&mut self, max_block: usize) {
        self.mid.resize(max_block * 2, 0.0);
        self.high.resize(max_block * OVERSAMPLE_RATIO, 0.0);
    }

    /// Run `f` over the block at 4× the base rate, in place.
    ///
    /// Panics in debug builds if the block exceeds the prepared size.
    pub fn process_block<F>(&mut self, block: &mut [f64], mut f: F)
    where
        F: FnMut(f64) -> f64,
    {
        let n = block.len();
        debug_assert!(n * 2 <= self.mid.len(), "block exceeds prepared size");

        // Upsample ×2 twice. The ×2 gain restores the energy lost to
        // zero-stuffing.
        for (i, &x) in block.iter().enumerate() {
            self.mid[2 * i] = 2.0 * self.up1.push(x, &self.taps);
            self.mid[2 * i + 1] = 2.0 * self.up1.push(0.0, &self.taps);
        }
        for i in 0..2 * n {
            let x = self.mid[i];
            self.high[2 * i] = 2.0 * self.up2.push(x, &self.taps);
            self.high[2 * i + 1] = 2.0 * self.up2.push(0.0, &self.taps);
        }

        // Nonlinearity at 4× rate.
        for x in &mut self.high[..4 * n] {
            *x = f(*x);
        }

        // Decimate ×2 twice: filter every sample, keep every other.
        for i in 0..2 * n {
            let kept = self.down2.push(self.high[2 * i], &self.taps);
            self.down2.push(self.high[2 * i + 1], &self.taps);
            self.mid[i] = kept;
        }
        for (i, out) in block.iter_mut().enumerate() {
            let kept = self.down1.push(self.mid[2 * i], &self.taps);
            self.down1.push(self.mid[2 * i + 1], &self.taps);
            *out = kept;
        }
    }

    /// Clear all FIR delay lines.
    pub fn reset(&mut self) {
        self.up1.reset();
        self.up2.reset();
        self.down2.reset();
        self.down1.reset();
    }
}

impl Default for Oversampler {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
