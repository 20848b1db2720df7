//! Three-port adaptors and the ladder arena.
//!
//! A ladder is a source-to-terminal chain of three-port adaptors.  Port 1
//! faces the source, port 2 faces the next adaptor downstream, port 3 owns
//! the adaptor's [`Component`].  Each sample flows in two phases:
//! 1. **Downstream** — node 0..n−1 reads its component's reflected wave,
//!    forms the port-2 output and feeds it to the next node; the terminated
//!    node resolves the terminal load, producing y(n) and the first upstream
//!    wave.
//! 2. **Upstream** — walking back toward the source, each node corrects its
//!    component's incident wave and passes the port-1 output up.
//!
//! Component registers are only committed once the upstream correction has
//! arrived; committing during the downstream pass would shift every reactive
//! element one sample early.
//!
//! Zero allocation on the hot path — the arena is sized at assembly time and
//! nodes reference each other by position (node i's port 2 is node i+1).

use crate::components::Component;

/// Terminal resistance standing in for an open circuit.  Large enough that
/// the load draws nothing, finite so no coefficient divides by zero.
pub const OPEN_CIRCUIT_RESISTANCE: f64 = 1.0e34;

/// Smallest terminal resistance accepted by a terminated adaptor.
const MIN_TERMINAL_RESISTANCE: f64 = 1.0e-15;

// ---------------------------------------------------------------------------
// Adaptor node
// ---------------------------------------------------------------------------

/// Adaptor variant with its scattering coefficients.
///
/// Chain variants are reflection-free toward port 2 and carry a single
/// coefficient; terminated variants fold the terminal load into a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdaptorKind {
    /// Series junction, reflection-free: `B = R1/(R1+R3)`.
    SeriesChain { b: f64 },
    /// Series junction terminated into a load:
    /// `B1 = 2·R1/(R1+R3+Rt)`, `B3 = 2·Rt/(R1+R3+Rt)`.
    SeriesTerminated { b1: f64, b3: f64 },
    /// Parallel junction, reflection-free: `A = G1/(G1+G3)`.
    ParallelChain { a: f64 },
    /// Parallel junction terminated into a load:
    /// `A1 = 2·G1/(G1+G3+G2)`, `A3 = 2·G2/(G1+G3+G2)`.
    ParallelTerminated { a1: f64, a3: f64 },
}

/// One three-port adaptor node: variant, owned component, terminal load,
/// and the per-sample wave scratch.
#[derive(Debug, Clone)]
pub struct Adaptor {
    kind: AdaptorKind,
    component: Component,
    /// Terminal load for terminated variants; ignored by chain variants.
    terminal_resistance: f64,
    open_terminal: bool,
    /// R1 propagated from upstream during initialization.
    r1: f64,
    /// Downstream port resistance computed during initialization.
    r2: f64,
    // --- per-sample scratch
    in1: f64,
    n1: f64,
    n2: f64,
    out1: f64,
    out2: f64,
}

impl Adaptor {
    /// Reflection-free series adaptor owning `component`.
    pub fn series_chain(component: Component) -> Self {
        Self::with_kind(AdaptorKind::SeriesChain { b: 0.0 }, component)
    }

    /// Series adaptor terminated into `terminal_resistance` ohms.
    pub fn series_terminated(component: Component, terminal_resistance: f64) -> Self {
        let mut a = Self::with_kind(
            AdaptorKind::SeriesTerminated { b1: 0.0, b3: 0.0 },
            component,
        );
        a.terminal_resistance = terminal_resistance;
        a
    }

    /// Series adaptor terminated into an open circuit.
    pub fn series_open(component: Component) -> Self {
        let mut a = Self::with_kind(
            AdaptorKind::SeriesTerminated { b1: 0.0, b3: 0.0 },
            component,
        );
        a.terminal_resistance = OPEN_CIRCUIT_RESISTANCE;
        a.open_terminal = true;
        a
    }

    /// Reflection-free parallel adaptor owning `component`.
    pub fn parallel_chain(component: Component) -> Self {
        Self::with_kind(AdaptorKind::ParallelChain { a: 0.0 }, component)
    }

    /// Parallel adaptor terminated into `terminal_resistance` ohms.
    pub fn parallel_terminated(component: Component, terminal_resistance: f64) -> Self {
        let mut a = Self::with_kind(
            AdaptorKind::ParallelTerminated { a1: 0.0, a3: 0.0 },
            component,
        );
        a.terminal_resistance = terminal_resistance;
        a
    }

    /// Parallel adaptor terminated into an open circuit (A3 forced to zero).
    pub fn parallel_open(component: Component) -> Self {
        let mut a = Self::with_kind(
            AdaptorKind::ParallelTerminated { a1: 0.0, a3: 0.0 },
            component,
        );
        a.terminal_resistance = OPEN_CIRCUIT_RESISTANCE;
        a.open_terminal = true;
        a
    }

    fn with_kind(kind: AdaptorKind, component: Component) -> Self {
        Self {
            kind,
            component,
            terminal_resistance: 600.0,
            open_terminal: false,
            r1: 0.0,
            r2: 0.0,
            in1: 0.0,
            n1: 0.0,
            n2: 0.0,
            out1: 0.0,
            out2: 0.0,
        }
    }

    /// The owned component (port 3).
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// Mutable access for value changes; the ladder must be re-initialized
    /// before the next sample.
    pub fn component_mut(&mut self) -> &mut Component {
        &mut self.component
    }

    /// Last incident wave committed into the component register.
    pub fn component_incident(&self) -> f64 {
        self.n1
    }

    /// Last downstream output (`out2`); for the terminated node this is y(n).
    pub fn output2(&self) -> f64 {
        self.out2
    }

    /// Downstream port resistance (valid after initialization).
    pub fn r2(&self) -> f64 {
        self.r2
    }

    /// Compute scattering coefficients for the given upstream resistance and
    /// return the downstream port resistance.
    fn initialize(&mut self, r1: f64) -> f64 {
        self.r1 = r1;
        let r3 = self.component.resistance();
        let g3 = self.component.conductance();
        match &mut self.kind {
            AdaptorKind::SeriesChain { b } => {
                *b = r1 / (r1 + r3);
                self.r2 = r1 + r3;
            }
            AdaptorKind::SeriesTerminated { b1, b3 } => {
                let rt = self.terminal_resistance;
                *b1 = (2.0 * r1) / (r1 + r3 + rt);
                *b3 = (2.0 * rt) / (r1 + r3 + rt);
                self.r2 = r1 + r3;
            }
            AdaptorKind::ParallelChain { a } => {
                let g1 = 1.0 / r1;
                *a = g1 / (g1 + g3);
                self.r2 = 1.0 / (g1 + g3);
            }
            AdaptorKind::ParallelTerminated { a1, a3 } => {
                if self.terminal_resistance <= 0.0 {
                    self.terminal_resistance = MIN_TERMINAL_RESISTANCE;
                }
                let g1 = 1.0 / r1;
                let g2 = 1.0 / self.terminal_resistance;
                *a1 = 2.0 * g1 / (g1 + g3 + g2);
                *a3 = if self.open_terminal {
                    0.0
                } else {
                    2.0 * g2 / (g1 + g3 + g2)
                };
                self.r2 = 1.0 / (g1 + g3);
            }
        }
        self.r2
    }

    /// Downstream pass for chain nodes: accept the port-1 incident wave,
    /// return the port-2 output for the next node.
    #[inline]
    fn push_incident(&mut self, in1: f64) -> f64 {
        self.in1 = in1;
        self.n2 = self.component.reflected();
        self.out2 = match self.kind {
            AdaptorKind::SeriesChain { .. } => -(in1 + self.n2),
            AdaptorKind::ParallelChain { a } => self.n2 - a * (-in1 + self.n2),
            // Terminated nodes are driven through `terminate`.
            AdaptorKind::SeriesTerminated { .. } | AdaptorKind::ParallelTerminated { .. } => {
                debug_assert!(false, "terminated adaptor driven as chain node");
                0.0
            }
        };
        self.out2
    }

    /// Full resolution for the terminated node: returns `(y, out1)` where
    /// `y` is the circuit output and `out1` starts the upstream pass.
    /// Commits the component register.
    #[inline]
    fn terminate(&mut self, in1: f64) -> (f64, f64) {
        self.in1 = in1;
        self.n2 = self.component.reflected();
        match self.kind {
            AdaptorKind::SeriesTerminated { b1, b3 } => {
                let n3 = in1 + self.n2;
                self.out2 = -b3 * n3;
                self.out1 = in1 - b1 * n3;
                self.n1 = -(self.out1 + self.out2 + n3);
            }
            AdaptorKind::ParallelTerminated { a1, a3 } => {
                self.n1 = -a1 * (-in1 + self.n2) + self.n2 - a3 * self.n2;
                self.out1 = -in1 + self.n2 + self.n1;
                self.out2 = self.n2 + self.n1;
            }
            AdaptorKind::SeriesChain { .. } | AdaptorKind::ParallelChain { .. } => {
                debug_assert!(false, "chain adaptor driven as terminated node");
            }
        }
        self.component.set_incident(self.n1);
        (self.out2, self.out1)
    }

    /// Upstream pass for chain nodes: accept the port-2 reflected wave,
    /// commit the component register, return the port-1 output.
    #[inline]
    fn push_reflected(&mut self, in2: f64) -> f64 {
        match self.kind {
            AdaptorKind::SeriesChain { b } => {
                self.n1 = -(self.in1 - b * (self.in1 + self.n2 + in2) + in2);
                self.out1 = self.in1 - b * (self.n2 + in2);
            }
            AdaptorKind::ParallelChain { a } => {
                self.n1 = in2 - a * (-self.in1 + self.n2);
                self.out1 = -self.in1 + self.n2 + self.n1;
            }
            AdaptorKind::SeriesTerminated { .. } | AdaptorKind::ParallelTerminated { .. } => {
                debug_assert!(false, "terminated adaptor has no upstream pass");
            }
        }
        self.component.set_incident(self.n1);
        self.out1
    }

    /// Flush component registers and wave scratch at the given sample rate.
    fn reset(&mut self, fs: f64) {
        self.component.reset(fs);
        self.in1 = 0.0;
        self.n1 = 0.0;
        self.n2 = 0.0;
        self.out1 = 0.0;
        self.out2 = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Ladder arena
// ---------------------------------------------------------------------------

/// Source-to-terminal chain of adaptors, stored flat.
///
/// The last node must be a terminated variant; all nodes before it must be
/// chain variants.  `initialize` must run after assembly and after every
/// component value change before the next `process_sample`.
#[derive(Debug, Clone)]
pub struct Ladder {
    nodes: Vec<Adaptor>,
    source_resistance: f64,
    initialized: bool,
}

impl Ladder {
    /// Empty ladder driven from `source_resistance` ohms.
    pub fn new(source_resistance: f64) -> Self {
        Self {
            nodes: Vec::new(),
            source_resistance,
            initialized: false,
        }
    }

    /// Append an adaptor; returns its index.  Invalidates initialization.
    pub fn push(&mut self, adaptor: Adaptor) -> usize {
        self.initialized = false;
        self.nodes.push(adaptor);
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node accessor for parameter reads.
    pub fn node(&self, index: usize) -> &Adaptor {
        &self.nodes[index]
    }

    /// Mutable node accessor; invalidates initialization, the caller must
    /// re-run `initialize` before the next sample.
    pub fn node_mut(&mut self, index: usize) -> &mut Adaptor {
        self.initialized = false;
        &mut self.nodes[index]
    }

    /// Walk source-to-terminal propagating port resistances and computing
    /// every scattering coefficient.
    pub fn initialize(&mut self) {
        debug_assert!(
            matches!(
                self.nodes.last().map(|n| n.kind),
                Some(AdaptorKind::SeriesTerminated { .. })
                    | Some(AdaptorKind::ParallelTerminated { .. })
            ),
            "ladder must end in a terminated adaptor"
        );
        let mut r = self.source_resistance;
        for node in &mut self.nodes {
            r = node.initialize(r);
        }
        self.initialized = true;
    }

    /// Recompute component resistances at `fs`, flush all wave state, and
    /// re-derive coefficients.
    pub fn reset(&mut self, fs: f64) {
        for node in &mut self.nodes {
            node.reset(fs);
        }
        self.initialize();
    }

    /// Run one sample through the two-phase ladder protocol.
    #[inline]
    pub fn process_sample(&mut self, x: f64) -> f64 {
        assert!(!self.nodes.is_empty(), "ladder has no nodes");
        debug_assert!(self.initialized, "ladder processed before initialize");
        let last = self.nodes.len() - 1;

        // Downstream: source wave rides the chain to the terminated node.
        let mut wave = x;
        for node in &mut self.nodes[..last] {
            wave = node.push_incident(wave);
        }
        let (y, mut back) = self.nodes[last].terminate(wave);

        // Upstream: the terminal reflection corrects every component register.
        for node in self.nodes[..last].iter_mut().rev() {
            back = node.push_reflected(back);
        }
        y
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentKind;
    use approx::assert_relative_eq;

    const FS: f64 = 44100.0;

    fn resistor(ohms: f64) -> Component {
        Component::new(ComponentKind::Resistor, ohms, 0.0)
    }

    fn capacitor(farads: f64) -> Component {
        Component::new(ComponentKind::Capacitor, farads, 0.0)
    }

    #[test]
    fn series_chain_coefficients() {
        let mut ladder = Ladder::new(100.0);
        ladder.push(Adaptor::series_chain(resistor(10_000.0)));
        ladder.push(Adaptor::series_open(capacitor(470e-9)));
        ladder.reset(FS);

        match ladder.node(0).kind {
            AdaptorKind::SeriesChain { b } => {
                assert_relative_eq!(b, 100.0 / 10_100.0, max_relative = 1e-12);
            }
            other => panic!("expected series chain, got {other:?}"),
        }
        assert_relative_eq!(ladder.node(0).r2(), 10_100.0, max_relative = 1e-12);
    }

    #[test]
    fn series_terminated_coefficients() {
        let mut ladder = Ladder::new(100.0);
        ladder.push(Adaptor::series_chain(resistor(1000.0)));
        ladder.push(Adaptor::series_terminated(resistor(2000.0), 600.0));
        ladder.reset(FS);

        // R1 into the terminated node is the chain node's R2 = 1100.
        let r1 = 1100.0;
        match ladder.node(1).kind {
            AdaptorKind::SeriesTerminated { b1, b3 } => {
                assert_relative_eq!(b1, 2.0 * r1 / (r1 + 2000.0 + 600.0), max_relative = 1e-12);
                assert_relative_eq!(b3, 2.0 * 600.0 / (r1 + 2000.0 + 600.0), max_relative = 1e-12);
            }
            other => panic!("expected series terminated, got {other:?}"),
        }
    }

    #[test]
    fn parallel_chain_coefficients() {
        let mut ladder = Ladder::new(100.0);
        ladder.push(Adaptor::parallel_chain(resistor(300.0)));
        ladder.push(Adaptor::parallel_terminated(resistor(1000.0), 100.0));
        ladder.reset(FS);

        let g1 = 1.0 / 100.0;
        let g3 = 1.0 / 300.0;
        match ladder.node(0).kind {
            AdaptorKind::ParallelChain { a } => {
                assert_relative_eq!(a, g1 / (g1 + g3), max_relative = 1e-12);
            }
            other => panic!("expected parallel chain, got {other:?}"),
        }
        assert_relative_eq!(ladder.node(0).r2(), 1.0 / (g1 + g3), max_relative = 1e-12);
    }

    #[test]
    fn open_parallel_terminal_suppresses_a3() {
        let mut ladder = Ladder::new(100.0);
        ladder.push(Adaptor::parallel_open(resistor(1000.0)));
        ladder.reset(FS);

        match ladder.node(0).kind {
            AdaptorKind::ParallelTerminated { a3, .. } => {
                assert_eq!(a3, 0.0, "open terminal must contribute no load wave");
            }
            other => panic!("expected parallel terminated, got {other:?}"),
        }
    }

    #[test]
    fn nonpositive_terminal_resistance_clamped() {
        let mut ladder = Ladder::new(100.0);
        ladder.push(Adaptor::parallel_terminated(resistor(1000.0), -5.0));
        ladder.reset(FS);

        match ladder.node(0).kind {
            AdaptorKind::ParallelTerminated { a1, a3 } => {
                assert!(a1.is_finite(), "A1 must be finite, got {a1}");
                assert!(a3.is_finite(), "A3 must be finite, got {a3}");
            }
            other => panic!("expected parallel terminated, got {other:?}"),
        }
    }

    #[test]
    fn matched_resistive_divider_halves_source_wave() {
        // Source R driving a matched series resistor into a 2R load: the
        // resistor's committed incident wave magnitude is half the input.
        let r = 1000.0;
        let mut ladder = Ladder::new(r);
        ladder.push(Adaptor::series_chain(resistor(r)));
        ladder.push(Adaptor::series_terminated(
            Component::new(ComponentKind::Resistor, 1e-9, 0.0),
            2.0 * r,
        ));
        ladder.reset(FS);

        let x = 0.8;
        ladder.process_sample(x);
        let n1 = ladder.node(0).component_incident();
        assert_relative_eq!(n1.abs(), x / 2.0, max_relative = 1e-6);
    }

    #[test]
    fn one_pole_impulse_decays_monotonically() {
        // Single capacitor terminated into a resistive load: a one-pole
        // network whose impulse response must only ever shrink.
        let mut ladder = Ladder::new(100.0);
        ladder.push(Adaptor::series_terminated(capacitor(1e-6), 600.0));
        ladder.reset(FS);

        let mut prev = ladder.process_sample(1.0).abs();
        for i in 1..4096 {
            let y = ladder.process_sample(0.0).abs();
            assert!(y <= prev + 1e-15, "sample {i} grew: {y} > {prev}");
            prev = y;
        }
        assert!(prev < 1e-6, "impulse energy should drain away, left {prev}");
    }

    #[test]
    #[should_panic(expected = "ladder has no nodes")]
    fn empty_ladder_fails_legibly() {
        let mut ladder = Ladder::new(100.0);
        ladder.process_sample(0.0);
    }

    #[test]
    fn reset_restores_determinism() {
        let mut ladder = Ladder::new(100.0);
        ladder.push(Adaptor::series_chain(capacitor(1e-6)));
        ladder.push(Adaptor::parallel_terminated(resistor(10_000.0), 100.0));
        ladder.reset(FS);

        let first: Vec<f64> = (0..64)
            .map(|i| ladder.process_sample((i as f64 * 0.1).sin()))
            .collect();
        ladder.reset(FS);
        let second: Vec<f64> = (0..64)
            .map(|i| ladder.process_sample((i as f64 * 0.1).sin()))
            .collect();

        for (i, (a, b)) in first.iter().zip(second.iter()).enumerate() {
            assert_eq!(a, b, "sample {i} diverged after reset: {a} vs {b}");
        }
    }

    #[test]
    fn purely_resistive_ladder_outputs_are_bounded() {
        let mut ladder = Ladder::new(100.0);
        ladder.push(Adaptor::series_chain(resistor(4700.0)));
        ladder.push(Adaptor::series_terminated(resistor(2200.0), 600.0));
        ladder.reset(FS);

        for i in 0..1000 {
            let x = (i as f64 * 0.013).sin();
            let y = ladder.process_sample(x);
            assert!(y.is_finite(), "sample {i} not finite: {y}");
            assert!(y.abs() <= 2.0 * x.abs() + 1e-12, "passive gain bound broken at {i}: {y}");
        }
    }
}
