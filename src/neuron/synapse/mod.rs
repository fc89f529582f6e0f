//! Dual exponential conductance synapses driven by discrete activation events.

use std::fmt::{Display, Formatter, Result};


/// Base peak conductance of a synapse (S)
pub const BASE_G_MAX: f64 = 1e-6;

/// A pending activation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapticEvent {
    /// Delivery time (ms)
    pub time: f64,
    /// Event weight
    pub weight: f64,
}

/// Two state synapse where `g = g_max * (B - A)`, `A` decays with `tau1` and
/// `B` with `tau2`, an event of weight `w` adds `w * factor` to both states so that
/// a unit event peaks at exactly `g_max`
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleExponentialSynapse {
    /// Index of the owning compartment within its cell
    pub compartment: usize,
    /// Rise time constant (ms)
    pub tau1: f64,
    /// Decay time constant (ms)
    pub tau2: f64,
    /// Reversal potential (mV)
    pub e_rev: f64,
    /// Peak conductance (S)
    pub g_max: f64,
    /// Peak conductance before any global scaling (S)
    pub base_g_max: f64,
    /// Rise state
    pub a: f64,
    /// Decay state
    pub b: f64,
    /// Pending events ordered by delivery time
    pub queue: Vec<SynapticEvent>,
}

impl DoubleExponentialSynapse {
    /// Creates a synapse at rest with peak conductance `BASE_G_MAX * scale`
    pub fn new(compartment: usize, tau1: f64, tau2: f64, e_rev: f64, scale: f64) -> Self {
        DoubleExponentialSynapse {
            compartment,
            tau1,
            tau2,
            e_rev,
            g_max: BASE_G_MAX * scale,
            base_g_max: BASE_G_MAX * scale,
            a: 0.,
            b: 0.,
            queue: vec![],
        }
    }

    /// Rise time constant, clamped to `0.9999 * tau2` so rise and decay never coincide
    pub fn effective_tau1(&self) -> f64 {
        if self.tau1 / self.tau2 > 0.9999 {
            0.9999 * self.tau2
        } else {
            self.tau1
        }
    }

    /// Time from activation to peak (ms)
    pub fn peak_time(&self) -> f64 {
        let tau1 = self.effective_tau1();
        let tau2 = self.tau2;

        (tau1 * tau2) / (tau2 - tau1) * (tau2 / tau1).ln()
    }

    /// Normalization so that a unit event peaks at one
    pub fn normalization_factor(&self) -> f64 {
        let tau1 = self.effective_tau1();
        let tp = self.peak_time();

        1. / ((-tp / self.tau2).exp() - (-tp / tau1).exp())
    }

    /// Applies an event of the given weight immediately
    pub fn activate(&mut self, weight: f64) {
        let factor = weight * self.normalization_factor();

        self.a += factor;
        self.b += factor;
    }

    /// Queues an event for delivery at the given time (ms)
    pub fn enqueue(&mut self, time: f64, weight: f64) {
        let index = self.queue.partition_point(|event| event.time <= time);
        self.queue.insert(index, SynapticEvent { time, weight });
    }

    /// Activates every queued event due at or before `time`, returns how many fired
    pub fn deliver(&mut self, time: f64) -> usize {
        let due = self.queue.partition_point(|event| event.time <= time);
        let events: Vec<SynapticEvent> = self.queue.drain(..due).collect();

        for event in events.iter() {
            self.activate(event.weight);
        }

        events.len()
    }

    /// Conductance (S)
    pub fn conductance(&self) -> f64 {
        self.g_max * (self.b - self.a)
    }

    /// Current (mA, outward positive) at the given voltage
    pub fn current(&self, voltage: f64) -> f64 {
        self.conductance() * (voltage - self.e_rev)
    }

    /// `[dA/dt, dB/dt]`
    pub fn derivatives(&self) -> [f64; 2] {
        [-self.a / self.effective_tau1(), -self.b / self.tau2]
    }

    /// Decays both states exactly over `dt` (ms)
    pub fn update(&mut self, dt: f64) {
        self.a *= (-dt / self.effective_tau1()).exp();
        self.b *= (-dt / self.tau2).exp();
    }

    /// Clears states and pending events
    pub fn reset(&mut self) {
        self.a = 0.;
        self.b = 0.;
        self.queue.clear();
    }

    /// Whether the synapse is inhibitory
    pub fn is_gabaergic(&self) -> bool {
        self.e_rev == -70.
    }
}

impl Display for DoubleExponentialSynapse {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(
            f, "Exp2Syn tau1={} tau2={} Er={} Gmax={} A={} B={} pending={}",
            self.tau1, self.tau2, self.e_rev, self.g_max, self.a, self.b, self.queue.len(),
        )
    }
}
