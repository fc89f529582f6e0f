//! Spike trains for sources that lie outside the simulated population, every
//! spike is turned into a delayed synaptic event on the connected synapse.

use rand::Rng;
use rand_distr::{Distribution, Exp};


/// Generates spike times for an external source
pub trait SpikeTrain: Send + Sync {
    /// Returns every spike time (ms) in `[0, until)`, in increasing order
    fn spike_times(&mut self, until: f64) -> Vec<f64>;
}

/// A preset spike train that fires at a designated set of times
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetSpikeTrain {
    /// Set of times to fire at (ms)
    pub firing_times: Vec<f64>,
}

impl PresetSpikeTrain {
    /// Creates a spike train from the given firing times, order does not matter
    pub fn new(mut firing_times: Vec<f64>) -> Self {
        firing_times.retain(|i| i.is_finite());
        firing_times.sort_by(|a, b| a.total_cmp(b));

        PresetSpikeTrain { firing_times }
    }
}

impl SpikeTrain for PresetSpikeTrain {
    fn spike_times(&mut self, until: f64) -> Vec<f64> {
        self.firing_times.iter()
            .copied()
            .filter(|time| *time >= 0. && *time < until)
            .collect()
    }
}

/// A spike train with exponentially distributed inter spike intervals
#[derive(Debug, Clone)]
pub struct PoissonSpikeTrain<R: Rng> {
    /// Firing rate (Hz)
    pub rate: f64,
    /// Time of the first possible spike (ms)
    pub start: f64,
    /// Random number generator
    pub rng: R,
}

impl<R: Rng> PoissonSpikeTrain<R> {
    /// Generates a Poisson spike train with the given rate (Hz) starting at `start` (ms)
    pub fn from_firing_rate(rate: f64, start: f64, rng: R) -> Self {
        PoissonSpikeTrain { rate, start, rng }
    }
}

impl<R: Rng + Send + Sync> SpikeTrain for PoissonSpikeTrain<R> {
    fn spike_times(&mut self, until: f64) -> Vec<f64> {
        // rate in Hz, intervals in ms
        let interval = match Exp::new(self.rate / 1000.) {
            Ok(interval) if self.rate > 0. => interval,
            _ => return vec![],
        };

        let mut times = vec![];
        let mut time = self.start;
        loop {
            time += interval.sample(&mut self.rng);
            if time >= until {
                break;
            }
            times.push(time);
        }

        times
    }
}
