//! A dentate gyrus network of granule, basket, mossy and HIPP cells with
//! stochastic population level wiring, externally driven afferents and a
//! step synchronized fixed step run.

use std::ops::Range;
use rand::{Rng, seq::index::sample};
use rayon::prelude::*;
use tracing::{error, info};
use crate::diagnostics::CellSnapshot;
use crate::error::{CellError, DentateGyrusError, SimulationError, WiringError};
use crate::neuron::{
    cell::{Cell, CellOptions, CellType},
    spike_train::SpikeTrain,
};


/// Number of cells in each population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationSizes {
    pub granule: usize,
    pub basket: usize,
    pub mossy: usize,
    pub hipp: usize,
}

impl Default for PopulationSizes {
    fn default() -> Self {
        PopulationSizes { granule: 500, basket: 6, mossy: 15, hipp: 6 }
    }
}

impl PopulationSizes {
    pub fn total(&self) -> usize {
        self.granule + self.basket + self.mossy + self.hipp
    }
}

/// Wiring wide settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WiringConfig {
    /// Probability of installing each granule to granule connection
    pub sprout: f64,
    /// External afferents onto granule cell `i` land on granule cell `i + offset`
    pub external_granule_offset: usize,
}

impl Default for WiringConfig {
    fn default() -> Self {
        WiringConfig { sprout: 0., external_granule_offset: 200 }
    }
}

/// A single requested connection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkConnection {
    /// Source cell, indices past the end of the network denote external sources
    pub source: usize,
    /// Target cell
    pub target: usize,
    /// Synapse index on the target
    pub synapse: usize,
    /// Event weight
    pub weight: f64,
    /// Transmission delay (ms)
    pub delay: f64,
    /// AP threshold set on the synapse's compartment (mV)
    pub threshold: f64,
    /// Probability of installing the connection, granule to granule connections
    /// use the sprouting probability when not given
    pub gate: Option<f64>,
}

/// What [`Network::connect`] did with a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Installed a live link between two simulated cells
    Live,
    /// Enqueued an external event on the target synapse
    External,
    /// Rejected by the stochastic gate
    Skipped,
}

/// A live link, a source soma spike at `t` activates the target synapse at `t + delay`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveConnection {
    pub source: usize,
    pub target: usize,
    pub synapse: usize,
    pub weight: f64,
    pub delay: f64,
}

/// Population level connectivity, every source cell connects to `divergence`
/// distinct target cells drawn uniformly, each on a synapse drawn uniformly from
/// `synapses`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectivityRule {
    pub source: CellType,
    pub target: CellType,
    /// First and last synapse index (inclusive)
    pub synapses: (usize, usize),
    pub divergence: usize,
    pub weight: f64,
    /// Delay (ms)
    pub delay: f64,
    /// Threshold (mV)
    pub threshold: f64,
}

macro_rules! rule {
    ($source:ident -> $target:ident, $first:expr, $last:expr, $divergence:expr, $weight:expr, $delay:expr) => {
        ConnectivityRule {
            source: CellType::$source,
            target: CellType::$target,
            synapses: ($first, $last),
            divergence: $divergence,
            weight: $weight,
            delay: $delay,
            threshold: 10.,
        }
    };
}

/// Default connectivity of the dentate gyrus network
pub fn default_rules() -> Vec<ConnectivityRule> {
    vec![
        rule!(Granule -> Basket, 2, 5, 1, 4.7e-3, 0.8),
        rule!(Granule -> Mossy, 4, 7, 1, 0.2e-3, 1.5),
        rule!(Granule -> Hipp, 0, 3, 3, 0.5e-3, 1.5),
        rule!(Granule -> Granule, 7, 8, 10, 2e-3, 0.8),
        rule!(Basket -> Granule, 6, 6, 100, 1.6e-3, 0.85),
        rule!(Basket -> Basket, 8, 9, 2, 7.6e-3, 0.8),
        rule!(Basket -> Mossy, 12, 12, 3, 0.3e-3, 1.5),
        rule!(Mossy -> Granule, 2, 3, 200, 0.3e-3, 3.),
        rule!(Mossy -> Basket, 6, 7, 1, 0.3e-3, 3.),
        rule!(Mossy -> Mossy, 8, 11, 3, 0.5e-3, 2.),
        rule!(Mossy -> Hipp, 4, 7, 2, 0.2e-3, 3.),
        rule!(Hipp -> Granule, 4, 5, 160, 0.5e-3, 1.6),
        rule!(Hipp -> Basket, 10, 11, 4, 0.5e-3, 1.6),
        rule!(Hipp -> Mossy, 13, 16, 4, 1.5e-3, 1.),
    ]
}

/// External perforant path volley onto the first granule and basket cells
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerforantPathStimulus {
    /// Number of granule cells stimulated
    pub granule: usize,
    /// Number of basket cells stimulated
    pub basket: usize,
    /// Activation time (ms)
    pub time: f64,
    /// Event weight
    pub weight: f64,
}

impl Default for PerforantPathStimulus {
    fn default() -> Self {
        PerforantPathStimulus { granule: 100, basket: 2, time: 3., weight: 1. }
    }
}

/// Counts of a wiring pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WiringSummary {
    pub live: usize,
    pub external: usize,
    pub skipped: usize,
}

impl WiringSummary {
    fn record(&mut self, outcome: ConnectionOutcome) {
        match outcome {
            ConnectionOutcome::Live => self.live += 1,
            ConnectionOutcome::External => self.external += 1,
            ConnectionOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Totals of a run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunSummary {
    /// Steps taken
    pub steps: usize,
    /// Soma spikes across every cell
    pub spikes: usize,
    /// Final time (ms)
    pub time: f64,
}

/// Cells ordered granule, basket, mossy then HIPP with their live connections
#[derive(Debug, Clone)]
pub struct Network {
    /// Every simulated cell, a cell's id is its index
    pub cells: Vec<Cell>,
    /// Population sizes
    pub sizes: PopulationSizes,
    /// Wiring settings
    pub config: WiringConfig,
    /// Live connections
    pub connections: Vec<LiveConnection>,
    /// Indices into `connections` by source cell
    outgoing: Vec<Vec<usize>>,
    /// Simulation time (ms)
    pub time: f64,
}

impl Network {
    /// Builds every cell and its synapses
    pub fn new(sizes: PopulationSizes, options: CellOptions, config: WiringConfig) -> Result<Self, CellError> {
        let populations = [
            (CellType::Granule, sizes.granule),
            (CellType::Basket, sizes.basket),
            (CellType::Mossy, sizes.mossy),
            (CellType::Hipp, sizes.hipp),
        ];

        let mut cells = Vec::with_capacity(sizes.total());
        for (cell_type, count) in populations.iter() {
            for _ in 0..*count {
                let mut cell = Cell::build(*cell_type, cells.len(), options)?;
                cell.make_synapses()?;
                cells.push(cell);
            }
        }

        let compartments: usize = cells.iter().map(|i| i.compartments.len()).sum();
        let states: usize = cells.iter().map(|i| i.state_len()).sum();
        info!(
            "Network with {} cells, {} compartments and {} state variables",
            cells.len(), compartments, states,
        );

        let outgoing = vec![vec![]; cells.len()];

        Ok(Network { cells, sizes, config, connections: vec![], outgoing, time: 0. })
    }

    /// Index range of a population
    pub fn population(&self, cell_type: CellType) -> Range<usize> {
        let s = &self.sizes;
        match cell_type {
            CellType::Granule => 0..s.granule,
            CellType::Basket => s.granule..s.granule + s.basket,
            CellType::Mossy => s.granule + s.basket..s.granule + s.basket + s.mossy,
            CellType::Hipp => s.granule + s.basket + s.mossy..s.total(),
        }
    }

    /// Outgoing live connections of a cell
    pub fn outgoing(&self, source: usize) -> impl Iterator<Item=&LiveConnection> {
        self.outgoing.get(source)
            .into_iter()
            .flatten()
            .map(move |i| &self.connections[*i])
    }

    fn is_granule(&self, index: usize) -> bool {
        self.cells.get(index).map_or(false, |i| i.cell_type == CellType::Granule)
    }

    /// Sets the threshold of the target synapse's compartment, then either installs a
    /// live link from a simulated source (subject to the stochastic gate) or, for an
    /// external source, enqueues an event at `delay` on the target synapse
    pub fn connect<R: Rng>(
        &mut self, connection: NetworkConnection, rng: &mut R,
    ) -> Result<ConnectionOutcome, WiringError> {
        let n_cells = self.cells.len();
        let target = self.cells.get_mut(connection.target)
            .ok_or(WiringError::TargetNotFound(connection.target))?;
        let compartment = target.synapses.get(connection.synapse)
            .ok_or(WiringError::SynapseNotFound(connection.target, connection.synapse))?
            .compartment;
        target.compartments[compartment].ap_detector.threshold = connection.threshold;

        if connection.source < n_cells {
            let gate = match connection.gate {
                Some(p) => Some(p),
                None if self.is_granule(connection.source) && self.is_granule(connection.target) => {
                    Some(self.config.sprout)
                },
                None => None,
            };

            if let Some(p) = gate {
                if !(0. ..=1.).contains(&p) {
                    return Err(WiringError::InvalidProbability(p));
                }
                if rng.gen::<f64>() >= p {
                    return Ok(ConnectionOutcome::Skipped);
                }
            }

            self.connections.push(LiveConnection {
                source: connection.source,
                target: connection.target,
                synapse: connection.synapse,
                weight: connection.weight,
                delay: connection.delay,
            });
            self.outgoing[connection.source].push(self.connections.len() - 1);

            Ok(ConnectionOutcome::Live)
        } else {
            let target = if self.is_granule(connection.target) {
                connection.target + self.config.external_granule_offset
            } else {
                connection.target
            };

            let synapse = self.cells.get_mut(target)
                .ok_or(WiringError::TargetNotFound(target))?
                .synapses.get_mut(connection.synapse)
                .ok_or(WiringError::SynapseNotFound(target, connection.synapse))?;
            synapse.enqueue(connection.delay, connection.weight);

            Ok(ConnectionOutcome::External)
        }
    }

    /// Enqueues every spike of an external train on the given synapse, delayed by
    /// `delay` (ms), returns how many events were enqueued
    pub fn connect_spike_train<T: SpikeTrain>(
        &mut self, train: &mut T, target: usize, synapse: usize, weight: f64, delay: f64, until: f64,
    ) -> Result<usize, WiringError> {
        let synapse = self.cells.get_mut(target)
            .ok_or(WiringError::TargetNotFound(target))?
            .synapses.get_mut(synapse)
            .ok_or(WiringError::SynapseNotFound(target, synapse))?;

        let times = train.spike_times(until);
        for time in times.iter() {
            synapse.enqueue(time + delay, weight);
        }

        Ok(times.len())
    }

    /// Applies each rule to every source cell of its population
    pub fn wire<R: Rng>(&mut self, rules: &[ConnectivityRule], rng: &mut R) -> Result<WiringSummary, WiringError> {
        let mut summary = WiringSummary::default();

        for rule in rules.iter() {
            let sources = self.population(rule.source);
            let targets = self.population(rule.target);
            if sources.is_empty() {
                continue;
            }
            if targets.is_empty() {
                return Err(WiringError::EmptyPopulation(rule.target.label().to_string()));
            }
            let (first, last) = rule.synapses;

            for source in sources {
                let candidates: Vec<usize> = targets.clone()
                    .filter(|target| *target != source)
                    .collect();
                let amount = rule.divergence.min(candidates.len());

                for n in sample(rng, candidates.len(), amount).into_iter() {
                    let connection = NetworkConnection {
                        source,
                        target: candidates[n],
                        synapse: rng.gen_range(first..=last),
                        weight: rule.weight,
                        delay: rule.delay,
                        threshold: rule.threshold,
                        gate: None,
                    };
                    summary.record(self.connect(connection, rng)?);
                }
            }
        }

        info!(
            "Made {} live connections, {} external events, {} skipped by sprouting",
            summary.live, summary.external, summary.skipped,
        );

        Ok(summary)
    }

    /// Delivers a perforant path volley through external connections on every
    /// perforant path synapse of the stimulated cells
    pub fn stimulate<R: Rng>(
        &mut self, stimulus: &PerforantPathStimulus, rng: &mut R,
    ) -> Result<WiringSummary, WiringError> {
        let mut summary = WiringSummary::default();
        let external = self.cells.len();

        let granule = self.population(CellType::Granule);
        let basket = self.population(CellType::Basket);
        let targets: Vec<usize> = granule.take(stimulus.granule)
            .chain(basket.take(stimulus.basket))
            .collect();

        for target in targets {
            let synapses = self.cells[target].perforant_path.clone();
            for synapse in synapses {
                let connection = NetworkConnection {
                    source: external,
                    target,
                    synapse,
                    weight: stimulus.weight,
                    delay: stimulus.time,
                    threshold: 10.,
                    gate: None,
                };
                summary.record(self.connect(connection, rng)?);
            }
        }

        Ok(summary)
    }

    /// Resets every cell to rest, pending events are kept
    pub fn initialize(&mut self) {
        for cell in self.cells.iter_mut() {
            let queues: Vec<_> = cell.synapses.iter().map(|i| i.queue.clone()).collect();
            cell.initialize();
            for (synapse, queue) in cell.synapses.iter_mut().zip(queues) {
                synapse.queue = queue;
            }
        }
        self.time = 0.;
    }

    /// Advances every cell in parallel by `dt` (ms) then routes soma spikes through
    /// live connections, returns the cells that spiked
    pub fn step(&mut self, dt: f64) -> Result<Vec<(usize, f64)>, SimulationError> {
        let results: Vec<Result<Option<f64>, SimulationError>> = self.cells
            .par_iter_mut()
            .map(|cell| cell.step(dt))
            .collect();

        let mut spikes = vec![];
        for (n, result) in results.into_iter().enumerate() {
            match result {
                Ok(Some(time)) => spikes.push((n, time)),
                Ok(None) => {},
                Err(e) => {
                    if let SimulationError::NumericalFailure { cell, .. } = &e {
                        if let Some(failed) = self.cells.get(*cell) {
                            error!("{}\n{}", e, CellSnapshot::capture(failed));
                        }
                    }

                    return Err(e);
                },
            }
        }

        for (source, time) in spikes.iter() {
            for index in self.outgoing[*source].iter() {
                let connection = self.connections[*index];
                if let Some(synapse) = self.cells[connection.target].synapses.get_mut(connection.synapse) {
                    synapse.enqueue(time + connection.delay, connection.weight);
                }
            }
        }

        self.time += dt;

        Ok(spikes)
    }

    /// Runs for `duration` (ms) with a fixed step, logging every 1000 ms of
    /// simulated time
    pub fn run(&mut self, duration: f64, dt: f64) -> Result<RunSummary, DentateGyrusError> {
        if !dt.is_finite() || dt <= 0. {
            return Err(SimulationError::InvalidTimestep(dt).into());
        }

        let steps = (duration / dt).round() as usize;
        let mut summary = RunSummary::default();
        let mut ticks = 0;

        info!("Starting run");
        for _ in 0..steps {
            let spikes = self.step(dt)?;
            summary.steps += 1;
            summary.spikes += spikes.len();

            let elapsed = (self.time / 1000.).floor() as usize;
            if elapsed > ticks {
                ticks = elapsed;
                info!("{} (ms) elapsed", ticks * 1000);
            }
        }
        summary.time = self.time;

        info!("Finished run at {} ms with {} spikes", summary.time, summary.spikes);

        Ok(summary)
    }
}
