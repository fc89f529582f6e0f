//! Multicompartment dentate gyrus cells, a soma with dendritic branch chains,
//! per cell calcium channel scaling and a list of dual exponential synapses.

use std::fmt::{Display, Formatter};
use tracing::debug;
use crate::error::{CellError, SimulationError};
use super::calcium::CalciumMode;
use super::compartment::{
    ChannelDensities, Compartment, GeometryBuilder, TraceBuffer, axial_current,
};
use super::synapse::DoubleExponentialSynapse;


/// Population a cell belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellType {
    Granule,
    Basket,
    Mossy,
    Hipp,
}

impl CellType {
    /// Label used in spike output
    pub fn label(&self) -> &'static str {
        match self {
            CellType::Granule => "Granule cell",
            CellType::Basket => "Basket cell",
            CellType::Mossy => "Mossy cell",
            CellType::Hipp => "HIPP cell",
        }
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per cell scaling of the calcium dependent channel families
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConductanceScaling {
    pub cal: f64,
    pub can: f64,
    pub cat: f64,
    pub bk: f64,
    pub sk: f64,
}

impl Default for ConductanceScaling {
    fn default() -> Self {
        ConductanceScaling { cal: 1., can: 1., cat: 1., bk: 1., sk: 1. }
    }
}

impl ConductanceScaling {
    /// Fitted scaling of each population
    pub fn for_cell_type(cell_type: CellType) -> Self {
        match cell_type {
            CellType::Granule => ConductanceScaling { cal: 0.2409, can: 1., cat: 0.4832, bk: 0., sk: 1. },
            CellType::Basket => ConductanceScaling { cal: 0.25, can: 1., cat: 1., bk: 0., sk: 1. },
            CellType::Mossy => ConductanceScaling { cal: 0., can: 0., cat: 1., bk: 1., sk: 0.25 },
            CellType::Hipp => ConductanceScaling { cal: 0., can: 1., cat: 1., bk: 1., sk: 0.7 },
        }
    }
}

/// Square current pulse into the soma
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentInjection {
    /// Start time (ms)
    pub start: f64,
    /// End time (ms)
    pub end: f64,
    /// Amplitude (nA), positive depolarizes
    pub amplitude: f64,
}

impl Default for CurrentInjection {
    fn default() -> Self {
        CurrentInjection { start: 0., end: 1e9, amplitude: 0. }
    }
}

impl CurrentInjection {
    /// Injected current (mA) at the given time
    pub fn current(&self, time: f64) -> f64 {
        if time >= self.start && time <= self.end {
            self.amplitude * 1e-6
        } else {
            0.
        }
    }
}

/// Step counters of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepStatistics {
    /// Steps attempted
    pub total_steps: usize,
    /// Steps that produced a finite state
    pub accepted_steps: usize,
    /// Derivative evaluations
    pub derivative_evaluations: usize,
}

/// Location and kinetics of a synapse in a cell's synapse table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapseSite {
    /// `(branch, position)` along a dendrite or `None` for the soma
    pub dendrite: Option<(usize, usize)>,
    /// Rise time constant (ms)
    pub tau1: f64,
    /// Decay time constant (ms)
    pub tau2: f64,
    /// Reversal potential (mV)
    pub e_rev: f64,
    /// Scale of the base peak conductance
    pub scale: f64,
    /// Whether the synapse is a perforant path afferent
    pub perforant: bool,
}

fn site(dendrite: Option<(usize, usize)>, tau1: f64, tau2: f64, e_rev: f64) -> SynapseSite {
    SynapseSite { dendrite, tau1, tau2, e_rev, scale: 1., perforant: false }
}

fn perforant_site(dendrite: (usize, usize), tau1: f64, tau2: f64, scale: f64) -> SynapseSite {
    SynapseSite { dendrite: Some(dendrite), tau1, tau2, e_rev: 0., scale, perforant: true }
}

/// Synapse table of each population, indices into this table are the synapse
/// indices used by the network wiring
pub fn synapse_table(cell_type: CellType) -> Vec<SynapseSite> {
    match cell_type {
        CellType::Granule => vec![
            // perforant path
            perforant_site((0, 3), 1.5, 5.5, 0.02),
            perforant_site((1, 3), 1.5, 5.5, 0.02),
            // mossy
            site(Some((0, 1)), 1.5, 5.5, 0.),
            site(Some((1, 1)), 1.5, 5.5, 0.),
            // hipp
            site(Some((0, 3)), 0.5, 6.0, -70.),
            site(Some((0, 3)), 0.5, 6.0, -70.),
            // basket
            site(None, 0.26, 5.5, -70.),
            // sprouted mossy fibers
            site(Some((0, 1)), 1.5, 5.5, 0.),
            site(Some((1, 1)), 1.5, 5.5, 0.),
        ],
        CellType::Basket => vec![
            perforant_site((0, 3), 2.0, 6.3, 0.01),
            perforant_site((1, 3), 2.0, 6.3, 0.01),
            site(Some((0, 0)), 0.3, 0.6, 0.),
            site(Some((1, 0)), 0.3, 0.6, 0.),
            site(Some((2, 0)), 0.3, 0.6, 0.),
            site(Some((3, 0)), 0.3, 0.6, 0.),
            site(Some((0, 1)), 0.9, 3.6, 0.),
            site(Some((1, 1)), 0.9, 3.6, 0.),
            site(Some((0, 1)), 0.16, 1.8, -70.),
            site(Some((1, 1)), 0.16, 1.8, -70.),
            site(Some((0, 3)), 0.4, 5.8, -70.),
            site(Some((1, 3)), 0.4, 5.8, -70.),
        ],
        CellType::Mossy => {
            let mut table: Vec<SynapseSite> = (0..4)
                .map(|i| perforant_site((i, 3), 1.5, 5.5, 0.005))
                .collect();
            table.extend((0..4).map(|i| site(Some((i, 0)), 0.5, 6.2, 0.)));
            table.extend((0..4).map(|i| site(Some((i, 0)), 0.45, 2.2, 0.)));
            table.push(site(None, 0.3, 3.3, -70.));
            table.extend((0..4).map(|i| site(Some((i, 2)), 0.5, 6.0, -70.)));

            table
        },
        CellType::Hipp => {
            let mut table: Vec<SynapseSite> = (0..4)
                .map(|i| site(Some((i, 0)), 0.3, 0.6, 0.))
                .collect();
            table.extend((0..4).map(|i| site(Some((i, 1)), 0.9, 3.6, 0.)));

            table
        },
    }
}

/// Options used when building a cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellOptions {
    /// Use the slow inactivating sodium channel
    pub use_slow: bool,
    /// Calcium pool storage
    pub calcium_mode: CalciumMode,
    /// Keep voltage traces
    pub trace: bool,
}

impl Default for CellOptions {
    fn default() -> Self {
        CellOptions { use_slow: true, calcium_mode: CalciumMode::Combined, trace: false }
    }
}

/// A multicompartment cell, compartment `0` is the soma
#[derive(Debug, Clone)]
pub struct Cell {
    /// Position in the network
    pub id: usize,
    /// Population
    pub cell_type: CellType,
    /// Compartments, every compartment's parent precedes it
    pub compartments: Vec<Compartment>,
    /// Compartment indices of each dendritic branch from proximal to distal
    pub dendrites: Vec<Vec<usize>>,
    /// Calcium channel scaling
    pub scaling: ConductanceScaling,
    /// Synapses
    pub synapses: Vec<DoubleExponentialSynapse>,
    /// Indices of perforant path synapses
    pub perforant_path: Vec<usize>,
    /// Somatic current injection
    pub injection: Option<CurrentInjection>,
    /// Simulation time (ms)
    pub time: f64,
    /// Step counters
    pub statistics: StepStatistics,
}

struct Section {
    leak: f64,
    ra: f64,
    cm: f64,
    length: f64,
    diameter: f64,
    e_leak: f64,
}

impl Cell {
    fn empty(id: usize, cell_type: CellType) -> Self {
        Cell {
            id,
            cell_type,
            compartments: vec![],
            dendrites: vec![],
            scaling: ConductanceScaling::for_cell_type(cell_type),
            synapses: vec![],
            perforant_path: vec![],
            injection: None,
            time: 0.,
            statistics: StepStatistics::default(),
        }
    }

    fn add_compartment(
        &mut self,
        name: String,
        parent: Option<usize>,
        section: Section,
        densities: ChannelDensities,
        options: &CellOptions,
    ) -> Result<usize, CellError> {
        let label = self.cell_type.label();
        let geometry = GeometryBuilder::new()
            .leak_conductance(section.leak)
            .axial_resistivity(section.ra)
            .specific_capacitance(section.cm)
            .length(section.length)
            .diameter(section.diameter)
            .leak_potential(section.e_leak)
            .build()
            .map_err(|e| CellError::Compartment(label.to_string(), e))?;

        let mut compartment = Compartment::new(&name, geometry);
        if let Some(parent) = parent {
            let parent_geometry = self.compartments.get(parent)
                .ok_or(CellError::CompartmentNotFound(parent))?
                .geometry;
            compartment.connect(parent, &parent_geometry);
        }

        compartment.add_channels(&densities, options.use_slow, options.calcium_mode)
            .map_err(|e| CellError::Compartment(label.to_string(), e))?;

        if options.trace {
            compartment.trace = Some(TraceBuffer::default());
        }

        self.compartments.push(compartment);

        Ok(self.compartments.len() - 1)
    }

    fn finish(mut self) -> Result<Self, CellError> {
        self.verify_topology()?;
        self.compartments[0].ap_detector.threshold = 10.;

        debug!(
            id = self.id,
            cell = self.cell_type.label(),
            compartments = self.compartments.len(),
            "built cell"
        );

        Ok(self)
    }

    /// Granule cell, a soma with two dendrites of four compartments each
    pub fn granule(id: usize, options: CellOptions) -> Result<Self, CellError> {
        let mut cell = Cell::empty(id, CellType::Granule);
        let s = cell.scaling;

        cell.add_compartment(
            String::from("soma"),
            None,
            Section { leak: 0.04, ra: 210., cm: 1., length: 16.8, diameter: 16.8, e_leak: -70. },
            ChannelDensities {
                g_na: 120., g_kdrf: 16., g_kdrs: 6., g_ka: 12.,
                g_can: 2. * s.can, g_cal: 5. * s.cal, g_cat: 0.037 * s.cat,
                g_sk: 1. * s.sk, g_bk: 0.6 * s.bk,
                ..ChannelDensities::default()
            },
            &options,
        )?;

        // (leak, cm, length, densities) from the granule cell layer outwards
        let segments = [
            (0.04, 1., 50., ChannelDensities {
                g_na: 18., g_kdrf: 4., g_kdrs: 6.,
                g_can: 3. * s.can, g_cal: 7.5 * s.cal, g_cat: 0.075 * s.cal,
                g_sk: 0.4 * s.sk, g_bk: 0.6 * s.bk,
                ..ChannelDensities::default()
            }),
            (0.063, 1.6, 150., ChannelDensities {
                g_na: 13., g_kdrf: 4., g_kdrs: 6.,
                g_can: 1. * s.can, g_cal: 7.5 * s.cal, g_cat: 0.25 * s.cat,
                g_sk: 0.2 * s.sk, g_bk: 1. * s.bk,
                ..ChannelDensities::default()
            }),
            (0.063, 1.6, 150., ChannelDensities {
                g_na: 8., g_kdrf: 1., g_kdrs: 6.,
                g_can: 1. * s.can, g_cal: 0.5 * s.cal, g_cat: 0.5 * s.cat,
                g_sk: 0., g_bk: 2.4 * s.bk,
                ..ChannelDensities::default()
            }),
            (0.063, 1.6, 150., ChannelDensities {
                g_na: 0., g_kdrf: 1., g_kdrs: 8.,
                g_can: 1. * s.can, g_cal: 0., g_cat: 1. * s.cat,
                g_sk: 0., g_bk: 2.4 * s.bk,
                ..ChannelDensities::default()
            }),
        ];

        for branch in 0..2 {
            let mut chain = vec![];
            let mut parent = 0;
            for (n, (leak, cm, length, densities)) in segments.iter().enumerate() {
                parent = cell.add_compartment(
                    format!("dendrite[{}][{}]", branch, n),
                    Some(parent),
                    Section { leak: *leak, ra: 210., cm: *cm, length: *length, diameter: 3., e_leak: -70. },
                    *densities,
                    &options,
                )?;
                chain.push(parent);
            }
            cell.dendrites.push(chain);
        }

        cell.injection = Some(CurrentInjection::default());

        cell.finish()
    }

    /// Basket cell, a soma with two apical and two basal dendrites
    pub fn basket(id: usize, options: CellOptions) -> Result<Self, CellError> {
        let mut cell = Cell::empty(id, CellType::Basket);
        let s = cell.scaling;

        let densities = |g_na: f64, g_kdrf: f64| ChannelDensities {
            g_na, g_kdrf, g_ka: 0.15,
            g_can: 0.8 * s.can, g_cal: 5. * s.cal,
            g_sk: 0.002 * s.sk, g_bk: 0.2 * s.bk,
            ..ChannelDensities::default()
        };
        let section = |length: f64, diameter: f64| Section {
            leak: 0.18, ra: 100., cm: 1.4, length, diameter, e_leak: -60.06,
        };

        cell.add_compartment(String::from("soma"), None, section(20., 15.), densities(120., 13.), &options)?;

        // apical then basal
        for (branch, length) in [75., 75., 50., 50.].iter().enumerate() {
            let mut chain = vec![];
            let mut parent = 0;
            for (n, diameter) in [4., 3., 2., 1.].iter().enumerate() {
                let active = if n == 0 { densities(120., 13.) } else { densities(0., 0.) };
                parent = cell.add_compartment(
                    format!("dendrite[{}][{}]", branch, n),
                    Some(parent),
                    section(*length, *diameter),
                    active,
                    &options,
                )?;
                chain.push(parent);
            }
            cell.dendrites.push(chain);
        }

        cell.finish()
    }

    /// Mossy cell, a soma with four dendrites
    pub fn mossy(id: usize, options: CellOptions) -> Result<Self, CellError> {
        let mut cell = Cell::empty(id, CellType::Mossy);
        let s = cell.scaling;

        let densities = |g_na: f64, g_kdrf: f64| ChannelDensities {
            g_na, g_kdrf, g_ka: 0.01,
            g_can: 0.08 * s.can, g_cal: 0.6 * s.cal,
            g_sk: 16. * s.sk, g_bk: 16.5 * s.bk, g_ih: 0.005,
            ..ChannelDensities::default()
        };
        let section = |leak: f64, cm: f64, length: f64, diameter: f64| Section {
            leak, ra: 100., cm, length, diameter, e_leak: -59.,
        };

        cell.add_compartment(
            String::from("soma"), None, section(0.011, 0.6, 20., 20.), densities(120., 0.5), &options,
        )?;

        for branch in 0..4 {
            let mut parent = cell.add_compartment(
                format!("dendrite[{}][0]", branch),
                Some(0),
                section(0.044, 2.4, 50., 5.78),
                densities(120., 0.5),
                &options,
            )?;
            let mut chain = vec![parent];
            for (n, diameter) in [4., 2.5, 1.].iter().enumerate() {
                parent = cell.add_compartment(
                    format!("dendrite[{}][{}]", branch, n + 1),
                    Some(parent),
                    section(0.044, 2.4, 50., *diameter),
                    densities(0., 0.),
                    &options,
                )?;
                chain.push(parent);
            }
            cell.dendrites.push(chain);
        }

        cell.injection = Some(CurrentInjection::default());

        cell.finish()
    }

    /// HIPP cell, a soma with four dendrites of three compartments
    pub fn hipp(id: usize, options: CellOptions) -> Result<Self, CellError> {
        let mut cell = Cell::empty(id, CellType::Hipp);
        let s = cell.scaling;

        let densities = |g_na: f64, g_kdrf: f64| ChannelDensities {
            g_na, g_kdrf, g_ka: 0.8,
            g_cal: 1.5 * s.cal, g_sk: 3. * s.sk, g_bk: 3. * s.bk, g_ih: 0.015,
            ..ChannelDensities::default()
        };
        let section = |length: f64, diameter: f64| Section {
            leak: 0.036, ra: 100., cm: 1.1, length, diameter, e_leak: -70.45,
        };

        cell.add_compartment(String::from("soma"), None, section(20., 10.), densities(200., 6.), &options)?;

        let diameters = [3., 2., 1.];
        let g_na = [200., 0., 0.];
        let g_kdrf = [6., 0., 0.];
        for (branch, length) in [75., 75., 50., 50.].iter().enumerate() {
            let mut chain = vec![];
            let mut parent = 0;
            for n in 0..3 {
                parent = cell.add_compartment(
                    format!("dendrite[{}][{}]", branch, n),
                    Some(parent),
                    section(*length, diameters[n]),
                    densities(g_na[n], g_kdrf[n]),
                    &options,
                )?;
                chain.push(parent);
            }
            cell.dendrites.push(chain);
        }

        cell.injection = Some(CurrentInjection::default());

        cell.finish()
    }

    /// Builds a cell of the given population
    pub fn build(cell_type: CellType, id: usize, options: CellOptions) -> Result<Self, CellError> {
        match cell_type {
            CellType::Granule => Cell::granule(id, options),
            CellType::Basket => Cell::basket(id, options),
            CellType::Mossy => Cell::mossy(id, options),
            CellType::Hipp => Cell::hipp(id, options),
        }
    }

    /// Soma compartment
    pub fn soma(&self) -> &Compartment {
        &self.compartments[0]
    }

    /// Compartment index of a position along a dendrite
    pub fn dendrite(&self, branch: usize, position: usize) -> Result<usize, CellError> {
        self.dendrites.get(branch)
            .and_then(|chain| chain.get(position))
            .copied()
            .ok_or(CellError::InvalidTopology(format!("no dendrite[{}][{}]", branch, position)))
    }

    /// Adds a synapse to the given compartment, returns its index
    pub fn add_synapse(
        &mut self, compartment: usize, tau1: f64, tau2: f64, e_rev: f64, scale: f64, perforant: bool,
    ) -> Result<usize, CellError> {
        if compartment >= self.compartments.len() {
            return Err(CellError::CompartmentNotFound(compartment));
        }

        self.synapses.push(DoubleExponentialSynapse::new(compartment, tau1, tau2, e_rev, scale));
        let index = self.synapses.len() - 1;
        if perforant {
            self.perforant_path.push(index);
        }

        Ok(index)
    }

    /// Replaces the synapses with the population's synapse table
    pub fn make_synapses(&mut self) -> Result<(), CellError> {
        self.synapses.clear();
        self.perforant_path.clear();

        for entry in synapse_table(self.cell_type) {
            let compartment = match entry.dendrite {
                Some((branch, position)) => self.dendrite(branch, position)?,
                None => 0,
            };
            self.add_synapse(compartment, entry.tau1, entry.tau2, entry.e_rev, entry.scale, entry.perforant)?;
        }

        Ok(())
    }

    /// Returns the synapse at the given index
    pub fn synapse(&self, index: usize) -> Result<&DoubleExponentialSynapse, CellError> {
        self.synapses.get(index).ok_or(CellError::SynapseNotFound(index))
    }

    /// Returns the synapse at the given index mutably
    pub fn synapse_mut(&mut self, index: usize) -> Result<&mut DoubleExponentialSynapse, CellError> {
        self.synapses.get_mut(index).ok_or(CellError::SynapseNotFound(index))
    }

    /// Checks the compartments form a tree rooted at the soma, each parent
    /// must precede its child which rules out cycles
    pub fn verify_topology(&self) -> Result<(), CellError> {
        match self.compartments.first() {
            None => return Err(CellError::InvalidTopology(String::from("cell has no soma"))),
            Some(soma) if soma.parent.is_some() => {
                return Err(CellError::InvalidTopology(String::from("soma has a parent")));
            },
            _ => {},
        }

        for (n, compartment) in self.compartments.iter().enumerate().skip(1) {
            match compartment.parent {
                None => return Err(CellError::InvalidTopology(
                    format!("compartment {} ({}) has no parent", n, compartment.name)
                )),
                Some(link) if link.parent >= n => return Err(CellError::InvalidTopology(
                    format!("compartment {} ({}) has parent {} which does not precede it", n, compartment.name, link.parent)
                )),
                _ => {},
            }
        }

        Ok(())
    }

    /// Number of state variables
    pub fn state_len(&self) -> usize {
        self.compartments.iter().map(|i| 1 + i.internal_state_len()).sum::<usize>() +
            2 * self.synapses.len()
    }

    /// Resets every compartment and synapse to rest and the clock to zero
    pub fn initialize(&mut self) {
        self.compartments.iter_mut().for_each(|i| i.initialize());
        self.synapses.iter_mut().for_each(|i| i.reset());
        self.time = 0.;
        self.statistics = StepStatistics::default();
    }

    /// Synaptic current (mA) into each compartment
    fn synaptic_currents(&self) -> Vec<f64> {
        let mut currents = vec![0.; self.compartments.len()];
        for synapse in self.synapses.iter() {
            let voltage = self.compartments[synapse.compartment].voltage;
            currents[synapse.compartment] += synapse.current(voltage);
        }

        currents
    }

    /// Voltage derivative (mV/ms) of every compartment from leak, channel,
    /// synaptic, injected and axial currents
    pub fn voltage_derivatives(&self) -> Vec<f64> {
        let synaptic = self.synaptic_currents();

        let mut net: Vec<f64> = self.compartments.iter()
            .zip(synaptic.iter())
            .map(|(compartment, i_syn)| -(compartment.membrane_current() + i_syn))
            .collect();

        if let Some(injection) = &self.injection {
            net[0] += injection.current(self.time);
        }

        for (n, compartment) in self.compartments.iter().enumerate() {
            if let Some(link) = compartment.parent {
                let parent_voltage = self.compartments[link.parent].voltage;
                let current = axial_current(parent_voltage, compartment.voltage, link.conductance);
                net[n] += current;
                net[link.parent] -= current;
            }
        }

        net.iter()
            .zip(self.compartments.iter())
            .map(|(i, compartment)| i / compartment.capacitance)
            .collect()
    }

    /// Advances the cell by `dt` (ms), events due at the current time are delivered
    /// first, voltage uses forward Euler while gates, calcium and synapses are
    /// advanced exponentially with voltage held at its start of step value,
    /// returns the soma spike time if the soma crossed threshold
    pub fn step(&mut self, dt: f64) -> Result<Option<f64>, SimulationError> {
        if !dt.is_finite() || dt <= 0. {
            return Err(SimulationError::InvalidTimestep(dt));
        }

        self.statistics.total_steps += 1;

        let time = self.time;
        self.synapses.iter_mut().for_each(|i| { i.deliver(time); });

        let dv = self.voltage_derivatives();
        self.statistics.derivative_evaluations += 1;

        for compartment in self.compartments.iter_mut() {
            compartment.update_internal_states(dt);
        }
        self.synapses.iter_mut().for_each(|i| i.update(dt));

        for (compartment, dv_dt) in self.compartments.iter_mut().zip(dv.iter()) {
            compartment.voltage += dv_dt * dt;
        }

        self.time += dt;

        if let Some(n) = self.compartments.iter().position(|i| !i.is_finite()) {
            return Err(SimulationError::NumericalFailure { cell: self.id, compartment: n, time: self.time });
        }

        self.statistics.accepted_steps += 1;

        let now = self.time;
        let mut spike = None;
        for (n, compartment) in self.compartments.iter_mut().enumerate() {
            let crossed = compartment.ap_detector.check(compartment.voltage, now);
            if crossed && n == 0 {
                spike = Some(now);
            }
            if let Some(trace) = compartment.trace.as_mut() {
                trace.push(now, compartment.voltage);
            }
        }

        Ok(spike)
    }
}
