//! Human readable snapshots of a cell's state, rendered when a run fails.

use std::fmt::{Display, Formatter, Result};
use crate::neuron::{
    cell::{Cell, StepStatistics},
    solver::SolverModel,
};


/// State of one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSnapshot {
    pub name: &'static str,
    pub g_max: f64,
    pub current: f64,
    /// `(gate, state)`
    pub gates: Vec<(&'static str, f64)>,
    /// Mutable kinetic parameters
    pub parameters: Vec<(&'static str, f64)>,
}

/// State of one compartment
#[derive(Debug, Clone, PartialEq)]
pub struct CompartmentSnapshot {
    pub name: String,
    pub voltage: f64,
    pub calcium: Option<f64>,
    pub threshold: f64,
    pub channels: Vec<ChannelSnapshot>,
    /// Rendered synapses owned by the compartment
    pub synapses: Vec<String>,
}

/// Everything needed to diagnose a failed cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellSnapshot {
    pub id: usize,
    pub label: &'static str,
    pub time: f64,
    pub statistics: StepStatistics,
    pub compartments: Vec<CompartmentSnapshot>,
    /// Flattened state, see [`SolverModel::state`]
    pub state: Vec<f64>,
    /// Flattened derivatives, see [`SolverModel::derivatives`]
    pub derivatives: Vec<f64>,
}

impl CellSnapshot {
    pub fn capture(cell: &Cell) -> Self {
        let compartments = cell.compartments.iter()
            .enumerate()
            .map(|(n, compartment)| {
                let channels = compartment.channels.values()
                    .map(|channel| ChannelSnapshot {
                        name: channel.channel_type().name(),
                        g_max: channel.g_max(),
                        current: channel.last_current(),
                        gates: channel.gates().iter().map(|i| (i.name, i.state)).collect(),
                        parameters: channel.parameters(),
                    })
                    .collect();

                let synapses = cell.synapses.iter()
                    .filter(|i| i.compartment == n)
                    .map(|i| i.to_string())
                    .collect();

                CompartmentSnapshot {
                    name: compartment.name.clone(),
                    voltage: compartment.voltage,
                    calcium: compartment.calcium.as_ref().map(|pool| pool.total()),
                    threshold: compartment.ap_detector.threshold,
                    channels,
                    synapses,
                }
            })
            .collect();

        CellSnapshot {
            id: cell.id,
            label: cell.cell_type.label(),
            time: cell.time,
            statistics: cell.statistics,
            compartments,
            state: cell.state().to_vec(),
            derivatives: SolverModel::derivatives(cell).to_vec(),
        }
    }
}

impl Display for CellSnapshot {
    fn fmt(&self, f: &mut Formatter) -> Result {
        writeln!(
            f, "Dumping {}, id={}, time={}, steps={}/{} accepted, evaluations={}:",
            self.label, self.id, self.time,
            self.statistics.accepted_steps, self.statistics.total_steps,
            self.statistics.derivative_evaluations,
        )?;

        for compartment in self.compartments.iter() {
            write!(f, ": {} Em={} APthreshold={}", compartment.name, compartment.voltage, compartment.threshold)?;
            if let Some(ca) = compartment.calcium {
                write!(f, " Ca={}", ca)?;
            }
            writeln!(f)?;

            for channel in compartment.channels.iter() {
                write!(f, ":: {} Gmax={} I={}", channel.name, channel.g_max, channel.current)?;
                for (name, state) in channel.gates.iter() {
                    write!(f, " {}={}", name, state)?;
                }
                for (name, value) in channel.parameters.iter() {
                    write!(f, " {}={}", name, value)?;
                }
                writeln!(f)?;
            }

            for synapse in compartment.synapses.iter() {
                writeln!(f, "::  {}", synapse)?;
            }
        }

        for (n, (y, dydt)) in self.state.iter().zip(self.derivatives.iter()).enumerate() {
            writeln!(f, ":::   Y[{}]={} DYDT[{}]={}", n, y, n, dydt)?;
        }

        Ok(())
    }
}
