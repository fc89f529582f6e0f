//! Flattened state and derivative vectors of a cell for use by an external
//! integrator. The layout is, per compartment in order, the voltage, the gate
//! states of each installed channel (ordered by [`ChannelType`]) and the
//! calcium states, followed by `A` and `B` of every synapse.
//!
//! [`ChannelType`]: super::ion_channels::ChannelType

use ndarray::Array1;
use crate::error::SimulationError;
use super::cell::Cell;


/// A model whose state can be read, written and differentiated as a flat vector
pub trait SolverModel {
    /// Number of state variables
    fn state_len(&self) -> usize;
    /// Current state
    fn state(&self) -> Array1<f64>;
    /// Overwrites the state, fails if the length does not match
    fn set_state(&mut self, state: &Array1<f64>) -> Result<(), SimulationError>;
    /// Time derivative of the state
    fn derivatives(&self) -> Array1<f64>;
}

impl SolverModel for Cell {
    fn state_len(&self) -> usize {
        Cell::state_len(self)
    }

    fn state(&self) -> Array1<f64> {
        let mut state = Vec::with_capacity(Cell::state_len(self));

        for compartment in self.compartments.iter() {
            state.push(compartment.voltage);
            for channel in compartment.channels.values() {
                state.extend(channel.gates().iter().map(|i| i.state));
            }
            if let Some(pool) = &compartment.calcium {
                state.extend(pool.state());
            }
        }

        for synapse in self.synapses.iter() {
            state.push(synapse.a);
            state.push(synapse.b);
        }

        Array1::from(state)
    }

    fn set_state(&mut self, state: &Array1<f64>) -> Result<(), SimulationError> {
        let expected = Cell::state_len(self);
        if state.len() != expected {
            return Err(SimulationError::StateLength { expected, found: state.len() });
        }

        let mut values = state.iter().copied();
        let mut next = || values.next().unwrap_or(0.);

        for compartment in self.compartments.iter_mut() {
            compartment.voltage = next();
            for channel in compartment.channels.values_mut() {
                for gate in channel.gates_mut() {
                    gate.state = next();
                }
            }
            if let Some(pool) = compartment.calcium.as_mut() {
                let pool_state: Vec<f64> = (0..pool.state_len()).map(|_| next()).collect();
                pool.set_state(&pool_state);
            }
        }

        for synapse in self.synapses.iter_mut() {
            synapse.a = next();
            synapse.b = next();
        }

        Ok(())
    }

    fn derivatives(&self) -> Array1<f64> {
        let voltage_derivatives = self.voltage_derivatives();
        let mut derivatives = Vec::with_capacity(Cell::state_len(self));

        for (compartment, dv_dt) in self.compartments.iter().zip(voltage_derivatives) {
            derivatives.push(dv_dt);

            let calcium = compartment.calcium_concentration();
            for channel in compartment.channels.values() {
                derivatives.extend(channel.gate_derivatives(compartment.voltage, calcium));
            }
            if let Some(pool) = &compartment.calcium {
                derivatives.extend(pool.derivatives(&compartment.channel_currents()));
            }
        }

        for synapse in self.synapses.iter() {
            derivatives.extend(synapse.derivatives());
        }

        Array1::from(derivatives)
    }
}
