//! Spike and voltage trace writers, each wraps any [`Write`] and flushes after
//! every cell so partial output survives a failed run.

use std::io::Write;
use crate::error::SimulationError;
use crate::neuron::cell::Cell;


fn output_error(err: std::io::Error) -> SimulationError {
    SimulationError::Output(err.to_string())
}

/// Writes soma spike times as `<id> <time> "<label>"`
#[derive(Debug)]
pub struct SpikeWriter<W: Write> {
    writer: W,
    /// Lines written so far
    pub spikes: usize,
}

impl<W: Write> SpikeWriter<W> {
    pub fn new(writer: W) -> Self {
        SpikeWriter { writer, spikes: 0 }
    }

    /// Writes a single spike
    pub fn write_spike(&mut self, id: usize, time: f64, label: &str) -> Result<(), SimulationError> {
        writeln!(self.writer, "{} {} \"{}\"", id, time, label).map_err(output_error)?;
        self.spikes += 1;

        Ok(())
    }

    /// Writes every recorded soma spike of the cell
    pub fn write_cell(&mut self, cell: &Cell) -> Result<(), SimulationError> {
        for time in cell.soma().ap_detector.times.iter() {
            self.write_spike(cell.id, *time, cell.cell_type.label())?;
        }

        self.writer.flush().map_err(output_error)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Writes voltage samples as `<id> <compartment> <time> <value>`
#[derive(Debug)]
pub struct TraceWriter<W: Write> {
    writer: W,
    /// Lines written so far
    pub samples: usize,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(writer: W) -> Self {
        TraceWriter { writer, samples: 0 }
    }

    /// Writes a single sample
    pub fn write_sample(
        &mut self, id: usize, compartment: usize, time: f64, value: f64,
    ) -> Result<(), SimulationError> {
        writeln!(self.writer, "{} {} {} {}", id, compartment, time, value).map_err(output_error)?;
        self.samples += 1;

        Ok(())
    }

    /// Writes the trace of every traced compartment of the cell
    pub fn write_cell(&mut self, cell: &Cell) -> Result<(), SimulationError> {
        for (n, compartment) in cell.compartments.iter().enumerate() {
            let trace = match &compartment.trace {
                Some(trace) => trace,
                None => continue,
            };

            for (time, voltage) in trace.times.iter().zip(trace.voltages.iter()) {
                self.write_sample(cell.id, n, *time, *voltage)?;
            }
        }

        self.writer.flush().map_err(output_error)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
