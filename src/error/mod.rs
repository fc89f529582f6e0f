use std::fmt::{Display, Debug, Formatter, Result};


/// Error set for malformed gating variable definitions
#[derive(Clone, PartialEq)]
pub enum GateError {
    /// Gate defines both an alpha/beta pair and a steady state/time constant pair
    BothParameterizations(String),
    /// Gate defines neither an alpha/beta pair nor a steady state/time constant pair
    MissingParameterization(String),
    /// Gate only defines half of a rate pair (for example alpha without beta)
    IncompleteParameterization(String),
    /// Gate exponent must be at least one
    InvalidExponent(String),
}

impl Display for GateError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            GateError::BothParameterizations(gate) => write!(
                f, "Gate '{}' sets both alpha/beta and inf/tau rate functions", gate
            ),
            GateError::MissingParameterization(gate) => write!(
                f, "Gate '{}' sets neither alpha/beta nor inf/tau rate functions", gate
            ),
            GateError::IncompleteParameterization(gate) => write!(
                f, "Gate '{}' only sets one function of a rate pair", gate
            ),
            GateError::InvalidExponent(gate) => write!(
                f, "Gate '{}' must have an exponent of at least 1", gate
            ),
        }
    }
}

impl Debug for GateError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for channel construction
#[derive(Clone, PartialEq)]
pub enum ChannelError {
    /// A gate of the named channel is malformed
    MalformedGate(String, GateError),
    /// Maximum conductance is negative or not finite
    InvalidConductance(String, f64),
    /// The named channel does not define a gate it requires
    MissingGate(String, String),
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ChannelError::MalformedGate(channel, err) => write!(f, "Channel '{}': {}", channel, err),
            ChannelError::InvalidConductance(channel, g) => write!(
                f, "Channel '{}' has an invalid maximum conductance ({})", channel, g
            ),
            ChannelError::MissingGate(channel, gate) => write!(
                f, "Channel '{}' has no '{}' gate", channel, gate
            ),
        }
    }
}

impl Debug for ChannelError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for compartment construction
#[derive(Clone, PartialEq)]
pub enum CompartmentError {
    /// A required geometry field was never given
    MissingGeometry(String),
    /// A geometry field is zero, negative or not finite
    InvalidGeometry(String, f64),
    /// Channel construction failed inside the named compartment
    Channel(String, ChannelError),
    /// A channel of the same type is already installed in the named compartment
    DuplicateChannel(String, String),
}

impl Display for CompartmentError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            CompartmentError::MissingGeometry(field) => write!(f, "Missing geometry field '{}'", field),
            CompartmentError::InvalidGeometry(field, value) => write!(
                f, "Geometry field '{}' must be positive and finite, got {}", field, value
            ),
            CompartmentError::Channel(compartment, err) => write!(f, "Compartment '{}': {}", compartment, err),
            CompartmentError::DuplicateChannel(compartment, channel) => write!(
                f, "Compartment '{}' already has a {} channel", compartment, channel
            ),
        }
    }
}

impl Debug for CompartmentError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for cell construction and lookups
#[derive(Clone, PartialEq)]
pub enum CellError {
    /// Compartment failed to build
    Compartment(String, CompartmentError),
    /// Compartment index not in cell
    CompartmentNotFound(usize),
    /// Synapse index not in cell
    SynapseNotFound(usize),
    /// Compartment tree is not rooted at the soma or contains a cycle
    InvalidTopology(String),
}

impl Display for CellError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            CellError::Compartment(cell, err) => write!(f, "{}: {}", cell, err),
            CellError::CompartmentNotFound(index) => write!(f, "Compartment {} not found", index),
            CellError::SynapseNotFound(index) => write!(f, "Synapse {} not found", index),
            CellError::InvalidTopology(reason) => write!(f, "Invalid compartment tree: {}", reason),
        }
    }
}

impl Debug for CellError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for network wiring
#[derive(Clone, PartialEq)]
pub enum WiringError {
    /// Target cell index cannot be found
    TargetNotFound(usize),
    /// Synapse index cannot be found on the target cell
    SynapseNotFound(usize, usize),
    /// Probabilities must lie in `[0, 1]`
    InvalidProbability(f64),
    /// Population has no cells to draw targets from
    EmptyPopulation(String),
}

impl Display for WiringError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            WiringError::TargetNotFound(index) => write!(f, "Target cell {} not found", index),
            WiringError::SynapseNotFound(cell, synapse) => write!(
                f, "Synapse {} not found on cell {}", synapse, cell
            ),
            WiringError::InvalidProbability(p) => write!(f, "Probability must be within [0, 1], got {}", p),
            WiringError::EmptyPopulation(population) => write!(f, "Population '{}' has no cells", population),
        }
    }
}

impl Debug for WiringError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for failures during a run, identifies where the state went bad
#[derive(Clone, PartialEq)]
pub enum SimulationError {
    /// State became non-finite
    NumericalFailure {
        /// Cell identifier
        cell: usize,
        /// Compartment index within the cell
        compartment: usize,
        /// Simulation time (ms)
        time: f64,
    },
    /// Timestep must be positive and finite
    InvalidTimestep(f64),
    /// State vector does not match the model
    StateLength {
        /// Length the model expects
        expected: usize,
        /// Length given
        found: usize,
    },
    /// Writing trace or spike output failed
    Output(String),
}

impl Display for SimulationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            SimulationError::NumericalFailure { cell, compartment, time } => write!(
                f, "Numerical failure in cell {} compartment {} at t={} ms", cell, compartment, time
            ),
            SimulationError::InvalidTimestep(dt) => write!(f, "Invalid timestep {}", dt),
            SimulationError::StateLength { expected, found } => write!(
                f, "Expected a state of length {}, got {}", expected, found
            ),
            SimulationError::Output(err) => write!(f, "Output failed: {}", err),
        }
    }
}

impl Debug for SimulationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for the batch sweep driver
#[derive(Clone, PartialEq)]
pub enum SweepError {
    /// Token is not of the form `name=value`
    MalformedToken(String),
    /// Parameter name is not recognized
    UnknownParameter(String),
    /// Value cannot be parsed as a number
    InvalidValue(String, String),
    /// Run configuration is malformed
    Config(String),
}

impl Display for SweepError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            SweepError::MalformedToken(token) => write!(f, "Expected 'name=value', got '{}'", token),
            SweepError::UnknownParameter(name) => write!(f, "Unknown parameter '{}'", name),
            SweepError::InvalidValue(name, value) => write!(f, "Cannot parse '{}' as a value for '{}'", value, name),
            SweepError::Config(err) => write!(f, "Configuration error: {}", err),
        }
    }
}

impl Debug for SweepError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// A set of errors that may occur when using the library
#[derive(Clone, PartialEq)]
pub enum DentateGyrusError {
    /// Errors related to gate definitions
    GateRelatedError(GateError),
    /// Errors related to channels
    ChannelRelatedError(ChannelError),
    /// Errors related to compartments
    CompartmentRelatedError(CompartmentError),
    /// Errors related to cells
    CellRelatedError(CellError),
    /// Errors related to wiring
    WiringRelatedError(WiringError),
    /// Errors related to running the model
    SimulationRelatedError(SimulationError),
    /// Errors related to the sweep driver
    SweepRelatedError(SweepError),
}

impl Display for DentateGyrusError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            DentateGyrusError::GateRelatedError(err) => write!(f, "{}", err),
            DentateGyrusError::ChannelRelatedError(err) => write!(f, "{}", err),
            DentateGyrusError::CompartmentRelatedError(err) => write!(f, "{}", err),
            DentateGyrusError::CellRelatedError(err) => write!(f, "{}", err),
            DentateGyrusError::WiringRelatedError(err) => write!(f, "{}", err),
            DentateGyrusError::SimulationRelatedError(err) => write!(f, "{}", err),
            DentateGyrusError::SweepRelatedError(err) => write!(f, "{}", err),
        }
    }
}

impl Debug for DentateGyrusError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

impl std::error::Error for DentateGyrusError {}

macro_rules! impl_from_error {
    ($err:ident, $variant:ident) => {
        impl From<$err> for DentateGyrusError {
            fn from(err: $err) -> DentateGyrusError {
                DentateGyrusError::$variant(err)
            }
        }
    };
}

impl_from_error!(GateError, GateRelatedError);
impl_from_error!(ChannelError, ChannelRelatedError);
impl_from_error!(CompartmentError, CompartmentRelatedError);
impl_from_error!(CellError, CellRelatedError);
impl_from_error!(WiringError, WiringRelatedError);
impl_from_error!(SimulationError, SimulationRelatedError);
impl_from_error!(SweepError, SweepRelatedError);
