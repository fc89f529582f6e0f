//! Gating variables described either by forward/backward rate constants or by
//! steady state and time constant functions of voltage (and calcium).

use std::fmt::{Debug, Formatter};
use crate::error::GateError;


/// A rate expression evaluated with the owning channel's mutable kinetic parameters,
/// the membrane voltage (mV) and the local calcium concentration (mM)
pub type RateFunction<P> = fn(&P, f64, f64) -> f64;

/// Steady state and time constant (ms) of a gate at a given voltage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateRates {
    /// Steady state value
    pub inf: f64,
    /// Time constant (ms)
    pub tau: f64,
}

/// Calculates `x / (exp(x / y) - 1)` and falls back to its series expansion
/// when `x / y` is close to zero
pub fn linoid(x: f64, y: f64) -> f64 {
    let ratio = x / y;
    if ratio.abs() < 1e-6 {
        y * (1. - ratio / 2.)
    } else {
        x / (ratio.exp() - 1.)
    }
}

/// Parameterization of a gate, exactly one form is ever constructed
pub enum RateForm<P> {
    /// Forward and backward rate constants (1/ms)
    AlphaBeta {
        alpha: RateFunction<P>,
        beta: RateFunction<P>,
    },
    /// Steady state and time constant (ms)
    SteadyState {
        inf: RateFunction<P>,
        tau: RateFunction<P>,
    },
}

impl<P> Clone for RateForm<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for RateForm<P> {}

impl<P> Debug for RateForm<P> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            RateForm::AlphaBeta { .. } => write!(f, "AlphaBeta"),
            RateForm::SteadyState { .. } => write!(f, "SteadyState"),
        }
    }
}

/// Unvalidated gate description, use [`GateDefinition::build`] to check it
/// before a channel is constructed
pub struct GateDefinition<P> {
    /// Name of the gate
    pub name: &'static str,
    /// Power the state is raised to in the conductance product
    pub exponent: u32,
    /// Forward rate
    pub alpha: Option<RateFunction<P>>,
    /// Backward rate
    pub beta: Option<RateFunction<P>>,
    /// Steady state
    pub inf: Option<RateFunction<P>>,
    /// Time constant
    pub tau: Option<RateFunction<P>>,
}

impl<P> GateDefinition<P> {
    /// Creates a gate with no rate functions
    pub fn new(name: &'static str, exponent: u32) -> Self {
        GateDefinition { name, exponent, alpha: None, beta: None, inf: None, tau: None }
    }

    /// Sets the forward and backward rate functions
    pub fn alpha_beta(mut self, alpha: RateFunction<P>, beta: RateFunction<P>) -> Self {
        self.alpha = Some(alpha);
        self.beta = Some(beta);
        self
    }

    /// Sets the steady state and time constant functions
    pub fn inf_tau(mut self, inf: RateFunction<P>, tau: RateFunction<P>) -> Self {
        self.inf = Some(inf);
        self.tau = Some(tau);
        self
    }

    /// Checks that exactly one parameterization is given and that the exponent is valid
    pub fn build(&self) -> Result<GateKinetics<P>, GateError> {
        if self.exponent == 0 {
            return Err(GateError::InvalidExponent(self.name.to_string()));
        }

        let has_rates = self.alpha.is_some() || self.beta.is_some();
        let has_steady_state = self.inf.is_some() || self.tau.is_some();

        let form = match (has_rates, has_steady_state) {
            (true, true) => return Err(GateError::BothParameterizations(self.name.to_string())),
            (false, false) => return Err(GateError::MissingParameterization(self.name.to_string())),
            (true, false) => match (self.alpha, self.beta) {
                (Some(alpha), Some(beta)) => RateForm::AlphaBeta { alpha, beta },
                _ => return Err(GateError::IncompleteParameterization(self.name.to_string())),
            },
            (false, true) => match (self.inf, self.tau) {
                (Some(inf), Some(tau)) => RateForm::SteadyState { inf, tau },
                _ => return Err(GateError::IncompleteParameterization(self.name.to_string())),
            },
        };

        Ok(GateKinetics { name: self.name, exponent: self.exponent, form })
    }
}

/// Validated gate kinetics
pub struct GateKinetics<P> {
    /// Name of the gate
    pub name: &'static str,
    /// Power the state is raised to in the conductance product
    pub exponent: u32,
    /// Rate functions
    pub form: RateForm<P>,
}

impl<P> Clone for GateKinetics<P> {
    fn clone(&self) -> Self {
        GateKinetics { name: self.name, exponent: self.exponent, form: self.form }
    }
}

impl<P> Debug for GateKinetics<P> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("GateKinetics")
            .field("name", &self.name)
            .field("exponent", &self.exponent)
            .field("form", &self.form)
            .finish()
    }
}

impl<P> GateKinetics<P> {
    /// Returns the forward and backward rates if the gate is written in that form
    pub fn alpha_beta(&self, params: &P, voltage: f64, calcium: f64) -> Option<(f64, f64)> {
        match self.form {
            RateForm::AlphaBeta { alpha, beta } => Some(
                (alpha(params, voltage, calcium), beta(params, voltage, calcium))
            ),
            RateForm::SteadyState { .. } => None,
        }
    }

    /// Calculates steady state and time constant, for rate based gates
    /// `inf = alpha / (alpha + beta)` and `tau = 1 / (alpha + beta)`
    pub fn rates(&self, params: &P, voltage: f64, calcium: f64) -> GateRates {
        match self.form {
            RateForm::AlphaBeta { alpha, beta } => {
                let a = alpha(params, voltage, calcium);
                let b = beta(params, voltage, calcium);

                GateRates { inf: a / (a + b), tau: 1. / (a + b) }
            },
            RateForm::SteadyState { inf, tau } => GateRates {
                inf: inf(params, voltage, calcium),
                tau: tau(params, voltage, calcium),
            },
        }
    }

    /// Steady state value at the given voltage and calcium
    pub fn steady_state(&self, params: &P, voltage: f64, calcium: f64) -> f64 {
        self.rates(params, voltage, calcium).inf
    }

    /// Time constant (ms) at the given voltage and calcium
    pub fn time_constant(&self, params: &P, voltage: f64, calcium: f64) -> f64 {
        self.rates(params, voltage, calcium).tau
    }

    /// `d(state)/dt = (inf - state) / tau`
    pub fn derivative(&self, params: &P, voltage: f64, calcium: f64, state: f64) -> f64 {
        let GateRates { inf, tau } = self.rates(params, voltage, calcium);

        (inf - state) / tau
    }

    /// Advances the state by `dt` holding voltage and calcium fixed over the step
    pub fn advance(&self, params: &P, voltage: f64, calcium: f64, state: f64, dt: f64) -> f64 {
        let GateRates { inf, tau } = self.rates(params, voltage, calcium);

        inf + (state - inf) * (-dt / tau).exp()
    }
}

/// State of a single gate in a channel instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatingVariable {
    /// Name of the gate
    pub name: &'static str,
    /// Power the state is raised to in the conductance product
    pub exponent: u32,
    /// Current state value
    pub state: f64,
}

impl GatingVariable {
    /// State raised to the gate exponent
    pub fn open_fraction(&self) -> f64 {
        self.state.powi(self.exponent as i32)
    }
}
