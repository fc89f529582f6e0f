//! Conductance based ion channels built from [`ChannelKinetics`] families, channels
//! combine their gates by an exponent product and drive a linear or
//! Goldman-Hodgkin-Katz current.

use crate::error::ChannelError;
use super::calcium::CalciumSpecies;
use super::gating::{GateKinetics, GatingVariable};
use super::kinetics::{
    ChannelKinetics, KineticParameters, CELSIUS, SodiumKinetics, SlowSodiumKinetics,
    FastDelayedRectifierKinetics, SlowDelayedRectifierKinetics, ATypeKinetics,
    FastHKinetics, SlowHKinetics, TTypeCalciumKinetics, NTypeCalciumKinetics,
    LTypeCalciumKinetics, BkKinetics, SkKinetics,
};


/// Tag a channel is stored under within a compartment, at most one channel
/// per tag is ever installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelType {
    /// Sodium, either fast or slow inactivating
    Na,
    /// Fast delayed rectifier potassium
    Kdrf,
    /// Slow delayed rectifier potassium
    Kdrs,
    /// A type potassium
    Ka,
    /// Fast hyperpolarization activated
    Ihf,
    /// Slow hyperpolarization activated
    Ihs,
    /// T type calcium
    CaT,
    /// N type calcium
    CaN,
    /// L type calcium
    CaL,
    /// BK potassium
    Kbk,
    /// SK potassium
    Ksk,
}

impl ChannelType {
    /// Every channel type in installation order
    pub const ALL: [ChannelType; 11] = [
        ChannelType::Na, ChannelType::Kdrf, ChannelType::Kdrs, ChannelType::Ka,
        ChannelType::Ihf, ChannelType::Ihs, ChannelType::CaT, ChannelType::CaN,
        ChannelType::CaL, ChannelType::Kbk, ChannelType::Ksk,
    ];

    /// Returns the calcium species the channel feeds if it is calcium permeable
    pub fn calcium_species(&self) -> Option<CalciumSpecies> {
        match self {
            ChannelType::CaT => Some(CalciumSpecies::T),
            ChannelType::CaN => Some(CalciumSpecies::N),
            ChannelType::CaL => Some(CalciumSpecies::L),
            _ => None,
        }
    }

    /// Short name of the channel type
    pub fn name(&self) -> &'static str {
        match self {
            ChannelType::Na => "Na",
            ChannelType::Kdrf => "Kdrf",
            ChannelType::Kdrs => "Kdrs",
            ChannelType::Ka => "Ka",
            ChannelType::Ihf => "Ihf",
            ChannelType::Ihs => "Ihs",
            ChannelType::CaT => "CaT",
            ChannelType::CaN => "CaN",
            ChannelType::CaL => "CaL",
            ChannelType::Kbk => "Kbk",
            ChannelType::Ksk => "Ksk",
        }
    }
}

/// Calculates `z / (exp(z) - 1)` using its series expansion near zero
pub fn efun(z: f64) -> f64 {
    if z.abs() < 1e-4 {
        1. - z / 2.
    } else {
        z / (z.exp() - 1.)
    }
}

/// Parameters of Goldman-Hodgkin-Katz rectification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GhkRectification {
    /// Valence of the permeant ion
    pub valence: f64,
    /// Extracellular concentration (mM)
    pub extracellular: f64,
    /// Temperature (degrees C)
    pub celsius: f64,
}

impl Default for GhkRectification {
    fn default() -> Self {
        GhkRectification {
            valence: 2.,
            extracellular: 2., // mM
            celsius: CELSIUS,
        }
    }
}

impl GhkRectification {
    /// `KT/zF` in mV
    pub fn thermal_voltage(&self) -> f64 {
        (25. * (self.celsius + 273.15) / 293.15) / self.valence
    }

    /// Rectified driving term (mV) given voltage (mV) and internal concentration (mM),
    /// `-f * (1 - (ci / co) * exp(V / f)) * efun(V / f)`
    pub fn driving_force(&self, voltage: f64, internal: f64) -> f64 {
        let f = self.thermal_voltage();
        let nu = voltage / f;

        -f * (1. - (internal / self.extracellular) * nu.exp()) * efun(nu)
    }
}

/// How the channel's conductance is turned into a current
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrivingForce {
    /// `V - E`
    Linear,
    /// Goldman-Hodgkin-Katz rectification
    Ghk(GhkRectification),
}

/// A conductance based ion channel with gating defined by a kinetics family
#[derive(Debug, Clone)]
pub struct ConductanceChannel<K: ChannelKinetics> {
    /// Mutable kinetic parameters
    pub kinetics: K,
    /// Validated gate kinetics
    pub gates: Vec<GateKinetics<K>>,
    /// Gate states in the same order as `gates`
    pub states: Vec<GatingVariable>,
    /// Maximum conductance (S)
    pub g_max: f64,
    /// Reversal potential (mV)
    pub e_rev: f64,
    /// Linear or rectified driving force
    pub driving_force: DrivingForce,
    /// Last calculated current (mA)
    pub current: f64,
}

impl<K: ChannelKinetics> ConductanceChannel<K> {
    /// Builds the channel, failing if any gate definition is malformed or if
    /// the maximum conductance is negative or not finite
    pub fn new(kinetics: K, g_max: f64, e_rev: f64, driving_force: DrivingForce) -> Result<Self, ChannelError> {
        if !g_max.is_finite() || g_max < 0. {
            return Err(ChannelError::InvalidConductance(K::description().to_string(), g_max));
        }

        let gates = K::gate_definitions()
            .iter()
            .map(|definition| definition.build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ChannelError::MalformedGate(K::description().to_string(), err))?;

        let states = gates.iter()
            .map(|gate| GatingVariable { name: gate.name, exponent: gate.exponent, state: 0. })
            .collect();

        Ok(ConductanceChannel { kinetics, gates, states, g_max, e_rev, driving_force, current: 0. })
    }

    /// Sets every gate to its initial value at the given voltage (mV) and calcium (mM)
    pub fn initialize(&mut self, voltage: f64, calcium: f64) {
        for (gate, variable) in self.gates.iter().zip(self.states.iter_mut()) {
            variable.state = self.kinetics.initial_state(gate, voltage, calcium);
        }
    }

    /// `g_max * prod(state^exponent)`, scaled by any calcium dependence (S)
    pub fn conductance(&self, calcium: f64) -> f64 {
        let open: f64 = self.states.iter()
            .map(|i| i.open_fraction())
            .product();

        self.g_max * open * self.kinetics.conductance_factor(calcium)
    }

    /// Driving force (mV) at the given voltage and internal calcium
    pub fn driving_term(&self, voltage: f64, calcium: f64) -> f64 {
        match &self.driving_force {
            DrivingForce::Linear => voltage - self.e_rev,
            DrivingForce::Ghk(ghk) => ghk.driving_force(voltage, calcium),
        }
    }

    /// Calculates the current (mA, outward positive) and stores it
    pub fn update_current(&mut self, voltage: f64, calcium: f64) -> f64 {
        self.current = self.conductance(calcium) * self.driving_term(voltage, calcium);

        self.current
    }

    /// Current (mA, outward positive) without storing it
    pub fn get_current(&self, voltage: f64, calcium: f64) -> f64 {
        self.conductance(calcium) * self.driving_term(voltage, calcium)
    }

    /// Time derivatives of each gate state
    pub fn gate_derivatives(&self, voltage: f64, calcium: f64) -> Vec<f64> {
        self.gates.iter()
            .zip(self.states.iter())
            .map(|(gate, variable)| gate.derivative(&self.kinetics, voltage, calcium, variable.state))
            .collect()
    }

    /// Advances each gate state by `dt` (ms) with exponential Euler
    pub fn update_gates(&mut self, voltage: f64, calcium: f64, dt: f64) {
        for (gate, variable) in self.gates.iter().zip(self.states.iter_mut()) {
            variable.state = gate.advance(&self.kinetics, voltage, calcium, variable.state, dt);
        }
    }
}

/// Slow sodium conductance is normalized by the resting slow inactivation, the
/// `s` gate must be defined
pub fn slow_sodium_scale(kinetics: &SlowSodiumKinetics, resting_potential: f64) -> Result<f64, ChannelError> {
    let channel = ConductanceChannel::new(*kinetics, 0., 0., DrivingForce::Linear)?;

    channel.gates.iter()
        .find(|gate| gate.name == "s")
        .map(|gate| gate.steady_state(kinetics, resting_potential, 0.))
        .ok_or_else(|| ChannelError::MissingGate(SlowSodiumKinetics::description().to_string(), String::from("s")))
}

/// Any of the channel families that can be installed in a compartment
#[derive(Debug, Clone)]
pub enum IonChannel {
    /// Fast inactivating sodium
    Na(ConductanceChannel<SodiumKinetics>),
    /// Sodium with slow inactivation
    NaSlow(ConductanceChannel<SlowSodiumKinetics>),
    /// Fast delayed rectifier potassium
    Kdrf(ConductanceChannel<FastDelayedRectifierKinetics>),
    /// Slow delayed rectifier potassium
    Kdrs(ConductanceChannel<SlowDelayedRectifierKinetics>),
    /// A type potassium
    Ka(ConductanceChannel<ATypeKinetics>),
    /// Fast hyperpolarization activated
    Ihf(ConductanceChannel<FastHKinetics>),
    /// Slow hyperpolarization activated
    Ihs(ConductanceChannel<SlowHKinetics>),
    /// T type calcium
    CaT(ConductanceChannel<TTypeCalciumKinetics>),
    /// N type calcium
    CaN(ConductanceChannel<NTypeCalciumKinetics>),
    /// L type calcium
    CaL(ConductanceChannel<LTypeCalciumKinetics>),
    /// BK potassium
    Kbk(ConductanceChannel<BkKinetics>),
    /// SK potassium
    Ksk(ConductanceChannel<SkKinetics>),
}

macro_rules! dispatch_channel {
    ($self:expr, $channel:ident => $body:expr) => {
        match $self {
            IonChannel::Na($channel) => $body,
            IonChannel::NaSlow($channel) => $body,
            IonChannel::Kdrf($channel) => $body,
            IonChannel::Kdrs($channel) => $body,
            IonChannel::Ka($channel) => $body,
            IonChannel::Ihf($channel) => $body,
            IonChannel::Ihs($channel) => $body,
            IonChannel::CaT($channel) => $body,
            IonChannel::CaN($channel) => $body,
            IonChannel::CaL($channel) => $body,
            IonChannel::Kbk($channel) => $body,
            IonChannel::Ksk($channel) => $body,
        }
    };
}

macro_rules! impl_from_channel {
    ($kinetics:ident, $variant:ident) => {
        impl From<ConductanceChannel<$kinetics>> for IonChannel {
            fn from(channel: ConductanceChannel<$kinetics>) -> IonChannel {
                IonChannel::$variant(channel)
            }
        }
    };
}

impl_from_channel!(SodiumKinetics, Na);
impl_from_channel!(SlowSodiumKinetics, NaSlow);
impl_from_channel!(FastDelayedRectifierKinetics, Kdrf);
impl_from_channel!(SlowDelayedRectifierKinetics, Kdrs);
impl_from_channel!(ATypeKinetics, Ka);
impl_from_channel!(FastHKinetics, Ihf);
impl_from_channel!(SlowHKinetics, Ihs);
impl_from_channel!(TTypeCalciumKinetics, CaT);
impl_from_channel!(NTypeCalciumKinetics, CaN);
impl_from_channel!(LTypeCalciumKinetics, CaL);
impl_from_channel!(BkKinetics, Kbk);
impl_from_channel!(SkKinetics, Ksk);

fn channel_type_of<K: ChannelKinetics>(_: &ConductanceChannel<K>) -> ChannelType {
    K::CHANNEL_TYPE
}

fn description_of<K: ChannelKinetics>(_: &ConductanceChannel<K>) -> &'static str {
    K::description()
}

impl IonChannel {
    /// Tag the channel is stored under
    pub fn channel_type(&self) -> ChannelType {
        dispatch_channel!(self, channel => channel_type_of(channel))
    }

    /// Description of the kinetics family
    pub fn description(&self) -> &'static str {
        dispatch_channel!(self, channel => description_of(channel))
    }

    /// Maximum conductance (S)
    pub fn g_max(&self) -> f64 {
        dispatch_channel!(self, channel => channel.g_max)
    }

    /// Reversal potential (mV)
    pub fn e_rev(&self) -> f64 {
        dispatch_channel!(self, channel => channel.e_rev)
    }

    /// Last calculated current (mA)
    pub fn last_current(&self) -> f64 {
        dispatch_channel!(self, channel => channel.current)
    }

    /// Whether the current is rectified
    pub fn is_rectified(&self) -> bool {
        let driving_force = dispatch_channel!(self, channel => channel.driving_force);

        matches!(driving_force, DrivingForce::Ghk(_))
    }

    /// Sets gates to their initial values
    pub fn initialize(&mut self, voltage: f64, calcium: f64) {
        dispatch_channel!(self, channel => channel.initialize(voltage, calcium))
    }

    /// Instantaneous conductance (S)
    pub fn conductance(&self, calcium: f64) -> f64 {
        dispatch_channel!(self, channel => channel.conductance(calcium))
    }

    /// Calculates and stores the current (mA)
    pub fn update_current(&mut self, voltage: f64, calcium: f64) -> f64 {
        dispatch_channel!(self, channel => channel.update_current(voltage, calcium))
    }

    /// Current (mA) without storing it
    pub fn get_current(&self, voltage: f64, calcium: f64) -> f64 {
        dispatch_channel!(self, channel => channel.get_current(voltage, calcium))
    }

    /// Gate state derivatives
    pub fn gate_derivatives(&self, voltage: f64, calcium: f64) -> Vec<f64> {
        dispatch_channel!(self, channel => channel.gate_derivatives(voltage, calcium))
    }

    /// Advances gates by `dt` (ms)
    pub fn update_gates(&mut self, voltage: f64, calcium: f64, dt: f64) {
        dispatch_channel!(self, channel => channel.update_gates(voltage, calcium, dt))
    }

    /// Gate states
    pub fn gates(&self) -> &[GatingVariable] {
        dispatch_channel!(self, channel => channel.states.as_slice())
    }

    /// Mutable gate states
    pub fn gates_mut(&mut self) -> &mut [GatingVariable] {
        dispatch_channel!(self, channel => channel.states.as_mut_slice())
    }

    /// Mutable kinetic parameters by name
    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        dispatch_channel!(self, channel => channel.kinetics.parameters())
    }
}
