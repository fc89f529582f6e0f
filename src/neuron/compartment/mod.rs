//! Isopotential cylindrical compartments with leak, active channels, a calcium
//! pool and an axial link to their parent compartment.

use std::{collections::BTreeMap, f64::consts::PI};
use tracing::debug;
use crate::error::{ChannelError, CompartmentError};
use super::calcium::{CalciumMode, CalciumPool, DENSITY_SCALE};
use super::ion_channels::{
    ChannelType, ConductanceChannel, DrivingForce, GhkRectification, IonChannel,
    slow_sodium_scale,
};
use super::kinetics::{
    SodiumKinetics, SlowSodiumKinetics, FastDelayedRectifierKinetics,
    SlowDelayedRectifierKinetics, ATypeKinetics, FastHKinetics, SlowHKinetics,
    TTypeCalciumKinetics, NTypeCalciumKinetics, LTypeCalciumKinetics, BkKinetics,
    SkKinetics,
};


/// Sodium reversal potential (mV)
pub const E_NA: f64 = 55.;
/// Potassium reversal potential (mV)
pub const E_K: f64 = -90.;
/// Calcium reversal potential (mV)
pub const E_CA: f64 = 130.;
/// H current reversal potential (mV)
pub const E_H: f64 = -40.;

/// Passive properties and shape of a compartment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Diameter (um)
    pub diameter: f64,
    /// Length (um)
    pub length: f64,
    /// Axial resistivity (ohm cm)
    pub axial_resistivity: f64,
    /// Specific membrane capacitance (uF/cm^2)
    pub specific_capacitance: f64,
    /// Leak conductance density (mS/cm^2)
    pub leak_conductance: f64,
    /// Leak reversal and resting potential (mV)
    pub leak_potential: f64,
}

impl Geometry {
    /// Open cylinder surface area (m^2)
    pub fn area(&self) -> f64 {
        PI * (self.diameter * 1e-6) * (self.length * 1e-6)
    }

    /// Resistance from the center to either end of the compartment (ohm)
    pub fn half_resistance(&self) -> f64 {
        let diameter = self.diameter * 1e-6;

        (self.axial_resistivity * 1e-2) * (self.length * 1e-6 / 2.) / (PI * diameter * diameter / 4.)
    }

    /// Total capacitance scaled so that `dV/dt (mV/ms) = -I / capacitance`
    pub fn capacitance(&self) -> f64 {
        self.specific_capacitance * 1e-2 * self.area() * 1e3
    }

    /// Total leak conductance (S)
    pub fn leak(&self) -> f64 {
        self.leak_conductance * DENSITY_SCALE * self.area()
    }
}

/// Builds a [`Geometry`], the leak potential defaults to -70 mV
#[derive(Debug, Clone, Default)]
pub struct GeometryBuilder {
    diameter: Option<f64>,
    length: Option<f64>,
    axial_resistivity: Option<f64>,
    specific_capacitance: Option<f64>,
    leak_conductance: Option<f64>,
    leak_potential: Option<f64>,
}

macro_rules! geometry_setter {
    ($field:ident, $doc:expr) => {
        #[doc = $doc]
        pub fn $field(mut self, value: f64) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

impl GeometryBuilder {
    pub fn new() -> Self {
        GeometryBuilder::default()
    }

    geometry_setter!(diameter, "Sets diameter (um)");
    geometry_setter!(length, "Sets length (um)");
    geometry_setter!(axial_resistivity, "Sets axial resistivity (ohm cm)");
    geometry_setter!(specific_capacitance, "Sets specific capacitance (uF/cm^2)");
    geometry_setter!(leak_conductance, "Sets leak conductance density (mS/cm^2)");
    geometry_setter!(leak_potential, "Sets leak reversal potential (mV)");

    /// Checks every required field is present, positive and finite
    pub fn build(&self) -> Result<Geometry, CompartmentError> {
        fn positive(name: &str, value: Option<f64>) -> Result<f64, CompartmentError> {
            match value {
                None => Err(CompartmentError::MissingGeometry(name.to_string())),
                Some(x) if !x.is_finite() || x <= 0. => Err(CompartmentError::InvalidGeometry(name.to_string(), x)),
                Some(x) => Ok(x),
            }
        }

        let leak_potential = self.leak_potential.unwrap_or(-70.);
        if !leak_potential.is_finite() {
            return Err(CompartmentError::InvalidGeometry("leak_potential".to_string(), leak_potential));
        }

        Ok(Geometry {
            diameter: positive("diameter", self.diameter)?,
            length: positive("length", self.length)?,
            axial_resistivity: positive("axial_resistivity", self.axial_resistivity)?,
            specific_capacitance: positive("specific_capacitance", self.specific_capacitance)?,
            leak_conductance: match self.leak_conductance {
                None => return Err(CompartmentError::MissingGeometry("leak_conductance".to_string())),
                Some(g) if !g.is_finite() || g < 0. => {
                    return Err(CompartmentError::InvalidGeometry("leak_conductance".to_string(), g));
                },
                Some(g) => g,
            },
            leak_potential,
        })
    }
}

/// Channel densities (mS/cm^2) of a compartment, a channel is installed only
/// when its density is positive
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelDensities {
    pub g_na: f64,
    pub g_kdrf: f64,
    pub g_kdrs: f64,
    pub g_ka: f64,
    pub g_cat: f64,
    pub g_can: f64,
    pub g_cal: f64,
    pub g_bk: f64,
    pub g_sk: f64,
    /// Installs both fast and slow H currents
    pub g_ih: f64,
}

/// Link from a compartment to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxialLink {
    /// Index of the parent within the cell
    pub parent: usize,
    /// Coupling conductance (S)
    pub conductance: f64,
}

/// Coupling conductance between two adjacent compartments,
/// `1 / (r_half_a + r_half_b)` (S)
pub fn coupling_conductance(a: &Geometry, b: &Geometry) -> f64 {
    1. / (a.half_resistance() + b.half_resistance())
}

/// Current (mA) flowing from `from` into `to` through the given coupling conductance
pub fn axial_current(from_voltage: f64, to_voltage: f64, conductance: f64) -> f64 {
    (from_voltage - to_voltage) * conductance
}

/// Records one time per rising edge threshold crossing
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPotentialDetector {
    /// Threshold (mV)
    pub threshold: f64,
    /// Whether the voltage is currently above threshold
    pub above: bool,
    /// Recorded crossing times (ms)
    pub times: Vec<f64>,
}

impl Default for ActionPotentialDetector {
    fn default() -> Self {
        ActionPotentialDetector { threshold: 10., above: false, times: vec![] }
    }
}

impl ActionPotentialDetector {
    /// Returns true when the voltage crosses threshold from below, the detector
    /// re-arms only after the voltage falls back below threshold
    pub fn check(&mut self, voltage: f64, time: f64) -> bool {
        if voltage >= self.threshold {
            if !self.above {
                self.above = true;
                self.times.push(time);

                return true;
            }
        } else {
            self.above = false;
        }

        false
    }
}

/// Sampled voltage of a compartment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraceBuffer {
    /// Sample times (ms)
    pub times: Vec<f64>,
    /// Sample voltages (mV)
    pub voltages: Vec<f64>,
}

impl TraceBuffer {
    pub fn push(&mut self, time: f64, voltage: f64) {
        self.times.push(time);
        self.voltages.push(voltage);
    }

    pub fn clear(&mut self) {
        self.times.clear();
        self.voltages.clear();
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// An isopotential compartment
#[derive(Debug, Clone)]
pub struct Compartment {
    /// Name used in diagnostics
    pub name: String,
    /// Passive properties
    pub geometry: Geometry,
    /// Surface area (m^2)
    pub area: f64,
    /// Scaled capacitance, see [`Geometry::capacitance`]
    pub capacitance: f64,
    /// Total leak conductance (S)
    pub g_leak: f64,
    /// Membrane potential (mV)
    pub voltage: f64,
    /// Parent link, `None` for the soma
    pub parent: Option<AxialLink>,
    /// Installed channels, absent types have no entry
    pub channels: BTreeMap<ChannelType, IonChannel>,
    /// Calcium pool
    pub calcium: Option<CalciumPool>,
    /// Spike detection
    pub ap_detector: ActionPotentialDetector,
    /// Voltage trace, `None` when not tracing
    pub trace: Option<TraceBuffer>,
}

impl Compartment {
    /// Creates a passive compartment at its leak potential
    pub fn new(name: &str, geometry: Geometry) -> Self {
        Compartment {
            name: name.to_string(),
            geometry,
            area: geometry.area(),
            capacitance: geometry.capacitance(),
            g_leak: geometry.leak(),
            voltage: geometry.leak_potential,
            parent: None,
            channels: BTreeMap::new(),
            calcium: None,
            ap_detector: ActionPotentialDetector::default(),
            trace: None,
        }
    }

    /// Resting potential (mV)
    pub fn resting_potential(&self) -> f64 {
        self.geometry.leak_potential
    }

    /// Links the compartment to a parent
    pub fn connect(&mut self, parent_index: usize, parent: &Geometry) {
        self.parent = Some(AxialLink {
            parent: parent_index,
            conductance: coupling_conductance(&self.geometry, parent),
        });
    }

    /// Installs a channel, only one channel per [`ChannelType`] is allowed
    pub fn add_channel(&mut self, channel: IonChannel) -> Result<(), CompartmentError> {
        let channel_type = channel.channel_type();
        if self.channels.contains_key(&channel_type) {
            return Err(CompartmentError::DuplicateChannel(self.name.clone(), channel_type.name().to_string()));
        }

        if channel_type.calcium_species().is_some() {
            if let Some(pool) = self.calcium.as_mut() {
                pool.add_provider(channel_type);
            }
        }

        self.channels.insert(channel_type, channel);

        Ok(())
    }

    /// Returns the channel of the given type if installed
    pub fn channel(&self, channel_type: ChannelType) -> Option<&IonChannel> {
        self.channels.get(&channel_type)
    }

    /// Returns the channel of the given type mutably if installed
    pub fn channel_mut(&mut self, channel_type: ChannelType) -> Option<&mut IonChannel> {
        self.channels.get_mut(&channel_type)
    }

    /// Whether a channel of the given type is installed
    pub fn has_channel(&self, channel_type: ChannelType) -> bool {
        self.channels.contains_key(&channel_type)
    }

    /// Installs the calcium pool and every channel with a positive density at
    /// the resting potential, gates start at their initial values
    pub fn add_channels(
        &mut self, densities: &ChannelDensities, use_slow: bool, mode: CalciumMode,
    ) -> Result<(), CompartmentError> {
        let area = self.area * DENSITY_SCALE;
        let rest = self.resting_potential();
        let ghk = DrivingForce::Ghk(GhkRectification::default());

        let name = self.name.clone();
        let wrap = |err: ChannelError| CompartmentError::Channel(name.clone(), err);

        self.calcium = Some(CalciumPool::new(self.area, mode));

        let mut installed: Vec<IonChannel> = vec![];

        if densities.g_na > 0. {
            if use_slow {
                let kinetics = SlowSodiumKinetics::default();
                let scale = slow_sodium_scale(&kinetics, rest).map_err(wrap)?;
                installed.push(
                    ConductanceChannel::new(kinetics, densities.g_na * area / scale, E_NA, DrivingForce::Linear)
                        .map_err(wrap)?
                        .into()
                );
            } else {
                installed.push(
                    ConductanceChannel::new(SodiumKinetics, densities.g_na * area, E_NA, DrivingForce::Linear)
                        .map_err(wrap)?
                        .into()
                );
            }
        }

        macro_rules! install {
            ($density:expr, $kinetics:expr, $e_rev:expr, $driving_force:expr) => {
                if $density > 0. {
                    installed.push(
                        ConductanceChannel::new($kinetics, $density * area, $e_rev, $driving_force)
                            .map_err(wrap)?
                            .into()
                    );
                }
            };
        }

        install!(densities.g_kdrf, FastDelayedRectifierKinetics::default(), E_K, DrivingForce::Linear);
        install!(densities.g_kdrs, SlowDelayedRectifierKinetics::default(), E_K, DrivingForce::Linear);
        install!(densities.g_ka, ATypeKinetics::default(), E_K, DrivingForce::Linear);
        install!(densities.g_can, NTypeCalciumKinetics::default(), E_CA, ghk);
        install!(densities.g_cal, LTypeCalciumKinetics::default(), E_CA, ghk);
        install!(densities.g_cat, TTypeCalciumKinetics::default(), E_CA, ghk);
        install!(densities.g_bk, BkKinetics, E_K, DrivingForce::Linear);
        install!(densities.g_sk, SkKinetics, E_K, DrivingForce::Linear);
        install!(densities.g_ih, SlowHKinetics::default(), E_H, DrivingForce::Linear);
        install!(densities.g_ih, FastHKinetics::default(), E_H, DrivingForce::Linear);

        for channel in installed {
            self.add_channel(channel)?;
        }

        debug!(
            compartment = %self.name,
            channels = ?self.channels.keys().map(|i| i.name()).collect::<Vec<_>>(),
            "installed channels"
        );

        self.initialize();

        Ok(())
    }

    /// Total calcium concentration (mM), zero without a pool
    pub fn calcium_concentration(&self) -> f64 {
        self.calcium.as_ref().map_or(0., |pool| pool.total())
    }

    /// Resets voltage, calcium and gates to rest
    pub fn initialize(&mut self) {
        self.voltage = self.resting_potential();
        if let Some(pool) = self.calcium.as_mut() {
            pool.reset();
        }

        let calcium = self.calcium_concentration();
        let voltage = self.voltage;
        self.channels.values_mut()
            .for_each(|channel| channel.initialize(voltage, calcium));

        self.ap_detector.above = false;
        self.ap_detector.times.clear();
        if let Some(trace) = self.trace.as_mut() {
            trace.clear();
        }
    }

    /// Leak current (mA)
    pub fn leak_current(&self) -> f64 {
        self.g_leak * (self.voltage - self.resting_potential())
    }

    /// Sum of channel currents (mA) at the present state
    pub fn channel_current(&self) -> f64 {
        let calcium = self.calcium_concentration();

        self.channels.values()
            .map(|channel| channel.get_current(self.voltage, calcium))
            .sum()
    }

    /// Recalculates and stores every channel current, returns the sum (mA)
    pub fn update_channel_currents(&mut self) -> f64 {
        let calcium = self.calcium_concentration();
        let voltage = self.voltage;

        self.channels.values_mut()
            .map(|channel| channel.update_current(voltage, calcium))
            .sum()
    }

    /// Leak plus channel current (mA), outward positive
    pub fn membrane_current(&self) -> f64 {
        self.leak_current() + self.channel_current()
    }

    /// Current of each channel at the present state, used to feed the calcium pool
    pub fn channel_currents(&self) -> Vec<(ChannelType, f64)> {
        let calcium = self.calcium_concentration();

        self.channels.iter()
            .map(|(channel_type, channel)| (*channel_type, channel.get_current(self.voltage, calcium)))
            .collect()
    }

    /// Advances gates and the calcium pool by `dt` (ms) holding voltage fixed
    pub fn update_internal_states(&mut self, dt: f64) {
        let currents = self.channel_currents();
        let calcium = self.calcium_concentration();
        let voltage = self.voltage;

        self.channels.values_mut()
            .for_each(|channel| channel.update_gates(voltage, calcium, dt));

        if let Some(pool) = self.calcium.as_mut() {
            pool.update(&currents, dt);
        }
    }

    /// Number of gate and calcium state variables besides voltage
    pub fn internal_state_len(&self) -> usize {
        self.channels.values().map(|channel| channel.gates().len()).sum::<usize>() +
            self.calcium.as_ref().map_or(0, |pool| pool.state_len())
    }

    /// Whether voltage, gates and calcium are all finite
    pub fn is_finite(&self) -> bool {
        self.voltage.is_finite() &&
            self.channels.values().all(|channel| channel.gates().iter().all(|i| i.state.is_finite())) &&
            self.calcium.as_ref().map_or(true, |pool| pool.total().is_finite())
    }
}
