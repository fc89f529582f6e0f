//! Named kinetic overrides applied uniformly across every cell before a run,
//! channels a compartment does not express are skipped.

use std::fmt::{Display, Formatter, Result as FmtResult};
use crate::error::SweepError;
use crate::neuron::{
    cell::Cell,
    ion_channels::{ChannelType, IonChannel},
    kinetics::{KA_VHALF_L, KA_VHALF_N},
};


/// Every parameter name accepted by [`ParameterOverrides::set`]
pub const PARAMETER_NAMES: [&str; 18] = [
    "Vhalfnf", "Vhalfns", "Vhalfm", "Vhalfh", "Vhalfs", "Am", "Ah", "As", "Ggaba",
    "Vhalfma", "Vhalfha", "Vhalfmt", "Vhalfml", "Vhalfhf", "Vhalfhs", "Vhalfmn",
    "sprout", "duration",
];

/// Kinetic overrides together with the sweep level `sprout` and `duration`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterOverrides {
    /// Fast delayed rectifier activation shift (mV)
    pub vhalf_nf: f64,
    /// Slow delayed rectifier activation shift (mV)
    pub vhalf_ns: f64,
    /// Slow sodium activation shift (mV)
    pub vhalf_m: f64,
    /// Slow sodium inactivation shift (mV)
    pub vhalf_h: f64,
    /// Slow sodium slow inactivation shift (mV)
    pub vhalf_s: f64,
    /// Slow sodium activation rate scale
    pub a_m: f64,
    /// Slow sodium inactivation rate scale
    pub a_h: f64,
    /// Slow sodium slow inactivation rate scale
    pub a_s: f64,
    /// Scale of every inhibitory synapse's peak conductance
    pub g_gaba: f64,
    /// A type activation shift (mV)
    pub vhalf_ma: f64,
    /// A type inactivation shift (mV)
    pub vhalf_ha: f64,
    /// T type calcium activation shift (mV)
    pub vhalf_mt: f64,
    /// L type calcium activation shift (mV)
    pub vhalf_ml: f64,
    /// Fast h activation shift (mV)
    pub vhalf_hf: f64,
    /// Slow h activation shift (mV)
    pub vhalf_hs: f64,
    /// N type calcium activation shift (mV)
    pub vhalf_mn: f64,
    /// Granule to granule connection probability
    pub sprout: f64,
    /// Run duration (ms)
    pub duration: f64,
}

impl Default for ParameterOverrides {
    fn default() -> Self {
        ParameterOverrides {
            vhalf_nf: 0.,
            vhalf_ns: 0.,
            vhalf_m: 0.,
            vhalf_h: 0.,
            vhalf_s: 0.,
            a_m: 1.,
            a_h: 1.,
            a_s: 1.,
            g_gaba: 1.,
            vhalf_ma: 0.,
            vhalf_ha: 0.,
            vhalf_mt: 0.,
            vhalf_ml: 0.,
            vhalf_hf: 0.,
            vhalf_hs: 0.,
            vhalf_mn: 0.,
            sprout: 0.,
            duration: 400.,
        }
    }
}

impl ParameterOverrides {
    fn field_mut(&mut self, name: &str) -> Option<&mut f64> {
        let field = match name {
            "Vhalfnf" => &mut self.vhalf_nf,
            "Vhalfns" => &mut self.vhalf_ns,
            "Vhalfm" => &mut self.vhalf_m,
            "Vhalfh" => &mut self.vhalf_h,
            "Vhalfs" => &mut self.vhalf_s,
            "Am" => &mut self.a_m,
            "Ah" => &mut self.a_h,
            "As" => &mut self.a_s,
            "Ggaba" => &mut self.g_gaba,
            "Vhalfma" => &mut self.vhalf_ma,
            "Vhalfha" => &mut self.vhalf_ha,
            "Vhalfmt" => &mut self.vhalf_mt,
            "Vhalfml" => &mut self.vhalf_ml,
            "Vhalfhf" => &mut self.vhalf_hf,
            "Vhalfhs" => &mut self.vhalf_hs,
            "Vhalfmn" => &mut self.vhalf_mn,
            "sprout" => &mut self.sprout,
            "duration" => &mut self.duration,
            _ => return None,
        };

        Some(field)
    }

    /// Sets a parameter by the name used on the command line
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), SweepError> {
        if !value.is_finite() {
            return Err(SweepError::InvalidValue(name.to_string(), value.to_string()));
        }

        match self.field_mut(name) {
            Some(field) => {
                *field = value;

                Ok(())
            },
            None => Err(SweepError::UnknownParameter(name.to_string())),
        }
    }

    /// Reads a parameter by name
    pub fn get(&self, name: &str) -> Option<f64> {
        let mut copy = *self;

        copy.field_mut(name).map(|i| *i)
    }
}

impl Display for ParameterOverrides {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let values: Vec<String> = PARAMETER_NAMES.iter()
            .filter_map(|name| self.get(name).map(|value| format!("{}={}", name, value)))
            .collect();

        write!(f, "{}", values.join(" "))
    }
}

fn apply_to_channel(channel: &mut IonChannel, overrides: &ParameterOverrides) {
    match channel {
        IonChannel::NaSlow(na) => {
            na.kinetics.vhalf_m = overrides.vhalf_m;
            na.kinetics.vhalf_h = overrides.vhalf_h;
            na.kinetics.vhalf_s = overrides.vhalf_s;
            na.kinetics.a_m = overrides.a_m;
            na.kinetics.a_h = overrides.a_h;
            na.kinetics.a_s = overrides.a_s;
        },
        IonChannel::Kdrf(kdrf) => kdrf.kinetics.vhalf_n = overrides.vhalf_nf,
        IonChannel::Kdrs(kdrs) => kdrs.kinetics.vhalf_n = overrides.vhalf_ns,
        IonChannel::Ka(ka) => {
            ka.kinetics.vhalf_n = KA_VHALF_N - overrides.vhalf_ma;
            ka.kinetics.vhalf_l = KA_VHALF_L - overrides.vhalf_ha;
        },
        IonChannel::Ihf(ihf) => ihf.kinetics.vhalf_hf = overrides.vhalf_hf,
        IonChannel::Ihs(ihs) => ihs.kinetics.vhalf_hs = overrides.vhalf_hs,
        IonChannel::CaL(cal) => cal.kinetics.vhalf_ml = overrides.vhalf_ml,
        IonChannel::CaN(can) => can.kinetics.vhalf_mn = overrides.vhalf_mn,
        IonChannel::CaT(cat) => cat.kinetics.vhalf_mt = overrides.vhalf_mt,
        // fast sodium, bk and sk have no mutable kinetics
        IonChannel::Na(_) | IonChannel::Kbk(_) | IonChannel::Ksk(_) => {},
    }
}

/// Writes the overrides into every channel and inhibitory synapse of the given
/// cells, values are absolute so applying twice is the same as applying once
pub fn apply_overrides(cells: &mut [Cell], overrides: &ParameterOverrides) {
    for cell in cells.iter_mut() {
        for compartment in cell.compartments.iter_mut() {
            for channel_type in ChannelType::ALL {
                if let Some(channel) = compartment.channel_mut(channel_type) {
                    apply_to_channel(channel, overrides);
                }
            }
        }

        for synapse in cell.synapses.iter_mut().filter(|i| i.is_gabaergic()) {
            synapse.g_max = synapse.base_g_max * overrides.g_gaba;
        }
    }
}
