//! Kinetics of the dentate gyrus channel families, each family is a struct of the
//! per-instance parameters that can be shifted at runtime while the functional form
//! and the slope constants stay fixed per family.
//!
//! Most rate expressions are written relative to a family specific rest offset
//! (`+60` mV for the sodium family, `+65` mV for the delayed rectifiers).

use std::fmt::Debug;
pub use channel_kinetics_traits::KineticParameters;
use super::gating::{GateDefinition, GateKinetics, linoid};
use super::ion_channels::ChannelType;


/// Lists the mutable kinetic parameters of a channel family by name
pub trait KineticParameters {
    /// Name and current value of every parameter
    fn parameters(&self) -> Vec<(&'static str, f64)>;
}

/// A channel family: its gates, its tag and any calcium dependence of the conductance
pub trait ChannelKinetics: KineticParameters + Debug + Clone + Default + Send + Sync + 'static {
    /// Tag the channel is stored under inside a compartment
    const CHANNEL_TYPE: ChannelType;
    /// Short description
    fn description() -> &'static str;
    /// Ordered gate definitions
    fn gate_definitions() -> Vec<GateDefinition<Self>>;
    /// Additional multiplicative factor on the conductance (used for calcium dependent
    /// inactivation), defaults to `1`
    fn conductance_factor(&self, _calcium: f64) -> f64 {
        1.
    }

    /// Initial value of a gate before the first step, steady state at the
    /// given voltage and calcium unless overridden
    fn initial_state(&self, gate: &GateKinetics<Self>, voltage: f64, calcium: f64) -> f64 {
        gate.steady_state(self, voltage, calcium)
    }
}

/// Temperature the rate constants were fitted at (degrees C)
pub const CELSIUS: f64 = 6.3;

// sodium family, offset +60 mV

fn na_h_alpha(v: f64) -> f64 {
    0.23 / ((v + 60. + 5.) / 20.).exp()
}

fn na_h_beta(v: f64) -> f64 {
    3.33 / ((-(v + 60. - 47.5) / 10.).exp() + 1.)
}

fn na_m_alpha(v: f64) -> f64 {
    // -0.3 * (V+60-17) / (exp((V+60-17)/-5) - 1)
    -0.3 * linoid(v + 60. - 17., -5.)
}

fn na_m_beta(v: f64) -> f64 {
    0.3 * linoid(v + 60. - 45., 5.)
}

/// Fast sodium channel (`h`, `m^3`) with fixed kinetics
#[derive(Debug, Clone, Copy, Default, PartialEq, KineticParameters)]
pub struct SodiumKinetics;

impl ChannelKinetics for SodiumKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::Na;

    fn description() -> &'static str {
        "Na: Na model"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("h", 1).alpha_beta(
                |_, v, _| na_h_alpha(v),
                |_, v, _| na_h_beta(v),
            ),
            GateDefinition::new("m", 3).alpha_beta(
                |_, v, _| na_m_alpha(v),
                |_, v, _| na_m_beta(v),
            ),
        ]
    }
}

/// Sodium channel with slow inactivation (`h`, `m^3`, `s`) that allows voltage shifts
/// and rate scaling of every gate
#[derive(Debug, Clone, Copy, PartialEq, KineticParameters)]
pub struct SlowSodiumKinetics {
    /// Activation voltage shift (mV)
    #[kinetic(name = "Vhalfm")]
    pub vhalf_m: f64,
    /// Fast inactivation voltage shift (mV)
    #[kinetic(name = "Vhalfh")]
    pub vhalf_h: f64,
    /// Slow inactivation voltage shift (mV)
    #[kinetic(name = "Vhalfs")]
    pub vhalf_s: f64,
    /// Activation rate change
    #[kinetic(name = "Am")]
    pub a_m: f64,
    /// Fast inactivation rate change
    #[kinetic(name = "Ah")]
    pub a_h: f64,
    /// Slow inactivation rate change
    #[kinetic(name = "As")]
    pub a_s: f64,
}

impl Default for SlowSodiumKinetics {
    fn default() -> Self {
        SlowSodiumKinetics {
            vhalf_m: 0.,
            vhalf_h: 0.,
            vhalf_s: 0.,
            a_m: 1.,
            a_h: 1.,
            a_s: 1.,
        }
    }
}

/// Slow inactivation time constant scale
pub const NA_SLOW_C_AS: f64 = 550.;
/// Slow inactivation time constant voltage dependence (1/mV)
pub const NA_SLOW_C_BS: f64 = 0.046;

fn steady_state(alpha: f64, beta: f64) -> f64 {
    alpha / (alpha + beta)
}

impl ChannelKinetics for SlowSodiumKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::Na;

    fn description() -> &'static str {
        "Naslow: Na model with slow kinetics"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("h", 1).inf_tau(
                |p, v, _| {
                    let u = v - p.vhalf_h;
                    steady_state(na_h_alpha(u), na_h_beta(u))
                },
                |p, v, _| {
                    let u = v - p.vhalf_h;
                    p.a_h / (na_h_alpha(u) + na_h_beta(u))
                },
            ),
            GateDefinition::new("m", 3).inf_tau(
                |p, v, _| {
                    let u = v - p.vhalf_m;
                    steady_state(na_m_alpha(u), na_m_beta(u))
                },
                |p, v, _| {
                    let u = v - p.vhalf_m;
                    p.a_m / (na_m_alpha(u) + na_m_beta(u))
                },
            ),
            GateDefinition::new("s", 1).inf_tau(
                |p, v, _| {
                    let u = v - p.vhalf_s;
                    steady_state(na_h_alpha(u), na_h_beta(u))
                },
                |p, v, _| p.a_s * NA_SLOW_C_AS * (-NA_SLOW_C_BS * v).exp(),
            ),
        ]
    }
}

/// Fast delayed rectifier potassium channel (`n^4`)
#[derive(Debug, Clone, Copy, Default, PartialEq, KineticParameters)]
pub struct FastDelayedRectifierKinetics {
    /// Activation voltage shift (mV)
    #[kinetic(name = "Vhalfn")]
    pub vhalf_n: f64,
}

impl ChannelKinetics for FastDelayedRectifierKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::Kdrf;

    fn description() -> &'static str {
        "K: fast delayed rectifier"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("n", 4).alpha_beta(
                |p, v, _| -0.07 * linoid(v - p.vhalf_n + 65. - 47., -6.),
                |p, v, _| 0.264 / ((v - p.vhalf_n + 65. - 22.) / 40.).exp(),
            ),
        ]
    }
}

/// Slow delayed rectifier potassium channel (`n^4`)
#[derive(Debug, Clone, Copy, Default, PartialEq, KineticParameters)]
pub struct SlowDelayedRectifierKinetics {
    /// Activation voltage shift (mV)
    #[kinetic(name = "Vhalfn")]
    pub vhalf_n: f64,
}

impl ChannelKinetics for SlowDelayedRectifierKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::Kdrs;

    fn description() -> &'static str {
        "K: slow delayed rectifier"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("n", 4).alpha_beta(
                |p, v, _| -0.028 * linoid(v - p.vhalf_n + 65. - 35., -6.),
                |p, v, _| 0.1056 / ((v - p.vhalf_n + 65. - 10.) / 40.).exp(),
            ),
        ]
    }
}

/// Default half activation of the A current (mV)
pub const KA_VHALF_N: f64 = -33.6;
/// Default half inactivation of the A current (mV)
pub const KA_VHALF_L: f64 = -83.;
const KA_A0L: f64 = 0.08;
const KA_A0N: f64 = 0.02;
const KA_ZETA_N: f64 = -3.;
const KA_ZETA_L: f64 = 4.;
const KA_GM_N: f64 = 0.6;
const KA_GM_L: f64 = 1.;
const KA_Q10: f64 = 0.0740;

fn ka_exponent(zeta: f64, v: f64, vhalf: f64) -> f64 {
    (1e-3 * zeta * (v - vhalf) * 9.648e4 / (8.315 * (273.16 + CELSIUS))).exp()
}

/// A type potassium current, activation `k` and inactivation `l`
#[derive(Debug, Clone, Copy, PartialEq, KineticParameters)]
pub struct ATypeKinetics {
    /// Half activation (mV)
    #[kinetic(name = "vhalfn")]
    pub vhalf_n: f64,
    /// Half inactivation (mV)
    #[kinetic(name = "vhalfl")]
    pub vhalf_l: f64,
}

impl Default for ATypeKinetics {
    fn default() -> Self {
        ATypeKinetics { vhalf_n: KA_VHALF_N, vhalf_l: KA_VHALF_L }
    }
}

impl ChannelKinetics for ATypeKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::Ka;

    fn description() -> &'static str {
        "Ka: A current"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("k", 1).inf_tau(
                |p, v, _| 1. / (ka_exponent(KA_ZETA_N, v, p.vhalf_n) + 1.),
                |p, v, _| {
                    ka_exponent(KA_ZETA_N * KA_GM_N, v, p.vhalf_n) /
                        (KA_Q10 * KA_A0N * (1. + ka_exponent(KA_ZETA_N, v, p.vhalf_n)))
                },
            ),
            GateDefinition::new("l", 1).inf_tau(
                |p, v, _| 1. / (ka_exponent(KA_ZETA_L, v, p.vhalf_l) + 1.),
                |p, v, _| {
                    ka_exponent(KA_ZETA_L * KA_GM_L, v, p.vhalf_l) /
                        (KA_Q10 * KA_A0L * (1. + ka_exponent(KA_ZETA_L, v, p.vhalf_l)))
                },
            ),
        ]
    }
}

fn ih_steady_state(v: f64, vhalf: f64) -> f64 {
    1. / (1. + ((v - vhalf + 91.) / 10.).exp())
}

/// Fast hyperpolarization activated current (`h^2`)
#[derive(Debug, Clone, Copy, Default, PartialEq, KineticParameters)]
pub struct FastHKinetics {
    /// Activation voltage shift (mV)
    #[kinetic(name = "Vhalfhf")]
    pub vhalf_hf: f64,
}

impl ChannelKinetics for FastHKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::Ihf;

    fn description() -> &'static str {
        "fast Ih model"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("h", 2).inf_tau(
                |p, v, _| ih_steady_state(v, p.vhalf_hf),
                |_, v, _| 14.9 + 14.1 / (1. + (-(v + 95.2) / 0.5).exp()),
            ),
        ]
    }
}

/// Slow hyperpolarization activated current (`h^2`)
#[derive(Debug, Clone, Copy, Default, PartialEq, KineticParameters)]
pub struct SlowHKinetics {
    /// Activation voltage shift (mV)
    #[kinetic(name = "Vhalfhs")]
    pub vhalf_hs: f64,
}

impl ChannelKinetics for SlowHKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::Ihs;

    fn description() -> &'static str {
        "slow Ih model"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("h", 2).inf_tau(
                |p, v, _| ih_steady_state(v, p.vhalf_hs),
                |_, v, _| 80. + 172.7 / (1. + (-(v + 59.3) / -0.83).exp()),
            ),
        ]
    }
}

/// T type calcium channel, activation `a^2` and inactivation `b`
#[derive(Debug, Clone, Copy, Default, PartialEq, KineticParameters)]
pub struct TTypeCalciumKinetics {
    /// Activation voltage shift (mV)
    #[kinetic(name = "Vhalfmt")]
    pub vhalf_mt: f64,
}

impl ChannelKinetics for TTypeCalciumKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::CaT;

    fn description() -> &'static str {
        "T type calcium channels"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("a", 2).alpha_beta(
                |p, v, _| 0.2 * linoid(19.26 - (v - p.vhalf_mt), 10.),
                |p, v, _| 0.009 * (-(v - p.vhalf_mt) / 22.03).exp(),
            ),
            GateDefinition::new("b", 1).alpha_beta(
                |_, v, _| 1e-6 * (-v / 16.26).exp(),
                |_, v, _| 1. / (((29.79 - v) / 10.).exp() + 1.),
            ),
        ]
    }
}

/// N type calcium channel, activation `c^2` and inactivation `d`
#[derive(Debug, Clone, Copy, Default, PartialEq, KineticParameters)]
pub struct NTypeCalciumKinetics {
    /// Activation voltage shift (mV)
    #[kinetic(name = "Vhalfmn")]
    pub vhalf_mn: f64,
}

impl ChannelKinetics for NTypeCalciumKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::CaN;

    fn description() -> &'static str {
        "N type calcium channels"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("c", 2).alpha_beta(
                |p, v, _| 0.19 * linoid(19.88 - (v - p.vhalf_mn), 10.),
                |p, v, _| 0.046 * (-(v - p.vhalf_mn) / 20.73).exp(),
            ),
            GateDefinition::new("d", 1).alpha_beta(
                |_, v, _| 1.6e-4 / (-v / 48.4).exp(),
                |_, v, _| 1. / (((39. - v) / 10.).exp() + 1.),
            ),
        ]
    }
}

/// L type calcium channel, activation `e^2` and calcium dependent inactivation
/// `ki / (ki + Ca)`
#[derive(Debug, Clone, Copy, PartialEq, KineticParameters)]
pub struct LTypeCalciumKinetics {
    /// Activation voltage shift (mV)
    #[kinetic(name = "Vhalfml")]
    pub vhalf_ml: f64,
    /// Half inactivation calcium concentration (mM)
    pub ki: f64,
}

impl Default for LTypeCalciumKinetics {
    fn default() -> Self {
        LTypeCalciumKinetics { vhalf_ml: 0., ki: 1. }
    }
}

impl ChannelKinetics for LTypeCalciumKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::CaL;

    fn description() -> &'static str {
        "L type calcium channels"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("e", 2).alpha_beta(
                |p, v, _| 15.69 * linoid(81.5 - (v - p.vhalf_ml), 10.),
                |p, v, _| 0.29 * (-(v - p.vhalf_ml) / 10.86).exp(),
            ),
        ]
    }

    fn conductance_factor(&self, calcium: f64) -> f64 {
        self.ki / (self.ki + calcium)
    }
}

const BK_D1: f64 = 0.84;
const BK_D2: f64 = 1.0;
const BK_K1: f64 = 0.48e-3;
const BK_K2: f64 = 0.13e-6;
const BK_ABAR: f64 = 0.28;
const BK_BBAR: f64 = 0.48;
const BK_FARADAY: f64 = 96.4853;
const BK_R: f64 = 8.313424;

fn bk_exponent(d: f64, v: f64) -> f64 {
    (-2. * d * BK_FARADAY * v / BK_R / (273.15 + CELSIUS)).exp()
}

/// Calcium and voltage activated BK potassium channel (`o`)
#[derive(Debug, Clone, Copy, Default, PartialEq, KineticParameters)]
pub struct BkKinetics;

impl ChannelKinetics for BkKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::Kbk;

    fn description() -> &'static str {
        "Ca and voltage activated BK channels"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("o", 1).alpha_beta(
                |_, v, ca| ca * BK_ABAR / (ca + BK_K1 * bk_exponent(BK_D1, v)),
                |_, v, ca| BK_BBAR / (1. + ca / (BK_K2 * bk_exponent(BK_D2, v))),
            ),
        ]
    }
}

/// Calcium activated SK potassium channel (`q^2`)
#[derive(Debug, Clone, Copy, Default, PartialEq, KineticParameters)]
pub struct SkKinetics;

impl ChannelKinetics for SkKinetics {
    const CHANNEL_TYPE: ChannelType = ChannelType::Ksk;

    fn description() -> &'static str {
        "Ca activated SK channels"
    }

    fn gate_definitions() -> Vec<GateDefinition<Self>> {
        vec![
            GateDefinition::new("q", 2).alpha_beta(
                |_, _, ca| 1.25e1 * ca * ca,
                |_, _, _| 0.00025,
            ),
        ]
    }

    fn initial_state(&self, _: &GateKinetics<Self>, _: f64, _: f64) -> f64 {
        0.
    }
}
