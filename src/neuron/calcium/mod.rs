//! Single shell intracellular calcium with first order clearance toward a
//! resting concentration, fed by the calcium permeable channels of a compartment.

use super::ion_channels::ChannelType;


/// Faraday's constant (C/mol)
pub const FARADAY: f64 = 96520.;
/// Shell depth (m)
pub const SHELL_DEPTH: f64 = 200e-9;
/// Conversion from mS/cm^2 to S/m^2
pub const DENSITY_SCALE: f64 = 10.;

/// Sub pools may individually go negative under outward current, only a
/// negative total empties them so the total matches the combined pool
fn clamp_total(values: [f64; 3]) -> [f64; 3] {
    if values.iter().sum::<f64>() < 0. {
        [0.; 3]
    } else {
        values
    }
}

/// Calcium species tracked separately when the pool is split by source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalciumSpecies {
    /// Carried by L type channels
    L,
    /// Carried by N type channels
    N,
    /// Carried by T type channels
    T,
}

impl CalciumSpecies {
    fn index(&self) -> usize {
        match self {
            CalciumSpecies::L => 0,
            CalciumSpecies::N => 1,
            CalciumSpecies::T => 2,
        }
    }

    /// Name of the sub pool
    pub fn name(&self) -> &'static str {
        match self {
            CalciumSpecies::L => "CaLi",
            CalciumSpecies::N => "CaNi",
            CalciumSpecies::T => "CaTi",
        }
    }
}

/// How the concentration is stored, both encodings follow the same total dynamics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalciumStore {
    /// One concentration fed by every provider (mM)
    Combined(f64),
    /// One concentration per species, `[CaLi, CaNi, CaTi]` (mM), each clearing
    /// toward a third of the resting concentration
    PerSpecies([f64; 3]),
}

/// Selects the storage mode for new pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalciumMode {
    #[default]
    Combined,
    PerSpecies,
}

/// Intracellular calcium pool of a compartment
#[derive(Debug, Clone, PartialEq)]
pub struct CalciumPool {
    /// Concentration state
    pub store: CalciumStore,
    /// Resting concentration (mM)
    pub ca0: f64,
    /// Clearance time constant (ms)
    pub tau: f64,
    /// Conversion from current to concentration change
    pub b: f64,
    /// Ion valence
    pub valence: f64,
    /// Extracellular concentration (mM)
    pub extracellular: f64,
    /// Channels whose currents feed the pool
    pub providers: Vec<ChannelType>,
}

impl CalciumPool {
    /// Creates a pool at rest for a compartment with the given membrane area (m^2)
    pub fn new(area: f64, mode: CalciumMode) -> Self {
        let ca0 = 5e-6;
        let store = match mode {
            CalciumMode::Combined => CalciumStore::Combined(ca0),
            CalciumMode::PerSpecies => CalciumStore::PerSpecies([ca0 / 3.; 3]),
        };

        CalciumPool {
            store,
            ca0,
            tau: 10.,
            b: 1. / (SHELL_DEPTH * FARADAY * area * DENSITY_SCALE * 1e5),
            valence: 2.,
            extracellular: 2.,
            providers: vec![],
        }
    }

    /// Registers a calcium permeable channel as a provider, non calcium channels
    /// and repeated registrations are ignored
    pub fn add_provider(&mut self, channel_type: ChannelType) {
        if channel_type.calcium_species().is_some() && !self.providers.contains(&channel_type) {
            self.providers.push(channel_type);
        }
    }

    /// Total concentration (mM), the value every calcium consumer reads
    pub fn total(&self) -> f64 {
        match &self.store {
            CalciumStore::Combined(ca) => *ca,
            CalciumStore::PerSpecies(species) => species.iter().sum(),
        }
    }

    /// Concentration of one sub pool, `None` when the pool is combined
    pub fn species(&self, species: CalciumSpecies) -> Option<f64> {
        match &self.store {
            CalciumStore::Combined(_) => None,
            CalciumStore::PerSpecies(values) => Some(values[species.index()]),
        }
    }

    /// Resets the pool to its resting concentration
    pub fn reset(&mut self) {
        self.store = match self.store {
            CalciumStore::Combined(_) => CalciumStore::Combined(self.ca0),
            CalciumStore::PerSpecies(_) => CalciumStore::PerSpecies([self.ca0 / 3.; 3]),
        };
    }

    fn influx(&self, current: f64) -> f64 {
        -self.b * current / self.valence
    }

    fn sources(&self, currents: &[(ChannelType, f64)]) -> [f64; 3] {
        let mut sources = [0.; 3];
        for (channel_type, current) in currents.iter() {
            if !self.providers.contains(channel_type) {
                continue;
            }
            if let Some(species) = channel_type.calcium_species() {
                sources[species.index()] += self.influx(*current);
            }
        }

        sources
    }

    /// State derivatives given the current (mA) of each channel in the compartment,
    /// only registered providers contribute
    ///
    /// `dCa/dt = -B * sum(I) / z - (Ca - Ca0) / tau`
    pub fn derivatives(&self, currents: &[(ChannelType, f64)]) -> Vec<f64> {
        let sources = self.sources(currents);

        match &self.store {
            CalciumStore::Combined(ca) => vec![
                sources.iter().sum::<f64>() - (ca - self.ca0) / self.tau
            ],
            CalciumStore::PerSpecies(values) => values.iter()
                .zip(sources.iter())
                .map(|(ca, source)| source - (ca - self.ca0 / 3.) / self.tau)
                .collect(),
        }
    }

    /// Advances the pool by `dt` (ms) holding the currents fixed, the linear
    /// equation is integrated exactly and the total is kept non negative
    pub fn update(&mut self, currents: &[(ChannelType, f64)], dt: f64) {
        let sources = self.sources(currents);
        let decay = (-dt / self.tau).exp();
        let tau = self.tau;
        let step = |ca: f64, target: f64, source: f64| {
            let steady = target + source * tau;
            steady + (ca - steady) * decay
        };

        self.store = match self.store {
            CalciumStore::Combined(ca) => CalciumStore::Combined(
                step(ca, self.ca0, sources.iter().sum()).max(0.)
            ),
            CalciumStore::PerSpecies(values) => {
                let mut next = values;
                for (n, value) in next.iter_mut().enumerate() {
                    *value = step(values[n], self.ca0 / 3., sources[n]);
                }

                CalciumStore::PerSpecies(clamp_total(next))
            }
        };
    }

    /// Number of state variables
    pub fn state_len(&self) -> usize {
        match &self.store {
            CalciumStore::Combined(_) => 1,
            CalciumStore::PerSpecies(_) => 3,
        }
    }

    /// Flattened concentrations
    pub fn state(&self) -> Vec<f64> {
        match &self.store {
            CalciumStore::Combined(ca) => vec![*ca],
            CalciumStore::PerSpecies(values) => values.to_vec(),
        }
    }

    /// Sets concentrations from a flattened state, extra values are ignored and a
    /// negative total is clamped to zero
    pub fn set_state(&mut self, state: &[f64]) {
        match &mut self.store {
            CalciumStore::Combined(ca) => {
                if let Some(value) = state.first() {
                    *ca = value.max(0.);
                }
            },
            CalciumStore::PerSpecies(values) => {
                let mut next = *values;
                for (value, new) in next.iter_mut().zip(state.iter()) {
                    *value = *new;
                }
                *values = clamp_total(next);
            },
        }
    }
}
