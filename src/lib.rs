//! # Dentate Gyrus
//!
//! `dentate_gyrus` is a package for building and running multicompartment
//! conductance based models of the dentate gyrus. Granule, basket, mossy and
//! HIPP cells are built from cylindrical compartments carrying sodium, potassium,
//! hyperpolarization activated and calcium channels along with a calcium pool per
//! compartment. Cells are connected by dual exponential synapses and wired into a
//! network where recurrent granule cell connections represent mossy fiber sprouting.
//!
//! Channel kinetics are typed rate functions per channel family, each family
//! exposes its voltage shifts and rate scales as fields so they can be mutated
//! across a whole network between runs. Cells expose their state and derivative
//! vectors for use with an external integrator and a fixed step stepper is included
//! to run networks end to end.
//!
//! ## Example Code
//!
//! ### Stepping a granule cell with a current injection
//!
//! ```rust
//! use dentate_gyrus::{
//!     error::DentateGyrusError,
//!     neuron::cell::{Cell, CellOptions, CurrentInjection},
//! };
//!
//! /// Injects current into the soma of a granule cell and returns the times
//! /// the soma crossed its threshold
//! fn granule_spike_times(amplitude: f64, duration: f64) -> Result<Vec<f64>, DentateGyrusError> {
//!     let mut cell = Cell::granule(0, CellOptions::default())?;
//!     cell.injection = Some(CurrentInjection { start: 0., end: duration, amplitude });
//!
//!     let dt = 0.01;
//!     let mut spikes = vec![];
//!     for _ in 0..(duration / dt) as usize {
//!         if let Some(time) = cell.step(dt)? {
//!             spikes.push(time);
//!         }
//!     }
//!
//!     Ok(spikes)
//! }
//!
//! fn main() -> Result<(), DentateGyrusError> {
//!     let spikes = granule_spike_times(0.2, 50.)?;
//!     assert!(spikes.windows(2).all(|i| i[0] < i[1]));
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Running a small sprouted network
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use dentate_gyrus::{
//!     error::DentateGyrusError,
//!     network::{
//!         default_rules, Network, PerforantPathStimulus, PopulationSizes, WiringConfig,
//!     },
//!     neuron::cell::CellOptions,
//!     overrides::{apply_overrides, ParameterOverrides},
//! };
//!
//! fn main() -> Result<(), DentateGyrusError> {
//!     let sizes = PopulationSizes { granule: 8, basket: 1, mossy: 1, hipp: 1 };
//!     let wiring = WiringConfig { sprout: 0.5, external_granule_offset: 0 };
//!     let mut network = Network::new(sizes, CellOptions::default(), wiring)?;
//!
//!     let mut overrides = ParameterOverrides::default();
//!     overrides.set("Vhalfmn", 2.)?;
//!     apply_overrides(&mut network.cells, &overrides);
//!
//!     let mut rng = StdRng::seed_from_u64(0);
//!     network.wire(&default_rules(), &mut rng)?;
//!     let stimulus = PerforantPathStimulus { granule: 4, basket: 1, ..PerforantPathStimulus::default() };
//!     network.stimulate(&stimulus, &mut rng)?;
//!
//!     let summary = network.run(5., 0.01)?;
//!     assert_eq!(summary.steps, 500);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod network;
pub mod neuron;
pub mod output;
pub mod overrides;
pub mod sweep;
