//! Multicompartment conductance based neurons of the dentate gyrus.
//!
//! Channel kinetics are described per family by typed rate functions in [`kinetics`],
//! validated into gates in [`gating`] and combined into conductances in [`ion_channels`].
//! A [`compartment::Compartment`] owns its channels and calcium pool, a [`cell::Cell`]
//! arranges compartments into a tree rooted at the soma and owns its
//! [`synapse::DoubleExponentialSynapse`]s.

pub mod gating;
pub mod kinetics;
pub mod ion_channels;
pub mod calcium;
pub mod compartment;
pub mod synapse;
pub mod spike_train;
pub mod cell;
pub mod solver;
/// A derive macro to list the mutable kinetic parameters of a channel family.
pub mod channel_kinetics_traits {
    pub use channel_kinetics_traits::*;
}
