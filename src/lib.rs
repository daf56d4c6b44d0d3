//! Probabilistic inference over the dialogue-state networks of a dialogue manager.
//!
//! A `Network` of chance, action and utility nodes is queried through a `Query`, answered
//! exactly by variable elimination or approximately by likelihood weighting.

pub mod value;
pub mod variable;
pub mod distribution;
pub mod factor;
pub mod model;
pub mod query;
pub mod samplers;
pub mod inference;
pub mod util;

#[cfg(test)]
pub(crate) mod fixtures;

pub use util::{Result, DialnetError};
pub use value::Value;
pub use variable::Assignment;
pub use model::{Network, NetworkBuilder, Node};
pub use query::{Query, QueryType};
pub use inference::{run_approximate_inference, run_exact_inference, InferenceAlgorithm, QueryResult};
