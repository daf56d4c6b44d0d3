//! Defines the `Error` type for the dialnet library

use thiserror::Error;

use std::result;

pub type Result<T> = result::Result<T, DialnetError>;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum DialnetError {

    /// Adding the edge (or node) would introduce a directed cycle. The values are the
    /// endpoints of the offending edge.
    #[error("Connecting {0} -> {1} would introduce a cycle")]
    CyclicGraph(String, String),

    /// The query referenced unknown variables, or used a variable both as query and evidence
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Two assignments disagreed on the value of a shared variable
    #[error("Inconsistent values for variable {0}")]
    InconsistentAssignment(String),

    /// Variable elimination ended with zero total mass, i.e. the evidence has probability zero
    #[error("The elimination produced an empty factor (evidence has zero probability)")]
    EmptyFactor,

    /// Sampling could not produce a single sample above the weight threshold
    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    /// A distribution has negative values, or a table does not sum to 1
    #[error("Malformed distribution for {0}: {1}")]
    MalformedDistribution(String, String),

    /// A node id was referenced that is not part of the network
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// A node id was added twice to the same network
    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    /// The edge is not allowed between these node kinds (e.g. out of a utility node)
    #[error("Invalid edge {0} -> {1}")]
    InvalidEdge(String, String),

    /// Provided scope did not satisfy constraints
    #[error("Provided scope did not satisfy constraints: {0}")]
    InvalidScope(String),

    /// The operation requires a discrete distribution
    #[error("Variable {0} has a continuous distribution and cannot be enumerated")]
    UnsupportedDistribution(String),

    /// The distribution cannot be converted to a continuous representation
    #[error("Distribution over {0} is not continuous-representable")]
    NotContinuous(String),

    /// A distribution failed to draw a value
    #[error("Could not sample: {0}")]
    Sampling(String),

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let e = DialnetError::CyclicGraph(String::from("A"), String::from("B"));
        assert_eq!(e.to_string(), "Connecting A -> B would introduce a cycle");

        let e = DialnetError::EmptyFactor;
        assert!(e.to_string().contains("zero probability"));
    }
}
