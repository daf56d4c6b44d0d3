//! Defines the graphical model: a `Network` of chance, action and utility `Node`s.

pub mod network;
pub mod node;

pub use self::network::{Network, NetworkBuilder};
pub use self::node::{ActionNode, ChanceNode, Node, NodeKind, NodeType, UtilityFunction, UtilityNode};
