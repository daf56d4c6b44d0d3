//! Defines a `Network`: a directed acyclic graph of chance, action and utility nodes.

use super::node::{Node, NodeType};
use crate::util::{DialnetError, Result};

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use std::collections::BTreeSet;
use std::fmt;


/// Represents a Bayesian Network, extended with action and utility nodes.
///
/// # Representation
/// Nodes are held in insertion order, keyed by their id. The edges are recorded on both ends
/// (`inputs` of the child, `outputs` of the parent). The graph is kept acyclic: an edge that
/// would close a cycle is rejected.
#[derive(Clone, Debug, Default)]
pub struct Network {

    /// The nodes of the network, in insertion order
    nodes: IndexMap<String, Node>
}

impl Network {

    /// Construct an empty `Network`
    pub fn new() -> Self {
        Network { nodes: IndexMap::new() }
    }

    /// Add a node. Edges already recorded on the node are dropped; use `connect` to add them.
    ///
    /// # Errors
    /// * `DialnetError::DuplicateNode` if a node with the same id exists
    pub fn add_node(&mut self, mut node: Node) -> Result<()> {
        if self.nodes.contains_key(node.id()) {
            return Err(DialnetError::DuplicateNode(String::from(node.id())));
        }

        node.clear_edges();
        self.nodes.insert(String::from(node.id()), node);
        Ok(())
    }

    /// Remove a node and all of its edges
    ///
    /// # Errors
    /// * `DialnetError::UnknownNode` if the node does not exist
    pub fn remove_node(&mut self, id: &str) -> Result<Node> {
        let mut node = self.nodes
                           .shift_remove(id)
                           .ok_or_else(|| DialnetError::UnknownNode(String::from(id)))?;

        for input in node.inputs().iter() {
            if let Some(parent) = self.nodes.get_mut(input) {
                parent.remove_output(id);
            }
        }
        for output in node.outputs().iter() {
            if let Some(child) = self.nodes.get_mut(output) {
                child.remove_input(id);
            }
        }

        node.clear_edges();
        Ok(node)
    }

    /// Add the edge `parent -> child`. Adding an existing edge does nothing.
    ///
    /// # Errors
    /// * `DialnetError::UnknownNode` if an endpoint does not exist
    /// * `DialnetError::InvalidEdge` if the parent is a utility node
    /// * `DialnetError::CyclicGraph` if the edge would close a directed cycle
    pub fn connect(&mut self, parent: &str, child: &str) -> Result<()> {
        let parent_type = self.get_node(parent)?.node_type();
        self.get_node(child)?;

        if parent_type == NodeType::Utility {
            return Err(DialnetError::InvalidEdge(String::from(parent), String::from(child)));
        }
        if parent == child || self.descendant_ids(child).contains(parent) {
            return Err(DialnetError::CyclicGraph(String::from(parent), String::from(child)));
        }

        trace!(%parent, %child, "connecting nodes");
        if let Some(p) = self.nodes.get_mut(parent) {
            p.add_output(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.add_input(parent);
        }
        Ok(())
    }

    /// Remove the edge `parent -> child`, if it exists
    ///
    /// # Errors
    /// * `DialnetError::UnknownNode` if an endpoint does not exist
    pub fn disconnect(&mut self, parent: &str, child: &str) -> Result<()> {
        self.get_node(parent)?;
        self.get_node(child)?;

        if let Some(p) = self.nodes.get_mut(parent) {
            p.remove_output(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.remove_input(parent);
        }
        Ok(())
    }

    /// Get a node
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a node, failing if it does not exist
    ///
    /// # Errors
    /// * `DialnetError::UnknownNode`
    pub fn get_node(&self, id: &str) -> Result<&Node> {
        self.nodes.get(id).ok_or_else(|| DialnetError::UnknownNode(String::from(id)))
    }

    /// Get a mutable node. Edges can only be changed through the `Network`.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// The nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// The node ids, in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &String> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of the nodes of a given type, in insertion order
    pub fn node_ids_of_type(&self, node_type: NodeType) -> Vec<String> {
        self.nodes
            .values()
            .filter(|n| n.node_type() == node_type)
            .map(|n| String::from(n.id()))
            .collect()
    }

    pub fn chance_nodes(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.node_type() == NodeType::Chance).collect()
    }

    pub fn action_nodes(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.node_type() == NodeType::Action).collect()
    }

    pub fn utility_nodes(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.node_type() == NodeType::Utility).collect()
    }

    /// Ids of every node reachable by following edges backwards
    pub fn ancestor_ids(&self, id: &str) -> IndexSet<String> {
        self.reachable(id, Node::inputs)
    }

    /// Ids of every node reachable by following edges forwards
    pub fn descendant_ids(&self, id: &str) -> IndexSet<String> {
        self.reachable(id, Node::outputs)
    }

    /// Check if one of the given nodes is a descendant of `id`
    pub fn has_descendant(&self, id: &str, candidates: &IndexSet<String>) -> bool {
        let descendants = self.descendant_ids(id);
        candidates.iter().any(|c| descendants.contains(c))
    }

    fn reachable<'a, F>(&'a self, id: &str, next: F) -> IndexSet<String>
        where F: Fn(&'a Node) -> &'a IndexSet<String>
    {
        let mut seen = IndexSet::new();
        let mut stack: Vec<&str> = match self.nodes.get(id) {
            Some(n) => next(n).iter().map(String::as_str).collect(),
            None => return seen
        };

        while let Some(current) = stack.pop() {
            if seen.insert(String::from(current)) {
                if let Some(n) = self.nodes.get(current) {
                    stack.extend(next(n).iter().map(String::as_str));
                }
            }
        }
        seen
    }

    /// The closest ancestors of `id` that belong to `among`: the search walks up the inputs
    /// and stops at the first member of `among` on each path.
    pub fn nearest_ancestor_ids(&self, id: &str, among: &IndexSet<String>) -> IndexSet<String> {
        let mut found = IndexSet::new();
        let mut visited: IndexSet<&str> = IndexSet::new();
        let mut stack: Vec<&str> = match self.nodes.get(id) {
            Some(n) => n.inputs().iter().map(String::as_str).collect(),
            None => return found
        };

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if among.contains(current) {
                found.insert(String::from(current));
            } else if let Some(n) = self.nodes.get(current) {
                stack.extend(n.inputs().iter().map(String::as_str));
            }
        }
        found
    }

    /// Ids of the nodes in topological order (parents before children). Among nodes whose
    /// parents are all placed, the earliest inserted comes first.
    pub fn sorted_node_ids(&self) -> Vec<String> {
        let mut in_degree: Vec<usize> = self.nodes.values().map(|n| n.inputs().len()).collect();
        let mut ready: BTreeSet<usize> = in_degree.iter()
                                                  .enumerate()
                                                  .filter(|(_, d)| **d == 0)
                                                  .map(|(i, _)| i)
                                                  .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(&pos) = ready.iter().next() {
            ready.remove(&pos);
            if let Some((id, node)) = self.nodes.get_index(pos) {
                order.push(id.clone());
                for out in node.outputs().iter() {
                    if let Some(child) = self.nodes.get_index_of(out) {
                        in_degree[child] -= 1;
                        if in_degree[child] == 0 {
                            ready.insert(child);
                        }
                    }
                }
            }
        }
        order
    }

    /// The nodes in topological order
    pub fn sorted_nodes(&self) -> Vec<&Node> {
        self.sorted_node_ids().iter().filter_map(|id| self.nodes.get(id)).collect()
    }

    /// The nodes relevant to the given targets (the targets and all of their ancestors), in
    /// topological order
    pub fn relevant_sorted_nodes(&self, targets: &IndexSet<String>) -> Vec<&Node> {
        let mut relevant: IndexSet<String> = targets.clone();
        for t in targets.iter() {
            relevant.extend(self.ancestor_ids(t));
        }

        self.sorted_node_ids()
            .iter()
            .filter(|id| relevant.contains(*id))
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.sorted_nodes()
                                     .iter()
                                     .map(|n| {
                                         let inputs: Vec<&str> = n.inputs().iter().map(String::as_str).collect();
                                         format!("{}({})", n.id(), inputs.join(","))
                                     })
                                     .collect();
        write!(f, "[{}]", parts.join(" "))
    }
}


/// An implementation of the [builder pattern] for creating a `Network`.
///
/// Nodes are added with their parents, which must already be in the network. Errors are
/// sticky: the first one is reported by `build`.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
#[derive(Debug, Default)]
pub struct NetworkBuilder {

    /// The network under construction
    network: Network,

    /// The error state of the builder
    err: Option<DialnetError>
}

impl NetworkBuilder {

    /// Construct a new `NetworkBuilder` representing an empty `Network`
    pub fn new() -> Self {
        NetworkBuilder { network: Network::new(), err: None }
    }

    /// Add a node to the `Network`.
    ///
    /// # Args
    /// * `node`: the node to add
    /// * `inputs`: the ids of the parents. The parents must already be in the network.
    pub fn with_node(mut self, node: Node, inputs: &[&str]) -> Self {
        if self.err.is_some() {
            return self;
        }

        let id = String::from(node.id());
        if let Err(e) = self.network.add_node(node) {
            self.err = Some(e);
            return self;
        }

        for input in inputs {
            if let Err(e) = self.network.connect(input, &id) {
                self.err = Some(e);
                return self;
            }
        }
        self
    }

    /// Add an edge between two nodes already in the `Network`
    pub fn with_edge(mut self, parent: &str, child: &str) -> Self {
        if self.err.is_none() {
            if let Err(e) = self.network.connect(parent, child) {
                self.err = Some(e);
            }
        }
        self
    }

    /// Complete building the network.
    ///
    /// # Returns
    /// the `Network`, or the first error generated during the building process
    pub fn build(self) -> Result<Network> {
        match self.err {
            Some(e) => Err(e),
            None => Ok(self.network)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::CategoricalTable;
    use crate::model::node::UtilityFunction;
    use crate::distribution::UtilityTable;

    fn chance(id: &str) -> Node {
        Node::chance(id, CategoricalTable::degenerate(id, true)).expect("unexpected error")
    }

    fn ids(nodes: &[&Node]) -> Vec<String> {
        nodes.iter().map(|n| n.id().to_string()).collect()
    }

    #[test]
    fn connect() {
        let mut network = Network::new();
        network.add_node(chance("A")).expect("unexpected error");
        network.add_node(chance("B")).expect("unexpected error");
        network.connect("A", "B").expect("unexpected error");

        assert!(network.get_node("A").expect("missing node").outputs().contains("B"));
        assert!(network.get_node("B").expect("missing node").inputs().contains("A"));

        match network.add_node(chance("A")) {
            Err(DialnetError::DuplicateNode(id)) => assert_eq!("A", id),
            _ => panic!("expected a duplicate node")
        };
        match network.connect("A", "C") {
            Err(DialnetError::UnknownNode(id)) => assert_eq!("C", id),
            _ => panic!("expected an unknown node")
        };

        network.disconnect("A", "B").expect("unexpected error");
        assert!(network.get_node("B").expect("missing node").inputs().is_empty());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut network = NetworkBuilder::new()
                              .with_node(chance("A"), &[])
                              .with_node(chance("B"), &["A"])
                              .with_node(chance("C"), &["B"])
                              .build()
                              .expect("unexpected error");

        match network.connect("C", "A") {
            Err(DialnetError::CyclicGraph(p, c)) => {
                assert_eq!("C", p);
                assert_eq!("A", c);
            },
            _ => panic!("expected a cycle")
        };
        assert!(network.connect("B", "B").is_err());
        assert!(network.get_node("A").expect("missing node").inputs().is_empty());

        let res = NetworkBuilder::new()
                      .with_node(chance("A"), &[])
                      .with_node(chance("B"), &["A"])
                      .with_edge("B", "A")
                      .build();
        assert!(res.is_err());
    }

    #[test]
    fn utility_nodes_have_no_children() {
        let mut network = Network::new();
        network.add_node(Node::utility("U", UtilityFunction::Table(UtilityTable::new())))
               .expect("unexpected error");
        network.add_node(chance("A")).expect("unexpected error");

        match network.connect("U", "A") {
            Err(DialnetError::InvalidEdge(_, _)) => (),
            _ => panic!("expected an invalid edge")
        };
        network.connect("A", "U").expect("unexpected error");
    }

    #[test]
    fn remove_node() {
        let mut network = NetworkBuilder::new()
                              .with_node(chance("A"), &[])
                              .with_node(chance("B"), &["A"])
                              .with_node(chance("C"), &["B"])
                              .build()
                              .expect("unexpected error");

        let b = network.remove_node("B").expect("unexpected error");
        assert!(b.inputs().is_empty());
        assert!(network.get_node("A").expect("missing node").outputs().is_empty());
        assert!(network.get_node("C").expect("missing node").inputs().is_empty());
        assert!(network.remove_node("B").is_err());
        assert_eq!(vec!["A", "C"], network.node_ids().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn topological_order() {
        // inserted out of dependency order
        let mut network = Network::new();
        for id in &["name(robot1)", "floor", "robot1", "Exists(robot1)"] {
            network.add_node(chance(id)).expect("unexpected error");
        }
        network.connect("robot1", "name(robot1)").expect("unexpected error");
        network.connect("robot1", "Exists(robot1)").expect("unexpected error");

        // robot1 must precede its children, ties follow insertion order
        assert_eq!(vec!["floor", "robot1", "name(robot1)", "Exists(robot1)"],
                   network.sorted_node_ids());

        // without constraints, the insertion order is kept
        let network = NetworkBuilder::new()
                          .with_node(chance("name(robot1)"), &[])
                          .with_node(chance("floor"), &[])
                          .with_node(chance("robot1"), &[])
                          .with_node(chance("Exists(robot1)"), &["robot1"])
                          .build()
                          .expect("unexpected error");
        assert_eq!(vec!["name(robot1)", "floor", "robot1", "Exists(robot1)"],
                   ids(&network.sorted_nodes()));
    }

    #[test]
    fn ancestry() {
        let network = NetworkBuilder::new()
                          .with_node(chance("A"), &[])
                          .with_node(chance("B"), &["A"])
                          .with_node(chance("C"), &["B"])
                          .with_node(chance("D"), &["C", "A"])
                          .with_node(chance("E"), &[])
                          .build()
                          .expect("unexpected error");

        let ancestors = network.ancestor_ids("D");
        assert_eq!(3, ancestors.len());
        assert!(ancestors.contains("A") && ancestors.contains("B") && ancestors.contains("C"));
        assert!(network.descendant_ids("E").is_empty());

        let mut candidates = IndexSet::new();
        candidates.insert(String::from("D"));
        assert!(network.has_descendant("A", &candidates));
        assert!(! network.has_descendant("E", &candidates));

        let mut among = IndexSet::new();
        among.insert(String::from("B"));
        among.insert(String::from("A"));
        let nearest = network.nearest_ancestor_ids("D", &among);
        assert_eq!(2, nearest.len());
        let nearest = network.nearest_ancestor_ids("C", &among);
        assert_eq!(1, nearest.len());
        assert!(nearest.contains("B"));

        let mut targets = IndexSet::new();
        targets.insert(String::from("C"));
        assert_eq!(vec!["A", "B", "C"], ids(&network.relevant_sorted_nodes(&targets)));
    }

    #[test]
    fn typed_lookups() {
        let network = NetworkBuilder::new()
                          .with_node(chance("A"), &[])
                          .with_node(Node::action("a_m", vec![crate::value::Value::from("x")])
                                         .expect("unexpected error"), &[])
                          .with_node(Node::utility("U", UtilityFunction::Table(UtilityTable::new())), &["A", "a_m"])
                          .build()
                          .expect("unexpected error");

        assert_eq!(vec!["a_m"], network.node_ids_of_type(NodeType::Action));
        assert_eq!(1, network.chance_nodes().len());
        assert_eq!(1, network.action_nodes().len());
        assert_eq!(1, network.utility_nodes().len());
        assert_eq!("[A() a_m() U(A,a_m)]", network.to_string());
    }
}
