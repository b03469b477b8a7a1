use std::collections::{BTreeMap, HashMap};

use crate::{Node, NodeId, Transition, TransitionId};

/// Adjacency of a workflow, keyed by node id.
///
/// Edge lists are ordered by transition id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
  /// node_id -> transitions leaving the node.
  outgoing: HashMap<NodeId, Vec<Transition>>,
  /// node_id -> transitions entering the node.
  incoming: HashMap<NodeId, Vec<Transition>>,
}

impl Graph {
  /// Build the adjacency from nodes and transitions.
  pub fn new(
    nodes: &BTreeMap<NodeId, Node>,
    transitions: &BTreeMap<TransitionId, Transition>,
  ) -> Self {
    let mut outgoing: HashMap<NodeId, Vec<Transition>> = HashMap::new();
    let mut incoming: HashMap<NodeId, Vec<Transition>> = HashMap::new();

    for node_id in nodes.keys() {
      outgoing.entry(*node_id).or_default();
      incoming.entry(*node_id).or_default();
    }

    for transition in transitions.values() {
      outgoing.entry(transition.from).or_default().push(*transition);
      incoming.entry(transition.to).or_default().push(*transition);
    }

    Self { outgoing, incoming }
  }

  /// Transitions leaving a node.
  pub fn outgoing(&self, node_id: NodeId) -> &[Transition] {
    self
      .outgoing
      .get(&node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Transitions entering a node.
  pub fn incoming(&self, node_id: NodeId) -> &[Transition] {
    self
      .incoming
      .get(&node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Targets of the transitions leaving a node, in transition order.
  pub fn successors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    self.outgoing(node_id).iter().map(|t| t.to)
  }

  /// Check whether a transition exists between two nodes in either direction.
  pub fn connected(&self, a: NodeId, b: NodeId) -> bool {
    self.outgoing(a).iter().any(|t| t.to == b) || self.outgoing(b).iter().any(|t| t.to == a)
  }
}
