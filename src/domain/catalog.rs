//! Immutable registry of all nodes, built once at startup.

use std::collections::HashMap;

use crate::domain::types::{Node, NodeId, NodeKind};
use crate::error::SolverError;

/// Owns every [`Node`] record by id. Routes and Solutions hold node ids
/// only and look nodes up here; the catalog never changes after
/// construction.
#[derive(Debug, Clone)]
pub struct NodeCatalog {
    nodes: HashMap<NodeId, Node>,
    containers: Vec<NodeId>,
    dumps: Vec<NodeId>,
    depots: Vec<NodeId>,
}

/// Dump outranks Depot so a node serving both roles keeps the load-reset
/// behavior an interior dump visit needs; Container never mixes with
/// either in practice but is ranked lowest for completeness.
fn role_rank(kind: NodeKind) -> u8 {
    match kind {
        NodeKind::Container => 0,
        NodeKind::Depot => 1,
        NodeKind::Dump => 2,
    }
}

impl NodeCatalog {
    pub fn build(nodes: Vec<Node>) -> Result<Self, SolverError> {
        let mut map = HashMap::with_capacity(nodes.len());
        let mut containers = Vec::new();
        let mut dumps = Vec::new();
        let mut depots = Vec::new();

        for node in nodes {
            if node.opens > node.closes {
                return Err(SolverError::Inconsistency(format!(
                    "node {} has opens ({}) > closes ({})",
                    node.id, node.opens, node.closes
                )));
            }
            match node.kind {
                NodeKind::Container if node.demand <= 0.0 => {
                    return Err(SolverError::Inconsistency(format!(
                        "container {} has non-positive demand {}",
                        node.id, node.demand
                    )));
                }
                NodeKind::Dump | NodeKind::Depot if node.demand != 0.0 => {
                    return Err(SolverError::Inconsistency(format!(
                        "non-container node {} has nonzero demand {}",
                        node.id, node.demand
                    )));
                }
                _ => {}
            }

            match node.kind {
                NodeKind::Container => containers.push(node.id),
                NodeKind::Dump => dumps.push(node.id),
                NodeKind::Depot => depots.push(node.id),
            }
            map.insert(node.id, node);
        }

        Ok(Self {
            nodes: map,
            containers,
            dumps,
            depots,
        })
    }

    pub fn get(&self, id: NodeId) -> Result<Node, SolverError> {
        self.nodes
            .get(&id)
            .copied()
            .ok_or_else(|| SolverError::Reference(format!("unknown node id {id}")))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Marks an otherlocs node with a role inferred from the vehicle
    /// records (used while resolving roles, before the catalog is
    /// considered fully built). An id can legitimately serve as both a
    /// dump and a depot; each role it's asked to play is indexed, but the
    /// node's `kind` tag keeps whichever role is more load-bearing for
    /// route feasibility (a dump visit resets truck load, a depot visit
    /// is just the route's endpoint) so `Node::is_dump` stays correct for
    /// interior positions even when the id doubles as someone's depot.
    pub fn mark_kind(&mut self, id: NodeId, kind: NodeKind) -> Result<(), SolverError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| SolverError::Reference(format!("unknown node id {id}")))?;
        let already_indexed = match kind {
            NodeKind::Dump => self.dumps.contains(&id),
            NodeKind::Depot => self.depots.contains(&id),
            NodeKind::Container => self.containers.contains(&id),
        };
        if !already_indexed {
            match kind {
                NodeKind::Dump => self.dumps.push(id),
                NodeKind::Depot => self.depots.push(id),
                NodeKind::Container => self.containers.push(id),
            }
        }
        if role_rank(kind) > role_rank(node.kind) {
            node.kind = kind;
        }
        Ok(())
    }

    pub fn containers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.containers.iter().copied()
    }

    pub fn dumps(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.dumps.iter().copied()
    }

    pub fn depots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.depots.iter().copied()
    }

    pub fn num_containers(&self) -> usize {
        self.containers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: NodeId, kind: NodeKind, demand: f64) -> Node {
        Node::new(id, 0.0, 0.0, 0.0, 100.0, 5.0, demand, kind)
    }

    #[test]
    fn build_rejects_inverted_window() {
        let bad = Node::new(1, 0.0, 0.0, 100.0, 50.0, 0.0, 1.0, NodeKind::Container);
        assert!(NodeCatalog::build(vec![bad]).is_err());
    }

    #[test]
    fn build_rejects_zero_demand_container() {
        let bad = node(1, NodeKind::Container, 0.0);
        assert!(NodeCatalog::build(vec![bad]).is_err());
    }

    #[test]
    fn get_and_iterate() {
        let catalog = NodeCatalog::build(vec![
            node(1, NodeKind::Container, 5.0),
            node(2, NodeKind::Dump, 0.0),
            node(3, NodeKind::Depot, 0.0),
        ])
        .unwrap();

        assert_eq!(catalog.get(1).unwrap().id, 1);
        assert!(catalog.get(42).is_err());
        assert_eq!(catalog.containers().collect::<Vec<_>>(), vec![1]);
        assert_eq!(catalog.dumps().collect::<Vec<_>>(), vec![2]);
        assert_eq!(catalog.depots().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn mark_kind_lets_a_node_serve_both_roles() {
        let mut catalog = NodeCatalog::build(vec![node(1, NodeKind::Depot, 0.0)]).unwrap();
        catalog.mark_kind(1, NodeKind::Dump).unwrap();
        assert!(catalog.dumps().any(|id| id == 1));
        assert!(catalog.depots().any(|id| id == 1));
        assert!(catalog.get(1).unwrap().is_dump());
    }

    #[test]
    fn mark_kind_does_not_downgrade_dump_to_depot() {
        let mut catalog = NodeCatalog::build(vec![node(1, NodeKind::Dump, 0.0)]).unwrap();
        catalog.mark_kind(1, NodeKind::Depot).unwrap();
        assert!(catalog.get(1).unwrap().is_dump());
    }
}
