//! Reachability marking over a saturated value-flow analysis
//!
//! Starting from root bindings and the dynamic node, every function that
//! may flow into a reachable value is live. Marking a function also marks
//! the node its definition introduced, so values stored by a live function
//! body stay reachable through it.

use std::collections::HashSet;

use crate::flow::{FlowAnalysis, FunctionId, NodeId};

#[derive(Debug)]
pub struct Reachability {
    live: HashSet<FunctionId>,
}

impl Reachability {
    /// Mark live functions starting from the given root binding names plus
    /// the dynamic node. Root names without a binding are ignored.
    pub fn compute(analysis: &FlowAnalysis, roots: &[String]) -> Self {
        let mut marker = Marker {
            analysis,
            live: HashSet::new(),
            visited: HashSet::new(),
        };

        for root in roots {
            if let Some(node) = analysis.binding(root) {
                marker.mark_node(node);
            }
        }
        marker.mark_node(analysis.dynamic_node());

        Self { live: marker.live }
    }

    pub fn is_live(&self, f: FunctionId) -> bool {
        self.live.contains(&f)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

struct Marker<'a> {
    analysis: &'a FlowAnalysis,
    live: HashSet<FunctionId>,
    visited: HashSet<NodeId>,
}

impl Marker<'_> {
    fn mark_node(&mut self, id: NodeId) {
        if !self.visited.insert(id) {
            return;
        }

        let node = self.analysis.graph().get(id);
        let functions: Vec<FunctionId> = node.functions().to_vec();
        for f in functions {
            self.mark_function(f);
        }
        let children: Vec<NodeId> = node
            .members()
            .map(|(_, child)| child)
            .chain(node.dynamic_member_if_present())
            .chain((0..node.parameter_count()).filter_map(|i| node.parameter_if_present(i)))
            .chain(node.return_value_if_present())
            .collect();
        for child in children {
            self.mark_node(child);
        }
    }

    fn mark_function(&mut self, f: FunctionId) {
        if self.live.insert(f) {
            let node = self.analysis.graph().function(f).node;
            self.mark_node(node);
        }
    }
}
