//! Value-flow analysis over the SWC AST
//!
//! This module computes, for every named binding, object literal, and
//! function definition in a program, the set of function definitions that
//! may flow into it and the object members reachable from it. The walk in
//! `seed` primes the graph from syntax; `graph` then saturates it through
//! an event-handler worklist until no propagation rule can add a fact.

pub mod graph;
mod seed;

use std::collections::HashMap;

use swc_ecma_ast::Module;

pub use graph::{Event, FlowGraph, FlowNode, FunctionId, FunctionRecord, Handler, NodeId};

use seed::Seeder;

/// Analysis knobs.
#[derive(Debug, Clone, Copy)]
pub struct FlowOptions {
    /// Connect `var x = init` initializer values into the variable node.
    pub var_init_flow: bool,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            var_init_flow: true,
        }
    }
}

/// A saturated value-flow graph for one program, plus its name bindings.
pub struct FlowAnalysis {
    graph: FlowGraph,
    bindings: HashMap<String, NodeId>,
    exports: Vec<String>,
    dynamic: NodeId,
}

impl FlowAnalysis {
    pub fn build(module: &Module) -> Self {
        Self::build_with_options(module, FlowOptions::default())
    }

    pub fn build_with_options(module: &Module, options: FlowOptions) -> Self {
        let mut graph = FlowGraph::new();
        let dynamic = graph.create_node(None);
        let mut bindings = HashMap::new();
        let mut exports = Vec::new();

        let mut seeder = Seeder::new(
            &mut graph,
            &mut bindings,
            &mut exports,
            dynamic,
            options.var_init_flow,
        );
        seeder.visit_module(module);

        let dispatched = graph.saturate();
        tracing::debug!(
            nodes = graph.node_count(),
            functions = graph.function_count(),
            callbacks = dispatched,
            "value-flow graph saturated"
        );

        Self {
            graph,
            bindings,
            exports,
            dynamic,
        }
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    /// The node bound to a declared name, if any.
    pub fn binding(&self, name: &str) -> Option<NodeId> {
        self.bindings.get(name).copied()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.bindings.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Names exported by the module, in source order.
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    /// The per-analysis sink absorbing unresolved references.
    pub fn dynamic_node(&self) -> NodeId {
        self.dynamic
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.graph.function_records()
    }

    /// Names of the functions that may flow into a node, for assertions and
    /// debugging. Anonymous definitions yield `None`.
    pub fn function_names(&self, node: NodeId) -> Vec<Option<&str>> {
        self.graph
            .get(node)
            .functions()
            .iter()
            .map(|&f| self.graph.function(f).name.as_deref())
            .collect()
    }
}
