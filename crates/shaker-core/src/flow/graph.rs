//! Value-flow graph: nodes, facts, and the propagation worklist
//!
//! The graph stores one `FlowNode` per abstract value (function object,
//! object literal, variable, member, parameter slot, return value). Facts on
//! a node only ever grow, and every growth is announced to subscribed
//! handlers through a FIFO worklist rather than by direct invocation, so a
//! handler never observes a half-grown node and cyclic edges drain to a
//! fixed point.

use std::collections::VecDeque;

use id_arena::{Arena, Id};
use swc_common::Span;

pub type NodeId = Id<FlowNode>;
pub type FunctionId = Id<FunctionRecord>;

/// Mirroring across edges creates member chains one level deeper than the
/// chains it mirrors; cyclic stores (`o.m = o`) would grow such chains
/// without bound. Past this depth a node absorbs its own structural
/// children.
const MIRROR_DEPTH_LIMIT: u32 = 8;

/// A function definition encountered during seeding.
#[derive(Debug)]
pub struct FunctionRecord {
    pub id: FunctionId,
    /// Declared name, when the definition carried one.
    pub name: Option<String>,
    pub span: Span,
    /// The value node introduced for this definition.
    pub node: NodeId,
}

/// Per-node growth events delivered to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    FunctionAdded(FunctionId),
    MemberAdded(String, NodeId),
    DynamicMemberAdded(NodeId),
    ParameterAdded(usize, NodeId),
    ReturnValueAdded(NodeId),
}

/// Handlers are closed tagged records rather than boxed closures; the
/// worklist stays a flat queue of (handler, event) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Installed on the edge source by `connect`: mirrors growth into `sink`.
    Forward { sink: NodeId },
    /// Installed on the edge sink by `connect`: members and return values
    /// propagate against the edge direction.
    Reverse { source: NodeId },
    /// Installed on a node when its dynamic member is created: every named
    /// member value aliases the dynamic child.
    DynamicAlias { alias: NodeId },
}

#[derive(Debug)]
struct Job {
    handler: Handler,
    event: Event,
}

/// An abstract value in the flow graph.
#[derive(Debug)]
pub struct FlowNode {
    pub id: NodeId,
    /// Span of the AST node that introduced this value, when any.
    pub span: Option<Span>,
    mirror_depth: u32,
    functions: Vec<FunctionId>,
    members: Vec<(String, NodeId)>,
    dynamic_member: Option<NodeId>,
    parameters: Vec<Option<NodeId>>,
    return_value: Option<NodeId>,
    successors: Vec<NodeId>,
    handlers: Vec<Handler>,
}

impl FlowNode {
    pub fn functions(&self) -> &[FunctionId] {
        &self.functions
    }

    pub fn has_function(&self, f: FunctionId) -> bool {
        self.functions.contains(&f)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.members.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn member_if_present(&self, name: &str) -> Option<NodeId> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn dynamic_member_if_present(&self) -> Option<NodeId> {
        self.dynamic_member
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter_if_present(&self, index: usize) -> Option<NodeId> {
        self.parameters.get(index).copied().flatten()
    }

    pub fn return_value_if_present(&self) -> Option<NodeId> {
        self.return_value
    }

    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }
}

/// The graph plus its propagation worklist.
#[derive(Debug)]
pub struct FlowGraph {
    nodes: Arena<FlowNode>,
    functions: Arena<FunctionRecord>,
    queue: VecDeque<Job>,
}

impl Default for FlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowGraph {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            functions: Arena::new(),
            queue: VecDeque::new(),
        }
    }

    pub fn create_node(&mut self, span: Option<Span>) -> NodeId {
        self.alloc_node(span, 0)
    }

    fn alloc_node(&mut self, span: Option<Span>, mirror_depth: u32) -> NodeId {
        self.nodes.alloc_with_id(|id| FlowNode {
            id,
            span,
            mirror_depth,
            functions: Vec::new(),
            members: Vec::new(),
            dynamic_member: None,
            parameters: Vec::new(),
            return_value: None,
            successors: Vec::new(),
            handlers: Vec::new(),
        })
    }

    pub fn register_function(
        &mut self,
        name: Option<String>,
        span: Span,
        node: NodeId,
    ) -> FunctionId {
        self.functions.alloc_with_id(|id| FunctionRecord {
            id,
            name,
            span,
            node,
        })
    }

    pub fn get(&self, id: NodeId) -> &FlowNode {
        &self.nodes[id]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionRecord {
        &self.functions[id]
    }

    pub fn function_records(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.functions.iter().map(|(_, record)| record)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Add `f` to the node's function set. Broadcast on first addition only.
    pub fn add_function(&mut self, node: NodeId, f: FunctionId) {
        if self.nodes[node].functions.contains(&f) {
            return;
        }
        self.nodes[node].functions.push(f);
        self.broadcast(node, Event::FunctionAdded(f));
    }

    /// Get or create the named member child. Creation is announced once.
    pub fn member(&mut self, node: NodeId, name: &str) -> NodeId {
        let depth = self.nodes[node].mirror_depth;
        self.member_at(node, name, depth)
    }

    fn mirrored_member(&mut self, node: NodeId, name: &str) -> NodeId {
        let depth = self.nodes[node].mirror_depth;
        if depth >= MIRROR_DEPTH_LIMIT {
            return node;
        }
        self.member_at(node, name, depth + 1)
    }

    fn member_at(&mut self, node: NodeId, name: &str, depth: u32) -> NodeId {
        if let Some(existing) = self.nodes[node].member_if_present(name) {
            return existing;
        }
        let child = self.alloc_node(None, depth);
        self.nodes[node].members.push((name.to_string(), child));
        self.broadcast(node, Event::MemberAdded(name.to_string(), child));
        child
    }

    /// Get or create the dynamic-member child. On creation an internal
    /// handler is installed so that every named member of this node aliases
    /// the dynamic child in both directions.
    pub fn dynamic_member(&mut self, node: NodeId) -> NodeId {
        let depth = self.nodes[node].mirror_depth;
        self.dynamic_member_at(node, depth)
    }

    fn mirrored_dynamic_member(&mut self, node: NodeId) -> NodeId {
        let depth = self.nodes[node].mirror_depth;
        if depth >= MIRROR_DEPTH_LIMIT {
            return node;
        }
        self.dynamic_member_at(node, depth + 1)
    }

    fn dynamic_member_at(&mut self, node: NodeId, depth: u32) -> NodeId {
        if let Some(existing) = self.nodes[node].dynamic_member {
            return existing;
        }
        let child = self.alloc_node(None, depth);
        self.nodes[node].dynamic_member = Some(child);
        self.broadcast(node, Event::DynamicMemberAdded(child));
        self.subscribe(node, Handler::DynamicAlias { alias: child });
        child
    }

    /// Get or create the parameter node at `index`, padding gaps with
    /// absent entries.
    pub fn parameter(&mut self, node: NodeId, index: usize) -> NodeId {
        if let Some(existing) = self.nodes[node].parameter_if_present(index) {
            return existing;
        }
        let depth = self.nodes[node].mirror_depth;
        let child = self.alloc_node(None, depth);
        let parameters = &mut self.nodes[node].parameters;
        if parameters.len() <= index {
            parameters.resize(index + 1, None);
        }
        parameters[index] = Some(child);
        self.broadcast(node, Event::ParameterAdded(index, child));
        child
    }

    /// Get or create the return-value node.
    pub fn return_value(&mut self, node: NodeId) -> NodeId {
        if let Some(existing) = self.nodes[node].return_value {
            return existing;
        }
        let depth = self.nodes[node].mirror_depth;
        let child = self.alloc_node(None, depth);
        self.nodes[node].return_value = Some(child);
        self.broadcast(node, Event::ReturnValueAdded(child));
        child
    }

    /// Add the directed edge `from -> to` and install the paired handlers
    /// that keep both ends saturated. Duplicate edges coalesce.
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        if from == to {
            return;
        }
        if self.nodes[from].successors.contains(&to) {
            return;
        }
        self.nodes[from].successors.push(to);
        self.subscribe(from, Handler::Forward { sink: to });
        self.subscribe(to, Handler::Reverse { source: from });
    }

    /// Subscribe a handler and retro-notify it of every fact already
    /// present, in fact-creation order. Fact-addition broadcasts snapshot
    /// the handler list, so a late subscriber observes each prior fact
    /// exactly once, through this path.
    pub fn subscribe(&mut self, node: NodeId, handler: Handler) {
        self.nodes[node].handlers.push(handler);

        let mut backlog = Vec::new();
        let n = &self.nodes[node];
        for &f in &n.functions {
            backlog.push(Event::FunctionAdded(f));
        }
        for (name, child) in &n.members {
            backlog.push(Event::MemberAdded(name.clone(), *child));
        }
        if let Some(dynamic) = n.dynamic_member {
            backlog.push(Event::DynamicMemberAdded(dynamic));
        }
        for (index, parameter) in n.parameters.iter().enumerate() {
            if let Some(p) = parameter {
                backlog.push(Event::ParameterAdded(index, *p));
            }
        }
        if let Some(rv) = n.return_value {
            backlog.push(Event::ReturnValueAdded(rv));
        }

        for event in backlog {
            self.queue.push_back(Job { handler, event });
        }
    }

    fn broadcast(&mut self, node: NodeId, event: Event) {
        let handlers = self.nodes[node].handlers.clone();
        for handler in handlers {
            self.queue.push_back(Job {
                handler,
                event: event.clone(),
            });
        }
    }

    /// Drain the worklist to quiescence. Callbacks may enqueue further
    /// callbacks; execution order is strictly enqueue order. Returns the
    /// number of dispatched callbacks.
    pub fn saturate(&mut self) -> usize {
        let mut dispatched = 0;
        while let Some(job) = self.queue.pop_front() {
            self.dispatch(job);
            dispatched += 1;
        }
        dispatched
    }

    fn dispatch(&mut self, job: Job) {
        match job.handler {
            Handler::Forward { sink } => match job.event {
                Event::FunctionAdded(f) => self.add_function(sink, f),
                Event::MemberAdded(name, value) => {
                    let mirror = self.mirrored_member(sink, &name);
                    self.connect(value, mirror);
                    self.connect(mirror, value);
                }
                Event::DynamicMemberAdded(dynamic) => {
                    let mirror = self.mirrored_dynamic_member(sink);
                    self.connect(dynamic, mirror);
                    self.connect(mirror, dynamic);
                }
                Event::ParameterAdded(index, parameter) => {
                    let slot = self.parameter(sink, index);
                    self.connect(parameter, slot);
                }
                Event::ReturnValueAdded(rv) => {
                    let sink_rv = self.return_value(sink);
                    self.connect(sink_rv, rv);
                }
            },
            Handler::Reverse { source } => match job.event {
                Event::FunctionAdded(_) | Event::ParameterAdded(..) => {}
                Event::MemberAdded(name, value) => {
                    let mirror = self.mirrored_member(source, &name);
                    self.connect(value, mirror);
                    self.connect(mirror, value);
                }
                Event::DynamicMemberAdded(dynamic) => {
                    let mirror = self.mirrored_dynamic_member(source);
                    self.connect(dynamic, mirror);
                    self.connect(mirror, dynamic);
                }
                Event::ReturnValueAdded(rv) => {
                    let source_rv = self.return_value(source);
                    self.connect(rv, source_rv);
                }
            },
            Handler::DynamicAlias { alias } => {
                if let Event::MemberAdded(_, value) = job.event {
                    self.connect(alias, value);
                    self.connect(value, alias);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_common::DUMMY_SP;

    fn graph_with_function(graph: &mut FlowGraph) -> (NodeId, FunctionId) {
        let node = graph.create_node(None);
        let f = graph.register_function(Some("f".to_string()), DUMMY_SP, node);
        graph.add_function(node, f);
        (node, f)
    }

    #[test]
    fn member_accessor_is_idempotent() {
        let mut graph = FlowGraph::new();
        let node = graph.create_node(None);

        let first = graph.member(node, "m");
        let second = graph.member(node, "m");

        assert_eq!(first, second);
        assert_eq!(graph.get(node).members().count(), 1);
    }

    #[test]
    fn dynamic_member_accessor_is_idempotent() {
        let mut graph = FlowGraph::new();
        let node = graph.create_node(None);

        assert_eq!(graph.dynamic_member(node), graph.dynamic_member(node));
    }

    #[test]
    fn return_value_accessor_is_idempotent() {
        let mut graph = FlowGraph::new();
        let node = graph.create_node(None);

        assert_eq!(graph.return_value(node), graph.return_value(node));
    }

    #[test]
    fn parameter_accessor_pads_gaps() {
        let mut graph = FlowGraph::new();
        let node = graph.create_node(None);

        let third = graph.parameter(node, 2);

        assert_eq!(graph.get(node).parameter_count(), 3);
        assert_eq!(graph.get(node).parameter_if_present(0), None);
        assert_eq!(graph.get(node).parameter_if_present(1), None);
        assert_eq!(graph.get(node).parameter_if_present(2), Some(third));
        assert_eq!(graph.parameter(node, 2), third);
    }

    #[test]
    fn duplicate_edges_coalesce() {
        let mut graph = FlowGraph::new();
        let a = graph.create_node(None);
        let b = graph.create_node(None);

        graph.connect(a, b);
        graph.connect(a, b);

        assert_eq!(graph.get(a).successors().len(), 1);
    }

    #[test]
    fn self_edges_are_ignored() {
        let mut graph = FlowGraph::new();
        let a = graph.create_node(None);

        graph.connect(a, a);

        assert!(graph.get(a).successors().is_empty());
    }

    #[test]
    fn functions_flow_forward_along_edges() {
        let mut graph = FlowGraph::new();
        let (a, f) = graph_with_function(&mut graph);
        let b = graph.create_node(None);

        graph.connect(a, b);
        graph.saturate();

        assert!(graph.get(b).has_function(f));
    }

    #[test]
    fn functions_flow_transitively() {
        let mut graph = FlowGraph::new();
        let (a, f) = graph_with_function(&mut graph);
        let b = graph.create_node(None);
        let c = graph.create_node(None);

        graph.connect(a, b);
        graph.connect(b, c);
        graph.saturate();

        assert!(graph.get(c).has_function(f));
    }

    #[test]
    fn late_edge_observes_existing_facts() {
        let mut graph = FlowGraph::new();
        let (a, f) = graph_with_function(&mut graph);
        let b = graph.create_node(None);
        graph.saturate();

        // The function fact predates the edge; retro-notification must
        // still deliver it.
        graph.connect(a, b);
        graph.saturate();

        assert!(graph.get(b).has_function(f));
    }

    #[test]
    fn fact_added_after_edge_still_flows() {
        let mut graph = FlowGraph::new();
        let a = graph.create_node(None);
        let b = graph.create_node(None);
        graph.connect(a, b);
        graph.saturate();

        let (source, f) = graph_with_function(&mut graph);
        graph.connect(source, a);
        graph.saturate();

        assert!(graph.get(a).has_function(f));
        assert!(graph.get(b).has_function(f));
    }

    #[test]
    fn members_alias_bidirectionally_across_edges() {
        let mut graph = FlowGraph::new();
        let (value, f) = graph_with_function(&mut graph);
        let a = graph.create_node(None);
        let b = graph.create_node(None);

        let a_m = graph.member(a, "m");
        graph.connect(value, a_m);
        graph.connect(a, b);
        graph.saturate();

        let b_m = graph
            .get(b)
            .member_if_present("m")
            .expect("member should be mirrored onto the sink");
        assert!(graph.get(b_m).has_function(f));

        // Writes through the sink's member must appear at the source too.
        let other = graph.create_node(None);
        let g = graph.register_function(Some("g".to_string()), DUMMY_SP, other);
        graph.add_function(other, g);
        graph.connect(other, b_m);
        graph.saturate();

        assert!(graph.get(a_m).has_function(g));
    }

    #[test]
    fn member_function_sets_equalize_after_saturation() {
        let mut graph = FlowGraph::new();
        let (value, f) = graph_with_function(&mut graph);
        let a = graph.create_node(None);
        let b = graph.create_node(None);

        graph.connect(a, b);
        graph.saturate();

        let a_m = graph.member(a, "k");
        graph.connect(value, a_m);
        graph.saturate();

        let b_m = graph.get(b).member_if_present("k").unwrap();
        assert_eq!(
            graph.get(a_m).functions(),
            graph.get(b_m).functions(),
            "member function sets should be equal on both ends"
        );
        assert!(graph.get(b_m).has_function(f));
    }

    #[test]
    fn dynamic_member_aliases_named_members() {
        let mut graph = FlowGraph::new();
        let (value, f) = graph_with_function(&mut graph);
        let obj = graph.create_node(None);

        let m = graph.member(obj, "m");
        graph.connect(value, m);
        let dynamic = graph.dynamic_member(obj);
        graph.saturate();

        assert!(graph.get(dynamic).has_function(f));
    }

    #[test]
    fn dynamic_member_aliases_members_added_later() {
        let mut graph = FlowGraph::new();
        let obj = graph.create_node(None);
        let dynamic = graph.dynamic_member(obj);
        graph.saturate();

        let (value, f) = graph_with_function(&mut graph);
        let m = graph.member(obj, "later");
        graph.connect(value, m);
        graph.saturate();

        assert!(graph.get(dynamic).has_function(f));
        // And the aliasing runs both ways.
        assert_eq!(graph.get(m).functions(), graph.get(dynamic).functions());
    }

    #[test]
    fn parameters_mirror_into_successors() {
        let mut graph = FlowGraph::new();
        let a = graph.create_node(None);
        let b = graph.create_node(None);
        graph.connect(a, b);

        let a_p = graph.parameter(a, 1);
        graph.saturate();

        let b_p = graph
            .get(b)
            .parameter_if_present(1)
            .expect("parameter slot should be mirrored");

        let (value, f) = graph_with_function(&mut graph);
        graph.connect(value, a_p);
        graph.saturate();

        assert!(graph.get(b_p).has_function(f));
    }

    #[test]
    fn return_values_flow_against_edges() {
        let mut graph = FlowGraph::new();
        let a = graph.create_node(None);
        let b = graph.create_node(None);
        graph.connect(a, b);

        let a_rv = graph.return_value(a);
        graph.saturate();

        let b_rv = graph
            .get(b)
            .return_value_if_present()
            .expect("return value should exist on the sink");

        let (value, f) = graph_with_function(&mut graph);
        graph.connect(value, b_rv);
        graph.saturate();

        assert!(
            graph.get(a_rv).has_function(f),
            "callee returns should reach the caller side"
        );
    }

    #[test]
    fn cyclic_edges_terminate() {
        let mut graph = FlowGraph::new();
        let (value, f) = graph_with_function(&mut graph);
        let a = graph.create_node(None);
        let b = graph.create_node(None);

        graph.connect(a, b);
        graph.connect(b, a);
        let m = graph.member(a, "m");
        graph.connect(value, m);
        graph.saturate();

        let b_m = graph.get(b).member_if_present("m").unwrap();
        assert!(graph.get(b_m).has_function(f));
        assert!(graph.get(a).successors().contains(&b));
        assert!(graph.get(b).successors().contains(&a));
    }

    #[test]
    fn cyclic_store_terminates() {
        // Models `o.m = o`: the object flows into its own member.
        let mut graph = FlowGraph::new();
        let o = graph.create_node(None);
        let m = graph.member(o, "m");
        graph.connect(o, m);
        graph.saturate();

        assert!(graph.node_count() < 64, "mirror chains must stay bounded");
    }

    #[test]
    fn mutually_cyclic_stores_terminate() {
        // Models `a.m = b; b.m = a`.
        let mut graph = FlowGraph::new();
        let a = graph.create_node(None);
        let b = graph.create_node(None);
        let a_m = graph.member(a, "m");
        let b_m = graph.member(b, "m");
        graph.connect(b, a_m);
        graph.connect(a, b_m);
        graph.saturate();

        assert!(graph.node_count() < 1024, "mirror chains must stay bounded");
    }

    #[test]
    fn saturation_is_monotone() {
        let mut graph = FlowGraph::new();
        let (a, f) = graph_with_function(&mut graph);
        let b = graph.create_node(None);
        graph.connect(a, b);
        graph.saturate();

        assert!(graph.get(b).has_function(f));

        // Further seeding never removes facts.
        let (c, g) = graph_with_function(&mut graph);
        graph.connect(c, b);
        graph.saturate();

        assert!(graph.get(b).has_function(f));
        assert!(graph.get(b).has_function(g));
    }

    #[test]
    fn function_set_has_no_duplicates() {
        let mut graph = FlowGraph::new();
        let (a, f) = graph_with_function(&mut graph);
        let b = graph.create_node(None);

        graph.connect(a, b);
        graph.connect(b, a);
        graph.saturate();

        let delivered = graph
            .get(b)
            .functions()
            .iter()
            .filter(|&&id| id == f)
            .count();
        assert_eq!(delivered, 1);
    }
}
