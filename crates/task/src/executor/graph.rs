//! Petgraph-based target graph
//!
//! Nodes are targets in declaration order, so a node index doubles as the
//! declaration index used for stable tie-breaking. Edges point from the
//! target that must come first to the target that must wait.

use crate::target::Target;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rivet_core::{Error, Result, TargetName};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, VecDeque};

/// Edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Inclusion and ordering: the dependent pulls the dependency into a run
    DependsOn,
    /// Ordering only, between targets that are both in a run
    Ordering,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Validated, acyclic target graph
pub struct TargetGraph {
    graph: DiGraph<Target, Relation>,
    index: HashMap<TargetName, NodeIndex>,
    /// node index -> targets it triggers, in declaration order
    triggers: Vec<Vec<NodeIndex>>,
}

impl TargetGraph {
    /// Build and validate the graph.
    ///
    /// Fails on invalid or duplicate names, on relations to undeclared
    /// targets, and on cycles through any combination of `depends_on`,
    /// `before` and `after`.
    pub fn build(targets: impl IntoIterator<Item = Target>) -> Result<Self> {
        let targets: Vec<Target> = targets.into_iter().collect();

        let mut counts: HashMap<&TargetName, usize> = HashMap::with_capacity(targets.len());
        for target in &targets {
            TargetName::new(target.name().as_str())?;
            *counts.entry(target.name()).or_insert(0) += 1;
        }
        let duplicates: Vec<&str> = targets
            .iter()
            .filter(|t| counts.get(t.name()).copied().unwrap_or(0) > 1)
            .map(|t| t.name().as_str())
            .collect();
        if !duplicates.is_empty() {
            return Err(Error::duplicate_targets(duplicates));
        }

        let mut graph = DiGraph::with_capacity(targets.len(), targets.len() * 2);
        let mut index = HashMap::with_capacity(targets.len());
        for target in targets {
            let name = target.name().clone();
            let node = graph.add_node(target);
            index.insert(name, node);
        }

        let lookup = |owner: &Target, name: &TargetName| -> Result<NodeIndex> {
            index.get(name).copied().ok_or_else(|| {
                Error::unknown_target(name.as_str(), Some(owner.name().to_string()))
            })
        };

        let mut edges = Vec::new();
        let mut triggers = vec![Vec::new(); graph.node_count()];
        for node in graph.node_indices() {
            let target = &graph[node];
            for (_, name) in target.references() {
                lookup(target, name)?;
            }
            for name in target.dependencies() {
                edges.push((lookup(target, name)?, node, Relation::DependsOn));
            }
            for name in target.dependents() {
                edges.push((node, lookup(target, name)?, Relation::DependsOn));
            }
            for name in target.runs_before() {
                edges.push((node, lookup(target, name)?, Relation::Ordering));
            }
            for name in target.runs_after() {
                edges.push((lookup(target, name)?, node, Relation::Ordering));
            }
            for name in target.triggered_targets() {
                triggers[node.index()].push(lookup(target, name)?);
            }
            for name in target.triggering_targets() {
                triggers[lookup(target, name)?.index()].push(node);
            }
        }

        for (from, to, relation) in edges {
            match graph.find_edge(from, to) {
                // DependsOn subsumes an ordering hint between the same pair
                Some(edge) => {
                    if relation == Relation::DependsOn {
                        graph[edge] = Relation::DependsOn;
                    }
                }
                None => {
                    graph.add_edge(from, to, relation);
                }
            }
        }
        for list in &mut triggers {
            let mut seen = BTreeSet::new();
            list.retain(|node| seen.insert(*node));
        }

        let built = Self {
            graph,
            index,
            triggers,
        };
        if let Some(cycle) = built.find_cycle() {
            return Err(Error::dependency_cycle(cycle));
        }

        tracing::debug!(
            targets = built.graph.node_count(),
            edges = built.graph.edge_count(),
            "target graph built"
        );
        Ok(built)
    }

    /// Transitive `depends_on` closure of the requested targets.
    ///
    /// Ordering hints and triggers never pull targets in. The result is in
    /// declaration order.
    pub fn expand(&self, requested: &[TargetName]) -> Result<Vec<TargetName>> {
        let roots = requested
            .iter()
            .map(|name| self.require(name.as_str()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .closure(roots)
            .into_iter()
            .map(|node| self.graph[node].name().clone())
            .collect())
    }

    /// Node for a declared name, matched case-insensitively
    pub fn node(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(&TargetName::new_unchecked(name)).copied()
    }

    /// Like [`TargetGraph::node`], failing with a configuration error
    pub fn require(&self, name: &str) -> Result<NodeIndex> {
        self.node(name)
            .ok_or_else(|| Error::unknown_target(name, None))
    }

    pub fn target(&self, node: NodeIndex) -> &Target {
        &self.graph[node]
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.node(name).map(|node| &self.graph[node])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    /// Targets in declaration order
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.graph.node_indices().map(move |node| &self.graph[node])
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Direct `depends_on` predecessors, in declaration order
    pub fn dependencies_of(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.predecessors(node, Some(Relation::DependsOn))
    }

    /// Targets triggered by a successful run of `node`
    pub fn triggered_by(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.triggers[node.index()]
    }

    /// Breadth-first `depends_on` closure, sorted by declaration index
    pub(crate) fn closure(&self, roots: impl IntoIterator<Item = NodeIndex>) -> BTreeSet<NodeIndex> {
        let mut included = BTreeSet::new();
        let mut queue: VecDeque<NodeIndex> = roots.into_iter().collect();
        while let Some(node) = queue.pop_front() {
            if included.insert(node) {
                queue.extend(self.dependencies_of(node));
            }
        }
        included
    }

    /// Topological order of `included` under every edge kind.
    ///
    /// Kahn's algorithm with a min-heap on declaration index, so unrelated
    /// targets keep their declaration order.
    pub(crate) fn order(&self, included: &BTreeSet<NodeIndex>) -> Vec<NodeIndex> {
        let mut in_degree: HashMap<NodeIndex, usize> = included
            .iter()
            .map(|&node| {
                let degree = self
                    .graph
                    .edges_directed(node, Direction::Incoming)
                    .filter(|edge| included.contains(&edge.source()))
                    .count();
                (node, degree)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&node, _)| Reverse(node))
            .collect();

        let mut order = Vec::with_capacity(included.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&edge.target()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(edge.target()));
                    }
                }
            }
        }
        order
    }

    fn predecessors(&self, node: NodeIndex, relation: Option<Relation>) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .filter(|edge| relation.map_or(true, |r| *edge.weight() == r))
            .map(|edge| edge.source())
            .collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }

    /// Depth-first search along "waits for" edges, tracking the active path.
    ///
    /// Returns the cycle members in order, ending with the first member again.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut state = vec![Visit::New; self.graph.node_count()];
        let mut path = Vec::new();
        for start in self.graph.node_indices() {
            if state[start.index()] == Visit::New {
                if let Some(cycle) = self.visit(start, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit(
        &self,
        node: NodeIndex,
        state: &mut [Visit],
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<String>> {
        state[node.index()] = Visit::Active;
        path.push(node);

        for next in self.predecessors(node, None) {
            match state[next.index()] {
                Visit::Active => {
                    if let Some(start) = path.iter().position(|&n| n == next) {
                        let mut cycle: Vec<String> = path[start..]
                            .iter()
                            .map(|&n| self.graph[n].name().to_string())
                            .collect();
                        cycle.push(self.graph[next].name().to_string());
                        return Some(cycle);
                    }
                }
                Visit::New => {
                    if let Some(cycle) = self.visit(next, state, path) {
                        return Some(cycle);
                    }
                }
                Visit::Done => {}
            }
        }

        path.pop();
        state[node.index()] = Visit::Done;
        None
    }
}

impl std::fmt::Debug for TargetGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetGraph")
            .field(
                "targets",
                &self.targets().map(|t| t.name().as_str()).collect::<Vec<_>>(),
            )
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}
