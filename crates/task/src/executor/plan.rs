use super::graph::TargetGraph;
use petgraph::graph::NodeIndex;
use rivet_core::{ConfigurationError, Error, Result, TargetName};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Why a target is part of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusion {
    /// Explicitly asked for
    Requested,
    /// Transitive dependency of a requested target
    PulledIn,
    /// Added at run time by a successful triggering target
    Triggered,
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inclusion::Requested => f.write_str("requested"),
            Inclusion::PulledIn => f.write_str("dependency"),
            Inclusion::Triggered => f.write_str("triggered"),
        }
    }
}

/// One step of an execution plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub name: TargetName,
    pub inclusion: Inclusion,
    #[serde(skip)]
    pub(crate) node: NodeIndex,
}

/// Deterministic order of the targets a request needs.
///
/// Immutable once computed. Triggers do not appear here; the engine adds
/// triggered targets while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    entries: Vec<PlanEntry>,
}

impl ExecutionPlan {
    /// Plan the closure of `requested` over `depends_on`.
    ///
    /// The order satisfies every `depends_on`, `before` and `after` edge
    /// between included targets; unrelated targets keep declaration order.
    pub fn build(graph: &TargetGraph, requested: &[TargetName]) -> Result<Self> {
        if requested.is_empty() {
            return Err(ConfigurationError::NoTargetsRequested.into());
        }

        let roots: BTreeSet<NodeIndex> = requested
            .iter()
            .map(|name| graph.require(name.as_str()))
            .collect::<Result<_>>()?;
        let included = graph.closure(roots.iter().copied());
        let order = graph.order(&included);

        if order.len() != included.len() {
            // Unreachable for a graph that passed cycle detection
            return Err(Error::configuration(
                "execution plan does not cover every included target",
            ));
        }

        let entries = order
            .into_iter()
            .map(|node| PlanEntry {
                name: graph.target(node).name().clone(),
                inclusion: if roots.contains(&node) {
                    Inclusion::Requested
                } else {
                    Inclusion::PulledIn
                },
                node,
            })
            .collect();

        Ok(Self { entries })
    }

    /// Plan from raw request names, falling back to `defaults` when empty
    pub fn for_request<S: AsRef<str>>(
        graph: &TargetGraph,
        requested: &[S],
        defaults: &[TargetName],
    ) -> Result<Self> {
        let requested: Vec<TargetName> = if requested.is_empty() {
            defaults.to_vec()
        } else {
            requested
                .iter()
                .map(|name| TargetName::new(name.as_ref()))
                .collect::<Result<_>>()?
        };
        Self::build(graph, &requested)
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &TargetName> {
        self.entries.iter().map(|entry| &entry.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &TargetName) -> bool {
        self.entries.iter().any(|entry| &entry.name == name)
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, entry) in self.entries.iter().enumerate() {
            writeln!(f, "{:>3}. {} ({})", position + 1, entry.name, entry.inclusion)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;

    fn chain() -> TargetGraph {
        TargetGraph::build([
            Target::new("Clean"),
            Target::new("Compile").depends_on(["Clean"]),
            Target::new("Test").depends_on(["Compile"]),
            Target::new("Pack").depends_on(["Test"]),
        ])
        .unwrap()
    }

    fn order(plan: &ExecutionPlan) -> Vec<&str> {
        plan.names().map(TargetName::as_str).collect()
    }

    #[test]
    fn linear_chain_plans_dependencies_first() {
        let plan = ExecutionPlan::for_request(&chain(), &["Pack"], &[]).unwrap();
        assert_eq!(order(&plan), vec!["Clean", "Compile", "Test", "Pack"]);
        assert_eq!(plan.entries()[3].inclusion, Inclusion::Requested);
        assert_eq!(plan.entries()[0].inclusion, Inclusion::PulledIn);
    }

    #[test]
    fn ordering_hints_reorder_without_including() {
        let graph = TargetGraph::build([
            Target::new("Publish"),
            Target::new("Compile"),
            Target::new("Announce").after(["Publish"]).before(["Compile"]),
        ])
        .unwrap();

        let plan = ExecutionPlan::for_request(&graph, &["Compile", "Announce"], &[]).unwrap();
        assert_eq!(order(&plan), vec!["Announce", "Compile"]);

        let plan =
            ExecutionPlan::for_request(&graph, &["Compile", "Announce", "Publish"], &[]).unwrap();
        assert_eq!(order(&plan), vec!["Publish", "Announce", "Compile"]);
    }

    #[test]
    fn empty_request_uses_defaults() {
        let graph = chain();
        let defaults = vec![TargetName::new("Test").unwrap()];
        let plan = ExecutionPlan::for_request::<&str>(&graph, &[], &defaults).unwrap();
        assert_eq!(order(&plan), vec!["Clean", "Compile", "Test"]);
    }

    #[test]
    fn empty_request_without_defaults_is_rejected() {
        let err = ExecutionPlan::for_request::<&str>(&chain(), &[], &[]).unwrap_err();
        assert_eq!(
            err.as_configuration(),
            Some(&ConfigurationError::NoTargetsRequested)
        );
    }

    #[test]
    fn plans_are_identical_across_builds() {
        let first = ExecutionPlan::for_request(&chain(), &["pack"], &[]).unwrap();
        let second = ExecutionPlan::for_request(&chain(), &["PACK"], &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn display_lists_positions() {
        let plan = ExecutionPlan::for_request(&chain(), &["Compile"], &[]).unwrap();
        let text = plan.to_string();
        assert!(text.contains("  1. Clean (dependency)"));
        assert!(text.contains("  2. Compile (requested)"));
    }
}
