//! Build definitions and the metadata they expose

use crate::executor::{ExecutionEngine, ExecutionPlan, TargetGraph};
use crate::target::{ConditionTiming, Target};
use rivet_core::{Result, TargetName};
use rivet_params::{
    BuildContext, ParameterDescriptor, ParameterInfo, ParameterResolver, ValueProviders,
};
use serde::Serialize;

/// Capability implemented by a build: its targets and parameters as plain data.
///
/// Registration is explicit; nothing is discovered at run time.
pub trait BuildDefinition {
    /// Display name used in metadata
    fn name(&self) -> &str {
        "build"
    }

    fn targets(&self) -> Vec<Target>;

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        Vec::new()
    }

    fn value_providers(&self) -> ValueProviders {
        ValueProviders::new()
    }

    /// Targets run when the request is empty
    fn default_targets(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A definition validated against one run's context
pub struct PreparedBuild {
    name: String,
    graph: TargetGraph,
    resolver: ParameterResolver,
    defaults: Vec<TargetName>,
}

impl PreparedBuild {
    /// Build the graph and the resolver; both validate their declarations
    pub fn new(definition: &dyn BuildDefinition, context: BuildContext) -> Result<Self> {
        let graph = TargetGraph::build(definition.targets())?;
        let resolver = ParameterResolver::new(
            context,
            definition.parameters(),
            definition.value_providers(),
        )?;

        let defaults = definition
            .default_targets()
            .iter()
            .map(|name| {
                graph
                    .require(name)
                    .map(|node| graph.target(node).name().clone())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: definition.name().to_string(),
            graph,
            resolver,
            defaults,
        })
    }

    /// Plan the requested targets, or the defaults when nothing is requested
    pub fn plan<S: AsRef<str>>(&self, requested: &[S]) -> Result<ExecutionPlan> {
        ExecutionPlan::for_request(&self.graph, requested, &self.defaults)
    }

    pub fn engine(&self) -> ExecutionEngine<'_> {
        ExecutionEngine::new(&self.graph, &self.resolver)
    }

    pub fn graph(&self) -> &TargetGraph {
        &self.graph
    }

    pub fn resolver(&self) -> &ParameterResolver {
        &self.resolver
    }

    pub fn defaults(&self) -> &[TargetName] {
        &self.defaults
    }

    pub fn metadata(&self) -> BuildMetadata {
        BuildMetadata::new(&self.name, &self.graph, &self.resolver, &self.defaults)
    }
}

/// Target metadata for external renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub default: bool,
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub before: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
}

/// Everything a renderer needs to know about a build, without running it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildMetadata {
    pub name: String,
    pub targets: Vec<TargetInfo>,
    pub parameters: Vec<ParameterInfo>,
}

impl BuildMetadata {
    /// Relations are reported after normalisation, so `dependent_for` shows up
    /// as a `depends_on` of the other target. Unlisted targets are omitted.
    pub fn new(
        name: &str,
        graph: &TargetGraph,
        resolver: &ParameterResolver,
        defaults: &[TargetName],
    ) -> Self {
        let names = |nodes: Vec<petgraph::graph::NodeIndex>| -> Vec<String> {
            nodes
                .into_iter()
                .map(|node| graph.target(node).name().to_string())
                .collect()
        };
        let spelled = |targets: &[TargetName]| -> Vec<String> {
            targets
                .iter()
                .filter_map(|t| graph.get(t.as_str()))
                .map(|t| t.name().to_string())
                .collect()
        };

        let targets = graph
            .targets()
            .filter(|target| !target.is_unlisted())
            .filter_map(|target| {
                let node = graph.node(target.name().as_str())?;
                Some(TargetInfo {
                    name: target.name().to_string(),
                    description: target.description().map(str::to_string),
                    default: defaults.contains(target.name()),
                    depends_on: names(graph.dependencies_of(node)),
                    before: spelled(target.runs_before()),
                    after: spelled(target.runs_after()),
                    triggers: names(graph.triggered_by(node).to_vec()),
                    conditions: target
                        .conditions()
                        .iter()
                        .map(|c| match c.timing() {
                            ConditionTiming::Static => format!("{} (static)", c.description()),
                            ConditionTiming::Dynamic => c.description().to_string(),
                        })
                        .collect(),
                    requires: target.requirements().iter().map(|r| r.describe()).collect(),
                })
            })
            .collect();

        Self {
            name: name.to_string(),
            targets,
            parameters: resolver.descriptors().map(ParameterDescriptor::info).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
