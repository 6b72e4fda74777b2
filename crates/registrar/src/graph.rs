//! Reference graph between named instances.
//!
//! Each resolved named instance is a node; each assignment or element that
//! references another instance adds an edge from the referencing instance to
//! the referenced one. Accessors are evaluated lazily, so cycles are legal.
//! The graph reports them as informational diagnostics and still provides an
//! initialization order for hosts that build instances eagerly.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, info};
use petgraph::{
    algo::kosaraju_scc,
    graph::{DiGraph, NodeIndex},
};

use registrar_core::{canonical::NamedInstance, provenance::ProvenanceOrigin};
use registrar_parser::{
    error::{Diagnostic, ErrorCode},
    resolve::ResolvedModel,
};

/// A named instance in the reference graph.
#[derive(Debug, Clone)]
struct InstanceNode {
    name: String,
    origin: Option<ProvenanceOrigin>,
}

/// Directed graph of references between named instances.
#[derive(Debug)]
pub struct InstanceGraph {
    graph: DiGraph<InstanceNode, ()>,
    node_map: IndexMap<String, NodeIndex>,
}

impl InstanceGraph {
    /// Build the graph of every instance in `model`.
    ///
    /// References to instances missing from the model are ignored.
    pub fn build(model: &ResolvedModel) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = IndexMap::new();

        for (name, instance) in model.instances() {
            let index = graph.add_node(InstanceNode {
                name: name.clone(),
                origin: instance.provenance().origin().cloned(),
            });
            node_map.insert(name.clone(), index);
        }

        for (name, instance) in model.instances() {
            let from = node_map[name];
            for target in references(instance) {
                let Some(&to) = node_map.get(target) else {
                    continue;
                };
                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        debug!(nodes = graph.node_count(), edges = graph.edge_count(); "Instance graph built");
        Self { graph, node_map }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` if `from` references `to` directly.
    pub fn references(&self, from: &str, to: &str) -> bool {
        match (self.node_map.get(from), self.node_map.get(to)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    /// Instance names ordered so that referenced instances come before the
    /// instances referencing them.
    ///
    /// Independent instances, and instances inside one cycle, keep their
    /// declaration order.
    pub fn initialization_order(&self) -> Vec<String> {
        let components = self.components();

        let mut component_of = HashMap::new();
        for (id, members) in components.iter().enumerate() {
            for &node in members {
                component_of.insert(node, id);
            }
        }

        // Depth-first over components, dependencies emitted before their
        // dependents. The stack holds each open component with the
        // dependencies it has yet to visit.
        let mut visited = vec![false; components.len()];
        let mut order = Vec::with_capacity(self.graph.node_count());
        for node in self.graph.node_indices() {
            let root = component_of[&node];
            if visited[root] {
                continue;
            }
            visited[root] = true;

            let dependencies = self.dependencies(root, &components, &component_of);
            let mut stack = vec![(root, dependencies.into_iter())];
            while let Some((id, pending)) = stack.last_mut() {
                let id = *id;
                match pending.next() {
                    Some(dep) if !visited[dep] => {
                        visited[dep] = true;
                        let dependencies = self.dependencies(dep, &components, &component_of);
                        stack.push((dep, dependencies.into_iter()));
                    }
                    Some(_) => {}
                    None => {
                        stack.pop();
                        order.extend(
                            components[id]
                                .iter()
                                .map(|&node| self.graph[node].name.clone()),
                        );
                    }
                }
            }
        }

        info!(instances = order.len(); "Initialization order computed");
        order
    }

    /// Groups of instances that reference each other, in declaration order of
    /// their first member. A single instance referencing itself is a cycle.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        self.components()
            .into_iter()
            .filter(|members| self.is_cycle(members))
            .map(|members| {
                members
                    .into_iter()
                    .map(|node| self.graph[node].name.clone())
                    .collect()
            })
            .collect()
    }

    /// One E310 informational diagnostic per reference cycle.
    pub fn cycle_diagnostics(&self) -> Vec<Diagnostic> {
        self.components()
            .into_iter()
            .filter(|members| self.is_cycle(members))
            .map(|members| {
                let first = &self.graph[members[0]];
                let message = if members.len() == 1 {
                    format!("named instance `{}` references itself", first.name)
                } else {
                    let names = members
                        .iter()
                        .map(|&node| format!("`{}`", self.graph[node].name))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("named instances {names} form a reference cycle")
                };

                let mut diagnostic = Diagnostic::info(message)
                    .with_code(ErrorCode::E310)
                    .with_help("accessors are evaluated lazily; eager initialization follows declaration order inside the cycle");
                if let Some(origin) = &first.origin {
                    diagnostic = diagnostic.with_location(origin.clone());
                }
                diagnostic
            })
            .collect()
    }

    /// Strongly connected components, members sorted by declaration order,
    /// components sorted by their first member.
    /// Kosaraju's algorithm is iterative, like the ordering walk.
    fn components(&self) -> Vec<Vec<NodeIndex>> {
        let mut components = kosaraju_scc(&self.graph);
        for members in &mut components {
            members.sort();
        }
        components.sort_by_key(|members| members[0]);
        components
    }

    fn is_cycle(&self, members: &[NodeIndex]) -> bool {
        match members {
            [single] => self.graph.contains_edge(*single, *single),
            _ => true,
        }
    }

    /// Components referenced by component `id`, ascending, without `id`.
    fn dependencies(
        &self,
        id: usize,
        components: &[Vec<NodeIndex>],
        component_of: &HashMap<NodeIndex, usize>,
    ) -> Vec<usize> {
        let mut dependencies = components[id]
            .iter()
            .flat_map(|&node| self.graph.neighbors(node))
            .map(|node| component_of[&node])
            .filter(|&dep| dep != id)
            .collect::<Vec<_>>();
        dependencies.sort_unstable();
        dependencies.dedup();
        dependencies
    }
}

/// Names referenced by an instance's assignments and elements.
fn references(instance: &NamedInstance) -> impl Iterator<Item = &str> {
    let assignments = instance
        .assignments()
        .iter()
        .filter_map(|assignment| assignment.named_instance_ref());
    let elements = instance
        .elements()
        .iter()
        .filter_map(|element| element.named_instance_ref());
    assignments.chain(elements)
}
