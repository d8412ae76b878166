//! Bounded breadth-first expansion of a node into its call graph.
//!
//! The expansion proceeds one depth level at a time. Every distinct node is
//! expanded at most once, at the smallest depth it is reached, and only if
//! that depth is below the limit. Callees of a whole level are fetched from
//! the [`CalleeSource`] first, optionally on the rayon pool, and then merged
//! into the graph on the calling thread in frontier order, so the result does
//! not depend on scheduling.
//!
//! Multiplicities are propagated from the root in topological order; a cycle
//! in the resulting graph is an error.

use crate::error::CallGraphError;
use crate::generalizer::Generalizer;
use num_traits::{One, Zero};
use petgraph::algo::toposort;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rayon::prelude::*;
use revcost_common::SymInt;
use revcost_decompose::{CalleeSource, Callees, DecomposeError};
use revcost_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use revcost_ir::Bloq;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Total multiplicity of each leaf node.
pub type CountMap = BTreeMap<Bloq, SymInt>;

/// A closed-form callee count is an upper bound.
pub const UPPER_BOUND: DiagnosticCode = DiagnosticCode::new(Category::Cost, 1);
/// A symbolic composite has no closed form and was kept as a leaf.
pub const SYMBOLIC_LEAF: DiagnosticCode = DiagnosticCode::new(Category::Warning, 1);

/// Controls how far and how the expansion runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallGraphOptions {
    /// Nodes reached at this depth or deeper are not expanded. `None` expands
    /// down to elementary nodes.
    pub max_depth: Option<usize>,
    /// Fetch the callees of each level in parallel.
    pub parallel: bool,
}

impl CallGraphOptions {
    /// Full expansion, single-threaded.
    pub fn full() -> Self {
        Self::default()
    }

    /// Expansion limited to `max_depth` levels below the root.
    pub fn depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            parallel: false,
        }
    }

    /// Returns a copy with level-parallel callee lookup switched on or off.
    pub fn with_parallel(self, parallel: bool) -> Self {
        Self { parallel, ..self }
    }
}

/// A deduplicated graph of nodes and their direct callees.
///
/// An edge `A -> B` weighted `w` means one `A` contains `w` copies of `B`.
#[derive(Clone, Debug)]
pub struct CallGraph {
    graph: DiGraph<Bloq, SymInt>,
    index: HashMap<Bloq, NodeIndex>,
    expanded: HashSet<NodeIndex>,
    root: NodeIndex,
}

impl CallGraph {
    fn new(root: Bloq) -> Self {
        let mut graph = DiGraph::new();
        let idx = graph.add_node(root.clone());
        Self {
            graph,
            index: HashMap::from([(root, idx)]),
            expanded: HashSet::new(),
            root: idx,
        }
    }

    /// Returns the node's index and whether it was newly added.
    fn intern(&mut self, bloq: Bloq) -> (NodeIndex, bool) {
        if let Some(&idx) = self.index.get(&bloq) {
            return (idx, false);
        }
        let idx = self.graph.add_node(bloq.clone());
        self.index.insert(bloq, idx);
        (idx, true)
    }

    /// The root node.
    pub fn root(&self) -> &Bloq {
        &self.graph[self.root]
    }

    /// Number of distinct nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of caller/callee edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` if `bloq` appears anywhere in the graph.
    pub fn contains(&self, bloq: &Bloq) -> bool {
        self.index.contains_key(bloq)
    }

    /// Every node, in insertion (breadth-first) order.
    pub fn nodes(&self) -> impl Iterator<Item = &Bloq> {
        self.graph.node_weights()
    }

    /// Returns `true` if `bloq` was expanded into its callees.
    pub fn is_expanded(&self, bloq: &Bloq) -> bool {
        self.index.get(bloq).is_some_and(|idx| self.expanded.contains(idx))
    }

    /// Direct callees of `bloq` with their counts, ordered by node.
    pub fn callees(&self, bloq: &Bloq) -> Vec<(&Bloq, &SymInt)> {
        let Some(&idx) = self.index.get(bloq) else {
            return Vec::new();
        };
        let mut out: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (&self.graph[e.target()], e.weight()))
            .collect();
        out.sort();
        out
    }

    /// Nodes that were not expanded.
    pub fn leaves(&self) -> impl Iterator<Item = &Bloq> {
        self.graph
            .node_indices()
            .filter(|idx| !self.expanded.contains(idx))
            .map(|idx| &self.graph[idx])
    }

    /// The underlying petgraph graph.
    pub fn graph(&self) -> &DiGraph<Bloq, SymInt> {
        &self.graph
    }

    /// Renders the graph in Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[Config::GraphContentOnly]))
            .lines()
            .map(|line| format!("    {}\n", line.trim()))
            .fold(String::from("digraph calls {\n"), |mut acc, line| {
                acc.push_str(&line);
                acc
            })
            + "}\n"
    }

    /// Total multiplicity of every node reachable from the root, root included.
    fn multiplicities(&self) -> Result<HashMap<NodeIndex, SymInt>, CallGraphError> {
        let order = toposort(&self.graph, None).map_err(|cycle| CallGraphError::CyclicDecomposition {
            bloq: self.graph[cycle.node_id()].to_string(),
        })?;
        let mut total: HashMap<NodeIndex, SymInt> = HashMap::from([(self.root, SymInt::one())]);
        for idx in order {
            let Some(mult) = total.get(&idx).cloned() else {
                continue;
            };
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                *total.entry(edge.target()).or_default() += &mult * edge.weight();
            }
        }
        Ok(total)
    }

    /// The count map: total multiplicity of each leaf.
    pub fn sigma(&self) -> Result<CountMap, CallGraphError> {
        let total = self.multiplicities()?;
        Ok(total
            .into_iter()
            .filter(|(idx, n)| !self.expanded.contains(idx) && !n.is_zero())
            .map(|(idx, n)| (self.graph[idx].clone(), n))
            .collect())
    }
}

/// Expands `root` into its call graph and counts its leaves.
///
/// Callees of every expanded node pass through `generalizer`; duplicates
/// produced by it are merged by summing their counts. A symbolic composite
/// that `source` cannot expand becomes a leaf and a warning is emitted to
/// `sink`, as is a closed form that only bounds its counts.
pub fn build_call_graph(
    root: &Bloq,
    source: &dyn CalleeSource,
    generalizer: &dyn Generalizer,
    options: CallGraphOptions,
    sink: &DiagnosticSink,
) -> Result<(CallGraph, CountMap), CallGraphError> {
    let _span = tracing::debug_span!("call_graph", root = %root).entered();
    let mut cg = CallGraph::new(root.clone());
    let mut frontier = vec![cg.root];
    let mut depth = 0;

    while !frontier.is_empty() && options.max_depth.map_or(true, |max| depth < max) {
        tracing::debug!(depth, width = frontier.len(), "expanding level");
        let fetch = |idx: &NodeIndex| source.callees(&cg.graph[*idx]);
        let results: Vec<Result<Callees, DecomposeError>> = if options.parallel {
            frontier.par_iter().map(fetch).collect()
        } else {
            frontier.iter().map(fetch).collect()
        };

        let mut next = Vec::new();
        for (parent, result) in frontier.into_iter().zip(results) {
            let callees = match result {
                Ok(callees) => callees,
                Err(DecomposeError::Symbolic { bloq }) => {
                    sink.emit_once(
                        Diagnostic::warning(SYMBOLIC_LEAF, "symbolic node has no closed-form callees")
                            .with_subject(bloq)
                            .with_help("bind its parameters to expand it"),
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if callees.upper_bound {
                sink.emit_once(
                    Diagnostic::warning(UPPER_BOUND, "callee counts are upper bounds")
                        .with_subject(cg.graph[parent].to_string()),
                );
            }
            cg.expanded.insert(parent);
            for (child, count) in merge(callees, generalizer) {
                let (idx, fresh) = cg.intern(child);
                if fresh {
                    next.push(idx);
                }
                tracing::trace!(parent = %cg.graph[parent], child = %cg.graph[idx], %count, "callee");
                cg.graph.add_edge(parent, idx, count);
            }
        }
        frontier = next;
        depth += 1;
    }

    let sigma = cg.sigma()?;
    tracing::debug!(nodes = cg.node_count(), leaves = sigma.len(), "call graph built");
    Ok((cg, sigma))
}

/// Generalizes callees and sums the counts of those that coincide.
fn merge(callees: Callees, generalizer: &dyn Generalizer) -> BTreeMap<Bloq, SymInt> {
    let mut merged: BTreeMap<Bloq, SymInt> = BTreeMap::new();
    for (bloq, count) in callees.counts {
        if let Some(bloq) = generalizer.generalize(bloq) {
            *merged.entry(bloq).or_default() += count;
        }
    }
    merged.retain(|_, n| !n.is_zero());
    merged
}
