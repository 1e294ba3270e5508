//! Validated graph structure and containment scopes.
//!
//! Every cluster and the diagram root form a containment scope. A scope holds
//! its direct members (nodes and child clusters) and the edges whose lowest
//! common scope it is. Edges that cross a cluster boundary are lifted: inside
//! the common scope they connect the outermost clusters that contain their
//! endpoints.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::{DfsPostOrder, Walker},
};

use astrolabe_core::{
    identifier::Id,
    semantic::{Cluster, GraphEdge, GraphModel, GraphNode},
};

use crate::{context::LayoutContext, diagnostic::DiagnosticKind, error::LayoutError};

/// A direct member of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Member {
    Node(usize),
    Cluster(usize),
}

/// An edge lifted into a scope, with endpoints as member indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ScopeEdge {
    pub edge: usize,
    pub source: usize,
    pub target: usize,
}

#[derive(Debug, Clone, Default)]
pub(super) struct Scope {
    /// The cluster this scope is the interior of; `None` for the root.
    pub container: Option<usize>,
    pub members: Vec<Member>,
    pub edges: Vec<ScopeEdge>,
}

/// Endpoints of a model edge after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct EdgeEnds {
    pub source: Option<usize>,
    pub target: Option<usize>,
}

impl EdgeEnds {
    pub fn resolved(&self) -> Option<(usize, usize)> {
        self.source.zip(self.target)
    }
}

#[derive(Debug, Clone)]
pub(super) struct Structure<'m> {
    pub nodes: Vec<&'m GraphNode>,
    pub node_cluster: Vec<Option<usize>>,
    pub clusters: Vec<&'m Cluster>,
    pub cluster_parent: Vec<Option<usize>>,
    /// Number of clusters enclosing the cluster, itself included.
    pub cluster_depth: Vec<usize>,
    pub edges: Vec<EdgeEnds>,
    /// Scope 0 is the root; the interior of cluster `c` is scope `c + 1`.
    pub scopes: Vec<Scope>,
    /// Scope indices with every child scope before its parent.
    pub post_order: Vec<usize>,
}

impl Structure<'_> {
    pub fn scope_of_cluster(cluster: usize) -> usize {
        cluster + 1
    }

    /// Clusters from the innermost one containing `node` out to the root.
    fn cluster_chain(&self, node: usize) -> Vec<Option<usize>> {
        let mut chain = Vec::new();
        let mut current = self.node_cluster[node];
        while let Some(cluster) = current {
            chain.push(Some(cluster));
            current = self.cluster_parent[cluster];
        }
        chain.push(None);
        chain
    }
}

/// Keeps the first occurrence of every identity and reports the rest.
fn dedup<'m, T>(
    ctx: &mut LayoutContext<'_>,
    items: &'m [T],
    id: impl Fn(&T) -> &Id,
    what: &str,
) -> (Vec<&'m T>, IndexMap<Id, usize>) {
    let mut index = IndexMap::new();
    let mut unique = Vec::new();
    for item in items {
        let item_id = id(item);
        if index.contains_key(item_id) {
            ctx.report(
                DiagnosticKind::DuplicateId,
                format!("{what} `{item_id}` is declared more than once"),
                Some(item_id),
            );
            continue;
        }
        index.insert(item_id.clone(), unique.len());
        unique.push(item);
    }
    (unique, index)
}

/// Validates the model and builds the containment scopes.
///
/// # Errors
///
/// Returns [`LayoutError::NestingLimitExceeded`] when clusters nest deeper
/// than the configured limit.
pub(super) fn build<'m>(
    ctx: &mut LayoutContext<'_>,
    model: &'m GraphModel,
) -> Result<Structure<'m>, LayoutError> {
    let (nodes, node_index) = dedup(ctx, model.nodes(), GraphNode::id, "node");
    let (clusters, cluster_index) = dedup(ctx, model.clusters(), Cluster::id, "cluster");

    let mut cluster_parent: Vec<Option<usize>> = clusters
        .iter()
        .map(|cluster| {
            let parent = cluster.parent()?;
            let resolved = cluster_index.get(parent).copied();
            if resolved.is_none() {
                ctx.report(
                    DiagnosticKind::ClusterNotFound,
                    format!("cluster `{}` is nested in unknown cluster `{parent}`", cluster.id()),
                    Some(parent),
                );
            }
            resolved
        })
        .collect();
    break_cluster_cycles(ctx, &clusters, &mut cluster_parent);

    let cluster_depth = cluster_depths(&cluster_parent);
    let limit = ctx.config().layout().limits().max_nesting_depth();
    let depth = cluster_depth.iter().copied().max().unwrap_or(0);
    if depth > limit {
        return Err(LayoutError::NestingLimitExceeded { depth, limit });
    }

    let node_cluster: Vec<Option<usize>> = nodes
        .iter()
        .map(|node| {
            let parent = node.parent()?;
            let resolved = cluster_index.get(parent).copied();
            if resolved.is_none() {
                ctx.report(
                    DiagnosticKind::ClusterNotFound,
                    format!("node `{}` is placed in unknown cluster `{parent}`", node.id()),
                    Some(parent),
                );
            }
            resolved
        })
        .collect();

    let edges = model
        .edges()
        .iter()
        .enumerate()
        .map(|(index, edge)| resolve_edge(ctx, &node_index, index, edge))
        .collect();

    let mut structure = Structure {
        nodes,
        node_cluster,
        clusters,
        cluster_parent,
        cluster_depth,
        edges,
        scopes: Vec::new(),
        post_order: Vec::new(),
    };
    structure.scopes = build_scopes(&structure);
    structure.post_order = scope_post_order(&structure);

    debug!(
        nodes = structure.nodes.len(),
        clusters = structure.clusters.len(),
        scopes = structure.scopes.len();
        "Graph structure validated"
    );
    Ok(structure)
}

fn resolve_edge(
    ctx: &mut LayoutContext<'_>,
    node_index: &IndexMap<Id, usize>,
    index: usize,
    edge: &GraphEdge,
) -> EdgeEnds {
    let mut lookup = |id: &Id| {
        let resolved = node_index.get(id).copied();
        if resolved.is_none() {
            ctx.report(
                DiagnosticKind::NodeNotFound,
                format!("edge {index} refers to unknown node `{id}`"),
                Some(id),
            );
        }
        resolved
    };
    EdgeEnds {
        source: lookup(edge.source()),
        target: lookup(edge.target()),
    }
}

/// Detaches every cluster whose parent chain leads back to itself.
///
/// Clusters are visited in insertion order, so the first cluster of a cycle
/// becomes a root and the rest of the cycle hangs below it.
fn break_cluster_cycles(
    ctx: &mut LayoutContext<'_>,
    clusters: &[&Cluster],
    parents: &mut [Option<usize>],
) {
    for start in 0..parents.len() {
        let mut current = parents[start];
        let mut steps = 0;
        while let Some(cluster) = current {
            if cluster == start {
                ctx.report(
                    DiagnosticKind::ClusterCycle,
                    format!("cluster `{}` is nested in itself", clusters[start].id()),
                    Some(clusters[start].id()),
                );
                parents[start] = None;
                break;
            }
            steps += 1;
            if steps > parents.len() {
                break;
            }
            current = parents[cluster];
        }
    }
}

fn cluster_depths(parents: &[Option<usize>]) -> Vec<usize> {
    (0..parents.len())
        .map(|cluster| {
            let mut depth = 1;
            let mut current = parents[cluster];
            while let Some(parent) = current {
                depth += 1;
                current = parents[parent];
            }
            depth
        })
        .collect()
}

/// Smallest node index inside every cluster, nested clusters included.
fn first_nodes(structure: &Structure<'_>) -> Vec<Option<usize>> {
    let mut first = vec![None; structure.clusters.len()];
    for (node, cluster) in structure.node_cluster.iter().enumerate() {
        let mut current = *cluster;
        while let Some(cluster) = current {
            let entry: &mut Option<usize> = &mut first[cluster];
            *entry = Some(entry.map_or(node, |existing| existing.min(node)));
            current = structure.cluster_parent[cluster];
        }
    }
    first
}

fn build_scopes(structure: &Structure<'_>) -> Vec<Scope> {
    let mut scopes: Vec<Scope> = std::iter::once(None)
        .chain((0..structure.clusters.len()).map(Some))
        .map(|container| Scope {
            container,
            ..Scope::default()
        })
        .collect();
    let scope_index = |cluster: Option<usize>| cluster.map_or(0, Structure::scope_of_cluster);

    // Members are ordered by the earliest node they contain; empty clusters
    // go last in insertion order.
    let first = first_nodes(structure);
    let mut keyed: Vec<((usize, usize), usize, Member)> = Vec::new();
    for (node, cluster) in structure.node_cluster.iter().enumerate() {
        keyed.push(((node, 0), scope_index(*cluster), Member::Node(node)));
    }
    for (cluster, parent) in structure.cluster_parent.iter().enumerate() {
        let key = first[cluster].map_or((usize::MAX, cluster), |node| (node, 1 + cluster));
        keyed.push((key, scope_index(*parent), Member::Cluster(cluster)));
    }
    keyed.sort_by_key(|(key, _, _)| *key);

    let mut member_index: Vec<HashMap<Member, usize>> = vec![HashMap::new(); scopes.len()];
    for (_, scope, member) in keyed {
        member_index[scope].insert(member, scopes[scope].members.len());
        scopes[scope].members.push(member);
    }

    for (edge, ends) in structure.edges.iter().enumerate() {
        let Some((source, target)) = ends.resolved() else {
            continue;
        };
        let source_chain = structure.cluster_chain(source);
        let target_chain = structure.cluster_chain(target);
        let Some(common) = source_chain
            .iter()
            .copied()
            .find(|cluster| target_chain.contains(cluster))
        else {
            continue;
        };

        let representative = |node: usize, chain: &[Option<usize>]| {
            if structure.node_cluster[node] == common {
                return Member::Node(node);
            }
            chain
                .iter()
                .copied()
                .flatten()
                .find(|&cluster| structure.cluster_parent[cluster] == common)
                .map_or(Member::Node(node), Member::Cluster)
        };

        let scope = scope_index(common);
        let lookup = |member: Member| member_index[scope].get(&member).copied();
        if let (Some(source), Some(target)) = (
            lookup(representative(source, &source_chain)),
            lookup(representative(target, &target_chain)),
        ) {
            scopes[scope].edges.push(ScopeEdge {
                edge,
                source,
                target,
            });
        }
    }
    scopes
}

/// Orders scopes so every cluster interior comes before its parent scope.
fn scope_post_order(structure: &Structure<'_>) -> Vec<usize> {
    let mut tree: DiGraph<usize, ()> = DiGraph::new();
    let indices: Vec<NodeIndex> = (0..structure.scopes.len())
        .map(|scope| tree.add_node(scope))
        .collect();

    // Children are added in reverse so the walk visits them in insertion order.
    for (cluster, parent) in structure.cluster_parent.iter().enumerate().rev() {
        let parent_scope = parent.map_or(0, Structure::scope_of_cluster);
        tree.add_edge(
            indices[parent_scope],
            indices[Structure::scope_of_cluster(cluster)],
            (),
        );
    }

    DfsPostOrder::new(&tree, indices[0])
        .iter(&tree)
        .map(|index| tree[index])
        .collect()
}
