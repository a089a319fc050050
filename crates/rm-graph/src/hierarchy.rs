use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rm_domain::{HostId, RegionId, SiteId};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// A node in the host→site→region hierarchy (§4.C's ancestor-chain lookups,
/// `GetTreeHierarchy`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRef {
    Host(HostId),
    Site(SiteId),
    Region(RegionId),
}

/// One `(host_id, site_id)` association, as seen from inventory.
#[derive(Debug, Clone)]
pub struct HostSiteEdge {
    pub host_id: HostId,
    pub site_id: SiteId,
}

/// One `(site_id, parent_region_id)` association. Regions may themselves
/// nest under a parent region; `parent` is `None` for a root region.
#[derive(Debug, Clone)]
pub struct SiteRegionEdge {
    pub site_id: SiteId,
    pub region_id: Option<RegionId>,
}

/// One `(region_id, parent_region_id)` association.
#[derive(Debug, Clone)]
pub struct RegionParentEdge {
    pub region_id: RegionId,
    pub parent_region_id: Option<RegionId>,
}

/// A directed graph of child→parent edges across hosts, sites, and regions,
/// used to resolve ancestor chains without re-querying inventory per hop.
pub struct HierarchyGraph {
    graph: DiGraph<NodeRef, ()>,
    index: HashMap<NodeRef, NodeIndex>,
}

impl HierarchyGraph {
    pub fn build(
        hosts: &[HostSiteEdge],
        sites: &[SiteRegionEdge],
        regions: &[RegionParentEdge],
    ) -> Self {
        let mut graph = DiGraph::new();
        let mut index: HashMap<NodeRef, NodeIndex> = HashMap::new();

        let mut node_idx = |graph: &mut DiGraph<NodeRef, ()>,
                             index: &mut HashMap<NodeRef, NodeIndex>,
                             node: NodeRef| -> NodeIndex {
            *index
                .entry(node.clone())
                .or_insert_with(|| graph.add_node(node))
        };

        for edge in hosts {
            let host = node_idx(&mut graph, &mut index, NodeRef::Host(edge.host_id.clone()));
            let site = node_idx(&mut graph, &mut index, NodeRef::Site(edge.site_id.clone()));
            graph.add_edge(host, site, ());
        }

        for edge in sites {
            let site = node_idx(&mut graph, &mut index, NodeRef::Site(edge.site_id.clone()));
            if let Some(region_id) = &edge.region_id {
                let region = node_idx(&mut graph, &mut index, NodeRef::Region(region_id.clone()));
                graph.add_edge(site, region, ());
            }
        }

        for edge in regions {
            let region = node_idx(
                &mut graph,
                &mut index,
                NodeRef::Region(edge.region_id.clone()),
            );
            if let Some(parent_id) = &edge.parent_region_id {
                let parent = node_idx(&mut graph, &mut index, NodeRef::Region(parent_id.clone()));
                graph.add_edge(region, parent, ());
            }
        }

        HierarchyGraph { graph, index }
    }

    /// Walks parent edges from `start` up to the root, returning `start`
    /// followed by each ancestor in order (site, then region, then any
    /// region-of-region nesting).
    pub fn ancestor_chain(&self, start: NodeRef) -> Result<Vec<NodeRef>, GraphError> {
        let mut current = *self
            .index
            .get(&start)
            .ok_or_else(|| GraphError::UnknownNode(start.clone()))?;

        let mut chain = vec![self.graph[current].clone()];
        let mut visited = vec![current];

        loop {
            let mut parents = self.graph.neighbors_directed(current, Direction::Outgoing);
            let Some(parent) = parents.next() else {
                break;
            };
            if parents.next().is_some() {
                return Err(GraphError::MultipleParents(self.graph[current].clone()));
            }
            if visited.contains(&parent) {
                return Err(GraphError::CycleDetected(start));
            }
            chain.push(self.graph[parent].clone());
            visited.push(parent);
            current = parent;
        }

        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_host_site_region_chain() {
        let hosts = vec![HostSiteEdge {
            host_id: HostId::new("h1"),
            site_id: SiteId::new("s1"),
        }];
        let sites = vec![SiteRegionEdge {
            site_id: SiteId::new("s1"),
            region_id: Some(RegionId::new("r1")),
        }];
        let regions = vec![RegionParentEdge {
            region_id: RegionId::new("r1"),
            parent_region_id: None,
        }];

        let graph = HierarchyGraph::build(&hosts, &sites, &regions);
        let chain = graph.ancestor_chain(NodeRef::Host(HostId::new("h1"))).unwrap();
        assert_eq!(
            chain,
            vec![
                NodeRef::Host(HostId::new("h1")),
                NodeRef::Site(SiteId::new("s1")),
                NodeRef::Region(RegionId::new("r1")),
            ]
        );
    }

    #[test]
    fn unsited_host_chain_is_just_itself() {
        let graph = HierarchyGraph::build(
            &[HostSiteEdge { host_id: HostId::new("h1"), site_id: SiteId::new("s1") }],
            &[],
            &[],
        );
        let chain = graph.ancestor_chain(NodeRef::Site(SiteId::new("s1"))).unwrap();
        assert_eq!(chain, vec![NodeRef::Site(SiteId::new("s1"))]);
    }

    #[test]
    fn unknown_node_errors() {
        let graph = HierarchyGraph::build(&[], &[], &[]);
        let err = graph.ancestor_chain(NodeRef::Host(HostId::new("ghost"))).unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode(_)));
    }

    #[test]
    fn nested_region_chain_walks_to_root() {
        let sites = vec![SiteRegionEdge {
            site_id: SiteId::new("s1"),
            region_id: Some(RegionId::new("child")),
        }];
        let regions = vec![RegionParentEdge {
            region_id: RegionId::new("child"),
            parent_region_id: Some(RegionId::new("root")),
        }];
        let graph = HierarchyGraph::build(&[], &sites, &regions);
        let chain = graph.ancestor_chain(NodeRef::Site(SiteId::new("s1"))).unwrap();
        assert_eq!(
            chain,
            vec![
                NodeRef::Site(SiteId::new("s1")),
                NodeRef::Region(RegionId::new("child")),
                NodeRef::Region(RegionId::new("root")),
            ]
        );
    }
}
