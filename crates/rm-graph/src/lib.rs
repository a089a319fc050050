mod error;
mod hierarchy;

pub use error::GraphError;
pub use hierarchy::{HierarchyGraph, HostSiteEdge, NodeRef, RegionParentEdge, SiteRegionEdge};
