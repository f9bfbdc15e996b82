//! Ancestry trees: flattening, hierarchy reconstruction, haplogroup
//! extraction and cross-match aggregation.

pub mod aggregate;
pub mod flatten;
pub mod haplogroups;
pub mod types;

pub use aggregate::{aggregate, AggregateStatistics, HaplogroupFrequency};
pub use flatten::{build_hierarchy, build_hierarchy_with_orphans, flatten, group_by_demonym, parse_percent};
pub use haplogroups::{extract_haplogroups, HaplogroupResult};
pub use types::{FlatEntry, HaplogroupPair, Hierarchy, PercentageTreeNode, RegionNode};
