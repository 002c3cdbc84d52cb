//! Element roles across partitions: ghost masks, per-face roles and
//! per-partition views.

pub mod classify;
pub mod mask;
pub mod role;
pub mod summary;
pub mod view;

pub use classify::{Classification, check_partition_count, classify};
pub use mask::{GhostMask, MAX_PARTITIONS};
pub use role::{AccessMode, FaceRoles, Role};
pub use summary::{PartCounts, PartitionSummary};
pub use view::{PartitionView, Region, RegionKind};
