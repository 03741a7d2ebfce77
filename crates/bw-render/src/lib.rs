pub mod cull;
pub mod geometry;
pub mod hit;

pub use cull::{BlockVisibility, CullConfig, CullStats, VisibilityEngine};
pub use geometry::{ContainerSize, Viewport, block_bounds};
pub use hit::{hit_test, hit_test_rect};
