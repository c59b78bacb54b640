//! Spatial - where cells live and who owns them
//!
//! - grid:      guarded cell storage, ownership, neighbor lookup
//! - partition: one rectangle per worker
//! - traversal: bias-free checkerboard sweep order

pub mod grid;
pub mod partition;
pub mod traversal;

pub use grid::Grid;
pub use partition::partition_grid;
pub use traversal::checkerboard;
