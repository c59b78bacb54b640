pub mod convection;
pub mod hotspot;

pub use convection::MagmaConvectionTask;
pub use hotspot::HotspotSeedTask;
