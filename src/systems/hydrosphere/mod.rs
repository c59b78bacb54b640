pub mod flow;

pub use flow::{slope_angle, HydrosphereTask};
