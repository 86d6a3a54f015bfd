pub mod rounding;
pub mod vector2d;
