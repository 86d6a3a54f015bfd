pub mod engine;
pub mod rapier_world;
