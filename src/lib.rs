pub mod constants;
pub mod control;
pub mod errors;
pub mod physics;
pub mod simulation;
pub mod telemetry_system;
pub mod trajectory_system;
pub mod utils;

pub use constants::*;
pub use control::config::{Calibration, SimulationConfig};
pub use control::controls::{ControlInputModel, ControlOutput, ControlState};
pub use control::panel::{ControlChannel, ControlPanel};
pub use control::scene::{Airframe, SceneBuilder};
pub use errors::{ConfigError, SimulationError};

// Re-export the physics collaborator
pub use physics::engine::PhysicsEngine;
pub use physics::rapier_world::RapierWorld;

// Re-export commonly used items from simulation
pub use simulation::runner::{spawn, ControlCommand, SimulationHandle};
pub use simulation::session::{Session, SessionState, SimulationClock};

// Re-export commonly used items from trajectory_system
pub use trajectory_system::aerodynamics::{AerodynamicForceModel, AirData, ForceSet};
pub use trajectory_system::kinematics::FlightSnapshot;

// Re-export commonly used items from telemetry_system
pub use telemetry_system::telemetry::{InstrumentReadout, Telemetry, TelemetryFrame, UnitSystem};

// Re-export commonly used utilities
pub use utils::vector2d::Vector2D;
