//! The rigid-body physics engine as seen by the flight model.
//!
//! Body storage, collision detection and constraint solving all live behind
//! [`PhysicsEngine`]. The flight model only holds the opaque handles returned
//! here and talks to bodies through force/torque appliers and kinematic getters.

use crate::errors::SimulationError;
use crate::trajectory_system::kinematics::BodyKinematics;
use crate::utils::vector2d::Vector2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixtureHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    pub position: Vector2D,
    pub angle: f64,
}

impl BodyPose {
    pub fn at(position: Vector2D) -> Self {
        BodyPose {
            position,
            angle: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    /// Axis-aligned box given by half extents, centred at `offset` in body space.
    Box {
        half_extents: Vector2D,
        offset: Vector2D,
    },
    /// Convex polygon, vertices in body space.
    Polygon { vertices: Vec<Vector2D> },
}

/// Revolute pivot between two bodies, optionally driven by a motor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotSpec {
    pub collide_connected: bool,
    pub motor_enabled: bool,
    pub max_motor_torque: f64,
    pub motor_speed: f64,
    pub motor_damping: f64,
}

pub trait PhysicsEngine {
    fn create_body(&mut self, kind: BodyKind, pose: BodyPose, bullet: bool) -> BodyHandle;

    fn create_fixture(
        &mut self,
        body: BodyHandle,
        shape: ColliderShape,
        density: f64,
        friction: f64,
    ) -> Result<FixtureHandle, SimulationError>;

    fn create_joint(
        &mut self,
        spec: PivotSpec,
        body_a: BodyHandle,
        body_b: BodyHandle,
        anchor: Vector2D,
    ) -> Result<JointHandle, SimulationError>;

    fn set_linear_velocity(
        &mut self,
        body: BodyHandle,
        velocity: Vector2D,
    ) -> Result<(), SimulationError>;

    fn apply_force(
        &mut self,
        body: BodyHandle,
        force: Vector2D,
        world_point: Vector2D,
    ) -> Result<(), SimulationError>;

    fn apply_torque(&mut self, body: BodyHandle, torque: f64) -> Result<(), SimulationError>;

    fn linear_velocity(&self, body: BodyHandle) -> Result<Vector2D, SimulationError>;

    fn angular_velocity(&self, body: BodyHandle) -> Result<f64, SimulationError>;

    fn angle(&self, body: BodyHandle) -> Result<f64, SimulationError>;

    fn world_center(&self, body: BodyHandle) -> Result<Vector2D, SimulationError>;

    /// Advances the world by `dt` seconds. Forces and torques applied before
    /// the call are consumed by it.
    fn step(&mut self, dt: f64);

    /// One consistent read of a body's kinematic state.
    fn body_state(&self, body: BodyHandle) -> Result<BodyKinematics, SimulationError> {
        Ok(BodyKinematics {
            world_center: self.world_center(body)?,
            linear_velocity: self.linear_velocity(body)?,
            angle: self.angle(body)?,
            angular_velocity: self.angular_velocity(body)?,
        })
    }
}
