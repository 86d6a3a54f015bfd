use crate::control::scene::Airframe;
use crate::errors::SimulationError;
use crate::physics::engine::PhysicsEngine;
use crate::utils::vector2d::Vector2D;

/// Kinematic state of one rigid body at the start of a sub-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyKinematics {
    pub world_center: Vector2D,
    pub linear_velocity: Vector2D,
    pub angle: f64,
    pub angular_velocity: f64,
}

impl BodyKinematics {
    pub fn at_rest(world_center: Vector2D) -> Self {
        BodyKinematics {
            world_center,
            linear_velocity: Vector2D::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
        }
    }

    /// Direction of travel, measured from +x.
    pub fn track_angle(&self) -> f64 {
        self.linear_velocity.angle()
    }

    /// Unit vector along the body's x axis.
    pub fn heading(&self) -> Vector2D {
        Vector2D::from_angle(self.angle)
    }

    pub fn is_finite(&self) -> bool {
        self.world_center.is_finite()
            && self.linear_velocity.is_finite()
            && self.angle.is_finite()
            && self.angular_velocity.is_finite()
    }
}

/// Both airframe bodies read in one go, before any force of the sub-step is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightSnapshot {
    pub wing: BodyKinematics,
    pub trike: BodyKinematics,
}

impl FlightSnapshot {
    pub fn capture<E: PhysicsEngine>(
        engine: &E,
        airframe: &Airframe,
    ) -> Result<Self, SimulationError> {
        Ok(FlightSnapshot {
            wing: engine.body_state(airframe.wing)?,
            trike: engine.body_state(airframe.trike)?,
        })
    }

    pub fn altitude(&self) -> f64 {
        self.trike.world_center.y
    }

    pub fn vertical_speed(&self) -> f64 {
        self.trike.linear_velocity.y
    }
}
