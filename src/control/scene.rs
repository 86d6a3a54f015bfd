use tracing::info;

use crate::control::config::SceneConfig;
use crate::errors::SimulationError;
use crate::physics::engine::{
    BodyHandle, BodyKind, BodyPose, ColliderShape, JointHandle, PhysicsEngine, PivotSpec,
};
use crate::utils::vector2d::Vector2D;

/// Handles to everything the scene builder put into the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Airframe {
    pub ground: BodyHandle,
    pub wing: BodyHandle,
    pub trike: BodyHandle,
    pub pivot: JointHandle,
}

pub struct SceneBuilder<'a> {
    config: &'a SceneConfig,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(config: &'a SceneConfig) -> Self {
        SceneBuilder { config }
    }

    pub fn build<E: PhysicsEngine>(&self, engine: &mut E) -> Result<Airframe, SimulationError> {
        let config = self.config;

        let ground = engine.create_body(BodyKind::Static, BodyPose::at(Vector2D::ZERO), false);
        engine.create_fixture(
            ground,
            ColliderShape::Box {
                half_extents: config.ground_half_extents,
                offset: config.ground_center,
            },
            0.0,
            config.ground_friction,
        )?;

        let wing = engine.create_body(
            BodyKind::Dynamic,
            BodyPose::at(config.wing_position),
            config.bullet,
        );
        engine.create_fixture(
            wing,
            ColliderShape::Box {
                half_extents: config.scaled_wing_half_extents(),
                offset: Vector2D::ZERO,
            },
            config.wing_density,
            config.wing_friction,
        )?;

        let trike = engine.create_body(
            BodyKind::Dynamic,
            BodyPose::at(config.trike_position()),
            config.bullet,
        );
        engine.create_fixture(
            trike,
            ColliderShape::Polygon {
                vertices: config.scaled_trike_vertices(),
            },
            config.trike_density,
            config.trike_friction,
        )?;

        // The wing box is centred on its body origin, so this is its centre of mass.
        let anchor = config.wing_position;
        let pivot = engine.create_joint(
            PivotSpec {
                collide_connected: config.pivot.collide_connected,
                motor_enabled: config.pivot.motor_enabled,
                max_motor_torque: config.pivot.max_motor_torque,
                motor_speed: config.pivot.motor_speed,
                motor_damping: config.pivot.motor_damping,
            },
            wing,
            trike,
            anchor,
        )?;

        if config.initial_velocity != Vector2D::ZERO {
            engine.set_linear_velocity(wing, config.initial_velocity)?;
            engine.set_linear_velocity(trike, config.initial_velocity)?;
        }

        info!(
            "Scene built: scale {:.2}, wing at ({:.2}, {:.2}), motor {}",
            config.length_scale,
            config.wing_position.x,
            config.wing_position.y,
            if config.pivot.motor_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );

        Ok(Airframe {
            ground,
            wing,
            trike,
            pivot,
        })
    }
}
