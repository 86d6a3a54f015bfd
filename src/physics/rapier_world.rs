//! [`PhysicsEngine`] backed by `rapier2d-f64`.
//!
//! We own the pipeline and every set it needs, and call `step()` ourselves so
//! the session decides exactly when integration happens.

use rapier2d_f64::prelude::*;

use crate::constants::MIN_POLYGON_AREA;
use crate::errors::SimulationError;
use crate::physics::engine::{
    BodyHandle, BodyKind, BodyPose, ColliderShape, FixtureHandle, JointHandle, PhysicsEngine,
    PivotSpec,
};
use crate::utils::vector2d::{polygon_area, Vector2D};

pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    body_handles: Vec<RigidBodyHandle>,
    fixture_count: usize,
    joint_handles: Vec<ImpulseJointHandle>,
}

fn to_vector(v: Vector2D) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_point(v: Vector2D) -> Point<Real> {
    point![v.x, v.y]
}

impl RapierWorld {
    pub fn new(gravity: Vector2D) -> Self {
        RapierWorld {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            body_handles: Vec::new(),
            fixture_count: 0,
            joint_handles: Vec::new(),
        }
    }

    pub fn gravity(&self) -> Vector2D {
        Vector2D::new(self.gravity.x, self.gravity.y)
    }

    pub fn joint_count(&self) -> usize {
        self.joint_handles.len()
    }

    pub fn fixture_count(&self) -> usize {
        self.fixture_count
    }

    pub fn body_mass(&self, body: BodyHandle) -> Result<f64, SimulationError> {
        Ok(self.rigid_body(body)?.mass())
    }

    fn rigid_body_handle(&self, body: BodyHandle) -> Result<RigidBodyHandle, SimulationError> {
        self.body_handles
            .get(body.0)
            .copied()
            .ok_or_else(|| SimulationError::PhysicsError(format!("unknown body handle {}", body.0)))
    }

    fn rigid_body(&self, body: BodyHandle) -> Result<&RigidBody, SimulationError> {
        let handle = self.rigid_body_handle(body)?;
        self.bodies
            .get(handle)
            .ok_or_else(|| SimulationError::PhysicsError(format!("body {} was removed", body.0)))
    }

    fn rigid_body_mut(&mut self, body: BodyHandle) -> Result<&mut RigidBody, SimulationError> {
        let handle = self.rigid_body_handle(body)?;
        self.bodies
            .get_mut(handle)
            .ok_or_else(|| SimulationError::PhysicsError(format!("body {} was removed", body.0)))
    }
}

impl PhysicsEngine for RapierWorld {
    fn create_body(&mut self, kind: BodyKind, pose: BodyPose, bullet: bool) -> BodyHandle {
        let builder = match kind {
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let body = builder
            .translation(to_vector(pose.position))
            .rotation(pose.angle)
            .ccd_enabled(bullet)
            .can_sleep(false)
            .build();

        let handle = self.bodies.insert(body);
        self.body_handles.push(handle);
        BodyHandle(self.body_handles.len() - 1)
    }

    fn create_fixture(
        &mut self,
        body: BodyHandle,
        shape: ColliderShape,
        density: f64,
        friction: f64,
    ) -> Result<FixtureHandle, SimulationError> {
        let parent = self.rigid_body_handle(body)?;
        let builder = match shape {
            ColliderShape::Box {
                half_extents,
                offset,
            } => ColliderBuilder::cuboid(half_extents.x, half_extents.y)
                .translation(to_vector(offset)),
            ColliderShape::Polygon { vertices } => {
                let area = polygon_area(&vertices).abs();
                if !(area >= MIN_POLYGON_AREA) {
                    return Err(SimulationError::InitializationError(format!(
                        "degenerate polygon: {} vertices enclosing area {:e}",
                        vertices.len(),
                        area
                    )));
                }
                let points: Vec<Point<Real>> = vertices.iter().copied().map(to_point).collect();
                ColliderBuilder::convex_hull(&points).ok_or_else(|| {
                    SimulationError::InitializationError(format!(
                        "degenerate polygon with {} vertices",
                        points.len()
                    ))
                })?
            }
        };
        let collider = builder.density(density).friction(friction).build();

        self.colliders
            .insert_with_parent(collider, parent, &mut self.bodies);
        // Rapier defers this to the next step; forces applied before then need the real centre.
        if let Some(body) = self.bodies.get_mut(parent) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
        self.fixture_count += 1;
        Ok(FixtureHandle(self.fixture_count - 1))
    }

    fn create_joint(
        &mut self,
        spec: PivotSpec,
        body_a: BodyHandle,
        body_b: BodyHandle,
        anchor: Vector2D,
    ) -> Result<JointHandle, SimulationError> {
        let handle_a = self.rigid_body_handle(body_a)?;
        let handle_b = self.rigid_body_handle(body_b)?;
        let anchor = to_point(anchor);
        let local_a = self.rigid_body(body_a)?.position().inverse_transform_point(&anchor);
        let local_b = self.rigid_body(body_b)?.position().inverse_transform_point(&anchor);

        let mut builder = RevoluteJointBuilder::new()
            .local_anchor1(local_a)
            .local_anchor2(local_b)
            .contacts_enabled(spec.collide_connected);
        if spec.motor_enabled {
            builder = builder
                .motor_velocity(spec.motor_speed, spec.motor_damping)
                .motor_max_force(spec.max_motor_torque);
        }

        let handle = self
            .impulse_joints
            .insert(handle_a, handle_b, builder.build(), true);
        self.joint_handles.push(handle);
        Ok(JointHandle(self.joint_handles.len() - 1))
    }

    fn set_linear_velocity(
        &mut self,
        body: BodyHandle,
        velocity: Vector2D,
    ) -> Result<(), SimulationError> {
        self.rigid_body_mut(body)?
            .set_linvel(to_vector(velocity), true);
        Ok(())
    }

    fn apply_force(
        &mut self,
        body: BodyHandle,
        force: Vector2D,
        world_point: Vector2D,
    ) -> Result<(), SimulationError> {
        self.rigid_body_mut(body)?
            .add_force_at_point(to_vector(force), to_point(world_point), true);
        Ok(())
    }

    fn apply_torque(&mut self, body: BodyHandle, torque: f64) -> Result<(), SimulationError> {
        self.rigid_body_mut(body)?.add_torque(torque, true);
        Ok(())
    }

    fn linear_velocity(&self, body: BodyHandle) -> Result<Vector2D, SimulationError> {
        let linvel = self.rigid_body(body)?.linvel();
        Ok(Vector2D::new(linvel.x, linvel.y))
    }

    fn angular_velocity(&self, body: BodyHandle) -> Result<f64, SimulationError> {
        Ok(self.rigid_body(body)?.angvel())
    }

    fn angle(&self, body: BodyHandle) -> Result<f64, SimulationError> {
        Ok(self.rigid_body(body)?.rotation().angle())
    }

    fn world_center(&self, body: BodyHandle) -> Result<Vector2D, SimulationError> {
        let center = self.rigid_body(body)?.center_of_mass();
        Ok(Vector2D::new(center.x, center.y))
    }

    fn step(&mut self, dt: f64) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );

        // User forces are persistent in rapier; clear them so each sub-step starts empty.
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }
    }
}
