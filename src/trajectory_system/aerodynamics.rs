use std::f64::consts::{FRAC_PI_2, PI};

use crate::control::config::{AeroConfig, AirspeedBody, LiftModel, PitchModel};
use crate::control::controls::ControlOutput;
use crate::trajectory_system::kinematics::{BodyKinematics, FlightSnapshot};
use crate::utils::vector2d::Vector2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceTarget {
    Wing,
    Trike,
}

/// A force applied at a world-space point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointForce {
    pub target: ForceTarget,
    pub force: Vector2D,
    pub point: Vector2D,
}

/// Derived air data for one sub-step, kept for the instruments.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AirData {
    pub airspeed: f64,
    pub wind_angle: f64,
    pub angle_of_attack: f64,
    pub lift_coefficient: f64,
    pub lift: Vector2D,
    pub drag: Vector2D,
    pub thrust: Vector2D,
}

/// Everything one sub-step pushes into the physics engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForceSet {
    pub forces: Vec<PointForce>,
    pub wing_torque: f64,
    pub air_data: AirData,
}

impl ForceSet {
    pub fn is_finite(&self) -> bool {
        self.wing_torque.is_finite()
            && self
                .forces
                .iter()
                .all(|f| f.force.is_finite() && f.point.is_finite())
    }

    pub fn net_force(&self, target: ForceTarget) -> Vector2D {
        self.forces
            .iter()
            .filter(|f| f.target == target)
            .map(|f| f.force)
            .sum()
    }
}

/// Wraps an angle into [-π, π].
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI && angle > 0.0 {
        PI
    } else {
        wrapped
    }
}

#[derive(Debug)]
pub struct AerodynamicForceModel {
    config: AeroConfig,
    bar_offset: Vector2D,
}

impl AerodynamicForceModel {
    pub fn new(config: AeroConfig, length_scale: f64) -> Self {
        let bar_offset = config.bar_offset * length_scale;
        AerodynamicForceModel { config, bar_offset }
    }

    pub fn config(&self) -> &AeroConfig {
        &self.config
    }

    fn airspeed_body<'a>(&self, snapshot: &'a FlightSnapshot) -> &'a BodyKinematics {
        match self.config.airspeed_body {
            AirspeedBody::Wing => &snapshot.wing,
            AirspeedBody::Trike => &snapshot.trike,
        }
    }

    /// Speed through the air as the configured lift model sees it: the full
    /// speed for the angle-of-attack model, the signed forward component for
    /// the forward-speed model.
    pub fn airspeed(&self, snapshot: &FlightSnapshot) -> f64 {
        let velocity = self.airspeed_body(snapshot).linear_velocity;
        match self.config.lift_model {
            LiftModel::AngleOfAttack => velocity.magnitude(),
            LiftModel::ForwardSpeed => velocity.x,
        }
    }

    pub fn angle_of_attack(&self, snapshot: &FlightSnapshot) -> f64 {
        let wind_angle = self.airspeed_body(snapshot).track_angle();
        wrap_angle(snapshot.wing.angle - wind_angle)
    }

    pub fn lift_coefficient(&self, angle_of_attack: f64) -> f64 {
        let limit = self.config.lift_coefficient_limit;
        angle_of_attack.clamp(-limit, limit)
    }

    /// Unsigned lift, taken from `|cl|`. The side the lift acts on comes from
    /// the lift direction, which follows the sign of the angle of attack.
    pub fn lift_magnitude(&self, lift_coefficient: f64, airspeed: f64) -> f64 {
        lift_coefficient.abs() * airspeed.powi(2) * self.config.lift_gain
    }

    /// Computes every force and torque for one sub-step from a single snapshot.
    pub fn compute(&self, snapshot: &FlightSnapshot, controls: ControlOutput) -> ForceSet {
        let config = &self.config;
        let wing = &snapshot.wing;
        let trike = &snapshot.trike;

        let airspeed = self.airspeed(snapshot);
        let wind_angle = self.airspeed_body(snapshot).track_angle();
        let angle_of_attack = wrap_angle(wing.angle - wind_angle);
        let lift_coefficient = self.lift_coefficient(angle_of_attack);

        let mut forces = Vec::with_capacity(7);

        let lift = match config.lift_model {
            LiftModel::AngleOfAttack => {
                let side = if angle_of_attack > 0.0 {
                    FRAC_PI_2
                } else {
                    -FRAC_PI_2
                };
                Vector2D::from_angle(wind_angle + side)
                    * self.lift_magnitude(lift_coefficient, airspeed)
            }
            LiftModel::ForwardSpeed => Vector2D::new(0.0, airspeed * config.lift_gain),
        };
        forces.push(PointForce {
            target: ForceTarget::Wing,
            force: lift,
            point: wing.world_center,
        });

        if config.wing_sink_gain != 0.0 {
            forces.push(PointForce {
                target: ForceTarget::Wing,
                force: Vector2D::new(0.0, -airspeed.powi(2) * config.wing_sink_gain),
                point: wing.world_center,
            });
        }

        let restoring = match config.pitch_model {
            PitchModel::AngleOfAttack => -angle_of_attack * airspeed * config.restoring_gain,
            PitchModel::Attitude => -wing.angle * config.restoring_gain,
        };
        let wing_torque = restoring - wing.angular_velocity * config.damping_gain;

        let drag = trike.linear_velocity.normalize() * (-airspeed.powi(2) * config.trike_drag_gain);
        forces.push(PointForce {
            target: ForceTarget::Trike,
            force: drag,
            point: trike.world_center,
        });

        let bar_point = wing.world_center + self.bar_offset;
        let bar_force = Vector2D::new(controls.bar_force_scale, 0.0);
        forces.push(PointForce {
            target: ForceTarget::Trike,
            force: bar_force,
            point: bar_point,
        });
        forces.push(PointForce {
            target: ForceTarget::Wing,
            force: -bar_force,
            point: bar_point,
        });

        let thrust = trike.heading() * controls.thrust_scale;
        forces.push(PointForce {
            target: ForceTarget::Trike,
            force: thrust,
            point: trike.world_center,
        });

        ForceSet {
            forces,
            wing_torque,
            air_data: AirData {
                airspeed,
                wind_angle,
                angle_of_attack,
                lift_coefficient,
                lift,
                drag,
                thrust,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::config::AeroConfig;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-9;

    fn model() -> AerodynamicForceModel {
        AerodynamicForceModel::new(AeroConfig::small_scale(), 1.0)
    }

    fn level_snapshot(velocity: Vector2D, wing_angle: f64) -> FlightSnapshot {
        FlightSnapshot {
            wing: BodyKinematics {
                linear_velocity: velocity,
                angle: wing_angle,
                ..BodyKinematics::at_rest(Vector2D::new(0.0, 10.0))
            },
            trike: BodyKinematics {
                linear_velocity: velocity,
                ..BodyKinematics::at_rest(Vector2D::new(0.5, 8.0))
            },
        }
    }

    #[test]
    fn test_lift_coefficient_is_clamped_linear() {
        let aero = model();
        for aoa in [-1.0, -0.4, 0.0, 0.25, 1.0] {
            assert_relative_eq!(aero.lift_coefficient(aoa), aoa);
        }
        assert_relative_eq!(aero.lift_coefficient(1.7), 1.0);
        assert_relative_eq!(aero.lift_coefficient(-3.0), -1.0);

        for x in [-5.0, -0.3, 0.9, 2.2] {
            let once = aero.lift_coefficient(x);
            assert_eq!(aero.lift_coefficient(once), once);
        }
    }

    #[test]
    fn test_lift_magnitude_zero_at_rest_and_grows_with_speed() {
        let aero = model();
        assert_eq!(aero.lift_magnitude(0.5, 0.0), 0.0);

        let mut previous = 0.0;
        for speed in [1.0, 2.0, 5.0, 10.0, 30.0] {
            let lift = aero.lift_magnitude(0.5, speed);
            assert!(lift >= previous);
            previous = lift;
        }
    }

    #[test]
    fn test_level_flight_has_no_lift_or_torque() {
        let aero = model();
        let forces = aero.compute(&level_snapshot(Vector2D::new(10.0, 0.0), 0.0), ControlOutput::default());

        assert_relative_eq!(forces.air_data.angle_of_attack, 0.0);
        assert_relative_eq!(forces.air_data.lift.magnitude(), 0.0);
        assert_relative_eq!(forces.wing_torque, 0.0);
    }

    #[test]
    fn test_positive_aoa_lifts_perpendicular_to_wind() {
        let aero = model();
        let velocity = Vector2D::new(10.0, -2.0);
        let snapshot = level_snapshot(velocity, 0.1);
        let forces = aero.compute(&snapshot, ControlOutput::default());
        let air = forces.air_data;

        let expected_aoa = 0.1 - (-2.0_f64).atan2(10.0);
        assert_relative_eq!(air.angle_of_attack, expected_aoa, epsilon = EPSILON);
        assert_relative_eq!(air.lift.dot(&velocity), 0.0, epsilon = EPSILON);
        assert!(air.lift.y > 0.0);
        assert_relative_eq!(
            air.lift.magnitude(),
            expected_aoa * velocity.magnitude().powi(2) * 0.01,
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_negative_aoa_pushes_down() {
        let aero = model();
        let forces = aero.compute(&level_snapshot(Vector2D::new(10.0, 0.0), -0.2), ControlOutput::default());
        assert!(forces.air_data.lift.y < 0.0);
        assert_relative_eq!(forces.air_data.lift.x, 0.0, epsilon = EPSILON);
        assert_relative_eq!(aero.lift_magnitude(-0.2, 10.0), aero.lift_magnitude(0.2, 10.0));
        assert_relative_eq!(
            forces.air_data.lift.magnitude(),
            aero.lift_magnitude(-0.2, 10.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_lift_rotates_with_travel_direction() {
        let aero = model();
        // Climbing at 45° with the wing 0.3 rad above the path.
        let velocity = Vector2D::from_angle(FRAC_PI_2 / 2.0) * 10.0;
        let forces = aero.compute(
            &level_snapshot(velocity, FRAC_PI_2 / 2.0 + 0.3),
            ControlOutput::default(),
        );
        let lift = forces.air_data.lift;
        assert!(lift.x < 0.0 && lift.y > 0.0);
        assert_relative_eq!(lift.angle(), 3.0 * FRAC_PI_2 / 2.0, epsilon = EPSILON);
    }

    #[test]
    fn test_restoring_and_damping_torques() {
        let aero = model();
        let mut snapshot = level_snapshot(Vector2D::new(10.0, 0.0), 0.2);
        snapshot.wing.angular_velocity = 0.5;
        let forces = aero.compute(&snapshot, ControlOutput::default());

        let expected = -0.2 * 10.0 * 0.2 - 0.5 * 0.3;
        assert_relative_eq!(forces.wing_torque, expected, epsilon = EPSILON);
    }

    #[test]
    fn test_trike_drag_opposes_motion() {
        let aero = model();
        let velocity = Vector2D::new(6.0, 8.0);
        let forces = aero.compute(&level_snapshot(velocity, velocity.angle()), ControlOutput::default());
        let drag = forces.air_data.drag;

        assert_relative_eq!(drag.magnitude(), 100.0 * 0.01, epsilon = EPSILON);
        assert_relative_eq!(drag.normalize().dot(&velocity.normalize()), -1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_at_rest_everything_is_finite_and_zero() {
        let aero = model();
        let forces = aero.compute(&level_snapshot(Vector2D::ZERO, 0.0), ControlOutput::default());

        assert!(forces.is_finite());
        assert_eq!(forces.net_force(ForceTarget::Trike), Vector2D::ZERO);
        assert_eq!(forces.net_force(ForceTarget::Wing), Vector2D::ZERO);
    }

    #[test]
    fn test_bar_forces_are_equal_and_opposite_at_anchor() {
        let aero = AerodynamicForceModel::new(AeroConfig::small_scale(), 0.5);
        let snapshot = level_snapshot(Vector2D::ZERO, 0.0);
        let controls = ControlOutput {
            bar_force_scale: 3.0,
            thrust_scale: 0.0,
        };
        let forces = aero.compute(&snapshot, controls);

        let bar: Vec<&PointForce> = forces
            .forces
            .iter()
            .filter(|f| f.force.x.abs() == 3.0)
            .collect();
        assert_eq!(bar.len(), 2);
        assert_eq!(bar[0].point, bar[1].point);
        assert_relative_eq!(bar[0].point.x, 0.5);
        assert_relative_eq!(bar[0].point.y, 9.5);
        assert_eq!(bar[0].force + bar[1].force, Vector2D::ZERO);
        assert_relative_eq!(forces.net_force(ForceTarget::Trike).x, 3.0);
        assert_relative_eq!(forces.net_force(ForceTarget::Wing).x, -3.0);
    }

    #[test]
    fn test_thrust_follows_trike_heading() {
        let aero = model();
        let mut snapshot = level_snapshot(Vector2D::ZERO, 0.0);
        snapshot.trike.angle = 0.3;
        let forces = aero.compute(
            &snapshot,
            ControlOutput {
                bar_force_scale: 0.0,
                thrust_scale: 5.0,
            },
        );

        let thrust = forces.air_data.thrust;
        assert_relative_eq!(thrust.magnitude(), 5.0, epsilon = EPSILON);
        assert_relative_eq!(thrust.angle(), 0.3, epsilon = EPSILON);
    }

    #[test]
    fn test_forward_speed_model_matches_runway_tuning() {
        let aero = AerodynamicForceModel::new(AeroConfig::full_scale(), 1.0);
        let mut snapshot = level_snapshot(Vector2D::new(8.0, 1.0), 0.1);
        snapshot.wing.angular_velocity = -0.2;
        let forces = aero.compute(&snapshot, ControlOutput::default());

        assert_relative_eq!(forces.air_data.airspeed, 8.0);
        assert_relative_eq!(forces.air_data.lift.y, 6.0, epsilon = EPSILON);
        assert_relative_eq!(forces.air_data.lift.x, 0.0);
        // Lift plus the quadratic sink on the wing.
        assert_relative_eq!(
            forces.net_force(ForceTarget::Wing).y,
            6.0 - 0.64,
            epsilon = EPSILON
        );
        assert_relative_eq!(forces.wing_torque, -0.01 + 0.02, epsilon = EPSILON);
        assert_relative_eq!(forces.air_data.drag.magnitude(), 0.64, epsilon = EPSILON);
    }

    #[test]
    fn test_non_finite_snapshot_is_flagged() {
        let aero = model();
        let snapshot = level_snapshot(Vector2D::new(f64::NAN, 0.0), 0.0);
        let forces = aero.compute(&snapshot, ControlOutput::default());
        assert!(!forces.is_finite());
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(0.5), 0.5);
        assert_relative_eq!(wrap_angle(2.0 * PI + 0.5), 0.5, epsilon = EPSILON);
        assert_relative_eq!(wrap_angle(-2.0 * PI - 0.5), -0.5, epsilon = EPSILON);
        assert_relative_eq!(wrap_angle(PI), PI);
        assert_relative_eq!(wrap_angle(1.5 * PI), -0.5 * PI, epsilon = EPSILON);
    }

    #[test]
    fn test_flying_backwards_saturates_coefficient() {
        let aero = model();
        let aoa = aero.angle_of_attack(&level_snapshot(Vector2D::new(-10.0, 0.0), 0.0));
        assert_relative_eq!(aoa.abs(), PI, epsilon = EPSILON);
        assert_relative_eq!(aero.lift_coefficient(aoa).abs(), 1.0);
    }
}
