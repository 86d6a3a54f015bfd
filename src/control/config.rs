use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::{
    BAR_PRESSURE_DECAY, DEFAULT_BAR_LIMIT, DEFAULT_SUB_STEPS, GRAVITY, LIFT_COEFFICIENT_LIMIT,
    MIN_POLYGON_AREA, THROTTLE_MAX, THROTTLE_MIN, TICK_RATE_HZ,
};
use crate::errors::ConfigError;
use crate::utils::vector2d::{polygon_area, Vector2D};

/// The two tunings the airframe ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calibration {
    /// Half-size airframe launched in the air, free pivot, angle-of-attack lift.
    SmallScale,
    /// Full-size airframe parked on the runway, braked pivot, forward-speed lift.
    FullScale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiftModel {
    /// Clamped-linear lift perpendicular to the relative wind.
    AngleOfAttack,
    /// Vertical lift proportional to forward speed, plus a quadratic sink on the wing.
    ForwardSpeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchModel {
    /// Restoring torque proportional to angle of attack times airspeed.
    AngleOfAttack,
    /// Restoring torque proportional to the wing's absolute attitude.
    Attitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirspeedBody {
    Wing,
    Trike,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    pub motor_enabled: bool,
    pub max_motor_torque: f64,
    pub motor_speed: f64,
    pub motor_damping: f64,
    pub collide_connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub gravity: Vector2D,
    /// Multiplies wing extents, trike polygon and trike offset.
    pub length_scale: f64,
    pub ground_half_extents: Vector2D,
    pub ground_center: Vector2D,
    pub ground_friction: f64,
    pub wing_position: Vector2D,
    pub wing_half_extents: Vector2D,
    pub wing_density: f64,
    pub wing_friction: f64,
    /// Trike body origin relative to the wing body origin.
    pub trike_offset: Vector2D,
    pub trike_vertices: Vec<Vector2D>,
    pub trike_density: f64,
    pub trike_friction: f64,
    pub initial_velocity: Vector2D,
    pub bullet: bool,
    pub pivot: PivotConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AeroConfig {
    pub lift_model: LiftModel,
    pub pitch_model: PitchModel,
    pub airspeed_body: AirspeedBody,
    pub lift_gain: f64,
    pub lift_coefficient_limit: f64,
    pub restoring_gain: f64,
    pub damping_gain: f64,
    pub trike_drag_gain: f64,
    pub wing_sink_gain: f64,
    /// Bar anchor relative to the wing centre, before length scaling.
    pub bar_offset: Vector2D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub decay_factor: f64,
    pub thrust_gain: f64,
    /// Signed; the sign picks which body the bar pushes forward.
    pub bar_gain: f64,
    pub bar_limit: f64,
    pub throttle_min: f64,
    pub throttle_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub tick_rate_hz: f64,
    pub sub_steps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub scene: SceneConfig,
    pub aerodynamics: AeroConfig,
    pub controls: ControlConfig,
    pub schedule: ScheduleConfig,
}

fn trike_outline() -> Vec<Vector2D> {
    vec![
        Vector2D::new(1.5, -1.0),
        Vector2D::new(-2.5, -1.0),
        Vector2D::new(-1.7, 0.6),
    ]
}

impl PivotConfig {
    pub fn free() -> Self {
        PivotConfig {
            motor_enabled: false,
            max_motor_torque: 0.0,
            motor_speed: 0.0,
            motor_damping: 0.0,
            collide_connected: true,
        }
    }

    pub fn braked(max_motor_torque: f64) -> Self {
        PivotConfig {
            motor_enabled: true,
            max_motor_torque,
            motor_speed: 0.0,
            motor_damping: 1.0,
            collide_connected: true,
        }
    }
}

impl Default for PivotConfig {
    fn default() -> Self {
        PivotConfig::free()
    }
}

impl SceneConfig {
    pub fn small_scale() -> Self {
        SceneConfig {
            gravity: Vector2D::new(0.0, -GRAVITY),
            length_scale: 0.5,
            ground_half_extents: Vector2D::new(1000.0, 10.0),
            ground_center: Vector2D::new(-500.0, -50.0),
            ground_friction: 0.2,
            wing_position: Vector2D::new(0.0, 0.0),
            wing_half_extents: Vector2D::new(3.0, 0.1),
            wing_density: 0.1,
            wing_friction: 0.9,
            trike_offset: Vector2D::new(1.0, -2.0),
            trike_vertices: trike_outline(),
            trike_density: 1.0,
            trike_friction: 0.1,
            initial_velocity: Vector2D::new(10.0, 0.0),
            bullet: true,
            pivot: PivotConfig::free(),
        }
    }

    pub fn full_scale() -> Self {
        SceneConfig {
            length_scale: 1.0,
            wing_position: Vector2D::new(-50.0, -36.0),
            trike_density: 0.1,
            initial_velocity: Vector2D::ZERO,
            pivot: PivotConfig::braked(0.25),
            ..SceneConfig::small_scale()
        }
    }

    pub fn scaled_wing_half_extents(&self) -> Vector2D {
        self.wing_half_extents * self.length_scale
    }

    pub fn scaled_trike_vertices(&self) -> Vec<Vector2D> {
        self.trike_vertices
            .iter()
            .map(|v| *v * self.length_scale)
            .collect()
    }

    pub fn trike_position(&self) -> Vector2D {
        self.wing_position + self.trike_offset * self.length_scale
    }

    /// Area centroid of the trike polygon in trike body space, after scaling.
    pub fn trike_centroid(&self) -> Vector2D {
        let vertices = self.scaled_trike_vertices();
        let count = vertices.len();
        let mut twice_area = 0.0;
        let mut weighted = Vector2D::ZERO;
        for i in 0..count {
            let a = vertices[i];
            let b = vertices[(i + 1) % count];
            let cross = a.x * b.y - b.x * a.y;
            twice_area += cross;
            weighted = weighted + (a + b) * cross;
        }
        if twice_area == 0.0 {
            return vertices.iter().copied().sum::<Vector2D>() / count.max(1) as f64;
        }
        weighted / (3.0 * twice_area)
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig::small_scale()
    }
}

impl AeroConfig {
    pub fn small_scale() -> Self {
        AeroConfig {
            lift_model: LiftModel::AngleOfAttack,
            pitch_model: PitchModel::AngleOfAttack,
            airspeed_body: AirspeedBody::Wing,
            lift_gain: 0.01,
            lift_coefficient_limit: LIFT_COEFFICIENT_LIMIT,
            restoring_gain: 0.2,
            damping_gain: 0.3,
            trike_drag_gain: 0.01,
            wing_sink_gain: 0.0,
            bar_offset: Vector2D::new(1.0, -1.0),
        }
    }

    pub fn full_scale() -> Self {
        AeroConfig {
            lift_model: LiftModel::ForwardSpeed,
            pitch_model: PitchModel::Attitude,
            airspeed_body: AirspeedBody::Trike,
            lift_gain: 0.75,
            restoring_gain: 0.1,
            damping_gain: 0.1,
            trike_drag_gain: 0.01,
            wing_sink_gain: 0.01,
            ..AeroConfig::small_scale()
        }
    }
}

impl Default for AeroConfig {
    fn default() -> Self {
        AeroConfig::small_scale()
    }
}

impl ControlConfig {
    pub fn small_scale() -> Self {
        ControlConfig {
            decay_factor: BAR_PRESSURE_DECAY,
            thrust_gain: 2.0,
            bar_gain: -1.0,
            bar_limit: DEFAULT_BAR_LIMIT,
            throttle_min: THROTTLE_MIN,
            throttle_max: THROTTLE_MAX,
        }
    }

    pub fn full_scale() -> Self {
        ControlConfig {
            thrust_gain: 5.0,
            bar_gain: 1.0,
            ..ControlConfig::small_scale()
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        ControlConfig::small_scale()
    }
}

impl ScheduleConfig {
    /// Duration of one integration slice.
    pub fn sub_step_dt(&self) -> f64 {
        1.0 / (self.tick_rate_hz * self.sub_steps as f64)
    }

    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            tick_rate_hz: TICK_RATE_HZ,
            sub_steps: DEFAULT_SUB_STEPS,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig::preset(Calibration::SmallScale)
    }
}

impl SimulationConfig {
    pub fn preset(calibration: Calibration) -> Self {
        match calibration {
            Calibration::SmallScale => SimulationConfig {
                scene: SceneConfig::small_scale(),
                aerodynamics: AeroConfig::small_scale(),
                controls: ControlConfig::small_scale(),
                schedule: ScheduleConfig::default(),
            },
            Calibration::FullScale => SimulationConfig {
                scene: SceneConfig::full_scale(),
                aerodynamics: AeroConfig::full_scale(),
                controls: ControlConfig::full_scale(),
                schedule: ScheduleConfig::default(),
            },
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let schedule = &self.schedule;
        if !(schedule.tick_rate_hz.is_finite() && schedule.tick_rate_hz > 0.0) {
            return Err(invalid(format!(
                "tick rate must be positive, got {}",
                schedule.tick_rate_hz
            )));
        }
        if schedule.sub_steps == 0 {
            return Err(invalid("at least one sub-step per tick is required"));
        }

        let scene = &self.scene;
        if !(scene.length_scale.is_finite() && scene.length_scale > 0.0) {
            return Err(invalid(format!(
                "length scale must be positive, got {}",
                scene.length_scale
            )));
        }
        for (name, density) in [
            ("wing_density", scene.wing_density),
            ("trike_density", scene.trike_density),
        ] {
            if !(density.is_finite() && density > 0.0) {
                return Err(invalid(format!("{name} must be positive, got {density}")));
            }
        }
        if scene.trike_vertices.len() < 3 {
            return Err(invalid(format!(
                "trike polygon needs at least 3 vertices, got {}",
                scene.trike_vertices.len()
            )));
        }
        let trike_area = polygon_area(&scene.scaled_trike_vertices()).abs();
        if !(trike_area >= MIN_POLYGON_AREA) {
            return Err(invalid(format!(
                "trike polygon encloses no area ({trike_area:e})"
            )));
        }
        let vectors = [
            scene.gravity,
            scene.ground_half_extents,
            scene.ground_center,
            scene.wing_position,
            scene.wing_half_extents,
            scene.trike_offset,
            scene.initial_velocity,
            self.aerodynamics.bar_offset,
        ];
        if !vectors.iter().chain(scene.trike_vertices.iter()).all(Vector2D::is_finite) {
            return Err(invalid("scene vectors must be finite"));
        }

        let controls = &self.controls;
        if !(0.0..=1.0).contains(&controls.decay_factor) {
            return Err(invalid(format!(
                "decay factor must lie in [0, 1], got {}",
                controls.decay_factor
            )));
        }
        if !(controls.bar_limit.is_finite() && controls.bar_limit >= 0.0) {
            return Err(invalid("bar limit must be finite and non-negative"));
        }
        if !(controls.throttle_min <= controls.throttle_max
            && controls.throttle_min.is_finite()
            && controls.throttle_max.is_finite())
        {
            return Err(invalid("throttle range must be finite and ordered"));
        }

        let aero = &self.aerodynamics;
        let gains = [
            controls.thrust_gain,
            controls.bar_gain,
            aero.lift_gain,
            aero.lift_coefficient_limit,
            aero.restoring_gain,
            aero.damping_gain,
            aero.trike_drag_gain,
            aero.wing_sink_gain,
            scene.pivot.max_motor_torque,
            scene.pivot.motor_speed,
            scene.pivot.motor_damping,
        ];
        if !gains.iter().all(|g| g.is_finite()) {
            return Err(invalid("gains must be finite"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
