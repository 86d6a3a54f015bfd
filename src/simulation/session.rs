use tracing::{debug, info, warn};

use crate::control::config::SimulationConfig;
use crate::control::controls::{ControlInputModel, ControlState};
use crate::control::panel::{ControlChannel, ControlPanel};
use crate::control::scene::{Airframe, SceneBuilder};
use crate::errors::SimulationError;
use crate::physics::engine::PhysicsEngine;
use crate::physics::rapier_world::RapierWorld;
use crate::telemetry_system::telemetry::TelemetryFrame;
use crate::trajectory_system::aerodynamics::{
    AerodynamicForceModel, AirData, ForceSet, ForceTarget,
};
use crate::trajectory_system::kinematics::FlightSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

/// Simulated time, accumulated one sub-step at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationClock {
    elapsed: f64,
    ticks: u64,
    sub_steps: u64,
}

impl SimulationClock {
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn sub_steps(&self) -> u64 {
        self.sub_steps
    }

    fn advance(&mut self, dt: f64) {
        self.elapsed += dt;
        self.sub_steps += 1;
    }
}

/// Called once per tick, after integration, in registration order.
pub type Observer = Box<dyn FnMut(&TelemetryFrame) + Send>;

/// One live simulation: the physics world, the airframe in it, and the
/// control and force models that drive it.
///
/// A session starts `Idle`. [`Session::start`] builds the scene and moves it
/// to `Running`, where it stays until dropped.
pub struct Session<E: PhysicsEngine = RapierWorld> {
    engine: E,
    config: SimulationConfig,
    airframe: Option<Airframe>,
    controls: ControlInputModel,
    panel: ControlPanel,
    aerodynamics: AerodynamicForceModel,
    clock: SimulationClock,
    observers: Vec<Observer>,
    last_air_data: AirData,
    force_fault: bool,
}

impl Session<RapierWorld> {
    pub fn with_rapier(config: SimulationConfig) -> Result<Self, SimulationError> {
        let world = RapierWorld::new(config.scene.gravity);
        Session::new(world, config)
    }
}

impl<E: PhysicsEngine> Session<E> {
    pub fn new(engine: E, config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let controls = ControlInputModel::new(config.controls.clone());
        let aerodynamics =
            AerodynamicForceModel::new(config.aerodynamics.clone(), config.scene.length_scale);

        Ok(Session {
            engine,
            config,
            airframe: None,
            controls,
            panel: ControlPanel::new(),
            aerodynamics,
            clock: SimulationClock::default(),
            observers: Vec::new(),
            last_air_data: AirData::default(),
            force_fault: false,
        })
    }

    pub fn start(&mut self) -> Result<Airframe, SimulationError> {
        if self.airframe.is_some() {
            return Err(SimulationError::InitializationError(
                "session is already running".to_string(),
            ));
        }

        let airframe = SceneBuilder::new(&self.config.scene).build(&mut self.engine)?;
        self.airframe = Some(airframe);

        info!(
            "Session started: {} sub-steps of {:.5}s per tick at {} Hz",
            self.config.schedule.sub_steps,
            self.config.schedule.sub_step_dt(),
            self.config.schedule.tick_rate_hz
        );
        Ok(airframe)
    }

    pub fn state(&self) -> SessionState {
        match self.airframe {
            Some(_) => SessionState::Running,
            None => SessionState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn airframe(&self) -> Option<Airframe> {
        self.airframe
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut ControlPanel {
        &mut self.panel
    }

    pub fn control_state(&self) -> ControlState {
        self.controls.state()
    }

    pub fn clock(&self) -> SimulationClock {
        self.clock
    }

    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&TelemetryFrame) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Current kinematics of both airframe bodies, or `None` while idle.
    pub fn snapshot(&self) -> Result<Option<FlightSnapshot>, SimulationError> {
        match &self.airframe {
            Some(airframe) => Ok(Some(FlightSnapshot::capture(&self.engine, airframe)?)),
            None => Ok(None),
        }
    }

    /// Runs one outer tick: the configured number of fixed sub-steps, then the
    /// observers. A no-op returning `None` while the session is idle.
    pub fn tick(&mut self) -> Result<Option<TelemetryFrame>, SimulationError> {
        let airframe = match self.airframe {
            Some(airframe) => airframe,
            None => return Ok(None),
        };

        let dt = self.config.schedule.sub_step_dt();
        for _ in 0..self.config.schedule.sub_steps {
            self.sub_step(&airframe, dt)?;
        }
        self.clock.ticks += 1;

        let frame = self.frame(&airframe)?;
        for observer in self.observers.iter_mut() {
            observer(&frame);
        }

        debug!(
            "t={:.3}s airspeed={:.3} altitude={:.3} aoa={:.4}",
            frame.time, frame.airspeed, frame.altitude, frame.angle_of_attack
        );
        Ok(Some(frame))
    }

    fn sub_step(&mut self, airframe: &Airframe, dt: f64) -> Result<(), SimulationError> {
        let holding = self.panel.holding_bar();
        let output = self.controls.advance(
            self.panel.value(ControlChannel::BarPressure),
            self.panel.value(ControlChannel::Throttle),
            holding,
        );

        let snapshot = FlightSnapshot::capture(&self.engine, airframe)?;
        let forces = self.aerodynamics.compute(&snapshot, output);

        if forces.is_finite() {
            self.apply_forces(airframe, &forces)?;
            self.last_air_data = forces.air_data;
            self.force_fault = false;
        } else {
            if !self.force_fault {
                warn!(
                    "Discarding non-finite force set at t={:.3}s",
                    self.clock.elapsed
                );
            }
            self.force_fault = true;
        }

        self.engine.step(dt);
        self.clock.advance(dt);

        if !holding {
            self.panel
                .set_value(ControlChannel::BarPressure, self.controls.state().bar_pressure);
        }
        Ok(())
    }

    fn apply_forces(
        &mut self,
        airframe: &Airframe,
        forces: &ForceSet,
    ) -> Result<(), SimulationError> {
        for point_force in &forces.forces {
            let body = match point_force.target {
                ForceTarget::Wing => airframe.wing,
                ForceTarget::Trike => airframe.trike,
            };
            self.engine
                .apply_force(body, point_force.force, point_force.point)?;
        }
        self.engine.apply_torque(airframe.wing, forces.wing_torque)
    }

    fn frame(&self, airframe: &Airframe) -> Result<TelemetryFrame, SimulationError> {
        let snapshot = FlightSnapshot::capture(&self.engine, airframe)?;
        let state = self.controls.state();

        Ok(TelemetryFrame {
            time: self.clock.elapsed,
            airspeed: self.aerodynamics.airspeed(&snapshot),
            vertical_speed: snapshot.vertical_speed(),
            altitude: snapshot.altitude(),
            angle_of_attack: self.aerodynamics.angle_of_attack(&snapshot),
            lift: self.last_air_data.lift,
            thrust: self.last_air_data.thrust,
            bar_pressure: state.bar_pressure,
            throttle: state.throttle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::engine::{
        BodyHandle, BodyKind, BodyPose, ColliderShape, FixtureHandle, JointHandle, PivotSpec,
    };
    use crate::utils::vector2d::Vector2D;
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::sync::{Arc, Mutex};

    fn running_session() -> Session {
        let mut session = Session::with_rapier(SimulationConfig::default()).unwrap();
        session.start().unwrap();
        session
    }

    /// Rapier world that counts integration and force calls, and can be made
    /// to report NaN velocities.
    struct CountingEngine {
        world: RapierWorld,
        poisoned: Cell<bool>,
        steps: usize,
        forces: usize,
        torques: usize,
    }

    impl CountingEngine {
        fn new(config: &SimulationConfig) -> Self {
            CountingEngine {
                world: RapierWorld::new(config.scene.gravity),
                poisoned: Cell::new(false),
                steps: 0,
                forces: 0,
                torques: 0,
            }
        }

        fn counts(&self) -> (usize, usize, usize) {
            (self.steps, self.forces, self.torques)
        }
    }

    impl PhysicsEngine for CountingEngine {
        fn create_body(&mut self, kind: BodyKind, pose: BodyPose, bullet: bool) -> BodyHandle {
            self.world.create_body(kind, pose, bullet)
        }

        fn create_fixture(
            &mut self,
            body: BodyHandle,
            shape: ColliderShape,
            density: f64,
            friction: f64,
        ) -> Result<FixtureHandle, SimulationError> {
            self.world.create_fixture(body, shape, density, friction)
        }

        fn create_joint(
            &mut self,
            spec: PivotSpec,
            body_a: BodyHandle,
            body_b: BodyHandle,
            anchor: Vector2D,
        ) -> Result<JointHandle, SimulationError> {
            self.world.create_joint(spec, body_a, body_b, anchor)
        }

        fn set_linear_velocity(
            &mut self,
            body: BodyHandle,
            velocity: Vector2D,
        ) -> Result<(), SimulationError> {
            self.world.set_linear_velocity(body, velocity)
        }

        fn apply_force(
            &mut self,
            body: BodyHandle,
            force: Vector2D,
            world_point: Vector2D,
        ) -> Result<(), SimulationError> {
            self.forces += 1;
            self.world.apply_force(body, force, world_point)
        }

        fn apply_torque(&mut self, body: BodyHandle, torque: f64) -> Result<(), SimulationError> {
            self.torques += 1;
            self.world.apply_torque(body, torque)
        }

        fn linear_velocity(&self, body: BodyHandle) -> Result<Vector2D, SimulationError> {
            if self.poisoned.get() {
                return Ok(Vector2D::new(f64::NAN, f64::NAN));
            }
            self.world.linear_velocity(body)
        }

        fn angular_velocity(&self, body: BodyHandle) -> Result<f64, SimulationError> {
            self.world.angular_velocity(body)
        }

        fn angle(&self, body: BodyHandle) -> Result<f64, SimulationError> {
            self.world.angle(body)
        }

        fn world_center(&self, body: BodyHandle) -> Result<Vector2D, SimulationError> {
            self.world.world_center(body)
        }

        fn step(&mut self, dt: f64) {
            self.steps += 1;
            self.world.step(dt);
        }
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut session = Session::with_rapier(SimulationConfig::default()).unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.tick().unwrap(), None);
        assert_eq!(session.clock(), SimulationClock::default());
        assert!(session.snapshot().unwrap().is_none());
    }

    #[test]
    fn test_start_twice_fails() {
        let mut session = running_session();
        assert!(session.is_running());
        assert!(matches!(
            session.start(),
            Err(SimulationError::InitializationError(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SimulationConfig::default();
        config.schedule.sub_steps = 0;
        assert!(matches!(
            Session::with_rapier(config),
            Err(SimulationError::ConfigError(_))
        ));
    }

    #[test]
    fn test_tick_runs_configured_sub_steps() {
        let mut session = running_session();
        for _ in 0..3 {
            session.tick().unwrap();
        }

        let clock = session.clock();
        assert_eq!(clock.ticks(), 3);
        assert_eq!(clock.sub_steps(), 15);
        assert_relative_eq!(clock.elapsed(), 3.0 / 60.0, epsilon = 1e-12);
    }

    #[test]
    fn test_observers_called_once_per_tick_in_order() {
        let mut session = running_session();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for id in 0..2 {
            let calls = Arc::clone(&calls);
            session.add_observer(move |frame| calls.lock().unwrap().push((id, frame.time)));
        }
        session.tick().unwrap();
        session.tick().unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].0, 0);
        assert_eq!(calls[1].0, 1);
        assert_eq!(calls[0].1, calls[1].1);
        assert!(calls[2].1 > calls[0].1);
    }

    #[test]
    fn test_released_bar_decay_is_written_back() {
        let mut session = running_session();
        session.panel_mut().set_holding_bar(true);
        session.panel_mut().set_value(ControlChannel::BarPressure, 2.0);
        session.tick().unwrap();
        assert_relative_eq!(session.control_state().bar_pressure, 2.0);

        session.panel_mut().set_holding_bar(false);
        session.tick().unwrap();

        let expected = 2.0 * 0.9_f64.powi(5);
        assert_relative_eq!(
            session.control_state().bar_pressure,
            expected,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            session.panel().value(ControlChannel::BarPressure),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_garbage_input_keeps_state_finite() {
        let mut session = running_session();
        session.panel_mut().set_text(ControlChannel::Throttle, "lots");
        session.panel_mut().set_holding_bar(true);
        session.panel_mut().set_text(ControlChannel::BarPressure, "NaN");

        for _ in 0..10 {
            let frame = session.tick().unwrap().unwrap();
            assert!(frame.airspeed.is_finite());
            assert!(frame.altitude.is_finite());
        }
        assert!(session.snapshot().unwrap().unwrap().wing.is_finite());
    }

    #[test]
    fn test_non_finite_forces_skipped_but_world_still_steps() {
        let config = SimulationConfig::default();
        let sub_steps = config.schedule.sub_steps as usize;
        let mut session = Session::new(CountingEngine::new(&config), config).unwrap();
        session.start().unwrap();
        // Lift, trike drag, both ends of the bar couple, thrust.
        let forces_per_sub_step = 5;

        session.engine().poisoned.set(true);
        session.tick().unwrap();
        assert_eq!(session.engine().counts(), (sub_steps, 0, 0));
        assert!(session.force_fault);
        assert_eq!(session.clock().sub_steps(), sub_steps as u64);

        session.tick().unwrap();
        assert_eq!(session.engine().counts(), (2 * sub_steps, 0, 0));

        session.engine().poisoned.set(false);
        let frame = session.tick().unwrap().unwrap();
        assert_eq!(
            session.engine().counts(),
            (3 * sub_steps, forces_per_sub_step * sub_steps, sub_steps)
        );
        assert!(!session.force_fault);
        assert!(frame.airspeed.is_finite());
        assert!(frame.lift.is_finite());
    }

    #[test]
    fn test_frame_reports_trike_instruments() {
        let mut session = running_session();
        let frame = session.tick().unwrap().unwrap();
        let snapshot = session.snapshot().unwrap().unwrap();

        assert_eq!(frame.altitude, snapshot.altitude());
        assert_eq!(frame.vertical_speed, snapshot.vertical_speed());
        assert!(frame.vertical_speed < 0.0);
    }
}
