//! Dedicated simulation thread.
//!
//! The session is moved onto one thread and only touched there. Control
//! updates arrive on a command queue and are applied between ticks; ticks come
//! from a crossbeam ticker whose channel holds a single pending tick, so a slow
//! tick delays the next one instead of piling them up.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, Receiver, Sender, TrySendError};
use tracing::{info, warn};

use crate::control::panel::{ControlChannel, ControlPanel};
use crate::errors::SimulationError;
use crate::physics::engine::PhysicsEngine;
use crate::physics::rapier_world::RapierWorld;
use crate::simulation::session::Session;
use crate::telemetry_system::telemetry::TelemetryFrame;

const FRAME_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    SetBarPressure(f64),
    SetBarText(String),
    SetHolding(bool),
    SetThrottle(f64),
    SetThrottleText(String),
    Stop,
}

fn apply(panel: &mut ControlPanel, command: ControlCommand) {
    match command {
        ControlCommand::SetBarPressure(value) => {
            panel.set_value(ControlChannel::BarPressure, value)
        }
        ControlCommand::SetBarText(text) => panel.set_text(ControlChannel::BarPressure, text),
        ControlCommand::SetHolding(holding) => panel.set_holding_bar(holding),
        ControlCommand::SetThrottle(value) => panel.set_value(ControlChannel::Throttle, value),
        ControlCommand::SetThrottleText(text) => panel.set_text(ControlChannel::Throttle, text),
        ControlCommand::Stop => {}
    }
}

pub struct SimulationHandle<E: PhysicsEngine = RapierWorld> {
    commands: Sender<ControlCommand>,
    frames: Receiver<TelemetryFrame>,
    worker: JoinHandle<Result<Session<E>, SimulationError>>,
}

impl<E: PhysicsEngine> SimulationHandle<E> {
    pub fn send(&self, command: ControlCommand) -> Result<(), SimulationError> {
        self.commands
            .send(command)
            .map_err(|_| SimulationError::SystemError("simulation thread has exited".to_string()))
    }

    /// Frames emitted after each tick. Frames are dropped while this falls behind.
    pub fn frames(&self) -> &Receiver<TelemetryFrame> {
        &self.frames
    }

    /// Stops the thread after its current tick and hands the session back.
    pub fn stop(self) -> Result<Session<E>, SimulationError> {
        // The thread may already have exited on an error; join reports it.
        let _ = self.commands.send(ControlCommand::Stop);
        self.worker.join().map_err(|_| {
            SimulationError::SystemError("simulation thread panicked".to_string())
        })?
    }
}

/// Starts the session if needed and runs it on its own thread, one tick per `period`.
pub fn spawn<E>(
    mut session: Session<E>,
    period: Duration,
) -> Result<SimulationHandle<E>, SimulationError>
where
    E: PhysicsEngine + Send + 'static,
{
    if !session.is_running() {
        session.start()?;
    }

    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    let (frame_tx, frame_rx) = crossbeam_channel::bounded(FRAME_BUFFER);

    let worker = thread::Builder::new()
        .name("simulation".to_string())
        .spawn(move || run(session, period, command_rx, frame_tx))
        .map_err(|e| SimulationError::SystemError(e.to_string()))?;

    Ok(SimulationHandle {
        commands: command_tx,
        frames: frame_rx,
        worker,
    })
}

fn run<E: PhysicsEngine>(
    mut session: Session<E>,
    period: Duration,
    commands: Receiver<ControlCommand>,
    frames: Sender<TelemetryFrame>,
) -> Result<Session<E>, SimulationError> {
    let ticker = crossbeam_channel::tick(period);
    let mut dropped_frames = 0u64;

    info!("Simulation thread running, tick period {:?}", period);
    loop {
        select! {
            recv(commands) -> command => match command {
                Ok(ControlCommand::Stop) | Err(_) => break,
                Ok(command) => apply(session.panel_mut(), command),
            },
            recv(ticker) -> _ => {
                if let Some(frame) = session.tick()? {
                    match frames.try_send(frame) {
                        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                        Err(TrySendError::Full(_)) => dropped_frames += 1,
                    }
                }
            }
        }
    }

    if dropped_frames > 0 {
        warn!("{} telemetry frames dropped by a slow consumer", dropped_frames);
    }
    info!(
        "Simulation thread stopped after {} ticks",
        session.clock().ticks()
    );
    Ok(session)
}
