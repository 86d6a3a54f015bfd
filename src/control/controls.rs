use tracing::warn;

use crate::control::config::ControlConfig;

/// Live control values, advanced once per sub-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    pub bar_pressure: f64,
    pub throttle: f64,
    pub holding_bar: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState {
            bar_pressure: 0.0,
            throttle: 0.0,
            holding_bar: false,
        }
    }
}

/// What one sub-step's force computation gets from the controls.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlOutput {
    pub bar_force_scale: f64,
    pub thrust_scale: f64,
}

#[derive(Debug)]
pub struct ControlInputModel {
    config: ControlConfig,
    state: ControlState,
    input_fault: bool,
}

impl ControlInputModel {
    pub fn new(config: ControlConfig) -> Self {
        ControlInputModel {
            config,
            state: ControlState::default(),
            input_fault: false,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Consumes one sub-step of operator input.
    ///
    /// While the bar is held the lever value is taken as-is; once released the
    /// stored pressure decays geometrically and the lever is ignored. The force
    /// scale returned is the pressure in effect for this sub-step, before decay.
    pub fn advance(&mut self, raw_bar: f64, raw_throttle: f64, holding: bool) -> ControlOutput {
        let mut fault = !raw_throttle.is_finite();
        let throttle = sanitize(raw_throttle, self.config.throttle_min, self.config.throttle_max);

        let bar_pressure = if holding {
            fault |= !raw_bar.is_finite();
            sanitize(raw_bar, -self.config.bar_limit, self.config.bar_limit)
        } else {
            self.state.bar_pressure
        };

        if fault && !self.input_fault {
            warn!(
                "Ignoring non-finite operator input (bar {}, throttle {})",
                raw_bar, raw_throttle
            );
        }
        self.input_fault = fault;

        let output = ControlOutput {
            bar_force_scale: bar_pressure * self.config.bar_gain,
            thrust_scale: throttle * self.config.thrust_gain,
        };

        self.state = ControlState {
            bar_pressure: if holding {
                bar_pressure
            } else {
                bar_pressure * self.config.decay_factor
            },
            throttle,
            holding_bar: holding,
        };

        output
    }
}

/// Clamps a finite input into range; anything non-finite is treated as zero.
fn sanitize(raw: f64, min: f64, max: f64) -> f64 {
    let value = if raw.is_finite() { raw } else { 0.0 };
    value.clamp(min, max)
}
