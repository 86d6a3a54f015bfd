use crate::constants::{MPS_TO_MPH, M_TO_FT, SECONDS_PER_MINUTE, TELEMETRY_SIG_FIGS};
use crate::utils::rounding::round_sig_figs;
use crate::utils::vector2d::Vector2D;

/// Instrument values at the end of a tick, in SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryFrame {
    pub time: f64,
    pub airspeed: f64,
    pub vertical_speed: f64,
    pub altitude: f64,
    pub angle_of_attack: f64,
    pub lift: Vector2D,
    pub thrust: Vector2D,
    pub bar_pressure: f64,
    pub throttle: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    Metric,
    Imperial,
}

/// Display-ready readout: converted and rounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentReadout {
    pub units: UnitSystem,
    pub airspeed: f64,
    pub vertical_speed: f64,
    pub altitude: f64,
    pub angle_of_attack_deg: f64,
    pub lift: Vector2D,
    pub thrust: Vector2D,
}

impl UnitSystem {
    fn speed_factor(&self) -> f64 {
        match self {
            UnitSystem::Metric => 1.0,
            UnitSystem::Imperial => MPS_TO_MPH,
        }
    }

    fn climb_factor(&self) -> f64 {
        match self {
            UnitSystem::Metric => 1.0,
            UnitSystem::Imperial => M_TO_FT * SECONDS_PER_MINUTE,
        }
    }

    fn length_factor(&self) -> f64 {
        match self {
            UnitSystem::Metric => 1.0,
            UnitSystem::Imperial => M_TO_FT,
        }
    }

    pub fn speed_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }

    pub fn climb_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "ft/min",
        }
    }

    pub fn length_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::Imperial => "ft",
        }
    }
}

impl TelemetryFrame {
    pub fn readout(&self, units: UnitSystem) -> InstrumentReadout {
        self.readout_with_precision(units, TELEMETRY_SIG_FIGS)
    }

    pub fn readout_with_precision(&self, units: UnitSystem, sig_figs: u32) -> InstrumentReadout {
        let round = |value: f64| round_sig_figs(value, sig_figs);
        let round_vec = |v: Vector2D| Vector2D::new(round(v.x), round(v.y));

        InstrumentReadout {
            units,
            airspeed: round(self.airspeed * units.speed_factor()),
            vertical_speed: round(self.vertical_speed * units.climb_factor()),
            altitude: round(self.altitude * units.length_factor()),
            angle_of_attack_deg: round(self.angle_of_attack.to_degrees()),
            lift: round_vec(self.lift),
            thrust: round_vec(self.thrust),
        }
    }
}

impl InstrumentReadout {
    pub fn format(&self) -> String {
        format!(
            "Airspeed: {} {} | VSI: {} {} | Altitude: {} {} | AoA: {}° | Lift: ({}, {}) N | Thrust: ({}, {}) N",
            self.airspeed,
            self.units.speed_label(),
            self.vertical_speed,
            self.units.climb_label(),
            self.altitude,
            self.units.length_label(),
            self.angle_of_attack_deg,
            self.lift.x,
            self.lift.y,
            self.thrust.x,
            self.thrust.y,
        )
    }
}

/// Flight log: keeps every frame plus running extremes.
pub struct Telemetry {
    pub log: Vec<TelemetryFrame>,
    max_airspeed: f64,
    max_altitude: f64,
    min_altitude: f64,
    max_angle_of_attack: f64,
}

impl Default for Telemetry {
    fn default() -> Self {
        Telemetry::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Telemetry {
            log: Vec::new(),
            max_airspeed: 0.0,
            max_altitude: f64::MIN,
            min_altitude: f64::MAX,
            max_angle_of_attack: 0.0,
        }
    }

    fn format_time(elapsed_time: f64) -> String {
        if elapsed_time >= 60.0 {
            let minutes = (elapsed_time / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}m {:.2}s", minutes, seconds)
        } else {
            format!("{:.2}s", elapsed_time)
        }
    }

    pub fn collect_data(&mut self, frame: &TelemetryFrame) {
        if frame.airspeed.abs() > self.max_airspeed {
            self.max_airspeed = frame.airspeed.abs();
        }
        if frame.altitude > self.max_altitude {
            self.max_altitude = frame.altitude;
        }
        if frame.altitude < self.min_altitude {
            self.min_altitude = frame.altitude;
        }
        if frame.angle_of_attack.abs() > self.max_angle_of_attack {
            self.max_angle_of_attack = frame.angle_of_attack.abs();
        }
        self.log.push(*frame);
    }

    pub fn max_airspeed(&self) -> f64 {
        self.max_airspeed
    }

    pub fn altitude_range(&self) -> Option<(f64, f64)> {
        if self.log.is_empty() {
            None
        } else {
            Some((self.min_altitude, self.max_altitude))
        }
    }

    pub fn max_angle_of_attack(&self) -> f64 {
        self.max_angle_of_attack
    }

    pub fn display_data(&self, units: UnitSystem, every: usize) {
        println!("--- Telemetry Data ---");
        for frame in self.log.iter().step_by(every.max(1)) {
            println!(
                "{} | {}",
                Self::format_time(frame.time),
                frame.readout(units).format()
            );
        }
        println!("--- End of Telemetry ---");

        println!("\n--- Flight Summary ---");
        println!(
            "Max Airspeed: {} {}",
            round_sig_figs(self.max_airspeed * units.speed_factor(), 3),
            units.speed_label()
        );
        if let Some((min, max)) = self.altitude_range() {
            println!(
                "Altitude Range: {} .. {} {}",
                round_sig_figs(min * units.length_factor(), 3),
                round_sig_figs(max * units.length_factor(), 3),
                units.length_label()
            );
        }
        println!(
            "Max |AoA|: {:.1}°",
            self.max_angle_of_attack.to_degrees()
        );
    }
}
