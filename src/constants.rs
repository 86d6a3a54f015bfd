// Physical Constants
pub const GRAVITY: f64 = 9.81; // m/s²

// Scheduling
pub const TICK_RATE_HZ: f64 = 60.0; // outer ticks per second
pub const DEFAULT_SUB_STEPS: u32 = 5; // integration slices per tick

// Geometry
pub const MIN_POLYGON_AREA: f64 = 1e-9; // m², below this a collider has no mass

// Control Constants
pub const BAR_PRESSURE_DECAY: f64 = 0.9; // per sub-step when the bar is released
pub const DEFAULT_BAR_LIMIT: f64 = 50.0; // N, hardened lever range
pub const THROTTLE_MIN: f64 = 0.0;
pub const THROTTLE_MAX: f64 = 1.0;

// Aerodynamic Constants
pub const LIFT_COEFFICIENT_LIMIT: f64 = 1.0; // clamp on the linear lift curve

// Telemetry
pub const TELEMETRY_SIG_FIGS: u32 = 2;
pub const MPS_TO_MPH: f64 = 2.236_936_292;
pub const M_TO_FT: f64 = 3.280_839_895;
pub const SECONDS_PER_MINUTE: f64 = 60.0;
