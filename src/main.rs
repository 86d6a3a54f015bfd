use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use microlight_simulation::*;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Preset {
    Small,
    Full,
}

impl From<Preset> for Calibration {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Small => Calibration::SmallScale,
            Preset::Full => Calibration::FullScale,
        }
    }
}

/// Wing and trike flight-dynamics simulator
#[derive(Parser, Debug)]
#[command(name = "microlight")]
#[command(author, version, about = "Two-body microlight flight simulator", long_about = None)]
struct Cli {
    /// Built-in calibration to start from
    #[arg(short, long, value_enum, default_value = "small")]
    preset: Preset,

    /// YAML configuration file; overrides --preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(short, long, default_value = "10")]
    seconds: f64,

    /// Throttle setting held for the whole run
    #[arg(short, long, default_value = "0.0")]
    throttle: f64,

    /// Bar pressure held from t=0
    #[arg(short, long, default_value = "0.0", allow_negative_numbers = true)]
    bar: f64,

    /// Time at which the bar is let go
    #[arg(long, default_value = "0.5")]
    release_at: f64,

    /// Show instruments in mph and feet
    #[arg(long)]
    imperial: bool,

    /// Run on the simulation thread at wall-clock pace
    #[arg(long)]
    realtime: bool,

    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::preset(cli.preset.into()),
    };
    let ticks_per_second = config.schedule.tick_rate_hz.round().max(1.0) as usize;
    let tick_period = config.schedule.tick_period();
    let units = if cli.imperial {
        UnitSystem::Imperial
    } else {
        UnitSystem::Metric
    };

    let mut session = Session::with_rapier(config)?;
    session.start()?;

    let holding = cli.bar != 0.0;
    let panel = session.panel_mut();
    panel.set_value(ControlChannel::Throttle, cli.throttle);
    panel.set_value(ControlChannel::BarPressure, cli.bar);
    panel.set_holding_bar(holding);

    let telemetry = if cli.realtime {
        run_realtime(session, tick_period, &cli, holding)?
    } else {
        run_headless(&mut session, &cli, holding)
    };

    telemetry.display_data(units, ticks_per_second);

    Ok(())
}

fn run_headless(session: &mut Session, cli: &Cli, mut holding: bool) -> Telemetry {
    let mut telemetry = Telemetry::new();

    while session.clock().elapsed() < cli.seconds {
        if holding && session.clock().elapsed() >= cli.release_at {
            session.panel_mut().set_holding_bar(false);
            holding = false;
            info!("Bar released at t={:.2}s", session.clock().elapsed());
        }

        match session.tick() {
            Ok(Some(frame)) => telemetry.collect_data(&frame),
            Ok(None) => break,
            Err(e) => {
                println!("Error during simulation step: {}", e);
                break;
            }
        }
    }

    telemetry
}

fn run_realtime(
    session: Session,
    period: Duration,
    cli: &Cli,
    mut holding: bool,
) -> Result<Telemetry, SimulationError> {
    let handle = spawn(session, period)?;
    let mut telemetry = Telemetry::new();
    // Generous margin over the tick period before giving up on the thread.
    let timeout = period * 100 + Duration::from_secs(1);

    while let Ok(frame) = handle.frames().recv_timeout(timeout) {
        telemetry.collect_data(&frame);
        if holding && frame.time >= cli.release_at {
            handle.send(ControlCommand::SetHolding(false))?;
            holding = false;
            info!("Bar released at t={:.2}s", frame.time);
        }
        if frame.time >= cli.seconds {
            break;
        }
    }

    let session = handle.stop()?;
    info!(
        "Realtime run finished after {} ticks",
        session.clock().ticks()
    );
    Ok(telemetry)
}
