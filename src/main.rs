//! # Pendant Bridge
//!
//! Drive CNC jog motion from keyboard, gamepad, and MPG pendant input.
//!
//! This binary is the interactive pendant simulator: it wires the three
//! jog components to a motion channel and drives them from a small stdin
//! command language, so the whole engine can be exercised end to end
//! without a gamepad or a connected machine.
//!
//! ## Commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `press x+ [y-] ...` | Key down on a jog shortcut (tap or hold) |
//! | `release` | Key up on the active shortcut |
//! | `stick <x> <y> ...` | Analog deflection per axis, -1.0..=1.0 |
//! | `button <i> <0\|1>` | Button state (e.g. the lockout button) |
//! | `mpg <angle>` | MPG wheel angle report in degrees |
//! | `mpg clear` | Wheel activity ceased, drop the baseline |
//! | `quit` | Exit |
//!
//! Every motion command the engine emits is logged, then immediately
//! acknowledged back to the joystick loop — standing in for the "read"
//! edge a serial channel would deliver when the sender accepts a command.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pendant_bridge::config::{Config, LoggingConfig};
use pendant_bridge::gamepad::GamepadSnapshot;
use pendant_bridge::jog::{is_idle, JoystickLoop, JoystickOptions, MpgWheel, TapHoldJog};
use pendant_bridge::motion::{Axis, AxisMap, ChannelDispatch, MotionCommand};

/// Default configuration file path
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Could not load {} ({}), using built-in defaults",
                config_path, e
            );
            Config::default()
        }
    };

    let _guard = init_tracing(&config.logging);
    info!("Pendant Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let (dispatch, mut motion_rx) = ChannelDispatch::channel();
    let dispatch = Arc::new(dispatch);
    let (snapshot_tx, snapshot_rx) = watch::channel(GamepadSnapshot::default());

    let joystick = JoystickLoop::new(
        dispatch.clone(),
        snapshot_rx,
        JoystickOptions {
            profile: config.gamepad.profile(),
            axes: AxisMap::new(),
            feedrate: config.jog.joystick_feedrate,
        },
    );
    let mut simulator = Simulator {
        tap_hold: TapHoldJog::new(dispatch.clone()),
        joystick,
        mpg: MpgWheel::new(dispatch.clone()),
        snapshot_tx,
        snapshot: GamepadSnapshot::default(),
        config,
    };

    info!("Pendant simulator ready, type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // Main control loop
    loop {
        tokio::select! {
            // Operator input
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !simulator.handle_line(line.trim()) {
                            break;
                        }
                    }
                    None => break, // stdin closed
                }
            }

            // Drain the motion channel: log and acknowledge each command
            Some(command) = motion_rx.recv() => {
                log_motion_command(&command);
                simulator.joystick.acknowledge();
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    simulator.joystick.stop();
    info!("Pendant Bridge stopped");
    Ok(())
}

/// Initializes stdout logging, plus a rolling file writer when enabled.
fn init_tracing(logging: &LoggingConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = if logging.enabled {
        let appender = tracing_appender::rolling::daily(&logging.log_dir, "pendant-bridge.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn log_motion_command(command: &MotionCommand) {
    match command {
        MotionCommand::Jog { axes, feedrate } => info!(%axes, ?feedrate, "-> jog"),
        MotionCommand::StartContinuous { axes, feedrate } => {
            info!(%axes, feedrate, "-> start continuous jog");
        }
        MotionCommand::StopContinuous => info!("-> stop continuous jog"),
        MotionCommand::Cancel => info!("-> cancel jog"),
    }
}

/// Simulated pendant: owns the jog components and the live snapshot.
struct Simulator {
    tap_hold: TapHoldJog,
    joystick: JoystickLoop,
    mpg: MpgWheel,
    snapshot_tx: watch::Sender<GamepadSnapshot>,
    snapshot: GamepadSnapshot,
    config: Config,
}

impl Simulator {
    /// Handles one input line; returns false to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["help"] => print_help(),
            ["press", rest @ ..] => self.handle_press(rest),
            ["release"] => self.tap_hold.on_release(),
            ["stick", rest @ ..] => self.handle_stick(rest),
            ["button", index, state] => self.handle_button(index, state),
            ["mpg", "clear"] => self.mpg.clear(),
            ["mpg", angle] => self.handle_mpg(angle),
            ["quit"] | ["exit"] => return false,
            _ => warn!("unrecognized command: {:?} (try 'help')", line),
        }
        true
    }

    /// `press x+ y- ...`: key down on a jog shortcut.
    fn handle_press(&mut self, tokens: &[&str]) {
        let mut axes = AxisMap::new();
        for token in tokens {
            match parse_jog_token(token) {
                Some((axis, sign)) => {
                    axes.insert(axis, sign * self.config.jog.step_distance);
                }
                None => {
                    warn!("bad jog token: {:?} (want e.g. x+ or z-)", token);
                    return;
                }
            }
        }
        if axes.is_empty() {
            warn!("press needs at least one axis token");
            return;
        }
        self.tap_hold.on_press(axes, self.config.jog.feedrate);
    }

    /// `stick <x> <y> ...`: new analog deflection snapshot.
    fn handle_stick(&mut self, tokens: &[&str]) {
        let mut values = Vec::with_capacity(tokens.len());
        for token in tokens {
            match token.parse::<f64>() {
                Ok(value) => values.push(value),
                Err(_) => {
                    warn!("bad stick value: {:?}", token);
                    return;
                }
            }
        }

        self.snapshot.axes = values.clone();
        self.publish_snapshot();

        let profile = self.config.gamepad.profile();
        if is_idle(&values, &profile) {
            self.joystick.stop();
            return;
        }

        let deadzone = profile.deadzone_fraction();
        let Some((active_axis, unit)) =
            stick_vector(&values, deadzone, &self.config.gamepad.stick_axes)
        else {
            return;
        };
        self.joystick.set_options(JoystickOptions {
            profile,
            axes: unit,
            feedrate: self.config.jog.joystick_feedrate,
        });
        self.joystick.start(active_axis);
    }

    /// `button <i> <0|1>`: button state change.
    fn handle_button(&mut self, index: &str, state: &str) {
        let (Ok(index), Ok(state)) = (index.parse::<usize>(), state.parse::<u8>()) else {
            warn!("bad button command (want: button <index> <0|1>)");
            return;
        };
        if self.snapshot.buttons.len() <= index {
            self.snapshot.buttons.resize(index + 1, false);
        }
        self.snapshot.buttons[index] = state != 0;
        self.publish_snapshot();
    }

    /// `mpg <angle>`: wheel angle report.
    fn handle_mpg(&mut self, angle: &str) {
        let Ok(angle) = angle.parse::<f64>() else {
            warn!("bad mpg angle: {:?}", angle);
            return;
        };
        let jog = &self.config.jog;
        self.mpg.update(
            angle,
            jog.mpg_axis,
            jog.mpg_step_distance,
            jog.mpg_feedrate,
            jog.mpg_direction,
        );
    }

    fn publish_snapshot(&self) {
        if self.snapshot_tx.send(self.snapshot.clone()).is_err() {
            warn!("snapshot channel closed");
        }
    }
}

/// Parses a jog token like `x+` or `z-` into an axis and sign.
fn parse_jog_token(token: &str) -> Option<(Axis, f64)> {
    if let Some(axis) = token.strip_suffix('+') {
        return Some((axis.parse().ok()?, 1.0));
    }
    if let Some(axis) = token.strip_suffix('-') {
        return Some((axis.parse().ok()?, -1.0));
    }
    None
}

/// Builds the active analog axis index and signed unit vector for a
/// deflection, mapping analog axis indices to machine axes.
///
/// The active axis is the one with the largest deflection magnitude;
/// axes inside the deadzone contribute nothing to the vector.
fn stick_vector(
    values: &[f64],
    deadzone: f64,
    stick_axes: &[Axis],
) -> Option<(usize, AxisMap)> {
    let mut unit = AxisMap::new();
    let mut active: Option<(usize, f64)> = None;

    for (index, (&value, &machine_axis)) in values.iter().zip(stick_axes.iter()).enumerate() {
        if value.abs() <= deadzone {
            continue;
        }
        unit.insert(machine_axis, value.signum());
        if active.map_or(true, |(_, best)| value.abs() > best) {
            active = Some((index, value.abs()));
        }
    }

    let (index, _) = active?;
    Some((index, unit))
}

fn print_help() {
    println!("commands:");
    println!("  press x+ [y-] ...   key down on a jog shortcut (tap or hold)");
    println!("  release             key up");
    println!("  stick <x> <y> ...   analog deflection per axis, -1.0..=1.0");
    println!("  button <i> <0|1>    set button state (e.g. lockout button)");
    println!("  mpg <angle>         MPG wheel angle in degrees");
    println!("  mpg clear           drop the MPG baseline");
    println!("  quit                exit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jog_token() {
        assert_eq!(parse_jog_token("x+"), Some((Axis::X, 1.0)));
        assert_eq!(parse_jog_token("z-"), Some((Axis::Z, -1.0)));
        assert_eq!(parse_jog_token("a+"), Some((Axis::A, 1.0)));
        assert_eq!(parse_jog_token("x"), None);
        assert_eq!(parse_jog_token("+"), None);
        assert_eq!(parse_jog_token(""), None);
        assert_eq!(parse_jog_token("b+"), None);
    }

    #[test]
    fn test_stick_vector_single_axis() {
        let (active, unit) =
            stick_vector(&[0.8, 0.0], 0.15, &[Axis::X, Axis::Y]).unwrap();
        assert_eq!(active, 0);
        assert_eq!(unit, AxisMap::single(Axis::X, 1.0));
    }

    #[test]
    fn test_stick_vector_diagonal_picks_dominant() {
        let (active, unit) =
            stick_vector(&[0.4, -0.9], 0.15, &[Axis::X, Axis::Y]).unwrap();
        assert_eq!(active, 1);
        assert_eq!(
            unit,
            AxisMap::from_iter([(Axis::X, 1.0), (Axis::Y, -1.0)])
        );
    }

    #[test]
    fn test_stick_vector_inside_deadzone_is_none() {
        assert!(stick_vector(&[0.1, -0.1], 0.15, &[Axis::X, Axis::Y]).is_none());
        assert!(stick_vector(&[], 0.15, &[Axis::X, Axis::Y]).is_none());
    }

    #[test]
    fn test_stick_vector_ignores_unmapped_axes() {
        // Three analog axes, only two mapped to machine axes.
        let (active, unit) =
            stick_vector(&[0.0, 0.9, 1.0], 0.15, &[Axis::X, Axis::Y]).unwrap();
        assert_eq!(active, 1);
        assert_eq!(unit, AxisMap::single(Axis::Y, 1.0));
    }
}
