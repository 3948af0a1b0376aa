use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use sl_controls::{Parameter, SimSample};
use sl_node::{LoopReport, MotorLoop, compile_simulation, shutdown_channel};
use sl_project::Project;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod error;

use error::{AppError, AppResult};

#[derive(Parser)]
#[command(name = "speedloop")]
#[command(about = "Motor speed PID loop with a reference signal generator", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate {
        /// Path to the YAML or JSON configuration
        config: PathBuf,
    },
    /// Write a configuration file with every default filled in
    Init {
        /// Where to write the YAML file
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Step the closed loop offline and export the trace as CSV
    Simulate {
        /// Path to the YAML or JSON configuration
        config: PathBuf,
        /// Simulated seconds, overriding simulation.duration_s
        #[arg(long)]
        duration: Option<f64>,
        /// Gain overrides applied before the first step, e.g. --set kp=0.5
        #[arg(long = "set", value_parser = parse_parameter)]
        overrides: Vec<Parameter>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the nodes in real time until Ctrl-C or the duration elapses
    Run {
        /// Path to the YAML or JSON configuration
        config: PathBuf,
        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<f64>,
        /// Gain updates sent to the running controller, e.g. --set ki=1.0
        #[arg(long = "set", value_parser = parse_parameter)]
        overrides: Vec<Parameter>,
        /// Do not start the simulated motor
        #[arg(long)]
        no_motor: bool,
    },
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Simulate {
            config,
            duration,
            overrides,
            output,
        } => cmd_simulate(&config, duration, &overrides, output.as_deref()),
        Commands::Run {
            config,
            duration,
            overrides,
            no_motor,
        } => cmd_run(&config, duration, overrides, !no_motor).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_parameter(arg: &str) -> Result<Parameter, String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{arg}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad value for {name}: {e}"))?;
    Ok(Parameter::new(name.trim(), value))
}

fn load_config(path: &Path) -> AppResult<Project> {
    let project = sl_project::load(path)?;
    info!("loaded '{}' from {}", project.name, path.display());
    Ok(project)
}

fn cmd_validate(config: &Path) -> AppResult<()> {
    println!("Validating configuration: {}", config.display());
    let project = load_config(config)?;
    // Loading validates the schema; compiling catches anything the components refuse.
    compile_simulation(&project)?;
    println!("✓ Configuration is valid");
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> AppResult<()> {
    if path.exists() && !force {
        return Err(AppError::Exists {
            path: path.to_path_buf(),
        });
    }
    sl_project::save_yaml(path, &Project::default())?;
    println!("✓ Wrote default configuration to {}", path.display());
    Ok(())
}

fn cmd_simulate(
    config: &Path,
    duration: Option<f64>,
    overrides: &[Parameter],
    output: Option<&Path>,
) -> AppResult<()> {
    let project = load_config(config)?;
    let duration = duration.unwrap_or(project.simulation.duration_s);
    if !duration.is_finite() || duration <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "duration must be positive, got {duration}"
        )));
    }

    let mut sim = compile_simulation(&project)?;
    if !overrides.is_empty() {
        let result = sim.controller_mut().update_gains(overrides);
        if !result.successful {
            return Err(AppError::Rejected(result.reason));
        }
    }

    let samples = sim.run_for(duration);
    let csv = to_csv(&samples);

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Exported {} samples to {}", samples.len(), path.display());
    } else {
        print!("{csv}");
    }

    if let Some(last) = samples.last() {
        info!(
            time = last.time,
            setpoint = last.setpoint,
            measurement = last.measurement,
            "simulation finished"
        );
    }
    Ok(())
}

fn to_csv(samples: &[SimSample]) -> String {
    let mut csv = String::from("time,setpoint,measurement,output\n");
    for s in samples {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            s.time, s.setpoint, s.measurement, s.output
        ));
    }
    csv
}

async fn cmd_run(
    config: &Path,
    duration: Option<f64>,
    overrides: Vec<Parameter>,
    simulate_motor: bool,
) -> AppResult<()> {
    let project = load_config(config)?;
    let limit = duration.map(run_limit).transpose()?;

    let motor_loop = MotorLoop::from_project(&project, simulate_motor)?;
    let (trigger, _) = shutdown_channel();
    let running = motor_loop.spawn(&trigger);

    if !overrides.is_empty() {
        let result = running.controller_params().set_parameters(overrides).await?;
        if !result.successful {
            warn!("gain update rejected: {}", result.reason);
        }
    }

    match limit {
        Some(limit) => {
            tokio::select! {
                _ = tokio::time::sleep(limit) => info!("duration elapsed, shutting down"),
                _ = signal::ctrl_c() => info!("received Ctrl-C, shutting down"),
            }
        }
        None => {
            println!("Running, press Ctrl-C to stop");
            signal::ctrl_c().await?;
            info!("received Ctrl-C, shutting down");
        }
    }

    trigger.trigger();
    let report = running.join().await?;
    print_report(&report);
    Ok(())
}

/// Wall-clock limit for `run`, refusing values a timer cannot sleep for.
fn run_limit(secs: f64) -> AppResult<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(limit) if !limit.is_zero() => Ok(limit),
        _ => Err(AppError::InvalidInput(format!(
            "duration must be a positive number of seconds, got {secs}"
        ))),
    }
}

fn print_report(report: &LoopReport) {
    let state = &report.controller.final_state;
    println!("✓ Loop stopped");
    println!(
        "  Controller: {} steps, {} skipped",
        report.controller.steps, report.controller.skipped
    );
    println!(
        "    kp = {}, ki = {}, kd = {}",
        state.gains.kp, state.gains.ki, state.gains.kd
    );
    println!(
        "    setpoint = {:.4}, measurement = {:.4}, integral = {:.4}",
        state.setpoint, state.measurement, state.integral
    );
    println!(
        "  Generator: {} ticks, {} wave",
        report.generator.ticks, report.generator.final_mode
    );
    if let Some(motor) = &report.motor {
        println!(
            "  Motor: {} steps, speed = {:.4}",
            motor.steps, motor.final_state.speed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_value_pairs() {
        let p = parse_parameter("kp=0.5").unwrap();
        assert_eq!(p.name, "kp");
        assert_eq!(p.value, 0.5);
        assert!(parse_parameter("kp").is_err());
        assert!(parse_parameter("kp=fast").is_err());
    }

    #[test]
    fn csv_has_header_and_one_row_per_sample() {
        let samples = [
            SimSample {
                time: 0.01,
                setpoint: 0.0,
                measurement: 0.0,
                output: 0.0,
            },
            SimSample {
                time: 0.02,
                setpoint: 0.5,
                measurement: 0.1,
                output: 0.2,
            },
        ];
        let csv = to_csv(&samples);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "time,setpoint,measurement,output");
        assert_eq!(lines[2], "0.02,0.5,0.1,0.2");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn run_limit_refuses_unsleepable_durations() {
        assert_eq!(run_limit(1.5).unwrap(), Duration::from_millis(1500));
        for secs in [0.0, -1.0, 1e-10, 1e300, f64::NAN] {
            assert!(matches!(run_limit(secs), Err(AppError::InvalidInput(_))));
        }
    }

    #[test]
    fn cli_accepts_repeated_overrides() {
        let cli = Cli::try_parse_from([
            "speedloop", "simulate", "loop.yaml", "--set", "kp=0.4", "--set", "kd=0",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { overrides, .. } => assert_eq!(overrides.len(), 2),
            _ => panic!("expected simulate"),
        }
    }
}
