//! Turn a validated configuration into runnable components.

use sl_controls::{
    ClosedLoopSim, ControlResult, FirstOrderMotor, MotorState, OutputComposition, PidGains,
    PidLoop, PidLoopConfig, ReferenceSignal, SampleConfig, SignalGenerator, SimConfig, Waveform,
};
use sl_core::{rad_per_s, s};
use sl_project::{CompositionDef, ControllerDef, GeneratorDef, MotorDef, Project};

use crate::error::{NodeError, NodeResult};

fn config_err(node: &'static str) -> impl FnOnce(sl_controls::ControlError) -> NodeError {
    move |source| NodeError::Config { node, source }
}

pub fn compile_controller(def: &ControllerDef) -> NodeResult<PidLoop> {
    let build = || -> ControlResult<PidLoop> {
        let mut config = PidLoopConfig::new(
            SampleConfig::from_period(s(def.sample_period_s))?,
            PidGains::new(def.kp, def.ki, def.kd)?,
        )
        .with_composition(match def.composition {
            CompositionDef::Incremental => OutputComposition::Incremental,
            CompositionDef::Direct => OutputComposition::Direct,
        })
        .requiring_inputs(def.require_inputs_before_stepping);
        if let Some(limit) = def.integral_limit {
            config = config.with_integral_limit(limit)?;
        }
        Ok(PidLoop::new(config))
    };
    build().map_err(config_err("controller"))
}

pub fn compile_generator(def: &GeneratorDef) -> NodeResult<(SignalGenerator, SampleConfig)> {
    let build = || -> ControlResult<(SignalGenerator, SampleConfig)> {
        let signal = ReferenceSignal::new(def.amplitude, rad_per_s(def.angular_frequency_rad_s))?;
        let mode = Waveform::from_flag(def.type_flag)?;
        Ok((
            SignalGenerator::new(signal, mode),
            SampleConfig::from_period(s(def.period_s))?,
        ))
    };
    build().map_err(config_err("generator"))
}

pub fn compile_motor(def: &MotorDef) -> NodeResult<(FirstOrderMotor, MotorState, SampleConfig)> {
    let build = || -> ControlResult<(FirstOrderMotor, MotorState, SampleConfig)> {
        Ok((
            FirstOrderMotor::new(def.gain, def.tau_s)?,
            MotorState {
                speed: def.initial_speed,
            },
            SampleConfig::from_period(s(def.period_s))?,
        ))
    };
    build().map_err(config_err("motor"))
}

/// Offline closed loop with the same components the nodes would run.
pub fn compile_simulation(project: &Project) -> NodeResult<ClosedLoopSim> {
    let controller = compile_controller(&project.controller)?;
    let (generator, generator_period) = compile_generator(&project.generator)?;
    let (motor, initial, plant_period) = compile_motor(&project.motor)?;
    Ok(ClosedLoopSim::new(
        SimConfig {
            plant: plant_period,
            generator: generator_period,
        },
        generator,
        controller,
        motor,
        initial,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_project_compiles() {
        let project = Project::default();
        let pid = compile_controller(&project.controller).unwrap();
        assert_eq!(pid.gains(), PidGains::new(1.0, 3.15, 0.7875).unwrap());
        assert_eq!(pid.composition(), OutputComposition::Incremental);
        assert_eq!(pid.sampling_interval(), 0.1);

        let (generator, period) = compile_generator(&project.generator).unwrap();
        assert_eq!(generator.mode(), Waveform::Sinusoid);
        assert_eq!(period.dt(), 0.1);

        compile_simulation(&project).unwrap();
    }

    #[test]
    fn unvalidated_bad_values_still_fail_cleanly() {
        let mut def = ControllerDef::default();
        def.sample_period_s = 0.0;
        let err = compile_controller(&def).unwrap_err();
        assert!(matches!(err, NodeError::Config { node: "controller", .. }));

        let mut def = GeneratorDef::default();
        def.type_flag = 3.0;
        assert!(compile_generator(&def).is_err());
    }

    #[test]
    fn unschedulable_periods_are_config_errors() {
        for value in [1e-10, 1e300] {
            let mut def = ControllerDef::default();
            def.sample_period_s = value;
            assert!(matches!(
                compile_controller(&def),
                Err(NodeError::Config { node: "controller", .. })
            ));

            let mut def = GeneratorDef::default();
            def.period_s = value;
            assert!(matches!(
                compile_generator(&def),
                Err(NodeError::Config { node: "generator", .. })
            ));

            let mut def = MotorDef::default();
            def.period_s = value;
            assert!(matches!(
                compile_motor(&def),
                Err(NodeError::Config { node: "motor", .. })
            ));
        }
    }
}
