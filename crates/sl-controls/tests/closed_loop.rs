use std::f64::consts::PI;

use sl_controls::*;

fn direct_p_loop(dt: f64) -> PidLoop {
    let config = PidLoopConfig::new(
        SampleConfig::new(dt).unwrap(),
        PidGains::new(1.0, 0.0, 0.0).unwrap(),
    )
    .with_composition(OutputComposition::Direct);
    PidLoop::new(config)
}

#[test]
fn constant_error_direct_output_is_exact() {
    let dt = 0.1;
    let mut pid = direct_p_loop(dt);
    pid.on_setpoint_received(2.0);
    pid.on_measurement_received(0.0);

    let mut expected_integral = 0.0;
    for _ in 0..100 {
        let step = pid.control_step().unwrap();
        expected_integral += 2.0 * dt;
        assert_eq!(step.output, 2.0);
        assert_eq!(pid.state().previous_error, 2.0);
        assert_eq!(pid.state().integral, expected_integral);
    }
}

#[test]
fn zero_sample_period_is_a_construction_error() {
    let err = SampleConfig::new(0.0).unwrap_err();
    assert!(err.to_string().contains("sample period"));
}

#[test]
fn gain_rules_at_the_boundaries() {
    let mut pid = direct_p_loop(0.1);

    let rejected = pid.update_gain("kp", 1.5);
    assert!(!rejected.successful);
    assert!(rejected.reason.contains("kp"));
    assert_eq!(pid.gains().kp, 1.0);

    assert!(!pid.update_gain("ki", -0.1).successful);
    assert!(pid.update_gain("ki", 0.0).successful);
    assert!(pid.update_gain("kd", 0.0).successful);
    assert!(!pid.update_gain("kd", -2.0).successful);
    assert!(pid.update_gain("kp", 0.0).successful);
}

#[test]
fn square_wave_edge_values() {
    let omega = 1.5;
    let signal = ReferenceSignal::new(2.0, sl_core::rad_per_s(omega)).unwrap();
    let square = SignalGenerator::new(signal, Waveform::Square);
    assert_eq!(square.value_at(0.0), 0.0);
    assert_eq!(square.value_at(PI / (2.0 * omega)), 2.0);
}

#[test]
fn rejected_type_flag_keeps_generator_mode() {
    let mut generator = SignalGenerator::new(ReferenceSignal::default(), Waveform::Sinusoid);
    let result = generator.set_parameters(&[Parameter::new(TYPE_FLAG, 2.0)]);
    assert!(!result.successful);
    assert_eq!(generator.mode(), Waveform::Sinusoid);
    assert!((generator.value_at(PI / 2.0) - 2.0).abs() < 1e-12);
}

#[test]
fn incremental_loop_drives_motor_toward_setpoint() {
    let controller = PidLoop::new(PidLoopConfig::new(
        SampleConfig::new(0.1).unwrap(),
        PidGains::new(1.0, 3.15, 0.0).unwrap(),
    ));
    let mut sim = ClosedLoopSim::new(
        SimConfig {
            plant: SampleConfig::new(0.01).unwrap(),
            generator: SampleConfig::new(0.1).unwrap(),
        },
        SignalGenerator::new(ReferenceSignal::default(), Waveform::Square),
        controller,
        FirstOrderMotor::default(),
        MotorState::default(),
    );

    let samples = sim.run_for(2.0);
    let first_error = (samples[10].setpoint - samples[10].measurement).abs();
    let last = samples.last().unwrap();
    let last_error = (last.setpoint - last.measurement).abs();
    assert!(last_error < first_error);
}
