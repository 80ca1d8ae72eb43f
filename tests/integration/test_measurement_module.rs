use rkjm::models::module_state::ModuleState;
use rkjm::models::process_data::{JitterInputs, JitterOutputs};
use rkjm::services::jitter::clock::{Clock, ManualClock};
use rkjm::services::jitter::JitterMeasurement;
use rkjm::services::kernel::{DeviceKind, Kernel};
use rkjm::utils::config::ConfigParser;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Integration tests running the measurement module through a kernel

const MODULE_YAML: &str = r#"
buffer_size: 5
cps: 1000000
threaded: false
new_maxever_command_threshold: 10
"#;

fn module() -> (Arc<Kernel>, Arc<ManualClock>, JitterMeasurement) {
    let config = ConfigParser::parse_module_config(MODULE_YAML).unwrap();
    let kernel = Arc::new(Kernel::new());
    let clock = Arc::new(ManualClock::new(1_000));
    let jm = JitterMeasurement::with_clock("jitter", config, Arc::clone(&kernel), clock.clone()).unwrap();
    (kernel, clock, jm)
}

fn run_periods(jm: &mut JitterMeasurement, clock: &ManualClock, periods: &[u64]) {
    for period in periods {
        clock.advance(*period);
        jm.tick();
    }
}

fn decode_inputs(bytes: &[u8]) -> (u64, u64, u64, u64, f64) {
    let word = |i: usize| u64::from_le_bytes(bytes[i * 8..i * 8 + 8].try_into().unwrap());
    (word(0), word(1), word(2), word(3), f64::from_bits(word(4)))
}

#[test]
fn test_full_lifecycle_through_kernel() {
    let (kernel, clock, mut jm) = module();

    jm.set_state(ModuleState::PreOp).unwrap();
    jm.set_state(ModuleState::SafeOp).unwrap();
    jm.set_state(ModuleState::Op).unwrap();
    assert_eq!(
        kernel.devices(),
        vec![
            ("jitter.inputs".to_string(), DeviceKind::ProcessData),
            ("jitter.inputs.trigger".to_string(), DeviceKind::Trigger),
            ("jitter.jitter".to_string(), DeviceKind::ProcessDataInspection),
            ("jitter.outputs".to_string(), DeviceKind::ProcessData),
        ]
    );

    // 1000us nominal period with one 1200us outlier
    run_periods(&mut jm, &clock, &[1000, 1000, 1000, 1000, 1000, 1000, 1200, 1000, 1000, 1000]);

    let pdin = jm.get_pdin();
    assert_eq!(pdin.len(), JitterInputs::SIZE);
    let (max_ever, last_max, last_cycle, last_ts, max_ever_time) = decode_inputs(&pdin);
    // second buffer periods: 1200, 1000, 1000, 1000, mean 1050
    assert_eq!(last_cycle, 1050);
    assert_eq!(last_max, 150);
    assert_eq!(max_ever, 150);
    assert_eq!(last_ts, clock.now());
    assert!(max_ever_time > 0.0);

    let previous = kernel.call_service("jitter.reset_max_ever").unwrap();
    assert_eq!(previous, vec![150]);
    assert_eq!(jm.inputs().max_ever, 0);

    jm.set_state(ModuleState::Boot).unwrap();
    assert!(kernel.devices().is_empty());
}

#[test]
fn test_clamp_written_through_pdout() {
    let (_kernel, clock, mut jm) = module();
    jm.set_state(ModuleState::Op).unwrap();
    jm.write_pdout(JitterOutputs { max_ever_clamp: 20 });

    run_periods(&mut jm, &clock, &[1000, 1000, 1500, 1000, 1000]);
    assert_eq!(jm.inputs().max_ever, 20);
    assert_eq!(jm.get_pdout(), 20u64.to_le_bytes().to_vec());
}

#[test]
fn test_get_cps_service() {
    let (kernel, _clock, jm) = module();
    assert_eq!(kernel.call_service("jitter.get_cps").unwrap(), vec![1_000_000]);
    assert_eq!(jm.get_cps(), 1_000_000);
}

#[test]
fn test_threaded_module_on_real_clock() {
    let config = ConfigParser::parse_module_config("buffer_size: 50\ncps: 1000000000\n").unwrap();
    let kernel = Arc::new(Kernel::new());
    let mut jm = JitterMeasurement::configure("jitter", config, kernel).unwrap();
    jm.set_state(ModuleState::Op).unwrap();

    for _ in 0..100 {
        jm.tick();
        std::thread::sleep(Duration::from_micros(100));
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    while jm.last_report().is_none() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }

    let report = jm.last_report().unwrap();
    assert!(report.stats.cycle_us >= 100);
    assert!(jm.last_measurement().unwrap() > 0.0);

    jm.set_state(ModuleState::Init).unwrap();
    assert_eq!(jm.dropped_buffers(), 0);
}
