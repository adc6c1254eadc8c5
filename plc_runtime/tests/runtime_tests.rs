//! End-to-end runtime tests: glue map on disk → image → binding → scan loop.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use plc_common::config::{ConfigLoader, Validate};
use plc_common::glue::{GlueValue, GlueVariablesBinding};
use plc_common::service::{ServiceDefinition, ServiceError, ServiceState};
use plc_runtime::config::{GlueMap, MonitorConfig, RuntimeConfig};
use plc_runtime::core::{RuntimeCore, check_checksum};
use plc_runtime::error::RuntimeError;
use plc_runtime::image::ProcessImage;
use plc_runtime::program::LoopbackProgram;
use plc_runtime::service_registry::ServiceRegistry;
use plc_runtime::services::{MonitorService, builtin_services};
use tempfile::NamedTempFile;

const GLUE_TOML: &str = r#"
checksum = "9c1e0f"

[[variables]]
location = "%IX0.0"
type = "BOOL"

[[variables]]
location = "%IX0.1"
type = "BOOL"

[[variables]]
location = "%QX0.0"
type = "BOOL"

[[variables]]
location = "%QX0.1"
type = "BOOL"

[[variables]]
location = "%IW0"
type = "INT"

[[variables]]
location = "%QW0"
type = "INT"

[[variables]]
location = "%ID1"
type = "REAL"

[[variables]]
location = "%QD1"
type = "REAL"

[[variables]]
location = "%MD0"
type = "UDINT"
"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn runtime_config(extra: &str) -> RuntimeConfig {
    let text = format!(
        r#"
[shared]
service_name = "plc-test"

[runtime]
cycle_time_us = 200
{extra}
"#
    );
    let config = RuntimeConfig::from_toml(&text).unwrap();
    config.validate().unwrap();
    config
}

fn load_image() -> ProcessImage {
    let file = write_temp(GLUE_TOML);
    let map = GlueMap::load_validated(file.path()).unwrap();
    ProcessImage::from_map(&map).unwrap()
}

fn set_inputs(binding: &GlueVariablesBinding<'_>) {
    let guard = binding.lock();
    let write = |addr: &str, value| binding.find_location(addr).unwrap().write(&guard, value).unwrap();
    write("%IX0.0", GlueValue::Bool(true));
    write("%IX0.1", GlueValue::Bool(false));
    write("%IW0", GlueValue::Int(-1234));
    write("%ID1", GlueValue::Real(2.5));
}

// ─── Scan loop ──────────────────────────────────────────────────────

#[test]
fn loopback_runs_five_cycles() {
    let image = load_image();
    let binding = image.bind().unwrap();
    let config = runtime_config("");
    check_checksum(&config.runtime, &binding).unwrap();

    let monitor = MonitorService::new(
        &binding,
        &MonitorConfig {
            enabled: true,
            addresses: vec!["%QW0".to_string(), "%MD0".to_string()],
            every_n_cycles: 5,
        },
    );
    let mut registry = ServiceRegistry::new();
    registry.register(Box::new(&monitor)).unwrap();

    set_inputs(&binding);
    let program = LoopbackProgram::new(&binding);
    assert_eq!(program.pair_count(), 4);

    let mut core = RuntimeCore::new(&binding, registry, program, &config.runtime);
    assert!(core.start().unwrap().is_ok());
    assert_eq!(core.run(Some(5)), 5);
    assert_eq!(core.stats().cycle_count, 5);
    assert_eq!(core.registry().state("monitor"), Some(ServiceState::AfterCycle));

    {
        let guard = binding.lock();
        let read = |addr: &str| binding.find_location(addr).unwrap().read(&guard);
        assert_eq!(read("%QX0.0"), GlueValue::Bool(true));
        assert_eq!(read("%QX0.1"), GlueValue::Bool(false));
        assert_eq!(read("%QW0"), GlueValue::Int(-1234));
        assert_eq!(read("%QD1"), GlueValue::Real(2.5));
        assert_eq!(read("%MD0"), GlueValue::UDInt(5));
    }

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].1, GlueValue::Int(-1234));
    assert_eq!(snapshot[1].1, GlueValue::UDInt(5));

    assert!(core.shutdown().is_ok());
    assert_eq!(core.registry().state("monitor"), Some(ServiceState::Finalized));
}

#[test]
fn builtin_monitor_from_config() {
    let image = load_image();
    let binding = image.bind().unwrap();
    let config = runtime_config(
        r#"
[monitor]
enabled = true
addresses = ["%IX0.0"]
every_n_cycles = 1
"#,
    );
    let registry = builtin_services(&binding, &config).unwrap();
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["monitor"]);
    assert!(registry.init_all().is_ok());
}

// ─── Failure policy ─────────────────────────────────────────────────

struct CountingService {
    name: &'static str,
    fail_init: bool,
    cycles: AtomicUsize,
    journal: Mutex<Vec<String>>,
}

impl CountingService {
    fn new(name: &'static str, fail_init: bool) -> Self {
        Self {
            name,
            fail_init,
            cycles: AtomicUsize::new(0),
            journal: Mutex::new(Vec::new()),
        }
    }
}

impl ServiceDefinition for CountingService {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&self) -> Result<(), ServiceError> {
        self.journal.lock().push("init".to_string());
        if self.fail_init {
            Err(ServiceError::InitFailed("simulated".to_string()))
        } else {
            Ok(())
        }
    }

    fn after_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    fn finalize(&self) -> Result<(), ServiceError> {
        self.journal.lock().push("finalize".to_string());
        Ok(())
    }
}

#[test]
fn degraded_start_skips_failed_service() {
    let image = load_image();
    let binding = image.bind().unwrap();
    let config = runtime_config("");

    let healthy = CountingService::new("healthy", false);
    let broken = CountingService::new("broken", true);
    let mut registry = ServiceRegistry::new();
    registry.register(Box::new(&healthy)).unwrap();
    registry.register(Box::new(&broken)).unwrap();

    let mut core = RuntimeCore::new(&binding, registry, LoopbackProgram::new(&binding), &config.runtime);
    let report = core.start().unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.failed_names(), vec!["broken"]);

    core.run(Some(3));
    assert_eq!(healthy.cycles.load(Ordering::Relaxed), 3);
    assert_eq!(broken.cycles.load(Ordering::Relaxed), 0);

    core.shutdown();
    assert_eq!(*healthy.journal.lock(), vec!["init", "finalize"]);
    assert_eq!(*broken.journal.lock(), vec!["init", "finalize"]);
}

#[test]
fn strict_services_refuse_start() {
    let image = load_image();
    let binding = image.bind().unwrap();
    let config = runtime_config("require_all_services = true");

    let healthy = CountingService::new("healthy", false);
    let broken = CountingService::new("broken", true);
    let mut registry = ServiceRegistry::new();
    registry.register(Box::new(&healthy)).unwrap();
    registry.register(Box::new(&broken)).unwrap();

    let mut core = RuntimeCore::new(&binding, registry, LoopbackProgram::new(&binding), &config.runtime);
    match core.start() {
        Err(RuntimeError::ServicesFailed(names)) => assert_eq!(names, vec!["broken".to_string()]),
        other => panic!("expected ServicesFailed, got {other:?}"),
    }
    assert_eq!(core.run(None), 0);
    assert_eq!(*healthy.journal.lock(), vec!["init", "finalize"]);
}

#[test]
fn monitor_with_unbound_address_fails_init() {
    let image = load_image();
    let binding = image.bind().unwrap();
    let config = runtime_config(
        r#"
[monitor]
enabled = true
addresses = ["%QX7.7"]
"#,
    );
    let registry = builtin_services(&binding, &config).unwrap();
    let report = registry.init_all();
    assert_eq!(report.failed_names(), vec!["monitor"]);
    assert_eq!(
        report.failures[0].error,
        ServiceError::LocationNotBound("%QX7.7".to_string())
    );
    assert_eq!(registry.state("monitor"), Some(ServiceState::Failed));
}

// ─── Checksum policy ────────────────────────────────────────────────

#[test]
fn checksum_mismatch_policy() {
    let image = load_image();
    let binding = image.bind().unwrap();
    assert_eq!(binding.checksum(), "9c1e0f");

    let lenient = runtime_config(r#"expected_checksum = "000000""#);
    assert!(check_checksum(&lenient.runtime, &binding).is_ok());

    let strict = runtime_config(
        r#"expected_checksum = "000000"
strict_checksum = true"#,
    );
    match check_checksum(&strict.runtime, &binding) {
        Err(RuntimeError::ChecksumMismatch { expected, actual }) => {
            assert_eq!(expected, "000000");
            assert_eq!(actual, "9c1e0f");
        }
        other => panic!("expected ChecksumMismatch, got {other:?}"),
    }

    let matching = runtime_config(
        r#"expected_checksum = "9c1e0f"
strict_checksum = true"#,
    );
    assert!(check_checksum(&matching.runtime, &binding).is_ok());
}

#[test]
fn missing_glue_file_reported() {
    let result = GlueMap::load_validated(std::path::Path::new("/nonexistent/glue.toml"));
    assert!(result.is_err());
}
