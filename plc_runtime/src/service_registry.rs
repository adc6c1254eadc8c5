//! Service registry for auxiliary runtime services.
//!
//! Provides a `ServiceRegistry` struct that catalogs services and drives
//! their lifecycle around the scan cycle. This uses constructor-injection
//! rather than global state: the bootstrap builds one registry and hands
//! it to the runtime core, and tests build as many as they like.

use std::sync::atomic::{AtomicU8, Ordering};

use plc_common::consts::MAX_SERVICE_NAME_SIZE;
use plc_common::service::{ServiceDefinition, ServiceError, ServiceState};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Registration rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Service name is empty
    #[error("Service name cannot be empty")]
    EmptyName,

    /// Service name exceeds the size limit
    #[error("Service name is {len} bytes, limit is {max}")]
    NameTooLong {
        /// Length of the rejected name in bytes.
        len: usize,
        /// Upper bound in bytes.
        max: usize,
    },

    /// A service with this name is already registered
    #[error("Service '{0}' is already registered")]
    Duplicate(String),
}

/// One failed lifecycle hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    /// Name of the failing service.
    pub name: String,
    /// Error it reported.
    pub error: ServiceError,
}

/// Outcome of a best-effort lifecycle pass over all services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    /// Hooks actually invoked.
    pub attempted: usize,
    /// Failures, in registration order.
    pub failures: Vec<ServiceFailure>,
}

impl LifecycleReport {
    /// `true` when no hook failed.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Names of the failing services, in registration order.
    pub fn failed_names(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.name.as_str()).collect()
    }
}

struct ServiceEntry<'s> {
    service: Box<dyn ServiceDefinition + 's>,
    state: AtomicU8,
}

impl ServiceEntry<'_> {
    fn state(&self) -> ServiceState {
        ServiceState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ServiceState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Ordered catalog of services.
///
/// Populated via `register()` before the control loop starts; read-only
/// afterwards apart from lifecycle state and stop requests. Every pass
/// visits services in registration order.
pub struct ServiceRegistry<'s> {
    entries: Vec<ServiceEntry<'s>>,
}

impl<'s> ServiceRegistry<'s> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a service.
    ///
    /// # Errors
    /// Rejects empty names, names longer than
    /// [`MAX_SERVICE_NAME_SIZE`] bytes, and names already registered.
    pub fn register(&mut self, service: Box<dyn ServiceDefinition + 's>) -> Result<(), RegistryError> {
        let name = service.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if name.len() > MAX_SERVICE_NAME_SIZE {
            return Err(RegistryError::NameTooLong {
                len: name.len(),
                max: MAX_SERVICE_NAME_SIZE,
            });
        }
        if self.find(name).is_some() {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        debug!("Registered service '{}'", name);
        self.entries.push(ServiceEntry {
            service,
            state: AtomicU8::new(ServiceState::Uninitialized as u8),
        });
        Ok(())
    }

    /// Find a service by exact name.
    pub fn find(&self, name: &str) -> Option<&(dyn ServiceDefinition + 's)> {
        self.entry(name).map(|e| e.service.as_ref())
    }

    /// Lifecycle state of a service, by name.
    pub fn state(&self, name: &str) -> Option<ServiceState> {
        self.entry(name).map(ServiceEntry::state)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.service.name())
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, name: &str) -> Option<&ServiceEntry<'s>> {
        self.entries.iter().find(|e| e.service.name() == name)
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Initialize every service not yet initialized, in registration order.
    ///
    /// Best effort: a failing service is recorded and marked `Failed`, and
    /// the remaining services are still initialized.
    pub fn init_all(&self) -> LifecycleReport {
        let mut report = LifecycleReport::default();
        for entry in &self.entries {
            let name = entry.service.name();
            if entry.state() != ServiceState::Uninitialized {
                debug!("Service '{}' already {}, skipping init", name, entry.state());
                continue;
            }
            report.attempted += 1;
            match entry.service.init() {
                Ok(()) => {
                    entry.set_state(ServiceState::Initialized);
                    info!("Service '{}' initialized", name);
                }
                Err(error) => {
                    entry.set_state(ServiceState::Failed);
                    warn!("Service '{}' failed to initialize: {}", name, error);
                    report.failures.push(ServiceFailure {
                        name: name.to_string(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Run every cycling service's before-cycle hook.
    pub fn before_cycle(&self) {
        for entry in &self.entries {
            if entry.state().is_cycling() {
                entry.set_state(ServiceState::BeforeCycle);
                entry.service.before_cycle();
            }
        }
    }

    /// Run every cycling service's after-cycle hook.
    pub fn after_cycle(&self) {
        for entry in &self.entries {
            if entry.state().is_cycling() {
                entry.set_state(ServiceState::AfterCycle);
                entry.service.after_cycle();
            }
        }
    }

    /// Finalize every service not yet finalized, in registration order.
    ///
    /// Always attempts all services, including those whose init failed,
    /// so they can release partial resources.
    pub fn finalize_all(&self) -> LifecycleReport {
        let mut report = LifecycleReport::default();
        for entry in &self.entries {
            let name = entry.service.name();
            if entry.state() == ServiceState::Finalized {
                continue;
            }
            report.attempted += 1;
            let result = entry.service.finalize();
            entry.set_state(ServiceState::Finalized);
            match result {
                Ok(()) => info!("Service '{}' finalized", name),
                Err(error) => {
                    warn!("Service '{}' failed to finalize: {}", name, error);
                    report.failures.push(ServiceFailure {
                        name: name.to_string(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Ask every initialized, not yet finalized service to stop.
    ///
    /// Services that never initialized or failed init are skipped.
    ///
    /// A signal, not a barrier: returns without waiting for services to
    /// acknowledge. Callable from any thread.
    pub fn stop_all(&self) {
        for entry in &self.entries {
            if entry.state().is_cycling() {
                debug!("Requesting stop of service '{}'", entry.service.name());
                entry.service.stop();
            }
        }
    }
}

impl Default for ServiceRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicBool;

    /// Records every hook call into a shared journal.
    struct RecordingService<'j> {
        name: String,
        fail_init: bool,
        fail_finalize: bool,
        stopped: AtomicBool,
        journal: &'j Mutex<Vec<String>>,
    }

    impl<'j> RecordingService<'j> {
        fn new(name: &str, journal: &'j Mutex<Vec<String>>) -> Self {
            Self {
                name: name.to_string(),
                fail_init: false,
                fail_finalize: false,
                stopped: AtomicBool::new(false),
                journal,
            }
        }

        fn log(&self, hook: &str) {
            self.journal.lock().push(format!("{hook}({})", self.name));
        }
    }

    impl ServiceDefinition for RecordingService<'_> {
        fn name(&self) -> &str {
            &self.name
        }

        fn init(&self) -> Result<(), ServiceError> {
            self.log("init");
            if self.fail_init {
                return Err(ServiceError::InitFailed(format!("{} refused", self.name)));
            }
            Ok(())
        }

        fn before_cycle(&self) {
            self.log("before");
        }

        fn after_cycle(&self) {
            self.log("after");
        }

        fn finalize(&self) -> Result<(), ServiceError> {
            self.log("finalize");
            if self.fail_finalize {
                return Err(ServiceError::FinalizeFailed(self.name.clone()));
            }
            Ok(())
        }

        fn stop(&self) {
            self.log("stop");
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    fn abc<'j>(journal: &'j Mutex<Vec<String>>, failing: &str) -> ServiceRegistry<'j> {
        let mut reg = ServiceRegistry::new();
        for name in ["A", "B", "C"] {
            let mut svc = RecordingService::new(name, journal);
            svc.fail_init = name == failing;
            reg.register(Box::new(svc)).unwrap();
        }
        reg
    }

    #[test]
    fn init_runs_in_order_past_failures() {
        let journal = Mutex::new(Vec::new());
        let reg = abc(&journal, "B");

        let report = reg.init_all();
        assert_eq!(report.attempted, 3);
        assert_eq!(report.failed_names(), vec!["B"]);
        assert!(matches!(
            report.failures[0].error,
            ServiceError::InitFailed(_)
        ));
        assert_eq!(*journal.lock(), vec!["init(A)", "init(B)", "init(C)"]);

        assert_eq!(reg.state("A"), Some(ServiceState::Initialized));
        assert_eq!(reg.state("B"), Some(ServiceState::Failed));
        assert_eq!(reg.state("C"), Some(ServiceState::Initialized));
    }

    #[test]
    fn init_is_exactly_once() {
        let journal = Mutex::new(Vec::new());
        let reg = abc(&journal, "");
        assert!(reg.init_all().is_ok());
        let again = reg.init_all();
        assert_eq!(again.attempted, 0);
        assert_eq!(journal.lock().len(), 3);
    }

    #[test]
    fn cycle_hooks_keep_registration_order() {
        let journal = Mutex::new(Vec::new());
        let reg = abc(&journal, "B");
        reg.init_all();
        journal.lock().clear();

        for _ in 0..3 {
            reg.before_cycle();
            reg.after_cycle();
        }
        let expected: Vec<String> = (0..3)
            .flat_map(|_| ["before(A)", "before(C)", "after(A)", "after(C)"])
            .map(String::from)
            .collect();
        assert_eq!(*journal.lock(), expected);
        assert_eq!(reg.state("A"), Some(ServiceState::AfterCycle));
    }

    #[test]
    fn finalize_attempts_all_once() {
        let journal = Mutex::new(Vec::new());
        let mut reg = ServiceRegistry::new();
        for name in ["A", "B", "C"] {
            let mut svc = RecordingService::new(name, &journal);
            svc.fail_finalize = name == "A";
            reg.register(Box::new(svc)).unwrap();
        }
        reg.init_all();
        journal.lock().clear();

        let report = reg.finalize_all();
        assert_eq!(report.attempted, 3);
        assert_eq!(report.failed_names(), vec!["A"]);
        assert_eq!(
            *journal.lock(),
            vec!["finalize(A)", "finalize(B)", "finalize(C)"]
        );
        assert_eq!(reg.finalize_all().attempted, 0);

        // Finalized services no longer cycle.
        journal.lock().clear();
        reg.before_cycle();
        reg.after_cycle();
        assert!(journal.lock().is_empty());
    }

    #[test]
    fn stop_signals_without_waiting() {
        let journal = Mutex::new(Vec::new());
        let reg = abc(&journal, "");
        reg.init_all();
        journal.lock().clear();

        reg.stop_all();
        assert_eq!(*journal.lock(), vec!["stop(A)", "stop(B)", "stop(C)"]);
        // Still cycling: stopping is the service's own decision.
        assert_eq!(reg.state("A"), Some(ServiceState::Initialized));
    }

    #[test]
    fn stop_skips_uninitialized_and_failed() {
        let journal = Mutex::new(Vec::new());
        let reg = abc(&journal, "B");
        reg.stop_all();
        assert!(journal.lock().is_empty());

        reg.init_all();
        journal.lock().clear();
        reg.stop_all();
        assert_eq!(*journal.lock(), vec!["stop(A)", "stop(C)"]);

        reg.finalize_all();
        journal.lock().clear();
        reg.stop_all();
        assert!(journal.lock().is_empty());
    }

    #[test]
    fn find_by_name() {
        let journal = Mutex::new(Vec::new());
        let reg = abc(&journal, "");
        assert_eq!(reg.find("B").map(|s| s.name()), Some("B"));
        assert!(reg.find("b").is_none());
        assert!(reg.find("missing").is_none());
        assert_eq!(reg.state("missing"), None);
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn registration_rejections() {
        let journal = Mutex::new(Vec::new());
        let mut reg = abc(&journal, "");

        let dup = RecordingService::new("A", &journal);
        assert_eq!(
            reg.register(Box::new(dup)),
            Err(RegistryError::Duplicate("A".to_string()))
        );

        let empty = RecordingService::new("", &journal);
        assert_eq!(reg.register(Box::new(empty)), Err(RegistryError::EmptyName));

        let long = RecordingService::new(&"n".repeat(MAX_SERVICE_NAME_SIZE + 1), &journal);
        assert!(matches!(
            reg.register(Box::new(long)),
            Err(RegistryError::NameTooLong { .. })
        ));

        let max = RecordingService::new(&"n".repeat(MAX_SERVICE_NAME_SIZE), &journal);
        assert!(reg.register(Box::new(max)).is_ok());
        assert_eq!(reg.len(), 4);
    }
}
