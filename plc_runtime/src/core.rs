//! Runtime core: scan cycle loop and service lifecycle.
//!
//! One scan cycle is
//!
//! ```text
//! registry.before_cycle()
//! lock binding → program.scan() → unlock
//! registry.after_cycle()
//! ```
//!
//! The program exchange runs entirely under the binding lock, so a service
//! that takes the lock in its hooks sees either the previous or the next
//! scan image, never a mix.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use plc_common::glue::GlueVariablesBinding;
use tracing::{debug, info, warn};

use crate::config::RuntimeSection;
use crate::error::{RuntimeError, RuntimeResult};
use crate::program::ControlProgram;
use crate::service_registry::{LifecycleReport, ServiceRegistry};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Scan cycle timing statistics. O(1) update, no allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [µs].
    pub last_cycle_us: u64,
    /// Minimum cycle duration [µs].
    pub min_cycle_us: u64,
    /// Maximum cycle duration [µs].
    pub max_cycle_us: u64,
    /// Running sum for average computation.
    pub sum_cycle_us: u64,
    /// Cycles that took longer than the configured period.
    pub overruns: u64,
}

impl CycleStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_us: 0,
            min_cycle_us: u64::MAX,
            max_cycle_us: 0,
            sum_cycle_us: 0,
            overruns: 0,
        }
    }

    /// Record one cycle duration; returns `true` on overrun.
    #[inline]
    pub fn record(&mut self, duration_us: u64, period_us: u64) -> bool {
        self.cycle_count += 1;
        self.last_cycle_us = duration_us;
        self.min_cycle_us = self.min_cycle_us.min(duration_us);
        self.max_cycle_us = self.max_cycle_us.max(duration_us);
        self.sum_cycle_us = self.sum_cycle_us.saturating_add(duration_us);
        let overrun = duration_us > period_us;
        if overrun {
            self.overruns += 1;
        }
        overrun
    }

    /// Average cycle time [µs] (returns 0 if no cycles).
    #[inline]
    pub fn avg_cycle_us(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_us / self.cycle_count
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Checksum Policy ────────────────────────────────────────────────

/// Compare the binding's checksum against the recorded one.
///
/// No recorded checksum means nothing to compare. A mismatch is logged;
/// it is an error only with `strict_checksum`.
///
/// # Errors
/// [`RuntimeError::ChecksumMismatch`] on mismatch in strict mode.
pub fn check_checksum(section: &RuntimeSection, binding: &GlueVariablesBinding<'_>) -> RuntimeResult<()> {
    let Some(expected) = section.expected_checksum.as_deref() else {
        debug!("No expected checksum configured, skipping check");
        return Ok(());
    };
    if binding.matches_checksum(expected) {
        info!("Glue checksum {:?} verified", expected);
        return Ok(());
    }
    let err = RuntimeError::ChecksumMismatch {
        expected: expected.to_string(),
        actual: binding.checksum().to_string(),
    };
    if section.strict_checksum {
        return Err(err);
    }
    warn!("{}; continuing", err);
    Ok(())
}

// ─── RuntimeCore ────────────────────────────────────────────────────

/// Drives the control program and the service registry.
pub struct RuntimeCore<'b, P: ControlProgram> {
    binding: &'b GlueVariablesBinding<'b>,
    registry: ServiceRegistry<'b>,
    program: P,
    /// Running flag for loop control, shared with signal handlers
    running: Arc<AtomicBool>,
    cycle_time: Duration,
    require_all_services: bool,
    stats: CycleStats,
}

impl<'b, P: ControlProgram> RuntimeCore<'b, P> {
    /// Assemble a core from its collaborators.
    pub fn new(
        binding: &'b GlueVariablesBinding<'b>,
        registry: ServiceRegistry<'b>,
        program: P,
        section: &RuntimeSection,
    ) -> Self {
        info!(
            "RuntimeCore created: {} glue variables, {} services, cycle_time={}us",
            binding.len(),
            registry.len(),
            section.cycle_time_us
        );
        Self {
            binding,
            registry,
            program,
            running: Arc::new(AtomicBool::new(false)),
            cycle_time: Duration::from_micros(section.cycle_time_us),
            require_all_services: section.require_all_services,
            stats: CycleStats::new(),
        }
    }

    /// Initialize all services.
    ///
    /// # Errors
    /// [`RuntimeError::ServicesFailed`] when a service failed and
    /// `require_all_services` is set. Services are stopped and finalized
    /// before returning the error.
    pub fn start(&mut self) -> RuntimeResult<LifecycleReport> {
        info!("Initializing {} services...", self.registry.len());
        let report = self.registry.init_all();
        if !report.is_ok() {
            let failed: Vec<String> = report.failed_names().iter().map(|n| n.to_string()).collect();
            if self.require_all_services {
                self.shutdown();
                return Err(RuntimeError::ServicesFailed(failed));
            }
            warn!("Starting degraded, failed services: {}", failed.join(", "));
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(report)
    }

    /// Execute one scan cycle and record its timing.
    pub fn run_cycle(&mut self) {
        let cycle_start = Instant::now();

        self.registry.before_cycle();
        {
            let guard = self.binding.lock();
            self.program.scan(&guard);
        }
        self.registry.after_cycle();

        let elapsed_us = cycle_start.elapsed().as_micros() as u64;
        if self.stats.record(elapsed_us, self.cycle_time.as_micros() as u64) {
            let overruns = self.stats.overruns;
            if overruns <= 10 || overruns % 1000 == 0 {
                warn!(
                    "Cycle overrun #{}: cycle took {}us (target {}us)",
                    overruns,
                    elapsed_us,
                    self.cycle_time.as_micros()
                );
            }
        }
    }

    /// Run scan cycles paced at the cycle period until the running flag is
    /// cleared or `max_cycles` cycles have completed.
    ///
    /// Returns the number of cycles run by this call.
    pub fn run(&mut self, max_cycles: Option<u64>) -> u64 {
        info!(
            "Starting scan loop (cycle_time={}us, max_cycles={:?})",
            self.cycle_time.as_micros(),
            max_cycles
        );
        let mut executed = 0u64;
        while self.running.load(Ordering::SeqCst) {
            if max_cycles.is_some_and(|max| executed >= max) {
                break;
            }
            let cycle_start = Instant::now();
            self.run_cycle();
            executed += 1;

            if self.stats.cycle_count % 1000 == 0 {
                debug!(
                    "Scan loop: {} cycles, avg={}us, max={}us, overruns={}",
                    self.stats.cycle_count,
                    self.stats.avg_cycle_us(),
                    self.stats.max_cycle_us,
                    self.stats.overruns
                );
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.cycle_time {
                std::thread::sleep(self.cycle_time - elapsed);
            }
        }
        info!(
            "Scan loop stopped after {} cycles (overruns: {})",
            executed, self.stats.overruns
        );
        executed
    }

    /// Stop and finalize every service. Idempotent.
    pub fn shutdown(&mut self) -> LifecycleReport {
        info!("Shutdown requested");
        self.running.store(false, Ordering::SeqCst);
        self.registry.stop_all();
        let report = self.registry.finalize_all();
        if !report.is_ok() {
            warn!("Services failed to finalize: {}", report.failed_names().join(", "));
        }
        report
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Get timing statistics.
    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// The service registry driven by this core.
    pub fn registry(&self) -> &ServiceRegistry<'b> {
        &self.registry
    }

    /// The control program executed each cycle.
    pub fn program(&self) -> &P {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::LoopbackProgram;
    use plc_common::glue::{GlueVariable, ValueType};
    use std::sync::atomic::AtomicU32;

    #[test]
    fn stats_track_overruns() {
        let mut stats = CycleStats::new();
        assert!(!stats.record(80, 100));
        assert!(stats.record(150, 100));
        assert!(!stats.record(100, 100));
        assert_eq!(stats.cycle_count, 3);
        assert_eq!(stats.overruns, 1);
        assert_eq!(stats.min_cycle_us, 80);
        assert_eq!(stats.max_cycle_us, 150);
        assert_eq!(stats.avg_cycle_us(), 110);
        assert_eq!(CycleStats::new().avg_cycle_us(), 0);
    }

    fn section(expected: Option<&str>, strict: bool) -> RuntimeSection {
        RuntimeSection {
            expected_checksum: expected.map(str::to_string),
            strict_checksum: strict,
            ..RuntimeSection::default()
        }
    }

    #[test]
    fn checksum_policy() {
        let binding = GlueVariablesBinding::new(Vec::new(), "abc").unwrap();
        assert!(check_checksum(&section(None, true), &binding).is_ok());
        assert!(check_checksum(&section(Some("abc"), true), &binding).is_ok());
        assert!(check_checksum(&section(Some("xyz"), false), &binding).is_ok());
        assert!(matches!(
            check_checksum(&section(Some("xyz"), true), &binding),
            Err(RuntimeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn run_stops_at_max_cycles() {
        let md = AtomicU32::new(0);
        let table = vec![GlueVariable::located("%MD0", ValueType::UDInt, &md).unwrap()];
        let binding = GlueVariablesBinding::new(table, "").unwrap();
        let section = RuntimeSection {
            cycle_time_us: 100,
            ..RuntimeSection::default()
        };
        let mut core = RuntimeCore::new(
            &binding,
            ServiceRegistry::new(),
            LoopbackProgram::new(&binding),
            &section,
        );
        core.start().unwrap();
        assert_eq!(core.run(Some(4)), 4);
        assert_eq!(core.stats().cycle_count, 4);
        assert_eq!(md.load(Ordering::Relaxed), 4);

        core.running_flag().store(false, Ordering::SeqCst);
        assert_eq!(core.run(None), 0);
        assert!(core.shutdown().is_ok());
    }
}
