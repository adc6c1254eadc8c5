//! Control program seam.
//!
//! The execution engine of a compiled control program plugs in through
//! [`ControlProgram`]. The runtime core calls `scan()` once per cycle with
//! the binding lock held, so the whole exchange is atomic to services.

use plc_common::glue::{Direction, GlueGuard, GlueValue, GlueVariable, GlueVariablesBinding, SizeClass};
use tracing::{debug, warn};

/// One scan of a control program.
pub trait ControlProgram {
    /// Read inputs, execute logic and write outputs through the glue
    /// table. Called with the binding lock held; must not block.
    fn scan(&mut self, guard: &GlueGuard<'_>);
}

/// Mirrors every input onto the output at the same address and counts
/// completed cycles in `%MD0`.
///
/// Pairs are resolved once at construction; the scan touches only the
/// cached variables.
pub struct LoopbackProgram<'b> {
    pairs: Vec<(&'b GlueVariable<'b>, &'b GlueVariable<'b>)>,
    counter: Option<&'b GlueVariable<'b>>,
}

impl<'b> LoopbackProgram<'b> {
    /// Resolve input/output pairs and the cycle counter in `binding`.
    pub fn new(binding: &'b GlueVariablesBinding<'b>) -> Self {
        let pairs: Vec<_> = binding
            .iter()
            .filter(|v| v.direction() == Direction::Input)
            .filter_map(|input| {
                let output = binding.find(Direction::Output, input.size(), input.msi(), input.lsi())?;
                (output.value_type() == input.value_type()).then_some((input, output))
            })
            .collect();

        let counter = binding
            .find(Direction::Memory, SizeClass::DoubleWord, 0, 0)
            .filter(|v| v.value_type().is_integer());
        if counter.is_none() {
            warn!("No integer %MD0 in glue table, cycle counter disabled");
        }
        debug!("Loopback program: {} input/output pairs", pairs.len());
        Self { pairs, counter }
    }

    /// Number of mirrored input/output pairs.
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }
}

impl ControlProgram for LoopbackProgram<'_> {
    fn scan(&mut self, guard: &GlueGuard<'_>) {
        for (input, output) in &self.pairs {
            if let Err(e) = output.write(guard, input.read(guard)) {
                warn!("Loopback {} -> {} failed: {}", input.location(), output.location(), e);
            }
        }
        if let Some(counter) = self.counter {
            let next = counter.read(guard).to_bits().wrapping_add(1);
            if let Some(value) = GlueValue::from_bits(counter.value_type(), next) {
                if let Err(e) = counter.write(guard, value) {
                    warn!("Cycle counter update failed: {}", e);
                }
            }
        }
    }
}
