//! Glue variables binding: the table plus the lock guarding its values.
//!
//! Built once at startup. Immutable after construction: lookups need no
//! lock and never allocate. Values behind the table are shared between
//! the scan cycle and service threads; reading or writing them requires a
//! [`GlueGuard`] obtained from [`GlueVariablesBinding::lock`].
//!
//! One mutex covers the whole table. The control engine holds it across
//! its entire value exchange, so a service taking the same lock never
//! observes a half-updated scan image.

use parking_lot::{Mutex, MutexGuard};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::consts::BOOL_GROUP_WIDTH;

use super::bool_group::{BoolGroup, group_bits};
use super::location::{Direction, Location, SizeClass};
use super::value::ValueType;
use super::variable::{GlueError, GlueVariable};

/// Binding identities start at 1; 0 marks a variable not yet owned by a
/// binding.
static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

// ─── GlueGuard ──────────────────────────────────────────────────────

/// Proof that the binding lock is held. Released on drop.
///
/// A guard only unlocks the variables of the binding that issued it.
/// Never hold it across blocking I/O: the scan cycle waits on the same
/// lock.
#[must_use = "the binding lock is released as soon as the guard is dropped"]
pub struct GlueGuard<'b> {
    _guard: MutexGuard<'b, ()>,
    pub(super) binding: u64,
}

// ─── GlueVariablesBinding ───────────────────────────────────────────

/// Lookup façade over an immutable glue variable table.
///
/// Not `Clone`: a binding is the single owner of its lock. Share it by
/// reference.
#[derive(Debug)]
pub struct GlueVariablesBinding<'a> {
    id: u64,
    lock: Mutex<()>,
    variables: Vec<GlueVariable<'a>>,
    checksum: String,
}

impl<'a> GlueVariablesBinding<'a> {
    /// Build the binding from the generated table and its checksum.
    ///
    /// Table order is preserved.
    ///
    /// # Errors
    /// [`GlueError::DuplicateLocation`] if two variables share a location;
    /// such a table would make lookups ambiguous.
    pub fn new(
        mut variables: Vec<GlueVariable<'a>>,
        checksum: impl Into<String>,
    ) -> Result<Self, GlueError> {
        let mut seen = HashSet::with_capacity(variables.len());
        for var in &variables {
            if !seen.insert(var.location()) {
                return Err(GlueError::DuplicateLocation(var.location()));
            }
        }
        let id = NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed);
        for var in &mut variables {
            var.attach(id);
        }
        let checksum = checksum.into();
        debug!(
            "Glue binding built: {} variables, checksum {:?}",
            variables.len(),
            checksum
        );
        Ok(Self {
            id,
            lock: Mutex::new(()),
            variables,
            checksum,
        })
    }

    // ─── Locking ────────────────────────────────────────────────────

    /// Acquire the value lock, blocking until it is free.
    pub fn lock(&self) -> GlueGuard<'_> {
        GlueGuard {
            _guard: self.lock.lock(),
            binding: self.id,
        }
    }

    /// Acquire the value lock if it is free right now.
    pub fn try_lock(&self) -> Option<GlueGuard<'_>> {
        self.lock.try_lock().map(|g| GlueGuard {
            _guard: g,
            binding: self.id,
        })
    }

    // ─── Lookup ─────────────────────────────────────────────────────

    /// Find the variable at `(direction, size, msi, lsi)`.
    ///
    /// Exact match on all four fields. Non-bit variables sit at `lsi = 0`,
    /// so a non-zero `lsi` with any other size never matches. Absence is
    /// routine and yields `None`.
    pub fn find(
        &self,
        direction: Direction,
        size: SizeClass,
        msi: u16,
        lsi: u8,
    ) -> Option<&GlueVariable<'a>> {
        self.variables
            .iter()
            .find(|v| v.matches(direction, size, msi, lsi))
    }

    /// Find the variable at a structured location key.
    pub fn find_key(&self, location: &Location) -> Option<&GlueVariable<'a>> {
        self.find(
            location.direction(),
            location.size(),
            location.msi(),
            location.lsi(),
        )
    }

    /// Find the variable at an address such as `%IX0.1`.
    ///
    /// A malformed address yields `None`, exactly like an absent one.
    pub fn find_location(&self, location: &str) -> Option<&GlueVariable<'a>> {
        let location: Location = location.parse().ok()?;
        self.find_key(&location)
    }

    /// Greatest major index among variables of `value_type` in `direction`,
    /// or `-1` when there are none.
    ///
    /// Lets collaborators size their own per-type indices.
    pub fn find_max_msi(&self, value_type: ValueType, direction: Direction) -> i32 {
        self.variables
            .iter()
            .filter(|v| v.value_type() == value_type && v.direction() == direction)
            .map(|v| i32::from(v.msi()))
            .max()
            .unwrap_or(-1)
    }

    /// Boolean variables of `direction` grouped per byte.
    ///
    /// Group `index` is the major index, slot `n` the bit `%?X{index}.{n}`.
    pub fn bool_groups(&self, direction: Direction) -> Vec<BoolGroup<'a>> {
        let mut bits: Vec<_> = self
            .variables
            .iter()
            .filter(|v| v.direction() == direction)
            .filter_map(|v| {
                let position = u32::from(v.msi()) * BOOL_GROUP_WIDTH as u32 + u32::from(v.lsi());
                v.bit().map(|bit| (position, bit))
            })
            .collect();
        bits.sort_by_key(|(position, _)| *position);
        group_bits(bits)
    }

    // ─── Table ──────────────────────────────────────────────────────

    /// Generation checksum of the table.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Compare against a previously recorded checksum.
    pub fn matches_checksum(&self, recorded: &str) -> bool {
        self.checksum == recorded
    }

    /// All variables in table order.
    pub fn variables(&self) -> &[GlueVariable<'a>] {
        &self.variables
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlueVariable<'a>> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
