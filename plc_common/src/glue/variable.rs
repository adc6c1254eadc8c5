//! Glue variable descriptors and the storage cells they borrow.
//!
//! Storage cells belong to the control program image. A [`GlueVariable`]
//! only borrows its cell for `'a` and never frees it. Every value access
//! takes a [`GlueGuard`] issued by the binding that owns the variable, so
//! it can only happen while that binding's lock is held. The atomics use
//! relaxed ordering; the lock orders all accesses.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, AtomicU64, Ordering};
use thiserror::Error;

use super::binding::GlueGuard;
use super::location::{Direction, Location, LocationError, SizeClass};
use super::value::{GlueValue, ValueType};

// ─── Error Types ────────────────────────────────────────────────────

/// Contract violations when building or accessing glue variables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GlueError {
    /// Location string or key is malformed.
    #[error("invalid location: {0}")]
    InvalidLocation(#[from] LocationError),

    /// Declared value type cannot live at a location of this size.
    #[error("{value_type} cannot be located at {location}")]
    SizeMismatch {
        location: Location,
        value_type: ValueType,
    },

    /// Storage cell width does not match the location's size class.
    #[error("{location} needs a {expected} cell, got {actual}")]
    CellWidthMismatch {
        location: Location,
        expected: SizeClass,
        actual: SizeClass,
    },

    /// `Unassigned` is reserved for collaborator indices.
    #[error("{0} has no assigned value type")]
    Unassigned(Location),

    /// Two variables claim the same location.
    #[error("duplicate glue variable at {0}")]
    DuplicateLocation(Location),

    /// Written value has a different type than the variable.
    #[error("{location} is {expected}, cannot write {actual}")]
    TypeMismatch {
        location: Location,
        expected: ValueType,
        actual: ValueType,
    },

    /// Access attempted with a guard issued by a different binding.
    #[error("{0} is not guarded by this lock")]
    ForeignGuard(Location),
}

const FOREIGN_GUARD: &str = "glue value accessed with the guard of another binding";

// ─── GlueCell ───────────────────────────────────────────────────────

/// Borrowed view of a storage cell, one variant per size class.
#[derive(Debug, Clone, Copy)]
pub enum GlueCell<'a> {
    Bit(&'a AtomicBool),
    Byte(&'a AtomicU8),
    Word(&'a AtomicU16),
    DoubleWord(&'a AtomicU32),
    LongWord(&'a AtomicU64),
}

impl GlueCell<'_> {
    /// Size class this cell can back.
    pub const fn size_class(&self) -> SizeClass {
        match self {
            Self::Bit(_) => SizeClass::Bit,
            Self::Byte(_) => SizeClass::Byte,
            Self::Word(_) => SizeClass::Word,
            Self::DoubleWord(_) => SizeClass::DoubleWord,
            Self::LongWord(_) => SizeClass::LongWord,
        }
    }

    #[inline]
    fn load_bits(&self) -> u64 {
        match self {
            Self::Bit(c) => c.load(Ordering::Relaxed) as u64,
            Self::Byte(c) => c.load(Ordering::Relaxed) as u64,
            Self::Word(c) => c.load(Ordering::Relaxed) as u64,
            Self::DoubleWord(c) => c.load(Ordering::Relaxed) as u64,
            Self::LongWord(c) => c.load(Ordering::Relaxed),
        }
    }

    #[inline]
    fn store_bits(&self, bits: u64) {
        match self {
            Self::Bit(c) => c.store(bits & 1 != 0, Ordering::Relaxed),
            Self::Byte(c) => c.store(bits as u8, Ordering::Relaxed),
            Self::Word(c) => c.store(bits as u16, Ordering::Relaxed),
            Self::DoubleWord(c) => c.store(bits as u32, Ordering::Relaxed),
            Self::LongWord(c) => c.store(bits, Ordering::Relaxed),
        }
    }
}

impl<'a> From<&'a AtomicBool> for GlueCell<'a> {
    fn from(c: &'a AtomicBool) -> Self {
        Self::Bit(c)
    }
}

impl<'a> From<&'a AtomicU8> for GlueCell<'a> {
    fn from(c: &'a AtomicU8) -> Self {
        Self::Byte(c)
    }
}

impl<'a> From<&'a AtomicU16> for GlueCell<'a> {
    fn from(c: &'a AtomicU16) -> Self {
        Self::Word(c)
    }
}

impl<'a> From<&'a AtomicU32> for GlueCell<'a> {
    fn from(c: &'a AtomicU32) -> Self {
        Self::DoubleWord(c)
    }
}

impl<'a> From<&'a AtomicU64> for GlueCell<'a> {
    fn from(c: &'a AtomicU64) -> Self {
        Self::LongWord(c)
    }
}

// ─── BitRef ─────────────────────────────────────────────────────────

/// Borrowed boolean cell, as handed out by bool grouping.
#[derive(Debug, Clone, Copy)]
pub struct BitRef<'a> {
    cell: &'a AtomicBool,
    binding: u64,
}

impl BitRef<'_> {
    /// Read the bit. Requires the owning binding's lock.
    ///
    /// # Panics
    /// If `guard` was issued by another binding.
    #[inline]
    pub fn get(&self, guard: &GlueGuard<'_>) -> bool {
        assert_eq!(guard.binding, self.binding, "{FOREIGN_GUARD}");
        self.cell.load(Ordering::Relaxed)
    }

    /// Write the bit. Requires the owning binding's lock.
    ///
    /// # Panics
    /// If `guard` was issued by another binding.
    #[inline]
    pub fn set(&self, guard: &GlueGuard<'_>, value: bool) {
        assert_eq!(guard.binding, self.binding, "{FOREIGN_GUARD}");
        self.cell.store(value, Ordering::Relaxed);
    }
}

// ─── GlueVariable ───────────────────────────────────────────────────

/// One located variable bound to a storage cell.
///
/// Immutable once built. The descriptor is checked at construction:
/// the value type must match the location's size class and the cell
/// must be exactly that wide.
#[derive(Debug, Clone, Copy)]
pub struct GlueVariable<'a> {
    location: Location,
    value_type: ValueType,
    cell: GlueCell<'a>,
    /// Owning binding, 0 until the variable joins one.
    binding: u64,
}

impl<'a> GlueVariable<'a> {
    /// Bind `cell` at `location` with the declared `value_type`.
    ///
    /// # Errors
    /// - [`GlueError::Unassigned`] for [`ValueType::Unassigned`].
    /// - [`GlueError::SizeMismatch`] when the type does not fit the size.
    /// - [`GlueError::CellWidthMismatch`] when the cell is the wrong width.
    pub fn new(
        location: Location,
        value_type: ValueType,
        cell: impl Into<GlueCell<'a>>,
    ) -> Result<Self, GlueError> {
        let cell = cell.into();
        let expected = value_type
            .size_class()
            .ok_or(GlueError::Unassigned(location))?;
        if expected != location.size() {
            return Err(GlueError::SizeMismatch {
                location,
                value_type,
            });
        }
        if cell.size_class() != expected {
            return Err(GlueError::CellWidthMismatch {
                location,
                expected,
                actual: cell.size_class(),
            });
        }
        Ok(Self {
            location,
            value_type,
            cell,
            binding: 0,
        })
    }

    /// Parse `location` and bind `cell` there.
    ///
    /// ```rust
    /// use std::sync::atomic::AtomicBool;
    /// use plc_common::glue::{GlueVariable, ValueType};
    ///
    /// let start = AtomicBool::new(false);
    /// let var = GlueVariable::located("%IX0.1", ValueType::Bool, &start).unwrap();
    /// assert_eq!(var.lsi(), 1);
    /// ```
    pub fn located(
        location: &str,
        value_type: ValueType,
        cell: impl Into<GlueCell<'a>>,
    ) -> Result<Self, GlueError> {
        Self::new(location.parse()?, value_type, cell)
    }

    #[inline]
    pub const fn location(&self) -> Location {
        self.location
    }

    #[inline]
    pub const fn direction(&self) -> Direction {
        self.location.direction()
    }

    #[inline]
    pub const fn size(&self) -> SizeClass {
        self.location.size()
    }

    #[inline]
    pub const fn msi(&self) -> u16 {
        self.location.msi()
    }

    #[inline]
    pub const fn lsi(&self) -> u8 {
        self.location.lsi()
    }

    #[inline]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub(super) fn attach(&mut self, binding: u64) {
        self.binding = binding;
    }

    /// Boolean cell, when this is a `BOOL` variable.
    pub fn bit(&self) -> Option<BitRef<'a>> {
        match self.cell {
            GlueCell::Bit(cell) => Some(BitRef {
                cell,
                binding: self.binding,
            }),
            _ => None,
        }
    }

    /// Read the current value. Requires the owning binding's lock.
    ///
    /// # Panics
    /// If `guard` was issued by another binding.
    pub fn read(&self, guard: &GlueGuard<'_>) -> GlueValue {
        assert_eq!(guard.binding, self.binding, "{FOREIGN_GUARD}");
        let bits = self.cell.load_bits();
        // The constructor rejects `Unassigned`, so a value always exists.
        GlueValue::from_bits(self.value_type, bits).unwrap_or(GlueValue::LWord(bits))
    }

    /// Write `value`. Requires the owning binding's lock.
    ///
    /// # Errors
    /// - [`GlueError::ForeignGuard`] when `guard` belongs to another binding.
    /// - [`GlueError::TypeMismatch`] when `value` is not of the declared type.
    pub fn write(&self, guard: &GlueGuard<'_>, value: GlueValue) -> Result<(), GlueError> {
        if guard.binding != self.binding {
            return Err(GlueError::ForeignGuard(self.location));
        }
        if value.value_type() != self.value_type {
            return Err(GlueError::TypeMismatch {
                location: self.location,
                expected: self.value_type,
                actual: value.value_type(),
            });
        }
        self.cell.store_bits(value.to_bits());
        Ok(())
    }

    /// Whether this variable sits at `(direction, size, msi, lsi)`.
    ///
    /// Non-bit locations always carry `lsi = 0`, so a non-zero `lsi` only
    /// matches bit variables.
    #[inline]
    pub fn matches(&self, direction: Direction, size: SizeClass, msi: u16, lsi: u8) -> bool {
        let l = &self.location;
        l.direction() == direction && l.size() == size && l.msi() == msi && l.lsi() == lsi
    }
}
