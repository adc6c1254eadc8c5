//! Program image: the storage cells behind the glue table.
//!
//! A compiled control program owns its located variables as statics. The
//! runtime binary has no compiled program, so it allocates the cells
//! from the glue map instead. The image owns the cells and outlives the
//! binding, which only borrows them.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, AtomicU64};

use plc_common::glue::{
    GlueCell, GlueError, GlueVariable, GlueVariablesBinding, Location, SizeClass, ValueType,
};
use tracing::info;

use crate::config::GlueMap;

/// Owned storage cell, sized by location.
#[derive(Debug)]
enum OwnedCell {
    Bit(AtomicBool),
    Byte(AtomicU8),
    Word(AtomicU16),
    DoubleWord(AtomicU32),
    LongWord(AtomicU64),
}

impl OwnedCell {
    fn zeroed(size: SizeClass) -> Self {
        match size {
            SizeClass::Bit => Self::Bit(AtomicBool::new(false)),
            SizeClass::Byte => Self::Byte(AtomicU8::new(0)),
            SizeClass::Word => Self::Word(AtomicU16::new(0)),
            SizeClass::DoubleWord => Self::DoubleWord(AtomicU32::new(0)),
            SizeClass::LongWord => Self::LongWord(AtomicU64::new(0)),
        }
    }

    fn view(&self) -> GlueCell<'_> {
        match self {
            Self::Bit(c) => c.into(),
            Self::Byte(c) => c.into(),
            Self::Word(c) => c.into(),
            Self::DoubleWord(c) => c.into(),
            Self::LongWord(c) => c.into(),
        }
    }
}

#[derive(Debug)]
struct ImageEntry {
    location: Location,
    value_type: ValueType,
    cell: OwnedCell,
}

/// Zero-initialized storage for every variable of a glue map.
#[derive(Debug)]
pub struct ProcessImage {
    entries: Vec<ImageEntry>,
    checksum: String,
}

impl ProcessImage {
    /// Allocate one zeroed cell per glue map entry, in map order.
    ///
    /// # Errors
    /// [`GlueError::InvalidLocation`] for a malformed location.
    pub fn from_map(map: &GlueMap) -> Result<Self, GlueError> {
        let entries = map
            .variables
            .iter()
            .map(|var| -> Result<ImageEntry, GlueError> {
                let location: Location = var.location.parse()?;
                Ok(ImageEntry {
                    location,
                    value_type: var.value_type,
                    cell: OwnedCell::zeroed(location.size()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!("Process image allocated: {} cells", entries.len());
        Ok(Self {
            entries,
            checksum: map.checksum.clone(),
        })
    }

    /// Build the glue binding over this image.
    ///
    /// # Errors
    /// Any [`GlueError`] the table contract raises: type/size mismatch,
    /// `Unassigned` types, duplicate locations.
    pub fn bind(&self) -> Result<GlueVariablesBinding<'_>, GlueError> {
        let table = self
            .entries
            .iter()
            .map(|e| GlueVariable::new(e.location, e.value_type, e.cell.view()))
            .collect::<Result<Vec<_>, _>>()?;
        GlueVariablesBinding::new(table, self.checksum.as_str())
    }

    /// Number of allocated cells.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` for an empty glue map.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
