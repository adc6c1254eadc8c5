//! Bool grouping: boolean cells clustered into byte-wide groups.
//!
//! Protocol services move coils and discrete inputs in blocks of eight
//! bits. [`group_bits`] builds those blocks from linear bit positions;
//! each group keeps empty slots for positions with no variable bound.

use tracing::warn;

use crate::consts::BOOL_GROUP_WIDTH;

use super::binding::GlueGuard;
use super::variable::BitRef;

/// Eight consecutive bit positions.
#[derive(Debug, Clone, Copy)]
pub struct BoolGroup<'a> {
    /// Group index: bit position / 8. For groups built by the binding this
    /// is the major index of the byte.
    pub index: u16,
    /// Slot `n` holds bit position `index * 8 + n`, or `None` when unbound.
    pub values: [Option<BitRef<'a>>; BOOL_GROUP_WIDTH],
}

impl<'a> BoolGroup<'a> {
    /// Empty group at `index`.
    pub const fn new(index: u16) -> Self {
        Self {
            index,
            values: [None; BOOL_GROUP_WIDTH],
        }
    }

    /// Number of bound slots.
    pub fn bound(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Pack the group into a byte, slot 0 in the least significant bit.
    /// Unbound slots read as 0. Requires the binding lock.
    pub fn pack(&self, guard: &GlueGuard<'_>) -> u8 {
        self.values
            .iter()
            .enumerate()
            .fold(0u8, |acc, (slot, v)| match v {
                Some(bit) if bit.get(guard) => acc | (1 << slot),
                _ => acc,
            })
    }

    /// Write the bits of `byte` into the bound slots. Unbound slots are
    /// skipped. Requires the binding lock.
    pub fn unpack(&self, guard: &GlueGuard<'_>, byte: u8) {
        for (slot, v) in self.values.iter().enumerate() {
            if let Some(bit) = v {
                bit.set(guard, (byte >> slot) & 1 != 0);
            }
        }
    }
}

/// Group boolean cells by linear bit position.
///
/// Input must be ordered by position (the binding yields it that way);
/// a position that appears twice keeps its first cell. Positions whose
/// group index does not fit a `u16` are skipped. Produces one group per
/// populated run of eight positions, in ascending order.
pub fn group_bits<'a>(bits: impl IntoIterator<Item = (u32, BitRef<'a>)>) -> Vec<BoolGroup<'a>> {
    let mut groups: Vec<BoolGroup<'a>> = Vec::new();
    for (position, bit) in bits {
        let width = BOOL_GROUP_WIDTH as u32;
        let Ok(index) = u16::try_from(position / width) else {
            warn!("Bit position {} is beyond the last bool group, skipped", position);
            continue;
        };
        let slot = (position % width) as usize;
        if groups.last().map(|g| g.index) != Some(index) {
            groups.push(BoolGroup::new(index));
        }
        if let Some(group) = groups.last_mut() {
            group.values[slot].get_or_insert(bit);
        }
    }
    groups
}
