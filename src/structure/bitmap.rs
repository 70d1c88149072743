use std::fmt;

use log::trace;

use crate::driver::DeviceDriver;
use crate::io::{Region, Storage};
use crate::structure::superblock::SuperBlock;
use crate::util::error::{Error, Result};

/// Selects which occupancy bitmap an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Inodes,
    Blocks,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::Inodes => write!(f, "inode"),
            RegionKind::Blocks => write!(f, "block"),
        }
    }
}

/// Free-space tracking over the on-disk bitmaps of a region.
///
/// Bits are LSB-first within each byte, a set bit marks the slot as used.
/// The region is the only source of truth: nothing is cached between calls,
/// so callers decide ownership and pass it in through `exclude`.
pub trait Allocator: Region {
    fn is_slot_used(&self, super_block: &SuperBlock, kind: RegionKind, index: u64) -> Result<bool> {
        let (offset, bit) = slot_position(super_block, kind, index)?;
        let byte = self.read_bytes(offset, 1)?[0];
        Ok(byte & (1u8 << bit) != 0)
    }

    fn set_bitmap_flag(&mut self, super_block: &SuperBlock, used: bool, index: u64, kind: RegionKind) -> Result<()> {
        let (offset, bit) = slot_position(super_block, kind, index)?;
        let mut byte = self.read_bytes(offset, 1)?[0];
        if used {
            byte |= 1u8 << bit;
        } else {
            byte &= !(1u8 << bit);
        }
        trace!("Marking {} {} {}", kind, index, if used { "used" } else { "free" });
        self.write_bytes(&[byte], offset)
    }

    /// Returns the lowest free slot that is not listed in `exclude`.
    fn find_free_slot(&self, super_block: &SuperBlock, kind: RegionKind, exclude: &[u64]) -> Result<u64> {
        let slots = super_block.slot_count(kind);
        let bitmap = self.read_bytes(super_block.bitmap_base(kind), slots.div_ceil(8) as usize)?;

        for (byte_index, &byte) in bitmap.iter().enumerate() {
            if byte == u8::MAX {
                continue;
            }
            for bit in 0..8u32 {
                let index = byte_index as u64 * 8 + bit as u64;
                if index >= slots {
                    break;
                }
                if byte & (1u8 << bit) == 0 && !exclude.contains(&index) {
                    return Ok(index);
                }
            }
        }

        Err(Error::AllocationFailure(kind))
    }
}

impl<A: DeviceDriver> Allocator for Storage<A> {}

fn slot_position(super_block: &SuperBlock, kind: RegionKind, index: u64) -> Result<(u64, u32)> {
    if index >= super_block.slot_count(kind) {
        return Err(Error::InvalidArgument(format!(
            "{} slot {} is outside a bitmap of {} slots",
            kind,
            index,
            super_block.slot_count(kind)
        )));
    }
    Ok((super_block.bitmap_base(kind) + index / 8, (index % 8) as u32))
}
