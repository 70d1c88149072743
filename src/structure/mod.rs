use log::info;

use crate::consts::{NULL_INODE, NULL_POINTER};
use crate::structure::bitmap::{Allocator, RegionKind};
use crate::structure::inode::InodeType;
use crate::structure::inode_table::InodeTable;
use crate::structure::superblock::{FormatOptions, SuperBlock};
use crate::util::error::Result;
use crate::util::format::pretty_size_from_bytes;

pub mod bitmap;
pub mod inode;
pub mod inode_table;
pub mod superblock;

/// Writes an empty filesystem into `storage` and returns its superblock.
///
/// Inode 0 and block 0 are reserved so they can act as the invalid
/// reference and the unused pointer. The root directory is the first
/// inode handed out afterwards.
pub fn format<A: Allocator>(storage: &mut A, options: &FormatOptions) -> Result<SuperBlock> {
    options.validate(storage.size())?;

    let mut super_block = SuperBlock::new(options);
    storage.zero_bytes(0, super_block.block_area_base as usize)?;
    super_block.write(storage)?;

    storage.set_bitmap_flag(&super_block, true, NULL_INODE, RegionKind::Inodes)?;
    storage.set_bitmap_flag(&super_block, true, NULL_POINTER, RegionKind::Blocks)?;

    let root = InodeTable::new(&super_block).allocate(storage, &super_block, InodeType::Directory)?;
    super_block.set_root_inode(storage, root.id())?;

    info!(
        "formatted {} with {} blocks of {} and {} inodes",
        pretty_size_from_bytes(super_block.required_size()),
        super_block.block_count,
        pretty_size_from_bytes(super_block.block_size as u64),
        super_block.inode_count
    );
    Ok(super_block)
}
