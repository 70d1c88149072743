use log::{debug, error};

use crate::consts::{InodePointer, NULL_INODE};
use crate::structure::bitmap::{Allocator, RegionKind};
use crate::structure::inode::{Inode, InodeType};
use crate::structure::inode_table::InodeTable;
use crate::structure::superblock::SuperBlock;
use crate::util::error::{Error, Result};
use realloc::{reallocate, required_blocks};

pub mod directory;
pub mod file;
pub mod realloc;

pub use directory::{create_directory, rename_file, update_directory, Directory, Entry};
pub use file::{create_file, read_file, update_file};

/// Clears the bitmap flag of every block `inode` points at.
pub fn release_blocks<A: Allocator>(storage: &mut A, super_block: &SuperBlock, inode: &Inode) -> Result<()> {
    for block in inode.used_pointers() {
        storage.set_bitmap_flag(super_block, false, block, RegionKind::Blocks)?;
    }
    Ok(())
}

/// Reads the metadata and the inode at `index`, checking that it is live and of `expected` type.
fn load_inode<A: Allocator>(storage: &A, index: InodePointer, expected: InodeType) -> Result<(SuperBlock, Inode)> {
    if index == NULL_INODE {
        return Err(Error::InvalidArgument("inode cannot be 0".to_string()));
    }

    let super_block = SuperBlock::read(storage)?;
    if index >= super_block.inode_count || !storage.is_slot_used(&super_block, RegionKind::Inodes, index)? {
        return Err(Error::NotFound(format!("{} {}", expected, index)));
    }

    let inode = InodeTable::new(&super_block).read_inode(storage, index)?;
    if inode.inode_type != expected {
        return Err(Error::TypeMismatch { expected, found: inode.inode_type });
    }
    Ok((super_block, inode))
}

/// Replaces the content of the object at `index`.
///
/// Every check runs before the held blocks are released. A failure after
/// that point leaves the blocks released and the inode record as it was;
/// the caller gets [`Error::ContentUpdate`].
fn update_object<A: Allocator>(
    storage: &mut A,
    index: InodePointer,
    expected: InodeType,
    content: &[u8],
) -> Result<()> {
    let (super_block, mut inode) = load_inode(storage, index, expected)?;
    inode.check_consistency(&super_block)?;
    required_blocks(content.len() as u64, super_block.block_size)?;

    release_blocks(storage, &super_block, &inode)?;
    let blocks = reallocate(storage, &super_block, &inode, content).map_err(|err| {
        error!("update {} {}: {}", expected, index, err);
        Error::ContentUpdate(Box::new(err))
    })?;

    inode.set_pointers(&blocks)?;
    inode.size = content.len() as u64;

    let table = InodeTable::new(&super_block);
    table.clear_inode(storage, index)?;
    table.write_inode(storage, &inode)?;

    debug!("{} {} now holds {} bytes in blocks {:?}", expected, index, inode.size, blocks);
    Ok(())
}

/// Concatenates the blocks of the object at `index` in pointer order, trimmed to its size.
fn read_object<A: Allocator>(storage: &A, index: InodePointer, expected: InodeType) -> Result<Vec<u8>> {
    let (super_block, inode) = load_inode(storage, index, expected)?;
    inode.check_consistency(&super_block)?;

    let mut data = Vec::with_capacity(inode.used_pointers().len() * super_block.block_size);
    for block in inode.used_pointers() {
        data.extend(storage.read_bytes(super_block.block_offset(block), super_block.block_size)?);
    }
    data.truncate(inode.size as usize);
    Ok(data)
}
