//! Content reallocation.
//!
//! Turns an object's new content into the ordered list of blocks that will
//! hold it. The caller has already cleared the bitmap flags of every block
//! the object held, so the prior pointers are passed to the allocator as an
//! exclusion list instead of being trusted to the bitmap.

use std::cmp::Ordering;

use log::debug;

use crate::consts::{BlockPointer, MAX_CONTENT_BLOCKS};
use crate::structure::bitmap::{Allocator, RegionKind};
use crate::structure::inode::{blocks_for, Inode};
use crate::structure::superblock::SuperBlock;
use crate::util::error::{Error, Result};

/// Blocks needed for `len` bytes, failing once the direct pointers run out.
pub fn required_blocks(len: u64, block_size: usize) -> Result<usize> {
    let required = blocks_for(len, block_size);
    if required > MAX_CONTENT_BLOCKS {
        return Err(Error::CapacityExceeded { required, limit: MAX_CONTENT_BLOCKS });
    }
    Ok(required)
}

/// Reconciles the blocks `inode` holds with the blocks `content_len` bytes need.
///
/// Retained blocks keep their order; trailing ones are dropped when
/// shrinking, fresh ones are appended when growing.
pub fn plan<A: Allocator>(
    storage: &A,
    super_block: &SuperBlock,
    inode: &Inode,
    content_len: u64,
) -> Result<Vec<BlockPointer>> {
    let required = required_blocks(content_len, super_block.block_size)?;
    let held = blocks_for(inode.size, super_block.block_size);
    let mut blocks = inode.used_pointers();

    match held.cmp(&required) {
        Ordering::Greater => {
            let keep = blocks.len().saturating_sub(held - required);
            blocks.truncate(keep);
        }
        Ordering::Less => {
            for _ in held..required {
                let block = storage.find_free_slot(super_block, RegionKind::Blocks, &blocks)?;
                blocks.push(block);
            }
        }
        Ordering::Equal => {}
    }

    debug!("inode {}: {} -> {} blocks {:?}", inode.id, held, required, blocks);
    Ok(blocks)
}

/// Writes `content` across `blocks` and marks each block used once its write succeeded.
///
/// The last block is zero-padded. Nothing is rolled back on failure.
pub fn commit<A: Allocator>(
    storage: &mut A,
    super_block: &SuperBlock,
    blocks: &[BlockPointer],
    content: &[u8],
) -> Result<()> {
    let block_size = super_block.block_size;
    for (i, block) in blocks.iter().enumerate() {
        let start = (i * block_size).min(content.len());
        let end = ((i + 1) * block_size).min(content.len());

        let mut chunk = content[start..end].to_vec();
        chunk.resize(block_size, 0);

        storage.write_bytes(&chunk, super_block.block_offset(*block))?;
        storage.set_bitmap_flag(super_block, true, *block, RegionKind::Blocks)?;
    }
    Ok(())
}

pub fn reallocate<A: Allocator>(
    storage: &mut A,
    super_block: &SuperBlock,
    inode: &Inode,
    content: &[u8],
) -> Result<Vec<BlockPointer>> {
    let blocks = plan(storage, super_block, inode, content.len() as u64)?;
    commit(storage, super_block, &blocks, content)?;
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::MemoryDrive;
    use crate::io::{Region, Storage};
    use crate::structure::format;
    use crate::structure::inode::InodeType;
    use crate::structure::superblock::FormatOptions;

    /// Storage whose writes start failing at a given absolute offset.
    struct FailingStorage {
        inner: Storage<MemoryDrive>,
        fail_at: Option<u64>,
    }

    impl Region for FailingStorage {
        fn size(&self) -> u64 {
            self.inner.size()
        }

        fn read_bytes(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
            self.inner.read_bytes(offset, len)
        }

        fn write_bytes(&mut self, payload: &[u8], offset: u64) -> Result<()> {
            if self.fail_at == Some(offset) {
                return Err(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "injected write failure")));
            }
            self.inner.write_bytes(payload, offset)
        }
    }

    impl Allocator for FailingStorage {}

    fn formatted() -> (Storage<MemoryDrive>, SuperBlock) {
        let mut storage = Storage::new(MemoryDrive::new(32 * 512, 512).unwrap());
        let super_block = format(&mut storage, &FormatOptions::new(64, 128, 32)).unwrap();
        (storage, super_block)
    }

    fn inode_with(blocks: &[BlockPointer], size: u64) -> Inode {
        let mut inode = Inode::new(5, InodeType::File);
        inode.set_pointers(blocks).unwrap();
        inode.size = size;
        inode
    }

    #[test]
    fn required_blocks_ceiling() {
        assert_eq!(required_blocks(0, 64).unwrap(), 1);
        assert_eq!(required_blocks(130, 64).unwrap(), 3);
        assert_eq!(required_blocks(11 * 64, 64).unwrap(), 11);
        assert!(matches!(
            required_blocks(11 * 64 + 1, 64),
            Err(Error::CapacityExceeded { required: 12, limit: 11 })
        ));
    }

    #[test]
    fn growth_excludes_retained_blocks() {
        let (storage, super_block) = formatted();
        // blocks 10 and 11 are free in the bitmap, as after the caller's release step
        let inode = inode_with(&[11, 10], 100);

        let blocks = plan(&storage, &super_block, &inode, 4 * 64).unwrap();
        assert_eq!(blocks, vec![11, 10, 2, 3]);
    }

    #[test]
    fn growth_skips_released_blocks_below_free_space() {
        let (storage, super_block) = formatted();
        let inode = inode_with(&[2, 3], 128);

        let blocks = plan(&storage, &super_block, &inode, 5 * 64).unwrap();
        assert_eq!(blocks, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn shrink_keeps_leading_blocks() {
        let (storage, super_block) = formatted();
        let inode = inode_with(&[9, 4, 7, 8], 4 * 64);

        assert_eq!(plan(&storage, &super_block, &inode, 65).unwrap(), vec![9, 4]);
        assert_eq!(plan(&storage, &super_block, &inode, 0).unwrap(), vec![9]);
    }

    #[test]
    fn same_size_reuses_list() {
        let (storage, super_block) = formatted();
        let inode = inode_with(&[9, 4, 7], 150);
        assert_eq!(plan(&storage, &super_block, &inode, 129).unwrap(), vec![9, 4, 7]);
    }

    #[test]
    fn growth_fails_when_bitmap_is_full() {
        let (mut storage, super_block) = formatted();
        for block in 0..super_block.block_count {
            storage.set_bitmap_flag(&super_block, true, block, RegionKind::Blocks).unwrap();
        }
        let inode = inode_with(&[5], 10);

        let result = plan(&storage, &super_block, &inode, 200);
        assert!(matches!(result, Err(Error::AllocationFailure(RegionKind::Blocks))));
    }

    #[test]
    fn commit_writes_chunks_and_marks_blocks() {
        let (mut storage, super_block) = formatted();
        let content: Vec<u8> = (0..130).map(|i| i as u8).collect();

        commit(&mut storage, &super_block, &[7, 3, 5], &content).unwrap();

        assert_eq!(storage.read_bytes(super_block.block_offset(7), 64).unwrap(), content[..64]);
        assert_eq!(storage.read_bytes(super_block.block_offset(3), 64).unwrap(), content[64..128]);
        let last = storage.read_bytes(super_block.block_offset(5), 64).unwrap();
        assert_eq!(&last[..2], &content[128..]);
        assert_eq!(&last[2..], &[0; 62]);
        for block in [7, 3, 5] {
            assert!(storage.is_slot_used(&super_block, RegionKind::Blocks, block).unwrap());
        }
    }

    #[test]
    fn failed_write_leaves_block_unmarked() {
        let (inner, super_block) = formatted();
        let mut storage = FailingStorage { inner, fail_at: Some(super_block.block_offset(8)) };

        let result = commit(&mut storage, &super_block, &[6, 8, 9], &[1; 150]);
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(storage.is_slot_used(&super_block, RegionKind::Blocks, 6).unwrap());
        assert!(!storage.is_slot_used(&super_block, RegionKind::Blocks, 8).unwrap());
        assert!(!storage.is_slot_used(&super_block, RegionKind::Blocks, 9).unwrap());
    }

    #[test]
    fn reallocate_plans_then_commits() {
        let (mut storage, super_block) = formatted();
        let inode = inode_with(&[4], 3);

        let blocks = reallocate(&mut storage, &super_block, &inode, &[7; 100]).unwrap();
        assert_eq!(blocks, vec![4, 2]);
        assert_eq!(storage.read_bytes(super_block.block_offset(2), 36).unwrap(), vec![7; 36]);
        assert!(storage.is_slot_used(&super_block, RegionKind::Blocks, 4).unwrap());
        assert!(storage.is_slot_used(&super_block, RegionKind::Blocks, 2).unwrap());
    }
}
