use log::debug;

use crate::consts::InodePointer;
use crate::io::Region;
use crate::structure::bitmap::{Allocator, RegionKind};
use crate::structure::inode::{Inode, InodeType};
use crate::structure::superblock::SuperBlock;
use crate::util::error::{Error, Result};

/// Fixed-size inode records stored back to back after the bitmaps.
pub struct InodeTable {
    table_index: u64,
    inode_count: u64,
}

impl InodeTable {
    pub fn new(super_block: &SuperBlock) -> InodeTable {
        InodeTable { table_index: super_block.inode_table_base, inode_count: super_block.inode_count }
    }

    pub fn read_inode<R: Region>(&self, storage: &R, index: InodePointer) -> Result<Inode> {
        let bytes = storage.read_bytes(self.inode_offset(index)?, Inode::size_on_disk())?;
        Inode::from_bytes(index, &bytes)
    }

    pub fn write_inode<R: Region>(&self, storage: &mut R, inode: &Inode) -> Result<()> {
        let offset = self.inode_offset(inode.id)?;
        storage.write_bytes(&inode.to_bytes(), offset)
    }

    pub fn clear_inode<R: Region>(&self, storage: &mut R, index: InodePointer) -> Result<()> {
        let offset = self.inode_offset(index)?;
        storage.zero_bytes(offset, Inode::size_on_disk())
    }

    /// Claims a free inode slot together with one zeroed data block.
    ///
    /// Nothing is marked in either bitmap until both slots are found and the
    /// record is written.
    pub fn allocate<A: Allocator>(
        &self,
        storage: &mut A,
        super_block: &SuperBlock,
        inode_type: InodeType,
    ) -> Result<Inode> {
        let index = storage.find_free_slot(super_block, RegionKind::Inodes, &[])?;
        let block = storage.find_free_slot(super_block, RegionKind::Blocks, &[])?;

        let mut inode = Inode::new(index, inode_type);
        inode.set_pointers(&[block])?;

        storage.zero_bytes(super_block.block_offset(block), super_block.block_size)?;
        self.write_inode(storage, &inode)?;
        storage.set_bitmap_flag(super_block, true, block, RegionKind::Blocks)?;
        storage.set_bitmap_flag(super_block, true, index, RegionKind::Inodes)?;

        debug!("allocated {} inode {} with block {}", inode_type, index, block);
        Ok(inode)
    }

    #[inline]
    fn inode_offset(&self, index: InodePointer) -> Result<u64> {
        if index >= self.inode_count {
            return Err(Error::InvalidArgument(format!(
                "inode {} is outside a table of {} inodes",
                index, self.inode_count
            )));
        }
        Ok(self.table_index + index * Inode::size_on_disk() as u64)
    }
}
