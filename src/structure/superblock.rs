use crate::consts::{BlockPointer, InodePointer, SUPERBLOCK_SIZE};
use crate::io::Region;
use crate::structure::bitmap::RegionKind;
use crate::structure::inode::Inode;
use crate::util::error::{Error, Result};
use crate::util::format::pretty_size_from_bytes;
use crate::util::serializable::{ByteSerializable, KnownSize};

const MAGIC: u32 = 0x6266_7331;

/// Geometry requested when formatting a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub block_size: usize,
    pub block_count: u64,
    pub inode_count: u64,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions { block_size: 512, block_count: 1024, inode_count: 128 }
    }
}

impl FormatOptions {
    pub fn new(block_size: usize, block_count: u64, inode_count: u64) -> FormatOptions {
        FormatOptions { block_size, block_count, inode_count }
    }

    /// Checks the geometry against the size of the region it will be written to.
    pub fn validate(&self, region_size: u64) -> Result<()> {
        if self.block_size == 0 || self.block_size > u32::MAX as usize {
            return Err(Error::InvalidArgument(format!("unusable block size {}", self.block_size)));
        }
        // slot 0 of each bitmap is reserved
        if self.block_count < 2 || self.inode_count < 2 {
            return Err(Error::InvalidArgument(format!(
                "need at least 2 blocks and 2 inodes, got {} and {}",
                self.block_count, self.inode_count
            )));
        }

        let required = SuperBlock::new(self).required_size();
        if required > region_size {
            return Err(Error::InvalidArgument(format!(
                "layout needs {}, region holds {}",
                pretty_size_from_bytes(required),
                pretty_size_from_bytes(region_size)
            )));
        }
        Ok(())
    }
}

/// Filesystem metadata stored at offset 0 of the region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    pub magic: u32,
    pub block_size: usize,
    pub block_count: u64,
    pub inode_count: u64,
    pub root_inode: InodePointer,
    pub inode_map_base: u64,
    pub block_map_base: u64,
    pub inode_table_base: u64,
    pub block_area_base: u64,
}

impl SuperBlock {
    /// Lays out the bitmaps, inode table and block area one after another.
    pub fn new(options: &FormatOptions) -> SuperBlock {
        let inode_map_base = SUPERBLOCK_SIZE as u64;
        let block_map_base = inode_map_base + bitmap_len(options.inode_count);
        let inode_table_base = block_map_base + bitmap_len(options.block_count);
        let block_area_base = inode_table_base + options.inode_count * Inode::size_on_disk() as u64;

        SuperBlock {
            magic: MAGIC,
            block_size: options.block_size,
            block_count: options.block_count,
            inode_count: options.inode_count,
            root_inode: 0,
            inode_map_base,
            block_map_base,
            inode_table_base,
            block_area_base,
        }
    }

    pub fn read<R: Region>(storage: &R) -> Result<SuperBlock> {
        let buffer = storage.read_bytes(0, SuperBlock::size_on_disk())?;
        SuperBlock::from_bytes(&buffer)
    }

    pub fn write<R: Region>(&self, storage: &mut R) -> Result<()> {
        storage.write_bytes(&self.to_bytes(), 0)
    }

    pub fn set_root_inode<R: Region>(&mut self, storage: &mut R, root_inode: InodePointer) -> Result<()> {
        self.root_inode = root_inode;
        self.write(storage)
    }

    #[inline]
    pub fn block_offset(&self, index: BlockPointer) -> u64 {
        self.block_area_base + index * self.block_size as u64
    }

    pub fn bitmap_base(&self, kind: RegionKind) -> u64 {
        match kind {
            RegionKind::Inodes => self.inode_map_base,
            RegionKind::Blocks => self.block_map_base,
        }
    }

    pub fn slot_count(&self, kind: RegionKind) -> u64 {
        match kind {
            RegionKind::Inodes => self.inode_count,
            RegionKind::Blocks => self.block_count,
        }
    }

    pub fn required_size(&self) -> u64 {
        self.block_offset(self.block_count)
    }

    fn check_layout(&self) -> Result<()> {
        let expected = SuperBlock::new(&FormatOptions::new(self.block_size, self.block_count, self.inode_count));
        if self.block_size == 0
            || self.inode_map_base != expected.inode_map_base
            || self.block_map_base != expected.block_map_base
            || self.inode_table_base != expected.inode_table_base
            || self.block_area_base != expected.block_area_base
        {
            return Err(Error::Corruption(format!("superblock layout does not add up: {:?}", self)));
        }
        Ok(())
    }
}

fn bitmap_len(slots: u64) -> u64 {
    slots.div_ceil(8)
}

fn u64_at(bytes: &[u8], offset: usize) -> u64 {
    let mut field = [0u8; 8];
    field.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(field)
}

impl KnownSize for SuperBlock {
    fn size_on_disk() -> usize {
        SUPERBLOCK_SIZE
    }
}

impl ByteSerializable for SuperBlock {
    fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(SUPERBLOCK_SIZE);
        buffer.extend_from_slice(&self.magic.to_le_bytes());
        buffer.extend_from_slice(&(self.block_size as u32).to_le_bytes());
        buffer.extend_from_slice(&self.block_count.to_le_bytes());
        buffer.extend_from_slice(&self.inode_count.to_le_bytes());
        buffer.extend_from_slice(&self.root_inode.to_le_bytes());
        buffer.extend_from_slice(&self.inode_map_base.to_le_bytes());
        buffer.extend_from_slice(&self.block_map_base.to_le_bytes());
        buffer.extend_from_slice(&self.inode_table_base.to_le_bytes());
        buffer.extend_from_slice(&self.block_area_base.to_le_bytes());
        buffer
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SUPERBLOCK_SIZE {
            return Err(Error::Corruption(format!("superblock truncated to {} bytes", bytes.len())));
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != MAGIC {
            return Err(Error::Corruption(format!("bad superblock magic {:#010x}", magic)));
        }

        let super_block = SuperBlock {
            magic,
            block_size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize,
            block_count: u64_at(bytes, 8),
            inode_count: u64_at(bytes, 16),
            root_inode: u64_at(bytes, 24),
            inode_map_base: u64_at(bytes, 32),
            block_map_base: u64_at(bytes, 40),
            inode_table_base: u64_at(bytes, 48),
            block_area_base: u64_at(bytes, 56),
        };
        super_block.check_layout()?;
        Ok(super_block)
    }
}
