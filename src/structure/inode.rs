use std::fmt;
use std::mem::size_of;

use crate::consts::{BlockPointer, DirectPointers, InodePointer, DIRECT_POINTERS, NULL_POINTER};
use crate::structure::superblock::SuperBlock;
use crate::util::error::{Error, Result};
use crate::util::serializable::ByteSerializable;

const TYPE_OFFSET: usize = 0;
const SIZE_OFFSET: usize = TYPE_OFFSET + size_of::<u8>();
const POINTERS_OFFSET: usize = SIZE_OFFSET + size_of::<u64>();
const POINTER_WIDTH: usize = size_of::<BlockPointer>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    Directory,
    File,
}

impl fmt::Display for InodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InodeType::Directory => write!(f, "directory"),
            InodeType::File => write!(f, "file"),
        }
    }
}

impl ByteSerializable for InodeType {
    fn to_bytes(&self) -> Vec<u8> {
        match self {
            InodeType::Directory => vec![0],
            InodeType::File => vec![1],
        }
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.first() {
            Some(0) => Ok(InodeType::Directory),
            Some(1) => Ok(InodeType::File),
            Some(tag) => Err(Error::Corruption(format!("invalid inode type tag {}", tag))),
            None => Err(Error::Corruption("missing inode type tag".to_string())),
        }
    }
}

/// Number of blocks needed to hold `len` bytes. Even empty content owns one block.
pub fn blocks_for(len: u64, block_size: usize) -> usize {
    (len.div_ceil(block_size as u64) as usize).max(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub(crate) id: InodePointer,
    pub(crate) inode_type: InodeType,
    pub(crate) size: u64,
    pub(crate) pointers: DirectPointers,
}

impl Inode {
    pub fn new(id: InodePointer, inode_type: InodeType) -> Inode {
        Inode { id, inode_type, size: 0, pointers: [NULL_POINTER; DIRECT_POINTERS] }
    }

    pub fn id(&self) -> InodePointer {
        self.id
    }

    pub fn inode_type(&self) -> InodeType {
        self.inode_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn pointers(&self) -> &DirectPointers {
        &self.pointers
    }

    /// Non-sentinel pointers in content order.
    pub fn used_pointers(&self) -> Vec<BlockPointer> {
        self.pointers.iter().copied().filter(|pointer| *pointer != NULL_POINTER).collect()
    }

    /// Resets every slot to the sentinel, then fills the leading slots from `blocks`.
    pub fn set_pointers(&mut self, blocks: &[BlockPointer]) -> Result<()> {
        if blocks.len() > DIRECT_POINTERS {
            return Err(Error::CapacityExceeded { required: blocks.len(), limit: DIRECT_POINTERS });
        }
        self.pointers = [NULL_POINTER; DIRECT_POINTERS];
        self.pointers[..blocks.len()].copy_from_slice(blocks);
        Ok(())
    }

    /// Verifies that the pointer array matches the recorded size and stays inside the block area.
    pub fn check_consistency(&self, super_block: &SuperBlock) -> Result<()> {
        let used = self.used_pointers();
        let expected = blocks_for(self.size, super_block.block_size);
        if used.len() != expected {
            return Err(Error::Corruption(format!(
                "inode {} holds {} block pointers for {} bytes, expected {}",
                self.id,
                used.len(),
                self.size,
                expected
            )));
        }
        if let Some(pointer) = used.iter().find(|pointer| **pointer >= super_block.block_count) {
            return Err(Error::Corruption(format!(
                "inode {} points at block {} beyond the {} available",
                self.id, pointer, super_block.block_count
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn size_on_disk() -> usize {
        POINTERS_OFFSET + DIRECT_POINTERS * POINTER_WIDTH
    }

    /// Encodes the record: type tag, size, then all pointer slots in index order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; Inode::size_on_disk()];
        bytes[TYPE_OFFSET..SIZE_OFFSET].copy_from_slice(&self.inode_type.to_bytes());
        bytes[SIZE_OFFSET..POINTERS_OFFSET].copy_from_slice(&self.size.to_le_bytes());
        for (slot, pointer) in self.pointers.iter().enumerate() {
            let offset = POINTERS_OFFSET + slot * POINTER_WIDTH;
            bytes[offset..offset + POINTER_WIDTH].copy_from_slice(&pointer.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(id: InodePointer, bytes: &[u8]) -> Result<Inode> {
        if bytes.len() < Inode::size_on_disk() {
            return Err(Error::Corruption(format!(
                "inode {} record truncated to {} bytes",
                id,
                bytes.len()
            )));
        }

        let inode_type = InodeType::from_bytes(&bytes[TYPE_OFFSET..SIZE_OFFSET])?;
        let mut size = [0u8; 8];
        size.copy_from_slice(&bytes[SIZE_OFFSET..POINTERS_OFFSET]);

        let mut pointers = [NULL_POINTER; DIRECT_POINTERS];
        for (slot, pointer) in pointers.iter_mut().enumerate() {
            let offset = POINTERS_OFFSET + slot * POINTER_WIDTH;
            let mut field = [0u8; POINTER_WIDTH];
            field.copy_from_slice(&bytes[offset..offset + POINTER_WIDTH]);
            *pointer = BlockPointer::from_le_bytes(field);
        }

        Ok(Inode { id, inode_type, size: u64::from_le_bytes(size), pointers })
    }
}
