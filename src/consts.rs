pub const SUPERBLOCK_SIZE: usize = 64;
pub const DIRECT_POINTERS: usize = 12;
/// Content may span at most this many blocks, so the last pointer slot is never filled.
pub const MAX_CONTENT_BLOCKS: usize = DIRECT_POINTERS - 1;
pub const FILE_NAME_LENGTH: usize = 255;
pub const RESERVED_NAME_CHARS: [char; 3] = ['\\', ':', '-'];

pub type BlockPointer = u64;
pub type InodePointer = u64;
pub type DirectPointers = [BlockPointer; DIRECT_POINTERS];

pub const NULL_POINTER: BlockPointer = 0;
pub const NULL_INODE: InodePointer = 0;
pub const ROOT_INODE: InodePointer = 1;
