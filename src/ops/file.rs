use crate::consts::InodePointer;
use crate::ops::directory::{create_entry, Directory};
use crate::ops::{read_object, update_object};
use crate::structure::bitmap::Allocator;
use crate::structure::inode::InodeType;
use crate::util::error::Result;

/// Replaces the content of the file at `inode`.
pub fn update_file<A: Allocator>(storage: &mut A, inode: InodePointer, content: &[u8]) -> Result<()> {
    update_object(storage, inode, InodeType::File, content)
}

pub fn read_file<A: Allocator>(storage: &A, inode: InodePointer) -> Result<Vec<u8>> {
    read_object(storage, inode, InodeType::File)
}

/// Creates an empty file named `name` inside `directory` and returns its inode.
pub fn create_file<A: Allocator>(storage: &mut A, directory: &mut Directory, name: &str) -> Result<InodePointer> {
    create_entry(storage, directory, name, InodeType::File)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::consts::{NULL_POINTER, ROOT_INODE};
    use crate::driver::memory::MemoryDrive;
    use crate::io::{Region, Storage};
    use crate::ops::tests::{block_used, formatted, inode_of, BLOCK_SIZE};
    use crate::ops::update_directory;
    use crate::structure::bitmap::RegionKind;
    use crate::structure::superblock::SuperBlock;
    use crate::util::error::Error;

    fn with_file() -> (Storage<MemoryDrive>, InodePointer) {
        let mut storage = formatted();
        let mut root = Directory::root(&storage).unwrap();
        let file = create_file(&mut storage, &mut root, "notes").unwrap();
        (storage, file)
    }

    fn content(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 251) as u8).collect()
    }

    #[test]
    fn end_to_end_130_bytes() {
        let (mut storage, file) = with_file();
        let data = content(130);

        update_file(&mut storage, file, &data).unwrap();

        let inode = inode_of(&storage, file);
        assert_eq!(inode.size(), 130);
        assert!(inode.pointers()[..3].iter().all(|pointer| *pointer != NULL_POINTER));
        assert!(inode.pointers()[3..].iter().all(|pointer| *pointer == NULL_POINTER));
        assert_eq!(read_file(&storage, file).unwrap(), data);
    }

    #[test]
    fn reconstructs_every_length_up_to_capacity() {
        let (mut storage, file) = with_file();
        for len in (0..11 * BLOCK_SIZE).step_by(13).chain([BLOCK_SIZE, 11 * BLOCK_SIZE - 1]) {
            let data = content(len);
            update_file(&mut storage, file, &data).unwrap();

            let inode = inode_of(&storage, file);
            assert_eq!(inode.used_pointers().len(), len.div_ceil(BLOCK_SIZE).max(1), "length {}", len);
            assert_eq!(read_file(&storage, file).unwrap(), data, "length {}", len);
            for block in inode.used_pointers() {
                assert!(block_used(&storage, block));
            }
        }
    }

    #[test]
    fn oversized_content_changes_nothing() {
        let (mut storage, file) = with_file();
        update_file(&mut storage, file, &content(100)).unwrap();
        let before = inode_of(&storage, file);

        let result = update_file(&mut storage, file, &content(11 * BLOCK_SIZE + 1));
        assert!(matches!(result, Err(Error::CapacityExceeded { required: 12, limit: 11 })));
        assert_eq!(inode_of(&storage, file), before);
        for block in before.used_pointers() {
            assert!(block_used(&storage, block));
        }
        assert_eq!(read_file(&storage, file).unwrap(), content(100));
    }

    #[test]
    fn growth_adds_distinct_blocks_after_retained_ones() {
        let (mut storage, file) = with_file();
        update_file(&mut storage, file, &content(2 * BLOCK_SIZE)).unwrap();
        let retained = inode_of(&storage, file).used_pointers();

        update_file(&mut storage, file, &content(5 * BLOCK_SIZE)).unwrap();
        let grown = inode_of(&storage, file).used_pointers();

        assert_eq!(grown.len(), 5);
        assert_eq!(&grown[..2], retained.as_slice());
        let distinct: HashSet<_> = grown.iter().collect();
        assert_eq!(distinct.len(), 5);
    }

    #[test]
    fn shrink_releases_trailing_blocks() {
        let (mut storage, file) = with_file();
        update_file(&mut storage, file, &content(4 * BLOCK_SIZE)).unwrap();
        let before = inode_of(&storage, file).used_pointers();

        update_file(&mut storage, file, &content(BLOCK_SIZE + 1)).unwrap();
        let after = inode_of(&storage, file).used_pointers();

        assert_eq!(after, before[..2].to_vec());
        assert!(!block_used(&storage, before[2]));
        assert!(!block_used(&storage, before[3]));

        // the released blocks are the lowest free ones, so the next allocation reuses them
        let mut root = Directory::root(&storage).unwrap();
        let other = create_file(&mut storage, &mut root, "other").unwrap();
        update_file(&mut storage, other, &content(2 * BLOCK_SIZE)).unwrap();
        let reused: HashSet<_> = inode_of(&storage, other).used_pointers().into_iter().collect();
        assert!(reused.contains(&before[2]) || reused.contains(&before[3]));
    }

    #[test]
    fn files_never_share_blocks() {
        let mut storage = formatted();
        let mut root = Directory::root(&storage).unwrap();
        let first = create_file(&mut storage, &mut root, "first").unwrap();
        let second = create_file(&mut storage, &mut root, "second").unwrap();

        for blocks in 1..=5 {
            update_file(&mut storage, first, &content(blocks * BLOCK_SIZE)).unwrap();
            update_file(&mut storage, second, &content(blocks * BLOCK_SIZE - 3)).unwrap();
        }
        update_file(&mut storage, first, &content(10)).unwrap();
        update_file(&mut storage, second, &content(9 * BLOCK_SIZE)).unwrap();

        let first_blocks: HashSet<_> = inode_of(&storage, first).used_pointers().into_iter().collect();
        let second_blocks: HashSet<_> = inode_of(&storage, second).used_pointers().into_iter().collect();
        let root_blocks: HashSet<_> = inode_of(&storage, ROOT_INODE).used_pointers().into_iter().collect();
        assert!(first_blocks.is_disjoint(&second_blocks));
        assert!(first_blocks.is_disjoint(&root_blocks));
        assert!(second_blocks.is_disjoint(&root_blocks));
        assert_eq!(read_file(&storage, first).unwrap(), content(10));
        assert_eq!(read_file(&storage, second).unwrap(), content(9 * BLOCK_SIZE));
    }

    #[test]
    fn identical_updates_are_idempotent() {
        let (mut storage, file) = with_file();
        let super_block = SuperBlock::read(&storage).unwrap();
        let data = content(200);

        update_file(&mut storage, file, &data).unwrap();
        let first = inode_of(&storage, file);
        let first_blocks: Vec<_> = first
            .used_pointers()
            .iter()
            .map(|block| storage.read_bytes(super_block.block_offset(*block), BLOCK_SIZE).unwrap())
            .collect();

        update_file(&mut storage, file, &data).unwrap();
        let second = inode_of(&storage, file);
        let second_blocks: Vec<_> = second
            .used_pointers()
            .iter()
            .map(|block| storage.read_bytes(super_block.block_offset(*block), BLOCK_SIZE).unwrap())
            .collect();

        assert_eq!(first, second);
        assert_eq!(first_blocks, second_blocks);
    }

    #[test]
    fn rejects_directory_and_mutates_nothing() {
        let mut storage = formatted();
        let before = storage.device().as_bytes().to_vec();

        let result = update_file(&mut storage, ROOT_INODE, b"not a file");
        assert!(matches!(
            result,
            Err(Error::TypeMismatch { expected: InodeType::File, found: InodeType::Directory })
        ));
        assert_eq!(storage.device().as_bytes(), before.as_slice());
    }

    #[test]
    fn rejects_null_and_missing_inodes() {
        let mut storage = formatted();
        assert!(matches!(update_file(&mut storage, 0, b"x"), Err(Error::InvalidArgument(_))));
        assert!(matches!(update_file(&mut storage, 9, b"x"), Err(Error::NotFound(_))));
        assert!(matches!(update_file(&mut storage, 1000, b"x"), Err(Error::NotFound(_))));
        assert!(matches!(read_file(&storage, 9), Err(Error::NotFound(_))));
    }

    #[test]
    fn allocation_failure_surfaces_as_content_update() {
        let (mut storage, file) = with_file();
        let super_block = SuperBlock::read(&storage).unwrap();
        for block in 0..super_block.block_count {
            storage.set_bitmap_flag(&super_block, true, block, RegionKind::Blocks).unwrap();
        }
        let before = inode_of(&storage, file);

        let result = update_file(&mut storage, file, &content(3 * BLOCK_SIZE));
        match result {
            Err(Error::ContentUpdate(cause)) => {
                assert!(matches!(*cause, Error::AllocationFailure(_)));
            }
            other => panic!("unexpected result {:?}", other),
        }
        // the inode keeps its old record while its block has been released
        assert_eq!(inode_of(&storage, file), before);
        assert!(!block_used(&storage, before.used_pointers()[0]));
    }

    #[test]
    fn update_directory_rejects_file_and_mutates_nothing() {
        let (mut storage, file) = with_file();
        let before = storage.device().as_bytes().to_vec();

        let result = update_directory(&mut storage, file, &[]);
        assert!(matches!(
            result,
            Err(Error::TypeMismatch { expected: InodeType::Directory, found: InodeType::File })
        ));
        assert_eq!(storage.device().as_bytes(), before.as_slice());
    }
}
