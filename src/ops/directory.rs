use std::mem::size_of;

use log::{debug, warn};

use crate::consts::{InodePointer, FILE_NAME_LENGTH, NULL_INODE, RESERVED_NAME_CHARS};
use crate::ops::{read_object, release_blocks, update_object};
use crate::structure::bitmap::{Allocator, RegionKind};
use crate::structure::inode::InodeType;
use crate::structure::inode_table::InodeTable;
use crate::structure::superblock::SuperBlock;
use crate::util::error::{Error, Result};

const ENTRY_HEADER: usize = size_of::<InodePointer>() + size_of::<u8>();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub inode: InodePointer,
    pub name: String,
}

impl Entry {
    pub fn new(inode: InodePointer, name: &str) -> Entry {
        Entry { inode, name: name.to_string() }
    }
}

pub type EntryList = Vec<Entry>;

/// Encodes each entry as its inode (u64 LE), the name length (u8) and the name bytes.
pub fn encode_entries(entries: &[Entry]) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for entry in entries {
        let name = entry.name.as_bytes();
        if name.len() > FILE_NAME_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "name of {} bytes exceeds {}",
                name.len(),
                FILE_NAME_LENGTH
            )));
        }
        bytes.extend_from_slice(&entry.inode.to_le_bytes());
        bytes.push(name.len() as u8);
        bytes.extend_from_slice(name);
    }
    Ok(bytes)
}

pub fn decode_entries(bytes: &[u8]) -> Result<EntryList> {
    let mut entries = EntryList::new();
    let mut data = bytes;

    while !data.is_empty() {
        if data.len() < ENTRY_HEADER {
            return Err(Error::Corruption(format!("directory entry header truncated to {} bytes", data.len())));
        }
        let (header, remainder) = data.split_at(ENTRY_HEADER);
        let name_length = header[ENTRY_HEADER - 1] as usize;
        if remainder.len() < name_length {
            return Err(Error::Corruption(format!(
                "directory entry name needs {} bytes, {} left",
                name_length,
                remainder.len()
            )));
        }
        let (name_bytes, remainder) = remainder.split_at(name_length);

        let mut inode = [0u8; size_of::<InodePointer>()];
        inode.copy_from_slice(&header[..size_of::<InodePointer>()]);
        let name = String::from_utf8(name_bytes.to_vec())
            .map_err(|_| Error::Corruption("directory entry name is not UTF-8".to_string()))?;
        entries.push(Entry { inode: InodePointer::from_le_bytes(inode), name });

        data = remainder;
    }
    Ok(entries)
}

fn check_reserved_chars(name: &str) -> Result<()> {
    if name.contains(&RESERVED_NAME_CHARS[..]) {
        return Err(Error::InvalidArgument(format!(
            "name cannot contain any of {:?}",
            RESERVED_NAME_CHARS
        )));
    }
    Ok(())
}

/// A directory's entry list held in memory, as last read from or written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub inode: InodePointer,
    pub entries: EntryList,
}

impl Directory {
    pub fn open<A: Allocator>(storage: &A, inode: InodePointer) -> Result<Directory> {
        let data = read_object(storage, inode, InodeType::Directory)?;
        Ok(Directory { inode, entries: decode_entries(&data)? })
    }

    pub fn root<A: Allocator>(storage: &A) -> Result<Directory> {
        let super_block = SuperBlock::read(storage)?;
        Directory::open(storage, super_block.root_inode)
    }

    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

/// Replaces the entry list of the directory at `inode`.
pub fn update_directory<A: Allocator>(storage: &mut A, inode: InodePointer, entries: &[Entry]) -> Result<()> {
    if inode == NULL_INODE {
        return Err(Error::InvalidArgument("inode cannot be 0".to_string()));
    }
    let content = encode_entries(entries)?;
    update_object(storage, inode, InodeType::Directory, &content)
}

/// Renames the entry of `directory` that refers to `inode` and persists the list.
///
/// On failure the in-memory entry keeps its previous name.
pub fn rename_file<A: Allocator>(
    storage: &mut A,
    directory: &mut Directory,
    inode: InodePointer,
    new_name: &str,
) -> Result<()> {
    if inode == NULL_INODE {
        return Err(Error::InvalidArgument("inode cannot be 0".to_string()));
    }
    check_reserved_chars(new_name)?;

    let position = directory
        .entries
        .iter()
        .position(|entry| entry.inode == inode)
        .ok_or_else(|| Error::NotFound(format!("file with inode {}", inode)))?;

    let previous = std::mem::replace(&mut directory.entries[position].name, new_name.to_string());
    if let Err(err) = update_directory(storage, directory.inode, &directory.entries) {
        directory.entries[position].name = previous;
        return Err(err);
    }

    debug!("renamed inode {} to {:?} in directory {}", inode, new_name, directory.inode);
    Ok(())
}

/// Creates an empty directory named `name` inside `directory` and returns its inode.
pub fn create_directory<A: Allocator>(
    storage: &mut A,
    directory: &mut Directory,
    name: &str,
) -> Result<InodePointer> {
    create_entry(storage, directory, name, InodeType::Directory)
}

pub(crate) fn create_entry<A: Allocator>(
    storage: &mut A,
    directory: &mut Directory,
    name: &str,
    inode_type: InodeType,
) -> Result<InodePointer> {
    check_reserved_chars(name)?;
    if name.is_empty() || name.len() > FILE_NAME_LENGTH {
        return Err(Error::InvalidArgument(format!("name must be 1 to {} bytes long", FILE_NAME_LENGTH)));
    }
    if directory.find(name).is_some() {
        return Err(Error::Exists(format!("{:?} in directory {}", name, directory.inode)));
    }

    let super_block = SuperBlock::read(storage)?;
    let table = InodeTable::new(&super_block);
    let inode = table.allocate(storage, &super_block, inode_type)?;

    directory.entries.push(Entry::new(inode.id(), name));
    if let Err(err) = update_directory(storage, directory.inode, &directory.entries) {
        directory.entries.pop();
        let rollback = release_blocks(storage, &super_block, &inode)
            .and_then(|_| storage.set_bitmap_flag(&super_block, false, inode.id(), RegionKind::Inodes))
            .and_then(|_| table.clear_inode(storage, inode.id()));
        if let Err(rollback_err) = rollback {
            warn!("{} inode {} leaked after failed create: {}", inode_type, inode.id(), rollback_err);
        }
        return Err(err);
    }

    debug!("created {} {:?} as inode {} in directory {}", inode_type, name, inode.id(), directory.inode);
    Ok(inode.id())
}
