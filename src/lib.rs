//! A small block filesystem simulated over one contiguous storage region.
//!
//! The region holds a superblock, an inode bitmap, a block bitmap, a table of
//! fixed-size inodes and the block data area, in that order. Every inode
//! addresses its content through at most eleven direct block pointers.
//!
//! ```no_run
//! use blockfs::driver::memory::MemoryDrive;
//! use blockfs::io::Storage;
//! use blockfs::structure::{format, superblock::FormatOptions};
//! use blockfs::{create_file, read_file, update_file, Directory};
//!
//! # fn main() -> blockfs::Result<()> {
//! let mut storage = Storage::new(MemoryDrive::new(1024 * 1024, 512)?);
//! format(&mut storage, &FormatOptions::default())?;
//!
//! let mut root = Directory::root(&storage)?;
//! let file = create_file(&mut storage, &mut root, "hello")?;
//! update_file(&mut storage, file, b"hello world")?;
//! assert_eq!(read_file(&storage, file)?, b"hello world");
//! # Ok(())
//! # }
//! ```

pub mod consts;
pub mod driver;
pub mod io;
pub mod ops;
pub mod structure;
pub mod util;

pub use ops::{
    create_directory, create_file, read_file, release_blocks, rename_file, update_directory, update_file, Directory,
    Entry,
};
pub use util::error::{Error, Result};
