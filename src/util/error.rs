use std::os::raw::c_int;

use thiserror::Error;

use crate::structure::bitmap::RegionKind;
use crate::structure::inode::InodeType;

pub type ErrorNum = c_int;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Exists(String),

    #[error("expected a {expected}, found a {found}")]
    TypeMismatch { expected: InodeType, found: InodeType },

    #[error("content needs {required} blocks, at most {limit} can be addressed")]
    CapacityExceeded { required: usize, limit: usize },

    #[error("no free slot left in the {0} bitmap")]
    AllocationFailure(RegionKind),

    #[error("corrupt filesystem: {0}")]
    Corruption(String),

    #[error("access of {len} bytes at offset {offset} is outside a region of {size} bytes")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised once an update has already released the object's blocks.
    #[error("could not update content: {0}")]
    ContentUpdate(#[source] Box<Error>),
}

impl Error {
    pub fn errno(&self) -> ErrorNum {
        match self {
            Error::InvalidArgument(_) => libc::EINVAL,
            Error::NotFound(_) => libc::ENOENT,
            Error::Exists(_) => libc::EEXIST,
            Error::TypeMismatch { found: InodeType::Directory, .. } => libc::EISDIR,
            Error::TypeMismatch { found: InodeType::File, .. } => libc::ENOTDIR,
            Error::CapacityExceeded { .. } => libc::EFBIG,
            Error::AllocationFailure(_) => libc::ENOSPC,
            Error::Corruption(_) => libc::EIO,
            Error::OutOfBounds { .. } => libc::EIO,
            Error::Io(_) => libc::EIO,
            Error::ContentUpdate(_) => libc::EIO,
        }
    }
}
