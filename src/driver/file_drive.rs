use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::driver::DeviceDriver;
use crate::util::error::{Error, Result};

/// A device backed by an image file on the host.
pub struct FileDrive {
    file: File,
    sector_count: u64,
    sector_size: usize,
}

impl FileDrive {
    /// Creates a new zero-filled image; fails if `path` already exists.
    pub fn create<P: AsRef<Path>>(path: P, bytes: u64, sector_size: usize) -> Result<FileDrive> {
        Self::check_geometry(bytes, sector_size)?;
        let file = OpenOptions::new().read(true).write(true).create_new(true).open(path)?;
        file.set_len(bytes)?;
        Ok(FileDrive { file, sector_count: bytes / sector_size as u64, sector_size })
    }

    pub fn open<P: AsRef<Path>>(path: P, sector_size: usize) -> Result<FileDrive> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let bytes = file.metadata()?.len();
        Self::check_geometry(bytes, sector_size)?;
        Ok(FileDrive { file, sector_count: bytes / sector_size as u64, sector_size })
    }

    fn check_geometry(bytes: u64, sector_size: usize) -> Result<()> {
        if sector_size == 0 || bytes % sector_size as u64 != 0 {
            return Err(Error::InvalidArgument(format!(
                "image of {} bytes cannot be split into sectors of {} bytes",
                bytes, sector_size
            )));
        }
        Ok(())
    }

    fn check_index(&self, index: u64) -> Result<()> {
        if index >= self.sector_count {
            return Err(Error::OutOfBounds {
                offset: index * self.sector_size as u64,
                len: self.sector_size as u64,
                size: self.get_size(),
            });
        }
        Ok(())
    }
}

impl DeviceDriver for FileDrive {
    fn get_sector_count(&self) -> u64 {
        self.sector_count
    }

    fn get_sector_size(&self) -> usize {
        self.sector_size
    }

    fn read_sector(&self, index: u64) -> Result<Vec<u8>> {
        self.check_index(index)?;
        let mut buffer = vec![0; self.sector_size];
        self.file.read_exact_at(&mut buffer, index * self.sector_size as u64)?;
        Ok(buffer)
    }

    fn write_sector(&mut self, index: u64, data: &[u8]) -> Result<()> {
        if data.len() != self.sector_size {
            return Err(Error::InvalidArgument(format!(
                "sector size mismatch - expected {}, got {}",
                self.sector_size,
                data.len()
            )));
        }
        self.check_index(index)?;
        self.file.write_all_at(data, index * self.sector_size as u64)?;
        Ok(())
    }
}
