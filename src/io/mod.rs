use crate::driver::DeviceDriver;
use crate::util::error::{Error, Result};
use raw::{raw_read, raw_write};

mod raw;

/// A flat, byte-addressed storage region.
pub trait Region {
    fn size(&self) -> u64;
    fn read_bytes(&self, offset: u64, len: usize) -> Result<Vec<u8>>;
    fn write_bytes(&mut self, payload: &[u8], offset: u64) -> Result<()>;

    fn zero_bytes(&mut self, offset: u64, len: usize) -> Result<()> {
        self.write_bytes(&vec![0; len], offset)
    }
}

/// The region backing a filesystem, laid over any sector device.
pub struct Storage<A: DeviceDriver> {
    device: A,
    size: u64,
}

impl<A: DeviceDriver> Storage<A> {
    pub fn new(device: A) -> Storage<A> {
        let size = device.get_size();
        Storage { device, size }
    }

    pub fn device(&self) -> &A {
        &self.device
    }

    pub fn into_device(self) -> A {
        self.device
    }

    fn check_range(&self, offset: u64, len: usize) -> Result<()> {
        let in_range = offset.checked_add(len as u64).is_some_and(|end| end <= self.size);
        if !in_range {
            return Err(Error::OutOfBounds { offset, len: len as u64, size: self.size });
        }
        Ok(())
    }
}

impl<A: DeviceDriver> Region for Storage<A> {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_bytes(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.check_range(offset, len)?;
        raw_read(&self.device, offset, len)
    }

    fn write_bytes(&mut self, payload: &[u8], offset: u64) -> Result<()> {
        self.check_range(offset, payload.len())?;
        raw_write(&mut self.device, offset, payload)
    }
}
