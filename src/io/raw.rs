use log::trace;

use crate::driver::DeviceDriver;
use crate::util::error::Result;

/// Writes `data` at a byte offset, read-modify-writing partially covered sectors.
pub(crate) fn raw_write<A: DeviceDriver>(drive: &mut A, offset: u64, data: &[u8]) -> Result<()> {
    let sector_size = drive.get_sector_size();
    let mut written = 0;

    while written < data.len() {
        let position = offset + written as u64;
        let sector = position / sector_size as u64;
        let within = (position % sector_size as u64) as usize;
        let take = (sector_size - within).min(data.len() - written);
        let chunk = &data[written..written + take];

        trace!("Writing sector {} - Offset {} :: Length {}", sector, within, take);
        if take == sector_size {
            drive.write_sector(sector, chunk)?;
        } else {
            let mut buffer = drive.read_sector(sector)?;
            buffer[within..within + take].copy_from_slice(chunk);
            drive.write_sector(sector, &buffer)?;
        }
        written += take;
    }

    Ok(())
}

pub(crate) fn raw_read<A: DeviceDriver>(drive: &A, offset: u64, len: usize) -> Result<Vec<u8>> {
    let sector_size = drive.get_sector_size();
    let mut buffer = Vec::with_capacity(len);

    while buffer.len() < len {
        let position = offset + buffer.len() as u64;
        let sector = position / sector_size as u64;
        let within = (position % sector_size as u64) as usize;
        let take = (sector_size - within).min(len - buffer.len());

        trace!("Reading sector {} - Offset {} :: Length {}", sector, within, take);
        let data = drive.read_sector(sector)?;
        buffer.extend_from_slice(&data[within..within + take]);
    }

    Ok(buffer)
}
