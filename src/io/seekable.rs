//! Seekable reader trait
//!
//! Raster drivers accept anything that can both read and seek, which lets
//! tests decode in-memory buffers through the same code path as files.

use std::io::{self, Read, Seek, SeekFrom};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send {
    /// Total length of the underlying stream in bytes
    ///
    /// The current position is restored before returning.
    fn byte_len(&mut self) -> io::Result<u64> {
        let position = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(position))?;
        Ok(len)
    }

    /// Reads exactly `len` bytes starting at `offset`
    fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        self.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}

impl<T: Read + Seek + Send> SeekableReader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_ranges_and_length() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        cursor.seek(SeekFrom::Start(2)).unwrap();
        assert_eq!(cursor.byte_len().unwrap(), 5);
        assert_eq!(cursor.stream_position().unwrap(), 2);
        assert_eq!(cursor.read_at(1, 3).unwrap(), vec![2, 3, 4]);
        assert!(cursor.read_at(4, 3).is_err());
    }
}
