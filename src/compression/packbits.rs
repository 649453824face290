//! Handler for PackBits run-length encoded data

use crate::errors::{RasterError, RasterResult};
use super::handler::CompressionHandler;

/// PackBits compression handler (compression code 32773)
pub struct PackBitsHandler;

impl CompressionHandler for PackBitsHandler {
    fn decompress(&self, data: &[u8]) -> RasterResult<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len() * 2);
        let mut pos = 0;

        while pos < data.len() {
            let header = data[pos] as i8;
            pos += 1;

            match header {
                0..=127 => {
                    let count = header as usize + 1;
                    let literal = data.get(pos..pos + count).ok_or_else(|| {
                        RasterError::Corrupt("PackBits literal run past end of data".to_string())
                    })?;
                    out.extend_from_slice(literal);
                    pos += count;
                }
                -127..=-1 => {
                    let count = (1 - header as isize) as usize;
                    let value = *data.get(pos).ok_or_else(|| {
                        RasterError::Corrupt("PackBits repeat run past end of data".to_string())
                    })?;
                    out.resize(out.len() + count, value);
                    pos += 1;
                }
                // -128 is a no-op
                _ => {}
            }
        }

        Ok(out)
    }

    fn compress(&self, data: &[u8]) -> RasterResult<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len() + data.len() / 128 + 1);
        let mut pos = 0;

        while pos < data.len() {
            let mut run = 1;
            while pos + run < data.len() && run < 128 && data[pos + run] == data[pos] {
                run += 1;
            }

            if run >= 2 {
                out.push((1 - run as isize) as i8 as u8);
                out.push(data[pos]);
                pos += run;
                continue;
            }

            let start = pos;
            let mut len = 0;
            while pos < data.len() && len < 128 {
                if pos + 1 < data.len() && data[pos + 1] == data[pos] {
                    break;
                }
                pos += 1;
                len += 1;
            }
            if len == 0 {
                pos += 1;
                len = 1;
            }
            out.push((len - 1) as u8);
            out.extend_from_slice(&data[start..start + len]);
        }

        Ok(out)
    }

    fn name(&self) -> &'static str {
        "PackBits"
    }

    fn code(&self) -> u64 {
        32773
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_sequence() {
        // Sample from the TIFF 6.0 specification, section 9
        let packed = [
            0xFEu8, 0xAA, 0x02, 0x80, 0x00, 0x2A, 0xFD, 0xAA, 0x03, 0x80, 0x00, 0x2A, 0x22, 0xF7, 0xAA,
        ];
        let expected = [
            0xAAu8, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0xAA, 0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0x22, 0xAA,
            0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
        ];
        assert_eq!(PackBitsHandler.decompress(&packed).unwrap(), expected.to_vec());
    }

    #[test]
    fn encoder_output_decodes() {
        let data: Vec<u8> = [vec![7u8; 300], (0..=255u8).collect(), vec![1, 2, 2, 3]].concat();
        let packed = PackBitsHandler.compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(PackBitsHandler.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn truncated_literal_is_corrupt() {
        assert!(PackBitsHandler.decompress(&[0x05, 0x01]).is_err());
    }
}
