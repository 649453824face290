//! NumPy `.npy` export of chips

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::errors::RasterResult;
use crate::raster::chip::Chip;
use crate::raster::dtype::DataType;

fn descr(dtype: DataType) -> &'static str {
    match dtype {
        DataType::UInt8 => "|u1",
        DataType::Int8 => "|i1",
        DataType::UInt16 => "<u2",
        DataType::Int16 => "<i2",
        DataType::UInt32 => "<u4",
        DataType::Int32 => "<i4",
        DataType::Float32 => "<f4",
        DataType::Float64 => "<f8",
    }
}

/// Version 1.0 header, padded so the data starts on a 64 byte boundary
fn header(chip: &Chip) -> Vec<u8> {
    let (rows, cols, channels) = chip.shape();
    let dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': ({}, {}, {}), }}",
        descr(chip.dtype),
        rows,
        cols,
        channels
    );
    let unpadded = 10 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let text = format!("{}{}\n", dict, " ".repeat(padding));

    let mut out = Vec::with_capacity(10 + text.len());
    out.extend_from_slice(b"\x93NUMPY");
    out.extend_from_slice(&[0x01, 0x00]);
    out.extend_from_slice(&(text.len() as u16).to_le_bytes());
    out.extend_from_slice(text.as_bytes());
    out
}

/// Serializes a chip in C order with its own element type
pub fn encode_npy(chip: &Chip) -> RasterResult<Vec<u8>> {
    let mut out = header(chip);
    out.reserve(chip.data.len() * chip.dtype.size_in_bytes());
    for &v in chip.data.iter() {
        let v = chip.dtype.cast(v);
        match chip.dtype {
            DataType::UInt8 => out.write_u8(v as u8)?,
            DataType::Int8 => out.write_i8(v as i8)?,
            DataType::UInt16 => out.write_u16::<LittleEndian>(v as u16)?,
            DataType::Int16 => out.write_i16::<LittleEndian>(v as i16)?,
            DataType::UInt32 => out.write_u32::<LittleEndian>(v as u32)?,
            DataType::Int32 => out.write_i32::<LittleEndian>(v as i32)?,
            DataType::Float32 => out.write_f32::<LittleEndian>(v as f32)?,
            DataType::Float64 => out.write_f64::<LittleEndian>(v)?,
        }
    }
    Ok(out)
}

pub fn write_npy(path: &Path, chip: &Chip) -> RasterResult<()> {
    let bytes = encode_npy(chip)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn header_is_aligned_and_data_follows() {
        let data = Array3::from_shape_vec((1, 2, 2), vec![1.0, 2.0, 3.0, 65535.0]).unwrap();
        let bytes = encode_npy(&Chip::new(data, DataType::UInt16)).unwrap();

        assert_eq!(&bytes[..8], b"\x93NUMPY\x01\x00");
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % 64, 0);
        let text = std::str::from_utf8(&bytes[10..10 + header_len]).unwrap();
        assert!(text.contains("'descr': '<u2'"));
        assert!(text.contains("'shape': (1, 2, 2)"));
        assert!(text.ends_with('\n'));
        assert_eq!(&bytes[10 + header_len..], &[1, 0, 2, 0, 3, 0, 255, 255]);
    }
}
