use std::io::Cursor;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use ndarray::Array3;

/// Minimal little-endian TIFF holding only ImageWidth and ImageLength
pub fn create_test_tiff_buffer() -> Cursor<Vec<u8>> {
    let mut buffer = Vec::new();

    buffer.write_u16::<LittleEndian>(0x4949).unwrap(); // II
    buffer.write_u16::<LittleEndian>(42).unwrap();
    buffer.write_u32::<LittleEndian>(8).unwrap();      // IFD offset

    buffer.write_u16::<LittleEndian>(2).unwrap();      // Entry count

    buffer.write_u16::<LittleEndian>(256).unwrap();    // ImageWidth
    buffer.write_u16::<LittleEndian>(4).unwrap();      // LONG
    buffer.write_u32::<LittleEndian>(1).unwrap();
    buffer.write_u32::<LittleEndian>(800).unwrap();

    buffer.write_u16::<LittleEndian>(257).unwrap();    // ImageLength
    buffer.write_u16::<LittleEndian>(4).unwrap();      // LONG
    buffer.write_u32::<LittleEndian>(1).unwrap();
    buffer.write_u32::<LittleEndian>(600).unwrap();

    buffer.write_u32::<LittleEndian>(0).unwrap();      // No next IFD

    Cursor::new(buffer)
}

/// Minimal little-endian BigTIFF holding only ImageWidth and ImageLength
pub fn create_test_bigtiff_buffer() -> Cursor<Vec<u8>> {
    let mut buffer = Vec::new();

    buffer.write_u16::<LittleEndian>(0x4949).unwrap(); // II
    buffer.write_u16::<LittleEndian>(43).unwrap();
    buffer.write_u16::<LittleEndian>(8).unwrap();      // Offset size
    buffer.write_u16::<LittleEndian>(0).unwrap();      // Reserved
    buffer.write_u64::<LittleEndian>(16).unwrap();     // IFD offset

    buffer.write_u64::<LittleEndian>(2).unwrap();      // Entry count

    buffer.write_u16::<LittleEndian>(256).unwrap();    // ImageWidth
    buffer.write_u16::<LittleEndian>(4).unwrap();      // LONG
    buffer.write_u64::<LittleEndian>(1).unwrap();
    buffer.write_u64::<LittleEndian>(1024).unwrap();

    buffer.write_u16::<LittleEndian>(257).unwrap();    // ImageLength
    buffer.write_u16::<LittleEndian>(4).unwrap();      // LONG
    buffer.write_u64::<LittleEndian>(1).unwrap();
    buffer.write_u64::<LittleEndian>(768).unwrap();

    buffer.write_u64::<LittleEndian>(0).unwrap();      // No next IFD

    Cursor::new(buffer)
}

/// Hand-built big-endian 3x2 single-band uint16 image in one strip
///
/// Pixel (row, col) holds `row * 100 + col`.
pub fn create_big_endian_uint16_buffer() -> Cursor<Vec<u8>> {
    let mut buffer = Vec::new();
    let entries: [(u16, u16, u32, u32); 8] = [
        (256, 3, 1, 3),   // ImageWidth
        (257, 3, 1, 2),   // ImageLength
        (258, 3, 1, 16),  // BitsPerSample
        (259, 3, 1, 1),   // Compression: none
        (262, 3, 1, 1),   // BlackIsZero
        (273, 4, 1, 0),   // StripOffsets, patched below
        (278, 3, 1, 2),   // RowsPerStrip
        (279, 4, 1, 12),  // StripByteCounts
    ];
    let ifd_size = 2 + entries.len() * 12 + 4;
    let data_offset = (8 + ifd_size) as u32;

    buffer.write_u16::<BigEndian>(0x4D4D).unwrap(); // MM
    buffer.write_u16::<BigEndian>(42).unwrap();
    buffer.write_u32::<BigEndian>(8).unwrap();

    buffer.write_u16::<BigEndian>(entries.len() as u16).unwrap();
    for (tag, field_type, count, value) in entries {
        buffer.write_u16::<BigEndian>(tag).unwrap();
        buffer.write_u16::<BigEndian>(field_type).unwrap();
        buffer.write_u32::<BigEndian>(count).unwrap();
        let value = if tag == 273 { data_offset } else { value };
        if field_type == 3 {
            // SHORT values sit left-justified in the value field
            buffer.write_u16::<BigEndian>(value as u16).unwrap();
            buffer.write_u16::<BigEndian>(0).unwrap();
        } else {
            buffer.write_u32::<BigEndian>(value).unwrap();
        }
    }
    buffer.write_u32::<BigEndian>(0).unwrap();

    for row in 0..2u16 {
        for col in 0..3u16 {
            buffer.write_u16::<BigEndian>(row * 100 + col).unwrap();
        }
    }

    Cursor::new(buffer)
}

/// `[rows, cols, bands]` gradient where band `b` at (r, c) is `r * cols + c + 1000 * b`
pub fn gradient(rows: usize, cols: usize, bands: usize) -> Array3<f64> {
    Array3::from_shape_fn((rows, cols, bands), |(r, c, b)| (r * cols + c + 1000 * b) as f64)
}
