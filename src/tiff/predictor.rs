//! Reversal of the TIFF horizontal differencing predictor

use crate::io::byte_order::ByteOrder;

/// Integer sample that can be accumulated in place
trait PredictorSample: Copy {
    const SIZE: usize;
    fn load(bytes: &[u8], order: ByteOrder) -> Self;
    fn store(self, bytes: &mut [u8], order: ByteOrder);
    fn wrapping_add(self, other: Self) -> Self;
}

macro_rules! predictor_sample {
    ($t:ty) => {
        impl PredictorSample for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            fn load(bytes: &[u8], order: ByteOrder) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(&bytes[..Self::SIZE]);
                match order {
                    ByteOrder::LittleEndian => <$t>::from_le_bytes(buf),
                    ByteOrder::BigEndian => <$t>::from_be_bytes(buf),
                }
            }

            fn store(self, bytes: &mut [u8], order: ByteOrder) {
                let buf = match order {
                    ByteOrder::LittleEndian => self.to_le_bytes(),
                    ByteOrder::BigEndian => self.to_be_bytes(),
                };
                bytes[..Self::SIZE].copy_from_slice(&buf);
            }

            fn wrapping_add(self, other: Self) -> Self {
                <$t>::wrapping_add(self, other)
            }
        }
    };
}

predictor_sample!(u8);
predictor_sample!(u16);
predictor_sample!(u32);
predictor_sample!(u64);

fn accumulate<T: PredictorSample>(row: &mut [u8], stride: usize, order: ByteOrder) {
    let count = row.len() / T::SIZE;
    for i in stride..count {
        let prev = T::load(&row[(i - stride) * T::SIZE..], order);
        let cur = T::load(&row[i * T::SIZE..], order);
        cur.wrapping_add(prev).store(&mut row[i * T::SIZE..], order);
    }
}

/// Undoes horizontal differencing on a decoded chunk, row by row
///
/// # Arguments
/// * `data` - Decompressed chunk bytes
/// * `row_bytes` - Bytes per chunk row
/// * `samples_per_pixel` - Interleaved samples per pixel (1 for planar data)
/// * `bytes_per_sample` - Sample width in bytes
/// * `order` - Byte order of the samples
pub fn undo_horizontal_differencing(
    data: &mut [u8],
    row_bytes: usize,
    samples_per_pixel: usize,
    bytes_per_sample: usize,
    order: ByteOrder,
) {
    if row_bytes == 0 {
        return;
    }
    for row in data.chunks_mut(row_bytes) {
        match bytes_per_sample {
            1 => accumulate::<u8>(row, samples_per_pixel, order),
            2 => accumulate::<u16>(row, samples_per_pixel, order),
            4 => accumulate::<u32>(row, samples_per_pixel, order),
            8 => accumulate::<u64>(row, samples_per_pixel, order),
            _ => {}
        }
    }
}

/// Applies horizontal differencing, the inverse of [`undo_horizontal_differencing`]
pub fn apply_horizontal_differencing(
    data: &mut [u8],
    row_bytes: usize,
    samples_per_pixel: usize,
    bytes_per_sample: usize,
    order: ByteOrder,
) {
    if row_bytes == 0 {
        return;
    }
    for row in data.chunks_mut(row_bytes) {
        let count = row.len() / bytes_per_sample;
        for i in (samples_per_pixel..count).rev() {
            let (lo, hi) = row.split_at_mut(i * bytes_per_sample);
            let prev = &lo[(i - samples_per_pixel) * bytes_per_sample..];
            match bytes_per_sample {
                1 => hi[0] = hi[0].wrapping_sub(prev[0]),
                2 => u16::load(hi, order).wrapping_sub(u16::load(prev, order)).store(hi, order),
                4 => u32::load(hi, order).wrapping_sub(u32::load(prev, order)).store(hi, order),
                8 => u64::load(hi, order).wrapping_sub(u64::load(prev, order)).store(hi, order),
                _ => {}
            }
        }
    }
}
