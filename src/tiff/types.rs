//! Core TIFF data structures

use std::fmt;

use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::{new_subfile_type, photometric, tags};
use crate::tiff::ifd::IFD;

/// A parsed TIFF file: its byte order, flavour and IFD chain
#[derive(Debug, Clone)]
pub struct TIFF {
    /// Image File Directories in chain order
    pub ifds: Vec<IFD>,
    /// Whether this is a BigTIFF file
    pub is_big_tiff: bool,
    /// Byte order of the file
    pub byte_order: ByteOrder,
}

impl TIFF {
    pub fn new(is_big_tiff: bool, byte_order: ByteOrder) -> Self {
        TIFF {
            ifds: Vec::new(),
            is_big_tiff,
            byte_order,
        }
    }

    /// The full-resolution image: the first IFD
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    pub fn ifd_count(&self) -> usize {
        self.ifds.len()
    }

    /// Reduced resolution IFDs that are not masks
    pub fn overviews(&self) -> Vec<&IFD> {
        self.ifds
            .iter()
            .skip(1)
            .filter(|ifd| {
                let subfile = ifd.subfile_type();
                subfile & new_subfile_type::REDUCED_RESOLUTION != 0
                    && subfile & new_subfile_type::TRANSPARENCY_MASK == 0
            })
            .collect()
    }

    /// Full-resolution internal transparency mask of the main image, if any
    pub fn mask_ifd(&self) -> Option<&IFD> {
        let (width, height) = self.main_ifd()?.get_dimensions()?;
        self.ifds.iter().skip(1).find(|ifd| {
            let subfile = ifd.subfile_type();
            subfile & new_subfile_type::TRANSPARENCY_MASK != 0
                && subfile & new_subfile_type::REDUCED_RESOLUTION == 0
                && ifd.get_tag_value(tags::PHOTOMETRIC_INTERPRETATION)
                    == Some(photometric::TRANSPARENCY_MASK as u64)
                && ifd.get_dimensions() == Some((width, height))
        })
    }
}

impl fmt::Display for TIFF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TIFF File:")?;
        writeln!(f, "  Format: {}", if self.is_big_tiff { "BigTIFF" } else { "TIFF" })?;
        writeln!(f, "  Byte order: {}", self.byte_order.name())?;
        writeln!(f, "  Number of IFDs: {}", self.ifds.len())?;
        if let Some(ifd) = self.main_ifd() {
            write!(f, "{}", ifd)?;
        }
        Ok(())
    }
}
