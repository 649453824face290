//! Tests for the TIFF types module

use crate::io::byte_order::ByteOrder;
use crate::tiff::ifd::{IFDEntry, IFD};
use crate::tiff::types::TIFF;

fn ifd_with(number: usize, entries: &[(u16, u32)]) -> IFD {
    let handler = ByteOrder::LittleEndian.create_handler();
    let mut ifd = IFD::new(number, 0, ByteOrder::LittleEndian);
    for (tag, value) in entries {
        ifd.add_entry(IFDEntry::from_u32s(*tag, &[*value], &*handler));
    }
    ifd
}

#[test]
fn test_tiff_creation() {
    let tiff = TIFF::new(false, ByteOrder::LittleEndian);
    assert!(!tiff.is_big_tiff);
    assert_eq!(tiff.ifd_count(), 0);
    assert!(tiff.main_ifd().is_none());
    assert!(tiff.mask_ifd().is_none());
}

#[test]
fn test_tiff_with_overview_and_mask() {
    let mut tiff = TIFF::new(true, ByteOrder::LittleEndian);

    tiff.ifds.push(ifd_with(0, &[(256, 1024), (257, 768)]));
    tiff.ifds.push(ifd_with(1, &[(254, 1), (256, 512), (257, 384)]));
    tiff.ifds.push(ifd_with(2, &[(254, 4), (256, 1024), (257, 768), (262, 4)]));
    tiff.ifds.push(ifd_with(3, &[(254, 5), (256, 512), (257, 384), (262, 4)]));

    assert_eq!(tiff.ifd_count(), 4);

    let overviews = tiff.overviews();
    assert_eq!(overviews.len(), 1);
    assert_eq!(overviews[0].get_dimensions(), Some((512, 384)));

    let mask = tiff.mask_ifd().unwrap();
    assert_eq!(mask.number, 2);
}

#[test]
fn test_add_entry_replaces_tag() {
    let mut ifd = ifd_with(0, &[(256, 10)]);
    let handler = ByteOrder::LittleEndian.create_handler();
    ifd.add_entry(IFDEntry::from_u16s(256, &[20], &*handler));

    assert_eq!(ifd.entry_count(), 1);
    assert_eq!(ifd.get_tag_value(256), Some(20));
}
