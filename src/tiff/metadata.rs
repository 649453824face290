//! Per-band metadata: nodata value and color interpretation
//!
//! Reads the GDAL_NODATA tag, the GDAL_METADATA XML block, the photometric
//! interpretation and ExtraSamples to decide which band carries alpha.

use std::fmt;

use log::{debug, warn};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::{RasterError, RasterResult};
use crate::tiff::constants::{extra_samples, photometric, tags};
use crate::tiff::ifd::IFD;

/// Color interpretation of one band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorInterp {
    Undefined,
    Gray,
    Palette,
    Red,
    Green,
    Blue,
    Alpha,
}

impl ColorInterp {
    /// Parses a GDAL color interpretation name, case-insensitively
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "gray" | "grey" => ColorInterp::Gray,
            "palette" => ColorInterp::Palette,
            "red" => ColorInterp::Red,
            "green" => ColorInterp::Green,
            "blue" => ColorInterp::Blue,
            "alpha" => ColorInterp::Alpha,
            _ => ColorInterp::Undefined,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorInterp::Undefined => "Undefined",
            ColorInterp::Gray => "Gray",
            ColorInterp::Palette => "Palette",
            ColorInterp::Red => "Red",
            ColorInterp::Green => "Green",
            ColorInterp::Blue => "Blue",
            ColorInterp::Alpha => "Alpha",
        }
    }
}

impl fmt::Display for ColorInterp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `<Item>` of a GDAL metadata block
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataItem {
    pub name: String,
    pub sample: Option<usize>,
    pub role: Option<String>,
    pub value: String,
}

/// Contents of the GDAL_METADATA tag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GdalMetadata {
    pub items: Vec<MetadataItem>,
}

impl GdalMetadata {
    /// Parses a `<GDALMetadata>` XML document
    pub fn parse(xml: &str) -> RasterResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut items = Vec::new();
        let mut current: Option<MetadataItem> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"Item" => {
                    current = Some(Self::parse_item_start(e)?);
                }
                Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"Item" => {
                    items.push(Self::parse_item_start(e)?);
                }
                Ok(Event::Text(ref t)) => {
                    if let Some(item) = current.as_mut() {
                        let text = t
                            .unescape()
                            .map_err(|e| RasterError::Corrupt(format!("GDAL metadata text: {}", e)))?;
                        item.value.push_str(&text);
                    }
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"Item" => {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(RasterError::Corrupt(format!("GDAL metadata XML: {}", e))),
                _ => {}
            }
        }

        debug!("Parsed {} GDAL metadata items", items.len());
        Ok(GdalMetadata { items })
    }

    fn parse_item_start(element: &BytesStart<'_>) -> RasterResult<MetadataItem> {
        let mut item = MetadataItem {
            name: String::new(),
            sample: None,
            role: None,
            value: String::new(),
        };

        for attr in element.attributes().flatten() {
            let value = attr
                .unescape_value()
                .map_err(|e| RasterError::Corrupt(format!("GDAL metadata attribute: {}", e)))?
                .into_owned();
            match attr.key.local_name().as_ref() {
                b"name" => item.name = value,
                b"sample" => item.sample = value.trim().parse().ok(),
                b"role" => item.role = Some(value),
                _ => {}
            }
        }
        Ok(item)
    }

    /// Color interpretation declared for a sample, if any
    pub fn color_interp(&self, sample: usize) -> Option<ColorInterp> {
        self.items
            .iter()
            .find(|item| {
                item.sample == Some(sample)
                    && (item.role.as_deref() == Some("colorinterp") || item.name.eq_ignore_ascii_case("COLORINTERP"))
            })
            .map(|item| ColorInterp::from_name(&item.value))
    }

    /// Adds or replaces the color interpretation of a sample
    pub fn set_color_interp(&mut self, sample: usize, interp: ColorInterp) {
        self.items
            .retain(|item| !(item.sample == Some(sample) && item.name.eq_ignore_ascii_case("COLORINTERP")));
        self.items.push(MetadataItem {
            name: "COLORINTERP".to_string(),
            sample: Some(sample),
            role: Some("colorinterp".to_string()),
            value: interp.name().to_string(),
        });
    }

    /// Serializes back to the XML layout GDAL writes
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<GDALMetadata>\n");
        for item in &self.items {
            xml.push_str(&format!("  <Item name=\"{}\"", escape(item.name.as_str())));
            if let Some(sample) = item.sample {
                xml.push_str(&format!(" sample=\"{}\"", sample));
            }
            if let Some(role) = &item.role {
                xml.push_str(&format!(" role=\"{}\"", escape(role.as_str())));
            }
            xml.push_str(&format!(">{}</Item>\n", escape(item.value.as_str())));
        }
        xml.push_str("</GDALMetadata>");
        xml
    }
}

/// Parses the text of a GDAL_NODATA tag
pub fn parse_nodata(text: &str) -> Option<f64> {
    let text = text.trim().trim_end_matches('\0');
    if text.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    match text.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable GDAL_NODATA value {:?}", text);
            None
        }
    }
}

/// Nodata and per-band color interpretation of an image
#[derive(Debug, Clone, PartialEq)]
pub struct BandMetadata {
    pub nodata: Option<f64>,
    pub color_interp: Vec<ColorInterp>,
}

impl BandMetadata {
    /// Index of the first alpha band
    pub fn alpha_band(&self) -> Option<usize> {
        self.color_interp.iter().position(|c| *c == ColorInterp::Alpha)
    }

    /// Reads band metadata from the main IFD of an image
    ///
    /// GDAL_METADATA color interpretations take precedence over those
    /// derived from PhotometricInterpretation and ExtraSamples.
    pub fn from_ifd(ifd: &IFD, samples_per_pixel: usize) -> RasterResult<Self> {
        let nodata = ifd.get_ascii(tags::GDAL_NODATA).and_then(|text| parse_nodata(&text));

        let mut color_interp = vec![ColorInterp::Undefined; samples_per_pixel];
        match ifd.get_tag_value(tags::PHOTOMETRIC_INTERPRETATION).map(|p| p as u16) {
            Some(photometric::RGB) => {
                for (band, interp) in [ColorInterp::Red, ColorInterp::Green, ColorInterp::Blue].into_iter().enumerate() {
                    if band < samples_per_pixel {
                        color_interp[band] = interp;
                    }
                }
            }
            Some(photometric::WHITE_IS_ZERO) | Some(photometric::BLACK_IS_ZERO) => {
                color_interp[0] = ColorInterp::Gray;
            }
            Some(photometric::PALETTE) => color_interp[0] = ColorInterp::Palette,
            _ => {}
        }

        if let Some(extra) = ifd.get_u64_values(tags::EXTRA_SAMPLES)? {
            let first_extra = samples_per_pixel.saturating_sub(extra.len());
            for (i, kind) in extra.iter().enumerate() {
                let band = first_extra + i;
                let is_alpha = matches!(
                    *kind as u16,
                    extra_samples::ASSOCIATED_ALPHA | extra_samples::UNASSOCIATED_ALPHA
                );
                if is_alpha && band < samples_per_pixel {
                    color_interp[band] = ColorInterp::Alpha;
                }
            }
        }

        if let Some(xml) = ifd.get_ascii(tags::GDAL_METADATA) {
            match GdalMetadata::parse(&xml) {
                Ok(metadata) => {
                    for (band, interp) in color_interp.iter_mut().enumerate() {
                        if let Some(declared) = metadata.color_interp(band) {
                            *interp = declared;
                        }
                    }
                }
                Err(e) => warn!("Ignoring malformed GDAL_METADATA: {}", e),
            }
        }

        Ok(BandMetadata { nodata, color_interp })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colorinterp_items() {
        let xml = r#"<GDALMetadata>
  <Item name="COLORINTERP" sample="1" role="colorinterp">Alpha</Item>
  <Item name="DESCRIPTION" sample="0" role="description">red &amp; more</Item>
</GDALMetadata>"#;
        let metadata = GdalMetadata::parse(xml).unwrap();
        assert_eq!(metadata.items.len(), 2);
        assert_eq!(metadata.color_interp(1), Some(ColorInterp::Alpha));
        assert_eq!(metadata.color_interp(0), None);
        assert_eq!(metadata.items[1].value, "red & more");
    }

    #[test]
    fn xml_survives_a_reparse() {
        let mut metadata = GdalMetadata::default();
        metadata.set_color_interp(2, ColorInterp::Alpha);
        metadata.set_color_interp(2, ColorInterp::Blue);
        let parsed = GdalMetadata::parse(&metadata.to_xml()).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.color_interp(2), Some(ColorInterp::Blue));
    }

    #[test]
    fn nodata_text() {
        assert_eq!(parse_nodata("1"), Some(1.0));
        assert_eq!(parse_nodata(" -9999.5 "), Some(-9999.5));
        assert!(parse_nodata("nan").unwrap().is_nan());
        assert_eq!(parse_nodata("none"), None);
    }
}
