//! GeoTIFF georeferencing: GeoKeys, tie points and transformation matrices
//!
//! Produces the affine geotransform and CRS of an image. A CRS that is
//! declared user-defined (no EPSG code) is reported as
//! [`Crs::Unidentified`], never as an error.

use log::{debug, warn};

use crate::coordinate::{Crs, GeoTransform};
use crate::errors::{RasterError, RasterResult};
use crate::tiff::constants::{geo_keys, tags};
use crate::tiff::ifd::IFD;

/// One entry of the GeoKey directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    /// 0 when the value is stored inline, otherwise the tag holding it
    pub tiff_tag_location: u16,
    pub count: u16,
    pub value_offset: u16,
}

/// Georeferencing of one image
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoReference {
    pub geotransform: Option<GeoTransform>,
    pub crs: Crs,
}

/// Parser for GeoTIFF geographic metadata
pub struct GeoKeyParser;

impl GeoKeyParser {
    /// Parses the GeoKey directory of an IFD
    ///
    /// # Returns
    /// The key entries, empty when the IFD has no directory
    pub fn parse_geo_key_directory(ifd: &IFD) -> RasterResult<Vec<GeoKeyEntry>> {
        let Some(values) = ifd.get_u64_values(tags::GEO_KEY_DIRECTORY_TAG)? else {
            return Ok(Vec::new());
        };
        if values.len() < 4 {
            return Err(RasterError::Corrupt("GeoKey directory header is truncated".to_string()));
        }

        let num_keys = values[3] as usize;
        debug!("GeoKey directory version {}.{}.{}, {} keys", values[0], values[1], values[2], num_keys);

        let keys: Vec<GeoKeyEntry> = values[4..]
            .chunks_exact(4)
            .take(num_keys)
            .map(|k| GeoKeyEntry {
                key_id: k[0] as u16,
                tiff_tag_location: k[1] as u16,
                count: k[2] as u16,
                value_offset: k[3] as u16,
            })
            .collect();
        if keys.len() < num_keys {
            warn!("GeoKey directory declares {} keys but holds {}", num_keys, keys.len());
        }
        Ok(keys)
    }

    /// Inline SHORT value of a key
    fn short_value(keys: &[GeoKeyEntry], key_id: u16) -> Option<u16> {
        keys.iter()
            .find(|k| k.key_id == key_id && k.tiff_tag_location == 0)
            .map(|k| k.value_offset)
    }

    /// ASCII value of a key stored in GeoAsciiParams
    fn ascii_value(ifd: &IFD, keys: &[GeoKeyEntry], key_id: u16) -> Option<String> {
        let key = keys
            .iter()
            .find(|k| k.key_id == key_id && k.tiff_tag_location == tags::GEO_ASCII_PARAMS_TAG)?;
        let params = ifd.get_entry(tags::GEO_ASCII_PARAMS_TAG)?;
        let start = key.value_offset as usize;
        let end = (start + key.count as usize).min(params.data.len());
        let raw = params.data.get(start..end)?;
        let text = String::from_utf8_lossy(raw);
        Some(text.trim_end_matches(['|', '\0']).to_string())
    }

    /// Builds the affine transform from the model tags
    ///
    /// ModelTransformation wins over a tie point plus pixel scale.
    /// PixelIsPoint rasters are shifted by half a pixel to area convention.
    pub fn read_geotransform(ifd: &IFD, keys: &[GeoKeyEntry]) -> RasterResult<Option<GeoTransform>> {
        if let Some(m) = ifd.get_f64_values(tags::MODEL_TRANSFORMATION_TAG)? {
            if m.len() < 16 {
                return Err(RasterError::Corrupt("ModelTransformation needs 16 values".to_string()));
            }
            return Ok(Some(GeoTransform::new([m[3], m[0], m[1], m[7], m[4], m[5]])));
        }

        let tiepoint = ifd.get_f64_values(tags::MODEL_TIEPOINT_TAG)?;
        let scale = ifd.get_f64_values(tags::MODEL_PIXEL_SCALE_TAG)?;
        let (Some(tp), Some(scale)) = (tiepoint, scale) else {
            return Ok(None);
        };
        if tp.len() < 6 || scale.len() < 2 {
            return Err(RasterError::Corrupt("ModelTiepoint or ModelPixelScale is truncated".to_string()));
        }
        if scale[0] == 0.0 || scale[1] == 0.0 {
            warn!("ModelPixelScale has a zero component, ignoring georeferencing");
            return Ok(None);
        }

        let mut x0 = tp[3] - tp[0] * scale[0];
        let mut y0 = tp[4] + tp[1] * scale[1];
        if Self::short_value(keys, geo_keys::GT_RASTER_TYPE) == Some(geo_keys::RASTER_PIXEL_IS_POINT) {
            x0 -= scale[0] / 2.0;
            y0 += scale[1] / 2.0;
        }

        Ok(Some(GeoTransform::from_origin(x0, y0, scale[0], -scale[1])))
    }

    /// Determines the CRS from the GeoKeys
    pub fn read_crs(ifd: &IFD, keys: &[GeoKeyEntry], has_transform: bool) -> Crs {
        if keys.is_empty() {
            return if has_transform {
                Crs::Unidentified(String::new())
            } else {
                Crs::None
            };
        }

        let registry_code = |key_id| {
            Self::short_value(keys, key_id).filter(|code| *code != 0 && *code != geo_keys::USER_DEFINED)
        };

        let model_type = Self::short_value(keys, geo_keys::GT_MODEL_TYPE);
        let projected = registry_code(geo_keys::PROJECTED_CS_TYPE);
        let geographic = registry_code(geo_keys::GEOGRAPHIC_TYPE);

        let code = match model_type {
            Some(geo_keys::MODEL_TYPE_GEOGRAPHIC) => geographic,
            Some(geo_keys::MODEL_TYPE_PROJECTED) => projected,
            _ => projected.or(geographic),
        };

        match code {
            Some(code) => Crs::Epsg(code as u32),
            None => {
                let citation = [geo_keys::PROJ_CITATION, geo_keys::GT_CITATION, geo_keys::GEOG_CITATION]
                    .iter()
                    .find_map(|key| Self::ascii_value(ifd, keys, *key))
                    .unwrap_or_default();
                debug!("CRS has no registry code (citation: {:?})", citation);
                Crs::Unidentified(citation)
            }
        }
    }

    /// Extracts the georeferencing of an image
    pub fn extract_geo_reference(ifd: &IFD) -> RasterResult<GeoReference> {
        let keys = Self::parse_geo_key_directory(ifd)?;
        let geotransform = Self::read_geotransform(ifd, &keys)?;
        let crs = Self::read_crs(ifd, &keys, geotransform.is_some());
        Ok(GeoReference { geotransform, crs })
    }
}
