//! Coordinate Reference System handling

use std::fmt;

use crate::errors::{RasterError, RasterResult};

/// CRS attached to a raster
#[derive(Debug, Clone, PartialEq)]
pub enum Crs {
    /// No CRS at all, as for plain images
    None,
    /// CRS identified by an EPSG registry code
    Epsg(u32),
    /// CRS that is declared but carries no registry code
    ///
    /// Holds whatever description the file offered (a citation, or the
    /// raw projection parameters), for display only.
    Unidentified(String),
}

impl Crs {
    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Crs::None)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::None
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::None => write!(f, "none"),
            Crs::Epsg(code) => write!(f, "{}", CoordinateSystem::from_epsg(*code).description()),
            Crs::Unidentified(desc) if desc.is_empty() => write!(f, "unidentified"),
            Crs::Unidentified(desc) => write!(f, "unidentified ({})", desc),
        }
    }
}

/// Identifier for common coordinate systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// WGS 84 (EPSG:4326)
    WGS84,
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// UTM zone and hemisphere (EPSG:326xx north, 327xx south)
    UTM(u8, bool),
    /// Any other EPSG code
    Other(u32),
}

impl CoordinateSystem {
    pub fn from_epsg(epsg: u32) -> Self {
        match epsg {
            4326 => CoordinateSystem::WGS84,
            3857 | 900913 => CoordinateSystem::WebMercator,
            32601..=32660 => CoordinateSystem::UTM((epsg - 32600) as u8, true),
            32701..=32760 => CoordinateSystem::UTM((epsg - 32700) as u8, false),
            _ => CoordinateSystem::Other(epsg),
        }
    }

    /// Parses `"EPSG:4326"` or a bare code
    pub fn from_string(crs_str: &str) -> RasterResult<Self> {
        let upper = crs_str.trim().to_uppercase();
        let code = upper.strip_prefix("EPSG:").unwrap_or(&upper);
        code.parse::<u32>()
            .map(Self::from_epsg)
            .map_err(|_| RasterError::InvalidConfig(format!("Unsupported CRS format: {}", crs_str)))
    }

    pub fn epsg_code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM(zone, true) => 32600 + *zone as u32,
            CoordinateSystem::UTM(zone, false) => 32700 + *zone as u32,
            CoordinateSystem::Other(code) => *code,
        }
    }

    pub fn description(&self) -> String {
        match self {
            CoordinateSystem::WGS84 => "WGS 84 (EPSG:4326)".to_string(),
            CoordinateSystem::WebMercator => "Web Mercator (EPSG:3857)".to_string(),
            CoordinateSystem::UTM(zone, true) => format!("UTM Zone {}N (EPSG:{})", zone, self.epsg_code()),
            CoordinateSystem::UTM(zone, false) => format!("UTM Zone {}S (EPSG:{})", zone, self.epsg_code()),
            CoordinateSystem::Other(code) => format!("EPSG:{}", code),
        }
    }
}
