//! Export of a single chip as `.npy` or GeoTIFF

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::config::{BuildConfig, PipelineConfig, ScratchDir};
use crate::errors::{RasterError, RasterResult};
use crate::raster::chip::Chip;
use crate::raster::source::RasterSource;
use crate::raster::window::Window;
use crate::tiff::writer::GeoTiffWriter;
use crate::utils::npy::write_npy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChipFormat {
    Npy,
    GeoTiff,
}

impl ChipFormat {
    fn from_path(path: &Path) -> RasterResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "npy" => Ok(ChipFormat::Npy),
            "tif" | "tiff" => Ok(ChipFormat::GeoTiff),
            _ => Err(RasterError::InvalidConfig(format!(
                "cannot tell the output format of {}, use .npy or .tif",
                path.display()
            ))),
        }
    }
}

pub struct ChipCommand {
    pipeline: PathBuf,
    window: Window,
    source_index: usize,
    raw: bool,
    output: PathBuf,
    format: ChipFormat,
}

impl ChipCommand {
    pub fn new(args: &ArgMatches) -> RasterResult<Self> {
        let pipeline = args
            .get_one::<String>("pipeline")
            .ok_or_else(|| RasterError::InvalidConfig("missing pipeline file".to_string()))?;
        let window = args
            .get_one::<String>("window")
            .ok_or_else(|| RasterError::InvalidConfig("missing --window".to_string()))?
            .parse::<Window>()?;
        let output = PathBuf::from(
            args.get_one::<String>("output")
                .ok_or_else(|| RasterError::InvalidConfig("missing --output".to_string()))?,
        );
        let format = ChipFormat::from_path(&output)?;

        Ok(ChipCommand {
            pipeline: PathBuf::from(pipeline),
            window,
            source_index: args.get_one::<usize>("source").copied().unwrap_or(0),
            raw: args.get_flag("raw"),
            output,
            format,
        })
    }

    fn read(&self, source: &mut RasterSource) -> RasterResult<Chip> {
        let raw = self.raw;
        let window = self.window;
        source.with_activated(|s| {
            if raw {
                s.get_raw_image_array(Some(window))
            } else {
                s.get_chip(window)
            }
        })
    }

    fn write_geotiff(&self, source: &RasterSource, chip: &Chip) -> RasterResult<()> {
        let mut writer = GeoTiffWriter::new().compression("deflate")?.predictor(!chip.dtype.is_float());
        let crs = source.get_crs_transformer();
        if let Some(gt) = crs.geotransform() {
            // clamped chips start at the clamped corner
            let (rows, cols, _) = chip.shape();
            let (row0, col0) = if (rows, cols) == self.window.shape() {
                (self.window.row_min, self.window.col_min)
            } else {
                (self.window.row_min.max(0), self.window.col_min.max(0))
            };
            writer = writer
                .geotransform(gt.translated(col0 as f64, row0 as f64))
                .crs(crs.crs().clone());
        }
        writer.write(&self.output, &chip.data, chip.dtype)
    }
}

impl Command for ChipCommand {
    fn execute(&self) -> RasterResult<()> {
        let pipeline = PipelineConfig::from_file(&self.pipeline)?;
        let scratch = ScratchDir::temporary()?;
        let config = pipeline.sources.get(self.source_index).ok_or_else(|| {
            RasterError::InvalidConfig(format!(
                "source {} requested but the pipeline has {}",
                self.source_index,
                pipeline.sources.len()
            ))
        })?;
        let mut source = config.build(&scratch)?;

        let chip = self.read(&mut source)?;
        let (rows, cols, channels) = chip.shape();
        info!(
            "Read {} chip of {}x{}x{} from window {}",
            chip.dtype, rows, cols, channels, self.window
        );

        match self.format {
            ChipFormat::Npy => write_npy(&self.output, &chip)?,
            ChipFormat::GeoTiff => self.write_geotiff(&source, &chip)?,
        }
        info!("Wrote {}", self.output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ChipFormat::from_path(Path::new("a/chip.NPY")).unwrap(), ChipFormat::Npy);
        assert_eq!(ChipFormat::from_path(Path::new("chip.tiff")).unwrap(), ChipFormat::GeoTiff);
        assert!(ChipFormat::from_path(Path::new("chip.png")).is_err());
    }
}
