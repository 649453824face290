//! Summary of every source in a pipeline

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::config::{PipelineConfig, ScratchDir};
use crate::errors::{RasterError, RasterResult};
use crate::raster::source::RasterSource;

pub struct InfoCommand {
    pipeline: PathBuf,
}

impl InfoCommand {
    pub fn new(args: &ArgMatches) -> RasterResult<Self> {
        let pipeline = args
            .get_one::<String>("pipeline")
            .ok_or_else(|| RasterError::InvalidConfig("missing pipeline file".to_string()))?;
        Ok(InfoCommand {
            pipeline: PathBuf::from(pipeline),
        })
    }

    fn describe(index: usize, source: &mut RasterSource) -> RasterResult<()> {
        let extent = source.with_activated(|s| s.get_extent())?;
        info!("Source #{} ({})", index, source.uris().join(", "));
        info!("  Extent: {} ({} rows x {} cols)", extent, extent.height(), extent.width());
        info!("  Data type: {}", source.get_dtype());
        info!(
            "  Channels: {} raw, order {:?}",
            source.raw_channel_count(),
            source.channel_order()
        );
        match source.nodata_value() {
            Some(nodata) => info!("  Nodata: {}", nodata),
            None => info!("  Nodata: none"),
        }
        if source.info().has_mask {
            info!("  Mask: present");
        }

        let crs = source.get_crs_transformer();
        info!("  CRS: {}", crs.crs());
        if let Some(gt) = crs.geotransform() {
            let origin = gt.origin();
            info!("  Origin: ({}, {})", origin.x, origin.y);
            info!("  Pixel size: ({}, {})", gt.pixel_width(), gt.pixel_height());
        }
        for transformer in source.transformers() {
            info!("  Transformer: {}", transformer.name());
        }
        Ok(())
    }
}

impl Command for InfoCommand {
    fn execute(&self) -> RasterResult<()> {
        let pipeline = PipelineConfig::from_file(&self.pipeline)?;
        let scratch = ScratchDir::temporary()?;
        let mut sources = pipeline.build_sources(&scratch)?;
        info!("Pipeline {}: {} sources", self.pipeline.display(), sources.len());
        for (index, source) in sources.iter_mut().enumerate() {
            Self::describe(index, source)?;
        }
        Ok(())
    }
}
