//! Per-channel statistics over one or more raster sources

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::accumulator::ChannelAccumulator;
use super::sampling::SamplePolicy;
use crate::errors::{RasterError, RasterResult};
use crate::raster::source::RasterSource;
use crate::raster::uri::local_path;

const STATS_VERSION: u32 = 1;

/// On-disk form of [`RasterStats`]
#[derive(Debug, Serialize, Deserialize)]
struct StatsRecord {
    version: u32,
    means: Vec<f64>,
    stds: Vec<f64>,
}

/// Progress of a statistics run, reported after every chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipProgress {
    /// Index of the source being read
    pub source: usize,
    /// Chips of that source processed so far
    pub done: usize,
    /// Chips that source will contribute
    pub total: usize,
}

/// Mean and standard deviation of every raw channel
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStats {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl RasterStats {
    pub fn new(means: Vec<f64>, stds: Vec<f64>) -> RasterResult<Self> {
        if means.len() != stds.len() {
            return Err(RasterError::Corrupt(format!(
                "{} means but {} standard deviations",
                means.len(),
                stds.len()
            )));
        }
        Ok(RasterStats { means, stds })
    }

    pub fn channel_count(&self) -> usize {
        self.means.len()
    }

    /// Computes statistics over the raw channels of `sources`
    ///
    /// Sources are activated one at a time. Every source must expose the same
    /// number of raw channels.
    pub fn compute(sources: &mut [RasterSource], policy: &SamplePolicy) -> RasterResult<Self> {
        Self::compute_with(sources, policy, |_| {})
    }

    /// Like [`RasterStats::compute`], calling `progress` after every chip
    pub fn compute_with<F>(sources: &mut [RasterSource], policy: &SamplePolicy, mut progress: F) -> RasterResult<Self>
    where
        F: FnMut(ChipProgress),
    {
        policy.validate()?;
        let channel_count = sources
            .first()
            .ok_or_else(|| RasterError::InvalidConfig("statistics need at least one source".to_string()))?
            .raw_channel_count();
        for source in sources.iter() {
            if source.raw_channel_count() != channel_count {
                return Err(RasterError::SourceChannelMismatch {
                    uri: source.uris().join(","),
                    expected: channel_count,
                    found: source.raw_channel_count(),
                });
            }
        }

        let mut acc = ChannelAccumulator::new(channel_count, policy.nodata_value);
        for (index, source) in sources.iter_mut().enumerate() {
            let mut active = source.activate()?;
            let extent = active.get_extent()?;
            let windows = policy.windows(extent.height() as u64, extent.width() as u64)?;
            info!("Computing statistics over {} chips of {}", windows.len(), active.uris().join(","));

            for (done, window) in windows.iter().enumerate() {
                let chip = active.get_raw_image_array(Some(*window))?;
                acc.update(&chip.data);
                progress(ChipProgress {
                    source: index,
                    done: done + 1,
                    total: windows.len(),
                });
            }
        }

        debug!("Sample counts per channel: {:?}", acc.counts());
        Ok(RasterStats {
            means: acc.means(),
            stds: acc.stds(),
        })
    }

    /// Writes the statistics as JSON, replacing any existing file atomically
    pub fn save(&self, uri: &str) -> RasterResult<()> {
        let path = local_path(uri)?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        fs::create_dir_all(&parent)?;

        let record = StatsRecord {
            version: STATS_VERSION,
            means: self.means.clone(),
            stds: self.stds.clone(),
        };
        let tmp = NamedTempFile::new_in(&parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &record)?;
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|e| RasterError::Io(e.error))?;
        info!("Saved statistics for {} channels to {}", self.channel_count(), path.display());
        Ok(())
    }

    pub fn load(uri: &str) -> RasterResult<Self> {
        let path = local_path(uri)?;
        let record: StatsRecord = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
        if record.version != STATS_VERSION {
            return Err(RasterError::Corrupt(format!(
                "unknown statistics version {} in {}",
                record.version,
                path.display()
            )));
        }
        RasterStats::new(record.means, record.stds)
    }
}
