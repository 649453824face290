//! Raster sources: chips read from one or more files
//!
//! A [`RasterSource`] is built inactive from header metadata alone. Reading
//! requires activation, which opens the underlying dataset and hands back an
//! [`ActivationGuard`]. Dropping the guard closes the dataset again, also when
//! an error or panic unwinds through the activated scope.
//!
//! Every windowed read goes through the same steps: window policy, shift,
//! raw read, nodata/mask zeroing, channel selection and the transformer chain.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

use log::{debug, info, warn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::coordinate::{Crs, CrsTransformer};
use crate::errors::{RasterError, RasterResult};
use crate::raster::chip::Chip;
use crate::raster::dataset::{open_dataset, read_info, Dataset, DatasetInfo};
use crate::raster::dtype::DataType;
use crate::raster::mask::{apply_validity, mask_pixels};
use crate::raster::window::Window;
use crate::tiff::metadata::ColorInterp;
use crate::transform::{ChipTransformer, TransformContext, Transformer};

/// Treatment of windows that reach past the raster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// Keep the requested shape; outside pixels read as zero
    #[default]
    Pad,
    /// Shrink the window to its overlap with the raster
    Clamp,
}

/// Builder for a [`RasterSource`]
pub struct RasterSourceBuilder {
    uris: Vec<String>,
    paths: Vec<PathBuf>,
    channel_order: Option<Vec<usize>>,
    x_shift: f64,
    y_shift: f64,
    window_policy: WindowPolicy,
    transformers: Vec<Transformer>,
    map_crs: Option<u32>,
}

impl RasterSourceBuilder {
    pub fn channel_order(mut self, order: Option<Vec<usize>>) -> Self {
        self.channel_order = order;
        self
    }

    /// Offset in map units applied to every read
    pub fn shift(mut self, x_shift: f64, y_shift: f64) -> Self {
        self.x_shift = x_shift;
        self.y_shift = y_shift;
        self
    }

    pub fn window_policy(mut self, policy: WindowPolicy) -> Self {
        self.window_policy = policy;
        self
    }

    pub fn transformer(mut self, transformer: impl Into<Transformer>) -> Self {
        self.transformers.push(transformer.into());
        self
    }

    /// EPSG code map points of the CRS transformer are expressed in
    pub fn map_crs(mut self, epsg: Option<u32>) -> Self {
        self.map_crs = epsg;
        self
    }

    /// Reads header metadata and validates the configuration
    ///
    /// The dataset is opened once and closed again before returning.
    pub fn build(self) -> RasterResult<RasterSource> {
        let info = read_info(&self.paths)?;
        info!(
            "Built raster source {}: {}x{}x{} {}",
            self.uris.join(","),
            info.width,
            info.height,
            info.channel_count,
            info.dtype
        );

        let channel_order = match self.channel_order {
            Some(order) => validate_channel_order(order, info.channel_count)?,
            None => default_channel_order(&info),
        };

        let crs_transformer =
            CrsTransformer::new(info.geotransform(), info.crs().clone(), self.map_crs)?;
        match info.crs() {
            _ if !crs_transformer.is_georeferenced() => {
                warn!("{} is not georeferenced, using pixel coordinates", self.uris.join(","));
            }
            Crs::Unidentified(citation) => {
                warn!("CRS of {} has no authority code ({:?})", self.uris.join(","), citation);
            }
            _ => {}
        }

        let shift = pixel_shift(&crs_transformer, self.x_shift, self.y_shift);
        if shift != (0, 0) {
            debug!("Shift of ({}, {}) map units is {:?} pixels", self.x_shift, self.y_shift, shift);
        }

        let context = TransformContext {
            channel_order: channel_order.clone(),
            raw_dtype: info.dtype,
            raw_channel_count: info.channel_count,
        };
        for transformer in &self.transformers {
            transformer.validate(&context)?;
        }

        Ok(RasterSource {
            uris: self.uris,
            paths: self.paths,
            info,
            channel_order,
            x_shift: self.x_shift,
            y_shift: self.y_shift,
            shift,
            window_policy: self.window_policy,
            transformers: self.transformers,
            context,
            crs_transformer,
            dataset: None,
        })
    }
}

fn validate_channel_order(order: Vec<usize>, channel_count: usize) -> RasterResult<Vec<usize>> {
    let mut seen = vec![false; channel_count];
    for &index in &order {
        if index >= channel_count {
            return Err(RasterError::ChannelOrder { index, channel_count });
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(RasterError::DuplicateChannel(index));
        }
    }
    Ok(order)
}

/// Every raw channel except alpha
fn default_channel_order(info: &DatasetInfo) -> Vec<usize> {
    let order: Vec<usize> = (0..info.channel_count)
        .filter(|&i| info.bands.color_interp.get(i) != Some(&ColorInterp::Alpha))
        .collect();
    if order.len() < info.channel_count {
        info!("Excluding alpha band from the default channel order");
    }
    order
}

/// `(rows, cols)` offset of a shift given in map units
fn pixel_shift(crs_transformer: &CrsTransformer, x_shift: f64, y_shift: f64) -> (i64, i64) {
    let (pixel_width, pixel_height) = crs_transformer.pixel_size();
    let cols = if x_shift == 0.0 { 0 } else { (x_shift / pixel_width).round() as i64 };
    let rows = if y_shift == 0.0 { 0 } else { (y_shift / pixel_height).round() as i64 };
    (rows, cols)
}

/// Windowed reader over one file or a mosaic of files
pub struct RasterSource {
    uris: Vec<String>,
    paths: Vec<PathBuf>,
    info: DatasetInfo,
    channel_order: Vec<usize>,
    x_shift: f64,
    y_shift: f64,
    shift: (i64, i64),
    window_policy: WindowPolicy,
    transformers: Vec<Transformer>,
    context: TransformContext,
    crs_transformer: CrsTransformer,
    dataset: Option<Box<dyn Dataset>>,
}

impl fmt::Debug for RasterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterSource")
            .field("uris", &self.uris)
            .field("channel_order", &self.channel_order)
            .field("dtype", &self.info.dtype)
            .field("shift", &(self.x_shift, self.y_shift))
            .field("window_policy", &self.window_policy)
            .field("transformers", &self.transformers)
            .field("active", &self.is_active())
            .finish()
    }
}

impl RasterSource {
    /// Starts a builder over already-resolved local `paths`
    pub fn builder(uris: Vec<String>, paths: Vec<PathBuf>) -> RasterSourceBuilder {
        RasterSourceBuilder {
            uris,
            paths,
            channel_order: None,
            x_shift: 0.0,
            y_shift: 0.0,
            window_policy: WindowPolicy::default(),
            transformers: Vec::new(),
            map_crs: None,
        }
    }

    /// Opens the dataset unless it is already open
    ///
    /// The returned guard closes the dataset when dropped, unless an outer
    /// guard opened it.
    pub fn activate(&mut self) -> RasterResult<ActivationGuard<'_>> {
        let owns = self.dataset.is_none();
        if owns {
            debug!("Activating {}", self.uris.join(","));
            self.dataset = Some(open_dataset(&self.paths)?);
        }
        Ok(ActivationGuard { source: self, owns })
    }

    /// Runs `f` with the source activated
    pub fn with_activated<T, F>(&mut self, f: F) -> RasterResult<T>
    where
        F: FnOnce(&mut RasterSource) -> RasterResult<T>,
    {
        let mut guard = self.activate()?;
        f(&mut *guard)
    }

    pub fn is_active(&self) -> bool {
        self.dataset.is_some()
    }

    fn dataset_mut(&mut self) -> RasterResult<&mut Box<dyn Dataset>> {
        self.dataset.as_mut().ok_or(RasterError::NotActivated)
    }

    /// Full pixel extent of the source
    pub fn get_extent(&self) -> RasterResult<Window> {
        if !self.is_active() {
            return Err(RasterError::NotActivated);
        }
        Ok(self.info.extent())
    }

    /// Data type of the raw samples
    pub fn get_dtype(&self) -> DataType {
        self.info.dtype
    }

    pub fn get_crs_transformer(&self) -> &CrsTransformer {
        &self.crs_transformer
    }

    /// Shifted and masked read of every raw channel
    ///
    /// `window` defaults to the full extent. No channel selection or
    /// transformer is applied.
    pub fn get_raw_image_array(&mut self, window: Option<Window>) -> RasterResult<Chip> {
        let extent = self.get_extent()?;
        let (chip, _) = self.read_masked(window.unwrap_or(extent), extent)?;
        Ok(chip)
    }

    fn read_masked(&mut self, requested: Window, extent: Window) -> RasterResult<(Chip, Array2<bool>)> {
        let window = match self.window_policy {
            WindowPolicy::Pad => requested,
            WindowPolicy::Clamp => match requested.intersection(&extent) {
                Some(clamped) => clamped,
                None => {
                    warn!("Window {} lies outside the raster, returning zeros", requested);
                    let (rows, cols) = requested.shape();
                    return Ok((
                        Chip::zeros(rows, cols, self.info.channel_count, self.info.dtype),
                        Array2::from_elem((rows, cols), false),
                    ));
                }
            },
        };

        let read_window = window.translate(self.shift.0, self.shift.1);
        if self.window_policy == WindowPolicy::Pad && read_window.intersection(&extent).is_none() {
            warn!("Window {} lies outside the raster, returning zeros", requested);
        }

        let nodata = self.info.nodata();
        let dtype = self.info.dtype;
        let mut read = self.dataset_mut()?.read(read_window)?;
        let valid = mask_pixels(&mut read.data, nodata, Some(&read.valid));
        Ok((Chip::new(read.data, dtype), valid))
    }

    /// Reads `window` through the full pipeline
    ///
    /// Pixels invalid in the raw read stay zero in the output.
    pub fn get_chip(&mut self, window: Window) -> RasterResult<Chip> {
        let extent = self.get_extent()?;
        let (raw, valid) = self.read_masked(window, extent)?;
        let mut chip = raw.select_channels(&self.channel_order);
        for transformer in &self.transformers {
            chip = transformer.transform(chip, &self.context)?;
        }
        apply_validity(&mut chip.data, &valid);
        Ok(chip)
    }

    /// The whole extent through the full pipeline
    pub fn get_image_array(&mut self) -> RasterResult<Chip> {
        let extent = self.get_extent()?;
        self.get_chip(extent)
    }

    /// Header metadata read when the source was built
    pub fn info(&self) -> &DatasetInfo {
        &self.info
    }

    /// Channels of chips returned by [`RasterSource::get_chip`]
    pub fn num_channels(&self) -> usize {
        self.channel_order.len()
    }

    pub fn raw_channel_count(&self) -> usize {
        self.info.channel_count
    }

    pub fn channel_order(&self) -> &[usize] {
        &self.channel_order
    }

    pub fn nodata_value(&self) -> Option<f64> {
        self.info.nodata()
    }

    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    pub fn transformers(&self) -> &[Transformer] {
        &self.transformers
    }
}

/// Keeps a [`RasterSource`] activated while alive
pub struct ActivationGuard<'a> {
    source: &'a mut RasterSource,
    owns: bool,
}

impl Deref for ActivationGuard<'_> {
    type Target = RasterSource;

    fn deref(&self) -> &RasterSource {
        self.source
    }
}

impl DerefMut for ActivationGuard<'_> {
    fn deref_mut(&mut self) -> &mut RasterSource {
        self.source
    }
}

impl Drop for ActivationGuard<'_> {
    fn drop(&mut self) {
        if self.owns {
            debug!("Deactivating {}", self.source.uris.join(","));
            self.source.dataset = None;
        }
    }
}
