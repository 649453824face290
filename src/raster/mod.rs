//! Raster sources and the pieces they are built from

pub mod chip;
pub mod dataset;
pub mod dtype;
pub mod mask;
pub mod mosaic;
pub mod source;
pub mod uri;
pub mod window;

pub use self::chip::Chip;
pub use self::dataset::{open_dataset, read_info, Dataset, DatasetInfo, ImageDataset, TiffDataset, WindowRead};
pub use self::dtype::DataType;
pub use self::mosaic::Mosaic;
pub use self::source::{ActivationGuard, RasterSource, RasterSourceBuilder, WindowPolicy};
pub use self::uri::{local_path, resolve_uri};
pub use self::window::Window;
