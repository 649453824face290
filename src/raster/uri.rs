//! Resolution of source URIs to local files

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::info;

use crate::errors::{RasterError, RasterResult};

/// Maps a URI to a readable local path
///
/// Plain paths and `file://` URIs are accepted. Gzipped files are
/// decompressed into a new file under `scratch` on every call. Other schemes
/// are rejected.
pub fn resolve_uri(uri: &str, scratch: &Path) -> RasterResult<PathBuf> {
    let path = local_path(uri)?;
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz")) {
        return decompress_gz(&path, scratch);
    }
    Ok(path)
}

/// Local path named by a plain path or `file://` URI
pub fn local_path(uri: &str) -> RasterResult<PathBuf> {
    match uri.split_once("://") {
        None => Ok(PathBuf::from(uri)),
        Some(("file", rest)) => Ok(PathBuf::from(rest)),
        Some(_) => Err(RasterError::UnsupportedUri(uri.to_string())),
    }
}

fn decompress_gz(path: &Path, scratch: &Path) -> RasterResult<PathBuf> {
    let inner = path
        .file_stem()
        .map(Path::new)
        .ok_or_else(|| RasterError::UnsupportedUri(path.display().to_string()))?;
    let prefix = format!("{}-", inner.file_stem().unwrap_or_default().to_string_lossy());
    let suffix = inner
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut out = tempfile::Builder::new().prefix(&prefix).suffix(&suffix).tempfile_in(scratch)?;
    info!("Decompressing {} into {}", path.display(), out.path().display());
    let mut decoder = GzDecoder::new(BufReader::new(File::open(path)?));
    io::copy(&mut decoder, &mut out)?;
    out.flush()?;
    let (_, target) = out.keep().map_err(|e| RasterError::Io(e.error))?;
    Ok(target)
}
