//! Fetch-if-missing for the source dataset.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};

/// Make sure the dataset exists at `path`, downloading it from `url` when
/// it does not. A cached copy is always reused as is.
///
/// The download goes to a sibling `.part` file first and is renamed into
/// place only once complete, so an interrupted fetch never leaves a
/// truncated file that a later run would mistake for the cache.
pub fn ensure_dataset(path: &Path, url: &str) -> PipelineResult<PathBuf> {
    if path.is_file() {
        info!(path = %path.display(), "using cached dataset");
        return Ok(path.to_path_buf());
    }
    if url.trim().is_empty() {
        return Err(PipelineError::DatasetUnavailable {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    info!(%url, path = %path.display(), "downloading dataset");
    let fetch_err = |source| PipelineError::Fetch {
        url: url.to_string(),
        source,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(None)
        .build()
        .map_err(fetch_err)?;
    let mut response = client.get(url).send().map_err(fetch_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = store(&mut response, path)?;
    info!(bytes, path = %path.display(), "dataset cached");
    Ok(path.to_path_buf())
}

/// Stream `body` to `path` through its `.part` sibling. On failure the
/// partial file is removed and `path` is left untouched.
fn store<R: Read>(body: &mut R, path: &Path) -> PipelineResult<u64> {
    let part = part_path(path);
    let written = File::create(&part).map_err(PipelineError::from).and_then(|mut file| {
        let bytes = io::copy(body, &mut file)?;
        file.sync_all()?;
        Ok(bytes)
    });
    match written {
        Ok(bytes) => {
            fs::rename(&part, path)?;
            Ok(bytes)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&part) {
                warn!(path = %part.display(), error = %cleanup, "could not remove partial download");
            }
            Err(e)
        }
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}
