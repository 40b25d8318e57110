//! Pipeline orchestration
//!
//! Runs the stages in order, announcing each one on the progress writer:
//! - Download ATT&CK data
//! - Load the veris framework bundle
//! - Load the mappings bundle
//! - Append veris data
//! - Write the output bundle
//!
//! Any failure aborts the run. The output file is only touched after the
//! merge has succeeded.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use stix_bundle::{Bundle, BundleError, RecordError};
use thiserror::Error;

use crate::attack::{fetch_attack, BundleSource, FetchError};
use crate::config::Settings;
use crate::merge::{merge, MergeStats};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("downloading ATT&CK data failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: BundleError,
    },

    #[error("appending veris data failed: {0}")]
    Merge(#[from] RecordError),

    #[error("failed to write {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: BundleError,
    },

    #[error("computing objects digest failed: {source}")]
    Digest {
        #[source]
        source: BundleError,
    },

    #[error("progress output failed: {0}")]
    Progress(#[from] io::Error),
}

impl PipelineError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Where the bundle was written
    pub output: PathBuf,
    /// Number of objects in the written bundle
    pub objects: usize,
    pub stats: MergeStats,
    /// SHA-256 of JCS(objects)
    pub objects_sha256: String,
}

/// Print `label`, run `body`, then print `done`
fn stage<W, T, F>(progress: &mut W, label: &str, body: F) -> PipelineResult<T>
where
    W: Write,
    F: FnOnce() -> PipelineResult<T>,
{
    write!(progress, "{}... ", label)?;
    progress.flush()?;
    let value = body()?;
    writeln!(progress, "done")?;
    Ok(value)
}

/// Load a bundle file from disk
pub fn load_bundle(path: &Path) -> PipelineResult<Bundle> {
    Bundle::load(path).map_err(|source| PipelineError::Load {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a bundle to `path`, announcing whether an existing file is replaced
pub fn save_bundle<W: Write>(bundle: &Bundle, path: &Path, progress: &mut W) -> PipelineResult<()> {
    let verb = if path.exists() { "overwriting" } else { "writing" };
    write!(progress, "{} {}... ", verb, path.display())?;
    progress.flush()?;

    let save_err = |source: BundleError| PipelineError::Save {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| save_err(BundleError::Io(e)))?;
    }
    bundle.write_to_file(path).map_err(save_err)?;

    writeln!(progress, "done!")?;
    Ok(())
}

/// Run the full download/load/merge/save sequence
pub fn run<W: Write>(settings: &Settings, source: &dyn BundleSource, progress: &mut W) -> PipelineResult<RunReport> {
    let release = settings.release();

    let attack = stage(progress, "downloading ATT&CK data", || {
        Ok(fetch_attack(source, &release)?)
    })?;
    tracing::debug!(objects = attack.len(), domain = %release.domain, version = %release.version, "ATT&CK data ready");

    let veris = stage(progress, "loading veris framework", || load_bundle(&settings.veris_objects))?;
    tracing::debug!(objects = veris.len(), "veris framework loaded");

    let mappings = stage(progress, "loading mappings", || load_bundle(&settings.mappings))?;
    tracing::debug!(objects = mappings.len(), "mappings loaded");

    let merged = stage(progress, "appending veris data", || {
        Ok(merge(
            attack.into_objects(),
            veris.into_objects(),
            mappings.into_objects(),
            settings.allow_unmapped,
        )?)
    })?;
    let stats = merged.stats;
    tracing::debug!(
        attack = stats.attack,
        veris_kept = stats.veris_kept,
        veris_dropped = stats.veris_dropped,
        mappings = stats.mappings,
        "merged bundle assembled"
    );

    let bundle = merged.into_bundle();
    let objects_sha256 = bundle.objects_sha256().map_err(|source| PipelineError::Digest { source })?;
    save_bundle(&bundle, &settings.output, progress)?;

    tracing::info!(
        output = %settings.output.display(),
        bundle_id = bundle.id(),
        objects = bundle.len(),
        %objects_sha256,
        "bundle written"
    );

    Ok(RunReport {
        output: settings.output.clone(),
        objects: bundle.len(),
        stats,
        objects_sha256,
    })
}
