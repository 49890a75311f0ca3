//! Miscellaneous helpers shared by the pipeline stages.

pub mod cancel;

#[doc(inline)]
pub use cancel::{Cancellable, CancellationToken};

use color_eyre::eyre::{Report, Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Debug;
use std::path::Path;

/// Values treated as absent in input tables.
pub const MISSING: &[&str] = &["", "NA", "NaN", "nan", "None"];

/// Returns true if a table value is one of the [`MISSING`] markers.
///
/// ```rust
/// use lcenv::utils::is_missing;
///
/// assert!(is_missing(" NA "));
/// assert!(is_missing(""));
/// assert!(!is_missing("BA.2"));
/// ```
pub fn is_missing(value: &str) -> bool {
    MISSING.contains(&value.trim())
}

/// Create the parent directory of a file path, if it has one.
pub fn create_parent_dir<P>(path: &P) -> Result<(), Report>
where
    P: AsRef<Path> + Debug,
{
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create parent directory: {parent:?}"))?;
        }
    }
    Ok(())
}

/// Progress bar for a phase over `len` items.
pub fn progress_bar(len: usize, message: &str) -> Result<ProgressBar, Report> {
    let style = ProgressStyle::with_template("{bar:40} {pos}/{len} ({percent}%) | {msg} | Elapsed: {elapsed_precise}")
        .wrap_err("Failed to create progress bar style.")?;
    let progress_bar = ProgressBar::new(len as u64).with_style(style).with_message(message.to_string());
    Ok(progress_bar)
}
