//! Convert one PST file end to end.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{PstError, Result};
use crate::mailbox::walker::{count_messages, process_folder, ConversionStats};
use crate::mailbox::MailClient;
use crate::progress::Progress;

/// Pick the directory a PST's messages are written to.
///
/// `--output` wins, then the configured default, then the PST's own folder.
pub fn resolve_output_dir(pst: &Path, output: Option<&Path>, config: &Config) -> PathBuf {
    if let Some(dir) = output {
        return dir.to_path_buf();
    }
    if let Some(ref dir) = config.output.default_dir {
        return dir.clone();
    }
    pst.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `true` when the file name ends in `.pst` (any case).
pub fn has_pst_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("pst"))
        .unwrap_or(false)
}

/// Convert every message of one PST file.
///
/// Errors returned here are fatal for this file only: missing or invalid
/// path, output directory not creatable, store not mountable.
pub fn process_pst(
    pst: &Path,
    output: Option<&Path>,
    client: &dyn MailClient,
    config: &Config,
    progress: &Progress,
    worker: usize,
) -> Result<ConversionStats> {
    if !pst.exists() {
        return Err(PstError::FileNotFound(pst.to_path_buf()));
    }
    if !pst.is_file() {
        return Err(PstError::InvalidPath(format!(
            "{} is not a file",
            pst.display()
        )));
    }

    let output_dir = resolve_output_dir(pst, output, config);
    std::fs::create_dir_all(&output_dir).map_err(|e| PstError::io(&output_dir, e))?;

    let root = client.open_store(pst)?;
    info!(pst = %pst.display(), root = %root.name(), "Opened store");

    let total = count_messages(root.as_ref());
    let label = pst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pst.display().to_string());

    let mut stats = ConversionStats::default();
    {
        let bar = progress.mailbox(worker, &label);
        bar.set_total(total as u64);
        process_folder(root.as_ref(), &output_dir, config, &bar, &mut stats);
    }

    if let Err(e) = client.close_store(root.as_ref()) {
        warn!(pst = %pst.display(), error = %e, "Could not detach store");
    }

    info!(
        pst = %pst.display(),
        messages = stats.messages,
        skipped = stats.skipped,
        "Finished store"
    );
    Ok(stats)
}
