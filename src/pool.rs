//! Run one conversion task per PST file on a bounded worker pool.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::mailbox::walker::ConversionStats;
use crate::mailbox::ClientFactory;
use crate::pipeline::process_pst;
use crate::progress::Progress;

/// Result of one PST file.
#[derive(Debug)]
pub struct FileOutcome {
    pub pst: PathBuf,
    pub result: Result<ConversionStats>,
}

/// Serializable view of a [`FileOutcome`] for JSON summaries.
#[derive(Debug, Serialize)]
pub struct OutcomeReport {
    pub pst: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ConversionStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&FileOutcome> for OutcomeReport {
    fn from(outcome: &FileOutcome) -> Self {
        let (stats, error) = match &outcome.result {
            Ok(stats) => (Some(stats.clone()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            pst: outcome.pst.display().to_string(),
            stats,
            error,
        }
    }
}

/// Effective worker count: at least 1, at most one per input.
pub fn effective_workers(requested: usize, inputs: usize) -> usize {
    requested.clamp(1, inputs.max(1))
}

/// Convert every input, at most `workers` at a time.
///
/// Each task opens its own mail-client session through `connect`. A failed
/// task does not stop the others; outcomes come back in input order.
pub fn run_all(
    inputs: &[PathBuf],
    output: Option<&Path>,
    workers: usize,
    config: &Config,
    progress: &Progress,
    connect: &ClientFactory,
) -> Vec<FileOutcome> {
    let workers = effective_workers(workers, inputs.len());

    let task = |worker: usize, pst: &PathBuf| -> FileOutcome {
        let result = connect().and_then(|client| {
            process_pst(pst, output, client.as_ref(), config, progress, worker)
        });
        if let Err(ref e) = result {
            tracing::error!(pst = %pst.display(), error = %e, "PST conversion failed");
        }
        FileOutcome {
            pst: pst.clone(),
            result,
        }
    };

    if workers == 1 {
        return inputs.iter().map(|pst| task(0, pst)).collect();
    }

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("pst2md-worker-{i}"))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Could not start worker pool, running sequentially");
            return inputs.iter().map(|pst| task(0, pst)).collect();
        }
    };

    pool.install(|| {
        inputs
            .par_iter()
            .with_max_len(1)
            .map(|pst| task(rayon::current_thread_index().unwrap_or(0), pst))
            .collect()
    })
}
