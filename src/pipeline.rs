//! Batch processor: list → sort → parse → normalize → write, one file at a time.
//!
//! The [`BatchProcessor`] owns the [`NamingEngine`] for exactly one batch.
//! Files run in ascending byte order of their names, which decides which
//! file gets the lower synthetic numbers. The first error of any kind stops
//! the batch; files already written stay written.

use thiserror::Error;
use tracing::{debug, info};

use crate::Config;
use crate::changelog::{parse_changelog, write_changelog};
use crate::input::{ChangelogSource, LoadError};
use crate::naming::NamingEngine;
use crate::normalize::{NormalizeStats, VarcharCap, normalize_document};
use crate::output::{ChangelogSink, WriteError};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Outcome for one processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    pub stats: NormalizeStats,
}

/// Outcome of a whole batch, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn totals(&self) -> NormalizeStats {
        let mut totals = NormalizeStats::default();
        for file in &self.files {
            totals.add(&file.stats);
        }
        totals
    }
}

/// One batch run over a set of changelog files.
pub struct BatchProcessor {
    engine: NamingEngine,
    cap: VarcharCap,
}

impl BatchProcessor {
    /// Processor with a fresh engine built from `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            engine: NamingEngine::from_config(&config.naming),
            cap: config.types.varchar_cap(),
        }
    }

    /// Counter state so far.
    pub fn engine(&self) -> &NamingEngine {
        &self.engine
    }

    /// Normalize every file from `source` into `sink`.
    pub fn run<S, K>(mut self, source: &S, sink: &mut K) -> Result<BatchReport, BatchError>
    where
        S: ChangelogSource + ?Sized,
        K: ChangelogSink + ?Sized,
    {
        let mut names = source.list()?;
        names.sort();
        info!(files = names.len(), "normalizing changelogs");

        let mut report = BatchReport::default();
        for name in names {
            let bytes = source.read(&name)?;
            let (text, stats) = self.normalize_file(&name, &bytes)?;
            sink.write(&name, &text)?;
            debug!(
                file = %name,
                change_sets = stats.change_sets,
                synthesized_ids = stats.synthesized_ids,
                synthesized_names = stats.synthesized_names,
                capped_types = stats.capped_types,
                "wrote changelog"
            );
            report.files.push(FileReport { name, stats });
        }

        let totals = report.totals();
        info!(
            files = report.files.len(),
            synthesized_ids = totals.synthesized_ids,
            synthesized_names = totals.synthesized_names,
            capped_types = totals.capped_types,
            "batch complete"
        );
        Ok(report)
    }

    /// Parse, normalize and render one file. Counters advance as a side effect.
    pub fn normalize_file(
        &mut self,
        name: &str,
        bytes: &[u8],
    ) -> Result<(String, NormalizeStats), LoadError> {
        let mut doc = parse_changelog(bytes).map_err(|e| LoadError::Parse {
            name: name.to_string(),
            source: e,
        })?;
        let stats = normalize_document(&mut doc, name, &mut self.engine, &self.cap);
        Ok((write_changelog(&doc), stats))
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
