//! Parallel reference scanning
//!
//! Answers "does any of these files reference this specifier?" and "which
//! ones do?". Small candidate sets are checked in program order on the
//! calling thread. Above the configured threshold the calling thread
//! snapshots every candidate's content through the [`SourceFileIndex`],
//! splits the snapshot into owned partitions and hands them to scan workers.
//! Workers never touch the tree; results come back over a channel and the
//! first positive answer wins.
//!
//! A worker that panics, or a worker that cannot be spawned, sends the whole
//! query back to the sequential path.

use crate::services::import_rewriter::{may_contain_specifier, parse_occurrences};
use crate::services::source_index::SourceFileIndex;
use crossbeam_channel::unbounded;
use reloc_config::ScanConfig;
use reloc_plugin_api::SpecifierParser;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Specifier a reference check looks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecifierQuery {
    /// The specifier equals the string
    Exact(String),
    /// The specifier equals the alias or names a sub-path of it (`alias/…`)
    AliasOrSubpath(String),
}

impl SpecifierQuery {
    pub fn matches(&self, specifier: &str) -> bool {
        match self {
            Self::Exact(expected) => specifier == expected,
            Self::AliasOrSubpath(alias) => {
                specifier == alias
                    || specifier
                        .strip_prefix(alias.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }

    /// Substring every matching file must contain
    fn needle(&self) -> &str {
        match self {
            Self::Exact(s) | Self::AliasOrSubpath(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    FirstMatch,
    AllMatches,
}

type Snapshot = Vec<(String, Arc<str>)>;

struct WorkerReport {
    worker: usize,
    /// Matching paths, or `None` when the worker panicked
    matches: Option<Vec<String>>,
}

/// Reference scanner with sequential and fan-out execution paths
#[derive(Clone)]
pub struct ParallelReferenceScanner {
    parser: Arc<dyn SpecifierParser>,
    threshold: usize,
    max_workers: usize,
}

impl ParallelReferenceScanner {
    pub fn new(parser: Arc<dyn SpecifierParser>, scan: &ScanConfig) -> Self {
        Self {
            parser,
            threshold: scan.parallel_threshold,
            max_workers: scan.max_workers.max(1),
        }
    }

    /// True when any candidate file references the query
    pub fn any_reference(
        &self,
        index: &mut SourceFileIndex<'_>,
        files: &[String],
        query: &SpecifierQuery,
    ) -> bool {
        !self.scan(index, files, query, ScanMode::FirstMatch).is_empty()
    }

    /// Every candidate file referencing the query, in candidate order
    pub fn referencing_files(
        &self,
        index: &mut SourceFileIndex<'_>,
        files: &[String],
        query: &SpecifierQuery,
    ) -> Vec<String> {
        self.scan(index, files, query, ScanMode::AllMatches)
    }

    fn scan(
        &self,
        index: &mut SourceFileIndex<'_>,
        files: &[String],
        query: &SpecifierQuery,
        mode: ScanMode,
    ) -> Vec<String> {
        if files.len() <= self.threshold || self.max_workers < 2 {
            return self.scan_sequential(index, files, query, mode);
        }

        let snapshot: Snapshot = files
            .iter()
            .filter_map(|file| index.read(file).map(|content| (file.clone(), content)))
            .collect();
        if snapshot.is_empty() {
            return Vec::new();
        }

        match self.fan_out(&snapshot, query, mode) {
            Some(found) => found,
            None => {
                warn!(
                    files = snapshot.len(),
                    "Parallel reference scan failed, rescanning sequentially"
                );
                scan_partition(self.parser.as_ref(), &snapshot, query, mode)
            }
        }
    }

    /// Read each file only when it is reached, so a first match stops the reads too
    fn scan_sequential(
        &self,
        index: &mut SourceFileIndex<'_>,
        files: &[String],
        query: &SpecifierQuery,
        mode: ScanMode,
    ) -> Vec<String> {
        let mut found = Vec::new();
        for file in files {
            let Some(content) = index.read(file) else {
                continue;
            };
            if references(self.parser.as_ref(), file, &content, query) {
                found.push(file.clone());
                if mode == ScanMode::FirstMatch {
                    break;
                }
            }
        }
        found
    }

    /// `None` when a worker could not be spawned or did not report
    fn fan_out(&self, snapshot: &Snapshot, query: &SpecifierQuery, mode: ScanMode) -> Option<Vec<String>> {
        let chunk_size = snapshot.len().div_ceil(self.max_workers);
        let (tx, rx) = unbounded::<WorkerReport>();
        let mut spawned = 0;

        for (worker, partition) in snapshot.chunks(chunk_size).enumerate() {
            let partition: Snapshot = partition.to_vec();
            let parser = Arc::clone(&self.parser);
            let query = query.clone();
            let tx = tx.clone();

            let spawn = thread::Builder::new()
                .name(format!("reloc-scan-{worker}"))
                .spawn(move || {
                    let matches = panic::catch_unwind(AssertUnwindSafe(|| {
                        scan_partition(parser.as_ref(), &partition, &query, mode)
                    }))
                    .ok();
                    // The receiver may already be gone after an early positive answer.
                    let _ = tx.send(WorkerReport { worker, matches });
                });

            if let Err(e) = spawn {
                warn!(worker, error = %e, "Failed to spawn scan worker");
                return None;
            }
            spawned += 1;
        }
        drop(tx);
        debug!(workers = spawned, files = snapshot.len(), "Fanned out reference scan");

        let mut per_worker: Vec<Option<Vec<String>>> = vec![None; spawned];
        for _ in 0..spawned {
            let report = rx.recv().ok()?;
            let Some(matches) = report.matches else {
                warn!(worker = report.worker, "Scan worker panicked");
                return None;
            };
            if mode == ScanMode::FirstMatch && !matches.is_empty() {
                return Some(matches);
            }
            per_worker[report.worker] = Some(matches);
        }

        // Partitions are contiguous, so worker order is candidate order.
        Some(per_worker.into_iter().flatten().flatten().collect())
    }
}

fn references(parser: &dyn SpecifierParser, path: &str, content: &str, query: &SpecifierQuery) -> bool {
    may_contain_specifier(content, query.needle())
        && parse_occurrences(parser, path, content)
            .iter()
            .any(|o| query.matches(&o.value))
}

fn scan_partition(
    parser: &dyn SpecifierParser,
    partition: &[(String, Arc<str>)],
    query: &SpecifierQuery,
    mode: ScanMode,
) -> Vec<String> {
    let mut found = Vec::new();
    for (path, content) in partition {
        if references(parser, path, content, query) {
            found.push(path.clone());
            if mode == ScanMode::FirstMatch {
                break;
            }
        }
    }
    found
}
