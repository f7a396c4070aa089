//! Translation driver
//!
//! Phase 1 translates every unit on a pool of scoped worker threads. Each
//! worker owns the session and graph of the unit it is building; the only
//! shared state is the immutable [`FileSet`]. Phase 2 runs the linker over
//! the finished graphs once every worker has joined.

use crate::declarations::{Declaration, TranslationUnitDeclaration};
use crate::engine::{GraphStats, MemoryGraph};
use crate::frontend::{default_registry, FrontendRegistry};
use crate::ignore::discover;
use crate::linker::{CrossUnitLink, GlobalLinker, GlobalLinkerStats};
use crate::node::{Node, NodeId};
use crate::position::{FileSet, SourceFile};
use crate::session::{BuildOptions, Session};
use crate::ui::{ProgressMessage, ProgressPhase};
use crate::{Error, Result};
use crossbeam::channel::{unbounded, Sender};
use serde::Serialize;
use std::backtrace::Backtrace;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One successfully translated file and its graph
#[derive(Debug)]
pub struct TranslatedUnit {
    /// File name as registered in the file set
    pub path: String,
    pub package: String,
    /// The unit's TranslationUnitDeclaration
    pub root: NodeId,
    pub graph: MemoryGraph,
}

impl TranslatedUnit {
    /// Directory part of the path; units of one package share it
    pub fn dir(&self) -> &str {
        Path::new(&self.path)
            .parent()
            .and_then(|p| p.to_str())
            .unwrap_or("")
    }
}

/// A unit whose translation was aborted; it contributes no graph
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub file: String,
    /// 1-based; 0 when the fault carries no position
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl UnitFailure {
    fn from_error(file: &str, err: &Error) -> Self {
        let (line, column) = match err {
            Error::Translation { line, column, .. } => (*line, *column),
            _ => (0, 0),
        };
        Self {
            file: file.to_string(),
            line,
            column,
            message: err.root_cause().to_string(),
        }
    }
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "{}:{}:{}: {}", self.file, self.line, self.column, self.message)
        } else {
            write!(f, "{}: {}", self.file, self.message)
        }
    }
}

enum UnitMessage {
    Translated(TranslatedUnit),
    Failed(UnitFailure),
    Skipped(String),
}

#[derive(Debug, Default)]
pub struct TranslationResult {
    /// Ordered like the input files
    pub units: Vec<TranslatedUnit>,
    pub failures: Vec<UnitFailure>,
    pub links: Vec<CrossUnitLink>,
    pub linker: GlobalLinkerStats,
}

impl TranslationResult {
    /// Statistics over every unit graph
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats::default();
        for unit in &self.units {
            stats.merge(&unit.graph.stats());
        }
        stats
    }

    pub fn unit(&self, path: &str) -> Option<&TranslatedUnit> {
        self.units.iter().find(|u| u.path == path)
    }
}

pub struct TranslationManager {
    registry: FrontendRegistry,
    options: BuildOptions,
    workers: usize,
    max_nodes: Option<usize>,
    progress: Option<Sender<ProgressMessage>>,
}

impl Default for TranslationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationManager {
    pub fn new() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            registry: default_registry(),
            options: BuildOptions::default(),
            workers,
            max_nodes: None,
            progress: None,
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Cap the number of nodes each unit's graph may hold
    pub fn with_node_limit(mut self, max_nodes: Option<usize>) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_progress(mut self, tx: Sender<ProgressMessage>) -> Self {
        self.progress = Some(tx);
        self
    }

    fn report(&self, msg: ProgressMessage) {
        if let Some(tx) = &self.progress {
            tx.send(msg).ok();
        }
    }

    /// Discover and translate every source file under `root`
    pub fn translate_path(&self, root: &Path, excludes: &[String]) -> Result<TranslationResult> {
        let mut sources = Vec::new();
        for path in discover(root, excludes) {
            if !self.registry.can_handle(&path) {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let name = path.strip_prefix(root).unwrap_or(&path);
            sources.push((name.to_string_lossy().replace('\\', "/"), content));
        }
        tracing::info!("found {} source files under {}", sources.len(), root.display());
        Ok(self.translate_sources(sources))
    }

    /// Translate in-memory `(name, content)` pairs
    pub fn translate_sources(&self, sources: Vec<(String, String)>) -> TranslationResult {
        let mut fset = FileSet::new();
        for (name, content) in sources {
            fset.add_file(name, content);
        }

        let messages = self.run_workers(&fset);

        let mut result = TranslationResult::default();
        for msg in messages {
            match msg {
                UnitMessage::Translated(unit) => result.units.push(unit),
                UnitMessage::Failed(failure) => result.failures.push(failure),
                UnitMessage::Skipped(file) => tracing::debug!("no frontend for {}", file),
            }
        }

        self.report(ProgressMessage::Started {
            phase: ProgressPhase::Linking,
            total: result.units.len(),
        });
        let (links, stats) = GlobalLinker::new(&result.units).run();
        result.links = links;
        result.linker = stats;
        self.report(ProgressMessage::Finished {
            phase: ProgressPhase::Linking,
        });

        result
    }

    /// Phase 1. Messages come back in file-set order.
    fn run_workers(&self, fset: &FileSet) -> Vec<UnitMessage> {
        let files: Vec<&SourceFile> = fset.files().collect();
        let next = AtomicUsize::new(0);
        let (tx, rx) = unbounded::<(usize, UnitMessage)>();

        self.report(ProgressMessage::Started {
            phase: ProgressPhase::Translating,
            total: files.len(),
        });

        let workers = self.workers.min(files.len()).max(1);
        std::thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let files = &files;
                let next = &next;
                scope.spawn(move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(file) = files.get(index) else {
                            break;
                        };
                        let msg = self.translate_unit(fset, file);
                        self.report(ProgressMessage::Progress {
                            phase: ProgressPhase::Translating,
                            current: index + 1,
                            file: Some(file.name().to_string()),
                        });
                        if tx.send((index, msg)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        self.report(ProgressMessage::Finished {
            phase: ProgressPhase::Translating,
        });

        let mut messages: Vec<(usize, UnitMessage)> = rx.iter().collect();
        messages.sort_by_key(|(index, _)| *index);
        messages.into_iter().map(|(_, msg)| msg).collect()
    }

    fn translate_unit(&self, fset: &FileSet, file: &SourceFile) -> UnitMessage {
        let Some(frontend) = self.registry.find_frontend(Path::new(file.name())) else {
            return UnitMessage::Skipped(file.name().to_string());
        };

        let mut graph = match self.max_nodes {
            Some(limit) => MemoryGraph::with_node_limit(limit),
            None => MemoryGraph::new(),
        };
        let translated = {
            let mut s = Session::new(fset, &mut graph, self.options);
            frontend
                .translate(&mut s, file)
                .and_then(|unit| Ok((unit.id(), package_of(&s, unit)?)))
        };

        match translated {
            Ok((root, package)) => {
                tracing::debug!("{}: {} nodes", file.name(), graph.len());
                UnitMessage::Translated(TranslatedUnit {
                    path: file.name().to_string(),
                    package,
                    root,
                    graph,
                })
            }
            Err(err) => {
                // the partial graph is dropped with this frame
                let backtrace = Backtrace::force_capture();
                tracing::error!("translation of {} aborted: {}\n{}", file.name(), err, backtrace);
                self.report(ProgressMessage::Error(format!("{}: {}", file.name(), err)));
                UnitMessage::Failed(UnitFailure::from_error(file.name(), &err))
            }
        }
    }
}

fn package_of(s: &Session<'_>, unit: TranslationUnitDeclaration) -> Result<String> {
    for decl in unit.declarations(s)? {
        if let Declaration::Namespace(ns) = decl {
            return ns.name(s);
        }
    }
    Ok(String::new())
}
