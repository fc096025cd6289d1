//! Background worker for export and import passes.
//!
//! A pass runs on a tokio blocking task so the caller stays responsive. At
//! most one pass runs at a time; starting another fails with
//! [`SyncError::Busy`]. A started pass cannot be interrupted: dropping the
//! handle abandons the result, the pass still completes.
//!
//! Spawning requires a tokio runtime.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::error::{HostError, SyncError, SyncResult};
use crate::extract::ExportOptions;
use crate::host::HostGraph;
use crate::import::{ImportOutcome, ImportTarget};
use crate::service::{ExportSummary, StatusReporter, SyncService};

pub type SharedReporter = Arc<dyn StatusReporter + Send + Sync>;

/// Releases the in-flight flag when the pass ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> SyncResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::Busy)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncWorker<G> {
    graph: Arc<Mutex<G>>,
    config: Arc<SyncConfig>,
    reporter: SharedReporter,
    in_flight: Arc<AtomicBool>,
}

impl<G> Clone for SyncWorker<G> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            config: Arc::clone(&self.config),
            reporter: Arc::clone(&self.reporter),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<G> SyncWorker<G>
where
    G: HostGraph + Send + 'static,
{
    pub fn new(graph: G, config: SyncConfig, reporter: SharedReporter) -> Self {
        Self {
            graph: Arc::new(Mutex::new(graph)),
            config: Arc::new(config),
            reporter,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The host graph, shared with running passes.
    pub fn graph(&self) -> Arc<Mutex<G>> {
        Arc::clone(&self.graph)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn spawn_export(
        &self,
        options: ExportOptions,
        path: PathBuf,
    ) -> SyncResult<JoinHandle<SyncResult<ExportSummary>>> {
        let in_flight = InFlight::acquire(&self.in_flight)?;
        let (graph, config, reporter) = self.shared();
        tracing::debug!(path = %path.display(), "export scheduled");

        Ok(tokio::task::spawn_blocking(move || {
            let _in_flight = in_flight;
            let graph = lock(&graph)?;
            SyncService::new((*config).clone(), &*reporter).export_project(&*graph, &options, &path)
        }))
    }

    pub fn spawn_import(
        &self,
        path: PathBuf,
        target: ImportTarget,
    ) -> SyncResult<JoinHandle<SyncResult<ImportOutcome>>> {
        let in_flight = InFlight::acquire(&self.in_flight)?;
        let (graph, config, reporter) = self.shared();
        tracing::debug!(path = %path.display(), "import scheduled");

        Ok(tokio::task::spawn_blocking(move || {
            let _in_flight = in_flight;
            let mut graph = lock(&graph)?;
            SyncService::new((*config).clone(), &*reporter).import_file(&mut *graph, &path, target)
        }))
    }

    fn shared(&self) -> (Arc<Mutex<G>>, Arc<SyncConfig>, SharedReporter) {
        (
            Arc::clone(&self.graph),
            Arc::clone(&self.config),
            Arc::clone(&self.reporter),
        )
    }
}

fn lock<G>(graph: &Mutex<G>) -> SyncResult<std::sync::MutexGuard<'_, G>> {
    graph
        .lock()
        .map_err(|_| SyncError::Host(HostError::Unavailable("graph lock poisoned".to_string())))
}
