//! Export/import service with status reporting.
//!
//! Wraps the extractor, importer and document store into the user-facing
//! operations. Progress goes to a [`StatusReporter`]; the status line is
//! cleared on every exit path.

use std::path::{Path, PathBuf};

use needs_types::NeedsDocument;

use crate::config::SyncConfig;
use crate::error::{PassReport, SyncError, SyncResult};
use crate::extract::{ExportOptions, ExtractScope, Extractor};
use crate::host::HostGraph;
use crate::import::{ImportOutcome, ImportRequest, ImportTarget, Importer};
use crate::store;

// ── Status reporting ─────────────────────────────────────────────────

/// Receives progress messages for the user.
pub trait StatusReporter {
    fn status(&self, message: &str);

    fn clear(&self) {}
}

impl<F: Fn(&str)> StatusReporter for F {
    fn status(&self, message: &str) {
        self(message)
    }
}

/// Sends status messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn status(&self, message: &str) {
        tracing::info!(target: "needs_sync::status", "{}", message);
    }
}

/// Clears the status line when dropped.
struct StatusGuard<'r> {
    reporter: &'r dyn StatusReporter,
}

impl<'r> StatusGuard<'r> {
    fn new(reporter: &'r dyn StatusReporter) -> Self {
        Self { reporter }
    }

    fn status(&self, message: &str) {
        self.reporter.status(message);
    }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        self.reporter.clear();
    }
}

// ── Service ──────────────────────────────────────────────────────────

/// Result of an export to file.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub needs_amount: usize,
    pub report: PassReport,
}

pub struct SyncService<'r> {
    config: SyncConfig,
    reporter: &'r dyn StatusReporter,
}

impl<'r> SyncService<'r> {
    pub fn new(config: SyncConfig, reporter: &'r dyn StatusReporter) -> Self {
        Self { config, reporter }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Extract the whole project and write it to `path`.
    pub fn export_project<G: HostGraph>(
        &self,
        graph: &G,
        options: &ExportOptions,
        path: &Path,
    ) -> SyncResult<ExportSummary> {
        let guard = StatusGuard::new(self.reporter);
        guard.status("Starting export...");

        let extraction =
            Extractor::new(&self.config).extract(graph, ExtractScope::Project, options);
        self.finish_export(&guard, extraction.document, extraction.report, path)
    }

    /// Export the union of the named diagrams as one file.
    ///
    /// The diagrams are extracted in a single pass, so an element shown on
    /// several of them becomes one need carrying the links from all of them.
    /// Unknown diagram names are reported and skipped.
    pub fn export_diagrams<G: HostGraph>(
        &self,
        graph: &G,
        names: &[String],
        options: &ExportOptions,
        path: &Path,
    ) -> SyncResult<ExportSummary> {
        let guard = StatusGuard::new(self.reporter);
        guard.status("Starting export...");

        let diagrams = graph.diagrams().map_err(|e| {
            guard.status(&format!("Export failed: {}", e));
            SyncError::Host(e)
        })?;

        let mut report = PassReport::new();
        let mut ids = Vec::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            guard.status(&format!(
                "Processing diagram: {} ({}/{})",
                name,
                index + 1,
                names.len()
            ));
            match diagrams.iter().find(|d| &d.name == name) {
                Some(diagram) if !ids.contains(&diagram.id) => ids.push(diagram.id.clone()),
                Some(_) => {}
                None => report.element_warning(name.as_str(), "no diagram with this name"),
            }
        }

        let extraction =
            Extractor::new(&self.config).extract(graph, ExtractScope::Diagrams(&ids), options);
        report.extend(extraction.report);
        self.finish_export(&guard, extraction.document, report, path)
    }

    fn finish_export(
        &self,
        guard: &StatusGuard<'_>,
        document: NeedsDocument,
        report: PassReport,
        path: &Path,
    ) -> SyncResult<ExportSummary> {
        guard.status("Writing output file...");
        if let Err(e) = store::write_document(path, &document) {
            guard.status(&format!("Export failed: {}", e));
            return Err(e);
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        guard.status(&format!("Export completed successfully: {}", file_name));

        Ok(ExportSummary {
            path: path.to_path_buf(),
            needs_amount: document.needs_amount(),
            report,
        })
    }

    /// Read a needs file and import it into a new diagram.
    pub fn import_file<G: HostGraph>(
        &self,
        graph: &mut G,
        path: &Path,
        target: ImportTarget,
    ) -> SyncResult<ImportOutcome> {
        let guard = StatusGuard::new(self.reporter);
        guard.status("Starting import...");

        let result = store::read_document(path).and_then(|doc| {
            guard.status("Creating diagram elements...");
            let request = ImportRequest {
                target,
                source_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned()),
            };
            Importer::new(&self.config).import(graph, &doc, &request)
        });

        match &result {
            Ok(outcome) => guard.status(&format!(
                "Import completed successfully: {}",
                outcome.diagram_name
            )),
            Err(e) => guard.status(&format!("Import failed: {}", e)),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ConnectorKind, DiagramKind};
    use crate::memory::InMemoryGraph;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        messages: RefCell<Vec<String>>,
        cleared: RefCell<usize>,
    }

    impl StatusReporter for Recorder {
        fn status(&self, message: &str) {
            self.messages.borrow_mut().push(message.to_string());
        }

        fn clear(&self) {
            *self.cleared.borrow_mut() += 1;
        }
    }

    fn graph() -> InMemoryGraph {
        let mut graph = InMemoryGraph::new("Shop");
        graph.add_diagram("d1", "Billing", DiagramKind::UseCase);
        graph.add_diagram("d2", "Shipping", DiagramKind::UseCase);
        let pay = graph.add_use_case("u1", "Pay");
        let ship = graph.add_use_case("u2", "Ship");
        let clerk = graph.add_actor("a1", "Clerk");
        graph.show("d1", &pay);
        graph.show("d1", &clerk);
        graph.show("d2", &ship);
        graph.show("d2", &clerk);
        graph.connect("d1", "c1", ConnectorKind::Associate, &clerk, &pay);
        graph.connect("d2", "c2", ConnectorKind::Associate, &clerk, &ship);
        graph
    }

    #[test]
    fn test_export_reports_progress_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("needs.json");
        let recorder = Recorder::default();
        let service = SyncService::new(SyncConfig::default(), &recorder);

        let summary = service
            .export_project(&graph(), &ExportOptions::default(), &path)
            .unwrap();
        assert_eq!(summary.needs_amount, 3);
        assert_eq!(
            *recorder.messages.borrow(),
            vec![
                "Starting export...",
                "Writing output file...",
                "Export completed successfully: needs.json",
            ]
        );
        assert_eq!(*recorder.cleared.borrow(), 1);
    }

    #[test]
    fn test_export_diagrams_unions_links_across_diagrams() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.json");
        let recorder = Recorder::default();
        let service = SyncService::new(SyncConfig::default(), &recorder);

        let names = vec!["Billing".to_string(), "Shipping".to_string(), "Nope".to_string()];
        let summary = service
            .export_diagrams(&graph(), &names, &ExportOptions::default(), &path)
            .unwrap();
        assert_eq!(summary.needs_amount, 3);
        assert_eq!(summary.report.element_warnings(), 1);
        assert_eq!(recorder.messages.borrow()[2], "Processing diagram: Shipping (2/3)");

        let doc = store::read_document(&path).unwrap();
        assert_eq!(doc.project, "Billing");
        let data = doc.current().unwrap();
        assert!(data.is_consistent());
        // The clerk is shared, so it carries both diagrams' associations
        assert_eq!(
            data.get("AC_a1").unwrap().associates,
            vec!["UC_u1".to_string(), "UC_u2".to_string()]
        );
        assert_eq!(data.get("UC_u1").unwrap().associates, vec!["AC_a1".to_string()]);
        assert_eq!(data.get("UC_u2").unwrap().associates, vec!["AC_a1".to_string()]);
    }

    #[test]
    fn test_export_diagrams_keeps_colliding_user_ids_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.json");
        let service = SyncService::new(SyncConfig::default(), &LogReporter);

        let mut graph = InMemoryGraph::new("Shop");
        graph.add_diagram("d1", "Billing", DiagramKind::UseCase);
        graph.add_diagram("d2", "Shipping", DiagramKind::UseCase);
        let first = graph.add_use_case("u1", "Pay");
        let second = graph.add_use_case("u2", "Ship");
        graph.set_user_id(&first, "X");
        graph.set_user_id(&second, "X");
        graph.show("d1", &second);
        graph.show("d2", &first);
        graph.show("d2", &second);

        let names = vec!["Billing".to_string(), "Shipping".to_string()];
        service
            .export_diagrams(&graph, &names, &ExportOptions::default(), &path)
            .unwrap();

        let doc = store::read_document(&path).unwrap();
        let data = doc.current().unwrap();
        let refs: Vec<(&str, &str)> = data
            .iter()
            .map(|n| (n.id.as_str(), n.internal_ref.as_deref().unwrap()))
            .collect();
        assert_eq!(refs, vec![("X", "u1"), ("X_1", "u2")]);
    }

    #[test]
    fn test_export_of_unknown_diagrams_uses_default_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        let service = SyncService::new(SyncConfig::default(), &LogReporter);
        let options = ExportOptions {
            version: Some("  ".into()),
            ..Default::default()
        };

        let summary = service
            .export_diagrams(&graph(), &["Nope".to_string()], &options, &path)
            .unwrap();
        assert_eq!(summary.needs_amount, 0);
        assert_eq!(summary.report.element_warnings(), 1);

        let doc = store::read_document(&path).unwrap();
        assert_eq!(doc.current_version.as_deref(), Some("1.0"));
        assert_eq!(doc.project, "Shop");
        assert!(doc.current().unwrap().is_empty());
    }

    #[test]
    fn test_import_failure_is_reported_and_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let recorder = Recorder::default();
        let service = SyncService::new(SyncConfig::default(), &recorder);
        let mut graph = InMemoryGraph::new("P");

        let err = service
            .import_file(&mut graph, &path, ImportTarget::UseCaseDiagram)
            .unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
        let messages = recorder.messages.borrow();
        assert!(messages.last().unwrap().starts_with("Import failed: IO error"));
        assert_eq!(*recorder.cleared.borrow(), 1);
    }

    #[test]
    fn test_closure_reporter() {
        let seen = RefCell::new(Vec::new());
        let reporter = |message: &str| seen.borrow_mut().push(message.to_string());
        let service = SyncService::new(SyncConfig::default(), &reporter);
        let dir = tempfile::tempdir().unwrap();
        service
            .export_project(&graph(), &ExportOptions::default(), &dir.path().join("x.json"))
            .unwrap();
        assert_eq!(seen.borrow().len(), 3);
    }
}
