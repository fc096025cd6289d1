//! needs-sync - model graph ↔ Sphinx-Needs JSON synchronization
//!
//! Exports use cases, actors and requirements from a host model graph to a
//! Sphinx-Needs `needs.json` document, and imports such a document back into
//! a new diagram, reusing elements that already exist.
//!
//! ## Pipeline
//! Export: host graph -> Extractor (IdReconciler + RelationshipResolver) -> NeedsDocument -> store
//! Import: store -> NeedsDocument -> validate -> Importer (LayoutEngine) -> host graph
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use needs_sync::{ExportOptions, ExtractScope, Extractor, InMemoryGraph, SyncConfig};
//!
//! let mut graph = InMemoryGraph::new("Shop");
//! graph.add_use_case("u1", "Checkout");
//! let config = SyncConfig::default();
//! let extraction = Extractor::new(&config).extract(&graph, ExtractScope::Project, &ExportOptions::default());
//! assert_eq!(extraction.needs_amount(), 1);
//! ```

// Core error handling
pub mod error;

// Configuration
pub mod config;

// Host model graph seam and the in-memory implementation
pub mod host;
pub mod memory;

// Property encodings between host codes and need strings
pub mod properties;

// Export side
pub mod extract;
pub mod reconcile;
pub mod relationships;

// Import side
pub mod import;
pub mod layout;
pub mod validate;

// Document file I/O
pub mod store;

// User-facing operations
pub mod service;
pub mod worker;

pub use needs_types::{
    Creator, IssueSeverity, LinkKind, Need, NeedType, NeedsDocument, VersionData,
};

pub use config::SyncConfig;
pub use error::{HostError, PassIssue, PassReport, SyncError, SyncResult, ValidationFailure};
pub use extract::{ExportOptions, ExtractScope, Extraction, Extractor};
pub use host::{ConnectorKind, DiagramKind, ElementKind, HostGraph};
pub use import::{ImportOutcome, ImportRequest, ImportTarget, Importer};
pub use layout::{LayoutConfig, LayoutEngine};
pub use memory::InMemoryGraph;
pub use service::{LogReporter, StatusReporter, SyncService};
pub use validate::{validate_document, ValidationIssue};
pub use worker::SyncWorker;
