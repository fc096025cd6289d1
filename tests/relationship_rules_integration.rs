//! Id reconciliation and relationship direction rules, end to end.
//!
//! Run with: cargo test --test relationship_rules_integration

use needs_sync::store;
use needs_sync::{
    ConnectorKind, DiagramKind, ExportOptions, ExtractScope, Extractor, ImportRequest, Importer,
    InMemoryGraph, SyncConfig,
};

fn extract(graph: &InMemoryGraph, options: &ExportOptions) -> needs_sync::Extraction {
    Extractor::new(&SyncConfig::default()).extract(graph, ExtractScope::Project, options)
}

#[test]
fn test_colliding_user_ids_are_suffixed_in_order() {
    let mut graph = InMemoryGraph::new("P");
    let first = graph.add_use_case("u1", "First");
    let second = graph.add_use_case("u2", "Second");
    let third = graph.add_use_case("u3", "Third");
    let clerk = graph.add_actor("a1", "Clerk");
    let secure = graph.add_requirement("r1", "Secure");
    for id in [&first, &second, &third, &clerk, &secure] {
        graph.set_user_id(id, "X");
    }

    let a = extract(&graph, &ExportOptions::default()).document;
    let b = extract(&graph, &ExportOptions::default()).document;
    let data = a.current().unwrap();
    let ids: Vec<&String> = data.needs().keys().collect();
    assert_eq!(ids, vec!["X", "X_1", "X_2", "X_3", "X_4"]);
    assert_eq!(data.get("X_1").unwrap().title, "Second");
    // Suffixing ignores the element kind
    assert_eq!(data.get("X_3").unwrap().internal_ref.as_deref(), Some("a1"));
    assert_eq!(data.get("X_4").unwrap().internal_ref.as_deref(), Some("r1"));
    assert_eq!(
        ids,
        b.current().unwrap().needs().keys().collect::<Vec<_>>()
    );
}

#[test]
fn test_extend_is_recorded_on_the_base() {
    let mut graph = InMemoryGraph::new("P");
    graph.add_diagram("d1", "Main", DiagramKind::UseCase);
    let base = graph.add_use_case("base", "Checkout");
    let ext = graph.add_use_case("ext", "Gift wrap");
    graph.connect("d1", "c1", ConnectorKind::Extend, &ext, &base);

    let doc = extract(&graph, &ExportOptions::default()).document;
    let data = doc.current().unwrap();
    assert_eq!(data.get("UC_base").unwrap().extends, vec!["UC_ext".to_string()]);
    assert!(data.get("UC_ext").unwrap().extends.is_empty());

    let mut fresh = InMemoryGraph::new("Q");
    let outcome = Importer::new(&SyncConfig::default())
        .import(&mut fresh, &doc, &ImportRequest::default())
        .unwrap();
    let records = fresh.connector_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ConnectorKind::Extend);
    assert_eq!(records[0].from.as_deref(), outcome.internal_id("UC_ext"));
    assert_eq!(records[0].to.as_deref(), outcome.internal_id("UC_base"));
}

#[test]
fn test_association_is_symmetric_and_replayed_once() {
    let mut graph = InMemoryGraph::new("P");
    graph.add_diagram("d1", "Main", DiagramKind::UseCase);
    let pay = graph.add_use_case("u1", "Pay");
    let clerk = graph.add_actor("a1", "Clerk");
    graph.connect("d1", "c1", ConnectorKind::Associate, &clerk, &pay);
    // Same relationship drawn the other way round
    graph.connect("d1", "c2", ConnectorKind::Associate, &pay, &clerk);

    let doc = extract(&graph, &ExportOptions::default()).document;
    let data = doc.current().unwrap();
    assert_eq!(data.get("AC_a1").unwrap().associates, vec!["UC_u1".to_string()]);
    assert_eq!(data.get("UC_u1").unwrap().associates, vec!["AC_a1".to_string()]);

    let mut fresh = InMemoryGraph::new("Q");
    let outcome = Importer::new(&SyncConfig::default())
        .import(&mut fresh, &doc, &ImportRequest::default())
        .unwrap();
    assert_eq!(outcome.connectors_created, 1);
    assert_eq!(fresh.connector_records().len(), 1);
}

#[test]
fn test_link_to_excluded_element_is_dropped() {
    let mut graph = InMemoryGraph::new("P");
    graph.add_diagram("d1", "Main", DiagramKind::Requirements);
    let pay = graph.add_use_case("u1", "Pay");
    let secure = graph.add_requirement("r1", "Encrypt");
    graph.connect("d1", "c1", ConnectorKind::Derive, &pay, &secure);

    let options = ExportOptions {
        include_requirements: false,
        ..Default::default()
    };
    let extraction = extract(&graph, &options);
    let data = extraction.document.current().unwrap();
    assert_eq!(data.len(), 1);
    assert!(data.get("UC_u1").unwrap().derive.is_empty());
    assert_eq!(extraction.report.skipped_relationships(), 1);
    assert_eq!(extraction.report.element_warnings(), 0);
}

#[test]
fn test_connections_can_be_left_out() {
    let mut graph = InMemoryGraph::new("P");
    graph.add_diagram("d1", "Main", DiagramKind::UseCase);
    let a = graph.add_use_case("u1", "A");
    let b = graph.add_use_case("u2", "B");
    graph.connect("d1", "c1", ConnectorKind::Include, &a, &b);

    let options = ExportOptions {
        include_connections: false,
        ..Default::default()
    };
    let doc = extract(&graph, &options).document;
    assert!(doc.current().unwrap().iter().all(|n| n.link_count() == 0));
}

#[test]
fn test_empty_graph_writes_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("needs.json");
    let graph = InMemoryGraph::new("Empty");

    let extraction = extract(&graph, &ExportOptions::default());
    assert_eq!(extraction.needs_amount(), 0);
    assert!(extraction.report.is_clean());
    store::write_document(&path, &extraction.document).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["project"], "Empty");
    assert_eq!(json["current_version"], "1.0");
    assert_eq!(json["versions"]["1.0"]["needs_amount"], 0);
    assert_eq!(json["versions"]["1.0"]["needs"], serde_json::json!({}));
}
