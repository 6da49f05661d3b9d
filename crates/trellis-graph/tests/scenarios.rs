use pretty_assertions::assert_eq;
use trellis_graph::prelude::*;
use trellis_record::{Document, RawRecord};

fn record(key: &str, text: &str) -> RawRecord {
    Document::parse(text).unwrap().to_record(key)
}

fn apply(records: &mut [RawRecord], plan: &Plan) -> Graph {
    plan.apply_to(records);
    GraphBuilder::new().build(records)
}

#[test]
fn affects_and_legacy_enables_yield_single_decided_by() {
    let mut records = vec![
        record(
            "decisions/DEC-001.md",
            "---\nid: DEC-001\naffects: [F-010]\nenables:\n  - F-010\n---\n",
        ),
        record("features/F-010.md", "---\nid: F-010\ndecided_by: []\n---\n"),
    ];
    let graph = GraphBuilder::new().build(&records);

    let plan = Reconciler::default().restore_bidirectional(&graph);
    let graph = apply(&mut records, &plan);

    let decided: Vec<_> = graph
        .get("F-010")
        .unwrap()
        .related(Relation::DecidedBy)
        .map(EntityId::as_str)
        .collect();
    assert_eq!(decided, vec!["DEC-001"]);
    assert_eq!(records[1].items("decided_by"), vec!["DEC-001"]);
}

#[test]
fn task_cycle_untouched_by_milestone_filter() {
    let records = vec![
        record("T-001.md", "---\nid: T-001\ndepends_on: [\"T-002\"]\n---\n"),
        record("T-002.md", "---\nid: T-002\ndepends_on: [\"T-003\"]\n---\n"),
        record("T-003.md", "---\nid: T-003\ndepends_on: [\"T-001\"]\n---\n"),
    ];
    let graph = GraphBuilder::new().build(&records);

    let plan = Reconciler::default().break_cycles(&graph);

    assert_eq!(plan.cycles.len(), 0);
    assert!(plan.is_empty());
}

#[test]
fn migrate_then_restore_converges() {
    let mut records = vec![
        record("DEC-002.md", "---\nid: DEC-002\nenables: [F-020, F-021]\n---\n# Pick a store\n"),
        record("F-020.md", "---\nid: F-020\nenabled_by: DEC-002\n---\n"),
        record("F-021.md", "---\nid: F-021\n---\n"),
    ];
    let reconciler = Reconciler::default();

    let graph = GraphBuilder::new().build(&records);
    let migrated = reconciler.migrate_legacy(&graph);
    let graph = apply(&mut records, &migrated);

    let restored = reconciler.restore_bidirectional(&graph);
    assert_eq!(restored.edges_added(), 1);
    let graph = apply(&mut records, &restored);

    assert!(records[0].get("enables").is_none());
    assert!(records[1].get("enabled_by").is_none());
    assert!(graph.get("F-021").unwrap().has(Relation::DecidedBy, "DEC-002"));
    assert_eq!(graph.get("DEC-002").unwrap().title.as_deref(), Some("Pick a store"));
    assert!(reconciler.restore_bidirectional(&graph).is_empty());
}

#[test]
fn full_pipeline_on_small_project() {
    let mut records = vec![
        record("M-001.md", "---\nid: M-001\nworkstream: eng\nchildren: [S-001, S-002, T-001]\n---\n"),
        record("S-001.md", "---\nid: S-001\nparent: M-001\nchildren: [T-001]\n---\n"),
        record("S-002.md", "---\nid: S-002\nparent: M-001\ndepends_on: [S-001]\n---\n"),
        record("T-001.md", "---\nid: T-001\nparent: S-001\n---\n"),
        record("M-002.md", "---\nid: M-002\nworkstream: eng\ndepends_on: [M-001]\nblocks: [M-001]\n---\n"),
    ];
    let reconciler = Reconciler::default();

    let graph = GraphBuilder::new().build(&records);
    let restored = reconciler.restore_bidirectional(&graph);
    let graph = apply(&mut records, &restored);
    assert!(graph.get("S-001").unwrap().has(Relation::Blocks, "S-002"));

    let reduced = reconciler.reduce_transitive(&graph);
    // T-001 has no dependents, so M-001 keeps it as a child
    assert_eq!(reduced.edges_removed(), 0);

    let cycles = reconciler.break_cycles(&graph);
    assert_eq!(cycles.cycles.len(), 1);
    let graph = apply(&mut records, &cycles);
    assert!(reconciler.break_cycles(&graph).cycles.is_empty());
}
