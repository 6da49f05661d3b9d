use proptest::prelude::*;
use proptest::sample::Index;
use trellis_graph::{Entity, EntityType, Graph, Relation};
use trellis_layout::{LaneLayout, LayoutConfig, LayoutStrategy, Rect};

const KINDS: [(EntityType, &str); 5] = [
    (EntityType::Story, "S"),
    (EntityType::Task, "T"),
    (EntityType::Decision, "DEC"),
    (EntityType::Document, "DOC"),
    (EntityType::Feature, "F"),
];

/// Float slack for translated coordinates
const SLACK: f64 = 1e-6;

type Item = (usize, Index, Option<Index>);

/// Milestones `M-000..` spread over workstreams, then items whose parent and
/// dependency always point at something created earlier
fn build(lanes: &[u8], items: &[Item]) -> Graph {
    let mut ids: Vec<String> = (0..lanes.len()).map(|i| format!("M-{i:03}")).collect();
    let mut entities: Vec<Entity> = lanes
        .iter()
        .zip(&ids)
        .map(|(ws, id)| {
            Entity::new(id.as_str(), EntityType::Milestone).with_workstream(format!("ws-{ws}"))
        })
        .collect();

    for (i, (kind, parent, dep)) in items.iter().enumerate() {
        let (entity_type, prefix) = KINDS[*kind];
        let id = format!("{prefix}-{i:03}");
        let mut entity = Entity::new(id.as_str(), entity_type)
            .with(Relation::Parent, [ids[parent.index(ids.len())].as_str()]);
        if let Some(dep) = dep {
            entity = entity.with(Relation::DependsOn, [ids[dep.index(ids.len())].as_str()]);
        }
        ids.push(id);
        entities.push(entity);
    }
    Graph::from_entities(entities)
}

fn inputs() -> impl Strategy<Value = (Vec<u8>, Vec<Item>)> {
    (
        prop::collection::vec(0u8..3, 1..6),
        prop::collection::vec(
            (0..KINDS.len(), any::<Index>(), prop::option::of(any::<Index>())),
            0..30,
        ),
    )
}

proptest! {
    #[test]
    fn prop_container_members_keep_gap((lanes, items) in inputs()) {
        let graph = build(&lanes, &items);
        let config = LayoutConfig::default();
        let out = LaneLayout::with_config(config.clone()).compute(&graph);

        for container in &out.containers {
            let rects: Vec<&Rect> = std::iter::once(&container.milestone)
                .chain(&container.members)
                .filter_map(|id| out.rect(id.as_str()))
                .collect();
            prop_assert_eq!(rects.len(), container.members.len() + 1);
            for (i, a) in rects.iter().enumerate() {
                for b in &rects[i + 1..] {
                    prop_assert!(
                        !a.overlaps(b, config.item_gap - SLACK),
                        "{} overlaps {} in {}", a, b, container.milestone
                    );
                }
            }
        }
    }

    #[test]
    fn prop_containers_in_lane_disjoint((lanes, items) in inputs()) {
        let graph = build(&lanes, &items);
        let config = LayoutConfig::default();
        let out = LaneLayout::with_config(config.clone()).compute(&graph);

        for (i, a) in out.containers.iter().enumerate() {
            for b in out.containers[i + 1..].iter().filter(|b| b.workstream == a.workstream) {
                prop_assert!(!a.bounds.overlaps(&b.bounds, config.container_gap - SLACK));
            }
        }
    }

    #[test]
    fn prop_every_entity_placed_once((lanes, items) in inputs()) {
        let graph = build(&lanes, &items);
        let out = LaneLayout::new().compute(&graph);

        prop_assert_eq!(out.placed(), graph.len());
        prop_assert!(out.orphans.is_empty());
        prop_assert!(out.warnings.is_empty());
    }

    #[test]
    fn prop_layout_is_deterministic((lanes, items) in inputs()) {
        let graph = build(&lanes, &items);
        let layout = LaneLayout::new();
        prop_assert_eq!(layout.compute(&graph), layout.compute(&graph));
    }
}
