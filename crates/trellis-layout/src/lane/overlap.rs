//! Local overlap resolution inside one container

use super::place::Placed;

/// First pair of nodes closer than `gap`
fn first_overlap(nodes: &[Placed<'_>], gap: f64) -> Option<(usize, usize)> {
    (0..nodes.len()).find_map(|i| {
        (i + 1..nodes.len())
            .find(|&j| nodes[i].rect.overlaps(&nodes[j].rect, gap))
            .map(|j| (i, j))
    })
}

/// Push overlapping nodes apart vertically
///
/// The lower-priority node of a pair moves (the later one on a tie), just
/// below the anchor when its centre is at or below the anchor's and just
/// above it otherwise. Returns `false` when overlaps remain after
/// `iterations` moves.
pub(crate) fn resolve_overlaps(nodes: &mut [Placed<'_>], gap: f64, iterations: usize) -> bool {
    for _ in 0..iterations {
        let Some((i, j)) = first_overlap(nodes, gap) else {
            return true;
        };
        let (anchor, mover) = if nodes[j].entity_type.priority() >= nodes[i].entity_type.priority() {
            (i, j)
        } else {
            (j, i)
        };

        let anchor_rect = nodes[anchor].rect;
        let rect = &mut nodes[mover].rect;
        rect.y = if rect.center().1 >= anchor_rect.center().1 {
            anchor_rect.bottom() + gap
        } else {
            anchor_rect.y - gap - rect.height
        };
        tracing::trace!(node = %nodes[mover].id, "moved to resolve overlap");
    }
    first_overlap(nodes, gap).is_none()
}
