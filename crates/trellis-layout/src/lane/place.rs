//! Placement of one milestone container in local coordinates
//!
//! The milestone sits at the origin. Around it:
//!
//! ```text
//!            decisions (opposite vertical side)
//!  tasks | stories | MILESTONE | documents, features, other
//!        ↓ rows grow away from the milestone (down or up)
//! ```
//!
//! Zones never share a region, so the only overlaps left for the resolver
//! come from unusual node size settings.

use crate::config::{LayoutConfig, NodeSize};
use crate::geometry::Rect;
use std::collections::{HashMap, HashSet};
use trellis_graph::{Entity, EntityId, EntityType, Graph, Relation};

/// A node placed in a container
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placed<'g> {
    pub(crate) id: &'g EntityId,
    pub(crate) entity_type: EntityType,
    pub(crate) rect: Rect,
}

/// Vertical growth of the story rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Growth {
    Down,
    Up,
}

impl Growth {
    /// Even positions in a lane grow down, odd ones up
    pub(crate) fn for_position(position: usize) -> Self {
        if position % 2 == 0 {
            Self::Down
        } else {
            Self::Up
        }
    }

    fn flip(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
        }
    }
}

/// Columns used for a block of `count` items
pub(crate) fn columns_for(count: usize) -> usize {
    match count {
        0..=4 => 1,
        5..=8 => 2,
        _ => 3,
    }
}

/// `(column, row)` for items sorted by rank; a higher rank opens a new row
pub(crate) fn grid_cells(ranks: &[usize], columns: usize) -> Vec<(usize, usize)> {
    let columns = columns.max(1);
    let mut cells = Vec::with_capacity(ranks.len());
    let (mut col, mut row) = (0, 0);
    let mut previous: Option<usize> = None;

    for &rank in ranks {
        let new_rank = previous.is_some_and(|p| rank > p);
        if col > 0 && (col == columns || new_rank) {
            col = 0;
            row += 1;
        }
        cells.push((col, row));
        col += 1;
        previous = Some(rank);
    }
    cells
}

/// Longest `depends_on` chain within the block, cycle members count as roots
fn ranks<'g>(graph: &'g Graph, block: &[&'g Entity]) -> HashMap<&'g str, usize> {
    fn visit<'g>(
        graph: &'g Graph,
        id: &'g str,
        in_block: &HashSet<&str>,
        memo: &mut HashMap<&'g str, usize>,
        visiting: &mut HashSet<&'g str>,
    ) -> usize {
        if let Some(&rank) = memo.get(id) {
            return rank;
        }
        if !visiting.insert(id) {
            return 0;
        }
        let rank = graph
            .targets(id, Relation::DependsOn)
            .filter(|dep| in_block.contains(dep.as_str()) && dep.as_str() != id)
            .map(|dep| visit(graph, dep.as_str(), in_block, memo, visiting) + 1)
            .max()
            .unwrap_or(0);
        visiting.remove(id);
        memo.insert(id, rank);
        rank
    }

    let in_block: HashSet<&str> = block.iter().map(|e| e.id.as_str()).collect();
    let mut memo = HashMap::new();
    let mut visiting = HashSet::new();
    for entity in block {
        visit(graph, entity.id.as_str(), &in_block, &mut memo, &mut visiting);
    }
    memo
}

/// A block of same-kind items laid out as a grid
struct Block<'g> {
    items: Vec<&'g Entity>,
    ranks: Vec<usize>,
    cell: NodeSize,
}

impl<'g> Block<'g> {
    /// Sorted by dependency rank, then by `tiebreak`, then by id
    fn ranked(
        graph: &'g Graph,
        mut items: Vec<&'g Entity>,
        cell: NodeSize,
        tiebreak: impl Fn(&Entity) -> usize,
    ) -> Self {
        let ranks = ranks(graph, &items);
        let rank_of = |e: &Entity| ranks.get(e.id.as_str()).copied().unwrap_or(0);
        items.sort_by(|a, b| {
            (rank_of(*a), tiebreak(*a), &a.id).cmp(&(rank_of(*b), tiebreak(*b), &b.id))
        });
        let ranks = items.iter().map(|e| rank_of(*e)).collect();
        Self { items, ranks, cell }
    }

    /// Sorted by id, no rank rows
    fn flat(items: Vec<&'g Entity>, cell: NodeSize) -> Self {
        let ranks = vec![0; items.len()];
        Self { items, ranks, cell }
    }

    fn columns(&self) -> usize {
        columns_for(self.items.len())
    }

    /// Total width of the block
    fn width(&self, gap: f64) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        let columns = self.columns().min(self.items.len()) as f64;
        columns * self.cell.width + (columns - 1.0) * gap
    }
}

struct Frame {
    gap: f64,
    milestone: NodeSize,
}

impl Frame {
    /// Top of `row` growing away from the milestone's top or bottom edge
    fn row_y(&self, row: usize, height: f64, growth: Growth) -> f64 {
        let step = row as f64 * (height + self.gap);
        match growth {
            Growth::Down => step,
            Growth::Up => self.milestone.height - height - step,
        }
    }

    /// Top of `row` beyond the milestone's edge in the given direction
    fn outer_row_y(&self, row: usize, height: f64, growth: Growth) -> f64 {
        let step = row as f64 * (height + self.gap);
        match growth {
            Growth::Down => self.milestone.height + self.gap + step,
            Growth::Up => -self.gap - height - step,
        }
    }
}

/// Place a milestone and its subtree around the origin
pub(crate) fn place_container<'g>(
    graph: &'g Graph,
    milestone: &'g Entity,
    members: &[&'g Entity],
    growth: Growth,
    config: &LayoutConfig,
) -> Vec<Placed<'g>> {
    let gap = config.item_gap;
    let frame = Frame {
        gap,
        milestone: config.size_of(EntityType::Milestone),
    };

    let of_type = |t: EntityType| -> Vec<&'g Entity> {
        let mut items: Vec<&'g Entity> = members
            .iter()
            .copied()
            .filter(|e| e.entity_type == t)
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    };

    let stories = Block::ranked(
        graph,
        of_type(EntityType::Story),
        config.size_of(EntityType::Story),
        |_| 0,
    );
    let story_index: HashMap<&str, usize> = stories
        .items
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), i))
        .collect();
    let owner_story = |task: &Entity| -> usize {
        let mut current = task.parent();
        let mut hops = 0;
        while let Some(parent) = current {
            if let Some(&index) = story_index.get(parent.as_str()) {
                return index;
            }
            hops += 1;
            if hops > members.len() {
                break;
            }
            current = graph.get(parent.as_str()).and_then(Entity::parent);
        }
        usize::MAX
    };
    let tasks = Block::ranked(
        graph,
        of_type(EntityType::Task),
        config.size_of(EntityType::Task),
        owner_story,
    );
    let decisions = Block::flat(
        of_type(EntityType::Decision),
        config.size_of(EntityType::Decision),
    );

    let mut right_items = of_type(EntityType::Document);
    right_items.extend(of_type(EntityType::Feature));
    right_items.extend(of_type(EntityType::Other));
    let right_cell = config
        .size_of(EntityType::Document)
        .max(config.size_of(EntityType::Feature))
        .max(config.size_of(EntityType::Other));
    let right = Block::flat(right_items, right_cell);

    let mut placed = vec![Placed {
        id: &milestone.id,
        entity_type: EntityType::Milestone,
        rect: Rect::new(0.0, 0.0, frame.milestone.width, frame.milestone.height),
    }];

    // Left side, stories nearest the milestone, tasks one ring further out
    let mut left_edge = 0.0;
    for block in [&stories, &tasks] {
        if block.items.is_empty() {
            continue;
        }
        let right_x = left_edge - gap;
        push_grid(&mut placed, block, |col, row| {
            let x = right_x - (col + 1) as f64 * block.cell.width - col as f64 * gap;
            (x, frame.row_y(row, block.cell.height, growth))
        });
        left_edge = right_x - block.width(gap);
    }

    // Decisions on the stories' side, beyond the milestone's opposite edge
    push_grid(&mut placed, &decisions, |col, row| {
        let x = -gap - (col + 1) as f64 * decisions.cell.width - col as f64 * gap;
        (x, frame.outer_row_y(row, decisions.cell.height, growth.flip()))
    });

    // Documents, features and the rest opposite the stories
    let right_x = frame.milestone.width + gap;
    push_grid(&mut placed, &right, |col, row| {
        let x = right_x + col as f64 * (right.cell.width + gap);
        (x, frame.row_y(row, right.cell.height, growth))
    });

    placed
}

fn push_grid<'g>(
    placed: &mut Vec<Placed<'g>>,
    block: &Block<'g>,
    origin: impl Fn(usize, usize) -> (f64, f64),
) {
    let cells = grid_cells(&block.ranks, block.columns());
    for (entity, (col, row)) in block.items.iter().zip(cells) {
        let (x, y) = origin(col, row);
        placed.push(Placed {
            id: &entity.id,
            entity_type: entity.entity_type,
            rect: Rect::new(x, y, block.cell.width, block.cell.height),
        });
    }
}
