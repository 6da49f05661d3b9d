//! Diagram materialization
//!
//! A [`Diagram`] is the read-only projection of a layout: one node per
//! entity (record key plus rect) and the routed edges. The
//! [`DiagramMaterializer`] seam persists it; [`CanvasMaterializer`] writes a
//! JSON canvas file.

use crate::error::TrellisError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use trellis_graph::{EntityId, Graph};
use trellis_layout::{LayoutOutput, Rect, RoutedEdge};
use trellis_record::RecordKey;

/// One placed entity
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramNode {
    /// Entity id
    pub id: EntityId,
    /// Backing record
    pub key: RecordKey,
    /// Final rect
    pub rect: Rect,
}

/// Everything a materializer needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    /// Placed entities, sorted by id
    pub nodes: Vec<DiagramNode>,
    /// Routed edges
    pub edges: Vec<RoutedEdge>,
}

impl Diagram {
    /// Project a layout onto the graph's records
    #[must_use]
    pub fn new(graph: &Graph, layout: &LayoutOutput) -> Self {
        let nodes = layout
            .positions
            .iter()
            .filter_map(|(id, rect)| {
                graph.get(id.as_str()).map(|entity| DiagramNode {
                    id: id.clone(),
                    key: entity.key.clone(),
                    rect: *rect,
                })
            })
            .collect();
        Self {
            nodes,
            edges: layout.edges.clone(),
        }
    }
}

/// Persists a computed diagram
#[async_trait::async_trait]
pub trait DiagramMaterializer: Send + Sync {
    /// Key the change watcher sees when the diagram is written
    ///
    /// Uses the record key convention (`/`-separated, relative to the
    /// store root) so one [`BatchGate::is_echo`](crate::BatchGate::is_echo)
    /// lookup covers records and the diagram alike.
    fn watch_key(&self) -> Option<String> {
        None
    }

    /// Replace the entity part of the diagram
    async fn apply(&self, diagram: &Diagram) -> Result<(), TrellisError>;
}

/// On-disk canvas document
#[derive(Debug, Default, Serialize, Deserialize)]
struct Canvas {
    #[serde(default)]
    nodes: Vec<Value>,
    #[serde(default)]
    edges: Vec<Value>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanvasNode<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    file: &'a str,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanvasEdge<'a> {
    id: String,
    from_node: &'a str,
    from_side: &'static str,
    to_node: &'a str,
    to_side: &'static str,
    label: &'static str,
}

/// Writes a JSON canvas file
///
/// Entity nodes and the edges between them are rewritten on every apply;
/// nodes that belong to no entity (notes, groups, links) and their edges
/// are kept.
#[derive(Debug, Clone)]
pub struct CanvasMaterializer {
    path: PathBuf,
    root: Option<PathBuf>,
}

impl CanvasMaterializer {
    /// Create materializer for a canvas file
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: None,
        }
    }

    /// Record store root the watch key is relative to
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Canvas file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Canvas, TrellisError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(Canvas::default()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                TrellisError::materialize(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Canvas::default()),
            Err(e) => Err(TrellisError::materialize(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn store(&self, canvas: &Canvas) -> Result<(), TrellisError> {
        let text = serde_json::to_string_pretty(canvas)
            .map_err(|e| TrellisError::materialize(e.to_string()))?;
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = self.path.with_file_name(format!(".{file_name}.trellis-tmp"));
        let io = |e: std::io::Error| TrellisError::materialize(format!("{}: {e}", self.path.display()));

        tokio::fs::write(&temp, text).await.map_err(io)?;
        tokio::fs::rename(&temp, &self.path).await.map_err(io)
    }
}

/// Entity-owned canvas nodes: matching id, or a file node for an entity record
fn owned_by_entities(node: &Value, ids: &HashSet<&str>, files: &HashSet<&str>) -> bool {
    let field = |name: &str| node.get(name).and_then(Value::as_str);
    field("id").is_some_and(|id| ids.contains(id))
        || (field("type") == Some("file") && field("file").is_some_and(|f| files.contains(f)))
}

#[allow(clippy::cast_possible_truncation)]
fn round(value: f64) -> i64 {
    value.round() as i64
}

#[async_trait::async_trait]
impl DiagramMaterializer for CanvasMaterializer {
    fn watch_key(&self) -> Option<String> {
        let relative = self
            .root
            .as_deref()
            .and_then(|root| self.path.strip_prefix(root).ok());
        let key = match relative {
            Some(relative) => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            None => self.path.to_string_lossy().into_owned(),
        };
        Some(key)
    }

    async fn apply(&self, diagram: &Diagram) -> Result<(), TrellisError> {
        let mut canvas = self.load().await?;

        let ids: HashSet<&str> = diagram.nodes.iter().map(|n| n.id.as_str()).collect();
        let files: HashSet<&str> = diagram.nodes.iter().map(|n| n.key.as_str()).collect();
        let removed: HashSet<String> = canvas
            .nodes
            .iter()
            .filter(|n| owned_by_entities(n, &ids, &files))
            .filter_map(|n| n.get("id").and_then(Value::as_str).map(str::to_string))
            .collect();
        canvas.nodes.retain(|n| !owned_by_entities(n, &ids, &files));
        canvas.edges.retain(|e| {
            let end = |name: &str| e.get(name).and_then(Value::as_str).unwrap_or_default();
            let touches = |id: &str| ids.contains(id) || removed.contains(id);
            !touches(end("fromNode")) && !touches(end("toNode"))
        });
        let kept = canvas.nodes.len();

        for node in &diagram.nodes {
            let value = serde_json::to_value(CanvasNode {
                id: node.id.as_str(),
                kind: "file",
                file: node.key.as_str(),
                x: round(node.rect.x),
                y: round(node.rect.y),
                width: round(node.rect.width),
                height: round(node.rect.height),
            })
            .map_err(|e| TrellisError::materialize(e.to_string()))?;
            canvas.nodes.push(value);
        }
        for edge in &diagram.edges {
            let value = serde_json::to_value(CanvasEdge {
                id: format!("{}-{}-{}", edge.from, edge.relation, edge.to),
                from_node: edge.from.as_str(),
                from_side: edge.from_side.as_str(),
                to_node: edge.to.as_str(),
                to_side: edge.to_side.as_str(),
                label: edge.relation.field_name(),
            })
            .map_err(|e| TrellisError::materialize(e.to_string()))?;
            canvas.edges.push(value);
        }

        self.store(&canvas).await?;
        tracing::info!(
            path = %self.path.display(),
            nodes = diagram.nodes.len(),
            edges = diagram.edges.len(),
            kept,
            "canvas written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_graph::{Entity, EntityType, Relation};
    use trellis_layout::{LaneLayout, LayoutStrategy, Side};

    fn diagram() -> Diagram {
        let graph = Graph::from_entities([
            Entity::new("M-001", EntityType::Milestone),
            Entity::new("S-001", EntityType::Story).with(Relation::Parent, ["M-001"]),
        ]);
        let layout = LaneLayout::new().compute(&graph);
        Diagram::new(&graph, &layout)
    }

    #[test]
    fn diagram_projects_keys() {
        let diagram = diagram();
        assert_eq!(diagram.nodes.len(), 2);
        assert_eq!(diagram.nodes[0].key.as_str(), "M-001.md");
        assert_eq!(diagram.edges[0].from_side, Side::Left);
    }

    #[tokio::test]
    async fn writes_nodes_and_keeps_notes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.canvas");
        let existing = serde_json::json!({
            "nodes": [
                {"id": "note-1", "type": "text", "text": "hello", "x": 0, "y": 0, "width": 10, "height": 10},
                {"id": "old", "type": "file", "file": "S-001.md", "x": 5, "y": 5, "width": 10, "height": 10}
            ],
            "edges": [
                {"id": "e1", "fromNode": "note-1", "toNode": "old"}
            ]
        });
        tokio::fs::write(&path, existing.to_string()).await.unwrap();

        let materializer = CanvasMaterializer::new(&path);
        materializer.apply(&diagram()).await.unwrap();

        let written: Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        let nodes = written["nodes"].as_array().unwrap();
        let ids: Vec<_> = nodes.iter().filter_map(|n| n["id"].as_str()).collect();
        assert_eq!(ids, vec!["note-1", "M-001", "S-001"]);
        assert_eq!(nodes[1]["file"], "M-001.md");
        assert_eq!(nodes[1]["width"], 320);

        let edges = written["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0]["fromNode"], "M-001");
        assert_eq!(edges[0]["fromSide"], "left");
        assert_eq!(edges[0]["toSide"], "right");
    }

    #[test]
    fn watch_key_follows_record_keys() {
        let root = Path::new("project");
        let nested = CanvasMaterializer::new(root.join("boards").join("plan.canvas")).with_root(root);
        assert_eq!(nested.watch_key().as_deref(), Some("boards/plan.canvas"));

        let outside = CanvasMaterializer::new("elsewhere.canvas").with_root(root);
        assert_eq!(outside.watch_key().as_deref(), Some("elsewhere.canvas"));
    }
}
