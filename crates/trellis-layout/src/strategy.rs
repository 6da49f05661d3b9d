//! Layout strategy seam

use crate::output::LayoutOutput;
use trellis_graph::Graph;

/// Computes positions for every entity of a graph
///
/// Implementations must be deterministic: the same graph always yields the
/// same output.
pub trait LayoutStrategy: Send + Sync {
    /// Short name for logs and summaries
    fn name(&self) -> &'static str;

    /// Compute the layout
    fn compute(&self, graph: &Graph) -> LayoutOutput;
}

impl<S: LayoutStrategy + ?Sized> LayoutStrategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn compute(&self, graph: &Graph) -> LayoutOutput {
        (**self).compute(graph)
    }
}
