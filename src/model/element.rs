use super::node::{Dof, Node};
use crate::embedding::{
    transformation::ShapeFunctionEvaluation, EmbeddedNode, EmbeddingConfig,
};

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;
use std::fmt;

/// Common interface of every Element in a `Model`
///
/// Elements may additionally be able to act as hosts for embedded Nodes ([HostElement]),
/// be embedded themselves ([EmbeddedElement]), both, or neither.
/// These capabilities are exposed through `as_host` and `as_embedded`.
pub trait FiniteElement: fmt::Debug + Send + Sync {
    /// Short name of the Element type
    fn type_name(&self) -> &'static str;

    /// Global IDs of the Element's Nodes in local order
    fn node_ids(&self) -> &[usize];

    /// The DoFs carried by the Node at a local index (before any embedding is taken into account)
    fn node_dofs(&self, local_idx: usize) -> SmallVec<[Dof; 6]>;

    fn as_host(&self) -> Option<&dyn HostElement> {
        None
    }

    fn as_embedded(&self) -> Option<&dyn EmbeddedElement> {
        None
    }

    fn contains_node(&self, node_id: usize) -> bool {
        self.node_ids().contains(&node_id)
    }
}

/// An Element which can contain arbitrary points within its domain and interpolate at them
pub trait HostElement: FiniteElement {
    /// Map a real point into the Element's parametric space.
    ///
    /// Returns `None` if the point is outside of the Element (within the configured tolerance),
    /// or if its parametric coordinates cannot be found.
    ///
    /// `host_nodes` are the Element's own Nodes, in local order.
    fn natural_coordinates(
        &self,
        host_nodes: &[&Node],
        point: &Point3<f64>,
        config: &EmbeddingConfig,
    ) -> Option<Vector3<f64>>;

    /// Evaluate the shape functions (and their real-space gradients) at a point in parametric space
    fn shape_functions(
        &self,
        host_nodes: &[&Node],
        natural: &Vector3<f64>,
    ) -> Option<ShapeFunctionEvaluation>;

    /// Attempt to express `candidate` as a Node embedded in this Element.
    ///
    /// The candidate does not need to be one of the Element's own Nodes. This is a pure query.
    fn build_host_embedded_node(
        &self,
        host_id: usize,
        host_nodes: &[&Node],
        candidate: &Node,
        config: &EmbeddingConfig,
    ) -> Option<EmbeddedNode> {
        let natural = self.natural_coordinates(host_nodes, &candidate.coords, config)?;
        let shape = self.shape_functions(host_nodes, &natural)?;

        Some(EmbeddedNode::new(
            candidate.id,
            host_id,
            natural,
            config.kinematics.transformation(&shape),
        ))
    }
}

/// An Element whose trailing Nodes can be tied to host Elements
///
/// The first `structural_node_count` Nodes always keep independent DoFs;
/// the remaining ("extra" or interface) Nodes are candidates for embedding.
pub trait EmbeddedElement: FiniteElement {
    fn structural_node_count(&self) -> usize;

    /// IDs of the Nodes which are candidates for embedding
    fn extra_node_ids(&self) -> &[usize] {
        let node_ids = self.node_ids();
        &node_ids[self.structural_node_count().min(node_ids.len())..]
    }
}
