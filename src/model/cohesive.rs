use super::element::{EmbeddedElement, FiniteElement};
use super::node::Dof;
use super::ModelError;

use smallvec::SmallVec;

/// Number of structural Nodes of the 8 Node cohesive (shell/interface) family
pub const COHESIVE_STRUCTURAL_NODES: usize = 8;

/// A cohesive interface Element.
///
/// The first `structural_node_count` Nodes form the interface itself and always keep independent DoFs.
/// Any further Nodes are interface Nodes that may be tied to a host, which leaves the remaining
/// Nodes free to slip relative to the host (bond-slip modeling).
#[derive(Debug, Clone)]
pub struct CohesiveInterface {
    nodes: Vec<usize>,
    structural_node_count: usize,
    dofs: SmallVec<[Dof; 6]>,
}

impl CohesiveInterface {
    /// Construct an interface with the default number of structural Nodes and translational DoFs
    pub fn new(nodes: Vec<usize>) -> Result<Self, ModelError> {
        Self::with_structural_nodes(nodes, COHESIVE_STRUCTURAL_NODES)
    }

    pub fn with_structural_nodes(
        nodes: Vec<usize>,
        structural_node_count: usize,
    ) -> Result<Self, ModelError> {
        if nodes.len() < structural_node_count {
            return Err(ModelError::TooFewNodes {
                element_type: "CohesiveInterface",
                expected: structural_node_count,
                found: nodes.len(),
            });
        }

        Ok(Self {
            nodes,
            structural_node_count,
            dofs: SmallVec::from_slice(&Dof::TRANSLATIONS),
        })
    }

    /// Carry rotational DoFs on every Node (in addition to the translations)
    pub fn with_rotations(mut self) -> Self {
        self.dofs = Dof::TRANSLATIONS
            .iter()
            .chain(Dof::ROTATIONS.iter())
            .copied()
            .collect();
        self
    }
}

impl FiniteElement for CohesiveInterface {
    fn type_name(&self) -> &'static str {
        "CohesiveInterface"
    }

    fn node_ids(&self) -> &[usize] {
        &self.nodes
    }

    fn node_dofs(&self, _: usize) -> SmallVec<[Dof; 6]> {
        self.dofs.clone()
    }

    fn as_embedded(&self) -> Option<&dyn EmbeddedElement> {
        Some(self)
    }
}

impl EmbeddedElement for CohesiveInterface {
    fn structural_node_count(&self) -> usize {
        self.structural_node_count
    }
}
