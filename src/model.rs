/// A Cohesive interface Element (embeddable)
pub mod cohesive;
/// Traits describing Elements and their embedding capabilities
pub mod element;
/// An 8 Node isoparametric hexahedron (host)
pub mod hexa8;
/// Points in Real Space and their Degrees of Freedom
pub mod node;

use crate::embedding::{CohesiveElementEmbedder, EmbeddedNode, EmbeddingKinematics};
use element::FiniteElement;
use node::{NodalDof, Node};

use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The rule used to map an Element's nominal DoFs onto the DoFs seen by global assembly
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DofEnumerator {
    /// Every Node keeps its own DoFs
    Generic,
    /// Embedded Nodes are replaced by the DoFs of their host (see [CohesiveElementEmbedder])
    Cohesive(EmbeddingKinematics),
}

impl Default for DofEnumerator {
    fn default() -> Self {
        Self::Generic
    }
}

impl fmt::Display for DofEnumerator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Cohesive(kinematics) => write!(f, "cohesive ({})", kinematics),
        }
    }
}

/// A group of Elements
#[derive(Debug, Clone)]
pub struct Subdomain {
    pub id: usize,
    element_ids: Vec<usize>,
}

impl Subdomain {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            element_ids: Vec::new(),
        }
    }

    pub fn element_ids(&self) -> &[usize] {
        &self.element_ids
    }
}

/// An Element stored in a [Model] along with its embedding state
#[derive(Debug)]
pub struct ModelElement {
    pub id: usize,
    pub subdomain_id: usize,
    element: Box<dyn FiniteElement>,
    embedded_nodes: Vec<EmbeddedNode>,
    dof_enumerator: DofEnumerator,
}

impl ModelElement {
    pub fn element(&self) -> &dyn FiniteElement {
        self.element.as_ref()
    }

    pub fn node_ids(&self) -> &[usize] {
        self.element.node_ids()
    }

    /// The Element's embedded Nodes (unique by Node)
    pub fn embedded_nodes(&self) -> &[EmbeddedNode] {
        &self.embedded_nodes
    }

    pub fn embedded_node(&self, node_id: usize) -> Option<&EmbeddedNode> {
        self.embedded_nodes.iter().find(|en| en.node_id == node_id)
    }

    pub fn has_embedded_node(&self, node_id: usize) -> bool {
        self.embedded_node(node_id).is_some()
    }

    pub fn dof_enumerator(&self) -> DofEnumerator {
        self.dof_enumerator
    }

    /// Nominal DoFs of the Element in local Node order
    pub fn element_dofs(&self) -> Vec<NodalDof> {
        self.node_ids()
            .iter()
            .enumerate()
            .flat_map(|(local_idx, node_id)| {
                self.element
                    .node_dofs(local_idx)
                    .into_iter()
                    .map(move |dof| NodalDof::new(*node_id, dof))
            })
            .collect()
    }

    // returns false (and leaves the list untouched) if the Node is already embedded
    pub(crate) fn push_embedded_node(&mut self, embedded_node: EmbeddedNode) -> bool {
        if self.embedded_nodes.contains(&embedded_node) {
            false
        } else {
            self.embedded_nodes.push(embedded_node);
            true
        }
    }

    pub(crate) fn set_dof_enumerator(&mut self, dof_enumerator: DofEnumerator) {
        self.dof_enumerator = dof_enumerator;
    }

    fn clear_embedding(&mut self) {
        self.embedded_nodes.clear();
        self.dof_enumerator = DofEnumerator::Generic;
    }
}

/// Container of the Nodes, Subdomains, and Elements of a structural model
#[derive(Debug, Default)]
pub struct Model {
    nodes: BTreeMap<usize, Node>,
    subdomains: BTreeMap<usize, Subdomain>,
    elements: BTreeMap<usize, ModelElement>,
}

impl Model {
    /// Construct a completely empty Model
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), ModelError> {
        if self.nodes.contains_key(&node.id) {
            return Err(ModelError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) -> Result<(), ModelError> {
        nodes.into_iter().try_for_each(|node| self.add_node(node))
    }

    pub fn add_subdomain(&mut self, id: usize) -> Result<(), ModelError> {
        if self.subdomains.contains_key(&id) {
            return Err(ModelError::DuplicateSubdomain(id));
        }
        self.subdomains.insert(id, Subdomain::new(id));
        Ok(())
    }

    /// Add an Element to a Subdomain. All of its Nodes must already be present in the Model.
    pub fn add_element(
        &mut self,
        id: usize,
        subdomain_id: usize,
        element: impl FiniteElement + 'static,
    ) -> Result<(), ModelError> {
        if self.elements.contains_key(&id) {
            return Err(ModelError::DuplicateElement(id));
        }
        if let Some(node_id) = element
            .node_ids()
            .iter()
            .find(|node_id| !self.nodes.contains_key(*node_id))
        {
            return Err(ModelError::NodeDoesntExist {
                element_id: id,
                node_id: *node_id,
            });
        }

        self.subdomains
            .get_mut(&subdomain_id)
            .ok_or(ModelError::SubdomainDoesntExist(subdomain_id))?
            .element_ids
            .push(id);

        self.elements.insert(
            id,
            ModelElement {
                id,
                subdomain_id,
                element: Box::new(element),
                embedded_nodes: Vec::new(),
                dof_enumerator: DofEnumerator::Generic,
            },
        );

        Ok(())
    }

    // ----------------------------------------------------------------------------------------------------
    // General Data Retrieval
    // ----------------------------------------------------------------------------------------------------

    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Iterate over all `Node`s in the Model
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn element(&self, id: usize) -> Option<&ModelElement> {
        self.elements.get(&id)
    }

    pub(crate) fn element_mut(&mut self, id: usize) -> Option<&mut ModelElement> {
        self.elements.get_mut(&id)
    }

    /// Iterate over all Elements in the Model (ordered by ID)
    pub fn elements(&self) -> impl Iterator<Item = &ModelElement> + '_ {
        self.elements.values()
    }

    /// Iterate over all `Subdomain`s in the Model
    pub fn subdomains(&self) -> impl Iterator<Item = &Subdomain> + '_ {
        self.subdomains.values()
    }

    /// Iterate over the Elements of a `Subdomain` in insertion order
    pub fn elements_in(
        &self,
        subdomain_id: usize,
    ) -> Result<impl Iterator<Item = &ModelElement> + '_, ModelError> {
        let subdomain = self
            .subdomains
            .get(&subdomain_id)
            .ok_or(ModelError::SubdomainDoesntExist(subdomain_id))?;

        Ok(subdomain
            .element_ids
            .iter()
            .filter_map(|element_id| self.elements.get(element_id)))
    }

    /// Get the `Node`s of an Element in local order
    pub fn element_nodes(&self, element_id: usize) -> Result<SmallVec<[&Node; 8]>, ModelError> {
        let element = self
            .element(element_id)
            .ok_or(ModelError::ElementDoesntExist(element_id))?;

        element
            .node_ids()
            .iter()
            .map(|node_id| {
                self.node(*node_id).ok_or(ModelError::NodeDoesntExist {
                    element_id,
                    node_id: *node_id,
                })
            })
            .collect()
    }

    /// Build the DoF resolution of an Element according to its [DofEnumerator]
    ///
    /// Generic Elements resolve to the identity; cohesive Elements have their embedded Nodes replaced by host DoFs.
    /// The embedded Nodes of a cohesive Element must have been built with the enumerator's kinematics.
    pub fn element_embedder(&self, element_id: usize) -> Result<CohesiveElementEmbedder, ModelError> {
        let element = self
            .element(element_id)
            .ok_or(ModelError::ElementDoesntExist(element_id))?;

        Ok(match element.dof_enumerator() {
            DofEnumerator::Generic => CohesiveElementEmbedder::identity(element.element_dofs()),
            DofEnumerator::Cohesive(kinematics) => {
                debug_assert!(
                    element
                        .embedded_nodes()
                        .iter()
                        .all(|en| en.embedded_dofs() == kinematics.embedded_dofs()),
                    "Embedded Nodes of Element {} were not built with {} kinematics; Cannot build embedder!",
                    element_id,
                    kinematics
                );
                CohesiveElementEmbedder::new(element.element_dofs(), element.embedded_nodes())
            }
        })
    }

    /// Remove all embedded Nodes and restore generic DoF enumeration on every Element
    ///
    /// Embedding is not updated incrementally: after changing the mesh, reset and re-run the grouping.
    pub fn reset_embedding(&mut self) {
        self.elements
            .values_mut()
            .for_each(ModelElement::clear_embedding);
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Node {0} already exists; Cannot add Node!")]
    DuplicateNode(usize),
    #[error("Element {0} already exists; Cannot add Element!")]
    DuplicateElement(usize),
    #[error("Subdomain {0} already exists; Cannot add Subdomain!")]
    DuplicateSubdomain(usize),
    #[error("Subdomain {0} does not exist!")]
    SubdomainDoesntExist(usize),
    #[error("Element {0} does not exist!")]
    ElementDoesntExist(usize),
    #[error("Node {node_id} of Element {element_id} does not exist!")]
    NodeDoesntExist { element_id: usize, node_id: usize },
    #[error("{element_type} requires at least {expected} Nodes, but {found} were given; Cannot construct Element!")]
    TooFewNodes {
        element_type: &'static str,
        expected: usize,
        found: usize,
    },
}
