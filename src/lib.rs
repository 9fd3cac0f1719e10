//! Kinematic coupling between non-conforming 3D Finite Element meshes.
//!
//! Nodes of "embedded" Elements (reinforcement, cohesive interfaces) which lie inside a "host" mesh
//! have their DoFs expressed through the DoFs of the host Elements that contain them. Only the
//! extra (interface) Nodes of each embedded Element are tied, which allows bond-slip to be modeled.

/// Embedding of Nodes into host Elements and the resulting DoF resolution
pub mod embedding;
/// Nodes, Elements and the Model container
pub mod model;

pub use embedding::{
    apply_embedding, CohesiveElementEmbedder, EmbeddedCohesiveGrouping, EmbeddedNode,
    EmbeddingConfig, EmbeddingError, EmbeddingKinematics, EmbeddingResult,
};
pub use model::{
    cohesive::CohesiveInterface,
    element::{EmbeddedElement, FiniteElement, HostElement},
    hexa8::Hexa8,
    node::{Dof, NodalDof, Node},
    DofEnumerator, Model, ModelError,
};
