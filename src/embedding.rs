//! Kinematic embedding of the Nodes of one group of Elements into the Elements of another.
//!
//! The typical flow is:
//! * build a [`Model`](crate::model::Model) containing host and embedded Elements
//! * plan the embedding with [`EmbeddedCohesiveGrouping::new`], which returns the mutations as data
//! * apply them with [`EmbeddingResult::apply`] (or do both at once with [`apply_embedding`])
//! * resolve Element DoFs during assembly with [`CohesiveElementEmbedder`]

/// Assembly-time DoF resolution of Elements with embedded Nodes
pub mod embedder;
/// A Node tied to a host Element
pub mod embedded_node;
/// Host/embedded grouping and the resulting batch of mutations
pub mod grouping;
/// Coefficients relating embedded DoFs to host DoFs
pub mod transformation;

pub use embedded_node::EmbeddedNode;
pub use embedder::CohesiveElementEmbedder;
pub use grouping::{apply_embedding, ElementUpdate, EmbeddedCohesiveGrouping, EmbeddingResult};
pub use transformation::{DofTransformation, EmbeddingKinematics, ShapeFunctionEvaluation};

use crate::model::ModelError;
use thiserror::Error;

/// Default tolerance (in parametric units) for a point to be considered inside a host
pub const CONTAINMENT_TOLERANCE: f64 = 1e-6;

/// Default maximum number of Newton iterations used to find the parametric coordinates of a point
pub const MAX_NEWTON_ITERATIONS: usize = 20;

/// Settings shared by every embedding in a single grouping run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmbeddingConfig {
    pub kinematics: EmbeddingKinematics,
    /// Points whose parametric coordinates exceed 1 by less than this are still considered inside
    pub containment_tolerance: f64,
    pub max_newton_iterations: usize,
}

impl EmbeddingConfig {
    pub fn new(kinematics: EmbeddingKinematics) -> Self {
        Self {
            kinematics,
            ..Default::default()
        }
    }

    pub fn with_rotations(has_embedded_rotations: bool) -> Self {
        Self::new(EmbeddingKinematics::from_rotations(has_embedded_rotations))
    }

    pub fn containment_tolerance(mut self, tolerance: f64) -> Self {
        self.containment_tolerance = tolerance;
        self
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            kinematics: EmbeddingKinematics::TranslationOnly,
            containment_tolerance: CONTAINMENT_TOLERANCE,
            max_newton_iterations: MAX_NEWTON_ITERATIONS,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("Element {0} of the host group is not a HostElement; Cannot embed!")]
    NotHostElement(usize),
    #[error("Element {0} of the embedded group is not an EmbeddedElement; Cannot embed!")]
    NotEmbeddedElement(usize),
    #[error("Element {0} does not exist; Cannot embed!")]
    ElementDoesntExist(usize),
    #[error(transparent)]
    Model(#[from] ModelError),
}
