use crate::model::node::{Dof, NodalDof};

use nalgebra::{DMatrix, Vector3};
use smallvec::SmallVec;
use std::fmt;

/// Shape Functions of a host element sampled at a single (embedded) point
///
/// * `values[a]` is N_a at the point
/// * `gradients[a]` is the gradient of N_a with respect to the real (x, y, z) coordinates
///
/// Entries are ordered by the host's local node index; `host_node_ids` carries the matching global Node IDs.
#[derive(Clone, Debug)]
pub struct ShapeFunctionEvaluation {
    pub host_node_ids: SmallVec<[usize; 8]>,
    pub values: SmallVec<[f64; 8]>,
    pub gradients: SmallVec<[Vector3<f64>; 8]>,
}

impl ShapeFunctionEvaluation {
    pub fn num_nodes(&self) -> usize {
        self.values.len()
    }

    /// Interpolate a nodal vector field at the sampled point
    pub fn interpolate(&self, nodal_values: &[Vector3<f64>]) -> Vector3<f64> {
        assert_eq!(
            nodal_values.len(),
            self.num_nodes(),
            "Number of nodal values must match the number of host nodes; Cannot interpolate!"
        );
        self.values
            .iter()
            .zip(nodal_values.iter())
            .fold(Vector3::zeros(), |acc, (n, v)| acc + v * *n)
    }
}

/// Kinematic description of how embedded Nodes follow their host.
///
/// One variant is chosen for an entire grouping run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingKinematics {
    /// Embedded translations are interpolated from host translations
    TranslationOnly,
    /// As above, plus embedded rotations equal to the local infinitesimal rotation (½ curl u) of the host
    TranslationAndRotation,
}

impl EmbeddingKinematics {
    pub const fn from_rotations(has_embedded_rotations: bool) -> Self {
        if has_embedded_rotations {
            Self::TranslationAndRotation
        } else {
            Self::TranslationOnly
        }
    }

    pub fn has_rotations(&self) -> bool {
        matches!(self, Self::TranslationAndRotation)
    }

    /// The embedded Node's DoFs which are expressed through the host (the rows of a [DofTransformation])
    pub fn embedded_dofs(&self) -> &'static [Dof] {
        match self {
            Self::TranslationOnly => &[Dof::X, Dof::Y, Dof::Z],
            Self::TranslationAndRotation => {
                &[Dof::X, Dof::Y, Dof::Z, Dof::RotX, Dof::RotY, Dof::RotZ]
            }
        }
    }

    /// Build the coefficients relating an embedded Node's DoFs to the host's translational DoFs
    pub fn transformation(&self, shape: &ShapeFunctionEvaluation) -> DofTransformation {
        let embedded_dofs: SmallVec<[Dof; 6]> = self.embedded_dofs().iter().copied().collect();
        let host_dofs: Vec<NodalDof> = shape
            .host_node_ids
            .iter()
            .flat_map(|node_id| Dof::TRANSLATIONS.map(|dof| NodalDof::new(*node_id, dof)))
            .collect();

        let mut coefficients = DMatrix::zeros(embedded_dofs.len(), host_dofs.len());

        for (a, n_a) in shape.values.iter().enumerate() {
            for axis in 0..3 {
                coefficients[(axis, 3 * a + axis)] = *n_a;
            }
        }

        if self.has_rotations() {
            //  θx = ½(∂uz/∂y − ∂uy/∂z)
            //  θy = ½(∂ux/∂z − ∂uz/∂x)
            //  θz = ½(∂uy/∂x − ∂ux/∂y)
            for (a, grad) in shape.gradients.iter().enumerate() {
                let [x, y, z] = [3 * a, 3 * a + 1, 3 * a + 2];

                coefficients[(3, z)] = 0.5 * grad.y;
                coefficients[(3, y)] = -0.5 * grad.z;

                coefficients[(4, x)] = 0.5 * grad.z;
                coefficients[(4, z)] = -0.5 * grad.x;

                coefficients[(5, y)] = 0.5 * grad.x;
                coefficients[(5, x)] = -0.5 * grad.y;
            }
        }

        DofTransformation {
            embedded_dofs,
            host_dofs,
            coefficients,
        }
    }
}

impl Default for EmbeddingKinematics {
    fn default() -> Self {
        Self::TranslationOnly
    }
}

impl fmt::Display for EmbeddingKinematics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TranslationOnly => write!(f, "translation-only"),
            Self::TranslationAndRotation => write!(f, "translation-and-rotation"),
        }
    }
}

/// Linear map from a host's DoFs to an embedded Node's DoFs
///
/// `u_embedded[r] = Σ_c coefficients[(r, c)] * u_host[c]`
#[derive(Clone, Debug)]
pub struct DofTransformation {
    /// Rows
    pub embedded_dofs: SmallVec<[Dof; 6]>,
    /// Columns
    pub host_dofs: Vec<NodalDof>,
    pub coefficients: DMatrix<f64>,
}

impl DofTransformation {
    /// Row index of an embedded [Dof] (None if that Dof is not constrained by the host)
    pub fn row_of(&self, dof: Dof) -> Option<usize> {
        self.embedded_dofs.iter().position(|d| *d == dof)
    }

    pub fn has_rotations(&self) -> bool {
        self.embedded_dofs.iter().any(|d| d.is_rotation())
    }

    /// Evaluate the embedded Node's DoF values from the host's DoF values (in column order)
    pub fn apply(&self, host_values: &[f64]) -> Vec<f64> {
        assert_eq!(
            host_values.len(),
            self.host_dofs.len(),
            "Number of host values must match the number of host DoFs; Cannot apply transformation!"
        );
        (0..self.embedded_dofs.len())
            .map(|r| {
                host_values
                    .iter()
                    .enumerate()
                    .map(|(c, u)| self.coefficients[(r, c)] * u)
                    .sum()
            })
            .collect()
    }
}
