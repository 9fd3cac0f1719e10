use super::element::{FiniteElement, HostElement};
use super::node::{Dof, Node};
use crate::embedding::{transformation::ShapeFunctionEvaluation, EmbeddingConfig};

use nalgebra::{Matrix3, Point3, Vector3};
use smallvec::SmallVec;

/// Parametric coordinates of the 8 corner Nodes
///
/// ```text
///        7-----------6
///       /|          /|
///      4-----------5 |
///      | |         | |      ζ
///      | 3---------|-2      |  η
///      |/          |/       | /
///      0-----------1        |/___ ξ
/// ```
pub const HEXA8_NODE_NATURAL: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Convergence threshold for the parametric inversion (in parametric units)
const NEWTON_TOLERANCE: f64 = 1e-12;

/// Largest accepted distance between a point and the image of its parametric coordinates
/// (relative to the size of the Element)
const RESIDUAL_TOLERANCE: f64 = 1e-8;

/// An 8 Node isoparametric hexahedron with trilinear shape functions.
///
/// Carries 3 translational DoFs per Node and can host embedded Nodes.
#[derive(Debug, Clone)]
pub struct Hexa8 {
    pub nodes: [usize; 8],
}

impl Hexa8 {
    pub fn new(nodes: [usize; 8]) -> Self {
        Self { nodes }
    }

    /// Trilinear shape function values at (ξ, η, ζ)
    pub fn shape_values(natural: &Vector3<f64>) -> [f64; 8] {
        HEXA8_NODE_NATURAL.map(|[xi_a, eta_a, zeta_a]| {
            0.125
                * (1.0 + natural.x * xi_a)
                * (1.0 + natural.y * eta_a)
                * (1.0 + natural.z * zeta_a)
        })
    }

    /// Derivatives of the shape functions with respect to (ξ, η, ζ)
    pub fn shape_derivatives(natural: &Vector3<f64>) -> [Vector3<f64>; 8] {
        let [xi, eta, zeta] = [natural.x, natural.y, natural.z];
        HEXA8_NODE_NATURAL.map(|[xi_a, eta_a, zeta_a]| {
            Vector3::new(
                0.125 * xi_a * (1.0 + eta * eta_a) * (1.0 + zeta * zeta_a),
                0.125 * eta_a * (1.0 + xi * xi_a) * (1.0 + zeta * zeta_a),
                0.125 * zeta_a * (1.0 + xi * xi_a) * (1.0 + eta * eta_a),
            )
        })
    }

    // Node positions relative to the first Node
    fn relative_positions(host_nodes: &[&Node]) -> SmallVec<[Vector3<f64>; 8]> {
        let origin = host_nodes[0].coords;
        host_nodes.iter().map(|node| node.coords - origin).collect()
    }

    // position of a parametric point (in the frame of `positions`)
    fn real_point(positions: &[Vector3<f64>], natural: &Vector3<f64>) -> Vector3<f64> {
        Self::shape_values(natural)
            .iter()
            .zip(positions.iter())
            .fold(Vector3::zeros(), |acc, (n, x)| acc + x * *n)
    }

    // J[(j, i)] = ∂x_j / ∂ξ_i
    fn jacobian(positions: &[Vector3<f64>], natural: &Vector3<f64>) -> Matrix3<f64> {
        Self::shape_derivatives(natural)
            .iter()
            .zip(positions.iter())
            .fold(Matrix3::zeros(), |acc, (dn, x)| acc + x * dn.transpose())
    }

    // length of the bounding box diagonal
    fn size(positions: &[Vector3<f64>]) -> f64 {
        let (min, max) = positions.iter().fold(
            (Vector3::repeat(f64::INFINITY), Vector3::repeat(f64::NEG_INFINITY)),
            |(min, max), x| (min.inf(x), max.sup(x)),
        );
        (max - min).norm()
    }

    fn in_bounding_box(host_nodes: &[&Node], point: &Point3<f64>, tolerance: f64) -> bool {
        (0..3).all(|axis| {
            let (min, max) = host_nodes.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(min, max), node| (min.min(node.coords[axis]), max.max(node.coords[axis])),
            );
            let slack = tolerance * (max - min);
            point[axis] >= min - slack && point[axis] <= max + slack
        })
    }
}

impl FiniteElement for Hexa8 {
    fn type_name(&self) -> &'static str {
        "Hexa8"
    }

    fn node_ids(&self) -> &[usize] {
        &self.nodes
    }

    fn node_dofs(&self, _: usize) -> SmallVec<[Dof; 6]> {
        SmallVec::from_slice(&Dof::TRANSLATIONS)
    }

    fn as_host(&self) -> Option<&dyn HostElement> {
        Some(self)
    }
}

impl HostElement for Hexa8 {
    fn natural_coordinates(
        &self,
        host_nodes: &[&Node],
        point: &Point3<f64>,
        config: &EmbeddingConfig,
    ) -> Option<Vector3<f64>> {
        if host_nodes.len() != 8
            || !Self::in_bounding_box(host_nodes, point, config.containment_tolerance)
        {
            return None;
        }

        // work relative to the first Node so that roundoff scales with the Element, not its location
        let positions = Self::relative_positions(host_nodes);
        let target = point - host_nodes[0].coords;
        let size = Self::size(&positions);
        let max_residual = RESIDUAL_TOLERANCE * size;

        let mut natural = Vector3::zeros();
        for _ in 0..config.max_newton_iterations {
            let residual = Self::real_point(&positions, &natural) - target;
            if residual.norm() <= f64::EPSILON * size {
                break;
            }

            let step = Self::jacobian(&positions, &natural).lu().solve(&residual)?;
            natural -= step;

            if step.norm() < NEWTON_TOLERANCE {
                break;
            }
        }

        // the final iterate must actually map onto the point
        if (Self::real_point(&positions, &natural) - target).norm() > max_residual {
            return None;
        }

        let limit = 1.0 + config.containment_tolerance;
        if natural.iter().all(|c| c.abs() <= limit) {
            Some(natural)
        } else {
            None
        }
    }

    fn shape_functions(
        &self,
        host_nodes: &[&Node],
        natural: &Vector3<f64>,
    ) -> Option<ShapeFunctionEvaluation> {
        if host_nodes.len() != 8 {
            return None;
        }

        let jac_inv_t = Self::jacobian(&Self::relative_positions(host_nodes), natural)
            .try_inverse()?
            .transpose();

        Some(ShapeFunctionEvaluation {
            host_node_ids: SmallVec::from_slice(&self.nodes),
            values: SmallVec::from_slice(&Self::shape_values(natural)),
            gradients: Self::shape_derivatives(natural)
                .iter()
                .map(|dn| jac_inv_t * dn)
                .collect(),
        })
    }
}
