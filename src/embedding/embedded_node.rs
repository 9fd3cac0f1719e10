use super::transformation::DofTransformation;
use crate::model::node::{Dof, NodalDof};

#[cfg(feature = "json_export")]
use json::{object, JsonValue};
use nalgebra::Vector3;
use std::fmt;

/// A Node whose DoFs are tied to the DoFs of a host Element
///
/// Two `EmbeddedNode`s are considered equal when they refer to the same Node, regardless of host or coefficients.
#[derive(Clone, Debug)]
pub struct EmbeddedNode {
    pub node_id: usize,
    pub host_element_id: usize,
    /// Location of the Node in the host's parametric space
    pub natural_coordinates: Vector3<f64>,
    pub transformation: DofTransformation,
}

impl EmbeddedNode {
    pub fn new(
        node_id: usize,
        host_element_id: usize,
        natural_coordinates: Vector3<f64>,
        transformation: DofTransformation,
    ) -> Self {
        Self {
            node_id,
            host_element_id,
            natural_coordinates,
            transformation,
        }
    }

    pub fn embedded_dofs(&self) -> &[Dof] {
        &self.transformation.embedded_dofs
    }

    pub fn host_dofs(&self) -> &[NodalDof] {
        &self.transformation.host_dofs
    }

    /// Produce a Json Object that describes this EmbeddedNode
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        let coefficients: Vec<Vec<f64>> = self
            .transformation
            .coefficients
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        let embedded_dofs: Vec<String> =
            self.embedded_dofs().iter().map(|dof| dof.to_string()).collect();
        let host_dofs: Vec<JsonValue> = self
            .host_dofs()
            .iter()
            .map(|hd| object! { "node_id": hd.node_id, "dof": hd.dof.to_string() })
            .collect();
        let natural_coordinates: Vec<f64> = self.natural_coordinates.iter().copied().collect();

        object! {
            "node_id": self.node_id,
            "host_element_id": self.host_element_id,
            "natural_coordinates": natural_coordinates,
            "embedded_dofs": embedded_dofs,
            "host_dofs": host_dofs,
            "coefficients": coefficients,
        }
    }
}

impl PartialEq for EmbeddedNode {
    fn eq(&self, other: &Self) -> bool {
        self.node_id == other.node_id
    }
}

impl Eq for EmbeddedNode {}

impl fmt::Display for EmbeddedNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Node {} in Element {} at ({:.4}, {:.4}, {:.4})",
            self.node_id,
            self.host_element_id,
            self.natural_coordinates.x,
            self.natural_coordinates.y,
            self.natural_coordinates.z
        )
    }
}
