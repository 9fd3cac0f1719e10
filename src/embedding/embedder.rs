use super::EmbeddedNode;
use crate::model::node::NodalDof;

use nalgebra::{DMatrix, DVector};
use std::collections::BTreeMap;

/// Maps an Element's nominal DoFs onto the DoFs that are actually assembled ("superelement" DoFs).
///
/// * DoFs of Nodes without an [EmbeddedNode] are kept as they are
/// * DoFs of embedded Nodes which are constrained by the host are replaced by the host's DoFs
/// * DoFs of embedded Nodes which the host does not constrain (ex: rotations under translation-only kinematics) are kept
///
/// Because only some Nodes of an Element may be embedded, the remaining Nodes are free to slip relative to the host.
///
/// `u_element = T * u_superelement`
#[derive(Clone, Debug)]
pub struct CohesiveElementEmbedder {
    element_dofs: Vec<NodalDof>,
    superelement_dofs: Vec<NodalDof>,
    transformation: DMatrix<f64>,
}

impl CohesiveElementEmbedder {
    pub fn new(element_dofs: Vec<NodalDof>, embedded_nodes: &[EmbeddedNode]) -> Self {
        let mut superelement_dofs: Vec<NodalDof> = Vec::with_capacity(element_dofs.len());
        let mut super_idx: BTreeMap<NodalDof, usize> = BTreeMap::new();
        let mut entries: Vec<([usize; 2], f64)> = Vec::with_capacity(element_dofs.len());

        let mut index_of = |dof: NodalDof| -> usize {
            *super_idx.entry(dof).or_insert_with(|| {
                superelement_dofs.push(dof);
                superelement_dofs.len() - 1
            })
        };

        for (row, element_dof) in element_dofs.iter().enumerate() {
            let constraint = embedded_nodes
                .iter()
                .find(|en| en.node_id == element_dof.node_id)
                .and_then(|en| {
                    en.transformation
                        .row_of(element_dof.dof)
                        .map(|t_row| (en, t_row))
                });

            match constraint {
                Some((embedded_node, t_row)) => {
                    for (col, host_dof) in embedded_node.host_dofs().iter().enumerate() {
                        let coefficient = embedded_node.transformation.coefficients[(t_row, col)];
                        entries.push(([row, index_of(*host_dof)], coefficient));
                    }
                }
                None => entries.push(([row, index_of(*element_dof)], 1.0)),
            }
        }

        let mut transformation = DMatrix::zeros(element_dofs.len(), superelement_dofs.len());
        for ([row, col], value) in entries {
            transformation[(row, col)] += value;
        }

        Self {
            element_dofs,
            superelement_dofs,
            transformation,
        }
    }

    /// An embedder which keeps all DoFs of the Element
    pub fn identity(element_dofs: Vec<NodalDof>) -> Self {
        Self::new(element_dofs, &[])
    }

    /// The Element's nominal DoFs (rows of the transformation)
    pub fn element_dofs(&self) -> &[NodalDof] {
        &self.element_dofs
    }

    /// The DoFs seen by global assembly (columns of the transformation)
    pub fn superelement_dofs(&self) -> &[NodalDof] {
        &self.superelement_dofs
    }

    pub fn transformation_matrix(&self) -> &DMatrix<f64> {
        &self.transformation
    }

    /// Transform an Element matrix (ex: stiffness) into superelement DoFs: `Tᵀ K T`
    pub fn transform_matrix(&self, element_matrix: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(
            element_matrix.shape(),
            (self.element_dofs.len(), self.element_dofs.len()),
            "Element matrix does not match the Element's DoFs; Cannot transform!"
        );
        self.transformation.transpose() * element_matrix * &self.transformation
    }

    /// Compute the Element's nominal DoF values from superelement DoF values: `T u`
    pub fn transform_vector_to_element(&self, superelement_vector: &DVector<f64>) -> DVector<f64> {
        assert_eq!(
            superelement_vector.len(),
            self.superelement_dofs.len(),
            "Vector does not match the superelement DoFs; Cannot transform!"
        );
        &self.transformation * superelement_vector
    }

    /// Transform an Element vector (ex: internal forces) into superelement DoFs: `Tᵀ f`
    pub fn transform_vector_from_element(&self, element_vector: &DVector<f64>) -> DVector<f64> {
        assert_eq!(
            element_vector.len(),
            self.element_dofs.len(),
            "Vector does not match the Element's DoFs; Cannot transform!"
        );
        self.transformation.tr_mul(element_vector)
    }
}
