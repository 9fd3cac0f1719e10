use nalgebra::Point3;
use std::fmt;

/// A point in 3D space, owned by the `Model`.
///
/// Elements refer to `Node`s by ID, so a single `Node` can be shared by any number of Elements
/// (including Elements which were never explicitly linked to one another).
#[derive(Debug, Clone)]
pub struct Node {
    pub id: usize,
    pub coords: Point3<f64>,
}

impl Node {
    pub fn new(id: usize, coords: Point3<f64>) -> Self {
        Self { id, coords }
    }

    pub fn at(id: usize, [x, y, z]: [f64; 3]) -> Self {
        Self {
            id,
            coords: Point3::new(x, y, z),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

/// A single nodal Degree of Freedom
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dof {
    X,
    Y,
    Z,
    RotX,
    RotY,
    RotZ,
}

impl Dof {
    pub const TRANSLATIONS: [Dof; 3] = [Dof::X, Dof::Y, Dof::Z];
    pub const ROTATIONS: [Dof; 3] = [Dof::RotX, Dof::RotY, Dof::RotZ];

    pub fn is_rotation(&self) -> bool {
        matches!(self, Self::RotX | Self::RotY | Self::RotZ)
    }

    /// Cartesian axis (0, 1 or 2) associated with this Dof
    pub fn axis(&self) -> usize {
        match self {
            Self::X | Self::RotX => 0,
            Self::Y | Self::RotY => 1,
            Self::Z | Self::RotZ => 2,
        }
    }
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
            Self::Z => write!(f, "Z"),
            Self::RotX => write!(f, "RotX"),
            Self::RotY => write!(f, "RotY"),
            Self::RotZ => write!(f, "RotZ"),
        }
    }
}

/// A [Dof] attached to a particular `Node`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodalDof {
    pub node_id: usize,
    pub dof: Dof,
}

impl NodalDof {
    pub const fn new(node_id: usize, dof: Dof) -> Self {
        Self { node_id, dof }
    }
}

impl fmt::Display for NodalDof {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Node {}: {}", self.node_id, self.dof)
    }
}
