use super::system::SystemError;
use nalgebra::{Matrix3, Vector3};

const OFF_DIAGONAL_TOLERANCE: f64 = 1e-12;

/// Simulation cell stored as a 3x3 matrix whose rows are the cell vectors.
///
/// Any cell can be stored, but only orthorhombic (diagonal) cells can be turned into
/// lengths or a [`PeriodicBox`]. A zero cell is the default, matching a non-periodic
/// system that has never been given a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    matrix: Matrix3<f64>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            matrix: Matrix3::zeros(),
        }
    }
}

impl Cell {
    /// Creates a diagonal cell with the given edge lengths.
    pub fn orthorhombic(lengths: Vector3<f64>) -> Self {
        Self {
            matrix: Matrix3::from_diagonal(&lengths),
        }
    }

    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn is_orthorhombic(&self) -> bool {
        (0..3).all(|i| {
            (0..3)
                .filter(|&j| j != i)
                .all(|j| self.matrix[(i, j)].abs() < OFF_DIAGONAL_TOLERANCE)
        })
    }

    /// Returns the diagonal edge lengths.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::NonOrthorhombicCell`] if any off-diagonal element is non-zero.
    pub fn lengths(&self) -> Result<Vector3<f64>, SystemError> {
        if !self.is_orthorhombic() {
            return Err(SystemError::NonOrthorhombicCell);
        }
        Ok(self.matrix.diagonal())
    }
}

/// Validated orthorhombic box with per-axis periodicity, used for minimum-image wrapping.
///
/// Construction guarantees that every periodic axis has a strictly positive length, so
/// wrapping itself can never fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    lengths: Vector3<f64>,
    pbc: [bool; 3],
}

impl PeriodicBox {
    pub fn new(lengths: Vector3<f64>, pbc: [bool; 3]) -> Result<Self, SystemError> {
        for (axis, &periodic) in pbc.iter().enumerate() {
            let length = lengths[axis];
            if periodic && (length.is_nan() || length <= 0.0) {
                return Err(SystemError::NonPositiveCellLength { axis, length });
            }
        }
        Ok(Self { lengths, pbc })
    }

    /// A box with no periodic axes; wrapping is the identity.
    pub fn open() -> Self {
        Self {
            lengths: Vector3::zeros(),
            pbc: [false; 3],
        }
    }

    pub fn lengths(&self) -> &Vector3<f64> {
        &self.lengths
    }

    pub fn pbc(&self) -> [bool; 3] {
        self.pbc
    }

    /// Maps every periodic component of `d` into `[-L/2, L/2)`.
    ///
    /// Exact minimum image for orthorhombic cells. Non-periodic components are returned
    /// unchanged.
    pub fn minimum_image(&self, mut d: Vector3<f64>) -> Vector3<f64> {
        for axis in 0..3 {
            if self.pbc[axis] {
                d[axis] = wrap_component(d[axis], self.lengths[axis]);
            }
        }
        d
    }

    /// Wraps a buffer of displacement vectors in place.
    pub fn wrap(&self, displacements: &mut [Vector3<f64>]) {
        for d in displacements.iter_mut() {
            *d = self.minimum_image(*d);
        }
    }
}

#[inline]
fn wrap_component(d: f64, length: f64) -> f64 {
    let half = 0.5 * length;
    let mut folded = (d + half).rem_euclid(length);
    // rem_euclid may round up to exactly `length` for tiny negative inputs.
    if folded >= length {
        folded -= length;
    }
    folded - half
}
