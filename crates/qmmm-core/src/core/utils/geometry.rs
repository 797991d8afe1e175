use crate::core::models::cell::PeriodicBox;
use nalgebra::{Point3, Vector3};

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

/// Subtracts the mean vector from every entry, leaving a set that sums to zero.
pub fn remove_mean(vectors: &mut [Vector3<f64>]) {
    if vectors.is_empty() {
        return;
    }
    let mean = vectors.iter().sum::<Vector3<f64>>() / vectors.len() as f64;
    for v in vectors.iter_mut() {
        *v -= mean;
    }
}

/// Shifts molecules into the periodic image closest to `reference` without splitting them.
///
/// `positions` is read as consecutive rigid molecules of `molecule_size` atoms. Each atom is
/// first moved by `shift`. The displacement from `reference` to the molecule's first atom
/// is then wrapped to the minimum image, and the same offset is applied to every atom of
/// that molecule, so intramolecular geometry is preserved exactly.
///
/// Atoms past the last complete molecule are dropped; callers check divisibility first.
pub fn wrap_molecules(
    positions: &[Point3<f64>],
    molecule_size: usize,
    shift: &Vector3<f64>,
    reference: &Point3<f64>,
    periodic_box: &PeriodicBox,
) -> Vec<Point3<f64>> {
    let mut wrapped = Vec::with_capacity(positions.len());
    for molecule in positions.chunks_exact(molecule_size) {
        let anchor = molecule[0] + *shift;
        let image = periodic_box.minimum_image(anchor - *reference);
        let offset = (*reference + image) - anchor;
        wrapped.extend(molecule.iter().map(|p| *p + *shift + offset));
    }
    wrapped
}

/// Geometric center of each consecutive molecule of `molecule_size` atoms.
pub fn molecule_centers(positions: &[Point3<f64>], molecule_size: usize) -> Vec<Point3<f64>> {
    positions
        .chunks_exact(molecule_size)
        .filter_map(centroid)
        .collect()
}
