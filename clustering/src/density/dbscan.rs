use linfa::traits::Transformer;
use linfa_clustering::{Dbscan, DbscanParamsError};
use ndarray::ArrayView2;

/// Density clustering with a fixed neighbourhood radius. A point is a core point if at least
/// `min_points` points (itself included) lie within `tolerance`.
pub fn cluster(
    points: ArrayView2<f64>,
    min_points: usize,
    tolerance: f64,
) -> Result<Vec<Option<usize>>, DbscanParamsError> {
    let contiguous_points = points.as_standard_layout();

    let clusters = Dbscan::params(min_points)
        .tolerance(tolerance)
        .transform(&contiguous_points)?;

    Ok(clusters.to_vec())
}
