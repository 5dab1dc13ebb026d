use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

/// Result of optimally superposing a target structure onto a reference.
#[derive(Debug, Clone, Copy)]
pub struct Superposition {
    pub rotation: Rotation3<f64>,
    pub reference_centroid: Point3<f64>,
    pub target_centroid: Point3<f64>,
    pub rmsd: f64,
}

impl Superposition {
    /// Maps a point from the target frame into the reference frame.
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.reference_centroid + self.rotation * (point - self.target_centroid)
    }
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

pub fn centroid(coords: &[Point3<f64>]) -> Option<Point3<f64>> {
    if coords.is_empty() {
        return None;
    }
    let sum = coords
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / coords.len() as f64))
}

/// Kabsch superposition of `target` onto `reference` (same atom order).
///
/// Returns `None` for empty or mismatched inputs, or if the SVD of the
/// covariance matrix cannot be computed.
pub fn superpose(reference: &[Point3<f64>], target: &[Point3<f64>]) -> Option<Superposition> {
    if reference.len() != target.len() || reference.is_empty() {
        return None;
    }
    let reference_centroid = centroid(reference)?;
    let target_centroid = centroid(target)?;

    let mut covariance = Matrix3::<f64>::zeros();
    for (p, q) in reference.iter().zip(target.iter()) {
        let p = p - reference_centroid;
        let q = q - target_centroid;
        covariance += q * p.transpose();
    }

    let svd = covariance.svd(true, true);
    let u = svd.u?;
    let v = svd.v_t?.transpose();
    let d = (v * u.transpose()).determinant().signum();
    let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d));
    let rotation = Rotation3::from_matrix_unchecked(v * correction * u.transpose());

    let mut superposition = Superposition {
        rotation,
        reference_centroid,
        target_centroid,
        rmsd: 0.0,
    };
    let moved: Vec<Point3<f64>> = target.iter().map(|q| superposition.apply(q)).collect();
    superposition.rmsd = calculate_rmsd(reference, &moved)?;
    Some(superposition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Unit;

    fn f_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sample() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(2.0, 1.4, 0.0),
            Point3::new(3.4, 1.5, 0.8),
            Point3::new(-0.6, -0.9, 0.4),
        ]
    }

    #[test]
    fn calculate_rmsd_of_identical_sets_is_zero() {
        let coords = sample();
        assert!(f_eq(calculate_rmsd(&coords, &coords).unwrap(), 0.0));
    }

    #[test]
    fn calculate_rmsd_rejects_mismatched_lengths() {
        let coords = sample();
        assert!(calculate_rmsd(&coords, &coords[..2]).is_none());
        assert!(calculate_rmsd(&[], &[]).is_none());
    }

    #[test]
    fn calculate_rmsd_of_uniform_shift() {
        let coords = sample();
        let shifted: Vec<_> = coords.iter().map(|p| p + Vector3::new(0.0, 2.0, 0.0)).collect();
        assert!(f_eq(calculate_rmsd(&coords, &shifted).unwrap(), 2.0));
    }

    #[test]
    fn centroid_is_mean_position() {
        let c = centroid(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, -2.0)]).unwrap();
        assert_eq!(c, Point3::new(1.0, 2.0, -1.0));
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn superpose_recovers_rigid_motion() {
        let reference = sample();
        let rotation = Rotation3::from_axis_angle(
            &Unit::new_normalize(Vector3::new(0.3, -1.0, 0.5)),
            1.1,
        );
        let target: Vec<_> = reference
            .iter()
            .map(|p| rotation * p + Vector3::new(4.0, -3.0, 7.5))
            .collect();

        let fit = superpose(&reference, &target).unwrap();
        assert!(fit.rmsd < 1e-9, "rmsd was {}", fit.rmsd);
        for (p, q) in reference.iter().zip(target.iter()) {
            assert!((fit.apply(q) - p).norm() < 1e-9);
        }
    }

    #[test]
    fn superpose_does_not_reflect() {
        let reference = sample();
        let mirrored: Vec<_> = reference.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();
        let fit = superpose(&reference, &mirrored).unwrap();
        assert!(f_eq(fit.rotation.matrix().determinant(), 1.0));
        assert!(fit.rmsd > 1e-3);
    }

    #[test]
    fn superpose_reports_residual_distortion() {
        let reference = sample();
        let mut distorted = reference.clone();
        distorted[3] += Vector3::new(0.0, 0.0, 1.0);
        let fit = superpose(&reference, &distorted).unwrap();
        let naive = calculate_rmsd(&reference, &distorted).unwrap();
        assert!(fit.rmsd > 0.0);
        assert!(fit.rmsd <= naive + 1e-12);
    }
}
