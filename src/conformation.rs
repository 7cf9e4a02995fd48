use super::qt::{Quaternion, QTN4ID};
use super::vec3::{Vec3, ZERO3};
use std::f64::consts::PI;
use std::ops;

/// Wrap an angle into [-pi, pi).
pub fn normalized_angle(x: f64) -> f64 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

/// The ligand's degrees of freedom: root anchor position, rigid-body
/// orientation, and one dihedral per active torsion.
#[derive(Debug, Clone)]
pub struct Conformation {
    pub position: Vec3,
    pub orientation: Quaternion,
    pub torsions: Vec<f64>,
}

impl Conformation {
    pub fn new(num_active_torsions: usize) -> Conformation {
        Conformation {
            position: ZERO3,
            orientation: QTN4ID,
            torsions: vec![0.0; num_active_torsions],
        }
    }
}

/// A tangent-space vector over the conformation manifold: components
/// [0, 3) are spatial, [3, 6) are an axis-angle orientation increment,
/// and [6, 6+T) are per-torsion increments. Doubles as the gradient type
/// and as BFGS scratch.
#[derive(Debug, Clone)]
pub struct Change {
    pub position: Vec3,
    pub orientation: Vec3,
    pub torsions: Vec<f64>,
}

impl Change {
    pub fn new(num_active_torsions: usize) -> Change {
        Change {
            position: ZERO3,
            orientation: ZERO3,
            torsions: vec![0.0; num_active_torsions],
        }
    }

    pub fn num_variables(&self) -> usize {
        6 + self.torsions.len()
    }

    pub fn dot(&self, other: &Change) -> f64 {
        let mut sum = self.position.dot(other.position) + self.orientation.dot(other.orientation);
        for (a, b) in self.torsions.iter().zip(other.torsions.iter()) {
            sum += a * b;
        }
        sum
    }
}

impl ops::Index<usize> for Change {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        match i {
            0..=2 => &self.position[i],
            3..=5 => &self.orientation[i - 3],
            _ => &self.torsions[i - 6],
        }
    }
}

impl ops::IndexMut<usize> for Change {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        match i {
            0..=2 => &mut self.position[i],
            3..=5 => &mut self.orientation[i - 3],
            _ => &mut self.torsions[i - 6],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_wrapping() {
        assert!((normalized_angle(0.0)).abs() < 1e-15);
        assert!((normalized_angle(3.0 * PI) - (-PI)).abs() < 1e-12);
        assert!((normalized_angle(-PI) - (-PI)).abs() < 1e-15);
        // PI itself wraps to -PI, keeping the interval half-open.
        assert!((normalized_angle(PI) - (-PI)).abs() < 1e-15);
        let x = 0.73;
        assert!((normalized_angle(x + 2.0 * PI) - x).abs() < 1e-12);
    }

    #[test]
    fn change_flat_indexing() {
        let mut g = Change::new(2);
        for i in 0..8 {
            g[i] = i as f64;
        }
        assert_eq!(Vec3::new(0.0, 1.0, 2.0), g.position);
        assert_eq!(Vec3::new(3.0, 4.0, 5.0), g.orientation);
        assert_eq!(vec![6.0, 7.0], g.torsions);
        assert_eq!(8, g.num_variables());
    }

    #[test]
    fn change_dot_spans_all_components() {
        let mut a = Change::new(1);
        let mut b = Change::new(1);
        for i in 0..7 {
            a[i] = 1.0;
            b[i] = (i + 1) as f64;
        }
        assert_eq!(28.0, a.dot(&b));
    }
}
