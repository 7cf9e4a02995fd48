use super::constants::{DEFAULT_NUM_RESULTS, RESULT_RMSD_SQR};
use super::vec3::Vec3;

/// One docked pose: total free energy, its inter-molecular part, the
/// normalized energy filled in by the driver, and the atom coordinates in
/// the ligand's original order.
#[derive(Debug, Clone)]
pub struct DockResult {
    pub e: f64,
    pub f: f64,
    pub e_nd: f64,
    pub heavy_atoms: Vec<Vec3>,
    pub hydrogens: Vec<Vec3>,
}

/// Order-aligned mean squared deviation between two poses of the same
/// ligand, over heavy atoms.
pub fn rmsd_sqr(a: &[Vec3], b: &[Vec3]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut sum = 0.0;
    for (p, q) in a.iter().zip(b.iter()) {
        sum += p.distance_sqr(*q);
    }
    sum / a.len() as f64
}

/// Bounded pool of poses kept sorted ascending by energy, where any two
/// members are either at least the RMSD threshold apart or related by the
/// energy-replacement rule.
#[derive(Debug)]
pub struct ResultContainer {
    capacity: usize,
    threshold_sqr: f64,
    results: Vec<DockResult>,
}

impl Default for ResultContainer {
    fn default() -> Self {
        ResultContainer::new(DEFAULT_NUM_RESULTS, RESULT_RMSD_SQR)
    }
}

impl ResultContainer {
    pub fn new(capacity: usize, threshold_sqr: f64) -> ResultContainer {
        ResultContainer {
            capacity,
            threshold_sqr,
            results: Vec::with_capacity(capacity + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn as_slice(&self) -> &[DockResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<DockResult> {
        self.results
    }

    /// Insert a candidate, preserving capacity, energy order and mutual
    /// diversity. A near-duplicate survives only by beating the energy of
    /// the member it duplicates; a diverse pose evicts the current worst
    /// once the pool is full.
    pub fn push(&mut self, r: DockResult) {
        if self.results.is_empty() {
            self.results.push(r);
            return;
        }

        let mut nearest = 0;
        let mut nearest_sqr = f64::INFINITY;
        for (i, s) in self.results.iter().enumerate() {
            let d = rmsd_sqr(&r.heavy_atoms, &s.heavy_atoms);
            if d < nearest_sqr {
                nearest_sqr = d;
                nearest = i;
            }
        }

        if nearest_sqr < self.threshold_sqr {
            if r.e < self.results[nearest].e {
                self.results[nearest] = r;
            } else {
                return;
            }
        } else if self.results.len() < self.capacity {
            self.results.push(r);
        } else if r.e < self.results[self.results.len() - 1].e {
            let last = self.results.len() - 1;
            self.results[last] = r;
        } else {
            return;
        }

        self.results.sort_by(|a, b| a.e.total_cmp(&b.e));
    }

    /// Fold another container into this one, keeping the invariants.
    pub fn merge(&mut self, other: ResultContainer) {
        for r in other.results {
            self.push(r);
        }
    }
}
