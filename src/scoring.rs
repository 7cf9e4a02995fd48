use super::atom::{xs_hbond, xs_is_hydrophobic, xs_vdw_radius, XS_TYPE_SIZE};
use super::constants::{
    CUTOFF_SQR, FACTOR, NUM_SAMPLES, WEIGHT_GAUSS1, WEIGHT_GAUSS2, WEIGHT_HBOND,
    WEIGHT_HYDROPHOBIC, WEIGHT_REPULSION,
};
use super::matrix::{triangular_index, triangular_index_permissive};
use rayon::prelude::*;

/// One tabulated sample: the potential and its derivative over r, so that
/// dor * (a - b) along one Cartesian component is the energy gradient for
/// that component.
pub type Sample = [f64; 2];

/// The five-term potential of an unordered XS type pair at squared
/// distance r2, evaluated directly. The tabulated path below is what the
/// evaluator uses; this is the ground truth it samples.
pub fn score(xs1: usize, xs2: usize, r2: f64) -> f64 {
    debug_assert!(r2 <= CUTOFF_SQR);
    // Surface distance between the two van der Waals spheres.
    let d = r2.sqrt() - (xs_vdw_radius(xs1) + xs_vdw_radius(xs2));

    let g1 = 2.0 * d;
    let mut e = WEIGHT_GAUSS1 * (-g1 * g1).exp();

    let g2 = (d - 3.0) * 0.5;
    e += WEIGHT_GAUSS2 * (-g2 * g2).exp();

    if d < 0.0 {
        e += WEIGHT_REPULSION * d * d;
    }

    if xs_is_hydrophobic(xs1) && xs_is_hydrophobic(xs2) {
        e += WEIGHT_HYDROPHOBIC
            * if d <= 0.5 {
                1.0
            } else if d >= 1.5 {
                0.0
            } else {
                1.5 - d
            };
    }

    if xs_hbond(xs1, xs2) {
        e += WEIGHT_HBOND
            * if d <= -0.7 {
                1.0
            } else if d >= 0.0 {
                0.0
            } else {
                d * (-1.0 / 0.7)
            };
    }

    e
}

/// Per-type-pair tables of (e, dor) on a uniform r2 grid. Built once at
/// startup, read-only afterwards; evaluation is a single indexed load.
#[derive(Debug)]
pub struct ScoringFunction {
    tables: Vec<Vec<Sample>>,
}

/// Flat index of an unordered XS type pair.
pub fn pair_index(xs1: usize, xs2: usize) -> usize {
    triangular_index_permissive(xs1, xs2)
}

impl ScoringFunction {
    pub fn precalculate() -> ScoringFunction {
        // r values of the sample points; rs[i]^2 * FACTOR == i.
        let rs: Vec<f64> = (0..NUM_SAMPLES)
            .map(|i| (i as f64 / FACTOR).sqrt())
            .collect();

        let pairs: Vec<(usize, usize)> = (0..XS_TYPE_SIZE)
            .flat_map(|t1| (t1..XS_TYPE_SIZE).map(move |t2| (t1, t2)))
            .collect();

        let mut entries: Vec<(usize, Vec<Sample>)> = pairs
            .par_iter()
            .map(|&(t1, t2)| {
                let mut table = vec![[0.0, 0.0]; NUM_SAMPLES];
                for i in 0..NUM_SAMPLES {
                    table[i][0] = score(t1, t2, rs[i] * rs[i]);
                }
                // Backward finite difference divided by r; the endpoints
                // stay at zero.
                for i in 1..NUM_SAMPLES - 1 {
                    table[i][1] = (table[i + 1][0] - table[i][0]) / ((rs[i + 1] - rs[i]) * rs[i]);
                }
                (triangular_index(t1, t2), table)
            })
            .collect();
        entries.sort_by_key(|(index, _)| *index);

        ScoringFunction {
            tables: entries.into_iter().map(|(_, table)| table).collect(),
        }
    }

    /// Tabulated (e, dor) for a type pair at squared distance r2 < Cutoff2.
    pub fn evaluate(&self, type_pair: usize, r2: f64) -> Sample {
        debug_assert!(r2 <= CUTOFF_SQR);
        self.tables[type_pair][(r2 * FACTOR) as usize]
    }
}
