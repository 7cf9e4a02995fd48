use super::conformation::{normalized_angle, Change, Conformation};
use super::constants::{
    ARMIJO_C1, CURVATURE_C2, LINE_SEARCH_SHRINK, MAX_INITIAL_CONFORMATIONS, NUM_ALPHAS,
    NUM_MC_ITERATIONS,
};
use super::ligand::Ligand;
use super::matrix::TriangularMatrix;
use super::qt::Quaternion;
use super::receptor::Receptor;
use super::result::ResultContainer;
use super::scoring::ScoringFunction;
use super::vec3::Vec3;
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// What the optimizer needs from an energy model: evaluate a conformation
/// against an upper bound, reporting total energy, inter-molecular energy
/// and the tangent-space gradient. Returning false rejects the
/// conformation and is a control signal, not an error.
pub trait Objective {
    fn evaluate(
        &self,
        conf: &Conformation,
        e_upper_bound: f64,
        e: &mut f64,
        f: &mut f64,
        g: &mut Change,
    ) -> bool;
}

/// The docking objective: a ligand scored against the shared receptor
/// index and scoring table.
pub struct LigandObjective<'a> {
    pub ligand: &'a Ligand,
    pub scoring: &'a ScoringFunction,
    pub receptor: &'a Receptor,
}

impl Objective for LigandObjective<'_> {
    fn evaluate(
        &self,
        conf: &Conformation,
        e_upper_bound: f64,
        e: &mut f64,
        f: &mut f64,
        g: &mut Change,
    ) -> bool {
        self.ligand
            .evaluate(conf, self.scoring, self.receptor, e_upper_bound, e, f, g)
    }
}

/// The manifold step c + alpha * p: translation adds, the orientation is
/// premultiplied by the axis-angle increment and renormalized, torsions
/// add and wrap.
fn advance(base: &Conformation, alpha: f64, p: &Change) -> Conformation {
    let mut c = base.clone();
    c.position = base.position + alpha * p.position;
    c.orientation = Quaternion::from_rotation_vector(alpha * p.orientation) * base.orientation;
    c.orientation.normalize();
    for (t, torsion) in c.torsions.iter_mut().enumerate() {
        *torsion = normalized_angle(base.torsions[t] + alpha * p.torsions[t]);
    }
    c
}

/// BFGS with a Wolfe line search, from the evaluated iterate (c1, e1, f1,
/// g1) with inverse Hessian h. Runs until the line search gives up,
/// leaving the best iterate in place. h is updated rank-2 and stays
/// symmetric by construction of the packed storage.
pub fn optimize<O: Objective>(
    objective: &O,
    c1: &mut Conformation,
    e1: &mut f64,
    f1: &mut f64,
    g1: &mut Change,
    h: &mut TriangularMatrix<f64>,
) {
    let num_torsions = g1.torsions.len();
    let n = g1.num_variables();
    debug_assert_eq!(n, h.dim());

    let mut p = Change::new(num_torsions);
    let mut y = Change::new(num_torsions);
    let mut mhy = Change::new(num_torsions);
    let mut e2 = 0.0;
    let mut f2 = 0.0;
    let mut g2 = Change::new(num_torsions);

    loop {
        // Descent direction p = -H * g1.
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..n {
                sum += *h.get_permissive(i, j) * g1[j];
            }
            p[i] = -sum;
        }
        let pg1 = p.dot(g1);

        // Line search: a trial succeeds when the bounded evaluation passes
        // (which is the Armijo condition) and the slope has flattened
        // enough (the curvature condition).
        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..NUM_ALPHAS {
            let candidate = advance(c1, alpha, &p);
            if objective.evaluate(
                &candidate,
                *e1 + ARMIJO_C1 * alpha * pg1,
                &mut e2,
                &mut f2,
                &mut g2,
            ) && p.dot(&g2) >= CURVATURE_C2 * pg1
            {
                accepted = Some(candidate);
                break;
            }
            alpha *= LINE_SEARCH_SHRINK;
        }
        let c2 = match accepted {
            Some(c2) => c2,
            None => return,
        };

        // Rank-2 update of the inverse Hessian.
        for i in 0..n {
            y[i] = g2[i] - g1[i];
        }
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..n {
                sum += *h.get_permissive(i, j) * y[j];
            }
            mhy[i] = -sum;
        }
        let yhy = -y.dot(&mhy);
        let yp = y.dot(&p);
        let ryp = 1.0 / yp;
        let pco = ryp * (ryp * yhy + alpha);
        for i in 0..n {
            for j in i..n {
                *h.get_mut(i, j) += ryp * (mhy[i] * p[j] + mhy[j] * p[i]) + pco * p[i] * p[j];
            }
        }

        *c1 = c2;
        *e1 = e2;
        *f1 = f2;
        std::mem::swap(g1, &mut g2);
    }
}

/// One independent Monte Carlo task: a random start inside the box, then a
/// fixed number of mutate / locally-optimize / accept-if-better rounds.
/// Everything is driven by the task's own seeded generator, so equal seeds
/// give bit-identical containers no matter how tasks are scheduled.
pub fn monte_carlo(
    ligand: &Ligand,
    scoring: &ScoringFunction,
    receptor: &Receptor,
    seed: u64,
    container: &mut ResultContainer,
) -> Result<()> {
    let objective = LigandObjective {
        ligand,
        scoring,
        receptor,
    };
    let mut rng: StdRng = SeedableRng::seed_from_u64(seed);
    let span = receptor.search_box.span;
    let center = receptor.search_box.center;
    let num_torsions = ligand.num_active_torsions;
    let e_upper_bound = ligand.energy_upper_bound();

    // Random starting conformation; redraw while the pose is hopeless.
    let mut c0 = Conformation::new(num_torsions);
    let mut e0 = 0.0;
    let mut f0 = 0.0;
    let mut g0 = Change::new(num_torsions);
    let mut started = false;
    for _ in 0..MAX_INITIAL_CONFORMATIONS {
        c0.position = center
            + Vec3::new(
                rng.gen_range(-1.0, 1.0) * span.x,
                rng.gen_range(-1.0, 1.0) * span.y,
                rng.gen_range(-1.0, 1.0) * span.z,
            );
        let raw = Quaternion::new(
            rng.gen_range(-1.0, 1.0),
            rng.gen_range(-1.0, 1.0),
            rng.gen_range(-1.0, 1.0),
            rng.gen_range(-1.0, 1.0),
        );
        c0.orientation = match raw.normalized() {
            Ok(q) => q,
            Err(_) => continue,
        };
        for torsion in c0.torsions.iter_mut() {
            *torsion = rng.gen_range(-1.0, 1.0);
        }
        if objective.evaluate(&c0, e_upper_bound, &mut e0, &mut f0, &mut g0) {
            started = true;
            break;
        }
    }
    if !started {
        return Err(Error::Domain(
            "no viable starting conformation after repeated draws".into(),
        ));
    }
    container.push(ligand.compose_result(e0, f0, &c0));

    let mut h = TriangularMatrix::new(6 + num_torsions, 0.0);
    for _ in 0..NUM_MC_ITERATIONS {
        // Mutate the position only; BFGS moves all degrees of freedom.
        let mut c1 = c0.clone();
        c1.position += Vec3::new(
            rng.gen_range(-1.0, 1.0),
            rng.gen_range(-1.0, 1.0),
            rng.gen_range(-1.0, 1.0),
        );
        let mut e1 = 0.0;
        let mut f1 = 0.0;
        let mut g1 = Change::new(num_torsions);
        if !objective.evaluate(&c1, e_upper_bound, &mut e1, &mut f1, &mut g1) {
            continue;
        }

        h.set_identity();
        optimize(&objective, &mut c1, &mut e1, &mut f1, &mut g1, &mut h);

        // Accept only improvements.
        if e1 < e0 {
            container.push(ligand.compose_result(e1, f1, &c1));
            c0 = c1;
            e0 = e1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{Atom, AD_C, XS_C_H, XS_O_A};
    use crate::grid::SearchBox;
    use crate::ligand::Frame;
    use crate::vec3::ZERO3;

    /// f(c) = |position|^2, minimized at the origin. Orientation and
    /// torsion components carry zero gradient.
    struct Bowl;

    impl Objective for Bowl {
        fn evaluate(
            &self,
            conf: &Conformation,
            e_upper_bound: f64,
            e: &mut f64,
            f: &mut f64,
            g: &mut Change,
        ) -> bool {
            *e = conf.position.norm_sqr();
            if *e >= e_upper_bound {
                return false;
            }
            *f = *e;
            g.position = 2.0 * conf.position;
            g.orientation = ZERO3;
            true
        }
    }

    #[test]
    fn bfgs_minimizes_a_quadratic_bowl() {
        let bowl = Bowl;
        let mut c1 = Conformation::new(0);
        c1.position = Vec3::new(1.0, 1.0, 1.0);
        let mut e1 = 0.0;
        let mut f1 = 0.0;
        let mut g1 = Change::new(0);
        assert!(bowl.evaluate(&c1, f64::INFINITY, &mut e1, &mut f1, &mut g1));

        let mut h = TriangularMatrix::identity(6);
        optimize(&bowl, &mut c1, &mut e1, &mut f1, &mut g1, &mut h);

        assert!(c1.position.norm() < 1e-6, "stopped at {:?}", c1.position);
        assert!(e1 < 1e-12);
        // The orientation never moved off the identity.
        assert!(c1.orientation.is_normalized());
        assert!((c1.orientation.w - 1.0).abs() < 1e-9);
    }

    #[test]
    fn line_search_gives_up_at_a_minimum() {
        let bowl = Bowl;
        let mut c1 = Conformation::new(0);
        c1.position = ZERO3;
        let mut e1 = 0.0;
        let mut f1 = 0.0;
        let mut g1 = Change::new(0);
        assert!(bowl.evaluate(&c1, f64::INFINITY, &mut e1, &mut f1, &mut g1));
        let mut h = TriangularMatrix::identity(6);
        // Terminates immediately: no step can strictly beat the bound.
        optimize(&bowl, &mut c1, &mut e1, &mut f1, &mut g1, &mut h);
        assert_eq!(ZERO3, c1.position);
    }

    #[test]
    fn advance_wraps_torsions_and_keeps_orientation_unit() {
        let mut base = Conformation::new(1);
        base.torsions[0] = 3.0;
        let mut p = Change::new(1);
        p.torsions[0] = 1.0;
        p.orientation = Vec3::new(0.2, -0.4, 0.9);
        let c = advance(&base, 1.0, &p);
        assert!(c.torsions[0] >= -std::f64::consts::PI);
        assert!(c.torsions[0] < std::f64::consts::PI);
        assert!(c.orientation.is_normalized());
    }

    fn tiny_scene() -> (Ligand, ScoringFunction, Receptor) {
        let scoring = ScoringFunction::precalculate();
        let bx = SearchBox::with_default_granularity(ZERO3, Vec3::new(12.0, 12.0, 12.0));
        let receptor = Receptor::new(
            vec![
                Atom::new(1, "OA".into(), Vec3::new(2.5, 0.0, 0.0), 6, XS_O_A),
                Atom::new(2, "C".into(), Vec3::new(-2.5, 1.0, 0.0), AD_C, XS_C_H),
                Atom::new(3, "C".into(), Vec3::new(0.0, -2.5, 1.0), AD_C, XS_C_H),
            ],
            bx,
        );
        let heavy = vec![Atom::new(1, "C".into(), ZERO3, AD_C, XS_C_H)];
        let mut root = Frame::new(0, 0, 0, 0, 0);
        root.ha_end = 1;
        let ligand = Ligand::new(heavy, Vec::new(), vec![root], vec![Vec::new()]).unwrap();
        (ligand, scoring, receptor)
    }

    #[test]
    fn equal_seeds_give_bit_identical_results() {
        let (ligand, scoring, receptor) = tiny_scene();
        let mut a = ResultContainer::default();
        let mut b = ResultContainer::default();
        monte_carlo(&ligand, &scoring, &receptor, 17, &mut a).unwrap();
        monte_carlo(&ligand, &scoring, &receptor, 17, &mut b).unwrap();

        assert!(!a.is_empty());
        assert_eq!(a.len(), b.len());
        for (ra, rb) in a.as_slice().iter().zip(b.as_slice().iter()) {
            assert_eq!(ra.e.to_bits(), rb.e.to_bits());
            assert_eq!(ra.f.to_bits(), rb.f.to_bits());
            for (pa, pb) in ra.heavy_atoms.iter().zip(rb.heavy_atoms.iter()) {
                assert_eq!(pa.x.to_bits(), pb.x.to_bits());
                assert_eq!(pa.y.to_bits(), pb.y.to_bits());
                assert_eq!(pa.z.to_bits(), pb.z.to_bits());
            }
        }
    }

    #[test]
    fn search_produces_sorted_results() {
        let (ligand, scoring, receptor) = tiny_scene();
        let mut container = ResultContainer::default();
        monte_carlo(&ligand, &scoring, &receptor, 7, &mut container).unwrap();
        let results = container.as_slice();
        assert!(!results.is_empty());
        for w in results.windows(2) {
            assert!(w[0].e <= w[1].e);
        }
        // The pool never exceeds its capacity and every pose stays under
        // the drop bound.
        assert!(results.len() <= crate::constants::DEFAULT_NUM_RESULTS);
        for r in results {
            assert!(r.e < ligand.energy_upper_bound());
        }
    }
}
