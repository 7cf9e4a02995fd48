#[macro_use]
extern crate lazy_static;

pub mod atom;
pub mod conformation;
pub mod constants;
pub mod error;
pub mod grid;
pub mod ligand;
pub mod matrix;
pub mod pdbqt;
pub mod qt;
pub mod receptor;
pub mod result;
pub mod scoring;
pub mod search;
pub mod vec3;

use constants::{DEFAULT_NUM_RESULTS, DEFAULT_NUM_TASKS, DEFAULT_SEED, RESULT_RMSD_SQR};
use error::Result;
use ligand::Ligand;
use log::warn;
use rayon::prelude::*;
use receptor::Receptor;
use result::{DockResult, ResultContainer};
use scoring::ScoringFunction;
use search::monte_carlo;

/// Knobs of a per-ligand docking run. Tasks are independent Monte Carlo
/// searches; task i draws from seed + i, so a run is reproducible for any
/// worker count.
#[derive(Debug, Clone, Copy)]
pub struct DockParams {
    pub seed: u64,
    pub num_tasks: usize,
    pub num_results: usize,
}

impl Default for DockParams {
    fn default() -> Self {
        DockParams {
            seed: DEFAULT_SEED,
            num_tasks: DEFAULT_NUM_TASKS,
            num_results: DEFAULT_NUM_RESULTS,
        }
    }
}

/// Dock one ligand: fan the Monte Carlo tasks over the rayon pool against
/// the shared read-only receptor index and scoring table, then fold the
/// per-task containers in task order. Fails only if every task failed; an
/// empty outcome means no pose beat the energy ceiling.
pub fn dock(
    ligand: &Ligand,
    scoring: &ScoringFunction,
    receptor: &Receptor,
    params: &DockParams,
) -> Result<Vec<DockResult>> {
    let containers: Vec<Result<ResultContainer>> = (0..params.num_tasks)
        .into_par_iter()
        .map(|i| {
            let mut container = ResultContainer::new(params.num_results, RESULT_RMSD_SQR);
            monte_carlo(
                ligand,
                scoring,
                receptor,
                params.seed.wrapping_add(i as u64),
                &mut container,
            )?;
            Ok(container)
        })
        .collect();

    let mut merged = ResultContainer::new(params.num_results, RESULT_RMSD_SQR);
    let mut first_error = None;
    let mut failures = 0;
    for outcome in containers {
        match outcome {
            Ok(container) => merged.merge(container),
            Err(why) => {
                warn!("docking task aborted: {}", why);
                failures += 1;
                if first_error.is_none() {
                    first_error = Some(why);
                }
            }
        }
    }
    if let Some(why) = first_error {
        if failures == params.num_tasks {
            return Err(why);
        }
    }
    Ok(merged.into_results())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{Atom, AD_C, XS_C_H, XS_O_A};
    use crate::grid::SearchBox;
    use crate::ligand::Frame;
    use crate::vec3::{Vec3, ZERO3};

    fn scene() -> (Ligand, ScoringFunction, Receptor) {
        let scoring = ScoringFunction::precalculate();
        let bx = SearchBox::with_default_granularity(ZERO3, Vec3::new(12.0, 12.0, 12.0));
        let receptor = Receptor::new(
            vec![
                Atom::new(1, "OA".into(), Vec3::new(2.0, 0.5, 0.0), 6, XS_O_A),
                Atom::new(2, "C".into(), Vec3::new(-2.0, 0.0, 1.0), AD_C, XS_C_H),
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
    fn dock_merges_tasks_into_a_sorted_pool() {
        let (ligand, scoring, receptor) = scene();
        let params = DockParams {
            seed: 5,
            num_tasks: 4,
            num_results: 10,
        };
        let results = dock(&ligand, &scoring, &receptor, &params).unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= 10);
        for w in results.windows(2) {
            assert!(w[0].e <= w[1].e);
        }
    }

    #[test]
    fn dock_is_reproducible_across_runs() {
        let (ligand, scoring, receptor) = scene();
        let params = DockParams {
            seed: 99,
            num_tasks: 3,
            num_results: 5,
        };
        let a = dock(&ligand, &scoring, &receptor, &params).unwrap();
        let b = dock(&ligand, &scoring, &receptor, &params).unwrap();
        assert_eq!(a.len(), b.len());
        for (ra, rb) in a.iter().zip(b.iter()) {
            assert_eq!(ra.e.to_bits(), rb.e.to_bits());
        }
    }
}
