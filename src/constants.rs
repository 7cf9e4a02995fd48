// Maximum distance at which the pairwise potential is evaluated, in Angstrom
pub const CUTOFF: f64 = 8.0;
pub const CUTOFF_SQR: f64 = CUTOFF * CUTOFF;

// Scoring table resolution: lookup index is floor(FACTOR * r^2)
pub const FACTOR: f64 = 256.0;

// FACTOR * CUTOFF_SQR + 1
pub const NUM_SAMPLES: usize = 16385;

// Weights of the five scoring terms
pub const WEIGHT_GAUSS1: f64 = -0.035579;
pub const WEIGHT_GAUSS2: f64 = -0.005156;
pub const WEIGHT_REPULSION: f64 = 0.840245;
pub const WEIGHT_HYDROPHOBIC: f64 = -0.035069;
pub const WEIGHT_HBOND: f64 = -0.587439;

// Grid spacing the box span is snapped up to
pub const DEFAULT_GRANULARITY: f64 = 0.15625;

// Nominal partition edge; the realized per-axis edge is extent / num_partitions
pub const PARTITION_EDGE: f64 = 3.0;

// Monte Carlo search
pub const NUM_MC_ITERATIONS: usize = 50;
pub const NUM_ALPHAS: usize = 5;
pub const LINE_SEARCH_SHRINK: f64 = 0.1;
pub const ARMIJO_C1: f64 = 1e-4;
pub const CURVATURE_C2: f64 = 0.9;

// Conformation drop bound is this many kcal/mol per heavy atom
pub const MAX_ENERGY_PER_HEAVY_ATOM: f64 = 40.0;

// Attempts at a random starting conformation before the task aborts
pub const MAX_INITIAL_CONFORMATIONS: usize = 10_000;

// Result pool
pub const DEFAULT_NUM_RESULTS: usize = 20;
pub const RESULT_RMSD: f64 = 2.0;
pub const RESULT_RMSD_SQR: f64 = RESULT_RMSD * RESULT_RMSD;

// Independent Monte Carlo tasks per ligand
pub const DEFAULT_NUM_TASKS: usize = 64;

// Default random number generator seed
pub const DEFAULT_SEED: u64 = 324_324;

// Torsion-count penalty used for the normalized output energy
pub const TORSION_PENALTY: f64 = 0.05846;
