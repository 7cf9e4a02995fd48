extern crate serde;
extern crate serde_json;

use ligdock::constants::{DEFAULT_GRANULARITY, DEFAULT_NUM_RESULTS, DEFAULT_NUM_TASKS, DEFAULT_SEED, TORSION_PENALTY};
use ligdock::grid::SearchBox;
use ligdock::pdbqt::{self, LigandFile};
use ligdock::receptor::Receptor;
use ligdock::scoring::ScoringFunction;
use ligdock::vec3::Vec3;
use ligdock::{dock, DockParams};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug)]
struct SetupFile {
    receptor: String,
    /// A .pdbqt file, or a directory screened file by file.
    ligand: String,
    center_x: f64,
    center_y: f64,
    center_z: f64,
    size_x: f64,
    size_y: f64,
    size_z: f64,
    granularity: Option<f64>,
    seed: Option<u64>,
    tasks: Option<usize>,
    poses: Option<usize>,
    out: Option<String>,
}

fn read_setup_from_file<P: AsRef<Path>>(path: P) -> Result<SetupFile, Box<dyn Error>> {
    // Open the file in read-only mode with buffer.
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    // Read the JSON contents of the file as an instance of `SetupFile`.
    let u = serde_json::from_reader(reader)?;
    Ok(u)
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    match args.len() {
        2 => {
            if let Err(why) = run(&args[1]) {
                eprintln!("Error: {}", why);
                std::process::exit(1);
            }
        }
        _ => {
            println!("Wrong command line. Usage: {} setup_filename", args[0]);
        }
    }
}

fn ligand_paths(root: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    if root.is_dir() {
        let mut paths: Vec<PathBuf> = fs::read_dir(root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|e| e == "pdbqt").unwrap_or(false))
            .collect();
        paths.sort();
        Ok(paths)
    } else {
        Ok(vec![root.to_path_buf()])
    }
}

fn run(setup_filename: &str) -> Result<(), Box<dyn Error>> {
    let setup = read_setup_from_file(setup_filename)?;

    let search_box = SearchBox::new(
        Vec3::new(setup.center_x, setup.center_y, setup.center_z),
        Vec3::new(setup.size_x, setup.size_y, setup.size_z),
        setup.granularity.unwrap_or(DEFAULT_GRANULARITY),
    );

    info!("Parsing receptor {}", setup.receptor);
    let atoms = pdbqt::parse_receptor(Path::new(&setup.receptor))?;
    info!(
        "Building receptor index over {} heavy atoms and {} partitions",
        atoms.len(),
        search_box.num_cells()
    );
    let receptor = Receptor::new(atoms, search_box);

    info!("Precalculating the scoring function");
    let scoring = ScoringFunction::precalculate();

    let params = DockParams {
        seed: setup.seed.unwrap_or(DEFAULT_SEED),
        num_tasks: setup.tasks.unwrap_or(DEFAULT_NUM_TASKS),
        num_results: setup.poses.unwrap_or(DEFAULT_NUM_RESULTS),
    };

    let out_dir = PathBuf::from(setup.out.as_deref().unwrap_or("out"));
    fs::create_dir_all(&out_dir)?;

    let paths = ligand_paths(Path::new(&setup.ligand))?;
    info!("Screening {} ligand(s)", paths.len());

    let mut summary: Vec<(String, usize, f64, f64)> = Vec::new();
    for path in &paths {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("ligand")
            .to_string();
        // A bad ligand aborts that ligand only.
        match screen(path, &receptor, &scoring, &params, &out_dir) {
            Ok(Some(row)) => {
                info!(
                    "{}: {} pose(s), best {:.3} kcal/mol (normalized {:.3})",
                    stem, row.0, row.1, row.2
                );
                summary.push((stem, row.0, row.1, row.2));
            }
            Ok(None) => info!("{}: no pose below the energy ceiling", stem),
            Err(why) => warn!("{}: {}", path.display(), why),
        }
    }

    summary.sort_by(|a, b| a.3.total_cmp(&b.3));
    let mut csv = File::create(out_dir.join("log.csv"))?;
    writeln!(csv, "ligand,poses,best_e,best_e_nd")?;
    for (stem, poses, e, e_nd) in &summary {
        writeln!(csv, "{},{},{:.3},{:.3}", stem, poses, e, e_nd)?;
    }
    info!("Wrote {} summary rows to {}", summary.len(), out_dir.join("log.csv").display());
    Ok(())
}

fn screen(
    path: &Path,
    receptor: &Receptor,
    scoring: &ScoringFunction,
    params: &DockParams,
    out_dir: &Path,
) -> Result<Option<(usize, f64, f64)>, Box<dyn Error>> {
    let parsed = LigandFile::parse(path)?;
    info!(
        "Docking {} ({} heavy atoms, {} torsions)",
        path.display(),
        parsed.ligand.num_heavy_atoms(),
        parsed.ligand.num_active_torsions
    );

    let mut results = dock(&parsed.ligand, scoring, receptor, params)?;
    if results.is_empty() {
        return Ok(None);
    }

    let penalty = 1.0 + TORSION_PENALTY * parsed.ligand.num_active_torsions as f64;
    for r in results.iter_mut() {
        r.e_nd = r.e / penalty;
    }

    let name = path.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("ligand.pdbqt"));
    parsed.save(&out_dir.join(name), &results)?;
    Ok(Some((results.len(), results[0].e, results[0].e_nd)))
}
