use super::atom::{ad_to_xs, parse_ad_type, Atom};
use super::ligand::{Frame, Ligand};
use super::result::DockResult;
use super::vec3::Vec3;
use crate::error::{Error, Result};
use log::warn;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One parsed ATOM/HETATM record. The residue tag is chain id plus
/// residue sequence number, which is all the receptor ingestor groups by.
struct AtomRecord {
    serial: usize,
    name: String,
    residue: String,
    coord: Vec3,
    ad: usize,
}

fn field(line: &str, lo: usize, hi: usize) -> &str {
    let hi = hi.min(line.len());
    if lo >= hi {
        ""
    } else {
        &line[lo..hi]
    }
}

fn parse_atom_record(line: &str, origin: &Path, line_no: usize) -> Result<AtomRecord> {
    if !line.is_ascii() {
        return Err(Error::parse(origin, line_no, "non-ASCII atom record"));
    }
    if line.len() < 78 {
        return Err(Error::parse(origin, line_no, "atom record too short"));
    }
    let serial = field(line, 6, 11)
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::parse(origin, line_no, "malformed serial number"))?;
    let name = field(line, 12, 16).trim().to_string();
    let residue = field(line, 21, 26).to_string();
    let mut coord = Vec3::default();
    for (k, range) in [(30, 38), (38, 46), (46, 54)].iter().enumerate() {
        coord[k] = field(line, range.0, range.1)
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::parse(origin, line_no, "malformed coordinate"))?;
    }
    if !coord.is_finite() {
        return Err(Error::parse(origin, line_no, "non-finite coordinate"));
    }
    let ad_string = field(line, 77, 79).trim();
    let ad = parse_ad_type(ad_string).ok_or_else(|| {
        Error::parse(
            origin,
            line_no,
            format!("unknown AutoDock type {:?}", ad_string),
        )
    })?;
    Ok(AtomRecord {
        serial,
        name,
        residue,
        coord,
        ad,
    })
}

/// Parse a receptor PDBQT into its heavy atoms. Non-polar hydrogens are
/// dropped; polar hydrogens promote their bonded hetero atom to donor and
/// are dropped too; a carbon bonded to a hetero atom of the same residue
/// loses its hydrophobic class. Any unknown atom type is fatal.
pub fn parse_receptor(path: &Path) -> Result<Vec<Atom>> {
    let content =
        fs::read_to_string(path).map_err(|e| Error::parse(path, 0, e.to_string()))?;
    parse_receptor_str(&content, path)
}

pub fn parse_receptor_str(content: &str, origin: &Path) -> Result<Vec<Atom>> {
    let mut atoms: Vec<Atom> = Vec::new();
    let mut residue_start = 0;
    let mut current_residue = String::new();

    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        if line.starts_with("TER") {
            residue_start = atoms.len();
            current_residue.clear();
            continue;
        }
        if !(line.starts_with("ATOM") || line.starts_with("HETATM")) {
            continue;
        }
        let record = parse_atom_record(line, origin, line_no)?;
        if record.residue != current_residue {
            residue_start = atoms.len();
            current_residue = record.residue.clone();
        }

        if Atom::is_hydrogen(record.ad) {
            if Atom::is_polar_hydrogen(record.ad) {
                for b in atoms[residue_start..].iter_mut() {
                    if b.is_hetero() && b.is_neighbor_of(record.ad, record.coord) {
                        b.donorize();
                    }
                }
            }
            continue;
        }

        let xs = match ad_to_xs(record.ad) {
            Some(xs) => xs,
            None => continue,
        };
        let mut a = Atom::new(record.serial, record.name, record.coord, record.ad, xs);
        for b in atoms[residue_start..].iter_mut() {
            if !a.is_neighbor_of(b.ad, b.coord) {
                continue;
            }
            if a.is_hetero() && b.is_carbon() {
                b.dehydrophobicize();
            }
            if b.is_hetero() && a.is_carbon() {
                a.dehydrophobicize();
            }
        }
        atoms.push(a);
    }
    Ok(atoms)
}

/// Where each ATOM/HETATM line of the input file landed, so poses can be
/// written back in the original atom order.
#[derive(Debug, Clone, Copy)]
enum AtomRef {
    Heavy(usize),
    Hydrogen(usize),
}

/// A ligand parsed from PDBQT, keeping the input lines for output.
#[derive(Debug)]
pub struct LigandFile {
    pub ligand: Ligand,
    lines: Vec<String>,
    atom_order: Vec<AtomRef>,
}

impl LigandFile {
    pub fn parse(path: &Path) -> Result<LigandFile> {
        let content =
            fs::read_to_string(path).map_err(|e| Error::parse(path, 0, e.to_string()))?;
        LigandFile::parse_str(&content, path)
    }

    /// ROOT / BRANCH / ENDBRANCH / TORSDOF grammar. Each frame's atoms
    /// must be contiguous, and the first heavy atom of a BRANCH must be
    /// its declared rotor Y.
    pub fn parse_str(content: &str, origin: &Path) -> Result<LigandFile> {
        let mut heavy: Vec<Atom> = Vec::new();
        let mut hydrogens: Vec<Atom> = Vec::new();
        let mut bonds: Vec<Vec<usize>> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut sealed: Vec<bool> = Vec::new();
        let mut stack: Vec<usize> = Vec::new();
        let mut pending_rotor_y: Option<(usize, usize)> = None;
        let mut torsdof: Option<usize> = None;
        let mut atom_order: Vec<AtomRef> = Vec::new();

        for (i, line) in content.lines().enumerate() {
            let line_no = i + 1;
            if line.starts_with("ROOT") {
                if !frames.is_empty() {
                    return Err(Error::parse(origin, line_no, "duplicate ROOT"));
                }
                frames.push(Frame::new(0, 0, 0, 0, 0));
                sealed.push(false);
                stack.push(0);
            } else if line.starts_with("ENDROOT") {
                if let Some(&top) = stack.last() {
                    sealed[top] = true;
                }
            } else if line.starts_with("BRANCH") {
                let mut words = line.split_whitespace().skip(1);
                let (x, y) = match (
                    words.next().and_then(|w| w.parse::<usize>().ok()),
                    words.next().and_then(|w| w.parse::<usize>().ok()),
                ) {
                    (Some(x), Some(y)) => (x, y),
                    _ => return Err(Error::parse(origin, line_no, "malformed BRANCH record")),
                };
                let parent = *stack
                    .last()
                    .ok_or_else(|| Error::parse(origin, line_no, "BRANCH before ROOT"))?;
                if pending_rotor_y.is_some() {
                    return Err(Error::parse(origin, line_no, "BRANCH without atoms"));
                }
                let rotor_x = heavy
                    .iter()
                    .position(|a| a.serial == x)
                    .ok_or_else(|| {
                        Error::parse(origin, line_no, format!("unknown rotor X serial {}", x))
                    })?;
                sealed[parent] = true;
                let k = frames.len();
                frames.push(Frame::new(parent, rotor_x, usize::MAX, heavy.len(), hydrogens.len()));
                sealed.push(false);
                stack.push(k);
                pending_rotor_y = Some((k, y));
            } else if line.starts_with("ENDBRANCH") {
                let k = stack
                    .pop()
                    .ok_or_else(|| Error::parse(origin, line_no, "unmatched ENDBRANCH"))?;
                if k == 0 {
                    return Err(Error::parse(origin, line_no, "ENDBRANCH closes ROOT"));
                }
                if frames[k].rotor_y == usize::MAX {
                    return Err(Error::parse(origin, line_no, "BRANCH without atoms"));
                }
                sealed[k] = true;
            } else if line.starts_with("TORSDOF") {
                torsdof = line
                    .split_whitespace()
                    .nth(1)
                    .and_then(|w| w.parse::<usize>().ok());
            } else if line.starts_with("ATOM") || line.starts_with("HETATM") {
                let record = parse_atom_record(line, origin, line_no)?;
                let k = *stack
                    .last()
                    .ok_or_else(|| Error::parse(origin, line_no, "atom outside ROOT"))?;
                if sealed[k] {
                    return Err(Error::parse(origin, line_no, "non-contiguous frame"));
                }

                if Atom::is_hydrogen(record.ad) {
                    if pending_rotor_y.is_some() {
                        return Err(Error::parse(origin, line_no, "expected heavy rotor Y atom"));
                    }
                    if Atom::is_polar_hydrogen(record.ad) {
                        for b in heavy[frames[k].ha_begin..frames[k].ha_end].iter_mut() {
                            if b.is_hetero() && b.is_neighbor_of(record.ad, record.coord) {
                                b.donorize();
                            }
                        }
                    }
                    let index = hydrogens.len();
                    hydrogens.push(Atom::new(
                        record.serial,
                        record.name,
                        record.coord,
                        record.ad,
                        0,
                    ));
                    frames[k].hy_end = hydrogens.len();
                    atom_order.push(AtomRef::Hydrogen(index));
                    continue;
                }

                let xs = match ad_to_xs(record.ad) {
                    Some(xs) => xs,
                    None => continue,
                };
                let index = heavy.len();
                let mut a = Atom::new(record.serial, record.name, record.coord, record.ad, xs);
                bonds.push(Vec::new());

                if let Some((frame, y)) = pending_rotor_y {
                    if frame == k {
                        if record.serial != y {
                            return Err(Error::parse(
                                origin,
                                line_no,
                                format!("expected rotor Y serial {}", y),
                            ));
                        }
                        frames[k].rotor_y = index;
                        pending_rotor_y = None;
                        // The rotor bond itself.
                        let rx = frames[k].rotor_x;
                        bonds[index].push(rx);
                        bonds[rx].push(index);
                        if a.is_hetero() && heavy[rx].is_carbon() {
                            heavy[rx].dehydrophobicize();
                        }
                        if heavy[rx].is_hetero() && a.is_carbon() {
                            a.dehydrophobicize();
                        }
                    }
                }

                // Covalent bonds within the frame.
                for j in frames[k].ha_begin..index {
                    if !a.is_neighbor_of(heavy[j].ad, heavy[j].coord) {
                        continue;
                    }
                    bonds[index].push(j);
                    bonds[j].push(index);
                    if a.is_hetero() && heavy[j].is_carbon() {
                        heavy[j].dehydrophobicize();
                    }
                    if heavy[j].is_hetero() && a.is_carbon() {
                        a.dehydrophobicize();
                    }
                }

                heavy.push(a);
                frames[k].ha_end = heavy.len();
                atom_order.push(AtomRef::Heavy(index));
            }
        }

        if frames.is_empty() {
            return Err(Error::parse(origin, content.lines().count(), "missing ROOT"));
        }
        if stack.len() > 1 {
            return Err(Error::parse(
                origin,
                content.lines().count(),
                "unterminated BRANCH",
            ));
        }

        let ligand = Ligand::new(heavy, hydrogens, frames, bonds)?;
        if let Some(declared) = torsdof {
            if declared != ligand.num_active_torsions {
                warn!(
                    "{}: TORSDOF declares {} torsions, model has {} active",
                    origin.display(),
                    declared,
                    ligand.num_active_torsions
                );
            }
        }

        Ok(LigandFile {
            ligand,
            lines: content.lines().map(str::to_string).collect(),
            atom_order,
        })
    }

    /// Write up to the given poses as MODEL blocks, echoing the input
    /// lines with the coordinate columns replaced.
    pub fn write_models<W: Write>(
        &self,
        out: &mut W,
        results: &[DockResult],
    ) -> std::io::Result<()> {
        for (i, r) in results.iter().enumerate() {
            writeln!(out, "MODEL     {:4}", i + 1)?;
            writeln!(
                out,
                "REMARK            TOTAL FREE ENERGY PREDICTED BY LIGDOCK: {:8.3} KCAL/MOL",
                r.e
            )?;
            writeln!(
                out,
                "REMARK  INTER-MOLECULAR FREE ENERGY PREDICTED BY LIGDOCK: {:8.3} KCAL/MOL",
                r.f
            )?;
            writeln!(
                out,
                "REMARK       NORMALIZED FREE ENERGY PREDICTED BY LIGDOCK: {:8.3} KCAL/MOL",
                r.e_nd
            )?;
            let mut next = 0;
            for line in &self.lines {
                if line.starts_with("ATOM") || line.starts_with("HETATM") {
                    let coord = match self.atom_order[next] {
                        AtomRef::Heavy(i) => r.heavy_atoms[i],
                        AtomRef::Hydrogen(i) => r.hydrogens[i],
                    };
                    next += 1;
                    writeln!(
                        out,
                        "{}{:8.3}{:8.3}{:8.3}{}",
                        &line[..30],
                        coord.x,
                        coord.y,
                        coord.z,
                        &line[54..]
                    )?;
                } else {
                    writeln!(out, "{}", line)?;
                }
            }
            writeln!(out, "ENDMDL")?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path, results: &[DockResult]) -> std::io::Result<()> {
        let file = fs::File::create(path)?;
        let mut out = BufWriter::new(file);
        self.write_models(&mut out, results)
    }
}
