use super::atom::Atom;
use super::conformation::{Change, Conformation};
use super::constants::{CUTOFF_SQR, MAX_ENERGY_PER_HEAVY_ATOM};
use super::matrix::triangular_index_permissive;
use super::qt::Quaternion;
use super::receptor::Receptor;
use super::result::DockResult;
use super::scoring::ScoringFunction;
use super::vec3::{Mat3, Vec3, ZERO3};
use crate::error::{Error, Result};

/// A rigid fragment of the ligand. The root frame is anchored by the
/// conformation's position and orientation; every other frame hangs off
/// its parent through the rotatable bond rotor_x -> rotor_y and, when
/// active, contributes one torsion variable.
#[derive(Debug, Clone)]
pub struct Frame {
    pub parent: usize,
    /// Heavy-atom index of the bond origin, in an ancestor frame.
    pub rotor_x: usize,
    /// Heavy-atom index of the bond end; the origin of this frame.
    pub rotor_y: usize,
    pub ha_begin: usize,
    pub ha_end: usize,
    pub hy_begin: usize,
    pub hy_end: usize,
    pub active: bool,
    pub children: Vec<usize>,
    /// From the parent's origin to this frame's origin, in the parent's
    /// local coordinates.
    parent_rotor_y_to_rotor_y: Vec3,
    /// Unit bond axis rotor_x -> rotor_y, in the parent's local coordinates.
    rotor_axis: Vec3,
}

impl Frame {
    pub fn new(parent: usize, rotor_x: usize, rotor_y: usize, ha_begin: usize, hy_begin: usize) -> Frame {
        Frame {
            parent,
            rotor_x,
            rotor_y,
            ha_begin,
            ha_end: ha_begin,
            hy_begin,
            hy_end: hy_begin,
            active: true,
            children: Vec::new(),
            parent_rotor_y_to_rotor_y: ZERO3,
            rotor_axis: ZERO3,
        }
    }
}

/// A pair of heavy atoms from different frames, more than three covalent
/// bonds apart, scored with the same tabulated potential as the
/// inter-molecular term.
#[derive(Debug, Clone, Copy)]
pub struct InteractingPair {
    pub i1: usize,
    pub i2: usize,
    pub type_pair: usize,
}

/// A flexible ligand, stored in frame-local coordinates so that a
/// conformation maps to Cartesian coordinates by one rigid transform per
/// frame.
#[derive(Debug)]
pub struct Ligand {
    pub frames: Vec<Frame>,
    /// Heavy atoms grouped by frame; coordinates are local to the owning
    /// frame's origin and parse-time axes.
    pub heavy_atoms: Vec<Atom>,
    /// Hydrogens grouped by frame, kept only to place them in the output.
    pub hydrogens: Vec<Atom>,
    pub num_active_torsions: usize,
    interacting_pairs: Vec<InteractingPair>,
}

impl Ligand {
    /// Build the kinematic model from a parsed record: atoms in global
    /// (input-pose) coordinates, frames with atom ranges and rotor
    /// indices, and the covalent bond adjacency over heavy atoms.
    pub fn new(
        mut heavy_atoms: Vec<Atom>,
        mut hydrogens: Vec<Atom>,
        mut frames: Vec<Frame>,
        bonds: Vec<Vec<usize>>,
    ) -> Result<Ligand> {
        if heavy_atoms.is_empty() {
            return Err(Error::Domain("ligand has no heavy atoms".into()));
        }
        debug_assert_eq!(heavy_atoms.len(), bonds.len());

        // Wire up children.
        for k in 1..frames.len() {
            let parent = frames[k].parent;
            frames[parent].children.push(k);
        }

        // A frame whose rotation moves nothing consumes no torsion.
        for k in 1..frames.len() {
            let f = &frames[k];
            let single = f.ha_end - f.ha_begin == 1
                && f.hy_end == f.hy_begin
                && f.children.is_empty();
            frames[k].active = !single;
        }
        let num_active_torsions = frames.iter().skip(1).filter(|f| f.active).count();

        // Rotor geometry, while coordinates are still global. The parse
        // pose has identity orientation everywhere, so global directions
        // are parent-local directions.
        let origins: Vec<Vec3> = frames
            .iter()
            .map(|f| heavy_atoms[f.rotor_y].coord)
            .collect();
        for k in 1..frames.len() {
            let axis =
                (heavy_atoms[frames[k].rotor_y].coord - heavy_atoms[frames[k].rotor_x].coord)
                    .normalized()?;
            let f = &mut frames[k];
            f.parent_rotor_y_to_rotor_y = origins[k] - origins[f.parent];
            f.rotor_axis = axis;
        }

        let interacting_pairs = find_interacting_pairs(&heavy_atoms, &frames, &bonds);

        // Localize coordinates to the owning frame's origin.
        for (k, f) in frames.iter().enumerate() {
            for atom in &mut heavy_atoms[f.ha_begin..f.ha_end] {
                atom.coord -= origins[k];
            }
            for atom in &mut hydrogens[f.hy_begin..f.hy_end] {
                atom.coord -= origins[k];
            }
        }

        Ok(Ligand {
            frames,
            heavy_atoms,
            hydrogens,
            num_active_torsions,
            interacting_pairs,
        })
    }

    pub fn num_heavy_atoms(&self) -> usize {
        self.heavy_atoms.len()
    }

    pub fn interacting_pairs(&self) -> &[InteractingPair] {
        &self.interacting_pairs
    }

    /// Drop bound for conformations of this ligand.
    pub fn energy_upper_bound(&self) -> f64 {
        MAX_ENERGY_PER_HEAVY_ATOM * self.num_heavy_atoms() as f64
    }

    /// Per-frame rigid transforms for a conformation. Consumes torsions in
    /// frame order.
    fn transforms(&self, conf: &Conformation) -> (Vec<Vec3>, Vec<Vec3>, Vec<Mat3>) {
        let nf = self.frames.len();
        let mut origins = vec![ZERO3; nf];
        let mut axes = vec![ZERO3; nf];
        let mut orientations = vec![Quaternion::default(); nf];
        let mut rotations = vec![Mat3::identity(); nf];

        origins[0] = conf.position;
        orientations[0] = conf.orientation;
        rotations[0] = conf.orientation.to_mat3();

        let mut t = 0;
        for k in 1..nf {
            let f = &self.frames[k];
            origins[k] = origins[f.parent] + rotations[f.parent] * f.parent_rotor_y_to_rotor_y;
            if f.active {
                axes[k] = rotations[f.parent] * f.rotor_axis;
                orientations[k] =
                    Quaternion::from_rotation_vector(axes[k] * conf.torsions[t]) * orientations[f.parent];
                t += 1;
            } else {
                orientations[k] = orientations[f.parent];
            }
            rotations[k] = orientations[k].to_mat3();
        }
        (origins, axes, rotations)
    }

    /// Map a conformation to coordinates and accumulate the free energy and
    /// its gradient over the 6+T degrees of freedom. Returns false as soon
    /// as the partial energy reaches e_upper_bound; e, f and g are then
    /// meaningless. The orientation part of the gradient lives in the
    /// axis-angle tangent at the current orientation.
    pub fn evaluate(
        &self,
        conf: &Conformation,
        sf: &ScoringFunction,
        rec: &Receptor,
        e_upper_bound: f64,
        e: &mut f64,
        f: &mut f64,
        g: &mut Change,
    ) -> bool {
        let nf = self.frames.len();
        let nh = self.heavy_atoms.len();
        let (origins, axes, rotations) = self.transforms(conf);

        let mut coordinates = vec![ZERO3; nh];
        for (k, fr) in self.frames.iter().enumerate() {
            for i in fr.ha_begin..fr.ha_end {
                coordinates[i] = origins[k] + rotations[k] * self.heavy_atoms[i].coord;
            }
        }

        // Inter-molecular part, local thanks to the receptor partitions.
        let mut derivatives = vec![ZERO3; nh];
        *e = 0.0;
        for i in 0..nh {
            let c = coordinates[i];
            let xs1 = self.heavy_atoms[i].xs;
            for &ri in rec.neighbors(c) {
                let r = c - rec.atoms[ri].coord;
                let r2 = r.norm_sqr();
                if r2 < CUTOFF_SQR {
                    let sample =
                        sf.evaluate(triangular_index_permissive(xs1, rec.atoms[ri].xs), r2);
                    *e += sample[0];
                    derivatives[i] += sample[1] * r;
                }
            }
            if *e >= e_upper_bound {
                return false;
            }
        }
        *f = *e;

        // Intra-molecular clash penalty over non-bonded pairs.
        for p in &self.interacting_pairs {
            let r = coordinates[p.i2] - coordinates[p.i1];
            let r2 = r.norm_sqr();
            if r2 < CUTOFF_SQR {
                let sample = sf.evaluate(p.type_pair, r2);
                *e += sample[0];
                let derivative = sample[1] * r;
                derivatives[p.i1] -= derivative;
                derivatives[p.i2] += derivative;
            }
        }
        if *e >= e_upper_bound {
            return false;
        }

        // Per-frame force and torque, then aggregation towards the root.
        let mut forces = vec![ZERO3; nf];
        let mut torques = vec![ZERO3; nf];
        for (k, fr) in self.frames.iter().enumerate() {
            for i in fr.ha_begin..fr.ha_end {
                forces[k] += derivatives[i];
                torques[k] += (coordinates[i] - origins[k]).cross(derivatives[i]);
            }
        }
        let mut t = self.num_active_torsions;
        for k in (1..nf).rev() {
            let fr = &self.frames[k];
            let force = forces[k];
            let torque = torques[k];
            forces[fr.parent] += force;
            torques[fr.parent] += torque + (origins[k] - origins[fr.parent]).cross(force);
            if fr.active {
                t -= 1;
                g.torsions[t] = torque.dot(axes[k]);
            }
        }
        g.position = forces[0];
        g.orientation = torques[0];
        true
    }

    /// Materialize a pose: full forward kinematics including hydrogens,
    /// coordinates in the original atom order.
    pub fn compose_result(&self, e: f64, f: f64, conf: &Conformation) -> DockResult {
        let (origins, _axes, rotations) = self.transforms(conf);

        let mut heavy = vec![ZERO3; self.heavy_atoms.len()];
        let mut hydrogens = vec![ZERO3; self.hydrogens.len()];
        for (k, fr) in self.frames.iter().enumerate() {
            for i in fr.ha_begin..fr.ha_end {
                heavy[i] = origins[k] + rotations[k] * self.heavy_atoms[i].coord;
            }
            for i in fr.hy_begin..fr.hy_end {
                hydrogens[i] = origins[k] + rotations[k] * self.hydrogens[i].coord;
            }
        }

        DockResult {
            e,
            f,
            e_nd: 0.0,
            heavy_atoms: heavy,
            hydrogens,
        }
    }
}

/// Heavy-atom pairs from different frames separated by more than three
/// covalent bonds.
fn find_interacting_pairs(
    heavy_atoms: &[Atom],
    frames: &[Frame],
    bonds: &[Vec<usize>],
) -> Vec<InteractingPair> {
    let nh = heavy_atoms.len();
    let mut frame_of = vec![0usize; nh];
    for (k, f) in frames.iter().enumerate() {
        for i in f.ha_begin..f.ha_end {
            frame_of[i] = k;
        }
    }

    let mut pairs = Vec::new();
    let mut neighbors: Vec<usize> = Vec::with_capacity(16);
    for i1 in 0..nh {
        // Atoms within three consecutive covalent bonds of i1.
        neighbors.clear();
        for &b1 in &bonds[i1] {
            if !neighbors.contains(&b1) {
                neighbors.push(b1);
            }
            for &b2 in &bonds[b1] {
                if !neighbors.contains(&b2) {
                    neighbors.push(b2);
                }
                for &b3 in &bonds[b2] {
                    if !neighbors.contains(&b3) {
                        neighbors.push(b3);
                    }
                }
            }
        }

        for i2 in (i1 + 1)..nh {
            if frame_of[i1] == frame_of[i2] || neighbors.contains(&i2) {
                continue;
            }
            pairs.push(InteractingPair {
                i1,
                i2,
                type_pair: triangular_index_permissive(heavy_atoms[i1].xs, heavy_atoms[i2].xs),
            });
        }
    }
    pairs
}
