use super::atom::Atom;
use super::constants::CUTOFF_SQR;
use super::grid::{projected_distance_sqr, SearchBox};

/// The rigid receptor: heavy atoms plus, per partition of the search box,
/// the indices of every atom close enough to matter for a pose inside that
/// partition. Immutable after construction and shared by all workers.
#[derive(Debug)]
pub struct Receptor {
    pub atoms: Vec<Atom>,
    pub search_box: SearchBox,
    partitions: Vec<Vec<usize>>,
}

impl Receptor {
    /// The double filter keeps per-cell lists tight: an atom enters a cell
    /// list only if it is within cutoff of the box at all, and then within
    /// cutoff of that particular cell.
    pub fn new(atoms: Vec<Atom>, search_box: SearchBox) -> Receptor {
        let relevant: Vec<usize> = (0..atoms.len())
            .filter(|&i| search_box.project_distance_sqr(atoms[i].coord) < CUTOFF_SQR)
            .collect();

        let [nx, ny, nz] = search_box.num_partitions;
        let mut partitions = vec![Vec::new(); nx * ny * nz];
        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    let index = [x, y, z];
                    let c1 = search_box.partition_corner1(index);
                    let c2 = search_box.partition_corner2(index);
                    let cell = &mut partitions[(x * ny + y) * nz + z];
                    for &i in &relevant {
                        if projected_distance_sqr(c1, c2, atoms[i].coord) < CUTOFF_SQR {
                            cell.push(i);
                        }
                    }
                }
            }
        }

        Receptor {
            atoms,
            search_box,
            partitions,
        }
    }

    /// Receptor atom indices a pose at p has to be scored against.
    pub fn neighbors(&self, p: super::vec3::Vec3) -> &[usize] {
        let [x, y, z] = self.search_box.partition_index(p);
        let [_, ny, nz] = self.search_box.num_partitions;
        &self.partitions[(x * ny + y) * nz + z]
    }

    pub fn cell(&self, index: [usize; 3]) -> &[usize] {
        let [_, ny, nz] = self.search_box.num_partitions;
        &self.partitions[(index[0] * ny + index[1]) * nz + index[2]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::XS_C_H;
    use crate::vec3::{Vec3, ZERO3};

    fn carbon(serial: usize, coord: Vec3) -> Atom {
        Atom::new(serial, "C".into(), coord, crate::atom::AD_C, XS_C_H)
    }

    fn small_box() -> SearchBox {
        SearchBox::with_default_granularity(ZERO3, Vec3::new(24.0, 24.0, 24.0))
    }

    #[test]
    fn every_listed_atom_is_within_cutoff_of_its_cell() {
        let atoms = vec![
            carbon(1, Vec3::new(0.0, 0.0, 0.0)),
            carbon(2, Vec3::new(5.0, 5.0, 5.0)),
            carbon(3, Vec3::new(-11.0, 10.0, -9.0)),
            carbon(4, Vec3::new(40.0, 0.0, 0.0)), // far outside, never listed
        ];
        let rec = Receptor::new(atoms, small_box());
        let b = &rec.search_box;
        for x in 0..b.num_partitions[0] {
            for y in 0..b.num_partitions[1] {
                for z in 0..b.num_partitions[2] {
                    let c1 = b.partition_corner1([x, y, z]);
                    let c2 = b.partition_corner2([x, y, z]);
                    for &i in rec.cell([x, y, z]) {
                        assert!(
                            projected_distance_sqr(c1, c2, rec.atoms[i].coord)
                                < crate::constants::CUTOFF_SQR
                        );
                        assert_ne!(4, rec.atoms[i].serial);
                    }
                }
            }
        }
    }

    #[test]
    fn nearby_atom_is_listed_for_its_own_cell() {
        let atoms = vec![carbon(1, Vec3::new(1.0, 1.0, 1.0))];
        let rec = Receptor::new(atoms, small_box());
        let list = rec.neighbors(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(&[0], list);
    }

    #[test]
    fn distant_cells_do_not_list_the_atom() {
        let atoms = vec![carbon(1, Vec3::new(-11.0, -11.0, -11.0))];
        let rec = Receptor::new(atoms, small_box());
        // Opposite corner of a 24 A box is far beyond the 8 A cutoff.
        let list = rec.neighbors(Vec3::new(11.0, 11.0, 11.0));
        assert!(list.is_empty());
    }
}
