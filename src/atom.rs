use super::vec3::Vec3;
use std::collections::HashMap;

/// Number of recognized AutoDock atom types.
pub const AD_TYPE_SIZE: usize = 31;

/// AutoDock type strings in index order. Indices 0 and 1 are hydrogens,
/// 2 and 3 are carbons, everything from N on is hetero, and everything
/// from Zn on is a metal.
pub const AD_TYPE_STRINGS: [&str; AD_TYPE_SIZE] = [
    "H", "HD", "C", "A", "N", "NA", "OA", "S", "SA", "Se", "P", "F", "Cl", "Br", "I", "Zn", "Fe",
    "Mg", "Ca", "Mn", "Cu", "Na", "K", "Hg", "Ni", "Co", "Cd", "As", "Sr", "U", "Cs",
];

pub const AD_H: usize = 0;
pub const AD_HD: usize = 1;
pub const AD_C: usize = 2;
pub const AD_A: usize = 3;
const AD_FIRST_HETERO: usize = 4;
const AD_FIRST_METAL: usize = 15;

// Covalent radii in Angstrom, by AD type index. Two atoms are considered
// covalently bonded when their distance is under 1.1 times the radius sum.
const AD_COVALENT_RADII: [f64; AD_TYPE_SIZE] = [
    0.37, 0.37, 0.77, 0.77, 0.75, 0.75, 0.73, 1.02, 1.02, 1.17, 1.06, 0.71, 0.99, 1.14, 1.33,
    1.25, 1.25, 1.30, 1.74, 1.39, 1.38, 1.54, 1.96, 1.32, 1.24, 1.26, 1.48, 1.19, 1.92, 1.42,
    2.25,
];

const COVALENT_FACTOR: f64 = 1.1;

lazy_static! {
    /// AutoDock type string to index.
    pub static ref AD_TYPE_INDEX: HashMap<&'static str, usize> = {
        let mut map = HashMap::new();
        for (i, s) in AD_TYPE_STRINGS.iter().enumerate() {
            map.insert(*s, i);
        }
        map
    };
}

/// Parse an AutoDock type string. None for unrecognized types; the caller
/// decides whether that aborts a ligand or the whole run.
pub fn parse_ad_type(s: &str) -> Option<usize> {
    AD_TYPE_INDEX.get(s).copied()
}

/// Number of XS types the scoring function distinguishes.
pub const XS_TYPE_SIZE: usize = 15;

pub const XS_C_H: usize = 0;
pub const XS_C_P: usize = 1;
pub const XS_N_P: usize = 2;
pub const XS_N_D: usize = 3;
pub const XS_N_A: usize = 4;
pub const XS_N_DA: usize = 5;
pub const XS_O_A: usize = 6;
pub const XS_O_DA: usize = 7;
pub const XS_S_P: usize = 8;
pub const XS_P_P: usize = 9;
pub const XS_F_H: usize = 10;
pub const XS_CL_H: usize = 11;
pub const XS_BR_H: usize = 12;
pub const XS_I_H: usize = 13;
pub const XS_MET_D: usize = 14;

// Van der Waals radii in Angstrom, by XS type index.
const XS_VDW_RADII: [f64; XS_TYPE_SIZE] = [
    1.9, 1.9, 1.8, 1.8, 1.8, 1.8, 1.7, 1.7, 2.0, 2.1, 1.5, 1.8, 2.0, 2.2, 1.2,
];

pub fn xs_vdw_radius(xs: usize) -> f64 {
    XS_VDW_RADII[xs]
}

pub fn xs_is_hydrophobic(xs: usize) -> bool {
    matches!(xs, XS_C_H | XS_F_H | XS_CL_H | XS_BR_H | XS_I_H)
}

pub fn xs_is_donor(xs: usize) -> bool {
    matches!(xs, XS_N_D | XS_N_DA | XS_O_DA | XS_MET_D)
}

pub fn xs_is_acceptor(xs: usize) -> bool {
    matches!(xs, XS_N_A | XS_N_DA | XS_O_A | XS_O_DA)
}

/// A donor-acceptor pair in either direction forms a hydrogen bond.
pub fn xs_hbond(xs1: usize, xs2: usize) -> bool {
    (xs_is_donor(xs1) && xs_is_acceptor(xs2)) || (xs_is_donor(xs2) && xs_is_acceptor(xs1))
}

/// Default XS class of an AD type, before donor promotion and carbon
/// dehydrophobization. None for hydrogens, which are never stored.
pub fn ad_to_xs(ad: usize) -> Option<usize> {
    match ad {
        AD_H | AD_HD => None,
        AD_C | AD_A => Some(XS_C_H),
        4 => Some(XS_N_P),       // N
        5 => Some(XS_N_A),       // NA
        6 => Some(XS_O_A),       // OA
        7 | 8 | 9 => Some(XS_S_P), // S, SA, Se
        10 => Some(XS_P_P),      // P
        11 => Some(XS_F_H),      // F
        12 => Some(XS_CL_H),     // Cl
        13 => Some(XS_BR_H),     // Br
        14 => Some(XS_I_H),      // I
        _ => Some(XS_MET_D),
    }
}

/// One heavy atom of the receptor or the ligand. Non-polar hydrogens never
/// reach this type; polar hydrogens are consumed during parsing to promote
/// their bonded heavy atom to a donor.
#[derive(Debug, Clone)]
pub struct Atom {
    pub serial: usize,
    pub name: String,
    pub coord: Vec3,
    pub ad: usize,
    pub xs: usize,
}

impl Atom {
    pub fn new(serial: usize, name: String, coord: Vec3, ad: usize, xs: usize) -> Atom {
        Atom {
            serial,
            name,
            coord,
            ad,
            xs,
        }
    }

    pub fn is_hydrogen(ad: usize) -> bool {
        ad <= AD_HD
    }

    pub fn is_polar_hydrogen(ad: usize) -> bool {
        ad == AD_HD
    }

    pub fn is_carbon(&self) -> bool {
        self.ad == AD_C || self.ad == AD_A
    }

    pub fn is_hetero(&self) -> bool {
        self.ad >= AD_FIRST_HETERO
    }

    pub fn is_metal(&self) -> bool {
        self.ad >= AD_FIRST_METAL
    }

    /// Covalent neighbor test against another atom.
    pub fn is_neighbor_of(&self, other_ad: usize, other_coord: Vec3) -> bool {
        let reach = COVALENT_FACTOR * (AD_COVALENT_RADII[self.ad] + AD_COVALENT_RADII[other_ad]);
        self.coord.distance_sqr(other_coord) < reach * reach
    }

    /// A polar hydrogen was found bonded to this atom.
    pub fn donorize(&mut self) {
        self.xs = match self.xs {
            XS_N_P => XS_N_D,
            XS_N_A => XS_N_DA,
            XS_O_A => XS_O_DA,
            other => other,
        };
    }

    /// A hetero atom was found bonded to this carbon.
    pub fn dehydrophobicize(&mut self) {
        if self.xs == XS_C_H {
            self.xs = XS_C_P;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ad_type_round_trip() {
        for (i, s) in AD_TYPE_STRINGS.iter().enumerate() {
            assert_eq!(Some(i), parse_ad_type(s));
        }
        assert_eq!(None, parse_ad_type("XX"));
        assert_eq!(Some(AD_HD), parse_ad_type("HD"));
    }

    #[test]
    fn hydrogens_have_no_xs_class() {
        assert_eq!(None, ad_to_xs(AD_H));
        assert_eq!(None, ad_to_xs(AD_HD));
        assert_eq!(Some(XS_C_H), ad_to_xs(AD_C));
        assert_eq!(Some(XS_MET_D), ad_to_xs(15));
    }

    #[test]
    fn hbond_pairs() {
        assert!(xs_hbond(XS_N_D, XS_O_A));
        assert!(xs_hbond(XS_O_A, XS_N_D));
        assert!(xs_hbond(XS_N_DA, XS_N_DA));
        assert!(!xs_hbond(XS_N_D, XS_N_D));
        assert!(!xs_hbond(XS_C_H, XS_O_A));
    }

    #[test]
    fn donorize_promotes_nitrogen_and_oxygen() {
        let mut n = Atom::new(1, "N".into(), crate::vec3::ZERO3, 4, XS_N_P);
        n.donorize();
        assert_eq!(XS_N_D, n.xs);
        let mut na = Atom::new(2, "NA".into(), crate::vec3::ZERO3, 5, XS_N_A);
        na.donorize();
        assert_eq!(XS_N_DA, na.xs);
        let mut oa = Atom::new(3, "OA".into(), crate::vec3::ZERO3, 6, XS_O_A);
        oa.donorize();
        assert_eq!(XS_O_DA, oa.xs);
    }

    #[test]
    fn dehydrophobicize_only_touches_hydrophobic_carbon() {
        let mut c = Atom::new(1, "C".into(), crate::vec3::ZERO3, AD_C, XS_C_H);
        c.dehydrophobicize();
        assert_eq!(XS_C_P, c.xs);
        let mut n = Atom::new(2, "N".into(), crate::vec3::ZERO3, 4, XS_N_P);
        n.dehydrophobicize();
        assert_eq!(XS_N_P, n.xs);
    }

    #[test]
    fn covalent_neighbor_test() {
        let c = Atom::new(1, "C".into(), crate::vec3::ZERO3, AD_C, XS_C_H);
        // A typical C-N bond is ~1.47 A; 1.1 * (0.77 + 0.75) = 1.672.
        assert!(c.is_neighbor_of(4, Vec3::new(1.47, 0.0, 0.0)));
        assert!(!c.is_neighbor_of(4, Vec3::new(1.7, 0.0, 0.0)));
    }
}
