/// Flat offset into packed upper-triangular storage. Requires i <= j.
pub fn triangular_index(i: usize, j: usize) -> usize {
    debug_assert!(i <= j);
    i + j * (j + 1) / 2
}

/// As `triangular_index`, but tolerates swapped arguments.
pub fn triangular_index_permissive(i: usize, j: usize) -> usize {
    if i <= j {
        triangular_index(i, j)
    } else {
        triangular_index(j, i)
    }
}

/// An n-by-n symmetric matrix storing only entries with i <= j,
/// n*(n+1)/2 elements in total.
#[derive(Debug, Clone)]
pub struct TriangularMatrix<T> {
    n: usize,
    data: Vec<T>,
}

impl<T: Clone> TriangularMatrix<T> {
    pub fn new(n: usize, fill: T) -> Self {
        TriangularMatrix {
            n,
            data: vec![fill; n * (n + 1) / 2],
        }
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// Requires i <= j.
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[triangular_index(i, j)]
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> &mut T {
        &mut self.data[triangular_index(i, j)]
    }

    /// Swaps the indices when i > j.
    pub fn get_permissive(&self, i: usize, j: usize) -> &T {
        &self.data[triangular_index_permissive(i, j)]
    }

    pub fn fill(&mut self, value: T) {
        for slot in self.data.iter_mut() {
            *slot = value.clone();
        }
    }
}

impl TriangularMatrix<f64> {
    /// Identity of the symmetric matrix this packing represents.
    pub fn identity(n: usize) -> Self {
        let mut m = TriangularMatrix::new(n, 0.0);
        for i in 0..n {
            *m.get_mut(i, i) = 1.0;
        }
        m
    }

    pub fn set_identity(&mut self) {
        self.fill(0.0);
        for i in 0..self.n {
            *self.get_mut(i, i) = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_dense_and_unique() {
        // Enumerating (i, j) with i <= j column by column must walk
        // 0, 1, 2, ... without gaps.
        let n = 7;
        let mut expected = 0;
        for j in 0..n {
            for i in 0..=j {
                assert_eq!(expected, triangular_index(i, j));
                expected += 1;
            }
        }
        assert_eq!(n * (n + 1) / 2, expected);
    }

    #[test]
    fn permissive_index_is_symmetric() {
        assert_eq!(triangular_index(2, 5), triangular_index_permissive(5, 2));
        assert_eq!(triangular_index(3, 3), triangular_index_permissive(3, 3));
    }

    #[test]
    fn identity_has_unit_diagonal() {
        let m = TriangularMatrix::identity(4);
        for i in 0..4 {
            for j in i..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(expected, *m.get(i, j));
                assert_eq!(expected, *m.get_permissive(j, i));
            }
        }
    }

    #[test]
    fn set_identity_resets_previous_content() {
        let mut m = TriangularMatrix::new(3, 7.5);
        m.set_identity();
        assert_eq!(1.0, *m.get(1, 1));
        assert_eq!(0.0, *m.get(0, 2));
    }
}
