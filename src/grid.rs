use super::constants::{DEFAULT_GRANULARITY, PARTITION_EDGE};
use super::vec3::Vec3;

/// The rectangular search region, discretised into near-cubic partitions
/// that exactly tile it. The user-entered size is snapped up to the next
/// granularity multiple per axis before partitioning.
#[derive(Debug, Clone)]
pub struct SearchBox {
    pub center: Vec3,
    /// Half-span per axis, after snapping.
    pub span: Vec3,
    pub granularity: f64,
    pub corner0: Vec3,
    pub corner1: Vec3,
    pub num_partitions: [usize; 3],
    /// Realized partition edge per axis, extent / num_partitions.
    pub partition_size: Vec3,
}

impl SearchBox {
    /// `size` is the full box extent per axis.
    pub fn new(center: Vec3, size: Vec3, granularity: f64) -> SearchBox {
        let mut span = Vec3::default();
        let mut num_partitions = [0usize; 3];
        let mut partition_size = Vec3::default();
        for k in 0..3 {
            let num_grids = (size[k] / granularity).ceil().max(1.0);
            let extent = granularity * num_grids;
            span[k] = 0.5 * extent;
            num_partitions[k] = ((extent / PARTITION_EDGE).floor() as usize).max(1);
            partition_size[k] = extent / num_partitions[k] as f64;
        }
        SearchBox {
            center,
            span,
            granularity,
            corner0: center - span,
            corner1: center + span,
            num_partitions,
            partition_size,
        }
    }

    pub fn with_default_granularity(center: Vec3, size: Vec3) -> SearchBox {
        SearchBox::new(center, size, DEFAULT_GRANULARITY)
    }

    pub fn contains(&self, p: Vec3) -> bool {
        (0..3).all(|k| self.corner0[k] <= p[k] && p[k] <= self.corner1[k])
    }

    /// Componentwise clamp of p onto the box.
    pub fn project(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            p.x.clamp(self.corner0.x, self.corner1.x),
            p.y.clamp(self.corner0.y, self.corner1.y),
            p.z.clamp(self.corner0.z, self.corner1.z),
        )
    }

    /// Squared distance from p to its projection; zero inside the box.
    pub fn project_distance_sqr(&self, p: Vec3) -> f64 {
        projected_distance_sqr(self.corner0, self.corner1, p)
    }

    /// Index of the partition containing project(p).
    pub fn partition_index(&self, p: Vec3) -> [usize; 3] {
        let q = self.project(p);
        let mut index = [0usize; 3];
        for k in 0..3 {
            let i = ((q[k] - self.corner0[k]) / self.partition_size[k]) as usize;
            index[k] = i.min(self.num_partitions[k] - 1);
        }
        index
    }

    /// Low corner of a partition.
    pub fn partition_corner1(&self, index: [usize; 3]) -> Vec3 {
        Vec3::new(
            self.corner0.x + self.partition_size.x * index[0] as f64,
            self.corner0.y + self.partition_size.y * index[1] as f64,
            self.corner0.z + self.partition_size.z * index[2] as f64,
        )
    }

    /// High corner of a partition.
    pub fn partition_corner2(&self, index: [usize; 3]) -> Vec3 {
        self.partition_corner1(index) + self.partition_size
    }

    pub fn num_cells(&self) -> usize {
        self.num_partitions[0] * self.num_partitions[1] * self.num_partitions[2]
    }
}

/// Squared distance from p to the axis-aligned cell [c1, c2].
pub fn projected_distance_sqr(c1: Vec3, c2: Vec3, p: Vec3) -> f64 {
    let mut sum = 0.0;
    for k in 0..3 {
        let d = if p[k] < c1[k] {
            c1[k] - p[k]
        } else if p[k] > c2[k] {
            p[k] - c2[k]
        } else {
            0.0
        };
        sum += d * d;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3::ZERO3;

    fn unit_box() -> SearchBox {
        // Extent snaps from 24 to 24.0625 = 0.15625 * 154; 8 partitions of
        // exactly 3.0078125 A per axis.
        SearchBox::with_default_granularity(ZERO3, Vec3::new(24.0, 24.0, 24.0))
    }

    #[test]
    fn span_snaps_up_to_granularity() {
        let b = unit_box();
        assert_eq!(12.03125, b.span.x);
        assert_eq!([8, 8, 8], b.num_partitions);
        assert_eq!(3.0078125, b.partition_size.x);
    }

    #[test]
    fn partitions_tile_the_box_exactly() {
        let b = unit_box();
        for k in 0..3 {
            let covered = b.partition_size[k] * b.num_partitions[k] as f64;
            assert_eq!(b.span[k] * 2.0, covered);
        }
        // The far corner of the last cell is the box corner.
        let last = [7, 7, 7];
        assert_eq!(b.corner1, b.partition_corner2(last));
    }

    #[test]
    fn project_clamps_componentwise() {
        let b = unit_box();
        let inside = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(inside, b.project(inside));
        let outside = Vec3::new(100.0, 0.0, -100.0);
        let q = b.project(outside);
        assert_eq!(Vec3::new(b.corner1.x, 0.0, b.corner0.z), q);
    }

    #[test]
    fn project_distance_is_zero_inside() {
        let b = unit_box();
        assert_eq!(0.0, b.project_distance_sqr(Vec3::new(0.5, 0.5, 0.5)));
        let p = Vec3::new(b.corner1.x + 3.0, 0.0, 0.0);
        assert_eq!(9.0, b.project_distance_sqr(p));
    }

    #[test]
    fn cell_distance_accumulates_over_axes() {
        let c1 = Vec3::new(0.0, 0.0, 0.0);
        let c2 = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(0.0, projected_distance_sqr(c1, c2, Vec3::new(0.5, 1.0, 0.0)));
        assert_eq!(8.0, projected_distance_sqr(c1, c2, Vec3::new(3.0, -2.0, 0.5)));
    }

    #[test]
    fn corner_index_round_trip() {
        let b = unit_box();
        for x in 0..b.num_partitions[0] {
            for y in 0..b.num_partitions[1] {
                for z in 0..b.num_partitions[2] {
                    let corner = b.partition_corner1([x, y, z]);
                    assert_eq!([x, y, z], b.partition_index(corner));
                }
            }
        }
    }

    #[test]
    fn points_outside_map_to_boundary_cells() {
        let b = unit_box();
        assert_eq!([0, 0, 0], b.partition_index(Vec3::new(-1e3, -1e3, -1e3)));
        let n = b.num_partitions[0] - 1;
        assert_eq!([n, n, n], b.partition_index(Vec3::new(1e3, 1e3, 1e3)));
    }
}
