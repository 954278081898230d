// THEORY:
// The `DensityClusterer` is the spatial grouping engine of the cluster layer. It
// implements DBSCAN over pixel coordinates: activation pixels that sit densely
// together form a cluster, stray pixels are noise.
//
// Algorithm steps:
// 1.  **Spatial Hashing**: Points are bucketed into square cells whose side is the
//     neighbourhood radius, so a radius query only has to look at the 3x3 block
//     of cells around a point instead of every other point.
// 2.  **Core Detection**: A point is a core point when at least `min_neighbors`
//     points (itself included) lie within Euclidean distance `radius`, inclusive.
// 3.  **Cluster Growing**: Each unlabelled core point seeds a new cluster that is
//     grown breadth-first. Every neighbour of a core point joins the cluster;
//     only core neighbours keep expanding it. This is the same region-growing
//     walk the blob detector does, with density in place of heat.
// 4.  **Noise**: Points no core point can reach keep the `Noise` label.
//
// Cluster sizes depend only on the point set, not on its order, whenever every
// reachable point is a core point. With `min_neighbors <= 2` that is always the
// case, because any point close enough to join a cluster is itself core.

use std::collections::{HashMap, VecDeque};

/// A foreground pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeaturePoint {
    pub row: u32,
    pub col: u32,
}

impl FeaturePoint {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    fn distance_squared(&self, other: &FeaturePoint) -> f64 {
        let dr = self.row as f64 - other.row as f64;
        let dc = self.col as f64 - other.col as f64;
        dr * dr + dc * dc
    }
}

/// Cluster membership of one point. Ids carry no ordering meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterLabel {
    Noise,
    Cluster(usize),
}

impl ClusterLabel {
    /// The conventional integer form: `-1` for noise, the cluster id otherwise.
    pub fn as_i64(&self) -> i64 {
        match self {
            ClusterLabel::Noise => -1,
            ClusterLabel::Cluster(id) => *id as i64,
        }
    }
}

/// Output of one clustering call.
#[derive(Debug, Clone, Default)]
pub struct Clustering {
    /// One label per input point, in input order.
    pub labels: Vec<ClusterLabel>,
    /// Member count of every cluster, indexed by cluster id.
    pub sizes: Vec<usize>,
}

impl Clustering {
    pub fn cluster_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|label| **label == ClusterLabel::Noise).count()
    }

    /// Clusters with at least `min_pixels` members.
    pub fn significant_clusters(&self, min_pixels: usize) -> usize {
        self.sizes.iter().filter(|size| **size >= min_pixels).count()
    }
}

/// DBSCAN with a fixed radius and core-point threshold.
#[derive(Debug, Clone, Copy)]
pub struct DensityClusterer {
    radius: f64,
    min_neighbors: usize,
}

impl DensityClusterer {
    pub fn new(radius: f64, min_neighbors: usize) -> Self {
        Self {
            radius: radius.max(0.0),
            min_neighbors,
        }
    }

    pub fn fit(&self, points: &[FeaturePoint]) -> Clustering {
        if points.is_empty() {
            return Clustering::default();
        }

        let neighborhoods = self.neighborhoods(points);
        let is_core: Vec<bool> = neighborhoods
            .iter()
            .map(|neighbors| neighbors.len() >= self.min_neighbors)
            .collect();

        let mut labels = vec![ClusterLabel::Noise; points.len()];
        let mut assigned = vec![false; points.len()];
        let mut sizes = Vec::new();
        let mut queue = VecDeque::new();

        for seed in 0..points.len() {
            if assigned[seed] || !is_core[seed] {
                continue;
            }

            let cluster_id = sizes.len();
            let mut size = 1;
            assigned[seed] = true;
            labels[seed] = ClusterLabel::Cluster(cluster_id);
            queue.push_back(seed);

            while let Some(current) = queue.pop_front() {
                if !is_core[current] {
                    continue;
                }
                for &neighbor in &neighborhoods[current] {
                    if assigned[neighbor] {
                        continue;
                    }
                    assigned[neighbor] = true;
                    labels[neighbor] = ClusterLabel::Cluster(cluster_id);
                    size += 1;
                    queue.push_back(neighbor);
                }
            }

            sizes.push(size);
        }

        Clustering { labels, sizes }
    }

    /// Indices of every point within `radius` of each point, the point included.
    fn neighborhoods(&self, points: &[FeaturePoint]) -> Vec<Vec<usize>> {
        let cell_size = self.radius.ceil().max(1.0);
        let cell_of = |point: &FeaturePoint| -> (i64, i64) {
            (
                (point.row as f64 / cell_size).floor() as i64,
                (point.col as f64 / cell_size).floor() as i64,
            )
        };

        let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (index, point) in points.iter().enumerate() {
            grid.entry(cell_of(point)).or_default().push(index);
        }

        let radius_squared = self.radius * self.radius;
        points
            .iter()
            .map(|point| {
                let (cell_row, cell_col) = cell_of(point);
                let mut neighbors = Vec::new();
                for dr in -1..=1 {
                    for dc in -1..=1 {
                        let Some(bucket) = grid.get(&(cell_row + dr, cell_col + dc)) else {
                            continue;
                        };
                        neighbors.extend(
                            bucket
                                .iter()
                                .copied()
                                .filter(|&other| point.distance_squared(&points[other]) <= radius_squared),
                        );
                    }
                }
                neighbors
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(row: u32, col: u32) -> Vec<FeaturePoint> {
        // A plus sign: five points, all within radius 2 of each other.
        vec![
            FeaturePoint::new(row, col),
            FeaturePoint::new(row - 1, col),
            FeaturePoint::new(row + 1, col),
            FeaturePoint::new(row, col - 1),
            FeaturePoint::new(row, col + 1),
        ]
    }

    fn sorted_sizes(clustering: &Clustering) -> Vec<usize> {
        let mut sizes = clustering.sizes.clone();
        sizes.sort();
        sizes
    }

    #[test]
    fn empty_input_has_no_clusters() {
        let clustering = DensityClusterer::new(2.0, 2).fit(&[]);
        assert_eq!(clustering.cluster_count(), 0);
        assert!(clustering.labels.is_empty());
    }

    #[test]
    fn two_disjoint_blobs_are_two_clusters() {
        let mut points = blob(5, 5);
        points.extend(blob(5, 20));
        let clustering = DensityClusterer::new(2.0, 2).fit(&points);
        assert_eq!(sorted_sizes(&clustering), vec![5, 5]);
        assert_eq!(clustering.significant_clusters(3), 2);
        assert_eq!(clustering.noise_count(), 0);
    }

    #[test]
    fn isolated_points_are_noise() {
        let mut points = blob(10, 10);
        points.extend([
            FeaturePoint::new(0, 0),
            FeaturePoint::new(0, 30),
            FeaturePoint::new(30, 0),
            FeaturePoint::new(30, 30),
        ]);
        let clustering = DensityClusterer::new(2.0, 2).fit(&points);
        assert_eq!(clustering.sizes, vec![5]);
        assert_eq!(clustering.noise_count(), 4);
        assert_eq!(clustering.labels[5].as_i64(), -1);
        assert_eq!(clustering.significant_clusters(3), 1);
    }

    #[test]
    fn radius_is_inclusive() {
        let pair = [FeaturePoint::new(0, 0), FeaturePoint::new(0, 2)];
        assert_eq!(DensityClusterer::new(2.0, 2).fit(&pair).sizes, vec![2]);

        let apart = [FeaturePoint::new(0, 0), FeaturePoint::new(0, 3)];
        assert_eq!(DensityClusterer::new(2.0, 2).fit(&apart).noise_count(), 2);

        // sqrt(5) > 2
        let knight = [FeaturePoint::new(0, 0), FeaturePoint::new(1, 2)];
        assert_eq!(DensityClusterer::new(2.0, 2).fit(&knight).cluster_count(), 0);
    }

    #[test]
    fn chains_link_into_one_cluster() {
        let line: Vec<FeaturePoint> = (0..40).step_by(2).map(|col| FeaturePoint::new(3, col)).collect();
        let clustering = DensityClusterer::new(2.0, 2).fit(&line);
        assert_eq!(clustering.sizes, vec![20]);
    }

    #[test]
    fn border_points_join_but_do_not_expand() {
        // With three required neighbours the ends of a spaced line are border points.
        let line: Vec<FeaturePoint> = (0..5).map(|col| FeaturePoint::new(0, col * 2)).collect();
        let clustering = DensityClusterer::new(2.0, 3).fit(&line);
        assert_eq!(clustering.sizes, vec![5]);

        let lonely_pair = [FeaturePoint::new(0, 0), FeaturePoint::new(0, 1)];
        assert_eq!(DensityClusterer::new(2.0, 3).fit(&lonely_pair).noise_count(), 2);
    }

    #[test]
    fn result_does_not_depend_on_point_order() {
        let mut points = blob(5, 5);
        points.extend(blob(5, 9));
        points.extend(blob(30, 30));
        points.push(FeaturePoint::new(50, 50));

        let forward = DensityClusterer::new(2.0, 2).fit(&points);
        points.reverse();
        let reversed = DensityClusterer::new(2.0, 2).fit(&points);
        points.rotate_left(7);
        let rotated = DensityClusterer::new(2.0, 2).fit(&points);

        assert_eq!(sorted_sizes(&forward), sorted_sizes(&reversed));
        assert_eq!(sorted_sizes(&forward), sorted_sizes(&rotated));
        assert_eq!(forward.noise_count(), 1);
    }

    #[test]
    fn min_pixels_filters_small_clusters() {
        let mut points = blob(5, 5);
        points.extend([FeaturePoint::new(20, 20), FeaturePoint::new(20, 21)]);
        let clustering = DensityClusterer::new(2.0, 2).fit(&points);
        assert_eq!(clustering.cluster_count(), 2);
        assert_eq!(clustering.significant_clusters(3), 1);
        assert_eq!(clustering.significant_clusters(6), 0);
    }
}
