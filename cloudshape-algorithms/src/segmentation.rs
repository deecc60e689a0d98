use cloudshape_core::containers::GridIndex;
use rayon::prelude::*;

/// One DBSCAN cluster. `indices` refer to the point set that was clustered and are sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub label: usize,
    pub indices: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Outcome of a DBSCAN run
#[derive(Debug, Clone, Default)]
pub struct Clustering {
    /// Cluster label per input point, `None` for noise
    pub labels: Vec<Option<usize>>,
    /// All clusters in ascending label order
    pub clusters: Vec<Cluster>,
    pub noise_count: usize,
}

/// Density-based spatial clustering (DBSCAN)
///
/// A point is a core point if at least `min_samples` points (the point itself included) lie within
/// distance `eps` of it (inclusive). Clusters grow from core points in input order, so labels are assigned
/// in order of the first core point of each cluster. Border points that are reachable from several
/// clusters belong to the cluster that reaches them first. Points that are not reachable from any core
/// point are noise.
///
/// # Examples
/// ```
/// # use cloudshape_algorithms::segmentation::Dbscan;
/// let points = vec![[0.0, 0.0], [0.5, 0.0], [1.0, 0.0], [10.0, 10.0]];
/// let clustering = Dbscan::new(0.6, 2).cluster(&points);
/// assert_eq!(clustering.clusters.len(), 1);
/// assert_eq!(clustering.clusters[0].indices, vec![0, 1, 2]);
/// assert_eq!(clustering.labels[3], None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    eps: f64,
    min_samples: usize,
}

impl Dbscan {
    /// Panics if `eps` is not positive
    pub fn new(eps: f64, min_samples: usize) -> Self {
        if !(eps.is_finite() && eps > 0.0) {
            panic!("Dbscan::new: eps must be positive and finite, got {eps}");
        }
        Self { eps, min_samples }
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Runs DBSCAN over the given `D`-dimensional points
    pub fn cluster<const D: usize>(&self, points: &[[f64; D]]) -> Clustering {
        let index = GridIndex::new(points.to_vec(), self.eps);
        let is_core: Vec<bool> = points
            .par_iter()
            .map(|p| index.count_within_radius(p, self.eps) >= self.min_samples)
            .collect();

        let mut labels: Vec<Option<usize>> = vec![None; points.len()];
        let mut clusters: Vec<Cluster> = vec![];
        let mut stack = vec![];

        for seed in 0..points.len() {
            if labels[seed].is_some() || !is_core[seed] {
                continue;
            }
            let label = clusters.len();
            let mut members = vec![];
            stack.push(seed);
            while let Some(current) = stack.pop() {
                if labels[current].is_some() {
                    continue;
                }
                labels[current] = Some(label);
                members.push(current);
                if !is_core[current] {
                    continue;
                }
                index.for_each_within_radius(&points[current], self.eps, |neighbour| {
                    if labels[neighbour].is_none() {
                        stack.push(neighbour);
                    }
                });
            }
            members.sort_unstable();
            clusters.push(Cluster {
                label,
                indices: members,
            });
        }

        let noise_count = labels.iter().filter(|l| l.is_none()).count();
        Clustering {
            labels,
            clusters,
            noise_count,
        }
    }
}
