//! Density-based clustering of scalar values.
//!
//! A small 1-D DBSCAN used by the multi-line fallback to recover the
//! horizontal print lines of a scheme from diagram y-centers. Noise points
//! receive the label `-1`; clusters are numbered from 0 in discovery
//! order.

/// Labels `values` with DBSCAN over the 1-D Euclidean metric.
///
/// A point is a core point when at least `min_samples` values (itself
/// included) lie within `eps` of it.
pub(crate) fn dbscan_1d(values: &[f32], eps: f32, min_samples: usize) -> Vec<i32> {
    const UNVISITED: i32 = -2;
    const NOISE: i32 = -1;

    let n = values.len();
    let mut labels = vec![UNVISITED; n];
    let mut cluster = 0i32;

    let region_query = |i: usize| -> Vec<usize> {
        (0..n)
            .filter(|&j| (values[j] - values[i]).abs() <= eps)
            .collect()
    };

    for i in 0..n {
        if labels[i] != UNVISITED {
            continue;
        }
        let neighbours = region_query(i);
        if neighbours.len() < min_samples {
            labels[i] = NOISE;
            continue;
        }

        labels[i] = cluster;
        let mut seeds = neighbours;
        let mut idx = 0;
        while idx < seeds.len() {
            let j = seeds[idx];
            idx += 1;
            if labels[j] == NOISE {
                labels[j] = cluster;
            }
            if labels[j] != UNVISITED {
                continue;
            }
            labels[j] = cluster;
            let expansion = region_query(j);
            if expansion.len() >= min_samples {
                seeds.extend(expansion);
            }
        }
        cluster += 1;
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_clusters() {
        let values = [10.0, 12.0, 11.0, 100.0, 103.0];
        let labels = dbscan_1d(&values, 5.0, 2);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_isolated_point_is_noise() {
        let values = [10.0, 11.0, 500.0];
        let labels = dbscan_1d(&values, 5.0, 2);
        assert_eq!(labels[2], -1);
    }

    #[test]
    fn test_chained_density_expansion() {
        // Consecutive values each within eps of the next form one cluster.
        let values = [0.0, 4.0, 8.0, 12.0];
        let labels = dbscan_1d(&values, 5.0, 2);
        assert!(labels.iter().all(|&l| l == labels[0]));
    }
}
