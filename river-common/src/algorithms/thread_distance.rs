use std::collections::HashMap;

/// Running sum of segment length within each River_ID, taken in ascending
/// batch position.
///
/// # Notes
/// - Batch position is discovery order, not flow order. The value is an
///   approximate distance along the thread, not a hydrological downstream distance.
/// - River_ID 0 marks unassigned segments; they are skipped and left at 0.0.
/// - Within a thread the result is non-decreasing and its last value is the
///   total thread length.
pub fn cumulative_distances(lengths: &[f64], river_ids: &[u64]) -> Vec<f64> {
    debug_assert_eq!(lengths.len(), river_ids.len());
    let mut running: HashMap<u64, f64> = HashMap::new();
    lengths
        .iter()
        .zip(river_ids.iter())
        .map(|(&len, &id)| {
            if id == 0 {
                return 0.0;
            }
            let total = running.entry(id).or_insert(0.0);
            *total += len;
            *total
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_prefix_sum_per_thread() {
        let lengths = [1.0, 2.0, 4.0, 8.0];
        let ids = [1, 2, 1, 1];
        let result = cumulative_distances(&lengths, &ids);
        assert_eq!(result, vec![1.0, 2.0, 5.0, 13.0]);
    }

    #[test]
    fn test_singleton_gets_its_own_length() {
        let result = cumulative_distances(&[3.5], &[9]);
        assert!((result[0] - 3.5).abs() < 1e-12, "Expected 3.5, got {}", result[0]);
    }

    #[test]
    fn test_unassigned_segments_stay_zero() {
        let result = cumulative_distances(&[3.0, 4.0, 5.0], &[0, 1, 0]);
        assert_eq!(result, vec![0.0, 4.0, 0.0]);
    }

    #[test]
    fn test_last_value_is_thread_total() {
        let lengths = [0.25, 1.5, 0.0, 2.25, 1.0];
        let ids = [4, 4, 4, 5, 4];
        let result = cumulative_distances(&lengths, &ids);
        let thread: Vec<f64> = result
            .iter()
            .zip(ids.iter())
            .filter(|(_, &id)| id == 4)
            .map(|(&d, _)| d)
            .collect();
        assert!(thread.windows(2).all(|w| w[0] <= w[1]));
        assert!((thread[thread.len() - 1] - 2.75).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_thread_distance_is_monotone_and_sums_to_total(
            rows in prop::collection::vec((0.0f64..500.0, 0u64..5), 0..60)
        ) {
            let (lengths, ids): (Vec<f64>, Vec<u64>) = rows.into_iter().unzip();
            let result = cumulative_distances(&lengths, &ids);
            prop_assert_eq!(result.len(), lengths.len());
            for thread in 0u64..5 {
                let members: Vec<usize> = (0..ids.len()).filter(|&i| ids[i] == thread).collect();
                if thread == 0 {
                    prop_assert!(members.iter().all(|&i| result[i] == 0.0));
                    continue;
                }
                prop_assert!(members.windows(2).all(|w| result[w[0]] <= result[w[1]]));
                if let Some(&last) = members.last() {
                    let total: f64 = members.iter().map(|&i| lengths[i]).sum();
                    prop_assert!((result[last] - total).abs() < 1e-6);
                    prop_assert!((result[members[0]] - lengths[members[0]]).abs() < 1e-12);
                }
            }
        }
    }
}
