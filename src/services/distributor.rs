//! Even/remainder partitioning of an upload batch across annotators.

use thiserror::Error;

use crate::domain::normalize_name;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DistributeError {
    #[error("At least one annotator name is required")]
    EmptyRoster,
}

/// Parses the comma-separated `assigned_to` form value into normalized
/// display names, dropping blank entries.
#[must_use]
pub fn parse_roster(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_name)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Splits `items` into contiguous, order-preserving slices, one per name.
///
/// With `N` items and `M` names every name gets `N / M` items and the first
/// `N % M` names get one extra. Names that receive nothing still appear in
/// the output with an empty slice.
pub fn distribute<T>(
    items: Vec<T>,
    names: &[String],
) -> Result<Vec<(String, Vec<T>)>, DistributeError> {
    if names.is_empty() {
        return Err(DistributeError::EmptyRoster);
    }

    let base = items.len() / names.len();
    let remainder = items.len() % names.len();

    let mut rest = items.into_iter();
    let assignments = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let take = if i < remainder { base + 1 } else { base };
            (name.clone(), rest.by_ref().take(take).collect())
        })
        .collect();

    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("A{i}")).collect()
    }

    fn sizes(assignments: &[(String, Vec<usize>)]) -> Vec<usize> {
        assignments.iter().map(|(_, slice)| slice.len()).collect()
    }

    #[test]
    fn ten_images_three_annotators() {
        let out = distribute((0..10).collect(), &names(3)).unwrap();
        assert_eq!(sizes(&out), vec![4, 3, 3]);
        assert_eq!(out[0].1, vec![0, 1, 2, 3]);
        assert_eq!(out[1].1, vec![4, 5, 6]);
        assert_eq!(out[2].1, vec![7, 8, 9]);
    }

    #[test]
    fn fewer_images_than_annotators() {
        let out = distribute((0..2).collect(), &names(5)).unwrap();
        assert_eq!(sizes(&out), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn empty_roster_fails_fast() {
        let err = distribute(vec![1, 2, 3], &[]).unwrap_err();
        assert_eq!(err, DistributeError::EmptyRoster);
    }

    #[test]
    fn slices_are_balanced_for_all_small_inputs() {
        for n in 0..40 {
            for m in 1..9 {
                let out = distribute((0..n).collect(), &names(m)).unwrap();
                let sizes = sizes(&out);

                assert_eq!(sizes.iter().sum::<usize>(), n);
                let max = *sizes.iter().max().unwrap();
                let min = *sizes.iter().min().unwrap();
                assert!(max - min <= 1, "n={n} m={m} sizes={sizes:?}");

                for (i, size) in sizes.iter().enumerate() {
                    let expected = n / m + usize::from(i < n % m);
                    assert_eq!(*size, expected);
                }

                let flattened: Vec<usize> = out.into_iter().flat_map(|(_, s)| s).collect();
                assert_eq!(flattened, (0..n).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn duplicate_names_keep_their_own_slices() {
        let roster = vec!["ANN".to_string(), "ANN".to_string()];
        let out = distribute(vec![1, 2, 3], &roster).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].1, vec![1, 2]);
        assert_eq!(out[1].1, vec![3]);
    }

    #[test]
    fn roster_is_trimmed_and_uppercased() {
        assert_eq!(parse_roster("alice, bob,,  "), vec!["ALICE", "BOB"]);
        assert!(parse_roster(" , ").is_empty());
    }
}
