//! Deterministic, stratified dataset splitting.
//!
//! All shuffling uses a seeded LCG so a run with the same seed and the same
//! rows always produces the same train/test partition and folds.

/// Shuffles indices using a simple LCG-based shuffle.
pub fn shuffle_indices(indices: &mut [usize], seed: u64) {
    // Simple Fisher-Yates shuffle with LCG random
    let mut rng_state = seed.wrapping_add(12345);

    for i in (1..indices.len()).rev() {
        // LCG: state = (a * state + c) mod m
        rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let j = ((rng_state >> 33) as usize) % (i + 1);
        indices.swap(i, j);
    }
}

/// Splits row indices into train and test sets, preserving the class ratio
/// on both sides. Returns `(train, test)`.
#[must_use]
pub fn stratified_split(y: &[bool], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [false, true] {
        let mut members: Vec<usize> = y
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            continue;
        }

        shuffle_indices(&mut members, seed.wrapping_add(u64::from(class)));
        let n_test = (members.len() as f64 * test_fraction).round() as usize;
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Produces `k` stratified folds as `(train, test)` index pairs.
///
/// Callers must ensure `2 <= k <= y.len()`; each class's shuffled members
/// are dealt round-robin across folds.
#[must_use]
pub fn stratified_kfold(y: &[bool], k: usize, seed: u64) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];

    for class in [false, true] {
        let mut members: Vec<usize> = y
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();
        shuffle_indices(&mut members, seed.wrapping_add(u64::from(class)));

        for (position, index) in members.into_iter().enumerate() {
            folds[position % k].push(index);
        }
    }

    (0..k)
        .map(|fold| {
            let mut test = folds[fold].clone();
            let mut train: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != fold)
                .flat_map(|(_, members)| members.iter().copied())
                .collect();
            train.sort_unstable();
            test.sort_unstable();
            (train, test)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(positives: usize, negatives: usize) -> Vec<bool> {
        let mut y = vec![true; positives];
        y.extend(vec![false; negatives]);
        y
    }

    #[test]
    fn test_shuffle_indices() {
        let mut indices: Vec<usize> = (0..10).collect();
        let original = indices.clone();

        shuffle_indices(&mut indices, 42);

        // Should be permuted (very unlikely to be the same)
        assert_ne!(indices, original, "Shuffle should change order");

        // Should contain the same elements
        indices.sort_unstable();
        assert_eq!(indices, original, "Shuffle should preserve elements");
    }

    #[test]
    fn test_stratified_split_is_a_partition() {
        let y = labels(10, 30);
        let (train, test) = stratified_split(&y, 0.2, 42);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn test_stratified_split_preserves_class_ratio() {
        let y = labels(10, 30);
        let (train, test) = stratified_split(&y, 0.2, 42);

        assert_eq!(test.len(), 8);
        assert_eq!(test.iter().filter(|&&i| y[i]).count(), 2);
        assert_eq!(train.iter().filter(|&&i| y[i]).count(), 8);
    }

    #[test]
    fn test_stratified_split_deterministic() {
        let y = labels(12, 28);
        assert_eq!(stratified_split(&y, 0.2, 7), stratified_split(&y, 0.2, 7));
        assert_ne!(stratified_split(&y, 0.2, 7), stratified_split(&y, 0.2, 8));
    }

    #[test]
    fn test_kfold_covers_every_row_once() {
        let y = labels(9, 21);
        let folds = stratified_kfold(&y, 5, 42);
        assert_eq!(folds.len(), 5);

        let mut seen: Vec<usize> = folds.iter().flat_map(|(_, test)| test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..30).collect::<Vec<_>>());

        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 30);
            assert!(test.iter().all(|i| !train.contains(i)));
        }
    }

    #[test]
    fn test_kfold_spreads_positives() {
        let y = labels(10, 20);
        for (_, test) in stratified_kfold(&y, 5, 42) {
            assert_eq!(test.iter().filter(|&&i| y[i]).count(), 2);
        }
    }
}
