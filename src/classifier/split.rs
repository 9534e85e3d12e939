//! Stratified train/test split.
//!
//! Each class is shuffled independently with a seeded RNG and the same
//! fraction of it is held out, so class balance survives the split and the
//! same seed always yields the same partition.

use crate::typology::Typology;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Row indices, ascending
    pub train: Vec<usize>,
    /// Row indices, ascending
    pub test: Vec<usize>,
}

/// Partition row indices by label.
///
/// With a positive `test_size`, every class with at least two rows
/// contributes at least one test row and keeps at least one training row.
/// Singleton classes stay in training. A `test_size` of 0 holds nothing out.
pub fn stratified_split(labels: &[Typology], test_size: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in Typology::CANONICAL {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == class)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            continue;
        }

        members.shuffle(&mut rng);

        let n = members.len();
        let n_test = if n < 2 || test_size <= 0.0 {
            0
        } else {
            ((n as f64 * test_size).round() as usize).clamp(1, n - 1)
        };

        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Split { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<Typology> {
        let mut labels = Vec::new();
        labels.extend(std::iter::repeat(Typology::Agglutinative).take(40));
        labels.extend(std::iter::repeat(Typology::Fusional).take(30));
        labels.extend(std::iter::repeat(Typology::Isolating).take(20));
        labels
    }

    fn count(labels: &[Typology], indices: &[usize], class: Typology) -> usize {
        indices.iter().filter(|&&i| labels[i] == class).count()
    }

    #[test]
    fn test_split_preserves_class_balance() {
        let labels = labels();
        let split = stratified_split(&labels, 0.1, 42);

        assert_eq!(count(&labels, &split.test, Typology::Agglutinative), 4);
        assert_eq!(count(&labels, &split.test, Typology::Fusional), 3);
        assert_eq!(count(&labels, &split.test, Typology::Isolating), 2);
        assert_eq!(split.train.len() + split.test.len(), labels.len());
    }

    #[test]
    fn test_split_is_a_partition() {
        let labels = labels();
        let split = stratified_split(&labels, 0.25, 7);

        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..labels.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let labels = labels();
        assert_eq!(stratified_split(&labels, 0.1, 42), stratified_split(&labels, 0.1, 42));
        assert_ne!(
            stratified_split(&labels, 0.1, 42).test,
            stratified_split(&labels, 0.1, 43).test
        );
    }

    #[test]
    fn test_singleton_class_stays_in_training() {
        let labels = vec![Typology::Fusional, Typology::Isolating, Typology::Isolating];
        let split = stratified_split(&labels, 0.1, 42);
        assert!(split.train.contains(&0));
        assert_eq!(split.test.len(), 1);
    }

    #[test]
    fn test_zero_test_size_holds_nothing_out() {
        let labels = labels();
        let split = stratified_split(&labels, 0.0, 42);

        assert!(split.test.is_empty());
        assert_eq!(split.train, (0..labels.len()).collect::<Vec<_>>());
    }
}
