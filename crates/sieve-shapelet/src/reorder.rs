/// Visit order that interleaves series by class.
///
/// Cycles through classes in label order, each turn taking the last
/// not-yet-taken series of that class, until every series is placed.
/// Returns positions into `labels`.
#[must_use]
pub fn round_robin_order(labels: &[usize], n_classes: usize) -> Vec<usize> {
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (pos, &label) in labels.iter().enumerate() {
        if let Some(bucket) = by_class.get_mut(label) {
            bucket.push(pos);
        }
    }

    let mut order = Vec::with_capacity(labels.len());
    while by_class.iter().any(|b| !b.is_empty()) {
        for bucket in &mut by_class {
            if let Some(pos) = bucket.pop() {
                order.push(pos);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaves_from_the_back_of_each_class() {
        let labels = [0, 0, 0, 1, 1, 2];
        assert_eq!(round_robin_order(&labels, 3), vec![2, 4, 5, 1, 3, 0]);
    }

    #[test]
    fn is_a_permutation() {
        let labels = [1, 0, 1, 1, 0, 1, 1];
        let mut order = round_robin_order(&labels, 2);
        order.sort_unstable();
        assert_eq!(order, (0..labels.len()).collect::<Vec<_>>());
    }
}
