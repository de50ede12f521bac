//! Create/alter/drop partitioning of desired items against prior descriptors.
//!
//! The same routine is used for top-level entities against a snapshot and
//! for the columns and constraints of a table against its descriptor.
//! Matching is by exact name only.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::item::{Diffable, Named};

/// Result of comparing desired items with their persisted descriptors.
pub struct Partition<'a, T: Diffable> {
    /// Desired items with no descriptor of the same name, in desired order.
    pub create: Vec<&'a T>,
    /// Same-name pairs where the item changed, in desired order.
    pub alter: Vec<(&'a T, &'a T::Descriptor)>,
    /// Descriptors with no desired item of the same name, in prior order.
    pub drop: Vec<&'a T::Descriptor>,
}

impl<T: Diffable> Partition<'_, T> {
    /// Returns `true` if nothing needs to be created, altered or dropped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.alter.is_empty() && self.drop.is_empty()
    }
}

/// Splits `desired` and `prior` into items to create, alter and drop.
pub fn partition<'a, T: Diffable>(
    desired: &'a [T],
    prior: &'a [T::Descriptor],
) -> Partition<'a, T> {
    let mut by_name: HashMap<&str, &T::Descriptor> = HashMap::with_capacity(prior.len());
    for descriptor in prior {
        by_name.entry(descriptor.name()).or_insert(descriptor);
    }

    let mut create = Vec::new();
    let mut alter = Vec::new();
    for item in desired {
        if let Some(old) = item.rename_from() {
            debug!(
                item = item.name(),
                rename_from = old,
                "Rename marker ignored, item is matched by name"
            );
        }
        match by_name.get(item.name()) {
            None => create.push(item),
            Some(descriptor) if item.is_changed(descriptor) => alter.push((item, *descriptor)),
            Some(_) => {}
        }
    }

    let wanted: HashSet<&str> = desired.iter().map(Named::name).collect();
    let drop = prior
        .iter()
        .filter(|descriptor| !wanted.contains(descriptor.name()))
        .collect();

    Partition {
        create,
        alter,
        drop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Thing {
        name: &'static str,
        value: i32,
    }

    impl Named for Thing {
        fn name(&self) -> &str {
            self.name
        }
    }

    impl Diffable for Thing {
        type Descriptor = Self;

        fn is_changed(&self, prior: &Self) -> bool {
            self.value != prior.value
        }
    }

    const fn thing(name: &'static str, value: i32) -> Thing {
        Thing { name, value }
    }

    fn names<T: Named>(items: &[&T]) -> Vec<String> {
        items.iter().map(|i| i.name().to_string()).collect()
    }

    #[test]
    fn test_partition_against_empty_prior_creates_everything() {
        let desired = vec![thing("a", 1), thing("b", 2)];
        let result = partition(&desired, &[]);

        assert_eq!(names(&result.create), vec!["a", "b"]);
        assert!(result.alter.is_empty());
        assert!(result.drop.is_empty());
    }

    #[test]
    fn test_partition_is_idempotent() {
        let desired = vec![thing("a", 1), thing("b", 2), thing("c", 3)];
        let prior = desired.clone();

        assert!(partition(&desired, &prior).is_empty());
    }

    #[test]
    fn test_partition_symmetry() {
        let a = vec![thing("x", 1), thing("y", 2)];
        let b = vec![thing("y", 2), thing("z", 3)];

        let forward = partition(&a, &b);
        let backward = partition(&b, &a);

        assert_eq!(names(&forward.create), names(&backward.drop));
        assert_eq!(names(&forward.drop), names(&backward.create));
    }

    #[test]
    fn test_partition_detects_changes() {
        let desired = vec![thing("a", 1), thing("b", 5)];
        let prior = vec![thing("b", 2), thing("a", 1)];

        let result = partition(&desired, &prior);
        assert!(result.create.is_empty());
        assert!(result.drop.is_empty());
        assert_eq!(result.alter.len(), 1);
        assert_eq!(result.alter[0].0.name, "b");
        assert_eq!(result.alter[0].1.value, 2);
    }

    #[test]
    fn test_partition_order_is_deterministic() {
        let desired = vec![thing("d", 1), thing("c", 1)];
        let prior = vec![thing("b", 1), thing("a", 1)];

        let result = partition(&desired, &prior);
        assert_eq!(names(&result.create), vec!["d", "c"]);
        assert_eq!(names(&result.drop), vec!["b", "a"]);
    }
}
