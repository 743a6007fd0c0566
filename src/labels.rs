// src/labels.rs
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Emitted when no usable hand is present in a frame.
pub const NO_HAND: &str = "NO_HAND";
/// Emitted when a classifier collaborator fails.
pub const ERROR: &str = "ERROR";

/// Output classes of both classifiers, in model output order.
pub const SIGN_CLASSES: [&str; 32] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M",
    "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
    "HELLO", "PLEASE", "THANK_YOU", "SORRY", "YES", "NO",
];

static CLASS_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    SIGN_CLASSES
        .iter()
        .enumerate()
        .map(|(i, label)| (*label, i))
        .collect()
});

pub fn class_count() -> usize {
    SIGN_CLASSES.len()
}

pub fn label(index: usize) -> Option<&'static str> {
    SIGN_CLASSES.get(index).copied()
}

pub fn index_of(label: &str) -> Option<usize> {
    CLASS_INDEX.get(label).copied()
}

pub fn is_sentinel(label: &str) -> bool {
    label == NO_HAND || label == ERROR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_set_layout() {
        assert_eq!(class_count(), 32);
        assert_eq!(label(0), Some("A"));
        assert_eq!(label(25), Some("Z"));
        assert_eq!(label(26), Some("HELLO"));
        assert_eq!(label(31), Some("NO"));
        assert_eq!(label(32), None);
    }

    #[test]
    fn test_index_lookup() {
        assert_eq!(index_of("THANK_YOU"), Some(28));
        assert_eq!(index_of("NO_HAND"), None);
        assert!(is_sentinel(NO_HAND));
        assert!(is_sentinel(ERROR));
        assert!(!is_sentinel("A"));
    }
}
