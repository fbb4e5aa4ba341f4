//! Task identity derived from the submitted URL list.

use sha2::{Digest, Sha256};

use crate::types::TaskId;

/// Derive a task's identifier from its URLs.
///
/// The URLs are hashed one after another in the order given, without sorting
/// or de-duplication, so reordering the same URLs yields a different task and
/// repeating a URL yields yet another one. The result is a 64-character
/// lowercase hex string.
pub fn make_task_id<S: AsRef<str>>(urls: &[S]) -> TaskId {
    let mut hasher = Sha256::new();
    for url in urls {
        hasher.update(url.as_ref().as_bytes());
    }
    TaskId(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_ordered_urls_give_same_id() {
        let a = make_task_id(&["http://x/a.bin", "http://x/b.bin"]);
        let b = make_task_id(&["http://x/a.bin", "http://x/b.bin"]);
        assert_eq!(a, b);
    }

    #[test]
    fn reordering_changes_the_id() {
        let a = make_task_id(&["http://x/a.bin", "http://x/b.bin"]);
        let b = make_task_id(&["http://x/b.bin", "http://x/a.bin"]);
        assert_ne!(a, b);
    }

    #[test]
    fn repeating_a_url_changes_the_id() {
        let once = make_task_id(&["http://x/a.bin"]);
        let twice = make_task_id(&["http://x/a.bin", "http://x/a.bin"]);
        assert_ne!(once, twice);
    }

    #[test]
    fn id_is_fixed_length_lowercase_hex() {
        for urls in [vec!["http://x/a.bin"], vec!["a", "b", "c"], vec![""]] {
            let id = make_task_id(&urls);
            assert_eq!(id.as_str().len(), 64);
            assert!(
                id.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            );
        }
    }

    #[test]
    fn hash_is_over_the_concatenated_urls() {
        // URLs are fed back to back, so the split point does not matter
        assert_eq!(make_task_id(&["ab", "c"]), make_task_id(&["a", "bc"]));
    }
}
