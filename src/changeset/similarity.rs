use similar::{ChangeTag, TextDiff};
use tracing::{trace, warn};

use super::ObjectStore;

/// Ratio of unchanged lines to all lines of a line diff between `old` and `new`.
///
/// Lines are compared with surrounding whitespace trimmed. An unchanged line
/// counts once, inserted and deleted lines count once each. Two empty inputs
/// score 0.
pub fn line_similarity(old: &str, new: &str) -> f64 {
    let old_lines: Vec<&str> = old.lines().map(str::trim).collect();
    let new_lines: Vec<&str> = new.lines().map(str::trim).collect();

    let diff = TextDiff::from_slices(&old_lines, &new_lines);
    let mut unchanged = 0usize;
    let mut total = 0usize;
    for change in diff.iter_all_changes() {
        total += 1;
        if change.tag() == ChangeTag::Equal {
            unchanged += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        unchanged as f64 / total as f64
    }
}

/// Similarity of two blobs. Unreadable content scores 0.
pub fn blob_similarity<S: ObjectStore + ?Sized>(
    store: &S,
    (old_id, old_path): (&str, &str),
    (new_id, new_path): (&str, &str),
) -> f64 {
    if old_id == new_id {
        return 1.0;
    }

    let read = |id: &str, path: &str| {
        store
            .read_blob(id, path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    };
    match (read(old_id, old_path), read(new_id, new_path)) {
        (Ok(old), Ok(new)) => {
            let score = line_similarity(&old, &new);
            trace!(old_path, new_path, score, "computed similarity");
            score
        }
        (Err(e), _) | (_, Err(e)) => {
            warn!(old_path, new_path, error = %e, "failed to compute similarity");
            0.0
        }
    }
}
