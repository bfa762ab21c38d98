use std::cmp::Ordering;

fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

/// Best `k` positions by score: strictly descending, ties by ascending
/// position. `k` larger than the input is clamped.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let k = k.min(scores.len());
    if k == 0 {
        return Vec::new();
    }
    let mut hits: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    if k < hits.len() {
        hits.select_nth_unstable_by(k - 1, rank_order);
        hits.truncate(k);
    }
    hits.sort_unstable_by(rank_order);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_break_by_position() {
        let hits = top_k(&[0.5, 0.9, 0.5, 0.9, 0.1], 3);
        assert_eq!(hits, vec![(1, 0.9), (3, 0.9), (0, 0.5)]);
    }

    #[test]
    fn k_is_clamped() {
        assert_eq!(top_k(&[0.2, 0.3], 10).len(), 2);
        assert!(top_k(&[0.2], 0).is_empty());
        assert!(top_k(&[], 5).is_empty());
    }
}
