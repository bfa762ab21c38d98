//! Maximal Marginal Relevance selection.

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Pick up to `k` candidate indices trading relevance against redundancy.
///
/// `query_sims[i]` is candidate `i`'s similarity to the query and
/// `embeddings[i]` its unit-norm embedding. The first pick is the most
/// relevant candidate; each further pick maximizes
/// `lambda * query_sim - (1 - lambda) * max similarity to the picks so far`.
/// Ties go to the lowest index. `k` is clamped to at least 1.
pub fn mmr_select(query_sims: &[f32], embeddings: &[Vec<f32>], k: usize, lambda: f32) -> Vec<usize> {
    let n = query_sims.len().min(embeddings.len());
    let k = k.max(1).min(n);
    if k == 0 {
        return Vec::new();
    }

    let mut first = 0;
    for i in 1..n {
        if query_sims[i] > query_sims[first] {
            first = i;
        }
    }
    let mut selected = vec![first];
    let mut remaining: Vec<usize> = (0..n).filter(|&i| i != first).collect();
    // max similarity of each candidate to anything selected, updated per pick
    let mut redundancy: Vec<f32> = (0..n).map(|i| dot(&embeddings[i], &embeddings[first])).collect();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (pos, &c) in remaining.iter().enumerate() {
            let score = lambda * query_sims[c] - (1.0 - lambda) * redundancy[c];
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }
        let pick = remaining.remove(best_pos);
        for &c in &remaining {
            redundancy[c] = redundancy[c].max(dot(&embeddings[c], &embeddings[pick]));
        }
        selected.push(pick);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_candidate() {
        assert_eq!(mmr_select(&[0.3], &[vec![1.0]], 5, 0.6), vec![0]);
    }

    #[test]
    fn zero_k_is_treated_as_one() {
        let picked = mmr_select(&[0.1, 0.9], &[vec![1.0, 0.0], vec![0.0, 1.0]], 0, 0.5);
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn empty_input() {
        assert!(mmr_select(&[], &[], 3, 0.5).is_empty());
    }
}
