//! Hamming-distance descriptor matching with ratio test and cross-check.

use super::descriptor::Descriptor;

/// A pair of descriptor indices with their Hamming distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureMatch {
    pub left: usize,
    pub right: usize,
    pub distance: u32,
}

fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}

/// Best and second-best candidate over `candidates` for one query.
fn best_two(query: &Descriptor, candidates: &[Descriptor]) -> Option<(usize, u32, u32)> {
    let mut best = u32::MAX;
    let mut second = u32::MAX;
    let mut best_idx = 0usize;
    for (idx, cand) in candidates.iter().enumerate() {
        let d = hamming_distance(query, cand);
        if d < best {
            second = best;
            best = d;
            best_idx = idx;
        } else if d < second {
            second = d;
        }
    }
    if best == u32::MAX {
        None
    } else {
        Some((best_idx, best, second))
    }
}

/// Match descriptors with a nearest/second-nearest ratio test, cross-checked
/// in both directions: a match is accepted only when it is mutually best and
/// passes the ratio gate on the forward side.
pub fn match_descriptors_ratio_cross(
    left: &[Descriptor],
    right: &[Descriptor],
    ratio: f32,
) -> Vec<FeatureMatch> {
    if left.is_empty() || right.is_empty() {
        return Vec::new();
    }

    // Reverse best per right descriptor, for the mutual-best check.
    let reverse_best: Vec<Option<usize>> = right
        .iter()
        .map(|r| best_two(r, left).map(|(idx, _, _)| idx))
        .collect();

    let mut matches = Vec::new();
    for (l_idx, l_desc) in left.iter().enumerate() {
        let Some((r_idx, best, second)) = best_two(l_desc, right) else {
            continue;
        };
        // Ratio test: best must be clearly better than the runner-up. A
        // single candidate (second == MAX) passes by construction.
        if second != u32::MAX && (best as f32) >= ratio * second as f32 {
            continue;
        }
        if reverse_best[r_idx] != Some(l_idx) {
            continue;
        }
        matches.push(FeatureMatch {
            left: l_idx,
            right: r_idx,
            distance: best,
        });
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::DESCRIPTOR_BYTES;

    fn desc(fill: u8) -> Descriptor {
        [fill; DESCRIPTOR_BYTES]
    }

    /// Descriptor with `n` leading bits flipped relative to `base`.
    fn desc_with_flips(base: u8, n: usize) -> Descriptor {
        let mut d = desc(base);
        for bit in 0..n {
            d[bit / 8] ^= 1 << (bit % 8);
        }
        d
    }

    #[test]
    fn identical_sets_match_one_to_one() {
        let left = vec![desc(0b0000_0000), desc(0b1111_1111), desc(0b1010_1010)];
        let right = left.clone();
        let matches = match_descriptors_ratio_cross(&left, &right, 0.76);
        assert_eq!(matches.len(), 3);
        for m in &matches {
            assert_eq!(m.left, m.right);
            assert_eq!(m.distance, 0);
        }
    }

    #[test]
    fn ratio_test_rejects_ambiguous_matches() {
        // Two right candidates nearly equidistant from the query.
        let left = vec![desc_with_flips(0, 8)];
        let right = vec![desc_with_flips(0, 0), desc_with_flips(0, 16)];
        // distances: 8 and 8 -> ratio 1.0, rejected.
        let matches = match_descriptors_ratio_cross(&left, &right, 0.76);
        assert!(matches.is_empty());
    }

    #[test]
    fn cross_check_requires_mutual_best() {
        // l0 prefers r0, but r0 prefers l1: no match for l0.
        let left = vec![desc_with_flips(0, 6), desc_with_flips(0, 1)];
        let right = vec![desc(0), desc(0b1111_1111)];
        let matches = match_descriptors_ratio_cross(&left, &right, 0.9);
        assert!(matches.iter().all(|m| m.left != 0));
        assert!(matches.iter().any(|m| m.left == 1 && m.right == 0));
    }

    #[test]
    fn empty_inputs_match_nothing() {
        assert!(match_descriptors_ratio_cross(&[], &[desc(0)], 0.76).is_empty());
        assert!(match_descriptors_ratio_cross(&[desc(0)], &[], 0.76).is_empty());
    }
}
