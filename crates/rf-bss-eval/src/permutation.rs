//! Lexicographic permutation enumeration

/// `n!`, or `None` on overflow
pub fn factorial(n: usize) -> Option<usize> {
    (1..=n).try_fold(1usize, |acc, k| acc.checked_mul(k))
}

/// Iterator over all permutations of `0..n` in lexicographic order.
///
/// The identity comes first. `n = 0` yields a single empty permutation.
#[derive(Debug, Clone)]
pub struct Permutations {
    current: Option<Vec<usize>>,
}

impl Permutations {
    pub fn new(n: usize) -> Self {
        Self {
            current: Some((0..n).collect()),
        }
    }
}

impl Iterator for Permutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let out = self.current.take()?;
        let mut next = out.clone();
        if advance(&mut next) {
            self.current = Some(next);
        }
        Some(out)
    }
}

/// Step to the next permutation in place; false once the last one is reached
fn advance(p: &mut [usize]) -> bool {
    if p.len() < 2 {
        return false;
    }
    // Longest non-increasing suffix
    let mut i = p.len() - 1;
    while i > 0 && p[i - 1] >= p[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = p.len() - 1;
    while p[j] <= p[i - 1] {
        j -= 1;
    }
    p.swap(i - 1, j);
    p[i..].reverse();
    true
}
