//! Line-level snapshot diff.
//!
//! Only insertions matter to the pipeline, so the engine reports the lines of
//! `new` that are not matched by any line of `old`, in `new` order.
//!
//! The common prefix and suffix are stripped first; the feed is append-mostly,
//! so the remaining middle region is usually tiny. The middle is diffed with
//! the Myers O(ND) shortest-edit algorithm. If the edit distance exceeds
//! `max_edits` the engine gives up on alignment and falls back to a multiset
//! difference.

use std::collections::HashMap;

/// Default edit budget before falling back to the multiset difference.
pub const DEFAULT_MAX_EDITS: usize = 2000;

/// A line of `new` that has no counterpart in `old`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddedLine<'a> {
    /// Zero-based line index in `new`
    pub index: usize,
    pub text: &'a str,
}

/// Which strategy produced the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffStrategy {
    /// Nothing to align (one side of the middle region was empty)
    Trivial,
    Myers,
    /// Edit budget exceeded
    MultisetFallback,
}

/// Result of a line diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiff<'a> {
    pub added: Vec<AddedLine<'a>>,
    pub strategy: DiffStrategy,
}

/// Compute the lines added in `new` relative to `old`.
///
/// Lines are compared without their terminators (`\n` / `\r\n`).
pub fn added_lines<'a>(old: &str, new: &'a str, max_edits: usize) -> LineDiff<'a> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&'a str> = new.lines().collect();

    let prefix = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    let (inserted, strategy) = if b_mid.is_empty() {
        (Vec::new(), DiffStrategy::Trivial)
    } else if a_mid.is_empty() {
        ((0..b_mid.len()).collect(), DiffStrategy::Trivial)
    } else {
        match myers_insertions(a_mid, b_mid, max_edits) {
            Some(ins) => (ins, DiffStrategy::Myers),
            None => (
                multiset_insertions(a_mid, b_mid),
                DiffStrategy::MultisetFallback,
            ),
        }
    };

    let added = inserted
        .into_iter()
        .map(|i| AddedLine {
            index: prefix + i,
            text: b_mid[i],
        })
        .collect();

    LineDiff { added, strategy }
}

/// Myers shortest edit script, returning indices into `b` that are insertions.
///
/// Returns `None` when the edit distance exceeds `max_edits`. Each round's
/// frontier is stored only over the diagonals it can reach, so memory is
/// O(D^2) rather than O(D * (N + M)).
fn myers_insertions(a: &[&str], b: &[&str], max_edits: usize) -> Option<Vec<usize>> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = ((n + m) as usize).min(max_edits) as isize;
    let offset = max + 1;
    let mut v = vec![0isize; (2 * max + 3) as usize];
    let mut trace: Vec<Vec<isize>> = Vec::new();
    let mut found = false;

    'rounds: for d in 0..=max {
        let lo = (offset - d - 1) as usize;
        let hi = (offset + d + 1) as usize;
        trace.push(v[lo..=hi].to_vec());

        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                found = true;
                break 'rounds;
            }
            k += 2;
        }
    }

    if !found {
        return None;
    }

    let mut inserted = Vec::new();
    let (mut x, mut y) = (n, m);
    for (d, snap) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let at = |k: isize| snap[(k + d + 1) as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k);
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            x -= 1;
            y -= 1;
        }
        if d > 0 && x == prev_x {
            inserted.push(prev_y as usize);
        }
        x = prev_x;
        y = prev_y;
    }

    inserted.reverse();
    Some(inserted)
}

/// Each line of `b` consumes one equal line of `a`; unmatched lines are insertions.
fn multiset_insertions(a: &[&str], b: &[&str]) -> Vec<usize> {
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for line in a {
        *remaining.entry(*line).or_insert(0) += 1;
    }

    b.iter()
        .enumerate()
        .filter_map(|(i, line)| match remaining.get_mut(line) {
            Some(count) if *count > 0 => {
                *count -= 1;
                None
            }
            _ => Some(i),
        })
        .collect()
}
