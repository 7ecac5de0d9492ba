//! Exact maximum-clique search.
//!
//! Roots are taken in degeneracy (smallest-last) order; each root's later
//! neighbors form a small candidate set that is searched with a
//! branch-and-bound over bitsets, pruned by greedy colouring (MCQ style).
//! The search is exhaustive: it returns a maximum clique, stopping early only
//! once a clique reaches the caller's upper bound.

use crate::graph::CompatibilityGraph;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Number of high-core roots tried by the greedy seed.
const GREEDY_ROOTS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CliqueOptions {
    /// No clique can be larger than this; reaching it ends the search.
    pub upper_bound: usize,
    /// Seed the lower bound with a greedy dive before branch-and-bound.
    /// Affects speed only, never the size of the result.
    pub greedy_seed: bool,
}

impl Default for CliqueOptions {
    fn default() -> Self {
        Self {
            upper_bound: usize::MAX,
            greedy_seed: false,
        }
    }
}

/// Maximum clique as sorted 1-based vertex ids. Empty only for an empty graph.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(graph), fields(v = graph.n_vertices(), e = graph.n_edges())))]
pub fn max_clique(graph: &CompatibilityGraph, options: &CliqueOptions) -> Vec<u32> {
    let n = graph.n_vertices();
    if n == 0 || options.upper_bound == 0 {
        return Vec::new();
    }

    let (order, position) = degeneracy_order(graph);

    let mut best: Vec<usize> = vec![order[n - 1]];
    if options.greedy_seed {
        let seed = greedy_clique(graph, &order);
        if seed.len() > best.len() {
            best = seed;
        }
    }

    for (i, &root) in order.iter().enumerate() {
        if best.len() >= options.upper_bound {
            break;
        }
        let later: Vec<usize> = graph
            .neighbors(root)
            .iter()
            .map(|&u| u as usize)
            .filter(|&u| position[u] > i)
            .collect();
        if later.len() < best.len() {
            continue;
        }

        let mut search = RootSearch::new(graph, &later, best.len(), options.upper_bound);
        let cand = search.full_set();
        search.expand(cand);
        if let Some(found) = search.best {
            best = std::iter::once(root)
                .chain(found.into_iter().map(|local| later[local]))
                .collect();
        }
    }

    let mut ids: Vec<u32> = best.into_iter().map(|v| v as u32 + 1).collect();
    ids.sort_unstable();
    ids
}

/// Smallest-last vertex order (Batagelj–Zaversnik bucket algorithm).
///
/// Returns the order and each vertex's position in it.
fn degeneracy_order(graph: &CompatibilityGraph) -> (Vec<usize>, Vec<usize>) {
    let n = graph.n_vertices();
    let mut deg: Vec<usize> = (0..n).map(|v| graph.neighbors(v).len()).collect();
    let max_deg = deg.iter().copied().max().unwrap_or(0);

    let mut bin = vec![0usize; max_deg + 1];
    for &d in &deg {
        bin[d] += 1;
    }
    let mut start = 0;
    for slot in bin.iter_mut() {
        let count = *slot;
        *slot = start;
        start += count;
    }

    let mut pos = vec![0usize; n];
    let mut vert = vec![0usize; n];
    for v in 0..n {
        pos[v] = bin[deg[v]];
        vert[pos[v]] = v;
        bin[deg[v]] += 1;
    }
    for d in (1..=max_deg).rev() {
        bin[d] = bin[d - 1];
    }
    bin[0] = 0;

    for i in 0..n {
        let v = vert[i];
        for &u in graph.neighbors(v) {
            let u = u as usize;
            if deg[u] > deg[v] {
                let du = deg[u];
                let pu = pos[u];
                let pw = bin[du];
                let w = vert[pw];
                if u != w {
                    pos[u] = pw;
                    vert[pu] = w;
                    pos[w] = pu;
                    vert[pw] = u;
                }
                bin[du] += 1;
                deg[u] -= 1;
            }
        }
    }

    (vert, pos)
}

/// Greedy dives from the highest-core roots; returns the largest clique seen.
fn greedy_clique(graph: &CompatibilityGraph, order: &[usize]) -> Vec<usize> {
    let mut best = Vec::new();
    for &root in order.iter().rev().take(GREEDY_ROOTS) {
        let mut clique = vec![root];
        let mut cands: Vec<usize> = graph.neighbors(root).iter().map(|&u| u as usize).collect();
        while !cands.is_empty() {
            let pick = cands
                .iter()
                .copied()
                .max_by_key(|&c| cands.iter().filter(|&&o| graph.adjacent(c, o)).count());
            let Some(pick) = pick else {
                break;
            };
            clique.push(pick);
            cands.retain(|&c| c != pick && graph.adjacent(pick, c));
        }
        if clique.len() > best.len() {
            best = clique;
        }
    }
    best
}

/// Branch-and-bound inside the candidate set of one root.
struct RootSearch {
    words: usize,
    len: usize,
    adj: Vec<Vec<u64>>,
    current: Vec<usize>,
    /// Best clique size known so far, root included.
    best_len: usize,
    upper_bound: usize,
    /// Improvement found under this root, in local indices (root excluded).
    best: Option<Vec<usize>>,
}

impl RootSearch {
    fn new(
        graph: &CompatibilityGraph,
        cands: &[usize],
        best_len: usize,
        upper_bound: usize,
    ) -> Self {
        let len = cands.len();
        let words = len.div_ceil(64);
        let mut adj = vec![vec![0u64; words]; len];
        for (i, &a) in cands.iter().enumerate() {
            for (j, &b) in cands.iter().enumerate().skip(i + 1) {
                if graph.adjacent(a, b) {
                    adj[i][j / 64] |= 1 << (j % 64);
                    adj[j][i / 64] |= 1 << (i % 64);
                }
            }
        }
        Self {
            words,
            len,
            adj,
            current: Vec::new(),
            best_len,
            upper_bound,
            best: None,
        }
    }

    fn full_set(&self) -> Vec<u64> {
        let mut set = vec![u64::MAX; self.words];
        let tail = self.len % 64;
        if tail != 0 {
            if let Some(last) = set.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        set
    }

    #[inline]
    fn depth(&self) -> usize {
        1 + self.current.len()
    }

    fn expand(&mut self, mut cand: Vec<u64>) {
        if is_empty(&cand) {
            if self.depth() > self.best_len {
                self.best_len = self.depth();
                self.best = Some(self.current.clone());
            }
            return;
        }

        let (order, colors) = self.color_sort(&cand);
        for idx in (0..order.len()).rev() {
            if self.depth() + colors[idx] <= self.best_len || self.best_len >= self.upper_bound {
                return;
            }
            let v = order[idx];
            self.current.push(v);
            let next: Vec<u64> = cand.iter().zip(&self.adj[v]).map(|(a, b)| a & b).collect();
            self.expand(next);
            self.current.pop();
            cand[v / 64] &= !(1 << (v % 64));
        }
    }

    /// Greedy colouring; colours are non-decreasing along the returned order.
    fn color_sort(&self, cand: &[u64]) -> (Vec<usize>, Vec<usize>) {
        let mut uncolored = cand.to_vec();
        let mut order = Vec::new();
        let mut colors = Vec::new();
        let mut color = 0;
        while !is_empty(&uncolored) {
            color += 1;
            let mut q = uncolored.clone();
            while let Some(v) = first_bit(&q) {
                q[v / 64] &= !(1 << (v % 64));
                uncolored[v / 64] &= !(1 << (v % 64));
                for (w, a) in q.iter_mut().zip(&self.adj[v]) {
                    *w &= !a;
                }
                order.push(v);
                colors.push(color);
            }
        }
        (order, colors)
    }
}

#[inline]
fn is_empty(set: &[u64]) -> bool {
    set.iter().all(|&w| w == 0)
}

#[inline]
fn first_bit(set: &[u64]) -> Option<usize> {
    for (i, &w) in set.iter().enumerate() {
        if w != 0 {
            return Some(i * 64 + w.trailing_zeros() as usize);
        }
    }
    None
}
