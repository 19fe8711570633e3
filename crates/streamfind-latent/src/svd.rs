//! Randomized truncated SVD for sparse matrices.
//!
//! Range finder with subspace (power) iteration, then an exact eigen
//! decomposition of the small `B·Bᵗ` projection via cyclic Jacobi rotations.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::tfidf::SparseMatrix;

const RANK_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct SvdParams {
    pub components: usize,
    pub oversample: usize,
    pub power_iterations: usize,
    pub seed: u64,
}

/// `A ≈ U·diag(S)·Vᵗ`, components sorted by singular value descending.
#[derive(Debug, Clone)]
pub struct Svd {
    /// rows × k
    pub u: Dense,
    pub s: Vec<f64>,
    /// k × cols
    pub vt: Dense,
}

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Dense {
    pub fn zeros(rows: usize, cols: usize) -> Self { Self { rows, cols, data: vec![0.0; rows * cols] } }

    pub fn row(&self, i: usize) -> &[f64] { &self.data[i * self.cols..(i + 1) * self.cols] }

    fn row_mut(&mut self, i: usize) -> &mut [f64] { &mut self.data[i * self.cols..(i + 1) * self.cols] }

    pub fn get(&self, i: usize, j: usize) -> f64 { self.data[i * self.cols + j] }

    fn set(&mut self, i: usize, j: usize, v: f64) { self.data[i * self.cols + j] = v; }

    /// Modified Gram-Schmidt over columns; collapsed columns become zero.
    fn orthonormalize_columns(&mut self) {
        for j in 0..self.cols {
            for p in 0..j {
                let dot: f64 = (0..self.rows).map(|i| self.get(i, j) * self.get(i, p)).sum();
                for i in 0..self.rows {
                    let basis = self.get(i, p);
                    self.data[i * self.cols + j] -= dot * basis;
                }
            }
            let norm = (0..self.rows).map(|i| self.get(i, j).powi(2)).sum::<f64>().sqrt();
            let scale = if norm > 1e-10 { 1.0 / norm } else { 0.0 };
            for i in 0..self.rows { self.data[i * self.cols + j] *= scale; }
        }
    }
}

/// `A · D` for `D` of shape `a.cols × l`.
fn mul(a: &SparseMatrix, d: &Dense) -> Dense {
    let mut out = Dense::zeros(a.rows.len(), d.cols);
    for (i, row) in a.rows.iter().enumerate() {
        let target = out.row_mut(i);
        for &(j, v) in row {
            for (t, x) in target.iter_mut().zip(d.row(j)) { *t += f64::from(v) * x; }
        }
    }
    out
}

/// `Aᵗ · D` for `D` of shape `a.rows × l`.
fn mul_transposed(a: &SparseMatrix, d: &Dense) -> Dense {
    let mut out = Dense::zeros(a.cols, d.cols);
    for (i, row) in a.rows.iter().enumerate() {
        let src = d.row(i);
        for &(j, v) in row {
            for (t, x) in out.row_mut(j).iter_mut().zip(src) { *t += f64::from(v) * x; }
        }
    }
    out
}

/// Effective number of components for a `rows × cols` matrix.
pub fn effective_rank(requested: usize, rows: usize, cols: usize) -> usize { requested.min(rows).min(cols) }

pub fn randomized_svd(a: &SparseMatrix, params: SvdParams) -> Svd {
    let (n, m) = (a.rows.len(), a.cols);
    let k = effective_rank(params.components, n, m);
    let l = (k + params.oversample).min(n).min(m);
    debug!(rows = n, cols = m, k, l, nnz = a.nnz(), "randomized svd");
    if k == 0 { return Svd { u: Dense::zeros(n, 0), s: Vec::new(), vt: Dense::zeros(0, m) }; }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut omega = Dense::zeros(m, l);
    for x in &mut omega.data { *x = rng.gen_range(-1.0..1.0); }

    let mut q = mul(a, &omega);
    q.orthonormalize_columns();
    for _ in 0..params.power_iterations {
        let mut z = mul_transposed(a, &q);
        z.orthonormalize_columns();
        q = mul(a, &z);
        q.orthonormalize_columns();
    }

    // B = Qᵗ·A is l × m; keep it transposed as C = Aᵗ·Q (m × l).
    let c = mul_transposed(a, &q);
    let mut gram = Dense::zeros(l, l);
    for p in 0..l {
        for r in p..l {
            let v: f64 = (0..m).map(|i| c.get(i, p) * c.get(i, r)).sum();
            gram.set(p, r, v);
            gram.set(r, p, v);
        }
    }
    let (eigenvalues, w) = jacobi_eigen(gram);

    let mut order: Vec<usize> = (0..l).collect();
    order.sort_by(|&x, &y| eigenvalues[y].total_cmp(&eigenvalues[x]));
    order.truncate(k);

    // Directions past the numerical rank get σ = 0 and an all-zero Vᵗ row.
    let top = order.first().map_or(0.0, |&e| eigenvalues[e].max(0.0).sqrt());
    let tolerance = (top * RANK_TOLERANCE).max(1e-10);

    let mut u = Dense::zeros(n, k);
    let mut vt = Dense::zeros(k, m);
    let mut s = Vec::with_capacity(k);
    for (out, &e) in order.iter().enumerate() {
        let mut sigma = eigenvalues[e].max(0.0).sqrt();
        if sigma <= tolerance { sigma = 0.0; }
        s.push(sigma);
        for i in 0..n {
            let v: f64 = (0..l).map(|p| q.get(i, p) * w.get(p, e)).sum();
            u.set(i, out, v);
        }
        if sigma > 0.0 {
            for j in 0..m {
                let v: f64 = (0..l).map(|p| c.get(j, p) * w.get(p, e)).sum::<f64>() / sigma;
                vt.set(out, j, v);
            }
        }
        flip_sign(&mut u, &mut vt, out);
    }
    Svd { u, s, vt }
}

/// Make the largest-magnitude entry of each `Vᵗ` row positive.
fn flip_sign(u: &mut Dense, vt: &mut Dense, c: usize) {
    let row = vt.row(c);
    let Some(peak) = row.iter().copied().max_by(|a, b| a.abs().total_cmp(&b.abs())) else { return };
    if peak >= 0.0 { return; }
    for x in vt.row_mut(c) { *x = -*x; }
    for i in 0..u.rows { let v = u.get(i, c); u.set(i, c, -v); }
}

/// Eigen decomposition of a symmetric matrix. Returns eigenvalues and the
/// eigenvectors as columns.
pub fn jacobi_eigen(mut a: Dense) -> (Vec<f64>, Dense) {
    let n = a.rows;
    let mut v = Dense::zeros(n, n);
    for i in 0..n { v.set(i, i, 1.0); }
    for _sweep in 0..64 {
        let off: f64 = (0..n).flat_map(|p| ((p + 1)..n).map(move |q| (p, q))).map(|(p, q)| a.get(p, q).powi(2)).sum();
        let scale: f64 = (0..n).map(|i| a.get(i, i).powi(2)).sum::<f64>().max(1e-300);
        if off <= 1e-24 * scale { break; }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a.get(p, q);
                if apq.abs() < 1e-300 { continue; }
                let theta = (a.get(q, q) - a.get(p, p)) / (2.0 * apq);
                let t = if theta.abs() > 1e150 {
                    0.5 / theta
                } else {
                    theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let cos = 1.0 / (t * t + 1.0).sqrt();
                let sin = t * cos;
                for k in 0..n {
                    let (akp, akq) = (a.get(k, p), a.get(k, q));
                    a.set(k, p, cos * akp - sin * akq);
                    a.set(k, q, sin * akp + cos * akq);
                }
                for k in 0..n {
                    let (apk, aqk) = (a.get(p, k), a.get(q, k));
                    a.set(p, k, cos * apk - sin * aqk);
                    a.set(q, k, sin * apk + cos * aqk);
                }
                for k in 0..n {
                    let (vkp, vkq) = (v.get(k, p), v.get(k, q));
                    v.set(k, p, cos * vkp - sin * vkq);
                    v.set(k, q, sin * vkp + cos * vkq);
                }
            }
        }
    }
    ((0..n).map(|i| a.get(i, i)).collect(), v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(k: usize) -> SvdParams { SvdParams { components: k, oversample: 10, power_iterations: 4, seed: 7 } }

    #[test]
    fn jacobi_recovers_known_eigenvalues() {
        let a = Dense { rows: 2, cols: 2, data: vec![2.0, 1.0, 1.0, 2.0] };
        let (mut vals, _) = jacobi_eigen(a);
        vals.sort_by(f64::total_cmp);
        assert!((vals[0] - 1.0).abs() < 1e-9 && (vals[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn diagonal_matrix_singular_values() {
        let a = SparseMatrix { cols: 3, rows: vec![vec![(0, 3.0)], vec![(1, 1.0)], vec![(2, 2.0)]] };
        let svd = randomized_svd(&a, params(3));
        assert_eq!(svd.s.len(), 3);
        for (got, want) in svd.s.iter().zip([3.0, 2.0, 1.0]) { assert!((got - want).abs() < 1e-6, "{got} vs {want}"); }
    }

    #[test]
    fn components_clamp_to_matrix_shape() {
        let a = SparseMatrix { cols: 4, rows: vec![vec![(0, 1.0), (1, 1.0)], vec![(2, 1.0), (3, 1.0)]] };
        let svd = randomized_svd(&a, params(30));
        assert_eq!(svd.s.len(), 2);
        assert_eq!(svd.vt.rows, 2);
        assert_eq!(svd.u.cols, 2);
    }

    #[test]
    fn reconstruction_matches_rank_two_input() {
        let a = SparseMatrix { cols: 3, rows: vec![vec![(0, 1.0), (1, 2.0)], vec![(1, 1.0), (2, 1.0)], vec![(0, 1.0), (1, 3.0), (2, 1.0)]] };
        let svd = randomized_svd(&a, params(3));
        for (i, row) in a.rows.iter().enumerate() {
            for j in 0..3 {
                let want = row.iter().find(|(c, _)| *c == j).map_or(0.0, |(_, v)| f64::from(*v));
                let got: f64 = (0..svd.s.len()).map(|c| svd.u.get(i, c) * svd.s[c] * svd.vt.get(c, j)).sum();
                assert!((got - want).abs() < 1e-6, "({i},{j}) {got} vs {want}");
            }
        }
    }

    #[test]
    fn directions_past_the_rank_are_zeroed() {
        let a = SparseMatrix { cols: 3, rows: vec![vec![(0, 1.0), (1, 1.0)], vec![(0, 2.0), (1, 2.0)], vec![(0, 3.0), (1, 3.0)]] };
        let svd = randomized_svd(&a, params(3));
        assert!(svd.s[0] > 1.0);
        for c in 1..svd.s.len() {
            assert_eq!(svd.s[c], 0.0);
            assert!(svd.vt.row(c).iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn same_seed_same_factors() {
        let a = SparseMatrix { cols: 3, rows: vec![vec![(0, 1.0), (2, 0.5)], vec![(1, 1.0)], vec![(0, 0.2), (1, 0.7)]] };
        let x = randomized_svd(&a, params(2));
        let y = randomized_svd(&a, params(2));
        assert_eq!(x.vt, y.vt);
        assert_eq!(x.s, y.s);
    }
}
