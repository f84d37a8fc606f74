//! Cross-check of the closed-shell solver against a straightforward spin-orbital CCSD
//! (Stanton-Gauss intermediates) written with explicit loops.

use itertools::iproduct;
use rstsr_rccsd::prelude::*;
use rstsr_rccsd::synthetic::{SyntheticSystem, synthetic_system};

struct SpinOrbitalCCSD {
    nocc: usize,
    nvir: usize,
    /// spin-orbital Fock matrix, `n x n`
    fock: Vec<f64>,
    /// antisymmetrized `<pq||rs>`, `n^4`
    eri: Vec<f64>,
}

impl SpinOrbitalCCSD {
    /// Spin-orbital `2p + sigma` holds spatial orbital `p`; occupied spin-orbitals come first.
    fn new(system: &SyntheticSystem) -> Self {
        let nocc = 2 * system.nocc;
        let nvir = 2 * system.nvir;
        let n = nocc + nvir;

        let fock = iproduct!(0..n, 0..n)
            .map(|(p, q)| if p % 2 == q % 2 { system.fock(p / 2, q / 2) } else { 0.0 })
            .collect();
        let coulomb = |p: usize, q: usize, r: usize, s: usize| {
            if p % 2 == r % 2 && q % 2 == s % 2 { system.eri_physicist(p / 2, q / 2, r / 2, s / 2) } else { 0.0 }
        };
        let eri = iproduct!(0..n, 0..n, 0..n, 0..n).map(|(p, q, r, s)| coulomb(p, q, r, s) - coulomb(p, q, s, r)).collect();

        Self { nocc, nvir, fock, eri }
    }

    fn f(&self, p: usize, q: usize) -> f64 {
        self.fock[p * (self.nocc + self.nvir) + q]
    }

    fn g(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        let n = self.nocc + self.nvir;
        self.eri[((p * n + q) * n + r) * n + s]
    }

    fn energy(&self, t1: &[f64], t2: &[f64]) -> f64 {
        let (o, v) = (self.nocc, self.nvir);
        let t1_ = |i: usize, a: usize| t1[i * v + a];
        let t2_ = |i: usize, j: usize, a: usize, b: usize| t2[((i * o + j) * v + a) * v + b];

        let mut e = 0.0;
        for (i, a) in iproduct!(0..o, 0..v) {
            e += self.f(i, a + o) * t1_(i, a);
        }
        for (i, j, a, b) in iproduct!(0..o, 0..o, 0..v, 0..v) {
            let g = self.g(i, j, a + o, b + o);
            e += 0.25 * g * t2_(i, j, a, b) + 0.5 * g * t1_(i, a) * t1_(j, b);
        }
        e
    }

    fn solve(&self, max_cycle: usize, conv_tol: f64) -> f64 {
        let (o, v) = (self.nocc, self.nvir);
        let idx2 = |i: usize, a: usize| i * v + a;
        let idx4 = |i: usize, j: usize, a: usize, b: usize| ((i * o + j) * v + a) * v + b;
        let d1 = |i: usize, a: usize| self.f(i, i) - self.f(a + o, a + o);
        let d2 = |i: usize, j: usize, a: usize, b: usize| d1(i, a) + d1(j, b);

        let mut t1 = vec![0.0; o * v];
        let mut t2 = vec![0.0; o * o * v * v];
        for (i, a) in iproduct!(0..o, 0..v) {
            t1[idx2(i, a)] = self.f(i, a + o) / d1(i, a);
        }
        for (i, j, a, b) in iproduct!(0..o, 0..o, 0..v, 0..v) {
            t2[idx4(i, j, a, b)] = self.g(i, j, a + o, b + o) / d2(i, j, a, b);
        }
        let mut e_old = self.energy(&t1, &t2);

        for _ in 0..max_cycle {
            let t1_ = |i: usize, a: usize| t1[idx2(i, a)];
            let t2_ = |i: usize, j: usize, a: usize, b: usize| t2[idx4(i, j, a, b)];
            let taut = |i: usize, j: usize, a: usize, b: usize| {
                t2_(i, j, a, b) + 0.5 * (t1_(i, a) * t1_(j, b) - t1_(i, b) * t1_(j, a))
            };
            let tau = |i: usize, j: usize, a: usize, b: usize| {
                t2_(i, j, a, b) + t1_(i, a) * t1_(j, b) - t1_(i, b) * t1_(j, a)
            };

            // one-body intermediates
            let mut fae = vec![0.0; v * v];
            for (a, e) in iproduct!(0..v, 0..v) {
                let mut val = if a == e { 0.0 } else { self.f(a + o, e + o) };
                for m in 0..o {
                    val -= 0.5 * self.f(m, e + o) * t1_(m, a);
                    for f in 0..v {
                        val += t1_(m, f) * self.g(m, a + o, f + o, e + o);
                        for n in 0..o {
                            val -= 0.5 * taut(m, n, a, f) * self.g(m, n, e + o, f + o);
                        }
                    }
                }
                fae[a * v + e] = val;
            }
            let mut fmi = vec![0.0; o * o];
            for (m, i) in iproduct!(0..o, 0..o) {
                let mut val = if m == i { 0.0 } else { self.f(m, i) };
                for e in 0..v {
                    val += 0.5 * t1_(i, e) * self.f(m, e + o);
                    for n in 0..o {
                        val += t1_(n, e) * self.g(m, n, i, e + o);
                        for f in 0..v {
                            val += 0.5 * taut(i, n, e, f) * self.g(m, n, e + o, f + o);
                        }
                    }
                }
                fmi[m * o + i] = val;
            }
            let mut fme = vec![0.0; o * v];
            for (m, e) in iproduct!(0..o, 0..v) {
                let mut val = self.f(m, e + o);
                for (n, f) in iproduct!(0..o, 0..v) {
                    val += t1_(n, f) * self.g(m, n, e + o, f + o);
                }
                fme[m * v + e] = val;
            }

            // two-body intermediates
            let mut wmnij = vec![0.0; o * o * o * o];
            for (m, n, i, j) in iproduct!(0..o, 0..o, 0..o, 0..o) {
                let mut val = self.g(m, n, i, j);
                for e in 0..v {
                    val += t1_(j, e) * self.g(m, n, i, e + o) - t1_(i, e) * self.g(m, n, j, e + o);
                    for f in 0..v {
                        val += 0.25 * tau(i, j, e, f) * self.g(m, n, e + o, f + o);
                    }
                }
                wmnij[((m * o + n) * o + i) * o + j] = val;
            }
            let mut wabef = vec![0.0; v * v * v * v];
            for (a, b, e, f) in iproduct!(0..v, 0..v, 0..v, 0..v) {
                let mut val = self.g(a + o, b + o, e + o, f + o);
                for m in 0..o {
                    val -= t1_(m, b) * self.g(a + o, m, e + o, f + o) - t1_(m, a) * self.g(b + o, m, e + o, f + o);
                    for n in 0..o {
                        val += 0.25 * tau(m, n, a, b) * self.g(m, n, e + o, f + o);
                    }
                }
                wabef[((a * v + b) * v + e) * v + f] = val;
            }
            let mut wmbej = vec![0.0; o * v * v * o];
            for (m, b, e, j) in iproduct!(0..o, 0..v, 0..v, 0..o) {
                let mut val = self.g(m, b + o, e + o, j);
                for f in 0..v {
                    val += t1_(j, f) * self.g(m, b + o, e + o, f + o);
                }
                for n in 0..o {
                    val -= t1_(n, b) * self.g(m, n, e + o, j);
                    for f in 0..v {
                        val -= (0.5 * t2_(j, n, f, b) + t1_(j, f) * t1_(n, b)) * self.g(m, n, e + o, f + o);
                    }
                }
                wmbej[((m * v + b) * v + e) * o + j] = val;
            }

            // singles
            let mut t1_new = vec![0.0; o * v];
            for (i, a) in iproduct!(0..o, 0..v) {
                let mut val = self.f(i, a + o);
                for e in 0..v {
                    val += t1_(i, e) * fae[a * v + e];
                }
                for m in 0..o {
                    val -= t1_(m, a) * fmi[m * o + i];
                }
                for (m, e) in iproduct!(0..o, 0..v) {
                    val += t2_(i, m, a, e) * fme[m * v + e];
                    for f in 0..v {
                        val -= 0.5 * t2_(i, m, e, f) * self.g(m, a + o, e + o, f + o);
                    }
                    for n in 0..o {
                        val -= 0.5 * t2_(m, n, a, e) * self.g(n, m, e + o, i);
                    }
                }
                for (n, f) in iproduct!(0..o, 0..v) {
                    val -= t1_(n, f) * self.g(n, a + o, i, f + o);
                }
                t1_new[idx2(i, a)] = val / d1(i, a);
            }

            // doubles, before antisymmetrizers
            let p_ab = |i: usize, j: usize, a: usize, b: usize| {
                let mut val = 0.0;
                for e in 0..v {
                    let mut fae_dressed = fae[b * v + e];
                    for m in 0..o {
                        fae_dressed -= 0.5 * t1_(m, b) * fme[m * v + e];
                    }
                    val += t2_(i, j, a, e) * fae_dressed;
                }
                for m in 0..o {
                    val -= t1_(m, a) * self.g(m, b + o, i, j);
                }
                val
            };
            let p_ij = |i: usize, j: usize, a: usize, b: usize| {
                let mut val = 0.0;
                for m in 0..o {
                    let mut fmi_dressed = fmi[m * o + j];
                    for e in 0..v {
                        fmi_dressed += 0.5 * t1_(j, e) * fme[m * v + e];
                    }
                    val -= t2_(i, m, a, b) * fmi_dressed;
                }
                for e in 0..v {
                    val += t1_(i, e) * self.g(a + o, b + o, e + o, j);
                }
                val
            };
            let p_ijab = |i: usize, j: usize, a: usize, b: usize| {
                let mut val = 0.0;
                for (m, e) in iproduct!(0..o, 0..v) {
                    val += t2_(i, m, a, e) * wmbej[((m * v + b) * v + e) * o + j];
                    val -= t1_(i, e) * t1_(m, a) * self.g(m, b + o, e + o, j);
                }
                val
            };

            let mut t2_new = vec![0.0; o * o * v * v];
            for (i, j, a, b) in iproduct!(0..o, 0..o, 0..v, 0..v) {
                let mut val = self.g(i, j, a + o, b + o);
                val += p_ab(i, j, a, b) - p_ab(i, j, b, a);
                val += p_ij(i, j, a, b) - p_ij(j, i, a, b);
                val += p_ijab(i, j, a, b) - p_ijab(j, i, a, b) - p_ijab(i, j, b, a) + p_ijab(j, i, b, a);
                for (m, n) in iproduct!(0..o, 0..o) {
                    val += 0.5 * tau(m, n, a, b) * wmnij[((m * o + n) * o + i) * o + j];
                }
                for (e, f) in iproduct!(0..v, 0..v) {
                    val += 0.5 * tau(i, j, e, f) * wabef[((a * v + b) * v + e) * v + f];
                }
                t2_new[idx4(i, j, a, b)] = val / d2(i, j, a, b);
            }

            t1 = t1_new;
            t2 = t2_new;
            let e_new = self.energy(&t1, &t2);
            let converged = (e_new - e_old).abs() < conv_tol;
            e_old = e_new;
            if converged {
                return e_new;
            }
        }
        panic!("spin-orbital CCSD did not converge");
    }
}

#[test]
fn closed_shell_energy_matches_spin_orbital_ccsd() {
    let cc_config = CCSDConfig { max_cycle: 200, conv_tol_e: 1.0e-13, conv_tol_rms: 1.0e-11, ..Default::default() };

    for (nocc, nvir, coupling, fock_offdiag) in [(2, 2, 0.1, 0.0), (2, 3, 0.12, 0.03)] {
        let system = synthetic_system(nocc, nvir, coupling, fock_offdiag);
        let results = rccsd_iteration(&system.to_rccsd_info(), &cc_config, None).unwrap();
        assert!(results.converged);

        let e_reference = SpinOrbitalCCSD::new(&system).solve(500, 1.0e-13);
        assert!(
            (results.e_corr - e_reference).abs() < 1.0e-9,
            "closed-shell {} vs spin-orbital {e_reference}",
            results.e_corr
        );
    }
}
