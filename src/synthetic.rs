//! Deterministic model systems with positive-definite two-electron integrals.
//!
//! The chemist-notation integrals are generated from a symmetric factorization
//! `(pq|rs) = sum_P L[P, p, q] L[P, r, s]`, so they carry the full eight-fold
//! permutational symmetry of real orbitals.

use crate::prelude::*;
use std::ops::Range;

#[derive(Debug, Clone)]
pub struct SyntheticSystem {
    pub nocc: usize,
    pub nvir: usize,
    pub e_ref: f64,
    /// Fock matrix, `nmo x nmo` row-major.
    pub fock: Vec<f64>,
    /// `(pq|rs)`, `nmo^4` row-major.
    pub eri: Vec<f64>,
}

/// Build a model system.
///
/// `coupling` scales the two-electron integrals; `fock_offdiag` scales the off-diagonal Fock elements,
/// including the occupied-virtual block. Occupied orbital energies lie in `[-1.2, -0.6]`, virtual ones in
/// `[0.4, 0.9]`.
pub fn synthetic_system(nocc: usize, nvir: usize, coupling: f64, fock_offdiag: f64) -> SyntheticSystem {
    let nmo = nocc + nvir;
    let naux = nmo + 2;

    let mo_energy = (0..nocc)
        .map(|i| -1.2 + 0.6 * i as f64 / (nocc.max(2) - 1) as f64)
        .chain((0..nvir).map(|a| 0.4 + 0.5 * a as f64 / (nvir.max(2) - 1) as f64))
        .collect_vec();

    let fock = iproduct!(0..nmo, 0..nmo)
        .map(|(p, q)| if p == q { mo_energy[p] } else { fock_offdiag * (1.1 + 0.9 * (p + q) as f64).sin() })
        .collect_vec();

    let factor = |aux: usize, p: usize, q: usize| {
        let (aux, pf, qf) = (aux as f64, p as f64, q as f64);
        let diag = if p == q { 1.0 / (1.0 + aux) } else { 0.0 };
        coupling * ((0.7 + 1.3 * aux + 0.5 * (pf + qf) + 0.2 * (pf * qf)).cos() + diag)
    };
    let eri = iproduct!(0..nmo, 0..nmo, 0..nmo, 0..nmo)
        .map(|(p, q, r, s)| (0..naux).map(|aux| factor(aux, p, q) * factor(aux, r, s)).sum::<f64>())
        .collect_vec();

    SyntheticSystem { nocc, nvir, e_ref: -1.0, fock, eri }
}

impl SyntheticSystem {
    pub fn nmo(&self) -> usize {
        self.nocc + self.nvir
    }

    pub fn fock(&self, p: usize, q: usize) -> f64 {
        self.fock[p * self.nmo() + q]
    }

    /// `(pq|rs)`
    pub fn eri_chemist(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        let nmo = self.nmo();
        self.eri[((p * nmo + q) * nmo + r) * nmo + s]
    }

    /// `<pq|rs> = (pr|qs)`
    pub fn eri_physicist(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        self.eri_chemist(p, r, q, s)
    }

    pub fn to_rccsd_info(&self) -> RCCSDInfo {
        self.active_space_info(0..self.nocc, self.nocc..self.nmo())
    }

    /// Blocks over the orbital ranges `so` (occupied) and `sv` (virtual), built directly from the full
    /// integrals.
    pub fn active_space_info(&self, so: Range<usize>, sv: Range<usize>) -> RCCSDInfo {
        let device = DeviceTsr::default();

        let block2 = |r0: Range<usize>, r1: Range<usize>| -> Tsr {
            let shape = vec![r0.len(), r1.len()];
            let data = iproduct!(r0, r1).map(|(p, q)| self.fock(p, q)).collect_vec();
            rt::asarray((data, shape, &device))
        };
        let block4 = |r0: Range<usize>, r1: Range<usize>, r2: Range<usize>, r3: Range<usize>| -> Tsr {
            let shape = vec![r0.len(), r1.len(), r2.len(), r3.len()];
            let data = iproduct!(r0, r1, r2, r3).map(|(p, q, r, s)| self.eri_physicist(p, q, r, s)).collect_vec();
            rt::asarray((data, shape, &device))
        };

        let eri = RCCSDEri {
            oooo: block4(so.clone(), so.clone(), so.clone(), so.clone()),
            ooov: block4(so.clone(), so.clone(), so.clone(), sv.clone()),
            oovv: block4(so.clone(), so.clone(), sv.clone(), sv.clone()),
            ovov: block4(so.clone(), sv.clone(), so.clone(), sv.clone()),
            ovvv: block4(so.clone(), sv.clone(), sv.clone(), sv.clone()),
            vvvv: block4(sv.clone(), sv.clone(), sv.clone(), sv.clone()),
        };
        let foo = block2(so.clone(), so.clone());
        let fov = block2(so.clone(), sv.clone());
        let fvv = block2(sv.clone(), sv);
        RCCSDInfo::new(self.e_ref, foo, fov, fvv, eri)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn integral_symmetry_and_blocks() {
        let system = synthetic_system(2, 3, 0.1, 0.02);
        for (p, q, r, s) in iproduct!(0..5, 0..5, 0..5, 0..5) {
            let pqrs = system.eri_chemist(p, q, r, s);
            assert_eq!(pqrs, system.eri_chemist(q, p, r, s));
            assert!((pqrs - system.eri_chemist(r, s, p, q)).abs() < 1.0e-15);
        }

        let mol_info = system.to_rccsd_info();
        mol_info.check_dimensions().unwrap();
        assert_eq!(mol_info.eri.ovvv.shape().to_vec(), vec![2, 3, 3, 3]);
        assert_eq!(mol_info.eri.ovvv[[1, 0, 2, 1]], system.eri_chemist(1, 4, 2, 3));
        assert_eq!(mol_info.mo_energy_occ[[0]], -1.2);
        assert_eq!(mol_info.fov[[0, 1]], system.fock(0, 3));

        let active = system.active_space_info(1..2, 2..4);
        assert_eq!((active.nocc(), active.nvir()), (1, 2));
        assert_eq!(active.mo_energy_occ[[0]], system.fock(1, 1));
        assert_eq!(active.eri.ovov[[0, 1, 0, 0]], system.eri_physicist(1, 3, 1, 2));
    }
}
