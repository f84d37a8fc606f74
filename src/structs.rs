use crate::prelude::*;
use serde::Deserialize;
use std::time::Duration;

/* #region integrals */

/// Two-electron integrals in the MO basis, physicist notation `<pq|rs> = (pr|qs)`.
#[derive(Debug)]
pub struct RCCSDEri {
    /// `<ij|kl>`
    pub oooo: Tsr,
    /// `<ij|ka>`
    pub ooov: Tsr,
    /// `<ij|ab>`
    pub oovv: Tsr,
    /// `<ia|jb>`
    pub ovov: Tsr,
    /// `<ia|bc>`
    pub ovvv: Tsr,
    /// `<ab|cd>`
    pub vvvv: Tsr,
}

/// Everything the solver consumes from the mean-field and integral-transform steps.
#[derive(Debug)]
pub struct RCCSDInfo {
    /// Reference (mean-field) total energy, added to the correlation energy.
    pub e_ref: f64,
    pub mo_energy_occ: Tsr,
    pub mo_energy_vir: Tsr,
    pub foo: Tsr,
    pub fov: Tsr,
    pub fvv: Tsr,
    pub eri: RCCSDEri,
}

impl RCCSDInfo {
    /// Orbital energies are taken from the Fock diagonals; assign the public fields to override.
    pub fn new(e_ref: f64, foo: Tsr, fov: Tsr, fvv: Tsr, eri: RCCSDEri) -> Self {
        let mo_energy_occ = foo.diagonal(None).to_owned();
        let mo_energy_vir = fvv.diagonal(None).to_owned();
        Self { e_ref, mo_energy_occ, mo_energy_vir, foo, fov, fvv, eri }
    }

    pub fn nocc(&self) -> usize {
        self.fov.shape()[0]
    }

    pub fn nvir(&self) -> usize {
        self.fov.shape()[1]
    }

    /// Check that every block agrees with `nocc` and `nvir`.
    pub fn check_dimensions(&self) -> Result<()> {
        let nocc = self.nocc();
        let nvir = self.nvir();
        let (o, v) = (nocc, nvir);

        let expected: [(&str, &Tsr, Vec<usize>); 11] = [
            ("mo_energy_occ", &self.mo_energy_occ, vec![o]),
            ("mo_energy_vir", &self.mo_energy_vir, vec![v]),
            ("foo", &self.foo, vec![o, o]),
            ("fvv", &self.fvv, vec![v, v]),
            ("oooo", &self.eri.oooo, vec![o, o, o, o]),
            ("ooov", &self.eri.ooov, vec![o, o, o, v]),
            ("oovv", &self.eri.oovv, vec![o, o, v, v]),
            ("ovov", &self.eri.ovov, vec![o, v, o, v]),
            ("ovvv", &self.eri.ovvv, vec![o, v, v, v]),
            ("vvvv", &self.eri.vvvv, vec![v, v, v, v]),
            ("fov", &self.fov, vec![o, v]),
        ];
        for (name, tsr, shape) in expected {
            check_shape(name, tsr, &shape)?;
        }
        if nocc == 0 || nvir == 0 {
            return Err(RCCSDError::DimensionMismatch {
                name: "fov".to_string(),
                expected: vec![nocc.max(1), nvir.max(1)],
                actual: vec![nocc, nvir],
            });
        }
        Ok(())
    }

    /// Drop the lowest `frozen_occ` occupied and the highest `frozen_vir` virtual orbitals.
    pub fn freeze(&self, frozen_occ: usize, frozen_vir: usize) -> Result<RCCSDInfo> {
        let nocc = self.nocc();
        let nvir = self.nvir();
        if frozen_occ >= nocc {
            return Err(RCCSDError::FrozenTooMany { space: "occupied", frozen: frozen_occ, total: nocc });
        }
        if frozen_vir >= nvir {
            return Err(RCCSDError::FrozenTooMany { space: "virtual", frozen: frozen_vir, total: nvir });
        }

        let so = slice!(frozen_occ, nocc);
        let sv = slice!(0, nvir - frozen_vir);

        // sliced views start at a nonzero offset; `to_owned` copies them element by element
        let eri = RCCSDEri {
            oooo: self.eri.oooo.i((so, so, so, so)).to_owned(),
            ooov: self.eri.ooov.i((so, so, so, sv)).to_owned(),
            oovv: self.eri.oovv.i((so, so, sv, sv)).to_owned(),
            ovov: self.eri.ovov.i((so, sv, so, sv)).to_owned(),
            ovvv: self.eri.ovvv.i((so, sv, sv, sv)).to_owned(),
            vvvv: self.eri.vvvv.i((sv, sv, sv, sv)).to_owned(),
        };

        Ok(RCCSDInfo {
            e_ref: self.e_ref,
            mo_energy_occ: self.mo_energy_occ.i(so).to_owned(),
            mo_energy_vir: self.mo_energy_vir.i(sv).to_owned(),
            foo: self.foo.i((so, so)).to_owned(),
            fov: self.fov.i((so, sv)).to_owned(),
            fvv: self.fvv.i((sv, sv)).to_owned(),
            eri,
        })
    }
}

pub(crate) fn check_shape(name: &str, tsr: &Tsr, expected: &[usize]) -> Result<()> {
    let actual = tsr.shape().to_vec();
    if actual != expected {
        return Err(RCCSDError::DimensionMismatch { name: name.to_string(), expected: expected.to_vec(), actual });
    }
    Ok(())
}

/// Quantities derived once per solve from [`RCCSDInfo`].
#[derive(Debug)]
pub struct RCCSDIntermediates {
    /// occupied Fock block with diagonal removed
    pub foo: Tsr,
    /// virtual Fock block with diagonal removed
    pub fvv: Tsr,
    pub fov: Tsr,
    /// `2 <kl|cd> - <kl|dc>`
    pub l_oovv: Tsr,
    /// `2 <kl|ic> - <lk|ic>`
    pub l_ooov: Tsr,
    /// `2 <ka|dc> - <ka|cd>`
    pub l_ovvv: Tsr,
}

/* #endregion */

/* #region amplitudes and results */

#[derive(Debug, Clone)]
pub struct RCCSDAmplitudes {
    pub t1: Tsr,
    pub t2: Tsr,
}

impl RCCSDAmplitudes {
    pub fn nocc(&self) -> usize {
        self.t1.shape()[0]
    }

    pub fn nvir(&self) -> usize {
        self.t1.shape()[1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Singles-only pre-convergence with doubles held fixed.
    T1Preconverge,
    /// Coupled singles and doubles.
    Main,
}

/// Recoverable conditions surfaced alongside the iteration stream.
#[derive(Debug, Clone, PartialEq)]
pub enum CCSDDiagnostic {
    SmallDenominator { kind: &'static str, count: usize, min_abs: f64 },
    DIISFallback { phase: Phase, niter: usize, tensor: &'static str },
    NotConverged { phase: Phase, max_cycle: usize, e_diff: f64, rms: f64 },
}

/// One entry of the per-iteration diagnostic stream.
#[derive(Debug, Clone)]
pub struct IterationRecord {
    pub phase: Phase,
    pub niter: usize,
    pub e_corr: f64,
    pub e_diff: f64,
    pub rms_t1: f64,
    pub rms_t2: f64,
    pub rms: f64,
    pub elapsed: Duration,
    pub diis_fallback: bool,
}

#[derive(Debug)]
pub struct RCCSDResults {
    pub e_corr: f64,
    pub e_tot: f64,
    pub t1: Tsr,
    pub t2: Tsr,
    pub converged: bool,
    /// Whether singles pre-convergence met its thresholds; `false` when it was not run.
    pub converged_t1: bool,
    /// iterations spent in singles pre-convergence
    pub niter_t1: usize,
    /// iterations spent in the coupled loop
    pub niter: usize,
    pub history: Vec<IterationRecord>,
    pub diagnostics: Vec<CCSDDiagnostic>,
}

/* #endregion */

/* #region config */

/// How the main loop accelerates the amplitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DIISMode {
    /// One history over the packed `[t1, t2]` vector.
    Coupled,
    /// Separate T1 and T2 histories; T2 extrapolates only once its history is full.
    Independent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CCSDConfig {
    pub max_cycle: usize,
    pub max_cycle_t1: usize,
    pub conv_tol_e: f64,
    pub conv_tol_rms: f64,
    pub t1_preconverge: bool,
    pub damping: f64,
    pub diis: bool,
    pub diis_mode: DIISMode,
    /// packed `[t1, t2]` history in [`DIISMode::Coupled`]
    pub diis_space: usize,
    pub diis_space_t1_pre: usize,
    pub diis_space_t1: usize,
    pub diis_space_t2: usize,
    pub denominator_tol: f64,
    pub frozen_occ: usize,
    pub frozen_vir: usize,
}

impl Default for CCSDConfig {
    fn default() -> Self {
        Self {
            max_cycle: 50,
            max_cycle_t1: 50,
            conv_tol_e: 1.0e-10,
            conv_tol_rms: 1.0e-7,
            t1_preconverge: false,
            damping: 0.0,
            diis: true,
            diis_mode: DIISMode::Coupled,
            diis_space: 8,
            diis_space_t1_pre: 4,
            diis_space_t1: 8,
            diis_space_t2: 8,
            denominator_tol: 1.0e-6,
            frozen_occ: 0,
            frozen_vir: 0,
        }
    }
}

impl CCSDConfig {
    /// Parse a flat JSON object; absent keys keep their defaults.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| RCCSDError::InvalidConfig { message: e.to_string() })
    }

    pub fn check(&self) -> Result<()> {
        let invalid = |message: String| Err(RCCSDError::InvalidConfig { message });
        if !(0.0..1.0).contains(&self.damping) {
            return invalid(format!("damping must lie in [0, 1), got {}", self.damping));
        }
        if self.max_cycle == 0 {
            return invalid("max_cycle must be positive".to_string());
        }
        if self.t1_preconverge && self.max_cycle_t1 == 0 {
            return invalid("max_cycle_t1 must be positive when t1_preconverge is on".to_string());
        }
        if !(self.conv_tol_e > 0.0) || !(self.conv_tol_rms > 0.0) {
            return invalid(format!(
                "convergence thresholds must be positive, got conv_tol_e = {}, conv_tol_rms = {}",
                self.conv_tol_e, self.conv_tol_rms
            ));
        }
        let spaces = [self.diis_space, self.diis_space_t1, self.diis_space_t2, self.diis_space_t1_pre];
        if self.diis && spaces.iter().any(|&space| space < 2) {
            return invalid("DIIS spaces must hold at least 2 vectors".to_string());
        }
        Ok(())
    }
}

/* #endregion */

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_from_flat_json() {
        let config = CCSDConfig::from_json(r#"{ "max_cycle": 12, "damping": 0.25, "diis": false }"#).unwrap();
        assert_eq!(config.max_cycle, 12);
        assert_eq!(config.damping, 0.25);
        assert!(!config.diis);
        // untouched keys keep defaults
        assert_eq!(config.conv_tol_e, 1.0e-10);
        assert_eq!(config.diis_space_t2, 8);
        assert_eq!(config.diis_mode, DIISMode::Coupled);
        config.check().unwrap();

        let config = CCSDConfig::from_json(r#"{ "diis_mode": "independent", "diis_space": 6 }"#).unwrap();
        assert_eq!(config.diis_mode, DIISMode::Independent);
        assert_eq!(config.diis_space, 6);
        assert!(CCSDConfig::from_json(r#"{ "diis_mode": "anderson" }"#).is_err());
    }

    #[test]
    fn config_rejects_unknown_key_and_bad_damping() {
        assert!(CCSDConfig::from_json(r#"{ "max_iter": 3 }"#).is_err());
        let config = CCSDConfig { damping: 1.0, ..Default::default() };
        assert!(matches!(config.check(), Err(RCCSDError::InvalidConfig { .. })));
        let config = CCSDConfig { diis_space: 1, ..Default::default() };
        assert!(matches!(config.check(), Err(RCCSDError::InvalidConfig { .. })));
    }

    #[test]
    fn freeze_copies_offset_blocks() {
        let mol_info = crate::synthetic::synthetic_system(3, 4, 0.1, 0.02).to_rccsd_info();

        // occupied-only freezing leaves contiguous slices that start past the first element
        let frozen = mol_info.freeze(1, 0).unwrap();
        frozen.check_dimensions().unwrap();
        for i in 0..2 {
            assert_eq!(frozen.mo_energy_occ[[i]], frozen.foo[[i, i]]);
            assert_eq!(frozen.mo_energy_occ[[i]], mol_info.mo_energy_occ[[i + 1]]);
        }
        for (i, a, b, c) in iproduct!(0..2, 0..4, 0..4, 0..4) {
            assert_eq!(frozen.eri.ovvv[[i, a, b, c]], mol_info.eri.ovvv[[i + 1, a, b, c]]);
        }
        for a in 0..4 {
            assert_eq!(frozen.fov[[1, a]], mol_info.fov[[2, a]]);
        }

        let frozen = mol_info.freeze(1, 1).unwrap();
        for a in 0..3 {
            assert_eq!(frozen.mo_energy_vir[[a]], frozen.fvv[[a, a]]);
        }
        for (i, j) in iproduct!(0..2, 0..2) {
            assert_eq!(frozen.foo[[i, j]], mol_info.foo[[i + 1, j + 1]]);
        }
    }
}
