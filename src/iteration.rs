use crate::diis::get_accelerator;
use crate::prelude::*;
use crate::rccsd::*;
use crate::resolvent::{RCCSDResolvent, get_resolvent};
use std::time::Instant;

/* #region iteration state */

/// Root-mean-square of an update `new - old`.
pub fn get_rms(err: &Tsr) -> f64 {
    err.l2_norm() / (err.size() as f64).sqrt()
}

/// `(1 - damping) * new + damping * old`
fn apply_damping(new: Tsr, old: &Tsr, damping: f64) -> Tsr {
    if damping == 0.0 { new } else { (1.0 - damping) * new + damping * old }
}

/// Which tensors one step refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    /// Full residual; both T1 and T2 are updated.
    Full,
    /// Singles residual with T2 held fixed.
    SinglesOnly,
}

/// Accelerators driven by one phase.
enum PhaseAccelerator {
    /// Separate histories for T1 and T2.
    Independent { t1: Box<dyn Accelerator>, t2: Box<dyn Accelerator> },
    /// One history over the packed `[t1, t2]` vector. Singles-only steps pass through.
    Coupled(Box<dyn Accelerator>),
}

/// Flatten both amplitudes into one vector, singles first.
fn diis_concat_amplitude(t1: &Tsr, t2: &Tsr) -> Tsr {
    let n1 = t1.size();
    let mut cat = rt::zeros(([n1 + t2.size()], t1.device()));
    cat.i_mut(..n1).assign(t1.reshape(-1));
    cat.i_mut(n1..).assign(t2.reshape(-1));
    cat
}

/// Inverse of [`diis_concat_amplitude`].
fn diis_split_amplitude(cat: &Tsr, shape_t1: &[usize], shape_t2: &[usize]) -> (Tsr, Tsr) {
    let n1: usize = shape_t1.iter().product();
    let t1 = cat.i(..n1).into_shape(shape_t1);
    let t2 = cat.i(n1..).into_shape(shape_t2);
    (t1, t2)
}

impl PhaseAccelerator {
    /// Accelerate `(vector, error)` pairs. Returns the accelerated tensors and the names of tensors whose
    /// extrapolation was refused.
    fn update(&mut self, t1: (Tsr, Tsr), t2: Option<(Tsr, Tsr)>) -> (Tsr, Option<Tsr>, Vec<&'static str>) {
        let mut refused = vec![];
        match (self, t2) {
            (PhaseAccelerator::Coupled(acc), Some((t2_vec, t2_err))) => {
                let shape_t1 = t1.0.shape().to_vec();
                let shape_t2 = t2_vec.shape().to_vec();
                let vec = diis_concat_amplitude(&t1.0, &t2_vec);
                let outcome = acc.update(vec, diis_concat_amplitude(&t1.1, &t2_err));
                if outcome.fallback {
                    refused.push("t1+t2");
                }
                let (t1, t2) = diis_split_amplitude(&outcome.vec, &shape_t1, &shape_t2);
                (t1, Some(t2), refused)
            },
            (PhaseAccelerator::Coupled(_), None) => (t1.0, None, refused),
            (PhaseAccelerator::Independent { t1: acc_t1, t2: acc_t2 }, t2) => {
                let outcome_t1 = acc_t1.update(t1.0, t1.1);
                if outcome_t1.fallback {
                    refused.push("t1");
                }
                let t2 = t2.map(|(vec, err)| {
                    let outcome_t2 = acc_t2.update(vec, err);
                    if outcome_t2.fallback {
                        refused.push("t2");
                    }
                    outcome_t2.vec
                });
                (outcome_t1.vec, t2, refused)
            },
        }
    }
}

struct RCCSDSolver<'a> {
    mol_info: &'a RCCSDInfo,
    cc_config: &'a CCSDConfig,
    intermediates: RCCSDIntermediates,
    resolvent: RCCSDResolvent,
    device: DeviceTsr,

    /// Current amplitudes; each step builds a candidate and swaps it in.
    current: RCCSDAmplitudes,
    e_corr: f64,

    history: Vec<IterationRecord>,
    diagnostics: Vec<CCSDDiagnostic>,
}

struct StepOutcome {
    rms: f64,
    e_diff: f64,
}

impl RCCSDSolver<'_> {
    fn is_converged(&self, outcome: &StepOutcome) -> bool {
        outcome.e_diff.abs() <= self.cc_config.conv_tol_e && outcome.rms <= self.cc_config.conv_tol_rms
    }

    /// Evaluate the residual, divide by the resolvent, accelerate, damp, and swap in the candidate.
    fn step(&mut self, phase: Phase, niter: usize, kind: StepKind, accelerator: &mut PhaseAccelerator) -> StepOutcome {
        let timer = Instant::now();
        let damping = self.cc_config.damping;
        let current = &self.current;

        let (t1_new, t2_new) = match kind {
            StepKind::Full => {
                let new = update_rccsd_amplitude(self.mol_info, &self.intermediates, &self.resolvent, current);
                (new.t1, Some(new.t2))
            },
            StepKind::SinglesOnly => {
                let t1 = update_rccsd_t1_amplitude(self.mol_info, &self.intermediates, &self.resolvent, current);
                (t1, None)
            },
        };

        // error vectors and rms are taken before acceleration and damping
        let err_t1 = &t1_new - &current.t1;
        let rms_t1 = get_rms(&err_t1);
        let t2_new = t2_new.map(|t2_new| {
            let err_t2 = &t2_new - &current.t2;
            (t2_new, err_t2)
        });
        let rms_t2 = t2_new.as_ref().map_or(0.0, |(_, err_t2)| get_rms(err_t2));

        let (t1_acc, t2_acc, refused) = accelerator.update((t1_new, err_t1), t2_new);
        for &tensor in &refused {
            self.diagnostics.push(CCSDDiagnostic::DIISFallback { phase, niter, tensor });
        }
        let diis_fallback = !refused.is_empty();

        let t1_next = apply_damping(t1_acc, &current.t1, damping);
        let t2_next = match t2_acc {
            Some(t2_acc) => apply_damping(t2_acc, &current.t2, damping),
            None => current.t2.clone(),
        };

        let mut candidate = RCCSDAmplitudes { t1: t1_next, t2: t2_next };
        let e_corr = get_rccsd_energy(&self.intermediates, &candidate.t1, &candidate.t2);
        std::mem::swap(&mut self.current, &mut candidate);

        let e_diff = e_corr - self.e_corr;
        self.e_corr = e_corr;
        let rms = rms_t1.max(rms_t2);

        let record = IterationRecord {
            phase,
            niter,
            e_corr,
            e_diff,
            rms_t1,
            rms_t2,
            rms,
            elapsed: timer.elapsed(),
            diis_fallback,
        };
        info!(
            "{:?} iter {:3}: E_corr = {:18.12}, dE = {:10.3e}, rms(t1) = {:9.3e}, rms(t2) = {:9.3e}, time = {:.3?}",
            record.phase, record.niter, record.e_corr, record.e_diff, record.rms_t1, record.rms_t2, record.elapsed
        );
        if diis_fallback {
            warn!("DIIS extrapolation refused at {phase:?} iteration {niter}; using the plain update");
        }
        self.history.push(record);

        StepOutcome { rms, e_diff }
    }

    fn record_not_converged(&mut self, phase: Phase, max_cycle: usize, outcome: Option<&StepOutcome>) {
        let (e_diff, rms) = outcome.map(|o| (o.e_diff, o.rms)).unwrap_or((f64::NAN, f64::NAN));
        warn!("{phase:?} did not converge in {max_cycle} iterations (dE = {e_diff:.3e}, rms = {rms:.3e})");
        self.diagnostics.push(CCSDDiagnostic::NotConverged { phase, max_cycle, e_diff, rms });
    }

    /// Singles pre-convergence. The first step is a full update; later steps keep T2 fixed.
    fn iterate_t1_preconverge(&mut self) -> (bool, usize) {
        let flags = DIISIncoreFlags { space: self.cc_config.diis_space_t1_pre, min_space: 2 };
        let mut accelerator = PhaseAccelerator::Independent {
            t1: get_accelerator(self.cc_config.diis, flags, &self.device),
            t2: Box::new(NoAccelerator),
        };
        let max_cycle = self.cc_config.max_cycle_t1;

        let mut last = None;
        for niter in 0..max_cycle {
            let kind = if niter == 0 { StepKind::Full } else { StepKind::SinglesOnly };
            let outcome = self.step(Phase::T1Preconverge, niter, kind, &mut accelerator);
            if self.is_converged(&outcome) {
                info!("T1 pre-convergence finished in {} iterations", niter + 1);
                return (true, niter + 1);
            }
            last = Some(outcome);
        }
        self.record_not_converged(Phase::T1Preconverge, max_cycle, last.as_ref());
        (false, max_cycle)
    }

    fn main_accelerator(&self) -> PhaseAccelerator {
        let cc_config = self.cc_config;
        match cc_config.diis_mode {
            DIISMode::Coupled => {
                let flags = DIISIncoreFlags { space: cc_config.diis_space, min_space: 2 };
                PhaseAccelerator::Coupled(get_accelerator(cc_config.diis, flags, &self.device))
            },
            DIISMode::Independent => {
                let flags_t1 = DIISIncoreFlags { space: cc_config.diis_space_t1, min_space: 2 };
                let flags_t2 = DIISIncoreFlags { space: cc_config.diis_space_t2, min_space: cc_config.diis_space_t2 };
                PhaseAccelerator::Independent {
                    t1: get_accelerator(cc_config.diis, flags_t1, &self.device),
                    t2: get_accelerator(cc_config.diis, flags_t2, &self.device),
                }
            },
        }
    }

    fn iterate_main(&mut self) -> (bool, usize) {
        let mut accelerator = self.main_accelerator();
        let max_cycle = self.cc_config.max_cycle;

        let mut last = None;
        for niter in 0..max_cycle {
            let outcome = self.step(Phase::Main, niter, StepKind::Full, &mut accelerator);
            if self.is_converged(&outcome) {
                info!("CCSD converged in {} iterations", niter + 1);
                return (true, niter + 1);
            }
            last = Some(outcome);
        }
        self.record_not_converged(Phase::Main, max_cycle, last.as_ref());
        (false, max_cycle)
    }
}

/* #endregion */

/// Solve the closed-shell CCSD amplitude equations.
///
/// `guess` seeds the top-left block of the amplitudes, e.g. with a converged solve in a smaller basis.
/// Non-convergence is not an error: the last amplitudes are returned with `converged = false` and a
/// [`CCSDDiagnostic::NotConverged`] entry.
pub fn rccsd_iteration(
    mol_info: &RCCSDInfo,
    cc_config: &CCSDConfig,
    guess: Option<&RCCSDAmplitudes>,
) -> Result<RCCSDResults> {
    let time_outer = Instant::now();

    cc_config.check()?;
    mol_info.check_dimensions()?;

    let frozen_info;
    let mol_info = if cc_config.frozen_occ > 0 || cc_config.frozen_vir > 0 {
        frozen_info = mol_info.freeze(cc_config.frozen_occ, cc_config.frozen_vir)?;
        info!("Frozen orbitals: {} occupied, {} virtual", cc_config.frozen_occ, cc_config.frozen_vir);
        &frozen_info
    } else {
        mol_info
    };
    info!("RCCSD with {} occupied and {} virtual orbitals", mol_info.nocc(), mol_info.nvir());

    // intermediates and resolvent
    let timer = Instant::now();
    let intermediates = get_rccsd_intermediates(mol_info);
    let resolvent = get_resolvent(&mol_info.mo_energy_occ, &mol_info.mo_energy_vir, cc_config.denominator_tol);
    let diagnostics = resolvent.diagnostics.clone();
    debug!("Time elapsed (intermediates and resolvent): {:.3?}", timer.elapsed());

    // initial guess
    let timer = Instant::now();
    let current = get_rccsd_initial_guess(mol_info, &resolvent, guess)?;
    let e_corr = get_rccsd_energy(&intermediates, &current.t1, &current.t2);
    info!("Initial energy (MP2): {e_corr:.12}");
    debug!("Time elapsed (initial guess): {:.3?}", timer.elapsed());

    let device = mol_info.fov.device().clone();
    let mut solver = RCCSDSolver {
        mol_info,
        cc_config,
        intermediates,
        resolvent,
        device,
        current,
        e_corr,
        history: vec![],
        diagnostics,
    };

    let (converged_t1, niter_t1) =
        if cc_config.t1_preconverge { solver.iterate_t1_preconverge() } else { (false, 0) };
    let (converged, niter) = solver.iterate_main();

    let RCCSDSolver { current, e_corr, history, diagnostics, .. } = solver;
    let e_tot = mol_info.e_ref + e_corr;
    info!("CCSD correlation energy: {e_corr:.12}");
    info!("CCSD total energy: {e_tot:.12}");
    info!("Time elapsed (CCSD total time): {:.3?}", time_outer.elapsed());

    Ok(RCCSDResults {
        e_corr,
        e_tot,
        t1: current.t1,
        t2: current.t2,
        converged,
        converged_t1,
        niter_t1,
        niter,
        history,
        diagnostics,
    })
}
