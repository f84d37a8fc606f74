use crate::prelude::*;

/// Orbital-energy denominators for the amplitude update.
#[derive(Debug)]
pub struct RCCSDResolvent {
    /// `e_i - e_a`
    pub d_ov: Tsr,
    /// `e_i + e_j - e_a - e_b`
    pub d_oovv: Tsr,
    pub diagnostics: Vec<CCSDDiagnostic>,
}

pub fn get_resolvent(mo_energy_occ: &Tsr, mo_energy_vir: &Tsr, tol: f64) -> RCCSDResolvent {
    // d_ov = eo[:, None] - ev[None, :]
    let d_ov: Tsr = mo_energy_occ.i((.., None)) - mo_energy_vir.i((None, ..));
    // d_oovv = d_ov[:, None, :, None] + d_ov[None, :, None, :]
    let d_oovv: Tsr = d_ov.i((.., None, .., None)) + d_ov.i((None, .., None, ..));

    let diagnostics = [("d_ov", &d_ov), ("d_oovv", &d_oovv)]
        .into_iter()
        .filter_map(|(kind, d)| scan_small_denominator(kind, d, tol))
        .collect_vec();
    for diagnostic in &diagnostics {
        if let CCSDDiagnostic::SmallDenominator { kind, count, min_abs } = diagnostic {
            warn!("{count} entries of {kind} below {tol:.1e} in magnitude (smallest {min_abs:.3e})");
        }
    }

    RCCSDResolvent { d_ov, d_oovv, diagnostics }
}

fn scan_small_denominator(kind: &'static str, d: &Tsr, tol: f64) -> Option<CCSDDiagnostic> {
    let small = d.raw().iter().map(|x| x.abs()).filter(|x| *x < tol).collect_vec();
    if small.is_empty() {
        return None;
    }
    let min_abs = small.iter().copied().fold(f64::INFINITY, f64::min);
    Some(CCSDDiagnostic::SmallDenominator { kind, count: small.len(), min_abs })
}
