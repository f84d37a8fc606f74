#![allow(non_snake_case)]

use crate::prelude::*;
use crate::resolvent::RCCSDResolvent;

/* #region intermediates independent of amplitudes */

pub fn get_rccsd_intermediates(mol_info: &RCCSDInfo) -> RCCSDIntermediates {
    let eri = &mol_info.eri;

    let mut foo = mol_info.foo.clone();
    foo.diagonal_mut(None).fill(0.0);
    let mut fvv = mol_info.fvv.clone();
    fvv.diagonal_mut(None).fill(0.0);
    let fov = mol_info.fov.clone();

    // L_oovv = 2 * oovv - oovv.swapaxes(-1, -2)
    let l_oovv: Tsr = 2.0 * &eri.oovv - eri.oovv.swapaxes(-1, -2);
    // L_ooov = 2 * ooov - ooov.transpose(1, 0, 2, 3)
    let l_ooov: Tsr = 2.0 * &eri.ooov - eri.ooov.transpose([1, 0, 2, 3]);
    // L_ovvv = 2 * ovvv - ovvv.swapaxes(-1, -2)
    let l_ovvv: Tsr = 2.0 * &eri.ovvv - eri.ovvv.swapaxes(-1, -2);

    RCCSDIntermediates { foo, fvv, fov, l_oovv, l_ooov, l_ovvv }
}

/* #endregion */

/* #region dressed intermediates */

/// Amplitude-dependent one-body quantities shared by the singles and doubles residuals.
#[derive(Debug)]
pub struct RCCSDDressed {
    pub tau: Tsr,
    pub f_oo: Tsr,
    pub f_vv: Tsr,
    pub f_ov: Tsr,
}

pub fn get_rccsd_tau(t1: &Tsr, t2: &Tsr) -> Tsr {
    // tau = t2 + np.einsum("ia, jb -> ijab", t1, t1)
    t2 + t1.i((.., None, .., None)) * t1.i((None, .., None, ..))
}

pub fn get_rccsd_dressed(intermediates: &RCCSDIntermediates, t1: &Tsr, t2: &Tsr) -> RCCSDDressed {
    let nocc = t1.shape()[0];
    let nvir = t1.shape()[1];
    let l_oovv = &intermediates.l_oovv;

    let tau = get_rccsd_tau(t1, t2);

    // Foo = foo + np.einsum("klcd, ilcd -> ki", L_oovv, tau)
    let f_oo = &intermediates.foo + l_oovv.reshape((nocc, -1)) % tau.reshape((nocc, -1)).t();

    // Fvv = fvv - np.einsum("klcd, klad -> ac", L_oovv, tau)
    let scr_ckld = l_oovv.transpose([2, 0, 1, 3]);
    let scr_akld = tau.transpose([2, 0, 1, 3]);
    let f_vv = &intermediates.fvv - scr_akld.reshape((nvir, -1)) % scr_ckld.reshape((nvir, -1)).t();

    // Fov = fov + np.einsum("klcd, ld -> kc", L_oovv, t1)
    let scr_kcld = l_oovv.transpose([0, 2, 1, 3]);
    let f_ov = &intermediates.fov + (scr_kcld.reshape((nocc * nvir, -1)) % t1.reshape(-1)).into_shape((nocc, nvir));

    RCCSDDressed { tau, f_oo, f_vv, f_ov }
}

pub fn get_rccsd_l_oo(intermediates: &RCCSDIntermediates, dressed: &RCCSDDressed, t1: &Tsr) -> Tsr {
    let nocc = t1.shape()[0];

    // Loo = Foo
    //     + np.einsum("kc, ic -> ki", fov, t1)
    //     + np.einsum("klic, lc -> ki", L_ooov, t1)
    let scr_kilc = intermediates.l_ooov.transpose([0, 2, 1, 3]);
    let mut l_oo = &dressed.f_oo + &intermediates.fov % t1.t();
    l_oo += (scr_kilc.reshape((nocc * nocc, -1)) % t1.reshape(-1)).into_shape((nocc, nocc));
    l_oo
}

pub fn get_rccsd_l_vv(intermediates: &RCCSDIntermediates, dressed: &RCCSDDressed, t1: &Tsr) -> Tsr {
    let nvir = t1.shape()[1];

    // Lvv = Fvv
    //     - np.einsum("kc, ka -> ac", fov, t1)
    //     + np.einsum("kadc, kd -> ac", L_ovvv, t1)
    let scr_ackd = intermediates.l_ovvv.transpose([1, 3, 0, 2]);
    let mut l_vv = &dressed.f_vv - t1.t() % &intermediates.fov;
    l_vv += (scr_ackd.reshape((nvir * nvir, -1)) % t1.reshape(-1)).into_shape((nvir, nvir));
    l_vv
}

pub fn get_rccsd_w_oooo(mol_info: &RCCSDInfo, dressed: &RCCSDDressed, t1: &Tsr) -> Tsr {
    let nocc = t1.shape()[0];
    let nvir = t1.shape()[1];
    let eri = &mol_info.eri;

    // Woooo = oooo
    //       + np.einsum("klic, jc -> klij", ooov, t1)
    //       + np.einsum("lkjc, ic -> klij", ooov, t1)
    let scr_klij = (eri.ooov.reshape((-1, nvir)) % t1.t()).into_shape((nocc, nocc, nocc, nocc));
    let mut w_oooo: Tsr = &eri.oooo + &scr_klij + scr_klij.transpose([1, 0, 3, 2]);

    // Woooo += np.einsum("klcd, ijcd -> klij", oovv, tau)
    let scr_klij = eri.oovv.reshape((nocc * nocc, -1)) % dressed.tau.reshape((nocc * nocc, -1)).t();
    w_oooo += scr_klij.into_shape((nocc, nocc, nocc, nocc));
    w_oooo
}

pub fn get_rccsd_w_vvvv(mol_info: &RCCSDInfo, t1: &Tsr) -> Tsr {
    let nocc = t1.shape()[0];
    let nvir = t1.shape()[1];
    let eri = &mol_info.eri;

    // Wvvvv = vvvv
    //       - np.einsum("kbcd, ka -> abcd", ovvv, t1)
    //       - np.einsum("kadc, kb -> abcd", ovvv, t1)
    let scr_abcd = (t1.t() % eri.ovvv.reshape((nocc, -1))).into_shape((nvir, nvir, nvir, nvir));
    &eri.vvvv - &scr_abcd - scr_abcd.transpose([1, 0, 3, 2])
}

/// `np.einsum("lkdc, ilda -> akic", m, n)`
fn contract_lkdc_ilda(m: &Tsr, n: &Tsr) -> Tsr {
    let nocc = m.shape()[0];
    let nvir = m.shape()[2];
    let scr_kcld = m.transpose([1, 3, 0, 2]);
    let scr_ldia = n.transpose([1, 2, 0, 3]);
    let scr_kcia = (scr_kcld.reshape((nocc * nvir, -1)) % scr_ldia.reshape((nocc * nvir, -1)))
        .into_shape((nocc, nvir, nocc, nvir));
    scr_kcia.transpose([3, 0, 2, 1]).into_contig(RowMajor)
}

/// Returns `(Wvoov[a,k,i,c], Wvovo[a,k,c,i])`.
pub fn get_rccsd_w_voov_vovo(mol_info: &RCCSDInfo, t1: &Tsr, t2: &Tsr) -> (Tsr, Tsr) {
    let nocc = t1.shape()[0];
    let nvir = t1.shape()[1];
    let eri = &mol_info.eri;

    // scr_ilda = 0.5 * t2 + np.einsum("id, la -> ilda", t1, t1)
    let scr_ilda: Tsr = 0.5 * t2 + t1.i((.., None, .., None)) * t1.i((None, .., None, ..));

    // Wvoov  = np.einsum("kacd, id -> akic", ovvv, t1)
    let scr_kaci = (eri.ovvv.reshape((-1, nvir)) % t1.t()).into_shape((nocc, nvir, nvir, nocc));
    let mut w_voov: Tsr = scr_kaci.transpose([1, 0, 3, 2]).into_contig(RowMajor);
    // Wvoov -= np.einsum("lkic, la -> akic", ooov, t1)
    w_voov -= (t1.t() % eri.ooov.reshape((nocc, -1))).into_shape((nvir, nocc, nocc, nvir));
    // Wvoov += np.einsum("kica -> akic", oovv)
    w_voov += eri.oovv.transpose([3, 0, 1, 2]).into_contig(RowMajor);
    // Wvoov -= np.einsum("lkdc, ilda -> akic", oovv, scr_ilda)
    w_voov -= contract_lkdc_ilda(&eri.oovv, &scr_ilda);
    // Wvoov += np.einsum("lkdc, ilad -> akic", oovv - 0.5 * oovv.swapaxes(-1, -2), t2)
    let scr_lkdc: Tsr = &eri.oovv - 0.5 * eri.oovv.swapaxes(-1, -2);
    w_voov += contract_lkdc_ilda(&scr_lkdc, &t2.swapaxes(-1, -2).into_contig(RowMajor));

    // Wvovo  = np.einsum("kadc, id -> akci", ovvv, t1)
    let scr_kaci = (eri.ovvv.swapaxes(-1, -2).reshape((-1, nvir)) % t1.t()).into_shape((nocc, nvir, nvir, nocc));
    let mut w_vovo: Tsr = scr_kaci.transpose([1, 0, 2, 3]).into_contig(RowMajor);
    // Wvovo -= np.einsum("klic, la -> akci", ooov, t1)
    let scr_akic =
        (t1.t() % eri.ooov.transpose([1, 0, 2, 3]).reshape((nocc, -1))).into_shape((nvir, nocc, nocc, nvir));
    w_vovo -= scr_akic.swapaxes(-1, -2).into_contig(RowMajor);
    // Wvovo += np.einsum("kaic -> akci", ovov)
    w_vovo += eri.ovov.transpose([1, 0, 3, 2]).into_contig(RowMajor);
    // Wvovo -= np.einsum("lkcd, ilda -> akci", oovv, scr_ilda)
    let scr_akic = contract_lkdc_ilda(&eri.oovv.swapaxes(-1, -2).into_contig(RowMajor), &scr_ilda);
    w_vovo -= scr_akic.swapaxes(-1, -2).into_contig(RowMajor);

    (w_voov, w_vovo)
}

/* #endregion */

/* #region residuals */

pub fn get_rccsd_rhs1(
    mol_info: &RCCSDInfo,
    intermediates: &RCCSDIntermediates,
    dressed: &RCCSDDressed,
    t1: &Tsr,
    t2: &Tsr,
) -> Tsr {
    let nocc = t1.shape()[0];
    let nvir = t1.shape()[1];
    let eri = &mol_info.eri;
    let fov = &intermediates.fov;
    let RCCSDDressed { tau, f_oo, f_vv, f_ov } = dressed;

    // RHS1 = fov
    let mut rhs1 = fov.clone();

    // RHS1 += - 2 * np.einsum("kc, ka, ic -> ia", fov, t1, t1)
    rhs1 -= 2.0 * (t1 % fov.t() % t1);

    // RHS1 +=   1 * np.einsum("ac, ic -> ia", Fvv, t1)
    rhs1 += t1 % f_vv.t();

    // RHS1 += - 1 * np.einsum("ki, ka -> ia", Foo, t1)
    rhs1 -= f_oo.t() % t1;

    // RHS1 +=   1 * np.einsum("kc, kica -> ia", Fov, 2 * t2 - t2.swapaxes(0, 1))
    let scr_iakc: Tsr = 2.0 * t2.transpose([1, 3, 0, 2]) - t2.transpose([0, 3, 1, 2]);
    rhs1 += (scr_iakc.reshape((nocc * nvir, -1)) % f_ov.reshape(-1)).into_shape((nocc, nvir));

    // RHS1 +=   1 * np.einsum("kc, ic, ka -> ia", Fov, t1, t1)
    rhs1 += t1 % f_ov.t() % t1;

    // RHS1 +=   1 * np.einsum("kc, kica -> ia", t1, 2 * oovv - ovov.transpose(0, 2, 3, 1))
    let scr_iakc: Tsr = 2.0 * eri.oovv.transpose([1, 3, 0, 2]) - eri.ovov.transpose([2, 1, 0, 3]);
    rhs1 += (scr_iakc.reshape((nocc * nvir, -1)) % t1.reshape(-1)).into_shape((nocc, nvir));

    // RHS1 +=   1 * np.einsum("kadc, ikcd -> ia", L_ovvv, tau)
    let scr_akcd = intermediates.l_ovvv.transpose([1, 0, 3, 2]);
    rhs1 += tau.reshape((nocc, -1)) % scr_akcd.reshape((nvir, -1)).t();

    // RHS1 += - 1 * np.einsum("klic, klac -> ia", L_ooov, tau)
    let scr_iklc = intermediates.l_ooov.transpose([2, 0, 1, 3]);
    let scr_aklc = tau.transpose([2, 0, 1, 3]);
    rhs1 -= scr_iklc.reshape((nocc, -1)) % scr_aklc.reshape((nvir, -1)).t();

    rhs1
}

/// Half-residual of the doubles equations; the full right-hand side is `X + X.transpose(1, 0, 3, 2)`.
pub fn get_rccsd_rhs2_half(
    mol_info: &RCCSDInfo,
    intermediates: &RCCSDIntermediates,
    dressed: &RCCSDDressed,
    t1: &Tsr,
    t2: &Tsr,
) -> Tsr {
    let nocc = t1.shape()[0];
    let nvir = t1.shape()[1];
    let eri = &mol_info.eri;
    let tau = &dressed.tau;
    let device = t1.device().clone();

    let timer = std::time::Instant::now();
    let l_oo = get_rccsd_l_oo(intermediates, dressed, t1);
    let l_vv = get_rccsd_l_vv(intermediates, dressed, t1);
    let w_oooo = get_rccsd_w_oooo(mol_info, dressed, t1);
    let w_vvvv = get_rccsd_w_vvvv(mol_info, t1);
    let (w_voov, w_vovo) = get_rccsd_w_voov_vovo(mol_info, t1, t2);
    debug!("Time elapsed (rhs2 intermediates): {:.3?}", timer.elapsed());

    let timer = std::time::Instant::now();

    // RHS2 = 0.5 * oovv
    let mut rhs2: Tsr = 0.5 * &eri.oovv;

    // RHS2 +=   1 * np.einsum("icab, jc -> ijab", ovvv, t1)
    let scr_iabj =
        (eri.ovvv.transpose([0, 2, 3, 1]).reshape((-1, nvir)) % t1.t()).into_shape((nocc, nvir, nvir, nocc));
    rhs2 += scr_iabj.transpose([0, 3, 1, 2]).into_contig(RowMajor);

    // RHS2 += - 1 * np.einsum("kbic, ka, jc -> ijab", ovov, t1, t1)
    let scr_kbij = (eri.ovov.reshape((-1, nvir)) % t1.t()).into_shape((nocc, nvir, nocc, nocc));
    let scr_abij = (t1.t() % scr_kbij.reshape((nocc, -1))).into_shape((nvir, nvir, nocc, nocc));
    rhs2 -= scr_abij.transpose([2, 3, 0, 1]).into_contig(RowMajor);

    // RHS2 += - 1 * np.einsum("jika, kb -> ijab", ooov, t1)
    let scr_jiab = (eri.ooov.swapaxes(-1, -2).reshape((-1, nocc)) % t1).into_shape((nocc, nocc, nvir, nvir));
    rhs2 -= scr_jiab.transpose([1, 0, 2, 3]).into_contig(RowMajor);

    // RHS2 += - 1 * np.einsum("kica, jc, kb -> ijab", oovv, t1, t1)
    let scr_kiaj = (eri.oovv.swapaxes(-1, -2).reshape((-1, nvir)) % t1.t()).into_shape((nocc, nocc, nvir, nocc));
    let scr_biaj = (t1.t() % scr_kiaj.reshape((nocc, -1))).into_shape((nvir, nocc, nvir, nocc));
    rhs2 -= scr_biaj.transpose([1, 3, 2, 0]).into_contig(RowMajor);

    debug!("Time elapsed (rhs2 t1 terms): {:.3?}", timer.elapsed());

    let timer = std::time::Instant::now();

    // RHS2 += 0.5 * np.einsum("klij, klab -> ijab", Woooo, tau)
    let scr_ijab = w_oooo.reshape((nocc * nocc, -1)).t() % tau.reshape((nocc * nocc, -1));
    rhs2 += 0.5 * scr_ijab.into_shape((nocc, nocc, nvir, nvir));

    // RHS2 += 0.5 * np.einsum("abcd, ijcd -> ijab", Wvvvv, tau)
    let rhs_ppl: Tsr = rt::zeros(([nocc, nocc, nvir, nvir], &device));
    (0..nvir).into_par_iter().for_each(|a| {
        let mut rhs_ppl = unsafe { rhs_ppl.force_mut() };
        let scr_ijb = tau.reshape((nocc * nocc, -1)) % w_vvvv.i(a).reshape((nvir, -1)).t();
        *&mut rhs_ppl.i_mut((.., .., a)) += 0.5 * scr_ijb.into_shape((nocc, nocc, nvir));
    });
    rhs2 += rhs_ppl;

    debug!("Time elapsed (rhs2 ladder): {:.3?}", timer.elapsed());

    let timer = std::time::Instant::now();

    // RHS2 +=   1 * np.einsum("ac, ijcb -> ijab", Lvv, t2)
    let scr_ijba = (t2.swapaxes(-1, -2).reshape((-1, nvir)) % l_vv.t()).into_shape((nocc, nocc, nvir, nvir));
    rhs2 += scr_ijba.swapaxes(-1, -2).into_contig(RowMajor);

    // RHS2 += - 1 * np.einsum("ki, kjab -> ijab", Loo, t2)
    rhs2 -= (l_oo.t() % t2.reshape((nocc, -1))).into_shape((nocc, nocc, nvir, nvir));

    // RHS2 +=   1 * np.einsum("akic, kjcb -> ijab", 2 * Wvoov - Wvovo.swapaxes(-1, -2), t2)
    let scr_aikc: Tsr = 2.0 * w_voov.transpose([0, 2, 1, 3]) - w_vovo.transpose([0, 3, 1, 2]);
    let scr_kcjb = t2.transpose([0, 2, 1, 3]);
    let scr_aijb = (scr_aikc.reshape((nvir * nocc, -1)) % scr_kcjb.reshape((nocc * nvir, -1)))
        .into_shape((nvir, nocc, nocc, nvir));
    rhs2 += scr_aijb.transpose([1, 2, 0, 3]).into_contig(RowMajor);

    // RHS2 += - 1 * np.einsum("akic, kjbc -> ijab", Wvoov, t2)
    let scr_aikc = w_voov.transpose([0, 2, 1, 3]);
    let scr_kcjb = t2.transpose([0, 3, 1, 2]);
    let scr_aijb = (scr_aikc.reshape((nvir * nocc, -1)) % scr_kcjb.reshape((nocc * nvir, -1)))
        .into_shape((nvir, nocc, nocc, nvir));
    rhs2 -= scr_aijb.transpose([1, 2, 0, 3]).into_contig(RowMajor);

    // RHS2 += - 1 * np.einsum("bkci, kjac -> ijab", Wvovo, t2)
    let scr_bikc = w_vovo.transpose([0, 3, 1, 2]);
    let scr_kcja = t2.transpose([0, 3, 1, 2]);
    let scr_bija = (scr_bikc.reshape((nvir * nocc, -1)) % scr_kcja.reshape((nocc * nvir, -1)))
        .into_shape((nvir, nocc, nocc, nvir));
    rhs2 -= scr_bija.transpose([1, 2, 3, 0]).into_contig(RowMajor);

    debug!("Time elapsed (rhs2 o3v3): {:.3?}", timer.elapsed());

    rhs2
}

/// In-place `X[i, j] + X[j, i].T` over occupied pairs.
pub fn symmetrize_rhs2(rhs2: Tsr) -> Tsr {
    let nocc = rhs2.shape()[0];
    (0..nocc).into_par_iter().for_each(|i| {
        (0..i + 1).into_par_iter().for_each(|j| {
            let mut rhs2 = unsafe { rhs2.force_mut() };
            let rhs2_ab = rhs2.i((i, j)) + rhs2.i((j, i)).t();
            rhs2.i_mut((i, j)).assign(&rhs2_ab);
            if i != j {
                rhs2.i_mut((j, i)).assign(&rhs2_ab.t());
            }
        });
    });
    rhs2
}

/// Raw right-hand sides of the singles and doubles equations, before division by the resolvent.
pub fn get_rccsd_rhs(
    mol_info: &RCCSDInfo,
    intermediates: &RCCSDIntermediates,
    t1: &Tsr,
    t2: &Tsr,
) -> (Tsr, Tsr) {
    let timer = std::time::Instant::now();
    let dressed = get_rccsd_dressed(intermediates, t1, t2);
    debug!("Time elapsed (dressed intermediates): {:.3?}", timer.elapsed());

    let timer = std::time::Instant::now();
    let rhs1 = get_rccsd_rhs1(mol_info, intermediates, &dressed, t1, t2);
    debug!("Time elapsed (rhs1): {:.3?}", timer.elapsed());

    let rhs2 = get_rccsd_rhs2_half(mol_info, intermediates, &dressed, t1, t2);
    let rhs2 = symmetrize_rhs2(rhs2);
    (rhs1, rhs2)
}

/* #endregion */

/* #region energy, guess and amplitude update */

pub fn get_rccsd_energy(intermediates: &RCCSDIntermediates, t1: &Tsr, t2: &Tsr) -> f64 {
    // E = 2 * np.einsum("ia, ia", fov, t1) + np.einsum("ijab, ijab", L_oovv, tau)
    let tau = get_rccsd_tau(t1, t2);
    let e_t1 = 2.0 * (&intermediates.fov * t1).sum();
    let e_t2 = (&intermediates.l_oovv * &tau).sum();
    e_t1 + e_t2
}

/// Perturbative guess, optionally overwritten in its top-left block by amplitudes of a smaller solve.
pub fn get_rccsd_initial_guess(
    mol_info: &RCCSDInfo,
    resolvent: &RCCSDResolvent,
    guess: Option<&RCCSDAmplitudes>,
) -> Result<RCCSDAmplitudes> {
    let nocc = mol_info.nocc();
    let nvir = mol_info.nvir();

    // t1 = fov / d_ov, t2 = oovv / d_oovv
    let mut t1 = &mol_info.fov / &resolvent.d_ov;
    let mut t2 = &mol_info.eri.oovv / &resolvent.d_oovv;

    if let Some(guess) = guess {
        if guess.t1.ndim() != 2 {
            return Err(RCCSDError::DimensionMismatch {
                name: "guess t1".to_string(),
                expected: vec![nocc, nvir],
                actual: guess.t1.shape().to_vec(),
            });
        }
        let guess_nocc = guess.nocc();
        let guess_nvir = guess.nvir();
        if guess_nocc > nocc || guess_nvir > nvir {
            return Err(RCCSDError::GuessTooLarge { guess_nocc, guess_nvir, nocc, nvir });
        }
        structs::check_shape("guess t2", &guess.t2, &[guess_nocc, guess_nocc, guess_nvir, guess_nvir])?;
        t1.i_mut((..guess_nocc, ..guess_nvir)).assign(&guess.t1);
        t2.i_mut((..guess_nocc, ..guess_nocc, ..guess_nvir, ..guess_nvir)).assign(&guess.t2);
        info!("Seeded amplitudes from a ({guess_nocc} occ, {guess_nvir} vir) solve");
    }

    Ok(RCCSDAmplitudes { t1, t2 })
}

pub fn get_amplitude_from_rhs(resolvent: &RCCSDResolvent, rhs1: Tsr, rhs2: Tsr) -> (Tsr, Tsr) {
    let t1_new = rhs1 / &resolvent.d_ov;
    let t2_new = rhs2 / &resolvent.d_oovv;
    (t1_new, t2_new)
}

/// One Jacobi update of both amplitudes, without acceleration or damping.
pub fn update_rccsd_amplitude(
    mol_info: &RCCSDInfo,
    intermediates: &RCCSDIntermediates,
    resolvent: &RCCSDResolvent,
    amplitudes: &RCCSDAmplitudes,
) -> RCCSDAmplitudes {
    let (rhs1, rhs2) = get_rccsd_rhs(mol_info, intermediates, &amplitudes.t1, &amplitudes.t2);
    let (t1, t2) = get_amplitude_from_rhs(resolvent, rhs1, rhs2);
    RCCSDAmplitudes { t1, t2 }
}

/// Singles update with doubles held fixed.
pub fn update_rccsd_t1_amplitude(
    mol_info: &RCCSDInfo,
    intermediates: &RCCSDIntermediates,
    resolvent: &RCCSDResolvent,
    amplitudes: &RCCSDAmplitudes,
) -> Tsr {
    let RCCSDAmplitudes { t1, t2 } = amplitudes;
    let dressed = get_rccsd_dressed(intermediates, t1, t2);
    let rhs1 = get_rccsd_rhs1(mol_info, intermediates, &dressed, t1, t2);
    rhs1 / &resolvent.d_ov
}

/* #endregion */
