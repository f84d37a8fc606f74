use crate::prelude::*;
use std::path::Path;

/// Read a `.npy` file of `f64` into a row-major tensor.
///
/// Fortran-ordered files are transposed into row-major layout with the numpy shape preserved.
pub fn tensor_from_npy(path: impl AsRef<Path>) -> Result<Tsr> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let device = DeviceTsr::default();

    let bytes = std::fs::read(path).map_err(|source| RCCSDError::Io { path: path_str.clone(), source })?;
    let npy = npyz::NpyFile::new(&bytes[..]).map_err(|e| RCCSDError::Npy { path: path_str.clone(), message: e.to_string() })?;
    let shape = npy.shape().iter().map(|x| *x as usize).collect_vec();
    let order = npy.order();
    let data: Vec<f64> =
        npy.into_vec().map_err(|e| RCCSDError::Npy { path: path_str.clone(), message: e.to_string() })?;

    let tsr = match order {
        npyz::Order::C => rt::asarray((data, shape, &device)),
        npyz::Order::Fortran => {
            let shape_rev = shape.into_iter().rev().collect_vec();
            rt::asarray((data, shape_rev, &device)).into_reverse_axes().into_contig(RowMajor)
        },
    };
    Ok(tsr)
}

/// Assemble [`RCCSDInfo`] from `foo.npy`, `fov.npy`, ..., `vvvv.npy` in one directory.
///
/// Optional `mo_energy_occ.npy` and `mo_energy_vir.npy` override the Fock diagonals.
pub fn rccsd_info_from_npy_dir(dir: impl AsRef<Path>, e_ref: f64) -> Result<RCCSDInfo> {
    let dir = dir.as_ref();
    let read = |name: &str| tensor_from_npy(dir.join(format!("{name}.npy")));

    let eri = RCCSDEri {
        oooo: read("oooo")?,
        ooov: read("ooov")?,
        oovv: read("oovv")?,
        ovov: read("ovov")?,
        ovvv: read("ovvv")?,
        vvvv: read("vvvv")?,
    };
    let mut mol_info = RCCSDInfo::new(e_ref, read("foo")?, read("fov")?, read("fvv")?, eri);

    for (name, target) in [("mo_energy_occ", &mut mol_info.mo_energy_occ), ("mo_energy_vir", &mut mol_info.mo_energy_vir)] {
        let path = dir.join(format!("{name}.npy"));
        if path.exists() {
            info!("Orbital energies overridden by {}", path.display());
            *target = tensor_from_npy(&path)?;
        }
    }

    mol_info.check_dimensions()?;
    Ok(mol_info)
}
