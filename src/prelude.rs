#![allow(unused)]

/* #region for API callers */

pub use crate::diis::{Accelerator, AcceleratorOutcome, DIISIncore, DIISIncoreFlags, NoAccelerator};
pub use crate::error::{RCCSDError, Result};
pub use crate::iteration::rccsd_iteration;
pub use crate::resolvent::RCCSDResolvent;
pub use crate::structs::{
    CCSDConfig, CCSDDiagnostic, DIISMode, IterationRecord, Phase, RCCSDAmplitudes, RCCSDEri, RCCSDInfo,
    RCCSDIntermediates, RCCSDResults,
};

/* #endregion */

/* #region for developers */

// RSTSR backend selection
#[cfg(not(feature = "use_openblas"))]
pub type DeviceTsr = DeviceFaer;
#[cfg(feature = "use_openblas")]
pub type DeviceTsr = DeviceOpenBLAS;

pub(crate) use itertools::{Itertools, iproduct};
pub(crate) use rayon::prelude::*;
pub(crate) use tracing::{debug, info, warn};
pub use rstsr::prelude::*;

pub(crate) use crate::*;

pub type Tsr<D = IxD> = Tensor<f64, DeviceTsr, D>;
pub type TsrView<'a, D = IxD> = TensorView<'a, f64, DeviceTsr, D>;
pub type TsrMut<'a, D = IxD> = TensorMut<'a, f64, DeviceTsr, D>;

/* #endregion */
