use crate::prelude::*;
use std::collections::HashMap;

/* #region accelerator interface */

pub struct AcceleratorOutcome {
    /// Vector to be used as the next iterate.
    pub vec: Tsr,

    /// Whether the returned vector is an extrapolation over the history.
    pub extrapolated: bool,

    /// Extrapolation was attempted but refused (singular or ill-conditioned system); `vec` is the input vector.
    pub fallback: bool,
}

/// Convergence acceleration over a sequence of `(vector, error)` pairs.
pub trait Accelerator {
    fn update(&mut self, vec: Tsr, err: Tsr) -> AcceleratorOutcome;
    fn len(&self) -> usize;
    fn reset(&mut self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Plain fixed-point iteration.
#[derive(Debug, Default)]
pub struct NoAccelerator;

impl Accelerator for NoAccelerator {
    fn update(&mut self, vec: Tsr, _err: Tsr) -> AcceleratorOutcome {
        AcceleratorOutcome { vec, extrapolated: false, fallback: false }
    }

    fn len(&self) -> usize {
        0
    }

    fn reset(&mut self) {}
}

pub fn get_accelerator(enabled: bool, flags: DIISIncoreFlags, device: &DeviceTsr) -> Box<dyn Accelerator> {
    if enabled { Box::new(DIISIncore::new(flags, device)) } else { Box::new(NoAccelerator) }
}

/* #endregion */

/* #region DIIS */

#[derive(Debug, Clone, Copy)]
pub struct DIISIncoreFlags {
    /// Maximum number of vectors in the DIIS space. Default is 8.
    pub space: usize,

    /// Minimum number of vectors in the DIIS space for extrapolation. Default is 2.
    pub min_space: usize,
}

impl Default for DIISIncoreFlags {
    fn default() -> Self {
        Self { space: 8, min_space: 2 }
    }
}

pub struct DIISIncoreIntermediates {
    /// Error vector overlap matrix for DIIS
    ///
    /// This overlap matrix follows convention that
    /// - the first row and column is auxiliary vector `[0, 1, ..., 1]`;
    /// - the rest of the matrix is the overlap matrix of the error vectors.
    ///
    /// Thus, internal index is 1-based.
    ovlp: Tsr,

    /// Error vectors for DIIS.
    ///
    /// Mapping: idx_internal -> err
    err_map: HashMap<usize, Tsr>,

    /// Vectors to be extrapolated for DIIS
    ///
    /// Mapping: idx_internal -> vec
    vec_map: HashMap<usize, Tsr>,

    /// Mapping: idx_internal -> iteration
    niter_map: HashMap<usize, usize>,

    /// Iteration stamp given to the next pushed vector.
    niter_next: usize,
}

pub struct DIISIncore {
    pub flags: DIISIncoreFlags,
    pub intermediates: DIISIncoreIntermediates,
}

impl DIISIncore {
    /// Initialize DIIS object.
    pub fn new(flags: DIISIncoreFlags, device: &DeviceTsr) -> Self {
        let mut ovlp = rt::zeros(([flags.space + 1, flags.space + 1], device));
        ovlp.i_mut((0, 1..)).fill(1.0);
        ovlp.i_mut((1.., 0)).fill(1.0);
        let intermediates = DIISIncoreIntermediates {
            ovlp,
            err_map: HashMap::new(),
            vec_map: HashMap::new(),
            niter_map: HashMap::new(),
            niter_next: 0,
        };

        Self { flags, intermediates }
    }

    /// Slot for the next vector: the next free slot, or the slot of the oldest vector when full.
    pub fn get_head(&self) -> usize {
        let cur_space = self.intermediates.err_map.len();
        if cur_space < self.flags.space {
            return cur_space + 1;
        }
        self.intermediates.niter_map.iter().min_by_key(|(_, niter)| **niter).map(|(idx, _)| *idx).unwrap_or(1)
    }

    /// Pop the vector at `head` and clear its overlap row and column.
    pub fn pop_head(&mut self, head: usize) {
        self.intermediates.err_map.remove(&head);
        self.intermediates.vec_map.remove(&head);
        self.intermediates.niter_map.remove(&head);

        let ovlp = &mut self.intermediates.ovlp;
        ovlp.i_mut((head, 1..)).fill(0.0);
        ovlp.i_mut((1.., head)).fill(0.0);
    }

    /// Insert a vector to the DIIS space, evicting the oldest one when the space is full.
    pub fn push(&mut self, vec: Tsr, err: Tsr) {
        let head = self.get_head();
        if self.intermediates.err_map.len() >= self.flags.space {
            self.pop_head(head);
        }

        let iteration = self.intermediates.niter_next;
        self.intermediates.niter_next += 1;

        // update the overlap matrix
        let num_space = self.intermediates.err_map.len() + 1;
        let err_list = (1..=num_space)
            .filter_map(|i| if i == head { Some(&err) } else { self.intermediates.err_map.get(&i) })
            .collect_vec();
        let ovlp_cur = Self::incore_inner_dot(&err, &err_list);
        let ovlp = &mut self.intermediates.ovlp;
        ovlp.i_mut((head, 1..num_space + 1)).assign(&ovlp_cur);
        ovlp.i_mut((1..num_space + 1, head)).assign(&ovlp_cur);

        self.intermediates.err_map.insert(head, err);
        self.intermediates.vec_map.insert(head, vec);
        self.intermediates.niter_map.insert(head, iteration);
    }

    /// Extrapolate the vector from the DIIS space.
    ///
    /// `None` when the space holds fewer than `min_space` vectors (and never for a single vector), or when the
    /// linear system gives non-finite coefficients or coefficients that do not sum to one.
    pub fn extrapolate(&self) -> Option<Tsr> {
        let num_space = self.intermediates.err_map.len();
        if num_space < self.flags.min_space.max(2) {
            return None;
        }

        // normalize the error block so that the eigenvalue cutoff is relative
        let ovlp = &self.intermediates.ovlp;
        let scale = (1..=num_space).map(|i| ovlp[[i, i]]).fold(0.0, f64::max);
        if !(scale > 0.0 && scale.is_finite()) {
            return None;
        }
        let mut h = ovlp.i((..num_space + 1, ..num_space + 1)).into_contig(RowMajor);
        let h_err = h.i((1.., 1..)).mapv(|x| x / scale);
        h.i_mut((1.., 1..)).assign(&h_err);

        let (w, v) = rt::linalg::eigh(&h.view()).into();

        let eps = 1.0e-14;

        // drop the small eigenvalues, then take reciprocals
        let w = w.mapv(|x| if x.abs() < eps { 0.0 } else { 1.0 / x });

        // g: [1, 0, 0, ..., 0]
        let mut g: Tsr = rt::zeros(([num_space + 1], h.device()));
        g[[0]] = 1.0;

        // DIIS coefficients
        let c = (v.view() * w) % v.t() % g;
        let coef = (1..=num_space).map(|idx| c[[idx]]).collect_vec();
        let coef_sum: f64 = coef.iter().sum();
        if coef.iter().any(|x| !x.is_finite()) || (coef_sum - 1.0).abs() > 1.0e-6 {
            return None;
        }

        let mut vec = self.intermediates.vec_map.get(&1)?.zeros_like();
        for (idx, c_idx) in (1..=num_space).zip(coef) {
            let vec_idx = self.intermediates.vec_map.get(&idx)?;
            vec += vec_idx * c_idx;
        }

        Some(vec)
    }

    /// Stored `(vec, err)` pairs, oldest first.
    pub fn history(&self) -> Vec<(&Tsr, &Tsr)> {
        self.intermediates
            .niter_map
            .iter()
            .sorted_by_key(|(_, niter)| **niter)
            .filter_map(|(idx, _)| Some((self.intermediates.vec_map.get(idx)?, self.intermediates.err_map.get(idx)?)))
            .collect()
    }

    /// Perform inner dot for obtaining overlap.
    pub fn incore_inner_dot(a: &Tsr, b_list: &[&Tsr]) -> Tsr {
        let mut result = rt::zeros(([b_list.len()], a.device()));
        for (n, b) in b_list.iter().enumerate() {
            result[[n]] = (a.reshape(-1) % b.reshape(-1)).to_scalar();
        }
        result
    }
}

impl Accelerator for DIISIncore {
    fn update(&mut self, vec: Tsr, err: Tsr) -> AcceleratorOutcome {
        let vec_fallback = vec.clone();
        self.push(vec, err);
        if self.len() < self.flags.min_space {
            return AcceleratorOutcome { vec: vec_fallback, extrapolated: false, fallback: false };
        }
        match self.extrapolate() {
            Some(vec) => AcceleratorOutcome { vec, extrapolated: true, fallback: false },
            None => AcceleratorOutcome { vec: vec_fallback, extrapolated: false, fallback: true },
        }
    }

    fn len(&self) -> usize {
        self.intermediates.err_map.len()
    }

    fn reset(&mut self) {
        let device = self.intermediates.ovlp.device().clone();
        *self = DIISIncore::new(self.flags, &device);
    }
}

/* #endregion */

#[cfg(test)]
mod test {
    use super::*;

    fn vector(data: &[f64]) -> Tsr {
        rt::asarray((data.to_vec(), &DeviceTsr::default()))
    }

    #[test]
    fn single_entry_does_not_extrapolate() {
        let flags = DIISIncoreFlags { space: 4, min_space: 1 };
        let mut diis = DIISIncore::new(flags, &DeviceTsr::default());
        diis.push(vector(&[1.0, 2.0]), vector(&[0.1, -0.1]));
        assert!(diis.extrapolate().is_none());

        let outcome = diis.update(vector(&[3.0, 4.0]), vector(&[0.0, 0.0]));
        assert_eq!(diis.len(), 2);
        assert!(outcome.vec.raw().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn zero_errors_fall_back_to_input() {
        let mut diis = DIISIncore::new(DIISIncoreFlags { space: 4, min_space: 2 }, &DeviceTsr::default());
        let first = diis.update(vector(&[1.0, 1.0]), vector(&[0.0, 0.0]));
        assert!(!first.fallback && !first.extrapolated);

        let second = diis.update(vector(&[2.0, 3.0]), vector(&[0.0, 0.0]));
        assert!(second.fallback);
        assert_eq!(second.vec.to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn extrapolation_recovers_linear_fixed_point() {
        // errors are x - x*, with x* = [0.5, 0.5]
        let mut diis = DIISIncore::new(DIISIncoreFlags::default(), &DeviceTsr::default());
        diis.update(vector(&[1.0, 0.0]), vector(&[0.5, -0.5]));
        let outcome = diis.update(vector(&[0.0, 1.0]), vector(&[-0.5, 0.5]));
        assert!(outcome.extrapolated);
        for x in outcome.vec.to_vec() {
            assert!((x - 0.5).abs() < 1.0e-12);
        }
    }

    #[test]
    fn history_is_bounded_fifo() {
        let space = 3;
        let mut diis = DIISIncore::new(DIISIncoreFlags { space, min_space: space }, &DeviceTsr::default());
        for tag in 0..7 {
            let tag = tag as f64;
            diis.push(vector(&[tag]), vector(&[1.0 + tag, 0.5 * tag]));
            assert!(diis.len() <= space);
        }
        let tags = diis.history().into_iter().map(|(vec, _)| vec.to_vec()[0]).collect_vec();
        assert_eq!(tags, vec![4.0, 5.0, 6.0]);

        diis.reset();
        assert!(diis.is_empty());
    }
}
