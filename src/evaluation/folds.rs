//! Partitioning of sequence indices into cross-validation folds

use crate::core::{GkmError, LabelVector, Result};

/// Disjoint cover of `0..n_seqs` by test folds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldPartition {
    folds: Vec<Vec<usize>>,
    n_seqs: usize,
}

impl FoldPartition {
    /// Deterministic stratified partition into `ncv` folds
    ///
    /// The r-th positive goes to fold `r % ncv`. Negatives continue the same
    /// rotation, so the r-th negative goes to fold `(n_pos + r) % ncv`. Fold
    /// sizes differ by at most one and every test fold holds both classes.
    pub fn stratified(labels: LabelVector, ncv: usize) -> Result<Self> {
        if ncv < 2 {
            return Err(GkmError::config(format!(
                "number of folds must be at least 2, got {ncv}"
            )));
        }
        labels.require_both_classes()?;
        if ncv > labels.n_pos() || ncv > labels.n_neg() {
            return Err(GkmError::config(format!(
                "{ncv} folds need at least {ncv} sequences per class, got {} positives and {} negatives",
                labels.n_pos(),
                labels.n_neg()
            )));
        }

        let mut folds = vec![Vec::new(); ncv];
        for i in 0..labels.n_pos() {
            folds[i % ncv].push(i);
        }
        for r in 0..labels.n_neg() {
            folds[(labels.n_pos() + r) % ncv].push(labels.n_pos() + r);
        }

        Ok(Self {
            folds,
            n_seqs: labels.len(),
        })
    }

    /// Use caller-chosen folds, checked to be non-empty and to cover `0..n_seqs` exactly once
    pub fn from_folds(folds: Vec<Vec<usize>>, n_seqs: usize) -> Result<Self> {
        if folds.len() < 2 {
            return Err(GkmError::config(format!(
                "number of folds must be at least 2, got {}",
                folds.len()
            )));
        }

        let mut seen = vec![false; n_seqs];
        let mut folds = folds;
        for (f, fold) in folds.iter_mut().enumerate() {
            if fold.is_empty() {
                return Err(GkmError::config(format!("fold {f} is empty")));
            }
            for &i in fold.iter() {
                match seen.get_mut(i) {
                    None => {
                        return Err(GkmError::config(format!(
                            "fold {f} contains index {i}, outside 0..{n_seqs}"
                        )))
                    }
                    Some(true) => {
                        return Err(GkmError::config(format!(
                            "index {i} appears in more than one fold"
                        )))
                    }
                    Some(slot) => *slot = true,
                }
            }
            fold.sort_unstable();
        }

        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(GkmError::config(format!(
                "index {missing} is not assigned to any fold"
            )));
        }

        Ok(Self { folds, n_seqs })
    }

    /// Number of folds
    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }

    /// Number of indices covered
    pub fn n_seqs(&self) -> usize {
        self.n_seqs
    }

    /// Test indices of fold `f`, ascending
    pub fn test_indices(&self, f: usize) -> &[usize] {
        &self.folds[f]
    }

    /// Every index outside fold `f`, ascending
    pub fn train_indices(&self, f: usize) -> Vec<usize> {
        let mut in_test = vec![false; self.n_seqs];
        for &i in &self.folds[f] {
            in_test[i] = true;
        }
        (0..self.n_seqs).filter(|&i| !in_test[i]).collect()
    }

    /// Iterate over `(train, test)` index pairs in fold order
    pub fn splits(&self) -> impl Iterator<Item = (Vec<usize>, &[usize])> + '_ {
        (0..self.n_folds()).map(move |f| (self.train_indices(f), self.test_indices(f)))
    }
}
