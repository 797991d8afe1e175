use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Selected index {index} is out of range for a system of {len} atoms")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Selection mask has {found} entries but the system has {expected} atoms")]
    MaskLengthMismatch { expected: usize, found: usize },

    #[error("Selection range {start}..{end} exceeds the system size {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Selection does not contain any atoms")]
    Empty,
}

/// Identifies the atoms that belong to the QM region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Explicit atom indices. Order and duplicates are ignored.
    Indices(Vec<usize>),
    /// One flag per atom; `true` marks a QM atom.
    Mask(Vec<bool>),
    /// A contiguous block of atoms.
    Range(Range<usize>),
}

impl From<Vec<usize>> for Selection {
    fn from(indices: Vec<usize>) -> Self {
        Selection::Indices(indices)
    }
}

impl From<Vec<bool>> for Selection {
    fn from(mask: Vec<bool>) -> Self {
        Selection::Mask(mask)
    }
}

impl From<Range<usize>> for Selection {
    fn from(range: Range<usize>) -> Self {
        Selection::Range(range)
    }
}

impl Selection {
    /// Normalizes the selection against a system of `n_atoms` atoms.
    ///
    /// # Errors
    ///
    /// Fails if the selection addresses atoms outside the system, if a mask has the wrong
    /// length, or if the QM region would be empty.
    pub fn resolve(&self, n_atoms: usize) -> Result<Partition, SelectionError> {
        let mut mask = vec![false; n_atoms];
        match self {
            Selection::Indices(indices) => {
                for &index in indices {
                    let slot = mask.get_mut(index).ok_or(SelectionError::IndexOutOfRange {
                        index,
                        len: n_atoms,
                    })?;
                    *slot = true;
                }
            }
            Selection::Mask(flags) => {
                if flags.len() != n_atoms {
                    return Err(SelectionError::MaskLengthMismatch {
                        expected: n_atoms,
                        found: flags.len(),
                    });
                }
                mask.copy_from_slice(flags);
            }
            Selection::Range(range) => {
                if range.end > n_atoms {
                    return Err(SelectionError::RangeOutOfBounds {
                        start: range.start,
                        end: range.end,
                        len: n_atoms,
                    });
                }
                for flag in mask.iter_mut().take(range.end).skip(range.start) {
                    *flag = true;
                }
            }
        }
        Partition::from_mask(mask)
    }
}

/// Canonical split of a system into disjoint QM and MM index sets.
///
/// Both index lists are sorted and together cover every atom exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    qm: Vec<usize>,
    mm: Vec<usize>,
    mask: Vec<bool>,
}

impl Partition {
    fn from_mask(mask: Vec<bool>) -> Result<Self, SelectionError> {
        let (qm, mm): (Vec<usize>, Vec<usize>) = (0..mask.len()).partition(|&i| mask[i]);
        if qm.is_empty() {
            return Err(SelectionError::Empty);
        }
        Ok(Self { qm, mm, mask })
    }

    pub fn qm_indices(&self) -> &[usize] {
        &self.qm
    }

    pub fn mm_indices(&self) -> &[usize] {
        &self.mm
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Number of atoms in the full system this partition was resolved against.
    pub fn n_atoms(&self) -> usize {
        self.mask.len()
    }

    pub fn is_qm(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }
}
