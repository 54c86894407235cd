//! Binary sample matrices and training data.

use crate::bitset::BitSet;
use crate::error::{CorelsError, Result};

/// A dense `n × m` matrix of binary features, one row per sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMatrix {
    rows: Vec<Vec<bool>>,
    n_cols: usize,
}

impl BinaryMatrix {
    /// Builds a matrix from rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self> {
        let n_cols = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
            return Err(CorelsError::shape(format!(
                "Row {} has {} features, expected {}",
                i,
                row.len(),
                n_cols
            )));
        }
        Ok(Self { rows, n_cols })
    }

    /// Builds a matrix from rows of `0`/`1` values.
    pub fn from_u8_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.as_ref()
                    .iter()
                    .map(|&v| match v {
                        0 => Ok(false),
                        1 => Ok(true),
                        _ => Err(CorelsError::shape(format!("Row {} has non-binary value {}", i, v))),
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_rows(rows)
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, index: usize) -> &[bool] {
        &self.rows[index]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Returns column `j` as a bit vector over the rows.
    pub fn column(&self, j: usize) -> BitSet {
        BitSet::from_bools(self.rows.iter().map(|row| row[j]))
    }
}

/// Training data in the column-major bit-vector layout used by the search.
///
/// Immutable for the duration of a search; every component holds it by
/// shared reference.
#[derive(Debug, Clone)]
pub struct Dataset {
    n_samples: usize,
    /// `features[j]`: samples where feature `j` is set.
    features: Vec<BitSet>,
    /// `labels[0]`: samples labelled `false`; `labels[1]`: samples labelled `true`.
    labels: [BitSet; 2],
}

impl Dataset {
    /// Builds the training data, checking that samples and labels agree in length.
    pub fn new(samples: &BinaryMatrix, labels: &[bool]) -> Result<Self> {
        if samples.n_rows() != labels.len() {
            return Err(CorelsError::shape(format!(
                "Found {} samples but {} labels",
                samples.n_rows(),
                labels.len()
            )));
        }
        if samples.n_rows() == 0 {
            return Err(CorelsError::shape("At least one sample is required"));
        }

        let features = (0..samples.n_cols()).map(|j| samples.column(j)).collect();
        let positive = BitSet::from_bools(labels.iter().copied());
        let negative = positive.not();

        Ok(Self {
            n_samples: samples.n_rows(),
            features,
            labels: [negative, positive],
        })
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Samples where feature `j` is set.
    pub fn feature(&self, j: usize) -> &BitSet {
        &self.features[j]
    }

    /// Samples carrying the given label.
    pub fn label(&self, label: bool) -> &BitSet {
        &self.labels[label as usize]
    }

    /// Label taken by the majority of `samples`, ties going to `true`.
    ///
    /// Returns the label and the number of samples it classifies correctly.
    pub fn majority(&self, samples: &BitSet) -> (bool, usize) {
        let total = samples.count();
        let ones = samples.and_count(self.label(true));
        let zeros = total - ones;
        if zeros > ones {
            (false, zeros)
        } else {
            (true, ones)
        }
    }
}
