use polars::prelude::*;

const CHANNEL_COLUMN_PREFIX: &str = "channel_";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("Cannot reshape {len} values into rows of {columns} columns")]
    Reshape { len: usize, columns: usize },

    #[error("Row {row} has {actual} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("A matrix needs at least one column")]
    NoColumns,
}

/// Timepoints by channels, stored row-major.
///
/// Every row has exactly `columns()` values. A matrix may have zero rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMatrix {
    values: Vec<f64>,
    columns: usize,
}

impl ChannelMatrix {
    /// Reshape a flat row-major sequence into rows of `columns` values.
    pub fn from_flat(values: Vec<f64>, columns: usize) -> Result<Self, MatrixError> {
        if columns == 0 {
            return Err(MatrixError::NoColumns);
        }
        if values.len() % columns != 0 {
            return Err(MatrixError::Reshape {
                len: values.len(),
                columns,
            });
        }
        Ok(Self { values, columns })
    }

    /// Build a matrix from explicit rows, which must all be the same width.
    pub fn from_rows<R>(rows: impl IntoIterator<Item = R>) -> Result<Self, MatrixError>
    where
        R: AsRef<[f64]>,
    {
        let mut values = Vec::new();
        let mut columns = None;

        for (i, row) in rows.into_iter().enumerate() {
            let row = row.as_ref();
            match columns {
                None => columns = Some(row.len()),
                Some(expected) if expected != row.len() => {
                    return Err(MatrixError::RaggedRow {
                        row: i,
                        expected,
                        actual: row.len(),
                    });
                }
                Some(_) => {}
            }
            values.extend_from_slice(row);
        }

        Self::from_flat(values, columns.ok_or(MatrixError::NoColumns)?)
    }

    /// A matrix with no rows.
    pub fn empty(columns: usize) -> Result<Self, MatrixError> {
        Self::from_flat(Vec::new(), columns)
    }

    pub fn rows(&self) -> usize {
        self.values.len() / self.columns
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.columns)
    }

    /// Total number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.columns)?;
        let end = start.checked_add(self.columns)?;
        self.values.get(start..end)
    }

    pub fn iter_rows(&self) -> std::slice::Chunks<'_, f64> {
        self.values.chunks(self.columns)
    }

    pub fn as_flat(&self) -> &[f64] {
        &self.values
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }

    /// One `Float64` column per channel, named `channel_<n>`.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = (0..self.columns)
            .map(|channel| {
                let values: Vec<f64> = self
                    .iter_rows()
                    .map(|row| row[channel])
                    .collect();
                Series::new(format!("{CHANNEL_COLUMN_PREFIX}{channel}").into(), values).into()
            })
            .collect::<Vec<Column>>();

        DataFrame::new(columns)
    }
}
