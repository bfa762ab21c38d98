use std::path::Path;

use lexrag_core::config::IndexBackendKind;
use lexrag_core::{Error, Result};

use crate::dense::DenseIndex;
use crate::topk::top_k;

/// Storage and scoring for the vectors of one index.
pub trait VectorBackend: Send + Sync {
    fn name(&self) -> &'static str;
    /// Dimension, once configured or established by the first insert.
    fn dim(&self) -> Option<usize>;
    fn len(&self) -> usize;
    /// Append rows. Either every row is stored or none is.
    fn add(&mut self, rows: &[Vec<f32>]) -> Result<()>;
    /// Inner product of `query` with every stored row, by position.
    fn scores(&self, query: &[f32]) -> Result<Vec<f32>>;
    /// File name the vectors are saved under for index `name`.
    fn file_name(&self, name: &str) -> String;
    fn save(&self, path: &Path) -> Result<()>;
    /// Replace the contents with what `save` wrote to `path`.
    fn load(&mut self, path: &Path) -> Result<()>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        check_query(self.dim(), query)?;
        Ok(top_k(&self.scores(query)?, k))
    }
}

/// Dimension shared by `rows`, checked against `dim` when it is known.
pub(crate) fn check_rows(dim: Option<usize>, rows: &[Vec<f32>]) -> Result<usize> {
    let width = match (dim, rows.first()) {
        (Some(d), _) => d,
        (None, Some(first)) => first.len(),
        (None, None) => return Ok(0),
    };
    if width == 0 {
        return Err(Error::Index("vectors must not be empty".into()));
    }
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(Error::Index(format!(
                "dimension mismatch at row {i}: expected {width}, got {}",
                row.len()
            )));
        }
        if row.iter().any(|x| !x.is_finite()) {
            return Err(Error::Index(format!("row {i} contains a non-finite value")));
        }
    }
    Ok(width)
}

pub(crate) fn check_query(dim: Option<usize>, query: &[f32]) -> Result<()> {
    if let Some(d) = dim {
        if query.len() != d {
            return Err(Error::Index(format!(
                "query dimension mismatch: expected {d}, got {}",
                query.len()
            )));
        }
    }
    if query.iter().any(|x| !x.is_finite()) {
        return Err(Error::Index("query contains a non-finite value".into()));
    }
    Ok(())
}

/// Build the backend named by `kind`. `Auto` prefers the tensor index when it
/// is compiled in.
pub fn select_backend(kind: IndexBackendKind, dim: Option<usize>) -> Result<Box<dyn VectorBackend>> {
    match kind {
        IndexBackendKind::Dense => Ok(Box::new(DenseIndex::new(dim))),
        #[cfg(feature = "tensor-index")]
        IndexBackendKind::Flat | IndexBackendKind::Auto => Ok(Box::new(crate::flat::FlatIpIndex::new(dim))),
        #[cfg(not(feature = "tensor-index"))]
        IndexBackendKind::Flat => Err(Error::InvalidConfig(
            "index.backend = \"flat\" requires the tensor-index feature".into(),
        )),
        #[cfg(not(feature = "tensor-index"))]
        IndexBackendKind::Auto => Ok(Box::new(DenseIndex::new(dim))),
    }
}
