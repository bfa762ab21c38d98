use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use lexrag_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::backend::{check_rows, VectorBackend};

/// Row-major matrix scanned in full for every query.
#[derive(Debug, Clone, Default)]
pub struct DenseIndex {
    dim: Option<usize>,
    data: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct DenseFile {
    dim: usize,
    data: Vec<f32>,
}

impl DenseIndex {
    pub fn new(dim: Option<usize>) -> Self {
        Self { dim, data: Vec::new() }
    }
}

impl VectorBackend for DenseIndex {
    fn name(&self) -> &'static str { "dense" }

    fn dim(&self) -> Option<usize> { self.dim }

    fn len(&self) -> usize {
        match self.dim {
            Some(d) if d > 0 => self.data.len() / d,
            _ => 0,
        }
    }

    fn add(&mut self, rows: &[Vec<f32>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let dim = check_rows(self.dim, rows)?;
        self.data.reserve(rows.len() * dim);
        for row in rows {
            self.data.extend_from_slice(row);
        }
        self.dim = Some(dim);
        Ok(())
    }

    fn scores(&self, query: &[f32]) -> Result<Vec<f32>> {
        let Some(dim) = self.dim else { return Ok(Vec::new()) };
        Ok(self
            .data
            .chunks_exact(dim)
            .map(|row| row.iter().zip(query).map(|(a, b)| a * b).sum())
            .collect())
    }

    fn file_name(&self, name: &str) -> String {
        format!("{name}.dense")
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = DenseFile { dim: self.dim.unwrap_or(0), data: self.data.clone() };
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &file).map_err(|e| Error::Index(e.to_string()))
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        let file: DenseFile = bincode::deserialize_from(reader).map_err(|e| Error::Index(e.to_string()))?;
        if file.dim == 0 && !file.data.is_empty() {
            return Err(Error::Index("dense index has data but no dimension".into()));
        }
        if file.dim > 0 && file.data.len() % file.dim != 0 {
            return Err(Error::Index("dense index data is not a whole number of rows".into()));
        }
        if let Some(d) = self.dim {
            if file.dim > 0 && file.dim != d {
                return Err(Error::Index(format!("stored dimension {} does not match {d}", file.dim)));
            }
        }
        if file.dim > 0 {
            self.dim = Some(file.dim);
        }
        self.data = file.data;
        Ok(())
    }
}
