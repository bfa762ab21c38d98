use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use lexrag_core::{Error, Result};
use tracing::debug;

use crate::backend::{check_rows, VectorBackend};

const VECTORS: &str = "vectors";

fn index_error(e: candle_core::Error) -> Error {
    Error::Index(e.to_string())
}

/// Exact inner-product index holding all vectors in one `[N, D]` tensor.
/// Search is a single matrix-vector product on the tensor's device.
pub struct FlatIpIndex {
    device: Device,
    dim: Option<usize>,
    matrix: Option<Tensor>,
}

impl FlatIpIndex {
    pub fn new(dim: Option<usize>) -> Self {
        let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);
        debug!(?device, "flat index device");
        Self { device, dim, matrix: None }
    }
}

impl VectorBackend for FlatIpIndex {
    fn name(&self) -> &'static str { "flat" }

    fn dim(&self) -> Option<usize> { self.dim }

    fn len(&self) -> usize {
        self.matrix.as_ref().map(|m| m.dims()[0]).unwrap_or(0)
    }

    fn add(&mut self, rows: &[Vec<f32>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let dim = check_rows(self.dim, rows)?;
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let block = Tensor::from_vec(flat, (rows.len(), dim), &self.device).map_err(index_error)?;
        let matrix = match &self.matrix {
            Some(m) => Tensor::cat(&[m, &block], 0).map_err(index_error)?,
            None => block,
        };
        self.matrix = Some(matrix);
        self.dim = Some(dim);
        Ok(())
    }

    fn scores(&self, query: &[f32]) -> Result<Vec<f32>> {
        let Some(matrix) = &self.matrix else { return Ok(Vec::new()) };
        let q = Tensor::from_slice(query, (query.len(), 1), &self.device).map_err(index_error)?;
        matrix
            .matmul(&q)
            .and_then(|s| s.squeeze(1))
            .and_then(|s| s.to_vec1::<f32>())
            .map_err(index_error)
    }

    fn file_name(&self, name: &str) -> String {
        format!("{name}.safetensors")
    }

    fn save(&self, path: &Path) -> Result<()> {
        let mut tensors = HashMap::new();
        if let Some(m) = &self.matrix {
            tensors.insert(VECTORS.to_string(), m.to_device(&Device::Cpu).map_err(index_error)?);
        }
        let dim = self.dim.unwrap_or(0) as u32;
        tensors.insert("dim".to_string(), Tensor::new(&[dim], &Device::Cpu).map_err(index_error)?);
        candle_core::safetensors::save(&tensors, path).map_err(index_error)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let mut tensors = candle_core::safetensors::load(path, &self.device).map_err(index_error)?;
        let stored_dim = match tensors.get("dim") {
            Some(t) => t.to_vec1::<u32>().map_err(index_error)?.first().copied().unwrap_or(0) as usize,
            None => 0,
        };
        let matrix = match tensors.remove(VECTORS) {
            Some(m) => {
                let (_, d) = m.dims2().map_err(index_error)?;
                if stored_dim != 0 && d != stored_dim {
                    return Err(Error::Index("stored vectors disagree with stored dimension".into()));
                }
                Some(m.to_dtype(DType::F32).map_err(index_error)?)
            }
            None => None,
        };
        if let (Some(expected), true) = (self.dim, stored_dim != 0) {
            if expected != stored_dim {
                return Err(Error::Index(format!("stored dimension {stored_dim} does not match {expected}")));
            }
        }
        if stored_dim != 0 {
            self.dim = Some(stored_dim);
        }
        self.matrix = matrix;
        Ok(())
    }
}
