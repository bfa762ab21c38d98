//! lexrag-vector
//!
//! Exact inner-product search over chunk embeddings. Positions in the index
//! are chunk ids; [`ChunkStore`] keeps the vectors and the chunk records in
//! lockstep and persists both halves together.

pub mod backend;
pub mod dense;
#[cfg(feature = "tensor-index")]
pub mod flat;
pub mod store;
pub mod topk;

pub use backend::{select_backend, VectorBackend};
pub use dense::DenseIndex;
#[cfg(feature = "tensor-index")]
pub use flat::FlatIpIndex;
pub use store::ChunkStore;
pub use topk::top_k;
