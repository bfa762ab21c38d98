use candle_core::{Device, Tensor};
use lexrag_core::{Error, Result};
use tokenizers::Tokenizer;

/// Token ids and attention mask for a batch, right-padded to the longest
/// sequence (capped at `max_len`). Both tensors are `u32` with shape [B,T].
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    pad_id: u32,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let mut ids_rows = Vec::with_capacity(texts.len());
    let mut mask_rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| Error::Embedding(format!("Tokenization failed: {e}")))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        ids.truncate(max_len);
        mask.truncate(max_len);
        ids_rows.push(ids);
        mask_rows.push(mask);
    }
    let width = ids_rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let mut flat_ids = Vec::with_capacity(texts.len() * width);
    let mut flat_mask = Vec::with_capacity(texts.len() * width);
    for (ids, mask) in ids_rows.iter().zip(mask_rows.iter()) {
        let pad = width - ids.len();
        flat_ids.extend(ids.iter().copied().chain(std::iter::repeat(pad_id).take(pad)));
        flat_mask.extend(mask.iter().copied().chain(std::iter::repeat(0).take(pad)));
    }
    let shape = (texts.len(), width);
    let input_ids = Tensor::from_vec(flat_ids, shape, device).map_err(to_embedding_error)?;
    let attention_mask = Tensor::from_vec(flat_mask, shape, device).map_err(to_embedding_error)?;
    Ok((input_ids, attention_mask))
}

pub(crate) fn to_embedding_error(e: candle_core::Error) -> Error {
    Error::Embedding(e.to_string())
}
