//! Local sentence embeddings via ONNX Runtime.
//!
//! Expects a sentence-transformers export (all-MiniLM-L6-v2 by default): a
//! directory holding `model.onnx` and `tokenizer.json`. Token embeddings are
//! mean-pooled over the attention mask and L2-normalised.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, anyhow, ensure};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::{Tensor, ValueType};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::embedding::{Embed, EmbedError, normalize};

const FALLBACK_DIM: usize = 384;
const MAX_TOKENS: usize = 256;

/// Sessions need `&mut` to run, so the model sits behind a mutex and the
/// embedder can be shared as `Arc<dyn Embed>`.
pub struct OnnxEmbedder {
    model: Mutex<Model>,
    dim: usize,
    model_name: String,
}

struct Model {
    session: Session,
    tokenizer: Tokenizer,
}

/// Padded `[rows, seq_len]` input tensors, flattened row-major.
struct Encoded {
    rows: usize,
    seq_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

impl OnnxEmbedder {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        ensure!(tokenizer_path.exists(), "tokenizer.json not found in {model_dir:?}");

        let session = Session::builder()?
            .commit_from_file(&model_path)
            .with_context(|| format!("loading {}", model_path.display()))?;
        let dim = output_dim(session.outputs()[0].dtype()).unwrap_or(FALLBACK_DIM);

        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        let model_name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(dim, model = %model_name, "loaded ONNX embedding model");
        Ok(Self {
            model: Mutex::new(Model { session, tokenizer }),
            dim,
            model_name,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn run(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let mut model = self.model.lock().map_err(|_| anyhow!("embedder lock poisoned"))?;
        let model = &mut *model;

        let mut encoded = encode(&model.tokenizer, texts)?;
        let shape = [encoded.rows as i64, encoded.seq_len as i64];
        let input_ids = std::mem::take(&mut encoded.input_ids).into_boxed_slice();
        let token_type_ids = std::mem::take(&mut encoded.token_type_ids).into_boxed_slice();
        // The mask is needed again for pooling.
        let attention_mask = encoded.attention_mask.clone().into_boxed_slice();
        let outputs = model.session.run(ort::inputs![
            "input_ids" => Tensor::from_array((shape, input_ids))?,
            "attention_mask" => Tensor::from_array((shape, attention_mask))?,
            "token_type_ids" => Tensor::from_array((shape, token_type_ids))?,
        ])?;

        let (out_shape, hidden) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = out_shape;
        ensure!(
            dims.len() == 3 && dims[0] as usize == encoded.rows && dims[2] as usize == self.dim,
            "unexpected output shape {dims:?}, expected [{}, _, {}]",
            encoded.rows,
            self.dim
        );
        debug!(rows = encoded.rows, seq_len = dims[1], "ran embedding batch");

        Ok(mean_pool(hidden, &encoded, dims[1] as usize, self.dim))
    }
}

#[async_trait]
impl Embed for OnnxEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.run(texts).map_err(|e| EmbedError::Backend(format!("{e:#}")))
    }
}

fn encode(tokenizer: &Tokenizer, texts: &[&str]) -> anyhow::Result<Encoded> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| anyhow!("tokenize: {e}"))?;
    let rows = encodings.len();
    let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

    let mut encoded = Encoded {
        rows,
        seq_len,
        input_ids: vec![0; rows * seq_len],
        attention_mask: vec![0; rows * seq_len],
        token_type_ids: vec![0; rows * seq_len],
    };
    for (row, enc) in encodings.iter().enumerate() {
        let base = row * seq_len;
        let columns = enc
            .get_ids()
            .iter()
            .zip(enc.get_attention_mask())
            .zip(enc.get_type_ids());
        for (col, ((&id, &mask), &type_id)) in columns.enumerate() {
            encoded.input_ids[base + col] = i64::from(id);
            encoded.attention_mask[base + col] = i64::from(mask);
            encoded.token_type_ids[base + col] = i64::from(type_id);
        }
    }
    Ok(encoded)
}

/// Average each row's hidden states over its unmasked tokens, then normalise.
///
/// `hidden` is `[rows, out_seq_len, dim]`; the model may return fewer
/// positions than were fed in.
fn mean_pool(hidden: &[f32], encoded: &Encoded, out_seq_len: usize, dim: usize) -> Vec<Vec<f32>> {
    (0..encoded.rows)
        .map(|row| {
            let mut pooled = vec![0.0f32; dim];
            let mut weight = 0.0f32;
            for pos in 0..out_seq_len.min(encoded.seq_len) {
                let mask = encoded.attention_mask[row * encoded.seq_len + pos] as f32;
                if mask == 0.0 {
                    continue;
                }
                let start = (row * out_seq_len + pos) * dim;
                for (p, h) in pooled.iter_mut().zip(&hidden[start..start + dim]) {
                    *p += h * mask;
                }
                weight += mask;
            }
            if weight > 0.0 {
                pooled.iter_mut().for_each(|p| *p /= weight);
            }
            normalize(&mut pooled);
            pooled
        })
        .collect()
}

fn output_dim(output: &ValueType) -> Option<usize> {
    match output {
        ValueType::Tensor { shape, .. } => {
            shape.last().copied().filter(|&d| d > 0).map(|d| d as usize)
        }
        _ => None,
    }
}
