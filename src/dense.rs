//! Dense (neural) vectorizer: a local ONNX sentence-embedding model run
//! with tract, tokenized with the `tokenizers` crate. Pure-Rust path, no
//! system deps.
//!
//! Unlike TF-IDF this strategy carries no corpus statistics, so indexing
//! with it is single-pass. Token sequences are truncated to `max_length`;
//! token-level model output is pooled into one vector by masked mean
//! pooling over real (non-padding) positions, then L2-normalized.

use anyhow::{bail, Context, Result};
use tract_onnx::prelude::*;

use crate::config::DenseConfig;
use crate::vectorizer::{Vector, Vectorizer};

type OnnxModel = TypedRunnableModel<TypedModel>;

pub struct DenseVectorizer {
    model: OnnxModel,
    tokenizer: tokenizers::Tokenizer,
    max_length: usize,
    dimension: usize,
}

impl DenseVectorizer {
    /// Load the model and tokenizer from the configured paths. The output
    /// dimension is discovered with a probe inference.
    pub fn load(config: &DenseConfig) -> Result<Self> {
        let model_path = config
            .model_path
            .as_ref()
            .context("indexing.dense.model_path required")?;
        let tokenizer_path = config
            .tokenizer_path
            .as_ref()
            .context("indexing.dense.tokenizer_path required")?;

        let tokenizer = tokenizers::Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer {}: {}", tokenizer_path.display(), e))?;

        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("load ONNX model {}", model_path.display()))?
            .into_optimized()
            .context("optimize ONNX model")?
            .into_runnable()
            .context("build runnable ONNX model")?;

        let mut vectorizer = Self {
            model,
            tokenizer,
            max_length: config.max_length,
            dimension: 0,
        };
        vectorizer.dimension = vectorizer.embed("dimension probe")?.len();
        Ok(vectorizer)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {}", e))?;

        let ids = encoding.get_ids();
        let len = ids.len().min(self.max_length).max(1);

        let mut input_ids = vec![0i64; len];
        let mut attention_mask = vec![0i64; len];
        for (j, &id) in ids.iter().take(len).enumerate() {
            input_ids[j] = id as i64;
            attention_mask[j] = 1;
        }

        let input_ids_tensor = ndarray::Array2::from_shape_vec((1, len), input_ids)
            .context("input ids shape")?;
        let attention_mask_tensor = ndarray::Array2::from_shape_vec((1, len), attention_mask)
            .context("attention mask shape")?;

        let input_ids_t: Tensor = input_ids_tensor.into();
        let attention_mask_t: Tensor = attention_mask_tensor.into();
        let result = self
            .model
            .run(tvec!(input_ids_t.into(), attention_mask_t.into()))?;

        let output = result
            .into_iter()
            .next()
            .context("no output tensor")?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| anyhow::anyhow!("output to array: {}", e))?;

        // [1, dim] is already document-level; [1, seq_len, dim] is
        // token-level and needs pooling over the real positions.
        let shape = view.shape();
        let pooled = if shape.len() == 2 {
            view.slice(ndarray::s![0, ..]).iter().copied().collect()
        } else if shape.len() == 3 {
            let valid_len = len.min(shape[1]);
            let rows: Vec<Vec<f32>> = (0..valid_len)
                .map(|j| view.slice(ndarray::s![0, j, ..]).iter().copied().collect())
                .collect();
            masked_mean(&rows)
        } else {
            bail!("unexpected output shape: {:?}", shape);
        };

        Ok(normalize_l2(pooled))
    }
}

impl Vectorizer for DenseVectorizer {
    fn vectorize(&self, text: &str) -> Result<Vector> {
        Ok(Vector::Dense(self.embed(text)?))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &'static str {
        "dense"
    }
}

/// Average the given token vectors. Callers pass only the real
/// (attention-masked) positions.
fn masked_mean(rows: &[Vec<f32>]) -> Vec<f32> {
    let dim = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut pooled = vec![0f32; dim];
    for row in rows {
        for (k, &value) in row.iter().enumerate() {
            pooled[k] += value;
        }
    }
    if !rows.is_empty() {
        let scale = 1.0 / rows.len() as f32;
        for value in &mut pooled {
            *value *= scale;
        }
    }
    pooled
}

fn normalize_l2(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-9 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_mean_averages_rows() {
        let rows = vec![vec![1.0, 0.0], vec![3.0, 2.0]];
        assert_eq!(masked_mean(&rows), vec![2.0, 1.0]);
    }

    #[test]
    fn masked_mean_of_nothing_is_empty() {
        assert!(masked_mean(&[]).is_empty());
    }

    #[test]
    fn normalize_l2_yields_unit_norm() {
        let v = normalize_l2(vec![3.0, 4.0]);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_l2_leaves_zero_vector_alone() {
        assert_eq!(normalize_l2(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }
}
