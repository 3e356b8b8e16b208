//! 链接预测损失
//!
//! 边得分是与关系无关的点积。损失为正样本 logits（目标 1）的平均
//! 二元交叉熵加上负样本 logits（目标 0）的平均二元交叉熵。

use candle_core::Tensor;

use crate::error::Result;

/// `softplus(z) = max(z, 0) + ln(1 + e^{-|z|})`
fn softplus(z: &Tensor) -> Result<Tensor> {
    let tail = z.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
    Ok(z.relu()?.add(&tail)?)
}

/// 以源、目标嵌入的点积为每个 (源, 目标) 对打分
pub fn score_pairs(embeddings: &Tensor, sources: &Tensor, targets: &Tensor) -> Result<Tensor> {
    let src = embeddings.index_select(sources, 0)?;
    let dst = embeddings.index_select(targets, 0)?;
    Ok(src.mul(&dst)?.sum(1)?)
}

/// 目标为 1 的 BCE-with-logits，按得分取平均
pub fn positive_loss(scores: &Tensor) -> Result<Tensor> {
    Ok(softplus(&scores.neg()?)?.mean_all()?)
}

/// 目标为 0 的 BCE-with-logits
pub fn negative_loss(scores: &Tensor) -> Result<Tensor> {
    Ok(softplus(scores)?.mean_all()?)
}
