// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/postprocess.rs - 输出概率后处理
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use thiserror::Error;

use crate::{
  label::LabelTable,
  rank::Recognition,
  tensor::{OutputTensor, TensorType},
};

#[derive(Error, Debug)]
pub enum PostprocessError {
  #[error("标签数量 {labels} 与模型输出类别数 {classes} 不一致")]
  LabelCountMismatchError { labels: usize, classes: usize },
}

/// 反量化参数：`probability = (raw - mean) / std`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dequantize {
  pub mean: f32,
  pub std: f32,
}

impl Dequantize {
  /// 8 位量化输出，[0, 255] 映射到 [0, 1]
  pub const QUANTIZED_U8: Dequantize = Dequantize {
    mean: 0.0,
    std: 255.0,
  };
  pub const IDENTITY: Dequantize = Dequantize {
    mean: 0.0,
    std: 1.0,
  };

  pub fn for_output(tensor_type: TensorType) -> Self {
    match tensor_type {
      TensorType::UInt8 => Self::QUANTIZED_U8,
      TensorType::Float32 => Self::IDENTITY,
    }
  }

  pub fn apply(&self, raw: f32) -> f32 {
    (raw - self.mean) / self.std
  }
}

impl Default for Dequantize {
  fn default() -> Self {
    Self::IDENTITY
  }
}

/// 把第一个样本的输出反量化并与标签逐位配对，顺序与输出槽位一致
pub fn label_probabilities(
  labels: &LabelTable,
  output: &OutputTensor,
  dequantize: Dequantize,
) -> Result<Vec<Recognition>, PostprocessError> {
  if output.classes != labels.len() {
    return Err(PostprocessError::LabelCountMismatchError {
      labels: labels.len(),
      classes: output.classes,
    });
  }

  Ok(
    labels
      .iter()
      .zip(output.scores(0))
      .map(|(label, raw)| Recognition::new(label, dequantize.apply(raw)))
      .collect(),
  )
}
