// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/model.rs - 模型
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

use crate::tensor::{InputTensor, OutputTensor, TensorFormat, TensorShape, TensorType};

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(String),
  #[error("模型文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("输入张量不匹配: 期望 {expected}, 实际 {actual}")]
  ShapeMismatch { expected: String, actual: String },
  #[error("推理错误: {0}")]
  InferenceError(String),
}

impl ModelError {
  pub fn load(msg: impl Into<String>) -> Self {
    ModelError::ModelLoadError(msg.into())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
  pub shape: TensorShape,
  pub format: TensorFormat,
  pub tensor_type: TensorType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
  pub batch: usize,
  pub classes: usize,
  pub tensor_type: TensorType,
}

/// 模型描述：加载后不再变化的输入/输出约定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDescriptor {
  pub input: InputSpec,
  pub output: OutputSpec,
}

impl ModelDescriptor {
  /// 检查输入张量是否与模型约定完全一致
  pub fn check_input(&self, input: &InputTensor) -> Result<(), ModelError> {
    let spec = &self.input;
    if input.shape != spec.shape
      || input.format != spec.format
      || input.tensor_type() != spec.tensor_type
      || input.data.len() != spec.shape.len()
    {
      return Err(ModelError::ShapeMismatch {
        expected: format!("{} {:?} {:?}", spec.shape, spec.format, spec.tensor_type),
        actual: format!(
          "{} {:?} {:?} (len {})",
          input.shape,
          input.format,
          input.tensor_type(),
          input.data.len()
        ),
      });
    }
    Ok(())
  }

  pub fn num_classes(&self) -> usize {
    self.output.classes
  }

  pub fn new_input(&self) -> InputTensor {
    InputTensor::zeros(self.input.shape, self.input.format, self.input.tensor_type)
  }

  pub fn new_output(&self) -> OutputTensor {
    OutputTensor::zeros(self.output.batch, self.output.classes, self.output.tensor_type)
  }
}

/// 已加载的分类模型
///
/// `infer` 覆盖模型内部的输出缓冲区，返回的引用在下一次调用前有效；
/// 同一实例同时只允许一个推理。
pub trait Model {
  fn descriptor(&self) -> &ModelDescriptor;

  fn infer(&mut self, input: &InputTensor) -> Result<&OutputTensor, ModelError>;
}

#[cfg(feature = "model_rknn")]
mod rknn;
#[cfg(feature = "model_rknn")]
pub use self::rknn::{RknnModel, RknnModelBuilder};
