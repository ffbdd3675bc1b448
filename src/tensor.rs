// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/tensor.rs - 输入/输出张量定义
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

use std::fmt;

/// 张量元素类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorType {
  UInt8,
  Float32,
}

/// 张量内存布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorFormat {
  #[default]
  Nhwc,
  Nchw,
}

impl std::str::FromStr for TensorFormat {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "nhwc" => Ok(TensorFormat::Nhwc),
      "nchw" => Ok(TensorFormat::Nchw),
      other => Err(format!("未知的张量布局: {}", other)),
    }
  }
}

/// 图像张量形状 (batch, height, width, channels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorShape {
  pub batch: usize,
  pub height: usize,
  pub width: usize,
  pub channels: usize,
}

impl TensorShape {
  pub fn new(batch: usize, height: usize, width: usize, channels: usize) -> Self {
    Self {
      batch,
      height,
      width,
      channels,
    }
  }

  pub fn len(&self) -> usize {
    self.batch * self.height * self.width * self.channels
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl fmt::Display for TensorShape {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[{}, {}, {}, {}]",
      self.batch, self.height, self.width, self.channels
    )
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
  UInt8(Box<[u8]>),
  Float32(Box<[f32]>),
}

impl TensorData {
  pub fn zeros(tensor_type: TensorType, len: usize) -> Self {
    match tensor_type {
      TensorType::UInt8 => TensorData::UInt8(vec![0u8; len].into_boxed_slice()),
      TensorType::Float32 => TensorData::Float32(vec![0f32; len].into_boxed_slice()),
    }
  }

  pub fn tensor_type(&self) -> TensorType {
    match self {
      TensorData::UInt8(_) => TensorType::UInt8,
      TensorData::Float32(_) => TensorType::Float32,
    }
  }

  pub fn len(&self) -> usize {
    match self {
      TensorData::UInt8(data) => data.len(),
      TensorData::Float32(data) => data.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// 按 f32 读取第 `index` 个元素
  pub fn get_f32(&self, index: usize) -> Option<f32> {
    match self {
      TensorData::UInt8(data) => data.get(index).map(|&v| v as f32),
      TensorData::Float32(data) => data.get(index).copied(),
    }
  }

  /// 写入第 `index` 个元素；整型张量四舍五入并截断到 [0, 255]
  pub fn set_f32(&mut self, index: usize, value: f32) {
    match self {
      TensorData::UInt8(data) => data[index] = value.round().clamp(0.0, 255.0) as u8,
      TensorData::Float32(data) => data[index] = value,
    }
  }
}

/// 模型输入张量，分类请求之间复用
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
  pub shape: TensorShape,
  pub format: TensorFormat,
  pub data: TensorData,
}

impl InputTensor {
  pub fn zeros(shape: TensorShape, format: TensorFormat, tensor_type: TensorType) -> Self {
    Self {
      shape,
      format,
      data: TensorData::zeros(tensor_type, shape.len()),
    }
  }

  pub fn tensor_type(&self) -> TensorType {
    self.data.tensor_type()
  }

  /// 像素 (y, x) 第 `c` 个通道在数据中的偏移
  pub fn offset(&self, y: usize, x: usize, c: usize) -> usize {
    let TensorShape {
      height,
      width,
      channels,
      ..
    } = self.shape;
    match self.format {
      TensorFormat::Nhwc => (y * width + x) * channels + c,
      TensorFormat::Nchw => c * height * width + y * width + x,
    }
  }

  pub fn get_f32(&self, y: usize, x: usize, c: usize) -> Option<f32> {
    self.data.get_f32(self.offset(y, x, c))
  }
}

/// 模型输出张量 (batch, classes)
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
  pub batch: usize,
  pub classes: usize,
  pub data: TensorData,
}

impl OutputTensor {
  pub fn zeros(batch: usize, classes: usize, tensor_type: TensorType) -> Self {
    Self {
      batch,
      classes,
      data: TensorData::zeros(tensor_type, batch * classes),
    }
  }

  pub fn tensor_type(&self) -> TensorType {
    self.data.tensor_type()
  }

  /// 第 `batch` 个样本的全部类别得分
  pub fn scores(&self, batch: usize) -> impl Iterator<Item = f32> + '_ {
    let start = batch * self.classes;
    (start..start + self.classes).filter_map(move |i| self.data.get_f32(i))
  }
}
