// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/preprocess.rs - 图像预处理
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

//! 把任意尺寸的 RGB 图像转换为模型输入张量。
//!
//! 步骤顺序固定：居中裁剪为正方形 → 最近邻缩放 → 按方向逆时针旋转 → 逐通道归一化。

use image::{GenericImageView, ImageBuffer, Rgb, RgbImage, imageops};
use thiserror::Error;
use tracing::debug;

use crate::{
  frame::{RGB_CHANNELS, RawImage},
  model::InputSpec,
  tensor::InputTensor,
};

#[derive(Error, Debug)]
pub enum PreprocessError {
  #[error("无效图像: {0}")]
  InvalidImageError(String),
  #[error("不支持的模型输入: {0}")]
  UnsupportedInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessConfig {
  pub mean: [f32; 3],
  pub std: [f32; 3],
  /// 补边像素值
  pub fill: u8,
}

impl Default for PreprocessConfig {
  /// 量化模型不需要归一化：mean 为 0，std 为 1
  fn default() -> Self {
    Self {
      mean: [0.0; 3],
      std: [1.0; 3],
      fill: 0,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
  config: PreprocessConfig,
  input: InputSpec,
}

impl Preprocessor {
  pub fn new(config: PreprocessConfig, input: InputSpec) -> Result<Self, PreprocessError> {
    let shape = input.shape;
    if shape.channels != RGB_CHANNELS {
      return Err(PreprocessError::UnsupportedInput(format!(
        "需要 {} 通道输入, 模型为 {} 通道",
        RGB_CHANNELS, shape.channels
      )));
    }
    if shape.batch != 1 || shape.width == 0 || shape.height == 0 {
      return Err(PreprocessError::UnsupportedInput(format!(
        "输入形状 {} 无效",
        shape
      )));
    }
    if u32::try_from(shape.width).is_err() || u32::try_from(shape.height).is_err() {
      return Err(PreprocessError::UnsupportedInput(format!(
        "输入尺寸 {} 过大",
        shape
      )));
    }
    if config.std.iter().any(|&s| s == 0.0 || !s.is_finite()) {
      return Err(PreprocessError::UnsupportedInput(format!(
        "归一化 std 无效: {:?}",
        config.std
      )));
    }
    Ok(Self { config, input })
  }

  pub fn input_spec(&self) -> &InputSpec {
    &self.input
  }

  /// 处理一张图像并返回新分配的张量
  pub fn preprocess(
    &self,
    image: &RawImage<'_>,
    orientation: i32,
  ) -> Result<InputTensor, PreprocessError> {
    let mut tensor = self.new_tensor();
    self.process_into(image, orientation, &mut tensor)?;
    Ok(tensor)
  }

  /// 处理一张图像，结果写入 `tensor`（形状不符时重新分配）
  pub fn process_into(
    &self,
    image: &RawImage<'_>,
    orientation: i32,
    tensor: &mut InputTensor,
  ) -> Result<(), PreprocessError> {
    let view = as_image_view(image)?;

    let side = image.width().min(image.height());
    let square = crop_or_pad(&view, side, side, self.config.fill);

    // 奇数次旋转会交换宽高，因此先按转置后的尺寸缩放
    let turns = quarter_turns(orientation);
    let (target_w, target_h) = (self.input.shape.width as u32, self.input.shape.height as u32);
    let (resize_w, resize_h) = if turns % 2 == 1 {
      (target_h, target_w)
    } else {
      (target_w, target_h)
    };
    let resized = imageops::resize(&square, resize_w, resize_h, imageops::FilterType::Nearest);
    let rotated = rotate_ccw(&resized, turns);

    debug!(
      "预处理: {}x{} -> 裁剪 {} -> 缩放 {}x{} -> 旋转 {} 次",
      image.width(),
      image.height(),
      side,
      resize_w,
      resize_h,
      turns
    );

    if !self.matches(tensor) {
      *tensor = self.new_tensor();
    }
    self.normalize_into(&rotated, tensor);
    Ok(())
  }

  fn new_tensor(&self) -> InputTensor {
    InputTensor::zeros(self.input.shape, self.input.format, self.input.tensor_type)
  }

  fn matches(&self, tensor: &InputTensor) -> bool {
    tensor.shape == self.input.shape
      && tensor.format == self.input.format
      && tensor.tensor_type() == self.input.tensor_type
  }

  fn normalize_into(&self, image: &RgbImage, tensor: &mut InputTensor) {
    let PreprocessConfig { mean, std, .. } = self.config;
    for (x, y, pixel) in image.enumerate_pixels() {
      for c in 0..RGB_CHANNELS {
        let value = (pixel[c] as f32 - mean[c]) / std[c];
        let offset = tensor.offset(y as usize, x as usize, c);
        tensor.data.set_f32(offset, value);
      }
    }
  }
}

fn as_image_view<'a>(
  image: &RawImage<'a>,
) -> Result<ImageBuffer<Rgb<u8>, &'a [u8]>, PreprocessError> {
  if image.width() == 0 || image.height() == 0 {
    return Err(PreprocessError::InvalidImageError(format!(
      "图像尺寸为 {}x{}",
      image.width(),
      image.height()
    )));
  }
  if image.data().len() != image.expected_len() {
    return Err(PreprocessError::InvalidImageError(format!(
      "数据长度不匹配: 期望长度 {}, 实际长度 {}",
      image.expected_len(),
      image.data().len()
    )));
  }
  ImageBuffer::from_raw(image.width(), image.height(), image.data()).ok_or_else(|| {
    PreprocessError::InvalidImageError("无法构造图像缓冲区".to_string())
  })
}

/// 方向角度向下取整到 90 的倍数后得到的逆时针旋转次数（0..4）
pub fn quarter_turns(orientation: i32) -> u32 {
  orientation.div_euclid(90).rem_euclid(4) as u32
}

/// 居中裁剪或补边到 `width`x`height`
pub fn crop_or_pad<I>(image: &I, width: u32, height: u32, fill: u8) -> RgbImage
where
  I: GenericImageView<Pixel = Rgb<u8>>,
{
  let (src_w, src_h) = image.dimensions();
  let (src_x, dst_x, copy_w) = center_window(src_w, width);
  let (src_y, dst_y, copy_h) = center_window(src_h, height);

  let mut out = RgbImage::from_pixel(width, height, Rgb([fill; 3]));
  let window = imageops::crop_imm(image, src_x, src_y, copy_w, copy_h);
  imageops::overlay(&mut out, &*window, dst_x as i64, dst_y as i64);
  out
}

/// 返回 (源偏移, 目标偏移, 复制长度)
fn center_window(src: u32, dst: u32) -> (u32, u32, u32) {
  if src >= dst {
    ((src - dst) / 2, 0, dst)
  } else {
    (0, (dst - src) / 2, src)
  }
}

fn rotate_ccw(image: &RgbImage, turns: u32) -> RgbImage {
  match turns % 4 {
    1 => imageops::rotate270(image),
    2 => imageops::rotate180(image),
    3 => imageops::rotate90(image),
    _ => image.clone(),
  }
}
