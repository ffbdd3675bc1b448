// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/frame.rs - 原始图像帧定义
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

use image::RgbImage;

pub const RGB_CHANNELS: usize = 3;

/// 借用的 RGB 像素缓冲区，行优先、通道交错
#[derive(Debug, Clone, Copy)]
pub struct RawImage<'a> {
  width: u32,
  height: u32,
  data: &'a [u8],
}

impl<'a> RawImage<'a> {
  /// 不做校验，尺寸与数据长度在预处理时检查
  pub fn new(width: u32, height: u32, data: &'a [u8]) -> Self {
    Self {
      width,
      height,
      data,
    }
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn data(&self) -> &'a [u8] {
    self.data
  }

  pub fn expected_len(&self) -> usize {
    self.width as usize * self.height as usize * RGB_CHANNELS
  }
}

impl<'a> From<&'a RgbImage> for RawImage<'a> {
  fn from(image: &'a RgbImage) -> Self {
    let (width, height) = image.dimensions();
    RawImage::new(width, height, image.as_raw())
  }
}

/// 输入源产生的一帧：解码后的图像及其拍摄方向
#[derive(Debug, Clone)]
pub struct CapturedImage {
  pub image: RgbImage,
  /// 传感器方向（角度）
  pub orientation: i32,
  /// 图像来源描述，一般为文件路径
  pub source: String,
}

impl CapturedImage {
  pub fn new(image: RgbImage, orientation: i32, source: impl Into<String>) -> Self {
    Self {
      image,
      orientation,
      source: source.into(),
    }
  }

  pub fn as_raw(&self) -> RawImage<'_> {
    RawImage::from(&self.image)
  }
}
