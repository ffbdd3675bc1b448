// 该文件是 Jianbie （鉴别） 项目的一部分。
// tests/support/mod.rs - 测试辅助工具
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

#![allow(dead_code)]

use std::{
  collections::VecDeque,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  thread,
  time::Duration,
};

use image::{Rgb, RgbImage};
use jianbie::{
  Model, ModelDescriptor, ModelError,
  model::{InputSpec, OutputSpec},
  tensor::{InputTensor, OutputTensor, TensorData, TensorFormat, TensorShape, TensorType},
};

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];
pub const WHITE: [u8; 3] = [255, 255, 255];

pub fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
  (a - b).abs() < tol
}

pub fn input_spec(width: usize, height: usize, tensor_type: TensorType) -> InputSpec {
  InputSpec {
    shape: TensorShape::new(1, height, width, 3),
    format: TensorFormat::Nhwc,
    tensor_type,
  }
}

pub fn descriptor(width: usize, height: usize, classes: usize, output: TensorType) -> ModelDescriptor {
  ModelDescriptor {
    input: input_spec(width, height, TensorType::UInt8),
    output: OutputSpec {
      batch: 1,
      classes,
      tensor_type: output,
    },
  }
}

/// 纯色图像
pub fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
  RgbImage::from_pixel(width, height, Rgb(color))
}

/// 四个象限颜色各不相同：左上红、右上绿、左下蓝、右下白
pub fn quadrants(side: u32) -> RgbImage {
  let half = side / 2;
  RgbImage::from_fn(side, side, |x, y| match (x < half, y < half) {
    (true, true) => Rgb(RED),
    (false, true) => Rgb(GREEN),
    (true, false) => Rgb(BLUE),
    (false, false) => Rgb(WHITE),
  })
}

/// 读取张量中 (y, x) 处的像素
pub fn pixel_at(tensor: &InputTensor, y: usize, x: usize) -> [f32; 3] {
  let channel = |c| tensor.get_f32(y, x, c).unwrap_or(f32::NAN);
  [channel(0), channel(1), channel(2)]
}

/// 记录模型被调用的次数和收到的输入
#[derive(Clone, Default)]
pub struct Probe {
  calls: Arc<AtomicUsize>,
  inputs: Arc<Mutex<Vec<InputTensor>>>,
}

impl Probe {
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn inputs(&self) -> Vec<InputTensor> {
    self.inputs.lock().map(|inputs| inputs.clone()).unwrap_or_default()
  }
}

/// 返回固定得分的模型
pub struct FakeModel {
  descriptor: ModelDescriptor,
  output: OutputTensor,
  delays: VecDeque<Duration>,
  probe: Probe,
}

impl FakeModel {
  pub fn quantized(width: usize, height: usize, scores: &[u8]) -> Self {
    let descriptor = descriptor(width, height, scores.len(), TensorType::UInt8);
    let output = OutputTensor {
      batch: 1,
      classes: scores.len(),
      data: TensorData::UInt8(scores.into()),
    };
    Self::with_output(descriptor, output)
  }

  pub fn float(width: usize, height: usize, scores: &[f32]) -> Self {
    let descriptor = descriptor(width, height, scores.len(), TensorType::Float32);
    let output = OutputTensor {
      batch: 1,
      classes: scores.len(),
      data: TensorData::Float32(scores.into()),
    };
    Self::with_output(descriptor, output)
  }

  fn with_output(descriptor: ModelDescriptor, output: OutputTensor) -> Self {
    Self {
      descriptor,
      output,
      delays: VecDeque::new(),
      probe: Probe::default(),
    }
  }

  /// 依次为前几次推理设置延迟
  pub fn with_delays(mut self, delays: impl IntoIterator<Item = Duration>) -> Self {
    self.delays = delays.into_iter().collect();
    self
  }

  pub fn probe(&self) -> Probe {
    self.probe.clone()
  }
}

impl Model for FakeModel {
  fn descriptor(&self) -> &ModelDescriptor {
    &self.descriptor
  }

  fn infer(&mut self, input: &InputTensor) -> Result<&OutputTensor, ModelError> {
    self.probe.calls.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut inputs) = self.probe.inputs.lock() {
      inputs.push(input.clone());
    }
    if let Some(delay) = self.delays.pop_front() {
      thread::sleep(delay);
    }
    Ok(&self.output)
  }
}
