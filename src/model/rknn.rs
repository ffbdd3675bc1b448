// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/model/rknn.rs - RKNN 分类模型
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

use rknpu::{Context, InitFlags};
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{InputSpec, Model, ModelDescriptor, ModelError, OutputSpec},
  tensor::{InputTensor, OutputTensor, TensorData, TensorFormat, TensorShape, TensorType},
  utils::{decode_path, query_value},
};

const RKNN_NUM_INPUTS: u32 = 1;
const RKNN_DEFAULT_INPUT_W: usize = 224;
const RKNN_DEFAULT_INPUT_H: usize = 224;
const RKNN_INPUT_CHANNELS: usize = 3;

impl From<rknpu::Error> for ModelError {
  fn from(err: rknpu::Error) -> Self {
    ModelError::InferenceError(format!("RKNN 错误: {}", err))
  }
}

fn invalid(msg: &str, e: rknpu::Error) -> ModelError {
  ModelError::ModelLoadError(format!("{}: {}", msg, e))
}

/// 预热发生在加载阶段，任何错误都算加载失败
fn warmup_failed(e: ModelError) -> ModelError {
  match e {
    e @ ModelError::ModelLoadError(_) => e,
    e => ModelError::load(format!("预热推理失败: {}", e)),
  }
}

pub struct RknnModel {
  context: Context,
  descriptor: ModelDescriptor,
  output: OutputTensor,
}

pub struct RknnModelBuilder {
  model_path: String,
  flags: InitFlags,
  width: usize,
  height: usize,
  format: TensorFormat,
  classes: Option<usize>,
}

impl FromUrlWithScheme for RknnModelBuilder {
  const SCHEME: &'static str = "rknn";
}

impl FromUrl for RknnModelBuilder {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ModelError::load(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let param = |e: crate::utils::UrlParamError| ModelError::load(e.to_string());

    Ok(RknnModelBuilder {
      model_path: decode_path(url).map_err(param)?,
      flags: InitFlags::default(),
      width: query_value(url, "width")
        .map_err(param)?
        .unwrap_or(RKNN_DEFAULT_INPUT_W),
      height: query_value(url, "height")
        .map_err(param)?
        .unwrap_or(RKNN_DEFAULT_INPUT_H),
      format: query_value(url, "format").map_err(param)?.unwrap_or_default(),
      classes: query_value(url, "classes").map_err(param)?,
    })
  }
}

impl RknnModelBuilder {
  pub fn flags(mut self, flags: InitFlags) -> Self {
    self.flags = flags;
    self
  }

  pub fn build(self) -> Result<RknnModel, ModelError> {
    info!("加载模型文件: {}", self.model_path);
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    info!("创建 RKNN 推理上下文");
    let context = Context::new(&model_data, self.flags).map_err(|e| invalid("无法解析模型", e))?;

    match context.sdk_version() {
      Ok(version) => {
        if let Ok(api_ver) = version.api_version() {
          debug!("模型 API 版本: {}", api_ver);
        }
        if let Ok(drv_ver) = version.driver_version() {
          debug!("模型驱动版本: {}", drv_ver);
        }
      }
      Err(e) => {
        error!("查询 SDK 版本失败: {}", e);
        return Err(invalid("无法查询 SDK 版本", e));
      }
    }

    let num_inputs = context
      .num_inputs()
      .map_err(|e| invalid("无法获取输入数量", e))?;
    let num_outputs = context
      .num_outputs()
      .map_err(|e| invalid("无法获取输出数量", e))?;
    debug!("模型输入数量: {}", num_inputs);
    debug!("模型输出数量: {}", num_outputs);

    if num_inputs != RKNN_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        RKNN_NUM_INPUTS, num_inputs
      );
      return Err(ModelError::load(format!(
        "预期模型输入数量为 {}, 实际为 {}",
        RKNN_NUM_INPUTS, num_inputs
      )));
    }
    if num_outputs == 0 {
      return Err(ModelError::load("模型没有输出"));
    }

    let input = InputSpec {
      shape: TensorShape::new(1, self.height, self.width, RKNN_INPUT_CHANNELS),
      format: self.format,
      tensor_type: TensorType::UInt8,
    };

    // 用全零输入预热一次，由第一个输出的长度得到类别数
    let warmup = InputTensor::zeros(input.shape, input.format, input.tensor_type);
    let classes = {
      set_input(&context, &warmup).map_err(warmup_failed)?;
      context.run().map_err(|e| invalid("预热推理失败", e))?;
      let outputs = context
        .get_outputs()
        .map_err(|e| invalid("无法获取预热输出", e))?;
      let scores = outputs
        .get_f32(0)
        .map_err(|e| invalid("无法读取预热输出", e))?;
      scores.len()
    };

    if classes == 0 {
      return Err(ModelError::load("模型输出为空"));
    }
    if let Some(expected) = self.classes
      && expected != classes
    {
      error!("预期类别数量为 {}, 实际为 {}", expected, classes);
      return Err(ModelError::load(format!(
        "预期类别数量为 {}, 实际为 {}",
        expected, classes
      )));
    }

    let descriptor = ModelDescriptor {
      input,
      output: OutputSpec {
        batch: 1,
        classes,
        tensor_type: TensorType::Float32,
      },
    };
    info!("模型加载完成: {:?}", descriptor);

    Ok(RknnModel {
      context,
      output: descriptor.new_output(),
      descriptor,
    })
  }
}

fn set_input(context: &Context, input: &InputTensor) -> Result<(), ModelError> {
  let data = match &input.data {
    TensorData::UInt8(data) => data,
    TensorData::Float32(_) => {
      return Err(ModelError::ShapeMismatch {
        expected: "UInt8".to_string(),
        actual: "Float32".to_string(),
      });
    }
  };
  let format = match input.format {
    TensorFormat::Nhwc => rknpu::TensorFormat::NHWC,
    TensorFormat::Nchw => rknpu::TensorFormat::NCHW,
  };
  context.set_input(0, data, format, rknpu::TensorType::UInt8)?;
  Ok(())
}

impl Model for RknnModel {
  fn descriptor(&self) -> &ModelDescriptor {
    &self.descriptor
  }

  fn infer(&mut self, input: &InputTensor) -> Result<&OutputTensor, ModelError> {
    self.descriptor.check_input(input)?;

    debug!("设置模型输入");
    set_input(&self.context, input)?;

    debug!("执行模型推理");
    self.context.run()?;

    debug!("获取模型输出");
    let outputs = self.context.get_outputs()?;
    let scores = outputs.get_f32(0)?;
    if scores.len() != self.output.classes {
      return Err(ModelError::InferenceError(format!(
        "输出长度 {} 与类别数 {} 不一致",
        scores.len(),
        self.output.classes
      )));
    }

    let TensorData::Float32(buffer) = &mut self.output.data else {
      return Err(ModelError::InferenceError("输出缓冲区类型错误".to_string()));
    };
    for (dst, &src) in buffer.iter_mut().zip(scores.iter()) {
      *dst = src;
    }

    Ok(&self.output)
  }
}
