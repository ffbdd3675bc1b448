// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/main.rs - 项目主程序
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

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use url::Url;

use jianbie::{
  FromUrl,
  classifier::{Classifier, ClassifierConfig},
  input::InputWrapper,
  label::LabelTable,
  model::RknnModelBuilder,
  output::OutputWrapper,
  postprocess::Dequantize,
  rank::DEFAULT_TOP_K,
  task::{ContinuousTask, OneShotTask, Task},
};

/// Jianbie 图像分类
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// RKNN 模型路径，例如 rknn:///models/mobilenet_v1.rknn?width=224&height=224
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 标签文件，每行一个标签
  #[arg(long, value_name = "FILE")]
  pub labels: PathBuf,
  /// 输入来源：image:///photo.jpg?orientation=90 或 folder:///photos
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出：log: 或 json:///result.json
  #[arg(long, value_name = "OUTPUT", default_value = "log:")]
  pub output: Url,
  /// 返回的结果数量
  #[arg(long, default_value_t = DEFAULT_TOP_K)]
  pub top_k: usize,
  /// 推理超时（毫秒），0 表示不限制
  #[arg(long, default_value_t = 10_000)]
  pub timeout_ms: u64,
  /// 输出反量化均值（默认按输出类型选择）
  #[arg(long)]
  pub probability_mean: Option<f32>,
  /// 输出反量化标准差（默认按输出类型选择）
  #[arg(long)]
  pub probability_std: Option<f32>,
  /// 最大处理图像数（仅对目录输入有效，0 表示无限制）
  #[arg(long, default_value_t = 0)]
  pub max_frames: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型路径: {}", args.model);
  info!("标签文件: {}", args.labels.display());
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let labels = LabelTable::from_file(&args.labels)
    .with_context(|| format!("无法加载标签文件: {}", args.labels.display()))?;
  let builder = RknnModelBuilder::from_url(&args.model)?;

  let dequantize = match (args.probability_mean, args.probability_std) {
    (None, None) => None,
    (mean, std) => Some(Dequantize {
      mean: mean.unwrap_or(0.0),
      std: std.unwrap_or(1.0),
    }),
  };
  let config = ClassifierConfig {
    top_k: args.top_k,
    timeout: (args.timeout_ms > 0).then(|| Duration::from_millis(args.timeout_ms)),
    dequantize,
    ..ClassifierConfig::default()
  };

  let mut classifier = Classifier::new(move || builder.build(), labels, config)?;

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  match input {
    InputWrapper::ReadFolder(_) => {
      let max_frames = (args.max_frames > 0).then_some(args.max_frames);
      ContinuousTask::default()
        .with_frame_number(max_frames)
        .run_task(input, &mut classifier, output)?;
    }
    InputWrapper::ReadImageFile(_) => {
      OneShotTask.run_task(input, &mut classifier, output)?;
    }
  }

  Ok(())
}
