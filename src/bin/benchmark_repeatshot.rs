// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 重复分类基准测试
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

use std::path::PathBuf;

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
  task::{RepeatShotTask, Task},
};

/// Jianbie 重复分类基准测试
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// RKNN 模型路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 标签文件
  #[arg(long, value_name = "FILE")]
  pub labels: PathBuf,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT", default_value = "log:")]
  pub output: Url,
  /// 重复次数
  #[arg(long, default_value_t = 100)]
  pub repeat: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("重复次数: {}", args.repeat);

  let labels = LabelTable::from_file(&args.labels)
    .with_context(|| format!("无法加载标签文件: {}", args.labels.display()))?;
  let builder = RknnModelBuilder::from_url(&args.model)?;
  let mut classifier = Classifier::new(
    move || builder.build(),
    labels,
    ClassifierConfig::default(),
  )?;

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  RepeatShotTask::default()
    .with_repeat(args.repeat)
    .run_task(input, &mut classifier, output)?;

  Ok(())
}
