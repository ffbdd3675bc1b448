// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/task.rs - 分类任务
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

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{classifier::Classifier, frame::CapturedImage, output::Render, rank::Ranking};

pub trait Task<I, O>: Sized {
  type Error;
  fn run_task(self, input: I, classifier: &mut Classifier, output: O) -> Result<(), Self::Error>;
}

pub struct OneShotTask;

impl<RE, I, O> Task<I, O> for OneShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = CapturedImage>,
  O: Render<CapturedImage, Ranking, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, classifier: &mut Classifier, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始分类...");
    let now = Instant::now();
    let result = classifier.classify(&frame.as_raw(), frame.orientation)?;
    info!("分类完成，耗时: {:.2?}", now.elapsed());
    output.render_result(&frame, &result)?;

    Ok(())
  }
}

/// 同一张图像重复分类，统计平均耗时
pub struct RepeatShotTask {
  repeat: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self { repeat: 100 }
  }
}

impl RepeatShotTask {
  pub fn with_repeat(mut self, repeat: usize) -> Self {
    self.repeat = repeat.max(1);
    self
  }
}

impl<RE, I, O> Task<I, O> for RepeatShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = CapturedImage>,
  O: Render<CapturedImage, Ranking, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, classifier: &mut Classifier, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始分类...");

    let mut times = Vec::with_capacity(self.repeat);
    let mut last = None;
    for i in 0..self.repeat {
      let now = Instant::now();
      let result = classifier.classify(&frame.as_raw(), frame.orientation)?;
      let elapsed = now.elapsed();
      info!("({})分类完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      if let Some(previous) = &last
        && previous != &result
      {
        warn!("({})分类结果与上一次不一致", i);
      }
      last = Some(result);
    }

    if let Some(result) = &last {
      output.render_result(&frame, result)?;
    }

    // 前两次包含预热开销，次数足够时不计入
    let measured = if times.len() > 2 { &times[2..] } else { &times[..] };
    warn!(
      "平均分类时间: {:.2?}",
      measured.iter().sum::<Duration>() / measured.len() as u32
    );

    Ok(())
  }
}

/// 逐张处理输入中的所有图像；单张图像的可恢复错误只记录并跳过
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }
}

impl<RE, I, O> Task<I, O> for ContinuousTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = CapturedImage>,
  O: Render<CapturedImage, Ranking, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, classifier: &mut Classifier, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let limit = self.frame_number.unwrap_or(usize::MAX);
    let mut frame_index = 0usize;
    let mut skipped = 0usize;
    for frame in input.take(limit) {
      frame_index += 1;
      info!("处理第 {} 张图像: {}", frame_index, frame.source);
      let now = Instant::now();
      match classifier.classify(&frame.as_raw(), frame.orientation) {
        Ok(result) => {
          info!("分类完成，耗时: {:.2?}", now.elapsed());
          output.render_result(&frame, &result)?;
        }
        Err(e) if e.is_recoverable() => {
          warn!("跳过第 {} 张图像: {}", frame_index, e);
          skipped += 1;
        }
        Err(e) => return Err(e.into()),
      }
    }
    if self.frame_number.is_some() && frame_index == limit {
      info!("达到指定图像数 {}, 退出任务循环", limit);
    }

    info!("任务完成: 共 {} 张, 跳过 {} 张", frame_index, skipped);
    Ok(())
  }
}
