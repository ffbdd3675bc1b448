// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/classifier.rs - 图像分类流水线
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

//! 分类器：预处理 → 推理 → 反量化与标签配对 → 排序。
//!
//! 模型在专用的推理线程中创建并一直留在该线程，请求通过通道逐个送入，
//! 调用方按配置的超时时间等待结果。

use std::{
  sync::mpsc::{self, RecvTimeoutError},
  thread,
  time::{Duration, Instant},
};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  frame::RawImage,
  label::LabelTable,
  model::{Model, ModelDescriptor, ModelError},
  postprocess::{Dequantize, PostprocessError, label_probabilities},
  preprocess::{PreprocessConfig, PreprocessError, Preprocessor},
  rank::{DEFAULT_TOP_K, Ranking, rank},
  tensor::{InputTensor, OutputTensor},
};

pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ClassifyError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(String),
  #[error("标签数量 {labels} 与模型输出类别数 {classes} 不一致")]
  LabelCountMismatchError { labels: usize, classes: usize },
  #[error("无效图像: {0}")]
  InvalidImageError(String),
  #[error("张量形状不匹配: {0}")]
  ShapeMismatchError(String),
  #[error("推理错误: {0}")]
  InferenceError(String),
  #[error("推理超时: 超过 {0:.2?}")]
  InferenceTimeoutError(Duration),
}

impl ClassifyError {
  /// 只影响当前请求的错误，调用方可以换一张图像继续
  pub fn is_recoverable(&self) -> bool {
    matches!(
      self,
      ClassifyError::InvalidImageError(_)
        | ClassifyError::InferenceError(_)
        | ClassifyError::InferenceTimeoutError(_)
    )
  }
}

impl From<ModelError> for ClassifyError {
  fn from(err: ModelError) -> Self {
    match err {
      ModelError::ModelLoadError(msg) => ClassifyError::ModelLoadError(msg),
      ModelError::IoError(e) => ClassifyError::ModelLoadError(e.to_string()),
      e @ ModelError::ShapeMismatch { .. } => ClassifyError::ShapeMismatchError(e.to_string()),
      ModelError::InferenceError(msg) => ClassifyError::InferenceError(msg),
    }
  }
}

impl From<PreprocessError> for ClassifyError {
  fn from(err: PreprocessError) -> Self {
    match err {
      PreprocessError::InvalidImageError(msg) => ClassifyError::InvalidImageError(msg),
      PreprocessError::UnsupportedInput(msg) => ClassifyError::ShapeMismatchError(msg),
    }
  }
}

impl From<PostprocessError> for ClassifyError {
  fn from(err: PostprocessError) -> Self {
    match err {
      PostprocessError::LabelCountMismatchError { labels, classes } => {
        ClassifyError::LabelCountMismatchError { labels, classes }
      }
    }
  }
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
  pub top_k: usize,
  /// `None` 表示不限制推理时间
  pub timeout: Option<Duration>,
  pub preprocess: PreprocessConfig,
  /// `None` 时按模型输出类型选择
  pub dequantize: Option<Dequantize>,
}

impl Default for ClassifierConfig {
  fn default() -> Self {
    Self {
      top_k: DEFAULT_TOP_K,
      timeout: Some(DEFAULT_INFERENCE_TIMEOUT),
      preprocess: PreprocessConfig::default(),
      dequantize: None,
    }
  }
}

struct InferenceRequest {
  input: InputTensor,
  reply: mpsc::Sender<InferenceReply>,
}

struct InferenceReply {
  /// 归还的输入张量，供下一次请求复用
  input: InputTensor,
  result: Result<OutputTensor, ModelError>,
}

struct InferenceWorker {
  requests: Option<mpsc::Sender<InferenceRequest>>,
  handle: Option<thread::JoinHandle<()>>,
  stalled: bool,
}

impl InferenceWorker {
  fn spawn<M, F>(loader: F) -> Result<(Self, ModelDescriptor), ModelError>
  where
    M: Model + 'static,
    F: FnOnce() -> Result<M, ModelError> + Send + 'static,
  {
    let (init_tx, init_rx) = mpsc::channel::<Result<ModelDescriptor, ModelError>>();
    let (request_tx, request_rx) = mpsc::channel::<InferenceRequest>();

    let handle = thread::Builder::new()
      .name("jianbie-infer".to_string())
      .spawn(move || {
        let mut model = match loader() {
          Ok(model) => model,
          Err(e) => {
            let _ = init_tx.send(Err(e));
            return;
          }
        };
        let descriptor = *model.descriptor();
        if init_tx.send(Ok(descriptor)).is_err() {
          return;
        }

        for InferenceRequest { input, reply } in request_rx {
          let result = descriptor
            .check_input(&input)
            .and_then(|_| model.infer(&input).cloned());
          let _ = reply.send(InferenceReply { input, result });
        }
        debug!("推理线程退出，释放模型");
      })?;

    let descriptor = match init_rx.recv() {
      Ok(Ok(descriptor)) => descriptor,
      Ok(Err(e)) => {
        let _ = handle.join();
        return Err(e);
      }
      Err(_) => {
        let _ = handle.join();
        return Err(ModelError::load("推理线程在加载模型时意外退出"));
      }
    };

    Ok((
      Self {
        requests: Some(request_tx),
        handle: Some(handle),
        stalled: false,
      },
      descriptor,
    ))
  }

  fn infer(
    &mut self,
    input: InputTensor,
    timeout: Option<Duration>,
  ) -> Result<InferenceReply, ClassifyError> {
    let gone = || ClassifyError::InferenceError("推理线程已退出".to_string());

    let (reply_tx, reply_rx) = mpsc::channel();
    self
      .requests
      .as_ref()
      .ok_or_else(gone)?
      .send(InferenceRequest {
        input,
        reply: reply_tx,
      })
      .map_err(|_| gone())?;

    let reply = match timeout {
      Some(timeout) => match reply_rx.recv_timeout(timeout) {
        Ok(reply) => reply,
        Err(RecvTimeoutError::Timeout) => {
          warn!("推理超过 {:.2?} 未完成", timeout);
          self.stalled = true;
          return Err(ClassifyError::InferenceTimeoutError(timeout));
        }
        Err(RecvTimeoutError::Disconnected) => return Err(gone()),
      },
      None => reply_rx.recv().map_err(|_| gone())?,
    };

    // 请求按顺序处理，收到回复说明之前卡住的推理已经结束
    self.stalled = false;
    Ok(reply)
  }
}

impl Drop for InferenceWorker {
  fn drop(&mut self) {
    self.requests.take();
    if let Some(handle) = self.handle.take() {
      if self.stalled {
        warn!("推理线程仍在运行，不再等待其退出");
        return;
      }
      if handle.join().is_err() {
        error!("推理线程异常退出");
      }
    }
  }
}

/// 图像分类器，持有模型、标签表和可复用的输入张量
pub struct Classifier {
  worker: InferenceWorker,
  descriptor: ModelDescriptor,
  labels: LabelTable,
  preprocessor: Preprocessor,
  dequantize: Dequantize,
  top_k: usize,
  timeout: Option<Duration>,
  scratch: Option<InputTensor>,
}

impl Classifier {
  /// 在推理线程中调用 `loader` 加载模型，并校验标签数量
  pub fn new<M, F>(
    loader: F,
    labels: LabelTable,
    config: ClassifierConfig,
  ) -> Result<Self, ClassifyError>
  where
    M: Model + 'static,
    F: FnOnce() -> Result<M, ModelError> + Send + 'static,
  {
    info!("启动推理线程并加载模型");
    let (worker, descriptor) = InferenceWorker::spawn(loader)?;
    debug!("模型描述: {:?}", descriptor);

    if descriptor.num_classes() != labels.len() {
      error!(
        "标签数量 {} 与模型输出类别数 {} 不一致",
        labels.len(),
        descriptor.num_classes()
      );
      return Err(ClassifyError::LabelCountMismatchError {
        labels: labels.len(),
        classes: descriptor.num_classes(),
      });
    }

    let preprocessor = Preprocessor::new(config.preprocess, descriptor.input)?;
    let dequantize = config
      .dequantize
      .unwrap_or_else(|| Dequantize::for_output(descriptor.output.tensor_type));

    info!(
      "分类器就绪: 输入 {}, 类别 {}, top-k {}",
      descriptor.input.shape,
      descriptor.num_classes(),
      config.top_k
    );

    Ok(Self {
      worker,
      scratch: Some(descriptor.new_input()),
      descriptor,
      labels,
      preprocessor,
      dequantize,
      top_k: config.top_k,
      timeout: config.timeout,
    })
  }

  /// 使用已经加载好的模型
  pub fn with_model<M>(
    model: M,
    labels: LabelTable,
    config: ClassifierConfig,
  ) -> Result<Self, ClassifyError>
  where
    M: Model + Send + 'static,
  {
    Self::new(move || Ok(model), labels, config)
  }

  pub fn descriptor(&self) -> &ModelDescriptor {
    &self.descriptor
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  pub fn top_k(&self) -> usize {
    self.top_k
  }

  /// 对一张图像分类，返回置信度最高的 `min(top_k, 类别数)` 个结果
  pub fn classify(
    &mut self,
    image: &RawImage<'_>,
    orientation: i32,
  ) -> Result<Ranking, ClassifyError> {
    let started = Instant::now();

    let mut input = self
      .scratch
      .take()
      .unwrap_or_else(|| self.descriptor.new_input());
    if let Err(e) = self.preprocessor.process_into(image, orientation, &mut input) {
      self.scratch = Some(input);
      return Err(e.into());
    }
    let preprocess_elapsed = started.elapsed();

    let reply = self.worker.infer(input, self.timeout)?;
    self.scratch = Some(reply.input);
    let output = reply.result.map_err(|e| {
      if matches!(e, ModelError::ShapeMismatch { .. }) {
        error!("预处理结果与模型输入约定不一致: {}", e);
      }
      ClassifyError::from(e)
    })?;
    let infer_elapsed = started.elapsed() - preprocess_elapsed;

    let recognitions = label_probabilities(&self.labels, &output, self.dequantize)?;
    let ranking = rank(recognitions, self.top_k);

    debug!(
      "分类完成: 预处理 {:.2?}, 推理 {:.2?}, 总计 {:.2?}",
      preprocess_elapsed,
      infer_elapsed,
      started.elapsed()
    );
    Ok(ranking)
  }
}
