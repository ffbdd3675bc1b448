// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/output/save_json_file.rs - 保存 JSON 文件
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

use std::{io::Write, path::Path};

use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::CapturedImage,
  output::Render,
  rank::Ranking,
  utils::{UrlParamError, decode_path, query_flag},
};

#[derive(Error, Debug)]
pub enum SaveJsonFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URL 参数错误: {0}")]
  UrlParamError(#[from] UrlParamError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 保存识别结果，`json:///path/to/result.json`
///
/// 默认每一帧覆盖同一个文件；带 `?append` 时按 JSON Lines 追加。
pub struct SaveJsonFileOutput {
  path: String,
  append: bool,
}

impl FromUrlWithScheme for SaveJsonFileOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for SaveJsonFileOutput {
  type Error = SaveJsonFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(SaveJsonFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(SaveJsonFileOutput {
      path: decode_path(url)?,
      append: query_flag(url, "append"),
    })
  }
}

pub fn ranking_to_json(frame: &CapturedImage, result: &Ranking) -> Value {
  let recognitions: Vec<Value> = result
    .iter()
    .map(|item| {
      json!({
        "label": item.label,
        "confidence": item.confidence,
      })
    })
    .collect();

  json!({
    "source": frame.source,
    "orientation": frame.orientation,
    "recognitions": recognitions,
  })
}

impl SaveJsonFileOutput {
  fn save(&self, value: &Value) -> Result<(), SaveJsonFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    if self.append {
      let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&self.path)?;
      serde_json::to_writer(&mut file, value)?;
      file.write_all(b"\n")?;
    } else {
      std::fs::write(&self.path, serde_json::to_vec_pretty(value)?)?;
    }

    debug!("保存识别结果到文件: {}", self.path);
    Ok(())
  }
}

impl Render<CapturedImage, Ranking> for SaveJsonFileOutput {
  type Error = SaveJsonFileError;

  fn render_result(&self, frame: &CapturedImage, result: &Ranking) -> Result<(), Self::Error> {
    self.save(&ranking_to_json(frame, result))
  }
}
