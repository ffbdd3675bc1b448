// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/utils.rs - URL 辅助函数
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

use std::str::FromStr;

use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UrlParamError {
  #[error("路径编码错误: {0}")]
  PathEncoding(#[from] std::string::FromUtf8Error),
  #[error("参数 {key} 的值 {value:?} 无效")]
  InvalidValue { key: String, value: String },
}

/// 解码 URL 中的文件路径（处理 `%20` 等转义）
pub fn decode_path(url: &Url) -> Result<String, UrlParamError> {
  Ok(urlencoding::decode(url.path())?.into_owned())
}

/// 读取查询参数并解析，参数不存在时返回 `None`
pub fn query_value<T: FromStr>(url: &Url, key: &str) -> Result<Option<T>, UrlParamError> {
  match url.query_pairs().find(|(k, _)| k == key) {
    Some((_, v)) => v
      .parse::<T>()
      .map(Some)
      .map_err(|_| UrlParamError::InvalidValue {
        key: key.to_string(),
        value: v.into_owned(),
      }),
    None => Ok(None),
  }
}

/// 查询参数是否存在（不关心取值）
pub fn query_flag(url: &Url, key: &str) -> bool {
  url.query_pairs().any(|(k, _)| k == key)
}
