// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/rank.rs - 识别结果排序
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

use std::cmp::Ordering;

/// 默认返回的识别结果数量
pub const DEFAULT_TOP_K: usize = 5;

/// 一条识别结果
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
  pub label: String,
  pub confidence: f32,
}

impl Recognition {
  pub fn new(label: impl Into<String>, confidence: f32) -> Self {
    Self {
      label: label.into(),
      confidence,
    }
  }
}

/// 按置信度降序排列的前 K 个结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ranking {
  pub items: Box<[Recognition]>,
}

impl Ranking {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn best(&self) -> Option<&Recognition> {
    self.items.first()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Recognition> {
    self.items.iter()
  }
}

/// 置信度降序；NaN 排在最后
pub fn by_confidence_desc(a: &Recognition, b: &Recognition) -> Ordering {
  fn key(value: f32) -> f32 {
    if value.is_nan() {
      f32::NEG_INFINITY
    } else {
      value
    }
  }
  key(b.confidence).total_cmp(&key(a.confidence))
}

/// 稳定排序后截取前 `k` 个，`k` 超过数量时返回全部
pub fn rank(recognitions: Vec<Recognition>, k: usize) -> Ranking {
  rank_by(recognitions, k, by_confidence_desc)
}

pub fn rank_by<F>(mut recognitions: Vec<Recognition>, k: usize, compare: F) -> Ranking
where
  F: FnMut(&Recognition, &Recognition) -> Ordering,
{
  recognitions.sort_by(compare);
  recognitions.truncate(k);
  Ranking {
    items: recognitions.into_boxed_slice(),
  }
}
