// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, error, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::CapturedImage,
  utils::{UrlParamError, decode_path, query_value},
};

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("URL parameter error: {0}")]
  UrlParamError(#[from] UrlParamError),
}

fn check_scheme(url: &Url, scheme: &str) -> Result<(), ImageFileInputError> {
  if url.scheme() != scheme {
    error!(
      "URI scheme mismatch: expected '{}', found '{}'",
      scheme,
      url.scheme()
    );
    return Err(ImageFileInputError::SchemaMismatch);
  }
  Ok(())
}

fn read_rgb(path: &Path) -> Result<RgbImage, ImageFileInputError> {
  Ok(ImageReader::open(path)?.decode()?.to_rgb8())
}

/// 单张图片输入，`image:///path/to/photo.jpg?orientation=90`
pub struct ImageFileInput {
  image: Option<CapturedImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme(url, Self::SCHEME)?;

    let path = decode_path(url)?;
    let orientation = query_value(url, "orientation")?.unwrap_or(0);
    let image = read_rgb(Path::new(&path))?;
    debug!(
      "读取图片 {}: {}x{}, 方向 {}",
      path,
      image.width(),
      image.height(),
      orientation
    );

    Ok(ImageFileInput {
      image: Some(CapturedImage::new(image, orientation, path)),
    })
  }
}

impl Iterator for ImageFileInput {
  type Item = CapturedImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}

/// 目录输入，按文件名顺序逐张读取，`folder:///path/to/photos?orientation=0`
pub struct FolderInput {
  files: std::vec::IntoIter<PathBuf>,
  orientation: i32,
}

impl FromUrlWithScheme for FolderInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for FolderInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme(url, Self::SCHEME)?;

    let directory = PathBuf::from(decode_path(url)?);
    let orientation = query_value(url, "orientation")?.unwrap_or(0);

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&directory)? {
      let path = entry?.path();
      if path.is_file() && has_image_extension(&path) {
        files.push(path);
      }
    }
    files.sort();
    debug!("目录 {} 中找到 {} 张图片", directory.display(), files.len());

    Ok(FolderInput {
      files: files.into_iter(),
      orientation,
    })
  }
}

fn has_image_extension(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| {
      IMAGE_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
    })
    .unwrap_or(false)
}

impl Iterator for FolderInput {
  type Item = CapturedImage;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.files.by_ref() {
      match read_rgb(&path) {
        Ok(image) => {
          return Some(CapturedImage::new(
            image,
            self.orientation,
            path.display().to_string(),
          ));
        }
        Err(e) => warn!("跳过无法读取的图片 {}: {}", path.display(), e),
      }
    }
    None
  }
}
