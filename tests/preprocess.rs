// 该文件是 Jianbie （鉴别） 项目的一部分。
// tests/preprocess.rs - 图像预处理测试
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

mod support;

use image::{Rgb, RgbImage};
use jianbie::{
  RawImage,
  model::InputSpec,
  preprocess::{PreprocessConfig, PreprocessError, Preprocessor},
  tensor::{InputTensor, TensorFormat, TensorShape, TensorType},
};
use rstest::rstest;
use support::{BLUE, GREEN, RED, WHITE, input_spec, pixel_at, quadrants, solid};

fn preprocessor(spec: InputSpec) -> Preprocessor {
  match Preprocessor::new(PreprocessConfig::default(), spec) {
    Ok(preprocessor) => preprocessor,
    Err(e) => panic!("failed to build preprocessor: {e}"),
  }
}

fn run(preprocessor: &Preprocessor, image: &RgbImage, orientation: i32) -> InputTensor {
  preprocessor
    .preprocess(&RawImage::from(image), orientation)
    .unwrap()
}

fn as_color(pixel: [f32; 3]) -> [u8; 3] {
  pixel.map(|v| v as u8)
}

#[rstest]
#[case(1, 1, 0)]
#[case(1, 500, 0)]
#[case(500, 1, 90)]
#[case(17, 31, 180)]
#[case(640, 480, 270)]
#[case(480, 640, 90)]
#[case(1024, 768, -90)]
fn output_shape_never_depends_on_input(
  #[case] width: u32,
  #[case] height: u32,
  #[case] orientation: i32,
) {
  let spec = input_spec(16, 12, TensorType::UInt8);
  let preprocessor = preprocessor(spec);
  let image = solid(width, height, GREEN);

  let tensor = run(&preprocessor, &image, orientation);

  assert_eq!(tensor.shape, TensorShape::new(1, 12, 16, 3));
  assert_eq!(tensor.data.len(), 12 * 16 * 3);
  assert_eq!(as_color(pixel_at(&tensor, 11, 15)), GREEN);
}

#[test]
fn orientations_produce_distinct_tensors() {
  let preprocessor = preprocessor(input_spec(8, 8, TensorType::UInt8));
  let image = quadrants(16);

  let tensors: Vec<_> = [0, 90, 180, 270]
    .iter()
    .map(|&o| run(&preprocessor, &image, o))
    .collect();

  for i in 0..tensors.len() {
    for j in i + 1..tensors.len() {
      assert_ne!(tensors[i], tensors[j], "orientation {} vs {}", i * 90, j * 90);
    }
  }
}

#[rstest]
#[case(0, RED)]
#[case(90, GREEN)]
#[case(180, WHITE)]
#[case(270, BLUE)]
fn rotation_is_counter_clockwise(#[case] orientation: i32, #[case] top_left: [u8; 3]) {
  let preprocessor = preprocessor(input_spec(8, 8, TensorType::UInt8));
  let image = quadrants(16);

  let tensor = run(&preprocessor, &image, orientation);

  assert_eq!(as_color(pixel_at(&tensor, 0, 0)), top_left);
}

#[rstest]
#[case(360, 0)]
#[case(450, 90)]
#[case(-90, 270)]
#[case(-270, 90)]
#[case(45, 0)]
#[case(135, 90)]
#[case(-1, 270)]
fn orientation_is_reduced_to_quarter_turns(#[case] orientation: i32, #[case] canonical: i32) {
  let preprocessor = preprocessor(input_spec(8, 8, TensorType::UInt8));
  let image = quadrants(16);

  assert_eq!(
    run(&preprocessor, &image, orientation),
    run(&preprocessor, &image, canonical)
  );
}

#[test]
fn portrait_is_cropped_around_centre() {
  // 100x300：上中下三段分别为红、绿、蓝
  let image = RgbImage::from_fn(100, 300, |_, y| match y {
    0..100 => Rgb(RED),
    100..200 => Rgb(GREEN),
    _ => Rgb(BLUE),
  });
  let preprocessor = preprocessor(input_spec(10, 10, TensorType::UInt8));

  let tensor = run(&preprocessor, &image, 0);

  for y in 0..10 {
    for x in 0..10 {
      assert_eq!(as_color(pixel_at(&tensor, y, x)), GREEN, "pixel ({y}, {x})");
    }
  }
}

#[test]
fn landscape_is_cropped_around_centre() {
  let image = RgbImage::from_fn(300, 100, |x, _| match x {
    0..100 => Rgb(RED),
    100..200 => Rgb(WHITE),
    _ => Rgb(BLUE),
  });
  let preprocessor = preprocessor(input_spec(5, 5, TensorType::UInt8));

  let tensor = run(&preprocessor, &image, 90);

  for y in 0..5 {
    for x in 0..5 {
      assert_eq!(as_color(pixel_at(&tensor, y, x)), WHITE);
    }
  }
}

#[test]
fn non_square_target_after_quarter_turn() {
  // 旋转后宽高互换，结果仍然是模型要求的 16x8
  let spec = input_spec(16, 8, TensorType::UInt8);
  let preprocessor = preprocessor(spec);
  let image = quadrants(32);

  let tensor = run(&preprocessor, &image, 90);

  assert_eq!(tensor.shape, TensorShape::new(1, 8, 16, 3));
  assert_eq!(as_color(pixel_at(&tensor, 0, 0)), GREEN);
  assert_eq!(as_color(pixel_at(&tensor, 7, 15)), BLUE);
}

#[test]
fn float_input_is_normalized_per_channel() {
  let config = PreprocessConfig {
    mean: [127.5; 3],
    std: [127.5; 3],
    fill: 0,
  };
  let preprocessor = Preprocessor::new(config, input_spec(4, 4, TensorType::Float32)).unwrap();
  let image = solid(4, 4, RED);

  let tensor = run(&preprocessor, &image, 0);

  assert_eq!(tensor.data.tensor_type(), TensorType::Float32);
  assert_eq!(pixel_at(&tensor, 2, 1), [1.0, -1.0, -1.0]);
}

#[test]
fn planar_layout_groups_channels() {
  let spec = InputSpec {
    shape: TensorShape::new(1, 2, 2, 3),
    format: TensorFormat::Nchw,
    tensor_type: TensorType::UInt8,
  };
  let preprocessor = preprocessor(spec);
  let image = solid(2, 2, [10, 20, 30]);

  let tensor = run(&preprocessor, &image, 0);

  let values: Vec<f32> = (0..12).filter_map(|i| tensor.data.get_f32(i)).collect();
  assert_eq!(
    values,
    [10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0, 20.0, 30.0, 30.0, 30.0, 30.0]
  );
}

#[test]
fn reuses_provided_tensor() {
  let spec = input_spec(4, 4, TensorType::UInt8);
  let preprocessor = preprocessor(spec);
  let mut tensor = InputTensor::zeros(TensorShape::new(1, 2, 2, 3), TensorFormat::Nhwc, TensorType::UInt8);

  preprocessor
    .process_into(&RawImage::from(&solid(3, 3, WHITE)), 0, &mut tensor)
    .unwrap();

  assert_eq!(tensor.shape, spec.shape);
  assert_eq!(as_color(pixel_at(&tensor, 3, 3)), WHITE);
}

#[rstest]
#[case(TensorShape::new(1, 4, 4, 1))]
#[case(TensorShape::new(2, 4, 4, 3))]
#[case(TensorShape::new(1, 0, 4, 3))]
fn rejects_unsupported_model_input(#[case] shape: TensorShape) {
  let spec = InputSpec {
    shape,
    format: TensorFormat::Nhwc,
    tensor_type: TensorType::UInt8,
  };

  assert!(matches!(
    Preprocessor::new(PreprocessConfig::default(), spec),
    Err(PreprocessError::UnsupportedInput(_))
  ));
}

#[test]
fn rejects_zero_std() {
  let config = PreprocessConfig {
    std: [1.0, 0.0, 1.0],
    ..PreprocessConfig::default()
  };

  assert!(Preprocessor::new(config, input_spec(4, 4, TensorType::Float32)).is_err());
}
