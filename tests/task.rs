// 该文件是 Jianbie （鉴别） 项目的一部分。
// tests/task.rs - 分类任务测试
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

use std::{cell::RefCell, convert::Infallible};

use image::RgbImage;
use jianbie::{
  CapturedImage, Classifier, ClassifierConfig, Ranking,
  output::Render,
  task::{ContinuousTask, OneShotTask, RepeatShotTask, Task},
};
use support::{FakeModel, Probe, RED, solid};

#[derive(Default)]
struct Collector {
  results: RefCell<Vec<(String, Ranking)>>,
}

impl Collector {
  fn sources(&self) -> Vec<String> {
    self
      .results
      .borrow()
      .iter()
      .map(|(source, _)| source.clone())
      .collect()
  }
}

impl Render<CapturedImage, Ranking> for &Collector {
  type Error = Infallible;

  fn render_result(&self, frame: &CapturedImage, result: &Ranking) -> Result<(), Self::Error> {
    self
      .results
      .borrow_mut()
      .push((frame.source.clone(), result.clone()));
    Ok(())
  }
}

fn setup() -> (Classifier, Probe) {
  let model = FakeModel::quantized(4, 4, &[20, 240]);
  let probe = model.probe();
  let labels = ["cold", "hot"].into_iter().collect();
  match Classifier::with_model(model, labels, ClassifierConfig::default()) {
    Ok(classifier) => (classifier, probe),
    Err(e) => panic!("failed to build classifier: {e}"),
  }
}

fn frame(name: &str) -> CapturedImage {
  CapturedImage::new(solid(5, 5, RED), 0, name)
}

#[test]
fn one_shot_classifies_first_frame() {
  let (mut classifier, probe) = setup();
  let collector = Collector::default();

  OneShotTask
    .run_task(vec![frame("a"), frame("b")].into_iter(), &mut classifier, &collector)
    .unwrap();

  assert_eq!(collector.sources(), ["a"]);
  assert_eq!(probe.calls(), 1);
  let results = collector.results.borrow();
  assert_eq!(results[0].1.best().map(|r| r.label.as_str()), Some("hot"));
}

#[test]
fn one_shot_without_input_fails() {
  let (mut classifier, probe) = setup();
  let collector = Collector::default();

  let result = OneShotTask.run_task(Vec::<CapturedImage>::new().into_iter(), &mut classifier, &collector);

  assert!(result.is_err());
  assert_eq!(probe.calls(), 0);
}

#[test]
fn one_shot_reports_invalid_image() {
  let (mut classifier, _) = setup();
  let collector = Collector::default();
  let empty = CapturedImage::new(RgbImage::new(0, 0), 0, "empty");

  let result = OneShotTask.run_task(vec![empty].into_iter(), &mut classifier, &collector);

  assert!(result.is_err());
  assert!(collector.sources().is_empty());
}

#[test]
fn repeat_shot_renders_once() {
  let (mut classifier, probe) = setup();
  let collector = Collector::default();

  RepeatShotTask::default()
    .with_repeat(4)
    .run_task(vec![frame("a")].into_iter(), &mut classifier, &collector)
    .unwrap();

  assert_eq!(probe.calls(), 4);
  assert_eq!(collector.sources(), ["a"]);
}

#[test]
fn continuous_skips_invalid_frames() {
  let (mut classifier, probe) = setup();
  let collector = Collector::default();
  let frames = vec![
    frame("a"),
    CapturedImage::new(RgbImage::new(0, 3), 0, "empty"),
    frame("c"),
  ];

  ContinuousTask::default()
    .run_task(frames.into_iter(), &mut classifier, &collector)
    .unwrap();

  assert_eq!(collector.sources(), ["a", "c"]);
  assert_eq!(probe.calls(), 2);
}

#[test]
fn continuous_stops_at_frame_limit() {
  let (mut classifier, _) = setup();
  let collector = Collector::default();
  let frames = (0..5).map(|i| frame(&format!("f{i}")));

  ContinuousTask::default()
    .with_frame_number(Some(2))
    .run_task(frames, &mut classifier, &collector)
    .unwrap();

  assert_eq!(collector.sources(), ["f0", "f1"]);
}

#[test]
fn continuous_zero_limit_classifies_nothing() {
  let (mut classifier, probe) = setup();
  let collector = Collector::default();

  ContinuousTask::default()
    .with_frame_number(Some(0))
    .run_task(vec![frame("a"), frame("b")].into_iter(), &mut classifier, &collector)
    .unwrap();

  assert!(collector.sources().is_empty());
  assert_eq!(probe.calls(), 0);
}
