use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use anyhow::bail;
use image::Rgb;

use super::*;
use crate::annotation::{LabelMask, Rect};
use crate::interaction::{Command, InputEvent};
use crate::output::{ImageFileOutput, DEFAULT_OUTPUT_NAME};
use crate::segmentation::types::InitMode;
use crate::segmentation::SegmentationEngine;

#[derive(Debug, Clone)]
struct Call {
    mode: InitMode,
    rect: Rect,
    mask_before: LabelMask,
}

/// Marks the clamped rectangle as probable foreground on rect init and
/// leaves the mask alone on mask init.
struct RecordingEngine {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl SegmentationEngine for RecordingEngine {
    fn segment(
        &mut self,
        _image: &RgbImage,
        mask: &mut LabelMask,
        rect: Rect,
        mode: InitMode,
    ) -> anyhow::Result<()> {
        self.calls.borrow_mut().push(Call {
            mode,
            rect,
            mask_before: mask.clone(),
        });
        if mode == InitMode::Rect {
            let (w, h) = mask.dimensions();
            let clamped = rect.clamp_to(w, h);
            if clamped.area() == 0 {
                bail!("empty rectangle");
            }
            for y in 0..h {
                for x in 0..w {
                    if clamped.contains(x as i32, y as i32) {
                        mask.set(x, y, Label::ProbableForeground);
                    } else {
                        mask.set(x, y, Label::Background);
                    }
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Scripted events in, recorded frames and statuses out.
#[derive(Default)]
struct Screen {
    script: VecDeque<InputEvent>,
    frames: usize,
    last_working: Option<RgbImage>,
    last_preview: Option<RgbImage>,
    statuses: Vec<String>,
}

impl EventSource for Screen {
    fn next_event(&mut self) -> anyhow::Result<Option<InputEvent>> {
        Ok(self.script.pop_front())
    }
}

impl FrameSink for Screen {
    fn present(&mut self, working: &RgbImage, preview: Option<&RgbImage>) -> anyhow::Result<()> {
        self.frames += 1;
        self.last_working = Some(working.clone());
        self.last_preview = preview.cloned();
        Ok(())
    }

    fn status(&mut self, message: &str) {
        self.statuses.push(message.to_string());
    }
}

struct MemoryOutput {
    writes: Rc<RefCell<Vec<RgbImage>>>,
}

impl OutputSink for MemoryOutput {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<PathBuf, SessionError> {
        self.writes.borrow_mut().push(frame.clone());
        Ok(self.target())
    }

    fn target(&self) -> PathBuf {
        PathBuf::from("memory.png")
    }
}

struct Harness {
    calls: Rc<RefCell<Vec<Call>>>,
    writes: Rc<RefCell<Vec<RgbImage>>>,
    screen: Screen,
}

fn scene() -> RgbImage {
    RgbImage::from_fn(10, 10, |x, y| Rgb([(x * 25) as u8, (y * 25) as u8, 99]))
}

fn down(x: i32, y: i32) -> InputEvent {
    InputEvent::PointerDown(Point::new(x, y))
}

fn moved(x: i32, y: i32) -> InputEvent {
    InputEvent::PointerMove(Point::new(x, y))
}

fn up(x: i32, y: i32) -> InputEvent {
    InputEvent::PointerUp(Point::new(x, y))
}

fn key(command: Command) -> InputEvent {
    InputEvent::Key(command)
}

fn run_with_output(
    events: Vec<InputEvent>,
    output: Box<dyn OutputSink>,
    harness: &mut Harness,
) -> SessionSummary {
    let engine = RecordingEngine {
        calls: Rc::clone(&harness.calls),
    };
    let session = Session::new(
        scene(),
        SegmentationAdapter::new(Box::new(engine)),
        output,
        SessionConfig::default(),
    );
    harness.screen.script = events.into();
    session
        .run(&mut harness.screen)
        .expect("session runs to completion")
}

fn run(events: Vec<InputEvent>) -> (SessionSummary, Harness) {
    let mut harness = Harness {
        calls: Rc::default(),
        writes: Rc::default(),
        screen: Screen::default(),
    };
    let output = Box::new(MemoryOutput {
        writes: Rc::clone(&harness.writes),
    });
    let summary = run_with_output(events, output, &mut harness);
    (summary, harness)
}

fn select(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<InputEvent> {
    vec![down(x0, y0), moved((x0 + x1) / 2, (y0 + y1) / 2), up(x1, y1)]
}

#[test]
fn confirm_segments_once_with_finalized_rect() {
    let mut events = select(2, 2, 7, 7);
    events.push(key(Command::Confirm));

    let (summary, harness) = run(events);

    let calls = harness.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].mode, InitMode::Rect);
    assert_eq!(calls[0].rect, Rect::new(2, 2, 5, 5));
    assert_eq!(summary.refinements, 1);
    assert_eq!(summary.engine_calls, 1);

    let preview = harness.screen.last_preview.expect("preview shown");
    let source = scene();
    assert_eq!(preview.get_pixel(4, 4), source.get_pixel(4, 4));
    assert_eq!(preview.get_pixel(0, 0), &Rgb([0, 0, 0]));
    assert_eq!(preview.get_pixel(8, 8), &Rgb([0, 0, 0]));
}

#[test]
fn every_valid_rect_reaches_the_engine_unchanged() {
    let (width, height) = scene().dimensions();
    let (width, height) = (width as i32, height as i32);
    for x in [0, 1, 4, 9] {
        for y in [0, 3, 8] {
            for w in [0, 1, 3, width - x] {
                for h in [0, 2, height - y] {
                    if x + w > width || y + h > height {
                        continue;
                    }
                    let mut events = select(x, y, x + w, y + h);
                    events.push(key(Command::Confirm));

                    let (summary, harness) = run(events);

                    let calls = harness.calls.borrow();
                    let expected = Rect::new(x, y, w, h);
                    assert_eq!(calls.len(), 1, "{expected:?}");
                    assert_eq!(calls[0].mode, InitMode::Rect, "{expected:?}");
                    assert_eq!(calls[0].rect, expected);
                    assert_eq!(summary.engine_calls, 1, "{expected:?}");
                }
            }
        }
    }
}

#[test]
fn dragged_rect_drawn_from_bottom_right_is_normalized() {
    let mut events = select(7, 7, 2, 2);
    events.push(key(Command::Confirm));

    let (_, harness) = run(events);

    assert_eq!(harness.calls.borrow()[0].rect, Rect::new(2, 2, 5, 5));
}

#[test]
fn refinement_sees_manual_foreground_stamp() {
    let mut events = select(2, 2, 7, 7);
    events.extend([
        key(Command::Confirm),
        key(Command::ToggleBrush),
        down(0, 0),
        up(0, 0),
        key(Command::Confirm),
    ]);

    let (summary, harness) = run(events);

    let calls = harness.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].mode, InitMode::Mask);
    assert_eq!(calls[1].mask_before.get(0, 0), Label::Foreground);
    assert_eq!(calls[1].mask_before.get(3, 0), Label::Foreground);
    assert_eq!(summary.refinements, 2);
    assert!(harness
        .screen
        .statuses
        .iter()
        .any(|s| s.contains("'foreground'")));

    let working = harness.screen.last_working.expect("working image shown");
    assert_eq!(working.get_pixel(0, 0), &Rgb([255, 255, 255]));
}

#[test]
fn earlier_strokes_keep_their_label_after_toggle() {
    let mut events = select(2, 2, 7, 7);
    events.extend([
        key(Command::Confirm),
        key(Command::ToggleBrush),
        down(1, 1),
        up(1, 1),
        key(Command::ToggleBrush),
        down(8, 8),
        up(8, 8),
        key(Command::Confirm),
    ]);

    let (_, harness) = run(events);

    let calls = harness.calls.borrow();
    let mask = &calls[1].mask_before;
    assert_eq!(mask.get(1, 1), Label::Foreground);
    assert_eq!(mask.get(8, 8), Label::Background);
}

#[test]
fn save_falls_back_to_default_name() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut harness = Harness {
        calls: Rc::default(),
        writes: Rc::default(),
        screen: Screen::default(),
    };
    let mut events = select(2, 2, 7, 7);
    events.extend([key(Command::Confirm), key(Command::Save)]);

    let summary = run_with_output(
        events,
        Box::new(ImageFileOutput::new(dir.path().join("out.txt"))),
        &mut harness,
    );

    let expected = dir.path().join(DEFAULT_OUTPUT_NAME);
    assert_eq!(summary.saved, vec![expected.clone()]);
    assert!(expected.exists());
    assert!(!dir.path().join("out.txt").exists());
}

#[test]
fn abort_before_release_never_segments_or_saves() {
    let events = vec![
        down(1, 1),
        moved(4, 4),
        key(Command::Abort),
        up(6, 6),
        key(Command::Confirm),
        key(Command::Save),
    ];

    let (summary, harness) = run(events);

    assert!(harness.calls.borrow().is_empty());
    assert!(harness.writes.borrow().is_empty());
    assert_eq!(summary, SessionSummary::default());
}

#[test]
fn abort_in_refine_skips_final_save() {
    let mut events = select(2, 2, 7, 7);
    events.extend([key(Command::Confirm), key(Command::Abort), key(Command::Save)]);

    let (summary, harness) = run(events);

    assert!(harness.writes.borrow().is_empty());
    assert!(summary.saved.is_empty());
}

#[test]
fn failed_segmentation_is_reported_and_mask_kept() {
    let events = vec![
        down(4, 4),
        up(4, 4),
        key(Command::Confirm),
        key(Command::ToggleBrush),
        down(5, 5),
        up(5, 5),
        key(Command::Confirm),
    ];

    let (summary, harness) = run(events);

    assert_eq!(summary.failed_refinements, 1);
    assert_eq!(summary.refinements, 1);
    assert_eq!(summary.engine_calls, 2);
    assert!(harness
        .screen
        .statuses
        .iter()
        .any(|s| s.starts_with("segmentation failed")));

    let calls = harness.calls.borrow();
    assert_eq!(calls.len(), 2);
    // the failed rect pass must not leak into the mask
    assert_eq!(calls[1].mask_before.count(Label::ProbableForeground), 0);
    assert_eq!(calls[1].mask_before.get(5, 5), Label::Foreground);
}

#[test]
fn reconfirm_without_strokes_reruns_on_same_mask() {
    let mut events = select(2, 2, 7, 7);
    events.extend([key(Command::Confirm), key(Command::Confirm), key(Command::Confirm)]);

    let (summary, harness) = run(events);

    let calls = harness.calls.borrow();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].mask_before, calls[2].mask_before);
    assert_eq!(summary.refinements, 3);
}

#[test]
fn save_writes_current_preview() {
    let mut events = select(2, 2, 7, 7);
    events.extend([key(Command::Confirm), key(Command::Save)]);

    let (summary, harness) = run(events);

    let writes = harness.writes.borrow();
    assert_eq!(writes.len(), 1);
    let preview = harness.screen.last_preview.as_ref().expect("preview shown");
    assert_eq!(writes[0].as_raw(), preview.as_raw());
    assert_eq!(summary.saved, vec![PathBuf::from("memory.png")]);
}

#[test]
fn phase_a_moves_only_touch_the_overlay() {
    let events = vec![down(1, 1), moved(5, 5), moved(6, 3)];

    let (_, harness) = run(events);

    let working = harness.screen.last_working.expect("working image shown");
    let source = scene();
    // outline of the latest drag is drawn, the earlier one is gone
    assert_eq!(working.get_pixel(6, 2), &Rgb([0, 0, 255]));
    assert_eq!(working.get_pixel(1, 5), source.get_pixel(1, 5));
    assert!(harness.screen.last_preview.is_none());
    assert_eq!(harness.screen.frames, 3);
    assert!(harness.calls.borrow().is_empty());
}
