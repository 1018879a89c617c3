use color_drive::DriveConfig;
use color_drive::core_modules::command::CommandSink;
use color_drive::core_modules::display::DisplaySink;
use color_drive::core_modules::frame_source::FrameSource;
use color_drive::pipeline::{
    CancellationSignal, ControlLoop, MotionCommand, MotionState, StopReason, detect,
};
use image::{Rgb, RgbImage};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

const TARGET: Rgb<u8> = Rgb([20, 60, 200]);

type EventLog = Rc<RefCell<Vec<String>>>;

fn disk_frame(width: u32, height: u32, center: (i32, i32), radius: i32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let dx = x as i32 - center.0;
        let dy = y as i32 - center.1;
        if dx * dx + dy * dy <= radius * radius {
            TARGET
        } else {
            Rgb([0, 0, 0])
        }
    })
}

fn empty_frame() -> RgbImage {
    RgbImage::new(320, 240)
}

struct ScriptedSource {
    frames: VecDeque<RgbImage>,
    delivered: usize,
    cancel_after: Option<(usize, CancellationSignal)>,
    log: EventLog,
}

impl ScriptedSource {
    fn new(frames: Vec<RgbImage>, log: &EventLog) -> Self {
        Self {
            frames: frames.into(),
            delivered: 0,
            cancel_after: None,
            log: log.clone(),
        }
    }

    fn cancelling_after(mut self, frames: usize, signal: &CancellationSignal) -> Self {
        self.cancel_after = Some((frames, signal.clone()));
        self
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        let frame = self.frames.pop_front()?;
        self.delivered += 1;
        if let Some((after, signal)) = &self.cancel_after {
            if self.delivered >= *after {
                signal.cancel();
            }
        }
        Some(frame)
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.log.borrow_mut().push("release".to_string());
    }
}

struct RecordingSink {
    sent: Vec<MotionCommand>,
    log: EventLog,
}

impl CommandSink for RecordingSink {
    fn send(&mut self, command: &MotionCommand) -> color_drive::Result<()> {
        self.sent.push(*command);
        let name = if command.is_stop() { "stop" } else { "forward" };
        self.log.borrow_mut().push(name.to_string());
        Ok(())
    }
}

struct RecordingDisplay {
    updates: usize,
    log: EventLog,
}

impl DisplaySink for RecordingDisplay {
    fn update(&mut self, encoded: &[u8]) -> color_drive::Result<()> {
        assert_eq!(&encoded[..2], &[0xFF, 0xD8], "display expects JPEG bytes");
        self.updates += 1;
        Ok(())
    }

    fn clear(&mut self) -> color_drive::Result<()> {
        self.log.borrow_mut().push("clear".to_string());
        Ok(())
    }
}

struct Harness {
    log: EventLog,
    sink: RecordingSink,
    display: RecordingDisplay,
}

impl Harness {
    fn new() -> Self {
        let log: EventLog = Rc::default();
        Self {
            sink: RecordingSink {
                sent: Vec::new(),
                log: log.clone(),
            },
            display: RecordingDisplay {
                updates: 0,
                log: log.clone(),
            },
            log,
        }
    }

    fn events(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

#[test]
fn disk_is_detected_at_its_center_and_size() {
    let frame = disk_frame(320, 240, (150, 110), 40);
    let blob = detect(&frame, &DriveConfig::default()).expect("disk should be detected");

    assert!((blob.centroid.x - 150).abs() <= 1, "centroid = {:?}", blob.centroid);
    assert!((blob.centroid.y - 110).abs() <= 1, "centroid = {:?}", blob.centroid);
    assert!((blob.radius - 40.0).abs() <= 2.0, "radius = {}", blob.radius);
    assert!((blob.circle_center.0 - 150.0).abs() <= 1.5);
    assert!((blob.circle_center.1 - 110.0).abs() <= 1.5);
}

#[test]
fn target_filling_the_frame_is_detected() {
    let frame = RgbImage::from_pixel(320, 240, TARGET);
    let blob = detect(&frame, &DriveConfig::default()).expect("full frame should be detected");

    assert!((blob.centroid.x - 160).abs() <= 1, "centroid = {:?}", blob.centroid);
    assert!((blob.centroid.y - 120).abs() <= 1, "centroid = {:?}", blob.centroid);
    assert!(blob.radius > 190.0, "radius = {}", blob.radius);
}

#[test]
fn disk_cut_by_the_top_left_corner_is_detected() {
    let frame = disk_frame(320, 240, (10, 10), 40);
    let blob = detect(&frame, &DriveConfig::default()).expect("corner disk should be detected");

    assert!(blob.centroid.x < 40 && blob.centroid.y < 40, "centroid = {:?}", blob.centroid);
    assert!(blob.radius > DriveConfig::default().min_radius);
}

#[test]
fn off_color_disk_is_ignored() {
    let mut frame = disk_frame(320, 240, (150, 110), 40);
    for pixel in frame.pixels_mut() {
        if *pixel == TARGET {
            *pixel = Rgb([220, 30, 30]);
        }
    }
    assert_eq!(detect(&frame, &DriveConfig::default()), None);
}

#[test]
fn commands_are_sent_only_on_transitions() {
    let mut harness = Harness::new();
    let frames = vec![
        empty_frame(),
        disk_frame(320, 240, (160, 120), 30),
        disk_frame(320, 240, (170, 120), 30),
        disk_frame(320, 240, (180, 120), 30),
        empty_frame(),
        empty_frame(),
        disk_frame(320, 240, (100, 100), 8),
    ];
    let source = ScriptedSource::new(frames, &harness.log);

    let control = ControlLoop::new(
        &DriveConfig::default(),
        source,
        &mut harness.sink,
        &mut harness.display,
        CancellationSignal::new(),
    )
    .expect("valid config");
    let summary = control.run();

    assert_eq!(summary.reason, StopReason::EndOfStream);
    assert_eq!(summary.cycles, 7);
    assert_eq!(
        harness.sink.sent,
        [
            MotionCommand::forward(0.2),
            MotionCommand::stop(),
            MotionCommand::stop(),
        ]
    );
    assert_eq!(summary.commands_sent, 3);
    assert_eq!(harness.display.updates, 7);
}

#[test]
fn cancellation_while_moving_forces_a_stop() {
    let mut harness = Harness::new();
    let cancel = CancellationSignal::new();
    let frames = (0..10)
        .map(|i| disk_frame(320, 240, (120 + i, 120), 35))
        .collect();
    let source = ScriptedSource::new(frames, &harness.log).cancelling_after(3, &cancel);

    let mut control = ControlLoop::new(
        &DriveConfig::default(),
        source,
        &mut harness.sink,
        &mut harness.display,
        cancel,
    )
    .expect("valid config");
    assert_eq!(control.motion_state(), MotionState::Stopped);

    // Prime the loop by hand so the arbiter is moving before the run starts.
    let outcome = control.step(&disk_frame(320, 240, (120, 120), 35));
    assert_eq!(outcome.command, Some(MotionCommand::forward(0.2)));
    assert_eq!(control.motion_state(), MotionState::Moving);

    let summary = control.run();
    assert_eq!(summary.reason, StopReason::Cancelled);
    assert_eq!(summary.cycles, 4);
    assert_eq!(
        harness.sink.sent,
        [MotionCommand::forward(0.2), MotionCommand::stop()]
    );
    assert_eq!(harness.events(), ["forward", "stop", "release", "clear"]);
}

#[test]
fn frames_larger_or_smaller_than_requested_are_processed() {
    let mut harness = Harness::new();
    let frames = vec![
        disk_frame(1024, 768, (500, 400), 60),
        disk_frame(160, 120, (80, 60), 25),
    ];
    let source = ScriptedSource::new(frames, &harness.log);

    let summary = ControlLoop::new(
        &DriveConfig::default(),
        source,
        &mut harness.sink,
        &mut harness.display,
        CancellationSignal::new(),
    )
    .expect("valid config")
    .run();

    assert_eq!(summary.cycles, 2);
    assert_eq!(
        harness.sink.sent,
        [MotionCommand::forward(0.2), MotionCommand::stop()]
    );
}

#[test]
fn robot_keeps_moving_while_the_target_fills_the_view() {
    let mut harness = Harness::new();
    let frames = vec![
        disk_frame(320, 240, (160, 120), 40),
        RgbImage::from_pixel(320, 240, TARGET),
        RgbImage::from_pixel(320, 240, TARGET),
    ];
    let source = ScriptedSource::new(frames, &harness.log);

    let summary = ControlLoop::new(
        &DriveConfig::default(),
        source,
        &mut harness.sink,
        &mut harness.display,
        CancellationSignal::new(),
    )
    .expect("valid config")
    .run();

    assert_eq!(summary.cycles, 3);
    assert_eq!(harness.events(), ["forward", "stop", "release", "clear"]);
}

#[test]
fn shutdown_order_is_stop_release_clear() {
    let mut harness = Harness::new();
    let source = ScriptedSource::new(vec![empty_frame()], &harness.log);

    ControlLoop::new(
        &DriveConfig::default(),
        source,
        &mut harness.sink,
        &mut harness.display,
        CancellationSignal::new(),
    )
    .expect("valid config")
    .run();

    assert_eq!(harness.events(), ["stop", "release", "clear"]);
}
