use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use image::RgbImage;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use super::{to_argb_words, EventSource, FrameSink};
use crate::annotation::Point;
use crate::interaction::{Command, InputEvent};

const INPUT_TITLE: &str = "Input";
const OUTPUT_TITLE: &str = "Output";

/// Two minifb windows: "Input" shows the working overlay and receives the
/// pointer, "Output" shows the preview and opens with the first preview.
///
/// minifb is polled, so `next_event` pumps both windows until the pointer
/// or keyboard produces something.
pub struct WindowDisplay {
    input: Window,
    output: Option<Window>,
    width: usize,
    height: usize,
    working: Vec<u32>,
    button_down: bool,
    last_pos: Option<(i32, i32)>,
    pending: VecDeque<InputEvent>,
}

impl WindowDisplay {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let (width, height) = (width as usize, height as usize);
        let mut input = Window::new(INPUT_TITLE, width, height, WindowOptions::default())
            .map_err(|e| anyhow!("failed to open input window: {e}"))?;
        input.set_target_fps(60);

        tracing::debug!("Opened {}x{} input window", width, height);

        Ok(Self {
            input,
            output: None,
            width,
            height,
            working: vec![0; width * height],
            button_down: false,
            last_pos: None,
            pending: VecDeque::new(),
        })
    }

    fn poll_keys(&mut self) {
        let mut keys = self.input.get_keys_pressed(KeyRepeat::No);
        if let Some(output) = &self.output {
            keys.extend(output.get_keys_pressed(KeyRepeat::No));
        }
        self.pending
            .extend(keys.into_iter().filter_map(map_key).map(InputEvent::Key));
    }

    fn poll_pointer(&mut self) {
        let pos = self
            .input
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| (x as i32, y as i32));
        let down = self.input.get_mouse_down(MouseButton::Left);

        match (self.button_down, down, pos.or(self.last_pos)) {
            (false, true, Some((x, y))) => {
                self.pending.push_back(InputEvent::PointerDown(Point::new(x, y)));
                self.button_down = true;
            }
            (true, false, Some((x, y))) => {
                self.pending.push_back(InputEvent::PointerUp(Point::new(x, y)));
                self.button_down = false;
            }
            (_, _, Some((x, y))) if pos.is_some() && pos != self.last_pos => {
                self.pending.push_back(InputEvent::PointerMove(Point::new(x, y)));
            }
            _ => {}
        }
        if pos.is_some() {
            self.last_pos = pos;
        }
    }

    fn pump(&mut self) -> Result<()> {
        self.input
            .update_with_buffer(&self.working, self.width, self.height)
            .map_err(|e| anyhow!("failed to update input window: {e}"))?;
        if let Some(output) = self.output.as_mut() {
            output.update();
        }
        Ok(())
    }
}

fn map_key(key: Key) -> Option<Command> {
    match key {
        Key::Escape => Some(Command::Abort),
        Key::Enter | Key::NumPadEnter => Some(Command::Confirm),
        Key::Space => Some(Command::ToggleBrush),
        Key::S => Some(Command::Save),
        _ => None,
    }
}

impl EventSource for WindowDisplay {
    fn next_event(&mut self) -> Result<Option<InputEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if !self.input.is_open() {
                // closing the input window counts as abort
                return Ok(Some(InputEvent::Key(Command::Abort)));
            }
            self.poll_keys();
            self.poll_pointer();
            if self.pending.is_empty() {
                self.pump()?;
            }
        }
    }
}

impl FrameSink for WindowDisplay {
    fn present(&mut self, working: &RgbImage, preview: Option<&RgbImage>) -> Result<()> {
        self.working = to_argb_words(working);
        self.input
            .update_with_buffer(&self.working, self.width, self.height)
            .map_err(|e| anyhow!("failed to update input window: {e}"))?;

        if let Some(preview) = preview {
            if self.output.is_none() {
                let window = Window::new(
                    OUTPUT_TITLE,
                    self.width,
                    self.height,
                    WindowOptions::default(),
                )
                .map_err(|e| anyhow!("failed to open output window: {e}"))?;
                self.output = Some(window);
            }
            if let Some(output) = self.output.as_mut() {
                output
                    .update_with_buffer(&to_argb_words(preview), self.width, self.height)
                    .map_err(|e| anyhow!("failed to update output window: {e}"))?;
            }
        }
        Ok(())
    }

    fn status(&mut self, message: &str) {
        self.input.set_title(&format!("{INPUT_TITLE} - {message}"));
    }
}
