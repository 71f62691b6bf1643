use anyhow::Result;
use image::RgbImage;
use std::path::PathBuf;

use crate::annotation::{AnnotationModel, Label, Point};
use crate::display::{EventSource, FrameSink};
use crate::error::SessionError;
use crate::interaction::{Effect, Interaction};
use crate::output::OutputSink;
use crate::render::{composite, stroke_color, Canvas};
use crate::segmentation::SegmentationAdapter;

/// Tunables for one interactive session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Scribble disc radius in pixels.
    pub brush_radius: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { brush_radius: 3 }
    }
}

/// What happened during a session, returned when it ends.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SessionSummary {
    pub engine_calls: usize,
    pub refinements: usize,
    pub failed_refinements: usize,
    pub saved: Vec<PathBuf>,
}

enum Flow {
    Continue,
    Redraw,
    Quit,
}

/// Drives one image through rectangle selection and scribble refinement.
///
/// Owns the original image, the annotation model, the interaction state
/// machine and the working canvas. Blocks on the event source; engine calls
/// run inline.
pub struct Session {
    original: RgbImage,
    model: AnnotationModel,
    interaction: Interaction,
    adapter: SegmentationAdapter,
    canvas: Canvas,
    preview: Option<RgbImage>,
    output: Box<dyn OutputSink>,
    config: SessionConfig,
    summary: SessionSummary,
}

impl Session {
    pub fn new(
        original: RgbImage,
        adapter: SegmentationAdapter,
        output: Box<dyn OutputSink>,
        config: SessionConfig,
    ) -> Self {
        let (width, height) = original.dimensions();
        Self {
            model: AnnotationModel::new(width, height),
            interaction: Interaction::new(),
            canvas: Canvas::new(&original),
            preview: None,
            original,
            adapter,
            output,
            config,
            summary: SessionSummary::default(),
        }
    }

    /// Run until abort or until the event source runs dry.
    ///
    /// `surface` is the display: it delivers events and shows frames.
    pub fn run<D>(mut self, surface: &mut D) -> Result<SessionSummary>
    where
        D: EventSource + FrameSink,
    {
        tracing::info!("1. Draw a rectangle around the object, then press Enter to continue.");
        surface.present(self.canvas.image(), None)?;

        while let Some(event) = surface.next_event()? {
            let mut redraw = false;
            for effect in self.interaction.handle(event) {
                match self.apply(effect, surface)? {
                    Flow::Continue => {}
                    Flow::Redraw => redraw = true,
                    Flow::Quit => return Ok(self.finish()),
                }
            }
            tracing::trace!(
                ?event,
                phase = ?self.interaction.phase(),
                drawing = self.interaction.drawing(),
                initialized = self.interaction.segmentation_initialized(),
                "event handled"
            );
            if redraw {
                surface.present(self.canvas.image(), self.preview.as_ref())?;
            }
        }

        tracing::debug!("Event source closed");
        Ok(self.finish())
    }

    fn apply<F: FrameSink>(&mut self, effect: Effect, display: &mut F) -> Result<Flow> {
        match effect {
            Effect::PreviewRect(rect) => {
                self.canvas.reset(&self.original);
                self.canvas.outline_rect(rect);
                Ok(Flow::Redraw)
            }
            Effect::FinalizeRect(rect) => {
                self.model.set_rectangle(rect)?;
                self.canvas.reset(&self.original);
                self.canvas.outline_rect(rect);
                tracing::debug!(?rect, "rectangle selected");
                Ok(Flow::Redraw)
            }
            Effect::EnterRefine => {
                self.model.freeze_rectangle();
                self.refresh_preview();
                tracing::info!(
                    "2. Add scribbles as necessary. When done, press Enter to update the segmentation."
                );
                Ok(Flow::Redraw)
            }
            Effect::Stamp { center, label } => {
                self.apply_stroke(center, label);
                Ok(Flow::Redraw)
            }
            Effect::BrushChanged(mode) => {
                report(display, &format!("Switched to '{}' scribbles.", mode.name()));
                Ok(Flow::Continue)
            }
            Effect::Segment { initialized } => {
                match self.segment(initialized) {
                    Ok(()) => self.summary.refinements += 1,
                    Err(e) if e.is_recoverable() => {
                        self.summary.failed_refinements += 1;
                        report_error(display, &e);
                    }
                    Err(e) => return Err(e.into()),
                }
                Ok(Flow::Redraw)
            }
            Effect::Save => {
                self.save(display)?;
                Ok(Flow::Continue)
            }
            Effect::Quit => {
                tracing::info!("Session aborted");
                Ok(Flow::Quit)
            }
        }
    }

    /// One stroke dab, written to the mask and the canvas.
    fn apply_stroke(&mut self, center: Point, label: Label) {
        let radius = self.config.brush_radius;
        self.model.stamp_label(center, radius, label);
        self.canvas.stamp(center, radius, stroke_color(label));
        self.refresh_preview();
    }

    fn segment(&mut self, initialized: bool) -> Result<(), SessionError> {
        let mask = self.adapter.refine(
            &self.original,
            self.model.current_mask(),
            self.model.current_rectangle(),
            initialized,
        )?;
        self.model.replace_mask(mask)?;
        self.refresh_preview();
        Ok(())
    }

    fn save<F: FrameSink>(&mut self, display: &mut F) -> Result<()> {
        let preview = match &self.preview {
            Some(preview) => preview.clone(),
            None => composite(&self.original, self.model.current_mask()),
        };
        match self.output.write_frame(&preview) {
            Ok(path) => {
                report(
                    display,
                    &format!("Segmented image saved to '{}'.", path.display()),
                );
                self.summary.saved.push(path);
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                report_error(display, &e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn finish(self) -> SessionSummary {
        SessionSummary {
            engine_calls: self.adapter.calls(),
            ..self.summary
        }
    }

    fn refresh_preview(&mut self) {
        self.preview = Some(composite(&self.original, self.model.current_mask()));
    }
}

fn report<F: FrameSink>(display: &mut F, message: &str) {
    tracing::info!("{}", message);
    display.status(message);
}

fn report_error<F: FrameSink>(display: &mut F, error: &SessionError) {
    tracing::warn!("{}", error);
    display.status(&error.to_string());
}

#[cfg(test)]
mod tests;
