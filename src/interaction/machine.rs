use super::events::{Command, InputEvent};
use crate::annotation::{BrushMode, Label, Point, Rect};

/// Phase of the interaction with its per-phase sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Rectangle selection. `anchor` is set while dragging.
    SelectRect {
        anchor: Option<Point>,
        finalized: Option<Rect>,
    },
    /// Scribble refinement. `stroke` holds the label of the stroke in
    /// progress, fixed when the pointer went down.
    Refine { stroke: Option<Label> },
    /// Aborted; no further events are processed.
    Done,
}

/// Side effects requested by a transition. The session applies them in
/// order against the annotation model, the engine and the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Redraw the working image with a live rectangle outline.
    PreviewRect(Rect),
    /// Write the rectangle into the model and redraw its outline.
    FinalizeRect(Rect),
    /// Freeze the rectangle; Phase B starts.
    EnterRefine,
    /// Stamp a scribble disc on both mask and overlay.
    Stamp { center: Point, label: Label },
    BrushChanged(BrushMode),
    /// Run the engine. `initialized == false` seeds from the frozen
    /// rectangle, otherwise from the current mask.
    Segment { initialized: bool },
    Save,
    Quit,
}

/// Two-phase interaction state machine.
///
/// Owns the phase, brush mode and the `segmentation-initialized` flag.
/// `handle` maps (state, event) to (state', effects) and never touches the
/// model itself.
#[derive(Debug, Clone)]
pub struct Interaction {
    phase: Phase,
    brush: BrushMode,
    segmentation_initialized: bool,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self {
            phase: Phase::SelectRect {
                anchor: None,
                finalized: None,
            },
            brush: BrushMode::default(),
            segmentation_initialized: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn segmentation_initialized(&self) -> bool {
        self.segmentation_initialized
    }

    /// Pointer is held down in either phase.
    pub fn drawing(&self) -> bool {
        match self.phase {
            Phase::SelectRect { anchor, .. } => anchor.is_some(),
            Phase::Refine { stroke } => stroke.is_some(),
            Phase::Done => false,
        }
    }

    #[cfg(test)]
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn handle(&mut self, event: InputEvent) -> Vec<Effect> {
        if let InputEvent::Key(Command::Abort) = event {
            self.phase = Phase::Done;
            return vec![Effect::Quit];
        }

        match self.phase {
            Phase::SelectRect { anchor, finalized } => self.select_rect(anchor, finalized, event),
            Phase::Refine { stroke } => self.refine(stroke, event),
            Phase::Done => Vec::new(),
        }
    }

    fn select_rect(
        &mut self,
        anchor: Option<Point>,
        finalized: Option<Rect>,
        event: InputEvent,
    ) -> Vec<Effect> {
        match (event, anchor) {
            (InputEvent::PointerDown(p), _) => {
                self.phase = Phase::SelectRect {
                    anchor: Some(p),
                    finalized,
                };
                Vec::new()
            }
            (InputEvent::PointerMove(p), Some(a)) => {
                vec![Effect::PreviewRect(Rect::from_corners(a, p))]
            }
            (InputEvent::PointerUp(p), Some(a)) => {
                let rect = Rect::from_corners(a, p);
                self.phase = Phase::SelectRect {
                    anchor: None,
                    finalized: Some(rect),
                };
                vec![Effect::FinalizeRect(rect)]
            }
            (InputEvent::Key(Command::Confirm), _) => match finalized {
                Some(_) => self.enter_refine(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn enter_refine(&mut self) -> Vec<Effect> {
        self.phase = Phase::Refine { stroke: None };
        let mut effects = vec![Effect::EnterRefine];
        if !self.segmentation_initialized {
            self.segmentation_initialized = true;
            effects.push(Effect::Segment { initialized: false });
        }
        effects
    }

    fn refine(&mut self, stroke: Option<Label>, event: InputEvent) -> Vec<Effect> {
        match (event, stroke) {
            (InputEvent::PointerDown(center), _) => {
                let label = self.brush.label();
                self.phase = Phase::Refine {
                    stroke: Some(label),
                };
                vec![Effect::Stamp { center, label }]
            }
            (InputEvent::PointerMove(center), Some(label)) => {
                vec![Effect::Stamp { center, label }]
            }
            (InputEvent::PointerUp(center), Some(label)) => {
                self.phase = Phase::Refine { stroke: None };
                vec![Effect::Stamp { center, label }]
            }
            (InputEvent::Key(Command::ToggleBrush), _) => {
                self.brush = self.brush.toggled();
                vec![Effect::BrushChanged(self.brush)]
            }
            (InputEvent::Key(Command::Confirm), _) => vec![Effect::Segment {
                initialized: self.segmentation_initialized,
            }],
            (InputEvent::Key(Command::Save), _) => vec![Effect::Save],
            _ => Vec::new(),
        }
    }
}
