use crate::annotation::Point;

/// Logical key commands. Physical key mapping belongs to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Abort,
    Confirm,
    ToggleBrush,
    Save,
}

/// Normalized input event stream consumed by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    Key(Command),
}
