/// A point in image coordinates. May lie outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle of interest, top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by two corners, normalized so (x, y) is top-left.
    /// Sizes beyond `i32::MAX` saturate.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: a.x.abs_diff(b.x).min(i32::MAX as u32) as i32,
            height: a.y.abs_diff(b.y).min(i32::MAX as u32) as i32,
        }
    }

    /// Exclusive right edge, saturating.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width.max(0))
    }

    /// Exclusive bottom edge, saturating.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height.max(0))
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// Intersect with a `width` x `height` image. The result may be empty.
    pub fn clamp_to(&self, width: u32, height: u32) -> Rect {
        let x0 = self.x.clamp(0, width as i32);
        let y0 = self.y.clamp(0, height as i32);
        let x1 = self.right().clamp(0, width as i32);
        let y1 = self.bottom().clamp(0, height as i32);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }
}

/// Per-pixel class used by graph-cut style engines.
///
/// Discriminants follow the conventional engine encoding so a mask can be
/// handed to an external library without translation.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Label {
    #[default]
    Background = 0,
    Foreground = 1,
    ProbableBackground = 2,
    ProbableForeground = 3,
}

impl Label {
    /// Opaque in the preview: definite or probable foreground.
    pub fn is_foreground(self) -> bool {
        matches!(self, Label::Foreground | Label::ProbableForeground)
    }

    /// Set by the user; the engine never relabels these.
    pub fn is_definite(self) -> bool {
        matches!(self, Label::Background | Label::Foreground)
    }
}

impl TryFrom<u8> for Label {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Label::Background),
            1 => Ok(Label::Foreground),
            2 => Ok(Label::ProbableBackground),
            3 => Ok(Label::ProbableForeground),
            other => Err(other),
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label as u8
    }
}

/// Which definite label a scribble writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushMode {
    #[default]
    Background,
    Foreground,
}

impl BrushMode {
    pub fn toggled(self) -> Self {
        match self {
            BrushMode::Background => BrushMode::Foreground,
            BrushMode::Foreground => BrushMode::Background,
        }
    }

    pub fn label(self) -> Label {
        match self {
            BrushMode::Background => Label::Background,
            BrushMode::Foreground => Label::Foreground,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BrushMode::Background => "background",
            BrushMode::Foreground => "foreground",
        }
    }
}
