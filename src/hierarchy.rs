use crate::error::{ConvertError, Result};

/// The element levels of a complex export, outermost first.
///
/// `export > ceg > rovat > alrovat > mezo`, with `ujsor` as a leaf line-break
/// marker that may appear inside a `mezo` or next to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Container,
    Record,
    Category,
    Subcategory,
    Field,
    LineBreak,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Container,
        Level::Record,
        Level::Category,
        Level::Subcategory,
        Level::Field,
        Level::LineBreak,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Level::Container => "export",
            Level::Record => "ceg",
            Level::Category => "rovat",
            Level::Subcategory => "alrovat",
            Level::Field => "mezo",
            Level::LineBreak => "ujsor",
        }
    }

    pub fn intern(name: &[u8]) -> Option<Level> {
        match name {
            b"export" => Some(Level::Container),
            b"ceg" => Some(Level::Record),
            b"rovat" => Some(Level::Category),
            b"alrovat" => Some(Level::Subcategory),
            b"mezo" => Some(Level::Field),
            b"ujsor" => Some(Level::LineBreak),
            _ => None,
        }
    }

    /// Levels allowed directly inside `self`.
    pub fn children(self) -> &'static [Level] {
        match self {
            Level::Container => &[Level::Record],
            Level::Record => &[Level::Category],
            Level::Category => &[Level::Subcategory],
            Level::Subcategory => &[Level::Field, Level::LineBreak],
            Level::Field => &[Level::LineBreak],
            Level::LineBreak => &[],
        }
    }

    pub fn accepts_child(self, child: Level) -> bool {
        self.children().contains(&child)
    }

    /// Whether the element must carry an `id` attribute.
    pub fn requires_id(self) -> bool {
        matches!(
            self,
            Level::Record | Level::Category | Level::Subcategory | Level::Field
        )
    }
}

fn tag_list(levels: &[Level]) -> String {
    if levels.is_empty() {
        return "no child elements".to_string();
    }
    levels
        .iter()
        .map(|level| format!("<{}>", level.tag()))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Checks that start and end events nest exactly as the hierarchy allows.
///
/// Validation and movement are separate steps so the caller can run its
/// level-specific action between them: `check_start`, act, `enter`; and
/// `check_end`, act, `leave`.
#[derive(Debug, Default, Clone)]
pub struct HierarchyValidator {
    open: Vec<Level>,
}

impl HierarchyValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// The innermost open level.
    pub fn current(&self) -> Option<Level> {
        self.open.last().copied()
    }

    /// The level enclosing the innermost open one.
    pub fn parent(&self) -> Option<Level> {
        self.open.iter().rev().nth(1).copied()
    }

    pub fn expected_children(&self) -> &'static [Level] {
        match self.current() {
            Some(level) => level.children(),
            None => &[Level::Container],
        }
    }

    pub fn check_start(&self, name: &[u8], position: u64) -> Result<Level> {
        let expected = self.expected_children();
        match Level::intern(name) {
            Some(level) if expected.contains(&level) => Ok(level),
            _ => Err(ConvertError::structural(
                format!(
                    "unexpected start-element <{}> (expected {})",
                    String::from_utf8_lossy(name),
                    tag_list(expected)
                ),
                position,
            )),
        }
    }

    pub fn enter(&mut self, level: Level) {
        debug_assert!(
            self.expected_children().contains(&level),
            "enter() without a passing check_start()"
        );
        self.open.push(level);
    }

    pub fn check_end(&self, name: &[u8], position: u64) -> Result<Level> {
        match self.current() {
            Some(level) if level.tag().as_bytes() == name => Ok(level),
            Some(level) => Err(ConvertError::structural(
                format!(
                    "unexpected end-element </{}> (expected </{}>)",
                    String::from_utf8_lossy(name),
                    level.tag()
                ),
                position,
            )),
            None => Err(ConvertError::structural(
                format!(
                    "unexpected end-element </{}> with no open element",
                    String::from_utf8_lossy(name)
                ),
                position,
            )),
        }
    }

    pub fn leave(&mut self) -> Option<Level> {
        self.open.pop()
    }
}
