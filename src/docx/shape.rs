//! Inline shapes and the lazy walk that discovers them

use super::xml::{attr, qualified_name};
use quick_xml::events::Event;
use serde::Serialize;
use std::fmt;

/// English Metric Units per inch
pub const EMU_PER_INCH: i64 = 914_400;
/// English Metric Units per point
pub const EMU_PER_POINT: i64 = 12_700;

/// A length in English Metric Units, the unit DrawingML sizes are stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Emu(pub i64);

impl Emu {
    /// Length from inches, rounded to the nearest EMU.
    pub fn from_inches(inches: f64) -> Self {
        Self((inches * EMU_PER_INCH as f64).round() as i64)
    }

    /// Length from points, rounded to the nearest EMU.
    pub fn from_points(points: f64) -> Self {
        Self((points * EMU_PER_POINT as f64).round() as i64)
    }

    /// Length in inches.
    pub fn inches(self) -> f64 {
        self.0 as f64 / EMU_PER_INCH as f64
    }

    /// Length in points.
    pub fn points(self) -> f64 {
        self.0 as f64 / EMU_PER_POINT as f64
    }
}

impl fmt::Display for Emu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}in", self.inches())
    }
}

/// Display size of an inline shape (`wp:extent`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Extent {
    /// Horizontal size
    pub width: Emu,
    /// Vertical size
    pub height: Emu,
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

/// Where a shape sits: paragraph ordinal in document order, run ordinal within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShapePosition {
    /// Zero-based paragraph index, counting every `w:p` in document order
    pub paragraph: usize,
    /// Zero-based run index within that paragraph
    pub run: usize,
}

/// Inclusive event span of a `w:drawing` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DrawingSpan {
    pub start: usize,
    pub end: usize,
}

/// An image embedded in the text flow (`w:drawing/wp:inline`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineShape {
    /// Alt text (`wp:docPr/@descr`); `None` when the attribute is absent
    pub description: Option<String>,
    /// Display size, `None` when `wp:extent` is missing
    pub extent: Option<Extent>,
    /// `wp:docPr/@id`
    pub doc_pr_id: Option<u32>,
    /// Relationship id of the embedded picture (`a:blip/@r:embed`)
    pub embed: Option<String>,
    /// Paragraph/run location, `None` when the drawing is not owned by a run
    pub position: Option<ShapePosition>,
    #[serde(skip)]
    pub(crate) drawing: DrawingSpan,
    #[serde(skip)]
    pub(crate) owner_run: Option<usize>,
}

impl InlineShape {
    /// Whether the alt text equals `marker` exactly.
    pub fn has_description(&self, marker: &str) -> bool {
        self.description.as_deref() == Some(marker)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Paragraph,
    Run,
    Drawing,
    Inline,
    Other,
}

impl Node {
    // DrawingML and OMML reuse the local names `p` and `r`, so match on the
    // WordprocessingML prefixes Word writes.
    fn of(qualified: &[u8]) -> Self {
        match qualified {
            b"w:p" => Node::Paragraph,
            b"w:r" => Node::Run,
            b"w:drawing" => Node::Drawing,
            b"wp:inline" => Node::Inline,
            _ => Node::Other,
        }
    }
}

/// A `w:drawing` that has been opened but not closed yet
#[derive(Debug, Default)]
struct Pending {
    start: usize,
    owner_run: Option<usize>,
    position: Option<ShapePosition>,
    /// Event index of this drawing's own `wp:inline`, while it is open
    open_inline: Option<usize>,
    inline: bool,
    description: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    doc_pr_id: Option<u32>,
    embed: Option<String>,
}

/// Lazy document-order walk over inline shapes.
///
/// Created by [`Document::inline_shapes`](super::Document::inline_shapes); each call
/// starts a fresh walk. Drawings nested inside another drawing (pictures in a
/// text box) are reported on their own, before the drawing that contains them.
pub struct InlineShapes<'a> {
    events: &'a [Event<'static>],
    pos: usize,
    stack: Vec<(Node, usize)>,
    paragraphs: Vec<OpenParagraph>,
    paragraph_count: usize,
    drawings: Vec<Pending>,
}

/// Bookkeeping for a `w:p` that has not been closed yet
#[derive(Debug)]
struct OpenParagraph {
    ordinal: usize,
    runs_seen: usize,
    current_run: Option<usize>,
}

impl<'a> InlineShapes<'a> {
    pub(crate) fn new(events: &'a [Event<'static>]) -> Self {
        Self {
            events,
            pos: 0,
            stack: Vec::new(),
            paragraphs: Vec::new(),
            paragraph_count: 0,
            drawings: Vec::new(),
        }
    }

    fn open(&mut self, node: Node, index: usize, empty: bool) {
        match node {
            Node::Paragraph => {
                if !empty {
                    self.paragraphs.push(OpenParagraph {
                        ordinal: self.paragraph_count,
                        runs_seen: 0,
                        current_run: None,
                    });
                }
                self.paragraph_count += 1;
            }
            Node::Run => {
                if let Some(paragraph) = self.paragraphs.last_mut() {
                    if !empty {
                        paragraph.current_run = Some(paragraph.runs_seen);
                    }
                    paragraph.runs_seen += 1;
                }
            }
            Node::Drawing if !empty => {
                let owner_run = match self.stack.last() {
                    Some((Node::Run, run_index)) => Some(*run_index),
                    _ => None,
                };
                let position = match (owner_run, self.paragraphs.last()) {
                    (Some(_), Some(paragraph)) => {
                        paragraph.current_run.map(|run| ShapePosition {
                            paragraph: paragraph.ordinal,
                            run,
                        })
                    }
                    _ => None,
                };
                self.drawings.push(Pending {
                    start: index,
                    owner_run,
                    position,
                    ..Pending::default()
                });
            }
            Node::Inline if !empty => {
                if let (Some(pending), Some((Node::Drawing, _))) =
                    (self.drawings.last_mut(), self.stack.last())
                {
                    pending.inline = true;
                    pending.open_inline = Some(index);
                }
            }
            _ => {}
        }

        if !empty {
            self.stack.push((node, index));
        }
    }

    fn close(&mut self, index: usize) -> Option<InlineShape> {
        let (node, opened_at) = self.stack.pop()?;
        match node {
            Node::Paragraph => {
                self.paragraphs.pop();
            }
            Node::Run => {
                if let Some(paragraph) = self.paragraphs.last_mut() {
                    paragraph.current_run = None;
                }
            }
            Node::Inline => {
                if let Some(pending) = self
                    .drawings
                    .last_mut()
                    .filter(|p| p.open_inline == Some(opened_at))
                {
                    pending.open_inline = None;
                }
            }
            Node::Drawing => {
                let pending = self.drawings.pop()?;
                if !pending.inline {
                    // Floating (wp:anchor) drawings are not inline shapes.
                    return None;
                }
                let extent = match (pending.width, pending.height) {
                    (Some(w), Some(h)) => Some(Extent {
                        width: Emu(w),
                        height: Emu(h),
                    }),
                    _ => None,
                };
                return Some(InlineShape {
                    description: pending.description,
                    extent,
                    doc_pr_id: pending.doc_pr_id,
                    embed: pending.embed,
                    position: pending.position,
                    drawing: DrawingSpan {
                        start: pending.start,
                        end: index,
                    },
                    owner_run: pending.owner_run,
                });
            }
            _ => {}
        }
        None
    }

    /// Record shape properties, always on the innermost open drawing.
    fn inspect(&mut self, event: &Event<'static>) {
        let Some(pending) = self
            .drawings
            .last_mut()
            .filter(|p| p.open_inline.is_some())
        else {
            return;
        };
        let (Event::Start(e) | Event::Empty(e)) = event else {
            return;
        };
        // wp:extent and wp:docPr are direct children of wp:inline
        let child_of_inline = matches!(
            self.stack.last(),
            Some((Node::Inline, at)) if Some(*at) == pending.open_inline
        );
        match e.local_name().as_ref() {
            b"extent" if child_of_inline => {
                pending.width = attr(e, b"cx").and_then(|v| v.parse().ok());
                pending.height = attr(e, b"cy").and_then(|v| v.parse().ok());
            }
            b"docPr" if child_of_inline => {
                pending.description = attr(e, b"descr");
                pending.doc_pr_id = attr(e, b"id").and_then(|v| v.parse().ok());
            }
            b"blip" if pending.embed.is_none() => {
                pending.embed = attr(e, b"embed");
            }
            _ => {}
        }
    }
}

impl Iterator for InlineShapes<'_> {
    type Item = InlineShape;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.events.len() {
            let events = self.events;
            let index = self.pos;
            self.pos += 1;
            let event = &events[index];

            self.inspect(event);
            match event {
                Event::Start(_) | Event::Empty(_) => {
                    let empty = matches!(event, Event::Empty(_));
                    let node = qualified_name(event).map(Node::of).unwrap_or(Node::Other);
                    self.open(node, index, empty);
                }
                Event::End(_) => {
                    if let Some(shape) = self.close(index) {
                        return Some(shape);
                    }
                }
                _ => {}
            }
        }
        None
    }
}
