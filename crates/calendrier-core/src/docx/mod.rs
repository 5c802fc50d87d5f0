//! A deliberately small WordprocessingML model.
//!
//! Only what the calendar report needs is modelled: paragraphs with an
//! optional alignment, runs carrying direct formatting, line breaks, external
//! hyperlinks and one section. [`package`] turns a [`Document`] into the
//! bytes of a `.docx` archive.

pub mod hyperlink;
pub mod package;
pub mod relationships;

use chrono::{DateTime, Utc};

pub use hyperlink::{LinkStyle, add_hyperlink, hyperlink_node};
pub use package::{PackageError, write_package};
pub use relationships::{
    HYPERLINK_RELATIONSHIP, Relationship, RelationshipId, RelationshipRegistry, Relationships,
    TargetMode,
};

/// Whether `c` matches the XML 1.0 `Char` production.
///
/// Tab, line feed and carriage return are the only allowed controls.
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}')
        || c >= '\u{10000}'
}

/// 24-bit color, serialized as `RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Font size in half points, the unit of `w:sz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontSize(u32);

impl FontSize {
    pub const fn from_half_points(half_points: u32) -> Self {
        Self(half_points)
    }

    /// Rounded to the nearest half point; negative sizes clamp to zero.
    pub fn from_points(points: f32) -> Self {
        Self((points * 2.0).round().max(0.0) as u32)
    }

    pub const fn half_points(self) -> u32 {
        self.0
    }

    pub fn points(self) -> f32 {
        self.0 as f32 / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Center,
    Justify,
}

impl Alignment {
    /// Value of the `w:jc` element.
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Center => "center",
            Alignment::Justify => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Underline {
    Single,
}

impl Underline {
    pub fn as_str(self) -> &'static str {
        match self {
            Underline::Single => "single",
        }
    }
}

/// Direct run formatting (`w:rPr`). `None` / `false` leaves the style default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProperties {
    pub font: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Rgb>,
    pub size: Option<FontSize>,
    pub underline: Option<Underline>,
}

impl RunProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both the ASCII and high-ANSI font slots.
    pub fn font(mut self, family: impl Into<String>) -> Self {
        self.font = Some(family.into());
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn size(mut self, size: FontSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn underline(mut self, underline: Underline) -> Self {
        self.underline = Some(underline);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    Text(String),
    Break,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub properties: RunProperties,
    pub content: Vec<RunContent>,
}

impl Run {
    pub fn new(text: impl Into<String>, properties: RunProperties) -> Self {
        Self {
            properties,
            content: vec![RunContent::Text(text.into())],
        }
    }

    /// An unformatted run holding a single line break (`w:br`).
    pub fn line_break() -> Self {
        Self {
            properties: RunProperties::default(),
            content: vec![RunContent::Break],
        }
    }

    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|item| match item {
                RunContent::Text(text) => text.as_str(),
                RunContent::Break => "\n",
            })
            .collect()
    }
}

/// `w:hyperlink`: runs bound to a relationship of the document part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    pub relationship: RelationshipId,
    pub runs: Vec<Run>,
}

impl Hyperlink {
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphChild {
    Run(Run),
    Hyperlink(Hyperlink),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub alignment: Option<Alignment>,
    pub children: Vec<ParagraphChild>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aligned(alignment: Alignment) -> Self {
        Self {
            alignment: Some(alignment),
            children: Vec::new(),
        }
    }

    pub fn add_run(&mut self, run: Run) -> &mut Self {
        self.children.push(ParagraphChild::Run(run));
        self
    }

    pub fn add_text(&mut self, text: impl Into<String>, properties: RunProperties) -> &mut Self {
        self.add_run(Run::new(text, properties))
    }

    pub fn add_break(&mut self) -> &mut Self {
        self.add_run(Run::line_break())
    }

    pub fn add_hyperlink_node(&mut self, hyperlink: Hyperlink) -> &mut Self {
        self.children.push(ParagraphChild::Hyperlink(hyperlink));
        self
    }

    /// Runs that are direct children, skipping those nested in hyperlinks.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(|child| match child {
            ParagraphChild::Run(run) => Some(run),
            ParagraphChild::Hyperlink(_) => None,
        })
    }

    pub fn hyperlinks(&self) -> impl Iterator<Item = &Hyperlink> {
        self.children.iter().filter_map(|child| match child {
            ParagraphChild::Hyperlink(link) => Some(link),
            ParagraphChild::Run(_) => None,
        })
    }

    /// Visible text, with line breaks rendered as `\n`.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .map(|child| match child {
                ParagraphChild::Run(run) => run.text(),
                ParagraphChild::Hyperlink(link) => link.text(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Page margins in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMargins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
    pub header: u32,
    pub footer: u32,
    pub gutter: u32,
}

/// `w:sectPr`. Defaults to US Letter with 1" top/bottom and 1.25" side margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionProperties {
    pub page_width: u32,
    pub page_height: u32,
    pub margins: PageMargins,
}

impl Default for SectionProperties {
    fn default() -> Self {
        Self {
            page_width: 12240,
            page_height: 15840,
            margins: PageMargins {
                top: 1440,
                right: 1800,
                bottom: 1440,
                left: 1800,
                header: 720,
                footer: 720,
                gutter: 0,
            },
        }
    }
}

impl SectionProperties {
    pub fn set_uniform_margins(&mut self, twips: u32) {
        self.margins.top = twips;
        self.margins.right = twips;
        self.margins.bottom = twips;
        self.margins.left = twips;
    }
}

/// Fields written to `docProps/core.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

/// The main document part together with its relationship table.
#[derive(Debug, Clone)]
pub struct Document {
    body: Vec<Paragraph>,
    sections: Vec<SectionProperties>,
    relationships: Relationships,
    pub properties: CoreProperties,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            body: Vec::new(),
            sections: vec![SectionProperties::default()],
            relationships: Relationships::new(),
            properties: CoreProperties::default(),
        }
    }

    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.body.push(paragraph);
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.body
    }

    pub fn sections(&self) -> &[SectionProperties] {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut [SectionProperties] {
        &mut self.sections
    }

    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// The registry that hyperlinks of this part are related through.
    pub fn relationships_mut(&mut self) -> &mut Relationships {
        &mut self.relationships
    }
}
