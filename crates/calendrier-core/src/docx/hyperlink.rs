//! Clickable text runs bound to an external URL.
//!
//! Emission is split in two: the registry call that mints a relationship id,
//! and [`hyperlink_node`], which only builds markup from that id.

use super::relationships::{HYPERLINK_RELATIONSHIP, RelationshipId, RelationshipRegistry};
use super::{FontSize, Hyperlink, Paragraph, Rgb, Run, RunProperties, Underline};

/// Font, size and color applied to a hyperlink run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStyle<'a> {
    pub font: &'a str,
    pub size: FontSize,
    pub color: Rgb,
}

impl LinkStyle<'_> {
    /// Link runs are always underlined on top of the style's font, size and color.
    pub fn run_properties(&self) -> RunProperties {
        RunProperties::new()
            .font(self.font)
            .color(self.color)
            .size(self.size)
            .underline(Underline::Single)
    }
}

/// Builds a `w:hyperlink` holding one styled run of `text`.
pub fn hyperlink_node(relationship: RelationshipId, text: &str, style: &LinkStyle<'_>) -> Hyperlink {
    Hyperlink {
        relationship,
        runs: vec![Run::new(text, style.run_properties())],
    }
}

/// Relates `url` through `registry` and appends a clickable run to `paragraph`.
pub fn add_hyperlink<R>(
    registry: &mut R,
    paragraph: &mut Paragraph,
    text: &str,
    url: &str,
    style: &LinkStyle<'_>,
) -> RelationshipId
where
    R: RelationshipRegistry + ?Sized,
{
    let id = registry.relate_external(url, HYPERLINK_RELATIONSHIP);
    paragraph.add_hyperlink_node(hyperlink_node(id.clone(), text, style));
    id
}
