//! Typographic policy of the calendar report.
//!
//! These values are part of the report's visual identity and are not
//! configurable.

use crate::docx::{FontSize, LinkStyle, Rgb, RunProperties};

pub const REPORT_TITLE: &str = "Calendrier des conférences";

pub const TITLE_FONT: &str = "Tahoma";
pub const TITLE_COLOR: Rgb = Rgb::new(79, 113, 190);
pub const TITLE_SIZE: FontSize = FontSize::from_half_points(34);
pub const WEEK_LABEL_SIZE: FontSize = FontSize::from_half_points(26);

pub const DAY_HEADER_FONT: &str = "Arial";
pub const DAY_HEADER_COLOR: Rgb = Rgb::new(150, 29, 19);
pub const DAY_HEADER_SIZE: FontSize = FontSize::from_half_points(30);

pub const BODY_FONT: &str = "Calibri";
pub const BODY_SIZE: FontSize = FontSize::from_half_points(27);

pub const LINK_COLOR: Rgb = Rgb::new(82, 119, 132);
pub const METADATA_COLOR: Rgb = Rgb::new(47, 110, 186);

pub const EVENT_SEPARATOR: &str = "_________________________";

/// One inch, in twentieths of a point.
pub const PAGE_MARGIN_TWIPS: u32 = 1440;

pub const EVENT_LINK: LinkStyle<'static> = LinkStyle {
    font: BODY_FONT,
    size: BODY_SIZE,
    color: LINK_COLOR,
};

pub fn report_title() -> RunProperties {
    RunProperties::new()
        .font(TITLE_FONT)
        .bold()
        .color(TITLE_COLOR)
        .size(TITLE_SIZE)
}

pub fn week_label() -> RunProperties {
    RunProperties::new()
        .font(TITLE_FONT)
        .bold()
        .color(TITLE_COLOR)
        .size(WEEK_LABEL_SIZE)
}

pub fn day_header() -> RunProperties {
    RunProperties::new()
        .font(DAY_HEADER_FONT)
        .bold()
        .color(DAY_HEADER_COLOR)
        .size(DAY_HEADER_SIZE)
}

pub fn body() -> RunProperties {
    RunProperties::new().font(BODY_FONT).size(BODY_SIZE)
}

pub fn body_bold() -> RunProperties {
    body().bold()
}

pub fn metadata() -> RunProperties {
    body().italic().color(METADATA_COLOR)
}
