//! Rendering of a single event into document paragraphs.

use tracing::{debug, trace};

use crate::docx::{Alignment, Document, Paragraph, RunProperties, add_hyperlink};
use crate::records::{EventRecord, participants_summary};
use crate::style;

pub const PARTICIPANTS_LABEL: &str = "Participants : ";
pub const PARTICIPANT_SEPARATOR: &str = " ; ";

/// Append the paragraphs for `event`, the `index`-th of `day_len` events on its day.
///
/// A centered separator follows every event but the last of the day.
pub fn render_event(document: &mut Document, event: &EventRecord, index: usize, day_len: usize) {
    let mut heading = Paragraph::new();
    match event.hyperlink_target() {
        Some(url) => {
            let id = add_hyperlink(
                document.relationships_mut(),
                &mut heading,
                event.title(),
                url,
                &style::EVENT_LINK,
            );
            debug!(title = event.title(), url, relationship = %id, "Linked event title");
        }
        None => {
            if event.link.is_some() {
                debug!(
                    title = event.title(),
                    link = event.link.as_deref(),
                    "Link does not start with http; rendering plain title"
                );
            }
            heading.add_text(event.title(), style::body());
        }
    }
    heading.add_break();
    heading.add_text(event.metadata_line(), style::metadata());
    document.add_paragraph(heading);

    let mut description = Paragraph::aligned(Alignment::Justify);
    description.add_text(event.description(), style::body());
    document.add_paragraph(description);

    if let Some(participants) = participants_paragraph(event) {
        trace!(summary = %participants_summary(&event.participants), "Participants");
        document.add_paragraph(participants);
    }

    if index + 1 < day_len {
        let mut separator = Paragraph::aligned(Alignment::Center);
        separator.add_text(style::EVENT_SEPARATOR, RunProperties::new());
        document.add_paragraph(separator);
    }
}

/// Bold label and names, plain job titles, `" ; "` between participants.
fn participants_paragraph(event: &EventRecord) -> Option<Paragraph> {
    if event.participants.is_empty() {
        return None;
    }

    let mut paragraph = Paragraph::aligned(Alignment::Justify);
    paragraph.add_text(PARTICIPANTS_LABEL, style::body_bold());

    let last = event.participants.len() - 1;
    for (position, participant) in event.participants.iter().enumerate() {
        paragraph.add_text(participant.name(), style::body_bold());
        if let Some(job) = participant.job() {
            paragraph.add_text(format!(", {job}"), style::body());
        }
        if position < last {
            paragraph.add_text(PARTICIPANT_SEPARATOR, style::body());
        }
    }

    Some(paragraph)
}
