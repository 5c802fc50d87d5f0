//! Assembly of the full calendar document.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::docx::{Alignment, Document, Paragraph};
use crate::locale::{short_date, week_label, weekday_name};
use crate::records::EventRecord;
use crate::render::render_event;
use crate::style;

/// Events bucketed by date, ascending, each bucket in input order.
pub fn group_by_date(events: &[EventRecord]) -> BTreeMap<NaiveDate, Vec<&EventRecord>> {
    let mut days: BTreeMap<NaiveDate, Vec<&EventRecord>> = BTreeMap::new();
    for event in events {
        days.entry(event.date).or_default().push(event);
    }
    days
}

/// `"{weekday} {day} {month}"`, e.g. `"Lundi 1 septembre"`.
pub fn day_header_text(date: NaiveDate) -> String {
    format!("{} {}", weekday_name(date), short_date(date))
}

/// Build the calendar for `events`.
///
/// The document starts with the title block (report title and week label),
/// followed by one section per distinct date in ascending order. Days are
/// separated by an empty paragraph.
pub fn compose_calendar(events: &[EventRecord]) -> Document {
    let mut document = Document::new();
    for section in document.sections_mut() {
        section.set_uniform_margins(style::PAGE_MARGIN_TWIPS);
    }

    let dates: Vec<NaiveDate> = events.iter().map(|event| event.date).collect();
    let label = week_label(&dates);
    document.add_paragraph(title_block(&label));

    let days = group_by_date(events);
    info!(
        events = events.len(),
        days = days.len(),
        week = %label,
        "Composing calendar"
    );

    let day_count = days.len();
    for (day_index, (date, day_events)) in days.into_iter().enumerate() {
        let mut header = Paragraph::aligned(Alignment::Center);
        header.add_text(day_header_text(date), style::day_header());
        document.add_paragraph(header);
        debug!(%date, events = day_events.len(), "Rendering day");

        for (index, event) in day_events.iter().enumerate() {
            render_event(&mut document, event, index, day_events.len());
        }

        if day_index + 1 < day_count {
            document.add_paragraph(Paragraph::new());
        }
    }

    document
}

fn title_block(week: &str) -> Paragraph {
    let mut paragraph = Paragraph::aligned(Alignment::Center);
    paragraph.add_text(style::REPORT_TITLE.to_uppercase(), style::report_title());
    paragraph.add_break();
    paragraph.add_text(week, style::week_label());
    paragraph
}
