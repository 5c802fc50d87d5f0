//! Event records and the structured-data boundary that produces them.
//!
//! Input is JSON: a top-level array of objects. Nothing in the input is ever
//! evaluated, only deserialized.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::docx::is_xml_char;

/// Errors raised while turning raw input text into event records.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Veuillez entrer une liste de dictionnaires.")]
    Empty,
    #[error("L'entrée doit être une liste de dictionnaires.")]
    NotAList,
    #[error("Erreur dans l'analyse des données : {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("Erreur dans l'analyse des données : événement n°{position} : {source}")]
    Record {
        position: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Optional text fields that fall back to a fixed placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    ThinkTank,
    Location,
    Hour,
    Description,
    ParticipantName,
}

impl Field {
    pub const fn placeholder(self) -> &'static str {
        match self {
            Field::Title => "Titre non spécifié",
            Field::ThinkTank => "Think tank non spécifié",
            Field::Location => "Localisation non spécifiée",
            Field::Hour => "Heure non spécifiée",
            Field::Description => "Description non disponible",
            Field::ParticipantName => "Nom non spécifié",
        }
    }
}

/// Summary text used when an event lists nobody.
pub const NO_PARTICIPANTS: &str = "Participants non spécifiés";

/// Returns the value, or the field's placeholder when it is absent or blank.
pub fn resolve_or_default(value: Option<&str>, field: Field) -> &str {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => field.placeholder(),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventRecord {
    #[serde(deserialize_with = "deserialize_event_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub link: Option<String>,
    #[serde(
        default,
        rename = "think-tank",
        alias = "think_tank",
        deserialize_with = "deserialize_text"
    )]
    pub think_tank: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub hour: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_participants")]
    pub participants: Vec<Participant>,
}

impl EventRecord {
    /// A record carrying only its date; every other field resolves to a placeholder.
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            title: None,
            link: None,
            think_tank: None,
            location: None,
            hour: None,
            description: None,
            participants: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        resolve_or_default(self.title.as_deref(), Field::Title)
    }

    /// The link, but only when it looks like a web address.
    pub fn hyperlink_target(&self) -> Option<&str> {
        self.link
            .as_deref()
            .filter(|link| link.starts_with("http"))
    }

    pub fn think_tank(&self) -> &str {
        resolve_or_default(self.think_tank.as_deref(), Field::ThinkTank)
    }

    pub fn location(&self) -> &str {
        resolve_or_default(self.location.as_deref(), Field::Location)
    }

    /// Hour text with hyphenated ranges rewritten to use a dash.
    pub fn hour(&self) -> String {
        resolve_or_default(self.hour.as_deref(), Field::Hour).replace('-', "—")
    }

    pub fn description(&self) -> &str {
        resolve_or_default(self.description.as_deref(), Field::Description)
    }

    /// `"{think-tank} — {location}. {hour}"`
    pub fn metadata_line(&self) -> String {
        format!("{} — {}. {}", self.think_tank(), self.location(), self.hour())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Participant {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub job: Option<String>,
}

impl Participant {
    pub fn name(&self) -> &str {
        resolve_or_default(self.name.as_deref(), Field::ParticipantName)
    }

    /// Trimmed job title, or `None` when there is nothing to show.
    pub fn job(&self) -> Option<&str> {
        self.job
            .as_deref()
            .map(str::trim)
            .filter(|job| !job.is_empty())
    }
}

/// Plain-text rendition of a participant list: `"A, X ; B"`.
pub fn participants_summary(participants: &[Participant]) -> String {
    if participants.is_empty() {
        return NO_PARTICIPANTS.to_string();
    }

    participants
        .iter()
        .map(|participant| match participant.job() {
            Some(job) => format!("{}, {}", participant.name(), job),
            None => participant.name().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ; ")
}

/// Parse a JSON array of event objects.
pub fn parse_records(input: &str) -> Result<Vec<EventRecord>, InputError> {
    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    if input.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let value: Value = serde_json::from_str(input).map_err(InputError::Syntax)?;
    let Value::Array(items) = value else {
        return Err(InputError::NotAList);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| InputError::Record {
                position: index + 1,
                source,
            })
        })
        .collect()
}

fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|datetime| datetime.date())
}

fn deserialize_event_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_event_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "date invalide '{raw}' (formats acceptés : AAAA-MM-JJ, AAAA-MM-JJTHH:MM[:SS])"
        ))
    })
}

/// Scalars accepted wherever text is expected.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<TextValue>::deserialize(deserializer)?;
    let text = value.map(|value| match value {
        TextValue::Text(text) => text,
        TextValue::Integer(number) => number.to_string(),
        TextValue::Float(number) => number.to_string(),
        TextValue::Bool(flag) => flag.to_string(),
    });
    let forbidden = text
        .as_deref()
        .and_then(|text| text.chars().find(|&c| !is_xml_char(c)));
    if let Some(c) = forbidden {
        return Err(serde::de::Error::custom(format!(
            "caractère U+{:04X} interdit dans le texte",
            c as u32
        )));
    }
    Ok(text)
}

fn deserialize_participants<'de, D>(deserializer: D) -> Result<Vec<Participant>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Participant>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let input = r#"[{
            "date": "2025-09-01",
            "title": "Rentrée",
            "link": "https://example.org/rentree",
            "think-tank": "IFRI",
            "location": "Paris",
            "hour": "10h-12h",
            "description": "Conférence de rentrée.",
            "participants": [{"name": "A", "job": " X "}, {"name": "B"}]
        }]"#;

        let records = parse_records(input).expect("valid input");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(record.title(), "Rentrée");
        assert_eq!(record.hyperlink_target(), Some("https://example.org/rentree"));
        assert_eq!(record.metadata_line(), "IFRI — Paris. 10h—12h");
        assert_eq!(record.participants[0].job(), Some("X"));
        assert_eq!(record.participants[1].job(), None);
    }

    #[test]
    fn test_missing_fields_resolve_to_placeholders() {
        let records = parse_records(r#"[{"date": "2025-09-01"}]"#).unwrap();
        let record = &records[0];
        assert_eq!(record.title(), "Titre non spécifié");
        assert_eq!(record.description(), "Description non disponible");
        assert_eq!(
            record.metadata_line(),
            "Think tank non spécifié — Localisation non spécifiée. Heure non spécifiée"
        );
        assert!(record.participants.is_empty());
        assert_eq!(record.hyperlink_target(), None);
    }

    #[test]
    fn test_blank_and_null_fields_count_as_missing() {
        let input = r#"[{"date": "2025-09-01", "description": "   ", "title": null,
                         "participants": null}]"#;
        let record = &parse_records(input).unwrap()[0];
        assert_eq!(record.description(), Field::Description.placeholder());
        assert_eq!(record.title(), Field::Title.placeholder());
        assert!(record.participants.is_empty());
    }

    #[test]
    fn test_participant_without_name() {
        let participant = Participant {
            name: None,
            job: Some("Chercheuse".to_string()),
        };
        assert_eq!(participant.name(), "Nom non spécifié");
    }

    #[test]
    fn test_link_requires_http_prefix() {
        let mut record = EventRecord::on(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        record.link = Some("not-a-url".to_string());
        assert_eq!(record.hyperlink_target(), None);
        record.link = Some("http://example.org".to_string());
        assert_eq!(record.hyperlink_target(), Some("http://example.org"));
    }

    #[test]
    fn test_scalar_fields_are_stringified() {
        let input = r#"[{"date": "2025-09-01", "hour": 14, "think_tank": "Alias"}]"#;
        let record = &parse_records(input).unwrap()[0];
        assert_eq!(record.hour(), "14");
        assert_eq!(record.think_tank(), "Alias");
    }

    #[test]
    fn test_datetime_values_collapse_to_dates() {
        let input = r#"[{"date": "2025-09-01T18:30"}, {"date": "2025-09-01 09:00:00"}]"#;
        let records = parse_records(input).unwrap();
        assert_eq!(records[0].date, records[1].date);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let records = parse_records(r#"[{"date": "2025-09-01", "event": "Rentrée"}]"#).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_records("  \n"), Err(InputError::Empty)));
    }

    #[test]
    fn test_top_level_must_be_a_list() {
        let err = parse_records(r#"{"date": "2025-09-01"}"#).unwrap_err();
        assert!(matches!(err, InputError::NotAList));
        assert_eq!(
            err.to_string(),
            "L'entrée doit être une liste de dictionnaires."
        );
    }

    #[test]
    fn test_syntax_error_mentions_cause() {
        let err = parse_records("[{").unwrap_err();
        assert!(matches!(err, InputError::Syntax(_)));
        assert!(err.to_string().starts_with("Erreur dans l'analyse des données : "));
    }

    #[test]
    fn test_missing_date_reports_position() {
        let err = parse_records(r#"[{"date": "2025-09-01"}, {"title": "Sans date"}]"#)
            .unwrap_err();
        match err {
            InputError::Record { position, .. } => assert_eq!(position, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let err = parse_records(r#"[{"date": "01/09/2025"}]"#).unwrap_err();
        assert!(err.to_string().contains("date invalide"));
    }

    #[test]
    fn test_control_character_reports_position() {
        let input = r#"[{"date": "2025-09-01"}, {"date": "2025-09-02", "title": "Bonjour\u0001monde"}]"#;
        match parse_records(input).unwrap_err() {
            InputError::Record { position, source } => {
                assert_eq!(position, 2);
                assert!(source.to_string().contains("U+0001"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_control_character_in_participant_is_rejected() {
        let input =
            r#"[{"date": "2025-09-01", "participants": [{"name": "A\u000bB", "job": "X"}]}]"#;
        assert!(matches!(
            parse_records(input),
            Err(InputError::Record { position: 1, .. })
        ));
    }

    #[test]
    fn test_tab_and_newline_are_accepted() {
        let records =
            parse_records(r#"[{"date": "2025-09-01", "description": "a\tb\nc\r\nd"}]"#).unwrap();
        assert_eq!(records[0].description.as_deref(), Some("a\tb\nc\r\nd"));
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let records = parse_records("\u{FEFF}[{\"date\": \"2025-09-01\"}]").unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(
            parse_records("\u{FEFF}  "),
            Err(InputError::Empty)
        ));
    }

    #[test]
    fn test_participants_summary() {
        let participants = vec![
            Participant {
                name: Some("A".to_string()),
                job: Some("X".to_string()),
            },
            Participant {
                name: Some("B".to_string()),
                job: None,
            },
        ];
        assert_eq!(participants_summary(&participants), "A, X ; B");
        assert_eq!(participants_summary(&[]), NO_PARTICIPANTS);
    }
}
