//! Core library crate: turns a week of conference records into a French `.docx` calendar.

pub mod compose;
pub mod config;
pub mod docx;
pub mod locale;
pub mod logging;
pub mod records;
pub mod render;
pub mod runtime;
pub mod style;

pub use compose::{compose_calendar, day_header_text, group_by_date};
pub use config::{
    ConfigError, ConfigLoadResult, ConfigSource, DocumentPreferences, FileConfig,
    RuntimeOverrides, RuntimePreferences, apply_runtime_overrides, config_directory, config_path,
    load_config, runtime_preferences_to_calendar, save_config,
};
pub use docx::{Document, PackageError, write_package};
pub use locale::{month_name, short_date, week_label, weekday_name};
pub use logging::{LoggingDestination, LoggingError, init_logging};
pub use records::{EventRecord, InputError, Participant, parse_records};
pub use render::render_event;
pub use runtime::{
    CalendarConfig, DocumentMetadata, GenerateError, GeneratedDocument, GenerationSummary,
    OutfileResolution, RunOutcome, StageProgressCallback, StageProgressEvent,
    StageProgressEventKind, generate_document, generate_from_str, resolve_outfile_path,
    run_with_config, run_with_config_with_progress,
};
