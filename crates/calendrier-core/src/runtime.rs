use crate::compose::{compose_calendar, group_by_date};
use crate::config::{DEFAULT_CREATOR, DEFAULT_OUTPUT_FILE_NAME};
use crate::docx::{PackageError, write_package};
use crate::locale::week_label;
use crate::records::{EventRecord, InputError, parse_records};
use crate::style::REPORT_TITLE;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Input path that selects standard input.
pub const STDIN_INPUT: &str = "-";

const WORKING_DIR_ENV_VAR: &str = "CALENDRIER_WORKING_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub infile: String,
    pub outfile: Option<String>,
    pub output_directory: Option<String>,
    pub output_file_name: String,
    pub dry_run: bool,
    pub creator: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            infile: STDIN_INPUT.to_string(),
            outfile: None,
            output_directory: None,
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            dry_run: false,
            creator: DEFAULT_CREATOR.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Impossible de générer le document : {0}")]
    Package(#[from] PackageError),
    #[error("Impossible de lire {path} : {source}")]
    Read { path: String, source: io::Error },
    #[error("Impossible d'écrire {} : {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Document properties supplied by the caller so composition stays deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetadata {
    pub creator: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub days: usize,
    pub events: usize,
    pub hyperlinks: usize,
    pub bytes: usize,
    pub week_label: String,
}

#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    pub summary: GenerationSummary,
}

/// Compose `records` into a serialized `.docx` package.
pub fn generate_document(
    records: &[EventRecord],
    metadata: &DocumentMetadata,
) -> Result<GeneratedDocument, GenerateError> {
    let mut document = compose_calendar(records);
    document.properties.title = Some(REPORT_TITLE.to_string());
    document.properties.creator = metadata.creator.clone();
    document.properties.created = metadata.created;

    let bytes = write_package(&document)?;
    let dates: Vec<NaiveDate> = records.iter().map(|record| record.date).collect();
    let summary = GenerationSummary {
        days: group_by_date(records).len(),
        events: records.len(),
        hyperlinks: document.relationships().external().count(),
        bytes: bytes.len(),
        week_label: week_label(&dates),
    };
    debug!(?summary, "Generated document");

    Ok(GeneratedDocument { bytes, summary })
}

/// Parse JSON `text` and compose it.
pub fn generate_from_str(
    text: &str,
    metadata: &DocumentMetadata,
) -> Result<GeneratedDocument, GenerateError> {
    let records = parse_records(text)?;
    generate_document(&records, metadata)
}

/// Describes the resolved output file paths for the current configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OutfileResolution {
    /// Path that will be written.
    pub effective: PathBuf,
    /// Path derived from the output directory and default file name.
    pub default: PathBuf,
    /// Indicates whether the effective path originates from a user override.
    pub was_overridden: bool,
}

/// Resolve the effective and default output paths for a configuration.
///
/// Relative paths are anchored at the configured output directory, then at
/// `working_dir`, then at the `CALENDRIER_WORKING_DIR` environment variable.
pub fn resolve_outfile_path(config: &CalendarConfig, working_dir: Option<&Path>) -> OutfileResolution {
    let base = config
        .output_directory
        .as_deref()
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .map(expand_path)
        .or_else(|| resolve_working_dir(working_dir));
    let base = base.as_deref();

    let file_name = match config.output_file_name.trim() {
        "" => DEFAULT_OUTPUT_FILE_NAME,
        name => name,
    };
    let default = qualify_path(file_name, base);

    let override_path = config
        .outfile
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match override_path {
        Some(value) => OutfileResolution {
            effective: qualify_path(value, base),
            default,
            was_overridden: true,
        },
        None => OutfileResolution {
            effective: default.clone(),
            default,
            was_overridden: false,
        },
    }
}

fn resolve_working_dir(provided: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = provided {
        return Some(path.to_path_buf());
    }
    if let Ok(env_dir) = std::env::var(WORKING_DIR_ENV_VAR) {
        let trimmed = env_dir.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    None
}

fn expand_path(value: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(value).as_ref())
}

fn qualify_path(value: &str, base: Option<&Path>) -> PathBuf {
    let expanded = expand_path(value);
    match base {
        Some(base) if expanded.is_relative() => base.join(expanded),
        _ => expanded,
    }
}

pub type StageProgressCallback = Arc<dyn Fn(StageProgressEvent) + Send + Sync + 'static>;

#[derive(Debug, Clone, Serialize)]
pub struct StageProgressEvent {
    pub kind: StageProgressEventKind,
    pub stage: Option<String>,
    pub elapsed_ms: f64,
    pub stage_elapsed_ms: Option<f64>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageProgressEventKind {
    Begin,
    End,
    Note,
}

#[derive(Clone)]
struct StageLogger {
    program_start: Instant,
    stage_start: Instant,
    current_stage: Option<String>,
    callback: Option<StageProgressCallback>,
}

impl StageLogger {
    fn new(start: Instant, callback: Option<StageProgressCallback>) -> Self {
        Self {
            program_start: start,
            stage_start: start,
            current_stage: None,
            callback,
        }
    }

    fn begin(&mut self, name: &str) {
        let since_start = self.program_start.elapsed();
        info!(stage = name, elapsed_ms = %format_ms(since_start), "BEGIN");
        self.stage_start = Instant::now();
        self.current_stage = Some(name.to_string());
        self.emit(StageProgressEvent {
            kind: StageProgressEventKind::Begin,
            stage: Some(name.to_string()),
            elapsed_ms: since_start.as_secs_f64() * 1_000.0,
            stage_elapsed_ms: None,
            message: Some(format!("Starting {name}")),
        });
    }

    fn end(&mut self, name: &str) {
        let stage_elapsed = self.stage_start.elapsed();
        let total_elapsed = self.program_start.elapsed();
        info!(
            stage = name,
            elapsed_ms = %format_ms(total_elapsed),
            stage_ms = %format_ms(stage_elapsed),
            "END"
        );
        self.emit(StageProgressEvent {
            kind: StageProgressEventKind::End,
            stage: Some(name.to_string()),
            elapsed_ms: total_elapsed.as_secs_f64() * 1_000.0,
            stage_elapsed_ms: Some(stage_elapsed.as_secs_f64() * 1_000.0),
            message: Some(format!("Finished {name} (Δ {} ms)", format_ms(stage_elapsed))),
        });
        self.current_stage = None;
    }

    fn note(&mut self, message: impl Into<String>) {
        let text = message.into();
        info!("{text}");
        self.emit(StageProgressEvent {
            kind: StageProgressEventKind::Note,
            stage: self.current_stage.clone(),
            elapsed_ms: self.program_start.elapsed().as_secs_f64() * 1_000.0,
            stage_elapsed_ms: Some(self.stage_start.elapsed().as_secs_f64() * 1_000.0),
            message: Some(text),
        });
    }

    /// Close the current stage (if any) before bubbling `err` up.
    fn fail<E: std::fmt::Display>(&mut self, err: E) -> E {
        if let Some(stage) = self.current_stage.clone() {
            warn!(stage = %stage, error = %err, "Stage failed");
            self.end(&stage);
        }
        err
    }

    fn emit(&self, event: StageProgressEvent) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

fn format_ms(d: std::time::Duration) -> String {
    let ms = d.as_secs_f64() * 1_000.0;
    format!("{:.3}", ms)
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub outfile: OutfileResolution,
    pub summary: GenerationSummary,
    /// `false` for dry runs.
    pub written: bool,
}

pub fn run_with_config(config: CalendarConfig) -> Result<RunOutcome, GenerateError> {
    run(config, None)
}

pub fn run_with_config_with_progress(
    config: CalendarConfig,
    callback: StageProgressCallback,
) -> Result<RunOutcome, GenerateError> {
    run(config, Some(callback))
}

fn run(
    config: CalendarConfig,
    callback: Option<StageProgressCallback>,
) -> Result<RunOutcome, GenerateError> {
    let program_start = Instant::now();
    info!(
        started = %Local::now().format("%Y-%m-%dT%H:%M:%S%.6f %z"),
        infile = %config.infile,
        dry_run = config.dry_run,
        "Program start"
    );
    let mut logger = StageLogger::new(program_start, callback);

    logger.begin("Read input");
    let raw = read_input(&config.infile).map_err(|err| logger.fail(err))?;
    logger.note(format!("Read {} bytes from {}", raw.len(), describe_input(&config.infile)));
    logger.end("Read input");

    logger.begin("Parse records");
    let records = parse_records(&raw)
        .map_err(GenerateError::from)
        .map_err(|err| logger.fail(err))?;
    logger.note(format!("Parsed {} event(s)", records.len()));
    logger.end("Parse records");

    logger.begin("Compose document");
    let metadata = DocumentMetadata {
        creator: Some(config.creator.clone()),
        created: Some(Utc::now()),
    };
    let generated = generate_document(&records, &metadata).map_err(|err| logger.fail(err))?;
    logger.note(format!(
        "{}: {} day(s), {} event(s), {} hyperlink(s)",
        generated.summary.week_label,
        generated.summary.days,
        generated.summary.events,
        generated.summary.hyperlinks
    ));
    logger.end("Compose document");

    let outfile = resolve_outfile_path(&config, None);
    if outfile.was_overridden {
        logger.note(format!(
            "Output file: {} (override; default would be {})",
            outfile.effective.display(),
            outfile.default.display()
        ));
    } else {
        logger.note(format!("Output file: {}", outfile.effective.display()));
    }

    if config.dry_run {
        logger.note(format!(
            "Dry run: would write {} bytes to {}",
            generated.summary.bytes,
            outfile.effective.display()
        ));
        logger.note(format!(
            "[+{} ms] Program complete (dry run)",
            format_ms(program_start.elapsed())
        ));
        return Ok(RunOutcome {
            outfile,
            summary: generated.summary,
            written: false,
        });
    }

    logger.begin("Write output");
    write_output(&outfile.effective, &generated.bytes).map_err(|err| logger.fail(err))?;
    logger.end("Write output");

    logger.note(format!(
        "[+{} ms] Program complete",
        format_ms(program_start.elapsed())
    ));
    Ok(RunOutcome {
        outfile,
        summary: generated.summary,
        written: true,
    })
}

fn describe_input(infile: &str) -> String {
    if infile.trim() == STDIN_INPUT {
        "standard input".to_string()
    } else {
        shellexpand::tilde(infile.trim()).to_string()
    }
}

fn read_input(infile: &str) -> Result<String, GenerateError> {
    let trimmed = infile.trim();
    if trimmed == STDIN_INPUT {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| GenerateError::Read {
                path: "l'entrée standard".to_string(),
                source,
            })?;
        return Ok(buffer);
    }

    let expanded = shellexpand::tilde(trimmed).to_string();
    fs::read_to_string(&expanded).map_err(|source| GenerateError::Read {
        path: expanded,
        source,
    })
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), GenerateError> {
    let wrap = |source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, bytes).map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"[
        {"date": "2025-09-01", "title": "Rentrée", "link": "http://example.org/a"},
        {"date": "2025-09-01", "title": "Budget", "link": "ftp://example.org"},
        {"date": "2025-09-03", "title": "Défense", "link": "https://example.org/b"}
    ]"#;

    #[test]
    fn test_generate_from_str_summary() {
        let generated = generate_from_str(SAMPLE, &DocumentMetadata::default()).unwrap();
        assert_eq!(generated.summary.days, 2);
        assert_eq!(generated.summary.events, 3);
        assert_eq!(generated.summary.hyperlinks, 2);
        assert_eq!(generated.summary.bytes, generated.bytes.len());
        assert_eq!(
            generated.summary.week_label,
            "Semaine du 1 septembre au 5 septembre 2025"
        );
        assert_eq!(&generated.bytes[..2], b"PK");
    }

    #[test]
    fn test_generate_from_str_rejects_non_list() {
        let err = generate_from_str(r#"{"date": "2025-09-01"}"#, &DocumentMetadata::default())
            .unwrap_err();
        assert!(matches!(err, GenerateError::Input(InputError::NotAList)));
        assert_eq!(err.to_string(), "L'entrée doit être une liste de dictionnaires.");
    }

    #[test]
    fn test_resolve_outfile_path_default() {
        let config = CalendarConfig::default();
        let result = resolve_outfile_path(&config, Some(Path::new("/tmp/work")));
        assert_eq!(result.effective, PathBuf::from("/tmp/work/calendrier.docx"));
        assert_eq!(result.effective, result.default);
        assert!(!result.was_overridden);
    }

    #[test]
    fn test_resolve_outfile_path_prefers_output_directory() {
        let config = CalendarConfig {
            output_directory: Some("/srv/out".to_string()),
            output_file_name: "semaine.docx".to_string(),
            ..CalendarConfig::default()
        };
        let result = resolve_outfile_path(&config, Some(Path::new("/tmp/work")));
        assert_eq!(result.effective, PathBuf::from("/srv/out/semaine.docx"));
    }

    #[test]
    fn test_resolve_outfile_path_with_override() {
        let config = CalendarConfig {
            outfile: Some("custom.docx".to_string()),
            ..CalendarConfig::default()
        };
        let result = resolve_outfile_path(&config, Some(Path::new("/tmp/work")));
        assert_eq!(result.effective, PathBuf::from("/tmp/work/custom.docx"));
        assert_eq!(result.default, PathBuf::from("/tmp/work/calendrier.docx"));
        assert!(result.was_overridden);

        let config = CalendarConfig {
            outfile: Some("/abs/custom.docx".to_string()),
            ..CalendarConfig::default()
        };
        let result = resolve_outfile_path(&config, Some(Path::new("/tmp/work")));
        assert_eq!(result.effective, PathBuf::from("/abs/custom.docx"));
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let config = CalendarConfig {
            outfile: Some("  ".to_string()),
            ..CalendarConfig::default()
        };
        let result = resolve_outfile_path(&config, Some(Path::new("/tmp/work")));
        assert!(!result.was_overridden);
    }

    #[test]
    fn test_run_writes_file_and_reports_stages() {
        let temp = tempdir().unwrap();
        let infile = temp.path().join("events.json");
        fs::write(&infile, SAMPLE).unwrap();
        let outfile = temp.path().join("nested").join("out.docx");

        let config = CalendarConfig {
            infile: infile.to_string_lossy().to_string(),
            outfile: Some(outfile.to_string_lossy().to_string()),
            ..CalendarConfig::default()
        };

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: StageProgressCallback = Arc::new(move |event: StageProgressEvent| {
            if event.kind == StageProgressEventKind::Begin {
                sink.lock().unwrap().push(event.stage.unwrap_or_default());
            }
        });

        let outcome = run_with_config_with_progress(config, callback).unwrap();
        assert!(outcome.written);
        assert_eq!(outcome.outfile.effective, outfile);
        assert_eq!(fs::read(&outfile).unwrap().len(), outcome.summary.bytes);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["Read input", "Parse records", "Compose document", "Write output"]
        );
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let temp = tempdir().unwrap();
        let infile = temp.path().join("events.json");
        fs::write(&infile, "[]").unwrap();
        let outfile = temp.path().join("out.docx");

        let config = CalendarConfig {
            infile: infile.to_string_lossy().to_string(),
            outfile: Some(outfile.to_string_lossy().to_string()),
            dry_run: true,
            ..CalendarConfig::default()
        };
        let outcome = run_with_config(config).unwrap();
        assert!(!outcome.written);
        assert_eq!(outcome.summary.days, 0);
        assert!(!outfile.exists());
    }

    #[test]
    fn test_missing_input_is_read_error() {
        let temp = tempdir().unwrap();
        let config = CalendarConfig {
            infile: temp.path().join("absent.json").to_string_lossy().to_string(),
            ..CalendarConfig::default()
        };
        let err = run_with_config(config).unwrap_err();
        assert!(matches!(err, GenerateError::Read { .. }));
        assert!(err.to_string().starts_with("Impossible de lire "));
        assert!(err.to_string().contains("absent.json : "));
    }

    #[test]
    fn test_unwritable_output_is_french_write_error() {
        let temp = tempdir().unwrap();
        let infile = temp.path().join("evenements.json");
        fs::write(&infile, r#"[{"date": "2025-09-01"}]"#).unwrap();
        let blocker = temp.path().join("fichier");
        fs::write(&blocker, "").unwrap();

        let config = CalendarConfig {
            infile: infile.to_string_lossy().to_string(),
            output_directory: Some(blocker.join("sous-dossier").to_string_lossy().to_string()),
            ..CalendarConfig::default()
        };
        let err = run_with_config(config).unwrap_err();
        assert!(matches!(err, GenerateError::Write { .. }));
        assert!(err.to_string().starts_with("Impossible d'écrire "));
    }

    #[test]
    fn test_package_error_message_is_french() {
        let err = GenerateError::from(PackageError::InvalidChar {
            element: "w:t".to_string(),
            code: 0x1,
        });
        assert_eq!(
            err.to_string(),
            "Impossible de générer le document : caractère U+0001 interdit en XML dans <w:t>"
        );
    }

    #[test]
    fn test_parse_failure_ends_stage() {
        let temp = tempdir().unwrap();
        let infile = temp.path().join("events.json");
        fs::write(&infile, "   ").unwrap();

        let ends = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ends);
        let callback: StageProgressCallback = Arc::new(move |event: StageProgressEvent| {
            if event.kind == StageProgressEventKind::End {
                sink.lock().unwrap().push(event.stage.unwrap_or_default());
            }
        });

        let config = CalendarConfig {
            infile: infile.to_string_lossy().to_string(),
            ..CalendarConfig::default()
        };
        let err = run_with_config_with_progress(config, callback).unwrap_err();
        assert!(matches!(err, GenerateError::Input(InputError::Empty)));
        assert_eq!(*ends.lock().unwrap(), vec!["Read input", "Parse records"]);
    }
}
