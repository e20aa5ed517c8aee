//! kcap CLI - Command-line interface for Keystroke Capture
//!
//! Commands:
//! - replay: Feed a recorded host event stream through a fresh logger
//! - validate: Check a recorded host event stream against the host contract
//! - schema: Print the host event and summary schemas

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use keystroke_capture::keystroke::{parse_array, parse_ndjson, validate_feed, HostEvent};
use keystroke_capture::{
    CaptureConfig, CaptureError, CaptureField, InputSurface, KeystrokeLogger, KeystrokeSummary,
    PRODUCER_NAME, VERSION,
};

/// kcap - Keystroke timing capture for behavioral-biometric login signals
#[derive(Parser)]
#[command(name = "kcap")]
#[command(version = VERSION)]
#[command(about = "Replay and check recorded keystroke host events", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed recorded host events through a logger and print the summaries
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Field the logger is bound to (overrides the config file)
        #[arg(long)]
        field: Option<FieldArg>,

        /// Load logger configuration from a JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print output
        #[arg(long)]
        pretty: bool,

        /// Wrap each summary in a report with provenance
        #[arg(long)]
        report: bool,
    },

    /// Validate recorded host events
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one host event per line)
    Ndjson,
    /// JSON array of host events
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum FieldArg {
    /// The login form's password input
    Password,
    /// The extra-word challenge input
    ExtraWord,
}

impl From<FieldArg> for CaptureField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Password => CaptureField::Password,
            FieldArg::ExtraWord => CaptureField::ExtraWord,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Host event schema (replay input)
    Input,
    /// Keystroke summary schema (hidden field payload)
    Output,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), KcapCliError> {
    match cli.command {
        Commands::Replay {
            input,
            input_format,
            field,
            config,
            pretty,
            report,
        } => cmd_replay(
            &input,
            input_format,
            field,
            config.as_deref(),
            pretty,
            report,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_replay(
    input: &Path,
    input_format: InputFormat,
    field: Option<FieldArg>,
    config_path: Option<&Path>,
    pretty: bool,
    report: bool,
) -> Result<(), KcapCliError> {
    let events = read_events(input, &input_format)?;

    if events.is_empty() {
        return Err(KcapCliError::NoEvents);
    }

    if let Some(issue) = validate_feed(&events).into_iter().next() {
        return Err(KcapCliError::InvalidFeed {
            index: issue.index,
            message: issue.error.to_string(),
        });
    }

    let mut config = match config_path {
        Some(path) => CaptureConfig::from_json(&fs::read_to_string(path)?)?,
        None => CaptureConfig::default(),
    };
    if let Some(field) = field {
        config.field = field.into();
    }

    // The recording came from a page that had the input, so bind to it
    let surface = InputSurface::new(config.field.input_name());
    let mut logger = KeystrokeLogger::attach(Some(surface), config);

    let mut submissions = 0usize;
    for event in &events {
        if let Some(summary) = logger.apply(event) {
            submissions += 1;
            print_summary(&logger, summary, pretty, report)?;
        }
    }

    if submissions == 0 {
        print_summary(&logger, logger.summary(), pretty, report)?;
    }

    info!(
        events = events.len(),
        submissions,
        "Replay finished"
    );

    Ok(())
}

fn print_summary(
    logger: &KeystrokeLogger,
    summary: KeystrokeSummary,
    pretty: bool,
    report: bool,
) -> Result<(), KcapCliError> {
    let output = if report {
        let report = ReplayReport {
            generated_at: Utc::now(),
            session_id: logger.session_id().to_string(),
            field: logger.config().field,
            producer: PRODUCER_NAME.to_string(),
            version: VERSION.to_string(),
            summary,
        };
        to_json(&report, pretty)?
    } else {
        to_json(&summary, pretty)?
    };

    println!("{}", output);
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), KcapCliError> {
    let events = read_events(input, &input_format)?;
    let issues = validate_feed(&events);

    let report = ValidationReport {
        total_events: events.len(),
        invalid_events: issues.len(),
        submissions: events
            .iter()
            .filter(|event| matches!(event, HostEvent::Submit))
            .count(),
        errors: issues
            .iter()
            .map(|issue| ValidationErrorDetail {
                index: issue.index,
                error: issue.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events:   {}", report.total_events);
        println!("Invalid events: {}", report.invalid_events);
        println!("Submissions:    {}", report.submissions);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Event at index {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_events > 0 {
        Err(KcapCliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), KcapCliError> {
    let schema = match schema_type {
        SchemaType::Input => input_json_schema(),
        SchemaType::Output => output_json_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

// Helper functions

fn read_events(input: &Path, input_format: &InputFormat) -> Result<Vec<HostEvent>, KcapCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("Reading host events from stdin (end with Ctrl-D)");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let events = match input_format {
        InputFormat::Ndjson => parse_ndjson(&input_data)?,
        InputFormat::Json => parse_array(&input_data)?,
    };

    Ok(events)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, KcapCliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn input_json_schema() -> serde_json::Value {
    let timed = |name: &str, payload: &str| {
        serde_json::json!({
            "type": "object",
            "required": ["event", payload, "now"],
            "properties": {
                "event": { "const": name },
                payload: { "type": "string" },
                "now": {
                    "type": "number",
                    "minimum": 0,
                    "description": "Monotonic clock reading in milliseconds"
                }
            }
        })
    };

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "keystroke host event",
        "description": "One event pushed by the host to a keystroke logger",
        "oneOf": [
            timed("key_down", "key"),
            timed("key_up", "key"),
            timed("value_changed", "value"),
            {
                "type": "object",
                "required": ["event"],
                "properties": { "event": { "const": "submit" } }
            }
        ]
    })
}

fn output_json_schema() -> serde_json::Value {
    let millis = serde_json::json!({ "type": "number" });
    let nullable_millis = serde_json::json!({ "type": ["number", "null"] });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "keystroke summary",
        "description": "Payload of the keystrokeData hidden field",
        "type": "object",
        "required": ["keystrokes", "totalTime"],
        "properties": {
            "keystrokes": {
                "type": "array",
                "items": {
                    "oneOf": [
                        {
                            "type": "object",
                            "required": ["type", "timestamp", "down_down"],
                            "properties": {
                                "type": { "const": "down" },
                                "timestamp": millis,
                                "down_down": nullable_millis
                            }
                        },
                        {
                            "type": "object",
                            "required": ["type", "timestamp", "dwellTime"],
                            "properties": {
                                "type": { "const": "up" },
                                "timestamp": millis,
                                "dwellTime": nullable_millis
                            }
                        },
                        {
                            "type": "object",
                            "required": ["type", "timestamp", "len"],
                            "properties": {
                                "type": { "const": "insert" },
                                "timestamp": millis,
                                "len": { "type": "integer", "minimum": 1 }
                            }
                        }
                    ]
                }
            },
            "totalTime": millis
        }
    })
}

// Error types

#[derive(Debug)]
enum KcapCliError {
    Io(io::Error),
    Capture(CaptureError),
    Json(serde_json::Error),
    NoEvents,
    InvalidFeed { index: usize, message: String },
    ValidationFailed(usize),
}

impl From<io::Error> for KcapCliError {
    fn from(e: io::Error) -> Self {
        KcapCliError::Io(e)
    }
}

impl From<CaptureError> for KcapCliError {
    fn from(e: CaptureError) -> Self {
        KcapCliError::Capture(e)
    }
}

impl From<serde_json::Error> for KcapCliError {
    fn from(e: serde_json::Error) -> Self {
        KcapCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<KcapCliError> for CliError {
    fn from(e: KcapCliError) -> Self {
        match e {
            KcapCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            KcapCliError::Capture(e @ CaptureError::InvalidConfig(_)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run with an empty config ({}) to use the defaults".to_string()),
            },
            KcapCliError::Capture(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'kcap schema input' for the host event format".to_string()),
            },
            KcapCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            KcapCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No host events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            KcapCliError::InvalidFeed { index, message } => CliError {
                code: "INVALID_FEED".to_string(),
                message: format!("Event at index {}: {}", index, message),
                hint: Some("Run 'kcap validate' for details".to_string()),
            },
            KcapCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} events failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ReplayReport {
    generated_at: DateTime<Utc>,
    session_id: String,
    field: CaptureField,
    producer: String,
    version: String,
    summary: KeystrokeSummary,
}

#[derive(Serialize)]
struct ValidationReport {
    total_events: usize,
    invalid_events: usize,
    submissions: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
}
