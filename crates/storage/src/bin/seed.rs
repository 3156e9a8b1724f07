use std::fmt;

use chrono::{DateTime, Duration, Utc};
use prep_core::model::{LedgerDocument, LedgerKey, PoolType, QuestionId, QuestionStatus};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    pool: PoolType,
    subject_id: String,
    chapter_id: String,
    questions: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPool { raw: String },
    InvalidQuestions { raw: String },
    InvalidNow { raw: String },
    Blank { flag: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPool { raw } => write!(f, "invalid --pool value: {raw}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
            ArgsError::Blank { flag } => write!(f, "{flag} cannot be blank"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    let value = args.next().ok_or(ArgsError::MissingValue { flag })?;
    if value.trim().is_empty() {
        return Err(ArgsError::Blank { flag });
    }
    Ok(value)
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PREP_DB_URL").unwrap_or_else(|_| "sqlite://prep.sqlite3".into());
        let mut pool = PoolType::MostWanted;
        let mut subject_id = "p11".to_string();
        let mut chapter_id = "demo_chapter".to_string();
        let mut questions = 12;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = require_value(&mut args, "--db")?,
                "--pool" => {
                    let value = require_value(&mut args, "--pool")?;
                    pool = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPool { raw: value.clone() })?;
                }
                "--subject" => subject_id = require_value(&mut args, "--subject")?,
                "--chapter" => chapter_id = require_value(&mut args, "--chapter")?,
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidQuestions { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            pool,
            subject_id,
            chapter_id,
            questions,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://prep.sqlite3)");
    eprintln!("  --pool <pool>             most-wanted | previous-year (default: most-wanted)");
    eprintln!("  --subject <code>          Subject code (default: p11)");
    eprintln!("  --chapter <id>            Chapter id (default: demo_chapter)");
    eprintln!("  --questions <n>           Number of question entries to write (default: 12)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PREP_DB_URL");
}

/// Cycles attempted-correct, attempted-wrong, seen, new; every fifth entry is bookmarked.
fn sample_document(questions: u32, now: DateTime<Utc>) -> LedgerDocument {
    let mut doc = LedgerDocument::new();
    for i in 0..questions {
        let id = QuestionId::new(format!("seed_q{}", i + 1));
        let at = now - Duration::minutes(i64::from(questions - i));
        match i % 4 {
            0 => doc.record_status(&id, QuestionStatus::Attempted, Some("A".into()), Some(true), at),
            1 => doc.record_status(&id, QuestionStatus::Attempted, Some("B".into()), Some(false), at),
            2 => doc.record_status(&id, QuestionStatus::Seen, None, None, at),
            _ => doc.record_status(&id, QuestionStatus::New, None, None, at),
        };
        if i % 5 == 0 {
            doc.toggle_bookmark(&id, at);
        }
    }
    doc
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);
    let key = LedgerKey::new(args.pool, args.subject_id.clone(), args.chapter_id.clone());

    let document = sample_document(args.questions, now);
    storage.ledger.save(&key, &document).await?;

    let stats = document.stats();
    println!(
        "Seeded {} entries ({} attempted, {} bookmarked) for {} into {}",
        document.len(),
        stats.attempted,
        stats.bookmarked,
        key,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
