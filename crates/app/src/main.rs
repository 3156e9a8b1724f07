mod test_session;

use std::fmt;
use std::str::FromStr;

use prep_core::model::{
    ApiSettingsDraft, AuthState, ClassLevel, Difficulty, ExamType, LedgerKey, PoolType, Subject,
    SubjectCode,
};
use services::test_flow::ChapterList;
use services::{AppServices, Clock, TestFlowError, TestWizard};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str, command: Command },
    UnknownArg(String),
    InvalidValue { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag, command } => {
                write!(f, "{} requires {flag}", command.name())
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_value<T: FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidValue { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  prep login | logout | whoami");
    eprintln!("  prep totals    --pool <most-wanted|pyq> --class <11|12>");
    eprintln!("  prep chapters  --subject <name> --class <11|12>");
    eprintln!("  prep progress  --pool <pool> --subject <name> --class <11|12> --chapter <id>");
    eprintln!("  prep clear     --pool <pool> --subject <name> --class <11|12> --chapter <id>");
    eprintln!("  prep bookmarks | overview");
    eprintln!("  prep test      --subject <name> --class <11|12> --chapter <id|name>... --name <text>");
    eprintln!("                 [--questions 15|30|45|60] [--minutes 30|60|90|120]");
    eprintln!("                 [--difficulty easy|medium|hard] [--exam neet|aipmt|aiims]");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>   (default sqlite://prep.sqlite3)");
    eprintln!("  --api-url <url>     --timeout <secs>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PREP_DB_URL, PREP_API_URL, PREP_API_TIMEOUT_SECS, PREP_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Login,
    Logout,
    Whoami,
    Totals,
    Chapters,
    Progress,
    Bookmarks,
    Overview,
    Clear,
    Test,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "login" => Some(Self::Login),
            "logout" => Some(Self::Logout),
            "whoami" => Some(Self::Whoami),
            "totals" => Some(Self::Totals),
            "chapters" => Some(Self::Chapters),
            "progress" => Some(Self::Progress),
            "bookmarks" => Some(Self::Bookmarks),
            "overview" => Some(Self::Overview),
            "clear" => Some(Self::Clear),
            "test" => Some(Self::Test),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Whoami => "whoami",
            Self::Totals => "totals",
            Self::Chapters => "chapters",
            Self::Progress => "progress",
            Self::Bookmarks => "bookmarks",
            Self::Overview => "overview",
            Self::Clear => "clear",
            Self::Test => "test",
        }
    }
}

struct Args {
    command: Command,
    db_url: String,
    api: ApiSettingsDraft,
    pool: Option<PoolType>,
    subject: Option<Subject>,
    class: Option<ClassLevel>,
    chapters: Vec<String>,
    name: Option<String>,
    questions: Option<u32>,
    minutes: Option<u32>,
    difficulty: Option<Difficulty>,
    exam: Option<ExamType>,
}

impl Args {
    fn parse(command: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            command,
            db_url: std::env::var("PREP_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://prep.sqlite3".into(), normalize_sqlite_url),
            api: ApiSettingsDraft {
                base_url: std::env::var("PREP_API_URL").ok(),
                timeout_secs: std::env::var("PREP_API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|value| value.parse::<u64>().ok()),
            },
            pool: None,
            subject: None,
            class: None,
            chapters: Vec::new(),
            name: None,
            questions: None,
            minutes: None,
            difficulty: None,
            exam: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--api-url" => parsed.api.base_url = Some(require_value(args, "--api-url")?),
                "--timeout" => parsed.api.timeout_secs = Some(parse_value(args, "--timeout")?),
                "--pool" => parsed.pool = Some(parse_value(args, "--pool")?),
                "--subject" => parsed.subject = Some(parse_value(args, "--subject")?),
                "--class" => parsed.class = Some(parse_value(args, "--class")?),
                "--chapter" => parsed.chapters.push(require_value(args, "--chapter")?),
                "--name" => parsed.name = Some(require_value(args, "--name")?),
                "--questions" => parsed.questions = Some(parse_value(args, "--questions")?),
                "--minutes" => parsed.minutes = Some(parse_value(args, "--minutes")?),
                "--difficulty" => parsed.difficulty = Some(parse_value(args, "--difficulty")?),
                "--exam" => parsed.exam = Some(parse_value(args, "--exam")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn required<T: Clone>(&self, value: &Option<T>, flag: &'static str) -> Result<T, ArgsError> {
        value.clone().ok_or(ArgsError::MissingFlag {
            flag,
            command: self.command,
        })
    }

    fn subject_code(&self) -> Result<SubjectCode, ArgsError> {
        Ok(SubjectCode::new(
            self.required(&self.subject, "--subject")?,
            self.required(&self.class, "--class")?,
        ))
    }

    fn ledger_key(&self) -> Result<LedgerKey, ArgsError> {
        let pool = self.required(&self.pool, "--pool")?;
        let code = self.subject_code()?;
        let chapter = self.chapters.first().ok_or(ArgsError::MissingFlag {
            flag: "--chapter",
            command: self.command,
        })?;
        Ok(LedgerKey::new(pool, code.to_string(), chapter.trim()))
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PREP_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            log_fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let command = match argv.next().as_deref() {
        None | Some("--help" | "-h" | "help") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let args = Args::parse(command, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    // Storage and the HTTP client are opened here so the services stay free of process setup.
    prepare_sqlite_file(&args.db_url)?;
    let settings = args.api.clone().validate()?;
    tracing::debug!(db = %args.db_url, api = %settings.base_url(), "starting");
    let services = AppServices::new_sqlite(&args.db_url, settings, Clock::default_clock()).await?;

    match command {
        Command::Login => {
            let auth = services.auth().login_guest().await?;
            if let Some(user) = auth.user() {
                println!("signed in as {} ({})", user.username, user.user_id);
            }
        }
        Command::Logout => {
            services.auth().logout().await?;
            println!("signed out");
        }
        Command::Whoami => match services.auth().restore().await.user() {
            Some(user) => println!("{} ({}, {})", user.username, user.user_id, user.role),
            None => println!("not signed in"),
        },
        Command::Totals => {
            let pool = args.required(&args.pool, "--pool")?;
            let class = args.required(&args.class, "--class")?;
            let totals = services.question_bank().subject_totals(pool, class).await?;
            println!("{pool}, class {class}");
            for subject in Subject::ALL {
                let count = totals.count(pool, SubjectCode::new(subject, class));
                println!("  {:<10} {count:>6}", subject.display_name());
            }
        }
        Command::Chapters => {
            let code = args.subject_code()?;
            let auth = signed_in(&services).await?;
            let chapters = services.question_bank().chapters(&auth, code).await?;
            for chapter in &chapters {
                println!(
                    "{:<24} {:<40} mw {:>4}  pyq {:>4}  subtopics {}",
                    chapter.chapter_id.as_str(),
                    chapter.name,
                    chapter.most_wanted_total,
                    chapter.previous_year_total,
                    chapter.subtopics().len()
                );
            }
        }
        Command::Progress => {
            let key = args.ledger_key()?;
            let ledger = services.ledger();
            let document = ledger.get_states(&key).await;
            for state in document.iter() {
                let mark = if state.is_bookmarked { "*" } else { " " };
                let verdict = match state.is_correct {
                    Some(true) => "correct",
                    Some(false) => "wrong",
                    None => "",
                };
                println!(
                    "{mark} {:<24} {:<10} {verdict}",
                    state.question_id.as_str(),
                    state.status
                );
            }
            print_stats(&key.to_string(), &document.stats());
        }
        Command::Bookmarks => {
            let groups = services.ledger().list_all_bookmarks().await;
            if groups.is_empty() {
                println!("no bookmarks");
            }
            for group in groups {
                println!("{}", group.key);
                for id in group.question_ids {
                    println!("  {id}");
                }
            }
        }
        Command::Overview => {
            let stats = services.ledger().overview().await;
            print_stats("all chapters", &stats);
        }
        Command::Clear => {
            let key = args.ledger_key()?;
            services.ledger().clear(&key).await;
            println!("cleared {key}");
        }
        Command::Test => {
            let auth = signed_in(&services).await?;
            let wizard = build_test(&services, &auth, &args).await?;
            test_session::take_test(services.test_flow(), wizard).await?;
        }
    }

    Ok(())
}

async fn signed_in(services: &AppServices) -> Result<AuthState, Box<dyn std::error::Error>> {
    let auth = services.auth().restore().await;
    if !auth.is_authenticated() {
        return Err("not signed in; run `prep login` first".into());
    }
    Ok(auth)
}

/// Walk the wizard through every requested chapter, configure it, and
/// generate the test.
async fn build_test(
    services: &AppServices,
    auth: &AuthState,
    args: &Args,
) -> Result<TestWizard, Box<dyn std::error::Error>> {
    let code = args.subject_code()?;
    if args.chapters.is_empty() {
        return Err(ArgsError::MissingFlag {
            flag: "--chapter",
            command: args.command,
        }
        .into());
    }
    let flow = services.test_flow();
    let mut wizard = TestWizard::new();

    for wanted in &args.chapters {
        wizard.select_subject(code.subject)?;
        flow.select_class(&mut wizard, auth, code.class)
            .await
            .map_err(|err| with_banner(&wizard, err))?;

        let index = match wizard.chapters() {
            ChapterList::Loaded(chapters) => find_chapter(chapters, wanted),
            _ => None,
        }
        .ok_or_else(|| format!("no chapter matching {wanted:?} in {code}"))?;

        wizard.select_chapter(index)?;
        wizard.toggle_all_subtopics()?;
        wizard.add_to_test()?;
    }

    wizard.configure()?;
    wizard.set_test_name(args.required(&args.name, "--name")?);
    if let Some(count) = args.questions {
        wizard.set_question_count(count)?;
    }
    if let Some(minutes) = args.minutes {
        wizard.set_duration_minutes(minutes)?;
    }
    if let Some(difficulty) = args.difficulty {
        wizard.set_difficulty(difficulty);
    }
    if let Some(exam) = args.exam {
        wizard.set_exam_type(exam);
    }

    flow.create_test(&mut wizard, auth)
        .await
        .map_err(|err| with_banner(&wizard, err))?;
    Ok(wizard)
}

fn find_chapter(chapters: &[prep_core::model::Chapter], wanted: &str) -> Option<usize> {
    let wanted = wanted.trim();
    chapters
        .iter()
        .position(|c| c.chapter_id.as_str() == wanted)
        .or_else(|| {
            chapters
                .iter()
                .position(|c| c.name.trim().eq_ignore_ascii_case(wanted))
        })
}

fn with_banner(wizard: &TestWizard, err: TestFlowError) -> Box<dyn std::error::Error> {
    match wizard.error() {
        Some(banner) if banner != err.to_string() => format!("{banner} ({err})").into(),
        _ => err.into(),
    }
}

fn print_stats(title: &str, stats: &prep_core::model::ChapterStats) {
    print!("{}", format_stats(title, stats));
}

fn format_stats(title: &str, stats: &prep_core::model::ChapterStats) -> String {
    let rows = [
        ("new", stats.new),
        ("seen", stats.seen),
        ("attempted", stats.attempted),
        ("correct", stats.correct),
        ("incorrect", stats.incorrect),
        ("bookmarked", stats.bookmarked),
    ];
    let mut out = format!("{title}\n");
    for (label, count) in rows {
        out.push_str(&format!("  {label:<10} {count:>5}\n"));
    }
    out.push_str(&format!(
        "  {:<10} {:>4}%\n",
        "accuracy",
        prep_core::model::percentage(stats.correct, stats.attempted)
    ));
    out
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::ChapterStats;

    #[test]
    fn stats_listing_includes_every_count() {
        let stats = ChapterStats {
            new: 4,
            seen: 3,
            attempted: 4,
            correct: 3,
            incorrect: 1,
            bookmarked: 2,
        };
        let text = format_stats("p11/ch1", &stats);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "p11/ch1");
        assert_eq!(lines[1], "  new            4");
        assert_eq!(lines[6], "  bookmarked     2");
        assert_eq!(lines[7], "  accuracy     75%");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn subcommands_round_trip_through_names() {
        for name in ["login", "progress", "overview", "test"] {
            assert_eq!(Command::from_arg(name).map(Command::name), Some(name));
        }
        assert_eq!(Command::from_arg("deck"), None);
    }
}
