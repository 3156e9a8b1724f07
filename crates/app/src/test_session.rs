//! Interactive test taking on the terminal.
//!
//! Answers are read line by line from stdin while the countdown runs as a
//! separate task. Whichever submits first wins; the other side only sees the
//! stored result.

use std::sync::Arc;
use std::time::Duration;

use prep_core::model::{TestResult, option_label};
use services::test_flow::{PaletteStatus, SharedRunner, Urgency, run_countdown};
use services::{Clock, SubmitOutcome, TestFlowService, TestWizard, WizardError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(char),
    Next,
    Previous,
    Jump(usize),
    Mark,
    Submit,
    Help,
    Unknown(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "n" | "next" => Input::Next,
            "p" | "prev" => Input::Previous,
            "m" | "mark" => Input::Mark,
            "submit" => Input::Submit,
            "?" | "help" | "" => Input::Help,
            lowered => {
                let mut chars = lowered.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => Input::Answer(c),
                    _ => match lowered.strip_prefix('g').map(str::trim) {
                        Some(n) => n
                            .parse::<usize>()
                            .ok()
                            .filter(|n| *n > 0)
                            .map_or_else(|| Input::Unknown(line.to_string()), |n| Input::Jump(n - 1)),
                        None => Input::Unknown(line.to_string()),
                    },
                }
            }
        }
    }
}

/// Run the generated test until it is submitted by hand, by expiry, or by
/// closing stdin.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or no test is running.
pub async fn take_test(
    flow: Arc<TestFlowService>,
    wizard: TestWizard,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = wizard.runner().ok_or(WizardError::NoActiveTest)?;

    let (done_tx, mut done_rx) = oneshot::channel::<TestResult>();
    let countdown = tokio::spawn(run_countdown(
        Arc::clone(&runner),
        Duration::from_secs(1),
        Clock::default_clock(),
        move |result| {
            // The receiver is gone once the test was submitted by hand.
            let _ = done_tx.send(result);
        },
    ));

    {
        let guard = runner.lock().await;
        println!("{}: {} questions", guard.name(), guard.len());
    }
    print_help();
    show_current(&runner).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let outcome = loop {
        tokio::select! {
            expired = &mut done_rx => {
                println!();
                println!("Time is up.");
                match expired {
                    Ok(result) => break SubmitOutcome::AlreadySubmitted(result),
                    Err(_) => break flow.submit(&wizard).await?,
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break flow.submit(&wizard).await?;
                };
                match Input::parse(&line) {
                    Input::Submit => break flow.submit(&wizard).await?,
                    input => {
                        apply(&runner, input).await;
                        show_current(&runner).await;
                    }
                }
            }
        }
    };
    countdown.abort();

    print_result(outcome.result());
    Ok(())
}

async fn apply(runner: &SharedRunner, input: Input) {
    let mut runner = runner.lock().await;
    match input {
        Input::Answer(label) => {
            let option = runner
                .current()
                .and_then(|q| q.option_by_label(label))
                .map(str::to_string);
            match option {
                Some(option) => {
                    runner.select_answer(option);
                }
                None => println!("no option {}", label.to_ascii_uppercase()),
            }
        }
        Input::Next => {
            runner.next();
        }
        Input::Previous => {
            runner.previous();
        }
        Input::Jump(index) => {
            runner.jump(index);
        }
        Input::Mark => {
            runner.toggle_mark();
        }
        Input::Help => print_help(),
        Input::Unknown(raw) => println!("unknown command: {raw}"),
        Input::Submit => {}
    }
}

async fn show_current(runner: &SharedRunner) {
    let runner = runner.lock().await;
    let Some(question) = runner.current() else {
        return;
    };
    let palette = runner.palette();
    let urgency = match runner.urgency() {
        Urgency::Normal => "",
        Urgency::Warning => " (hurry)",
        Urgency::Critical => " (almost out of time)",
    };
    let answer = runner.answer_for(&question.id);

    println!();
    println!(
        "[{}/{}] {}{urgency}",
        runner.index() + 1,
        runner.len(),
        runner.format_remaining()
    );
    println!("{}", question.prompt);
    for (i, option) in question.options.iter().enumerate() {
        let chosen = if answer == Some(option.as_str()) { ">" } else { " " };
        let label = option_label(i).unwrap_or('?');
        println!(" {chosen} {label}. {option}");
    }
    if palette.statuses.get(runner.index()) == Some(&PaletteStatus::Marked) {
        println!("  (marked for review)");
    }
    println!(
        "attempted {}  seen {}  unseen {}  marked {}",
        palette.counts.attempted, palette.counts.seen, palette.counts.unseen, palette.counts.marked
    );
}

fn print_help() {
    println!("a-d answer, n next, p previous, g <n> jump, m mark, submit to finish");
}

fn print_result(result: &TestResult) {
    println!();
    println!("Score {}%", result.percentage);
    println!("  total       {:>4}", result.total);
    println!("  attempted   {:>4}", result.attempted);
    println!("  correct     {:>4}", result.correct);
    println!("  incorrect   {:>4}", result.incorrect);
    println!("  unattempted {:>4}", result.unattempted);
    println!(
        "  time        {:>2}:{:02}",
        result.time_spent_secs / 60,
        result.time_spent_secs % 60
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_answers_and_navigation() {
        assert_eq!(Input::parse("B"), Input::Answer('b'));
        assert_eq!(Input::parse(" n "), Input::Next);
        assert_eq!(Input::parse("prev"), Input::Previous);
        assert_eq!(Input::parse("m"), Input::Mark);
        assert_eq!(Input::parse("SUBMIT"), Input::Submit);
        assert_eq!(Input::parse(""), Input::Help);
    }

    #[test]
    fn jump_is_one_based() {
        assert_eq!(Input::parse("g 3"), Input::Jump(2));
        assert_eq!(Input::parse("g12"), Input::Jump(11));
        assert_eq!(Input::parse("g 0"), Input::Unknown("g 0".into()));
        assert_eq!(Input::parse("go"), Input::Unknown("go".into()));
    }
}
