use std::time::Duration;

use prep_core::Clock;
use prep_core::model::TestResult;
use tokio::time::{MissedTickBehavior, interval};

use super::runner::{SubmitOutcome, Tick};
use super::wizard::SharedRunner;

/// Drive the runner's countdown, one `tick` per `period`.
///
/// Returns once the test is submitted, by expiry or by hand. `on_complete`
/// runs exactly once, and only when this countdown performed the submission;
/// a manual submit that won the race handles completion itself. Abort the
/// task to stop the countdown early.
pub async fn run_countdown<F>(runner: SharedRunner, period: Duration, clock: Clock, on_complete: F)
where
    F: FnOnce(TestResult) + Send,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let tick = runner.lock().await.tick(clock.now());
        match tick {
            Tick::Running => {}
            Tick::Expired(SubmitOutcome::Submitted(result)) => {
                tracing::info!(
                    attempted = result.attempted,
                    correct = result.correct,
                    "time is up; test submitted"
                );
                on_complete(result);
                return;
            }
            Tick::Expired(SubmitOutcome::AlreadySubmitted(_)) | Tick::Idle => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use prep_core::model::{Question, QuestionId};
    use prep_core::time::{fixed_clock, fixed_now};
    use tokio::sync::Mutex;

    use crate::test_flow::TestRunner;

    fn shared_runner(minutes: u32) -> SharedRunner {
        let questions = vec![Question {
            id: QuestionId::new("q1"),
            prompt: "p".into(),
            options: vec!["a".into(), "b".into()],
            correct_answer: "a".into(),
            solution: None,
            exam_type: String::new(),
            exam_year: String::new(),
        }];
        Arc::new(Mutex::new(TestRunner::new("Timed", questions, minutes, fixed_now())))
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_submits_and_completes_once() {
        let runner = shared_runner(1);
        runner.lock().await.select_answer("a");
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        run_countdown(
            Arc::clone(&runner),
            Duration::from_secs(1),
            fixed_clock(),
            move |result| {
                assert_eq!(result.correct, 1);
                assert_eq!(result.time_spent_secs, 60);
                seen.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let mut guard = runner.lock().await;
        assert_eq!(guard.remaining_secs(), 0);
        assert!(!guard.submit(fixed_now()).is_first());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_stops_countdown_without_callback() {
        let runner = shared_runner(30);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let task = tokio::spawn(run_countdown(
            Arc::clone(&runner),
            Duration::from_secs(1),
            fixed_clock(),
            move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            },
        ));

        tokio::time::sleep(Duration::from_secs(10)).await;
        let outcome = runner.lock().await.submit(fixed_now());
        assert!(outcome.is_first());

        task.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(runner.lock().await.remaining_secs() < 30 * 60);
    }
}
