//! Test creation and test taking.
//!
//! `TestWizard` and `TestRunner` are plain state; `TestFlowService` performs
//! the requests their transitions need and `run_countdown` drives the timer.

mod countdown;
mod runner;
mod wizard;
mod workflow;

pub use countdown::run_countdown;
pub use runner::{
    CRITICAL_THRESHOLD_SECS, Palette, PaletteCounts, PaletteStatus, SubmitOutcome, TestRunner,
    Tick, Urgency, WARNING_THRESHOLD_SECS,
};
pub use wizard::{
    CHAPTERS_FAILED, CREATE_TEST_FAILED, ChapterList, SharedRunner, TestWizard, WizardStep,
};
pub use workflow::TestFlowService;
