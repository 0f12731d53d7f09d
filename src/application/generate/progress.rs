//! User-facing progress narration.
//!
//! Most modes show one static message for the duration of the call. URL
//! cloning runs long enough that it gets a simulated sequence advanced on a
//! fixed timer, independent of actual backend progress. The sequence is
//! cosmetic narration only and must never gate correctness logic.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::domain::InputMode;

/// Progress updates streamed to the UI during a generation attempt. Each
/// narration replaces the currently displayed loading message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Narration(String),
}

/// Delay between simulated narration steps in URL mode.
pub const NARRATION_INTERVAL: Duration = Duration::from_secs(4);

const URL_SEQUENCE: [&str; 4] = [
    "Analyzing URL and page structure...",
    "Mapping assets and styles...",
    "Generating project files...",
    "Assembling the final code...",
];

/// The narration for one mode: an opening message plus any timed follow-ups.
#[derive(Debug, Clone, Copy)]
pub struct NarrationScript {
    first: &'static str,
    rest: &'static [&'static str],
}

pub fn narration_script(mode: InputMode) -> NarrationScript {
    let first = match mode {
        InputMode::Image => "Analyzing design and generating code...",
        InputMode::Html => "Refactoring HTML and generating code...",
        InputMode::Figma => "Generating code from Figma design...",
        InputMode::Content => "Applying content and generating code...",
        InputMode::Url => URL_SEQUENCE[0],
    };
    let rest: &'static [&'static str] = match mode {
        InputMode::Url => &URL_SEQUENCE[1..],
        _ => &[],
    };
    NarrationScript { first, rest }
}

/// Drives narration for one in-flight backend call.
///
/// The timer must never outlive the call: `stop` runs the moment the call
/// settles, and dropping the narrator aborts the timer task as well, so a
/// torn-down session cannot leak it.
pub struct Narrator {
    handle: Option<JoinHandle<()>>,
}

impl Narrator {
    pub fn start(script: NarrationScript, tx: UnboundedSender<ProgressEvent>) -> Self {
        let _ = tx.send(ProgressEvent::Narration(script.first.to_string()));

        let handle = if script.rest.is_empty() {
            None
        } else {
            let rest = script.rest;
            Some(tokio::spawn(async move {
                for message in rest {
                    tokio::time::sleep(NARRATION_INTERVAL).await;
                    if tx
                        .send(ProgressEvent::Narration((*message).to_string()))
                        .is_err()
                    {
                        break;
                    }
                }
            }))
        };

        Self { handle }
    }

    /// Cancel the simulated sequence. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.stop();
    }
}
