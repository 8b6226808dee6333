use super::session::{DialogueSession, SessionPhase};
use crate::{Error, Result};
use async_trait::async_trait;
use tracing::{error, info};

/// Source of user lines. Reaching the end of input yields
/// [`Error::InputClosed`].
#[async_trait]
pub trait InputSource: Send {
    async fn next_line(&mut self) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerOutput {
    Reply(String),
    Error(String),
}

pub trait OutputSink: Send {
    fn write(&mut self, output: RunnerOutput);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub requested: usize,
    pub completed: usize,
    pub error: Option<String>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.completed == self.requested
    }
}

/// Drives a session for a fixed number of turns.
///
/// The first failure, whether from input or from the session, is written to
/// the sink and ends the run. Failed turns are never retried.
pub struct SessionRunner;

impl SessionRunner {
    pub async fn run(
        session: &mut DialogueSession,
        turn_count: usize,
        input: &mut dyn InputSource,
        output: &mut dyn OutputSink,
    ) -> RunReport {
        let mut report = RunReport {
            requested: turn_count,
            completed: 0,
            error: None,
        };

        for turn in 1..=turn_count {
            match Self::take_turn(session, input).await {
                Ok(reply) => {
                    output.write(RunnerOutput::Reply(reply));
                    report.completed += 1;
                }
                Err(e) => {
                    error!("Chat stopped at turn {}/{}: {}", turn, turn_count, e);
                    output.write(RunnerOutput::from(&e));
                    report.error = Some(e.to_string());
                    break;
                }
            }
        }

        info!(
            "Chat finished: {}/{} turns completed",
            report.completed, report.requested
        );
        report
    }

    async fn take_turn(
        session: &mut DialogueSession,
        input: &mut dyn InputSource,
    ) -> Result<String> {
        // A finished session must not consume another user line.
        if session.phase() == SessionPhase::Done {
            return Err(Error::SessionFinished(session.turns_taken()));
        }
        let line = input.next_line().await?;
        session.advance(&line).await
    }
}

impl From<&Error> for RunnerOutput {
    fn from(err: &Error) -> Self {
        RunnerOutput::Error(err.to_string())
    }
}
