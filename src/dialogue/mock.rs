use super::encoder::{EncodedContext, DEFAULT_EOS_TOKEN};
use super::runner::{InputSource, OutputSink, RunnerOutput};
use super::InferenceBackend;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted [`InferenceBackend`]. Clones share call history, so a clone can
/// be kept to inspect calls after the original is boxed into a session.
#[derive(Clone)]
pub struct MockBackend {
    responses: Arc<Mutex<Vec<String>>>,
    failing_calls: Arc<Mutex<Vec<usize>>>,
    echo_suffix: Option<String>,
    contexts: Arc<Mutex<Vec<EncodedContext>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failing_calls: Arc::new(Mutex::new(Vec::new())),
            echo_suffix: None,
            contexts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Fail the `call`-th invocation (1-based).
    pub fn with_failure_on_call(self, call: usize) -> Self {
        self.failing_calls.lock().unwrap().push(call);
        self
    }

    /// Behave like a causal LM: return the transcript followed by `suffix`.
    pub fn echoing_context_with(mut self, suffix: &str) -> Self {
        self.echo_suffix = Some(suffix.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_context(&self) -> Option<EncodedContext> {
        self.contexts.lock().unwrap().last().cloned()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn generate(&self, context: &EncodedContext) -> Result<String> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.contexts.lock().unwrap().push(context.clone());

        if self.failing_calls.lock().unwrap().contains(&*count) {
            return Err(Error::AiProvider(format!("Mock failure on call {}", *count)));
        }

        if let Some(suffix) = &self.echo_suffix {
            return Ok(match context {
                EncodedContext::Transcript(transcript) => {
                    format!("{}{}{}", transcript, suffix, DEFAULT_EOS_TOKEN)
                }
                EncodedContext::Messages(_) => suffix.clone(),
            });
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(format!("Mock reply {}", *count))
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

/// [`InputSource`] that replays a fixed list of lines, then reports
/// [`Error::InputClosed`].
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn next_line(&mut self) -> Result<String> {
        self.lines.pop_front().ok_or(Error::InputClosed)
    }
}

/// [`OutputSink`] that keeps everything it is given.
#[derive(Default)]
pub struct RecordingSink {
    outputs: Vec<RunnerOutput>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> &[RunnerOutput] {
        &self.outputs
    }

    pub fn replies(&self) -> Vec<&str> {
        self.outputs
            .iter()
            .filter_map(|output| match output {
                RunnerOutput::Reply(text) => Some(text.as_str()),
                RunnerOutput::Error(_) => None,
            })
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn write(&mut self, output: RunnerOutput) {
        self.outputs.push(output);
    }
}
