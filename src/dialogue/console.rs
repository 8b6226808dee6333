use super::runner::{InputSource, OutputSink, RunnerOutput};
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub const USER_PROMPT: &str = ">> User:";

/// Reads user lines, printing a prompt before each one. Stdin by default.
pub struct StdinInput<R = BufReader<Stdin>> {
    lines: Lines<R>,
    prompt: String,
}

impl StdinInput {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> StdinInput<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            prompt: USER_PROMPT.to_string(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> InputSource for StdinInput<R> {
    async fn next_line(&mut self) -> Result<String> {
        print!("{}", self.prompt);
        std::io::stdout().flush()?;

        match self.lines.next_line().await? {
            Some(line) => Ok(line),
            None => Err(Error::InputClosed),
        }
    }
}

/// Prints replies to stdout as `{speaker}: {reply}` and errors to stderr.
pub struct ConsoleOutput {
    speaker: String,
}

impl ConsoleOutput {
    pub fn new(speaker: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
        }
    }
}

impl OutputSink for ConsoleOutput {
    fn write(&mut self, output: RunnerOutput) {
        match output {
            RunnerOutput::Reply(text) => println!("{}: {}", self.speaker, text),
            RunnerOutput::Error(message) => eprintln!("Chat stopped: {}", message),
        }
    }
}
