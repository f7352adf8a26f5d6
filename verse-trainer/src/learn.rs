//! Terminal driver for Learning mode
//!
//! Each input line is typed into the session one char at a time. Lines
//! starting with `:` are commands. A 100 ms interval feeds the idle clock
//! while waiting for input.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use verse_common::learning::{
    Completion, KeyInput, KeyOutcome, LearningSession, Transition, TICK_INTERVAL,
};
use verse_common::model::{LearningProgress, LearningStats, Round};
use verse_common::stats::PASSING_PERCENTAGE;

use crate::client::ApiClient;
use crate::render::{render_stanza, status_line, RenderOptions};

pub const HELP: &str = "\
Type the stanza; press Enter to send what you typed.
  :hint N   reveal word N (round 2)
  :peek N   show word N until your next input (round 2)
  :back     erase one char
  :save     save progress
  :quit     save and leave";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Type(String),
    /// Empty line
    Enter,
    /// 0-based word index
    Hint(usize),
    Peek(usize),
    Back,
    Save,
    Quit,
    Help,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Command::Enter);
    }
    let Some(rest) = trimmed.strip_prefix(':') else {
        return Ok(Command::Type(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let word = |arg: Option<&str>| -> Result<usize, String> {
        match arg.map(str::parse::<usize>) {
            Some(Ok(n)) if n >= 1 => Ok(n - 1),
            _ => Err(format!(":{} needs a word number (1, 2, ...)", name)),
        }
    };

    match name {
        "hint" | "h" => word(arg).map(Command::Hint),
        "peek" | "p" => word(arg).map(Command::Peek),
        "back" | "b" => Ok(Command::Back),
        "save" | "s" => Ok(Command::Save),
        "quit" | "q" => Ok(Command::Quit),
        "help" | "?" => Ok(Command::Help),
        other => Err(format!("Unknown command :{} (try :help)", other)),
    }
}

/// What the loop should do after a command
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue,
    /// Progress worth saving was made
    Save,
    Quit,
    Finished {
        progress: LearningProgress,
        stats: LearningStats,
    },
}

/// How a learning run ended
#[derive(Debug, Clone, PartialEq)]
pub enum LearnOutcome {
    Completed(LearningStats),
    Quit,
}

pub struct LearnLoop<'a, W: Write> {
    client: &'a ApiClient,
    poem_id: String,
    session: LearningSession,
    options: RenderOptions,
    peeked: Option<usize>,
    out: W,
}

impl<'a, W: Write> LearnLoop<'a, W> {
    pub fn new(
        client: &'a ApiClient,
        poem_id: impl Into<String>,
        session: LearningSession,
        options: RenderOptions,
        out: W,
    ) -> Self {
        Self {
            client,
            poem_id: poem_id.into(),
            session,
            options,
            peeked: None,
            out,
        }
    }

    pub fn session(&self) -> &LearningSession {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Read commands until the session completes, the user quits, or input
    /// ends
    pub async fn run<R>(&mut self, input: R) -> Result<LearnOutcome>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.render()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        self.save(self.session.progress()).await?;
                        return Ok(LearnOutcome::Quit);
                    };
                    let command = match parse_command(&line) {
                        Ok(command) => command,
                        Err(message) => {
                            writeln!(self.out, "{}", message)?;
                            continue;
                        }
                    };
                    match self.apply(command)? {
                        Flow::Continue => {}
                        Flow::Save => self.save(self.session.progress()).await?,
                        Flow::Quit => {
                            self.save(self.session.progress()).await?;
                            return Ok(LearnOutcome::Quit);
                        }
                        Flow::Finished { progress, stats } => {
                            self.save(progress).await?;
                            return Ok(LearnOutcome::Completed(stats));
                        }
                    }
                }
                _ = ticker.tick() => {
                    if let Some(word) = self.session.tick(TICK_INTERVAL) {
                        writeln!(self.out, "Hint: word {} revealed", word + 1)?;
                        self.render()?;
                    }
                }
            }
        }
    }

    /// Apply one command to the session and print the result
    pub fn apply(&mut self, command: Command) -> std::io::Result<Flow> {
        if let Some(word) = self.peeked.take() {
            self.session.hover_word(word, false);
        }

        let flow = match command {
            Command::Type(line) => self.type_line(&line)?,
            Command::Enter => match self.session.press(KeyInput::Enter) {
                KeyOutcome::PassComplete(transition) => self.announce(transition)?,
                _ => Flow::Continue,
            },
            Command::Hint(word) => {
                if !self.hints_available(word)? {
                    return Ok(Flow::Continue);
                }
                self.session.click_word(word);
                Flow::Continue
            }
            Command::Peek(word) => {
                if !self.hints_available(word)? {
                    return Ok(Flow::Continue);
                }
                self.session.hover_word(word, true);
                self.peeked = Some(word);
                Flow::Continue
            }
            Command::Back => {
                self.session.press(KeyInput::Backspace);
                Flow::Continue
            }
            Command::Save => return Ok(Flow::Save),
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {
                writeln!(self.out, "{}", HELP)?;
                return Ok(Flow::Continue);
            }
        };

        if !matches!(flow, Flow::Finished { .. }) {
            self.render()?;
        }
        Ok(flow)
    }

    /// Feed a line char by char, stopping at the first wrong char or when
    /// the pass completes
    fn type_line(&mut self, line: &str) -> std::io::Result<Flow> {
        for c in line.chars() {
            let key = if c == ' ' { KeyInput::Space } else { KeyInput::Char(c) };
            match self.session.press(key) {
                KeyOutcome::Wrong => {
                    writeln!(self.out, "Wrong: '{}'", c)?;
                    return Ok(Flow::Continue);
                }
                KeyOutcome::PassComplete(transition) => return self.announce(transition),
                KeyOutcome::Ignored | KeyOutcome::Correct | KeyOutcome::Erased => {}
            }
        }
        Ok(Flow::Continue)
    }

    fn announce(&mut self, transition: Transition) -> std::io::Result<Flow> {
        match transition {
            Transition::NextTry { try_number } => {
                writeln!(self.out, "Again, with fewer hints (try {})", try_number + 1)?;
                Ok(Flow::Continue)
            }
            Transition::NextRepeat { repeat } => {
                writeln!(self.out, "Well done. Repeat {}/3", repeat + 1)?;
                Ok(Flow::Continue)
            }
            Transition::NextStanza { stanza_index } => {
                writeln!(self.out, "Stanza done. On to stanza {}", stanza_index + 1)?;
                Ok(Flow::Save)
            }
            Transition::NextRound => {
                writeln!(
                    self.out,
                    "Round 1 complete. Round 2: only first letters are shown."
                )?;
                Ok(Flow::Save)
            }
            Transition::Completed(Completion::Persist { progress, stats }) => {
                writeln!(
                    self.out,
                    "Poem learned! Accuracy {}% ({}/{} passes)",
                    stats.percentage, stats.correct_attempts, stats.total_attempts
                )?;
                Ok(Flow::Finished { progress, stats })
            }
            Transition::Completed(Completion::Discarded { stats }) => {
                writeln!(
                    self.out,
                    "Accuracy {}% is below {}%. Starting over from the first stanza.",
                    stats.percentage, PASSING_PERCENTAGE
                )?;
                Ok(Flow::Continue)
            }
        }
    }

    fn hints_available(&mut self, word: usize) -> std::io::Result<bool> {
        if self.session.round() != Round::Second {
            writeln!(self.out, "Hints are available in round 2")?;
            return Ok(false);
        }
        if word >= self.session.word_count() {
            writeln!(
                self.out,
                "This stanza has {} words",
                self.session.word_count()
            )?;
            return Ok(false);
        }
        Ok(true)
    }

    fn render(&mut self) -> std::io::Result<()> {
        let options = RenderOptions {
            numbered: self.session.round() == Round::Second,
            ..self.options
        };
        writeln!(self.out)?;
        writeln!(self.out, "{}", status_line(&self.session))?;
        write!(self.out, "{}", render_stanza(&self.session, options))?;
        self.out.flush()
    }

    /// Best-effort save; failures are reported and in-memory state is kept
    async fn save(&mut self, progress: LearningProgress) -> std::io::Result<()> {
        match self
            .client
            .save_learning_progress(&self.poem_id, progress)
            .await
        {
            Ok(_) => {
                info!(poem_id = %self.poem_id, "Learning progress saved");
                writeln!(self.out, "Progress saved.")
            }
            Err(e) => {
                warn!(poem_id = %self.poem_id, kind = %e.kind, error = %e, "Failed to save learning progress");
                writeln!(self.out, "Could not save progress: {}", e)
            }
        }
    }
}
