//! Terminal driver for Test mode
//!
//! Each stanza is answered from memory; an answer is one or more lines
//! ended by an empty line.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};
use verse_common::learning::LearningSettings;
use verse_common::model::{Poem, TestProgress};
use verse_common::test_mode::{TestSession, TestStep};

use crate::client::ApiClient;

/// Run a test over `poem`
///
/// Returns the outcome when every stanza was answered, `None` if input
/// ended first. A finished test is saved; a failed save is reported only.
pub async fn run_test<R, W>(
    client: &ApiClient,
    poem: &Poem,
    settings: LearningSettings,
    input: R,
    out: &mut W,
) -> Result<Option<TestProgress>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = TestSession::new(poem.stanzas.clone(), settings);
    let mut lines = input.lines();

    writeln!(out, "Test: {} by {}", poem.title, poem.author)?;
    prompt(out, &session)?;

    let mut answer: Vec<String> = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            answer.push(line);
            continue;
        }

        match session.submit(&answer.join("\n")) {
            TestStep::Ignored => {}
            TestStep::Next { .. } => {
                answer.clear();
                prompt(out, &session)?;
            }
            TestStep::Finished(progress) => {
                report(out, poem, &progress)?;
                save(client, &poem.id, progress.clone(), out).await?;
                return Ok(Some(progress));
            }
        }
    }

    writeln!(out, "Test abandoned; nothing was saved.")?;
    Ok(None)
}

fn prompt<W: Write>(out: &mut W, session: &TestSession) -> std::io::Result<()> {
    writeln!(
        out,
        "\nStanza {}/{} (finish with an empty line):",
        session.stanza_index() + 1,
        session.stanza_count()
    )?;
    out.flush()
}

fn report<W: Write>(out: &mut W, poem: &Poem, progress: &TestProgress) -> std::io::Result<()> {
    writeln!(out)?;
    for result in &progress.results {
        let mark = if result.correct { "ok" } else { "MISS" };
        writeln!(out, "  Stanza {}: {}", result.stanza_index + 1, mark)?;
        if !result.correct {
            if let Some(expected) = poem.stanzas.get(result.stanza_index) {
                for line in expected.lines() {
                    writeln!(out, "      {}", line)?;
                }
            }
        }
    }
    writeln!(
        out,
        "Score: {}/{} ({}%)",
        progress.stats.correct_answers, progress.stats.total_answers, progress.stats.percentage
    )
}

async fn save<W: Write>(
    client: &ApiClient,
    poem_id: &str,
    progress: TestProgress,
    out: &mut W,
) -> std::io::Result<()> {
    match client.save_test_progress(poem_id, progress).await {
        Ok(_) => {
            info!(poem_id = %poem_id, "Test result saved");
            writeln!(out, "Result saved.")
        }
        Err(e) => {
            warn!(poem_id = %poem_id, kind = %e.kind, error = %e, "Failed to save test result");
            writeln!(out, "Could not save the result: {}", e)
        }
    }
}
