//! verse-trainer - terminal client for memorizing poems
//!
//! Manages the poem collection on a verse-server and runs Learning and Test
//! sessions in the terminal.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use verse_common::config::{client_state_dir, TomlConfig};
use verse_common::learning::{LearningSession, LearningSettings};
use verse_common::model::{NewPoem, Poem};
use verse_common::text::split_stanzas;
use verse_trainer::catalog::{find_poem, poem_line};
use verse_trainer::client::ApiClient;
use verse_trainer::identity;
use verse_trainer::learn::{LearnLoop, LearnOutcome, HELP};
use verse_trainer::recall::run_test;
use verse_trainer::render::RenderOptions;

/// Command-line arguments for verse-trainer
#[derive(Parser, Debug)]
#[command(name = "verse-trainer")]
#[command(about = "Learn poems by heart, one stanza at a time")]
#[command(version)]
struct Args {
    /// Server API base URL (overrides the config file)
    #[arg(long, env = "VERSE_API_URL", global = true)]
    api_url: Option<String>,

    /// Config file path
    #[arg(short, long, env = "VERSE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Letter case must match
    #[arg(long, global = true)]
    case_sensitive: bool,

    /// Punctuation must be typed too
    #[arg(long, global = true)]
    require_punctuation: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server is reachable
    Health,
    /// Show this installation's user id
    Whoami,
    /// List poems
    List,
    /// Print a poem
    Show {
        /// Poem id, list number, or title
        poem: String,
    },
    /// Upload a poem from a text file (stanzas separated by blank lines)
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        year: Option<String>,
    },
    /// Delete a poem and everyone's progress on it
    Delete {
        poem: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show saved progress, for one poem or all
    Progress { poem: Option<String> },
    /// Forget saved progress for a poem
    Reset { poem: String },
    /// Practice a poem
    Learn {
        poem: String,
        /// Ignore saved progress and start from the beginning
        #[arg(long)]
        fresh: bool,
    },
    /// Recite a poem from memory
    Test { poem: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verse_trainer=warn,verse_common=warn".into()),
        )
        .init();

    let args = Args::parse();

    debug!(
        "verse-trainer v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = TomlConfig::load_or_default(args.config.as_deref());
    let mut client_config = config.client.clone();
    if let Some(url) = &args.api_url {
        client_config.api_url = url.clone();
    }

    let settings = LearningSettings {
        case_sensitive: args.case_sensitive || client_config.case_sensitive,
        require_punctuation: args.require_punctuation || client_config.require_punctuation,
    };

    let state_dir = client_state_dir().context("Failed to locate client state folder")?;
    let identity = identity::load_or_create(&state_dir).context("Failed to load client identity")?;

    let client = ApiClient::from_config(&client_config, identity.user_id.clone())
        .context("Failed to create API client")?;
    info!(api_url = %client.base_url(), user_id = %client.user_id(), "Client ready");

    match args.command {
        Command::Health => {
            let health = client.health().await?;
            println!("{} ({}) at {}", health.status, health.timestamp, client.base_url());
        }
        Command::Whoami => {
            println!("{}", identity.user_id);
            println!("created {}", identity.created_at);
        }
        Command::List => {
            let poems = client.fetch_poems().await?;
            if poems.is_empty() {
                println!("No poems yet. Add one with `verse-trainer upload`.");
            }
            for (i, poem) in poems.iter().enumerate() {
                println!("{}", poem_line(i + 1, poem));
            }
        }
        Command::Show { poem } => {
            let poem = lookup(&client, &poem).await?;
            println!("{}\n{}", poem.title, poem.author);
            if !poem.year.is_empty() {
                println!("{}", poem.year);
            }
            for stanza in &poem.stanzas {
                println!("\n{}", stanza);
            }
        }
        Command::Upload {
            file,
            title,
            author,
            year,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let draft = NewPoem::new(title, author, year, split_stanzas(&text));
            let poem = client.add_poem(&draft).await?;
            println!("Added \"{}\" ({} stanzas) as {}", poem.title, poem.stanzas.len(), poem.id);
        }
        Command::Delete { poem, yes } => {
            let poem = lookup(&client, &poem).await?;
            if !yes && !confirm(&format!("Delete \"{}\" and all progress on it?", poem.title))? {
                println!("Cancelled.");
                return Ok(());
            }
            client.delete_poem(&poem.id).await?;
            println!("Deleted \"{}\".", poem.title);
        }
        Command::Progress { poem } => show_progress(&client, poem.as_deref()).await?,
        Command::Reset { poem } => {
            let poem = lookup(&client, &poem).await?;
            client.delete_progress(&poem.id).await?;
            println!("Progress on \"{}\" cleared.", poem.title);
        }
        Command::Learn { poem, fresh } => {
            let poem = lookup(&client, &poem).await?;
            learn(&client, &poem, settings, fresh).await?;
        }
        Command::Test { poem } => {
            let poem = lookup(&client, &poem).await?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            run_test(&client, &poem, settings, stdin, &mut stdout).await?;
        }
    }

    Ok(())
}

async fn lookup(client: &ApiClient, query: &str) -> Result<Poem> {
    let poems = client.fetch_poems().await?;
    match find_poem(&poems, query) {
        Some(poem) => Ok(poem.clone()),
        None => bail!("No single poem matches \"{}\" (see `verse-trainer list`)", query),
    }
}

async fn learn(client: &ApiClient, poem: &Poem, settings: LearningSettings, fresh: bool) -> Result<()> {
    let saved = if fresh {
        None
    } else {
        client.fetch_progress(&poem.id).await?.and_then(|p| p.learning)
    };
    if saved.is_some() {
        println!("Resuming saved progress.");
    }
    let session = LearningSession::resume(poem.stanzas.clone(), settings, saved.as_ref());

    let options = RenderOptions {
        ansi: std::io::stdout().is_terminal(),
        numbered: false,
    };
    println!("{} - {}\n{}", poem.title, poem.author, HELP);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut driver = LearnLoop::new(client, poem.id.clone(), session, options, std::io::stdout());
    match driver.run(stdin).await? {
        LearnOutcome::Completed(stats) => {
            println!("Finished with {}% accuracy. Try `verse-trainer test` next.", stats.percentage)
        }
        LearnOutcome::Quit => println!("See you next time."),
    }
    Ok(())
}

async fn show_progress(client: &ApiClient, query: Option<&str>) -> Result<()> {
    let poems = client.fetch_poems().await?;
    let all = client.fetch_all_progress().await?;

    let selected: Vec<&Poem> = match query {
        Some(query) => match find_poem(&poems, query) {
            Some(poem) => vec![poem],
            None => bail!("No single poem matches \"{}\"", query),
        },
        None => poems.iter().filter(|p| all.contains_key(&p.id)).collect(),
    };
    if selected.is_empty() {
        println!("No saved progress.");
    }

    for poem in selected {
        println!("{} - {}", poem.title, poem.author);
        let Some(entry) = all.get(&poem.id) else {
            println!("  not started");
            continue;
        };
        match &entry.learning {
            Some(learning) => {
                let stats = verse_common::stats::learning_stats(&learning.attempts);
                let percent = verse_common::stats::progress_percent(
                    poem.stanzas.len(),
                    learning.current_round,
                    learning.current_stanza_index,
                    learning.repeat_count,
                );
                println!(
                    "  learning: round {}, stanza {}/{}, repeat {}/3, {:.0}% through, accuracy {}%",
                    learning.current_round,
                    learning.current_stanza_index + 1,
                    poem.stanzas.len(),
                    learning.repeat_count + 1,
                    percent,
                    stats.percentage
                );
            }
            None => println!("  learning: not started"),
        }
        match &entry.test {
            Some(test) => println!(
                "  test: {}/{} ({}%) on {}",
                test.stats.correct_answers,
                test.stats.total_answers,
                test.stats.percentage,
                test.completed_at.format("%Y-%m-%d %H:%M")
            ),
            None => println!("  test: not taken"),
        }
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
