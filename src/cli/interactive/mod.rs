//! Interactive command - line-based search session
//!
//! Plain lines search immediately. Lines starting with `:` drive the same
//! events a graphical client would send: typing, filter changes, example
//! and related-word clicks.

use std::str::FromStr;
use std::sync::Arc;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::domain::dispatch::SearchSession;
use crate::domain::search::SearchKind;
use crate::domain::DomainError;
use crate::infrastructure::render::TerminalRenderer;
use crate::infrastructure::services::{DispatcherHandle, SearchDispatcher};
use crate::AppContext;

const HELP: &str = "\
<text>            search now
:type <text>      type text (searched after a pause)
:kind <kind>      sentences | words | relationships | qa
:models a,b       select models
:toggle <model>   select or deselect one model
:example <text>   search an example query
:related <word>   search a related word
:help             show this help
:quit             leave
";

/// Arguments for the interactive command
#[derive(Args, Clone)]
pub struct InteractiveArgs {
    /// Initial search kind (overrides config)
    #[arg(long, short)]
    pub kind: Option<SearchKind>,

    /// Initially selected model; repeat for several (overrides config)
    #[arg(long = "model", short)]
    pub models: Vec<String>,
}

/// One line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Submit(String),
    Type(String),
    Kind(SearchKind),
    Models(Vec<String>),
    Toggle(String),
    Example(String),
    Related(String),
    Help,
    Quit,
    Nothing,
}

impl FromStr for ReplCommand {
    type Err = DomainError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();

        let Some(command) = line.strip_prefix(':') else {
            return Ok(if line.is_empty() {
                ReplCommand::Nothing
            } else {
                ReplCommand::Submit(line.to_string())
            });
        };

        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .unwrap_or((command, ""));

        let require = |what: &str| {
            if rest.is_empty() {
                Err(DomainError::validation(format!(":{} needs {}", name, what)))
            } else {
                Ok(rest.to_string())
            }
        };

        match name {
            "type" | "t" => Ok(ReplCommand::Type(rest.to_string())),
            "kind" | "k" => Ok(ReplCommand::Kind(require("a kind")?.parse()?)),
            "models" | "m" => Ok(ReplCommand::Models(
                rest.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from)
                    .collect(),
            )),
            "toggle" => Ok(ReplCommand::Toggle(require("a model")?)),
            "example" | "e" => Ok(ReplCommand::Example(require("a query")?)),
            "related" | "r" => Ok(ReplCommand::Related(require("a word")?)),
            "help" | "h" | "?" => Ok(ReplCommand::Help),
            "quit" | "q" | "exit" => Ok(ReplCommand::Quit),
            _ => Err(DomainError::validation(format!(
                "Unknown command :{}, try :help",
                name
            ))),
        }
    }
}

impl ReplCommand {
    /// Forwards the command to the dispatcher
    fn apply(self, handle: &DispatcherHandle) -> Result<(), DomainError> {
        match self {
            ReplCommand::Submit(query) => {
                handle.input_changed(query)?;
                handle.submit_current()
            }
            ReplCommand::Type(text) => handle.input_changed(text),
            ReplCommand::Kind(kind) => handle.set_kind(kind),
            ReplCommand::Models(models) => handle.set_models(models),
            ReplCommand::Toggle(model) => handle.toggle_model(model),
            ReplCommand::Example(query) => handle.select_example(query),
            ReplCommand::Related(word) => handle.search_related(word),
            ReplCommand::Help => {
                print!("{}", HELP);
                Ok(())
            }
            ReplCommand::Quit | ReplCommand::Nothing => Ok(()),
        }
    }
}

/// Run the interactive session until `:quit` or end of input
pub async fn run(ctx: &AppContext, args: InteractiveArgs) -> anyhow::Result<()> {
    let kind = args.kind.unwrap_or(ctx.config.search.default_kind);
    let configured = if args.models.is_empty() {
        ctx.config.search.default_models.clone()
    } else {
        args.models.clone()
    };

    match ctx.backend.stats().await {
        Ok(stats) => println!(
            "{} sentences, {} words, {} model(s) loaded",
            stats.sentences_count, stats.words_count, stats.models_loaded
        ),
        Err(e) => warn!("Could not load statistics: {}", e),
    }

    let models = super::initial_models(&configured, ctx.backend.as_ref()).await;
    info!("Starting session: kind={} models={:?}", kind, models);

    let renderer = Arc::new(TerminalRenderer::stdout(
        ctx.config.search.display_names.clone(),
    ));
    let (handle, task) =
        SearchDispatcher::spawn(ctx.pipeline(), renderer, SearchSession::new(kind, models));

    print!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut quit = false;

    while let Some(line) = lines.next_line().await? {
        match line.parse::<ReplCommand>() {
            Ok(ReplCommand::Quit) => {
                quit = true;
                break;
            }
            Ok(command) => command.apply(&handle)?,
            Err(e) => eprintln!("{}", e),
        }
    }

    // End of input: let typed or in-flight searches finish rendering
    if !quit {
        if let Err(e) = handle.wait_idle().await {
            warn!("{}", e);
        }
    }

    if handle.shutdown().is_ok() {
        task.await?;
    }

    Ok(())
}
