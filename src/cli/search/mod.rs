//! Search command - one search through the result cache

use clap::Args;

use crate::domain::dispatch::SearchView;
use crate::domain::search::{SearchIntent, SearchKind};
use crate::infrastructure::render::TerminalRenderer;
use crate::AppContext;

/// Arguments for the search command
#[derive(Args, Clone)]
pub struct SearchArgs {
    /// Text to search for
    #[arg(required = true, num_args = 1..)]
    pub words: Vec<String>,

    /// Search kind: sentences, words, relationships or qa (overrides config)
    #[arg(long, short)]
    pub kind: Option<SearchKind>,

    /// Model to search with; repeat for several (overrides config)
    #[arg(long = "model", short)]
    pub models: Vec<String>,
}

impl SearchArgs {
    pub fn query(&self) -> String {
        self.words.join(" ")
    }
}

/// Run a single search
pub async fn run(ctx: &AppContext, args: SearchArgs) -> anyhow::Result<()> {
    ctx.cache.sweep().await;

    let kind = args.kind.unwrap_or(ctx.config.search.default_kind);
    let models = if !kind.uses_models() {
        Vec::new()
    } else if args.models.is_empty() {
        super::initial_models(&ctx.config.search.default_models, ctx.backend.as_ref()).await
    } else {
        args.models.clone()
    };

    let intent = SearchIntent::new(args.query(), kind, models);
    let renderer = TerminalRenderer::stdout(ctx.config.search.display_names.clone());

    match ctx.pipeline().run(&intent, &renderer).await {
        SearchView::Failed(failure) => anyhow::bail!("{} search failed", failure.kind),
        SearchView::Prompt { message } => anyhow::bail!(message),
        _ => Ok(()),
    }
}
