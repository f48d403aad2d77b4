//! Plain-text renderer for terminals

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::Mutex;

use tracing::warn;

use crate::domain::dispatch::{FailureView, Renderer, ResultSource, SearchView};
use crate::domain::error::ErrorCategory;
use crate::domain::search::{
    QaResponse, RelationshipsResponse, ResultPayload, SearchHit, SearchKind, SearchResponse,
};

/// Related words shown per relation type in word results
const RELATED_PREVIEW: usize = 3;

/// Similarity band for a percentage
pub fn quality_tier(percent: f64) -> &'static str {
    if percent >= 80.0 {
        "high"
    } else if percent >= 60.0 {
        "good"
    } else if percent >= 40.0 {
        "fair"
    } else {
        "low"
    }
}

/// Writes each view as text to the wrapped writer
pub struct TerminalRenderer<W> {
    out: Mutex<W>,
    display_names: BTreeMap<String, String>,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout(display_names: BTreeMap<String, String>) -> Self {
        Self::new(std::io::stdout(), display_names)
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, display_names: BTreeMap<String, String>) -> Self {
        Self {
            out: Mutex::new(out),
            display_names,
        }
    }

    /// Label for a model id; unknown ids are shown upper-cased
    pub fn display_name(&self, model: &str) -> String {
        self.display_names
            .get(model)
            .cloned()
            .unwrap_or_else(|| model.to_uppercase())
    }

    pub fn format(&self, view: &SearchView) -> String {
        match view {
            SearchView::Loading { intent } => {
                format!("Searching {} for \"{}\"...\n", intent.kind(), intent.query())
            }
            SearchView::Results {
                intent,
                payload,
                source,
            } => {
                let mut text = match ResultPayload::parse(intent.kind(), payload) {
                    Ok(ResultPayload::Search(response)) => self.format_search(&response),
                    Ok(ResultPayload::Relationships(response)) => format_relationships(&response),
                    Ok(ResultPayload::Answer(response)) => format_answer(&response),
                    Err(e) => {
                        warn!("{}", e);
                        format!("{}\n", payload)
                    }
                };

                match source {
                    ResultSource::Network => {}
                    ResultSource::Cache => text.push_str("(from cache)\n"),
                    ResultSource::Memory => text.push_str("(restored)\n"),
                }

                text
            }
            SearchView::Cleared => "Results cleared\n".to_string(),
            SearchView::Prompt { message } => format!("! {}\n", message),
            SearchView::Failed(failure) => format_failure(failure),
        }
    }

    fn format_search(&self, response: &SearchResponse) -> String {
        if response.models_used.is_empty() {
            return format!("No results for \"{}\" in any model\n", response.query);
        }

        let kind = if response.kind == SearchKind::Sentences.as_str() {
            "sentence"
        } else {
            "word"
        };

        let mut text = String::new();
        let _ = writeln!(
            text,
            "\"{}\": {} search across {} model(s)",
            response.query,
            kind,
            response.models_used.len()
        );

        for model in &response.models_used {
            let Some(results) = response.search_results.get(model) else {
                continue;
            };

            let _ = writeln!(
                text,
                "\n== {} ({}) - {} result(s)",
                self.display_name(model),
                results.model_name,
                results.results.len()
            );

            if results.results.is_empty() {
                text.push_str("  No results in this model\n");
            }

            for hit in &results.results {
                format_hit(&mut text, hit);
            }
        }

        text
    }
}

fn format_hit(text: &mut String, hit: &SearchHit) {
    let percent = hit.similarity_percent;

    match &hit.sentence {
        Some(sentence) => {
            let _ = writeln!(
                text,
                "  #{} [{:.1}% {}] \"{}\"",
                hit.rank,
                percent,
                quality_tier(percent),
                sentence
            );
        }
        None => {
            let _ = writeln!(
                text,
                "  #{} [{:.1}% {}] {}",
                hit.rank,
                percent,
                quality_tier(percent),
                hit.text()
            );
        }
    }

    for (relation, words) in hit.relationships.iter().flatten() {
        if words.is_empty() {
            continue;
        }

        let preview = words
            .iter()
            .take(RELATED_PREVIEW)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let more = if words.len() > RELATED_PREVIEW { "..." } else { "" };

        let _ = writeln!(text, "      {}: {}{}", relation, preview, more);
    }
}

fn format_relationships(response: &RelationshipsResponse) -> String {
    if response.is_empty() {
        return match &response.message {
            Some(message) => format!("{}\n", message),
            None => format!("No relationships found for \"{}\"\n", response.word),
        };
    }

    let mut text = format!("Relationships of \"{}\"\n", response.word);

    for (relation, words) in &response.relationships {
        if !words.is_empty() {
            let _ = writeln!(text, "  {}: {}", relation, words.join(", "));
        }
    }

    text
}

fn format_answer(response: &QaResponse) -> String {
    let mut text = format!("Q: {}\nA: {}\n", response.question, response.answer);
    let _ = writeln!(text, "confidence {:.2}", response.confidence);

    for (i, sentence) in response.source_sentences.iter().enumerate() {
        match response.similarity_scores.get(i) {
            Some(score) => {
                let _ = writeln!(text, "  [{}] {} ({:.2})", i + 1, sentence, score);
            }
            None => {
                let _ = writeln!(text, "  [{}] {}", i + 1, sentence);
            }
        }
    }

    text
}

fn format_failure(failure: &FailureView) -> String {
    match failure.category {
        ErrorCategory::Network => {
            let what = match failure.kind {
                SearchKind::Relationships => "Could not fetch relationships",
                SearchKind::Qa => "Could not get an answer",
                SearchKind::Sentences | SearchKind::Words => "Search request failed",
            };
            format!(
                "Connection error: {}\n{} ({}). Is the search server running?\n",
                what, failure.message, failure.kind
            )
        }
        ErrorCategory::Backend => format!("Search error: {}\n", failure.message),
        _ => format!("Error: {}\n", failure.message),
    }
}

impl<W> std::fmt::Debug for TerminalRenderer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalRenderer")
            .field("display_names", &self.display_names)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&self, view: &SearchView) {
        let text = self.format(view);

        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(e) => {
                warn!("Output lock poisoned, dropping view: {}", e);
                return;
            }
        };

        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            warn!("Failed to write results: {}", e);
        }
    }
}
