//! Stats and health commands

use crate::domain::search::{HealthResponse, StatsResponse};
use crate::infrastructure::render::TerminalRenderer;
use crate::AppContext;

/// Print corpus and model statistics
pub async fn stats(ctx: &AppContext) -> anyhow::Result<()> {
    let stats = ctx.backend.stats().await?;
    let renderer = TerminalRenderer::stdout(ctx.config.search.display_names.clone());

    print!("{}", format_stats(&stats, &renderer));
    Ok(())
}

/// Print backend health
pub async fn health(ctx: &AppContext) -> anyhow::Result<()> {
    let health = ctx.backend.health().await?;

    print!("{}", format_health(&health));
    Ok(())
}

fn format_stats<W: std::io::Write + Send>(
    stats: &StatsResponse,
    renderer: &TerminalRenderer<W>,
) -> String {
    let mut text = format!(
        "Sentences: {}\nWords: {}\nRelationships: {}\nModels loaded: {}\n",
        stats.sentences_count, stats.words_count, stats.relationships_count, stats.models_loaded
    );

    for model in &stats.available_models {
        let line = match stats.model_details.get(model) {
            Some(details) => format!(
                "  {} ({}): {} words, {} sentences\n",
                renderer.display_name(model),
                model,
                details.words,
                details.sentences
            ),
            None => format!("  {} ({})\n", renderer.display_name(model), model),
        };
        text.push_str(&line);
    }

    text
}

fn format_health(health: &HealthResponse) -> String {
    let mut text = format!(
        "Status: {}\nSearch ready: {}\nRelationships loaded: {}\n",
        health.status, health.search_system_ready, health.relationships_loaded
    );

    if let Some(data) = &health.data_available {
        text.push_str(&format!(
            "Data available: words={} sentences={}\n",
            data.words, data.sentences
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::{DataAvailability, ModelDetails};

    #[test]
    fn test_format_stats_lists_models() {
        let stats = StatsResponse {
            sentences_count: 120,
            words_count: 800,
            models_loaded: 2,
            available_models: vec!["dbmdz_bert".to_string(), "custom".to_string()],
            model_details: [(
                "dbmdz_bert".to_string(),
                ModelDetails {
                    words: 800,
                    sentences: 120,
                },
            )]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        let names = [("dbmdz_bert".to_string(), "BERT Turkish".to_string())]
            .into_iter()
            .collect();
        let renderer = TerminalRenderer::new(Vec::new(), names);

        let text = format_stats(&stats, &renderer);

        assert!(text.contains("Models loaded: 2"));
        assert!(text.contains("  BERT Turkish (dbmdz_bert): 800 words, 120 sentences\n"));
        assert!(text.contains("  CUSTOM (custom)\n"));
    }

    #[test]
    fn test_format_health() {
        let health = HealthResponse {
            status: "healthy".to_string(),
            search_system_ready: true,
            data_available: Some(DataAvailability {
                words: true,
                sentences: false,
            }),
            ..Default::default()
        };

        let text = format_health(&health);

        assert!(text.starts_with("Status: healthy\nSearch ready: true\n"));
        assert!(text.ends_with("Data available: words=true sentences=false\n"));
    }
}
