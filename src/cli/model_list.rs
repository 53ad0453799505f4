//! `hilos models`: what the configured engine serves.

use std::error::Error;
use std::io::Write;

use crate::api::models::model_is_listed;
use crate::core::chat_stream::HttpEngine;

pub async fn list_models(engine: &HttpEngine, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let settings = engine.settings();
    let models = engine.list_models().await?;

    writeln!(out, "🤖 Models served at {}", settings.base_url)?;
    writeln!(out)?;

    if models.is_empty() {
        writeln!(out, "No models reported by the engine.")?;
        return Ok(());
    }

    for model in &models {
        let marker = if model_is_listed(std::slice::from_ref(model), &settings.model) {
            "  (configured)"
        } else {
            ""
        };
        writeln!(out, "  • {model}{marker}")?;
    }

    if !model_is_listed(&models, &settings.model) {
        writeln!(out)?;
        writeln!(
            out,
            "⚠️  The configured model '{}' is not among them.",
            settings.model
        )?;
    }
    Ok(())
}
