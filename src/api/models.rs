use crate::api::ModelsResponse;
use crate::core::engine::EngineError;
use crate::utils::url::construct_api_url;

pub async fn fetch_models(
    client: &reqwest::Client,
    base_url: &str,
    api_key: Option<&str>,
) -> Result<ModelsResponse, EngineError> {
    let models_url = construct_api_url(base_url, "models");
    let mut request = client
        .get(models_url)
        .header("Content-Type", "application/json");
    if let Some(key) = api_key {
        request = request.header("Authorization", format!("Bearer {key}"));
    }

    let response = request
        .send()
        .await
        .map_err(|e| EngineError::Request(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(EngineError::Api(format!(
            "Model listing failed with status {status}: {}",
            error_text.trim()
        )));
    }

    response
        .json::<ModelsResponse>()
        .await
        .map_err(|e| EngineError::Request(e.to_string()))
}

/// Model ids, newest first, then alphabetical.
pub fn sorted_model_ids(response: &ModelsResponse) -> Vec<String> {
    let mut models: Vec<_> = response.data.iter().collect();
    models.sort_by(|a, b| match (a.created, b.created) {
        (Some(a_created), Some(b_created)) => b_created.cmp(&a_created).then(a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
    models.into_iter().map(|model| model.id.clone()).collect()
}

/// Whether `wanted` is served. Tags are optional: `gemma2` matches `gemma2:latest`.
pub fn model_is_listed(available: &[String], wanted: &str) -> bool {
    available.iter().any(|id| {
        id == wanted
            || id
                .strip_suffix(":latest")
                .is_some_and(|untagged| untagged == wanted)
    })
}
