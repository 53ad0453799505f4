//! Engine endpoint URLs.

use reqwest::Url;

/// Strips trailing slashes so endpoints can be appended without doubling them.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Joins `endpoint` onto the engine's base URL.
///
/// ```
/// use hilos::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434/v1/", "/chat/completions"),
///     "http://localhost:11434/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}

/// Checks that a configured base URL is an absolute http(s) URL.
pub fn validate_base_url(base_url: &str) -> Result<String, String> {
    let normalized = normalize_base_url(base_url);
    let url = Url::parse(&normalized).map_err(|err| format!("Invalid URL '{base_url}': {err}"))?;
    match url.scheme() {
        "http" | "https" => Ok(normalized),
        other => Err(format!(
            "Invalid URL '{base_url}': expected http or https, got {other}"
        )),
    }
}
