use serde::Serialize;

/// Header that switches application completions into SSE mode.
pub const SSE_ENABLE_HEADER: &str = "x-dashscope-sse";

/// Body of `POST {base_url}/apps/{app_id}/completion`.
#[derive(Debug, Clone, Serialize)]
pub struct AppCompletionRequest<'a> {
    pub input: AppInput<'a>,
    pub parameters: AppParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppInput<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppParameters {
    pub incremental_output: bool,
    pub has_thoughts: bool,
    pub enable_thinking: bool,
}

/// Build the application completion endpoint URL.
#[must_use]
pub fn app_completion_url(base_url: &str, app_id: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let mut url = String::with_capacity(base.len() + app_id.len() + 18);
    url.push_str(base);
    url.push_str("/apps/");
    url.push_str(app_id);
    url.push_str("/completion");
    url
}
