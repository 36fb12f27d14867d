use crate::config::AppConfig;
use crate::protocol::dashscope::AppParameters;
use crate::protocol::openai_chat::ChatCompletionRequest;

const LOW_EFFORT: &str = "low";

/// Per-request thinking switches sent to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkingParams {
    pub has_thoughts: bool,
    pub enable_thinking: bool,
    pub incremental_output: bool,
}

impl From<ThinkingParams> for AppParameters {
    fn from(params: ThinkingParams) -> Self {
        Self {
            incremental_output: params.incremental_output,
            has_thoughts: params.has_thoughts,
            enable_thinking: params.enable_thinking,
        }
    }
}

/// Fallbacks consulted when a request does not decide for itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThinkingDefaults<'a> {
    /// Effort assumed when the request carries no `reasoning_effort`.
    pub reasoning_effort: Option<&'a str>,
    pub enable_thinking: Option<bool>,
    pub has_thoughts: Option<bool>,
}

impl<'a> ThinkingDefaults<'a> {
    #[must_use]
    pub fn for_app(app: &AppConfig, default_effort: Option<&'a str>) -> Self {
        Self {
            reasoning_effort: default_effort,
            enable_thinking: app.enable_thinking,
            has_thoughts: app.has_thoughts,
        }
    }
}

/// Decide `has_thoughts` / `enable_thinking` / `incremental_output`.
///
/// A reasoning effort (from the request, else the configured default) wins
/// outright: `low` enables thinking without surfacing thoughts, any other
/// level enables both. A blank request value counts as absent. Without one, each switch comes from the request's
/// extra boolean field, then the app default, then `false`.
#[must_use]
pub fn resolve_thinking_params(
    request: &ChatCompletionRequest,
    defaults: ThinkingDefaults<'_>,
) -> ThinkingParams {
    let incremental_output = request.extra_bool("incremental_output").unwrap_or(true);

    let effort = request
        .reasoning_effort
        .as_deref()
        .map(str::trim)
        .filter(|effort| !effort.is_empty())
        .or(defaults.reasoning_effort);
    if let Some(effort) = effort {
        return ThinkingParams {
            has_thoughts: !effort.trim().eq_ignore_ascii_case(LOW_EFFORT),
            enable_thinking: true,
            incremental_output,
        };
    }

    ThinkingParams {
        has_thoughts: request
            .extra_bool("has_thoughts")
            .or(defaults.has_thoughts)
            .unwrap_or(false),
        enable_thinking: request
            .extra_bool("enable_thinking")
            .or(defaults.enable_thinking)
            .unwrap_or(false),
        incremental_output,
    }
}
