//! Gemini conversion helpers (pure functions)
//!
//! Outbound: chat messages, tools and generation parameters into a typed
//! `GenerateContentRequest`. Inbound: response candidates into normalized
//! [`CompletionChoice`] values. Neither direction performs I/O.
//!
//! The inbound side is total: any combination of missing fields yields a
//! choice, never an error or a panic.

use crate::error::LlmError;
use crate::types::{
    ChatMessage, CompletionChoice, GenerateConfig, ModelOutput, ModelUsage, StopReason, ToolCall,
    ToolChoice, ToolInfo,
};

use super::types::{
    Candidate, Content, FinishReason, FunctionCall, FunctionCallingConfig, FunctionCallingMode,
    FunctionDeclaration, FunctionResponse, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part, SafetySetting, ThinkingConfig, Tool, ToolConfig, UsageMetadata,
};

// ================================================================================================
// Response normalization
// ================================================================================================

/// Map a Gemini finish reason onto the framework's stop reasons.
///
/// `STOP` becomes `ToolCalls` when the candidate carries function calls.
pub fn map_finish_reason(reason: Option<FinishReason>, has_tool_calls: bool) -> StopReason {
    match reason {
        Some(FinishReason::Stop) if has_tool_calls => StopReason::ToolCalls,
        Some(FinishReason::Stop) => StopReason::Stop,
        Some(FinishReason::MaxTokens) => StopReason::Length,
        Some(
            FinishReason::Safety
            | FinishReason::Recitation
            | FinishReason::Blocklist
            | FinishReason::ProhibitedContent
            | FinishReason::Spii
            | FinishReason::ImageSafety,
        ) => StopReason::ContentFilter,
        Some(
            FinishReason::FinishReasonUnspecified
            | FinishReason::Language
            | FinishReason::Other
            | FinishReason::MalformedFunctionCall
            | FinishReason::UnexpectedToolCall
            | FinishReason::Unrecognized,
        )
        | None => StopReason::Unknown,
    }
}

/// `None` for calls without a name; nothing could dispatch them.
fn tool_call_from_function_call(call: &FunctionCall) -> Option<ToolCall> {
    let name = call.name.as_deref().filter(|name| !name.is_empty())?;
    let id = call
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .unwrap_or(name);
    let arguments = call
        .args
        .clone()
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
    Some(ToolCall::function(id, name, arguments))
}

/// Normalize one candidate into exactly one choice.
pub fn completion_choice_from_candidate(index: usize, candidate: &Candidate) -> CompletionChoice {
    let parts = candidate
        .content
        .as_ref()
        .map(Content::parts)
        .unwrap_or_default();

    let mut content = String::new();
    let mut reasoning: Option<String> = None;
    let mut tool_calls = Vec::new();

    for part in parts {
        if let Some(text) = &part.text {
            if part.is_thought() {
                reasoning.get_or_insert_with(String::new).push_str(text);
            } else {
                content.push_str(text);
            }
        }
        if let Some(call) = part.function_call.as_ref().and_then(tool_call_from_function_call) {
            tool_calls.push(call);
        }
    }

    let stop_reason = map_finish_reason(candidate.finish_reason, !tool_calls.is_empty());

    CompletionChoice {
        index: candidate
            .index
            .and_then(|i| usize::try_from(i).ok())
            .unwrap_or(index),
        content,
        reasoning,
        stop_reason,
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
    }
}

fn usage_from_metadata(usage: &UsageMetadata) -> ModelUsage {
    let input_tokens = usage.prompt_token_count.unwrap_or(0);
    let output_tokens = usage.candidates_token_count.unwrap_or(0);
    ModelUsage {
        input_tokens,
        output_tokens,
        total_tokens: usage
            .total_token_count
            .unwrap_or(input_tokens.saturating_add(output_tokens)),
        reasoning_tokens: usage.thoughts_token_count,
        input_tokens_cache_read: usage.cached_content_token_count,
    }
}

/// Normalize a whole response.
///
/// Candidates keep their order. A response without candidates whose prompt
/// was blocked yields a single `ContentFilter` choice describing the block.
pub fn model_output_from_response(
    response: &GenerateContentResponse,
    requested_model: &str,
) -> ModelOutput {
    let mut choices: Vec<CompletionChoice> = response
        .candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| completion_choice_from_candidate(index, candidate))
        .collect();

    let blocked = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref().map(|r| (r, feedback)));
    if let (true, Some((reason, feedback))) = (choices.is_empty(), blocked) {
        let content = match feedback.block_reason_message.as_deref() {
            Some(message) => format!("Prompt blocked ({reason}): {message}"),
            None => format!("Prompt blocked ({reason})"),
        };
        choices.push(CompletionChoice {
            index: 0,
            content,
            reasoning: None,
            stop_reason: StopReason::ContentFilter,
            tool_calls: None,
        });
    }

    ModelOutput {
        model: response
            .model_version
            .clone()
            .unwrap_or_else(|| requested_model.to_string()),
        choices,
        usage: response.usage_metadata.as_ref().map(usage_from_metadata),
        response_id: response.response_id.clone(),
    }
}

// ================================================================================================
// Request construction
// ================================================================================================

fn function_response_part(
    tool_call_id: &str,
    function: &str,
    content: &str,
    error: Option<&str>,
) -> Part {
    let response = match error {
        Some(error) => serde_json::json!({ "error": error }),
        None => serde_json::json!({ "content": content }),
    };
    // Ids that merely echo the function name were synthesized on the way in
    let id = (tool_call_id != function && !tool_call_id.is_empty()).then(|| tool_call_id.to_string());
    Part::function_response(FunctionResponse {
        id,
        name: function.to_string(),
        response,
    })
}

/// Split system messages out and convert the rest into Gemini contents.
///
/// Consecutive tool results are grouped into one `user` turn.
pub fn convert_messages(
    messages: &[ChatMessage],
) -> Result<(Option<Content>, Vec<Content>), LlmError> {
    let mut system_texts: Vec<&str> = Vec::new();
    let mut contents: Vec<Content> = Vec::new();
    let mut pending_results: Vec<Part> = Vec::new();

    for message in messages {
        if !matches!(message, ChatMessage::Tool { .. }) && !pending_results.is_empty() {
            contents.push(Content::new("user", std::mem::take(&mut pending_results)));
        }

        match message {
            ChatMessage::System { content } => {
                if !content.trim().is_empty() {
                    system_texts.push(content);
                }
            }
            ChatMessage::User { content } => {
                contents.push(Content::new("user", vec![Part::text(content.clone())]));
            }
            ChatMessage::Assistant {
                content,
                tool_calls,
            } => {
                let mut parts = Vec::new();
                if !content.is_empty() {
                    parts.push(Part::text(content.clone()));
                }
                for call in tool_calls.iter().flatten() {
                    parts.push(Part::function_call(FunctionCall {
                        id: (call.id != call.function).then(|| call.id.clone()),
                        name: Some(call.function.clone()),
                        args: Some(call.arguments.clone()),
                    }));
                }
                if !parts.is_empty() {
                    contents.push(Content::new("model", parts));
                }
            }
            ChatMessage::Tool {
                tool_call_id,
                function,
                content,
                error,
            } => {
                pending_results.push(function_response_part(
                    tool_call_id,
                    function,
                    content,
                    error.as_deref(),
                ));
            }
        }
    }
    if !pending_results.is_empty() {
        contents.push(Content::new("user", pending_results));
    }

    if contents.is_empty() {
        return Err(LlmError::InvalidParameter(
            "at least one non-system message is required".to_string(),
        ));
    }

    let system_instruction = (!system_texts.is_empty())
        .then(|| Content {
            parts: Some(vec![Part::text(system_texts.join("\n\n"))]),
            role: None,
        });

    Ok((system_instruction, contents))
}

/// Convert tool definitions into a single `functionDeclarations` tool.
pub fn convert_tools(tools: &[ToolInfo]) -> Option<Vec<Tool>> {
    if tools.is_empty() {
        return None;
    }
    let function_declarations = tools
        .iter()
        .map(|tool| FunctionDeclaration {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        })
        .collect();
    Some(vec![Tool {
        function_declarations,
    }])
}

/// Convert a tool choice into Gemini's `toolConfig`.
pub fn convert_tool_choice(choice: &ToolChoice) -> ToolConfig {
    let (mode, allowed_function_names) = match choice {
        ToolChoice::Auto => (FunctionCallingMode::Auto, None),
        ToolChoice::Any => (FunctionCallingMode::Any, None),
        ToolChoice::None => (FunctionCallingMode::None, None),
        ToolChoice::Function(name) => (FunctionCallingMode::Any, Some(vec![name.clone()])),
    };
    ToolConfig {
        function_calling_config: FunctionCallingConfig {
            mode,
            allowed_function_names,
        },
    }
}

fn clamp_to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Convert generation parameters; `None` when nothing is set.
pub fn convert_generation_config(config: &GenerateConfig) -> Option<GenerationConfig> {
    let thinking_config = config.reasoning_tokens.map(|budget| ThinkingConfig {
        thinking_budget: Some(budget),
        include_thoughts: (budget != 0).then_some(true),
    });

    let generation = GenerationConfig {
        candidate_count: config.num_choices.map(clamp_to_i32),
        stop_sequences: config.stop_seqs.clone(),
        max_output_tokens: config.max_tokens.map(clamp_to_i32),
        temperature: config.temperature,
        top_p: config.top_p,
        top_k: config.top_k.map(clamp_to_i32),
        seed: config.seed,
        presence_penalty: config.presence_penalty,
        frequency_penalty: config.frequency_penalty,
        response_mime_type: config
            .response_schema
            .as_ref()
            .map(|_| "application/json".to_string()),
        response_schema: config.response_schema.clone(),
        thinking_config,
    };

    (generation != GenerationConfig::default()).then_some(generation)
}

/// Assemble the full request body.
///
/// `safety_settings` is the already-mapped list; it is attached verbatim.
pub fn build_generate_request(
    input: &[ChatMessage],
    tools: &[ToolInfo],
    tool_choice: Option<&ToolChoice>,
    config: &GenerateConfig,
    safety_settings: Vec<SafetySetting>,
) -> Result<GenerateContentRequest, LlmError> {
    let (system_instruction, contents) = convert_messages(input)?;
    let tools = convert_tools(tools);
    let tool_config = tools
        .as_ref()
        .and(tool_choice)
        .map(convert_tool_choice);

    Ok(GenerateContentRequest {
        contents,
        system_instruction,
        tools,
        tool_config,
        safety_settings: Some(safety_settings),
        generation_config: convert_generation_config(config),
    })
}
