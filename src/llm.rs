//! LLM collaborator: generates a course of action for a ticket from the
//! retrieved context.
//!
//! The call goes to the Gemini `generateContent` REST endpoint with the
//! `GOOGLE_API_KEY` environment variable. Failures at this boundary —
//! missing credential, HTTP error, unparseable response — come back as a
//! descriptive error string, never as a panic or process abort; ingestion
//! and retrieval do not depend on this credential at all.

use std::time::Duration;

use anyhow::{bail, Result};

use crate::config::LlmConfig;
use crate::store::RetrievedChunk;

const SYSTEM_PROMPT: &str = "You are an expert IT support agent. Your task is to analyze a \
support ticket and provide the best course of action based on the provided context. The course \
of action should be concise, actionable, and refer to the context.";

/// Generate a suggested course of action. Errors are folded into the
/// returned string so the calling command can always print something.
pub async fn generate_action(
    config: &LlmConfig,
    ticket_text: &str,
    contexts: &[RetrievedChunk],
) -> String {
    match call_gemini(config, ticket_text, contexts).await {
        Ok(text) => text,
        Err(e) => format!("Error: {:#}", e),
    }
}

/// Assemble the user prompt: ticket text plus each retrieved chunk tagged
/// with its ID and document type. An empty context set is stated
/// explicitly so the model does not hallucinate sources.
fn build_user_prompt(ticket_text: &str, contexts: &[RetrievedChunk]) -> String {
    let mut prompt = format!("Support Ticket:\n```\n{}\n```\n\n", ticket_text);
    prompt.push_str("Relevant Information from Knowledge Base:\n");

    if contexts.is_empty() {
        prompt.push_str("No relevant information was found in the knowledge base.\n");
        prompt.push_str(
            "\nBased on the above support ticket, what is a general best course of action \
             without specific context?",
        );
        return prompt;
    }

    for ctx in contexts {
        prompt.push_str(&format!(
            "\n--- Context from {} (type: {}) ---\n{}\n",
            ctx.id,
            ctx.doc_type(),
            ctx.text
        ));
    }
    prompt.push_str(
        "\nBased on the above support ticket and the relevant information, what is the best \
         course of action?",
    );
    prompt
}

async fn call_gemini(
    config: &LlmConfig,
    ticket_text: &str,
    contexts: &[RetrievedChunk],
) -> Result<String> {
    let api_key = std::env::var("GOOGLE_API_KEY")
        .map_err(|_| anyhow::anyhow!("GOOGLE_API_KEY environment variable not set"))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
        config.model
    );

    let body = serde_json::json!({
        "systemInstruction": {
            "parts": [{ "text": SYSTEM_PROMPT }]
        },
        "contents": [{
            "role": "user",
            "parts": [{ "text": build_user_prompt(ticket_text, contexts) }]
        }],
        "generationConfig": {
            "maxOutputTokens": config.max_output_tokens
        }
    });

    let response = client
        .post(&url)
        .header("x-goog-api-key", api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("Gemini API error {}: {}", status, body_text);
    }

    let json: serde_json::Value = response.json().await?;
    parse_gemini_response(&json)
}

fn parse_gemini_response(json: &serde_json::Value) -> Result<String> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Gemini response: missing candidates"))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        bail!("Gemini response contained no text");
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(id: &str, doc_type: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            id: id.to_string(),
            text: text.to_string(),
            metadata: serde_json::json!({ "type": doc_type }),
            score: 0.9,
        }
    }

    #[test]
    fn test_prompt_tags_contexts_with_id_and_type() {
        let contexts = vec![
            ctx("data/guide.pdf::chunk-0001", "pdf", "restart the service"),
            ctx("data/talk.mp4::chunk-0000", "video_transcript", "as shown in the demo"),
        ];
        let prompt = build_user_prompt("vpn is down", &contexts);
        assert!(prompt.contains("Support Ticket:\n```\nvpn is down\n```"));
        assert!(prompt.contains("Context from data/guide.pdf::chunk-0001 (type: pdf)"));
        assert!(prompt.contains("Context from data/talk.mp4::chunk-0000 (type: video_transcript)"));
        assert!(prompt.contains("restart the service"));
    }

    #[test]
    fn test_prompt_states_empty_context_explicitly() {
        let prompt = build_user_prompt("vpn is down", &[]);
        assert!(prompt.contains("No relevant information was found"));
        assert!(prompt.contains("general best course of action"));
    }

    #[test]
    fn test_parse_gemini_response_joins_parts() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Step one. " }, { "text": "Step two." }] }
            }]
        });
        assert_eq!(parse_gemini_response(&json).unwrap(), "Step one. Step two.");
    }

    #[test]
    fn test_parse_gemini_response_missing_candidates() {
        let json = serde_json::json!({ "error": { "message": "quota" } });
        assert!(parse_gemini_response(&json).is_err());
    }

    #[tokio::test]
    async fn test_missing_credential_becomes_error_string() {
        // Scope the env var away for this test.
        let saved = std::env::var("GOOGLE_API_KEY").ok();
        std::env::remove_var("GOOGLE_API_KEY");

        let out = generate_action(&LlmConfig::default(), "ticket", &[]).await;
        assert!(out.starts_with("Error:"));
        assert!(out.contains("GOOGLE_API_KEY"));

        if let Some(v) = saved {
            std::env::set_var("GOOGLE_API_KEY", v);
        }
    }
}
