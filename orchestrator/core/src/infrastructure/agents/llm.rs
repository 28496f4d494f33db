// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

// LLM Agent Adapter
//
// Anti-Corruption Layer for OpenAI-compatible chat-completion endpoints
// (OpenAI, Ollama's /v1 surface, LM Studio, vLLM). Each role maps to its own
// prompt pipeline; the Researcher and Critic chain two completions
// (gather -> condense, analyze -> feedback).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentCapability, AgentContext, AgentError, AgentRole};

/// Context key carrying the previous task's output into the next prompt
const PREVIOUS_RESULT_KEY: &str = "previous_result";

pub struct LlmAgent {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl LlmAgent {
    pub fn new(endpoint: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            model,
            api_key,
        }
    }

    fn system_prompt(role: AgentRole) -> &'static str {
        match role {
            AgentRole::Planner => {
                "You are a project planning agent. Produce a concrete, actionable \
                 plan for the checklist task you are given."
            }
            AgentRole::RiskAnalyst => {
                "You are a risk analysis agent. Identify the risks behind the \
                 checklist task you are given and propose mitigations."
            }
            AgentRole::Scheduler => {
                "You are a scheduling agent. Lay out the timeline and sequencing \
                 for the checklist task you are given."
            }
            AgentRole::Researcher => {
                "You are a research agent. Ground your answers in verifiable facts."
            }
            AgentRole::Critic => {
                "You are a critical reviewer. Be direct and specific."
            }
        }
    }

    async fn complete(&self, system: &str, user: String) -> Result<String, AgentError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Timeout
            } else {
                AgentError::Unavailable(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::Unavailable(format!(
                "HTTP {status}: {error_text}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::MalformedResponse(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(AgentError::MalformedResponse(
                "completion contained no content".to_string(),
            ));
        }

        Ok(content)
    }

    fn task_prompt(input: &str, context: &AgentContext) -> String {
        match context.get(PREVIOUS_RESULT_KEY) {
            Some(previous) => {
                format!("{input}\n\nContext from the previous task:\n{previous}")
            }
            None => input.to_string(),
        }
    }
}

#[async_trait]
impl AgentCapability for LlmAgent {
    async fn invoke(
        &self,
        role: AgentRole,
        input: &str,
        context: &mut AgentContext,
    ) -> Result<String, AgentError> {
        let system = Self::system_prompt(role);
        let prompt = Self::task_prompt(input, context);

        let output = match role {
            AgentRole::Researcher => {
                let findings = self
                    .complete(system, format!("Conduct a comprehensive research on: {prompt}"))
                    .await?;
                self.complete(
                    system,
                    format!("Summarize these research findings concisely: {findings}"),
                )
                .await?
            }
            AgentRole::Critic => {
                let analysis = self
                    .complete(system, format!("Analyze this solution critically: {prompt}"))
                    .await?;
                self.complete(
                    system,
                    format!("Based on this analysis, provide constructive feedback: {analysis}"),
                )
                .await?
            }
            _ => self.complete(system, prompt).await?,
        };

        context.set(PREVIOUS_RESULT_KEY, output.clone());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_prompt_includes_previous_result_when_present() {
        let mut context = AgentContext::new();
        assert_eq!(LlmAgent::task_prompt("Define scope", &context), "Define scope");

        context.set(PREVIOUS_RESULT_KEY, "scope: payments only");
        let prompt = LlmAgent::task_prompt("Draft schedule", &context);
        assert!(prompt.starts_with("Draft schedule"));
        assert!(prompt.contains("scope: payments only"));
    }

    fn completion_body(content: &str) -> String {
        format!(
            r#"{{"choices":[{{"message":{{"role":"assistant","content":"{content}"}}}}]}}"#
        )
    }

    #[tokio::test]
    async fn planner_invocation_is_a_single_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("a concrete plan"))
            .expect(1)
            .create_async()
            .await;

        let agent = LlmAgent::new(format!("{}/v1", server.url()), "test-model".to_string(), None);
        let mut context = AgentContext::new();

        let output = agent
            .invoke(AgentRole::Planner, "Define the detailed project scope", &mut context)
            .await
            .unwrap();

        assert_eq!(output, "a concrete plan");
        assert_eq!(context.get(PREVIOUS_RESULT_KEY), Some("a concrete plan"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn researcher_invocation_chains_two_completions() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("findings"))
            .expect(2)
            .create_async()
            .await;

        let agent = LlmAgent::new(format!("{}/v1", server.url()), "test-model".to_string(), None);
        let mut context = AgentContext::new();

        agent
            .invoke(AgentRole::Researcher, "Collect detailed requirements", &mut context)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_surface_as_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let agent = LlmAgent::new(format!("{}/v1", server.url()), "test-model".to_string(), None);
        let mut context = AgentContext::new();

        let err = agent
            .invoke(AgentRole::Planner, "anything", &mut context)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Unavailable(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn empty_choices_surface_as_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let agent = LlmAgent::new(format!("{}/v1", server.url()), "test-model".to_string(), None);
        let mut context = AgentContext::new();

        let err = agent
            .invoke(AgentRole::Planner, "anything", &mut context)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse(_)));
    }
}
