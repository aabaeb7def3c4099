//! Optional remote priority model (OpenAI-compatible chat completions).
//!
//! Any failure (missing key, network, HTTP error, unparseable reply) falls
//! back to the rule engine, so callers always get a 1..=5 priority.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use jot_core::{PriorityModel, RuleModel, TaskInput};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tokio::runtime::RuntimeFlavor;

use crate::config::InferenceSection;

const SYSTEM_PROMPT: &str = "You rate personal tasks. Reply with a single digit from 1 to 5: \
1 = most urgent/important, 3 = normal, 5 = can wait. No other text.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct LlmPriorityModel {
    model: String,
    endpoint: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
    fallback: RuleModel,
}

impl LlmPriorityModel {
    /// Reads the API key from the env var named by `api_key_env`.
    pub fn from_config(section: &InferenceSection) -> Result<Self> {
        let api_key = std::env::var(&section.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("{} is not set", section.api_key_env))?;
        Self::with_key(section, api_key)
    }

    pub fn with_key(section: &InferenceSection, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self {
            model: section.model.clone(),
            endpoint: format!("{}/v1/chat/completions", section.base_url.trim_end_matches('/')),
            api_key,
            temperature: section.temperature,
            client,
            fallback: RuleModel,
        })
    }

    async fn ask(&self, task: &TaskInput, today: NaiveDate) -> Result<u8> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: String,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Msg {
                    role: "user",
                    content: task_prompt(task, today),
                },
            ],
            temperature: self.temperature,
            max_tokens: 4,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("priority model request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("priority model error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse priority model response")?;
        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        parse_priority_reply(&content)
            .with_context(|| format!("no priority in reply: {:?}", content.trim()))
    }
}

impl PriorityModel for LlmPriorityModel {
    fn name(&self) -> &str {
        &self.model
    }

    fn recommend(&self, task: &TaskInput, today: NaiveDate) -> u8 {
        match block_on(self.ask(task, today)) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(model = %self.model, "remote priority failed, using rules: {e:#}");
                self.fallback.recommend(task, today)
            }
        }
    }
}

/// Pick the model named by `[inference] provider`.
pub fn build_model(section: &InferenceSection) -> Result<Arc<dyn PriorityModel>> {
    match section.provider.as_str() {
        "rules" => Ok(Arc::new(RuleModel)),
        "openai" => match LlmPriorityModel::from_config(section) {
            Ok(m) => {
                tracing::info!(model = %section.model, "using remote priority model");
                Ok(Arc::new(m))
            }
            Err(e) => {
                tracing::warn!("remote priority model unavailable, using rules: {e:#}");
                Ok(Arc::new(RuleModel))
            }
        },
        other => bail!("unknown inference provider: {other} (expected \"rules\" or \"openai\")"),
    }
}

/// First ASCII digit of the reply, if it is 1..=5.
pub fn parse_priority_reply(reply: &str) -> Option<u8> {
    let digit = reply.chars().find(|c| c.is_ascii_digit())?;
    let p = digit.to_digit(10)? as u8;
    (1..=5).contains(&p).then_some(p)
}

fn task_prompt(task: &TaskInput, today: NaiveDate) -> String {
    let field = |v: &Option<String>| v.as_deref().unwrap_or("").to_string();
    format!(
        "Today: {today}\nTitle: {}\nDescription: {}\nStatus: {}\nDue date: {}\nCurrent priority: {}",
        field(&task.title),
        field(&task.description),
        field(&task.status),
        field(&task.due_date),
        task.valid_priority().map(|p| p.to_string()).unwrap_or_default(),
    )
}

/// Run `fut` to completion from synchronous code.
///
/// Inside a runtime this needs the multi-thread flavor (`#[tokio::main]`);
/// on a current-thread runtime it returns an error instead of blocking, and
/// the caller falls back to the rules.
fn block_on<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            if handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
                bail!("remote priority model needs the multi-thread tokio runtime");
            }
            tokio::task::block_in_place(|| handle.block_on(fut))
        }
        Err(_) => {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(fut)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use jot_core::recommend;
    use serde_json::json;

    fn section(provider: &str) -> InferenceSection {
        InferenceSection {
            provider: provider.to_string(),
            api_key_env: "JOT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 19).unwrap()
    }

    fn urgent_task() -> TaskInput {
        TaskInput {
            title: Some("urgent thing".to_string()),
            priority: Some(json!(4)),
            ..Default::default()
        }
    }

    fn model_at(base_url: &str) -> LlmPriorityModel {
        let section = InferenceSection {
            provider: "openai".to_string(),
            base_url: base_url.to_string(),
            ..Default::default()
        };
        LlmPriorityModel::with_key(&section, "test-key".to_string()).unwrap()
    }

    /// Serve a fixed chat-completions reply on a local port; returns the base URL.
    async fn stub_server(status: StatusCode, reply: &'static str) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || async move {
                (status, Json(json!({ "choices": [{ "message": { "content": reply } }] })))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_uses_remote_reply() {
        let model = model_at(&stub_server(StatusCode::OK, "4").await);
        // Rules alone would say 1.
        assert_eq!(recommend(&urgent_task(), today()), 1);
        assert_eq!(model.recommend(&urgent_task(), today()), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unreachable_endpoint_falls_back_to_rules() {
        let model = model_at("http://127.0.0.1:1");
        let task = urgent_task();
        assert_eq!(model.recommend(&task, today()), recommend(&task, today()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_http_error_falls_back_to_rules() {
        let model = model_at(&stub_server(StatusCode::INTERNAL_SERVER_ERROR, "3").await);
        let task = urgent_task();
        assert_eq!(model.recommend(&task, today()), recommend(&task, today()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unparseable_reply_falls_back_to_rules() {
        let model = model_at(&stub_server(StatusCode::OK, "quite urgent").await);
        let task = urgent_task();
        assert_eq!(model.recommend(&task, today()), recommend(&task, today()));
    }

    #[tokio::test]
    async fn test_current_thread_runtime_falls_back_without_panicking() {
        let model = model_at("http://127.0.0.1:1");
        let task = urgent_task();
        assert_eq!(model.recommend(&task, today()), recommend(&task, today()));
    }

    #[test]
    fn test_without_runtime_builds_its_own() {
        let model = model_at("http://127.0.0.1:1");
        let task = urgent_task();
        assert_eq!(model.recommend(&task, today()), 1);
    }

    #[test]
    fn test_parse_priority_reply() {
        assert_eq!(parse_priority_reply("2"), Some(2));
        assert_eq!(parse_priority_reply(" Priority: 4\n"), Some(4));
        assert_eq!(parse_priority_reply("0"), None);
        assert_eq!(parse_priority_reply("7 maybe 2"), None);
        assert_eq!(parse_priority_reply("high"), None);
        assert_eq!(parse_priority_reply(""), None);
    }

    #[test]
    fn test_build_rules_model() {
        let m = build_model(&section("rules")).unwrap();
        assert_eq!(m.name(), "rules");
    }

    #[test]
    fn test_openai_without_key_falls_back_to_rules() {
        let m = build_model(&section("openai")).unwrap();
        assert_eq!(m.name(), "rules");
    }

    #[test]
    fn test_unknown_provider() {
        let err = build_model(&section("oracle")).err().unwrap();
        assert!(err.to_string().contains("oracle"));
    }

    #[test]
    fn test_prompt_mentions_fields() {
        let input = TaskInput {
            title: Some("Ship release".to_string()),
            due_date: Some("2026-03-01".to_string()),
            priority: Some(serde_json::json!(2)),
            ..Default::default()
        };
        let p = task_prompt(&input, today());
        assert!(p.contains("Today: 2026-02-19"));
        assert!(p.contains("Title: Ship release"));
        assert!(p.contains("Due date: 2026-03-01"));
        assert!(p.contains("Current priority: 2"));
    }
}
