//! Fan-out across the panel and assembly of the result mapping.
//!
//! Every panel member is queried concurrently with the same prompt. A
//! member's failure is recorded as data in its own slot and never affects
//! its siblings; the aggregate resolves once every member has an outcome.

use super::parser::parse_candidates;
use super::prompt::{build_prompt, DEFAULT_PROMPT_TEMPLATE, DEFAULT_TOP_K};
use super::resolver::{resolve_rank, MatchPolicy};
use crate::backend::ChatClient;
use crate::models::{BackendOutcome, ModelId, RankingRequest, RankingResult};
use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for the aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Backends queried for every request, in report order.
    pub panel: Vec<ModelId>,
    pub top_k: usize,
    pub prompt_template: String,
    pub match_policy: MatchPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            panel: Vec::new(),
            top_k: DEFAULT_TOP_K,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            match_policy: MatchPolicy::Exact,
        }
    }
}

/// Queries the panel and builds one [`RankingResult`] per request.
pub struct Aggregator {
    client: ChatClient,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(client: ChatClient, config: AggregatorConfig) -> Self {
        Self { client, config }
    }

    /// Validate raw input, then rank. Invalid input never reaches a backend.
    #[cfg(test)]
    pub async fn run(
        &self,
        company: &str,
        industry: &str,
    ) -> Result<RankingResult, crate::error::RequestError> {
        let request = RankingRequest::new(company, industry)?;
        Ok(self.rank(&request).await)
    }

    /// Rank the company with every panel member.
    #[cfg(test)]
    pub async fn rank(&self, request: &RankingRequest) -> RankingResult {
        self.rank_with_progress(request, |_, _| {}).await
    }

    /// Like [`Aggregator::rank`], calling `on_outcome` as each member finishes.
    pub async fn rank_with_progress<F>(
        &self,
        request: &RankingRequest,
        on_outcome: F,
    ) -> RankingResult
    where
        F: Fn(&ModelId, &BackendOutcome),
    {
        let start = Instant::now();
        let prompt = build_prompt(
            &self.config.prompt_template,
            request.industry(),
            self.config.top_k,
        );

        info!(
            "Ranking {:?} in {:?} across {} backends",
            request.company(),
            request.industry(),
            self.config.panel.len()
        );
        debug!("Prompt: {}", prompt);

        let prompt = prompt.as_str();
        let on_outcome = &on_outcome;

        // join_all yields outputs in input order, so each member owns its slot.
        let units = self.config.panel.iter().map(|model| async move {
            let outcome = self.query_one(model, prompt, request.company()).await;
            on_outcome(model, &outcome);
            (model.clone(), outcome)
        });
        let entries = join_all(units).await;

        info!(
            "Collected {} outcomes in {:.2}s",
            entries.len(),
            start.elapsed().as_secs_f64()
        );

        RankingResult::new(self.config.top_k, entries)
    }

    async fn query_one(&self, model: &ModelId, prompt: &str, company: &str) -> BackendOutcome {
        match self.client.complete(model, prompt).await {
            Ok(text) => {
                let candidates = parse_candidates(&text);
                debug!("{} listed {} candidates", model, candidates.len());
                resolve_rank(&candidates, company, self.config.match_policy)
            }
            Err(e) => {
                warn!("{} failed: {}", model, e);
                BackendOutcome::Failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ClientConfig;
    use crate::error::RequestError;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn aggregator(api_url: String, api_key: Option<&str>, panel: &[&str]) -> Aggregator {
        let client = ChatClient::new(ClientConfig {
            api_url,
            api_key: api_key.map(String::from),
            timeout_seconds: 5,
        })
        .unwrap();

        Aggregator::new(
            client,
            AggregatorConfig {
                panel: panel.iter().map(|m| ModelId::from(*m)).collect(),
                ..AggregatorConfig::default()
            },
        )
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"content": content}}]})
    }

    #[tokio::test]
    async fn test_end_to_end_mixed_outcomes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat")
                    .json_body_partial(r#"{"model": "m1"}"#);
                then.status(200).json_body(completion("Acme, Foo, Bar"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat")
                    .json_body_partial(r#"{"model": "m2"}"#);
                then.status(500).body("internal error");
            })
            .await;

        let agg = aggregator(server.url("/chat"), Some("key"), &["m1", "m2"]);
        let result = agg.run("foo", "widgets").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.get("m1"), Some(&BackendOutcome::Ranked(2)));
        assert_eq!(result.get("m1").unwrap().describe(result.top_k()), "#2");

        let m2 = result.get("m2").unwrap();
        assert!(m2.is_failure());
        assert!(m2.describe(result.top_k()).contains("500"));
    }

    #[tokio::test]
    async fn test_every_member_gets_exactly_one_outcome() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat")
                    .json_body_partial(r#"{"model": "ok"}"#);
                then.status(200).json_body(completion("Zeta, Acme"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat")
                    .json_body_partial(r#"{"model": "garbled"}"#);
                then.status(200).body("not json");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat")
                    .json_body_partial(r#"{"model": "upstream"}"#);
                then.status(200)
                    .json_body(json!({"error": {"message": "overloaded"}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat")
                    .json_body_partial(r#"{"model": "absent"}"#);
                then.status(200).json_body(completion("Zeta, Omega"));
            })
            .await;

        let agg = aggregator(
            server.url("/chat"),
            Some("key"),
            &["ok", "garbled", "upstream", "absent"],
        );
        let request = RankingRequest::new("ACME", "widgets").unwrap();
        let result = agg.rank(&request).await;

        let models: Vec<&str> = result.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(models, vec!["ok", "garbled", "upstream", "absent"]);
        assert_eq!(result.get("ok"), Some(&BackendOutcome::Ranked(2)));
        assert_eq!(
            result.get("garbled"),
            Some(&BackendOutcome::Failure("malformed response".to_string()))
        );
        assert_eq!(
            result.get("upstream"),
            Some(&BackendOutcome::Failure(
                "upstream error: overloaded".to_string()
            ))
        );
        assert_eq!(result.get("absent"), Some(&BackendOutcome::NotListed));
    }

    #[tokio::test]
    async fn test_all_members_sent_identical_prompt() {
        let server = MockServer::start_async().await;
        let expected = build_prompt(DEFAULT_PROMPT_TEMPLATE, "space travel", DEFAULT_TOP_K);
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat")
                    .body_contains(format!(r#""content":"{}""#, expected));
                then.status(200).json_body(completion("Acme"));
            })
            .await;

        let agg = aggregator(server.url("/chat"), Some("key"), &["a", "b", "c"]);
        let result = agg.run("acme", "space travel").await.unwrap();

        mock.assert_hits_async(3).await;
        assert!(result.iter().all(|(_, o)| *o == BackendOutcome::Ranked(1)));
    }

    #[tokio::test]
    async fn test_invalid_request_makes_no_calls() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat");
                then.status(200).json_body(completion("Acme"));
            })
            .await;

        let agg = aggregator(server.url("/chat"), Some("key"), &["m1", "m2"]);

        assert_eq!(
            agg.run("", "widgets").await,
            Err(RequestError::MissingCompany)
        );
        assert_eq!(
            agg.run("acme", "  ").await,
            Err(RequestError::MissingIndustry)
        );
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_missing_credential_is_per_member() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat");
                then.status(200).json_body(completion("Acme"));
            })
            .await;

        let agg = aggregator(server.url("/chat"), None, &["m1", "m2"]);
        let result = agg.run("acme", "widgets").await.unwrap();

        assert_eq!(result.len(), 2);
        for (_, outcome) in result.iter() {
            assert_eq!(
                *outcome,
                BackendOutcome::Failure("missing credential".to_string())
            );
        }
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_members_run_concurrently() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat");
                then.status(200)
                    .delay(Duration::from_millis(600))
                    .json_body(completion("Acme"));
            })
            .await;

        let agg = aggregator(server.url("/chat"), Some("key"), &["m1", "m2", "m3", "m4"]);
        let request = RankingRequest::new("acme", "widgets").unwrap();

        let start = Instant::now();
        let result = agg.rank(&request).await;
        let elapsed = start.elapsed();

        assert_eq!(result.len(), 4);
        assert!(elapsed >= Duration::from_millis(600));
        // Sequential execution would take at least 2.4s.
        assert!(elapsed < Duration::from_millis(1800), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_timeout_only_fails_the_slow_member() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat")
                    .json_body_partial(r#"{"model": "slow"}"#);
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(completion("Acme"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat")
                    .json_body_partial(r#"{"model": "fast"}"#);
                then.status(200).json_body(completion("Acme, Foo"));
            })
            .await;

        let client = ChatClient::new(ClientConfig {
            api_url: server.url("/chat"),
            api_key: Some("key".to_string()),
            timeout_seconds: 1,
        })
        .unwrap();
        let agg = Aggregator::new(
            client,
            AggregatorConfig {
                panel: vec![ModelId::from("slow"), ModelId::from("fast")],
                ..AggregatorConfig::default()
            },
        );
        let request = RankingRequest::new("acme", "widgets").unwrap();

        let start = Instant::now();
        let result = agg.rank(&request).await;
        let elapsed = start.elapsed();

        assert_eq!(
            result.get("slow"),
            Some(&BackendOutcome::Failure("timeout".to_string()))
        );
        assert_eq!(result.get("fast"), Some(&BackendOutcome::Ranked(1)));
        // Bounded by the 1s call timeout, not the 3s server delay.
        assert!(elapsed >= Duration::from_millis(900), "took {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(2500), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_progress_callback_sees_every_member() {
        let agg = aggregator("http://127.0.0.1:9/chat".to_string(), None, &["m1", "m2", "m3"]);
        let request = RankingRequest::new("acme", "widgets").unwrap();
        let seen = AtomicUsize::new(0);

        let result = agg
            .rank_with_progress(&request, |_, outcome| {
                assert!(outcome.is_failure());
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(result.len(), 3);
    }
}
