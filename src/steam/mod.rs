//! Steam Web API client.
//!
//! Two read-only calls are needed: item details from `ISteamRemoteStorage` and
//! player summaries from `ISteamUser`. Responses are returned as raw JSON;
//! the helpers at the bottom of this module pull the record arrays out of
//! Steam's `{"response": {...}}` envelope.
//!
//! There is no retry and no caching. Every request carries the configured
//! timeout, and a timeout surfaces like any other transport failure.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::SteamConfig;
use crate::errors::{PreviewError, PreviewResult};
use crate::traits::{Ids, WorkshopApi};

pub struct SteamClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl SteamClient {
    pub fn new(config: &SteamConfig) -> PreviewResult<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, resource: &str, target: &str, version: &str) -> String {
        format!("{}/{resource}/{target}/{version}/", self.api_base)
    }

    async fn read_json(response: reqwest::Response) -> PreviewResult<Value> {
        if !response.status().is_success() {
            return Err(PreviewError::Status(response.status()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WorkshopApi for SteamClient {
    async fn fetch_item_details(&self, ids: Ids) -> PreviewResult<Value> {
        let url = self.endpoint("ISteamRemoteStorage", "GetPublishedFileDetails", "v1");

        let mut form = vec![("itemcount".to_string(), ids.count().to_string())];
        form.extend(
            ids.as_slice()
                .iter()
                .enumerate()
                .map(|(i, id)| (format!("publishedfileids[{i}]"), id.to_string())),
        );

        debug!("Fetching details for {} workshop item(s)", ids.count());
        let response = self.client.post(&url).form(&form).send().await?;
        Self::read_json(response).await
    }

    async fn fetch_author_profiles(&self, ids: Ids) -> PreviewResult<Value> {
        let url = self.endpoint("ISteamUser", "GetPlayerSummaries", "v2");

        debug!("Fetching {} player summar(ies)", ids.count());
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.clone()), ("steamids", ids.joined())])
            .send()
            .await?;
        Self::read_json(response).await
    }
}

/// `response.publishedfiledetails` of a `GetPublishedFileDetails` body.
pub fn published_file_details(body: &Value) -> PreviewResult<&[Value]> {
    body.pointer("/response/publishedfiledetails")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| PreviewError::malformed("missing response.publishedfiledetails"))
}

/// First entry of `response.players`, if Steam knew the id at all.
pub fn first_player(body: &Value) -> PreviewResult<Option<&Value>> {
    body.pointer("/response/players")
        .and_then(Value::as_array)
        .map(|players| players.first())
        .ok_or_else(|| PreviewError::malformed("missing response.players"))
}

/// Steam marks lookups for unknown or private ids with a `result` other than 1.
pub fn is_found(entry: &Value) -> bool {
    entry
        .get("result")
        .and_then(Value::as_i64)
        .is_none_or(|result| result == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SteamClient {
        SteamClient::new(&SteamConfig {
            api_key: "secret".to_string(),
            api_base: server.uri(),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn item_details_posts_indexed_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ISteamRemoteStorage/GetPublishedFileDetails/v1/"))
            .and(body_string_contains("itemcount=2"))
            .and(body_string_contains("publishedfileids%5B0%5D=11"))
            .and(body_string_contains("publishedfileids%5B1%5D=22"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"result": 1, "resultcount": 1, "publishedfiledetails": [{"publishedfileid": "11"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids: &[u64] = &[11, 22];
        let body = client_for(&server).fetch_item_details(ids.into()).await.unwrap();
        assert_eq!(published_file_details(&body).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn scalar_item_id_sends_a_batch_of_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ISteamRemoteStorage/GetPublishedFileDetails/v1/"))
            .and(body_string_contains("itemcount=1"))
            .and(body_string_contains("publishedfileids%5B0%5D=5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"publishedfiledetails": []}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server).fetch_item_details(5_u64.into()).await.unwrap();
        assert!(published_file_details(&body).unwrap().is_empty());
    }

    #[tokio::test]
    async fn player_summaries_send_key_and_joined_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ISteamUser/GetPlayerSummaries/v2/"))
            .and(query_param("key", "secret"))
            .and(query_param("steamids", "1,2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"players": [{"personaname": "Foo"}, {"personaname": "Bar"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids: &[u64] = &[1, 2];
        let body = client_for(&server).fetch_author_profiles(ids.into()).await.unwrap();
        let player = first_player(&body).unwrap().unwrap();
        assert_eq!(player["personaname"], "Foo");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_author_profiles(1_u64.into()).await.unwrap_err();
        assert!(matches!(err, PreviewError::Status(status) if status.as_u16() == 403));
    }

    #[tokio::test]
    async fn invalid_json_is_a_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_item_details(1_u64.into()).await.unwrap_err();
        assert!(matches!(err, PreviewError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": {"publishedfiledetails": []}}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = SteamClient::new(&SteamConfig {
            api_key: "secret".to_string(),
            api_base: server.uri(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let err = client.fetch_item_details(1_u64.into()).await.unwrap_err();
        assert!(matches!(err, PreviewError::Transport(ref e) if e.is_timeout()), "{err}");
    }

    #[test]
    fn envelope_helpers() {
        assert!(published_file_details(&json!({})).is_err());
        assert!(first_player(&json!({"response": {}})).is_err());
        assert!(first_player(&json!({"response": {"players": []}})).unwrap().is_none());
    }

    #[test]
    fn result_codes() {
        assert!(is_found(&json!({"publishedfileid": "1"})));
        assert!(is_found(&json!({"result": 1})));
        assert!(!is_found(&json!({"result": 9})));
    }
}
