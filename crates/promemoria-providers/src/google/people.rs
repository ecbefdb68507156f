//! Google People API contact search.
//!
//! `people:searchContacts` serves from a lazily built cache; Google asks
//! clients to send an empty query first so the cache is warm before the
//! real lookup. The warm-up result is ignored.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::calendar::BoxFuture;
use crate::contacts::{ContactDirectory, ContactRecord};
use crate::error::ProviderResult;

use super::credential::Credential;
use super::http::GoogleApi;

const READ_MASK: &str = "names,phoneNumbers";
const PAGE_SIZE: u32 = 10;

/// Google People API client bound to one access token.
#[derive(Debug)]
pub struct GooglePeopleClient {
    api: GoogleApi,
    warmed: OnceCell<()>,
}

impl GooglePeopleClient {
    /// Creates a client for the People API at `api_base`.
    pub fn new(
        credential: &Credential,
        api_base: impl Into<String>,
        timeout: Option<Duration>,
    ) -> ProviderResult<Self> {
        Ok(Self {
            api: GoogleApi::new(credential, api_base, timeout)?,
            warmed: OnceCell::new(),
        })
    }

    async fn warm_up(&self) {
        self.warmed
            .get_or_init(|| async {
                let result: ProviderResult<SearchResponse> = self
                    .api
                    .get_json(&self.search_url(), &search_params("", 1))
                    .await;
                if let Err(e) = result {
                    warn!("contact search warm-up failed: {}", e);
                }
            })
            .await;
    }

    fn search_url(&self) -> String {
        self.api.url("/people:searchContacts")
    }

    async fn lookup(&self, name: &str) -> ProviderResult<Vec<ContactRecord>> {
        self.warm_up().await;

        let response: SearchResponse = self
            .api
            .get_json(&self.search_url(), &search_params(name, PAGE_SIZE))
            .await?;

        let matches: Vec<ContactRecord> = response
            .results
            .into_iter()
            .filter_map(|result| result.person)
            .map(Person::into_record)
            .collect();

        debug!("{} contact matches for {:?}", matches.len(), name);
        Ok(matches)
    }
}

impl ContactDirectory for GooglePeopleClient {
    fn search<'a>(&'a self, name: &'a str) -> BoxFuture<'a, ProviderResult<Vec<ContactRecord>>> {
        Box::pin(self.lookup(name))
    }
}

fn search_params(query: &str, page_size: u32) -> Vec<(&'static str, String)> {
    vec![
        ("query", query.to_string()),
        ("pageSize", page_size.to_string()),
        ("readMask", READ_MASK.to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    person: Option<Person>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    #[serde(default)]
    names: Vec<Name>,
    #[serde(default)]
    phone_numbers: Vec<PhoneNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Name {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhoneNumber {
    value: Option<String>,
}

impl Person {
    fn into_record(self) -> ContactRecord {
        ContactRecord {
            display_name: self.names.into_iter().find_map(|n| n.display_name),
            phone_raw: self.phone_numbers.into_iter().find_map(|p| p.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use std::collections::BTreeSet;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GooglePeopleClient {
        let credential = Credential {
            access_token: "ya29.people".to_string(),
            refresh_token: None,
            token_endpoint: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            scopes: BTreeSet::new(),
            expiry: None,
        };
        GooglePeopleClient::new(
            &credential,
            format!("{}/people/v1", server.uri()),
            Some(Duration::from_secs(5)),
        )
        .unwrap()
    }

    async fn mount_warm_up(server: &MockServer, times: u64) {
        Mock::given(method("GET"))
            .and(path("/people/v1/people:searchContacts"))
            .and(query_param("query", ""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn search_returns_first_name_and_phone() {
        let server = MockServer::start().await;
        mount_warm_up(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/people/v1/people:searchContacts"))
            .and(query_param("query", "Maria Rossi"))
            .and(query_param("readMask", "names,phoneNumbers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"person": {
                        "resourceName": "people/c1",
                        "names": [{"displayName": "Maria Rossi"}],
                        "phoneNumbers": [{"value": "333 1234567"}, {"value": "06 1234567"}]
                    }},
                    {"person": {"names": [{"displayName": "Maria Rossini"}]}}
                ]
            })))
            .mount(&server)
            .await;

        let people = client(&server);
        let matches = people.search("Maria Rossi").await.unwrap();
        // second search must not warm up again
        people.search("Maria Rossi").await.unwrap();

        assert_eq!(matches[0], ContactRecord::new("Maria Rossi", "333 1234567"));
        assert_eq!(matches[1].phone_raw, None);
    }

    #[tokio::test]
    async fn no_results_is_empty() {
        let server = MockServer::start().await;
        mount_warm_up(&server, 1).await;
        Mock::given(method("GET"))
            .and(query_param("query", "Unknown Person"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        assert!(client(&server).search("Unknown Person").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_warm_up_does_not_block_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("query", ""))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("query", "Maria Rossi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"person": {"names": [{"displayName": "Maria Rossi"}],
                             "phoneNumbers": [{"value": "+39 333 1234567"}]}}]
            })))
            .mount(&server)
            .await;

        let matches = client(&server).search("Maria Rossi").await.unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn forbidden_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("scope missing"))
            .mount(&server)
            .await;

        let err = client(&server).search("Maria Rossi").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthorizationFailed);
    }
}
