use crate::config::toml_config::{DestinationConfig, MAX_PULL_PAGE_SIZE};
use crate::domain::model::{Contact, PushOutcome};
use crate::domain::ports::ContactDestination;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::is_valid_email;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    contacts: Vec<ImportContact<'a>>,
}

/// 姓氏送到 API 的標準欄位 `lastname`，不使用自訂欄位 "Nom"；
/// 名單上已經存在的聯絡人不受影響，因為去重只看 email。
#[derive(Debug, Serialize)]
struct ImportContact<'a> {
    email: &'a str,
    lastname: &'a str,
    firstname: &'a str,
}

/// Infomaniak Newsletter mailing list 客戶端
pub struct NewsletterClient {
    client: Client,
    base_url: String,
    mailing_list_id: String,
    access_token: String,
    secret_token: String,
    page_size: usize,
}

impl NewsletterClient {
    pub fn new(client: Client, config: &DestinationConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            mailing_list_id: config.mailing_list_id.clone(),
            access_token: config.access_token.clone(),
            secret_token: config.secret_token.clone(),
            page_size: config.page_size.clamp(1, MAX_PULL_PAGE_SIZE),
        }
    }

    fn list_url(&self, action: &str) -> String {
        format!(
            "{}/mailinglist/{}/{}",
            self.base_url, self.mailing_list_id, action
        )
    }

    /// 從 `{"data": {"data": [...]}}` 取出合法的 email
    fn contacts_from_listing(body: &Value) -> Result<Vec<Contact>> {
        let entries = body
            .get("data")
            .and_then(|data| data.get("data"))
            .and_then(Value::as_array)
            .ok_or_else(|| SyncError::Decode {
                message: "mailing list response has no data.data array".to_string(),
            })?;

        let mut contacts = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.get("email").and_then(Value::as_str).map(str::trim) {
                Some(email) if is_valid_email(email) => {
                    contacts.push(Contact::with_placeholder_names(email));
                }
                other => {
                    tracing::debug!("Skipping mailing list entry with email {:?}", other);
                }
            }
        }
        Ok(contacts)
    }
}

#[async_trait]
impl ContactDestination for NewsletterClient {
    async fn push(&self, contact: &Contact) -> Result<PushOutcome> {
        let endpoint = self.list_url("importcontact");
        let request = ImportRequest {
            contacts: vec![ImportContact {
                email: &contact.email,
                lastname: &contact.last_name,
                firstname: &contact.first_name,
            }],
        };

        let response = self
            .client
            .post(&endpoint)
            .basic_auth(&self.access_token, Some(&self.secret_token))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(SyncError::HttpStatus {
                    endpoint,
                    status: status.as_u16(),
                })
            }
            Err(e) => {
                return Err(SyncError::Decode {
                    message: format!("import response: {}", e),
                })
            }
        };

        let outcome = PushOutcome::from_result_field(body.get("result").and_then(Value::as_str));
        if !status.is_success() {
            tracing::debug!("Import of {} answered {}: {}", contact.email, status, body);
        }
        Ok(outcome)
    }

    async fn pull_all(&self) -> Result<Vec<Contact>> {
        let endpoint = self.list_url("contact");
        tracing::debug!("📡 GET {} (perPage={})", endpoint, self.page_size);

        let response = self
            .client
            .get(&endpoint)
            .basic_auth(&self.access_token, Some(&self.secret_token))
            .query(&[("perPage", self.page_size)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await.map_err(|e| SyncError::Decode {
            message: format!("mailing list response: {}", e),
        })?;

        let contacts = Self::contacts_from_listing(&body)?;
        tracing::info!("📥 Pulled {} contacts from the mailing list", contacts.len());
        Ok(contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const BASIC_AUTH: &str = "Basic YWNjZXNzOnNlY3JldA==";

    fn destination_config(base_url: String, page_size: usize) -> DestinationConfig {
        DestinationConfig {
            mailing_list_id: "42".to_string(),
            access_token: "access".to_string(),
            secret_token: "secret".to_string(),
            base_url,
            page_size,
        }
    }

    #[tokio::test]
    async fn test_push_sends_single_contact_with_basic_auth() {
        let server = MockServer::start_async().await;
        let import_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/mailinglist/42/importcontact")
                    .header("Authorization", BASIC_AUTH)
                    .json_body(json!({
                        "contacts": [{
                            "email": "jean@exemple.fr",
                            "lastname": "Dupont",
                            "firstname": "Jean"
                        }]
                    }));
                then.status(200).json_body(json!({"result": "success"}));
            })
            .await;

        let client = NewsletterClient::new(Client::new(), &destination_config(server.base_url(), 500));
        let outcome = client
            .push(&Contact::new("Dupont", "Jean", "jean@exemple.fr"))
            .await
            .unwrap();

        import_mock.assert_async().await;
        assert_eq!(outcome, PushOutcome::Accepted);
    }

    #[tokio::test]
    async fn test_push_non_success_result_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/mailinglist/42/importcontact");
                then.status(422).json_body(json!({"result": "error", "error": ["invalid"]}));
            })
            .await;

        let client = NewsletterClient::new(Client::new(), &destination_config(server.base_url(), 500));
        let outcome = client
            .push(&Contact::new("Dupont", "Jean", "jean@exemple.fr"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PushOutcome::Rejected {
                result: "error".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_push_unreachable_host_is_transport_error() {
        // 沒有任何服務監聽的埠
        let client = NewsletterClient::new(
            Client::new(),
            &destination_config("http://127.0.0.1:9".to_string(), 500),
        );
        let result = client
            .push(&Contact::new("Dupont", "Jean", "jean@exemple.fr"))
            .await;

        assert!(matches!(result, Err(SyncError::Transport(_))));
    }

    #[tokio::test]
    async fn test_pull_all_maps_entries_and_drops_bad_emails() {
        let server = MockServer::start_async().await;
        let list_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/mailinglist/42/contact")
                    .query_param("perPage", "1000")
                    .header("Authorization", BASIC_AUTH);
                then.status(200).json_body(json!({
                    "result": "success",
                    "data": {"data": [
                        {"id": 1, "email": "x@y.com"},
                        {"id": 2, "email": "broken"},
                        {"id": 3},
                        {"id": 4, "email": " z@y.org "}
                    ]}
                }));
            })
            .await;

        // page_size 超過上限時會被截到 1000
        let client = NewsletterClient::new(Client::new(), &destination_config(server.base_url(), 5000));
        let contacts = client.pull_all().await.unwrap();

        list_mock.assert_async().await;
        assert_eq!(
            contacts,
            vec![
                Contact::with_placeholder_names("x@y.com"),
                Contact::with_placeholder_names("z@y.org"),
            ]
        );
    }

    #[tokio::test]
    async fn test_pull_all_unexpected_shape_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/mailinglist/42/contact");
                then.status(200).json_body(json!({"data": []}));
            })
            .await;

        let client = NewsletterClient::new(Client::new(), &destination_config(server.base_url(), 100));
        assert!(matches!(
            client.pull_all().await,
            Err(SyncError::Decode { .. })
        ));
    }
}
