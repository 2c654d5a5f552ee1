//! HTTP client for the catalog connector API.

use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub icon: String,
    pub desc: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub featured: bool,
    pub status: String,
    pub created_at: u64,
    pub submitted_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogLead {
    pub id: String,
    pub email: String,
    pub name: String,
    pub message: String,
    pub ip: String,
    pub ua: String,
    pub tz: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicCatalog {
    pub settings: Value,
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the server's `error` message.
    #[error("server returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http(e) => e.status(),
            ClientError::Api { status, .. } => Some(*status),
        }
    }
}

pub struct CatalogClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Exchange the PIN for a session token and keep it for later calls.
    pub async fn login(&mut self, pin: &str) -> Result<String, ClientError> {
        let body: Value = self
            .call(Method::POST, "/api/login", Some(&serde_json::json!({ "pin": pin })))
            .await?;
        let token = body["token"].as_str().unwrap_or_default().to_string();
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Revoke the held token and forget it.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let _: Value = self.call(Method::POST, "/api/logout", None).await?;
        self.token = None;
        Ok(())
    }

    pub async fn health(&self) -> Result<bool, ClientError> {
        let body: Value = self.call(Method::GET, "/api/health", None).await?;
        Ok(body["ok"].as_bool().unwrap_or(false))
    }

    pub async fn public_catalog(&self) -> Result<PublicCatalog, ClientError> {
        self.call(Method::GET, "/api/gpts/public", None).await
    }

    /// Submit an item for review. Returns the new id.
    pub async fn submit_item(&self, item: &Value) -> Result<String, ClientError> {
        let body: Value = self.call(Method::POST, "/api/gpts/submit", Some(item)).await?;
        Ok(body["id"].as_str().unwrap_or_default().to_string())
    }

    pub async fn submit_lead(&self, lead: &Value) -> Result<(), ClientError> {
        let _: Value = self.call(Method::POST, "/api/leads", Some(lead)).await?;
        Ok(())
    }

    pub async fn items(&self) -> Result<Vec<CatalogItem>, ClientError> {
        self.call(Method::GET, "/api/gpts", None).await
    }

    pub async fn create_item(&self, item: &Value) -> Result<String, ClientError> {
        let body: Value = self.call(Method::POST, "/api/gpts", Some(item)).await?;
        Ok(body["id"].as_str().unwrap_or_default().to_string())
    }

    pub async fn update_item(&self, id: &str, patch: &Value) -> Result<CatalogItem, ClientError> {
        self.call(Method::PUT, &format!("/api/gpts/{id}"), Some(patch)).await
    }

    pub async fn delete_item(&self, id: &str) -> Result<(), ClientError> {
        let _: Value = self.call(Method::DELETE, &format!("/api/gpts/{id}"), None).await?;
        Ok(())
    }

    pub async fn leads(&self) -> Result<Vec<CatalogLead>, ClientError> {
        #[derive(Deserialize)]
        struct Leads {
            items: Vec<CatalogLead>,
        }
        let leads: Leads = self.call(Method::GET, "/api/leads", None).await?;
        Ok(leads.items)
    }

    /// Leads as CSV text.
    pub async fn export_leads(&self) -> Result<String, ClientError> {
        let resp = check(self.send(Method::GET, "/api/leads/export", None).await?).await?;
        Ok(resp.text().await?)
    }

    pub async fn delete_lead(&self, id: &str) -> Result<(), ClientError> {
        let _: Value = self.call(Method::DELETE, &format!("/api/leads/{id}"), None).await?;
        Ok(())
    }

    pub async fn settings(&self) -> Result<Value, ClientError> {
        self.call(Method::GET, "/api/settings", None).await
    }

    pub async fn update_settings(&self, patch: &Value) -> Result<Value, ClientError> {
        self.call(Method::PUT, "/api/settings", Some(patch)).await
    }

    /// Send a request with the held token (if any) and return the raw response.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response, reqwest::Error> {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req.send().await
    }

    async fn call<T>(&self, method: Method, path: &str, body: Option<&Value>) -> Result<T, ClientError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let resp = check(self.send(method, path, body).await?).await?;
        Ok(resp.json().await?)
    }
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or(text);
    Err(ClientError::Api { status, message })
}
