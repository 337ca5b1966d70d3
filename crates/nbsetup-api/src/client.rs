// Async HTTP client for the NetBox REST API.
//
// Base path: /api/
// Auth: `Authorization: Token <token>` header
//
// Only the verbs provisioning needs are exposed: a single-record lookup by
// filter, bulk create, and delete by id.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::collection::Collection;
use crate::error::Error;
use crate::filter::Filter;
use crate::record::{Page, Record};
use crate::transport::TransportConfig;
use crate::validation::ValidationErrors;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct DetailResponse {
    detail: String,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one NetBox instance.
#[derive(Debug, Clone)]
pub struct NetBoxClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NetBoxClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API token and transport config.
    ///
    /// Injects `Authorization: Token …` as a sensitive default header.
    pub fn from_token(
        base_url: &str,
        token: &secrecy::SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
            .map_err(|e| Error::InvalidToken {
                message: format!("invalid token header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Accept either the instance root or the API root:
    /// `https://netbox.lab` and `https://netbox.lab/api` both become
    /// `https://netbox.lab/api/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a collection-relative path onto `/api/`. NetBox wants the
    /// trailing slash; without it every request pays a redirect.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("{path}/"))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(path, resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        Self::handle_response(path, resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(path, resp).await
    }

    async fn delete_path(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(path, resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(path, status, resp).await)
        }
    }

    async fn handle_empty(path: &str, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(path, status, resp).await)
        }
    }

    async fn parse_error(
        path: &str,
        status: reqwest::StatusCode,
        resp: reqwest::Response,
    ) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<DetailResponse>(&raw)
            .ok()
            .map(|d| d.detail);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::InvalidToken {
                message: detail.unwrap_or_else(|| status.to_string()),
            };
        }

        if status == reqwest::StatusCode::BAD_REQUEST && detail.is_none() {
            if let Some(errors) = ValidationErrors::from_body(&raw) {
                return Error::Validation {
                    collection: path.to_owned(),
                    status: status.as_u16(),
                    errors,
                };
            }
        }

        Error::Api {
            status: status.as_u16(),
            message: detail.unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            }),
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Status ───────────────────────────────────────────────────────

    /// `GET /api/status/`: cheap authenticated probe, returns the NetBox
    /// version string when the instance reports one.
    pub async fn status(&self) -> Result<Option<String>, Error> {
        let body: Value = self.get("status").await?;
        Ok(body
            .get("netbox-version")
            .and_then(Value::as_str)
            .map(str::to_owned))
    }

    // ── Records ──────────────────────────────────────────────────────

    /// Fetch the single record matching `filter`.
    ///
    /// No match → `Ok(None)`; several → [`Error::Ambiguous`].
    pub async fn lookup(
        &self,
        collection: &Collection,
        filter: &Filter,
    ) -> Result<Option<Record>, Error> {
        let mut params = filter.query_pairs();
        params.push(("limit".to_owned(), "2".to_owned()));

        let page: Page<Record> = self.get_with_params(collection.path(), &params).await?;
        if page.count > 1 {
            return Err(Error::Ambiguous {
                collection: collection.to_string(),
                filter: filter.to_string(),
                count: page.count,
            });
        }
        Ok(page.results.into_iter().next())
    }

    /// Create every body in one request. Records come back in submission
    /// order.
    pub async fn bulk_create(
        &self,
        collection: &Collection,
        bodies: &[Value],
    ) -> Result<Vec<Record>, Error> {
        self.post(collection.path(), bodies).await
    }

    pub async fn delete(&self, collection: &Collection, id: u64) -> Result<(), Error> {
        self.delete_path(&format!("{}/{id}", collection.path()))
            .await
    }
}
