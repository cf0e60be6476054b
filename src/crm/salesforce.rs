//! Salesforce REST client.
//!
//! Authenticates with the SOAP partner `login` call (username, password and
//! security token) or with a pre-issued access token, then talks to the REST
//! API under `/services/data/v<version>`. The HTTP stack is async; a private
//! current-thread runtime drives it so the shell stays blocking.

use crate::config::SalesforceConfig;
use crate::crm::client::CrmClient;
use crate::crm::types::{ObjectDescribe, QueryResult, Record, SObjectSummary};
use crate::error::{ApiError, CrmError};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info};
use url::Url;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn build_http_client() -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .timeout(HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

// Map transport-level reqwest failures to CrmError
fn map_http_error(error: reqwest::Error) -> CrmError {
    if let Some(status) = error.status() {
        status_error(status.as_u16(), &error.to_string())
    } else if error.is_timeout() {
        CrmError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        CrmError::Transport(format!("Connection error: {}", error))
    } else {
        CrmError::Request(format!("HTTP error: {}", error))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: String,
    #[serde(default)]
    error_code: Option<String>,
}

/// Map a non-success status and its body to a CrmError.
///
/// REST error bodies are a JSON array of `{message, errorCode}`.
fn status_error(status: u16, body: &str) -> CrmError {
    let detail = match serde_json::from_str::<Vec<ErrorBody>>(body) {
        Ok(errors) if !errors.is_empty() => errors
            .iter()
            .map(|e| match &e.error_code {
                Some(code) => format!("{}: {}", code, e.message),
                None => e.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", status)
            } else {
                trimmed.chars().take(300).collect()
            }
        }
    };
    match status {
        401 => CrmError::SessionExpired(detail),
        404 => CrmError::NotFound(detail),
        _ => CrmError::Request(format!("HTTP {}: {}", status, detail)),
    }
}

async fn send(request: RequestBuilder) -> Result<Response, CrmError> {
    let response = request.send().await.map_err(map_http_error)?;
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

/// SOAP login endpoint for a login domain (`login`, `test` or a My Domain prefix).
pub fn login_url(domain: &str, api_version: &str) -> String {
    format!(
        "https://{}.salesforce.com/services/Soap/u/{}",
        domain.trim().trim_end_matches(".salesforce.com"),
        api_version
    )
}

/// Partner API login envelope. The password sent is password + security token.
pub fn login_envelope(username: &str, password: &str, security_token: &str) -> String {
    let secret = format!("{}{}", password, security_token);
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:env="http://schemas.xmlsoap.org/soap/envelope/"
    xmlns:urn="urn:partner.soap.sforce.com">
  <env:Header>
    <urn:CallOptions><urn:client>sfcli</urn:client></urn:CallOptions>
  </env:Header>
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{}</n1:username>
      <n1:password>{}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        quick_xml::escape::escape(username),
        quick_xml::escape::escape(secret.as_str())
    )
}

/// Session established by the SOAP login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    pub session_id: String,
    pub server_url: String,
}

/// Extract `sessionId` and `serverUrl` from a login response, or the fault message.
pub fn parse_login_response(xml: &str) -> Result<LoginSession, CrmError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<String> = None;
    let mut session_id = None;
    let mut server_url = None;
    let mut fault = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                current = Some(String::from_utf8_lossy(start.local_name().as_ref()).into_owned());
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|e| CrmError::InvalidResponse(format!("Bad login XML: {}", e)))?
                    .into_owned();
                match current.as_deref() {
                    Some("sessionId") => session_id = Some(value),
                    Some("serverUrl") => server_url = Some(value),
                    Some("faultstring") | Some("exceptionMessage") if fault.is_none() => {
                        fault = Some(value)
                    }
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CrmError::InvalidResponse(format!(
                    "Bad login XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if let Some(fault) = fault {
        return Err(CrmError::AuthFailed(fault));
    }
    match (session_id, server_url) {
        (Some(session_id), Some(server_url)) => Ok(LoginSession {
            session_id,
            server_url,
        }),
        _ => Err(CrmError::InvalidResponse(
            "Login response has no sessionId/serverUrl".to_string(),
        )),
    }
}

/// `scheme://host[:port]` of a server or instance URL.
pub fn instance_origin(url: &str) -> Result<String, CrmError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| CrmError::InvalidResponse(format!("Invalid instance URL '{}': {}", url, e)))?;
    if parsed.host_str().is_none() {
        return Err(CrmError::InvalidResponse(format!(
            "Instance URL '{}' has no host",
            url
        )));
    }
    Ok(parsed.origin().ascii_serialization())
}

async fn soap_login(http: &Client, url: &str, envelope: String) -> Result<LoginSession, CrmError> {
    let response = http
        .post(url)
        .header("Content-Type", "text/xml; charset=UTF-8")
        .header("SOAPAction", "login")
        .body(envelope)
        .send()
        .await
        .map_err(map_http_error)?;
    let status = response.status();
    let body = response.text().await.map_err(map_http_error)?;
    match parse_login_response(&body) {
        Ok(session) if status.is_success() => Ok(session),
        Ok(_) => Err(CrmError::AuthFailed(format!("HTTP {}", status))),
        Err(CrmError::InvalidResponse(_)) if !status.is_success() => {
            Err(CrmError::AuthFailed(format!("HTTP {}", status)))
        }
        Err(e) => Err(e),
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default, rename = "searchRecords")]
    search_records: Vec<Record>,
}

#[derive(Deserialize)]
struct GlobalDescribe {
    #[serde(default)]
    sobjects: Vec<SObjectSummary>,
}

/// Authenticated REST client for one org
pub struct SalesforceClient {
    http: Client,
    runtime: Runtime,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl SalesforceClient {
    /// Authenticate with the configured credentials.
    pub fn connect(config: &SalesforceConfig) -> Result<Self, ApiError> {
        let missing = config.missing_credentials();
        if !missing.is_empty() {
            return Err(ApiError::ConfigError(format!(
                "Missing Salesforce credentials: {}. Run 'sfcli init' to create a .env template.",
                missing.join(", ")
            )));
        }
        let api_version = config.api_version.trim_start_matches('v').to_string();

        if config.has_access_token() {
            let instance_url = config.instance_url.clone().unwrap_or_default();
            let token = config.access_token.clone().unwrap_or_default();
            return Self::with_session(&instance_url, token, api_version);
        }

        let client = Self::with_session("https://login.salesforce.com", String::new(), api_version)?;
        let url = login_url(&config.domain, &client.api_version);
        let envelope = login_envelope(
            config.username.as_deref().unwrap_or_default(),
            config.password.as_deref().unwrap_or_default(),
            config.security_token.as_deref().unwrap_or_default(),
        );
        debug!(url = %url, "SOAP login");
        let session = client
            .runtime
            .block_on(soap_login(&client.http, &url, envelope))?;
        let instance_url = instance_origin(&session.server_url)?;
        info!(instance = %instance_url, "authenticated with Salesforce");
        Ok(Self {
            instance_url,
            access_token: session.session_id,
            ..client
        })
    }

    /// Client for an existing session (access token + instance URL).
    pub fn with_session(
        instance_url: &str,
        access_token: String,
        api_version: String,
    ) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to start async runtime: {}", e)))?;
        Ok(Self {
            http: build_http_client()?,
            runtime,
            instance_url: instance_origin(instance_url)?,
            access_token,
            api_version,
        })
    }

    /// `<instance>/services/data/v<version>/<segments...>`, each segment percent-encoded.
    pub fn rest_url(&self, segments: &[&str]) -> Result<Url, CrmError> {
        let mut url = Url::parse(&self.instance_url)
            .map_err(|e| CrmError::InvalidResponse(format!("Invalid instance URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CrmError::InvalidResponse("Instance URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["services", "data"])
            .push(&format!("v{}", self.api_version))
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.access_token))
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CrmError> {
        debug!(url = %url, "GET");
        let request = self.authorized(self.http.get(url));
        self.runtime.block_on(async {
            send(request)
                .await?
                .json::<T>()
                .await
                .map_err(|e| CrmError::InvalidResponse(format!("Failed to parse response: {}", e)))
        })
    }
}

impl CrmClient for SalesforceClient {
    fn query(&self, soql: &str) -> Result<QueryResult, CrmError> {
        debug!(soql = %soql, "SOQL query");
        let mut url = self.rest_url(&["query"])?;
        url.query_pairs_mut().append_pair("q", soql);
        let mut result: QueryResult = self.get_json(url)?;

        let mut next = result.next_records_url.take();
        while let Some(path) = next {
            let url = Url::parse(&self.instance_url)
                .and_then(|base| base.join(&path))
                .map_err(|e| CrmError::InvalidResponse(format!("Bad nextRecordsUrl: {}", e)))?;
            let page: QueryResult = self.get_json(url)?;
            result.records.extend(page.records);
            next = page.next_records_url;
        }
        result.done = true;
        debug!(
            total = result.total_size,
            fetched = result.records.len(),
            "query complete"
        );
        Ok(result)
    }

    fn search(&self, sosl: &str) -> Result<Vec<Record>, CrmError> {
        debug!(sosl = %sosl, "SOSL search");
        let mut url = self.rest_url(&["search"])?;
        url.query_pairs_mut().append_pair("q", sosl);
        let response: SearchResponse = self.get_json(url)?;
        Ok(response.search_records)
    }

    fn get_record(&self, object_type: &str, record_id: &str) -> Result<Record, CrmError> {
        self.get_json(self.rest_url(&["sobjects", object_type, record_id])?)
    }

    fn update_record(
        &self,
        object_type: &str,
        record_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), CrmError> {
        let url = self.rest_url(&["sobjects", object_type, record_id])?;
        debug!(url = %url, fields = fields.len(), "PATCH");
        let request = self.authorized(self.http.patch(url)).json(fields);
        self.runtime.block_on(send(request))?;
        info!(object = object_type, id = record_id, "record updated");
        Ok(())
    }

    fn describe(&self, object_type: &str) -> Result<ObjectDescribe, CrmError> {
        self.get_json(self.rest_url(&["sobjects", object_type, "describe"])?)
    }

    fn describe_global(&self) -> Result<Vec<SObjectSummary>, CrmError> {
        let response: GlobalDescribe = self.get_json(self.rest_url(&["sobjects"])?)?;
        Ok(response.sobjects)
    }

    fn instance_url(&self) -> Option<&str> {
        Some(&self.instance_url)
    }
}
