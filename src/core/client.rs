//! Signed HTTP transport for the Lara API

use bytes::Bytes;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, DATE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::core::auth::Credentials;
use crate::core::config::ClientConfig;
use crate::core::errors::{LaraError, Result};
use crate::core::multipart::MultipartBody;

const JSON_CONTENT_TYPE: &str = "application/json";

const METHOD_OVERRIDE: &str = "x-http-method-override";
const SDK_NAME_HEADER: &str = "x-lara-sdk-name";
const SDK_VERSION_HEADER: &str = "x-lara-sdk-version";
const CONTENT_MD5: &str = "content-md5";

/// A file sent as one part of a multipart request
#[derive(Debug, Clone)]
pub struct Attachment {
    pub field: String,
    pub filename: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn new(field: impl Into<String>, filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            field: field.into(),
            filename: filename.into(),
            content,
        }
    }
}

/// Description of one API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    body: Option<Vec<u8>>,
    attachments: Vec<Attachment>,
    headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: None,
            attachments: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Serialize `body` as the JSON payload
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Attach a file, switching the request to multipart
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Add a header applied after the fixed ones
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add several headers at once
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path with a guaranteed leading slash
    pub fn path(&self) -> String {
        if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        }
    }
}

/// Request ready to be sent: URL, final headers and encoded body
#[derive(Debug)]
struct PreparedRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

#[derive(Deserialize)]
struct ContentEnvelope<T> {
    content: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    status: Option<u16>,
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

/// HTTP client that signs every request with the configured credentials
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    credentials: Credentials,
    base_url: String,
    sdk_name: String,
    sdk_version: String,
}

impl HttpClient {
    /// Create a new transport
    pub fn new(credentials: Credentials, config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10);
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let http = builder
            .build()
            .map_err(|e| LaraError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            credentials,
            base_url: config.base_url().to_string(),
            sdk_name: config.sdk_name.clone(),
            sdk_version: config.sdk_version.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying connection pool, shared with the object store bridge
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send a request and decode the envelope's `content`
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let body = self.execute(request).await?;
        unwrap_content(&body)
    }

    /// Send a request and return the response body unparsed
    pub async fn send_raw(&self, request: ApiRequest) -> Result<Bytes> {
        self.execute(request).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::delete(path)).await
    }

    async fn execute(&self, request: ApiRequest) -> Result<Bytes> {
        let prepared = self.prepare(request, &http_date())?;
        let method = prepared.method.clone();
        let url = prepared.url.clone();
        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(prepared.method, prepared.url)
            .headers(prepared.headers);
        if let Some(body) = prepared.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(LaraError::from_transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(LaraError::from_transport)?;
        debug!("{} {} -> {} ({} bytes)", method, url.path(), status, body.len());

        if !status.is_success() {
            return Err(parse_error_response(status.as_u16(), &body));
        }

        Ok(body)
    }

    /// Encode the body, set the fixed headers and sign
    fn prepare(&self, request: ApiRequest, date: &str) -> Result<PreparedRequest> {
        let path = request.path();
        let method = request.method;

        let full_url = format!("{}{}", self.base_url, path);
        let url = if request.query.is_empty() {
            Url::parse(&full_url)
        } else {
            Url::parse_with_params(&full_url, &request.query)
        }
        .map_err(|e| LaraError::Http(format!("invalid URL {}: {}", full_url, e)))?;

        let (body, content_md5, content_type) = if !request.attachments.is_empty() {
            let mut multipart = MultipartBody::new();
            for attachment in &request.attachments {
                multipart.add_file(&attachment.field, &attachment.filename, &attachment.content);
            }
            if let Some(json) = &request.body {
                multipart.add_field("json", &String::from_utf8_lossy(json));
            }
            let content_type = multipart.content_type();
            let bytes = multipart.finish();
            let md5 = content_md5(&bytes);
            (Some(bytes), md5, content_type)
        } else if let Some(json) = request.body {
            let md5 = content_md5(&json);
            (Some(json), md5, JSON_CONTENT_TYPE.to_string())
        } else {
            (None, String::new(), String::new())
        };

        let mut headers = HeaderMap::new();
        headers.insert(METHOD_OVERRIDE, header_value(method.as_str())?);
        headers.insert(DATE, header_value(date)?);
        headers.insert(SDK_NAME_HEADER, header_value(&self.sdk_name)?);
        headers.insert(SDK_VERSION_HEADER, header_value(&self.sdk_version)?);
        if !content_type.is_empty() {
            headers.insert(CONTENT_TYPE, header_value(&content_type)?);
        }
        if !content_md5.is_empty() {
            headers.insert(CONTENT_MD5, header_value(&content_md5)?);
        }

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| LaraError::Http(format!("invalid header name {}: {}", name, e)))?;
            headers.insert(name, header_value(value)?);
        }

        // the signature must use the Date value actually transmitted
        let signed_date = headers
            .get(DATE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(date)
            .to_string();
        if let Some(authorization) = self.credentials.authorization(
            method.as_str(),
            &path,
            &content_md5,
            &content_type,
            &signed_date,
        ) {
            headers.insert(AUTHORIZATION, header_value(&authorization)?);
        }

        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

/// Current UTC time in RFC-1123 format
pub fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Hex MD5 digest of a request body
pub fn content_md5(body: &[u8]) -> String {
    format!("{:x}", md5::compute(body))
}

/// Decode the `content` field of a success envelope
pub(crate) fn unwrap_content<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice::<ContentEnvelope<T>>(body)
        .map(|envelope| envelope.content)
        .map_err(|e| LaraError::Decode {
            message: format!("failed to parse API response: {}", e),
        })
}

/// Classify a non-2xx response
pub(crate) fn parse_error_response(status: u16, body: &[u8]) -> LaraError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.error_type.is_empty() => LaraError::Api {
            status: envelope.status.unwrap_or(status),
            error_type: envelope.error.error_type,
            message: envelope.error.message,
        },
        _ => LaraError::GenericApi {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| LaraError::Http(format!("invalid header value {:?}: {}", value, e)))
}
