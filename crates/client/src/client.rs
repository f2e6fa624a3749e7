//! The DNSDB v2 client: configuration, the query method surface, and the
//! shared request/response pipeline under it.

use std::collections::HashMap;
use std::time::Duration;

use futures::{StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::errors::DnsdbError;
use crate::options::QueryOptions;
use crate::request::{self, FlexKey, FlexMethod, QueryMode};
use crate::saf::SafStream;

/// The public DNSDB API endpoint.
pub const DEFAULT_DNSDB_SERVER: &str = "https://api.dnsdb.info";

const DEFAULT_SWCLIENT: &str = "dnsdb2-client";
const ACCEPT_CONTENT_TYPE: &str = "application/x-ndjson";
const API_KEY_HEADER: &str = "X-Api-Key";

/// A client for DNSDB protocol version 2 with Flex Search.
///
/// Configuration is immutable after construction; one client can be
/// shared freely across tasks and issues each query over a pooled
/// connection. Streaming methods return a [`SafStream`]; see
/// [`crate`] docs for a usage example.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    apikey: String,
    server: String,
    swclient: String,
    version: String,
}

/// Builds a [`Client`]. Only the API key is required.
pub struct ClientBuilder {
    apikey: String,
    server: String,
    swclient: String,
    version: String,
    proxies: HashMap<String, String>,
    insecure: bool,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    fn new(apikey: String) -> Self {
        Self {
            apikey,
            server: DEFAULT_DNSDB_SERVER.to_string(),
            swclient: DEFAULT_SWCLIENT.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            proxies: HashMap::new(),
            insecure: false,
            timeout: None,
        }
    }

    /// Point the client at a different API server.
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Software name and version reported to the server for usage
    /// tracking, as the `swclient` and `version` query parameters.
    pub fn with_swclient(mut self, swclient: impl Into<String>, version: impl Into<String>) -> Self {
        self.swclient = swclient.into();
        self.version = version.into();
        self
    }

    /// Route requests for `scheme` (`"http"` or `"https"`) through a
    /// proxy.
    pub fn with_proxy(mut self, scheme: impl Into<String>, url: impl Into<String>) -> Self {
        self.proxies.insert(scheme.into(), url.into());
        self
    }

    /// Skip TLS certificate validation.
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Overall per-request timeout. The library enforces none by
    /// default; the transport's defaults apply.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Client, DnsdbError> {
        let mut http = reqwest::Client::builder().use_rustls_tls();
        for (scheme, url) in &self.proxies {
            let proxy = match scheme.as_str() {
                "http" => reqwest::Proxy::http(url)?,
                "https" => reqwest::Proxy::https(url)?,
                other => {
                    return Err(DnsdbError::Query(format!(
                        "unsupported proxy scheme: {other}"
                    )))
                }
            };
            http = http.proxy(proxy);
        }
        if self.insecure {
            http = http.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        Ok(Client {
            http: http.build()?,
            apikey: self.apikey,
            server: self.server,
            swclient: self.swclient,
            version: self.version,
        })
    }
}

impl Client {
    /// A client for the public endpoint with default identification.
    pub fn new(apikey: impl Into<String>) -> Result<Self, DnsdbError> {
        Self::builder(apikey).build()
    }

    pub fn builder(apikey: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(apikey.into())
    }

    /// Looks up individual records for a DNS owner name. The owner name
    /// may carry a left-hand (`*.example.com`) or right-hand
    /// (`www.example.*`) wildcard. A bailiwick restricts results to the
    /// zone they were observed under.
    pub async fn lookup_rrset(
        &self,
        owner_name: &str,
        rrtype: Option<&str>,
        bailiwick: Option<&str>,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::rrset_path(QueryMode::Lookup, owner_name, rrtype, bailiwick)?;
        self.saf_query(&path, &opts).await
    }

    /// Summarizes records for a DNS owner name into one aggregate
    /// count/time-span row.
    pub async fn summarize_rrset(
        &self,
        owner_name: &str,
        rrtype: Option<&str>,
        bailiwick: Option<&str>,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::rrset_path(QueryMode::Summarize, owner_name, rrtype, bailiwick)?;
        self.saf_query(&path, &opts).await
    }

    /// Looks up records whose rdata contains the given domain name.
    pub async fn lookup_rdata_name(
        &self,
        name: &str,
        rrtype: Option<&str>,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::rdata_name_path(QueryMode::Lookup, name, rrtype)?;
        self.saf_query(&path, &opts).await
    }

    pub async fn summarize_rdata_name(
        &self,
        name: &str,
        rrtype: Option<&str>,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::rdata_name_path(QueryMode::Summarize, name, rrtype)?;
        self.saf_query(&path, &opts).await
    }

    /// Looks up records whose rdata contains the given IP address, CIDR
    /// block (`1.2.3.0/24`) or address range (`1.2.3.4-5.6.7.8`).
    pub async fn lookup_rdata_ip(
        &self,
        ip: &str,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::rdata_ip_path(QueryMode::Lookup, ip)?;
        self.saf_query(&path, &opts).await
    }

    pub async fn summarize_rdata_ip(
        &self,
        ip: &str,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::rdata_ip_path(QueryMode::Summarize, ip)?;
        self.saf_query(&path, &opts).await
    }

    /// Looks up records by raw rdata, given as an even number of hex
    /// digits.
    pub async fn lookup_rdata_raw(
        &self,
        raw_rdata: &str,
        rrtype: Option<&str>,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::rdata_raw_path(QueryMode::Lookup, raw_rdata, rrtype)?;
        self.saf_query(&path, &opts).await
    }

    pub async fn summarize_rdata_raw(
        &self,
        raw_rdata: &str,
        rrtype: Option<&str>,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::rdata_raw_path(QueryMode::Summarize, raw_rdata, rrtype)?;
        self.saf_query(&path, &opts).await
    }

    /// Flex search: match a regex against record owner names.
    pub async fn flex_rrnames_regex(
        &self,
        value: &str,
        rrtype: Option<&str>,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::flex_path(FlexMethod::Regex, FlexKey::RrNames, value, rrtype)?;
        self.saf_query(&path, &opts).await
    }

    /// Flex search: match a glob against record owner names.
    pub async fn flex_rrnames_glob(
        &self,
        value: &str,
        rrtype: Option<&str>,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::flex_path(FlexMethod::Glob, FlexKey::RrNames, value, rrtype)?;
        self.saf_query(&path, &opts).await
    }

    /// Flex search: match a regex against record data.
    pub async fn flex_rdata_regex(
        &self,
        value: &str,
        rrtype: Option<&str>,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::flex_path(FlexMethod::Regex, FlexKey::Rdata, value, rrtype)?;
        self.saf_query(&path, &opts).await
    }

    /// Flex search: match a glob against record data.
    pub async fn flex_rdata_glob(
        &self,
        value: &str,
        rrtype: Option<&str>,
        opts: QueryOptions,
    ) -> Result<SafStream, DnsdbError> {
        let path = request::flex_path(FlexMethod::Glob, FlexKey::Rdata, value, rrtype)?;
        self.saf_query(&path, &opts).await
    }

    /// End-to-end reachability check against the API endpoint.
    pub async fn ping(&self) -> Result<bool, DnsdbError> {
        let body = self.json_query("ping").await?;
        Ok(body.get("ping").and_then(Value::as_str) == Some("ok"))
    }

    /// Quota and rate-limit introspection, returned verbatim as the
    /// server-defined JSON object.
    pub async fn rate_limit(&self) -> Result<Value, DnsdbError> {
        self.json_query("rate_limit").await
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.server.trim_end_matches('/'),
            request::API_PREFIX,
            path
        )
    }

    /// Base identification parameters plus everything supplied in
    /// `opts`. An `extra` entry may override the base parameters.
    fn merged_params(&self, opts: &QueryOptions) -> Vec<(String, String)> {
        let mut params = vec![
            ("swclient".to_string(), self.swclient.clone()),
            ("version".to_string(), self.version.clone()),
        ];
        for (name, value) in opts.to_params() {
            match params.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => params.push((name, value)),
            }
        }
        params
    }

    async fn send(&self, url: &str, params: &[(String, String)]) -> Result<reqwest::Response, DnsdbError> {
        let res = self
            .http
            .get(url)
            .query(params)
            .header(ACCEPT, ACCEPT_CONTENT_TYPE)
            .header(API_KEY_HEADER, &self.apikey)
            .send()
            .await?;
        Ok(res)
    }

    /// Issues a streaming query and hands the body to the SAF decoder.
    async fn saf_query(&self, path: &str, opts: &QueryOptions) -> Result<SafStream, DnsdbError> {
        let url = self.url(path);
        debug!(url = %url, "issuing DNSDB streaming query");

        let res = self.send(&url, &self.merged_params(opts)).await?;
        if res.status() == StatusCode::NOT_FOUND {
            debug!(url = %url, "no results");
            return Ok(SafStream::empty());
        }
        let res = check_status(res).await?;

        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.starts_with(ACCEPT_CONTENT_TYPE) {
            return Err(DnsdbError::Protocol(format!(
                "unexpected content type: {content_type:?}"
            )));
        }

        let body = res.bytes_stream().map_err(std::io::Error::other).boxed();
        Ok(SafStream::new(body, opts.ignore_limited))
    }

    /// Issues a non-streaming query and parses a single JSON object.
    async fn json_query(&self, path: &str) -> Result<Value, DnsdbError> {
        let url = self.url(path);
        debug!(url = %url, "issuing DNSDB query");

        let params = self.merged_params(&QueryOptions::default());
        let res = check_status(self.send(&url, &params).await?).await?;
        Ok(res.json().await?)
    }
}

/// Maps out-of-band HTTP failures onto the error taxonomy.
async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, DnsdbError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::BAD_REQUEST => DnsdbError::Query(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DnsdbError::AccessDenied(body),
        StatusCode::RANGE_NOT_SATISFIABLE => DnsdbError::Offset(body),
        StatusCode::TOO_MANY_REQUESTS => {
            // The server reuses 429 for per-key concurrency limits; the
            // body says which limit was hit.
            if body.to_ascii_lowercase().contains("concurren") {
                DnsdbError::ConcurrencyExceeded(body)
            } else {
                DnsdbError::QuotaExceeded(body)
            }
        }
        _ => DnsdbError::Query(format!("HTTP {status}: {body}")),
    })
}
