//! Request-path construction for the DNSDB v2 endpoint families.
//!
//! Pure construction: names are IDNA-encoded and percent-quoted here, but
//! no DNS syntax validation happens — the server is authoritative.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::errors::DnsdbError;

/// Path prefix of every DNSDB v2 endpoint, relative to the server root.
pub(crate) const API_PREFIX: &str = "dnsdb/v2";

/// Inserted as the rrtype segment when a bailiwick is given without one;
/// the server addresses bailiwicks by path position.
const RRTYPE_ANY: &str = "ANY";

/// Everything except unreserved characters gets percent-encoded, so a
/// name containing `/` or `,` cannot be mistaken for a path separator.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The lookup family returns individual records; summarize returns one
/// aggregate. Both share the request/decode pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Lookup,
    Summarize,
}

impl QueryMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Summarize => "summarize",
        }
    }
}

/// Pattern dialect for flex search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexMethod {
    Regex,
    Glob,
}

impl FlexMethod {
    fn as_str(self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::Glob => "glob",
        }
    }
}

/// Which record field a flex search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexKey {
    RrNames,
    Rdata,
}

impl FlexKey {
    fn as_str(self) -> &'static str {
        match self {
            Self::RrNames => "rrnames",
            Self::Rdata => "rdata",
        }
    }
}

fn quote(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// IDNA-encode a DNS name and quote it as a single path segment.
fn encode_name(name: &str) -> Result<String, DnsdbError> {
    if name.is_empty() {
        return Err(DnsdbError::Query("empty DNS name".to_string()));
    }
    let ascii = idna::domain_to_ascii(name)
        .map_err(|e| DnsdbError::Query(format!("invalid DNS name {name:?}: {e}")))?;
    Ok(quote(&ascii))
}

pub(crate) fn rrset_path(
    mode: QueryMode,
    owner_name: &str,
    rrtype: Option<&str>,
    bailiwick: Option<&str>,
) -> Result<String, DnsdbError> {
    let mut path = format!("{}/rrset/name/{}", mode.as_str(), encode_name(owner_name)?);
    if let Some(rrtype) = rrtype {
        path.push('/');
        path.push_str(rrtype);
    }
    if let Some(bailiwick) = bailiwick {
        if rrtype.is_none() {
            path.push('/');
            path.push_str(RRTYPE_ANY);
        }
        path.push('/');
        path.push_str(&encode_name(bailiwick)?);
    }
    Ok(path)
}

pub(crate) fn rdata_name_path(
    mode: QueryMode,
    name: &str,
    rrtype: Option<&str>,
) -> Result<String, DnsdbError> {
    let mut path = format!("{}/rdata/name/{}", mode.as_str(), encode_name(name)?);
    if let Some(rrtype) = rrtype {
        path.push('/');
        path.push_str(rrtype);
    }
    Ok(path)
}

/// CIDR prefix lengths ride in the path, so `/` becomes `,` per the
/// server's addressing scheme. Address ranges (`a-b`) pass unchanged.
pub(crate) fn rdata_ip_path(mode: QueryMode, ip: &str) -> Result<String, DnsdbError> {
    if ip.is_empty() {
        return Err(DnsdbError::Query("empty IP address".to_string()));
    }
    Ok(format!("{}/rdata/ip/{}", mode.as_str(), ip.replace('/', ",")))
}

pub(crate) fn rdata_raw_path(
    mode: QueryMode,
    raw_rdata: &str,
    rrtype: Option<&str>,
) -> Result<String, DnsdbError> {
    if raw_rdata.is_empty() {
        return Err(DnsdbError::Query("empty raw rdata".to_string()));
    }
    let mut path = format!("{}/rdata/raw/{}", mode.as_str(), raw_rdata);
    if let Some(rrtype) = rrtype {
        path.push('/');
        path.push_str(rrtype);
    }
    Ok(path)
}

pub(crate) fn flex_path(
    method: FlexMethod,
    key: FlexKey,
    value: &str,
    rrtype: Option<&str>,
) -> Result<String, DnsdbError> {
    if value.is_empty() {
        return Err(DnsdbError::Query("empty flex pattern".to_string()));
    }
    let mut path = format!("{}/{}/{}", method.as_str(), key.as_str(), quote(value));
    if let Some(rrtype) = rrtype {
        path.push('/');
        path.push_str(rrtype);
    }
    Ok(path)
}
