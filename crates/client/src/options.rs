use std::collections::BTreeMap;

/// Optional parameters accepted by the DNSDB query endpoints.
///
/// Named fields cover every parameter documented by the v2 API. `extra`
/// carries forward-compatible parameters the server may accept later; the
/// server is authoritative on acceptance, so no allow-list is enforced
/// here. When a key is supplied both as a named field and in `extra`, the
/// named field wins. `extra` iterates in sorted order, so the wire
/// encoding is deterministic.
///
/// Timestamps are epoch seconds; negative values mean "N seconds before
/// now" and are passed through verbatim.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Only results first observed before this timestamp.
    pub time_first_before: Option<i64>,
    /// Only results first observed after this timestamp.
    pub time_first_after: Option<i64>,
    /// Only results last observed before this timestamp.
    pub time_last_before: Option<i64>,
    /// Only results last observed after this timestamp.
    pub time_last_after: Option<i64>,
    /// Row cap for lookup results. `0` requests the server maximum.
    pub limit: Option<u64>,
    /// Rows to skip, for incremental result transfer (lookup family).
    pub offset: Option<u64>,
    /// Stop summarizing once this many records have been examined
    /// (summarize family). The reported count may exceed it.
    pub max_count: Option<u64>,
    /// Client-software-specific identity of the end user, logged
    /// server-side.
    pub id: Option<String>,
    /// Exclude results matching this pattern (flex family).
    pub exclude: Option<String>,
    /// Group identical rrsets across all time periods.
    pub aggr: Option<bool>,
    /// Return RFC3339 times instead of epoch seconds.
    pub humantime: Option<bool>,
    /// Include `count`/`time_first`/`time_last` in flex output.
    pub verbose: Option<bool>,
    /// Open extension map for parameters not modeled above.
    pub extra: BTreeMap<String, String>,
    /// End the stream quietly when the row limit is reached instead of
    /// surfacing `DnsdbError::QueryLimited`. Never sent on the wire.
    pub ignore_limited: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_first_before(mut self, ts: i64) -> Self {
        self.time_first_before = Some(ts);
        self
    }

    pub fn with_time_first_after(mut self, ts: i64) -> Self {
        self.time_first_after = Some(ts);
        self
    }

    pub fn with_time_last_before(mut self, ts: i64) -> Self {
        self.time_last_before = Some(ts);
        self
    }

    pub fn with_time_last_after(mut self, ts: i64) -> Self {
        self.time_last_after = Some(ts);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_max_count(mut self, max_count: u64) -> Self {
        self.max_count = Some(max_count);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude = Some(pattern.into());
        self
    }

    pub fn with_aggr(mut self, aggr: bool) -> Self {
        self.aggr = Some(aggr);
        self
    }

    pub fn with_humantime(mut self, humantime: bool) -> Self {
        self.humantime = Some(humantime);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn with_ignore_limited(mut self, ignore_limited: bool) -> Self {
        self.ignore_limited = ignore_limited;
        self
    }

    /// Query-string pairs for every supplied parameter, named fields
    /// first, then non-shadowed `extra` entries in sorted order.
    pub(crate) fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = Vec::new();

        if let Some(v) = self.time_first_before {
            params.push(("time_first_before".to_string(), v.to_string()));
        }
        if let Some(v) = self.time_first_after {
            params.push(("time_first_after".to_string(), v.to_string()));
        }
        if let Some(v) = self.time_last_before {
            params.push(("time_last_before".to_string(), v.to_string()));
        }
        if let Some(v) = self.time_last_after {
            params.push(("time_last_after".to_string(), v.to_string()));
        }
        if let Some(v) = self.limit {
            params.push(("limit".to_string(), v.to_string()));
        }
        if let Some(v) = self.offset {
            params.push(("offset".to_string(), v.to_string()));
        }
        if let Some(v) = self.max_count {
            params.push(("max_count".to_string(), v.to_string()));
        }
        if let Some(v) = &self.id {
            params.push(("id".to_string(), v.clone()));
        }
        if let Some(v) = &self.exclude {
            params.push(("exclude".to_string(), v.clone()));
        }
        if let Some(v) = self.aggr {
            params.push(("aggr".to_string(), v.to_string()));
        }
        if let Some(v) = self.humantime {
            params.push(("humantime".to_string(), v.to_string()));
        }
        if let Some(v) = self.verbose {
            params.push(("verbose".to_string(), v.to_string()));
        }

        for (name, value) in &self.extra {
            if params.iter().any(|(n, _)| n == name) {
                continue;
            }
            params.push((name.clone(), value.clone()));
        }

        params
    }
}
