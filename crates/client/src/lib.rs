//! Client for the DNSDB API protocol version 2 with Flex Search.
//!
//! Query methods return a [`SafStream`], a lazy stream of decoded JSON
//! records. Server-side limit/failure conditions embedded in the stream
//! surface as errors while the caller pulls, after every preceding record
//! has been yielded.
//!
//! ```no_run
//! use dnsdb2_client::{Client, QueryOptions};
//! use futures::TryStreamExt;
//!
//! # async fn run() -> Result<(), dnsdb2_client::DnsdbError> {
//! let client = Client::builder("my-api-key")
//!     .with_swclient("yourappname", "v0.0")
//!     .build()?;
//!
//! let opts = QueryOptions::new().with_limit(1);
//! let mut results = client.flex_rrnames_regex(r"\._dkim\.", None, opts).await?;
//! while let Some(record) = results.try_next().await? {
//!     println!("{record}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod errors;
pub mod options;
pub mod request;
pub mod saf;

pub use client::{Client, ClientBuilder, DEFAULT_DNSDB_SERVER};
pub use errors::DnsdbError;
pub use options::QueryOptions;
pub use saf::{SafStream, StreamState};
