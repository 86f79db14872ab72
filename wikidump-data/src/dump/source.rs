use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Response};
use std::{io, time::Duration};

use super::util::sanitise_base_url;
use super::{BaseUrl, DumpUrl, TransferError, TransportError};

/// User agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "wikidump/0.1";

/// Receives an archive as it streams in.
pub trait ArchiveSink {
    /// Called once before the first chunk with the declared content length.
    fn begin(&mut self, content_length: Option<u64>);
    /// Append a chunk of the archive body.
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), TransferError>;
}

/// Abstraction over the dump server so tests can run offline.
#[async_trait(?Send)]
pub trait DumpSource {
    /// Base URL of the dump endpoint.
    fn base_url(&self) -> &BaseUrl;
    /// Fetch the RSS feed at `url` and return its body.
    async fn fetch_feed(&self, url: &DumpUrl) -> Result<Vec<u8>, TransportError>;
    /// Stream the archive identified by `url` into `sink`, returning the
    /// number of bytes received.
    async fn download_archive(
        &self,
        url: &DumpUrl,
        sink: &mut dyn ArchiveSink,
    ) -> Result<u64, TransferError>;
}

/// HTTP implementation of [`DumpSource`].
#[derive(Debug)]
pub struct HttpDumpSource {
    client: Client,
    base_url: BaseUrl,
    user_agent: String,
}

impl HttpDumpSource {
    /// Construct an HTTP-backed dump source.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| TransportError::Client { source })?;
        Ok(Self {
            client,
            base_url: sanitise_base_url(base_url),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        })
    }

    /// Override the default user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    async fn call(&self, url: &str, timeout: Option<Duration>) -> Result<Response, TransportError> {
        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str());
        if let Some(limit) = timeout {
            request = request.timeout(limit);
        }
        request
            .send()
            .await
            .map_err(|err| convert_reqwest_error(err, url))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(err, url))
    }
}

#[async_trait(?Send)]
impl DumpSource for HttpDumpSource {
    fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    async fn fetch_feed(&self, url: &DumpUrl) -> Result<Vec<u8>, TransportError> {
        let response = self.call(url, Some(Duration::from_secs(15))).await?;
        let body = response
            .bytes()
            .await
            .map_err(|err| convert_reqwest_error(err, url))?;
        Ok(body.to_vec())
    }

    async fn download_archive(
        &self,
        url: &DumpUrl,
        sink: &mut dyn ArchiveSink,
    ) -> Result<u64, TransferError> {
        let response = self
            .call(url, None)
            .await
            .map_err(|source| TransferError::Transport { source })?;
        sink.begin(response.content_length());
        let mut received = 0_u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|err| TransferError::Transport {
                source: convert_reqwest_error(err, url),
            })?;
            sink.write_chunk(&bytes)?;
            received = received.saturating_add(bytes.len() as u64);
        }
        Ok(received)
    }
}

fn convert_reqwest_error(error: reqwest::Error, url: &str) -> TransportError {
    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    let kind = if error.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    TransportError::Network {
        url: url.to_owned(),
        source: io::Error::new(kind, error),
    }
}
