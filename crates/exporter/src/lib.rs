//! Single-shot OTLP trace export over gRPC
//!
//! Every call to [`Exporter::export`] builds its own channel, sends one
//! `TraceService/Export` request with the Arize credentials attached as
//! call metadata, and drops the channel before returning.

pub mod error;

pub use error::{ExportError, Result};

use config::Config;
use mapper::otlp::collector::trace::v1::trace_service_client::TraceServiceClient;
use mapper::TraceExport;
use std::time::Duration;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::Request;

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const SPACE_ID_HEADER: &str = "space_id";

/// Sends trace exports to an OTLP collector
#[derive(Clone)]
pub struct Exporter {
    endpoint: String,
    api_key: String,
    space_id: String,
    timeout: Duration,
}

impl Exporter {
    /// Create an exporter from the run configuration
    pub fn new(config: &Config) -> Self {
        Self {
            endpoint: config.otlp_endpoint.clone(),
            api_key: config.api_key.clone(),
            space_id: config.space_id.clone(),
            timeout: config.export_timeout(),
        }
    }

    /// Replace the collector URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform exactly one export attempt
    ///
    /// Any response the collector returns without a gRPC error counts as
    /// success, including one that reports rejected spans.
    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint))]
    pub async fn export(&self, export: TraceExport) -> Result<()> {
        let request = self.build_request(export)?;

        tokio::time::timeout(self.timeout, self.send(request))
            .await
            .map_err(|_| ExportError::Timeout(self.timeout))?
    }

    async fn send(&self, request: Request<TraceExport>) -> Result<()> {
        let channel = self.connect().await?;
        let mut client = TraceServiceClient::new(channel);

        let response = client.export(request).await?.into_inner();

        if let Some(partial) = response.partial_success {
            if partial.rejected_spans > 0 || !partial.error_message.is_empty() {
                tracing::warn!(
                    rejected_spans = partial.rejected_spans,
                    message = %partial.error_message,
                    "Collector reported partial success"
                );
            }
        }

        tracing::info!("Export completed");
        Ok(())
    }

    /// Attach credentials and the call deadline to the request
    fn build_request(&self, export: TraceExport) -> Result<Request<TraceExport>> {
        let authorization = MetadataValue::try_from(format!("Bearer {}", self.api_key))
            .map_err(|source| ExportError::InvalidMetadata {
                header: AUTHORIZATION_HEADER,
                source,
            })?;
        let space_id = MetadataValue::try_from(self.space_id.as_str()).map_err(|source| {
            ExportError::InvalidMetadata {
                header: SPACE_ID_HEADER,
                source,
            }
        })?;

        let mut request = Request::new(export);
        request.set_timeout(self.timeout);
        let metadata = request.metadata_mut();
        metadata.insert(AUTHORIZATION_HEADER, authorization);
        metadata.insert(SPACE_ID_HEADER, space_id);

        Ok(request)
    }

    async fn connect(&self) -> Result<Channel> {
        tracing::debug!("Connecting to collector");

        let invalid = |source| ExportError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            source,
        };

        let mut endpoint = Endpoint::from_shared(self.endpoint.clone())
            .map_err(invalid)?
            .connect_timeout(self.timeout)
            .timeout(self.timeout);

        if endpoint.uri().scheme_str() == Some("https") {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .map_err(invalid)?;
        }

        let channel = endpoint
            .connect()
            .await
            .map_err(|source| ExportError::Connect {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        tracing::debug!("Connected to collector");
        Ok(channel)
    }
}
