//! In-process OTLP collectors used by the exporter and end-to-end tests

use mapper::otlp::collector::trace::v1::{
    trace_service_server::{TraceService, TraceServiceServer},
    ExportTracePartialSuccess, ExportTraceServiceRequest, ExportTraceServiceResponse,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{transport::Server, Request, Response, Status};

/// How the mock collector answers an export call
#[derive(Debug, Clone, Default)]
pub enum CollectorBehavior {
    /// Accept every span
    #[default]
    Accept,
    /// Answer with a partial success rejecting this many spans
    RejectSpans(i64),
    /// Fail the call with an unauthenticated status
    Unauthenticated,
    /// Hold the call open before accepting it
    Stall(Duration),
}

/// One export call as seen by the collector
#[derive(Debug, Clone)]
pub struct RecordedExport {
    pub request: ExportTraceServiceRequest,
    pub authorization: Option<String>,
    pub space_id: Option<String>,
}

#[derive(Clone)]
struct RecordingCollector {
    behavior: CollectorBehavior,
    received: Arc<Mutex<Vec<RecordedExport>>>,
}

#[tonic::async_trait]
impl TraceService for RecordingCollector {
    async fn export(
        &self,
        request: Request<ExportTraceServiceRequest>,
    ) -> Result<Response<ExportTraceServiceResponse>, Status> {
        let header = |name: &str| {
            request
                .metadata()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let recorded = RecordedExport {
            authorization: header("authorization"),
            space_id: header("space_id"),
            request: request.get_ref().clone(),
        };
        self.received
            .lock()
            .map_err(|_| Status::internal("recorder poisoned"))?
            .push(recorded);

        tracing::debug!(behavior = ?self.behavior, "Mock collector received export");

        match &self.behavior {
            CollectorBehavior::Accept => Ok(Response::new(ExportTraceServiceResponse {
                partial_success: None,
            })),
            CollectorBehavior::RejectSpans(count) => Ok(Response::new(ExportTraceServiceResponse {
                partial_success: Some(ExportTracePartialSuccess {
                    rejected_spans: *count,
                    error_message: "spans rejected by mock".to_string(),
                }),
            })),
            CollectorBehavior::Unauthenticated => {
                Err(Status::unauthenticated("invalid api key"))
            }
            CollectorBehavior::Stall(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(Response::new(ExportTraceServiceResponse {
                    partial_success: None,
                }))
            }
        }
    }
}

/// A plaintext OTLP trace collector bound to an ephemeral local port
pub struct MockCollector {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<RecordedExport>>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl MockCollector {
    pub async fn start(behavior: CollectorBehavior) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let received = Arc::new(Mutex::new(Vec::new()));
        let service = RecordingCollector {
            behavior,
            received: received.clone(),
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let result = Server::builder()
                .add_service(TraceServiceServer::new(service))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Mock collector failed");
            }
        });

        Ok(Self {
            addr,
            received,
            shutdown: Some(shutdown_tx),
            handle,
        })
    }

    /// URL to hand to the exporter
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Exports received so far
    pub fn received(&self) -> Vec<RecordedExport> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

/// Start a listener that accepts TCP connections and closes them at once,
/// before any HTTP/2 exchange. Returns its URL.
pub async fn start_closing_listener() -> anyhow::Result<(String, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    Ok((format!("http://{}", addr), handle))
}

/// URL of a local port with nothing listening on it
pub async fn unused_endpoint() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}
