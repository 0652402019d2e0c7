//! HTTP/1.1 server loop on hyper.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::error::ApiError;
use crate::http::{Request, Response};

/// Something that turns requests into responses.
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response, ApiError>;
}

/// Fans a shutdown signal out to the accept loop and open connections.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
	sender: broadcast::Sender<()>,
}

impl Default for ShutdownCoordinator {
	fn default() -> Self {
		Self::new()
	}
}

impl ShutdownCoordinator {
	pub fn new() -> Self {
		let (sender, _) = broadcast::channel(1);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<()> {
		self.sender.subscribe()
	}

	pub fn shutdown(&self) {
		let _ = self.sender.send(());
	}
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!("Failed to listen for shutdown signal: {}", e);
		std::future::pending::<()>().await;
	}
}

/// HTTP server dispatching every request to one handler.
pub struct HttpServer {
	handler: Arc<dyn Handler>,
	max_body_bytes: u64,
}

impl HttpServer {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			max_body_bytes: 20 * 1024 * 1024,
		}
	}

	/// Requests with larger bodies are answered with 413.
	pub fn with_max_body_bytes(mut self, max: u64) -> Self {
		self.max_body_bytes = max;
		self
	}

	pub fn handler(&self) -> Arc<dyn Handler> {
		self.handler.clone()
	}

	/// Accept connections on `listener` until `coordinator` signals
	/// shutdown.
	pub async fn serve(
		self,
		listener: TcpListener,
		coordinator: ShutdownCoordinator,
	) -> std::io::Result<()> {
		let mut shutdown_rx = coordinator.subscribe();
		tracing::info!("Server listening on http://{}", listener.local_addr()?);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, socket_addr) = result?;
					let service = RequestService {
						handler: self.handler.clone(),
						remote_addr: socket_addr,
						max_body_bytes: self.max_body_bytes,
					};
					let mut conn_shutdown = coordinator.subscribe();

					tokio::task::spawn(async move {
						tokio::select! {
							result = Self::handle_connection(stream, service) => {
								if let Err(err) = result {
									tracing::debug!("Error handling connection from {}: {}", socket_addr, err);
								}
							}
							_ = conn_shutdown.recv() => {}
						}
					});
				}
				_ = shutdown_rx.recv() => {
					tracing::info!("Shutdown signal received, stopping server");
					break;
				}
			}
		}
		Ok(())
	}

	async fn handle_connection(stream: TcpStream, service: RequestService) -> Result<(), hyper::Error> {
		let io = TokioIo::new(stream);
		http1::Builder::new().serve_connection(io, service).await
	}
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve_with_shutdown(server: HttpServer, addr: SocketAddr) -> std::io::Result<()> {
	let listener = TcpListener::bind(addr).await?;
	let coordinator = ShutdownCoordinator::new();
	let trigger = coordinator.clone();
	tokio::spawn(async move {
		shutdown_signal().await;
		trigger.shutdown();
	});
	server.serve(listener, coordinator).await
}

/// Service implementation for hyper
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
	max_body_bytes: u64,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = http::Error;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;
		let max_body_bytes = self.max_body_bytes;

		Box::pin(async move {
			let started = Instant::now();
			let (parts, body) = req.into_parts();
			let method = parts.method.clone();
			let path = parts.uri.path().to_string();

			let limit = usize::try_from(max_body_bytes).unwrap_or(usize::MAX);
			let response = match Limited::new(body, limit).collect().await {
				Ok(collected) => {
					let mut request = Request::new(
						parts.method,
						parts.uri,
						parts.version,
						parts.headers,
						collected.to_bytes(),
					);
					request.remote_addr = Some(remote_addr);
					handler
						.handle(request)
						.await
						.unwrap_or_else(ApiError::into_response)
				}
				Err(e) if e.is::<LengthLimitError>() => {
					ApiError::PayloadTooLarge(max_body_bytes).into_response()
				}
				Err(e) => ApiError::BadRequest(format!("Failed to read request body: {}", e))
					.into_response(),
			};

			tracing::info!(
				"{} {} {} {}ms",
				method,
				path,
				response.status.as_u16(),
				started.elapsed().as_millis()
			);

			let mut builder = hyper::Response::builder().status(response.status);
			for (key, value) in response.headers.iter() {
				builder = builder.header(key, value);
			}
			builder.body(Full::new(response.body))
		})
	}
}
