//! JSON-RPC server
//!
//! `RpcServer::start` binds the listeners, builds the worker runtime and
//! spawns one accept loop per listener. Every accepted connection gets its
//! own task running `ConnectionServicer::serve_connection`, so a slow client
//! never holds up the next accept.

use crate::rpc::auth::{RpcAllowList, RpcCredentials};
use crate::rpc::dispatch::RequestDispatcher;
use crate::rpc::errors::RpcError;
use crate::rpc::http::{self, HttpError, MAX_BODY_BYTES};
use crate::rpc::scheduler::DeferredTaskScheduler;
use crate::rpc::tls::TlsMode;
use crate::rpc::types::{JsonRequest, RpcResponse};
use ::http::StatusCode;
use serde_json::Value;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default worker count (`rpcthreads`)
pub const DEFAULT_RPC_THREADS: usize = 4;

/// Delay after a failed login when the password is weak
const WEAK_PASSWORD_DELAY: Duration = Duration::from_millis(250);

const LISTEN_BACKLOG: i32 = 128;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("unable to bind any endpoint for RPC server on port {0}")]
    NoListener(u16),
    #[error("rpc thread count must be at least 1")]
    NoThreads,
    #[error("failed to start RPC worker pool: {0}")]
    Runtime(#[source] io::Error),
    #[error("failed to register RPC listener: {0}")]
    Listener(#[source] io::Error),
}

/// Everything the listener needs besides the dispatcher
#[derive(Debug)]
pub struct ServerSettings {
    pub port: u16,
    pub threads: usize,
    pub allow_list: RpcAllowList,
    pub credentials: RpcCredentials,
    pub tls: TlsMode,
    pub max_body_bytes: usize,
}

impl ServerSettings {
    pub fn new(port: u16, credentials: RpcCredentials) -> Self {
        Self {
            port,
            threads: DEFAULT_RPC_THREADS,
            allow_list: RpcAllowList::default(),
            credentials,
            tls: TlsMode::Disabled,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

/// Reads requests off one connection and answers them
pub struct ConnectionServicer {
    dispatcher: RequestDispatcher,
    credentials: RpcCredentials,
    allow_list: RpcAllowList,
    tls: TlsMode,
    max_body_bytes: usize,
}

/// What to send back for one request body
struct BodyReply {
    status: StatusCode,
    body: String,
    close: bool,
}

impl BodyReply {
    fn ok(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            close: false,
        }
    }

    /// Status from the error code, then close
    fn error(err: &RpcError, id: Value) -> Self {
        Self {
            status: err.code.http_status(),
            body: RpcResponse::error(err, id).to_body(),
            close: true,
        }
    }
}

impl ConnectionServicer {
    pub fn new(
        dispatcher: RequestDispatcher,
        credentials: RpcCredentials,
        allow_list: RpcAllowList,
        tls: TlsMode,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            dispatcher,
            credentials,
            allow_list,
            tls,
            max_body_bytes,
        }
    }

    /// Apply the allow-list, then TLS, then serve HTTP until the connection ends.
    pub async fn serve_connection<S>(&self, mut stream: S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        if !self.allow_list.client_allowed(peer.ip()) {
            debug!("RPC connection from {} not allowed", peer);
            // TLS clients get nothing, not even a handshake
            if !self.tls.is_tls() {
                let _ = stream
                    .write_all(&http::reply(StatusCode::FORBIDDEN, "", false))
                    .await;
                let _ = stream.shutdown().await;
            }
            return;
        }

        match &self.tls {
            TlsMode::Disabled => self.serve_http(stream, peer).await,
            TlsMode::Enabled(acceptor) => match acceptor.accept(stream).await {
                Ok(tls_stream) => self.serve_http(tls_stream, peer).await,
                Err(e) => debug!("TLS handshake with {} failed: {}", peer, e),
            },
            TlsMode::Unavailable => {
                debug!("Dropping RPC connection from {}: TLS not configured", peer);
            }
        }
    }

    async fn serve_http<S>(&self, stream: S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut conn = BufReader::new(stream);
        loop {
            let request = match http::read_request(&mut conn, self.max_body_bytes).await {
                Ok(request) => request,
                Err(HttpError::Closed) => break,
                Err(e) => {
                    debug!("Bad HTTP request from {}: {}", peer, e);
                    if let Some(status) = e.reply_status() {
                        let _ = conn.write_all(&http::reply(status, "", false)).await;
                    }
                    break;
                }
            };

            if request.uri != "/" {
                let _ = conn
                    .write_all(&http::reply(StatusCode::NOT_FOUND, "", false))
                    .await;
                break;
            }

            let Some(authorization) = request.header("authorization") else {
                let _ = conn.write_all(&http::unauthorized_reply()).await;
                break;
            };
            if !self.credentials.authorized(authorization) {
                warn!("ThreadRPCServer incorrect password attempt from {}", peer);
                if self.credentials.is_weak() {
                    tokio::time::sleep(WEAK_PASSWORD_DELAY).await;
                }
                let _ = conn.write_all(&http::unauthorized_reply()).await;
                break;
            }

            let keep_alive = request.keep_alive();
            let reply = self.handle_body(&request.body);
            let keep_open = keep_alive && !reply.close;

            if let Err(e) = conn
                .write_all(&http::reply(reply.status, &reply.body, keep_open))
                .await
            {
                debug!("Failed to write RPC reply to {}: {}", peer, e);
                break;
            }
            if !keep_open {
                break;
            }
        }
        let _ = conn.shutdown().await;
    }

    fn handle_body(&self, body: &[u8]) -> BodyReply {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) => return BodyReply::error(&RpcError::parse_error("Parse error"), Value::Null),
        };

        match value {
            Value::Object(_) => match JsonRequest::parse(&value) {
                Ok(request) => {
                    let response = run_handler(|| self.dispatcher.execute_request(&request));
                    BodyReply::ok(response.to_body())
                }
                Err(invalid) => BodyReply::error(&invalid.error, invalid.id),
            },
            Value::Array(batch) => {
                let responses = run_handler(|| self.dispatcher.execute_batch(&batch));
                let array = Value::Array(responses.iter().map(RpcResponse::to_value).collect());
                BodyReply::ok(format!("{}\n", array))
            }
            _ => BodyReply::error(
                &RpcError::parse_error("Top-level object parse error"),
                Value::Null,
            ),
        }
    }
}

/// Handlers block; on the worker pool, tell the runtime so other
/// connections keep being polled.
fn run_handler<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn bind_listener(addr: SocketAddr, v6_only: bool) -> io::Result<(std::net::TcpListener, bool)> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;

    let mut v6_only_failed = false;
    if addr.is_ipv6() {
        if let Err(e) = socket.set_only_v6(v6_only) {
            warn!("Could not set IPV6_V6ONLY on {}: {}", addr, e);
            v6_only_failed = true;
        }
    }

    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;
    Ok((socket.into(), v6_only_failed))
}

/// Bind the RPC port. Loopback only when no allow-list is configured.
///
/// IPv6 is tried first; IPv4 is bound as well in loopback mode, when IPv6
/// fails, or when the IPv6 socket could not be told whether to be dual-stack.
pub fn bind_rpc_listeners(
    port: u16,
    loopback: bool,
) -> Result<Vec<std::net::TcpListener>, ServerError> {
    let mut listeners = Vec::new();
    let mut bind_v4 = loopback;

    let v6: IpAddr = if loopback {
        Ipv6Addr::LOCALHOST.into()
    } else {
        Ipv6Addr::UNSPECIFIED.into()
    };
    match bind_listener(SocketAddr::new(v6, port), loopback) {
        Ok((listener, v6_only_failed)) => {
            listeners.push(listener);
            bind_v4 |= v6_only_failed;
        }
        Err(e) => {
            warn!(
                "An error occurred while setting up the RPC port {} for listening on IPv6, falling back to IPv4: {}",
                port, e
            );
            bind_v4 = true;
        }
    }

    if bind_v4 {
        let v4: IpAddr = if loopback {
            Ipv4Addr::LOCALHOST.into()
        } else {
            Ipv4Addr::UNSPECIFIED.into()
        };
        match bind_listener(SocketAddr::new(v4, port), false) {
            Ok((listener, _)) => listeners.push(listener),
            Err(e) => warn!(
                "An error occurred while setting up the RPC port {} for listening on IPv4: {}",
                port, e
            ),
        }
    }

    if listeners.is_empty() {
        return Err(ServerError::NoListener(port));
    }
    Ok(listeners)
}

/// A running RPC server
pub struct RpcServer {
    runtime: Option<Runtime>,
    cancel: CancellationToken,
    scheduler: DeferredTaskScheduler,
    local_addrs: Vec<SocketAddr>,
    accept_loops: Vec<JoinHandle<()>>,
}

impl RpcServer {
    /// Bind, seal the network selection and start serving.
    pub fn start(settings: ServerSettings, dispatcher: RequestDispatcher) -> Result<Self, ServerError> {
        if settings.threads == 0 {
            return Err(ServerError::NoThreads);
        }

        // Profile switches are only valid before services start
        dispatcher.node().network().seal();

        let listeners = bind_rpc_listeners(settings.port, settings.allow_list.is_empty())?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(settings.threads)
            .thread_name("clam-rpc")
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        let servicer = Arc::new(ConnectionServicer::new(
            dispatcher,
            settings.credentials,
            settings.allow_list,
            settings.tls,
            settings.max_body_bytes,
        ));
        let cancel = CancellationToken::new();
        let scheduler = DeferredTaskScheduler::new(runtime.handle().clone());

        let mut local_addrs = Vec::new();
        let mut accept_loops = Vec::new();
        {
            let _enter = runtime.enter();
            for std_listener in listeners {
                let listener = TcpListener::from_std(std_listener).map_err(ServerError::Listener)?;
                let local = listener.local_addr().map_err(ServerError::Listener)?;
                info!("RPC server listening on {}", local);
                local_addrs.push(local);
                accept_loops.push(runtime.spawn(accept_loop(
                    listener,
                    Arc::clone(&servicer),
                    cancel.clone(),
                )));
            }
        }

        Ok(Self {
            runtime: Some(runtime),
            cancel,
            scheduler,
            local_addrs,
            accept_loops,
        })
    }

    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// Timers sharing this server's worker pool
    pub fn scheduler(&self) -> &DeferredTaskScheduler {
        &self.scheduler
    }

    pub fn run_later<F>(&self, name: &str, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.scheduler.run_later(name, delay, callback);
    }

    pub fn is_running(&self) -> bool {
        self.runtime.is_some()
    }

    /// Cancel timers, stop accepting and join the worker pool.
    ///
    /// Blocks until in-flight handlers return, unless called from inside an
    /// async context, where the pool is released in the background.
    pub fn stop(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        info!("Stopping RPC server");
        self.scheduler.shutdown();
        self.cancel.cancel();
        for accept_loop in self.accept_loops.drain(..) {
            accept_loop.abort();
        }

        if Handle::try_current().is_ok() {
            runtime.shutdown_background();
        } else {
            drop(runtime);
        }
        debug!("RPC server stopped");
    }
}

impl Drop for RpcServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn accept_loop(
    listener: TcpListener,
    servicer: Arc<ConnectionServicer>,
    cancel: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, peer)) => {
                debug!("New RPC connection from {}", peer);
                let servicer = Arc::clone(&servicer);
                tokio::spawn(async move {
                    servicer.serve_connection(stream, peer).await;
                });
            }
            Err(e) => {
                error!("Failed to accept RPC connection: {}", e);
                // Back off on errors like EMFILE
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chainparams::NetworkRegistry;
    use crate::node::NodeContext;
    use crate::rpc::table::{CallContext, CommandFlags, CommandOutput, CommandTable};
    use crate::rpc::tls;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use tokio::io::{duplex, AsyncReadExt};
    use tokio_rustls::TlsConnector;

    const LONG_PASSWORD: &str = "correct-horse-battery-staple";

    fn servicer(allow: Vec<String>, tls: TlsMode) -> Arc<ConnectionServicer> {
        let table = CommandTable::builder()
            .command(
                "ping",
                CommandFlags::THREAD_SAFE | CommandFlags::OK_SAFE_MODE,
                |_: &CallContext<'_>, _: &[Value], _| Ok(CommandOutput::Value(Value::from("pong"))),
            )
            .unwrap()
            .build();
        let node = NodeContext::new(Arc::new(NetworkRegistry::new()));
        let dispatcher = RequestDispatcher::new(Arc::new(table), Arc::new(node));
        Arc::new(ConnectionServicer::new(
            dispatcher,
            RpcCredentials::new("user", LONG_PASSWORD),
            RpcAllowList::new(allow),
            tls,
            1024,
        ))
    }

    fn post(body: &str, auth: Option<&str>, extra: &str) -> String {
        let auth = auth
            .map(|raw| format!("Authorization: Basic {}\r\n", STANDARD.encode(raw)))
            .unwrap_or_default();
        format!(
            "POST / HTTP/1.1\r\nHost: localhost\r\n{}{}Content-Length: {}\r\n\r\n{}",
            auth,
            extra,
            body.len(),
            body
        )
    }

    async fn exchange(servicer: Arc<ConnectionServicer>, peer: &str, request: &str) -> String {
        let (mut client, server) = duplex(64 * 1024);
        let peer: SocketAddr = peer.parse().unwrap();
        let task = tokio::spawn(async move { servicer.serve_connection(server, peer).await });

        client.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        task.await.unwrap();
        String::from_utf8(response).unwrap()
    }

    fn credentials() -> String {
        format!("user:{}", LONG_PASSWORD)
    }

    #[tokio::test]
    async fn test_authorized_call() {
        let request = post(
            r#"{"method":"ping","id":7}"#,
            Some(&credentials()),
            "Connection: close\r\n",
        );
        let response = exchange(servicer(vec![], TlsMode::Disabled), "127.0.0.1:5000", &request).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Connection: close\r\n"));
        assert!(response.ends_with("{\"result\":\"pong\",\"error\":null,\"id\":7}\n"));
    }

    #[tokio::test]
    async fn test_keep_alive_serves_several_requests() {
        let first = post(r#"{"method":"ping","id":1}"#, Some(&credentials()), "");
        let second = post(
            r#"{"method":"ping","id":2}"#,
            Some(&credentials()),
            "Connection: close\r\n",
        );
        let response = exchange(
            servicer(vec![], TlsMode::Disabled),
            "127.0.0.1:5000",
            &format!("{}{}", first, second),
        )
        .await;
        assert_eq!(response.matches("HTTP/1.1 200 OK").count(), 2);
        assert!(response.contains("\"id\":1}"));
        assert!(response.contains("\"id\":2}"));
    }

    #[tokio::test]
    async fn test_missing_and_wrong_credentials() {
        let request = post(r#"{"method":"ping","id":1}"#, None, "");
        let response = exchange(servicer(vec![], TlsMode::Disabled), "127.0.0.1:5000", &request).await;
        assert!(response.starts_with("HTTP/1.0 401 Authorization Required\r\n"));
        assert!(response.contains("WWW-Authenticate: Basic realm=\"jsonrpc\""));

        let request = post(r#"{"method":"ping","id":1}"#, Some("user:wrongpass"), "");
        let response = exchange(servicer(vec![], TlsMode::Disabled), "127.0.0.1:5000", &request).await;
        assert!(response.starts_with("HTTP/1.0 401"));
        assert!(!response.contains("pong"));
    }

    #[tokio::test]
    async fn test_non_root_uri() {
        let request = format!(
            "GET /wallet HTTP/1.1\r\nAuthorization: Basic {}\r\n\r\n",
            STANDARD.encode(credentials())
        );
        let response = exchange(servicer(vec![], TlsMode::Disabled), "127.0.0.1:5000", &request).await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[tokio::test]
    async fn test_disallowed_peer_gets_403() {
        let request = post(r#"{"method":"ping","id":1}"#, Some(&credentials()), "");
        let response = exchange(servicer(vec![], TlsMode::Disabled), "10.1.2.3:5000", &request).await;
        assert!(response.starts_with("HTTP/1.1 403 Forbidden\r\n"));
        assert!(!response.contains("pong"));

        let allowed = exchange(
            servicer(vec!["10.1.2.*".to_string()], TlsMode::Disabled),
            "10.1.2.3:5000",
            &post(r#"{"method":"ping","id":1}"#, Some(&credentials()), "Connection: close\r\n"),
        )
        .await;
        assert!(allowed.contains("pong"));
    }

    #[tokio::test]
    async fn test_disallowed_tls_peer_dropped_silently() {
        let request = post(r#"{"method":"ping","id":1}"#, Some(&credentials()), "");
        let response = exchange(servicer(vec![], TlsMode::Unavailable), "10.1.2.3:5000", &request).await;
        assert!(response.is_empty());
    }

    fn enabled_tls() -> TlsMode {
        let (cert, key) = tls::fixture_paths();
        TlsMode::Enabled(tls::build_acceptor(&cert, &key, tls::DEFAULT_CIPHERS).unwrap())
    }

    /// Client that trusts only the fixture certificate
    fn tls_connector() -> TlsConnector {
        let (cert, _) = tls::fixture_paths();
        let mut roots = rustls::RootCertStore::empty();
        for cert in tls::load_certificates(&cert).unwrap() {
            roots.add(&cert).unwrap();
        }
        let config = rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth();
        TlsConnector::from(Arc::new(config))
    }

    #[tokio::test]
    async fn test_tls_client_completes_handshake_and_call() {
        let (client, server) = duplex(64 * 1024);
        let service = servicer(vec![], enabled_tls());
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let task = tokio::spawn(async move { service.serve_connection(server, peer).await });

        let domain = rustls::ServerName::try_from("localhost").unwrap();
        let mut stream = tls_connector().connect(domain, client).await.unwrap();

        let first = post(r#"{"method":"ping","id":1}"#, Some(&credentials()), "");
        let second = post(
            r#"{"method":"ping","id":2}"#,
            Some(&credentials()),
            "Connection: close\r\n",
        );
        stream
            .write_all(format!("{}{}", first, second).as_bytes())
            .await
            .unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        task.await.unwrap();

        let response = String::from_utf8(response).unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(response.matches("HTTP/1.1 200 OK").count(), 2);
        assert!(response.contains("{\"result\":\"pong\",\"error\":null,\"id\":1}"));
        assert!(response.ends_with("{\"result\":\"pong\",\"error\":null,\"id\":2}\n"));
    }

    #[tokio::test]
    async fn test_tls_client_with_bad_credentials_gets_401() {
        let (client, server) = duplex(64 * 1024);
        let service = servicer(vec![], enabled_tls());
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let task = tokio::spawn(async move { service.serve_connection(server, peer).await });

        let domain = rustls::ServerName::try_from("localhost").unwrap();
        let mut stream = tls_connector().connect(domain, client).await.unwrap();
        let request = post(r#"{"method":"ping","id":1}"#, Some("user:wrongpass"), "");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        task.await.unwrap();

        let response = String::from_utf8(response).unwrap();
        assert!(response.starts_with("HTTP/1.0 401"));
        assert!(!response.contains("pong"));
    }

    #[tokio::test]
    async fn test_disallowed_peer_dropped_before_handshake() {
        let (client, server) = duplex(64 * 1024);
        let service = servicer(vec![], enabled_tls());
        let peer: SocketAddr = "10.1.2.3:5000".parse().unwrap();
        let task = tokio::spawn(async move { service.serve_connection(server, peer).await });

        let domain = rustls::ServerName::try_from("localhost").unwrap();
        assert!(tls_connector().connect(domain, client).await.is_err());
        task.await.unwrap();

        // Not even a 403 in the clear
        let request = post(r#"{"method":"ping","id":1}"#, Some(&credentials()), "");
        let response = exchange(servicer(vec![], enabled_tls()), "10.1.2.3:5000", &request).await;
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_request_shape_errors_close_connection() {
        let cases = [
            ("{not json", "HTTP/1.1 500", -32700),
            (r#"{"method":"ping","params":{"a":1},"id":3}"#, "HTTP/1.1 400", -32600),
            ("42", "HTTP/1.1 500", -32700),
        ];
        for (body, status, code) in cases {
            let request = post(body, Some(&credentials()), "");
            let response =
                exchange(servicer(vec![], TlsMode::Disabled), "127.0.0.1:5000", &request).await;
            assert!(response.starts_with(status), "{}: {}", body, response);
            assert!(response.contains("Connection: close\r\n"));
            assert!(response.contains(&format!("\"code\":{}", code)));
        }
    }

    #[tokio::test]
    async fn test_dispatch_error_keeps_status_200() {
        let request = post(
            r#"{"method":"nonexistent","id":"x"}"#,
            Some(&credentials()),
            "Connection: close\r\n",
        );
        let response = exchange(servicer(vec![], TlsMode::Disabled), "127.0.0.1:5000", &request).await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("\"code\":-32601"));
        assert!(response.contains("\"id\":\"x\""));
    }

    #[tokio::test]
    async fn test_oversized_body() {
        let body = "x".repeat(2048);
        let request = post(&body, Some(&credentials()), "");
        let response = exchange(servicer(vec![], TlsMode::Disabled), "127.0.0.1:5000", &request).await;
        assert!(response.starts_with("HTTP/1.1 500"));
    }

    #[test]
    fn test_bind_loopback_listeners() {
        let listeners = bind_rpc_listeners(0, true).unwrap();
        assert!(!listeners.is_empty());
        for listener in &listeners {
            assert!(listener.local_addr().unwrap().ip().is_loopback());
        }
    }
}
