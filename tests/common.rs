#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clam_node::chainparams::NetworkRegistry;
use clam_node::node::NodeContext;
use clam_node::rpc::auth::{RpcAllowList, RpcCredentials};
use clam_node::rpc::{CommandTable, RequestDispatcher, RpcServer, ServerSettings};
use serde_json::Value;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

pub const USER: &str = "clamrpc";
pub const PASSWORD: &str = "7Vd3qXc9RkP2mWz8sYt4LnB6";

pub struct TestServer {
    pub server: RpcServer,
    pub addr: SocketAddr,
    pub node: Arc<NodeContext>,
    pub registry: Arc<NetworkRegistry>,
}

/// Start a loopback server on an ephemeral port
pub fn start_server(table: CommandTable) -> TestServer {
    let registry = Arc::new(NetworkRegistry::new());
    start_server_with(table, NodeContext::new(Arc::clone(&registry)), registry)
}

pub fn start_server_with(
    table: CommandTable,
    node: NodeContext,
    registry: Arc<NetworkRegistry>,
) -> TestServer {
    let node = Arc::new(node);
    let dispatcher = RequestDispatcher::new(Arc::new(table), Arc::clone(&node));
    let mut settings = ServerSettings::new(0, RpcCredentials::new(USER, PASSWORD));
    settings.allow_list = RpcAllowList::default();
    let server = RpcServer::start(settings, dispatcher).expect("server starts");

    let addrs = server.local_addrs();
    let addr = addrs
        .iter()
        .copied()
        .find(SocketAddr::is_ipv4)
        .unwrap_or(addrs[0]);

    TestServer {
        server,
        addr,
        node,
        registry,
    }
}

pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
}

pub fn valid_auth() -> String {
    basic_auth(USER, PASSWORD)
}

/// Raw HTTP/1.1 POST to `/`
pub fn post_request(body: &str, auth: Option<&str>, extra_headers: &[(&str, &str)]) -> String {
    let mut request = String::from("POST / HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Type: application/json\r\n");
    if let Some(auth) = auth {
        request.push_str(&format!("Authorization: {}\r\n", auth));
    }
    for (name, value) in extra_headers {
        request.push_str(&format!("{}: {}\r\n", name, value));
    }
    request.push_str(&format!("Content-Length: {}\r\n\r\n{}", body.len(), body));
    request
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("JSON body")
    }
}

pub struct Client {
    reader: BufReader<TcpStream>,
}

impl Client {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .expect("read timeout");
        Self {
            reader: BufReader::new(stream),
        }
    }

    pub fn send(&mut self, raw: &str) {
        self.reader
            .get_mut()
            .write_all(raw.as_bytes())
            .expect("write request");
    }

    pub fn read_response(&mut self) -> io::Result<HttpResponse> {
        let mut status_line = String::new();
        if self.reader.read_line(&mut status_line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "closed"));
        }
        let status = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, status_line.clone()))?;

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            self.reader.read_line(&mut line)?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        let length: usize = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        self.reader.read_exact(&mut body)?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    pub fn call(&mut self, body: &str) -> HttpResponse {
        self.send(&post_request(body, Some(&valid_auth()), &[]));
        self.read_response().expect("response")
    }

    /// True once the server has closed its end
    pub fn is_closed(&mut self) -> bool {
        let mut buf = [0u8; 1];
        match self.reader.read(&mut buf) {
            Ok(0) => true,
            Err(e) => e.kind() == io::ErrorKind::ConnectionReset,
            Ok(_) => false,
        }
    }
}

/// One request on a fresh connection
pub fn call_once(addr: SocketAddr, body: &str) -> HttpResponse {
    let mut client = Client::connect(addr);
    client.send(&post_request(
        body,
        Some(&valid_auth()),
        &[("Connection", "close")],
    ));
    client.read_response().expect("response")
}
