//! End-to-end tests over real TCP.
//!
//! Each test binds an ephemeral port, runs the real accept loop, and talks
//! to it with hyper's HTTP/1 client connection.

use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::http::response::Parts;
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Notify;

use helloserv::config::{AppState, Config};
use helloserv::server;

struct TestServer {
    addr: SocketAddr,
    shutdown: Arc<Notify>,
}

async fn spawn_server() -> TestServer {
    spawn_server_with(|_| {}).await
}

async fn spawn_server_with(configure: impl FnOnce(&mut Config)) -> TestServer {
    let mut cfg = Config::load_from("does_not_exist").unwrap();
    // Keep test output quiet
    cfg.logging.access_log = false;
    configure(&mut cfg);

    let state = Arc::new(AppState::new(&cfg));
    let listener = server::create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Notify::new());

    let loop_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        server::start_server_loop(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
            loop_shutdown,
        )
        .await
    });

    TestServer { addr, shutdown }
}

async fn send_request(addr: SocketAddr, method: Method, path: &str) -> (Parts, Bytes) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(conn);

    let req = Request::builder()
        .method(method)
        .uri(path)
        .header("Host", "localhost")
        .body(Empty::<Bytes>::new())
        .unwrap();

    let resp = sender.send_request(req).await.unwrap();
    let (parts, body) = resp.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    (parts, bytes)
}

#[tokio::test]
async fn get_root_returns_fixed_greeting() {
    let srv = spawn_server().await;

    let (parts, body) = send_request(srv.addr, Method::GET, "/").await;
    assert_eq!(parts.status, 200);
    assert_eq!(parts.headers["Content-Type"], "text/html");
    assert_eq!(parts.headers["Content-Length"], "19");
    assert_eq!(parts.headers["Server"], "helloserv/0.1");
    assert_eq!(&body[..], b"<h1>HelloServlet</h1>");

    srv.shutdown.notify_one();
}

#[tokio::test]
async fn any_get_path_reaches_default_handler() {
    let srv = spawn_server().await;

    for path in ["/nonexistent", "/deeply/nested/path", "/?query=1"] {
        let (parts, body) = send_request(srv.addr, Method::GET, path).await;
        assert_eq!(parts.status, 200, "path {path}");
        assert_eq!(&body[..], b"<h1>HelloServlet</h1>", "path {path}");
    }

    srv.shutdown.notify_one();
}

#[tokio::test]
async fn independent_requests_are_byte_identical() {
    let srv = spawn_server().await;

    let (first_parts, first_body) = send_request(srv.addr, Method::GET, "/").await;
    let (second_parts, second_body) = send_request(srv.addr, Method::GET, "/").await;

    assert_eq!(first_parts.status, second_parts.status);
    assert_eq!(
        first_parts.headers.get("Content-Type"),
        second_parts.headers.get("Content-Type")
    );
    assert_eq!(
        first_parts.headers.get("Content-Length"),
        second_parts.headers.get("Content-Length")
    );
    assert_eq!(first_body, second_body);

    srv.shutdown.notify_one();
}

#[tokio::test]
async fn head_gets_same_headers_and_empty_body() {
    let srv = spawn_server().await;

    let (parts, body) = send_request(srv.addr, Method::HEAD, "/").await;
    assert_eq!(parts.status, 200);
    assert_eq!(parts.headers["Content-Type"], "text/html");
    assert_eq!(parts.headers["Content-Length"], "19");
    assert!(body.is_empty());

    srv.shutdown.notify_one();
}

#[tokio::test]
async fn options_answered_with_204_and_allow() {
    let srv = spawn_server().await;

    let (parts, body) = send_request(srv.addr, Method::OPTIONS, "/").await;
    assert_eq!(parts.status, 204);
    assert_eq!(parts.headers["Allow"], "GET, HEAD, OPTIONS");
    assert!(body.is_empty());

    srv.shutdown.notify_one();
}

#[tokio::test]
async fn unsupported_methods_get_405_with_allow() {
    let srv = spawn_server().await;

    for method in [Method::POST, Method::PUT, Method::DELETE] {
        let (parts, _) = send_request(srv.addr, method.clone(), "/").await;
        assert_eq!(parts.status, 405, "method {method}");
        assert_eq!(parts.headers["Allow"], "GET, HEAD, OPTIONS");
    }

    srv.shutdown.notify_one();
}

#[tokio::test]
async fn keep_alive_reuses_connection() {
    let srv = spawn_server().await;

    let stream = TcpStream::connect(srv.addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(conn);

    // Two requests over the same connection
    for _ in 0..2 {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/")
            .header("Host", "localhost")
            .body(Empty::<Bytes>::new())
            .unwrap();
        let resp = sender.send_request(req).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<h1>HelloServlet</h1>");
    }

    srv.shutdown.notify_one();
}

#[tokio::test]
async fn zero_keep_alive_timeout_closes_connection() {
    let srv = spawn_server_with(|cfg| cfg.performance.keep_alive_timeout = 0).await;

    let stream = TcpStream::connect(srv.addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    let conn_handle = tokio::spawn(conn);

    let req = Request::builder()
        .method(Method::GET)
        .uri("/")
        .header("Host", "localhost")
        .body(Empty::<Bytes>::new())
        .unwrap();
    let resp = sender.send_request(req).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["Connection"], "close");
    resp.into_body().collect().await.unwrap();

    // The server hangs up after the response; the client connection
    // future resolves instead of idling
    tokio::time::timeout(Duration::from_secs(2), conn_handle)
        .await
        .expect("connection stayed open with keep-alive disabled")
        .unwrap()
        .unwrap();

    srv.shutdown.notify_one();
}

#[tokio::test]
async fn server_survives_client_abort() {
    let srv = spawn_server().await;

    // Client opens a connection, sends a partial request, and hangs up
    {
        let mut stream = TcpStream::connect(srv.addr).await.unwrap();
        stream.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
    }

    // Give the server a moment to observe the broken connection
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Subsequent requests are unaffected
    let (parts, body) = send_request(srv.addr, Method::GET, "/").await;
    assert_eq!(parts.status, 200);
    assert_eq!(&body[..], b"<h1>HelloServlet</h1>");

    srv.shutdown.notify_one();
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let srv = spawn_server().await;

    // Server is up
    let (parts, _) = send_request(srv.addr, Method::GET, "/").await;
    assert_eq!(parts.status, 200);

    srv.shutdown.notify_one();

    // The listener closes shortly after the signal; new connections are
    // then refused
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if TcpStream::connect(srv.addr).await.is_err() {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "listener still accepting after shutdown"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
