// Server module entry point
// Accept loop, per-connection tasks and graceful stop on SIGINT/SIGTERM

pub mod connection;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::handler::ServerConfiguration;
use crate::logger;

pub use listener::create_reusable_listener;

/// Everything a connection task needs, shared read-only across tasks
pub struct ServerState {
    pub app: ServerConfiguration,
    pub config: Config,
}

impl ServerState {
    pub const fn new(app: ServerConfiguration, config: Config) -> Self {
        Self { app, config }
    }
}

/// Accept connections until SIGINT or SIGTERM arrives.
pub async fn run(listener: TcpListener, state: Arc<ServerState>) {
    serve(listener, state, signal::shutdown_requested()).await;
}

/// Accept connections until `shutdown` resolves.
///
/// In-flight connections keep running on their own tasks after the loop ends.
pub async fn serve<F>(listener: TcpListener, state: Arc<ServerState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::handle_connection(stream, peer_addr, Arc::clone(&state));
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = &mut shutdown => {
                logger::log_server_stop();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerComposer;
    use crate::http::Reply;
    use crate::routing::{ParamDescriptor, RouteTable};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    fn test_state(max_body_size: u64) -> Arc<ServerState> {
        let mut table = RouteTable::new();
        table
            .get("/ping", vec![], |_, _, _| Reply::text(200, "pong"))
            .unwrap();
        table
            .get("/square", vec![ParamDescriptor::int("n")], |params, _, _| {
                let n = params.get_int("n").unwrap_or(0);
                Reply::text(200, (n * n).to_string())
            })
            .unwrap();
        table
            .post("/echo", vec![], |_, _, body| Reply::new(200).body(body))
            .unwrap();

        let app = HandlerComposer::new(table).build().unwrap();
        let mut config = Config::load_from("/nonexistent/http_packet_config").unwrap();
        config.logging.access_log = false;
        config.http.max_body_size = max_body_size;
        Arc::new(ServerState::new(app, config))
    }

    async fn roundtrip(state: Arc<ServerState>, request: &str) -> String {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state, async move {
            let _ = stop_rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();

        let _ = stop_tx.send(());
        server.await.unwrap();
        String::from_utf8(raw).unwrap()
    }

    #[tokio::test]
    async fn test_serves_registered_route() {
        let out = roundtrip(
            test_state(1024),
            "GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(out.starts_with("HTTP/1.1 200 OK"));
        assert!(out.ends_with("pong"));
    }

    #[tokio::test]
    async fn test_bad_cast_is_400_over_the_wire() {
        let out = roundtrip(
            test_state(1024),
            "GET /square?n=abc HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(out.starts_with("HTTP/1.1 400 Bad Request"));
    }

    #[tokio::test]
    async fn test_post_body_reaches_handler() {
        let out = roundtrip(
            test_state(1024),
            "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;
        assert!(out.starts_with("HTTP/1.1 200 OK"));
        assert!(out.ends_with("hello"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let out = roundtrip(
            test_state(4),
            "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;
        assert!(out.starts_with("HTTP/1.1 413 Payload Too Large"));
    }
}
