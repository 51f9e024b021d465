use std::sync::Arc;

use http_packet::config::Config;
use http_packet::handler::HandlerComposer;
use http_packet::http::Reply;
use http_packet::routing::{ParamDescriptor, RegistrationError, RouteTable};
use http_packet::server::{self, ServerState};
use http_packet::logger;
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_info(&format!("[CONFIG] Using {workers} worker threads"));
    } else {
        logger::log_info("[CONFIG] Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut composer = HandlerComposer::new(demo_routes()?)
        .index_files(cfg.static_files.index_files.clone());
    if let Some(ref root) = cfg.static_files.root {
        composer = composer.static_root(root.clone());
    }
    if let Some(ref prefix) = cfg.static_files.prefix {
        composer = composer.static_prefix(prefix.clone());
    }
    let app = composer.build()?;

    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr, cfg.server.backlog)?;
    logger::log_server_start(&addr, &cfg);

    server::run(listener, Arc::new(ServerState::new(app, cfg))).await;
    Ok(())
}

fn demo_routes() -> Result<RouteTable, RegistrationError> {
    let mut table = RouteTable::new();

    table.get("/ping", vec![], |_, _, _| Reply::text(200, "pong"))?;

    table.get("/square", vec![ParamDescriptor::int("n")], |params, _, _| {
        match params.get_int("n") {
            Some(n) => match n.checked_mul(n) {
                Some(square) => Reply::json(200, &json!({ "n": n, "square": square })),
                None => Reply::text(400, "n is too large"),
            },
            None => Reply::text(400, "missing parameter n"),
        }
    })?;

    table.post("/echo", vec![], |params, headers, body| {
        let mut reply = Reply::new(200).body(body);
        if let Some(ct) = headers.get("content-type").and_then(|v| v.to_str().ok()) {
            reply = reply.header("Content-Type", ct);
        }
        for (name, value) in params.iter() {
            reply = reply.header(format!("X-Param-{name}"), value.to_string());
        }
        reply
    })?;

    Ok(table)
}
