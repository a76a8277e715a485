//! # Frask - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor de ejemplo:
//!
//! - `GET /hello`: página HTML con el User-Agent del cliente
//! - `GET /metrics`: snapshot de métricas en JSON
//! - `POST /echo`: devuelve el body recibido (acepta `text/json`)
//! - cualquier otro path: archivos estáticos y scripts CGI del workdir

use frask::application::Application;
use frask::config::Config;
use frask::http::body::json_decoder;
use frask::http::{Body, Request, Response, StatusCode, SERVER_SOFTWARE};
use frask::logging;
use frask::server::HttpServer;
use tracing::{error, info};

fn main() {
    let config = Config::new();
    logging::init(&config.log_level);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(2);
    }
    config.log_summary();

    if let Err(e) = run(&config) {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> frask::Result<()> {
    let mut server = HttpServer::bind(config)?;
    server.register_body_handler("text/json", json_decoder);

    let mut application = Application::from_config(env!("CARGO_PKG_NAME"), config)?;

    application.route("/hello", ["GET"], |request: &Request| {
        hello_page(request.header("User-Agent").unwrap_or(""))
    })?;

    let metrics = server.metrics();
    application.route("/metrics", ["GET"], move |_request: &Request| {
        metrics.to_json().map(|json| Response::json(&json))
    })?;

    application.route("/echo", ["POST", "PUT"], |request: &Request| match request.body() {
        Body::Json(value) => Response::json(&value.to_string()),
        Body::Form(form) => Response::json(&serde_json::to_string(form).unwrap_or_default()),
        Body::Text(text) => Response::new(StatusCode::OK)
            .with_header("Content-Type", "text/plain")
            .with_body(text),
        Body::Empty => Response::new(StatusCode::NO_CONTENT),
    })?;

    server.serve(application);
    info!("Press Ctrl+C to stop");
    server.start()?;
    Ok(())
}

fn hello_page(user_agent: &str) -> String {
    format!(
        r#"<html>
    <body style="background: #dfe6e9; text-align:center;">
        <h1 style="margin-top:30vh;">Hello World</h1>
        <h3>From: {server}</h3>
        <h4 style="font-style: italic;">Your UA info: {user_agent}</h4>
    </body>
</html>
"#,
        server = SERVER_SOFTWARE,
        user_agent = user_agent
    )
}
