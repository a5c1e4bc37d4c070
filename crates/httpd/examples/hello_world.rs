use std::convert::Infallible;
use std::io;

use http::StatusCode;
use micro_httpd::handler::{get, make_handler, post};
use micro_httpd::io::Output;
use micro_httpd::protocol::{Request, Response};
use micro_httpd::server::Server;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let server = Server::builder()
        .address("127.0.0.1")
        .port(8080)
        .request_callback(|request: &Request| {
            info!(method = %request.method(), path = request.path(), "receive request");
            None
        })
        .route(get("/", make_handler(hello_world)))
        .route(post("/echo", make_handler(echo)))
        .route(get("/count", make_handler(count)))
        .response_callback(|_: &Request, response: Response| response.with_header("Server", "micro-httpd"))
        .build();

    let server = match server {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "invalid server configuration");
            return;
        }
    };

    if let Err(e) = server.run() {
        error!(cause = %e, "server error");
    }
}

fn hello_world(_request: &Request) -> Result<Response, Infallible> {
    Ok(Response::make_raw(StatusCode::OK, "Hello World!\r\n"))
}

fn echo(request: &Request) -> Result<Response, Box<dyn std::error::Error + Send + Sync>> {
    let body = request.body_str()?;
    info!(body, "receiving request body");
    Ok(Response::make_raw(StatusCode::OK, body.to_owned()))
}

/// Streams the numbers 1 to 1000, one per line, as a chunked body.
fn count(_request: &Request) -> Result<Response, Infallible> {
    Ok(Response::make_writer(StatusCode::OK, |out: &mut dyn Output| -> io::Result<()> {
        for i in 1..=1000 {
            out.output(format!("{i}\n").as_bytes())?;
        }
        Ok(())
    }))
}
