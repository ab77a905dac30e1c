//! Stand-in layout worker speaking the LGL worker protocol.
//!
//! Usage: `lgl-stub-worker <port>`. Binds `127.0.0.1:<port>`, announces
//! `Layout server listening on port <port>` on stdout, and serves
//! `POST /calculate` by placing every vertex of the Pajek input on a circle
//! of radius `optimalDistance`.
//!
//! Behaviour hooks, read from the environment:
//!
//! | Env Var                      | Effect                                          |
//! |------------------------------|-------------------------------------------------|
//! | `LGL_STUB_FAIL_STATUS`       | answer every request with this status           |
//! | `LGL_STUB_FAIL_BODY`         | body for the forced error response              |
//! | `LGL_STUB_STARTUP_STDERR`    | write this line to stderr before announcing     |
//! | `LGL_STUB_EXIT_BEFORE_READY` | exit with status 3 without announcing           |
//! | `LGL_STUB_EXIT_AFTER_MS`     | exit with status 0 this long after announcing   |
//! | `LGL_STUB_DELAY_MS`          | sleep this long before answering each request   |

use std::time::Duration;

use lgl_pool::stub::{self, StubBehaviour};

/// Pause after a stderr line so the supervisor sees it before readiness.
const STDERR_GRACE: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lgl_stub_worker=info,lgl_pool=info".into()),
        )
        .with_writer(std::io::stdout)
        .init();

    let port = match std::env::args().last().map(|raw| raw.parse::<u16>()) {
        Some(Ok(port)) => port,
        _ => {
            eprintln!("usage: lgl-stub-worker <port>");
            std::process::exit(2);
        }
    };

    if std::env::var_os("LGL_STUB_EXIT_BEFORE_READY").is_some() {
        std::process::exit(3);
    }
    if let Ok(line) = std::env::var("LGL_STUB_STARTUP_STDERR") {
        eprintln!("{line}");
        tokio::time::sleep(STDERR_GRACE).await;
    }

    let behaviour = StubBehaviour::from_env();
    let exit_after = behaviour.exit_after;
    let app = stub::router(behaviour);

    let listener = match tokio::net::TcpListener::bind(("127.0.0.1", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind port {port}: {e}");
            std::process::exit(1);
        }
    };
    println!("Layout server listening on port {port}");

    if let Some(after) = exit_after {
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            std::process::exit(0);
        });
    }

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
