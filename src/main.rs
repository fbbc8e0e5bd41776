//! Maverick server binary.
//!
//! ```text
//!     Client Request
//!     ───────────────▶ axum (request id, limits, timeout, trace)
//!                          │
//!                          ▼
//!                   spawn_blocking: Application::handle
//!                          │  container → router → resolver → handler
//!                          │  failure funnel → error page
//!                          ▼
//!     ◀─────────────── Response (sent exactly once)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use maverick::app::DebugLevel;
use maverick::config::{load_config, AppConfig};
use maverick::controller::ExceptionController;
use maverick::lifecycle::{signals, Shutdown};
use maverick::observability::{logging, metrics};
use maverick::resolver::Controller;
use maverick::view::DefaultLayout;
use maverick::{ActionTable, AppOptions, Handler, HttpServer, PatternMatcher, RouteCollection};

#[derive(Parser)]
#[command(name = "maverick")]
#[command(about = "Request dispatch server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server (default)
    Serve {
        /// Override the listener bind address
        #[arg(short, long)]
        bind: Option<String>,

        /// Override the debug level (dev, test, beta, prod)
        #[arg(short, long)]
        debug_level: Option<DebugLevel>,
    },
    /// Load and validate the configuration, then exit
    CheckConfig,
    /// Print the route table and exit
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Serve {
        bind: None,
        debug_level: None,
    }) {
        Commands::CheckConfig => {
            println!("Configuration OK");
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Routes => {
            for route in demo_routes().routes() {
                let methods: Vec<&str> = route.methods().iter().map(|m| m.as_str()).collect();
                println!("{:<24} {:<32} {}", methods.join("|"), route.path(), route.handler().identity());
            }
            Ok(())
        }
        Commands::Serve { bind, debug_level } => {
            let mut config = config;
            if let Some(bind) = bind {
                config.listener.bind_address = bind;
            }
            if let Some(level) = debug_level {
                config.debug.level = level;
            }
            serve(config).await
        }
    }
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&config.observability);
    tracing::info!("maverick v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        debug_level = %config.debug.level,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let routes = demo_routes();
    let matcher = PatternMatcher::compile(&routes)?;
    let options = AppOptions::from_config(&config, Arc::new(matcher)).with_services(|services| {
        let users = demo_users_controller();
        services.instance("users", Arc::new(users) as Arc<dyn Controller>)
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server = HttpServer::new(config, options);
    let server_shutdown = shutdown.subscribe();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::forward_to(&signal_shutdown).await;
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo_routes() -> RouteCollection {
    let mut routes = RouteCollection::new();
    routes
        .get(
            "/",
            Handler::new("home::index", |ctx| {
                let page = DefaultLayout::build(
                    ctx.output.page_title(),
                    "<h1>It works</h1><p>Maverick is dispatching requests.</p>",
                );
                ctx.response.set_body(page);
                Ok(())
            }),
        )
        .get("/users/{id:[0-9]+}", "users->show")
        .any(
            "/errors/404",
            Handler::new("errors::not_found", |ctx| {
                let page = ExceptionController::new(false).error404_action("");
                ctx.response
                    .set_status(axum::http::StatusCode::NOT_FOUND)
                    .set_body(page);
                Ok(())
            }),
        );
    routes
}

fn demo_users_controller() -> ActionTable {
    ActionTable::new().action("users", "show", |ctx| {
        let id = ctx.require_param("id")?.to_string();
        let content = format!("<h1>User {}</h1>", html_escape::encode_text(&id));
        ctx.output.set_page_title(format!("User {}", id));
        let page = DefaultLayout::build(ctx.output.page_title(), &content);
        ctx.response.set_body(page);
        Ok(())
    })
}
