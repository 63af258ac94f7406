//! Corpus API server binary
//!
//! Serves a demo registry (a `products` piece type plus the page tree)
//! over the in-memory store. Deployments embedding the crate assemble
//! their own registry through `CorpusServerBuilder`.

use clap::Parser;
use corpus_api::{init_logging, ApiConfig, CorpusServerBuilder};
use corpus_core::{ContentRegistry, ContentType, FieldDescriptor, FieldKind, Permission};

/// Corpus - a headless content repository over REST
#[derive(Parser)]
#[command(name = "corpus-api")]
#[command(about = "REST API server for the Corpus content repository")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn demo_registry() -> ContentRegistry {
    ContentRegistry::new()
        .register(
            ContentType::piece("products")
                .with_field(FieldDescriptor::new("title", FieldKind::String))
                .with_field(FieldDescriptor::new("body", FieldKind::Object))
                .with_field(FieldDescriptor::new(
                    "color",
                    FieldKind::Select {
                        choices: vec!["red".to_string(), "blue".to_string()],
                    },
                ))
                .with_field(FieldDescriptor::new("addresses", FieldKind::ObjectArray))
                .with_field(FieldDescriptor::new("photo", FieldKind::Attachment))
                .with_safe_distinct("color"),
        )
        .register(
            ContentType::page("pages")
                .with_field(FieldDescriptor::new("title", FieldKind::String))
                .with_field(FieldDescriptor::new("body", FieldKind::Object)),
        )
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    std::env::set_var(
        "RUST_LOG",
        format!("corpus={},tower_http=debug", args.log_level),
    );
    init_logging();

    dotenvy::dotenv().ok();

    let api = ApiConfig::from_env();
    let server = match CorpusServerBuilder::new()
        .host(args.host)
        .port(args.port)
        .api_config(api)
        .registry(demo_registry())
        .build()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            eprintln!("failed to build server: {e}");
            std::process::exit(1);
        }
    };

    // A first admin account so the demo instance is usable out of the box.
    let admin_password =
        std::env::var("CORPUS_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    if let Err(e) = server
        .state()
        .add_user("admin", &admin_password, vec![Permission::Admin])
        .await
    {
        eprintln!("failed to create admin user: {e}");
        std::process::exit(1);
    }

    if let Err(e) = server.start().await {
        eprintln!("server failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parsing() {
        let args = Args::parse_from(["corpus-api"]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 3000);

        let args = Args::parse_from(["corpus-api", "--host", "0.0.0.0", "--port", "8081"]);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 8081);
    }

    #[test]
    fn demo_registry_has_both_kinds() {
        let registry = demo_registry();
        assert!(registry.get("products").is_some());
        assert!(registry.page_type().is_some());
    }
}
