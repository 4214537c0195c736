use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info_span;

use crate::dispatcher::{handler_fn, HandlerResponse};
use crate::middleware::{MetricsMiddleware, MiddlewareRef, TracingMiddleware};
use crate::router::Router;
use crate::runtime_config::{load_route_table, RouteTable};

/// Command-line interface for routetrie
///
/// Loads a TOML route table, builds the routing tree and inspects or
/// exercises it.
#[derive(Parser)]
#[command(name = "routetrie")]
#[command(version, about = "Route table checker and matcher", long_about = None)]
pub struct Cli {
    /// Log level for diagnostics written to stderr
    #[arg(long, global = true, env = "ROUTETRIE_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build the routing tree and print the route table
    Check {
        /// Path to the route table (TOML)
        #[arg(short, long)]
        routes: PathBuf,
    },
    /// Resolve one request and print the match
    Match {
        /// Path to the route table (TOML)
        #[arg(short, long)]
        routes: PathBuf,

        /// HTTP method, case-sensitive
        method: String,

        /// Decoded request path without query string
        path: String,
    },
    /// Repeat one lookup with the cache enabled and report timings
    Bench {
        /// Path to the route table (TOML)
        #[arg(short, long)]
        routes: PathBuf,

        /// HTTP method, case-sensitive
        method: String,

        /// Decoded request path without query string
        path: String,

        /// Number of lookups
        #[arg(short = 'n', long, default_value_t = 10_000)]
        iterations: u64,
    },
}

/// How a successful command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Command completed and found what it looked for
    Success,
    /// The requested route did not match
    NoMatch,
}

/// Run a parsed command, writing results to `out`.
///
/// Registration failures and unreadable route tables are errors; a lookup
/// miss is [`Outcome::NoMatch`].
pub fn run_cli(cli: Cli, out: &mut dyn Write) -> Result<Outcome> {
    match cli.command {
        Commands::Check { routes } => {
            let router = load_router(&routes)?;
            writeln!(out, "ok: {} routes", router.route_count())?;
            for (method, pattern) in router.routes() {
                writeln!(out, "{method} {pattern}")?;
            }
            Ok(Outcome::Success)
        }
        Commands::Match {
            routes,
            method,
            path,
        } => {
            let router = load_router(&routes)?;
            let method = parse_method(&method)?;
            let Some(m) = router.find_route(&method, &path) else {
                writeln!(out, "no match: {method} {path}")?;
                return Ok(Outcome::NoMatch);
            };
            writeln!(out, "handler: {}", m.handler_name())?;
            writeln!(out, "pattern: {}", m.route.path_pattern)?;
            let params: Vec<String> = m
                .path_params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            writeln!(out, "params: {}", params.join(" "))?;
            writeln!(out, "middleware: {}", m.middleware_names().join(" "))?;
            Ok(Outcome::Success)
        }
        Commands::Bench {
            routes,
            method,
            path,
            iterations,
        } => {
            let router = load_router(&routes)?;
            let method = parse_method(&method)?;
            if !router.cache_enabled() {
                router.enable_cache(router.config().cache.max_size);
            }

            let start = Instant::now();
            let mut found = 0_u64;
            for _ in 0..iterations {
                if router.find_route(&method, &path).is_some() {
                    found += 1;
                }
            }
            let elapsed = start.elapsed();
            let per_lookup_ns = elapsed.as_nanos() / u128::from(iterations.max(1));
            let stats = router.cache_stats();

            writeln!(out, "iterations: {iterations}")?;
            writeln!(out, "matched: {found}")?;
            writeln!(out, "total_us: {}", elapsed.as_micros())?;
            writeln!(out, "per_lookup_ns: {per_lookup_ns}")?;
            writeln!(
                out,
                "cache: hits={} misses={} size={} evictions={}",
                stats.hits, stats.misses, stats.size, stats.evictions
            )?;
            if found == 0 && iterations > 0 {
                return Ok(Outcome::NoMatch);
            }
            Ok(Outcome::Success)
        }
    }
}

fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.as_bytes()).with_context(|| format!("invalid HTTP method '{method}'"))
}

fn load_router(path: &Path) -> Result<Router> {
    let table = load_route_table(path)?;
    build_router(&table).with_context(|| format!("failed to build routes from {}", path.display()))
}

/// Build a router from a route table.
///
/// Every handler answers 200 with its name and captured parameters. Middleware
/// names resolve to one shared instance per name (`metrics`, `tracing`).
pub fn build_router(table: &RouteTable) -> Result<Router> {
    let mut router = Router::with_config(table.router_config()).with_span(info_span!("routetrie"));
    let mut builtins: HashMap<&str, MiddlewareRef> = HashMap::new();

    for (index, entry) in table.routes.iter().enumerate() {
        let method = entry.method()?;
        let mut middleware = Vec::with_capacity(entry.middleware.len());
        for name in &entry.middleware {
            let mw = match name.as_str() {
                "metrics" => builtins
                    .entry("metrics")
                    .or_insert_with(|| Arc::new(MetricsMiddleware::new()) as MiddlewareRef),
                "tracing" => builtins
                    .entry("tracing")
                    .or_insert_with(|| Arc::new(TracingMiddleware) as MiddlewareRef),
                other => bail!(
                    "unknown middleware '{other}' on route #{index} ({} {})",
                    entry.method,
                    entry.pattern
                ),
            };
            middleware.push(Arc::clone(mw));
        }

        let handler_name = entry.handler.clone();
        let handler = handler_fn(&entry.handler, move |req| {
            HandlerResponse::json(
                200,
                serde_json::json!({
                    "handler": handler_name,
                    "params": req.path_params_map(),
                }),
            )
        });
        router
            .register_route(method, &entry.pattern, handler, middleware)
            .with_context(|| format!("route #{index} ({} {})", entry.method, entry.pattern))?;
    }
    Ok(router)
}
