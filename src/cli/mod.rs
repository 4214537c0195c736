//! # CLI Module
//!
//! Command-line access to the router for checking route tables and trying
//! lookups without writing a server.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Build the routing tree from a route table and print it. The first
//! registration error (conflict, malformed pattern, invalid path) is reported
//! and the process exits non-zero:
//!
//! ```bash
//! routetrie check --routes routes.toml
//! ```
//!
//! ### `match`
//!
//! Resolve one request and print handler, pattern, parameters and middleware.
//! Exits with status 1 when nothing matches:
//!
//! ```bash
//! routetrie match --routes routes.toml GET /user/42/profile
//! ```
//!
//! ### `bench`
//!
//! Repeat one lookup with the adaptive cache enabled and print timing and
//! cache counters:
//!
//! ```bash
//! routetrie bench --routes routes.toml GET /user/42 --iterations 100000
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,no_run
//! use clap::Parser;
//! use routetrie::cli::{run_cli, Cli};
//!
//! let cli = Cli::parse();
//! let outcome = run_cli(cli, &mut std::io::stdout())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod commands;


pub use commands::{build_router, run_cli, Cli, Commands, Outcome};
