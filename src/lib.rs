//! A small trie-based HTTP router built on hyper.
//!
//! ```
//! use simpleroute::{Handler, Method, ParamKind, Reply, Route, RouterBuilder};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let user = Handler::new([ParamKind::Unbound, ParamKind::Str, ParamKind::Int], |args| async move {
//! 	Reply::json(&(args.str(1).to_owned(), args.int(2)))
//! });
//!
//! let router = RouterBuilder::default()
//! 	.register(Route::new("/users/{1}/age/{2}").method(Method::GET), user)
//! 	.build()?;
//!
//! let addr = ([127, 0, 0, 1], 3000).into();
//! hyper::Server::bind(&addr).serve(router).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Path segments written as `{n}` match any single segment and feed handler argument `n`.
//! Literal segments win over placeholders at the same depth. Argument 0 is reserved and is
//! never filled from the path.
//!
//! Handlers declare the kind of each argument ([`ParamKind`]); captured segments are coerced
//! to that kind, and a route may decode the request body as JSON into one argument. Values
//! that fail to coerce are left at zero unless the router is built with
//! [`BindingPolicy::Strict`].
//!
//! A handler replies with a single JSON document or with a stream of values, which is sent as
//! `text/event-stream`, one `data:` frame per value.
//!
//! The router builder exposes `internal_error_handler` and `not_found_handler` which can handle
//! errors returned from handlers and unmatched requests respectively.

pub use hyper;

mod error;
pub use error::*;

/// Argument kinds, argument lists, and handler replies.
pub mod handler;

/// Argument binding and response rendering.
pub mod invoke;

/// Route patterns and registration data.
pub mod route;

/// Contains the core structs of the router.
///
/// Use the RouterBuilder to create a Router: pass the router to hyper as the service.
pub mod router;

mod service;

/// The path trie.
pub mod tree;

pub use handler::*;
pub use invoke::BindingPolicy;
pub use route::*;
pub use router::*;
pub use service::RouteHandler;
pub use tree::{Endpoint, Match};
