use crate::{
	error::{BindingError, RouteError},
	handler::{Handler, ParamKind},
	invoke::{invoke, BindingPolicy, Failure, DEFAULT_BODY_LIMIT},
	route::{bindings, parse_pattern, ParamBinding, Request, Route},
	tree::{Endpoint, Match, PathNode},
};
use anyhow::Error;
use hyper::{Body, Method, Response, StatusCode};
use std::{future::Future, sync::Arc};

fn empty(status: StatusCode) -> Response<Body> {
	let mut response = Response::new(Body::empty());
	*response.status_mut() = status;
	response
}

pub type InternalErrorHandler = fn(e: Error) -> Response<Body>;
fn default_error_handler(_e: Error) -> Response<Body> {
	empty(StatusCode::INTERNAL_SERVER_ERROR)
}

pub type NotFoundHandler = fn(req: Request) -> Response<Body>;
fn default_not_found_handler(_req: Request) -> Response<Body> {
	empty(StatusCode::NOT_FOUND)
}

/// Answers requests rejected under `BindingPolicy::Strict`.
pub type BindingErrorHandler = fn(e: BindingError) -> Response<Body>;
fn default_binding_error_handler(e: BindingError) -> Response<Body> {
	let mut response = Response::new(Body::from(e.to_string()));
	*response.status_mut() = StatusCode::BAD_REQUEST;
	response
}

#[derive(Debug, Default)]
pub struct RouterBuilder {
	root: PathNode,
	errors: Vec<RouteError>,
	pub internal_error_handler: Option<InternalErrorHandler>,
	pub not_found_handler: Option<NotFoundHandler>,
	pub binding_error_handler: Option<BindingErrorHandler>,
	pub binding: BindingPolicy,
	/// Largest request body decoded into a body argument. Defaults to [`DEFAULT_BODY_LIMIT`].
	pub body_limit: Option<usize>,
}

impl RouterBuilder {
	/// Registers `handler` under every method of `route`.
	///
	/// Registering the same pattern and method again replaces the earlier
	/// handler. Invalid routes are skipped and reported by [`build`](Self::build).
	pub fn register(mut self, route: Route, handler: Handler) -> Self {
		let segments = parse_pattern(&route.pattern);
		let params = bindings(&segments);

		let body = match route.body {
			Some(0) => {
				tracing::warn!(pattern = %route.pattern, "argument 0 is reserved; not binding the body");
				None
			}
			body => body,
		};

		if let Err(e) = validate(&route.pattern, &handler, &params, body) {
			tracing::debug!(error = %e, "rejected route");
			self.errors.push(e);
			return self;
		}

		let endpoint = Arc::new(Endpoint {
			handler,
			params,
			body,
		});

		let node = self.root.descend(&segments);
		for method in route.resolved_methods() {
			if node.insert(method.clone(), Arc::clone(&endpoint)).is_some() {
				tracing::debug!(pattern = %route.pattern, %method, "replaced existing handler");
			}
		}

		tracing::debug!(pattern = %route.pattern, methods = ?route.methods, "registered route");
		self
	}

	pub fn binding(mut self, policy: BindingPolicy) -> Self {
		self.binding = policy;
		self
	}

	pub fn build(self) -> Result<Router, RouteError> {
		if let Some(e) = self.errors.into_iter().next() {
			return Err(e);
		}

		Ok(Router {
			root: Arc::new(self.root),
			internal_error: self.internal_error_handler.unwrap_or(default_error_handler),
			not_found: self.not_found_handler.unwrap_or(default_not_found_handler),
			binding_error: self
				.binding_error_handler
				.unwrap_or(default_binding_error_handler),
			binding: self.binding,
			body_limit: self.body_limit.unwrap_or(DEFAULT_BODY_LIMIT),
		})
	}
}

fn validate(
	pattern: &str,
	handler: &Handler,
	params: &[ParamBinding],
	body: Option<usize>,
) -> Result<(), RouteError> {
	let arity = handler.arity();
	let out_of_range = |position| RouteError::ArgumentOutOfRange {
		pattern: pattern.to_owned(),
		position,
		arity,
	};

	if let Some(param) = params.iter().find(|param| param.argument >= arity) {
		return Err(out_of_range(param.argument));
	}

	if let Some(position) = body {
		if position >= arity {
			return Err(out_of_range(position));
		}
		if params.iter().any(|param| param.argument == position) {
			return Err(RouteError::BodyConflict {
				pattern: pattern.to_owned(),
				position,
			});
		}
		if handler.kinds()[position] != ParamKind::Body {
			return Err(RouteError::BodyKind {
				pattern: pattern.to_owned(),
				position,
			});
		}
	}

	Ok(())
}

/// An immutable routing table. Cheap to clone; clones share the same tree.
#[derive(Debug, Clone)]
pub struct Router {
	root: Arc<PathNode>,
	internal_error: InternalErrorHandler,
	not_found: NotFoundHandler,
	binding_error: BindingErrorHandler,
	binding: BindingPolicy,
	body_limit: usize,
}

impl Router {
	pub fn builder() -> RouterBuilder {
		RouterBuilder::default()
	}

	pub fn find(&self, method: &Method, path: &str) -> Option<Match<'_>> {
		self.root.find(method, path)
	}

	/// Routes `req` to its handler and produces the response.
	pub fn dispatch(&self, req: Request) -> impl Future<Output = Response<Body>> + Send + 'static {
		let found = self
			.find(req.method(), req.uri().path())
			.map(|found| (Arc::clone(found.endpoint), found.params));
		let internal_error = self.internal_error;
		let not_found = self.not_found;
		let binding_error = self.binding_error;
		let policy = self.binding;
		let body_limit = self.body_limit;

		async move {
			let (endpoint, params) = match found {
				Some(found) => found,
				None => {
					tracing::debug!(method = %req.method(), path = req.uri().path(), "no route matched");
					return not_found(req);
				}
			};

			tracing::debug!(method = %req.method(), path = req.uri().path(), ?params, "dispatching");
			match invoke(&endpoint, &params, req.into_body(), policy, body_limit).await {
				Ok(response) => response,
				Err(Failure::Binding(e)) => {
					tracing::debug!(error = %e, "rejected request arguments");
					binding_error(e)
				}
				Err(Failure::Handler(e)) => {
					tracing::error!(error = ?e, "handler failed");
					internal_error(e)
				}
			}
		}
	}
}
