use thiserror::Error;

/// Problems detected while registering a route. Reported by `RouterBuilder::build`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
	#[error("route `{pattern}` binds argument {position} but the handler only takes {arity}")]
	ArgumentOutOfRange {
		pattern: String,
		position: usize,
		arity: usize,
	},
	#[error("route `{pattern}` binds argument {position} to both a path parameter and the body")]
	BodyConflict { pattern: String, position: usize },
	#[error("route `{pattern}` reads the body into argument {position}, which is not a body argument")]
	BodyKind { pattern: String, position: usize },
}

/// A request value that could not be coerced into its handler argument.
///
/// Only surfaced under `BindingPolicy::Strict`; the lenient policy leaves the
/// argument at its zero value instead.
#[derive(Debug, Error)]
pub enum BindingError {
	#[error("failed to read request body")]
	BodyRead(#[source] hyper::Error),
	#[error("request body exceeds {limit} bytes")]
	BodyTooLarge { limit: usize },
	#[error("request body is not valid JSON")]
	BodyDecode(#[source] serde_json::Error),
	#[error("argument {position}: `{value}` is not an integer")]
	Integer {
		position: usize,
		value: String,
		#[source]
		source: std::num::ParseIntError,
	},
	#[error("argument {position}: `{value}` is not a number")]
	Float {
		position: usize,
		value: String,
		#[source]
		source: std::num::ParseFloatError,
	},
}
