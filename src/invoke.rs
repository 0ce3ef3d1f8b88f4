use crate::{
	error::BindingError,
	handler::{Arg, Args, ParamKind, Reply},
	tree::Endpoint,
};
use anyhow::{Error, Result};
use futures_util::StreamExt;
use hyper::{
	body::{Body, Bytes, HttpBody},
	header::{HeaderValue, CONTENT_TYPE},
	Response,
};
use serde_json::{Deserializer, Value};
use std::convert::Infallible;

/// How the invoker treats request values that fail to bind.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BindingPolicy {
	/// Leave the argument at its zero value and carry on.
	Lenient,
	/// Reject the request with a `BindingError`.
	Strict,
}

impl Default for BindingPolicy {
	fn default() -> Self {
		BindingPolicy::Lenient
	}
}

/// Largest request body read for a body argument unless the router is configured otherwise.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Why an invocation did not produce a reply.
#[derive(Debug)]
pub enum Failure {
	Binding(BindingError),
	Handler(Error),
}

/// Builds the argument list for `endpoint` from the captured path segments and the request body.
pub async fn bind(
	endpoint: &Endpoint,
	params: &[String],
	body: Body,
	policy: BindingPolicy,
	body_limit: usize,
) -> Result<Args, BindingError> {
	let kinds = endpoint.handler.kinds();
	let mut args = Args::zeroed(kinds);

	if let Some(position) = endpoint.body {
		match read_json(body, body_limit).await {
			Ok(value) => {
				if let Some(slot) = args.0.get_mut(position) {
					*slot = Arg::Json(value);
				}
			}
			Err(e) if policy == BindingPolicy::Strict => return Err(e),
			Err(e) => tracing::debug!(position, error = %e, "ignoring unreadable request body"),
		}
	}

	for binding in &endpoint.params {
		let raw = match params.get(binding.placeholder) {
			Some(raw) => raw,
			None => continue,
		};

		let kind = match kinds.get(binding.argument) {
			Some(kind) => *kind,
			None => continue,
		};

		match coerce(kind, binding.argument, raw) {
			Ok(Some(arg)) => args.0[binding.argument] = arg,
			Ok(None) => {}
			Err(e) if policy == BindingPolicy::Strict => return Err(e),
			Err(e) => tracing::debug!(error = %e, "path parameter left at zero value"),
		}
	}

	Ok(args)
}

/// Decodes the first JSON value in `body`; an empty body decodes as `null`.
///
/// Reading stops with `BodyTooLarge` once more than `limit` bytes have arrived.
async fn read_json(mut body: Body, limit: usize) -> Result<Value, BindingError> {
	let mut bytes = Vec::new();
	while let Some(chunk) = body.data().await {
		let chunk = chunk.map_err(BindingError::BodyRead)?;
		if bytes.len() + chunk.len() > limit {
			return Err(BindingError::BodyTooLarge { limit });
		}
		bytes.extend_from_slice(&chunk);
	}

	Deserializer::from_slice(&bytes)
		.into_iter::<Value>()
		.next()
		.unwrap_or(Ok(Value::Null))
		.map_err(BindingError::BodyDecode)
}

/// Converts one captured segment into the kind declared at `position`.
///
/// `Ok(None)` means the declared kind takes no path value and is left alone.
fn coerce(kind: ParamKind, position: usize, raw: &str) -> Result<Option<Arg>, BindingError> {
	let arg = match kind {
		ParamKind::Str => Arg::Str(raw.to_owned()),
		ParamKind::Int => raw.parse().map(Arg::Int).map_err(|source| BindingError::Integer {
			position,
			value: raw.to_owned(),
			source,
		})?,
		ParamKind::Float => raw.parse().map(Arg::Float).map_err(|source| BindingError::Float {
			position,
			value: raw.to_owned(),
			source,
		})?,
		ParamKind::Body | ParamKind::Unbound => return Ok(None),
	};
	Ok(Some(arg))
}

/// Binds arguments, calls the handler, and renders what it returns.
pub async fn invoke(
	endpoint: &Endpoint,
	params: &[String],
	body: Body,
	policy: BindingPolicy,
	body_limit: usize,
) -> Result<Response<Body>, Failure> {
	let args = bind(endpoint, params, body, policy, body_limit)
		.await
		.map_err(Failure::Binding)?;
	let reply = endpoint.handler.call(args).await.map_err(Failure::Handler)?;
	Ok(render(reply))
}

/// Turns a reply into a response: one JSON body, or an event stream that ends with the producer.
pub fn render(reply: Reply) -> Response<Body> {
	let (content_type, body) = match reply {
		Reply::Json(bytes) => ("application/json", Body::from(bytes)),
		Reply::Stream(frames) => (
			"text/event-stream",
			Body::wrap_stream(frames.map(Ok::<Bytes, Infallible>)),
		),
	};

	let mut response = Response::new(body);
	response
		.headers_mut()
		.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
	response
}

#[cfg(test)]
mod test {
	use super::{bind, invoke, render, BindingPolicy, Failure, DEFAULT_BODY_LIMIT};
	use crate::{
		error::BindingError,
		handler::{Arg, Handler, ParamKind, Reply},
		route::{bindings, parse_pattern},
		tree::Endpoint,
	};
	use anyhow::anyhow;
	use futures_util::stream;
	use hyper::{body::to_bytes, header::CONTENT_TYPE, Body};
	use serde_json::json;

	fn endpoint(pattern: &str, kinds: Vec<ParamKind>, body: Option<usize>) -> Endpoint {
		Endpoint {
			handler: Handler::new(kinds, |args| async move { Reply::json(&args.len()) }),
			params: bindings(&parse_pattern(pattern)),
			body,
		}
	}

	fn params(values: &[&str]) -> Vec<String> {
		values.iter().map(|v| v.to_string()).collect()
	}

	#[tokio::test]
	async fn coerces_path_values() {
		use ParamKind::{Float, Int, Str, Unbound};
		let ep = endpoint("/{1}/{2}/{3}/{4}", vec![Unbound, Str, Int, Float, Unbound], None);

		let args = bind(&ep, &params(&["a", "-12", "2.5", "x"]), Body::empty(), BindingPolicy::Lenient, DEFAULT_BODY_LIMIT)
			.await
			.unwrap();
		assert_eq!(args.str(1), "a");
		assert_eq!(args.int(2), -12);
		assert_eq!(args.float(3), 2.5);
		assert_eq!(args.get(4), Some(&Arg::Unbound));
	}

	#[tokio::test]
	async fn bad_numbers_become_zero() {
		use ParamKind::{Float, Int, Unbound};
		let ep = endpoint("/{1}/{2}", vec![Unbound, Int, Float], None);

		let args = bind(&ep, &params(&["abc", "x1"]), Body::empty(), BindingPolicy::Lenient, DEFAULT_BODY_LIMIT)
			.await
			.unwrap();
		assert_eq!(args.int(1), 0);
		assert_eq!(args.float(2), 0.0);
	}

	#[tokio::test]
	async fn strict_policy_rejects_bad_numbers() {
		use ParamKind::{Int, Unbound};
		let ep = endpoint("/{1}", vec![Unbound, Int], None);

		let err = bind(&ep, &params(&["abc"]), Body::empty(), BindingPolicy::Strict, DEFAULT_BODY_LIMIT)
			.await
			.unwrap_err();
		assert!(matches!(err, BindingError::Integer { position: 1, .. }));
	}

	#[tokio::test]
	async fn decodes_first_json_value_of_body() {
		let ep = endpoint("/", vec![ParamKind::Unbound, ParamKind::Body], Some(1));

		let args = bind(&ep, &[], Body::from(r#"{"n": 1} trailing"#), BindingPolicy::Lenient, DEFAULT_BODY_LIMIT)
			.await
			.unwrap();
		assert_eq!(args.json(1), &json!({ "n": 1 }));
	}

	#[tokio::test]
	async fn bad_body_leaves_null() {
		let ep = endpoint("/", vec![ParamKind::Unbound, ParamKind::Body], Some(1));

		let args = bind(&ep, &[], Body::from("{nope"), BindingPolicy::Lenient, DEFAULT_BODY_LIMIT)
			.await
			.unwrap();
		assert_eq!(args.json(1), &serde_json::Value::Null);

		let err = bind(&ep, &[], Body::from("{nope"), BindingPolicy::Strict, DEFAULT_BODY_LIMIT)
			.await
			.unwrap_err();
		assert!(matches!(err, BindingError::BodyDecode(_)));
	}

	#[tokio::test]
	async fn oversized_body_is_not_decoded() {
		let ep = endpoint("/", vec![ParamKind::Unbound, ParamKind::Body], Some(1));
		let big = format!("[{}]", vec!["1"; 64].join(","));

		let args = bind(&ep, &[], Body::from(big.clone()), BindingPolicy::Lenient, 16)
			.await
			.unwrap();
		assert_eq!(args.json(1), &serde_json::Value::Null);

		let err = bind(&ep, &[], Body::from(big), BindingPolicy::Strict, 16)
			.await
			.unwrap_err();
		assert!(matches!(err, BindingError::BodyTooLarge { limit: 16 }));
	}

	#[tokio::test]
	async fn handler_error_is_a_failure() {
		let ep = Endpoint {
			handler: Handler::new(Vec::<ParamKind>::new(), |_| async { Err::<Reply, _>(anyhow!("boom")) }),
			params: vec![],
			body: None,
		};

		let result = invoke(&ep, &[], Body::empty(), BindingPolicy::Lenient, DEFAULT_BODY_LIMIT).await;
		assert!(matches!(result, Err(Failure::Handler(_))));
	}

	#[tokio::test]
	async fn renders_single_value() {
		let response = render(Reply::json(&json!({ "ok": true })).unwrap());

		assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
		let body = to_bytes(response.into_body()).await.unwrap();
		assert_eq!(&body[..], br#"{"ok":true}"#);
	}

	#[tokio::test]
	async fn renders_stream_as_events() {
		let response = render(Reply::stream(stream::iter(vec![1, 2, 3])));

		assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");
		let body = to_bytes(response.into_body()).await.unwrap();
		assert_eq!(&body[..], b"data: 1\n\ndata: 2\n\ndata: 3\n\n");
	}

	#[tokio::test]
	async fn empty_stream_has_empty_body() {
		let response = render(Reply::stream(stream::iter(Vec::<u8>::new())));

		let body = to_bytes(response.into_body()).await.unwrap();
		assert!(body.is_empty());
	}
}
