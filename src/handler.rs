use crate::error::BindingError;
use anyhow::Result;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use hyper::body::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
	fmt::{self, Debug, Formatter},
	future::Future,
	pin::Pin,
	sync::Arc,
};
use tokio::sync::mpsc;

/// What a handler argument expects to receive.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ParamKind {
	Str,
	Int,
	Float,
	/// The request body, decoded as JSON.
	Body,
	/// Never filled in by the router.
	Unbound,
}

/// One constructed handler argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
	Str(String),
	Int(i64),
	Float(f64),
	Json(Value),
	Unbound,
}

impl Arg {
	/// The zero value for an argument of the given kind.
	pub fn zero(kind: ParamKind) -> Self {
		match kind {
			ParamKind::Str => Arg::Str(String::new()),
			ParamKind::Int => Arg::Int(0),
			ParamKind::Float => Arg::Float(0.0),
			ParamKind::Body => Arg::Json(Value::Null),
			ParamKind::Unbound => Arg::Unbound,
		}
	}
}

/// The positional argument list a handler is invoked with.
///
/// Accessors are forgiving: asking for the wrong kind, or for a position past
/// the end, yields the zero value of the requested kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Args(pub(crate) Vec<Arg>);

impl Args {
	pub(crate) fn zeroed(kinds: &[ParamKind]) -> Self {
		Self(kinds.iter().copied().map(Arg::zero).collect())
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, position: usize) -> Option<&Arg> {
		self.0.get(position)
	}

	pub fn str(&self, position: usize) -> &str {
		match self.get(position) {
			Some(Arg::Str(s)) => s,
			_ => "",
		}
	}

	pub fn int(&self, position: usize) -> i64 {
		match self.get(position) {
			Some(Arg::Int(i)) => *i,
			_ => 0,
		}
	}

	pub fn float(&self, position: usize) -> f64 {
		match self.get(position) {
			Some(Arg::Float(f)) => *f,
			_ => 0.0,
		}
	}

	pub fn json(&self, position: usize) -> &Value {
		match self.get(position) {
			Some(Arg::Json(value)) => value,
			_ => &Value::Null,
		}
	}

	/// Deserializes the body argument into `T`, falling back to `T::default()`.
	pub fn body<T>(&self, position: usize) -> T
	where
		T: DeserializeOwned + Default,
	{
		self.try_body(position).unwrap_or_default()
	}

	pub fn try_body<T>(&self, position: usize) -> Result<T, BindingError>
	where
		T: DeserializeOwned,
	{
		T::deserialize(self.json(position)).map_err(BindingError::BodyDecode)
	}
}

/// A sequence of frames produced lazily by a streaming handler.
pub type Frames = BoxStream<'static, Bytes>;

/// What a handler produced: one JSON document, or a stream of server-sent events.
pub enum Reply {
	Json(Bytes),
	Stream(Frames),
}

impl Reply {
	pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
		Ok(Reply::Json(serde_json::to_vec(value)?.into()))
	}

	/// Streams every item of `items` as one `data:` frame. The response ends when the stream does.
	pub fn stream<S, T>(items: S) -> Self
	where
		S: Stream<Item = T> + Send + 'static,
		T: Serialize + 'static,
	{
		Reply::Stream(items.map(|item| frame(&item)).boxed())
	}

	/// A streaming reply fed through a channel; the stream closes once every sender is dropped.
	pub fn channel<T>(buffer: usize) -> (mpsc::Sender<T>, Self)
	where
		T: Serialize + Send + 'static,
	{
		let (tx, rx) = mpsc::channel(buffer);
		let items = stream::unfold(rx, |mut rx| async move {
			let item = rx.recv().await?;
			Some((item, rx))
		});
		(tx, Reply::stream(items))
	}
}

impl Debug for Reply {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Reply::Json(body) => f.debug_tuple("Json").field(body).finish(),
			Reply::Stream(_) => f.write_str("Stream(..)"),
		}
	}
}

/// Encodes one server-sent event frame. An item that fails to serialize is sent with an empty payload.
pub(crate) fn frame<T: Serialize + ?Sized>(item: &T) -> Bytes {
	let payload = serde_json::to_vec(item).unwrap_or_else(|e| {
		tracing::debug!(error = %e, "stream item failed to serialize");
		Vec::new()
	});

	let mut out = Vec::with_capacity(payload.len() + 8);
	out.extend_from_slice(b"data: ");
	out.extend_from_slice(&payload);
	out.extend_from_slice(b"\n\n");
	out.into()
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Reply>> + Send>>;

/// A callable unit together with the kinds of arguments it declares.
#[derive(Clone)]
pub struct Handler {
	pub(crate) kinds: Vec<ParamKind>,
	call: Arc<dyn Fn(Args) -> HandlerFuture + Send + Sync>,
}

impl Handler {
	/// ```
	/// use simpleroute::{Handler, ParamKind, Reply};
	///
	/// let greet = Handler::new([ParamKind::Unbound, ParamKind::Str], |args| async move {
	/// 	Reply::json(&format!("hello {}", args.str(1)))
	/// });
	/// assert_eq!(greet.arity(), 2);
	/// ```
	pub fn new<K, F, Fut>(kinds: K, f: F) -> Self
	where
		K: IntoIterator<Item = ParamKind>,
		F: Fn(Args) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Reply>> + Send + 'static,
	{
		Self {
			kinds: kinds.into_iter().collect(),
			call: Arc::new(move |args: Args| -> HandlerFuture { Box::pin(f(args)) }),
		}
	}

	pub fn arity(&self) -> usize {
		self.kinds.len()
	}

	pub fn kinds(&self) -> &[ParamKind] {
		&self.kinds
	}

	pub fn call(&self, args: Args) -> HandlerFuture {
		(self.call)(args)
	}
}

impl Debug for Handler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handler").field("kinds", &self.kinds).finish()
	}
}
