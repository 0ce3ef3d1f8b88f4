pub use hyper::{Body, Method, StatusCode};

pub type Request = hyper::Request<Body>;

/// Methods a route answers to when none are named explicitly.
pub const STANDARD_METHODS: [Method; 9] = [
	Method::CONNECT,
	Method::DELETE,
	Method::GET,
	Method::HEAD,
	Method::OPTIONS,
	Method::PATCH,
	Method::POST,
	Method::PUT,
	Method::TRACE,
];

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PathSegment<'a> {
	/// `{n}`: matches any single segment, feeding handler argument `n` when `n > 0`.
	Placeholder(isize),
	Static(&'a str),
}

impl<'a> PathSegment<'a> {
	fn parse(segment: &'a str) -> Self {
		segment
			.strip_prefix('{')
			.and_then(|rest| rest.strip_suffix('}'))
			.and_then(|index| index.parse().ok())
			.map_or(PathSegment::Static(segment), PathSegment::Placeholder)
	}
}

/// Splits a path or route pattern on `/`, skipping empty segments.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
	path.split('/').filter(|segment| !segment.is_empty())
}

/// Parses a route pattern into its segments.
///
/// ```
/// use simpleroute::{parse_pattern, PathSegment};
///
/// assert_eq!(
/// 	parse_pattern("/users/{1}//posts/"),
/// 	vec![PathSegment::Static("users"), PathSegment::Placeholder(1), PathSegment::Static("posts")]
/// );
/// ```
pub fn parse_pattern(pattern: &str) -> Vec<PathSegment<'_>> {
	segments(pattern).map(PathSegment::parse).collect()
}

/// The `placeholder`-th captured segment (counting from 0, left to right) feeds `argument`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ParamBinding {
	pub placeholder: usize,
	pub argument: usize,
}

/// Computes the argument bindings of a parsed pattern.
///
/// Placeholders written with an index of 0 or below still match and capture,
/// but are never bound: position 0 is reserved.
pub fn bindings(segments: &[PathSegment<'_>]) -> Vec<ParamBinding> {
	segments
		.iter()
		.filter_map(|segment| match segment {
			PathSegment::Placeholder(argument) => Some(*argument),
			PathSegment::Static(_) => None,
		})
		.enumerate()
		.filter(|(_, argument)| *argument > 0)
		.map(|(placeholder, argument)| ParamBinding {
			placeholder,
			argument: argument as usize,
		})
		.collect()
}

/// Registration data for one route: a pattern, the methods it answers to, and
/// where the request body goes.
#[derive(Debug, Clone)]
pub struct Route {
	pub(crate) pattern: String,
	pub(crate) methods: Vec<Method>,
	pub(crate) body: Option<usize>,
}

impl Route {
	pub fn new(pattern: impl Into<String>) -> Self {
		Self {
			pattern: pattern.into(),
			methods: Vec::new(),
			body: None,
		}
	}

	pub fn method(mut self, method: Method) -> Self {
		self.methods.push(method);
		self
	}

	pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
		self.methods.extend(methods);
		self
	}

	/// Decode the request body as JSON into argument `position`.
	pub fn body(mut self, position: usize) -> Self {
		self.body = Some(position);
		self
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// The methods this route registers under; every standard method if none were named.
	pub fn resolved_methods(&self) -> Vec<Method> {
		if self.methods.is_empty() {
			STANDARD_METHODS.to_vec()
		} else {
			self.methods.clone()
		}
	}
}

#[cfg(test)]
mod test {
	use super::{bindings, parse_pattern, ParamBinding, PathSegment, Route, STANDARD_METHODS};
	use hyper::Method;

	#[test]
	fn parses_placeholders_and_literals() {
		assert_eq!(
			parse_pattern("a/{2}/{x}/{}/{-1}"),
			vec![
				PathSegment::Static("a"),
				PathSegment::Placeholder(2),
				PathSegment::Static("{x}"),
				PathSegment::Static("{}"),
				PathSegment::Placeholder(-1),
			]
		);
	}

	#[test]
	fn ignores_redundant_slashes() {
		assert_eq!(parse_pattern("//a///b/"), parse_pattern("a/b"));
		assert!(parse_pattern("/").is_empty());
	}

	#[test]
	fn position_zero_is_never_bound() {
		let segments = parse_pattern("/{0}/x/{2}/{-3}/{1}");
		assert_eq!(
			bindings(&segments),
			vec![
				ParamBinding {
					placeholder: 1,
					argument: 2,
				},
				ParamBinding {
					placeholder: 3,
					argument: 1,
				},
			]
		);
	}

	#[test]
	fn empty_method_set_means_all() {
		assert_eq!(Route::new("/").resolved_methods(), STANDARD_METHODS.to_vec());
		assert_eq!(
			Route::new("/").method(Method::GET).resolved_methods(),
			vec![Method::GET]
		);
	}
}
