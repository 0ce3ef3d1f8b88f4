use crate::{
	handler::Handler,
	route::{segments, ParamBinding, PathSegment},
};
use hyper::Method;
use percent_encoding::percent_decode_str;
use std::{collections::HashMap, sync::Arc};

/// A handler plus the metadata describing how to build its argument list.
#[derive(Debug)]
pub struct Endpoint {
	pub handler: Handler,
	pub params: Vec<ParamBinding>,
	pub body: Option<usize>,
}

/// One node of the path trie.
///
/// Literal children are keyed by their text; every placeholder at this depth
/// shares the single `placeholder` child.
#[derive(Debug, Default)]
pub struct PathNode {
	children: HashMap<String, PathNode>,
	placeholder: Option<Box<PathNode>>,
	methods: HashMap<Method, Arc<Endpoint>>,
}

/// A successful lookup: the endpoint and the captured segments, left to right.
#[derive(Debug, Clone)]
pub struct Match<'a> {
	pub endpoint: &'a Arc<Endpoint>,
	pub params: Vec<String>,
}

impl PathNode {
	/// Walks the tree along `path`, creating nodes as needed, and returns the terminal node.
	pub(crate) fn descend(&mut self, path: &[PathSegment<'_>]) -> &mut PathNode {
		path.iter().fold(self, |node, segment| match segment {
			PathSegment::Placeholder(_) => &mut **node.placeholder.get_or_insert_with(Default::default),
			PathSegment::Static(literal) => node.children.entry((*literal).to_owned()).or_default(),
		})
	}

	/// Stores `endpoint` under `method`, returning whatever was registered there before.
	pub(crate) fn insert(&mut self, method: Method, endpoint: Arc<Endpoint>) -> Option<Arc<Endpoint>> {
		self.methods.insert(method, endpoint)
	}

	/// Finds the endpoint for `method` at `path`.
	///
	/// Each segment of the still-encoded request path is percent-decoded before
	/// it is compared or captured. A literal child always wins over the
	/// placeholder child when its key matches, and a chosen literal is never
	/// revisited.
	pub fn find(&self, method: &Method, path: &str) -> Option<Match<'_>> {
		let mut node = self;
		let mut params = vec![];

		for raw in segments(path) {
			let segment = percent_decode_str(raw).decode_utf8_lossy();
			node = match node.children.get(&*segment) {
				Some(child) => child,
				None => {
					let child = node.placeholder.as_deref()?;
					params.push(segment.into_owned());
					child
				}
			};
		}

		node.methods.get(method).map(|endpoint| Match { endpoint, params })
	}
}

#[cfg(test)]
mod test {
	use super::{Endpoint, PathNode};
	use crate::{
		handler::{Handler, ParamKind, Reply},
		route::{bindings, parse_pattern},
	};
	use hyper::Method;
	use std::sync::Arc;

	fn endpoint(pattern: &str) -> Arc<Endpoint> {
		let handler = Handler::new([ParamKind::Unbound], |_| async { Reply::json(&()) });
		Arc::new(Endpoint {
			handler,
			params: bindings(&parse_pattern(pattern)),
			body: None,
		})
	}

	fn tree(routes: &[(&str, Method)]) -> PathNode {
		let mut root = PathNode::default();
		for (pattern, method) in routes {
			root.descend(&parse_pattern(pattern))
				.insert(method.clone(), endpoint(pattern));
		}
		root
	}

	#[test]
	fn matches_literal_routes() {
		let root = tree(&[("/", Method::GET), ("/a/b", Method::GET), ("/a", Method::POST)]);

		let found = root.find(&Method::GET, "/a/b").unwrap();
		assert!(found.params.is_empty());
		assert!(root.find(&Method::GET, "").is_some());
		assert!(root.find(&Method::POST, "//a/").is_some());
	}

	#[test]
	fn captures_placeholders_in_order() {
		let root = tree(&[("/u/{1}/p/{2}", Method::GET)]);

		let found = root.find(&Method::GET, "/u/alice/p/42").unwrap();
		assert_eq!(found.params, vec!["alice", "42"]);
	}

	#[test]
	fn literal_beats_placeholder() {
		let root = tree(&[("/a/b", Method::GET), ("/a/{1}", Method::GET)]);

		let literal = root.find(&Method::GET, "/a/b").unwrap();
		assert!(literal.params.is_empty());
		assert_eq!(root.find(&Method::GET, "/a/c").unwrap().params, vec!["c"]);
	}

	#[test]
	fn literal_choice_is_not_revisited() {
		let root = tree(&[("/a/b/c", Method::GET), ("/a/{1}/d", Method::GET)]);

		assert!(root.find(&Method::GET, "/a/b/d").is_none());
		assert!(root.find(&Method::GET, "/a/x/d").is_some());
	}

	#[test]
	fn placeholders_share_a_child() {
		let root = tree(&[("/x/{1}", Method::GET), ("/x/{2}", Method::POST)]);

		assert!(root.find(&Method::GET, "/x/1").is_some());
		assert!(root.find(&Method::POST, "/x/1").is_some());
	}

	#[test]
	fn decodes_segments_before_matching() {
		let root = tree(&[("/café", Method::GET), ("/hello/{1}", Method::GET)]);

		assert!(root.find(&Method::GET, "/caf%C3%A9").is_some());
		assert_eq!(
			root.find(&Method::GET, "/hello/john%20doe").unwrap().params,
			vec!["john doe"]
		);
		assert_eq!(
			root.find(&Method::GET, "/hello/a%2Fb").unwrap().params,
			vec!["a/b"]
		);
	}

	#[test]
	fn negative_placeholder_still_captures() {
		let root = tree(&[("/x/{-1}", Method::GET)]);

		let found = root.find(&Method::GET, "/x/anything").unwrap();
		assert_eq!(found.params, vec!["anything"]);
		assert!(found.endpoint.params.is_empty());
	}

	#[test]
	fn misses_are_none() {
		let root = tree(&[("/a", Method::GET)]);

		assert!(root.find(&Method::GET, "/b").is_none());
		assert!(root.find(&Method::GET, "/a/b").is_none());
		assert!(root.find(&Method::DELETE, "/a").is_none());
	}

	#[test]
	fn later_insert_overwrites() {
		let mut root = PathNode::default();
		let first = endpoint("/a");
		let second = endpoint("/a");

		assert!(root.descend(&parse_pattern("/a")).insert(Method::GET, first).is_none());
		assert!(root.descend(&parse_pattern("/a")).insert(Method::GET, second.clone()).is_some());
		assert!(Arc::ptr_eq(root.find(&Method::GET, "/a").unwrap().endpoint, &second));
	}
}
