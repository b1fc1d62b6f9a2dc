//! Declarative route table mapping URL paths to views, with protected-route gating.
//!
//! A [`RouteTable`] is an ordered list of [`Route`]s. Patterns are made of `/`-separated
//! segments: literals match ASCII-case-insensitively, `:name` captures one segment, and `*`
//! matches whatever remains (including nothing). Within a route, children without `*` are
//! tried first, then the route itself, then children with `*`; the first match in declaration
//! order wins.

pub mod app;
pub mod guard;

pub use app::*;
pub use guard::*;

// self
use crate::_prelude::*;

/// One entry of a [`RouteTable`].
#[derive(Clone, Debug)]
pub struct Route<V> {
	/// Full path pattern (children spell out their complete path).
	pub path: String,
	/// View rendered for this route.
	pub view: V,
	/// Requires credentials; inherited by every child.
	pub protected: bool,
	/// Nested routes rendered inside this route's view.
	pub children: Vec<Route<V>>,
}
impl<V> Route<V> {
	/// Creates an unprotected leaf route.
	pub fn new(path: impl Into<String>, view: V) -> Self {
		Self { path: path.into(), view, protected: false, children: Vec::new() }
	}

	/// Marks the route (and its children) as protected.
	pub fn protected(mut self) -> Self {
		self.protected = true;

		self
	}

	/// Appends a child route.
	pub fn child(mut self, route: Route<V>) -> Self {
		self.children.push(route);

		self
	}

	fn is_splat(&self) -> bool {
		self.path.split('/').any(|segment| segment == "*")
	}

	fn match_path<'a>(
		&'a self,
		segments: &[&str],
		inherited_protected: bool,
		chain: &mut Vec<&'a V>,
	) -> Option<RouteMatch<'a, V>> {
		let protected = inherited_protected || self.protected;

		chain.push(&self.view);

		let (splats, literals): (Vec<_>, Vec<_>) =
			self.children.iter().partition(|child| child.is_splat());

		for child in literals {
			if let Some(found) = child.match_path(segments, protected, chain) {
				return Some(found);
			}
		}

		if let Some(params) = match_segments(&self.path, segments) {
			return Some(RouteMatch {
				pattern: &self.path,
				views: chain.clone(),
				params,
				protected,
			});
		}

		for child in splats {
			if let Some(found) = child.match_path(segments, protected, chain) {
				return Some(found);
			}
		}

		chain.pop();

		None
	}
}

/// Successful resolution of a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMatch<'a, V> {
	/// Pattern of the leaf route that matched.
	pub pattern: &'a str,
	/// Views from the outermost layout down to the leaf.
	pub views: Vec<&'a V>,
	/// Values captured by `:name` segments and `*` (under the key `*`).
	pub params: BTreeMap<String, String>,
	/// Whether any route on the chain is protected.
	pub protected: bool,
}
impl<V> RouteMatch<'_, V> {
	/// Innermost view of the match.
	pub fn leaf(&self) -> Option<&V> {
		self.views.last().copied()
	}
}

/// Ordered collection of top-level routes.
#[derive(Clone, Debug)]
pub struct RouteTable<V> {
	routes: Vec<Route<V>>,
}
impl<V> RouteTable<V> {
	/// Creates a table from top-level routes.
	pub fn new(routes: impl IntoIterator<Item = Route<V>>) -> Self {
		Self { routes: routes.into_iter().collect() }
	}

	/// Top-level routes in declaration order.
	pub fn routes(&self) -> &[Route<V>] {
		&self.routes
	}

	/// Resolves `path` (query string and fragment ignored) to the first matching route.
	pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_, V>> {
		let path = path.split(['?', '#']).next().unwrap_or_default();
		let segments = split_segments(path);
		let mut chain = Vec::new();

		self.routes.iter().find_map(|route| {
			chain.clear();

			route.match_path(&segments, false, &mut chain)
		})
	}
}
impl<V> Default for RouteTable<V> {
	fn default() -> Self {
		Self { routes: Vec::new() }
	}
}

fn split_segments(path: &str) -> Vec<&str> {
	path.split('/').filter(|segment| !segment.is_empty()).collect()
}

fn match_segments(pattern: &str, segments: &[&str]) -> Option<BTreeMap<String, String>> {
	let mut params = BTreeMap::new();
	let mut remaining = segments.iter();

	for expected in split_segments(pattern) {
		if expected == "*" {
			let rest = remaining.by_ref().copied().collect::<Vec<_>>().join("/");

			params.insert("*".to_owned(), rest);

			return Some(params);
		}

		let actual = remaining.next()?;

		if let Some(name) = expected.strip_prefix(':') {
			params.insert(name.to_owned(), (*actual).to_owned());
		} else if !expected.eq_ignore_ascii_case(actual) {
			return None;
		}
	}

	remaining.next().is_none().then_some(params)
}
