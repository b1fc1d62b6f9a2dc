//! The application's own route table.

// self
use crate::{
	_prelude::*,
	routes::{Route, RouteTable},
};

/// Path of the login page; protected routes redirect here.
pub const LOGIN_PATH: &str = "/login";

/// Views the application shell can render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Page {
	/// Sign-in form.
	Login,
	/// Registration form.
	SignUp,
	/// Authenticated layout wrapping every protected page.
	Layout,
	/// User directory.
	User,
	/// Chat view.
	Chat,
	/// Current user's profile.
	Profile,
	/// Fallback for unknown paths inside the layout.
	NotFound,
}

/// Builds the application table: public `/login` and `/signup`, and a protected layout at `/`
/// hosting `/user`, `/chat`, `/profile`, and a catch-all.
pub fn app_routes() -> RouteTable<Page> {
	RouteTable::new([
		Route::new(LOGIN_PATH, Page::Login),
		Route::new("/signup", Page::SignUp),
		Route::new("/", Page::Layout)
			.protected()
			.child(Route::new("/user", Page::User))
			.child(Route::new("/chat", Page::Chat))
			.child(Route::new("/profile", Page::Profile))
			.child(Route::new("*", Page::NotFound)),
	])
}
