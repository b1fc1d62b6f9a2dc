//! Demonstrates the client's refresh-and-retry pipeline against a local mock API, then gates the
//! application routes with the same credential store.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use authed_client::{
	auth::CredentialPair,
	client::ReqwestApiClient,
	config::ClientConfig,
	routes::{Admission, RouteGuard, app_routes},
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/users").header("authorization", "Bearer demo-access-1");
			then.status(401).body("{\"message\":\"access token expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).header("content-type", "application/json").body(
				"{\"accessToken\":\"demo-access-2\",\"newRefreshToken\":\"demo-refresh-2\"}",
			);
		})
		.await;
	let _users = server
		.mock_async(|when, then| {
			when.method(GET).path("/users").header("authorization", "Bearer demo-access-2");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":1,\"name\":\"Leanne Graham\"}]");
		})
		.await;
	let store = Arc::new(MemoryStore::with_pair(CredentialPair::new(
		"demo-access-1",
		"demo-refresh-1",
	)));
	let config = ClientConfig::new(Url::parse(&server.base_url())?);
	let client = ReqwestApiClient::new(store.clone(), config);
	let users: serde_json::Value = client.get("/users").await?.json()?;

	println!("Users fetched after one transparent refresh: {users}.");
	println!(
		"Stale request hits: {}, refresh calls: {}.",
		expired.calls_async().await,
		refresh.calls_async().await
	);

	let routes = app_routes();
	let guard = RouteGuard::new(store.clone());

	for path in ["/login", "/profile", "/unknown"] {
		let Some(route) = routes.resolve(path) else {
			println!("{path} matches no route.");

			continue;
		};

		println!("{path} -> {:?} ({:?}).", route.leaf(), guard.admit(&route).await?);
	}

	store.clear().await?;

	if let Some(route) = routes.resolve("/chat") {
		if let Admission::Redirect(to) = guard.admit(&route).await? {
			println!("Signed out; /chat redirects to {to}.");
		}
	}

	Ok(())
}
