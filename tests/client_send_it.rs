#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use authed_client::{
	client::{ApiClient, RefreshFailure, RefreshOutcome},
	request::RequestDescriptor,
	store::{CredentialStore, MemoryStore},
	transport::ReqwestTransport,
};
use common::*;

const REFRESHED_BODY: &str = "{\"accessToken\":\"T2\",\"newRefreshToken\":\"R2\"}";

#[tokio::test]
async fn stored_access_credential_is_attached_verbatim() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_access(&store, "T1").await;

	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/users")
				.header("authorization", "Bearer T1")
				.header("content-type", "application/json");
			then.status(200).header("content-type", "application/json").body("[{\"id\":1}]");
		})
		.await;
	let response = client.get("/users").await.expect("Authorized request should succeed.");

	mock.assert_async().await;

	let users: Vec<serde_json::Value> =
		response.json().expect("User listing should decode as a JSON array.");

	assert_eq!(users.len(), 1);
	assert_eq!(client.refresh_metrics.calls(), 0);
}

#[tokio::test]
async fn credential_exempt_requests_never_carry_authorization() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_pair(&store, "T1", "R1").await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/posts")
				.header_missing("authorization")
				.json_body(json!({ "title": "foo", "body": "bar", "userId": 1 }));
			then.status(201).body("{\"id\":101}");
		})
		.await;
	let request = RequestDescriptor::post("/posts")
		.json(&json!({ "title": "foo", "body": "bar", "userId": 1 }))
		.expect("Post body should serialize.")
		.without_auth();
	let response = client.send(request).await.expect("Exempt request should succeed.");

	mock.assert_async().await;

	assert_eq!(response.status().as_u16(), 201);
	assert_eq!(client.refresh_metrics.calls(), 0);
}

#[tokio::test]
async fn missing_access_credential_is_refreshed_before_dispatch() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_refresh(&store, "R1").await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TEST_REFRESH_PATH)
				.header_missing("authorization")
				.json_body(json!({ "refreshToken": "R1" }));
			then.status(200).header("content-type", "application/json").body(REFRESHED_BODY);
		})
		.await;
	let users = server
		.mock_async(|when, then| {
			when.method(GET).path("/users").header("authorization", "Bearer T2");
			then.status(200).body("[]");
		})
		.await;

	client.get("/users").await.expect("Request with a refreshed credential should succeed.");

	refresh.assert_calls_async(1).await;
	users.assert_async().await;

	assert_eq!(stored_pair(&store).await, (Some("T2".into()), Some("R2".into())));
	assert_eq!(client.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn unauthorized_request_is_retried_once_with_refreshed_credential() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_pair(&store, "T1", "R1").await;

	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer T1");
			then.status(401).body("expired");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TEST_REFRESH_PATH).json_body(json!({ "refreshToken": "R1" }));
			then.status(200).header("content-type", "application/json").body(REFRESHED_BODY);
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer T2");
			then.status(200).body("{\"name\":\"Ada\"}");
		})
		.await;
	let response = client.get("/profile").await.expect("Retried request should succeed.");

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;

	assert_eq!(response.body(), b"{\"name\":\"Ada\"}");
	assert_eq!(stored_pair(&store).await, (Some("T2".into()), Some("R2".into())));
}

#[tokio::test]
async fn second_unauthorized_response_is_propagated_without_another_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_pair(&store, "T1", "R1").await;

	let chat = server
		.mock_async(|when, then| {
			when.method(GET).path("/chat");
			then.status(401).body("still unauthorized");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TEST_REFRESH_PATH);
			then.status(200).header("content-type", "application/json").body(REFRESHED_BODY);
		})
		.await;
	let err = client.get("/chat").await.expect_err("Second 401 should reach the caller.");

	assert!(err.is_unauthorized());

	chat.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn rejected_refresh_keeps_storage_and_propagates_original_failure() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_pair(&store, "T1", "R1").await;

	let users = server
		.mock_async(|when, then| {
			when.method(GET).path("/users");
			then.status(401).body("expired");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TEST_REFRESH_PATH);
			then.status(500).body("refresh backend down");
		})
		.await;
	let err = client.get("/users").await.expect_err("Original 401 should reach the caller.");

	match err {
		Error::Status(status) => {
			assert_eq!(status.status.as_u16(), 401);
			assert_eq!(status.body_text(), "expired");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	users.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	assert_eq!(stored_pair(&store).await, (Some("T1".into()), Some("R1".into())));
	assert_eq!(client.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn unreachable_refresh_endpoint_propagates_original_failure() {
	let server = MockServer::start_async().await;
	let store = Arc::new(MemoryStore::default());
	let config = test_config(&server.base_url()).with_refresh_path("http://127.0.0.1:1/refresh");
	let client = <ApiClient<ReqwestTransport>>::new(store.clone(), config);

	seed_pair(&store, "T1", "R1").await;

	let users = server
		.mock_async(|when, then| {
			when.method(GET).path("/users");
			then.status(401);
		})
		.await;
	let err = client.get("/users").await.expect_err("Original 401 should reach the caller.");

	assert!(err.is_unauthorized());

	users.assert_calls_async(1).await;

	assert_eq!(stored_pair(&store).await, (Some("T1".into()), Some("R1".into())));

	match client.refresh().await {
		RefreshOutcome::Failed(RefreshFailure::Dispatch(Error::Transport(_))) => {},
		other => panic!("Unexpected refresh outcome: {other:?}."),
	}
}

#[tokio::test]
async fn failed_pre_dispatch_refresh_sends_request_without_credential() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_refresh(&store, "R1").await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TEST_REFRESH_PATH);
			then.status(400).body("{\"error\":\"invalid refresh token\"}");
		})
		.await;
	let posts = server
		.mock_async(|when, then| {
			when.method(GET).path("/posts").header_missing("authorization");
			then.status(200).body("[]");
		})
		.await;

	client.get("/posts").await.expect("Public endpoint should succeed without a credential.");

	refresh.assert_calls_async(1).await;
	posts.assert_async().await;

	assert_eq!(stored_pair(&store).await, (None, Some("R1".into())));
}

#[tokio::test]
async fn non_authorization_failures_skip_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_pair(&store, "T1", "R1").await;

	let forbidden = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/posts/1");
			then.status(403).body("forbidden");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TEST_REFRESH_PATH);
			then.status(200).header("content-type", "application/json").body(REFRESHED_BODY);
		})
		.await;
	let err = client.delete("/posts/1").await.expect_err("403 should reach the caller.");

	assert_eq!(err.status(), Some(403));

	forbidden.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn malformed_refresh_body_is_a_failed_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_pair(&store, "T1", "R1").await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TEST_REFRESH_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"T2\"}");
		})
		.await;

	match client.refresh().await {
		RefreshOutcome::Failed(RefreshFailure::MalformedBody(source)) => {
			assert!(source.to_string().contains("newRefreshToken"));
		},
		other => panic!("Unexpected refresh outcome: {other:?}."),
	}

	refresh.assert_calls_async(1).await;

	assert_eq!(stored_pair(&store).await, (Some("T1".into()), Some("R1".into())));
}

#[tokio::test]
async fn refresh_without_refresh_credential_makes_no_call() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_access(&store, "T1").await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TEST_REFRESH_PATH);
			then.status(200).header("content-type", "application/json").body(REFRESHED_BODY);
		})
		.await;

	assert!(matches!(client.refresh().await, RefreshOutcome::NoRefreshCredential));

	refresh.assert_calls_async(0).await;

	assert_eq!(client.refresh_metrics.skipped(), 1);

	store.clear().await.expect("Clearing the store should succeed.");

	assert!(store.is_empty());
}

#[tokio::test]
async fn unauthorized_credential_exempt_request_is_not_refreshed() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_pair(&store, "T1", "R1").await;

	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login").header_missing("authorization");
			then.status(401).body("bad password");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TEST_REFRESH_PATH);
			then.status(200).header("content-type", "application/json").body(REFRESHED_BODY);
		})
		.await;
	let request = RequestDescriptor::post("/auth/login")
		.json(&json!({ "username": "ada", "password": "wrong" }))
		.expect("Login body should serialize.")
		.without_auth();
	let err = client.send(request).await.expect_err("Exempt 401 should reach the caller.");

	assert!(err.is_unauthorized());

	login.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert_eq!(client.refresh_metrics.calls(), 0);
	assert_eq!(stored_pair(&store).await, (Some("T1".into()), Some("R1".into())));
}

#[tokio::test]
async fn unauthorized_refresh_endpoint_is_called_exactly_once() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());

	seed_pair(&store, "T1", "R1").await;

	let users = server
		.mock_async(|when, then| {
			when.method(GET).path("/users").header("authorization", "Bearer T1");
			then.status(401).body("expired");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TEST_REFRESH_PATH).header_missing("authorization");
			then.status(401).body("refresh credential revoked");
		})
		.await;
	let err = client.get("/users").await.expect_err("Original 401 should reach the caller.");

	match err {
		Error::Status(status) => {
			assert_eq!(status.status.as_u16(), 401);
			assert_eq!(status.body_text(), "expired");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	users.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	match client.refresh().await {
		RefreshOutcome::Failed(RefreshFailure::Rejected { status }) => assert_eq!(status, 401),
		other => panic!("Unexpected refresh outcome: {other:?}."),
	}

	refresh.assert_calls_async(2).await;

	assert_eq!(client.refresh_metrics.failures(), 2);
	assert_eq!(stored_pair(&store).await, (Some("T1".into()), Some("R1".into())));
}
