//! GraphQL API integration tests
//!
//! Operations run through the full schema against the in-memory store, with
//! the caller injected the same way the HTTP handler does it.

use async_graphql::{Request, Value};
use crypto_core::{PasswordHashConfig, PasswordHasher, TokenService};
use link_service::config::GraphQLConfig;
use link_service::context::RequestContext;
use link_service::db::{MemoryStore, Store};
use link_service::models::NewLink;
use link_service::schema::{build_schema, prepare_request, AppSchema};
use serde_json::{json, Value as Json};
use std::sync::Arc;

struct TestApp {
    schema: AppSchema,
    store: Arc<dyn Store>,
    tokens: Arc<TokenService>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(GraphQLConfig::default())
    }

    fn with_config(config: GraphQLConfig) -> Self {
        let tokens = Arc::new(TokenService::new("integration-secret", None).unwrap());
        let passwords = Arc::new(
            PasswordHasher::new(PasswordHashConfig {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            })
            .unwrap(),
        );

        Self {
            schema: build_schema(Arc::clone(&tokens), passwords, &config),
            store: Arc::new(MemoryStore::new()),
            tokens,
        }
    }

    async fn execute(&self, user_id: Option<i32>, query: &str) -> async_graphql::Response {
        let context = RequestContext::new(Arc::clone(&self.store), user_id);
        self.schema
            .execute(prepare_request(Request::new(query), context))
            .await
    }

    async fn data(&self, user_id: Option<i32>, query: &str) -> Json {
        let response = self.execute(user_id, query).await;
        assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
        response.data.into_json().unwrap()
    }

    async fn error_code(&self, user_id: Option<i32>, query: &str) -> String {
        let response = self.execute(user_id, query).await;
        let error = response.errors.first().expect("operation should fail");
        match error.extensions.as_ref().and_then(|ext| ext.get("code")) {
            Some(Value::String(code)) => code.clone(),
            other => panic!("missing error code: {other:?}"),
        }
    }

    async fn signup(&self, email: &str, password: &str) -> (i32, String) {
        let data = self
            .data(
                None,
                &format!(
                    r#"mutation {{ signup(name: "Tester", email: "{email}", password: "{password}") {{ token user {{ id }} }} }}"#
                ),
            )
            .await;

        let id = data["signup"]["user"]["id"].as_i64().unwrap() as i32;
        let token = data["signup"]["token"].as_str().unwrap().to_string();
        (id, token)
    }

    async fn seed_link(&self, description: &str, url: &str, owner: Option<i32>) -> i32 {
        self.store
            .create_link(NewLink {
                description: description.to_string(),
                url: url.to_string(),
                posted_by_id: owner,
            })
            .await
            .unwrap()
            .id
    }
}

fn link_ids(feed: &Json) -> Vec<i64> {
    feed["feed"]["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|link| link["id"].as_i64().unwrap())
        .collect()
}

// ============================================================================
// AUTH
// ============================================================================

#[tokio::test]
async fn test_signup_token_identifies_new_user() {
    let app = TestApp::new();
    let (id, token) = app.signup("alice@example.com", "s3cret").await;

    assert_eq!(app.tokens.verify(&token).unwrap().user_id, id);

    let data = app
        .data(
            None,
            r#"mutation { login(email: "alice@example.com", password: "s3cret") { token user { id email } } }"#,
        )
        .await;
    assert_eq!(data["login"]["user"]["id"], json!(id));
    assert_eq!(data["login"]["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new();
    app.signup("bob@example.com", "right").await;

    let response = app
        .execute(
            None,
            r#"mutation { login(email: "bob@example.com", password: "wrong") { token } }"#,
        )
        .await;
    assert!(response.data.into_json().unwrap().is_null());

    let code = app
        .error_code(
            None,
            r#"mutation { login(email: "bob@example.com", password: "wrong") { token } }"#,
        )
        .await;
    assert_eq!(code, "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_login_with_unknown_email() {
    let app = TestApp::new();

    let code = app
        .error_code(
            None,
            r#"mutation { login(email: "ghost@example.com", password: "x") { token } }"#,
        )
        .await;
    assert_eq!(code, "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_signup_rejected() {
    let app = TestApp::new();
    app.signup("dup@example.com", "pw").await;

    let code = app
        .error_code(
            None,
            r#"mutation { signup(name: "Again", email: "dup@example.com", password: "pw") { token } }"#,
        )
        .await;
    assert_eq!(code, "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn test_password_hash_is_not_exposed() {
    let app = TestApp::new();
    app.signup("carol@example.com", "pw").await;

    let response = app
        .execute(None, r#"mutation { login(email: "carol@example.com", password: "pw") { user { password } } }"#)
        .await;
    assert!(!response.errors.is_empty());
}

// ============================================================================
// FEED
// ============================================================================

#[tokio::test]
async fn test_feed_filter_matches_description_or_url() {
    let app = TestApp::new();
    let google = app.seed_link("Awesome website", "www.google.com", None).await;
    app.seed_link("Learn code", "www.learncodeonline.in", None).await;

    let data = app
        .data(None, r#"{ feed(filter: "google") { count links { id description url } } }"#)
        .await;

    assert_eq!(data["feed"]["count"], 1);
    assert_eq!(link_ids(&data), vec![google as i64]);

    let data = app.data(None, r#"{ feed(filter: "Learn") { count } }"#).await;
    assert_eq!(data["feed"]["count"], 1);
}

#[tokio::test]
async fn test_feed_filter_is_case_sensitive() {
    let app = TestApp::new();
    app.seed_link("Awesome website", "www.google.com", None).await;

    let data = app.data(None, r#"{ feed(filter: "GOOGLE") { count } }"#).await;
    assert_eq!(data["feed"]["count"], 0);
}

#[tokio::test]
async fn test_feed_pagination_keeps_filtered_count() {
    let app = TestApp::new();
    app.seed_link("first", "a.example.com", None).await;
    let second = app.seed_link("second", "b.example.com", None).await;

    let data = app
        .data(None, r#"{ feed(skip: 1, take: 1) { count links { id } } }"#)
        .await;

    assert_eq!(link_ids(&data), vec![second as i64]);
    assert_eq!(data["feed"]["count"], 2);
}

#[tokio::test]
async fn test_feed_filter_with_pagination_and_order() {
    let app = TestApp::new();
    app.seed_link("go one", "a.example.com", None).await;
    let go_two = app.seed_link("go two", "b.example.com", None).await;
    app.seed_link("learn", "golang.org", None).await;
    app.seed_link("other", "c.example.com", None).await;

    // filtered set ordered desc: learn, go two, go one
    let data = app
        .data(
            None,
            r#"{ feed(filter: "go", skip: 1, take: 1, orderBy: [{ description: desc }]) { count links { id } } }"#,
        )
        .await;

    assert_eq!(data["feed"]["count"], 3);
    assert_eq!(link_ids(&data), vec![go_two as i64]);

    let data = app
        .data(None, r#"{ feed(filter: "go", skip: 3) { count links { id } } }"#)
        .await;
    assert!(link_ids(&data).is_empty());
    assert_eq!(data["feed"]["count"], 3);
}

#[tokio::test]
async fn test_feed_take_zero_and_large_skip() {
    let app = TestApp::new();
    app.seed_link("first", "a.example.com", None).await;

    let data = app.data(None, r#"{ feed(take: 0) { count links { id } } }"#).await;
    assert!(link_ids(&data).is_empty());
    assert_eq!(data["feed"]["count"], 1);

    let data = app.data(None, r#"{ feed(skip: 10) { count links { id } } }"#).await;
    assert!(link_ids(&data).is_empty());
    assert_eq!(data["feed"]["count"], 1);
}

#[tokio::test]
async fn test_feed_rejects_negative_pagination() {
    let app = TestApp::new();

    let code = app.error_code(None, r#"{ feed(skip: -1) { count } }"#).await;
    assert_eq!(code, "BAD_REQUEST");
}

#[tokio::test]
async fn test_feed_multi_key_ordering() {
    let app = TestApp::new();
    let b2 = app.seed_link("b", "2.example.com", None).await;
    let a = app.seed_link("a", "9.example.com", None).await;
    let b1 = app.seed_link("b", "1.example.com", None).await;

    let data = app
        .data(
            None,
            r#"{ feed(orderBy: [{ description: desc }, { url: asc }]) { links { id } } }"#,
        )
        .await;
    assert_eq!(link_ids(&data), vec![b1 as i64, b2 as i64, a as i64]);

    let data = app
        .data(None, r#"{ feed(orderBy: [{ description: asc }]) { links { id } } }"#)
        .await;
    assert_eq!(link_ids(&data), vec![a as i64, b2 as i64, b1 as i64]);
}

#[tokio::test]
async fn test_feed_order_entry_with_two_fields_rejected() {
    let app = TestApp::new();

    let code = app
        .error_code(
            None,
            r#"{ feed(orderBy: [{ description: asc, url: desc }]) { count } }"#,
        )
        .await;
    assert_eq!(code, "BAD_REQUEST");
}

// ============================================================================
// LINK CRUD
// ============================================================================

#[tokio::test]
async fn test_link_by_id() {
    let app = TestApp::new();
    let id = app.seed_link("Rust", "rust-lang.org", None).await;

    let data = app
        .data(None, &format!("{{ linkById(id: {id}) {{ description createdAt postedBy {{ id }} }} }}"))
        .await;
    assert_eq!(data["linkById"]["description"], "Rust");
    assert!(data["linkById"]["createdAt"].is_string());
    assert!(data["linkById"]["postedBy"].is_null());

    let data = app.data(None, "{ linkById(id: 404) { id } }").await;
    assert!(data["linkById"].is_null());
}

#[tokio::test]
async fn test_post_link_requires_login() {
    let app = TestApp::new();

    let code = app
        .error_code(None, r#"mutation { link(description: "x", url: "y") { id } }"#)
        .await;
    assert_eq!(code, "UNAUTHENTICATED");

    let data = app.data(None, "{ feed { count } }").await;
    assert_eq!(data["feed"]["count"], 0);
}

#[tokio::test]
async fn test_post_link_sets_poster() {
    let app = TestApp::new();
    let (user_id, _) = app.signup("poster@example.com", "pw").await;

    let data = app
        .data(
            Some(user_id),
            r#"mutation { link(description: "Rust", url: "rust-lang.org") { id postedBy { id email links { url } } } }"#,
        )
        .await;

    assert_eq!(data["link"]["postedBy"]["id"], json!(user_id));
    assert_eq!(data["link"]["postedBy"]["links"][0]["url"], "rust-lang.org");
}

#[tokio::test]
async fn test_update_link_is_idempotent() {
    let app = TestApp::new();
    let id = app.seed_link("old", "old.example.com", None).await;
    let mutation =
        format!(r#"mutation {{ updateLink(id: {id}, description: "new", url: "new.example.com") {{ id description url }} }}"#);

    let once = app.data(None, &mutation).await;
    let twice = app.data(None, &mutation).await;
    assert_eq!(once, twice);

    let stored = app.store.find_link(id).await.unwrap().unwrap();
    assert_eq!(stored.description, "new");
    assert_eq!(stored.url, "new.example.com");
}

#[tokio::test]
async fn test_update_missing_link_returns_null() {
    let app = TestApp::new();

    let data = app
        .data(None, r#"mutation { updateLink(id: 7, description: "d", url: "u") { id } }"#)
        .await;
    assert!(data["updateLink"].is_null());
}

#[tokio::test]
async fn test_delete_link() {
    let app = TestApp::new();
    let keep = app.seed_link("keep", "keep.example.com", None).await;
    let gone = app.seed_link("gone", "gone.example.com", None).await;

    let data = app.data(None, &format!("mutation {{ deleteLink(id: {gone}) }}")).await;
    assert_eq!(data["deleteLink"], true);

    let data = app.data(None, &format!("mutation {{ deleteLink(id: {gone}) }}")).await;
    assert_eq!(data["deleteLink"], false);

    let data = app.data(None, "{ feed { count links { id } } }").await;
    assert_eq!(link_ids(&data), vec![keep as i64]);
}

// ============================================================================
// OWNERSHIP CHECK
// ============================================================================

fn guarded_app() -> TestApp {
    TestApp::with_config(GraphQLConfig {
        enforce_link_ownership: true,
        ..GraphQLConfig::default()
    })
}

#[tokio::test]
async fn test_ownership_check_blocks_other_users() {
    let app = guarded_app();
    let (owner, _) = app.signup("owner@example.com", "pw").await;
    let (other, _) = app.signup("other@example.com", "pw").await;
    let id = app.seed_link("mine", "mine.example.com", Some(owner)).await;

    let update = format!(r#"mutation {{ updateLink(id: {id}, description: "x", url: "y") {{ id }} }}"#);
    assert_eq!(app.error_code(Some(other), &update).await, "FORBIDDEN");
    assert_eq!(app.error_code(None, &update).await, "UNAUTHENTICATED");

    let delete = format!("mutation {{ deleteLink(id: {id}) }}");
    assert_eq!(app.error_code(Some(other), &delete).await, "FORBIDDEN");

    let data = app.data(Some(owner), &delete).await;
    assert_eq!(data["deleteLink"], true);
}

#[tokio::test]
async fn test_ownership_check_keeps_not_found_semantics() {
    let app = guarded_app();

    let data = app.data(None, "mutation { deleteLink(id: 5) }").await;
    assert_eq!(data["deleteLink"], false);
}

// ============================================================================
// VOTES
// ============================================================================

#[tokio::test]
async fn test_vote_and_voters() {
    let app = TestApp::new();
    let (alice, _) = app.signup("alice@example.com", "pw").await;
    let (bob, _) = app.signup("bob@example.com", "pw").await;
    let id = app.seed_link("popular", "popular.example.com", None).await;

    let vote = format!("mutation {{ vote(linkId: {id}) {{ link {{ id }} user {{ id }} }} }}");
    let data = app.data(Some(alice), &vote).await;
    assert_eq!(data["vote"]["user"]["id"], json!(alice));

    app.data(Some(bob), &vote).await;
    app.data(Some(bob), &vote).await;

    let data = app
        .data(None, &format!("{{ linkById(id: {id}) {{ voters {{ id }} }} }}"))
        .await;
    let mut voters: Vec<i64> = data["linkById"]["voters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|user| user["id"].as_i64().unwrap())
        .collect();
    voters.sort();
    assert_eq!(voters, vec![alice as i64, bob as i64]);
}

#[tokio::test]
async fn test_vote_requires_login() {
    let app = TestApp::new();
    let id = app.seed_link("x", "y", None).await;

    let code = app
        .error_code(None, &format!("mutation {{ vote(linkId: {id}) {{ user {{ id }} }} }}"))
        .await;
    assert_eq!(code, "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_vote_on_missing_link_returns_null() {
    let app = TestApp::new();
    let (user, _) = app.signup("voter@example.com", "pw").await;

    let data = app
        .data(Some(user), "mutation { vote(linkId: 99) { user { id } } }")
        .await;
    assert!(data["vote"].is_null());
}

#[tokio::test]
async fn test_voters_empty_for_new_link() {
    let app = TestApp::new();
    app.seed_link("quiet", "quiet.example.com", None).await;

    let data = app.data(None, "{ feed { links { voters { id } } } }").await;
    assert_eq!(data["feed"]["links"][0]["voters"], json!([]));
}
