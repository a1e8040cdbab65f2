mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{Fault, TestApp};
use connecdo_api::config::AppConfig;

#[tokio::test]
async fn missing_fields_are_rejected_before_the_store() {
    let app = TestApp::new();
    let user = app.sign_up_and_in("a@x.com", "secret1").await;

    let cases = [
        ("/api/users/profile", json!({ "username": "alice" }), "Username and role are required"),
        ("/api/users/profile", json!({ "role": "poster" }), "Username and role are required"),
        ("/api/problems", json!({ "title": "T" }), "Title and description are required"),
        ("/api/problems", json!({ "description": "D", "title": "" }), "Title and description are required"),
        ("/api/solutions", json!({ "problem_id": "p" }), "Problem ID and description are required"),
        ("/api/discussions", json!({ "message": "hi" }), "Problem ID and message are required"),
        ("/api/contacts", json!({ "subject": "s" }), "Subject and message are required"),
    ];

    let data_before = app.backend.data_ops();
    let auth_before = app.backend.auth_lookups();
    for (path, body, message) in cases {
        let res = app.post(path, body.clone(), Some(&user.token)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{} {}", path, body);
        assert_eq!(res.error(), message);
    }
    assert_eq!(app.backend.data_ops(), data_before);
    assert_eq!(app.backend.auth_lookups(), auth_before);
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = TestApp::new();

    let cases: [(Method, &str, Option<Value>); 9] = [
        (Method::GET, "/api/auth/user", None),
        (Method::GET, "/api/users/profile", None),
        (Method::GET, "/api/problems/user", None),
        (Method::GET, "/api/solutions/user", None),
        (Method::POST, "/api/users/profile", Some(json!({ "username": "u", "role": "poster" }))),
        (Method::POST, "/api/problems", Some(json!({ "title": "T", "description": "D" }))),
        (Method::POST, "/api/solutions", Some(json!({ "problem_id": "p", "description": "D" }))),
        (Method::POST, "/api/discussions", Some(json!({ "problem_id": "p", "message": "m" }))),
        (Method::POST, "/api/contacts", Some(json!({ "subject": "s", "message": "m" }))),
    ];

    for token in [None, Some("stale-token")] {
        for (method, path, body) in cases.iter().cloned() {
            let res = app.request(method.clone(), path, body, token).await;
            assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{} {} {:?}", method, path, token);
            assert_eq!(res.body, json!({ "error": "Unauthorized" }));
        }
    }
    assert_eq!(app.backend.data_ops(), 0);
    // Only the requests that carried a token asked the provider about it.
    assert_eq!(app.backend.auth_lookups(), cases.len());
}

#[tokio::test]
async fn profile_is_created_once() {
    let app = TestApp::new();
    let user = app.sign_up_and_in("a@x.com", "secret1").await;

    let res = app
        .post(
            "/api/users/profile",
            json!({ "username": "alice", "role": "poster", "bio": "hello" }),
            Some(&user.token),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["profile"]["id"], user.id.as_str());
    assert_eq!(res.body["profile"]["email"], "a@x.com");
    assert_eq!(res.body["profile"]["role"], "poster");
    assert_eq!(res.body["profile"]["bio"], "hello");

    let res = app.get("/api/users/profile", Some(&user.token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["profile"]["username"], "alice");

    let res = app
        .post("/api/users/profile", json!({ "username": "again", "role": "builder" }), Some(&user.token))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.error().contains("users_pkey"), "{}", res.error());
}

#[tokio::test]
async fn profile_role_must_be_known() {
    let app = TestApp::new();
    let user = app.sign_up_and_in("a@x.com", "secret1").await;
    let before = app.backend.data_ops();

    let res = app
        .post("/api/users/profile", json!({ "username": "alice", "role": "admin" }), Some(&user.token))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "Role must be either poster or builder");
    assert_eq!(app.backend.data_ops(), before);
}

#[tokio::test]
async fn missing_profile_read_is_a_500() {
    let app = TestApp::new();
    let user = app.sign_up_and_in("a@x.com", "secret1").await;

    let res = app.get("/api/users/profile", Some(&user.token)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!res.error().is_empty());
}

#[tokio::test]
async fn problem_tags_are_normalized() {
    let app = TestApp::new();
    let poster = app.member("p@x.com", "pat", "poster").await;

    let cases = [
        (json!("a, b ,c"), json!(["a", "b", "c"])),
        (json!("ai,,web, "), json!(["ai", "web"])),
        (json!(["x", "y"]), json!(["x", "y"])),
        (json!(7), json!([])),
        (Value::Null, json!([])),
    ];

    for (tags, expected) in cases {
        let res = app
            .post(
                "/api/problems",
                json!({ "title": "T", "description": "D", "tags": tags }),
                Some(&poster.token),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        assert_eq!(res.body["problem"]["tags"], expected);
        assert_eq!(res.body["problem"]["posted_by"], poster.id.as_str());
    }

    let res = app
        .post("/api/problems", json!({ "title": "T", "description": "D" }), Some(&poster.token))
        .await;
    assert_eq!(res.body["problem"]["tags"], json!([]));
}

#[tokio::test]
async fn posting_requires_the_matching_role() {
    let app = TestApp::new();
    let poster = app.member("p@x.com", "pat", "poster").await;
    let builder = app.member("b@x.com", "bo", "builder").await;
    let bare = app.sign_up_and_in("n@x.com", "secret1").await;

    let res = app
        .post("/api/problems", json!({ "title": "T", "description": "D" }), Some(&builder.token))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error(), "Only posters can do this");

    let res = app
        .post("/api/problems", json!({ "title": "T", "description": "D" }), Some(&bare.token))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error(), "Complete your profile first");

    let problem = app
        .post("/api/problems", json!({ "title": "T", "description": "D" }), Some(&poster.token))
        .await;
    let problem_id = problem.body["problem"]["id"].as_str().unwrap();

    let res = app
        .post(
            "/api/solutions",
            json!({ "problem_id": problem_id, "description": "mine" }),
            Some(&poster.token),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error(), "Only builders can do this");
}

#[tokio::test]
async fn roles_are_not_checked_when_enforcement_is_off() {
    let mut config = AppConfig::development();
    config.security.enforce_roles = false;
    let app = TestApp::with_config(config);
    let builder = app.member("b@x.com", "bo", "builder").await;

    let res = app
        .post("/api/problems", json!({ "title": "T", "description": "D" }), Some(&builder.token))
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn solutions_default_url_and_reference_real_problems() {
    let app = TestApp::new();
    let poster = app.member("p@x.com", "pat", "poster").await;
    let builder = app.member("b@x.com", "bo", "builder").await;

    let problem = app
        .post("/api/problems", json!({ "title": "T", "description": "D" }), Some(&poster.token))
        .await;
    let problem_id = problem.body["problem"]["id"].as_str().unwrap();

    let res = app
        .post(
            "/api/solutions",
            json!({ "problem_id": problem_id, "description": "S" }),
            Some(&builder.token),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["solution"]["solution_url"], "");
    assert_eq!(res.body["solution"]["builder_id"], builder.id.as_str());

    let res = app
        .post(
            "/api/solutions",
            json!({ "problem_id": "00000000-0000-0000-0000-000000000000", "description": "S" }),
            Some(&builder.token),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.error().contains("solutions_problem_id_fkey"), "{}", res.error());
}

#[tokio::test]
async fn discussions_need_a_problem_id_to_list() {
    let app = TestApp::new();

    let res = app.get("/api/discussions", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "Problem ID is required");

    let res = app.get("/api/discussions?problem_id=", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.backend.data_ops(), 0);

    let res = app.get("/api/discussions?problem_id=unknown", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["discussions"], json!([]));
}

#[tokio::test]
async fn discussion_threads_keep_parent_links() {
    let app = TestApp::new();
    let poster = app.member("p@x.com", "pat", "poster").await;
    let builder = app.member("b@x.com", "bo", "builder").await;

    let problem = app
        .post("/api/problems", json!({ "title": "T", "description": "D" }), Some(&poster.token))
        .await;
    let problem_id = problem.body["problem"]["id"].as_str().unwrap();

    let root = app
        .post(
            "/api/discussions",
            json!({ "problem_id": problem_id, "message": "first" }),
            Some(&builder.token),
        )
        .await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.body["discussion"]["parent_id"], Value::Null);
    assert_eq!(root.body["discussion"]["user_id"], builder.id.as_str());
    let root_id = root.body["discussion"]["id"].as_str().unwrap();

    let reply = app
        .post(
            "/api/discussions",
            json!({ "problem_id": problem_id, "message": "reply", "parent_id": root_id }),
            Some(&poster.token),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["discussion"]["parent_id"], root_id);

    let res = app
        .get(&format!("/api/discussions?problem_id={}", problem_id), None)
        .await;
    let thread = res.body["discussions"].as_array().unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0]["message"], "first");
    assert_eq!(thread[0]["users"]["username"], "bo");
    assert_eq!(thread[1]["message"], "reply");
    assert_eq!(thread[1]["users"]["username"], "pat");
}

#[tokio::test]
async fn contact_email_comes_from_the_session() {
    let app = TestApp::new();
    let user = app.sign_up_and_in("me@x.com", "secret1").await;

    let res = app
        .post(
            "/api/contacts",
            json!({ "subject": "bug", "message": "it broke", "email": "spoof@x.com" }),
            Some(&user.token),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["contact"]["email"], "me@x.com");
    assert_eq!(res.body["contact"]["name"], "Anonymous");

    let res = app
        .post(
            "/api/contacts",
            json!({ "subject": "hi", "message": "thanks", "name": "Sam" }),
            Some(&user.token),
        )
        .await;
    assert_eq!(res.body["contact"]["name"], "Sam");
}

#[tokio::test]
async fn public_reads_ignore_a_stale_session() {
    let app = TestApp::with_fault(Fault::StaleSession);

    let res = app.get("/api/problems", Some("expired")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["problems"], json!([]));

    let res = app.get("/api/discussions?problem_id=p1", Some("expired")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["discussions"], json!([]));

    // Own-data reads still need a live session.
    let res = app.get("/api/problems/user", Some("expired")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
