//! Integration tests for the bbpr-bitbucket crate against a mock server.

use bbpr_bitbucket::{BitbucketClient, Error, NewPullRequest, PullRequestAction};
use bbpr_config::{ClientSettings, Credentials};
use httpmock::prelude::*;
use serde_json::{Value, json};

/// `Basic base64("jdoe:secret")`.
const AUTH: &str = "Basic amRvZTpzZWNyZXQ=";

fn client(server: &MockServer) -> BitbucketClient {
    client_with(server, ClientSettings::default())
}

fn client_with(server: &MockServer, settings: ClientSettings) -> BitbucketClient {
    let settings = ClientSettings {
        api_base_url: server.base_url(),
        ..settings
    };
    BitbucketClient::new(&Credentials::new("jdoe", "secret"), &settings).unwrap()
}

fn repo(workspace: &str, name: &str) -> Value {
    json!({
        "name": name,
        "full_name": format!("{workspace}/{name}"),
        "slug": name,
        "owner": { "display_name": workspace.to_uppercase(), "username": workspace },
        "workspace": { "slug": workspace },
        "links": {
            "clone": [
                { "name": "https", "href": format!("https://bb.org/{workspace}/{name}.git") },
                { "name": "ssh", "href": format!("git@bb.org:{workspace}/{name}.git") }
            ]
        }
    })
}

#[tokio::test]
async fn fetch_repositories_follows_every_page_in_order() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/repositories")
            .query_param("role", "member")
            .header("authorization", AUTH);
        then.status(200).json_body(json!({
            "values": [repo("acme", "a1"), repo("acme", "a2")],
            "next": server.url("/pages/2"),
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/pages/2").header("authorization", AUTH);
        then.status(200).json_body(json!({
            "values": [repo("globex", "g1")],
            "next": server.url("/pages/3"),
        }));
    });
    let third = server.mock(|when, then| {
        when.method(GET).path("/pages/3").header("authorization", AUTH);
        then.status(200).json_body(json!({
            "values": [repo("initech", "i1"), repo("initech", "i2"), repo("acme", "a3")],
        }));
    });

    let repos = client(&server).fetch_repositories().await.unwrap();

    let names: Vec<_> = repos.iter().map(|r| r.raw.name.as_str()).collect();
    assert_eq!(names, vec!["a1", "a2", "g1", "i1", "i2", "a3"]);
    assert_eq!(repos[2].name_with_workspace, "GLOBEX / g1");
    assert_eq!(repos[2].workspace, "globex");
    assert_eq!(repos[2].clone_url, "https://bb.org/globex/g1.git");

    first.assert_calls(1);
    second.assert_calls(1);
    third.assert_calls(1);
}

#[tokio::test]
async fn fetch_repositories_with_single_empty_page() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repositories");
        then.status(200).json_body(json!({ "values": [] }));
    });

    let repos = client(&server).fetch_repositories().await.unwrap();
    assert!(repos.is_empty());
}

#[tokio::test]
async fn missing_https_link_aborts_whole_listing() {
    let server = MockServer::start();
    let mut broken = repo("acme", "broken");
    broken["links"]["clone"] = json!([{ "name": "ssh", "href": "git@bb.org:acme/broken.git" }]);

    server.mock(|when, then| {
        when.method(GET).path("/repositories");
        then.status(200).json_body(json!({
            "values": [repo("acme", "ok")],
            "next": server.url("/pages/2"),
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/pages/2");
        then.status(200).json_body(json!({
            "values": [broken],
            "next": server.url("/pages/3"),
        }));
    });
    let third = server.mock(|when, then| {
        when.method(GET).path("/pages/3");
        then.status(200).json_body(json!({ "values": [] }));
    });

    let err = client(&server).fetch_repositories().await.unwrap_err();

    match &err {
        Error::FetchRepositories(inner) => {
            assert!(matches!(**inner, Error::MissingCloneLink { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("Error fetching repositories: "));
    second.assert_calls(1);
    third.assert_calls(0);
}

#[tokio::test]
async fn failing_later_page_aborts_listing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repositories");
        then.status(200).json_body(json!({
            "values": [repo("acme", "ok")],
            "next": server.url("/pages/2"),
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/pages/2");
        then.status(502);
    });

    let err = client(&server).fetch_repositories().await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(502));
}

#[tokio::test]
async fn page_limit_stops_runaway_pagination() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repositories");
        then.status(200).json_body(json!({
            "values": [repo("acme", "a1")],
            "next": server.url("/pages/2"),
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/pages/2");
        then.status(200).json_body(json!({
            "values": [repo("acme", "a2")],
            "next": server.url("/pages/3"),
        }));
    });
    let third = server.mock(|when, then| {
        when.method(GET).path("/pages/3");
        then.status(200).json_body(json!({ "values": [repo("acme", "a3")] }));
    });

    let settings = ClientSettings {
        max_pages: Some(2),
        ..ClientSettings::default()
    };
    let err = client_with(&server, settings)
        .fetch_repositories()
        .await
        .unwrap_err();

    match err {
        Error::FetchRepositories(inner) => {
            assert!(matches!(*inner, Error::PageLimit { max_pages: 2 }));
        }
        other => panic!("unexpected error: {other}"),
    }
    second.assert_calls(1);
    third.assert_calls(0);
}

#[tokio::test]
async fn page_limit_is_not_hit_when_last_page_fits() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repositories");
        then.status(200).json_body(json!({
            "values": [repo("acme", "a1")],
            "next": server.url("/pages/2"),
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/pages/2");
        then.status(200).json_body(json!({ "values": [repo("acme", "a2")] }));
    });

    let settings = ClientSettings {
        max_pages: Some(2),
        ..ClientSettings::default()
    };
    let repos = client_with(&server, settings)
        .fetch_repositories()
        .await
        .unwrap();
    assert_eq!(repos.len(), 2);
}

#[tokio::test]
async fn fetch_workspaces_dedups_first_page_only() {
    let server = MockServer::start();
    let mut no_https = repo("initech", "legacy");
    no_https["links"]["clone"] = json!([]);

    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/repositories")
            .query_param("role", "member")
            .header("authorization", AUTH);
        then.status(200).json_body(json!({
            "values": [repo("acme", "a1"), repo("acme", "a2"), no_https],
            "next": server.url("/pages/2"),
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/pages/2");
        then.status(200).json_body(json!({ "values": [repo("globex", "g1")] }));
    });

    let workspaces = client(&server).fetch_workspaces().await.unwrap();

    assert_eq!(
        workspaces.into_iter().collect::<Vec<_>>(),
        vec!["acme".to_string(), "initech".to_string()]
    );
    first.assert_calls(1);
    second.assert_calls(0);
}

#[tokio::test]
async fn fetch_workspaces_failure_is_propagated() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repositories");
        then.status(401)
            .json_body(json!({ "type": "error", "error": { "message": "Invalid credentials" } }));
    });

    let err = client(&server).fetch_workspaces().await.unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Error fetching workspaces: "));
    assert!(message.contains("Invalid credentials"));
}

#[tokio::test]
async fn fetch_open_pull_requests_returns_values() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/repositories/acme/widgets/pullrequests")
            .query_param("state", "OPEN")
            .header("authorization", AUTH);
        then.status(200).json_body(json!({
            "values": [
                { "id": 1, "title": "First", "state": "OPEN" },
                { "id": 2, "title": "Second", "state": "OPEN" }
            ]
        }));
    });

    let prs = client(&server)
        .fetch_open_pull_requests("acme", "widgets")
        .await
        .unwrap();

    assert_eq!(prs.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
    mock.assert();
}

#[tokio::test]
async fn fetch_open_pull_requests_failure_has_prefix() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repositories/acme/widgets/pullrequests");
        then.status(500);
    });

    let err = client(&server)
        .fetch_open_pull_requests("acme", "widgets")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Error fetching PRs"));
}

#[tokio::test]
async fn approve_posts_to_approve_endpoint() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/repositories/acme/widgets/pullrequests/42/approve")
            .header("authorization", AUTH)
            .json_body(json!({}));
        then.status(200).json_body(json!({ "approved": true }));
    });

    client(&server)
        .approve_pull_request("acme", "widgets", 42)
        .await
        .unwrap();
    mock.assert();
}

#[tokio::test]
async fn approve_failure_is_returned_not_panicked() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/repositories/acme/widgets/pullrequests/42/approve");
        then.status(500);
    });

    let err = client(&server)
        .approve_pull_request("acme", "widgets", 42)
        .await
        .unwrap_err();

    match &err {
        Error::Action { action, .. } => assert_eq!(*action, PullRequestAction::Approve),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("Failed to approve PR: "));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}

#[tokio::test]
async fn unapprove_deletes_approval() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(DELETE)
            .path("/repositories/acme/widgets/pullrequests/42/approve")
            .header("authorization", AUTH);
        then.status(204);
    });

    client(&server)
        .unapprove_pull_request("acme", "widgets", 42)
        .await
        .unwrap();
    mock.assert();
}

#[tokio::test]
async fn decline_and_merge_post_to_their_endpoints() {
    let server = MockServer::start();
    let decline = server.mock(|when, then| {
        when.method(POST)
            .path("/repositories/acme/widgets/pullrequests/5/decline")
            .header("authorization", AUTH);
        then.status(200).json_body(json!({ "id": 5, "state": "DECLINED" }));
    });
    let merge = server.mock(|when, then| {
        when.method(POST)
            .path("/repositories/acme/widgets/pullrequests/6/merge")
            .header("authorization", AUTH);
        then.status(200).json_body(json!({ "id": 6, "state": "MERGED" }));
    });

    let client = client(&server);
    client.decline_pull_request("acme", "widgets", 5).await.unwrap();
    client.merge_pull_request("acme", "widgets", 6).await.unwrap();

    decline.assert();
    merge.assert();
}

#[tokio::test]
async fn merge_conflict_is_an_action_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/repositories/acme/widgets/pullrequests/6/merge");
        then.status(409)
            .json_body(json!({ "type": "error", "error": { "message": "Merge conflict" } }));
    });

    let err = client(&server)
        .merge_pull_request("acme", "widgets", 6)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Failed to merge PR: request to {} failed with status 409 Conflict: Merge conflict",
            server.url("/repositories/acme/widgets/pullrequests/6/merge")
        )
    );
}

#[tokio::test]
async fn create_pull_request_sends_body_and_strips_git_suffix() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/repositories/acme/widgets/pullrequests")
            .header("authorization", AUTH)
            .json_body(json!({
                "title": "Add widgets",
                "source": { "branch": { "name": "feature/widgets" } },
                "destination": { "branch": { "name": "main" } }
            }));
        then.status(201).json_body(json!({
            "id": 12,
            "title": "Add widgets",
            "links": { "html": { "href": "https://bitbucket.org/acme/widgets/pull-requests/12" } }
        }));
    });

    let created = client(&server)
        .create_pull_request(
            "acme",
            "widgets.git",
            &NewPullRequest::new("Add widgets", "feature/widgets", "main"),
        )
        .await
        .unwrap();

    assert_eq!(created.id, 12);
    assert_eq!(
        created.html_url(),
        Some("https://bitbucket.org/acme/widgets/pull-requests/12")
    );
    mock.assert();
}

#[tokio::test]
async fn create_pull_request_failure_is_an_action_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/repositories/acme/widgets/pullrequests");
        then.status(400).json_body(json!({
            "type": "error",
            "error": { "message": "source: Branch not found" }
        }));
    });

    let err = client(&server)
        .create_pull_request("acme", "widgets", &NewPullRequest::new("T", "nope", "main"))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Failed to create pull request: "));
    assert!(err.to_string().contains("Branch not found"));
}

#[tokio::test]
async fn branch_exists_on_success() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/repositories/acme/widgets/refs/branches/main")
            .header("authorization", AUTH);
        then.status(200).json_body(json!({ "name": "main" }));
    });

    assert!(client(&server).branch_exists("acme/widgets", "main").await);
    mock.assert();
}

#[tokio::test]
async fn branch_exists_false_on_any_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/repositories/acme/widgets/refs/branches/gone");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/repositories/acme/widgets/refs/branches/flaky");
        then.status(500);
    });

    let client = client(&server);
    assert!(!client.branch_exists("acme/widgets", "gone").await);
    assert!(!client.branch_exists("acme/widgets", "flaky").await);
}

#[tokio::test]
async fn branch_exists_false_on_network_error() {
    // Nothing listens on port 9 (discard) on test machines.
    let settings = ClientSettings::with_base_url("http://127.0.0.1:9/2.0");
    let client = BitbucketClient::new(&Credentials::new("jdoe", "secret"), &settings).unwrap();
    assert!(!client.branch_exists("acme/widgets", "main").await);
}
