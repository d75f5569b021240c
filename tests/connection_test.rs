use httpmock::prelude::*;
use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use tvdb_client::{
    ACCEPT_API_VERSION, ApiError, ApiRequest, CONTENT_TYPE_JSON, Connection, HttpMethod,
    LOGIN_PATH, MAX_AUTHENTICATION_RETRY_COUNT, REFRESH_TOKEN_PATH, RemoteEndpoint, Status,
    USER_AGENT_VALUE,
};

const TOKEN: &str = "aaa.bbb.ccc";

/// Creates a connection whose endpoint points at the mock server
fn connection_for(server: &MockServer) -> Connection {
    let endpoint = RemoteEndpoint::builder()
        .protocol("http")
        .host(server.host())
        .port(u32::from(server.port()))
        .build()
        .unwrap();

    Connection::builder()
        .api_key("api-key")
        .endpoint(endpoint)
        .build()
        .unwrap()
}

/// Creates a connection that already carries a valid token
fn authorized_connection_for(server: &MockServer) -> Connection {
    let connection = connection_for(server);
    connection.set_token(TOKEN).unwrap();
    connection
}

#[test]
fn test_unauthorized_session_omits_auth_headers() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/languages")
            .header("Content-Type", CONTENT_TYPE_JSON)
            .header("Accept", ACCEPT_API_VERSION)
            .header("User-Agent", USER_AGENT_VALUE)
            .header_missing("Authorization")
            .header_missing("Accept-Language");
        then.status(200).json_body(json!({"data": []}));
    });

    let connection = connection_for(&server);
    let response = connection.send(ApiRequest::get("/languages")).unwrap();

    assert_eq!(response, json!({"data": []}));
    mock.assert();
}

#[test]
fn test_authorized_session_sends_token_and_language() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/series/81189")
            .header("Authorization", format!("Bearer {}", TOKEN))
            .header("Accept-Language", "de");
        then.status(200).json_body(json!({"data": {"id": 81189}}));
    });

    let connection = authorized_connection_for(&server);
    connection.set_language("de");
    let response = connection.send(ApiRequest::get("/series/81189")).unwrap();

    assert_eq!(response["data"]["id"], json!(81189));
    mock.assert();
}

#[test]
fn test_each_verb_issues_exactly_one_request() {
    let server = MockServer::start();
    let get = server.mock(|when, then| {
        when.method(GET).path("/resource");
        then.status(200).json_body(json!({"verb": "GET"}));
    });
    let post = server.mock(|when, then| {
        when.method(POST).path("/resource").json_body(json!({"key": "value"}));
        then.status(200).json_body(json!({"verb": "POST"}));
    });
    let put = server.mock(|when, then| {
        when.method(PUT).path("/resource");
        then.status(200).json_body(json!({"verb": "PUT"}));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/resource");
        then.status(200).json_body(json!({"verb": "DELETE"}));
    });
    let head = server.mock(|when, then| {
        when.method(Method::HEAD).path("/resource");
        then.status(200);
    });

    let connection = authorized_connection_for(&server);

    assert_eq!(
        connection.send(ApiRequest::get("/resource")).unwrap()["verb"],
        json!("GET")
    );
    assert_eq!(
        connection
            .send(ApiRequest::post("/resource", r#"{"key": "value"}"#))
            .unwrap()["verb"],
        json!("POST")
    );
    assert_eq!(
        connection.send(ApiRequest::put("/resource")).unwrap()["verb"],
        json!("PUT")
    );
    assert_eq!(
        connection.send(ApiRequest::delete("/resource")).unwrap()["verb"],
        json!("DELETE")
    );
    assert!(connection.send(ApiRequest::head("/resource")).unwrap().is_object());

    get.assert();
    post.assert();
    put.assert();
    delete.assert();
    head.assert();
}

#[test]
fn test_head_synthesizes_json_from_headers() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::HEAD).path("/series/81189");
        then.status(200)
            .header("Last-Modified", "Thu, 01 Jan 2026 00:00:00 GMT")
            .header("X-Thetvdb-Api-Version", "3.0.0");
    });

    let connection = authorized_connection_for(&server);
    let response = connection.send(ApiRequest::head("/series/81189")).unwrap();

    // Header names arrive in their canonical lowercase form
    assert_eq!(
        response["last-modified"],
        json!("Thu, 01 Jan 2026 00:00:00 GMT")
    );
    assert_eq!(response["x-thetvdb-api-version"], json!("3.0.0"));
    mock.assert();
}

#[test]
fn test_head_collects_repeated_headers_into_array() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::HEAD).path("/series/81189");
        then.status(200)
            .header("X", "a")
            .header("Y", "b")
            .header("Y", "c");
    });

    let connection = authorized_connection_for(&server);
    let response = connection.send(ApiRequest::head("/series/81189")).unwrap();

    assert_eq!(response["x"], json!("a"));
    assert_eq!(response["y"], json!(["b", "c"]));
    mock.assert();
}

#[test]
fn test_single_unauthorized_is_retried_after_login() {
    let server = MockServer::start();
    let rejected = server.mock(|when, then| {
        when.method(GET)
            .path("/series/81189")
            .header_missing("Authorization");
        then.status(401).json_body(json!({"Error": "Not Authorized"}));
    });
    let accepted = server.mock(|when, then| {
        when.method(GET)
            .path("/series/81189")
            .header("Authorization", format!("Bearer {}", TOKEN))
            .header("Accept-Language", "en");
        then.status(200).json_body(json!({"data": {"id": 81189}}));
    });
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/login")
            .header_missing("Authorization")
            .json_body(json!({"apikey": "api-key"}));
        then.status(200).json_body(json!({"token": TOKEN}));
    });

    let connection = connection_for(&server);
    let response = connection.send(ApiRequest::get("/series/81189")).unwrap();

    assert_eq!(response, json!({"data": {"id": 81189}}));
    rejected.assert_hits(1);
    accepted.assert_hits(1);
    login.assert_hits(1);
    assert_eq!(connection.status(), Status::Authorized);
    assert_eq!(connection.token().as_deref(), Some(TOKEN));
}

#[test]
fn test_repeated_unauthorized_exhausts_retries() {
    let server = MockServer::start();
    let route = server.mock(|when, then| {
        when.method(GET).path("/series/81189");
        then.status(401).json_body(json!({"Error": "Not Authorized"}));
    });
    let login = server.mock(|when, then| {
        when.method(POST).path("/login");
        then.status(200).json_body(json!({"token": TOKEN}));
    });

    let connection = connection_for(&server);
    let error = connection
        .send(ApiRequest::get("/series/81189"))
        .unwrap_err();

    assert!(matches!(
        error,
        ApiError::MaxRetriesExceeded { retries } if retries == MAX_AUTHENTICATION_RETRY_COUNT
    ));
    assert!(error.to_string().contains("3"));
    route.assert_hits(3);
    login.assert_hits(3);
}

#[test]
fn test_rejected_login_fails_without_further_retries() {
    let server = MockServer::start();
    let route = server.mock(|when, then| {
        when.method(GET).path("/series/81189");
        then.status(401).json_body(json!({"Error": "Not Authorized"}));
    });
    let login = server.mock(|when, then| {
        when.method(POST).path("/login");
        then.status(401).json_body(json!({"Error": "API Key Required"}));
    });

    let connection = connection_for(&server);
    let error = connection
        .send(ApiRequest::get("/series/81189"))
        .unwrap_err();

    assert!(matches!(error, ApiError::AuthorizationFailed));
    route.assert_hits(1);
    login.assert_hits(1);
    assert_eq!(connection.status(), Status::NotAuthorized);
}

#[test]
fn test_failed_login_resets_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/languages");
        then.status(401);
    });
    let login = server.mock(|when, then| {
        when.method(POST).path("/login");
        then.status(503);
    });

    let connection = connection_for(&server);
    let error = connection.send(ApiRequest::get("/languages")).unwrap_err();

    assert!(matches!(error, ApiError::ServiceUnavailable));
    assert_eq!(connection.status(), Status::NotAuthorized);

    // The next call starts a fresh authorization instead of tripping the guard
    let error = connection.send(ApiRequest::get("/languages")).unwrap_err();
    assert!(matches!(error, ApiError::ServiceUnavailable));
    login.assert_hits(2);
}

#[test]
fn test_explicit_authorize() {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method(POST).path(LOGIN_PATH).json_body(json!({
            "apikey": "api-key",
            "userkey": "user-key",
            "username": "someone"
        }));
        then.status(200).json_body(json!({"token": TOKEN}));
    });

    let endpoint = RemoteEndpoint::builder()
        .protocol("http")
        .host(server.host())
        .port(u32::from(server.port()))
        .build()
        .unwrap();
    let connection = Connection::builder()
        .api_key("api-key")
        .user_credentials("user-key", "someone")
        .endpoint(endpoint)
        .build()
        .unwrap();

    connection.authorize().unwrap();

    login.assert();
    assert_eq!(connection.status(), Status::Authorized);
    assert_eq!(connection.token().as_deref(), Some(TOKEN));
}

#[test]
fn test_login_with_malformed_token_fails() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/login");
        then.status(200).json_body(json!({"token": "not-a-token"}));
    });

    let connection = connection_for(&server);
    let error = connection.authorize().unwrap_err();

    assert!(matches!(error, ApiError::InvalidToken(_)));
    assert_eq!(connection.status(), Status::NotAuthorized);
    assert_eq!(connection.token(), None);
}

#[test]
fn test_refresh_token() {
    let server = MockServer::start();
    let refresh = server.mock(|when, then| {
        when.method(GET)
            .path(REFRESH_TOKEN_PATH)
            .header("Authorization", format!("Bearer {}", TOKEN));
        then.status(200).json_body(json!({"token": "ddd.eee.fff"}));
    });

    let connection = authorized_connection_for(&server);
    connection.refresh_token().unwrap();

    refresh.assert();
    assert_eq!(connection.token().as_deref(), Some("ddd.eee.fff"));
}

#[test]
fn test_status_codes_map_to_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404).json_body(json!({"Error": "ID: 1 not found"}));
    });
    server.mock(|when, then| {
        when.method(PUT).path("/user/favorites/1");
        then.status(409).json_body(json!({"Error": "Already a favorite"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/busy");
        then.status(503).body("<html>maintenance</html>");
    });
    let broken = server.mock(|when, then| {
        when.method(GET).path("/broken");
        then.status(500).body("not json");
    });

    let connection = authorized_connection_for(&server);

    match connection.send(ApiRequest::get("/missing")).unwrap_err() {
        ApiError::NotFound { message } => assert_eq!(message, "ID: 1 not found"),
        other => panic!("unexpected error: {:?}", other),
    }
    match connection
        .send(ApiRequest::put("/user/favorites/1"))
        .unwrap_err()
    {
        ApiError::Conflict { message } => assert_eq!(message, "Already a favorite"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(
        connection.send(ApiRequest::get("/busy")).unwrap_err(),
        ApiError::ServiceUnavailable
    ));
    match connection.send(ApiRequest::get("/broken")).unwrap_err() {
        ApiError::UnexpectedResponse { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Terminal errors are never retried
    broken.assert_hits(1);
}

#[test]
fn test_preconditions_fail_before_any_request() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.any_request();
        then.status(200);
    });

    let connection = authorized_connection_for(&server);

    assert!(matches!(
        connection.send(ApiRequest::get("")).unwrap_err(),
        ApiError::InvalidArgument(_)
    ));
    assert!(matches!(
        connection.send(ApiRequest::post("/login", "")).unwrap_err(),
        ApiError::InvalidArgument(_)
    ));
    any.assert_hits(0);
}

#[test]
fn test_transport_failure_is_communication_error() {
    // Grab a free port and release it again, nothing listens there afterwards
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let endpoint = RemoteEndpoint::builder()
        .protocol("http")
        .host("127.0.0.1")
        .port(u32::from(port))
        .build()
        .unwrap();
    let connection = Connection::builder()
        .api_key("api-key")
        .endpoint(endpoint)
        .build()
        .unwrap();

    let error = connection.send(ApiRequest::get("/languages")).unwrap_err();

    match error {
        ApiError::Communication { method, .. } => assert_eq!(method, HttpMethod::Get),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(error_mentions_verb(
        &connection.send(ApiRequest::delete("/x")).unwrap_err(),
        "DELETE"
    ));
}

fn error_mentions_verb(error: &ApiError, verb: &str) -> bool {
    error.to_string().contains(verb)
}

#[test]
fn test_concurrent_sends_share_one_login() {
    let server = MockServer::start();
    let rejected = server.mock(|when, then| {
        when.method(GET)
            .path("/languages")
            .header_missing("Authorization");
        then.status(401);
    });
    let accepted = server.mock(|when, then| {
        when.method(GET)
            .path("/languages")
            .header("Authorization", format!("Bearer {}", TOKEN));
        then.status(200).json_body(json!({"data": []}));
    });
    let login = server.mock(|when, then| {
        when.method(POST).path("/login");
        then.status(200).json_body(json!({"token": TOKEN}));
    });

    let connection = Arc::new(connection_for(&server));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let connection = Arc::clone(&connection);
            thread::spawn(move || connection.send(ApiRequest::get("/languages")))
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }

    // Calls are serialized: only the first one has to log in
    rejected.assert_hits(1);
    login.assert_hits(1);
    accepted.assert_hits(4);
}
