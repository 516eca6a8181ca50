use repoai_api::headers::{
    build_headers, ACCEPT_EVENT_STREAM, ACCEPT_JSON, HEADER_ACCEPT, HEADER_CONTENT_TYPE,
    HEADER_USER_AGENT,
};
use repoai_api::RepoApiConfig;

#[test]
fn stream_requests_accept_event_stream() {
    let config = RepoApiConfig::default().insert_header("X-Codespace", " main ");
    let headers = build_headers(&config, ACCEPT_EVENT_STREAM);

    assert_eq!(headers.get(HEADER_ACCEPT), Some(&"text/event-stream".to_owned()));
    assert_eq!(
        headers.get(HEADER_CONTENT_TYPE),
        Some(&"application/json".to_owned())
    );
    assert_eq!(headers.get("x-codespace"), Some(&"main".to_owned()));
}

#[test]
fn configured_user_agent_wins_over_default() {
    let config = RepoApiConfig::default().with_user_agent("repoai-test");
    let headers = build_headers(&config, ACCEPT_JSON);
    assert_eq!(headers.get(HEADER_USER_AGENT), Some(&"repoai-test".to_owned()));
}

#[test]
fn default_user_agent_names_the_client() {
    let headers = build_headers(&RepoApiConfig::default(), ACCEPT_JSON);
    let ua = headers.get(HEADER_USER_AGENT).expect("user-agent");
    assert!(ua.starts_with("repoai/"), "{ua}");
}
