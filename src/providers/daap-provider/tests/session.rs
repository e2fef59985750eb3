use daap_provider::dmap::{encode, DmapItem, DmapValue};
use daap_provider::{DaapError, DaapSession};
use resolver_core::catalog::Catalog;
use resolver_core::config::DaapConfig;
use resolver_core::models::TrackId;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn container(tag: &[u8; 4], children: Vec<DmapItem>) -> DmapItem {
    DmapItem::new(tag, DmapValue::Container(children))
}

fn int(tag: &[u8; 4], value: u64) -> DmapItem {
    DmapItem::new(tag, DmapValue::Int(value))
}

fn text(tag: &[u8; 4], value: &str) -> DmapItem {
    DmapItem::new(tag, DmapValue::Text(value.into()))
}

fn dmap_response(root: DmapItem) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/x-dmap-tagged")
        .set_body_bytes(encode(&[root]))
}

fn server_info() -> DmapItem {
    container(
        b"msrv",
        vec![int(b"mstt", 200), text(b"minm", "Living Room"), int(b"msdc", 1)],
    )
}

fn login(status: u64) -> DmapItem {
    container(b"mlog", vec![int(b"mstt", status), int(b"mlid", 1337)])
}

fn databases(ids: &[u64]) -> DmapItem {
    let items = ids
        .iter()
        .map(|id| container(b"mlit", vec![int(b"miid", *id), text(b"minm", "Library")]))
        .collect();
    container(
        b"avdb",
        vec![int(b"mstt", 200), container(b"mlcl", items)],
    )
}

fn songs() -> DmapItem {
    container(
        b"adbs",
        vec![
            int(b"mstt", 200),
            container(
                b"mlcl",
                vec![
                    container(
                        b"mlit",
                        vec![
                            int(b"mikd", 2),
                            int(b"miid", 41),
                            text(b"minm", "One More Time"),
                            text(b"asar", "Daft Punk"),
                            text(b"asal", "Discovery"),
                            int(b"astm", 320_357),
                        ],
                    ),
                    container(
                        b"mlit",
                        vec![int(b"mikd", 2), int(b"miid", 42), text(b"minm", "Untitled")],
                    ),
                    // No id: cannot be streamed, dropped.
                    container(b"mlit", vec![text(b"minm", "Ghost")]),
                ],
            ),
        ],
    )
}

fn config_for(server: &MockServer) -> DaapConfig {
    DaapConfig {
        host: server.address().ip().to_string(),
        port: server.address().port(),
        ..DaapConfig::default()
    }
}

async fn mount_handshake(server: &MockServer, login_status: u64) {
    Mock::given(method("GET"))
        .and(path("/server-info"))
        .respond_with(dmap_response(server_info()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .and(header("client-daap-version", "3.0"))
        .respond_with(dmap_response(login(login_status)))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn loads_library_snapshot() {
    let server = MockServer::start().await;
    mount_handshake(&server, 200).await;
    Mock::given(method("GET"))
        .and(path("/databases"))
        .and(query_param("session-id", "1337"))
        .respond_with(dmap_response(databases(&[1])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/databases/1/items"))
        .and(query_param("session-id", "1337"))
        .respond_with(dmap_response(songs()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let catalog = tokio::task::spawn_blocking(move || {
        let session = DaapSession::connect(&config).map_err(|e| e.to_string())?;
        assert_eq!(session.session_id(), 1337);
        Catalog::load(&session).map_err(|e| e.to_string())
    })
    .await
    .unwrap()
    .expect("catalog should load");

    assert_eq!(catalog.len(), 2);
    let first = &catalog.tracks()[0];
    assert_eq!(first.id, TrackId(41));
    assert_eq!(first.artist, "Daft Punk");
    assert_eq!(first.duration_seconds(), Some(320));
    assert_eq!(catalog.tracks()[1].album, "");

    let url = catalog.locator().url_for(first.id);
    assert_eq!(
        url.as_ref(),
        format!(
            "http://{}:{}/databases/1/items/41.mp3?session-id=1337",
            server.address().ip(),
            server.address().port()
        )
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn login_status_must_be_ok() {
    let server = MockServer::start().await;
    mount_handshake(&server, 503).await;

    let config = config_for(&server);
    let err = tokio::task::spawn_blocking(move || DaapSession::connect(&config).err())
        .await
        .unwrap()
        .expect("login should fail");
    assert!(matches!(err, DaapError::Status(503)));
}

#[tokio::test(flavor = "multi_thread")]
async fn password_protected_share_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/server-info"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = tokio::task::spawn_blocking(move || DaapSession::connect(&config).err())
        .await
        .unwrap()
        .expect("connect should fail");
    assert!(matches!(err, DaapError::Unauthorized(401)));
}

#[tokio::test(flavor = "multi_thread")]
async fn share_without_databases_has_no_library() {
    let server = MockServer::start().await;
    mount_handshake(&server, 200).await;
    Mock::given(method("GET"))
        .and(path("/databases"))
        .respond_with(dmap_response(databases(&[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let message = tokio::task::spawn_blocking(move || {
        let session = DaapSession::connect(&config).expect("handshake succeeds");
        Catalog::load(&session).err().map(|e| e.to_string())
    })
    .await
    .unwrap()
    .expect("load should fail");
    assert!(message.contains("library database"));
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_envelope_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/server-info"))
        .respond_with(dmap_response(login(200)))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = tokio::task::spawn_blocking(move || DaapSession::connect(&config).err())
        .await
        .unwrap()
        .expect("connect should fail");
    assert!(matches!(
        err,
        DaapError::UnexpectedResponse {
            expected: "msrv",
            ..
        }
    ));
}
