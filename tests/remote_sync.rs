use comicat::error::Error;
use comicat::{Catalog, CatalogSource, RemoteClient, RemoteConfig, SearchEngine, Synchronizer};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use tiny_http::{Header, Response, Server};

type Routes = Arc<Mutex<HashMap<String, (u16, String)>>>;

/// Local stand-in for the remote catalog. Unknown paths answer 404.
struct FakeRemote {
    routes: Routes,
    base: String,
}

impl FakeRemote {
    fn start() -> Self {
        let server = Server::http("127.0.0.1:0").expect("cannot bind fake remote");
        let base = format!("http://{}", server.server_addr());
        let routes: Routes = Arc::new(Mutex::new(HashMap::new()));

        let served = Arc::clone(&routes);
        thread::spawn(move || {
            for request in server.incoming_requests() {
                let (status, body) = served
                    .lock()
                    .unwrap()
                    .get(request.url())
                    .cloned()
                    .unwrap_or_else(|| (404, String::from("{}")));
                let response = Response::from_string(body)
                    .with_status_code(status)
                    .with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap(),
                    );
                let _ = request.respond(response);
            }
        });

        Self { routes, base }
    }

    fn route(&self, path: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_owned(), (status, body.into()));
    }

    fn client(&self) -> RemoteClient {
        RemoteClient::new(
            RemoteConfig::new(
                &format!("{}/api", self.base),
                "https://static.example.com",
            )
            .unwrap(),
        )
    }
}

fn listing_entry(id: i32, name: &str, pages: u32) -> String {
    format!(
        r#"{{"id": {}, "name": "{}", "cat": "MF", "tag": "Furry", "artist": "Reynard",
            "updated": "2021-03-04T05:06:07.000Z", "state": "finished",
            "created": "2019-01-02T03:04:05.000Z", "numberOfPages": {}}}"#,
        id, name, pages
    )
}

fn detail(id: i32, name: &str, pages: u32, keywords: &[&str]) -> String {
    format!(
        r#"{{"id": {}, "name": "{}", "numberOfPages": {}, "artist": "Reynard", "cat": "MF",
            "tag": "Furry", "created": "2019-01-02T03:04:05.000Z",
            "updated": "2021-03-04T05:06:07.000Z", "userRating": 8.25, "keywords": {}}}"#,
        id,
        name,
        pages,
        serde_json::to_string(keywords).unwrap()
    )
}

#[test]
fn client_decodes_listing_and_detail() {
    let remote = FakeRemote::start();
    remote.route(
        "/api/all-comics",
        200,
        format!("[{}]", listing_entry(1, "Fox Tales", 3)),
    );
    remote.route(
        "/api/comics/Fox%20Tales",
        200,
        detail(1, "Fox Tales", 3, &["feral"]),
    );
    let client = remote.client();

    let listing = client.list_all().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "Fox Tales");
    assert_eq!(listing[0].number_of_pages, 3);

    let found = client.get_detail("Fox Tales").unwrap();
    assert_eq!(found.user_rating, Some(8.25));
    assert_eq!(found.keywords, vec!["feral"]);
}

#[test]
fn client_maps_failures_to_error_kinds() {
    let remote = FakeRemote::start();
    remote.route("/api/all-comics", 503, "unavailable");
    remote.route("/api/comics/Broken", 200, r#"{"id": 3, "name": "Broken"}"#);
    let client = remote.client();

    assert!(matches!(
        client.list_all(),
        Err(Error::RemoteUnavailable(_))
    ));
    assert!(matches!(
        client.get_detail("Missing"),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        client.get_detail("Broken"),
        Err(Error::MalformedRecord(_))
    ));
}

#[test]
fn missing_listing_is_unavailable_not_missing_comic() {
    let remote = FakeRemote::start();
    let client = remote.client();

    assert!(matches!(
        client.list_all(),
        Err(Error::RemoteUnavailable(_))
    ));

    let mut catalog = Catalog::in_memory().unwrap();
    let err = Synchronizer::new(client).run(&mut catalog).unwrap_err();
    assert!(matches!(err, Error::RemoteUnavailable(_)));
    assert_eq!(catalog.count_comics().unwrap(), 0);
}

#[test]
fn failing_detail_requests_skip_only_their_comic() {
    let remote = FakeRemote::start();
    remote.route(
        "/api/all-comics",
        200,
        format!(
            "[{}, {}, {}]",
            listing_entry(1, "Fox Tales", 3),
            listing_entry(2, "Bear Run", 1),
            listing_entry(3, "Lynx Dream", 2)
        ),
    );
    remote.route("/api/comics/Fox%20Tales", 503, "busy");
    remote.route("/api/comics/Bear%20Run", 200, "not json");
    remote.route(
        "/api/comics/Lynx%20Dream",
        200,
        detail(3, "Lynx Dream", 2, &["night"]),
    );
    let mut catalog = Catalog::in_memory().unwrap();

    let report = Synchronizer::new(remote.client())
        .run(&mut catalog)
        .unwrap();

    assert_eq!(report.examined, 3);
    assert_eq!(
        report
            .skipped
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>(),
        vec!["Fox Tales", "Bear Run"]
    );
    assert_eq!(report.updated.len(), 1);
    assert_eq!(report.updated[0].name, "Lynx Dream");
    assert!(catalog.get_by_name("Fox Tales").unwrap().is_none());
    assert_eq!(catalog.page_count("Lynx Dream").unwrap(), 2);
}

#[test]
fn sync_mirrors_remote_and_tracks_growth() {
    let remote = FakeRemote::start();
    remote.route(
        "/api/all-comics",
        200,
        format!(
            "[{}, {}]",
            listing_entry(1, "Fox Tales", 3),
            listing_entry(2, "Lynx Dream", 2)
        ),
    );
    remote.route(
        "/api/comics/Fox%20Tales",
        200,
        detail(1, "Fox Tales", 3, &["feral", "forest"]),
    );
    let mut catalog = Catalog::in_memory().unwrap();
    let sync = Synchronizer::new(remote.client());

    // Lynx Dream has no detail yet and is skipped
    let report = sync.run(&mut catalog).unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.updated.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "Lynx Dream");

    let search = SearchEngine::new(&catalog);
    let found = search.by_name("Foks", 10).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].pages[0].url,
        "https://static.example.com/comics/Fox%20Tales/001.jpg"
    );
    assert_eq!(
        search.by_keywords(&["feral".to_owned()], 10).unwrap().len(),
        1
    );

    remote.route(
        "/api/all-comics",
        200,
        format!(
            "[{}, {}]",
            listing_entry(1, "Fox Tales", 6),
            listing_entry(2, "Lynx Dream", 2)
        ),
    );
    remote.route(
        "/api/comics/Lynx%20Dream",
        200,
        detail(2, "Lynx Dream", 2, &["night"]),
    );
    let report = sync.run(&mut catalog).unwrap();
    assert_eq!(report.updated.len(), 2);
    assert!(report.skipped.is_empty());
    assert_eq!(catalog.page_count("Fox Tales").unwrap(), 6);
    assert_eq!(catalog.page_count("Lynx Dream").unwrap(), 2);

    let before = catalog.stats().unwrap();
    let report = sync.run(&mut catalog).unwrap();
    assert!(report.updated.is_empty());
    assert_eq!(catalog.stats().unwrap(), before);
}

#[test]
fn unavailable_listing_aborts_cycle() {
    let remote = FakeRemote::start();
    remote.route("/api/all-comics", 500, "boom");
    let mut catalog = Catalog::in_memory().unwrap();

    let err = Synchronizer::new(remote.client())
        .run(&mut catalog)
        .unwrap_err();
    assert!(matches!(err, Error::RemoteUnavailable(_)));
    assert_eq!(catalog.count_comics().unwrap(), 0);
}
