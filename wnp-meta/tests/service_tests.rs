//! Service clients against a local canned server and an unreachable address

mod helpers;

use helpers::{serve_canned, CannedRoute};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use wnp_meta::services::{AcoustIdClient, AcoustIdError, FingerprintLookup, MbError, MusicBrainzResolver};
use wnp_meta::RecordingResolver;

/// Nothing listens on port 1
const UNREACHABLE: &str = "http://127.0.0.1:1";

const RECORDING_JSON: &str = r#"{
    "id": "cd2e7c47-16f5-46c6-a37c-a1eb7bf599ff",
    "title": "Purple Rain",
    "artist-credit": [
        {"name": "Prince", "joinphrase": "", "artist": {"id": "070d193a", "name": "Prince"}}
    ],
    "releases": [{"id": "rel-1", "title": "Purple Rain", "date": "1984-06-25"}]
}"#;

const RELEASE_JSON: &str = r#"{
    "id": "rel-1",
    "title": "Purple Rain",
    "date": "1984-06-25",
    "label-info": [{"label": {"id": "l1", "name": "Warner Bros. Records"}}]
}"#;

const ISRC_JSON: &str = r#"{
    "isrc": "USWB19902946",
    "recordings": [{"id": "cd2e7c47-16f5-46c6-a37c-a1eb7bf599ff", "title": "Purple Rain"}]
}"#;

fn resolver(base_url: &str) -> MusicBrainzResolver {
    MusicBrainzResolver::new(Some("tests@example.org"))
        .unwrap()
        .with_base_url(base_url)
}

// ------------------------------------------------------------------------------------------------
// MusicBrainz
// ------------------------------------------------------------------------------------------------

#[tokio::test]
async fn test_resolver_unreachable_gives_none() {
    let resolver = resolver(UNREACHABLE);

    assert!(resolver.recordingid("cd2e7c47-16f5-46c6-a37c-a1eb7bf599ff").await.is_none());
    assert!(resolver.isrc("USWB19902946").await.is_none());
    assert!(matches!(
        resolver.lookup_recording("cd2e7c47").await,
        Err(MbError::NetworkError(_))
    ));
}

#[tokio::test]
async fn test_resolver_paces_requests_one_per_second() {
    let resolver = resolver(UNREACHABLE);
    let start = Instant::now();

    for _ in 0..3 {
        let _ = resolver.lookup_recording("cd2e7c47").await;
    }

    assert!(start.elapsed() >= Duration::from_millis(1800));
}

#[tokio::test]
async fn test_resolver_not_found_gives_none() {
    let (base_url, served) = serve_canned(Vec::new()).await;
    let resolver = resolver(&base_url);

    assert!(matches!(
        resolver.lookup_recording("missing").await,
        Err(MbError::NotFound(id)) if id == "missing"
    ));
    assert!(resolver.recordingid("missing").await.is_none());
    assert!(resolver.isrc("XXX000000000").await.is_none());
    assert_eq!(served.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_resolver_malformed_body_gives_none() {
    let (base_url, _) = serve_canned(vec![CannedRoute {
        prefix: "/recording/",
        status: 200,
        body: "<html>not json</html>",
    }])
    .await;
    let resolver = resolver(&base_url);

    assert!(matches!(
        resolver.lookup_recording("cd2e7c47").await,
        Err(MbError::ParseError(_))
    ));
    assert!(resolver.recordingid("cd2e7c47").await.is_none());
}

#[tokio::test]
async fn test_resolver_service_unavailable_is_rate_limit() {
    let (base_url, _) = serve_canned(vec![CannedRoute {
        prefix: "/recording/",
        status: 503,
        body: "{}",
    }])
    .await;

    assert!(matches!(
        resolver(&base_url).lookup_recording("cd2e7c47").await,
        Err(MbError::RateLimitExceeded)
    ));
}

#[tokio::test]
async fn test_resolver_recording_with_release_label() {
    let (base_url, served) = serve_canned(vec![
        CannedRoute {
            prefix: "/recording/",
            status: 200,
            body: RECORDING_JSON,
        },
        CannedRoute {
            prefix: "/release/",
            status: 200,
            body: RELEASE_JSON,
        },
    ])
    .await;

    let metadata = resolver(&base_url)
        .recordingid("cd2e7c47-16f5-46c6-a37c-a1eb7bf599ff")
        .await
        .unwrap();

    assert_eq!(metadata.get_text("title").as_deref(), Some("Purple Rain"));
    assert_eq!(metadata.get_text("artist").as_deref(), Some("Prince"));
    assert_eq!(metadata.get_text("label").as_deref(), Some("Warner Bros. Records"));
    assert_eq!(metadata.get_text("musicbrainzalbumid").as_deref(), Some("rel-1"));
    assert_eq!(served.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_resolver_missing_release_keeps_recording() {
    let (base_url, _) = serve_canned(vec![CannedRoute {
        prefix: "/recording/",
        status: 200,
        body: RECORDING_JSON,
    }])
    .await;

    let metadata = resolver(&base_url)
        .recordingid("cd2e7c47-16f5-46c6-a37c-a1eb7bf599ff")
        .await
        .unwrap();

    assert_eq!(metadata.get_text("album").as_deref(), Some("Purple Rain"));
    assert!(!metadata.contains("label"));
}

#[tokio::test]
async fn test_resolver_isrc_follows_first_recording() {
    let (base_url, _) = serve_canned(vec![
        CannedRoute {
            prefix: "/isrc/",
            status: 200,
            body: ISRC_JSON,
        },
        CannedRoute {
            prefix: "/recording/",
            status: 200,
            body: RECORDING_JSON,
        },
    ])
    .await;

    let metadata = resolver(&base_url).isrc("USWB19902946").await.unwrap();

    assert_eq!(
        metadata.get_text("musicbrainzrecordingid").as_deref(),
        Some("cd2e7c47-16f5-46c6-a37c-a1eb7bf599ff")
    );
}

// ------------------------------------------------------------------------------------------------
// AcoustID
// ------------------------------------------------------------------------------------------------

#[tokio::test]
async fn test_acoustid_unreachable_is_network_error() {
    let client = AcoustIdClient::new().unwrap().with_base_url(UNREACHABLE);

    let result = client.lookup("key", "AQAAfake", 200).await;

    assert!(matches!(result, Err(AcoustIdError::NetworkError(_))));
}

#[tokio::test]
async fn test_acoustid_error_status_with_garbage_body() {
    let (base_url, _) = serve_canned(vec![CannedRoute {
        prefix: "/",
        status: 500,
        body: "Internal Server Error",
    }])
    .await;
    let client = AcoustIdClient::new().unwrap().with_base_url(format!("{}/v2/lookup", base_url));

    let result = client.lookup("key", "AQAAfake", 200).await;

    assert!(matches!(result, Err(AcoustIdError::ApiError(500, _))));
}

#[tokio::test]
async fn test_acoustid_success_status_with_garbage_body() {
    let (base_url, _) = serve_canned(vec![CannedRoute {
        prefix: "/",
        status: 200,
        body: "{\"status\": ",
    }])
    .await;
    let client = AcoustIdClient::new().unwrap().with_base_url(base_url);

    let result = client.lookup("key", "AQAAfake", 200).await;

    assert!(matches!(result, Err(AcoustIdError::ParseError(_))));
}

#[tokio::test]
async fn test_acoustid_error_body_parsed_despite_status() {
    let (base_url, _) = serve_canned(vec![CannedRoute {
        prefix: "/",
        status: 429,
        body: r#"{"status": "error", "error": {"code": 14, "message": "rate limit (3 requests per second) exceeded"}}"#,
    }])
    .await;
    let client = AcoustIdClient::new().unwrap().with_base_url(base_url);

    let response = client.lookup("key", "AQAAfake", 200).await.unwrap();

    assert!(response.is_rate_limited());
    assert!(response.candidates().is_empty());
}
