//! Image retrieval and pass-through integration tests.
//!
//! Tests verify:
//! - Tile and region URLs carry the session and the cache flag
//! - Image bytes are passed through and counted
//! - Pass-through endpoints (files, forms, annotations, identity)

use bytes::Bytes;

use wsi_client::{
    Client, ClientConfig, ClientError, ImageFormat, RegionOptions, TileOptions, LOCAL_SESSION_ID,
};

use super::test_utils::{
    local_client, query_param, remote_client, MockTransport, REMOTE_TOKEN, REMOTE_URL,
};

// =============================================================================
// URLs
// =============================================================================

#[tokio::test]
async fn test_tile_url() {
    let (client, _transport) = remote_client().await;

    let url = client
        .tile_url("/Reference/a b.svs", 3, 7, 12, &TileOptions::default(), None)
        .await
        .unwrap();

    assert!(url.starts_with("https://core.example.com/core/tile?SessionID=SESSION-1&"));
    assert_eq!(query_param(&url, "pathOrUid").as_deref(), Some("Reference/a b.svs"));
    assert_eq!(query_param(&url, "x").as_deref(), Some("3"));
    assert_eq!(query_param(&url, "y").as_deref(), Some("7"));
    assert_eq!(query_param(&url, "z").as_deref(), Some("12"));
    assert_eq!(query_param(&url, "format").as_deref(), Some("jpg"));
    assert_eq!(query_param(&url, "quality").as_deref(), Some("100"));
    assert!(url.ends_with("&cache=true"));
}

#[tokio::test]
async fn test_tile_url_without_tile_cache() {
    let transport = MockTransport::new();
    transport.on("IsLite", "true").await;
    let client = Client::with_config(transport, ClientConfig::default().with_tile_cache(false));

    let options = TileOptions {
        format: ImageFormat::Png,
        quality: 80,
        z_stack: 2,
    };
    let url = client.tile_url("a.svs", 0, 0, 8, &options, None).await.unwrap();

    assert!(url.starts_with("http://localhost:54001/tile?SessionID=SDK.Rust&"));
    assert_eq!(query_param(&url, "format").as_deref(), Some("png"));
    assert_eq!(query_param(&url, "quality").as_deref(), Some("80"));
    assert_eq!(query_param(&url, "layer").as_deref(), Some("2"));
    assert!(url.ends_with("&cache=false"));
}

#[tokio::test]
async fn test_invalid_quality_is_rejected() {
    let (client, transport) = remote_client().await;
    let options = TileOptions {
        quality: 101,
        ..Default::default()
    };

    let err = client
        .tile("a.svs", 0, 0, 8, &options, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));

    let region = RegionOptions {
        quality: 200,
        ..Default::default()
    };
    assert!(client.region_url("a.svs", &region, None).await.is_err());
    assert!(transport.requests().await.is_empty());
}

#[tokio::test]
async fn test_region_url() {
    let (client, _transport) = remote_client().await;
    let options = RegionOptions {
        x: 1000,
        y: 2000,
        width: 512,
        height: 256,
        gamma: vec!["1.0".to_string(), "0.8".to_string()],
        ..Default::default()
    };

    let url = client.region_url("a.svs", &options, None).await.unwrap();

    assert!(url.starts_with("https://core.example.com/core/region?SessionID=SESSION-1&"));
    assert_eq!(query_param(&url, "width").as_deref(), Some("512"));
    assert_eq!(query_param(&url, "dpi").as_deref(), Some("300"));
    assert_eq!(query_param(&url, "gamma").as_deref(), Some("1.0,0.8"));
    assert!(url.ends_with("&cache=true"));
}

#[tokio::test]
async fn test_thumbnail_and_label_urls() {
    let (client, _transport) = remote_client().await;

    let url = client
        .thumbnail_url("a.svs", Some(200), None, None)
        .await
        .unwrap();
    assert_eq!(
        url,
        "https://core.example.com/core/thumbnail?SessionID=SESSION-1&pathOrUid=a.svs&h=200"
    );

    let url = client.thumbnail_url("a.svs", Some(0), Some(0), None).await.unwrap();
    assert_eq!(query_param(&url, "h"), None);
    assert_eq!(query_param(&url, "w"), None);

    let barcode = client.barcode_url("/a.svs", None).await.unwrap();
    let label = client.label_url("a.svs", None).await.unwrap();
    assert_eq!(barcode, label);
    assert_eq!(
        barcode,
        "https://core.example.com/core/barcode?SessionID=SESSION-1&pathOrUid=a.svs"
    );
}

// =============================================================================
// Image Bytes
// =============================================================================

#[tokio::test]
async fn test_tile_bytes_are_counted() {
    let (client, transport) = remote_client().await;
    let jpeg: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];
    transport
        .on("tile", String::from_utf8_lossy(jpeg).into_owned())
        .await;

    let before = client.downloaded_bytes(None).await.unwrap();
    let tile = client
        .tile("a.svs", 0, 0, 8, &TileOptions::default(), None)
        .await
        .unwrap();
    let after = client.downloaded_bytes(None).await.unwrap();

    assert!(!tile.is_empty());
    assert_eq!(after - before, tile.len() as u64);
}

#[tokio::test]
async fn test_tiles_rectangle_row_major() {
    let (client, transport) = remote_client().await;
    transport.on("tile", "TILE").await;

    let tiles = client
        .tiles("a.svs", (2, 5), (3, 6), 10, &TileOptions::default(), None)
        .await
        .unwrap();

    let coords: Vec<(u64, u64)> = tiles.iter().map(|(xy, _)| *xy).collect();
    assert_eq!(coords, vec![(2, 5), (3, 5), (2, 6), (3, 6)]);
    assert!(tiles.iter().all(|(_, bytes)| bytes == &Bytes::from_static(b"TILE")));
    assert_eq!(transport.count("tile").await, 4);
}

#[tokio::test]
async fn test_tiles_empty_rectangle() {
    let (client, transport) = remote_client().await;

    let err = client
        .tiles("a.svs", (3, 0), (2, 0), 10, &TileOptions::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
    assert_eq!(transport.count("tile").await, 0);
}

#[tokio::test]
async fn test_thumbnail_and_label_bytes() {
    let (client, transport) = remote_client().await;
    transport.on("thumbnail", "THUMB").await;
    transport.on("barcode", "LABEL").await;

    let thumb = client.thumbnail("a.svs", None, None, None).await.unwrap();
    assert_eq!(thumb, Bytes::from_static(b"THUMB"));

    let label = client.label("a.svs", None).await.unwrap();
    assert_eq!(label, Bytes::from_static(b"LABEL"));
}

#[tokio::test]
async fn test_barcode_text() {
    let (client, transport) = remote_client().await;
    transport.on_path("GetBarcodeText", "a.svs", r#""LOT-42""#).await;
    transport.on_path("GetBarcodeText", "b.svs", r#""""#).await;

    assert_eq!(
        client.barcode_text("a.svs", None).await.unwrap().as_deref(),
        Some("LOT-42")
    );
    assert_eq!(client.barcode_text("b.svs", None).await.unwrap(), None);
}

// =============================================================================
// Identity and Search
// =============================================================================

#[tokio::test]
async fn test_uid_and_fingerprint() {
    let (client, transport) = remote_client().await;
    transport.on_path("GetUID", "a.svs", r#""UID-A""#).await;
    transport
        .on_path("GetFingerprint", "a.svs", r#"{"d": "f00dcafe"}"#)
        .await;

    assert_eq!(client.uid("/a.svs", None).await.unwrap(), "UID-A");
    assert_eq!(client.fingerprint("a.svs", None).await.unwrap(), "f00dcafe");
}

#[tokio::test]
async fn test_search_slides() {
    let (client, transport) = remote_client().await;
    transport
        .on_path("Filename", "Reference", r#"["Reference/a.svs", "Reference/Sub1/b.svs"]"#)
        .await;

    let found = client
        .search_slides("/Reference", "*.svs", None)
        .await
        .unwrap();
    assert_eq!(found, vec!["Reference/a.svs", "Reference/Sub1/b.svs"]);

    let url = &transport.urls_for("Filename").await[0];
    assert!(url.starts_with(&format!("{}query/json/Filename?", REMOTE_URL)));
    assert_eq!(query_param(url, "pattern").as_deref(), Some("*.svs"));
}

// =============================================================================
// Pass-through
// =============================================================================

#[tokio::test]
async fn test_files_for_slide_remote() {
    let (client, transport) = remote_client().await;
    transport
        .on_path(
            "GetFilenames",
            "a.mrxs",
            r#"[
                {"Path": "a.mrxs", "Size": 1024, "LastModified": "/Date(1533139237000)/"},
                {"Path": "a/Data0000.dat", "Size": "2048"}
            ]"#,
        )
        .await;

    let files = client.files_for_slide("a.mrxs", None).await.unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].path, "a.mrxs");
    assert_eq!(files[0].size, 1024);
    assert_eq!(files[0].last_modified.as_deref(), Some("/Date(1533139237000)/"));
    assert_eq!(files[1].size, 2048);
    assert_eq!(files[1].last_modified, None);
    assert_eq!(transport.count("EnumerateAllFilesForSlide").await, 0);
}

#[tokio::test]
async fn test_files_for_slide_local() {
    let (client, transport) = local_client().await;
    transport
        .on_path(
            "EnumerateAllFilesForSlide",
            "a.mrxs",
            r#"["a.mrxs", "a/Slidedat.ini"]"#,
        )
        .await;

    let files = client.files_for_slide("a.mrxs", None).await.unwrap();

    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["a.mrxs", "a/Slidedat.ini"]);
    assert!(files.iter().all(|f| f.size == 0));

    let url = &transport.urls_for("EnumerateAllFilesForSlide").await[0];
    assert_eq!(query_param(url, "sessionID").as_deref(), Some(LOCAL_SESSION_ID));
}

#[tokio::test]
async fn test_available_forms() {
    let (client, transport) = remote_client().await;
    transport
        .on(
            "GetForms",
            r#"[{"Key": 7, "Value": "Scoring"}, {"Key": "12", "Value": "Review"}]"#,
        )
        .await;

    let forms = client.available_forms(None, None).await.unwrap();
    assert_eq!(forms.len(), 2);
    assert_eq!(forms["7"], "Scoring");
    assert_eq!(forms["12"], "Review");

    let url = &transport.urls_for("GetForms").await[0];
    assert_eq!(query_param(url, "path"), None);

    client.available_forms(Some("/Reference"), None).await.unwrap();
    let url = &transport.urls_for("GetForms").await[1];
    assert_eq!(query_param(url, "path").as_deref(), Some("Reference"));
}

#[tokio::test]
async fn test_annotations_and_form_data() {
    let (client, transport) = remote_client().await;
    transport
        .on_path("GetAnnotations", "a.svs", r#"[{"Id": 1}, {"Id": 2}]"#)
        .await;
    transport
        .on_path("GetFormSubmissions", "a.svs", r#"[{"FormID": 7}]"#)
        .await;

    let annotations = client.annotations("a.svs", None).await.unwrap();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[1]["Id"], 2);

    let submissions = client.submitted_form_data("a.svs", None).await.unwrap();
    assert_eq!(submissions.len(), 1);

    let url = &transport.urls_for("GetFormSubmissions").await[0];
    assert_eq!(query_param(url, "sessionID").as_deref(), Some(REMOTE_TOKEN));
}

#[tokio::test]
async fn test_submitted_forms_resolve_names() {
    let (client, transport) = remote_client().await;
    transport
        .on(
            "GetForms",
            r#"[{"Key": 7, "Value": "Scoring"}, {"Key": 12, "Value": "Review"}]"#,
        )
        .await;
    transport
        .on_path(
            "GetFormSubmissions",
            "a.svs",
            r#"[{"FormID": 7}, {"FormID": 7}, {"FormID": "12"}, {"FormID": 99}]"#,
        )
        .await;

    let forms = client.submitted_forms("/a.svs", None).await.unwrap();

    assert_eq!(forms.len(), 2);
    assert_eq!(forms["7"], "Scoring");
    assert_eq!(forms["12"], "Review");
    assert_eq!(transport.count("GetForms").await, 1);
}
