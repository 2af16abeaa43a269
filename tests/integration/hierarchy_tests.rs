//! Directory tree walking integration tests.
//!
//! The mocked tree:
//!
//! ```text
//! Reference/            r.svs
//! ├── Sub1/             s1.svs
//! │   └── Deep/         d.svs
//! │       └── Deeper/
//! └── Sub2/
//! ```

use wsi_client::{ClientError, Depth};

use super::test_utils::{query_param, remote_client, string_list, MockTransport};

async fn install_tree(transport: &MockTransport) {
    transport
        .on("GetRootDirectories", string_list(&["Reference", "Projects"]))
        .await;

    let dirs: &[(&str, &[&str])] = &[
        ("Reference", &["Reference/Sub1", "Reference/Sub2"]),
        ("Reference/Sub1", &["Reference/Sub1/Deep"]),
        ("Reference/Sub2", &[]),
        ("Reference/Sub1/Deep", &["Reference/Sub1/Deep/Deeper"]),
        ("Reference/Sub1/Deep/Deeper", &[]),
    ];
    for (path, children) in dirs {
        transport
            .on_path("GetDirectories", path, string_list(children))
            .await;
    }

    let files: &[(&str, &[&str])] = &[
        ("Reference", &["Reference/r.svs"]),
        ("Reference/Sub1", &["Reference/Sub1/s1.svs"]),
        ("Reference/Sub2", &[]),
        ("Reference/Sub1/Deep", &["Reference/Sub1/Deep/d.svs"]),
        ("Reference/Sub1/Deep/Deeper", &[]),
    ];
    for (path, slides) in files {
        transport.on_path("GetFiles", path, string_list(slides)).await;
    }
}

// =============================================================================
// Root Directories
// =============================================================================

#[tokio::test]
async fn test_root_directories() {
    let (client, transport) = remote_client().await;
    install_tree(&transport).await;

    let roots = client.root_directories(None).await.unwrap();
    assert_eq!(roots, vec!["Reference", "Projects"]);

    let url = &transport.urls_for("GetRootDirectories").await[0];
    assert_eq!(
        url,
        "https://core.example.com/core/api/json/GetRootDirectories?sessionID=SESSION-1"
    );
}

#[tokio::test]
async fn test_listing_error_mentions_case_sensitivity() {
    let (client, transport) = remote_client().await;
    transport
        .on_path(
            "GetDirectories",
            "reference",
            r#"{"Code": 404, "Message": "Directory not found"}"#,
        )
        .await;

    let err = client
        .directories("reference", Depth::None, None)
        .await
        .unwrap_err();
    match err {
        ClientError::Server { context, message } => {
            assert!(context.contains("case sensitive"));
            assert_eq!(message, "Directory not found");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

// =============================================================================
// Directories
// =============================================================================

#[tokio::test]
async fn test_directories_without_depth() {
    let (client, transport) = remote_client().await;
    install_tree(&transport).await;

    let dirs = client.directories("/Reference", Depth::None, None).await.unwrap();
    assert_eq!(dirs, vec!["Reference/Sub1", "Reference/Sub2"]);
    assert_eq!(transport.count("GetDirectories").await, 1);

    let url = &transport.urls_for("GetDirectories").await[0];
    assert_eq!(query_param(url, "path").as_deref(), Some("Reference"));
    assert_eq!(query_param(url, "sessionID").as_deref(), Some("SESSION-1"));
}

#[tokio::test]
async fn test_directories_one_level_deep() {
    let (client, transport) = remote_client().await;
    install_tree(&transport).await;

    let dirs = client
        .directories("Reference", Depth::Levels(1), None)
        .await
        .unwrap();
    assert_eq!(
        dirs,
        vec!["Reference/Sub1", "Reference/Sub2", "Reference/Sub1/Deep"]
    );
    assert_eq!(transport.count("GetDirectories").await, 3);
}

#[tokio::test]
async fn test_directories_unlimited() {
    let (client, transport) = remote_client().await;
    install_tree(&transport).await;

    let dirs = client
        .directories("Reference", Depth::Unlimited, None)
        .await
        .unwrap();
    assert_eq!(
        dirs,
        vec![
            "Reference/Sub1",
            "Reference/Sub2",
            "Reference/Sub1/Deep",
            "Reference/Sub1/Deep/Deeper",
        ]
    );
    assert_eq!(transport.count("GetFiles").await, 0);
}

#[tokio::test]
async fn test_directories_failure_below_start_propagates() {
    let (client, transport) = remote_client().await;
    install_tree(&transport).await;
    transport.fail("GetDirectories", Some("Reference/Sub2")).await;

    let err = client
        .directories("Reference", Depth::Unlimited, None)
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

// =============================================================================
// Slides
// =============================================================================

#[tokio::test]
async fn test_slides_without_depth() {
    let (client, transport) = remote_client().await;
    install_tree(&transport).await;

    let slides = client.slides("Reference", Depth::None, None).await.unwrap();
    assert_eq!(slides, vec!["Reference/r.svs"]);

    let slides = client.slides("Reference", Depth::Levels(0), None).await.unwrap();
    assert_eq!(slides, vec!["Reference/r.svs"]);

    assert_eq!(transport.count("GetDirectories").await, 0);
}

#[tokio::test]
async fn test_slides_one_level_deep() {
    let (client, transport) = remote_client().await;
    install_tree(&transport).await;

    let slides = client
        .slides("Reference", Depth::Levels(1), None)
        .await
        .unwrap();
    assert_eq!(slides, vec!["Reference/r.svs", "Reference/Sub1/s1.svs"]);
}

#[tokio::test]
async fn test_slides_unlimited_in_depth_first_order() {
    let (client, transport) = remote_client().await;
    install_tree(&transport).await;

    let slides = client
        .slides("Reference", Depth::Unlimited, None)
        .await
        .unwrap();
    assert_eq!(
        slides,
        vec![
            "Reference/r.svs",
            "Reference/Sub1/s1.svs",
            "Reference/Sub1/Deep/d.svs",
        ]
    );
}

// =============================================================================
// First Non-Empty Directory
// =============================================================================

#[tokio::test]
async fn test_first_non_empty_directory_depth_first() {
    let (client, transport) = remote_client().await;
    transport.on("GetRootDirectories", string_list(&["A", "B"])).await;
    transport.on_path("GetFiles", "A", "[]").await;
    transport
        .on_path("GetDirectories", "A", string_list(&["A/A1"]))
        .await;
    transport
        .on_path("GetFiles", "A/A1", string_list(&["A/A1/x.svs"]))
        .await;
    transport
        .on_path("GetFiles", "B", string_list(&["B/y.svs"]))
        .await;

    let found = client.first_non_empty_directory(None, None).await.unwrap();
    assert_eq!(found.as_deref(), Some("A/A1"));

    let examined: Vec<_> = transport
        .urls_for("GetFiles")
        .await
        .iter()
        .filter_map(|url| query_param(url, "path"))
        .collect();
    assert_eq!(examined, vec!["A", "A/A1"]);
}

#[tokio::test]
async fn test_first_non_empty_directory_passes_empty_leaf() {
    let (client, transport) = remote_client().await;
    transport.on("GetRootDirectories", string_list(&["A", "B"])).await;
    transport.on_path("GetFiles", "A", "[]").await;
    transport.on_path("GetDirectories", "A", "[]").await;
    transport
        .on_path("GetFiles", "B", string_list(&["B/only.svs"]))
        .await;

    let found = client.first_non_empty_directory(None, None).await.unwrap();
    assert_eq!(found.as_deref(), Some("B"));
}

#[tokio::test]
async fn test_first_non_empty_directory_skips_failing_branch() {
    let (client, transport) = remote_client().await;
    transport.on("GetRootDirectories", string_list(&["A", "B"])).await;
    transport.fail("GetFiles", Some("A")).await;
    transport.fail("GetDirectories", Some("A")).await;
    transport
        .on_path("GetFiles", "B", string_list(&["B/y.svs"]))
        .await;

    let found = client.first_non_empty_directory(None, None).await.unwrap();
    assert_eq!(found.as_deref(), Some("B"));
}

#[tokio::test]
async fn test_first_non_empty_directory_descends_below_failed_slide_listing() {
    let (client, transport) = remote_client().await;
    transport.on("GetRootDirectories", string_list(&["A", "B"])).await;
    transport.fail("GetFiles", Some("A")).await;
    transport
        .on_path("GetDirectories", "A", string_list(&["A/A1"]))
        .await;
    transport
        .on_path("GetFiles", "A/A1", string_list(&["A/A1/x.svs"]))
        .await;
    transport
        .on_path("GetFiles", "B", string_list(&["B/y.svs"]))
        .await;

    let found = client.first_non_empty_directory(None, None).await.unwrap();
    assert_eq!(found.as_deref(), Some("A/A1"));
}

#[tokio::test]
async fn test_first_non_empty_directory_from_start_with_slides() {
    let (client, transport) = remote_client().await;
    install_tree(&transport).await;

    let found = client
        .first_non_empty_directory(Some("Reference"), None)
        .await
        .unwrap();
    assert_eq!(found.as_deref(), Some("Reference"));
    assert_eq!(transport.count("GetRootDirectories").await, 0);
}

#[tokio::test]
async fn test_first_non_empty_directory_below_start() {
    let (client, transport) = remote_client().await;
    install_tree(&transport).await;

    let found = client
        .first_non_empty_directory(Some("Reference/Sub2"), None)
        .await
        .unwrap();
    assert_eq!(found, None);

    let found = client
        .first_non_empty_directory(Some("Reference/Sub1/Deep/Deeper"), None)
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_first_non_empty_directory_failed_start_is_empty() {
    let (client, transport) = remote_client().await;
    transport.fail("GetFiles", Some("S")).await;
    transport
        .on_path("GetDirectories", "S", string_list(&["S/T"]))
        .await;
    transport
        .on_path("GetFiles", "S/T", string_list(&["S/T/z.svs"]))
        .await;

    let found = client
        .first_non_empty_directory(Some("S"), None)
        .await
        .unwrap();
    assert_eq!(found.as_deref(), Some("S/T"));

    transport.fail("GetFiles", Some("Missing")).await;
    transport.fail("GetDirectories", Some("Missing")).await;
    let found = client
        .first_non_empty_directory(Some("Missing"), None)
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_first_non_empty_directory_root_failure_propagates() {
    let (client, transport) = remote_client().await;
    transport.fail("GetRootDirectories", None).await;

    let err = client
        .first_non_empty_directory(None, None)
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_first_non_empty_directory_without_slides() {
    let (client, transport) = remote_client().await;
    transport.on("GetRootDirectories", string_list(&["Empty"])).await;
    transport.on_path("GetFiles", "Empty", "[]").await;
    transport.on_path("GetDirectories", "Empty", "[]").await;

    let found = client.first_non_empty_directory(Some("/"), None).await.unwrap();
    assert_eq!(found, None);
}
