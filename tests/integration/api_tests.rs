//! API integration tests for tile serving.
//!
//! Tests verify:
//! - Tile retrieval returns the exact stored bytes
//! - Malformed paths, absent tiles and store failures all map to 404
//! - Prefix routing, headers and the health endpoint

use axum::http::StatusCode;

use mbtiles_server::tileset::{Reader, TileData};
use mbtiles_server::{create_router, RouterConfig};

use super::test_utils::{body_bytes, get, TestArchive};

fn router_for(archive: &TestArchive, prefix: &str) -> axum::Router {
    let reader = Reader::open(&archive.path).unwrap();
    create_router(reader, RouterConfig::new(prefix).with_tracing(false))
}

// =============================================================================
// Basic Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_retrieval_success() {
    let archive = TestArchive::single_tile();
    let router = router_for(&archive, "");

    let response = get(&router, "/0/0/0").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("cache-control"));
    assert_eq!(body_bytes(response).await, vec![0x00]);
}

#[tokio::test]
async fn test_tile_bytes_are_not_transformed() {
    // gzip magic followed by arbitrary payload
    let payload = vec![0x1f, 0x8b, 0x08, 0x00, 0xde, 0xad, 0xbe, 0xef];
    let archive = TestArchive::new(
        "vector.mbtiles",
        &[TileData::new(6, 1, 5, payload.clone())],
        &[("format", "pbf")],
    );
    let router = router_for(&archive, "");

    let response = get(&router, "/6/1/5").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/x-protobuf"
    );
    assert!(response.headers().get("content-encoding").is_none());
    assert_eq!(body_bytes(response).await, payload);
}

#[tokio::test]
async fn test_content_type_from_format_metadata() {
    let archive = TestArchive::new(
        "raster.mbtiles",
        &[TileData::new(0, 0, 0, vec![0x89, 0x50, 0x4e, 0x47])],
        &[("format", "png")],
    );
    let router = router_for(&archive, "");

    let response = get(&router, "/0/0/0").await;
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
}

#[tokio::test]
async fn test_no_content_type_without_format() {
    let archive = TestArchive::single_tile();
    let router = router_for(&archive, "");

    let response = get(&router, "/0/0/0").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("content-type").is_none());
}

#[tokio::test]
async fn test_cache_max_age_header() {
    let archive = TestArchive::single_tile();
    let reader = Reader::open(&archive.path).unwrap();
    let router = create_router(
        reader,
        RouterConfig::new("")
            .with_cache_max_age(60)
            .with_tracing(false),
    );

    let response = get(&router, "/0/0/0").await;
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=60"
    );
}

// =============================================================================
// Not Found Handling
// =============================================================================

#[tokio::test]
async fn test_non_numeric_path_not_found() {
    let archive = TestArchive::single_tile();
    let router = router_for(&archive, "");

    let response = get(&router, "/abc/def/ghi").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_absent_tile_not_found() {
    let archive = TestArchive::single_tile();
    let router = router_for(&archive, "");

    let response = get(&router, "/99/99/99").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&router, "/1/0/0").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tile_with_extension_not_found() {
    let archive = TestArchive::single_tile();
    let router = router_for(&archive, "");

    let response = get(&router, "/0/0/0.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_undecodable_segment_not_found() {
    let archive = TestArchive::single_tile();
    let router = router_for(&archive, "");

    // %FF decodes to a byte that is not valid UTF-8.
    assert_eq!(get(&router, "/%FF/0/0").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/0/0/%FF").await.status(), StatusCode::NOT_FOUND);

    // Percent-encoded digits decode to a valid path.
    assert_eq!(get(&router, "/%30/0/0").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_segment_count_not_found() {
    let archive = TestArchive::single_tile();
    let router = router_for(&archive, "");

    assert_eq!(get(&router, "/0/0").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/0/0/0/0").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_failure_reported_as_not_found() {
    // A valid SQLite file without a tiles table: the lookup cannot be prepared.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.mbtiles");
    archive_without_tiles(&path);

    let reader = Reader::open(&path).unwrap();
    let router = create_router(reader, RouterConfig::new("").with_tracing(false));

    let response = get(&router, "/0/0/0").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn archive_without_tiles(path: &std::path::Path) {
    let mut writer = mbtiles_server::tileset::Writer::open(path).unwrap();
    writer.ensure_metadata_schema().unwrap();
    writer.close().unwrap();
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_tiles_served_under_prefix() {
    let archive = TestArchive::single_tile();
    let router = router_for(&archive, "single.mbtiles");

    let response = get(&router, "/single.mbtiles/0/0/0").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, vec![0x00]);

    let response = get(&router, "/0/0/0").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&router, "/other.mbtiles/0/0/0").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let archive = TestArchive::single_tile();
    let router = router_for(&archive, "tiles");

    let response = get(&router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_concurrent_requests_share_reader() {
    let tiles: Vec<_> = (0..8u32)
        .map(|x| TileData::new(3, x, 2, vec![x as u8; 4]))
        .collect();
    let archive = TestArchive::new("grid.mbtiles", &tiles, &[]);
    let router = router_for(&archive, "");

    let handles: Vec<_> = (0..8u32)
        .map(|x| {
            let router = router.clone();
            tokio::spawn(async move {
                let response = get(&router, &format!("/3/{}/2", x)).await;
                assert_eq!(response.status(), StatusCode::OK);
                (x, body_bytes(response).await)
            })
        })
        .collect();

    for handle in handles {
        let (x, body) = handle.await.unwrap();
        assert_eq!(body, vec![x as u8; 4]);
    }
}
