//! Storage integration tests against on-disk archives.
//!
//! Tests verify:
//! - Tiles and metadata written by one handle are visible to another
//! - Bulk inserts are all-or-nothing across handles
//! - Read-only handles reject writes

use mbtiles_server::tileset::{
    MetadataJson, Reader, StatementKind, TileData, Tileset, VectorLayer, Writer,
};
use mbtiles_server::TilesetError;

use super::test_utils::TestArchive;

#[test]
fn test_single_tile_scenario() {
    let archive = TestArchive::single_tile();
    let reader = Reader::open(&archive.path).unwrap();

    assert_eq!(reader.select_tile(0, 0, 0).unwrap(), vec![0x00]);
    assert!(matches!(
        reader.select_tile(1, 0, 0),
        Err(TilesetError::TileNotFound { z: 1, x: 0, y: 0 })
    ));
    assert_eq!(reader.select_metadata("name").unwrap(), "single");
    reader.close().unwrap();
}

#[test]
fn test_bulk_insert_visible_to_new_reader() {
    let archive = TestArchive::new(
        "bulk.mbtiles",
        &[
            TileData::new(0, 0, 0, vec![0x00]),
            TileData::new(6, 1, 5, vec![0, 1, 2, 3, 4, 5]),
        ],
        &[],
    );

    let reader = Reader::open(&archive.path).unwrap();
    assert_eq!(reader.select_tile(0, 0, 0).unwrap(), vec![0x00]);
    assert_eq!(reader.select_tile(6, 1, 5).unwrap(), vec![0, 1, 2, 3, 4, 5]);
    assert!(reader.select_tile(6, 1, 58).unwrap_err().is_not_found());
}

#[test]
fn test_rows_stored_bottom_origin() {
    let archive = TestArchive::new(
        "rows.mbtiles",
        &[TileData::new(2, 1, 0, vec![7])],
        &[],
    );

    let conn = rusqlite::Connection::open(&archive.path).unwrap();
    let row: i64 = conn
        .query_row(
            "SELECT tile_row FROM tiles WHERE zoom_level = 2 AND tile_column = 1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(row, 3);
}

#[test]
fn test_failed_batch_leaves_archive_unchanged() {
    let archive = TestArchive::new(
        "atomic.mbtiles",
        &[TileData::new(0, 0, 0, vec![0xaa])],
        &[],
    );

    // Another connection installs a constraint the batch will trip over.
    let conn = rusqlite::Connection::open(&archive.path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_large_tiles BEFORE INSERT ON tiles
         WHEN length(NEW.tile_data) > 3
         BEGIN SELECT RAISE(ABORT, 'tile too large'); END;",
    )
    .unwrap();
    drop(conn);

    let mut writer = Writer::open(&archive.path).unwrap();
    let err = writer
        .bulk_insert_tiles(&[
            TileData::new(0, 0, 0, vec![0xbb]),
            TileData::new(1, 0, 0, vec![1]),
            TileData::new(1, 1, 0, vec![1, 2, 3, 4]),
        ])
        .unwrap_err();
    assert!(matches!(err, TilesetError::Transaction { index: 2, total: 3, .. }));
    writer.close().unwrap();

    let reader = Reader::open(&archive.path).unwrap();
    assert_eq!(reader.select_tile(0, 0, 0).unwrap(), vec![0xaa]);
    assert!(reader.select_tile(1, 0, 0).unwrap_err().is_not_found());
    assert!(reader.select_tile(1, 1, 0).unwrap_err().is_not_found());
}

#[test]
fn test_second_writer_needs_no_schema_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.mbtiles");

    let mut first = Writer::open(&path).unwrap();
    first.insert_tile(1, 1, 1, &[1]).unwrap();
    first.insert_metadata("name", "first").unwrap();
    first.close().unwrap();

    let mut second = Writer::open(&path).unwrap();
    second.insert_tile(1, 0, 0, &[2]).unwrap();
    second.insert_metadata("name", "second").unwrap();
    assert_eq!(second.select_tile(1, 1, 1).unwrap(), vec![1]);
    assert_eq!(second.select_metadata("name").unwrap(), "second");
    second.close().unwrap();
}

#[test]
fn test_metadata_json_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vector.mbtiles");

    let doc = MetadataJson {
        vector_layers: vec![VectorLayer::new("water").with_field("area", "Number")],
    };
    let mut writer = Writer::open(&path).unwrap();
    writer.insert_metadata_json(&doc).unwrap();
    writer.close().unwrap();

    let reader = Reader::open(&path).unwrap();
    assert_eq!(reader.select_metadata_json().unwrap(), doc);
}

#[test]
fn test_invalid_metadata_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.mbtiles");

    let mut writer = Writer::open(&path).unwrap();
    writer.insert_metadata("json", "{not json").unwrap();
    let err = writer.reader().select_metadata_json().unwrap_err();
    assert!(matches!(err, TilesetError::MetadataJson(_)));
}

#[test]
fn test_read_only_handle_rejects_writes() {
    let archive = TestArchive::single_tile();
    let tileset = Tileset::open_read_only(&archive.path).unwrap();
    let mut writer = Writer::from_tileset(tileset);

    assert!(writer.insert_tile(0, 0, 0, &[1]).is_err());
    assert!(writer.tileset().connection().is_autocommit());
    assert_eq!(writer.reader().select_tile(0, 0, 0).unwrap(), vec![0x00]);
}

#[test]
fn test_close_releases_prepared_statements() {
    let archive = TestArchive::single_tile();
    let mut writer = Writer::open(&archive.path).unwrap();

    writer.insert_tile(2, 2, 2, &[2]).unwrap();
    writer.select_tile(2, 2, 2).unwrap();
    writer.select_metadata("name").unwrap();

    let tileset = writer.tileset();
    assert!(tileset.is_prepared(StatementKind::TileInsert));
    assert!(tileset.is_prepared(StatementKind::TileSelect));
    assert!(tileset.is_prepared(StatementKind::MetadataSelect));
    assert!(!tileset.is_prepared(StatementKind::MetadataInsert));

    writer.close().unwrap();

    // The file is fully released and can be reopened and read.
    let reader = Reader::open(&archive.path).unwrap();
    assert_eq!(reader.select_tile(2, 2, 2).unwrap(), vec![2]);
}
