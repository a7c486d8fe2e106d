//! Integration tests for scanning, loading, reconciling and persisting the
//! schedule on a real file system.

use bridge_desktop::TokioFileSystem;
use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use chrono::{NaiveDate, NaiveTime};
use core_library::{
    check_completeness, reconcile, scan_video_folder, CsvMetadataStore, MetadataStore,
    TimeSlotSource,
};
use std::sync::Arc;
use tempfile::tempdir;

struct Sequence(Vec<NaiveTime>);

impl TimeSlotSource for Sequence {
    fn next_slot(&mut self) -> NaiveTime {
        self.0.remove(0)
    }
}

fn extensions() -> Vec<String> {
    ["mp4", "mov", "avi", "mkv", "flv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[tokio::test]
async fn test_scan_filters_extensions_and_directories() {
    let dir = tempdir().unwrap();
    let fs = TokioFileSystem::new();
    for name in ["b.MP4", "a.mov", "notes.txt", "noext"] {
        fs.write_file(&dir.path().join(name), Bytes::from_static(b"x"))
            .await
            .unwrap();
    }
    fs.create_dir_all(&dir.path().join("folder.mp4")).await.unwrap();

    let scan = scan_video_folder(&fs, dir.path(), &extensions()).await.unwrap();

    assert!(!scan.created);
    assert_eq!(scan.file_names, vec!["a.mov", "b.MP4"]);
}

#[tokio::test]
async fn test_scan_creates_missing_folder() {
    let dir = tempdir().unwrap();
    let fs = TokioFileSystem::new();
    let folder = dir.path().join("videos");

    let scan = scan_video_folder(&fs, &folder, &extensions()).await.unwrap();

    assert!(scan.created);
    assert!(scan.file_names.is_empty());
    assert!(folder.is_dir());
}

#[tokio::test]
async fn test_store_lifecycle() {
    let dir = tempdir().unwrap();
    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    let store = CsvMetadataStore::new(fs.clone(), dir.path().join("video_metadata.csv"));

    let loaded = store.load().await.unwrap();
    assert!(!loaded.existed);
    assert!(loaded.records.is_empty());

    let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    let listing = vec!["trip.mp4".to_string(), "intro.mov".to_string()];
    let mut slots = Sequence(vec![
        NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
        NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
    ]);
    let result = reconcile(&listing, loaded.records, today, &mut slots);
    store.persist(&result.records).await.unwrap();

    let written = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(
        written,
        "FileName,UploadDate,UploadTime,Title,Description,Tags,Uploaded\n\
         intro.mov,2024-03-10,16:30,intro,,,No\n\
         trip.mp4,2024-03-11,18:30,trip,,,No\n"
    );

    let reloaded = store.load().await.unwrap();
    assert!(reloaded.existed);
    assert_eq!(reloaded.records, result.records);

    let err = check_completeness(&reloaded.records).unwrap_err();
    assert_eq!(err.file_name, "intro.mov");
    assert_eq!(err.row, 2);
}

#[tokio::test]
async fn test_user_edits_are_canonicalized_on_rewrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("video_metadata.csv");
    std::fs::write(
        &path,
        "FileName,UploadDate,UploadTime,Title,Description,Tags,Uploaded\n\
         b.mp4,3/12/2024,17:10,B,desc,\"x, y\",yes\n\
         a.mp4,2024-03-11,17:00,A,desc,z,\n",
    )
    .unwrap();

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    let store = CsvMetadataStore::new(fs, &path);
    let loaded = store.load().await.unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    let mut slots = Sequence(Vec::new());
    let result = reconcile(
        &["a.mp4".to_string(), "b.mp4".to_string()],
        loaded.records,
        today,
        &mut slots,
    );
    assert_eq!(result.canonicalized, 1);
    assert_eq!(result.added, 0);

    store.persist(&result.records).await.unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "FileName,UploadDate,UploadTime,Title,Description,Tags,Uploaded\n\
         a.mp4,2024-03-11,17:00,A,desc,z,No\n\
         b.mp4,2024-03-12,17:10,B,desc,\"x, y\",Yes\n"
    );
}
