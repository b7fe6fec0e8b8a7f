use pfyrepo::{SqliteRepository, TrackRecord, TrackRepository};
use tempfile::TempDir;

/// Crée un dépôt temporaire pour les tests
fn create_test_repo() -> (TempDir, SqliteRepository) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let repo = SqliteRepository::init(&db_path).unwrap();
    (temp_dir, repo)
}

fn sample_record(id: &str) -> TrackRecord {
    TrackRecord {
        id: id.to_string(),
        title: "Test Track".to_string(),
        artist: "Test Artist".to_string(),
        duration: 180,
        small_thumbnail: "http://img.example.com/small.jpg".to_string(),
        large_thumbnail: "http://img.example.com/large.jpg".to_string(),
        url: format!("http://storage.example.com/public/{}.mp3", id),
    }
}

#[test]
fn test_repo_init() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let repo = SqliteRepository::init(&db_path);
    assert!(repo.is_ok());
    assert!(db_path.exists());
}

#[tokio::test]
async fn test_insert_and_get() {
    let (_temp_dir, repo) = create_test_repo();

    let record = sample_record("abc123");
    repo.insert(&record).await.unwrap();

    let stored = repo.get("abc123").await.unwrap();
    assert_eq!(stored, Some(record));
}

#[tokio::test]
async fn test_get_unknown_id() {
    let (_temp_dir, repo) = create_test_repo();

    let stored = repo.get("does-not-exist").await.unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_duplicate_insert_is_noop() {
    let (_temp_dir, repo) = create_test_repo();

    let first = sample_record("abc123");
    repo.insert(&first).await.unwrap();

    // Seconde insertion avec des champs différents : doit être ignorée
    let mut second = sample_record("abc123");
    second.title = "Another Title".to_string();
    repo.insert(&second).await.unwrap();

    let stored = repo.get("abc123").await.unwrap().unwrap();
    assert_eq!(stored.title, "Test Track");
    assert_eq!(repo.count().unwrap(), 1);
}

#[tokio::test]
async fn test_delete() {
    let (_temp_dir, repo) = create_test_repo();

    repo.insert(&sample_record("abc123")).await.unwrap();
    assert!(repo.get("abc123").await.unwrap().is_some());

    repo.delete("abc123").unwrap();
    assert!(repo.get("abc123").await.unwrap().is_none());
}

#[tokio::test]
async fn test_defaulted_fields_roundtrip() {
    let (_temp_dir, repo) = create_test_repo();

    // Champs inconnus en amont : chaînes vides et durée nulle
    let record = TrackRecord {
        id: "empty-meta".to_string(),
        title: String::new(),
        artist: String::new(),
        duration: 0,
        small_thumbnail: String::new(),
        large_thumbnail: String::new(),
        url: "http://storage.example.com/public/empty-meta.mp3".to_string(),
    };
    repo.insert(&record).await.unwrap();

    let stored = repo.get("empty-meta").await.unwrap().unwrap();
    assert_eq!(stored, record);
}

#[tokio::test]
async fn test_in_memory_repo() {
    let repo = SqliteRepository::in_memory().unwrap();

    repo.insert(&sample_record("mem1")).await.unwrap();
    assert_eq!(repo.count().unwrap(), 1);
}
