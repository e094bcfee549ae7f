use super::{File, SledStore, StoredTorrent, TorrentStore};
use crate::utils::error::PersistenceError;
use tempfile::{TempDir, tempdir};

fn create_test_store() -> (TempDir, SledStore) {
    let dir = tempdir().unwrap();
    let store = SledStore::open(dir.path()).unwrap();
    (dir, store)
}

fn iso_files() -> Vec<File> {
    vec![
        File {
            path: "ubuntu.iso".into(),
            size: 3_900_000_000,
        },
        File {
            path: "SHA256SUMS".into(),
            size: 100,
        },
    ]
}

#[test]
fn test_add_and_get_torrent() {
    let (_dir, store) = create_test_store();

    store
        .add_new_torrent(b"AABBCC", "ubuntu-22.04-iso", &iso_files())
        .unwrap();

    let stored = store.get_torrent(b"AABBCC").unwrap().expect("stored torrent");
    assert_eq!(stored.info_hash, "AABBCC");
    assert_eq!(stored.name, "ubuntu-22.04-iso");
    assert_eq!(stored.files, iso_files());
    assert_eq!(stored.total_size, 3_900_000_100);
    assert!(stored.discovered_on > 0);
    assert_eq!(store.torrent_count(), 1);
}

#[test]
fn test_rediscovered_torrent_keeps_first_record() {
    let (_dir, store) = create_test_store();

    store.add_new_torrent(b"AABBCC", "first", &[]).unwrap();
    store
        .add_new_torrent(b"AABBCC", "second", &iso_files())
        .unwrap();

    let stored = store.get_torrent(b"AABBCC").unwrap().unwrap();
    assert_eq!(stored.name, "first");
    assert!(stored.files.is_empty());
    assert_eq!(store.torrent_count(), 1);
}

#[test]
fn test_rejects_incomplete_records() {
    let (_dir, store) = create_test_store();

    let err = store.add_new_torrent(b"", "name", &[]).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidRecord(_)));

    let err = store.add_new_torrent(b"AABBCC", "", &[]).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidRecord(_)));

    assert_eq!(store.torrent_count(), 0);
}

#[test]
fn test_rejects_unrepresentable_sizes() {
    let (_dir, store) = create_test_store();
    let huge = |path: &str| File {
        path: path.into(),
        size: i64::MAX,
    };

    let err = store
        .add_new_torrent(b"AABBCC", "huge", &[huge("a"), huge("b")])
        .unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidRecord(_)));

    let negative = File {
        path: "a".into(),
        size: -1,
    };
    let err = store.add_new_torrent(b"DDEEFF", "neg", &[negative]).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidRecord(_)));

    assert_eq!(store.torrent_count(), 0);
}

#[test]
fn test_unknown_torrent_is_none() {
    let (_dir, store) = create_test_store();
    assert!(store.get_torrent(b"nothing-here").unwrap().is_none());
}

#[test]
fn test_records_survive_close_and_reopen() {
    let dir = tempdir().unwrap();
    {
        let store = SledStore::open(dir.path()).unwrap();
        store.add_new_torrent(b"DDEEFF", "debian", &[]).unwrap();
        store.close().unwrap();
    }

    let reopened = SledStore::open(dir.path()).unwrap();
    let stored: StoredTorrent = reopened.get_torrent(b"DDEEFF").unwrap().unwrap();
    assert_eq!(stored.name, "debian");
}
