mod common;

use std::path::PathBuf;

use common::payload;
use flatfs::*;
use tempfile::TempDir;

fn image_path() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("volume.img");
    (dir, path)
}

#[test]
fn format_writes_exact_size() {
    let (_dir, path) = image_path();
    let mut vol = Volume::new();
    vol.format(&path).unwrap();
    assert!(!vol.is_open());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), IMAGE_SIZE);
    assert_eq!(IMAGE_SIZE, (BLOCK_NUM * BLOCK_SIZE) as u64);
}

#[test]
fn open_then_close_is_fresh() {
    let (_dir, path) = image_path();
    let mut vol = Volume::new();
    vol.format(&path).unwrap();
    vol.open(&path).unwrap();
    assert!(vol.is_open());
    assert_eq!(vol.free_space().unwrap(), ((BLOCK_NUM - RESERVED_BLOCKS) * BLOCK_SIZE) as u64);
    assert!(vol.list(true).unwrap().is_empty());
    assert!(vol.check().unwrap().is_clean());
    vol.close().unwrap();

    let fresh = FileSystem::new();
    vol.open(&path).unwrap();
    assert_eq!(vol.free_space().unwrap(), fresh.free_space());
    assert!(vol.list(true).unwrap().is_empty());
    vol.close().unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), IMAGE_SIZE);
}

#[test]
fn files_survive_close_and_reopen() {
    let (_dir, path) = image_path();
    let data = payload(6 * BLOCK_SIZE + 1, 4);
    let mut vol = Volume::new();
    vol.format(&path).unwrap();

    vol.open(&path).unwrap();
    vol.store_bytes("data.bin", &data).unwrap();
    vol.store_bytes("secret", b"shh").unwrap();
    vol.set_attribute(AttributeKind::Hidden, AttributeOp::Set, "secret").unwrap();
    vol.set_attribute(AttributeKind::ReadOnly, AttributeOp::Set, "data.bin").unwrap();
    let free = vol.free_space().unwrap();
    vol.close().unwrap();

    // Closing resets the in-memory state.
    assert!(matches!(vol.list(true), Err(Error::NotOpen)));

    vol.open(&path).unwrap();
    assert_eq!(vol.retrieve_to_vec("data.bin").unwrap(), data);
    assert_eq!(vol.free_space().unwrap(), free);
    let visible: Vec<String> = vol.list(false).unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(visible, vec!["data.bin"]);
    assert!(matches!(vol.delete("data.bin"), Err(Error::PermissionDenied)));
    assert!(vol.check().unwrap().is_clean());
    log!("reopened volume: {:?}", vol.list(true).unwrap());
    vol.close().unwrap();
}

#[test]
fn sync_persists_without_closing() {
    let (_dir, path) = image_path();
    let mut vol = Volume::new();
    vol.format(&path).unwrap();
    vol.open(&path).unwrap();
    vol.store_bytes("a", b"synced").unwrap();
    vol.sync().unwrap();
    assert!(vol.is_open());

    // A second handle on the same image sees the synced contents.
    let mut other = Volume::new();
    other.open(&path).unwrap();
    assert_eq!(other.retrieve_to_vec("a").unwrap(), b"synced");
    other.close().unwrap();
    vol.close().unwrap();
}

#[test]
fn state_errors() {
    let (_dir, path) = image_path();
    let mut vol = Volume::new();

    assert!(matches!(vol.close(), Err(Error::NotOpen)));
    assert!(matches!(vol.sync(), Err(Error::NotOpen)));
    assert!(matches!(vol.store_bytes("a", b"1"), Err(Error::NotOpen)));
    assert!(matches!(vol.retrieve_to_vec("a"), Err(Error::NotOpen)));
    assert!(matches!(vol.delete("a"), Err(Error::NotOpen)));
    assert!(matches!(vol.free_space(), Err(Error::NotOpen)));
    assert!(matches!(
        vol.set_attribute(AttributeKind::Hidden, AttributeOp::Set, "a"),
        Err(Error::NotOpen)
    ));

    vol.format(&path).unwrap();
    vol.open(&path).unwrap();
    let err = vol.open(&path).unwrap_err();
    assert!(err.is_volume_state());
    assert!(matches!(err, Error::AlreadyOpen));
    assert!(matches!(vol.format(&path), Err(Error::AlreadyOpen)));
    vol.close().unwrap();
    assert!(matches!(vol.close(), Err(Error::NotOpen)));
}

#[test]
fn open_rejects_wrong_size() {
    let (dir, path) = image_path();
    std::fs::write(&path, vec![0u8; BLOCK_SIZE * 10]).unwrap();
    let mut vol = Volume::new();
    match vol.open(&path) {
        Err(Error::InvalidImage { expected, actual }) => {
            assert_eq!(expected, IMAGE_SIZE);
            assert_eq!(actual, (BLOCK_SIZE * 10) as u64);
        }
        other => panic!("expected InvalidImage, got {:?}", other.err()),
    }
    assert!(!vol.is_open());

    assert!(matches!(vol.open(dir.path().join("missing.img")), Err(Error::Io(_))));
    assert!(!vol.is_open());
}

#[test]
fn failed_open_keeps_state_closed() {
    let (_dir, path) = image_path();
    let mut vol = Volume::new();
    vol.format(&path).unwrap();
    vol.open(&path).unwrap();
    vol.store_bytes("a", b"1").unwrap();
    vol.close().unwrap();

    // Growing the file by one byte makes it invalid.
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.push(0);
    std::fs::write(&path, &bytes).unwrap();
    assert!(matches!(vol.open(&path), Err(Error::InvalidImage { .. })));
    assert!(matches!(vol.stat("a"), Err(Error::NotOpen)));
}

#[test]
fn host_file_round_trip_through_image() {
    let (dir, path) = image_path();
    let src = dir.path().join("in.dat");
    let dst = dir.path().join("out.dat");
    let data = payload(BLOCK_SIZE * 3 + 1000, 11);
    std::fs::write(&src, &data).unwrap();

    let mut vol = Volume::new();
    vol.format(&path).unwrap();
    vol.open(&path).unwrap();
    vol.store_file("in.dat", &src).unwrap();
    vol.close().unwrap();

    vol.open(&path).unwrap();
    assert_eq!(vol.stat("in.dat").unwrap().size, data.len() as u64);
    vol.retrieve_to_file("in.dat", &dst).unwrap();
    vol.close().unwrap();
    assert_eq!(std::fs::read(&dst).unwrap(), data);
}
