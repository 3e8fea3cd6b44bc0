//! Multi-reader stress tests
//!
//! One engine shared across threads: concurrent resolve, exists and checksum
//! calls over loose files and archived entries.

use pakvfs_rs::{AssetEngine, ContentDigest, Inventory, PakWriter, SearchRoots};
use std::io::Read;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Helper: root with N archived files spread over two archives plus N loose files
fn create_install(file_count: usize) -> TempDir {
    let temp = TempDir::new().unwrap();

    let mut first = PakWriter::create(temp.path().join("FIRST.PAK")).unwrap();
    let mut second = PakWriter::create(temp.path().join("SECOND.PAK")).unwrap();
    for i in 0..file_count {
        let name = format!("packed{}.bin", i);
        let data = format!("packed-data-{}", i).repeat(i + 1);
        if i % 2 == 0 {
            first.add_file(&name, data.as_bytes()).unwrap();
        } else {
            second.add_file(&name, data.as_bytes()).unwrap();
        }
    }
    first.finalize().unwrap();
    second.finalize().unwrap();

    for i in 0..file_count {
        std::fs::write(
            temp.path().join(format!("loose{}.txt", i)),
            format!("loose-data-{}", i),
        )
        .unwrap();
    }

    temp
}

#[test]
fn test_concurrent_resolve() {
    let temp = create_install(50);
    let engine = Arc::new(AssetEngine::build(&SearchRoots::new([temp.path()]), false).unwrap());

    let handles: Vec<_> = (0..16)
        .map(|thread_id| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for round in 0..50 {
                    let i = (thread_id * 7 + round) % 50;

                    let packed = engine.read(&format!("PACKED{}.BIN", i)).unwrap();
                    assert_eq!(packed, format!("packed-data-{}", i).repeat(i + 1).as_bytes());

                    let loose = engine.read(&format!("loose{}.txt", i)).unwrap();
                    assert_eq!(loose, format!("loose-data-{}", i).as_bytes());

                    assert!(engine.exists(&format!("packed{}.bin", i)));
                    assert!(!engine.exists(&format!("packed{}.bin", i + 1000)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_interleaved_streams_do_not_interfere() {
    let temp = create_install(4);
    let engine = AssetEngine::build(&SearchRoots::new([temp.path()]), false).unwrap();

    // Two streams over the same archive, read in alternating chunks
    let mut a = engine.resolve("packed0.bin").unwrap();
    let mut b = engine.resolve("packed2.bin").unwrap();

    let mut out_a = Vec::new();
    let mut out_b = Vec::new();
    let mut buf = [0u8; 5];
    loop {
        let na = a.read(&mut buf).unwrap();
        out_a.extend_from_slice(&buf[..na]);
        let nb = b.read(&mut buf).unwrap();
        out_b.extend_from_slice(&buf[..nb]);
        if na == 0 && nb == 0 {
            break;
        }
    }

    assert_eq!(out_a, b"packed-data-0");
    assert_eq!(out_b, "packed-data-2".repeat(3).as_bytes());
}

#[test]
fn test_concurrent_checksums_agree() {
    let temp = create_install(20);
    let engine = Arc::new(AssetEngine::build(&SearchRoots::new([temp.path()]), false).unwrap());

    let expected: Vec<ContentDigest> = (0..20)
        .map(|i| ContentDigest::of(format!("packed-data-{}", i).repeat(i + 1).as_bytes()))
        .collect();
    let expected = Arc::new(expected);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let expected = Arc::clone(&expected);
            thread::spawn(move || {
                let inventory = Inventory::new(&engine);
                for (i, digest) in expected.iter().enumerate() {
                    let actual = inventory.checksum(&format!("packed{}.bin", i)).unwrap();
                    assert_eq!(&actual, digest);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
