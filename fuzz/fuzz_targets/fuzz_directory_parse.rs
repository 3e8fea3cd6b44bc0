#![no_main]

use libfuzzer_sys::fuzz_target;
use pakvfs_rs::PakArchive;

fuzz_target!(|data: &[u8]| {
    // Parsing must never panic, whatever the bytes
    let archive = match PakArchive::from_bytes("fuzz", data.to_vec()) {
        Ok(a) => a,
        Err(_) => return, // Expected for invalid data
    };

    // Every listed entry must be readable and in bounds
    let names: Vec<String> = archive
        .list_entries()
        .iter()
        .map(|e| e.name.clone())
        .collect();
    for name in &names {
        let entry = archive.entry(name).expect("listed entry resolves");
        assert!(entry.offset + entry.length <= data.len() as u64);
        let bytes = archive.read_entry(name).expect("listed entry reads");
        assert_eq!(bytes.len() as u64, entry.length);
    }

    // Lookups with odd names should never panic
    let _ = archive.contains("");
    let _ = archive.contains("\\");
    let _ = archive.contains("../../../etc/passwd");
});
