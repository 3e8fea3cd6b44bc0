//! Generate seed corpus for fuzzing

use pakvfs_rs::PakWriter;
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = "fuzz/corpus/fuzz_directory_parse";
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    // Seed 1: Empty archive (terminator only)
    {
        let path = format!("{}/seed_empty.pak", corpus_dir);
        let writer = PakWriter::create(&path)?;
        writer.finalize()?;
        println!("Generated: {}", path);
    }

    // Seed 2: Typical game data names
    {
        let path = format!("{}/seed_multi.pak", corpus_dir);
        let mut writer = PakWriter::create(&path)?;
        writer.add_file("IBM.PAL", &[0x3F; 768])?;
        writer.add_file("MOUSE.SHP", b"shape data")?;
        writer.add_file("GFX\\CURSOR.PNG", b"png")?;
        writer.finalize()?;
        println!("Generated: {}", path);
    }

    // Seed 3: Zero-length entries between others
    {
        let path = format!("{}/seed_zero_length.pak", corpus_dir);
        let mut writer = PakWriter::create(&path)?;
        writer.add_file("A.BIN", b"a")?;
        writer.add_file("EMPTY.BIN", b"")?;
        writer.add_file("B.BIN", b"b")?;
        writer.finalize()?;
        println!("Generated: {}", path);
    }

    // Seed 4: Table without the terminating zero offset
    {
        let path = format!("{}/seed_unterminated.pak", corpus_dir);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(b"X.D\0");
        bytes.extend_from_slice(b"payload");
        fs::write(&path, bytes)?;
        println!("Generated: {}", path);
    }

    println!("\nGenerated 4 seed files in {}", corpus_dir);
    Ok(())
}
