//! Basic usage example for the Strata library.
//!
//! Imports a disk image into a throwaway local repository, tags it, and lists
//! the repository. Requires `qemu-img` on the PATH.
//!
//! Run with: cargo run --example basic_usage -- path/to/image.qcow2

use libstrata::{Config, ImageMetadata, QemuImg, Registry};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Strata Library - Basic Usage Example\n");

    let Some(source) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: basic_usage <image>");
        return Ok(());
    };

    let storage = std::env::temp_dir().join("strata-example");
    let mut registry = Registry::new(Config::with_local_default(storage.display().to_string()))?;
    let repo = registry.repo(None)?;
    println!("✓ Opened repository at {}\n", repo.path().display());

    // Import the image
    println!("Importing {}...", source.display());
    let id = match repo.add_image(
        &QemuImg::new(),
        &source,
        ImageMetadata::described("imported by basic_usage"),
    ) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("✗ Import failed: {}", e);
            eprintln!("  Make sure qemu-img is installed and the file is a disk image");
            return Ok(());
        }
    };
    println!("✓ Stored as {}\n", id);

    // Tag it
    repo.add_tag("example", &id)?;
    println!("✓ Tagged as 'example' ({})\n", repo.short_name(&id));

    // List everything
    for listing in registry.list_all_artifacts()? {
        println!(
            "  - {} ({} bytes) {}",
            listing.name,
            listing.size.unwrap_or_default(),
            listing.description.unwrap_or_default()
        );
    }

    Ok(())
}
