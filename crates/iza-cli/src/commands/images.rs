//! `iza images` — List the local image catalog.

use clap::Args;

use iza_image::store::ImageStore;

use crate::output::format_size;

/// Arguments for the `images` command.
#[derive(Args, Debug)]
pub struct ImagesArgs {}

/// Executes the `images` command.
///
/// # Errors
///
/// Returns an error only if the images directory exists but cannot be
/// read; an empty or absent catalog prints just the header.
pub fn execute(_args: ImagesArgs) -> anyhow::Result<()> {
    let store = ImageStore::with_defaults();
    let records = store.list()?;

    println!("{:<20} {:<12} {}", "REPOSITORY", "TAG", "SIZE");
    for record in records {
        println!(
            "{:<20} {:<12} {}",
            record.repository,
            record.tag,
            format_size(record.size_bytes)
        );
    }
    Ok(())
}
