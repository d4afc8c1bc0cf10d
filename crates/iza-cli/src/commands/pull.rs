//! `iza pull` — Download an image and register it locally.

use clap::Args;

use iza_image::reference::ImageReference;
use iza_image::store::ImageStore;

/// Arguments for the `pull` command.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Image reference (`name[:tag]`, e.g. `alpine:3.18`).
    #[arg(value_name = "IMAGE")]
    pub image: String,
}

/// Executes the `pull` command.
///
/// # Errors
///
/// Returns an error if the reference is malformed, the name is not in
/// the allow-list, or the download/extraction fails.
pub fn execute(args: PullArgs) -> anyhow::Result<()> {
    let reference = ImageReference::parse(&args.image)?;
    let store = ImageStore::with_defaults();

    let rootfs = store.pull(&reference)?;
    println!("Pulled {reference} -> {}", rootfs.display());
    Ok(())
}
