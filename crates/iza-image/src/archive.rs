//! Rootfs archive extraction.
//!
//! Accepts any tar flavor the `tar` crate understands, with transparent
//! gzip/xz/bzip2 decompression chosen by magic-byte sniffing. Extraction
//! restores mode bits, timestamps, symlinks, hard links, device nodes,
//! and extended attributes where the process has the privilege to do so.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use iza_common::error::{IzaError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const XZ_MAGIC: [u8; 6] = [0xfd, b'7', b'z', b'X', b'Z', 0x00];
const BZIP2_MAGIC: [u8; 3] = [b'B', b'Z', b'h'];

/// Extracts an archive into `rootfs_dir`, returning the total size of
/// the regular files restored.
///
/// Every entry lands under `rootfs_dir`; entries that would escape it
/// (absolute paths, `..` components) are skipped rather than restored.
///
/// # Errors
///
/// Returns [`IzaError::Archive`] if the archive cannot be read or any
/// entry fails to unpack. The caller owns removal of the partially
/// extracted directory.
pub fn extract_rootfs(archive_path: &Path, rootfs_dir: &Path) -> Result<u64> {
    let reader = open_decompressed(archive_path)?;
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_unpack_xattrs(true);
    archive.set_overwrite(true);

    let mut total_bytes = 0u64;
    let entries = archive
        .entries()
        .map_err(|e| archive_error(archive_path, &e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| archive_error(archive_path, &e))?;
        let is_file = entry.header().entry_type().is_file();
        let size = entry.header().entry_size().unwrap_or(0);

        let unpacked = entry
            .unpack_in(rootfs_dir)
            .map_err(|e| archive_error(archive_path, &e))?;
        if !unpacked {
            tracing::debug!(
                entry = %entry.path().map_or_else(|_| "<invalid>".into(), |p| p.display().to_string()),
                "skipped entry that would escape the extraction root"
            );
            continue;
        }
        if is_file {
            total_bytes += size;
        }
    }

    tracing::info!(
        bytes = total_bytes,
        path = %rootfs_dir.display(),
        "rootfs extracted"
    );
    Ok(total_bytes)
}

/// Opens an archive with transparent decompression.
///
/// The compression format is sniffed from the file's magic bytes, so a
/// mislabeled `.tar.gz` that actually holds xz or bzip2 data still
/// extracts.
///
/// # Errors
///
/// Returns [`IzaError::Io`] if the file cannot be opened or rewound.
fn open_decompressed(path: &Path) -> Result<Box<dyn Read>> {
    let mut file = File::open(path).map_err(|e| IzaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut magic = Vec::with_capacity(XZ_MAGIC.len());
    file.by_ref()
        .take(XZ_MAGIC.len() as u64)
        .read_to_end(&mut magic)
        .map_err(|e| IzaError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    file.rewind().map_err(|e| IzaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let buffered = BufReader::new(file);
    let reader: Box<dyn Read> = if magic.starts_with(&GZIP_MAGIC) {
        Box::new(flate2::read::GzDecoder::new(buffered))
    } else if magic.starts_with(&XZ_MAGIC) {
        Box::new(xz2::read::XzDecoder::new(buffered))
    } else if magic.starts_with(&BZIP2_MAGIC) {
        Box::new(bzip2::read::BzDecoder::new(buffered))
    } else {
        Box::new(buffered)
    };
    Ok(reader)
}

fn archive_error(path: &Path, err: &std::io::Error) -> IzaError {
    IzaError::Archive {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
