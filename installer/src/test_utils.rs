//! Shared test utilities for the installer crate.
//!
//! Builds in-memory archives and metadata documents so unit and behaviour
//! tests can exercise the install pipeline without a real repository.

use flate2::Compression;
use flate2::write::GzEncoder;
use md5::Md5;
use sha2::{Digest, Sha256};
use std::io::Write;
use tar::{Builder, EntryType, Header};

/// One entry of a test archive.
#[derive(Debug, Clone, Copy)]
pub enum ArchiveEntry<'a> {
    /// A directory entry.
    Dir(&'a str),
    /// A regular file with contents and permission bits.
    File(&'a str, &'a [u8], u32),
    /// A symbolic link pointing at a target.
    Symlink(&'a str, &'a str),
    /// A regular file whose name bytes are written verbatim, bypassing the
    /// path checks of [`tar::Builder`], for building hostile archives.
    RawName(&'a [u8], &'a [u8]),
}

/// Build a gzip-compressed tar archive from `entries`, in order.
///
/// # Panics
///
/// See [`tar_bytes`].
#[must_use]
pub fn tar_gz(entries: &[ArchiveEntry<'_>]) -> Vec<u8> {
    gzip(&tar_bytes(entries))
}

/// Compress `bytes` as a single gzip member.
///
/// # Panics
///
/// Panics if compression fails.
#[must_use]
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("compress");
    encoder.finish().expect("finish gzip")
}

/// Build an uncompressed tar stream from `entries`, in order, including
/// the end-of-archive marker.
///
/// # Panics
///
/// Panics if the archive cannot be assembled, or a raw name exceeds the
/// 100-byte ustar limit.
#[must_use]
pub fn tar_bytes(entries: &[ArchiveEntry<'_>]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for entry in entries {
        match *entry {
            ArchiveEntry::Dir(path) => {
                let mut header = Header::new_gnu();
                header.set_entry_type(EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .expect("append directory");
            }
            ArchiveEntry::File(path, contents, mode) => {
                let mut header = Header::new_gnu();
                header.set_entry_type(EntryType::Regular);
                header.set_mode(mode);
                header.set_size(contents.len() as u64);
                builder
                    .append_data(&mut header, path, contents)
                    .expect("append file");
            }
            ArchiveEntry::Symlink(path, target) => {
                let mut header = Header::new_gnu();
                header.set_entry_type(EntryType::Symlink);
                header.set_mode(0o777);
                header.set_size(0);
                builder
                    .append_link(&mut header, path, target)
                    .expect("append symlink");
            }
            ArchiveEntry::RawName(name, contents) => {
                let mut header = Header::new_old();
                header.as_old_mut().name[..name.len()].copy_from_slice(name);
                header.set_entry_type(EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(contents.len() as u64);
                header.set_cksum();
                builder.append(&header, contents).expect("append raw entry");
            }
        }
    }
    builder.into_inner().expect("finish tar")
}

/// Build a `maven-metadata.xml` document.
#[must_use]
pub fn metadata_xml(group: &str, artifact: &str, latest: &str, release: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>{group}</groupId>
  <artifactId>{artifact}</artifactId>
  <versioning>
    <latest>{latest}</latest>
    <release>{release}</release>
    <versions>
      <version>{release}</version>
    </versions>
  </versioning>
</metadata>
"#
    )
}

/// Lowercase hex MD5 of `bytes`.
#[must_use]
pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
