//! `maven-metadata.xml` deserialization.
//!
//! Parses the version metadata document published alongside an artifact
//! into [`VersionMetadata`]. Only `artifactId`, `groupId` and the nested
//! `versioning/latest` and `versioning/release` elements are read; other
//! elements such as the `versions` list are ignored. All four are required.

use super::metadata::VersionMetadata;
use serde::Deserialize;
use std::io::BufRead;

/// Errors arising from metadata parsing.
#[derive(Debug, thiserror::Error)]
pub enum MetadataParseError {
    /// XML syntax or structure is invalid, or a required field is missing.
    #[error("metadata parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// A required field is present but empty.
    #[error("metadata field {field} is empty")]
    EmptyField {
        /// The element path of the empty field.
        field: &'static str,
    },
}

#[derive(Debug, Deserialize)]
struct MetadataDocument {
    #[serde(rename = "artifactId")]
    artifact_id: String,
    #[serde(rename = "groupId")]
    group_id: String,
    versioning: Versioning,
}

#[derive(Debug, Deserialize)]
struct Versioning {
    latest: String,
    release: String,
}

/// Parse a metadata document from a buffered reader.
///
/// # Errors
///
/// Returns [`MetadataParseError`] if the document is malformed or any
/// required field is missing or blank.
pub fn parse_metadata<R: BufRead>(reader: R) -> Result<VersionMetadata, MetadataParseError> {
    let document: MetadataDocument = quick_xml::de::from_reader(reader)?;
    into_metadata(document)
}

/// Parse a metadata document held in a string.
///
/// # Errors
///
/// Returns [`MetadataParseError`] if the document is malformed or any
/// required field is missing or blank.
///
/// # Examples
///
/// ```
/// use sm2_installer::artefact::metadata_parser::parse_metadata_str;
///
/// let xml = r"<metadata>
///   <groupId>uk.gov.hmrc</groupId>
///   <artifactId>auth_2.13</artifactId>
///   <versioning><latest>7.1.0</latest><release>7.1.0</release></versioning>
/// </metadata>";
/// let metadata = parse_metadata_str(xml).expect("valid metadata");
/// assert_eq!(metadata.release(), "7.1.0");
/// ```
pub fn parse_metadata_str(xml: &str) -> Result<VersionMetadata, MetadataParseError> {
    parse_metadata(xml.as_bytes())
}

fn into_metadata(document: MetadataDocument) -> Result<VersionMetadata, MetadataParseError> {
    let fields = [
        ("artifactId", &document.artifact_id),
        ("groupId", &document.group_id),
        ("versioning/latest", &document.versioning.latest),
        ("versioning/release", &document.versioning.release),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(MetadataParseError::EmptyField { field });
        }
    }
    Ok(VersionMetadata::new(
        document.artifact_id.trim(),
        document.group_id.trim(),
        document.versioning.latest.trim(),
        document.versioning.release.trim(),
    ))
}
