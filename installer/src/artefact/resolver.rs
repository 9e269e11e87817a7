//! Latest-version resolution with naming-variant fallback.
//!
//! An artefact requested as `auth_2.12` may have moved on to `auth_2.13` or
//! `auth_3`. The resolver asks the [`NamingVariantPolicy`] for the names to
//! try, queries each metadata document in order and returns the first one
//! the repository serves. Individual failures are logged and folded into a
//! single [`ResolveError::NotFound`] naming the artefact as requested.

use super::coordinate::{ArtefactCoordinate, RepositoryLayout};
use super::download::ArtefactDownloader;
use super::metadata::VersionMetadata;
use super::naming::NamingVariantPolicy;
use log::{debug, info};

/// Errors arising from version resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No candidate name yielded a metadata document.
    #[error("failed to find metadata for {group}:{artifact} (tried: {})", tried.join(", "))]
    NotFound {
        /// The group identifier as requested.
        group: String,
        /// The artifact name as requested, before any substitution.
        artifact: String,
        /// The candidate names that were queried, in order.
        tried: Vec<String>,
    },
}

/// Resolves the latest version of an artefact against a repository.
///
/// Holds no state between calls; one resolver may serve any number of
/// coordinates.
pub struct VersionResolver<'a> {
    downloader: &'a dyn ArtefactDownloader,
    layout: &'a RepositoryLayout,
    policy: &'a NamingVariantPolicy,
}

impl<'a> VersionResolver<'a> {
    /// Create a resolver over `downloader` using `layout` for URLs and
    /// `policy` for naming variants.
    #[must_use]
    pub fn new(
        downloader: &'a dyn ArtefactDownloader,
        layout: &'a RepositoryLayout,
        policy: &'a NamingVariantPolicy,
    ) -> Self {
        Self {
            downloader,
            layout,
            policy,
        }
    }

    /// Query the repository for the coordinate's version metadata.
    ///
    /// Candidates are tried in the policy's fixed order and the search stops
    /// at the first document served with a success status.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] when every candidate fails,
    /// whatever the individual causes.
    pub fn resolve_latest(
        &self,
        coordinate: &ArtefactCoordinate,
    ) -> Result<VersionMetadata, ResolveError> {
        let candidates = self
            .policy
            .candidate_names(coordinate.artifact(), coordinate.variant());
        let mut tried = Vec::with_capacity(candidates.len());
        debug!(
            "resolving {coordinate} against {} (variants: {})",
            self.layout.base_url(),
            self.policy.candidates().join(", ")
        );

        for candidate in candidates {
            let url = self.layout.metadata_url(coordinate.group(), &candidate);
            debug!("querying {url}");
            match self.downloader.fetch_metadata(&url) {
                Ok(metadata) => {
                    info!(
                        "resolved {coordinate} as {} (latest {}, release {})",
                        metadata.artifact(),
                        metadata.latest(),
                        metadata.release()
                    );
                    return Ok(metadata);
                }
                Err(e) => debug!("candidate {candidate} unavailable: {e}"),
            }
            tried.push(candidate);
        }

        Err(ResolveError::NotFound {
            group: coordinate.group().to_owned(),
            artifact: coordinate.artifact().to_owned(),
            tried,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artefact::download::{DownloadError, MockArtefactDownloader};
    use rstest::{fixture, rstest};
    use std::sync::{Arc, Mutex};

    const BASE: &str = "https://repo.test";

    #[fixture]
    fn layout() -> RepositoryLayout {
        RepositoryLayout::new(BASE)
    }

    fn url_for(artifact: &str) -> String {
        format!("{BASE}/uk/gov/hmrc/{artifact}/maven-metadata.xml")
    }

    fn not_found(url: &str) -> DownloadError {
        DownloadError::HttpStatus {
            url: url.to_owned(),
            status: 404,
        }
    }

    /// A mock that serves metadata only for `available`, recording every URL.
    fn recording_downloader(
        available: &'static [&'static str],
    ) -> (MockArtefactDownloader, Arc<Mutex<Vec<String>>>) {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requested);
        let mut downloader = MockArtefactDownloader::new();
        downloader.expect_fetch_metadata().returning(move |url| {
            log.lock().expect("lock").push(url.to_owned());
            available
                .iter()
                .find(|name| url == url_for(name))
                .map(|name| VersionMetadata::new(*name, "uk.gov.hmrc", "2.0.0", "1.9.0"))
                .ok_or_else(|| not_found(url))
        });
        (downloader, requested)
    }

    fn coordinate(artifact: &str) -> ArtefactCoordinate {
        ArtefactCoordinate::new("uk.gov.hmrc", artifact).expect("valid coordinate")
    }

    #[rstest]
    fn tries_variants_newest_first_and_stops_at_first_success(layout: RepositoryLayout) {
        let (downloader, requested) = recording_downloader(&["foo_2.12", "foo_2.11"]);
        let policy = NamingVariantPolicy::scala();
        let resolver = VersionResolver::new(&downloader, &layout, &policy);

        let metadata = resolver
            .resolve_latest(&coordinate("foo_2.12"))
            .expect("resolved");

        assert_eq!(metadata.artifact(), "foo_2.12");
        assert_eq!(
            *requested.lock().expect("lock"),
            [url_for("foo_3"), url_for("foo_2.13"), url_for("foo_2.12")]
        );
    }

    #[rstest]
    fn newest_variant_wins_when_available(layout: RepositoryLayout) {
        let (downloader, requested) = recording_downloader(&["foo_3", "foo_2.13"]);
        let policy = NamingVariantPolicy::scala();
        let resolver = VersionResolver::new(&downloader, &layout, &policy);

        let metadata = resolver
            .resolve_latest(&coordinate("foo_2.12"))
            .expect("resolved");

        assert_eq!(metadata.artifact(), "foo_3");
        assert_eq!(requested.lock().expect("lock").len(), 1);
    }

    #[rstest]
    fn explicit_variant_tries_exactly_one_candidate(layout: RepositoryLayout) {
        let (downloader, requested) = recording_downloader(&["foo_3", "foo_2.11"]);
        let policy = NamingVariantPolicy::scala();
        let resolver = VersionResolver::new(&downloader, &layout, &policy);

        let metadata = resolver
            .resolve_latest(&coordinate("foo_2.13").with_variant("2.11"))
            .expect("resolved");

        assert_eq!(metadata.artifact(), "foo_2.11");
        assert_eq!(*requested.lock().expect("lock"), [url_for("foo_2.11")]);
    }

    #[rstest]
    fn unsuffixed_name_issues_one_request(layout: RepositoryLayout) {
        let (downloader, requested) = recording_downloader(&["frontend"]);
        let policy = NamingVariantPolicy::scala();
        let resolver = VersionResolver::new(&downloader, &layout, &policy);

        resolver
            .resolve_latest(&coordinate("frontend"))
            .expect("resolved");

        assert_eq!(*requested.lock().expect("lock"), [url_for("frontend")]);
    }

    #[rstest]
    fn all_failures_report_the_requested_name(layout: RepositoryLayout) {
        let (downloader, requested) = recording_downloader(&[]);
        let policy = NamingVariantPolicy::scala();
        let resolver = VersionResolver::new(&downloader, &layout, &policy);

        let err = resolver
            .resolve_latest(&coordinate("foo_2.12"))
            .expect_err("not found");

        let ResolveError::NotFound {
            artifact, tried, ..
        } = &err;
        assert_eq!(artifact, "foo_2.12");
        assert_eq!(tried, &["foo_3", "foo_2.13", "foo_2.12", "foo_2.11"]);
        assert_eq!(requested.lock().expect("lock").len(), 4);
        assert!(err.to_string().contains("uk.gov.hmrc:foo_2.12"));
    }

    #[rstest]
    fn transport_errors_fall_through_to_next_candidate(layout: RepositoryLayout) {
        let mut downloader = MockArtefactDownloader::new();
        downloader
            .expect_fetch_metadata()
            .withf(|url| *url == url_for("foo_3"))
            .times(1)
            .returning(|url| {
                Err(DownloadError::Network {
                    url: url.to_owned(),
                    reason: "connection reset".to_owned(),
                })
            });
        downloader
            .expect_fetch_metadata()
            .withf(|url| *url == url_for("foo_2.13"))
            .times(1)
            .returning(|_| Ok(VersionMetadata::new("foo_2.13", "uk.gov.hmrc", "1.0.0", "1.0.0")));
        let policy = NamingVariantPolicy::scala();
        let resolver = VersionResolver::new(&downloader, &layout, &policy);

        let metadata = resolver
            .resolve_latest(&coordinate("foo_2.12"))
            .expect("resolved");
        assert_eq!(metadata.artifact(), "foo_2.13");
    }
}
