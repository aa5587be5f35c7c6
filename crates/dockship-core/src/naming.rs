//! Registry image references: `<tag_prefix>/<project>:<version>`.

/// Where the version part of an image reference comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionSource<'a> {
    /// `[docker].version` override, if configured
    pub docker_version: Option<&'a str>,
    pub project_version: &'a str,
}

impl<'a> VersionSource<'a> {
    pub fn resolve(&self) -> &'a str {
        self.docker_version.unwrap_or(self.project_version)
    }
}

/// Version-tagged image reference.
pub fn image_name(tag_prefix: &str, project: &str, version: VersionSource<'_>) -> String {
    format!("{tag_prefix}/{project}:{}", version.resolve())
}

/// Commit-pinned image reference. Ignores any version override.
pub fn image_name_by_commit(tag_prefix: &str, project: &str, short_commit: &str) -> String {
    format!("{tag_prefix}/{project}:{short_commit}")
}

/// Split `repo:tag` into its repository and tag.
///
/// A colon inside the registry host (`host:5000/app`) is not a tag separator.
pub fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.rfind(':') {
        Some(idx) if !reference[idx + 1..].contains('/') => {
            (&reference[..idx], Some(&reference[idx + 1..]))
        }
        _ => (reference, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn project_version_used_without_override() {
        let source = VersionSource {
            docker_version: None,
            project_version: "2.0.1",
        };
        assert_eq!(
            image_name("registry.local/team", "orders", source),
            "registry.local/team/orders:2.0.1"
        );
    }

    #[test]
    fn override_wins_over_project_version() {
        let source = VersionSource {
            docker_version: Some("stable"),
            project_version: "2.0.1",
        };
        assert_eq!(
            image_name("registry.local/team", "orders", source),
            "registry.local/team/orders:stable"
        );
    }

    #[test]
    fn commit_name_uses_commit() {
        assert_eq!(
            image_name_by_commit("registry.local/team", "orders", "abc123"),
            "registry.local/team/orders:abc123"
        );
    }

    #[test]
    fn split_reference_handles_registry_port() {
        assert_eq!(
            split_reference("host:5000/team/app:1.0"),
            ("host:5000/team/app", Some("1.0"))
        );
        assert_eq!(split_reference("host:5000/team/app"), ("host:5000/team/app", None));
        assert_eq!(split_reference("app"), ("app", None));
    }

    proptest! {
        #[test]
        fn name_is_exact_concatenation(
            prefix in "[a-z0-9.]{1,12}(/[a-z0-9]{1,8}){0,2}",
            project in "[a-z][a-z0-9-]{0,15}",
            version in "[0-9a-z.]{1,10}",
        ) {
            let source = VersionSource { docker_version: None, project_version: &version };
            prop_assert_eq!(
                image_name(&prefix, &project, source),
                format!("{prefix}/{project}:{version}")
            );
        }

        #[test]
        fn naming_is_deterministic(
            project in "[a-z][a-z0-9-]{0,15}",
            version in "[0-9.]{1,8}",
            override_version in proptest::option::of("[a-z0-9]{1,8}"),
        ) {
            let source = VersionSource {
                docker_version: override_version.as_deref(),
                project_version: &version,
            };
            prop_assert_eq!(
                image_name("reg/team", &project, source),
                image_name("reg/team", &project, source)
            );
        }
    }
}
