use std::fmt;
use std::path::Path;

use dockship_core::{DockshipConfig, ProjectFacts, RevisionInfo, RevisionResolver, resolve_artifact};
use dockship_engine::{ContainerEngine, DockerCli, Kubectl};

#[derive(Debug, Default, Clone)]
struct CheckResult {
    passed: bool,
    detail: String,
}

impl CheckResult {
    fn ok(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
        }
    }

    fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

#[derive(Debug, Default)]
struct DoctorReport {
    config: CheckResult,
    docker: CheckResult,
    kubectl: CheckResult,
    git: CheckResult,
    artifact: CheckResult,
}

impl DoctorReport {
    fn checks(&self) -> [(&'static str, &CheckResult); 5] {
        [
            ("dockship.toml", &self.config),
            ("docker", &self.docker),
            ("kubectl", &self.kubectl),
            ("git", &self.git),
            ("artifact", &self.artifact),
        ]
    }

    fn all_passed(&self) -> bool {
        self.checks().iter().all(|(_, c)| c.passed)
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, check) in self.checks() {
            writeln!(f, "[{}] {name:<14} {}", check.icon(), check.detail)?;
        }
        Ok(())
    }
}

fn describe_revision(rev: &RevisionInfo) -> String {
    if rev.tags.is_empty() {
        format!("{} on {}", rev.short_commit, rev.branch)
    } else {
        format!("{} on {} ({})", rev.short_commit, rev.branch, rev.tags.join(", "))
    }
}

/// Report on every prerequisite without stopping at the first failure.
pub async fn doctor(dir: &Path) -> anyhow::Result<()> {
    let mut report = DoctorReport::default();

    let revision = RevisionResolver::new(dir).resolve();
    let facts = match DockshipConfig::load(dir) {
        Ok(config) => match ProjectFacts::resolve(dir, &config, revision.clone()) {
            Ok(facts) => {
                report.config = CheckResult::ok(format!("image {}", facts.image_name()));
                Some(facts)
            }
            Err(e) => {
                report.config = CheckResult::fail(e.to_string());
                None
            }
        },
        Err(e) => {
            report.config = CheckResult::fail(e.to_string());
            None
        }
    };

    report.docker = match DockerCli::new().version().await {
        Ok(version) => CheckResult::ok(format!("server {version}")),
        Err(e) => CheckResult::fail(e.to_string()),
    };

    report.kubectl = match Kubectl::new().client_version().await {
        Ok(version) => CheckResult::ok(version),
        Err(e) => CheckResult::fail(e.to_string()),
    };

    report.git = match facts.as_ref().and_then(ProjectFacts::revision).or(revision.as_ref()) {
        Some(rev) => CheckResult::ok(describe_revision(rev)),
        None => CheckResult::fail("no branch checked out in a git repository"),
    };

    report.artifact = match facts.as_ref().map(|f| resolve_artifact(f.dist_dir())) {
        Some(Ok(path)) => CheckResult::ok(path.display().to_string()),
        Some(Err(e)) => CheckResult::fail(e.to_string()),
        None => CheckResult::fail("skipped: configuration incomplete"),
    };

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed; see above for details");
    }

    Ok(())
}
