use std::path::Path;

use super::Project;

pub fn image_name(dir: &Path, commit: bool) -> anyhow::Result<()> {
    let project = Project::load(dir)?;
    let name = if commit {
        project.facts.current_commit_image(&project.resolver)?
    } else {
        project.facts.image_name().to_owned()
    };
    println!("{name}");
    Ok(())
}
