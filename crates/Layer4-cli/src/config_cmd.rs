//! `commitwise config` subcommand

use crate::args::ConfigAction;
use crate::ui;
use anyhow::{bail, Context};
use commitwise_foundation::{
    CommitwiseConfig, ConfigLoader, YamlStore, PROJECT_CONFIG_FILE, USER_CONFIG_FILE,
};
use std::path::Path;

pub fn run(action: &ConfigAction, repo: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => show(repo),
        ConfigAction::Init { project, force } => init(repo, *project, *force),
    }
}

fn show(repo: &Path) -> anyhow::Result<()> {
    let loader = ConfigLoader::new(Some(repo));
    for path in loader.existing_files() {
        ui::info(&format!("loaded {}", path.display()));
    }

    let mut config = loader.load_all()?;
    if let Some(key) = config.provider.api_key.as_deref() {
        config.provider.api_key = Some(mask_key(key));
    }

    let yaml = serde_yaml::to_string(&config).context("failed to render configuration")?;
    print!("{}", yaml);
    Ok(())
}

fn init(repo: &Path, project: bool, force: bool) -> anyhow::Result<()> {
    let (store, filename) = if project {
        (YamlStore::project(repo), PROJECT_CONFIG_FILE)
    } else {
        (YamlStore::global()?, USER_CONFIG_FILE)
    };

    let path = store.file_path(filename);
    if store.exists(filename) && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    store.save(filename, &CommitwiseConfig::with_defaults())?;
    ui::success(&format!("wrote {}", path.display()));
    Ok(())
}

/// Keep only enough of a key to recognise it
fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdefghijkl"), "sk-a****");
        assert_eq!(mask_key("short"), "****");
    }

    #[test]
    fn test_project_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), true, false).unwrap();
        assert!(dir.path().join(PROJECT_CONFIG_FILE).exists());

        assert!(init(dir.path(), true, false).is_err());
        init(dir.path(), true, true).unwrap();

        let written: CommitwiseConfig = YamlStore::project(dir.path())
            .load(PROJECT_CONFIG_FILE)
            .unwrap();
        assert_eq!(written, CommitwiseConfig::with_defaults());
    }
}
