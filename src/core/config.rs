use crate::models::config::ConfigFile;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub fn load(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("parse config {}", path.display()))?;
    Ok(config)
}

pub fn save(path: &Path, config: &ConfigFile) -> Result<()> {
    let content = toml::to_string_pretty(config).context("serialize config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    let mut tmp = tempfile::NamedTempFile::new_in(
        path.parent().unwrap_or_else(|| Path::new(".")),
    )
    .context("create temp config")?;
    tmp.write_all(content.as_bytes())
        .context("write config")?;
    tmp.flush().ok();

    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(0o600);
        tmp.as_file()
            .set_permissions(perm)
            .context("set permissions on temp config")?;
    }

    tmp.persist(path)
        .map_err(|err| anyhow::anyhow!("persist config: {}", err))?;
    Ok(())
}
