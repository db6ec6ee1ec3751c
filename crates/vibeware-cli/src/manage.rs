//! # vibeware list / vibeware remove
//!
//! Registry inspection and manual cleanup.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;
use vibeware_core::{PathsConfig, RegistryPatcher};
use vibeware_proto::GameName;

/// Prints every metadata record in the registry.
pub fn list(registry: &RegistryPatcher, out: &mut dyn Write) -> Result<()> {
    let entries = registry
        .entries()
        .with_context(|| format!("Failed to read registry {}", registry.path().display()))?;

    if entries.is_empty() {
        writeln!(out, "No games registered in {}", registry.path().display())?;
        return Ok(());
    }

    writeln!(out, "📋 {} registered games:", entries.len())?;
    for entry in entries {
        writeln!(out, "\n{} ({})", entry.key, entry.name)?;
        writeln!(out, "   Prompt: {}", entry.prompt)?;
        writeln!(out, "   Description: {}", entry.description)?;
        writeln!(out, "   Controls: {}", entry.controls)?;
    }
    Ok(())
}

/// Removes `name` from the registry and deletes its source file.
///
/// Returns false when the registry rollback was incomplete.
pub fn remove(root: &Path, paths: &PathsConfig, name: &str, out: &mut dyn Write) -> Result<bool> {
    let name = GameName::parse(name)?;
    let registry = RegistryPatcher::new(paths.registry_path(root));

    let report = registry.rollback(&name);
    if let Some(error) = &report.error {
        writeln!(out, "❌ Could not update registry: {error}")?;
    } else {
        let mark = |removed: bool| if removed { "✅" } else { "⚠️ " };
        writeln!(out, "{} import", mark(report.import_removed))?;
        writeln!(out, "{} scene entry", mark(report.array_entry_removed))?;
        writeln!(out, "{} metadata", mark(report.metadata_removed))?;
    }

    let artifact = paths.artifact_path(root, &name);
    match std::fs::remove_file(&artifact) {
        Ok(()) => {
            info!(path = %artifact.display(), "Deleted game source");
            writeln!(out, "🗑️  Deleted {}", artifact.display())?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("Failed to delete {}", artifact.display())),
    }

    if report.is_complete() {
        writeln!(out, "\n✅ {name} removed")?;
    } else {
        writeln!(
            out,
            "\n⚠️  {name} was not fully removed from {}; check it by hand",
            registry.path().display()
        )?;
    }
    Ok(report.is_complete())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vibeware_core::GameMetadata;

    const REGISTRY: &str = "import CatchGame from './CatchGame';

export const MICROGAME_SCENES = [
    CatchGame,
    // NEW_GAME_MARKER - Do not remove this comment
];

export const MICROGAME_METADATA = [
    {
        key: 'CatchGame',
        name: 'Catch Game',
        prompt: 'CATCH!',
        description: 'Catch the falling fruit',
        controls: 'Arrow keys'
    },
    // NEW_METADATA_MARKER - Do not remove this comment
];
";

    fn project() -> (TempDir, PathsConfig) {
        let dir = TempDir::new().unwrap();
        let paths = PathsConfig::default();
        let registry = paths.registry_path(dir.path());
        std::fs::create_dir_all(registry.parent().unwrap()).unwrap();
        std::fs::write(&registry, REGISTRY).unwrap();
        (dir, paths)
    }

    #[test]
    fn test_list_prints_records() {
        let (dir, paths) = project();
        let mut out = Vec::new();
        list(&RegistryPatcher::new(paths.registry_path(dir.path())), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1 registered games"));
        assert!(text.contains("CatchGame (Catch Game)"));
        assert!(text.contains("Controls: Arrow keys"));
    }

    #[test]
    fn test_list_missing_registry_is_error() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        assert!(list(&RegistryPatcher::new(dir.path().join("nope.ts")), &mut out).is_err());
    }

    #[test]
    fn test_remove_restores_registry_and_deletes_source() {
        let (dir, paths) = project();
        let name = GameName::parse("SwatGame").unwrap();
        let registry = RegistryPatcher::new(paths.registry_path(dir.path()));
        let metadata = GameMetadata {
            display_name: name.display_name(),
            prompt: "SWAT!".to_string(),
            description: "Swat the fly".to_string(),
            controls: "Mouse".to_string(),
        };
        assert!(registry.update(&name, &metadata));
        let artifact = paths.artifact_path(dir.path(), &name);
        std::fs::write(&artifact, "class SwatGame {}\n").unwrap();

        let mut out = Vec::new();
        let complete = remove(dir.path(), &paths, "SwatGame", &mut out).unwrap();

        assert!(complete);
        assert!(!artifact.exists());
        assert_eq!(std::fs::read_to_string(registry.path()).unwrap(), REGISTRY);
    }

    #[test]
    fn test_remove_unknown_game_is_incomplete() {
        let (dir, paths) = project();
        let mut out = Vec::new();

        let complete = remove(dir.path(), &paths, "GhostGame", &mut out).unwrap();

        assert!(!complete);
        assert!(String::from_utf8(out).unwrap().contains("not fully removed"));
    }

    #[test]
    fn test_remove_rejects_invalid_name() {
        let (dir, paths) = project();
        let mut out = Vec::new();
        assert!(remove(dir.path(), &paths, "not a name", &mut out).is_err());
    }
}
