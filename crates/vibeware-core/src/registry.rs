//! Registry patching.
//!
//! The registry is a TypeScript source file with three zones:
//!
//! ```text
//! import CatchGame from './CatchGame';          <- import section
//!
//! export const MICROGAME_SCENES = [
//!     CatchGame,
//!     // NEW_GAME_MARKER - Do not remove this comment
//! ];
//!
//! export const MICROGAME_METADATA = [
//!     {
//!         key: 'CatchGame',
//!         name: 'Catch Game',
//!         prompt: 'CATCH!',
//!         description: '...',
//!         controls: '...'
//!     },
//!     // NEW_METADATA_MARKER - Do not remove this comment
//! ];
//! ```
//!
//! Entries are inserted immediately before their marker line, and the import
//! goes after the last existing import line. Removal is the line-pattern inverse
//! of insertion. Neither is a structural parse: a registry formatted
//! differently from what the inserter writes may not be fully cleaned up.

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use vibeware_proto::{GameName, GameSpec};

/// Anchor for the scene array.
pub const GAME_MARKER: &str = "// NEW_GAME_MARKER - Do not remove this comment";
/// Anchor for the metadata array.
pub const METADATA_MARKER: &str = "// NEW_METADATA_MARKER - Do not remove this comment";

/// Indentation of fields inside a metadata record, relative to its braces.
const FIELD_INDENT: &str = "    ";

/// Errors raised while patching the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The game is already imported. Not a failure of the registry itself.
    #[error("{0} already exists in registry")]
    AlreadyRegistered(GameName),

    #[error("registry marker `{0}` not found")]
    MarkerMissing(&'static str),

    #[error("registry marker `{marker}` appears {count} times, expected exactly once")]
    MarkerNotUnique { marker: &'static str, count: usize },

    #[error("failed to read registry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write registry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Display metadata written for each game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMetadata {
    pub display_name: String,
    pub prompt: String,
    pub description: String,
    pub controls: String,
}

impl GameMetadata {
    /// Derives registry metadata from a game spec.
    pub fn from_spec(spec: &GameSpec) -> Self {
        Self {
            display_name: spec.name.display_name(),
            prompt: spec.prompt.clone(),
            description: spec.description.clone(),
            controls: spec.controls.clone(),
        }
    }
}

/// What an insertion changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// False when a metadata record for the key already existed.
    pub metadata_inserted: bool,
}

/// What a rollback managed to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub import_removed: bool,
    pub array_entry_removed: bool,
    pub metadata_removed: bool,
    /// Set when the registry could not be read or written.
    pub error: Option<String>,
}

impl RollbackReport {
    /// True when all three parts of the entry were found and removed.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
            && self.import_removed
            && self.array_entry_removed
            && self.metadata_removed
    }

    /// True when nothing was removed.
    pub fn is_noop(&self) -> bool {
        !self.import_removed && !self.array_entry_removed && !self.metadata_removed
    }
}

/// One metadata record read back from the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    pub key: String,
    pub name: String,
    pub prompt: String,
    pub description: String,
    pub controls: String,
}

/// Patches the registry file in place.
///
/// There is no locking: exactly one process is assumed to edit the registry
/// at a time.
#[derive(Debug, Clone)]
pub struct RegistryPatcher {
    path: PathBuf,
}

impl RegistryPatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds `name` to the registry.
    ///
    /// Returns true only if the file was rewritten. An already registered game
    /// is skipped with a warning; any other error is logged. Both yield false.
    pub fn update(&self, name: &GameName, metadata: &GameMetadata) -> bool {
        match self.try_update(name, metadata) {
            Ok(outcome) => {
                if !outcome.metadata_inserted {
                    warn!(game = %name, "Metadata already present, skipped metadata insertion");
                }
                info!(game = %name, path = %self.path.display(), "Updated registry");
                true
            }
            Err(RegistryError::AlreadyRegistered(name)) => {
                warn!(game = %name, "Game already exists in registry, skipping");
                false
            }
            Err(e) => {
                error!(game = %name, error = %e, "Error updating registry");
                false
            }
        }
    }

    /// Adds `name` to the registry, reporting errors to the caller.
    ///
    /// The write is a plain overwrite: an interrupted write can leave the
    /// file truncated.
    pub fn try_update(
        &self,
        name: &GameName,
        metadata: &GameMetadata,
    ) -> Result<UpdateOutcome, RegistryError> {
        let content = self.read()?;
        let (patched, outcome) = insert_game(&content, name, metadata)?;
        std::fs::write(&self.path, patched).map_err(|source| RegistryError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(outcome)
    }

    /// Removes `name` from the registry on a best-effort basis.
    ///
    /// Never fails: problems are logged and reflected in the report.
    pub fn rollback(&self, name: &GameName) -> RollbackReport {
        let content = match self.read() {
            Ok(content) => content,
            Err(e) => {
                warn!(game = %name, error = %e, "Could not rollback registry");
                return RollbackReport {
                    error: Some(e.to_string()),
                    ..RollbackReport::default()
                };
            }
        };

        let (patched, mut report) = remove_game(&content, name);

        if report.is_noop() {
            debug!(game = %name, "Nothing to roll back");
            return report;
        }

        if let Err(e) = std::fs::write(&self.path, patched) {
            warn!(game = %name, error = %e, "Could not rollback registry");
            report.error = Some(e.to_string());
            return report;
        }

        if report.is_complete() {
            info!(game = %name, "Rolled back registry changes");
        } else {
            warn!(
                game = %name,
                import_removed = report.import_removed,
                array_entry_removed = report.array_entry_removed,
                metadata_removed = report.metadata_removed,
                "Registry rollback was incomplete"
            );
        }
        report
    }

    /// Returns true when `name` is already imported by the registry.
    pub fn contains(&self, name: &GameName) -> Result<bool, RegistryError> {
        Ok(self.read()?.lines().any(|line| is_import_of(line, name.as_str())))
    }

    /// Reads all metadata records currently in the registry.
    pub fn entries(&self) -> Result<Vec<MetadataRecord>, RegistryError> {
        Ok(parse_metadata(&self.read()?))
    }

    fn read(&self) -> Result<String, RegistryError> {
        std::fs::read_to_string(&self.path).map_err(|source| RegistryError::Read {
            path: self.path.clone(),
            source,
        })
    }
}

/// Returns `content` with `name` added to all three zones.
pub fn insert_game(
    content: &str,
    name: &GameName,
    metadata: &GameMetadata,
) -> Result<(String, UpdateOutcome), RegistryError> {
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();

    if lines.iter().any(|line| is_import_of(line, name.as_str())) {
        return Err(RegistryError::AlreadyRegistered(name.clone()));
    }

    let game_idx = unique_marker_line(&lines, GAME_MARKER)?;
    unique_marker_line(&lines, METADATA_MARKER)?;

    // Scene array entry
    let indent = leading_whitespace(&lines[game_idx]).to_string();
    lines.insert(game_idx, format!("{indent}{name},"));

    // Import after the last import line
    let import = import_line(name.as_str());
    match lines.iter().rposition(|line| line.trim_start().starts_with("import ")) {
        Some(last) => lines.insert(last + 1, import),
        None => lines.insert(0, import),
    }

    // Metadata record
    let key_field = key_field(name.as_str());
    let metadata_inserted = if lines.iter().any(|line| line.contains(&key_field)) {
        false
    } else {
        let meta_idx = unique_marker_line(&lines, METADATA_MARKER)?;
        let indent = leading_whitespace(&lines[meta_idx]).to_string();
        let tail = lines.split_off(meta_idx);
        lines.extend(metadata_block(&indent, name, metadata));
        lines.extend(tail);
        true
    };

    Ok((lines.join("\n"), UpdateOutcome { metadata_inserted }))
}

/// Returns `content` with `name` removed from all three zones, plus a report of
/// what was found.
pub fn remove_game(content: &str, name: &GameName) -> (String, RollbackReport) {
    let mut lines: Vec<&str> = content.split('\n').collect();
    let mut report = RollbackReport::default();

    let before = lines.len();
    lines.retain(|line| !is_import_of(line, name.as_str()));
    report.import_removed = lines.len() < before;

    let entry = format!("{name},");
    let before = lines.len();
    lines.retain(|line| line.trim() != entry);
    report.array_entry_removed = lines.len() < before;

    let key_field = key_field(name.as_str());
    let name_field = format!("name: '{}'", escape_ts_string(&name.display_name()));

    let mut i = 0;
    while i < lines.len() {
        let matches_key = lines[i].contains(&key_field);
        let matches_name = lines[i].contains(&name_field)
            && lines.get(i + 1).is_some_and(|next| next.contains("prompt:"));

        if !(matches_key || matches_name) {
            i += 1;
            continue;
        }

        match record_span(&lines, i) {
            Some((start, end)) => {
                lines.drain(start..=end);
                report.metadata_removed = true;
                i = start;
            }
            None => {
                warn!(
                    game = %name,
                    line = i + 1,
                    "Could not find the bounds of the metadata record"
                );
                i += 1;
            }
        }
    }

    (lines.join("\n"), report)
}

/// Finds the line range of the metadata record containing line `hit`.
///
/// Starts at the nearest line at or above `hit` with an opening brace and ends
/// where brace depth returns to zero, taking one following comma-only line too.
fn record_span(lines: &[&str], hit: usize) -> Option<(usize, usize)> {
    let start = (0..=hit).rev().find(|&j| lines[j].contains('{'))?;

    let mut depth: i64 = 0;
    for (k, line) in lines.iter().enumerate().skip(start) {
        depth += count(line, '{') - count(line, '}');
        if depth <= 0 && line.contains('}') {
            let end = match lines.get(k + 1) {
                Some(next) if next.trim() == "," => k + 1,
                _ => k,
            };
            return Some((start, end));
        }
    }
    None
}

#[allow(clippy::cast_possible_wrap)]
fn count(line: &str, c: char) -> i64 {
    line.chars().filter(|&ch| ch == c).count() as i64
}

/// Escapes a value for a single-quoted TypeScript string literal.
pub fn escape_ts_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Reads a single-quoted TypeScript string literal from the start of `text`.
///
/// Returns the unescaped value, or `None` if the literal is not terminated.
pub fn parse_ts_string(text: &str) -> Option<String> {
    let mut chars = text.strip_prefix('\'')?.chars();
    let mut value = String::new();

    while let Some(c) = chars.next() {
        match c {
            '\'' => return Some(value),
            '\\' => match chars.next()? {
                'n' => value.push('\n'),
                'r' => value.push('\r'),
                't' => value.push('\t'),
                other => value.push(other),
            },
            other => value.push(other),
        }
    }
    None
}

/// Reads every metadata record in `content`.
///
/// Understands the record layout the inserter writes: one `field: '...'` per
/// line between a line opening a brace and the line closing it.
pub fn parse_metadata(content: &str) -> Vec<MetadataRecord> {
    let mut records = Vec::new();
    let mut current: Option<MetadataRecord> = None;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed == "{" {
            current = Some(MetadataRecord::default());
            continue;
        }

        if current.is_none() {
            continue;
        }

        if trimmed.starts_with('}') {
            if let Some(record) = current.take().filter(|r| !r.key.is_empty()) {
                records.push(record);
            }
            continue;
        }

        let Some(record) = current.as_mut() else {
            continue;
        };

        let Some((field, rest)) = trimmed.split_once(": ") else {
            continue;
        };
        let Some(value) = parse_ts_string(rest) else {
            continue;
        };

        match field {
            "key" => record.key = value,
            "name" => record.name = value,
            "prompt" => record.prompt = value,
            "description" => record.description = value,
            "controls" => record.controls = value,
            _ => {}
        }
    }

    records
}

fn import_line(name: &str) -> String {
    format!("import {name} from './{name}';")
}

fn key_field(name: &str) -> String {
    format!("key: '{name}'")
}

/// True if `line` is an import statement whose default binding is `name`.
fn is_import_of(line: &str, name: &str) -> bool {
    line.trim_start()
        .strip_prefix("import ")
        .and_then(|rest| rest.strip_prefix(name))
        .is_some_and(|rest| rest.starts_with([' ', ',', ';']) || rest.is_empty())
}

fn unique_marker_line(lines: &[String], marker: &'static str) -> Result<usize, RegistryError> {
    let hits: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(marker))
        .map(|(i, _)| i)
        .collect();

    match hits.as_slice() {
        [] => Err(RegistryError::MarkerMissing(marker)),
        [idx] => Ok(*idx),
        _ => Err(RegistryError::MarkerNotUnique {
            marker,
            count: hits.len(),
        }),
    }
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

fn metadata_block(indent: &str, name: &GameName, metadata: &GameMetadata) -> Vec<String> {
    let field = |key: &str, value: &str, last: bool| {
        format!(
            "{indent}{FIELD_INDENT}{key}: '{}'{}",
            escape_ts_string(value),
            if last { "" } else { "," }
        )
    };

    vec![
        format!("{indent}{{"),
        field("key", name.as_str(), false),
        field("name", &metadata.display_name, false),
        field("prompt", &metadata.prompt, false),
        field("description", &metadata.description, false),
        field("controls", &metadata.controls, true),
        format!("{indent}}},"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASELINE: &str = "import Phaser from 'phaser';
import CatchGame from './CatchGame';

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

    fn name(s: &str) -> GameName {
        GameName::parse(s).unwrap()
    }

    fn metadata(display: &str) -> GameMetadata {
        GameMetadata {
            display_name: display.to_string(),
            prompt: "SWAT!".to_string(),
            description: "Swat the fly".to_string(),
            controls: "Mouse".to_string(),
        }
    }

    #[test]
    fn test_insert_places_entries_before_markers() {
        let (patched, outcome) =
            insert_game(BASELINE, &name("SwatGame"), &metadata("Swat Game")).unwrap();

        assert!(outcome.metadata_inserted);
        assert!(patched.contains(
            "import CatchGame from './CatchGame';\nimport SwatGame from './SwatGame';\n"
        ));
        assert!(patched.contains(
            "    CatchGame,\n    SwatGame,\n    // NEW_GAME_MARKER - Do not remove this comment"
        ));
        assert!(patched.contains(
            "    {
        key: 'SwatGame',
        name: 'Swat Game',
        prompt: 'SWAT!',
        description: 'Swat the fly',
        controls: 'Mouse'
    },
    // NEW_METADATA_MARKER - Do not remove this comment"
        ));
    }

    #[test]
    fn test_insert_rejects_existing_import() {
        let err = insert_game(BASELINE, &name("CatchGame"), &metadata("Catch Game")).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(_)));
    }

    #[test]
    fn test_import_guard_matches_whole_name() {
        // `Catch` is a prefix of an existing import but a different game.
        let result = insert_game(BASELINE, &name("Catch"), &metadata("Catch"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_insert_skips_existing_metadata() {
        let content = BASELINE.replace("import CatchGame from './CatchGame';\n", "");
        let (patched, outcome) =
            insert_game(&content, &name("CatchGame"), &metadata("Catch Game")).unwrap();

        assert!(!outcome.metadata_inserted);
        assert_eq!(patched.matches("key: 'CatchGame'").count(), 1);
        assert!(patched.contains("import CatchGame from './CatchGame';"));
    }

    #[test]
    fn test_insert_without_imports_goes_to_top() {
        let content = BASELINE
            .replace("import Phaser from 'phaser';\n", "")
            .replace("import CatchGame from './CatchGame';\n", "");
        let (patched, _) =
            insert_game(&content, &name("SwatGame"), &metadata("Swat Game")).unwrap();
        assert!(patched.starts_with("import SwatGame from './SwatGame';\n"));
    }

    #[test]
    fn test_insert_requires_markers() {
        let content = BASELINE.replace(METADATA_MARKER, "");
        let err = insert_game(&content, &name("SwatGame"), &metadata("Swat Game")).unwrap_err();
        assert!(matches!(err, RegistryError::MarkerMissing(m) if m == METADATA_MARKER));

        let content = format!("{BASELINE}\n    {GAME_MARKER}\n");
        let err = insert_game(&content, &name("SwatGame"), &metadata("Swat Game")).unwrap_err();
        assert!(matches!(err, RegistryError::MarkerNotUnique { count: 2, .. }));
    }

    #[test]
    fn test_insert_then_remove_restores_baseline() {
        let game = name("SwatGame");
        let (patched, _) = insert_game(BASELINE, &game, &metadata(&game.display_name())).unwrap();
        let (restored, report) = remove_game(&patched, &game);

        assert!(report.is_complete(), "{report:?}");
        assert_eq!(restored, BASELINE);
    }

    #[test]
    fn test_remove_by_display_name_without_key() {
        let content = BASELINE.replace("        key: 'CatchGame',\n", "");
        let (restored, report) = remove_game(&content, &name("CatchGame"));

        assert!(report.is_complete(), "{report:?}");
        assert!(!restored.contains("Catch"));
        assert!(restored.contains(&format!("[\n    {GAME_MARKER}")));
        assert!(restored.contains(&format!("[\n    {METADATA_MARKER}")));
    }

    #[test]
    fn test_remove_takes_trailing_comma_line() {
        let content = "[\n    {\n        key: 'AGame',\n        name: 'A Game'\n    }\n    ,\n    // end\n]";
        let (restored, report) = remove_game(content, &name("AGame"));
        assert!(report.metadata_removed);
        assert_eq!(restored, "[\n    // end\n]");
    }

    #[test]
    fn test_remove_unknown_game_is_noop() {
        let (restored, report) = remove_game(BASELINE, &name("NopeGame"));
        assert!(report.is_noop());
        assert!(!report.is_complete());
        assert_eq!(restored, BASELINE);
    }

    #[test]
    fn test_remove_leaves_similar_names() {
        let game = name("SwatGame");
        let (patched, _) = insert_game(BASELINE, &game, &metadata("Swat Game")).unwrap();
        let (after, report) = remove_game(&patched, &name("Swat"));
        assert!(report.is_noop());
        assert_eq!(after, patched);
    }

    #[test]
    fn test_escape_and_parse_round_trip() {
        let value = r"It's a \ backslash";
        let escaped = escape_ts_string(value);
        assert_eq!(escaped, r"It\'s a \\ backslash");
        assert_eq!(parse_ts_string(&format!("'{escaped}',")).unwrap(), value);

        let multiline = "line one\nline two";
        assert_eq!(
            parse_ts_string(&format!("'{}'", escape_ts_string(multiline))).unwrap(),
            multiline
        );
    }

    #[test]
    fn test_parse_ts_string_unterminated() {
        assert!(parse_ts_string("'open").is_none());
        assert!(parse_ts_string("no quote").is_none());
    }

    #[test]
    fn test_parse_metadata() {
        let records = parse_metadata(BASELINE);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "CatchGame");
        assert_eq!(records[0].name, "Catch Game");
        assert_eq!(records[0].prompt, "CATCH!");
        assert_eq!(records[0].controls, "Arrow keys");
    }

    #[test]
    fn test_patcher_update_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.ts");
        std::fs::write(&path, BASELINE).unwrap();
        let patcher = RegistryPatcher::new(&path);
        let game = name("SwatGame");

        assert!(patcher.update(&game, &metadata("Swat Game")));
        let once = std::fs::read_to_string(&path).unwrap();

        assert!(!patcher.update(&game, &metadata("Swat Game")));
        let twice = std::fs::read_to_string(&path).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_patcher_contains() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.ts");
        std::fs::write(&path, BASELINE).unwrap();
        let patcher = RegistryPatcher::new(&path);

        assert!(patcher.contains(&name("CatchGame")).unwrap());
        assert!(!patcher.contains(&name("Catch")).unwrap());
        assert!(!patcher.contains(&name("SwatGame")).unwrap());

        assert!(patcher.update(&name("SwatGame"), &metadata("Swat Game")));
        assert!(patcher.contains(&name("SwatGame")).unwrap());
    }

    #[test]
    fn test_patcher_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let patcher = RegistryPatcher::new(dir.path().join("registry.ts"));
        let game = name("SwatGame");

        assert!(!patcher.update(&game, &metadata("Swat Game")));
        assert!(patcher.contains(&game).is_err());
        let report = patcher.rollback(&game);
        assert!(report.error.is_some());
        assert!(!report.is_complete());
    }
}
