//! Stable identity and path mapping
//!
//! Pure helpers that derive canonical on-disk paths, manifest keys, and
//! environment variable names from platform-visible names. The derivations
//! must be stable across runs: the sanitized credential key is the sole
//! dedup key in the auto-maintained manifest section, and workflow file
//! paths are a deterministic function of `(folder path, slug(name))`.

use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static NON_ALNUM_LOWER: LazyLock<Regex> = LazyLock::new(|| Regex::new("[^a-z0-9]+").unwrap());

/// Subdirectory under the base directory that holds all workflow files
pub const WORKFLOWS_DIR: &str = "workflows";

/// Derive the manifest key for a credential name.
///
/// Lower-cases the name, collapses every non-alphanumeric run to a single
/// underscore, and trims leading/trailing underscores. The same name always
/// yields the same key, so repeated save events for one credential update a
/// single manifest entry instead of accumulating duplicates.
///
/// # Example
/// ```
/// use flowsync::identity::credential_key;
///
/// assert_eq!(credential_key("My Postgres DB"), "my_postgres_db");
/// assert_eq!(credential_key("  Slack (team) "), "slack_team");
/// ```
pub fn credential_key(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_ALNUM_LOWER
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Propose an environment variable name for a credential field.
///
/// Both parts get the same sanitization as [`credential_key`], upper-cased,
/// joined with an underscore: `("My API", "access token")` becomes
/// `MY_API_ACCESS_TOKEN`. Used when a field has no existing mapping; a
/// user-edited mapping is never overwritten with a proposed name.
pub fn env_var_name(credential_name: &str, field_name: &str) -> String {
    format!(
        "{}_{}",
        credential_key(credential_name).to_uppercase(),
        credential_key(field_name).to_uppercase()
    )
}

/// Slugify a workflow name for use as a file name.
///
/// Lower-cased ASCII with non-alphanumeric runs collapsed to hyphens.
pub fn slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_ALNUM_LOWER
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Compute the canonical file path for a workflow.
///
/// `{base_dir}/workflows/{folder_path}/{slug(name)}.json`, with the folder
/// segment omitted when the workflow lives at the root.
pub fn workflow_file_path(base_dir: &Path, name: &str, folder_path: Option<&str>) -> PathBuf {
    let filename = format!("{}.json", slug(name));
    let mut path = base_dir.join(WORKFLOWS_DIR);
    if let Some(folder) = folder_path.filter(|f| !f.is_empty()) {
        path = path.join(folder);
    }
    path.join(filename)
}

/// Derive a workflow's folder path from its platform-supplied parent chain.
///
/// The platform attaches the containing folder as a `parentFolder` object
/// that links to its own parent, leaf to root. Walks the chain and joins the
/// folder names root-first with `/`. Returns `None` for root-level workflows.
pub fn folder_path_from_parents(workflow: &Value) -> Option<String> {
    let mut parts = Vec::new();
    let mut folder = workflow.get("parentFolder");
    while let Some(current) = folder {
        if current.is_null() {
            break;
        }
        if let Some(name) = current.get("name").and_then(Value::as_str) {
            parts.push(name.to_string());
        }
        folder = current.get("parentFolder");
    }
    if parts.is_empty() {
        None
    } else {
        parts.reverse();
        Some(parts.join("/"))
    }
}
