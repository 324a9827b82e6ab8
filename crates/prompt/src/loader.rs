//! Prompt loader for YAML prompt definitions.
//!
//! Built-in definitions are embedded at compile time. A workspace can replace
//! any of them, or add new ones, with `.medassist/prompts/<id>.yml`.

use crate::types::{PromptDefinition, PromptListing, PromptOrigin};
use medassist_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Ids of the prompts embedded in the binary.
pub const BUILTIN_PROMPT_IDS: [&str; 3] =
    ["sql.generate", "answer.from_results", "answer.from_search"];

fn builtin_source(prompt_id: &str) -> Option<&'static str> {
    match prompt_id {
        "sql.generate" => Some(include_str!("../prompts/sql.generate.yml")),
        "answer.from_results" => Some(include_str!("../prompts/answer.from_results.yml")),
        "answer.from_search" => Some(include_str!("../prompts/answer.from_search.yml")),
        _ => None,
    }
}

/// Parse one of the embedded prompt definitions.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let source = builtin_source(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("No built-in prompt named '{}'", prompt_id)))?;

    let definition: PromptDefinition = serde_yaml::from_str(source).map_err(|e| {
        AppError::Prompt(format!("Failed to parse built-in prompt '{}': {}", prompt_id, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Load a prompt definition by ID.
///
/// A workspace override wins over the built-in definition.
///
/// # Example
/// ```no_run
/// use medassist_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "sql.generate")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);
        let definition = load_prompt_file(&prompt_file)?;
        if definition.id != prompt_id {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares id '{}', expected '{}'",
                prompt_file, definition.id, prompt_id
            )));
        }
        tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    if builtin_source(prompt_id).is_some() {
        return builtin_prompt(prompt_id);
    }

    Err(AppError::Prompt(format!(
        "Prompt not found: '{}' (no built-in and no file at {:?})",
        prompt_id, prompt_file
    )))
}

/// List all available prompt IDs, built-in first, then workspace-only ones.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<PromptListing>> {
    let dir = prompts_dir(workspace_path);
    let mut overrides: Vec<(String, PathBuf)> = Vec::new();

    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    overrides.push((stem.to_string(), path.to_path_buf()));
                }
            }
        }
    }

    let mut listings: Vec<PromptListing> = BUILTIN_PROMPT_IDS
        .iter()
        .map(|id| {
            let origin = overrides
                .iter()
                .find(|(stem, _)| stem == id)
                .map(|(_, path)| PromptOrigin::Workspace(path.clone()))
                .unwrap_or(PromptOrigin::BuiltIn);
            PromptListing {
                id: id.to_string(),
                origin,
            }
        })
        .collect();

    listings.extend(
        overrides
            .into_iter()
            .filter(|(stem, _)| !BUILTIN_PROMPT_IDS.contains(&stem.as_str()))
            .map(|(id, path)| PromptListing {
                id,
                origin: PromptOrigin::Workspace(path),
            }),
    );

    Ok(listings)
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".medassist/prompts")
}

fn load_prompt_file(prompt_file: &Path) -> AppResult<PromptDefinition> {
    let contents = std::fs::read_to_string(prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
