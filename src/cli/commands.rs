//! Command dispatch: one handler per subcommand

use std::io;
use std::path::Path;

use clap::CommandFactory;
use itertools::Itertools;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, Edit};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{self, Block, BlockIndex, DomainError};
use crate::infrastructure::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "blocktree", &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => _config(cli, command),
        Commands::Show => _show(cli),
        Commands::Find { id } => _find(cli, id),
        Commands::Path { id } => _path(cli, id),
        Commands::Parent { id } => _parent(cli, id),
        Commands::Check => _check(cli),
        Commands::Insert {
            parent,
            kind,
            id,
            index,
            data,
        } => {
            let block = build_block(id.as_deref(), kind, data.as_deref())?;
            let edit = Edit::Insert {
                parent: parent.clone(),
                block,
                index: *index,
            };
            commit(cli, vec![edit])
        }
        Commands::Update {
            id,
            set,
            unset,
            kind,
        } => {
            let edit = Edit::Update {
                id: id.clone(),
                kind: kind.clone(),
                set: parse_assignments(set)?,
                unset: unset.clone(),
            };
            commit(cli, vec![edit])
        }
        Commands::Remove { id } => commit(cli, vec![Edit::Remove { id: id.clone() }]),
        Commands::Reorder { parent, from, to } => commit(
            cli,
            vec![Edit::Reorder {
                parent: parent.clone(),
                from: *from,
                to: *to,
            }],
        ),
        Commands::Move { id, to, index } => commit(
            cli,
            vec![Edit::Move {
                id: id.clone(),
                to: to.clone(),
                index: *index,
            }],
        ),
        Commands::Apply { script } => {
            let container = container_for(document_path(cli)?)?;
            let edits = container.documents.load_script(script)?;
            debug!("apply: {} edits from {}", edits.len(), script.display());
            commit_with(cli, &container, edits)
        }
    }
}

fn document_path(cli: &Cli) -> CliResult<&Path> {
    cli.file.as_deref().ok_or_else(|| {
        CliError::Usage("no document given: pass --file or set BLOCKTREE_FILE".to_string())
    })
}

fn container_for(document: &Path) -> CliResult<ServiceContainer> {
    let settings = Settings::load(document.parent())?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

// ============================================================
// Read-only commands
// ============================================================

#[instrument(skip(cli))]
fn _show(cli: &Cli) -> CliResult<()> {
    let path = document_path(cli)?;
    let container = container_for(path)?;
    let forest = container.documents.load(path)?;

    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    output::info(&domain::forest_tree(&label, &forest));
    Ok(())
}

#[instrument(skip(cli))]
fn _find(cli: &Cli, id: &str) -> CliResult<()> {
    let path = document_path(cli)?;
    let forest = container_for(path)?.documents.load(path)?;

    let block = domain::find(&forest, id)
        .ok_or_else(|| ApplicationError::BlockNotFound(id.to_string()))?;
    let rendered = serde_json::to_string_pretty(block.as_ref()).map_err(|e| {
        ApplicationError::OperationFailed {
            context: format!("serialize block {id}"),
            source: Box::new(e),
        }
    })?;
    output::info(&rendered);
    Ok(())
}

#[instrument(skip(cli))]
fn _path(cli: &Cli, id: &str) -> CliResult<()> {
    let path = document_path(cli)?;
    let forest = container_for(path)?.documents.load(path)?;

    let ids = domain::path(&forest, id);
    if ids.is_empty() {
        return Err(ApplicationError::BlockNotFound(id.to_string()).into());
    }
    output::info(&ids.join(" > "));

    // duplicate ids have no single address
    match BlockIndex::build(&forest) {
        Ok(index) => {
            if let Some(address) = index.address(id) {
                output::detail(&format!("address: {}", format_address(address)));
            }
        }
        Err(e) => debug!("path: no address, {e}"),
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _parent(cli: &Cli, id: &str) -> CliResult<()> {
    let path = document_path(cli)?;
    let forest = container_for(path)?.documents.load(path)?;

    if domain::find(&forest, id).is_none() {
        return Err(ApplicationError::BlockNotFound(id.to_string()).into());
    }
    match domain::parent_id(&forest, id) {
        Some(parent) => output::info(&parent),
        None => output::info("(root)"),
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _check(cli: &Cli) -> CliResult<()> {
    let path = document_path(cli)?;
    let container = container_for(path)?;
    let forest = container.documents.load(path)?;
    let report = container.documents.report(&forest);

    output::header(&path.display());
    output::detail(&format!("roots:      {}", report.roots));
    output::detail(&format!("blocks:     {}", report.blocks));
    output::detail(&format!("containers: {}", report.containers));
    output::detail(&format!("depth:      {}", report.depth));

    match report.duplicates.first() {
        None => {
            output::success("all block ids are unique");
            Ok(())
        }
        Some(first) => {
            for id in &report.duplicates {
                output::failure(&format!("duplicate id: {id}"));
            }
            Err(ApplicationError::Domain(DomainError::DuplicateId(first.clone())).into())
        }
    }
}

#[instrument(skip(cli))]
fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let document_dir = cli.file.as_deref().and_then(Path::parent);
            let settings = Settings::load(document_dir)?;
            output::info(settings.to_toml()?.trim_end());
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory available on this platform"),
        },
    }
    Ok(())
}

// ============================================================
// Mutating commands
// ============================================================

fn commit(cli: &Cli, edits: Vec<Edit>) -> CliResult<()> {
    let container = container_for(document_path(cli)?)?;
    commit_with(cli, &container, edits)
}

#[instrument(skip(cli, container, edits), fields(edits = edits.len()))]
fn commit_with(cli: &Cli, container: &ServiceContainer, edits: Vec<Edit>) -> CliResult<()> {
    let path = document_path(cli)?;
    let documents = &container.documents;
    let forest = documents.load(path)?;
    let edited = documents.apply(&forest, &edits)?;

    if cli.dry_run {
        output::info(documents.render(&edited)?.trim_end());
        return Ok(());
    }
    if domain::is_unchanged(&forest, &edited) {
        output::warning("document unchanged");
        return Ok(());
    }

    documents.save(path, &edited)?;
    output::success(&format!(
        "{}: {} edit(s) applied, {} blocks",
        path.display(),
        edits.len(),
        domain::count(&edited)
    ));
    Ok(())
}

fn build_block(id: Option<&str>, kind: &str, data: Option<&str>) -> CliResult<Block> {
    let id = id
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let data: Value = match data {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| CliError::InvalidArgs(format!("--data is not valid JSON: {e}")))?,
        None => json!({}),
    };
    if !data.is_object() {
        return Err(CliError::InvalidArgs("--data must be a JSON object".to_string()));
    }

    serde_json::from_value(json!({ "id": id, "type": kind, "data": data }))
        .map_err(|e| CliError::InvalidArgs(format!("--data does not describe a block: {e}")))
}

/// Child positions joined with dots, root level first: `1.2.0`.
fn format_address(address: &[usize]) -> String {
    address.iter().join(".")
}

/// `key=value` pairs; values that are not valid JSON are taken as strings.
fn parse_assignments(assignments: &[String]) -> CliResult<Map<String, Value>> {
    let mut set = Map::new();
    for assignment in assignments {
        let (key, raw) = assignment.split_once('=').ok_or_else(|| {
            CliError::InvalidArgs(format!("expected KEY=VALUE, got '{assignment}'"))
        })?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        set.insert(key.trim().to_string(), value);
    }
    Ok(set)
}
