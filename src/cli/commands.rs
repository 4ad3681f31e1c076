//! Command dispatch: one outline operation per invocation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::content::{append_block, is_inline_form, youtube_video_id};
use crate::domain::{
    Content, DeleteOutcome, Direction, Forest, InsertOutcome, MoveOutcome, NodeKind,
    RejectReason,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::upload::UploadRequest;
use crate::infrastructure::widget::HeadlessWidgetFactory;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::InvalidArgs(
            "no command given, see --help".into(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            return Ok(());
        }
        Commands::Config { command } => return config_command(cli, command),
        _ => {}
    }

    let (settings, path) = resolve_settings(cli)?;
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Init => init(&container, &path),
        Commands::Show => show(&container, &path),
        Commands::Check => check(&container, &path),
        Commands::Add { after, kind } => add(&container, &path, after, (*kind).into()),
        Commands::Move { node, direction } => move_node(&container, &path, node, (*direction).into()),
        Commands::Delete { node } => delete(&container, &path, node),
        Commands::Rename { node, name } => rename(&container, &path, node, name),
        Commands::Edit { node, content } => edit(&container, &path, node, content),
        Commands::Attach { node, file } => attach(&container, &path, node, file),
        Commands::Embed { node, url } => embed(&container, &path, node, url),
        Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
    }
}

/// Outline path and settings, with the local config next to the outline file.
fn resolve_settings(cli: &Cli) -> CliResult<(Settings, PathBuf)> {
    let path = match &cli.file {
        Some(file) => file.clone(),
        None => Settings::load(None)?.outline_file,
    };
    let settings = Settings::load(Some(&outline_dir(&path)))?;
    debug!("outline file: {}", path.display());
    Ok((settings, path))
}

fn outline_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load(container: &ServiceContainer, path: &Path) -> CliResult<Forest> {
    let mut ids = container.id_generator();
    Ok(container
        .outline
        .load_forest(path, &container.settings.default_name, &mut ids)?)
}

fn save(container: &ServiceContainer, path: &Path, forest: &Forest) -> CliResult<()> {
    Ok(container.outline.save(path, forest)?)
}

#[instrument(skip(container))]
fn init(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let mut ids = container.id_generator();
    let forest = container
        .outline
        .init(path, &container.settings.default_name, &mut ids)?;
    output::success(&format!("created {}", path.display()));
    output::info(&forest.to_tree(&path.display().to_string()));
    Ok(())
}

#[instrument(skip(container))]
fn show(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let forest = load(container, path)?;
    output::info(&forest.to_tree(&path.display().to_string()));
    Ok(())
}

#[instrument(skip(container))]
fn check(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let forest = load(container, path)?;
    forest.validate()?;
    output::success(&format!(
        "{} chapters, {} levels, {} roots",
        forest.len(),
        forest.depth(),
        forest.roots().len()
    ));
    for (_, _, node) in forest.iter() {
        if !is_inline_form(&node.content) {
            output::info(&format!("{} ({}): needs a form to answer", node.name, node.id));
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn add(container: &ServiceContainer, path: &Path, after: &str, kind: NodeKind) -> CliResult<()> {
    let mut forest = load(container, path)?;
    let mut ids = container.id_generator();
    match forest.insert_node(after, kind, &container.settings.default_name, &mut ids)? {
        InsertOutcome::Inserted(id) => {
            save(container, path, &forest)?;
            output::action("added", &format!("{kind} {id}"));
            Ok(())
        }
        InsertOutcome::NotFound => Err(CliError::NotFound(after.to_string())),
    }
}

#[instrument(skip(container))]
fn move_node(
    container: &ServiceContainer,
    path: &Path,
    node: &str,
    direction: Direction,
) -> CliResult<()> {
    let mut forest = load(container, path)?;
    match forest.move_node(node, direction) {
        MoveOutcome::Moved => {
            save(container, path, &forest)?;
            output::action("moved", &format!("{node} {direction:?}").to_lowercase());
            Ok(())
        }
        MoveOutcome::BoundaryNoOp => {
            let edge = match direction {
                Direction::Up => "first",
                Direction::Down => "last",
            };
            output::unchanged(&format!("{node} is already {edge} among its siblings"));
            Ok(())
        }
        MoveOutcome::NotFound => Err(CliError::NotFound(node.to_string())),
    }
}

#[instrument(skip(container))]
fn delete(container: &ServiceContainer, path: &Path, node: &str) -> CliResult<()> {
    let mut forest = load(container, path)?;
    match forest.delete_node(node) {
        DeleteOutcome::Deleted(removed) => {
            save(container, path, &forest)?;
            output::action("deleted", &format!("{node} ({} chapters)", removed.len()));
            Ok(())
        }
        DeleteOutcome::Rejected(RejectReason::LastSibling) => {
            output::unchanged(&format!("{node} is the last chapter of its group"));
            Ok(())
        }
        DeleteOutcome::NotFound => Err(CliError::NotFound(node.to_string())),
    }
}

#[instrument(skip(container))]
fn rename(container: &ServiceContainer, path: &Path, node: &str, name: &str) -> CliResult<()> {
    let mut forest = load(container, path)?;
    if !forest.rename(node, name) {
        return Err(CliError::NotFound(node.to_string()));
    }
    save(container, path, &forest)?;
    output::action("renamed", &format!("{node} -> {name}"));
    Ok(())
}

/// Select `node` in a headless editor, let the widget post `update(current)`,
/// commit it and save.
fn commit_through_bridge(
    container: &ServiceContainer,
    path: &Path,
    node: &str,
    update: impl FnOnce(Content) -> Content,
) -> CliResult<()> {
    let records = container.outline.load(path)?;
    let factory = HeadlessWidgetFactory::new();
    let mut state = container.editor_state(records, Arc::new(factory.clone()))?;
    if !state.select(node) {
        return Err(CliError::NotFound(node.to_string()));
    }
    let current = state
        .selected_node()
        .map(|n| n.content.clone())
        .unwrap_or_default();
    if let Some(notifier) = factory.notifier() {
        notifier.notify(update(current));
    }
    let committed = state.apply_pending_changes();
    debug!("commit_through_bridge: {} change(s) committed", committed);
    let forest = state.teardown();
    save(container, path, &forest)
}

#[instrument(skip(container, content))]
fn edit(container: &ServiceContainer, path: &Path, node: &str, content: &str) -> CliResult<()> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| CliError::InvalidArgs(format!("content is not JSON: {e}")))?;
    commit_through_bridge(container, path, node, |_| Content::from_value(value))?;
    output::action("saved", node);
    Ok(())
}

#[instrument(skip(container))]
fn attach(container: &ServiceContainer, path: &Path, node: &str, file: &Path) -> CliResult<()> {
    let response = container
        .uploader
        .upload(&UploadRequest {
            path: file.to_path_buf(),
        })?
        .for_image();
    let url = response.file.url.clone();
    let block = json!({
        "type": "image",
        "data": { "file": response.file, "caption": "" },
    });
    commit_through_bridge(container, path, node, |mut content| {
        append_block(&mut content, block);
        content
    })?;
    output::action("attached", &url);
    Ok(())
}

#[instrument(skip(container))]
fn embed(container: &ServiceContainer, path: &Path, node: &str, url: &str) -> CliResult<()> {
    let video = youtube_video_id(url)
        .ok_or_else(|| CliError::InvalidArgs(format!("not a YouTube URL: {url}")))?;
    let block = json!({
        "type": "embed",
        "data": {
            "service": "youtube",
            "source": url,
            "embed": format!("https://www.youtube.com/embed/{video}"),
            "width": 580,
            "height": 320,
            "caption": "",
        },
    });
    commit_through_bridge(container, path, node, |mut content| {
        append_block(&mut content, block);
        content
    })?;
    output::action("embedded", &video);
    Ok(())
}

fn config_command(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let (settings, _) = resolve_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            output::header("Config files");
            match global_config_path() {
                Some(global) => output::info(&format!("global: {}", global.display())),
                None => output::info("global: <unavailable>"),
            }
            let (_, path) = resolve_settings(cli)?;
            output::info(&format!(
                "local:  {}",
                local_config_path(&outline_dir(&path)).display()
            ));
        }
    }
    Ok(())
}
