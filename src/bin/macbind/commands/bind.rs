//! `macbind bind` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::{BindArgs, MessageFormat};
use macbind::builder::{ArchiveStash, BindObserver, JsonEvents};
use macbind::core::ToolCommand;
use macbind::ops::{bind, BindOptions, WorkDir};
use macbind::util::config::{global_config_path, load_config, project_config_path};
use macbind::util::shell::{Shell, ShellObserver};
use macbind::BindConfig;

pub fn execute(args: BindArgs, verbose: bool, quiet: bool) -> Result<i32> {
    let json = args.message_format == MessageFormat::Json;
    let shell = Arc::new(Shell::from_flags(quiet, verbose, json));

    let cwd = std::env::current_dir()?;
    let config = load_config(
        global_config_path().as_deref(),
        &project_config_path(&cwd),
    );

    let mut tools = config.tools();
    if let Some(gobind) = args.gobind {
        tools.gobind = ToolCommand::new(gobind);
    }
    if let Some(go) = args.go {
        tools.go = ToolCommand::new(go);
    }
    if let Some(lipo) = args.lipo {
        tools.lipo = ToolCommand::new(lipo);
    }

    let tags = if args.tags.is_empty() {
        config.bind.tags.clone()
    } else {
        args.tags
    };
    let work_dir = args
        .work_dir
        .or_else(|| config.bind.work_dir.clone())
        .map(|dir| cwd.join(dir));
    let work = WorkDir::prepare(work_dir.as_deref(), args.work)?;

    let mut bind_config = BindConfig::new(args.packages, work.path())
        .with_targets(config.targets(&args.archs)?)
        .with_tags(tags)
        .with_project_dir(&cwd)
        .with_tools(tools)
        .with_env(config.env.clone());
    if let Some(prefix) = args.prefix.or_else(|| config.bind.prefix.clone()) {
        bind_config = bind_config.with_prefix(prefix);
    }
    if let Some(output) = args.output {
        bind_config = bind_config.with_output(output);
    }
    bind_config.ldflags = args.ldflags.or_else(|| config.bind.ldflags.clone());
    bind_config.trimpath = args.trimpath || config.bind.trimpath.unwrap_or(false);
    bind_config.print_commands = args.print_commands;

    let mut observers: Vec<Box<dyn BindObserver>> = Vec::new();
    if json {
        observers.push(Box::new(JsonEvents::stdout()));
    } else {
        observers.push(Box::new(ShellObserver::new(shell.clone(), &bind_config)));
    }
    if let Some(dir) = args.stash_archives {
        shell.note(format!("archives will be copied to {}", dir.display()));
        observers.push(Box::new(ArchiveStash::new(cwd.join(dir))));
    }

    let options = BindOptions {
        observer: Some(Box::new(observers)),
        cancel: None,
    };

    match bind(&bind_config, options) {
        Ok(_) => Ok(0),
        Err(err) => {
            eprint!("{}", err.to_diagnostic().format(shell.use_color()));
            Ok(1)
        }
    }
}
