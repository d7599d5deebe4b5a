//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the signal handler,
//! opens the link store, and dispatches the subcommand.

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use crate::cli::{self, Args, Command};
use crate::config::{self, Config, LoadResult};
use crate::errors::LinkError;
use crate::exec::SystemRunner;
use crate::link_ops::{
    LinkInstaller, LinkSpec, LinkUninstaller, PathProbe, PathResolver, link_status,
    run_post_action,
};
use crate::logging::init_tracing;
use crate::output as out;
use crate::recipes::{self, RecipeCatalog};
use crate::shutdown;
use crate::store::LinkStore;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location(&args);
        return Ok(());
    }

    let (mut cfg, config_path) = load_configuration(&args)?;
    args.apply_overrides(&mut cfg);

    // Initialize logging and capture the guard so we can drop it on signal
    let guard_opt: Option<tracing_appender::non_blocking::WorkerGuard> =
        init_tracing(&cfg.log_level, cfg.log_file.as_deref(), cfg.log_json).map_err(|e| {
            out::print_error(&format!("Failed to initialize logging: {e}"));
            e
        })?;

    // Guard needs to be dropped on SIGINT to flush logs
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; shutting down gracefully...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take(); // drop guard here to flush tracing_appender
            }
        })
        .expect("failed to install signal handler");
    }

    if shutdown::is_requested() {
        return Ok(());
    }

    debug!("Starting linkstash: {:?}", args);

    // Main run (so we can drop guard after)
    let result = (|| -> Result<()> {
        let Some(command) = &args.command else {
            bail!("no command given; see --help for usage");
        };
        cfg.validate_and_normalize()?;
        match command {
            Command::Install { names, all, .. } => handle_install(&cfg, names, *all),
            Command::Uninstall { names, all } => handle_uninstall(&cfg, names, *all),
            Command::Status { names, paths } => handle_status(&cfg, names, *paths),
            Command::Add {
                name,
                from,
                to,
                defaults,
            } => handle_add(&cfg, name, from, to.as_deref(), defaults.as_deref()),
            Command::Remove { name } => handle_remove(&cfg, name),
            Command::Recipes { apply, tweak } => {
                handle_recipes(&cfg, apply.as_deref(), tweak.as_deref())
            }
            Command::Init => handle_init(&cfg, &config_path),
        }
    })();

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            report_error(&err);
            std::process::exit(exit_code(&err));
        }
    }
}

fn print_config_location(args: &Args) {
    if let Some(path) = &args.config {
        out::print_info(&format!(
            "Using --config (explicit):\n  {}\n",
            path.display()
        ));
        return;
    }
    if let Ok(cfg_env) = std::env::var(config::CONFIG_ENV) {
        out::print_info(&format!("Using LINKSTASH_CONFIG (explicit):\n  {cfg_env}\n"));
        out::print_info("To override, unset LINKSTASH_CONFIG or set it to another file.");
        return;
    }
    match config::default_config_path() {
        Ok(p) => {
            out::print_info(&format!(
                "Default linkstash config path:\n  {}\n",
                p.display()
            ));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info(
                    "No config file exists there yet. Run `linkstash init` to create a template.",
                );
            }
        }
        Err(e) => {
            out::print_error(&format!("Could not determine a default config path: {e}"));
        }
    }
}

/// Load the config named by --config, or fall back to the default
/// (env-overridable) location, creating a template there on first use.
/// Returns the config plus the path it came from.
fn load_configuration(args: &Args) -> Result<(Config, PathBuf)> {
    if let Some(path) = &args.config {
        // `init --config <new>` bootstraps a template at the named spot;
        // every other command expects an explicitly named file to exist.
        if !path.exists() && matches!(args.command, Some(Command::Init)) {
            config::create_template_config(path)?;
            out::print_success(&format!("Wrote a config template to: {}", path.display()));
            return Ok((Config::default(), path.clone()));
        }
        let cfg = config::load_config_from_path(path)?;
        return Ok((cfg, path.clone()));
    }
    match config::load_or_init()? {
        LoadResult::Loaded(cfg) => Ok((cfg, config::default_config_path()?)),
        LoadResult::CreatedTemplate(path, cfg) => {
            out::print_success(&format!(
                "A template linkstash config was written to: {}",
                path.display()
            ));
            out::print_info(
                "Edit it to change the backup root or logging; the defaults work as-is. \
                 To use a different location set LINKSTASH_CONFIG.",
            );
            Ok((cfg, path))
        }
    }
}

/// Resolve the link names given on the command line against the store.
fn select_specs<'a>(
    store: &'a LinkStore,
    names: &[String],
    all: bool,
) -> Result<Vec<&'a LinkSpec>> {
    if all {
        if store.is_empty() {
            bail!("the link store at '{}' is empty", store.path().display());
        }
        return Ok(store.links().iter().collect());
    }
    if names.is_empty() {
        bail!("name at least one link, or pass --all");
    }
    let mut specs = Vec::with_capacity(names.len());
    for name in names {
        match store.find(name) {
            Some(spec) => specs.push(spec),
            None => bail!("no link named '{name}' in {}", store.path().display()),
        }
    }
    Ok(specs)
}

fn handle_install(cfg: &Config, names: &[String], all: bool) -> Result<()> {
    let store = LinkStore::load(&cfg.backup_root)?;
    let specs = select_specs(&store, names, all)?;
    let total = specs.len();
    let installer = LinkInstaller::new(
        Arc::new(SystemRunner),
        PathResolver::new(cfg.backup_root.clone()),
    )
    .dry_run(cfg.dry_run);

    let mut first_err: Option<anyhow::Error> = None;
    let mut failures = 0usize;
    for spec in specs {
        let result = match cfg.on_conflict.choice() {
            // A standing policy answers conflicts up front; otherwise a
            // conflict comes back as a pending outcome.
            Some(choice) => installer.resolve(spec, choice),
            None => installer.install(spec),
        };
        match result {
            Ok(outcome) => {
                if let Some(pending) = &outcome.pending {
                    out::print_pending(pending);
                    failures += 1;
                    if first_err.is_none() {
                        first_err = Some(
                            LinkError::UnresolvedConflict {
                                name: spec.name.clone(),
                            }
                            .into(),
                        );
                    }
                    continue;
                }
                out::print_outcome(&outcome);
            }
            Err(err) => {
                let stop = matches!(
                    err,
                    LinkError::EscalationCancelled { .. } | LinkError::Interrupted
                );
                out::print_error(&format!("{}: {err}", spec.name));
                failures += 1;
                if first_err.is_none() {
                    first_err = Some(err.into());
                }
                // A dismissed password prompt or Ctrl-C ends the batch;
                // the remaining links would just prompt again.
                if stop {
                    break;
                }
            }
        }
    }
    finish_batch(first_err, failures, total)
}

fn handle_uninstall(cfg: &Config, names: &[String], all: bool) -> Result<()> {
    let store = LinkStore::load(&cfg.backup_root)?;
    let specs = select_specs(&store, names, all)?;
    let total = specs.len();
    let remover = LinkUninstaller::new(
        Arc::new(SystemRunner),
        PathResolver::new(cfg.backup_root.clone()),
    )
    .dry_run(cfg.dry_run);

    let mut first_err: Option<anyhow::Error> = None;
    let mut failures = 0usize;
    for spec in specs {
        match remover.uninstall(spec) {
            Ok(outcome) => out::print_success(&outcome.message),
            Err(err) => {
                let stop = matches!(
                    err,
                    LinkError::EscalationCancelled { .. } | LinkError::Interrupted
                );
                out::print_error(&format!("{}: {err}", spec.name));
                failures += 1;
                if first_err.is_none() {
                    first_err = Some(err.into());
                }
                if stop {
                    break;
                }
            }
        }
    }
    finish_batch(first_err, failures, total)
}

/// Fold a batch into one result. The first failure decides the exit code;
/// the summary line keeps the count.
fn finish_batch(first_err: Option<anyhow::Error>, failures: usize, total: usize) -> Result<()> {
    match first_err {
        None => Ok(()),
        Some(err) => Err(err.context(format!("{failures} of {total} link(s) failed"))),
    }
}

fn handle_status(cfg: &Config, names: &[String], show_paths: bool) -> Result<()> {
    let store = LinkStore::load(&cfg.backup_root)?;
    let specs: Vec<&LinkSpec> = if names.is_empty() {
        store.links().iter().collect()
    } else {
        select_specs(&store, names, false)?
    };
    if specs.is_empty() {
        out::print_info("No links configured yet. Try `linkstash recipes` or `linkstash add`.");
        return Ok(());
    }

    let resolver = PathResolver::new(cfg.backup_root.clone());
    let probe = PathProbe::new(Arc::new(SystemRunner));
    let width = specs.iter().map(|s| s.name.len()).max().unwrap_or(0);

    // Each link costs a few spawned probes; fan the links out and print in
    // store order afterwards.
    let rows: Vec<_> = specs
        .par_iter()
        .map(|spec| (spec.name.clone(), link_status(&probe, &resolver, spec)))
        .collect();

    let mut first_err: Option<anyhow::Error> = None;
    for (name, row) in rows {
        match row {
            Ok((status, paths)) => {
                out::print_status_line(&name, status, width);
                if show_paths {
                    out::print_user(&format!(
                        "    {} -> {}",
                        paths.source.display(),
                        paths.backup.display()
                    ));
                }
            }
            Err(err) => {
                out::print_error(&format!("{name}: {err}"));
                if first_err.is_none() {
                    first_err = Some(err.into());
                }
            }
        }
    }
    match first_err {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

fn handle_add(
    cfg: &Config,
    name: &str,
    from_raw: &str,
    to: Option<&str>,
    defaults: Option<&str>,
) -> Result<()> {
    let from = cli::sanitize_path(from_raw);
    if from.is_empty() {
        bail!("--from is empty after trimming");
    }
    let slot = match to.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_owned(),
        _ => Path::new(&from)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("cannot derive a slot name from '{from}'; pass --to"))?,
    };
    let mut spec = LinkSpec::new(name, from, slot);
    if let Some(d) = defaults {
        spec = spec.with_defaults(d);
    }

    if cfg.dry_run {
        out::print_info(&format!(
            "dry run: would add '{}' ({} -> {})",
            spec.name, spec.from, spec.to
        ));
        return Ok(());
    }
    let mut store = LinkStore::load(&cfg.backup_root)?;
    let stored = store.add(spec);
    store.save()?;
    out::print_success(&format!(
        "Added '{stored}'. Install it with: linkstash install '{stored}'"
    ));
    Ok(())
}

fn handle_remove(cfg: &Config, name: &str) -> Result<()> {
    let mut store = LinkStore::load(&cfg.backup_root)?;
    if cfg.dry_run {
        match store.find(name) {
            Some(spec) => out::print_info(&format!(
                "dry run: would remove '{}' from the store",
                spec.name
            )),
            None => bail!("no link named '{name}' in {}", store.path().display()),
        }
        return Ok(());
    }
    let removed = store.remove(name)?;
    store.save()?;
    out::print_success(&format!(
        "Removed '{}' from the store. Files were not touched; use uninstall to remove a link itself.",
        removed.name
    ));
    Ok(())
}

fn handle_recipes(cfg: &Config, apply: Option<&str>, tweak: Option<&str>) -> Result<()> {
    let catalog = recipes::load_catalog()?;
    if apply.is_none() && tweak.is_none() {
        list_recipes(&catalog);
        return Ok(());
    }

    if let Some(app_name) = apply {
        let app = catalog.app(app_name).with_context(|| {
            format!("no bundled recipe for '{app_name}'; run `linkstash recipes` to list them")
        })?;
        let specs = app.specs();
        if cfg.dry_run {
            for spec in &specs {
                out::print_info(&format!(
                    "dry run: would add '{}' ({} -> {})",
                    spec.name, spec.from, spec.to
                ));
            }
        } else {
            let mut store = LinkStore::load(&cfg.backup_root)?;
            let mut stored = Vec::with_capacity(specs.len());
            for spec in specs {
                stored.push(store.add(spec));
            }
            store.save()?;
            for name in &stored {
                out::print_success(&format!("Added '{name}'"));
            }
            out::print_info(
                "Install them with: linkstash install --all (or name them one by one).",
            );
        }
    }

    if let Some(recipe_name) = tweak {
        let recipe = catalog.os_recipe(recipe_name).with_context(|| {
            format!("no bundled tweak named '{recipe_name}'; run `linkstash recipes` to list them")
        })?;
        if cfg.dry_run {
            out::print_info(&format!("dry run: would run: {}", recipe.defaults));
        } else {
            let outcome = run_post_action(&SystemRunner, &recipe.defaults)?;
            if outcome.ok {
                out::print_success(&format!("{}: applied", recipe.name));
            } else {
                bail!("tweak '{}' failed: {}", recipe.name, outcome.output);
            }
        }
    }
    Ok(())
}

fn list_recipes(catalog: &RecipeCatalog) {
    out::print_user("Apps (add their links with `linkstash recipes --apply <APP>`):");
    for app in &catalog.apps {
        let count = app.files.len();
        let files = if count == 1 {
            "1 path".to_owned()
        } else {
            format!("{count} paths")
        };
        out::print_user(&format!("  {:<24} {}", app.name, files));
    }
    out::print_user("");
    out::print_user("Tweaks (run with `linkstash recipes --tweak <NAME>`):");
    for recipe in &catalog.os_recipes {
        out::print_user(&format!("  {:<24} {}", recipe.name, recipe.description));
    }
}

fn handle_init(cfg: &Config, config_path: &Path) -> Result<()> {
    let store = LinkStore::load(&cfg.backup_root)?;
    out::print_success("linkstash is ready.");
    out::print_user(&format!("  config:      {}", config_path.display()));
    out::print_user(&format!("  backup root: {}", cfg.backup_root.display()));
    out::print_user(&format!("  link store:  {}", store.path().display()));
    out::print_info(
        "Next: `linkstash recipes` to browse bundled apps, or `linkstash add` for your own paths.",
    );
    Ok(())
}

/// Log and print a terminal error. Engine errors carry their own user
/// phrasing and an optional manual cleanup command; anything else prints
/// its context chain.
fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<LinkError>() {
        Some(le) => {
            error!(code = le.code(), error = %le, "command failed");
            out::print_error(&err.to_string());
            if let Some(manual) = le.manual_command() {
                out::print_info(&format!("Manual cleanup: {manual}"));
            }
        }
        None => {
            error!(error = ?err, "command failed");
            out::print_error(&format!("{err:#}"));
        }
    }
}

/// Map a terminal error onto the documented exit codes.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LinkError>() {
        Some(LinkError::UnresolvedConflict { .. }) => 2,
        Some(LinkError::Misconfigured { .. }) => 3,
        Some(LinkError::PermissionDenied { .. }) => 4,
        Some(LinkError::EscalationCancelled { .. }) => 5,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_error_kind() {
        let conflict: anyhow::Error = LinkError::UnresolvedConflict {
            name: "Fonts".into(),
        }
        .into();
        assert_eq!(exit_code(&conflict), 2);
        // Context wrapping keeps the downcast working.
        assert_eq!(exit_code(&conflict.context("1 of 2 link(s) failed")), 2);

        let misconfigured: anyhow::Error = LinkError::Misconfigured {
            name: "X".into(),
            detail: "overlap".into(),
        }
        .into();
        assert_eq!(exit_code(&misconfigured), 3);

        let denied: anyhow::Error = LinkError::PermissionDenied {
            probe: PathBuf::from("/Users/a/Library/Safari"),
        }
        .into();
        assert_eq!(exit_code(&denied), 4);

        let cancelled: anyhow::Error = LinkError::EscalationCancelled {
            path: PathBuf::from("/Library/Fonts/X"),
            backup: None,
        }
        .into();
        assert_eq!(exit_code(&cancelled), 5);

        assert_eq!(exit_code(&anyhow::anyhow!("plain failure")), 1);
    }

    #[test]
    fn select_specs_rules() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = LinkStore::load(tmp.path()).unwrap();
        store.add(LinkSpec::new("Fonts", "~/f", "f"));
        store.add(LinkSpec::new("SSH", "~/s", "s"));

        assert_eq!(select_specs(&store, &[], true).unwrap().len(), 2);
        assert!(select_specs(&store, &[], false).is_err());
        let picked = select_specs(&store, &["fonts".into()], false).unwrap();
        assert_eq!(picked[0].name, "Fonts");
        assert!(select_specs(&store, &["nope".into()], false).is_err());
    }
}
