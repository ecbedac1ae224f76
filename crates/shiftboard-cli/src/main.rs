use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use shiftboard_core::{
    AccessGate, LiveSyncController, RepositoryError, ShiftRepository, ShiftboardConfig,
};
use shiftboard_model::{week_dates, Color, Session, Shift, ShiftDraft, ShiftId, Week};
use shiftboard_store::{DocumentStore, FileIdentity, FileSessionSlot, JsonFileStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod render;

fn date_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_parser(value_parser!(NaiveDate))
        .help(help)
}

fn id_arg() -> Arg {
    Arg::new("id").required(true).help("Shift id")
}

fn color_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_parser(value_parser!(Color))
        .help(help)
}

fn shift_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(date_arg("date", "Day of the shift (YYYY-MM-DD)"))
        .arg(id_arg())
}

fn cli() -> Command {
    Command::new("shiftboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Shared weekly shift board")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("week")
                .about("Print the week key and dates containing a day")
                .arg(date_arg("date", "Any day of the week (YYYY-MM-DD)")),
        )
        .subcommand(
            Command::new("show")
                .about("Print a week read from the store")
                .arg(date_arg("date", "Any day of the week (YYYY-MM-DD)")),
        )
        .subcommand(
            Command::new("signup")
                .about("Exchange the shared access code for a local grant")
                .arg(Arg::new("first").long("first").required(true).help("First name"))
                .arg(Arg::new("last").long("last").required(true).help("Last name"))
                .arg(Arg::new("code").long("code").required(true).help("Shared access code")),
        )
        .subcommand(Command::new("whoami").about("Print the current grant"))
        .subcommand(
            Command::new("sites")
                .about("List known sites")
                .arg(Arg::new("prefix").default_value("").help("Filter by prefix")),
        )
        .subcommand(
            Command::new("add")
                .about("Add a shift")
                .arg(date_arg("date", "Day of the shift (YYYY-MM-DD)"))
                .arg(Arg::new("site").long("site").required(true).help("Site name"))
                .arg(Arg::new("start").long("start").required(true).help("Start time HHMM"))
                .arg(Arg::new("end").long("end").required(true).help("End time HHMM"))
                .arg(Arg::new("initials").long("initials").help("Assignee initials"))
                .arg(color_arg("bg", "Fill color"))
                .arg(color_arg("font", "Font color")),
        )
        .subcommand(
            shift_command("edit", "Edit fields of a shift")
                .arg(Arg::new("site").long("site").help("Site name"))
                .arg(Arg::new("start").long("start").help("Start time HHMM"))
                .arg(Arg::new("end").long("end").help("End time HHMM"))
                .arg(Arg::new("initials").long("initials").help("Assignee initials"))
                .arg(color_arg("bg", "Fill color"))
                .arg(color_arg("font", "Font color")),
        )
        .subcommand(shift_command("delete", "Delete a shift"))
        .subcommand(shift_command("complete", "Mark a shift complete"))
        .subcommand(shift_command("ops", "Hand a shift to operations"))
        .subcommand(shift_command("clear-status", "Restore default colors"))
        .subcommand(
            shift_command("comment", "Comment on a shift")
                .arg(Arg::new("text").required(true).help("Comment text")),
        )
        .subcommand(
            Command::new("note")
                .about("Add a note to a day")
                .arg(date_arg("date", "Day (YYYY-MM-DD)"))
                .arg(Arg::new("text").required(true).help("Note text")),
        )
        .subcommand(
            Command::new("clear-notes")
                .about("Remove every note from a day")
                .arg(date_arg("date", "Day (YYYY-MM-DD)")),
        )
        .subcommand(
            shift_command("duplicate", "Copy a shift and paste it onto another day").arg(
                Arg::new("to")
                    .long("to")
                    .required(true)
                    .value_parser(value_parser!(NaiveDate))
                    .help("Target day (YYYY-MM-DD)"),
            ),
        )
        .subcommand(
            Command::new("watch")
                .about("Follow a week live until interrupted")
                .arg(date_arg("date", "Any day of the week (YYYY-MM-DD)"))
                .arg(
                    Arg::new("once")
                        .long("once")
                        .action(ArgAction::SetTrue)
                        .help("Exit after the first synced projection"),
                ),
        )
}

/// Everything a command may need, opened from the configuration
struct App {
    config: ShiftboardConfig,
    store: Arc<JsonFileStore>,
    repo: ShiftRepository,
    gate: AccessGate,
}

impl App {
    async fn open(config: ShiftboardConfig) -> Result<Self> {
        let store = Arc::new(
            JsonFileStore::open(config.store_path())
                .await
                .with_context(|| format!("opening {}", config.store_path().display()))?,
        );
        let identity = FileIdentity::load_or_create(config.identity_path())
            .with_context(|| format!("opening {}", config.identity_path().display()))?;
        let gate = AccessGate::new(
            Arc::new(FileSessionSlot::new(config.session_path())),
            Arc::new(identity),
            config.access_code.clone(),
        );
        let repo = ShiftRepository::new(store.clone());
        Ok(Self {
            config,
            store,
            repo,
            gate,
        })
    }

    /// The grant, or an error telling the user to sign up
    fn authorized(&self) -> Result<Session> {
        if !self.gate.can_mutate() {
            bail!("no access grant for this profile; run `shiftboard signup` first");
        }
        self.gate
            .current_grant()
            .context("access grant disappeared; run `shiftboard signup` again")
    }

    async fn find_shift(&self, date: NaiveDate, id: &ShiftId) -> Result<Shift> {
        let day = self.repo.fetch_day(date).await?;
        day.shift(id)
            .cloned()
            .with_context(|| format!("no shift {id} on {date}"))
    }
}

fn required<'a, T>(args: &'a ArgMatches, name: &str) -> Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(name)
        .with_context(|| format!("missing argument <{name}>"))
}

fn optional(args: &ArgMatches, name: &str) -> Option<String> {
    args.get_one::<String>(name).cloned()
}

fn shift_target(args: &ArgMatches) -> Result<(NaiveDate, ShiftId)> {
    let date = *required::<NaiveDate>(args, "date")?;
    let id = ShiftId::from(required::<String>(args, "id")?.as_str());
    Ok((date, id))
}

/// Report a repository outcome, treating a missing day as a quiet no-op
fn settle<T>(result: Result<T, RepositoryError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_silent() => {
            tracing::debug!(error = %err, "ignored");
            Ok(None)
        }
        Err(err) if err.is_retryable() => Err(err).context("store unavailable, try again"),
        Err(err) => Err(err.into()),
    }
}

fn init_tracing(config: &ShiftboardConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config_path = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let config = ShiftboardConfig::load(config_path)?;
    init_tracing(&config);
    tracing::debug!(?config, "configuration loaded");

    let Some((name, args)) = matches.subcommand() else {
        bail!("no command given");
    };

    if name == "week" {
        let date = *required::<NaiveDate>(args, "date")?;
        let week = Week::containing(date);
        println!("{}", week.key);
        for day in week_dates(week.start) {
            println!("  {} {}", day, day.format("%a"));
        }
        return Ok(());
    }

    let app = App::open(config).await?;

    match name {
        "show" => {
            let date = *required::<NaiveDate>(args, "date")?;
            render::week(&app.repo.fetch_week(date).await?);
        }
        "signup" => {
            let session = app.gate.grant_access(
                required::<String>(args, "first")?,
                required::<String>(args, "last")?,
                required::<String>(args, "code")?,
                app.gate.live_identity(),
            )?;
            render::session(&session);
        }
        "whoami" => match app.gate.current_grant() {
            Some(session) => render::session(&session),
            None => println!("no access grant"),
        },
        "sites" => {
            let prefix = required::<String>(args, "prefix")?;
            for site in app.config.site_suggestions(prefix) {
                println!("{site}");
            }
        }
        "add" => {
            app.authorized()?;
            let date = *required::<NaiveDate>(args, "date")?;
            let mut draft = ShiftDraft::new(
                required::<String>(args, "site")?.as_str(),
                required::<String>(args, "start")?.as_str(),
                required::<String>(args, "end")?.as_str(),
            );
            if let Some(initials) = optional(args, "initials") {
                draft = draft.with_initials(initials);
            }
            if let Some(bg) = args.get_one::<Color>("bg") {
                draft.bg_color = *bg;
            }
            if let Some(font) = args.get_one::<Color>("font") {
                draft.font_color = *font;
            }
            if let Some(shift) = settle(app.repo.add_shift(date, draft).await)? {
                render::shift(&shift);
            }
        }
        "edit" => {
            app.authorized()?;
            let (date, id) = shift_target(args)?;
            let mut shift = app.find_shift(date, &id).await?;
            if let Some(site) = optional(args, "site") {
                shift.site = site;
            }
            if let Some(start) = optional(args, "start") {
                shift.start_time = start;
            }
            if let Some(end) = optional(args, "end") {
                shift.end_time = end;
            }
            if let Some(initials) = optional(args, "initials") {
                shift.initials = initials;
            }
            if let Some(bg) = args.get_one::<Color>("bg") {
                shift.bg_color = *bg;
            }
            if let Some(font) = args.get_one::<Color>("font") {
                shift.font_color = *font;
            }
            if settle(app.repo.update_shift(date, &shift).await)?.is_some() {
                render::shift(&shift);
            }
        }
        "delete" => {
            app.authorized()?;
            let (date, id) = shift_target(args)?;
            settle(app.repo.delete_shift(date, &id).await)?;
        }
        "complete" => {
            let session = app.authorized()?;
            let (date, id) = shift_target(args)?;
            let shift = app.find_shift(date, &id).await?;
            if let Some(shift) = settle(app.repo.mark_complete(date, &shift, &session).await)? {
                render::shift(&shift);
            }
        }
        "ops" | "clear-status" => {
            app.authorized()?;
            let (date, id) = shift_target(args)?;
            let shift = app.find_shift(date, &id).await?;
            let result = if name == "ops" {
                app.repo.mark_ops(date, &shift).await
            } else {
                app.repo.clear_status(date, &shift).await
            };
            if let Some(shift) = settle(result)? {
                render::shift(&shift);
            }
        }
        "comment" => {
            let session = app.authorized()?;
            let (date, id) = shift_target(args)?;
            let text = required::<String>(args, "text")?;
            match settle(app.repo.add_comment(date, &id, text, &session).await)? {
                Some(Some(_)) => println!("comment added to {id}"),
                _ => println!("no shift {id} on {date}"),
            }
        }
        "note" => {
            let session = app.authorized()?;
            let date = *required::<NaiveDate>(args, "date")?;
            let text = required::<String>(args, "text")?;
            settle(app.repo.add_note(date, text, &session).await)?;
        }
        "clear-notes" => {
            app.authorized()?;
            let date = *required::<NaiveDate>(args, "date")?;
            settle(app.repo.set_day_notes(date, Vec::new()).await)?;
        }
        "duplicate" => {
            app.authorized()?;
            let (date, id) = shift_target(args)?;
            let target = *required::<NaiveDate>(args, "to")?;
            let clipboard = ShiftRepository::copy_shift(&app.find_shift(date, &id).await?);
            if let Some(shift) = settle(app.repo.paste_shift(target, &clipboard).await)? {
                render::shift(&shift);
            }
        }
        "watch" => {
            let date = *required::<NaiveDate>(args, "date")?;
            watch(app.store, date, args.get_flag("once")).await;
        }
        other => bail!("unknown command {other}"),
    }

    Ok(())
}

/// Print every published state until interrupted
async fn watch(store: Arc<dyn DocumentStore>, date: NaiveDate, once: bool) {
    let mut controller = LiveSyncController::new(store);
    let mut states = controller.watch();
    controller.set_active_week(date);
    render::state(&states.borrow_and_update());

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                render::state(&state);
                if once && state.view().is_some() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    controller.dispose();
}
