//! `registrar` - CLI for the person registration console
//!
//! This binary registers people in the remote store, lists and edits them,
//! and offers an interactive browser with live surname search.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use registrar::cli::{
    output, BrowseCommand, CameraCommand, Cli, Command, ConfigCommand, EditCommand, ListCommand,
    PhotoArgs, RegisterCommand,
};
use registrar::notify::CAMERA_DENIED;
use registrar::record::today;
use registrar::{
    capture_photo, init_logging, Config, EditOutcome, Error, FetchTicket, HttpTransport,
    ListView, Notifier, Person, PersonForm, RecordClient, RegistrationForm, SubmitOutcome,
    Variant,
};
use registrar_camera::{
    check_permission, get_permission_instructions, CameraDevice, StillCamera, UnavailableCamera,
};

type Client = RecordClient<HttpTransport>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Validation reports a broken file instead of failing on it
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        return validate_config(file.clone().or_else(|| cli.config.clone()));
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Register(cmd) => handle_register(&config, cmd).await,
        Command::List(cmd) => handle_list(&config, cmd).await,
        Command::Edit(cmd) => handle_edit(&config, cmd).await,
        Command::Browse(cmd) => handle_browse(&config, cmd).await,
        Command::Camera(cmd) => handle_camera(cmd).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn connect(config: &Config) -> anyhow::Result<Client> {
    let transport = HttpTransport::from_config(config).context("cannot set up the remote store")?;
    Ok(RecordClient::new(transport))
}

fn camera_for(photo: Option<&Path>) -> Box<dyn CameraDevice> {
    match photo {
        Some(path) => Box::new(StillCamera::from_file(path)),
        None => Box::new(UnavailableCamera::missing("no image source given; use --photo FILE")),
    }
}

fn flush_notifications(notifier: &mut Notifier) {
    for notification in notifier.drain() {
        match notification.variant {
            Variant::Success => println!("{notification}"),
            Variant::Danger | Variant::Warning => eprintln!("{notification}"),
        }
    }
}

/// Capture from `--photo` into `form`. An unusable camera only warns.
async fn take_photo(
    config: &Config,
    args: &PhotoArgs,
    form: &mut PersonForm,
    notifier: &mut Notifier,
) -> anyhow::Result<()> {
    let Some(path) = args.photo.as_deref() else {
        return Ok(());
    };

    let camera = StillCamera::from_file(path);
    match capture_photo(&camera, config.photo, args.crop.into(), args.crop_box).await {
        Ok(Some(photo)) => {
            form.attach_photo(photo);
            Ok(())
        }
        Ok(None) => {
            warn!(path = %path.display(), "Camera produced no frame");
            Ok(())
        }
        Err(Error::PermissionDenied) => {
            notifier.warning(CAMERA_DENIED);
            Ok(())
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to capture photo from {}", path.display()))
        }
    }
}

async fn handle_register(config: &Config, cmd: RegisterCommand) -> anyhow::Result<()> {
    let client = connect(config)?;
    let mut notifier = Notifier::new(config.auto_dismiss());
    let mut registration = RegistrationForm::new();

    let camera = camera_for(cmd.photo.photo.as_deref());
    registration
        .check_camera(camera.as_ref(), &mut notifier)
        .await;

    cmd.person.apply_to(registration.form_mut());
    take_photo(config, &cmd.photo, registration.form_mut(), &mut notifier).await?;

    let outcome = registration.submit(&client, &mut notifier, today()).await;
    flush_notifications(&mut notifier);

    match outcome {
        SubmitOutcome::Created(person) => {
            let id = person.id.map(|id| id.to_string()).unwrap_or_default();
            println!("Registered {} (id {id})", person.full_name());
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            eprintln!("{}", output::field_errors(&errors));
            bail!("{} field(s) failed validation", errors.len())
        }
        SubmitOutcome::MissingPhoto => bail!("a photo is required; pass --photo FILE"),
        SubmitOutcome::Failed(err) => Err(err).context("registration failed"),
    }
}

async fn handle_list(config: &Config, cmd: ListCommand) -> anyhow::Result<()> {
    let client = connect(config)?;
    let mut view = ListView::from_config(&config.list);
    if let Some(term) = &cmd.search {
        view.set_search_now(term.as_str());
    }
    view.go_to_page(cmd.page);

    view.refresh(&client).await;
    if let Some(error) = view.error() {
        bail!("failed to load people: {error}");
    }

    if cmd.json {
        let page = serde_json::json!({
            "page": view.page(),
            "page_size": view.page_size(),
            "has_more": view.has_more(),
            "search": view.search_term(),
            "records": view.records(),
        });
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        println!("{}", output::list_page(&view, today()));
    }
    Ok(())
}

async fn handle_edit(config: &Config, cmd: EditCommand) -> anyhow::Result<()> {
    let client = connect(config)?;
    let mut notifier = Notifier::new(config.auto_dismiss());
    let mut view = ListView::from_config(&config.list);

    let mut form = loop {
        view.refresh(&client).await;
        if let Some(error) = view.error() {
            bail!("failed to load people: {error}");
        }
        if let Some(form) = view.begin_edit(cmd.id) {
            break form;
        }
        if !view.next_page() {
            bail!("no person with id {}", cmd.id);
        }
    };

    cmd.person.apply_to(&mut form);
    take_photo(config, &cmd.photo, &mut form, &mut notifier).await?;

    let outcome = view
        .save_edit(&mut form, &client, &mut notifier, today())
        .await;
    flush_notifications(&mut notifier);

    match outcome {
        EditOutcome::Updated(person) => {
            println!("Updated {} (id {})", person.full_name(), cmd.id);
            Ok(())
        }
        EditOutcome::Invalid(errors) => {
            eprintln!("{}", output::field_errors(&errors));
            bail!("{} field(s) failed validation", errors.len())
        }
        EditOutcome::MissingPhoto => bail!("a photo is required; pass --photo FILE"),
        EditOutcome::NoSelection => bail!("no person selected"),
        EditOutcome::Failed(err) => Err(err).context("update failed"),
    }
}

type FetchResult = (FetchTicket, registrar::Result<Vec<Person>>);

fn spawn_fetch(view: &mut ListView, client: &Client, tx: &mpsc::Sender<FetchResult>) {
    let ticket = view.begin_fetch();
    let client = client.clone();
    let tx = tx.clone();
    debug!(seq = ticket.seq(), "Fetching page");
    tokio::spawn(async move {
        let result = client.list(ticket.query()).await;
        // The receiver is gone once the browser quits.
        let _ = tx.send((ticket, result)).await;
    });
}

async fn handle_browse(config: &Config, cmd: BrowseCommand) -> anyhow::Result<()> {
    let client = connect(config)?;
    let mut view = ListView::from_config(&config.list);
    if let Some(term) = cmd.search {
        view.set_search_now(term);
    }

    let (tx, mut rx) = mpsc::channel::<FetchResult>(8);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type to search by paternal surname. :n next page, :p previous, :r reload, :q quit.");
    spawn_fetch(&mut view, &client, &tx);

    loop {
        let deadline = view.search_deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                match line.trim() {
                    ":q" => break,
                    ":n" => {
                        if view.next_page() {
                            spawn_fetch(&mut view, &client, &tx);
                        } else {
                            println!("Already on the last page.");
                        }
                    }
                    ":p" => {
                        if view.previous_page() {
                            spawn_fetch(&mut view, &client, &tx);
                        } else {
                            println!("Already on the first page.");
                        }
                    }
                    ":r" => spawn_fetch(&mut view, &client, &tx),
                    _ => view.set_search_input(line.clone()),
                }
            }
            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if view.poll_search() {
                    spawn_fetch(&mut view, &client, &tx);
                }
            }
            Some((ticket, result)) = rx.recv() => {
                if view.complete_fetch(&ticket, result) {
                    println!("{}\n", output::list_page(&view, today()));
                }
            }
        }
    }
    Ok(())
}

async fn handle_camera(cmd: CameraCommand) -> anyhow::Result<()> {
    match cmd {
        CameraCommand::Check { photo } => {
            let camera = camera_for(photo.as_deref());
            let status = check_permission(camera.as_ref()).await;
            println!("Camera:     {}", camera.name());
            println!("Permission: {}", status.description);
            if !status.is_granted {
                println!();
                println!("{}", get_permission_instructions());
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let mut shown = config.clone();
            if shown.api.token.is_some() {
                shown.api.token = Some("<redacted>".to_string());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[API]");
                println!(
                    "  Base URL:           {}",
                    shown.api.base_url.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "  Token:              {}",
                    shown.api.token.as_deref().unwrap_or("(not set)")
                );
                println!("  Token header:       {}", shown.api.token_header);
                println!("  Timeout (s):        {}", shown.api.timeout_secs);
                println!();
                println!("[List]");
                println!("  Page size:          {}", shown.list.page_size);
                println!("  Search debounce ms: {}", shown.list.search_debounce_ms);
                println!("  Probe next page:    {}", shown.list.probe_next_page);
                println!();
                println!("[Photo]");
                println!("  Output size:        {}", shown.photo.output_size);
                println!("  Min crop box:       {}", shown.photo.min_crop_box);
                println!();
                println!("[Notifications]");
                println!(
                    "  Auto dismiss ms:    {}",
                    shown.notifications.auto_dismiss_ms
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            return validate_config(file);
        }
    }
    Ok(())
}

fn validate_config(file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    Config::load_from(Some(path)).context("configuration is invalid")?;
    println!("Configuration is valid.");
    Ok(())
}
