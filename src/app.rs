use anyhow::{Context as _, bail};
use async_std::future::timeout;
use async_std::io::{self, BufReader};
use async_std::prelude::*;
use async_std::task;
use camino::Utf8PathBuf;
use std::time::Duration;
use tracing::info;

use crate::model::result::{OperationResult, Snapshot};
use crate::services::controller::DebounceController;
use crate::services::search::{Directory, User};
use crate::services::settings::{Settings, SettingsManager};
use crate::services::validation::Field;

const USAGE: &str = "usage: lull [search|validate-email|validate-password|validate-username] \
                     [--config PATH] [--delay MS]";
const SEARCH_LATENCY: Duration = Duration::from_millis(150);
const DRAIN_LIMIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Search,
    Validate(Field),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub mode: Mode,
    pub config: Option<Utf8PathBuf>,
    pub delay_ms: Option<i64>,
}

impl Options {
    pub fn parse<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut mode = Mode::Search;
        let mut config = None;
        let mut delay_ms = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "search" => mode = Mode::Search,
                "validate-email" => mode = Mode::Validate(Field::Email),
                "validate-password" => mode = Mode::Validate(Field::Password),
                "validate-username" => mode = Mode::Validate(Field::Username),
                "--config" => {
                    let path = args.next().context("--config needs a path")?;
                    config = Some(Utf8PathBuf::from(path));
                }
                "--delay" => {
                    let raw = args.next().context("--delay needs a value")?;
                    let ms = raw
                        .parse::<i64>()
                        .with_context(|| format!("invalid --delay value {raw:?}"))?;
                    delay_ms = Some(ms);
                }
                "-h" | "--help" => bail!("{USAGE}"),
                other => bail!("unknown argument {other:?}\n{USAGE}"),
            }
        }

        Ok(Self {
            mode,
            config,
            delay_ms,
        })
    }

    /// Stored settings, then the TOML profile, then `--delay`.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_toml(path)
                .with_context(|| format!("failed to read config {path}"))?,
            None => SettingsManager::load().get().clone(),
        };
        if let Some(ms) = self.delay_ms {
            settings.delay_ms = ms;
        }
        Ok(settings)
    }
}

/// Reads change events from stdin, one per line, and prints every store
/// update. A line starting with `!` is submitted and run right away.
pub fn run(options: Options) -> anyhow::Result<()> {
    let settings = options.settings()?;
    let config = settings.debounce_config()?;
    info!(mode = ?options.mode, delay = ?config.delay, "starting");

    task::block_on(async move {
        match options.mode {
            Mode::Search => {
                let directory = Directory::sample();
                let controller =
                    DebounceController::new(config, directory.operation(SEARCH_LATENCY));
                drive(controller, render_users).await
            }
            Mode::Validate(field) => {
                let controller = DebounceController::new(config, field.operation());
                drive(controller, render_validation).await
            }
        }
    })
}

async fn drive<P>(
    mut controller: DebounceController<P>,
    render: fn(&Snapshot<P>) -> String,
) -> anyhow::Result<()>
where
    P: Send + Sync + 'static,
{
    let store = controller.store();
    let subscription = store.subscribe();
    let printer = task::spawn({
        let store = store.clone();
        async move {
            let mut last_printed = 0;
            while subscription.changed().await.is_some() {
                let snapshot = store.snapshot();
                if snapshot.version > last_printed {
                    last_printed = snapshot.version;
                    println!("{}", render(&snapshot));
                }
            }
        }
    });

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next().await {
        let line = line?;
        match line.strip_prefix('!') {
            Some(rest) => {
                controller.submit(rest);
                controller.flush();
            }
            None => {
                controller.submit(line);
            }
        }
    }

    controller.flush();
    let drained = timeout(DRAIN_LIMIT, async {
        while controller.is_pending() || store.snapshot().is_loading() {
            task::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    if drained.is_err() {
        info!("gave up waiting for the last operation");
    }

    // Let the printer catch the final notification before tearing it down.
    task::sleep(Duration::from_millis(20)).await;
    drop(controller);
    printer.cancel().await;
    Ok(())
}

fn render_users(snapshot: &Snapshot<Vec<User>>) -> String {
    let query = snapshot.query.as_deref().unwrap_or("");
    match &snapshot.result {
        OperationResult::Idle => "idle".to_string(),
        OperationResult::Pending => format!("searching {query:?}..."),
        OperationResult::Success(users) => {
            let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
            format!("{} result(s) for {query:?}: {}", users.len(), names.join(", "))
        }
        OperationResult::Failure(err) => format!("{query:?}: {}", err.message),
    }
}

fn render_validation(snapshot: &Snapshot<()>) -> String {
    match &snapshot.result {
        OperationResult::Idle => "idle".to_string(),
        OperationResult::Pending => "checking...".to_string(),
        OperationResult::Success(()) => "ok".to_string(),
        OperationResult::Failure(err) => err.message.clone(),
    }
}
