use std::cell::{Cell, RefCell};
use std::future::Future;
use std::io::{self, BufRead, Stdout};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::UserDirs;
use tracing::{debug, info};

use idxd_pager::models::{ContextKey, ContextKind, MediaItem, SortSpec};
use idxd_pager::paging::{ItemRenderer, ListController, LoadOutcome, PageSource, SkipReason};
use idxd_pager::sources::http::DEFAULT_TIMEOUT;
use idxd_pager::sources::{DirectoryPageSource, HttpPageSource, SearchPageSource};
use idxd_pager::ui::{Command, TerminalObserver, TerminalStatus, TerminalSurface, TextRenderer, HELP};

pub const API_ENV: &str = "IDXD_PAGER_API";
pub const TIMEOUT_ENV: &str = "IDXD_PAGER_TIMEOUT_SECS";
pub const COMMIT_ENV: &str = "IDXD_COMMIT";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory opened at startup: a local path, or a server path in
    /// remote mode.
    pub start: String,
    /// Base URL of a gallery server. Local folders are browsed when unset.
    pub api_base: Option<String>,
    pub timeout: Duration,
    pub commit: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_sources(std::env::args().skip(1), |name| std::env::var(name).ok())
    }

    fn from_sources<I, F>(mut args: I, var: F) -> Result<Self>
    where
        I: Iterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let api_base = var(API_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let timeout = match var(TIMEOUT_ENV) {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a number of seconds, got {:?}", TIMEOUT_ENV, raw))?;
                Duration::from_secs(secs.max(1))
            }
            None => DEFAULT_TIMEOUT,
        };

        let start = match (args.next(), api_base.is_some()) {
            (Some(path), true) => resolve_path("/", &path),
            (None, true) => "/".to_string(),
            (Some(path), false) => local_dir(Path::new(&path))?,
            (None, false) => {
                let dirs = UserDirs::new().context("Could not determine the home directory")?;
                local_dir(dirs.home_dir())?
            }
        };

        Ok(Self {
            start,
            api_base,
            timeout,
            commit: var(COMMIT_ENV),
        })
    }
}

fn local_dir(path: &Path) -> Result<String> {
    let canonical = std::fs::canonicalize(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    if !canonical.is_dir() {
        return Err(anyhow!("{} is not a directory", canonical.display()));
    }
    canonical
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{} is not valid UTF-8", canonical.display()))
}

/// Joins `arg` onto the absolute `current` path, folding `.` and `..`.
fn resolve_path(current: &str, arg: &str) -> String {
    let mut parts: Vec<&str> = if arg.starts_with('/') {
        Vec::new()
    } else {
        current.split('/').filter(|s| !s.is_empty()).collect()
    };
    for segment in arg.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    format!("/{}", parts.join("/"))
}

type TerminalController = ListController<MediaItem, TextRenderer, TerminalSurface<Stdout>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Directory,
    Search,
}

/// The interactive browser: one controller for folders, one for search
/// results, driven by lines read from stdin.
pub struct PagerApp {
    config: AppConfig,
    directory: TerminalController,
    search: TerminalController,
    directory_watch: TerminalObserver,
    search_watch: TerminalObserver,
    view: Cell<View>,
    sort: Cell<SortSpec>,
    selected: RefCell<Option<String>>,
}

impl PagerApp {
    pub fn new(config: AppConfig) -> Result<Rc<Self>> {
        let (directory_source, search_source): (
            Box<dyn PageSource<MediaItem>>,
            Box<dyn PageSource<MediaItem>>,
        ) = match &config.api_base {
            Some(base) => (
                Box::new(
                    HttpPageSource::new(base, ContextKind::Directory, config.timeout)
                        .context("Failed to create HTTP client")?,
                ),
                Box::new(
                    HttpPageSource::new(base, ContextKind::Search, config.timeout)
                        .context("Failed to create HTTP client")?,
                ),
            ),
            None => (
                Box::new(DirectoryPageSource::new()),
                Box::new(SearchPageSource::new(&config.start)),
            ),
        };

        let directory_watch = TerminalObserver::new();
        let search_watch = TerminalObserver::new();
        let directory = Self::build_controller(
            ContextKind::Directory,
            directory_source,
            &directory_watch,
            config.commit.clone(),
        );
        let search = Self::build_controller(
            ContextKind::Search,
            search_source,
            &search_watch,
            config.commit.clone(),
        );

        Ok(Rc::new(Self {
            config,
            directory,
            search,
            directory_watch,
            search_watch,
            view: Cell::new(View::Directory),
            sort: Cell::new(SortSpec::default()),
            selected: RefCell::new(None),
        }))
    }

    fn build_controller(
        kind: ContextKind,
        source: Box<dyn PageSource<MediaItem>>,
        watch: &TerminalObserver,
        commit: Option<String>,
    ) -> TerminalController {
        ListController::builder(kind, source, TextRenderer, TerminalSurface::new(io::stdout()))
            .observer(Box::new(watch.clone()))
            .status(Box::new(TerminalStatus::new(io::stdout())))
            .commit(commit)
            .build()
    }

    /// Reads commands until stdin closes or the user quits. Must run inside
    /// a `LocalSet`; page loads are spawned onto it so input keeps flowing
    /// while a fetch is outstanding.
    pub async fn run(self: Rc<Self>) -> Result<()> {
        let (tx, rx) = flume::unbounded::<String>();
        std::thread::Builder::new()
            .name("stdin".to_string())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .context("Failed to spawn input thread")?;

        println!("{}", HELP);
        self.open_directory(self.config.start.clone());

        while let Ok(line) = rx.recv_async().await {
            match Command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.dispatch(command),
                Err(err) => println!("{}", err),
            }
        }
        info!("Input closed, exiting");
        Ok(())
    }

    fn dispatch(self: &Rc<Self>, command: Command) {
        debug!(?command, view = ?self.view.get(), "Dispatching command");
        match command {
            Command::Open(arg) => {
                let target = resolve_path(&self.current_dir(), &arg);
                self.open_directory(target);
            }
            Command::Up => {
                let target = resolve_path(&self.current_dir(), "..");
                self.open_directory(target);
            }
            Command::Search(query) => self.open_search(&query),
            Command::Back => self.leave_search(),
            Command::Scroll => self.scroll(),
            Command::LoadMore => {
                if self.active().surface().load_more_visible() {
                    self.spawn_load(|app| async move { app.active().load_next_page().await });
                } else {
                    println!("Nothing more to load");
                }
            }
            Command::Retry => {
                self.spawn_load(|app| async move { app.active().retry_load().await });
            }
            Command::Online => {
                self.spawn_load(|app| async move { app.active().on_connectivity_restored().await });
            }
            Command::Sort(field, order) => {
                let mut sort = self.sort.get();
                sort.field = field;
                if let Some(order) = order {
                    sort.order = order;
                }
                self.apply_sort(sort);
            }
            Command::Filter(filter) => {
                let sort = self.sort.get().with_filter(filter);
                self.apply_sort(sort);
            }
            Command::Refresh => {
                self.spawn_load(|app| async move { app.active().refresh().await });
            }
            Command::View(n) => self.select_index(n),
            Command::Next => self.step_selection(true),
            Command::Prev => self.step_selection(false),
            Command::Stats => {
                let active = self.active();
                println!(
                    "{} [{}] ({:?}, page {})",
                    active.stats(),
                    active.kind().as_str(),
                    active.phase(),
                    active.current_page()
                );
            }
            Command::Cache => {
                let keys = self.active().cached_keys();
                if keys.is_empty() {
                    println!("No cached contexts");
                }
                for key in keys {
                    println!("  {}", key);
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
    }

    // =========================================================================
    // Context switching
    // =========================================================================

    fn open_directory(self: &Rc<Self>, path: String) {
        self.save_active();
        self.view.set(View::Directory);
        *self.selected.borrow_mut() = None;

        let key = ContextKey::directory(&path);
        info!(path = %key, "Opening directory");
        let sort = self.sort.get();
        self.spawn_load(move |app| async move { app.directory.open_context(key, sort).await });
    }

    fn open_search(self: &Rc<Self>, query: &str) {
        let key = ContextKey::search(query);
        if key.as_str().is_empty() {
            println!("Empty query");
            return;
        }
        self.save_active();
        self.view.set(View::Search);
        *self.selected.borrow_mut() = None;

        info!(query = %key, "Searching");
        let sort = self.sort.get();
        self.spawn_load(move |app| async move { app.search.open_context(key, sort).await });
    }

    fn leave_search(self: &Rc<Self>) {
        if self.view.get() != View::Search {
            return;
        }
        let dir = self.current_dir();
        self.open_directory(dir);
    }

    /// Snapshots whatever is on screen and detaches from it before another
    /// context replaces it, so a fetch still in flight lands nowhere.
    fn save_active(&self) {
        self.active().leave_context();
    }

    fn apply_sort(self: &Rc<Self>, sort: SortSpec) {
        info!(%sort, "Sort changed");
        self.sort.set(sort);
        self.inactive().clear_cache(None);
        self.spawn_load(move |app| async move { app.active().set_sort(sort).await });
    }

    // =========================================================================
    // Scrolling and loading
    // =========================================================================

    fn scroll(self: &Rc<Self>) {
        let active = self.active();
        active.surface_mut().scroll_page();

        let Some(margin) = self.active_watch().margin() else {
            if !active.has_more() {
                println!("(end of list)");
            }
            return;
        };
        if active.surface().sentinel_within(margin) {
            self.spawn_load(|app| async move { app.active().on_sentinel_visible().await });
        }
    }

    fn spawn_load<F, Fut>(self: &Rc<Self>, load: F)
    where
        F: FnOnce(Rc<Self>) -> Fut + 'static,
        Fut: Future<Output = LoadOutcome> + 'static,
    {
        let app = Rc::clone(self);
        tokio::task::spawn_local(async move {
            let outcome = load(Rc::clone(&app)).await;
            app.report(&outcome);
        });
    }

    fn report(&self, outcome: &LoadOutcome) {
        match outcome {
            LoadOutcome::Failed(err) => println!("       {}", err),
            LoadOutcome::Skipped(SkipReason::NothingToRetry) => println!("Nothing to retry"),
            LoadOutcome::Skipped(reason) => debug!(?reason, "Load skipped"),
            LoadOutcome::Stale => debug!("Load finished after context switch"),
            LoadOutcome::Loaded { .. } | LoadOutcome::Restored => {}
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn select_index(&self, n: usize) {
        let items = self.active().all_loaded_items();
        match items.get(n - 1) {
            Some(item) => {
                println!("→ {}", TextRenderer.render(item));
                *self.selected.borrow_mut() = Some(item.path.clone());
            }
            None => println!("Only {} items loaded", items.len()),
        }
    }

    fn step_selection(&self, forward: bool) {
        let Some(current) = self.selected.borrow().clone() else {
            println!("Nothing selected, use `view <n>`");
            return;
        };
        match self
            .active()
            .adjacent_item(&current, forward, |item| !item.is_folder())
        {
            Some(item) => {
                println!("→ {}", TextRenderer.render(&item));
                *self.selected.borrow_mut() = Some(item.path);
            }
            None => println!("(no further item)"),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn active(&self) -> &TerminalController {
        match self.view.get() {
            View::Directory => &self.directory,
            View::Search => &self.search,
        }
    }

    fn inactive(&self) -> &TerminalController {
        match self.view.get() {
            View::Directory => &self.search,
            View::Search => &self.directory,
        }
    }

    fn active_watch(&self) -> &TerminalObserver {
        match self.view.get() {
            View::Directory => &self.directory_watch,
            View::Search => &self.search_watch,
        }
    }

    fn current_dir(&self) -> String {
        self.directory
            .current_key()
            .map(|key| key.to_string())
            .unwrap_or_else(|| self.config.start.clone())
    }
}
