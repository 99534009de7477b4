use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use mapty::{
    app::{App, TerminalController},
    app_dirs::AppDirs,
    collection::{SortDirection, SortKey, SortOrder},
    config::{Config, ConfigStore, FileConfigStore, StorageBackend},
    controller::{Controller, EditInput, FormInput},
    error::WorkoutError,
    export,
    persistence::BlobStore,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    surface::{DetachedMap, FixedLocator, LogNotifier, NullList},
    ui::{self, list::TerminalList, map::TerminalMap, overlay::TerminalNotifier},
    workout::{Coordinate, WorkoutId, WorkoutKind},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

const TICK_RATE_MS: u64 = 50;

/// log your workouts on a map, right in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Pick a spot on a world map, log a run or a ride there, and keep the list of workouts saved between sessions. Without a subcommand the interactive map opens."
)]
pub struct Cli {
    /// workout storage file, instead of the one in the state directory
    #[clap(long, global = true)]
    store: Option<PathBuf>,

    /// storage backend for saved workouts
    #[clap(long, value_enum, global = true)]
    storage: Option<StorageBackend>,

    /// config file to read instead of the default one
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// latitude of your position, used to center the map
    #[clap(long, allow_hyphen_values = true, requires = "lng")]
    lat: Option<f64>,

    /// longitude of your position, used to center the map
    #[clap(long, allow_hyphen_values = true, requires = "lat")]
    lng: Option<f64>,

    /// initial map zoom level
    #[clap(short = 'z', long)]
    zoom: Option<u8>,

    /// write the resolved options back to the config file
    #[clap(long)]
    save_config: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// print saved workouts
    List {
        /// sort by this field instead of creation order
        #[clap(long, value_enum)]
        sort: Option<SortKey>,

        /// sort direction
        #[clap(long, value_enum, default_value_t = SortDirection::Ascending)]
        direction: SortDirection,
    },
    /// log a new workout at a position
    Add {
        #[clap(short, long, value_enum, default_value_t = WorkoutKind::Running)]
        kind: WorkoutKind,

        #[clap(long, allow_hyphen_values = true)]
        lat: f64,

        #[clap(long, allow_hyphen_values = true)]
        lng: f64,

        /// distance in km
        #[clap(short, long, allow_hyphen_values = true)]
        distance: String,

        /// duration in minutes
        #[clap(short = 't', long, allow_hyphen_values = true)]
        duration: String,

        /// steps per minute (running)
        #[clap(short, long, allow_hyphen_values = true, default_value = "")]
        cadence: String,

        /// elevation gain in meters (cycling)
        #[clap(short, long, allow_hyphen_values = true, default_value = "")]
        elevation: String,
    },
    /// change distance, duration or the kind-specific value of a workout
    Edit {
        id: String,

        #[clap(short, long, allow_hyphen_values = true)]
        distance: Option<String>,

        #[clap(short = 't', long, allow_hyphen_values = true)]
        duration: Option<String>,

        /// cadence for runs, elevation gain for rides
        #[clap(short, long, allow_hyphen_values = true)]
        extra: Option<String>,
    },
    /// delete one workout
    Delete { id: String },
    /// delete every workout
    Clear {
        /// confirm deleting all workouts
        #[clap(long)]
        yes: bool,
    },
    /// write workouts as CSV
    Export {
        /// output file, stdout if omitted
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// remove the saved workouts from storage entirely
    Reset {
        #[clap(long)]
        yes: bool,
    },
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// Command line flags take precedence over the config file
    fn resolve_config(&self, mut cfg: Config) -> Config {
        if let Some(storage) = self.storage {
            cfg.storage = storage;
        }
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            cfg.home = Some(Coordinate::new(lat, lng));
        }
        if let Some(zoom) = self.zoom {
            cfg.zoom_level = zoom;
        }
        cfg
    }
}

type HeadlessController = Controller<DetachedMap, NullList, Box<dyn BlobStore>, LogNotifier>;

fn init_logging(tui: bool) {
    let env = env_logger::Env::default().filter_or("MAPTY_LOG", if tui { "info" } else { "error" });
    let mut builder = env_logger::Builder::from_env(env);

    if tui {
        // stderr belongs to the alternate screen; log to a file or not at all
        let Some(path) = AppDirs::log_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(_) => return,
        }
    }

    let _ = builder.try_init();
}

fn headless(cli: &Cli, config: &Config) -> Result<HeadlessController, Box<dyn Error>> {
    let blobs = config.open_blob_store(cli.store.as_deref())?;
    let mut controller = Controller::new(DetachedMap::default(), NullList, blobs, LogNotifier)
        .with_zoom(config.zoom_level);
    let here = config.home.unwrap_or(Coordinate::new(0.0, 0.0));
    controller.start(&FixedLocator::new(Some(here)));
    Ok(controller)
}

fn print_table(controller: &HeadlessController, order: Option<SortOrder>) {
    let workouts = controller.store().ordered(order);
    if workouts.is_empty() {
        println!("no workouts saved");
        return;
    }
    for w in workouts {
        let (metric, unit) = w.metric_display();
        let extra = match w.kind() {
            WorkoutKind::Running => format!("{:.0} spm", w.activity().extra()),
            WorkoutKind::Cycling => format!("{:.0} m", w.activity().extra()),
        };
        println!(
            "{:<10}  {:<24} {:>7} km {:>7} min {:>7} {:<6} {:>8}",
            w.id(),
            w.describe(),
            w.distance_km(),
            w.duration_min(),
            metric,
            unit,
            extra,
        );
    }
}

fn run_command(cli: &Cli, config: &Config, command: &Command) -> Result<(), Box<dyn Error>> {
    let mut controller = headless(cli, config)?;

    match command {
        Command::List { sort, direction } => {
            let order = sort.map(|key| SortOrder::new(key, *direction));
            print_table(&controller, order);
        }
        Command::Add {
            kind,
            lat,
            lng,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            let at = Coordinate::new(*lat, *lng);
            at.validate()?;
            controller.on_map_click(at);
            let input = FormInput {
                kind: *kind,
                distance: distance.clone(),
                duration: duration.clone(),
                cadence: cadence.clone(),
                elevation: elevation.clone(),
            };
            let id = controller.submit(&input)?;
            println!("{id}");
        }
        Command::Edit {
            id,
            distance,
            duration,
            extra,
        } => {
            let id = WorkoutId::new(id.as_str());
            let current = controller
                .store()
                .get(&id)
                .ok_or_else(|| WorkoutError::NotFound(id.clone()))?;
            let mut input = EditInput::for_workout(current);
            if let Some(d) = distance {
                input.distance = d.clone();
            }
            if let Some(d) = duration {
                input.duration = d.clone();
            }
            if let Some(e) = extra {
                input.extra = e.clone();
            }
            controller.begin_edit(&id)?;
            controller.confirm_edit(&id, &input)?;
        }
        Command::Delete { id } => controller.delete(&WorkoutId::new(id.as_str()))?,
        Command::Clear { yes } => {
            if !yes {
                return Err("refusing to delete all workouts without --yes".into());
            }
            let removed = controller.delete_all(true);
            println!("deleted {removed} workouts");
        }
        Command::Export { output } => {
            let workouts = controller.workouts();
            match output {
                Some(path) => export::write_csv(&workouts, File::create(path)?)?,
                None => export::write_csv(&workouts, io::stdout().lock())?,
            }
        }
        Command::Reset { yes } => {
            if !yes {
                return Err("refusing to reset storage without --yes".into());
            }
            let removed = controller.reset();
            println!("storage reset, {removed} workouts removed");
        }
    }
    Ok(())
}

fn run_tui(cli: &Cli, config: &Config) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let blobs = config.open_blob_store(cli.store.as_deref())?;
    let controller: TerminalController = TerminalController::new(
        TerminalMap::new(),
        TerminalList::default(),
        blobs,
        TerminalNotifier::default(),
    )
    .with_zoom(config.zoom_level);
    let mut app = App::new(controller, config.default_kind);
    app.start(&FixedLocator::new(config.home));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui::draw(app, f))?;
    while !app.should_quit {
        let event = runner.step();
        // idle ticks only matter while the map is panning
        let redraw = !matches!(event, AppEvent::Tick) || app.controller.map().is_panning();
        app.on_event(event, runner.tick_interval());
        if redraw {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_logging(cli.command.is_none());

    let store = cli.config_store();
    let config = cli.resolve_config(store.load());
    if cli.save_config {
        store.save(&config)?;
        log::info!("saved config to {}", store.path().display());
    }

    match &cli.command {
        Some(command) => run_command(&cli, &config, command),
        None => run_tui(&cli, &config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mapty: {e}");
            ExitCode::FAILURE
        }
    }
}
