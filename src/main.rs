use std::{
    error::Error,
    fs, io,
    path::{Path, PathBuf},
    sync::{atomic::AtomicBool, Arc},
};

use clap::{command, Parser, Subcommand};
use log::{error, info};
use roosty_term_clock::{
    alarm::AlarmBuilder,
    command::ShellCommand,
    config::Config,
    menu::parse_index,
    render::ClockRenderer,
    scheduler::AlarmScheduler,
    sound::RodioPlayer,
    storage::{AlarmRepository, TomlAlarmFile},
    store::AlarmStore,
    terminal::Terminal,
    time::WallClock,
    Clock,
};
use signal_hook::consts::{SIGINT, SIGTERM};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// config file to use instead of the default one
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// add an alarm
    NewAlarm {
        /// HH:MM, 24 hour clock
        time: String,
        #[clap(default_value = "")]
        description: String,
        /// ring every day instead of once
        #[clap(long, short)]
        repeat: bool,
        /// sound file to play instead of the default one
        #[clap(long, short)]
        sound: Option<PathBuf>,
        /// shell command to run when the alarm rings
        #[clap(long, short)]
        command: Option<String>,
    },
    /// print the alarms
    List,
    /// delete an alarm by its number in the list
    Remove { index: String },
}

fn main() -> Result<(), Box<dyn Error>> {
    // logs go to a file, the terminal belongs to the clock
    if simple_file_logger::init_logger!("roosty_term_clock").is_err() {
        eprintln!("couldn't initialize logger, running without logs");
    }

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    match args.command {
        Some(Command::Init { force }) => init(&config_path, force),
        Some(Command::NewAlarm {
            time,
            description,
            repeat,
            sound,
            command,
        }) => {
            let builder = AlarmBuilder {
                time,
                description,
                repeat,
                sound,
                command,
            };
            new_alarm(&load_config(&config_path), builder)
        }
        Some(Command::List) => list(&load_config(&config_path)),
        Some(Command::Remove { index }) => remove(&load_config(&config_path), &index),
        None => run_clock(&load_config(&config_path)),
    }
}

fn load_config(path: &Path) -> Config {
    Config::load(path).unwrap_or_else(|err| {
        error!("{err}, using the default config");
        eprintln!("{err}, using the default config");
        Config::default()
    })
}

fn init(config_path: &Path, force: bool) -> Result<(), Box<dyn Error>> {
    if config_path.exists() && !force {
        println!(
            "{} already exists, use --force to overwrite it",
            config_path.display()
        );
        return Ok(());
    }
    let config = Config::new();
    config.save(config_path)?;
    fs::create_dir_all(Config::sounds_path()?)?;
    println!("wrote {}", config_path.display());
    println!(
        "alarms without a sound of their own play {}",
        config.default_sound.display()
    );
    Ok(())
}

fn open_store(config: &Config) -> Result<(TomlAlarmFile, AlarmStore), Box<dyn Error>> {
    let file = TomlAlarmFile::new(config.alarms_path()?);
    let store = AlarmStore::from_alarms(file.load_all()?);
    Ok((file, store))
}

fn new_alarm(config: &Config, builder: AlarmBuilder) -> Result<(), Box<dyn Error>> {
    let alarm = builder.build()?;
    let (file, mut store) = open_store(config)?;
    let index = store.add(alarm)?;
    file.save_all(store.list())?;
    info!("added alarm {index} from the command line");
    println!("{index}. {}", store.list()[index - 1]);
    Ok(())
}

fn list(config: &Config) -> Result<(), Box<dyn Error>> {
    let (_, store) = open_store(config)?;
    if store.is_empty() {
        println!("no alarms");
    }
    for (i, alarm) in store.list().iter().enumerate() {
        println!("{}. {alarm}", i + 1);
    }
    Ok(())
}

fn remove(config: &Config, index: &str) -> Result<(), Box<dyn Error>> {
    let index = parse_index(index)?;
    let (file, mut store) = open_store(config)?;
    let alarm = store.remove(index)?;
    file.save_all(store.list())?;
    info!("removed alarm {index} from the command line");
    println!("removed {alarm}");
    Ok(())
}

fn run_clock(config: &Config) -> Result<(), Box<dyn Error>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        // a second signal terminates even if the first one is still pending
        signal_hook::flag::register_conditional_default(signal, Arc::clone(&shutdown))?;
        signal_hook::flag::register(signal, Arc::clone(&shutdown))?;
    }

    let player = Arc::new(RodioPlayer::new(config.volume()));
    let scheduler = AlarmScheduler::new(player, ShellCommand, config.default_sound.clone());
    let repository = TomlAlarmFile::new(config.alarms_path()?);

    let terminal = Terminal::enter(Arc::clone(&shutdown))?;
    let mut clock = Clock::new(terminal, Box::new(repository), scheduler)
        .with_renderer(ClockRenderer::new(config.language))
        .with_time_source(WallClock::with_offset_minutes(config.utc_offset_minutes))
        .with_shutdown_flag(shutdown);
    let result = clock.run(&mut io::stdout());
    // leave the alternate screen before anything is printed
    drop(clock);
    result.map_err(Into::into)
}
