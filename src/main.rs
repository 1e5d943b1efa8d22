use crossterm::event::{self, DisableFocusChange, EnableFocusChange, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use gridsnake::app::App;
use gridsnake::audio::Audio;
use gridsnake::config::{AppConfig, ENV_DATA_DIR};
use gridsnake::core::constants::{FRAME_MS, LEADERBOARD_TIMEOUT_MS};
use gridsnake::input::map_key;
use gridsnake::leaderboard::{LeaderboardSync, RemoteLeaderboard, RestLeaderboard};
use gridsnake::logging;
use gridsnake::profile::{self, Profile};
use gridsnake::utils::build_info;
use gridsnake::utils::persistence::Store;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn print_help() {
    println!("Gridsnake - terminal snake with a leaderboard\n");
    println!("Usage: gridsnake [options] [command]\n");
    println!("Commands:");
    println!("  reset      Clear high scores, player name and cached leaderboard");
    println!("Options:");
    println!("  --offline  Ignore the configured remote leaderboard");
    println!("  --version  Show version information");
    println!("  --help     Show this help message\n");
    println!("Environment:");
    println!("  GRIDSNAKE_REMOTE_URL, GRIDSNAKE_REMOTE_KEY, GRIDSNAKE_REMOTE_TABLE");
    println!("  GRIDSNAKE_DATA_DIR, GRIDSNAKE_LOG, GRIDSNAKE_SOUND");
}

fn open_store() -> io::Result<Store> {
    match std::env::var(ENV_DATA_DIR) {
        Ok(dir) if !dir.trim().is_empty() => Store::at(dir),
        _ => Store::open_default(),
    }
}

fn main() -> io::Result<()> {
    let mut offline = false;
    let mut reset = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-v" => {
                println!("{}", build_info::version_line());
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--offline" => offline = true,
            "reset" => reset = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Run 'gridsnake --help' for usage.");
                std::process::exit(1);
            }
        }
    }

    let store = open_store()?;
    if reset {
        profile::reset(&store);
        println!("Records and cached leaderboard cleared.");
        return Ok(());
    }

    let mut config = AppConfig::load(&store);
    if offline {
        config = config.offline();
    }
    logging::init(store.dir(), &config.log_filter);
    tracing::info!(
        version = %build_info::version_line(),
        remote = config.remote.is_configured(),
        "starting"
    );

    let remote: Option<Arc<dyn RemoteLeaderboard>> = if config.remote.is_configured() {
        Some(Arc::new(RestLeaderboard::new(&config.remote)))
    } else {
        None
    };
    let sync = LeaderboardSync::new(
        remote,
        profile::load_leaderboard_cache(&store),
        Duration::from_millis(LEADERBOARD_TIMEOUT_MS),
    );
    let profile = Profile::load(&store);
    let mut app = App::new(
        Some(store),
        profile,
        sync,
        Audio::terminal(config.sound),
        StdRng::from_entropy(),
    );
    app.mount();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = run(&mut terminal, &mut app);
    app.shutdown();

    // Restore terminal even if the loop failed
    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableFocusChange)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "terminal loop failed");
    }
    tracing::info!("exiting");
    result
}

/// Frame loop: step, draw, then wait up to one frame for input.
fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    let mut last = Instant::now();
    loop {
        let now = Instant::now();
        let dt = now.duration_since(last);
        last = now;

        app.update(dt.as_secs_f64() * 1000.0);
        terminal.draw(|frame| app.render(frame, dt.as_secs_f32()))?;

        if app.should_quit() {
            return Ok(());
        }

        let mut timeout = Duration::from_millis(FRAME_MS);
        while event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => app.handle_action(map_key(key, app.is_naming())),
                Event::FocusLost => app.set_visible(false),
                Event::FocusGained => app.set_visible(true),
                _ => {}
            }
            timeout = Duration::ZERO;
        }
    }
}
