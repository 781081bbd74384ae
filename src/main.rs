//! TrolleyGames entry point
//!
//! The browser build starts from `platform::web`. Natively this runs every
//! game on a line in demo mode on the builtin signals and logs the results.
//!
//! Usage: `trolley-games [LINE] [full|test]`
//!
//! Set `TROLLEY_GAMES_PROGRESS` to a JSON file to keep unlocked levels
//! between runs.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use trolley_games::catalog::{LineData, SignalCatalog, StaticCatalog};
    use trolley_games::games::{GameKind, TickInput};
    use trolley_games::platform::Driver;
    use trolley_games::progress::LocalProgress;
    use trolley_games::router::{Route, Router};
    use trolley_games::{Settings, SignalSet};

    env_logger::init();
    log::info!("TrolleyGames (native) starting...");

    let mut args = std::env::args().skip(1);
    let line = args.next().unwrap_or_else(|| "Blue Line North East".to_string());
    let set = args
        .next()
        .and_then(|s| SignalSet::from_str(&s))
        .unwrap_or(SignalSet::Test);

    let catalog = StaticCatalog::new(set);
    if !catalog.lines().contains(&line) {
        eprintln!("unknown line '{}'; known lines:", line);
        for known in catalog.lines() {
            eprintln!("  {}", known);
        }
        std::process::exit(2);
    }

    let data = match LineData::load(&catalog, &line) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("cannot load '{}': {}", line, err);
            std::process::exit(1);
        }
    };

    let settings = Settings::from_signal_set(set);
    let progress = std::env::var_os("TROLLEY_GAMES_PROGRESS")
        .map(LocalProgress::open)
        .unwrap_or_else(LocalProgress::load);
    let router = Router::new("demo", progress);
    let mut driver = Driver::new(GameKind::HoppyTrain, &line, settings, router, 2024);
    if let Err(err) = driver.provide(data) {
        eprintln!("cannot start: {}", err);
        std::process::exit(1);
    }
    driver.set_input(TickInput {
        autoplay: true,
        ..Default::default()
    });

    const MAX_FRAMES: u32 = 100_000;
    const MAX_SESSIONS: u32 = 16;
    for _ in 0..MAX_SESSIONS {
        let kind = driver.game().kind();
        let mut frames = 0;
        while driver.step().is_none() && frames < MAX_FRAMES {
            frames += 1;
        }
        let snapshot = driver.snapshot();
        println!(
            "{:<12} {:?}: score {}/{}, hearts {}/{}, {} frames",
            kind.name(),
            snapshot.phase,
            snapshot.score,
            snapshot.total,
            snapshot.health,
            snapshot.max_health,
            frames
        );
        if frames >= MAX_FRAMES {
            log::warn!("{} did not finish", kind.name());
            break;
        }
        match driver.follow(&catalog) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                log::warn!("cannot follow route: {}", err);
                break;
            }
        }
    }

    if driver.route() == Some(&Route::Menu) {
        println!(
            "'{}' unlocked {} of {} games",
            line,
            driver.router().level(&line),
            GameKind::ALL.len()
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
