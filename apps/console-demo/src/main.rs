mod memory_grid;

use std::str::FromStr;
use std::time::Duration;

use mindframe_app_shell::{
    Difficulty, InputEvent, ModuleDescriptor, ModuleRegistry, Shell, ShellError, ShellOptions,
};
use mindframe_render_common::CacheConfig;
use mindframe_render_console::ConsoleBackend;
use mindframe_ui_graphics::{Point, Size, Theme};

use memory_grid::{MemoryGrid, CELL};

const VIEWPORT: Size = Size {
    width: 160.0,
    height: 80.0,
};
const CHAR_CELL: Size = Size {
    width: 4.0,
    height: 8.0,
};
const FRAME_TIME: Duration = Duration::from_millis(250);

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("ignoring {name}={raw:?}: not a valid value");
            default
        }),
        Err(_) => default,
    }
}

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        log::error!("console demo failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), ShellError> {
    let ticks: u64 = env_or("MINDFRAME_TICKS", 24);
    let capacity: usize = env_or("MINDFRAME_CACHE_CAPACITY", 64);
    let theme_id: String = env_or("MINDFRAME_THEME", "dark".to_owned());
    let theme = Theme::preset(&theme_id).unwrap_or_else(|| {
        log::warn!("unknown theme {theme_id:?}, using dark");
        Theme::dark()
    });
    let other_theme = if theme.is_dark() {
        Theme::light()
    } else {
        Theme::dark()
    };

    let registry = ModuleRegistry::new().with(
        ModuleDescriptor::new("memory_grid", || MemoryGrid::new(Duration::from_secs(1)))
            .with_name("Memory Grid")
            .with_description("Tap the highlighted cell before it moves")
            .with_category("memory")
            .with_difficulty(Difficulty::Easy),
    )?;
    for module in registry.descriptors() {
        println!(
            "{} [{} / {}]: {}",
            module.name, module.category, module.difficulty, module.description
        );
    }

    let options = ShellOptions::default()
        .with_viewport(VIEWPORT)
        .with_cache(CacheConfig::default().with_capacity(capacity))
        .with_theme(theme);
    let mut shell = Shell::new(registry, options);
    let mut session = shell.open_session("memory_grid", ConsoleBackend::new(VIEWPORT, CHAR_CELL))?;
    session.mount()?;
    session.start()?;

    for tick in 0..ticks {
        if tick == ticks / 2 {
            session.set_theme(other_theme.clone());
        }
        // Tap a cell every third tick, walking across the grid.
        if tick % 3 == 2 {
            let (x, y) = MemoryGrid::cell_origin((tick / 3) as usize % 12);
            let half = CELL as f32 / 2.0;
            let position = Point::new(x as f32 + half, y as f32 + half);
            let outcome = session.handle_input(&InputEvent::PointerDown { position });
            log::debug!("tap at {position:?}: {outcome:?}");
        }

        let report = session.tick(FRAME_TIME)?;
        if report.frame.draw_calls > 0 {
            println!(
                "-- tick {} ({} patches, {} hits, {} misses)",
                report.tick, report.diff.patches, report.frame.cache_hits, report.frame.cache_misses
            );
            println!("{}", session.backend().render_to_string());
        }
        while let Some(update) = session.take_sync_update() {
            match serde_json::to_string(&update) {
                Ok(json) => println!("sync {json}"),
                Err(err) => log::error!("cannot encode state update: {err}"),
            }
        }
    }

    session.unmount()?;
    Ok(())
}
