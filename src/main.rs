use std::io;
use std::sync::OnceLock;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::Terminal;
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventOutcome, RenderContext, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use pokecatch::action::Action;
use pokecatch::api::{ImageSource, SpeciesLookup};
use pokecatch::artwork_backend::{self, ArtworkBackend};
use pokecatch::config::Config;
use pokecatch::effect::{self, Effect};
use pokecatch::encounter::EncounterGenerator;
use pokecatch::reducer::reducer;
use pokecatch::state::{AppState, TICK_MS};
use pokecatch::storage::{self, MemoryStorage, Storage};
use pokecatch::{logging, ui};

#[derive(Parser, Debug)]
#[command(name = "pokecatch")]
#[command(about = "Catch random Gen 1 Pokemon into your Pokébank")]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(flatten)]
    debug: DebugCliArgs,
}

/// Collaborators used by effects.
struct Services {
    lookup: Box<dyn SpeciesLookup>,
    images: Box<dyn ImageSource>,
    storage: Box<dyn Storage>,
}

static SERVICES: OnceLock<Services> = OnceLock::new();

#[tokio::main]
async fn main() -> io::Result<()> {
    let Args {
        config,
        debug: debug_args,
    } = Args::parse();
    let debug = DebugSession::new(debug_args);

    if let Err(e) = logging::init(&config.log_path()) {
        eprintln!("Warning: logging disabled: {e}");
    }

    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    // Snapshot runs must not touch the real Pokebank.
    let slot: Box<dyn Storage> = if debug.render_once() {
        Box::new(MemoryStorage::new())
    } else {
        Box::new(config.storage())
    };
    let collection = storage::restore(slot.as_ref());
    let policy = config.stale_policy();
    let show_artwork = config.show_artwork();
    let client = config.lookup_client();
    let _ = SERVICES.set(Services {
        lookup: Box::new(client.clone()),
        images: Box::new(client),
        storage: slot,
    });
    tracing::info!(save = %config.save_path().display(), ?policy, "starting pokecatch");

    let state = debug
        .load_state_or_else_async(move || async move {
            Ok::<AppState, io::Error>(AppState::new(collection, policy).with_artwork(show_artwork))
        })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = ArtworkBackend::new(stdout, artwork_backend::registry());
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    tracing::info!("bye");
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
) -> io::Result<DebugRunOutput<AppState>> {
    debug
        .run_effect_app(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::EncounterSearch),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime
                    .subscriptions()
                    .interval("tick", Duration::from_millis(TICK_MS), || Action::Tick);
            },
            |frame, area, state, render_ctx: RenderContext| {
                ui::render(frame, area, state, render_ctx);
            },
            |event, state| -> EventOutcome<Action> { ui::handle_event(event, state) },
            |action| matches!(action, Action::Quit),
            handle_effect,
        )
        .await
}

fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>) {
    let Some(services) = SERVICES.get() else {
        tracing::error!("effect dispatched before services were installed");
        return;
    };
    match effect {
        Effect::FetchEncounter { token } => {
            let roll = EncounterGenerator::new(rand::thread_rng()).roll();
            // One key per request: a newer search never cancels an older one.
            let key = format!("encounter_{}", token.0);
            ctx.tasks().spawn(TaskKey::new(key), async move {
                effect::lookup_encounter(services.lookup.as_ref(), token, roll).await
            });
        }
        Effect::PersistCollection { collection } => {
            effect::persist_collection(services.storage.as_ref(), &collection);
        }
        Effect::LoadArtwork { url } => {
            let key = format!("artwork_{url}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                effect::load_artwork(services.images.as_ref(), url).await
            });
        }
    }
}
