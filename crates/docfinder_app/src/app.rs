use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::Context;
use docfinder_core::{update, AppState, AppViewModel, Msg};
use docfinder_engine::EngineHandle;
use docfinder_logging::{df_debug, df_info};
use tokio::sync::watch;

use crate::commands::{spawn_stdin_reader, Input, HELP};
use crate::config::ClientConfig;
use crate::effects::EffectRunner;
use crate::persistence::load_archived;
use crate::render::spawn_renderer;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Single writer of `AppState`: user input and engine events are applied in
/// arrival order, and every change publishes a fresh view.
struct App {
    state: AppState,
    runner: EffectRunner,
    view_tx: watch::Sender<AppViewModel>,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut next, effects) = update(state, msg);
        if next.consume_dirty() {
            self.view_tx.send_replace(next.view());
        }
        self.state = next;
        if !effects.is_empty() {
            df_debug!("running {} effect(s)", effects.len());
        }
        self.runner.run(effects);
    }
}

pub(crate) fn run(config: ClientConfig) -> anyhow::Result<()> {
    let engine = EngineHandle::new(config.engine_settings())
        .with_context(|| format!("starting engine for {}", config.base_url))?;
    let runner = EffectRunner::new(engine, config.state_dir.clone());

    let (view_tx, view_rx) = watch::channel(AppViewModel::default());
    let renderer = spawn_renderer(view_rx).context("starting renderer")?;

    let (input_tx, input_rx) = mpsc::channel::<Input>();
    spawn_stdin_reader(input_tx).context("starting input reader")?;

    println!("docfinder connected to {} (type 'help')", config.base_url);
    df_info!("client started against {}", config.base_url);

    let mut app = App {
        state: AppState::new(),
        runner,
        view_tx,
    };
    app.dispatch(Msg::RestoreArchived(load_archived(&config.state_dir)));
    app.dispatch(Msg::MatchCountChanged(config.match_count));
    app.dispatch(Msg::AppStarted);

    loop {
        for msg in app.runner.poll() {
            app.dispatch(msg);
        }
        match input_rx.recv_timeout(POLL_INTERVAL) {
            Ok(Input::Msg(msg)) => app.dispatch(msg),
            Ok(Input::Quit) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    if let Some(task_id) = app.state.stream().running_id() {
        df_info!("cancelling task {} on exit", task_id);
        app.dispatch(Msg::CancelStream);
    }
    drop(app);
    let _ = renderer.join();
    df_info!("client stopped");
    Ok(())
}

pub(crate) fn print_help() {
    println!("{HELP}");
}
