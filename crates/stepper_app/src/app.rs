use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use stepper_logging::{stepper_error, stepper_info, stepper_warn};
use url::Url;

use crate::config::AppConfig;
use crate::effects::{EffectExecutor, EffectRunner};
use crate::location::{Location, MemoryLocation};
use crate::logging;
use crate::ui::commands::{parse_command, Command, HELP};
use crate::ui::render::{render, render_debug};
use crate::{AppMsg, Stepper};

pub fn run_app(config: AppConfig) -> anyhow::Result<()> {
    logging::initialize(config.log_destination, config.log_level, &config.log_file);
    for warning in &config.warnings {
        stepper_warn!("{}", warning);
    }
    stepper_info!(
        "stepper_app starting: backend={} start_url={}",
        config.backend.base_url,
        config.start_url
    );

    let (msg_tx, msg_rx) = mpsc::channel::<AppMsg>();
    let runner = EffectRunner::new(config.backend.clone(), msg_tx.clone())
        .context("failed to start the backend engine")?;
    let mut stepper = Stepper::new(MemoryLocation::new(config.start_url.clone()), runner);
    stepper
        .load()
        .with_context(|| format!("cannot open {}", config.start_url))?;

    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if msg_tx.send(AppMsg::Input(line)).is_err() {
                return;
            }
        }
        let _ = msg_tx.send(AppMsg::InputClosed);
    });

    let mut screen = Screen::new(config.debug);
    screen.show(&stepper, true);

    while let Ok(msg) = msg_rx.recv() {
        match msg {
            AppMsg::Input(line) => match parse_command(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    let forced = handle_command(&mut stepper, command);
                    screen.show(&stepper, forced);
                }
                Ok(None) => {}
                Err(err) => println!("{err}"),
            },
            AppMsg::Engine(event) => {
                stepper.handle_engine_event(event);
                screen.show(&stepper, false);
            }
            AppMsg::InputClosed => break,
        }
    }

    stepper_info!("stepper_app exiting");
    Ok(())
}

/// Returns `true` when the screen should be redrawn even if nothing changed.
fn handle_command<L, E>(stepper: &mut Stepper<L, E>, command: Command) -> bool
where
    L: Location,
    E: EffectExecutor,
{
    match command {
        Command::Import(repository) => stepper.request_import(&repository),
        Command::Export => {
            if !stepper.request_export() {
                println!("nothing to export yet: import a repository first");
            }
        }
        Command::Reset => stepper.dispatch(stepper_core::Action::Reset),
        Command::Open(url) => open(stepper, url),
        Command::Back => walk(stepper.back(), "back"),
        Command::Forward => walk(stepper.forward(), "forward"),
        Command::Show => return true,
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    false
}

fn open<L: Location, E: EffectExecutor>(stepper: &mut Stepper<L, E>, url: Url) {
    if let Err(err) = stepper.navigate(url) {
        stepper_error!("rejected link: {}", err);
        println!("! {err}");
    }
}

fn walk(result: Result<bool, stepper_core::ConfigError>, direction: &str) {
    match result {
        Ok(true) => {}
        Ok(false) => println!("nothing to go {direction} to"),
        Err(err) => {
            stepper_error!("history entry did not parse: {}", err);
            println!("! {err}");
        }
    }
}

/// Prints the view, skipping redraws that would repeat the last frame.
struct Screen {
    debug: bool,
    last: Vec<String>,
}

impl Screen {
    fn new(debug: bool) -> Self {
        Self {
            debug,
            last: Vec::new(),
        }
    }

    fn show<L: Location, E: EffectExecutor>(&mut self, stepper: &Stepper<L, E>, force: bool) {
        let state = stepper.state();
        let mut frame = render(&state.view());
        frame.push(format!("url: {}", stepper.location().current()));
        if self.debug {
            frame.extend(render_debug(state));
        }
        if !force && frame == self.last {
            return;
        }
        let mut out = io::stdout().lock();
        for line in &frame {
            let _ = writeln!(out, "{line}");
        }
        let _ = out.flush();
        self.last = frame;
    }
}
