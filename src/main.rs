mod app;
mod cli;
mod config;
mod error;
mod logging;
mod mapping;
mod models;
mod navigator;
mod parser;
mod system;
mod ui;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;

use crate::app::{App, export_headless};
use crate::cli::CliArgs;
use crate::config::MergeConfig;
use crate::ui::render_app;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    logging::init(args.export);

    let mut config = MergeConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    if args.export {
        return run_export(&args, &config);
    }

    let app = App::load(
        args.template.clone(),
        args.data.clone(),
        config,
        args.mappings.clone(),
    );
    let terminal = ratatui::init();
    let result = run_app(terminal, app);
    ratatui::restore();
    result
}

fn run_export(args: &CliArgs, config: &MergeConfig) -> Result<()> {
    let written = export_headless(&args.template, &args.data, config, &args.mappings)?;
    println!(
        "Exported {} file(s) to {}",
        written.len(),
        config.export.dir.display()
    );
    Ok(())
}

fn run_app(mut terminal: DefaultTerminal, mut app: App) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    loop {
        terminal.draw(|frame| render_app(frame, &mut app))?;

        if app.should_quit {
            break;
        }

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }
    }
    Ok(())
}
