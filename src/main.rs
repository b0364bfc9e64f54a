mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_render, run_serve};
use formatting::render_error;
use settings::{load_config, log_effective_config, resolve_service_settings, CliOverrides};

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let args = cli::parse();

    let (bind, browser) = match &args.command {
        Commands::Serve { bind, browser } => (bind.clone(), browser.clone()),
        Commands::Render { browser, .. } => (None, browser.clone()),
    };
    let overrides = CliOverrides {
        bind,
        chrome: browser.chrome,
        log_level: args.log_level,
        verbose: args.verbose,
    };

    let config = match load_config(args.config.as_deref())
        .and_then(|config| resolve_service_settings(config, &overrides))
    {
        Ok(config) => config,
        Err(err) => return render_error(err),
    };
    if let Err(err) = url2pdf_lib::telemetry::init(&config.logging) {
        return render_error(err);
    }
    log_effective_config(args.config.as_deref(), &config);

    match args.command {
        Commands::Serve { .. } => run_serve(config).await,
        Commands::Render {
            target,
            options,
            viewport,
            output,
            ..
        } => run_render(config, target, options, viewport, output).await,
    }
}
