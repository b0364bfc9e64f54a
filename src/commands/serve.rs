use std::process::ExitCode;

use url2pdf_lib::server::{self, AppState};
use url2pdf_lib::{RenderOptions, Renderer, Result, ServiceConfig};

use super::{build_resolver, launch_engine};
use crate::formatting::render_error;

/// Run the serve command.
pub async fn run_serve(config: ServiceConfig) -> ExitCode {
    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => render_error(err),
    }
}

async fn serve(config: ServiceConfig) -> Result<()> {
    let addr = config.bind_addr()?;
    let resolver = build_resolver(&config.probe)?;
    let engine = launch_engine(&config.browser).await?;
    let renderer = Renderer::new(engine, config.scroll);

    let state = AppState::new(RenderOptions::default(), resolver, renderer);
    server::serve(addr, state).await
}
