use std::path::{Path, PathBuf};
use std::process::ExitCode;

use reqwest::Client;
use tracing::info;
use url2pdf_lib::{
    normalize, validate_url, ExistingPdfResolver, PartialRenderOptions, RenderError,
    RenderOptions, Renderer, Result, ServiceConfig, ViewportOptions,
};

use super::{build_probe, launch_engine};
use crate::cli::TargetArgs;
use crate::formatting::render_error;

/// Run the render command.
pub async fn run_render(
    config: ServiceConfig,
    target: TargetArgs,
    options: Vec<(String, String)>,
    viewport: Option<ViewportOptions>,
    output: PathBuf,
) -> ExitCode {
    match render(config, target, options, viewport, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => render_error(err),
    }
}

async fn render(
    config: ServiceConfig,
    target: TargetArgs,
    options: Vec<(String, String)>,
    viewport: Option<ViewportOptions>,
    output: &Path,
) -> Result<()> {
    let mut partial = PartialRenderOptions::from_pairs(options)?;
    if partial.url.is_some() || partial.html.is_some() {
        return Err(RenderError::validation(
            "url and html are set with --url / --html-file, not --set",
        ));
    }
    match (target.url, target.html_file) {
        (Some(url), _) => {
            validate_url(&url)?;
            partial.url = Some(url);
        }
        (None, Some(path)) => {
            let html = tokio::fs::read_to_string(&path).await?;
            partial.html = Some(html);
        }
        (None, None) => return Err(RenderError::validation("Pass --url or --html-file")),
    }
    let mut opts = normalize(partial, &RenderOptions::default());
    if let Some(size) = viewport {
        opts.viewport.width = size.width;
        opts.viewport.height = size.height;
        opts.viewport.device_scale_factor = size.device_scale_factor;
    }

    if let Some(url) = opts.url.as_deref() {
        let probe = build_probe(&config.probe)?;
        let resolver = ExistingPdfResolver::with_probe(probe.clone());
        if let Some(pdf_url) = resolver.resolve(url).await? {
            let bytes = download(probe.client(), &pdf_url).await?;
            tokio::fs::write(output, &bytes).await?;
            info!(source = %pdf_url, path = %output.display(), bytes = bytes.len(), "downloaded existing pdf");
            return Ok(());
        }
    }

    let engine = launch_engine(&config.browser).await?;
    let renderer = Renderer::new(engine, config.scroll);
    let pdf = renderer.render(&opts).await?;
    tokio::fs::write(output, &pdf).await?;
    info!(path = %output.display(), bytes = pdf.len(), "pdf written");
    Ok(())
}

/// Fetches an existing PDF with the probe client, so `[probe] timeout` bounds it.
async fn download(http: &Client, url: &str) -> Result<Vec<u8>> {
    let response = http.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
