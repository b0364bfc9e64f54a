mod render;
mod serve;

pub use render::run_render;
pub use serve::run_serve;

use std::sync::Arc;

use url2pdf_lib::config::BrowserSettings;
use url2pdf_lib::{BrowserEngine, ExistingPdfResolver, HttpProbe, ProbeSettings, Result};

/// Starts the browser shared by every render of this process.
#[cfg(feature = "chromium")]
pub(crate) async fn launch_engine(settings: &BrowserSettings) -> Result<Arc<dyn BrowserEngine>> {
    let engine = url2pdf_lib::ChromiumEngine::launch(settings).await?;
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "chromium"))]
pub(crate) async fn launch_engine(_settings: &BrowserSettings) -> Result<Arc<dyn BrowserEngine>> {
    Err(url2pdf_lib::RenderError::Config(
        "url2pdf was built without the `chromium` feature; no browser engine is available"
            .to_string(),
    ))
}

pub(crate) fn build_probe(settings: &ProbeSettings) -> Result<Arc<HttpProbe>> {
    let probe = HttpProbe::with_timeout(settings.timeout, settings.user_agent.as_deref())?;
    Ok(Arc::new(probe))
}

pub(crate) fn build_resolver(settings: &ProbeSettings) -> Result<ExistingPdfResolver> {
    Ok(ExistingPdfResolver::with_probe(build_probe(settings)?))
}
