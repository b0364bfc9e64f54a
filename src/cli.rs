use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use url2pdf_lib::ViewportOptions;

#[derive(Parser)]
#[command(name = "url2pdf")]
#[command(
    version,
    about = "url2pdf - Render web pages and HTML to PDF with headless Chromium",
    long_about = "url2pdf\n\nModes:\n- serve: run the HTTP render service (GET/POST /render, GET /healthz).\n- render: render one URL or HTML file to a PDF file using the same pipeline.\n\nURLs that already point at a PDF are redirected (serve) or downloaded (render) instead of rendered.\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose (debug) logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        help = "Log level (trace, debug, info, warn, error, off); overrides the config file"
    )]
    pub log_level: Option<LevelFilter>,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) for server, browser, probe, scroll and logging settings; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP render service
    Serve {
        #[arg(long, value_name = "ADDR", help = "Listen address (HOST:PORT), e.g. 0.0.0.0:9000")]
        bind: Option<String>,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Render a single URL or HTML file to PDF
    Render {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(
            long = "set",
            short = 's',
            value_name = "KEY=VALUE",
            value_parser = parse_key_value,
            help = "Render option as a dotted key, e.g. -s pdf.format=Letter -s viewport.width=1280 (repeatable)"
        )]
        options: Vec<(String, String)>,

        #[arg(
            long,
            value_name = "WIDTHxHEIGHT[@SCALE]",
            help = "Viewport size, e.g. 1280x800@2; overrides viewport.* options"
        )]
        viewport: Option<ViewportOptions>,

        #[arg(long, short, value_name = "FILE", help = "Destination PDF file")]
        output: PathBuf,

        #[command(flatten)]
        browser: BrowserArgs,
    },
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    #[arg(long, help = "Page to render (absolute http/https URL)")]
    pub url: Option<String>,

    #[arg(long, value_name = "PATH", help = "Local HTML file to render")]
    pub html_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BrowserArgs {
    #[arg(long, value_name = "PATH", help = "Chromium/Chrome executable (auto-detected if omitted)")]
    pub chrome: Option<PathBuf>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub fn parse() -> Cli {
    Cli::parse()
}
