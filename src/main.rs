use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use vk_bindgen::{Generator, GeneratorConfig, VersionView};

/// Generate Rust FFI bindings from the Vulkan API registry
#[derive(Parser)]
#[command(name = "vk-bindgen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate Rust FFI bindings from vk.xml")]
struct Cli {
    /// Path to vk.xml
    registry: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "generated")]
    output: PathBuf,

    /// Generator configuration (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API to generate for
    #[arg(long)]
    api: Option<String>,

    /// Highest core version to include, e.g. 1.3
    #[arg(long)]
    vk_version: Option<String>,

    /// Extension to include; repeatable. Without any, every supported extension is included
    #[arg(short, long = "extension")]
    extensions: Vec<String>,

    /// Platform whose extensions are included; repeatable
    #[arg(short, long = "platform")]
    platforms: Vec<String>,

    /// Include provisional extensions
    #[arg(long)]
    provisional: bool,

    /// Treat every registry diagnostic as fatal
    #[arg(long)]
    strict: bool,

    /// Library named in `#[link]` on the command block
    #[arg(long)]
    link_name: Option<String>,

    /// Also write the selected view as RON
    #[cfg(feature = "serialize")]
    #[arg(long)]
    dump_view: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info", env = "VK_BINDGEN_LOG")]
    log_level: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> log::LevelFilter {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Cli {
    /// Configuration file values with command-line overrides applied.
    fn generator_config(&self) -> Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_file(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => GeneratorConfig::default(),
        };
        if let Some(api) = &self.api {
            config.api = api.clone();
        }
        if let Some(version) = &self.vk_version {
            config.version = Some(version.clone());
        }
        if !self.extensions.is_empty() {
            config.extensions = Some(self.extensions.clone());
        }
        config.platforms.extend(self.platforms.iter().cloned());
        config.provisional |= self.provisional;
        config.strict |= self.strict;
        if self.link_name.is_some() {
            config.link_name = self.link_name.clone();
        }
        Ok(config)
    }
}

#[cfg(feature = "serialize")]
fn dump_view(cli: &Cli, view: &VersionView) -> Result<()> {
    if let Some(path) = &cli.dump_view {
        vk_bindgen::driver::dump_view(view, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

#[cfg(not(feature = "serialize"))]
fn dump_view(_cli: &Cli, _view: &VersionView) -> Result<()> {
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.into())
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();

    let generator = Generator::new(cli.generator_config()?).context("invalid configuration")?;
    let registry = generator
        .load(&cli.registry)
        .with_context(|| format!("parsing {}", cli.registry.display()))?;
    let view = generator.view(&registry).context("selecting registry elements")?;

    dump_view(&cli, &view)?;

    let units = generator.render(&view).context("generating bindings")?;
    let written = vk_bindgen::driver::write_units(&cli.output, &units)
        .with_context(|| format!("writing to {}", cli.output.display()))?;
    log::info!("wrote {} files to {}", written.len(), cli.output.display());
    Ok(())
}
