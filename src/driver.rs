//! Loads a registry, builds the view and writes every output unit.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::emit::{self, EmitContext, OutputUnit};
use crate::error::{GenError, Result};
use crate::parse;
use crate::types::{self, Registry};
use crate::view::VersionView;

/// One configured generation run.
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Generator> {
        config.validate()?;
        Ok(Generator { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Parses the registry at `path`.
    ///
    /// Diagnostics that lose information are fatal; the rest are logged.
    /// With `strict` set every diagnostic is fatal.
    pub fn load(&self, path: &Path) -> Result<Registry> {
        let (registry, errors) = parse::parse_file(path).map_err(|source| GenError::Registry {
            path: path.to_path_buf(),
            source,
        })?;
        self.check_diagnostics(errors)?;
        Ok(registry)
    }

    pub fn load_stream<R: Read>(&self, stream: R) -> Result<Registry> {
        let (registry, errors) = parse::parse_stream(stream).map_err(|source| GenError::Registry {
            path: PathBuf::from("<stream>"),
            source,
        })?;
        self.check_diagnostics(errors)?;
        Ok(registry)
    }

    fn check_diagnostics(&self, errors: Vec<types::Error>) -> Result<()> {
        let strict = self.config.strict;
        let mut fatal: Vec<types::Error> = Vec::new();
        for e in errors {
            if strict || e.is_fatal() {
                warn!("{}", e);
                fatal.push(e);
            } else {
                debug!("tolerated: {}", e);
            }
        }
        let count = fatal.len();
        match fatal.into_iter().next() {
            Some(first) => Err(GenError::Malformed { count, first }),
            None => Ok(()),
        }
    }

    pub fn view(&self, registry: &Registry) -> Result<VersionView> {
        let view = VersionView::build(registry, &self.config)?;
        info!(
            "{}: {} constants, {} enums, {} structs, {} unions, {} handles, {} commands",
            view.name,
            view.constants.len(),
            view.enums.len(),
            view.structs.len(),
            view.unions.len(),
            view.handles.len(),
            view.commands.len()
        );
        Ok(view)
    }

    /// Renders every unit into memory.
    pub fn render(&self, view: &VersionView) -> Result<Vec<OutputUnit>> {
        let ctx = EmitContext::new(view, &self.config);
        emit::emit_all(&ctx)
    }

    /// Parses, renders and writes; returns the written paths.
    pub fn run(&self, registry: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let registry = self.load(registry)?;
        let view = self.view(&registry)?;
        let units = self.render(&view)?;
        let written = write_units(out_dir, &units)?;
        info!("wrote {} files to {}", written.len(), out_dir.display());
        Ok(written)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> GenError + '_ {
    move |source| GenError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn staging_path(out_dir: &Path, unit: &OutputUnit) -> PathBuf {
    out_dir.join(format!(".{}.tmp", unit.file_name))
}

/// Writes all units or none: each is staged next to its destination and
/// renamed into place once every stage succeeded.
pub fn write_units(out_dir: &Path, units: &[OutputUnit]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;

    let mut staged = Vec::with_capacity(units.len());
    for unit in units {
        let tmp = staging_path(out_dir, unit);
        if let Err(e) = fs::write(&tmp, unit.text.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            discard(&staged);
            return Err(io_error(&tmp)(e));
        }
        staged.push(tmp);
    }

    let mut written = Vec::with_capacity(units.len());
    for (i, unit) in units.iter().enumerate() {
        let dst = out_dir.join(&unit.file_name);
        if let Err(e) = fs::rename(&staged[i], &dst) {
            discard(&staged[i..]);
            return Err(io_error(&dst)(e));
        }
        debug!("wrote {}", dst.display());
        written.push(dst);
    }
    Ok(written)
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            warn!("could not remove {}: {}", path.display(), e);
        }
    }
}

/// Writes the view as RON, for inspecting what was selected.
#[cfg(feature = "serialize")]
pub fn dump_view(view: &VersionView, path: &Path) -> Result<()> {
    let text = ron::ser::to_string_pretty(view, ron::ser::PrettyConfig::default())
        .map_err(|e| GenError::Config(format!("cannot serialize view: {}", e)))?;
    fs::write(path, text).map_err(io_error(path))
}
