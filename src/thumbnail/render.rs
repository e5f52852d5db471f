//! First-page PDF rendering
//!
//! Rendering is a pluggable capability. `PdftoppmRenderer` shells out to
//! poppler's `pdftoppm`; `NoopRenderer` stands in where no renderer exists.
//! Callers check `available()` before doing any work for a render.

use crate::config::{RenderBackend, RenderConfig};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while rendering a cover page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Renderer unavailable: {0}")]
    Unavailable(String),

    #[error("Rendering {} failed: {message}", path.display())]
    Failed { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for first-page renderers
///
/// Implementations are blocking; the image pipeline runs them on the
/// blocking thread pool.
pub trait PageRenderer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Returns true if `render_first_page` can succeed at all
    fn available(&self) -> bool;

    /// Renders page 1 of `pdf` to a JPEG at `output`
    fn render_first_page(&self, pdf: &Path, output: &Path) -> Result<(), RenderError>;
}

/// Renderer used when rendering is disabled or unsupported
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl PageRenderer for NoopRenderer {
    fn name(&self) -> &str {
        "none"
    }

    fn available(&self) -> bool {
        false
    }

    fn render_first_page(&self, _pdf: &Path, _output: &Path) -> Result<(), RenderError> {
        Err(RenderError::Unavailable("rendering is disabled".to_string()))
    }
}

/// Renders through poppler's `pdftoppm`
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    program: PathBuf,
    dpi: u32,
    available: bool,
}

impl PdftoppmRenderer {
    /// Creates a renderer and checks once whether `program` can be spawned
    pub fn new(program: impl Into<PathBuf>, dpi: u32) -> Self {
        let program = program.into();
        let available = can_spawn(&program);
        if !available {
            tracing::warn!(
                "{} not found; PDF cover thumbnails are disabled",
                program.display()
            );
        }
        Self {
            program,
            dpi,
            available,
        }
    }

    /// Builds the argument list for rendering `pdf` into `<prefix>.jpg`
    fn args(&self, pdf: &Path, prefix: &Path) -> Vec<std::ffi::OsString> {
        vec![
            "-f".into(),
            "1".into(),
            "-l".into(),
            "1".into(),
            "-singlefile".into(),
            "-jpeg".into(),
            "-r".into(),
            self.dpi.to_string().into(),
            pdf.as_os_str().to_owned(),
            prefix.as_os_str().to_owned(),
        ]
    }
}

/// The program counts as present if it can be spawned, whatever its exit code
fn can_spawn(program: &Path) -> bool {
    Command::new(program)
        .arg("-v")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

impl PageRenderer for PdftoppmRenderer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    fn available(&self) -> bool {
        self.available
    }

    fn render_first_page(&self, pdf: &Path, output: &Path) -> Result<(), RenderError> {
        if !self.available {
            return Err(RenderError::Unavailable(format!(
                "{} not found",
                self.program.display()
            )));
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // pdftoppm appends the extension itself
        let prefix = output.with_extension("");
        let result = Command::new(&self.program)
            .args(self.args(pdf, &prefix))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let out = match result {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RenderError::Unavailable(e.to_string()))
            }
            Err(e) => return Err(RenderError::Io(e)),
        };

        if !out.status.success() {
            return Err(RenderError::Failed {
                path: pdf.to_path_buf(),
                message: format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            });
        }

        let produced = prefix.with_extension("jpg");
        if produced != output {
            std::fs::rename(&produced, output)?;
        }

        if !output.exists() {
            return Err(RenderError::Failed {
                path: pdf.to_path_buf(),
                message: "renderer produced no image".to_string(),
            });
        }

        Ok(())
    }
}

/// Builds the renderer selected by the configuration
pub fn renderer_from_config(config: &RenderConfig) -> Arc<dyn PageRenderer> {
    match config.backend {
        RenderBackend::Pdftoppm => Arc::new(PdftoppmRenderer::new(&config.program, config.dpi)),
        RenderBackend::None => Arc::new(NoopRenderer),
    }
}
