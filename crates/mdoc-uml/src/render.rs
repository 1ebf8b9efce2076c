//! `PlantUML` subprocess rendering with an on-disk image cache.
//!
//! The renderer is invoked as `<command...> -pipe -charset utf-8`, with the
//! diagram text on stdin and stdout redirected straight into the image file.
//! An existing image file is a cache hit and is never regenerated.

use std::fs::{self, File};
use std::io::{self, Write};
use std::process::{ChildStdin, Command, Stdio};

use crate::error::RenderError;
use crate::key::ImageLocation;

/// Arguments appended to the configured command.
const PIPE_ARGS: [&str; 3] = ["-pipe", "-charset", "utf-8"];

/// Renderer configuration, passed in explicitly by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Program followed by its leading arguments.
    pub command: Vec<String>,
}

impl RendererConfig {
    #[must_use]
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// Command as shown in messages.
    #[must_use]
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new(vec!["plantuml".to_owned()])
    }
}

/// How [`PlantumlRenderer::render`] satisfied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The image already existed.
    Cached,
    /// The renderer was invoked and produced the image.
    Rendered,
}

/// Renders diagram text to image files, at most once per distinct text.
#[derive(Debug, Clone)]
pub struct PlantumlRenderer {
    config: RendererConfig,
}

impl PlantumlRenderer {
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Ensure an image for `source` exists at `location.path`.
    ///
    /// Blocks until the renderer exits. On failure the partially written file
    /// is removed so a later build does not take it for a cache hit.
    pub fn render(
        &self,
        source: &str,
        location: &ImageLocation,
    ) -> Result<RenderOutcome, RenderError> {
        let path = &location.path;
        if path.exists() {
            tracing::debug!(path = %path.display(), "Diagram cache hit");
            return Ok(RenderOutcome::Cached);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RenderError::io(parent, e))?;
        }

        let target = File::create(path).map_err(|e| RenderError::io(path, e))?;
        if let Err(e) = self.run(source, target) {
            let _ = fs::remove_file(path);
            return Err(e);
        }

        tracing::info!(path = %path.display(), "Rendered diagram");
        Ok(RenderOutcome::Rendered)
    }

    /// Run the renderer with stdout going to `target`.
    fn run(&self, source: &str, target: File) -> Result<(), RenderError> {
        let Some((program, args)) = self.config.command.split_first() else {
            return Err(self.not_found());
        };

        let spawned = Command::new(program)
            .args(args)
            .args(PIPE_ARGS)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(target))
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(self.not_found()),
            Err(e) => return Err(RenderError::io(program, e)),
        };

        // Feed stdin from a separate thread so a chatty stderr cannot
        // deadlock against a large diagram.
        let stdin = child.stdin.take();
        let (fed, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || feed_stdin(stdin, source));
            let output = child.wait_with_output();
            let fed = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (fed, output)
        });
        let output = output.map_err(|e| RenderError::io(program, e))?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        fed.map_err(|e| RenderError::io(program, e))
    }

    fn not_found(&self) -> RenderError {
        RenderError::NotFound {
            command: self.config.display_command(),
        }
    }
}

/// Write the diagram text and close stdin.
///
/// A renderer that exits without reading all input closes the pipe; that is
/// reported through its exit status instead.
fn feed_stdin(stdin: Option<ChildStdin>, source: &str) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(source.as_bytes()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
