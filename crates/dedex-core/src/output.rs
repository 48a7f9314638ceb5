//! Output routing.
//!
//! In console mode every class goes to one shared stream, preceded by a
//! banner the first time an input produces output:
//!
//! ```text
//! app.apk
//! =======
//!
//! ```
//!
//! In directory mode each class gets its own file, derived from the class
//! name: `a.b.C` with extension `.txt` under `/out` becomes `/out/a/b/C.txt`.
//! No banners are written in directory mode.

use crate::config::ResolvedConfig;
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Label used in errors for the shared stream
const CONSOLE_LABEL: &str = "<stdout>";

/// Where class output goes for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// One shared stream with per-input banners
    Console,
    /// One file per class under this directory
    Directory(PathBuf),
}

impl From<&ResolvedConfig> for OutputMode {
    fn from(config: &ResolvedConfig) -> Self {
        match config.output_dir() {
            Some(dir) => OutputMode::Directory(dir.to_path_buf()),
            None => OutputMode::Console,
        }
    }
}

/// Hands out a destination for each rendered class
#[derive(Debug)]
pub struct OutputRouter<W: Write> {
    mode: OutputMode,
    console: W,
    pending_banner: Option<String>,
}

impl<W: Write> OutputRouter<W> {
    /// Creates a router writing console output to `console`
    pub fn new(mode: OutputMode, console: W) -> Self {
        Self {
            mode,
            console,
            pending_banner: None,
        }
    }

    /// Marks the start of a new input; its banner is written before its first class
    pub fn begin_input(&mut self, display_name: &str) {
        if self.mode == OutputMode::Console {
            self.pending_banner = Some(display_name.to_string());
        }
    }

    /// Opens the destination for one class
    pub fn destination(&mut self, class_name: &str, extension: &str) -> Result<Destination<'_>> {
        match &self.mode {
            OutputMode::Console => {
                if let Some(name) = self.pending_banner.take() {
                    write_banner(&mut self.console, &name)
                        .map_err(|e| Error::file_write(CONSOLE_LABEL, e))?;
                }
                Ok(Destination::Console(&mut self.console))
            }
            OutputMode::Directory(root) => {
                let path = class_file_path(root, class_name, extension)?;
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| Error::directory_create(parent, e))?;
                }
                debug!("Writing {} to {}", class_name, path.display());
                let file = File::create(&path).map_err(|e| Error::file_write(&path, e))?;
                Ok(Destination::File {
                    path,
                    file: BufWriter::new(file),
                })
            }
        }
    }

    /// Flushes the console stream
    pub fn flush(&mut self) -> Result<()> {
        self.console
            .flush()
            .map_err(|e| Error::file_write(CONSOLE_LABEL, e))
    }

    /// Returns the console stream
    pub fn into_inner(self) -> W {
        self.console
    }
}

/// Output target for a single class
pub enum Destination<'a> {
    /// The shared console stream
    Console(&'a mut dyn Write),
    /// A file owned by this class alone
    File {
        /// File path
        path: PathBuf,
        /// Buffered handle, closed when the destination is dropped
        file: BufWriter<File>,
    },
}

impl Destination<'_> {
    /// Path used when reporting write errors
    pub fn label(&self) -> PathBuf {
        match self {
            Destination::Console(_) => PathBuf::from(CONSOLE_LABEL),
            Destination::File { path, .. } => path.clone(),
        }
    }

    /// Flushes and closes the destination
    pub fn finish(mut self) -> Result<()> {
        let label = self.label();
        self.flush().map_err(|e| Error::file_write(label, e))
    }
}

impl Write for Destination<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Destination::Console(out) => out.write(buf),
            Destination::File { file, .. } => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Destination::Console(out) => out.flush(),
            Destination::File { file, .. } => file.flush(),
        }
    }
}

/// Writes the per-input banner: name, `=` underline of the same length, blank line
pub fn write_banner(out: &mut impl Write, name: &str) -> io::Result<()> {
    writeln!(out, "{}", name)?;
    writeln!(out, "{}", "=".repeat(name.chars().count()))?;
    writeln!(out)
}

/// Derives the per-class output path under `root`.
///
/// Each `.`-separated part of the class name becomes a path component; the
/// writer's extension is appended to the last one.
pub fn class_file_path(root: &Path, class_name: &str, extension: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    let mut parts = class_name.split('.').peekable();

    while let Some(part) = parts.next() {
        let component = if parts.peek().is_none() {
            format!("{}{}", part, extension)
        } else {
            part.to_string()
        };

        let mut components = Path::new(&component).components();
        let escapes = part.is_empty()
            || !matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            );
        if escapes {
            return Err(Error::path_traversal(relative.join(&component)));
        }
        relative.push(component);
    }

    Ok(root.join(relative))
}
