//! File handles.
//!
//! A [`File`] holds the whole object tree in memory. Changes are written
//! back by [`File::flush`], [`File::close`] or, failing those, on drop.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use h5vec_format::{read_tree, write_tree, FileCreateProps, FileTree, FormatVersion, WriteOptions};

use crate::error::{Error, Result};

/// How an existing file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Which on-disk layout to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionPolicy {
    /// The most widely readable layout (superblock v0, symbol-table groups).
    #[default]
    Default,
    /// The newest layout (superblock v3, link-message groups).
    Latest,
}

impl VersionPolicy {
    fn format_version(self) -> FormatVersion {
        match self {
            VersionPolicy::Default => FormatVersion::Earliest,
            VersionPolicy::Latest => FormatVersion::Latest,
        }
    }
}

struct State {
    tree: FileTree,
    dirty: bool,
}

/// An open HDF5 file.
///
/// The handle is single-threaded: interior state lives in a `RefCell`, so
/// `File` is not `Sync`.
pub struct File {
    path: PathBuf,
    mode: AccessMode,
    policy: VersionPolicy,
    state: RefCell<State>,
}

impl File {
    /// Create a new file, truncating any existing one.
    ///
    /// The empty file is written immediately so that path and permission
    /// problems are reported here.
    pub fn create<P: AsRef<Path>>(path: P, policy: VersionPolicy) -> Result<File> {
        Self::create_with(path, policy, FileCreateProps::default())
    }

    /// [`File::create`] with explicit group B-tree parameters.
    pub fn create_with<P: AsRef<Path>>(
        path: P,
        policy: VersionPolicy,
        props: FileCreateProps,
    ) -> Result<File> {
        let path = path.as_ref().to_path_buf();
        let tree = FileTree::new(policy.format_version(), props);
        let bytes = encode(&tree)?;
        std::fs::write(&path, bytes).map_err(|source| Error::Create { path: path.clone(), source })?;
        log::debug!("created {} ({:?} layout)", path.display(), tree.version);

        Ok(File {
            path,
            mode: AccessMode::ReadWrite,
            policy,
            state: RefCell::new(State { tree, dirty: false }),
        })
    }

    /// Open an existing file.
    ///
    /// A read-write open fails with [`Error::Unsupported`] if the file holds
    /// content that could not be written back. With
    /// [`VersionPolicy::Latest`] the file is rewritten in the newest layout
    /// the next time it is flushed.
    pub fn open<P: AsRef<Path>>(path: P, mode: AccessMode, policy: VersionPolicy) -> Result<File> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path).map_err(|source| Error::Open { path: path.clone(), source })?;
        let mut tree = read_tree(&bytes)?;

        if let Some(first) = tree.skipped.first() {
            match mode {
                AccessMode::ReadWrite => {
                    return Err(Error::Unsupported(format!(
                        "{} cannot be opened for writing: {} at {}",
                        path.display(),
                        first.reason,
                        first.path
                    )))
                }
                AccessMode::ReadOnly => log::warn!(
                    "{}: {} objects or messages not readable, first: {} at {}",
                    path.display(),
                    tree.skipped.len(),
                    first.reason,
                    first.path
                ),
            }
        }

        tree.version = tree.version.max(policy.format_version());
        log::debug!("opened {} {:?} ({:?} layout)", path.display(), mode, tree.version);

        Ok(File { path, mode, policy, state: RefCell::new(State { tree, dirty: false }) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    pub fn version_policy(&self) -> VersionPolicy {
        self.policy
    }

    /// Layout the file is written with.
    pub fn format_version(&self) -> FormatVersion {
        self.state.borrow().tree.version
    }

    /// Write pending changes to disk. Does nothing for read-only files or
    /// when nothing changed.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.dirty {
            return Ok(());
        }
        let bytes = encode(&state.tree)?;
        replace_file(&self.path, &bytes)?;
        state.dirty = false;
        log::debug!("flushed {} ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }

    /// Flush and release the file.
    pub fn close(mut self) -> Result<()> {
        let result = self.flush();
        // a failed flush is reported here, not retried on drop
        self.state.get_mut().dirty = false;
        log::debug!("closed {}", self.path.display());
        result
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        match self.mode {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(Error::ReadOnly(self.path.clone())),
        }
    }

    pub(crate) fn with_tree<R>(&self, f: impl FnOnce(&FileTree) -> Result<R>) -> Result<R> {
        f(&self.state.borrow().tree)
    }

    /// Run `f` on the tree, marking the file modified if it succeeds.
    pub(crate) fn with_tree_mut<R>(&self, f: impl FnOnce(&mut FileTree) -> Result<R>) -> Result<R> {
        self.ensure_writable()?;
        let mut state = self.state.borrow_mut();
        let result = f(&mut state.tree)?;
        state.dirty = true;
        Ok(result)
    }
}

fn encode(tree: &FileTree) -> Result<Vec<u8>> {
    let opts = WriteOptions { version: tree.version, create: tree.create };
    Ok(write_tree(&tree.root, &opts)?)
}

/// Write `bytes` to a scratch file next to `path`, then rename it over
/// `path`. The old contents survive any failure.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut scratch = tempfile::NamedTempFile::new_in(dir)?;
    scratch.write_all(bytes)?;
    scratch.as_file().sync_all()?;
    scratch.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

impl Drop for File {
    fn drop(&mut self) {
        if self.state.get_mut().dirty {
            if let Err(e) = self.flush() {
                log::warn!("{}: changes lost on drop: {e}", self.path.display());
            }
        }
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("version", &self.format_version())
            .finish()
    }
}
