//! Group handles.

use std::fmt;

use crate::file::File;
use crate::location::{display_path, sealed, Location};

/// An open group inside a [`File`].
///
/// The handle borrows its file, so the file cannot be closed while the
/// group is alive.
pub struct Group<'f> {
    file: &'f File,
    path: Vec<String>,
}

impl<'f> Group<'f> {
    pub(crate) fn new(file: &'f File, path: Vec<String>) -> Self {
        Group { file, path }
    }

    /// Release the handle. Closing a group cannot fail.
    pub fn close(self) {
        log::trace!("closed group {}", display_path(&self.path));
    }
}

impl sealed::Sealed for Group<'_> {
    fn file(&self) -> &File {
        self.file
    }

    fn components(&self) -> &[String] {
        &self.path
    }
}

impl Location for Group<'_> {}

impl fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("file", &self.file.path())
            .field("path", &display_path(&self.path))
            .finish()
    }
}
