//! Typed one-dimensional array storage in HDF5 files.
//!
//! A thin convenience layer over `h5vec-format`: create or open a file,
//! create or open groups, and save or load numeric slices as named
//! datasets.
//!
//! ```no_run
//! use h5vec::{AccessMode, Location, VersionPolicy};
//!
//! let file = h5vec::create_file("out.h5", VersionPolicy::Default)?;
//! let group = h5vec::create_group(&file, "run1")?;
//! h5vec::save(&group, "samples", &[1.0f64, 2.0, 3.0])?;
//! h5vec::close_group(group);
//! h5vec::close_file(file)?;
//!
//! let file = h5vec::open_file("out.h5", AccessMode::ReadOnly, VersionPolicy::Default)?;
//! let mut samples: Vec<f64> = Vec::new();
//! h5vec::load(&file.open_group("run1")?, "samples", &mut samples)?;
//! # Ok::<(), h5vec::Error>(())
//! ```

mod dataset;
pub mod error;
pub mod file;
pub mod group;
pub mod location;
pub mod types;

use std::path::Path;

pub use error::{Error, Result};
pub use file::{AccessMode, File, VersionPolicy};
pub use group::Group;
pub use location::Location;
pub use types::H5Type;

pub use h5vec_format::{Datatype, FileCreateProps, FormatVersion};

/// Create a new file, truncating any existing one. See [`File::create`].
pub fn create_file<P: AsRef<Path>>(path: P, policy: VersionPolicy) -> Result<File> {
    File::create(path, policy)
}

/// Open an existing file. See [`File::open`].
pub fn open_file<P: AsRef<Path>>(path: P, mode: AccessMode, policy: VersionPolicy) -> Result<File> {
    File::open(path, mode, policy)
}

/// Flush and release a file. See [`File::close`].
pub fn close_file(file: File) -> Result<()> {
    file.close()
}

/// Create a group under `parent`. See [`Location::create_group`].
pub fn create_group<'a, L: Location>(parent: &'a L, name: &str) -> Result<Group<'a>> {
    parent.create_group(name)
}

/// Open an existing group under `parent`. See [`Location::open_group`].
pub fn open_group<'a, L: Location>(parent: &'a L, name: &str) -> Result<Group<'a>> {
    parent.open_group(name)
}

/// Release a group handle. See [`Group::close`].
pub fn close_group(group: Group<'_>) {
    group.close()
}

/// Save `values` as a new one-dimensional dataset under `parent`.
pub fn save<T: H5Type, L: Location>(parent: &L, name: &str, values: &[T]) -> Result<()> {
    parent.save(name, values)
}

/// Load a one-dimensional dataset into `out`. See [`Location::load`].
pub fn load<T: H5Type, L: Location>(parent: &L, name: &str, out: &mut Vec<T>) -> Result<()> {
    parent.load(name, out)
}

/// Read a one-dimensional dataset into a new vector. See [`Location::read`].
pub fn read<T: H5Type, L: Location>(parent: &L, name: &str) -> Result<Vec<T>> {
    parent.read(name)
}
