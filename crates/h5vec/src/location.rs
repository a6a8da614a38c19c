//! Parent locations (the file root or a group) and name resolution.

use h5vec_format::{GroupNode, Node};

use crate::dataset;
use crate::error::{Error, Result};
use crate::file::File;
use crate::group::Group;
use crate::types::H5Type;

pub(crate) mod sealed {
    pub trait Sealed {
        fn file(&self) -> &crate::File;
        /// Path of this location from the root, one entry per group.
        fn components(&self) -> &[String];
    }
}

/// Something that can act as a parent: a [`File`] (its root group) or a
/// [`Group`].
///
/// Names passed to these methods are relative to the location and may
/// contain `/` to reach into existing subgroups. A leading `/` starts from
/// the root group.
pub trait Location: sealed::Sealed {
    /// Absolute path of this location, `/` for the root group.
    fn name(&self) -> String {
        display_path(self.components())
    }

    /// Names of the direct members, in name order.
    fn member_names(&self) -> Result<Vec<String>> {
        self.file().with_tree(|tree| {
            let group = group_ref(&tree.root, self.components())?;
            Ok(group.names().map(str::to_owned).collect())
        })
    }

    /// Whether an object called `name` exists.
    fn contains(&self, name: &str) -> Result<bool> {
        let path = resolve(self, name)?;
        let Some((last, parents)) = path.split_last() else {
            return Ok(true);
        };
        self.file().with_tree(|tree| {
            Ok(group_ref(&tree.root, parents).map_or(false, |g| g.contains(last)))
        })
    }

    /// Create a new group called `name`.
    fn create_group(&self, name: &str) -> Result<Group<'_>> {
        let path = resolve(self, name)?;
        let (last, parents) = path.split_last().ok_or_else(|| Error::InvalidName(name.to_owned()))?;
        self.file().with_tree_mut(|tree| {
            let parent = group_mut(&mut tree.root, parents)?;
            if !parent.insert(last.clone(), Node::Group(GroupNode::new())) {
                return Err(Error::AlreadyExists(display_path(&path)));
            }
            Ok(())
        })?;
        log::debug!("created group {}", display_path(&path));
        Ok(Group::new(self.file(), path))
    }

    /// Open the existing group called `name`.
    fn open_group(&self, name: &str) -> Result<Group<'_>> {
        let path = resolve(self, name)?;
        self.file().with_tree(|tree| group_ref(&tree.root, &path).map(|_| ()))?;
        Ok(Group::new(self.file(), path))
    }

    /// Save `values` as a new one-dimensional dataset called `name`.
    fn save<T: H5Type>(&self, name: &str, values: &[T]) -> Result<()>
    where
        Self: Sized,
    {
        dataset::save(self, name, values)
    }

    /// Read the one-dimensional dataset called `name` into `out`, replacing
    /// its contents. `out` is left unchanged on error.
    fn load<T: H5Type>(&self, name: &str, out: &mut Vec<T>) -> Result<()>
    where
        Self: Sized,
    {
        *out = dataset::read(self, name)?;
        Ok(())
    }

    /// Read the one-dimensional dataset called `name`.
    fn read<T: H5Type>(&self, name: &str) -> Result<Vec<T>>
    where
        Self: Sized,
    {
        dataset::read(self, name)
    }
}

impl sealed::Sealed for File {
    fn file(&self) -> &File {
        self
    }

    fn components(&self) -> &[String] {
        &[]
    }
}

impl Location for File {}

/// Resolve `name` against `base` into a path from the root.
///
/// Empty names, empty path segments and the special names `.` and `..`
/// are rejected.
pub(crate) fn resolve<L: Location + ?Sized>(base: &L, name: &str) -> Result<Vec<String>> {
    let invalid = || Error::InvalidName(name.to_owned());
    let (mut path, rest) = match name.strip_prefix('/') {
        Some(rest) => (Vec::new(), rest),
        None => (base.components().to_vec(), name),
    };
    if name.is_empty() {
        return Err(invalid());
    }
    if rest.is_empty() {
        return Ok(path);
    }
    for segment in rest.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(invalid());
        }
        path.push(segment.to_owned());
    }
    Ok(path)
}

pub(crate) fn display_path(path: &[String]) -> String {
    format!("/{}", path.join("/"))
}

/// Follow `path` through nested groups.
pub(crate) fn group_ref<'t>(root: &'t GroupNode, path: &[String]) -> Result<&'t GroupNode> {
    let mut group = root;
    for (depth, name) in path.iter().enumerate() {
        group = match group.get(name) {
            Some(Node::Group(g)) => g,
            Some(_) => return Err(Error::NotAGroup(display_path(&path[..=depth]))),
            None => return Err(Error::NotFound(display_path(&path[..=depth]))),
        };
    }
    Ok(group)
}

/// Mutable variant of [`group_ref`].
pub(crate) fn group_mut<'t>(root: &'t mut GroupNode, path: &[String]) -> Result<&'t mut GroupNode> {
    let mut group = root;
    for (depth, name) in path.iter().enumerate() {
        group = match group.get_mut(name) {
            Some(Node::Group(g)) => g,
            Some(_) => return Err(Error::NotAGroup(display_path(&path[..=depth]))),
            None => return Err(Error::NotFound(display_path(&path[..=depth]))),
        };
    }
    Ok(group)
}
