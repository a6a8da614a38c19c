//! One-dimensional dataset save and load.

use h5vec_format::{dataset_1d, Node};

use crate::error::{Error, Result};
use crate::location::{display_path, group_mut, group_ref, resolve, Location};
use crate::types::{decode, H5Type};

/// Save `values` as a new rank-1 dataset. The tree is only touched once
/// the dataset is fully built, so a failed save leaves no trace.
pub(crate) fn save<L, T>(parent: &L, name: &str, values: &[T]) -> Result<()>
where
    L: Location + ?Sized,
    T: H5Type,
{
    parent.file().ensure_writable()?;
    let path = resolve(parent, name)?;
    let (last, parents) = path.split_last().ok_or_else(|| Error::InvalidName(name.to_owned()))?;
    let node = Node::Dataset(dataset_1d(T::datatype(), T::encode(values))?);

    parent.file().with_tree_mut(|tree| {
        let group = group_mut(&mut tree.root, parents)?;
        if !group.insert(last.clone(), node) {
            return Err(Error::AlreadyExists(display_path(&path)));
        }
        Ok(())
    })?;
    log::debug!("saved {} {} elements to {}", values.len(), T::NAME, display_path(&path));
    Ok(())
}

/// Read a rank-1 dataset, converting elements to `T`.
pub(crate) fn read<L, T>(parent: &L, name: &str) -> Result<Vec<T>>
where
    L: Location + ?Sized,
    T: H5Type,
{
    let path = resolve(parent, name)?;
    let shown = display_path(&path);
    let Some((last, parents)) = path.split_last() else {
        return Err(Error::NotADataset(shown));
    };

    parent.file().with_tree(|tree| {
        let dataset = match group_ref(&tree.root, parents)?.get(last) {
            Some(Node::Dataset(d)) => d,
            Some(Node::Group(_)) => return Err(Error::NotADataset(shown.clone())),
            Some(Node::Unsupported { reason }) => {
                return Err(Error::Unsupported(format!("{shown}: {reason}")))
            }
            None => return Err(Error::NotFound(shown.clone())),
        };
        let rank = dataset.dataspace.rank();
        if rank != 1 {
            return Err(Error::RankMismatch { name: shown.clone(), rank });
        }
        let values = decode(&dataset.datatype, dataset.data(), &shown)?;
        log::trace!("read {} {} elements from {shown}", values.len(), T::NAME);
        Ok(values)
    })
}
