use std::collections::HashMap;
use std::hash::Hash;

/// Dense position index over a caller-supplied enumeration.
///
/// Built once at solver entry so identifier lookups never happen inside the
/// sweep loop.
#[derive(Debug, Clone)]
pub(crate) struct Indexer<T>
where
    T: Clone + Eq + Hash,
{
    item_to_index: HashMap<T, usize>,
}

impl<T> Indexer<T>
where
    T: Clone + Eq + Hash,
{
    /// Index every item, or return the position of the first repeated item.
    pub(crate) fn build(items: &[T]) -> Result<Self, usize> {
        let mut item_to_index = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if item_to_index.insert(item.clone(), idx).is_some() {
                return Err(idx);
            }
        }

        Ok(Self { item_to_index })
    }

    pub(crate) fn index_of(&self, item: &T) -> Option<usize> {
        self.item_to_index.get(item).copied()
    }
}
