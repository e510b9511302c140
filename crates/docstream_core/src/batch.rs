//! Record batches.

use std::ops::Deref;

/// An ordered, non-empty group of decoded records.
///
/// Records appear in store iteration order. A batch never holds more
/// records than the cursor's configured batch size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<R> {
    records: Vec<R>,
}

impl<R> Batch<R> {
    pub(crate) fn new(records: Vec<R>) -> Self {
        debug_assert!(!records.is_empty(), "batches are never empty");
        Self { records }
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for batches returned by a cursor.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records as a slice.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Consumes the batch, returning its records.
    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

impl<R> Deref for Batch<R> {
    type Target = [R];

    fn deref(&self) -> &[R] {
        &self.records
    }
}

impl<R> IntoIterator for Batch<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a Batch<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_access() {
        let batch = Batch::new(vec![1, 2, 3]);
        assert_eq!(batch.len(), 3);
        assert!(!batch.is_empty());
        assert_eq!(batch.first(), Some(&1));
        assert_eq!(batch.iter().sum::<i32>(), 6);
        assert_eq!(batch.records(), &[1, 2, 3]);
    }

    #[test]
    fn into_iterators() {
        let batch = Batch::new(vec!["a".to_string(), "b".to_string()]);
        let borrowed: Vec<&String> = (&batch).into_iter().collect();
        assert_eq!(borrowed.len(), 2);

        let owned: Vec<String> = batch.into_iter().collect();
        assert_eq!(owned, vec!["a", "b"]);
    }
}
