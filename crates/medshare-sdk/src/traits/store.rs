use crate::error::Result;

/// Flat string key/value store backing the local caches
///
/// Mirrors browser local storage: values are JSON documents, a missing key
/// is `None` rather than an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Read, transform and write back `key` as one atomic step
    ///
    /// `apply` sees the current value; returning `None` removes the key.
    /// No other writer of the same backing store can interleave, including
    /// another process sharing a SQLite file.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<Option<String>>,
    ) -> Result<()>;

    /// Keys starting with `prefix`, in ascending order
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}
