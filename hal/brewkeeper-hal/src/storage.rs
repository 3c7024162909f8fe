//! Persistent storage abstractions
//!
//! Provides a trait for key-addressed persistent records. Every call is a
//! complete, scoped access: the backing store is opened, used and released
//! before the call returns, on success and on failure alike.

/// Storage keys for persisted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Brewing profile description (JSON text)
    BrewProfile = 0,
    /// Brewing progress record (JSON text)
    BrewStatus = 1,
    /// Keeper configuration (binary postcard format)
    KeeperConfig = 2,
    /// Keeper configuration as TOML text
    KeeperConfigToml = 3,
}

impl StorageKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Backing store could not be opened, read or written
    Io,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Data corrupted or invalid
    Corrupted,
    /// Storage is full
    Full,
}

/// Key-value storage trait
///
/// Implementations should make `write` replace the whole record; a
/// partially written record must read back as `Corrupted` or `NotFound`,
/// never as a truncated value.
pub trait Storage {
    /// Read a record by key into the provided buffer
    ///
    /// # Returns
    /// The number of bytes read, or an error.
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError>;

    /// Replace the record stored under `key`
    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError>;

    /// Check if a record exists
    fn exists(&mut self, key: StorageKey) -> bool;

    /// Remove a record; removing a missing record is not an error
    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError>;
}

impl<T: Storage + ?Sized> Storage for &mut T {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        (**self).read(key, buffer)
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        (**self).write(key, data)
    }

    fn exists(&mut self, key: StorageKey) -> bool {
        (**self).exists(key)
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
