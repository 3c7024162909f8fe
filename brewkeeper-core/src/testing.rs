//! Mock collaborators shared by the unit tests

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;

use brewkeeper_hal::{Storage, StorageError, StorageKey};

use crate::measure::{Gravity, Unit};
use crate::traits::{ControlMode, ControlParameters, ControllerProxy, GravityTracker};

/// In-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: BTreeMap<u8, Vec<u8>>,
    pub fail_writes: bool,
    pub writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: StorageKey, data: &[u8]) {
        self.records.insert(key.as_u8(), data.to_vec());
    }

    pub fn text(&self, key: StorageKey) -> Option<&str> {
        self.records
            .get(&key.as_u8())
            .and_then(|data| core::str::from_utf8(data).ok())
    }
}

impl Storage for MemoryStorage {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .records
            .get(&key.as_u8())
            .ok_or(StorageError::NotFound)?;
        if buffer.len() < data.len() {
            return Err(StorageError::BufferTooSmall);
        }
        buffer[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Io);
        }
        self.writes += 1;
        self.records.insert(key.as_u8(), data.to_vec());
        Ok(())
    }

    fn exists(&mut self, key: StorageKey) -> bool {
        self.records.contains_key(&key.as_u8())
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        self.records.remove(&key.as_u8());
        Ok(())
    }
}

/// Gravity tracker with a settable answer
#[derive(Debug, Default)]
pub struct ScriptedTracker {
    pub stable: Cell<bool>,
    pub queries: Cell<usize>,
    pub last_query: Cell<Option<(u16, Gravity)>>,
}

impl ScriptedTracker {
    pub fn new(stable: bool) -> Self {
        Self {
            stable: Cell::new(stable),
            ..Self::default()
        }
    }
}

impl GravityTracker for ScriptedTracker {
    fn is_stable(&self, window_hours: u16, threshold: Gravity) -> bool {
        self.queries.set(self.queries.get() + 1);
        self.last_query.set(Some((window_hours, threshold)));
        self.stable.get()
    }
}

/// Controller proxy that records every command
#[derive(Debug)]
pub struct RecordingController {
    pub parameters: ControlParameters,
    pub commands: Vec<String>,
}

impl RecordingController {
    pub fn new(mode: ControlMode, unit: Unit, beer_set: f32) -> Self {
        Self {
            parameters: ControlParameters {
                unit,
                mode,
                beer_set,
                fridge_set: beer_set,
            },
            commands: Vec::new(),
        }
    }
}

impl ControllerProxy for RecordingController {
    fn control_parameters(&self) -> ControlParameters {
        self.parameters
    }

    fn write(&mut self, command: &str) {
        self.commands.push(String::from(command));
    }
}
