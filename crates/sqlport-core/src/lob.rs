//! Large-object handles and their registry.
//!
//! Decoding a `clob`/`blob` column registers the raw resource and hands out
//! a [`LobLocator`]. Contents are materialized lazily through
//! [`Backend::retrieve_lob`] on first access and can be read in slices,
//! streamed through [`std::io::Read`] or copied to a file.
//!
//! Slots are recycled with a bumped generation, so a [`LobIndex`] is never
//! handed out twice by the same registry and stale locators are detected.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::value::Value;

/// Scheme of the textual locator form.
pub const LOB_SCHEME: &str = "sqlportlob://";

/// Registry index of a LOB: `(generation << 32) | slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LobIndex(u64);

impl LobIndex {
    fn new(slot: u32, generation: u32) -> Self {
        Self((u64::from(generation) << 32) | u64::from(slot))
    }

    pub const fn slot(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LobIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a LOB held by the registry of one connection.
///
/// Textual form: `sqlportlob://<index>@<connection identity>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LobLocator {
    index: LobIndex,
    identity: String,
}

impl LobLocator {
    pub fn new(index: LobIndex, identity: impl Into<String>) -> Self {
        Self {
            index,
            identity: identity.into(),
        }
    }

    pub fn index(&self) -> LobIndex {
        self.index
    }

    /// Identity of the connection that issued this locator.
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

impl fmt::Display for LobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LOB_SCHEME}{}@{}", self.index, self.identity)
    }
}

impl FromStr for LobLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::invalid("parse_lob_locator", format!("not a LOB reference: {s}"));
        let rest = s.strip_prefix(LOB_SCHEME).ok_or_else(invalid)?;
        let (index, identity) = rest.split_once('@').ok_or_else(invalid)?;
        let index = index.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self {
            index: LobIndex(index),
            identity: identity.to_string(),
        })
    }
}

/// State of one large object.
#[derive(Debug, Clone)]
pub struct LobEntry {
    index: LobIndex,
    resource: Value,
    value: Option<Vec<u8>>,
    position: usize,
    loaded: bool,
    end_of_lob: bool,
}

impl LobEntry {
    fn new(index: LobIndex, resource: Value) -> Self {
        Self {
            index,
            resource,
            value: None,
            position: 0,
            loaded: false,
            end_of_lob: false,
        }
    }

    pub fn index(&self) -> LobIndex {
        self.index
    }

    /// The raw value the LOB was registered with.
    pub fn resource(&self) -> &Value {
        &self.resource
    }

    /// The raw resource as bytes.
    pub fn resource_bytes(&self) -> Vec<u8> {
        match &self.resource {
            Value::Null => Vec::new(),
            Value::Bytes(bytes) => bytes.clone(),
            Value::Text(text) => text.clone().into_bytes(),
            other => other.to_text().into_bytes(),
        }
    }

    /// Materialized contents, unset until first access.
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Vec<u8>) {
        self.value = Some(value);
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn at_end(&self) -> bool {
        self.end_of_lob
    }

    fn slice(&self, max_len: usize) -> &[u8] {
        let data = self.value.as_deref().unwrap_or_default();
        let start = self.position.min(data.len());
        let end = start.saturating_add(max_len).min(data.len());
        &data[start..end]
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<LobEntry>,
}

/// Slot arena owning every LOB decoded through one connection.
#[derive(Debug)]
pub struct LobRegistry {
    identity: String,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl LobRegistry {
    /// Create an empty registry issuing locators for `identity`.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Number of live LOBs.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Register a raw resource and return its locator.
    pub fn register(&mut self, resource: Value) -> LobLocator {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let state = &mut self.slots[slot as usize];
        let index = LobIndex::new(slot, state.generation);
        state.entry = Some(LobEntry::new(index, resource));
        self.live += 1;

        tracing::trace!(connection = %self.identity, index = %index, "Registered LOB");
        LobLocator::new(index, self.identity.clone())
    }

    /// Check if the locator refers to a live LOB of this registry.
    pub fn contains(&self, locator: &LobLocator) -> bool {
        self.get(locator).is_ok()
    }

    /// Look up a live LOB.
    pub fn get(&self, locator: &LobLocator) -> Result<&LobEntry> {
        self.check_identity(locator)?;
        self.slots
            .get(locator.index.slot() as usize)
            .filter(|slot| slot.generation == locator.index.generation())
            .and_then(|slot| slot.entry.as_ref())
            .ok_or_else(|| stale(locator))
    }

    fn get_mut(&mut self, locator: &LobLocator) -> Result<&mut LobEntry> {
        self.check_identity(locator)?;
        self.slots
            .get_mut(locator.index.slot() as usize)
            .filter(|slot| slot.generation == locator.index.generation())
            .and_then(|slot| slot.entry.as_mut())
            .ok_or_else(|| stale(locator))
    }

    fn check_identity(&self, locator: &LobLocator) -> Result<()> {
        if locator.identity == self.identity {
            Ok(())
        } else {
            Err(Error::invalid(
                "lob",
                format!(
                    "LOB reference {locator} belongs to another connection than {}",
                    self.identity
                ),
            ))
        }
    }

    /// Load the LOB contents through the backend if not done yet.
    pub fn materialize(&mut self, backend: &dyn Backend, locator: &LobLocator) -> Result<()> {
        let entry = self.get_mut(locator)?;
        materialize_entry(backend, entry)
    }

    /// Up to `max_len` bytes from the current position. Does not advance.
    pub fn read(
        &mut self,
        backend: &dyn Backend,
        locator: &LobLocator,
        max_len: usize,
    ) -> Result<Vec<u8>> {
        let entry = self.get_mut(locator)?;
        materialize_entry(backend, entry)?;
        Ok(entry.slice(max_len).to_vec())
    }

    /// The whole materialized contents, regardless of position.
    pub fn contents(&mut self, backend: &dyn Backend, locator: &LobLocator) -> Result<Vec<u8>> {
        let entry = self.get_mut(locator)?;
        materialize_entry(backend, entry)?;
        Ok(entry.value.clone().unwrap_or_default())
    }

    /// Whether a stream over this LOB reached its end.
    pub fn at_end(&self, locator: &LobLocator) -> Result<bool> {
        Ok(self.get(locator)?.end_of_lob)
    }

    /// Open a read stream over the LOB, starting at its current position.
    pub fn stream<'a>(
        &'a mut self,
        backend: &dyn Backend,
        locator: &LobLocator,
    ) -> Result<LobStream<'a>> {
        let entry = self.get_mut(locator)?;
        materialize_entry(backend, entry)?;
        Ok(LobStream { entry })
    }

    /// Copy the remaining LOB contents to a file.
    ///
    /// A `file://` prefix is stripped from `path`. Data is written in chunks
    /// of [`Options::lob_buffer_length`](crate::options::Options) bytes.
    pub fn write_to_file(
        &mut self,
        backend: &dyn Backend,
        locator: &LobLocator,
        path: &str,
    ) -> Result<()> {
        let path = path.strip_prefix("file://").unwrap_or(path);
        let chunk_len = backend.options().lob_buffer_length.max(1);

        let mut stream = self.stream(backend, locator)?;
        let mut target =
            PartialFile::create(Path::new(path)).map_err(|err| write_failed(Some(err)))?;
        let written = copy_chunks(&mut stream, target.file(), chunk_len)
            .map_err(|err| write_failed(Some(err)))?;
        target.keep().map_err(|err| write_failed(Some(err)))?;

        tracing::debug!(path = %path, bytes = written, "Wrote LOB to file");
        Ok(())
    }

    /// Release a LOB. Destroying an absent LOB is a no-op.
    pub fn destroy(&mut self, backend: &dyn Backend, locator: &LobLocator) -> Result<()> {
        self.check_identity(locator)?;
        let Some(slot) = self
            .slots
            .get_mut(locator.index.slot() as usize)
            .filter(|slot| slot.generation == locator.index.generation())
        else {
            return Ok(());
        };
        let Some(entry) = slot.entry.take() else {
            return Ok(());
        };

        let released = backend.release_lob(&entry);
        let slot_index = locator.index.slot();
        self.retire(slot_index);
        tracing::trace!(connection = %self.identity, index = %locator.index, "Destroyed LOB");
        released
    }

    /// Drop every LOB, as on connection teardown. Indices stay fresh.
    pub fn reset(&mut self) {
        for slot in 0..self.slots.len() {
            if self.slots[slot].entry.take().is_some() {
                self.retire(slot as u32);
            }
        }
    }

    fn retire(&mut self, slot_index: u32) {
        let slot = &mut self.slots[slot_index as usize];
        self.live -= 1;
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free.push(slot_index);
        }
    }
}

fn materialize_entry(backend: &dyn Backend, entry: &mut LobEntry) -> Result<()> {
    if !entry.loaded {
        backend.retrieve_lob(entry)?;
        if entry.value.is_none() {
            entry.value = Some(entry.resource_bytes());
        }
        entry.loaded = true;
    }
    Ok(())
}

fn stale(locator: &LobLocator) -> Error {
    Error::invalid("lob", format!("LOB reference {locator} is not valid"))
}

fn write_failed(source: Option<io::Error>) -> Error {
    Error::fatal("write_lob_to_file", "could not write to the output file", source)
}

/// Copy `reader` into `writer` in chunks of `chunk_len` bytes until the
/// reader is exhausted. Returns the number of bytes copied.
fn copy_chunks(
    reader: &mut impl Read,
    writer: &mut impl Write,
    chunk_len: usize,
) -> io::Result<usize> {
    let mut buffer = vec![0u8; chunk_len.max(1)];
    let mut written = 0usize;
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            return Ok(written);
        }
        writer.write_all(&buffer[..read])?;
        written += read;
    }
}

/// An output file that is removed again on drop unless [`PartialFile::keep`]
/// succeeded, so a failed copy leaves nothing behind.
struct PartialFile<'a> {
    path: &'a Path,
    file: File,
    kept: bool,
}

impl<'a> PartialFile<'a> {
    fn create(path: &'a Path) -> io::Result<Self> {
        Ok(Self {
            path,
            file: File::create(path)?,
            kept: false,
        })
    }

    fn file(&mut self) -> &mut File {
        &mut self.file
    }

    fn keep(mut self) -> io::Result<()> {
        self.file.flush()?;
        self.kept = true;
        Ok(())
    }
}

impl Drop for PartialFile<'_> {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        if let Err(err) = std::fs::remove_file(self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "Could not remove partial LOB file"
            );
        }
    }
}

/// `io::Read` adapter over a materialized LOB.
///
/// Reads advance the LOB position; a read that returns no data marks the
/// end of the LOB.
#[derive(Debug)]
pub struct LobStream<'a> {
    entry: &'a mut LobEntry,
}

impl LobStream<'_> {
    pub fn position(&self) -> usize {
        self.entry.position
    }

    pub fn at_end(&self) -> bool {
        self.entry.end_of_lob
    }
}

impl Read for LobStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let chunk = self.entry.slice(buf.len());
        let read = chunk.len();
        buf[..read].copy_from_slice(chunk);
        if read == 0 {
            self.entry.end_of_lob = true;
        }
        self.entry.position += read;
        Ok(read)
    }
}
