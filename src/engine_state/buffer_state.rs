//! # Buffer State Module
//!
//! This module defines the boundary between mesh generation and the graphics API.
//! Finished geometry leaves the engine as [`BufferWriteCommand`]s handed to a
//! [`MeshSink`]; the sink owns the actual buffer objects and returns opaque
//! [`GpuBufferHandle`]s the renderer later draws with.
//!
//! ## Key Components
//!
//! * `MeshSink`: the trait a graphics backend implements to receive uploads
//! * `BufferWriteCommand`: one upload, created fresh or written over an existing buffer
//! * `BufferState`: an in-memory sink that mirrors every buffer and keeps usage
//!   analytics, used by the headless driver and by tests
//!
//! ## Threading
//!
//! Sinks are only ever called from the main thread, strictly after the mesh build
//! that produced the data has been drained from the result queue.

use std::collections::HashMap;
use std::fmt::Debug;

use bytemuck::NoUninit;
use log::trace;

/// Opaque handle of a buffer owned by a [`MeshSink`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuBufferHandle(pub u64);

/// What a buffer holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex positions
    Vertex,
    /// Triangle indices
    Index,
    /// Per-vertex occlusion values
    Occlusion,
}

/// Anything that can be viewed as raw bytes for an upload.
pub trait AsBytes {
    /// The bytes to upload.
    fn as_bytes(&self) -> &[u8];
}

impl<T> AsBytes for Vec<T>
where
    T: NoUninit,
{
    fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self)
    }
}

impl<T> AsBytes for [T]
where
    T: NoUninit,
{
    fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self)
    }
}

impl<T, const N: usize> AsBytes for [T; N]
where
    T: NoUninit,
{
    fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self)
    }
}

/// A single upload request.
pub struct BufferWriteCommand<'a> {
    /// Debug label of the buffer
    pub label: &'static str,
    /// What the buffer holds
    pub usage: BufferUsage,
    /// Buffer to overwrite, or `None` to create a new one
    pub target: Option<GpuBufferHandle>,
    /// Contents of the buffer
    pub data: &'a dyn AsBytes,
}

impl Debug for BufferWriteCommand<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferWriteCommand")
            .field("label", &self.label)
            .field("usage", &self.usage)
            .field("target", &self.target)
            .field("bytes", &self.data.as_bytes().len())
            .finish()
    }
}

/// Receives finished geometry on the main thread.
pub trait MeshSink {
    /// Uploads `command.data`, reusing `command.target` when it names a live buffer.
    ///
    /// # Returns
    /// The handle of the buffer now holding the data.
    fn write(&mut self, command: BufferWriteCommand<'_>) -> GpuBufferHandle;
}

/// Analytics data for a buffer
///
/// Tracks memory allocation, usage, and write operations for a buffer
/// to help identify optimization opportunities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferAnalytics {
    /// Total memory allocated for the buffer in bytes
    pub allocated_memory: u64,
    /// Memory holding live data in bytes (size of the last write)
    pub used_memory: u64,
    /// Number of times the buffer has been written to
    pub times_written: u64,
}

#[derive(Debug)]
struct StoredBuffer {
    label: &'static str,
    usage: BufferUsage,
    contents: Vec<u8>,
}

/// In-memory [`MeshSink`].
///
/// Every buffer is kept as a byte vector so callers can inspect exactly what a
/// graphics backend would have received. A write larger than the buffer's current
/// allocation grows it, the way a backend would recreate the buffer.
#[derive(Debug, Default)]
pub struct BufferState {
    buffers: HashMap<GpuBufferHandle, StoredBuffer>,
    buffer_analytics: HashMap<GpuBufferHandle, BufferAnalytics>,
    next_handle: u64,
}

impl BufferState {
    /// Creates an empty buffer registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw contents of a buffer.
    pub fn get_buffer(&self, handle: GpuBufferHandle) -> Option<&[u8]> {
        self.buffers.get(&handle).map(|b| b.contents.as_slice())
    }

    /// Contents of a buffer reinterpreted as `T`.
    ///
    /// Returns `None` for unknown handles or contents that are not a whole number of `T`.
    pub fn read_as<T: bytemuck::Pod>(&self, handle: GpuBufferHandle) -> Option<Vec<T>> {
        let bytes = self.get_buffer(handle)?;
        let size = std::mem::size_of::<T>();
        if size == 0 || bytes.len() % size != 0 {
            return None;
        }
        Some(bytes.chunks_exact(size).map(bytemuck::pod_read_unaligned).collect())
    }

    /// Usage of a buffer.
    pub fn buffer_usage(&self, handle: GpuBufferHandle) -> Option<BufferUsage> {
        self.buffers.get(&handle).map(|b| b.usage)
    }

    /// Label of a buffer.
    pub fn buffer_label(&self, handle: GpuBufferHandle) -> Option<&'static str> {
        self.buffers.get(&handle).map(|b| b.label)
    }

    /// Analytics of a buffer.
    pub fn analytics(&self, handle: GpuBufferHandle) -> Option<BufferAnalytics> {
        self.buffer_analytics.get(&handle).copied()
    }

    /// Number of live buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// `true` if no buffer has been created.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Sum of allocated bytes over all buffers.
    pub fn get_total_allocated_memory(&self) -> u64 {
        self.buffer_analytics
            .values()
            .fold(0, |acc, analytics| acc + analytics.allocated_memory)
    }

    /// Sum of live bytes over all buffers.
    pub fn get_total_used_memory(&self) -> u64 {
        self.buffer_analytics
            .values()
            .fold(0, |acc, analytics| acc + analytics.used_memory)
    }

    /// Total number of writes over all buffers.
    pub fn get_total_writes(&self) -> u64 {
        self.buffer_analytics
            .values()
            .fold(0, |acc, analytics| acc + analytics.times_written)
    }

    fn create_buffer_init(
        &mut self,
        label: &'static str,
        usage: BufferUsage,
        data: &[u8],
    ) -> GpuBufferHandle {
        let handle = GpuBufferHandle(self.next_handle);
        self.next_handle += 1;

        self.buffers.insert(
            handle,
            StoredBuffer {
                label,
                usage,
                contents: data.to_vec(),
            },
        );
        self.buffer_analytics.insert(
            handle,
            BufferAnalytics {
                allocated_memory: data.len() as u64,
                used_memory: data.len() as u64,
                times_written: 1,
            },
        );
        trace!("Created buffer {:?} '{}' ({} bytes)", handle, label, data.len());
        handle
    }
}

impl MeshSink for BufferState {
    fn write(&mut self, command: BufferWriteCommand<'_>) -> GpuBufferHandle {
        let data = command.data.as_bytes();
        let Some(handle) = command.target.filter(|h| self.buffers.contains_key(h)) else {
            return self.create_buffer_init(command.label, command.usage, data);
        };

        if let Some(buffer) = self.buffers.get_mut(&handle) {
            buffer.contents.clear();
            buffer.contents.extend_from_slice(data);
            buffer.usage = command.usage;
        }
        let analytics = self.buffer_analytics.entry(handle).or_default();
        analytics.allocated_memory = analytics.allocated_memory.max(data.len() as u64);
        analytics.used_memory = data.len() as u64;
        analytics.times_written += 1;
        trace!("Wrote buffer {:?} '{}' ({} bytes)", handle, command.label, data.len());
        handle
    }
}
