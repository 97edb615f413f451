use bytes::Bytes;
use flume::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One camera capture.
///
/// A frame holds a slot of the capture subsystem's buffer pool until it is
/// released, either explicitly with [`Frame::release`] or by being dropped.
/// Frames are not `Clone`, so a slot is returned exactly once.
pub struct Frame {
    /// Planar pixel data, laid out according to `meta.format`
    pub data: Bytes,

    /// Frame metadata
    pub meta: Arc<FrameMetadata>,

    /// Capture timestamp
    pub timestamp: Instant,

    slot: Option<FrameSlot>,
}

/// Frame metadata
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    /// Luma row stride in bytes
    pub stride: u32,
    pub format: PixelFormat,
    pub device_timestamp: Option<Duration>, // Hardware timestamp if available
}

/// Chroma-subsampled 4:2:0 formats we accept from capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Y plane, then U plane, then V plane (YU12)
    I420,
    /// Y plane, then interleaved UV
    Nv12,
    /// Y plane, then interleaved VU
    Nv21,
}

impl PixelFormat {
    /// Bytes required for a tightly packed frame of this format.
    pub fn frame_len(self, width: u32, height: u32) -> usize {
        self.strided_len(width, height, width)
    }

    /// Bytes required when luma rows are `stride` bytes apart. Chroma rows use
    /// half that stride, two planes (I420) or one interleaved plane (NV12/NV21).
    pub fn strided_len(self, width: u32, height: u32, stride: u32) -> usize {
        let stride = stride.max(width);
        let luma = stride as usize * height as usize;
        luma + 2 * chroma_width(stride) * chroma_height(height)
    }
}

pub(crate) fn chroma_width(width: u32) -> usize {
    (width as usize + 1) / 2
}

pub(crate) fn chroma_height(height: u32) -> usize {
    (height as usize + 1) / 2
}

impl Frame {
    pub fn new(data: Bytes, meta: FrameMetadata, timestamp: Instant) -> Self {
        Self {
            data,
            meta: Arc::new(meta),
            timestamp,
            slot: None,
        }
    }

    /// Bind the frame to a pool slot; the slot returns when the frame is released.
    pub fn with_slot(mut self, slot: FrameSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn width(&self) -> u32 {
        self.meta.width
    }

    pub fn height(&self) -> u32 {
        self.meta.height
    }

    /// Signal "done" to the capture subsystem.
    pub fn release(self) {
        drop(self);
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.meta.sequence)
            .field("size", &(self.meta.width, self.meta.height))
            .field("format", &self.meta.format)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Fixed set of buffer slots shared between a frame source and its consumers.
#[derive(Clone)]
pub struct FramePool {
    free_tx: Sender<u32>,
    free_rx: Receiver<u32>,
    capacity: usize,
}

/// A held pool slot. Dropping it puts the slot back.
pub struct FrameSlot {
    index: u32,
    home: Sender<u32>,
}

impl FramePool {
    pub fn new(capacity: usize) -> Self {
        let (free_tx, free_rx) = flume::bounded(capacity);
        for index in 0..capacity as u32 {
            // Channel sized to capacity, cannot fail
            let _ = free_tx.send(index);
        }

        Self {
            free_tx,
            free_rx,
            capacity,
        }
    }

    /// Take a free slot, or `None` when every slot is still held downstream.
    pub fn try_acquire(&self) -> Option<FrameSlot> {
        self.free_rx.try_recv().ok().map(|index| FrameSlot {
            index,
            home: self.free_tx.clone(),
        })
    }

    pub fn available(&self) -> usize {
        self.free_rx.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for FrameSlot {
    fn drop(&mut self) {
        let _ = self.home.send(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(width: u32, height: u32) -> FrameMetadata {
        FrameMetadata {
            sequence: 1,
            width,
            height,
            stride: width,
            format: PixelFormat::I420,
            device_timestamp: None,
        }
    }

    #[test]
    fn frame_len_rounds_chroma_up() {
        assert_eq!(PixelFormat::I420.frame_len(4, 4), 16 + 2 * 4);
        assert_eq!(PixelFormat::Nv21.frame_len(3, 3), 9 + 2 * 4);
    }

    #[test]
    fn strided_len_counts_row_padding() {
        assert_eq!(PixelFormat::I420.strided_len(4, 4, 4), PixelFormat::I420.frame_len(4, 4));
        assert_eq!(PixelFormat::Nv12.strided_len(6, 2, 8), 16 + 8);
        // A stride narrower than the image is treated as packed
        assert_eq!(PixelFormat::I420.strided_len(4, 4, 0), 24);
    }

    #[test]
    fn release_returns_slot() {
        let pool = FramePool::new(2);
        let slot = pool.try_acquire().unwrap();
        assert_eq!(pool.available(), 1);

        let frame = Frame::new(Bytes::from(vec![0u8; 24]), meta(4, 4), Instant::now())
            .with_slot(slot);
        frame.release();
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn dropping_frame_also_releases() {
        let pool = FramePool::new(1);
        {
            let _frame = Frame::new(Bytes::new(), meta(0, 0), Instant::now())
                .with_slot(pool.try_acquire().unwrap());
            assert!(pool.try_acquire().is_none());
        }
        assert_eq!(pool.available(), 1);
    }
}
