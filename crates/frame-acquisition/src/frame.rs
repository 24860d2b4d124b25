//! Radar frame geometry and planar frame buffers

use crate::AcquisitionError;
use serde::{Deserialize, Serialize};

/// Shape of one radar frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameGeometry {
    /// ADC samples per chirp
    pub samples_per_chirp: usize,
    /// Chirps per frame
    pub chirps_per_frame: usize,
    /// Receive antennas (interleaved channels in the FIFO)
    pub rx_antennas: usize,
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            samples_per_chirp: 64,
            chirps_per_frame: 32,
            rx_antennas: 3,
        }
    }
}

impl FrameGeometry {
    /// Samples belonging to one antenna
    pub fn samples_per_channel(&self) -> usize {
        self.samples_per_chirp * self.chirps_per_frame
    }

    /// Total samples per frame across all antennas
    pub fn frame_len(&self) -> usize {
        self.samples_per_channel() * self.rx_antennas
    }

    /// Reject geometries that cannot hold a frame
    pub fn validate(&self) -> Result<(), AcquisitionError> {
        if self.frame_len() == 0 {
            return Err(AcquisitionError::Geometry(format!("{:?} holds no samples", self)));
        }
        Ok(())
    }
}

/// Reshape a channel-interleaved raw frame into planar layout.
///
/// Raw sample `i` belongs to channel `i % channels` and lands at
/// `planar[channel * (len / channels) + i / channels]`.
pub fn deinterleave(raw: &[u16], channels: usize, planar: &mut [f32]) -> Result<(), AcquisitionError> {
    if channels == 0 || raw.len() % channels != 0 || raw.len() != planar.len() {
        return Err(AcquisitionError::Layout {
            expected: planar.len(),
            actual: raw.len(),
        });
    }

    let per_channel = raw.len() / channels;
    for (index, slot) in raw.chunks_exact(channels).enumerate() {
        for (antenna, &sample) in slot.iter().enumerate() {
            planar[antenna * per_channel + index] = f32::from(sample);
        }
    }
    Ok(())
}

/// Pre-allocated planar frame, reused every cycle
#[derive(Debug, Clone)]
pub struct PlanarFrame {
    /// One contiguous run of samples per channel
    data: Box<[f32]>,
    /// Number of channels
    channels: usize,
    /// Acquisition sequence number
    sequence: u64,
}

impl PlanarFrame {
    /// Allocate a zeroed frame for the given geometry
    pub fn new(geometry: &FrameGeometry) -> Self {
        Self {
            data: vec![0.0; geometry.frame_len()].into_boxed_slice(),
            channels: geometry.rx_antennas,
            sequence: 0,
        }
    }

    /// Overwrite this frame from a raw interleaved buffer
    pub fn fill_from_interleaved(&mut self, raw: &[u16], sequence: u64) -> Result<(), AcquisitionError> {
        deinterleave(raw, self.channels, &mut self.data)?;
        self.sequence = sequence;
        Ok(())
    }

    /// All samples, channel after channel
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Samples of one channel
    pub fn channel(&self, channel: usize) -> Option<&[f32]> {
        if channel >= self.channels {
            return None;
        }
        let per_channel = self.samples_per_channel();
        Some(&self.data[channel * per_channel..(channel + 1) * per_channel])
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn samples_per_channel(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.data.len() / self.channels
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
