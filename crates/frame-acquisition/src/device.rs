//! Simulated radar device for host runs
//!
//! `SimulatedRadar` stands in for the sensor FIFO: quiet frames with a small
//! amount of noise, and periodic bursts where one antenna is pushed up or
//! down. `RadarClock` plays the data-ready interrupt line at the frame rate.

use crate::interrupt::DataReadyInterrupt;
use crate::frame::FrameGeometry;
use crate::AcquisitionError;
use radar_buffer::{FifoSource, SourceError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Mid-scale of the 12-bit ADC
pub const ADC_MIDSCALE: u16 = 2048;

/// Simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Frames between the start of two bursts
    pub burst_every: u32,
    /// Frames per burst
    pub burst_frames: u32,
    /// Peak offset added to the active antenna
    pub amplitude: u16,
    /// Peak-to-peak noise
    pub noise: u16,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            burst_every: 90, // ~2.7 s at 33 Hz
            burst_frames: 14,
            amplitude: 600,
            noise: 24,
        }
    }
}

/// Synthetic interleaved radar FIFO
pub struct SimulatedRadar {
    geometry: FrameGeometry,
    config: SimulationConfig,
    frame: u32,
    burst: u32,
    rng: u32,
}

impl SimulatedRadar {
    pub fn new(geometry: FrameGeometry, config: SimulationConfig) -> Self {
        Self {
            geometry,
            config,
            frame: 0,
            burst: 0,
            rng: 0x1234_5678,
        }
    }

    fn next_noise(&mut self) -> i32 {
        // xorshift32
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 17;
        self.rng ^= self.rng << 5;
        let span = i32::from(self.config.noise.max(1));
        (self.rng % span as u32) as i32 - span / 2
    }

    /// Offset applied to `antenna` in the current frame
    fn burst_offset(&self, antenna: usize) -> i32 {
        let cfg = &self.config;
        if cfg.burst_every == 0 || cfg.burst_frames == 0 {
            return 0;
        }
        let phase = self.frame % cfg.burst_every;
        if phase >= cfg.burst_frames {
            return 0;
        }

        // Bursts rotate over antennas, alternating polarity
        let channels = self.geometry.rx_antennas.max(1) as u32;
        let active = (self.burst % channels) as usize;
        if antenna != active {
            return 0;
        }
        let sign = if (self.burst / channels) % 2 == 0 { 1 } else { -1 };

        // Triangle envelope over the burst
        let half = cfg.burst_frames as i32 / 2;
        let rise = half - (phase as i32 - half).abs();
        let peak = i32::from(cfg.amplitude);
        sign * peak * (rise + 1) / (half + 1)
    }
}

impl FifoSource for SimulatedRadar {
    fn read_fifo(&mut self, dst: &mut [u16]) -> Result<usize, SourceError> {
        let channels = self.geometry.rx_antennas;
        let frame_len = self.geometry.frame_len();
        if dst.len() < frame_len || channels == 0 {
            return Err(SourceError::FifoOverflow);
        }

        for slot in dst[..frame_len].chunks_exact_mut(channels) {
            for (antenna, sample) in slot.iter_mut().enumerate() {
                let value = i32::from(ADC_MIDSCALE) + self.burst_offset(antenna) + self.next_noise();
                *sample = value.clamp(0, 4095) as u16;
            }
        }

        self.frame = self.frame.wrapping_add(1);
        if self.config.burst_every > 0 && self.frame % self.config.burst_every == 0 {
            self.burst = self.burst.wrapping_add(1);
        }
        Ok(frame_len)
    }
}

/// Periodic data-ready line driving a [`DataReadyInterrupt`]
pub struct RadarClock {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RadarClock {
    /// Start firing `interrupt` every `period`
    pub fn spawn(interrupt: DataReadyInterrupt, period: Duration) -> Result<Self, AcquisitionError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        info!("Starting radar frame clock: period={:?}", period);
        let handle = thread::Builder::new()
            .name("radar-irq".into())
            .spawn(move || {
                let mut next = Instant::now() + period;
                while !shutdown_clone.load(Ordering::SeqCst) {
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    }
                    next += period;
                    interrupt.fire();
                }
                debug!("Radar frame clock stopped");
            })?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Stop the clock and wait for the thread
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RadarClock {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_buffer::RadarDataManager;

    fn geometry() -> FrameGeometry {
        FrameGeometry {
            samples_per_chirp: 4,
            chirps_per_frame: 2,
            rx_antennas: 3,
        }
    }

    fn channel_mean(raw: &[u16], channels: usize, antenna: usize) -> f32 {
        let values: Vec<f32> = raw.iter().skip(antenna).step_by(channels).map(|&v| f32::from(v)).collect();
        values.iter().sum::<f32>() / values.len() as f32
    }

    #[test]
    fn test_quiet_frame_near_midscale() {
        let config = SimulationConfig { burst_every: 100, burst_frames: 10, ..Default::default() };
        let mut radar = SimulatedRadar::new(geometry(), config);
        let mut raw = vec![0u16; geometry().frame_len()];

        // Skip past the first burst
        for _ in 0..20 {
            radar.read_fifo(&mut raw).unwrap();
        }
        for antenna in 0..3 {
            let mean = channel_mean(&raw, 3, antenna);
            assert!((mean - f32::from(ADC_MIDSCALE)).abs() < 20.0);
        }
    }

    #[test]
    fn test_burst_raises_one_antenna() {
        let config = SimulationConfig { burst_every: 100, burst_frames: 10, ..Default::default() };
        let mut radar = SimulatedRadar::new(geometry(), config);
        let mut raw = vec![0u16; geometry().frame_len()];

        // Middle of the first burst: antenna 0, positive polarity
        for _ in 0..6 {
            radar.read_fifo(&mut raw).unwrap();
        }
        assert!(channel_mean(&raw, 3, 0) > f32::from(ADC_MIDSCALE) + 300.0);
        assert!((channel_mean(&raw, 3, 1) - f32::from(ADC_MIDSCALE)).abs() < 20.0);
    }

    #[test]
    fn test_short_destination_rejected() {
        let mut radar = SimulatedRadar::new(geometry(), SimulationConfig::default());
        let mut raw = vec![0u16; 3];
        assert_eq!(radar.read_fifo(&mut raw), Err(SourceError::FifoOverflow));
    }

    #[test]
    fn test_clock_feeds_buffer() {
        let radar = SimulatedRadar::new(geometry(), SimulationConfig::default());
        let manager = Arc::new(RadarDataManager::new(Box::new(radar), geometry().frame_len(), 4).unwrap());
        let clock = RadarClock::spawn(DataReadyInterrupt::new(manager.clone()), Duration::from_millis(2)).unwrap();

        thread::sleep(Duration::from_millis(50));
        clock.stop();
        assert!(manager.stats().frames_fed > 0);
    }
}
