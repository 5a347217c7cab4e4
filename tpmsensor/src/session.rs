//! Per-device monitoring-session state: dedup of redundant radio callbacks,
//! rolling transmission-rate estimation and a change-triggered history log.
//!
//! All state is owned by a [`SessionTracker`] constructed at session start
//! and cleared wholesale on reset; nothing lives in globals. Timestamps are
//! passed in by the caller so the tracker never reads the clock itself.

use crate::reading::TpmsReading;
use bluez_async::MacAddress;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Window over which the transmission rate is estimated.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// A history gap at least this long is assumed to be a sensor sleep cycle.
const SLEEP_GAP: Duration = Duration::from_secs(60);

/// A history gap at least this long (but shorter than [`SLEEP_GAP`]) is a
/// minor pause.
const PAUSE_GAP: Duration = Duration::from_secs(10);

/// Tuning knobs for the tracker.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Minimum spacing between accepted readings for one device. The radio
    /// layer may deliver the same broadcast several times in rapid
    /// succession; anything inside this interval is discarded.
    pub dedup_interval: Duration,
    /// Maximum number of distinct historical readings kept per device.
    pub history_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dedup_interval: Duration::from_secs(1),
            history_capacity: 50,
        }
    }
}

/// One distinct reading kept in a device's history.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub hex_data: String,
    pub pressure_bar: f64,
    pub pressure_psi: f64,
    pub temperature: i16,
    pub timestamp: Instant,
}

/// Classification of the silence between two consecutive history entries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Gap {
    /// A minor pause, at least 10 seconds.
    Pause,
    /// A sleep or low-duty-cycle interval, at least 60 seconds.
    Sleep,
}

/// Labels the delta between two consecutive history timestamps. Purely a
/// function of the delta; no decoding involved.
pub fn classify_gap(delta: Duration) -> Option<Gap> {
    if delta >= SLEEP_GAP {
        Some(Gap::Sleep)
    } else if delta >= PAUSE_GAP {
        Some(Gap::Pause)
    } else {
        None
    }
}

/// Accumulated state for one tracked device.
#[derive(Clone, Debug)]
pub struct DeviceSession {
    last_reading: TpmsReading,
    first_seen: Instant,
    /// Updated on every callback for the device, including deduplicated
    /// ones, so displays can show radio liveness.
    last_seen: Instant,
    /// Timestamp of the last accepted reading, used for dedup.
    last_accepted: Instant,
    total_packets: u64,
    /// Timestamps of accepted readings within the trailing rate window.
    window: VecDeque<Instant>,
    history: VecDeque<HistoryEntry>,
}

impl DeviceSession {
    fn new(reading: TpmsReading, now: Instant, history_capacity: usize) -> Self {
        let mut session = Self {
            last_reading: reading.clone(),
            first_seen: now,
            last_seen: now,
            last_accepted: now,
            total_packets: 1,
            window: VecDeque::from([now]),
            history: VecDeque::new(),
        };
        session.push_history(&reading, now, history_capacity);
        session
    }

    fn accept(&mut self, reading: TpmsReading, now: Instant, history_capacity: usize) {
        self.last_seen = now;
        self.last_accepted = now;
        self.total_packets += 1;
        self.window.push_back(now);
        while let Some(&oldest) = self.window.front() {
            if now.duration_since(oldest) > RATE_WINDOW {
                self.window.pop_front();
            } else {
                break;
            }
        }
        self.push_history(&reading, now, history_capacity);
        self.last_reading = reading;
    }

    /// Appends a history entry only when the payload differs from the most
    /// recent stored one, evicting the oldest entry beyond capacity.
    fn push_history(&mut self, reading: &TpmsReading, now: Instant, history_capacity: usize) {
        if self
            .history
            .back()
            .is_some_and(|entry| entry.hex_data == reading.hex_data)
        {
            return;
        }
        self.history.push_back(HistoryEntry {
            hex_data: reading.hex_data.clone(),
            pressure_bar: reading.pressure_bar,
            pressure_psi: reading.pressure_psi,
            temperature: reading.temperature,
            timestamp: now,
        });
        while self.history.len() > history_capacity {
            self.history.pop_front();
        }
    }

    pub fn last_reading(&self) -> &TpmsReading {
        &self.last_reading
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// History entries paired with the gap classification of the silence
    /// since the previous entry (`None` for the first).
    pub fn annotated_history(&self) -> Vec<(&HistoryEntry, Option<Gap>)> {
        let mut annotated = Vec::with_capacity(self.history.len());
        let mut previous: Option<&HistoryEntry> = None;
        for entry in &self.history {
            let gap = previous
                .and_then(|prev| classify_gap(entry.timestamp.duration_since(prev.timestamp)));
            annotated.push((entry, gap));
            previous = Some(entry);
        }
        annotated
    }

    /// Transmissions per minute over the trailing window, or `None` below
    /// two observations.
    pub fn rate(&self, now: Instant) -> Option<f64> {
        if self.total_packets < 2 {
            return None;
        }
        let elapsed = now.duration_since(self.first_seen).min(RATE_WINDOW);
        if elapsed.is_zero() {
            return None;
        }
        let in_window = self
            .window
            .iter()
            .filter(|&&t| now.duration_since(t) <= RATE_WINDOW)
            .count();
        Some(in_window as f64 / (elapsed.as_secs_f64() / 60.0))
    }
}

/// Tracks all devices seen during one monitoring session.
#[derive(Clone, Debug, Default)]
pub struct SessionTracker {
    config: SessionConfig,
    devices: HashMap<MacAddress, DeviceSession>,
}

impl SessionTracker {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            devices: HashMap::new(),
        }
    }

    /// Records a decoded reading for a device at the given time.
    ///
    /// Returns false if the reading was discarded because it arrived within
    /// the dedup interval of the last accepted reading for that device.
    pub fn record(&mut self, mac_address: MacAddress, reading: TpmsReading, now: Instant) -> bool {
        match self.devices.entry(mac_address) {
            Entry::Occupied(mut entry) => {
                let session = entry.get_mut();
                if now.duration_since(session.last_accepted) < self.config.dedup_interval {
                    session.last_seen = now;
                    false
                } else {
                    session.accept(reading, now, self.config.history_capacity);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(DeviceSession::new(
                    reading,
                    now,
                    self.config.history_capacity,
                ));
                true
            }
        }
    }

    pub fn device(&self, mac_address: &MacAddress) -> Option<&DeviceSession> {
        self.devices.get(mac_address)
    }

    pub fn devices(&self) -> impl Iterator<Item = (&MacAddress, &DeviceSession)> {
        self.devices.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Clears all accumulated state, returning every device to unseen.
    pub fn reset(&mut self) {
        self.devices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::br;

    fn mac() -> MacAddress {
        "11:22:33:44:55:66".parse().unwrap()
    }

    /// A valid BR packet whose pressure byte is `seed`, with the checksum
    /// fixed up, so consecutive seeds give distinct payloads.
    fn reading(seed: u8) -> TpmsReading {
        let mut data = [0x28, 0x1d, 0x13, 0x01, seed, 0x00, 0x00];
        let sum: u16 = data[0..5].iter().map(|&b| u16::from(b)).sum();
        data[5..7].copy_from_slice(&sum.to_be_bytes());
        br::decode(&data).unwrap()
    }

    #[test]
    fn dedup_discards_rapid_callbacks() {
        let mut tracker = SessionTracker::new(SessionConfig::default());
        let t0 = Instant::now();

        assert!(tracker.record(mac(), reading(1), t0));
        // Within the 1 s dedup interval: discarded.
        assert!(!tracker.record(mac(), reading(2), t0 + Duration::from_millis(500)));
        let session = tracker.device(&mac()).unwrap();
        assert_eq!(session.total_packets(), 1);
        // But the liveness timestamp still moved.
        assert_eq!(session.last_seen(), t0 + Duration::from_millis(500));

        // After the interval elapses: recorded.
        assert!(tracker.record(mac(), reading(2), t0 + Duration::from_millis(1500)));
        assert_eq!(tracker.device(&mac()).unwrap().total_packets(), 2);
    }

    #[test]
    fn history_skips_consecutive_duplicates() {
        let mut tracker = SessionTracker::new(SessionConfig::default());
        let t0 = Instant::now();

        tracker.record(mac(), reading(1), t0);
        tracker.record(mac(), reading(1), t0 + Duration::from_secs(2));
        assert_eq!(tracker.device(&mac()).unwrap().history().count(), 1);

        tracker.record(mac(), reading(2), t0 + Duration::from_secs(4));
        assert_eq!(tracker.device(&mac()).unwrap().history().count(), 2);

        // A repeat of an older (non-consecutive) payload is a real change.
        tracker.record(mac(), reading(1), t0 + Duration::from_secs(6));
        assert_eq!(tracker.device(&mac()).unwrap().history().count(), 3);
    }

    #[test]
    fn history_is_bounded() {
        let capacity = 50;
        let mut tracker = SessionTracker::new(SessionConfig::default());
        let t0 = Instant::now();

        for i in 0..capacity + 5 {
            tracker.record(
                mac(),
                reading(i as u8),
                t0 + Duration::from_secs(2 * i as u64),
            );
        }
        let session = tracker.device(&mac()).unwrap();
        assert_eq!(session.total_packets(), (capacity + 5) as u64);
        assert_eq!(session.history().count(), capacity);

        // The oldest entries were evicted; what remains is the most recent
        // `capacity` payloads in time order.
        let timestamps: Vec<_> = session.history().map(|entry| entry.timestamp).collect();
        assert!(timestamps.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(
            session.history().next().unwrap().hex_data,
            reading(5).hex_data
        );
        assert_eq!(
            session.history().last().unwrap().hex_data,
            reading((capacity + 4) as u8).hex_data
        );
    }

    #[test]
    fn rate_needs_two_observations() {
        let mut tracker = SessionTracker::new(SessionConfig::default());
        let t0 = Instant::now();

        tracker.record(mac(), reading(1), t0);
        assert_eq!(tracker.device(&mac()).unwrap().rate(t0), None);

        tracker.record(mac(), reading(2), t0 + Duration::from_secs(30));
        let rate = tracker
            .device(&mac())
            .unwrap()
            .rate(t0 + Duration::from_secs(30))
            .unwrap();
        // 2 packets in 30 seconds = 4 per minute.
        assert_eq!(rate, 4.0);
    }

    #[test]
    fn rate_window_prunes_old_timestamps() {
        let mut tracker = SessionTracker::new(SessionConfig::default());
        let t0 = Instant::now();

        for i in 0..5 {
            tracker.record(mac(), reading(i), t0 + Duration::from_secs(30 * u64::from(i)));
        }
        // At t0+120 only the packets at t0+60, t0+90 and t0+120 are inside
        // the trailing 60 s window; elapsed is capped at the window length.
        let rate = tracker
            .device(&mac())
            .unwrap()
            .rate(t0 + Duration::from_secs(120))
            .unwrap();
        assert_eq!(rate, 3.0);
    }

    #[test]
    fn gap_classification() {
        assert_eq!(classify_gap(Duration::from_secs(5)), None);
        assert_eq!(classify_gap(Duration::from_secs(65)), Some(Gap::Sleep));
        assert_eq!(classify_gap(Duration::from_secs(12)), Some(Gap::Pause));
        // Threshold boundaries.
        assert_eq!(classify_gap(Duration::from_secs(10)), Some(Gap::Pause));
        assert_eq!(classify_gap(Duration::from_secs(60)), Some(Gap::Sleep));
    }

    #[test]
    fn annotated_history_labels_gaps() {
        let mut tracker = SessionTracker::new(SessionConfig::default());
        let t0 = Instant::now();

        // Deltas between entries: 5 s, 65 s, 12 s.
        let mut t = t0;
        for (i, delta) in [0, 5, 65, 12].into_iter().enumerate() {
            t += Duration::from_secs(delta);
            tracker.record(mac(), reading(i as u8), t);
        }

        let session = tracker.device(&mac()).unwrap();
        let gaps: Vec<_> = session
            .annotated_history()
            .into_iter()
            .map(|(_, gap)| gap)
            .collect();
        assert_eq!(gaps, vec![None, None, Some(Gap::Sleep), Some(Gap::Pause)]);
    }

    #[test]
    fn reset_clears_all_devices() {
        let mut tracker = SessionTracker::new(SessionConfig::default());
        let t0 = Instant::now();

        tracker.record(mac(), reading(1), t0);
        let other: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        tracker.record(other.clone(), reading(2), t0);
        assert_eq!(tracker.devices().count(), 2);

        tracker.reset();
        assert!(tracker.is_empty());
        assert!(tracker.device(&mac()).is_none());

        // After a reset the first callback for a device is accepted again.
        assert!(tracker.record(mac(), reading(1), t0 + Duration::from_millis(1)));
    }
}
