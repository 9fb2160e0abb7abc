//! Per-handle cached reader over one sensor/kind pair.
//!
//! A session keeps the last formatted line together with the update
//! counter it was formatted from and a stream cursor into it. Reads that
//! start at cursor 0 (a line boundary) first make sure the line is fresh,
//! sleeping on the sensor's notifier if nothing newer has been committed.
//! Reads that start mid-line keep draining the cached text untouched, so
//! a line split across several short reads is always self-consistent.
//! Once the line is fully drained the cursor rewinds to 0, which turns the
//! handle into an endless live feed of the sensor.

use super::address::DeviceAddress;
use crate::calibration::{FormattedLine, Formatter};
use crate::error::{Result, SensorError};
use crate::sensors::{MeasurementKind, SensorId, SensorRecord};
use crate::sync::{Interrupt, SessionLock};
use log::{debug, info};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Whether a read at a line boundary may sleep for fresh data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReadMode {
    #[default]
    Blocking,
    /// Fail with [`SensorError::WouldBlock`] instead of sleeping.
    NonBlocking,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Freshness {
    Fresh,
    Stale,
}

/// State guarded by the session lock.
#[derive(Default)]
struct SessionCache {
    text: FormattedLine,
    timestamp: u64,
    cursor: usize,
}

/// Decrements the registry's open-session count when the session goes away.
pub(super) struct OpenTicket(Arc<AtomicUsize>);

impl OpenTicket {
    pub(super) fn issue(open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self(open.clone())
    }
}

impl Drop for OpenTicket {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One open handle on a sensor/kind pair.
///
/// All operations on the session are serialized by its session lock. The
/// sensor arena is shared, so closing a session never affects the sensor
/// or other sessions bound to it.
pub struct ReaderSession {
    address: DeviceAddress,
    sensors: Arc<[SensorRecord]>,
    sensor: SensorId,
    kind: MeasurementKind,
    formatter: Formatter,
    cache: SessionLock<SessionCache>,
    _ticket: OpenTicket,
}

impl ReaderSession {
    /// `sensor` must index into `sensors`; the registry checks this.
    pub(super) fn new(
        address: DeviceAddress,
        sensors: Arc<[SensorRecord]>,
        sensor: SensorId,
        kind: MeasurementKind,
        formatter: Formatter,
        ticket: OpenTicket,
    ) -> Self {
        Self {
            address,
            sensors,
            sensor,
            kind,
            formatter,
            cache: SessionLock::new(SessionCache::default()),
            _ticket: ticket,
        }
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn sensor_id(&self) -> SensorId {
        self.sensor
    }

    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    /// Offset of the next byte to hand out; 0 at a line boundary.
    pub fn cursor(&self) -> usize {
        self.cache.inspect(|cache| cache.cursor)
    }

    /// Update counter of the sample the cached line was formatted from.
    pub fn cached_timestamp(&self) -> u64 {
        self.cache.inspect(|cache| cache.timestamp)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.inspect(|cache| cache.text.len())
    }

    fn record(&self) -> &SensorRecord {
        &self.sensors[self.sensor as usize]
    }

    /// Reformat the cached line if the sensor has a newer sample.
    /// Caller holds the session lock.
    fn refresh(&self, cache: &mut SessionCache) -> Freshness {
        let snapshot = self.record().snapshot(self.kind);
        if snapshot.timestamp == cache.timestamp {
            return Freshness::Stale;
        }

        cache.text = self.formatter.format(self.kind, snapshot.raw);
        cache.timestamp = snapshot.timestamp;
        debug!(
            "{}: refreshed to update {} ({:?})",
            self.address,
            snapshot.timestamp,
            cache.text.as_str()
        );
        Freshness::Fresh
    }

    /// Read up to `buf.len()` bytes of the current line into `buf`.
    ///
    /// See [`ReaderSession::read_to`].
    pub fn read(&self, buf: &mut [u8], mode: ReadMode, interrupt: &Interrupt) -> Result<usize> {
        let requested = buf.len();
        let mut out = buf;
        self.read_to(&mut out, requested, mode, interrupt)
    }

    /// Copy up to `requested` bytes of the current line into `out`.
    ///
    /// At a line boundary the cached line is first refreshed; if the sensor
    /// has nothing newer, the call fails with [`SensorError::WouldBlock`]
    /// in non-blocking mode or sleeps until the next commit otherwise. The
    /// session lock is released for the duration of the sleep. Raising
    /// `interrupt` aborts the call with [`SensorError::Interrupted`]; it can
    /// be retried unchanged once the interrupt is reset.
    ///
    /// A failing `out` yields [`SensorError::Fault`]. The cursor still moves
    /// past whatever `out` accepted before failing, so a retry resumes with
    /// the first byte not yet delivered. Returns the number of bytes copied,
    /// which is 0 only if `requested` is 0.
    pub fn read_to<W>(
        &self,
        out: &mut W,
        requested: usize,
        mode: ReadMode,
        interrupt: &Interrupt,
    ) -> Result<usize>
    where
        W: Write + ?Sized,
    {
        let mut cache = self.cache.acquire(interrupt)?;

        // Another caller may have started draining a fresh line while we
        // slept, so the boundary is re-tested after every reacquire.
        while cache.cursor == 0 && self.refresh(&mut cache) == Freshness::Stale {
            let seen = cache.timestamp;
            drop(cache);

            if mode == ReadMode::NonBlocking {
                return Err(SensorError::WouldBlock);
            }

            debug!("{}: waiting for update after {}", self.address, seen);
            let record = self.record();
            record
                .notifier()
                .wait_until(interrupt, || record.last_update(self.kind) != seen)?;

            cache = self.cache.acquire(interrupt)?;
        }

        let start = cache.cursor;
        let end = start + requested.min(cache.text.len() - start);
        let mut copied = start;
        let written = loop {
            if copied == end {
                break Ok(());
            }
            match out.write(&cache.text.as_bytes()[copied..end]) {
                Ok(0) => break Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => copied += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };

        cache.cursor = copied;
        if cache.cursor == cache.text.len() {
            cache.cursor = 0;
        }
        written.map_err(SensorError::Fault)?;
        Ok(copied - start)
    }

    /// Device control commands are not supported.
    pub fn control(&self, cmd: u32, _arg: u64) -> Result<i64> {
        debug!("{}: rejecting control command {:#x}", self.address, cmd);
        Err(SensorError::NotSupported("device control"))
    }

    /// Memory mapping is not supported.
    pub fn map(&self, _offset: u64, _len: usize) -> Result<()> {
        Err(SensorError::NotSupported("memory mapping"))
    }

    /// Release the session. Dropping it has the same effect.
    pub fn close(self) {
        info!("{}: session closed", self.address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrdev::SensorRegistry;
    use std::sync::atomic::AtomicU64;
    use std::thread;
    use std::time::Duration;

    /// Temperature raw 10 -> 21.537; every other raw r -> r * 1000.
    fn registry(sensors: u32) -> SensorRegistry {
        let calibration = |kind: MeasurementKind, raw: u16| match (kind, raw) {
            (MeasurementKind::Temperature, 10) => 21537,
            _ => i64::from(raw) * 1000,
        };
        SensorRegistry::setup(sensors, Arc::new(calibration)).unwrap()
    }

    fn counting_registry(calls: Arc<AtomicU64>) -> SensorRegistry {
        let calibration = move |_: MeasurementKind, raw: u16| {
            calls.fetch_add(1, Ordering::SeqCst);
            i64::from(raw) * 1000 + 537
        };
        SensorRegistry::setup(1, Arc::new(calibration)).unwrap()
    }

    fn temp0() -> DeviceAddress {
        DeviceAddress::new(0, MeasurementKind::Temperature).unwrap()
    }

    /// Accepts `budget` bytes in total, then fails. The first call is
    /// interrupted if `interrupt_first` is set.
    struct ShortWriter {
        taken: Vec<u8>,
        budget: usize,
        interrupt_first: bool,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if std::mem::take(&mut self.interrupt_first) {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"));
            }
            let n = buf.len().min(self.budget);
            self.taken.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Records what one reader got and, in lock order, what every reader got.
    struct SharedStream {
        mine: Vec<u8>,
        all: Arc<parking_lot::Mutex<Vec<u8>>>,
    }

    impl Write for SharedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.mine.extend_from_slice(buf);
            self.all.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_blocking_read_of_fresh_sample() {
        let registry = registry(1);
        let session = registry.open(temp0()).unwrap();
        registry.commit(0, MeasurementKind::Temperature, 10).unwrap();

        let mut buf = [0u8; 64];
        let n = session
            .read(&mut buf, ReadMode::Blocking, &Interrupt::new())
            .unwrap();

        assert_eq!(n, 7);
        assert_eq!(&buf[..n], b"21.537\n");
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.cached_timestamp(), 1);
    }

    #[test]
    fn test_non_blocking_without_data_would_block() {
        let registry = registry(1);
        let session = registry.open(temp0()).unwrap();
        let interrupt = Interrupt::new();
        let mut buf = [0u8; 16];

        let err = session
            .read(&mut buf, ReadMode::NonBlocking, &interrupt)
            .unwrap_err();
        assert!(matches!(err, SensorError::WouldBlock));

        // Data consumed, nothing newer: would-block again, never waiting
        registry.commit(0, MeasurementKind::Temperature, 3).unwrap();
        assert_eq!(
            session
                .read(&mut buf, ReadMode::NonBlocking, &interrupt)
                .unwrap(),
            6
        );
        assert!(matches!(
            session.read(&mut buf, ReadMode::NonBlocking, &interrupt),
            Err(SensorError::WouldBlock)
        ));

        let notifier = registry.sensor(0).unwrap().notifier();
        assert_eq!(notifier.wait_count(), 0);
    }

    #[test]
    fn test_chunked_drain_wraps_once() {
        let registry = registry(1);
        let session = registry.open(temp0()).unwrap();
        registry.commit(0, MeasurementKind::Temperature, 10).unwrap();
        let interrupt = Interrupt::new();

        let mut line = Vec::new();
        let mut cursors = Vec::new();
        for _ in 0..3 {
            let n = session
                .read_to(&mut line, 3, ReadMode::NonBlocking, &interrupt)
                .unwrap();
            assert!(n > 0);
            cursors.push(session.cursor());
        }

        // ceil(7 / 3) == 3 reads
        assert_eq!(line, b"21.537\n");
        assert_eq!(cursors, vec![3, 6, 0]);
    }

    #[test]
    fn test_mid_line_reads_do_not_refresh() {
        let calls = Arc::new(AtomicU64::new(0));
        let registry = counting_registry(calls.clone());
        let session = registry.open(temp0()).unwrap();
        let interrupt = Interrupt::new();

        registry.commit(0, MeasurementKind::Temperature, 21).unwrap();
        let mut line = Vec::new();
        session
            .read_to(&mut line, 2, ReadMode::Blocking, &interrupt)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A newer sample arrives mid-line; the rest of the old line is served
        registry.commit(0, MeasurementKind::Temperature, 42).unwrap();
        for _ in 0..2 {
            session
                .read_to(&mut line, 2, ReadMode::Blocking, &interrupt)
                .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(session.cached_timestamp(), 1);
        }
        session
            .read_to(&mut line, 2, ReadMode::Blocking, &interrupt)
            .unwrap();
        assert_eq!(line, b"21.537\n");
        assert_eq!(session.cursor(), 0);

        // Next boundary picks up the newer sample
        let mut next = Vec::new();
        session
            .read_to(&mut next, 64, ReadMode::Blocking, &interrupt)
            .unwrap();
        assert_eq!(next, b"42.537\n");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.cached_timestamp(), 2);
    }

    #[test]
    fn test_blocked_reader_wakes_on_commit() {
        let registry = Arc::new(registry(1));
        let session = registry.open(temp0()).unwrap();

        let reader = thread::spawn(move || {
            let mut buf = [0u8; 32];
            let n = session
                .read(&mut buf, ReadMode::Blocking, &Interrupt::new())
                .unwrap();
            String::from_utf8(buf[..n].to_vec()).unwrap()
        });

        thread::sleep(Duration::from_millis(30));
        assert!(!reader.is_finished());
        registry.commit(0, MeasurementKind::Temperature, 10).unwrap();

        assert_eq!(reader.join().unwrap(), "21.537\n");
    }

    #[test]
    fn test_commits_for_other_kinds_do_not_wake_reader() {
        let registry = Arc::new(registry(1));
        let session = Arc::new(registry.open(temp0()).unwrap());
        let interrupt = Interrupt::new();

        let reader = {
            let session = session.clone();
            let interrupt = interrupt.clone();
            thread::spawn(move || {
                let mut buf = [0u8; 32];
                session.read(&mut buf, ReadMode::Blocking, &interrupt)
            })
        };

        thread::sleep(Duration::from_millis(20));
        registry.commit(0, MeasurementKind::Light, 5).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(!reader.is_finished());

        registry.commit(0, MeasurementKind::Temperature, 10).unwrap();
        assert_eq!(reader.join().unwrap().unwrap(), 7);
    }

    #[test]
    fn test_interrupted_wait_can_be_retried() {
        let registry = Arc::new(registry(1));
        let session = Arc::new(registry.open(temp0()).unwrap());
        let interrupt = Interrupt::new();

        let reader = {
            let session = session.clone();
            let interrupt = interrupt.clone();
            thread::spawn(move || {
                let mut buf = [0u8; 32];
                session.read(&mut buf, ReadMode::Blocking, &interrupt)
            })
        };

        thread::sleep(Duration::from_millis(20));
        interrupt.raise();
        assert!(matches!(
            reader.join().unwrap(),
            Err(SensorError::Interrupted)
        ));
        assert!(!session.cache.is_locked());

        // Still pending: the identical call fails fast instead of sleeping
        let mut buf = [0u8; 32];
        assert!(matches!(
            session.read(&mut buf, ReadMode::Blocking, &interrupt),
            Err(SensorError::Interrupted)
        ));

        interrupt.reset();
        registry.commit(0, MeasurementKind::Temperature, 10).unwrap();
        let n = session
            .read(&mut buf, ReadMode::Blocking, &interrupt)
            .unwrap();
        assert_eq!(&buf[..n], b"21.537\n");
    }

    #[test]
    fn test_boundary_read_sees_latest_commit() {
        let registry = registry(1);
        let session = registry.open(temp0()).unwrap();
        let interrupt = Interrupt::new();

        for raw in 1..=5u16 {
            registry.commit(0, MeasurementKind::Temperature, raw).unwrap();
        }
        let mut line = Vec::new();
        session
            .read_to(&mut line, 64, ReadMode::Blocking, &interrupt)
            .unwrap();
        assert_eq!(line, b"5.000\n");
        assert_eq!(session.cached_timestamp(), 5);
    }

    #[test]
    fn test_fault_leaves_cursor_in_place() {
        let registry = registry(1);
        let session = registry.open(temp0()).unwrap();
        let interrupt = Interrupt::new();
        registry.commit(0, MeasurementKind::Temperature, 10).unwrap();

        let mut line = Vec::new();
        session
            .read_to(&mut line, 3, ReadMode::Blocking, &interrupt)
            .unwrap();
        assert_eq!(session.cursor(), 3);

        let err = session
            .read_to(&mut BrokenWriter, 3, ReadMode::Blocking, &interrupt)
            .unwrap_err();
        assert!(matches!(err, SensorError::Fault(_)));
        assert_eq!(err.errno(), Some(14));
        assert_eq!(session.cursor(), 3);

        session
            .read_to(&mut line, 64, ReadMode::Blocking, &interrupt)
            .unwrap();
        assert_eq!(line, b"21.537\n");
    }

    #[test]
    fn test_zero_length_read() {
        let registry = registry(1);
        let session = registry.open(temp0()).unwrap();
        registry.commit(0, MeasurementKind::Temperature, 10).unwrap();

        let mut buf = [0u8; 0];
        let n = session
            .read(&mut buf, ReadMode::NonBlocking, &Interrupt::new())
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_control_and_map_not_supported() {
        let registry = registry(1);
        let session = registry.open(temp0()).unwrap();
        assert!(matches!(
            session.control(0x5401, 0),
            Err(SensorError::NotSupported(_))
        ));
        assert!(matches!(
            session.map(0, 4096),
            Err(SensorError::NotSupported(_))
        ));
    }

    #[test]
    fn test_concurrent_sessions_see_only_committed_values() {
        const COMMITS: u16 = 200;
        const READERS: usize = 4;

        let registry = Arc::new(registry(1));
        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let session = registry
                    .open(DeviceAddress::new(0, MeasurementKind::Light).unwrap())
                    .unwrap();
                thread::spawn(move || {
                    let interrupt = Interrupt::new();
                    let mut last = 0i64;
                    let mut last_stamp = 0u64;
                    loop {
                        let mut line = Vec::new();
                        session
                            .read_to(&mut line, 64, ReadMode::Blocking, &interrupt)
                            .unwrap();
                        let text = std::str::from_utf8(&line).unwrap();
                        let value = crate::calibration::parse_reading(text).unwrap();

                        // Light raw r is committed as update r: value and
                        // stamp must belong to the same commit.
                        assert_eq!(value, session.cached_timestamp() as i64 * 1000);
                        assert!(value > last);
                        assert!(session.cached_timestamp() > last_stamp);
                        last = value;
                        last_stamp = session.cached_timestamp();
                        if value == i64::from(COMMITS) * 1000 {
                            break;
                        }
                    }
                })
            })
            .collect();

        for raw in 1..=COMMITS {
            registry.commit(0, MeasurementKind::Light, raw).unwrap();
            if raw % 20 == 0 {
                thread::sleep(Duration::from_millis(1));
            }
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(registry.open_sessions(), 0);
    }

    #[test]
    fn test_close_releases_session() {
        let registry = registry(2);
        let session = registry.open(temp0()).unwrap();
        let other = registry
            .open(DeviceAddress::new(1, MeasurementKind::Battery).unwrap())
            .unwrap();
        assert_eq!(registry.open_sessions(), 2);

        session.close();
        assert_eq!(registry.open_sessions(), 1);
        assert_eq!(other.sensor_id(), 1);
        assert_eq!(other.kind(), MeasurementKind::Battery);

        // The sensor is unaffected by sessions going away
        registry.commit(0, MeasurementKind::Temperature, 10).unwrap();
        assert_eq!(registry.sensor(0).unwrap().last_update(MeasurementKind::Temperature), 1);
    }

    #[test]
    fn test_partial_write_advances_cursor() {
        let registry = registry(1);
        let session = registry.open(temp0()).unwrap();
        let interrupt = Interrupt::new();
        registry.commit(0, MeasurementKind::Temperature, 10).unwrap();

        let mut out = ShortWriter {
            taken: Vec::new(),
            budget: 4,
            interrupt_first: true,
        };
        let err = session
            .read_to(&mut out, 64, ReadMode::Blocking, &interrupt)
            .unwrap_err();
        assert!(matches!(err, SensorError::Fault(_)));
        assert_eq!(out.taken, b"21.5");
        assert_eq!(session.cursor(), 4);

        // The retry picks up after the delivered bytes
        let mut rest = Vec::new();
        assert_eq!(
            session
                .read_to(&mut rest, 64, ReadMode::Blocking, &interrupt)
                .unwrap(),
            3
        );
        assert_eq!(rest, b"37\n");
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_woken_reader_drains_line_started_by_another() {
        let registry = Arc::new(registry(1));
        let session = Arc::new(registry.open(temp0()).unwrap());
        let notifier = registry.sensor(0).unwrap().notifier();

        registry.commit(0, MeasurementKind::Temperature, 100).unwrap();
        let mut first = Vec::new();
        session
            .read_to(&mut first, 64, ReadMode::Blocking, &Interrupt::new())
            .unwrap();
        assert_eq!(first, b"100.000\n");

        let reader = {
            let session = session.clone();
            thread::spawn(move || {
                let mut line = Vec::new();
                let n = session.read_to(&mut line, 64, ReadMode::Blocking, &Interrupt::new());
                (n, line)
            })
        };
        while notifier.wait_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        // Another caller refreshes and takes 7 of 8 bytes while the
        // sleeping reader is locked out.
        {
            let mut cache = session.cache.try_acquire().unwrap();
            registry.commit(0, MeasurementKind::Temperature, 200).unwrap();
            assert_eq!(session.refresh(&mut cache), Freshness::Fresh);
            assert_eq!(cache.text.as_str(), "200.000\n");
            cache.cursor = 7;
        }

        let (n, line) = reader.join().unwrap();
        assert_eq!(n.unwrap(), 1);
        assert_eq!(line, b"\n");
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.cached_timestamp(), 2);

        // A shorter line at the next boundary
        registry.commit(0, MeasurementKind::Temperature, 1).unwrap();
        let mut next = Vec::new();
        session
            .read_to(&mut next, 64, ReadMode::NonBlocking, &Interrupt::new())
            .unwrap();
        assert_eq!(next, b"1.000\n");
        assert!(session.cursor() <= session.cached_len());
    }

    #[test]
    fn test_shared_session_blocking_and_chunked_readers() {
        // Lines of 6, 8, 7, 9 and 6 bytes
        const RAWS: [u16; 5] = [1, 100, 20, 1000, 3];
        const ROUNDS: usize = 40;
        const LAST: u16 = 9999;

        let registry = Arc::new(registry(1));
        let session = Arc::new(registry.open(temp0()).unwrap());
        let interrupt = Interrupt::new();
        let all = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let readers: Vec<_> = [64usize, 3]
            .into_iter()
            .map(|chunk| {
                let session = session.clone();
                let interrupt = interrupt.clone();
                let mut out = SharedStream {
                    mine: Vec::new(),
                    all: all.clone(),
                };
                thread::spawn(move || {
                    loop {
                        match session.read_to(&mut out, chunk, ReadMode::Blocking, &interrupt) {
                            Ok(n) => {
                                assert!(n > 0 && n <= chunk);
                                assert!(session.cursor() <= session.cached_len());
                            }
                            Err(SensorError::Interrupted) => break,
                            Err(e) => panic!("unexpected read error: {e}"),
                        }
                    }
                    out.mine
                })
            })
            .collect();

        for round in 0..ROUNDS {
            let raw = RAWS[round % RAWS.len()];
            registry.commit(0, MeasurementKind::Temperature, raw).unwrap();
            thread::sleep(Duration::from_micros(300));
        }
        registry.commit(0, MeasurementKind::Temperature, LAST).unwrap();

        let last_line = b"9999.000\n";
        for _ in 0..500 {
            if all.lock().ends_with(last_line) {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        interrupt.raise();

        let mut total = 0;
        for reader in readers {
            total += reader.join().unwrap().len();
        }

        let stream = all.lock();
        assert!(stream.ends_with(last_line));
        assert_eq!(total, stream.len());

        let text = std::str::from_utf8(&stream).unwrap();
        for line in text.split_inclusive('\n') {
            let value = crate::calibration::parse_reading(line).unwrap();
            assert!(
                RAWS.iter()
                    .chain([LAST].iter())
                    .any(|&raw| i64::from(raw) * 1000 == value),
                "{line:?} was never committed"
            );
            assert_eq!(line, crate::calibration::format_reading(value).as_str());
        }
        assert_eq!(session.cursor(), 0);
    }
}
