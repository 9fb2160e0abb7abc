//! Latest raw samples of one physical sensor.

use super::kind::{KIND_COUNT, MeasurementKind};
use super::notifier::ChangeNotifier;
use crate::sync::FastLock;

/// Index of a sensor in the registry's arena.
pub type SensorId = u32;

/// A raw sample together with the update counter it was committed under.
///
/// `timestamp` is 0 until the first commit and increases by one with every
/// commit of that kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub raw: u16,
    pub timestamp: u64,
}

/// Thread-safe sample store for one sensor.
///
/// Written only by the producer via [`SensorRecord::commit`] /
/// [`SensorRecord::commit_all`]; read by any number of reader sessions via
/// [`SensorRecord::snapshot`]. Sample and counter are always written and
/// read together under the record's [`FastLock`], so readers never see a
/// torn pair. Neither path ever sleeps.
pub struct SensorRecord {
    id: SensorId,
    samples: FastLock<[Snapshot; KIND_COUNT]>,
    notifier: ChangeNotifier,
}

impl SensorRecord {
    pub fn new(id: SensorId) -> Self {
        Self {
            id,
            samples: FastLock::new([Snapshot::default(); KIND_COUNT]),
            notifier: ChangeNotifier::new(id),
        }
    }

    pub fn id(&self) -> SensorId {
        self.id
    }

    /// Store a new raw sample for one kind and wake waiting readers.
    pub fn commit(&self, kind: MeasurementKind, raw: u16) {
        self.samples.with(|samples| {
            let slot = &mut samples[kind.index()];
            slot.raw = raw;
            slot.timestamp += 1;
        });
        self.notifier.notify();
    }

    /// Store a full sample packet (one value per kind, in
    /// [`MeasurementKind::ALL`] order) with a single wake-up.
    pub fn commit_all(&self, raws: [u16; KIND_COUNT]) {
        self.samples.with(|samples| {
            for (slot, raw) in samples.iter_mut().zip(raws) {
                slot.raw = raw;
                slot.timestamp += 1;
            }
        });
        self.notifier.notify();
    }

    /// Consistent copy of the latest sample of `kind`.
    pub fn snapshot(&self, kind: MeasurementKind) -> Snapshot {
        self.samples.with(|samples| samples[kind.index()])
    }

    pub fn last_update(&self, kind: MeasurementKind) -> u64 {
        self.snapshot(kind).timestamp
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}
