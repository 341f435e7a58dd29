//! Core zone server implementation.
//!
//! `ZoneServer` owns the tables of the zones it runs and drives their
//! simulation from `run_frame`. It is a plain value: the event loop that owns
//! it feeds it inbound contract calls and calls `run_frame` when the time
//! returned by the previous call is reached.

use crate::config::ZoneServerConfig;
use crate::data::{Data, ZoneOwner};
use crate::physics;
use crate::server::admission::{AdmissionFailure, PendingAdmission};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use zone_protocol::{ObjectData, ObjectRef, SectorRef, ViewRef, ZoneCoord, ZoneRef};

/// Zones running faster than this are clamped to it.
pub const MAX_ZONE_SPEED: f32 = 16.0;

/// Length of one frame at `fps`.
pub fn frame_period(fps: u32) -> Duration {
    Duration::from_micros((1_000_000 / fps.max(1) as u64).max(1))
}

pub struct ZoneServer {
    pub(crate) config: ZoneServerConfig,
    pub(crate) data: Data,
    /// Start of the next frame to simulate.
    pub(crate) time: Instant,
    /// Current frame rate, lowered under overload.
    pub(crate) fps: u32,
    pub(crate) frames_run: u64,
    pub(crate) frames_skipped: u64,
    pub(crate) pending: Vec<PendingAdmission>,
    pub(crate) admission_failures: Vec<AdmissionFailure>,
}

impl ZoneServer {
    /// Creates an empty zone server whose clock starts now.
    pub fn new(config: ZoneServerConfig) -> Self {
        Self::with_start(config, Instant::now())
    }

    /// Creates an empty zone server whose clock starts at `start`.
    pub fn with_start(config: ZoneServerConfig, start: Instant) -> Self {
        let fps = config.fps.max(1);
        Self {
            config,
            data: Data::default(),
            time: start,
            fps,
            frames_run: 0,
            frames_skipped: 0,
            pending: Vec::new(),
            admission_failures: Vec::new(),
        }
    }

    pub fn run_frame(&mut self) -> Instant {
        self.run_frame_at(Instant::now())
    }

    /// Runs every frame elapsed between the server clock and `now`.
    ///
    /// When more frames than the catch-up threshold have elapsed the backlog
    /// is not simulated: the frame rate is halved, the clock jumps to `now`
    /// and the frame is skipped.
    ///
    /// # Returns
    ///
    /// The time at which the next frame is due.
    pub fn run_frame_at(&mut self, now: Instant) -> Instant {
        let mut frame = frame_period(self.fps);
        let elapsed = now.saturating_duration_since(self.time);
        let frames = (elapsed.as_micros() / frame.as_micros()) as u64;

        self.poll_admissions(now);

        if frames > self.config.catch_up_threshold as u64 {
            let previous = self.fps;
            self.fps = (self.fps / 2).max(1);
            self.frames_skipped += frames;
            frame = frame_period(self.fps);
            warn!(
                "⚠️ Skipped {} frames, reducing fps from {} to {}",
                frames, previous, self.fps
            );
            self.time = now;
        } else if frames > 0 {
            for _ in 0..frames {
                self.step_zones(frame);
                self.time += frame;
                self.frames_run += 1;
            }
            self.settle_moved_objects();
            self.publish_changes();
            trace!("Ran {} frame(s) at {} fps", frames, self.fps);
        }

        self.time + frame
    }

    /// Feeds one frame of wall-clock time to the sim of every local zone.
    fn step_zones(&mut self, frame: Duration) {
        let config = &self.config;
        let Data { sectors, objects, .. } = &mut self.data;

        for (sector_id, sector) in sectors.iter_mut() {
            for (coord, zone) in sector.zones.iter_mut() {
                if !zone.owner.is_local() {
                    continue;
                }
                let zone_ref = ZoneRef::new(*sector_id, *coord);
                let speed = zone.zone_data.effective_speed().min(MAX_ZONE_SPEED);
                let delta = Duration::from_micros((frame.as_micros() as f64 * speed as f64).round() as u64);
                zone.sim.update(delta, |sim_frame| {
                    objects.for_each_in_zone_mut(zone_ref, |_, resident| {
                        physics::step_object(resident, sim_frame, config);
                    });
                });
            }
        }
    }

    /// Re-homes objects whose position left their zone cell.
    fn settle_moved_objects(&mut self) {
        for object in self.data.objects.dirty() {
            let Some(resident) = self.data.objects.get(object) else {
                continue;
            };
            let current = resident.zone;
            let target = ZoneRef::new(
                current.sector_id,
                ZoneCoord::containing(resident.data.pos, self.config.zone_size),
            );
            if target == current {
                continue;
            }

            match self.data.zone(target).map(|meta| meta.owner.is_local()) {
                Some(true) => {
                    debug!("{} moved from {} to {}", object, current, target);
                    self.data.objects.relocate(object, target);
                }
                Some(false) => self.hand_off(object, target),
                None => trace!("{} left {} for unknown {}, keeping it in place", object, current, target),
            }
        }
    }

    /// Reports every changed resident to its sector and its watchers.
    fn publish_changes(&mut self) {
        for object in self.data.objects.dirty() {
            let Some(resident) = self.data.objects.get_mut(object) else {
                continue;
            };
            resident.dirty = false;
            let zone = resident.zone;
            let data = resident.data.clone();

            if let Some(isector) = self
                .data
                .sectors
                .get_mut(&zone.sector_id)
                .and_then(|sector| sector.isector.as_mut())
            {
                isector.update_object(object, zone, data.clone());
            }
            self.data.notify_watchers_update(object, zone, &data);
        }
    }

    /// Moves a resident object to the peer running `target` and forgets it.
    ///
    /// The peer hears first, then the sector, then the watching views, so a
    /// view re-watching through the sector finds the object at its new home.
    pub(crate) fn hand_off(&mut self, object: ObjectRef, target: ZoneRef) {
        let Some(resident) = self.data.objects.remove(object) else {
            return;
        };
        let data = resident.data;

        let sector = self.data.sectors.get_mut(&target.sector_id);
        let Some(sector) = sector else {
            warn!("Dropping handoff of {}: {} has no sector", object, target);
            self.data.notify_watchers_removed(object);
            return;
        };
        match sector.zones.get_mut(&target.coord).map(|zone| &mut zone.owner) {
            Some(ZoneOwner::Peer(peer)) => peer.update_object(object, target, data.clone()),
            _ => {
                warn!("Dropping handoff of {}: {} is not run by a peer", object, target);
                self.data.notify_watchers_removed(object);
                return;
            }
        }
        if let Some(isector) = sector.isector.as_mut() {
            isector.update_object(object, target, data.clone());
        }

        self.data.notify_watchers_update(object, target, &data);
        self.data.watches.remove(&object.object_id);
        debug!("🔀 Handed {} to the peer running {}", object, target);
    }

    pub fn config(&self) -> &ZoneServerConfig {
        &self.config
    }

    /// Current frame rate.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Start of the next frame to simulate.
    pub fn time(&self) -> Instant {
        self.time
    }

    pub fn frames_run(&self) -> u64 {
        self.frames_run
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    pub fn has_object(&self, object: ObjectRef) -> bool {
        self.data.objects.contains(object)
    }

    pub fn object(&self, object: ObjectRef) -> Option<&ObjectData> {
        self.data.objects.get(object).map(|resident| &resident.data)
    }

    pub fn object_zone(&self, object: ObjectRef) -> Option<ZoneRef> {
        self.data.objects.zone_of(object)
    }

    pub fn object_count(&self) -> usize {
        self.data.objects.len()
    }

    /// Objects resident in `zone`, ascending by id.
    pub fn objects_in_zone(&self, zone: ZoneRef) -> Vec<ObjectRef> {
        self.data.objects.in_zone(zone)
    }

    pub fn has_sector(&self, sector: SectorRef) -> bool {
        self.data.sectors.contains_key(&sector.sector_id)
    }

    /// Zone coordinates this server knows for `sector`, local or not.
    pub fn zones(&self, sector: SectorRef) -> Vec<ZoneCoord> {
        self.data
            .sectors
            .get(&sector.sector_id)
            .map(|meta| meta.zones.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn has_zone(&self, zone: ZoneRef) -> bool {
        self.data.zone(zone).is_some()
    }

    /// Whether this server simulates `zone` itself.
    pub fn runs_zone(&self, zone: ZoneRef) -> bool {
        self.data.is_local(zone)
    }

    /// Simulation clock of a known zone, in microseconds.
    pub fn zone_timestamp(&self, zone: ZoneRef) -> Option<u64> {
        self.data.zone(zone).map(|meta| meta.sim.timestamp())
    }

    pub fn has_view(&self, view: ViewRef) -> bool {
        self.data.views.contains_key(&view.view_id)
    }

    /// Views watching `object`, ascending by id.
    pub fn watchers(&self, object: ObjectRef) -> Vec<ViewRef> {
        self.data
            .watches
            .get(&object.object_id)
            .map(|views| views.keys().copied().map(ViewRef::new).collect())
            .unwrap_or_default()
    }

    /// Accepted control frames not yet applied to `object`.
    pub fn pending_controls(&self, object: ObjectRef) -> usize {
        self.data
            .objects
            .get(object)
            .map_or(0, |resident| resident.controls.len())
    }
}
