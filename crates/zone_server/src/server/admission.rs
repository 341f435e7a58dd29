//! Creation of new objects through the sector's admission decision.
//!
//! A spawned object is not resident until its sector accepts it. Pending
//! requests are polled at the start of every `run_frame`; rejected or expired
//! requests are kept as [`AdmissionFailure`]s for whoever produced the object.
//! A removal that arrives before the decision cancels the request.

use crate::server::core::ZoneServer;
use std::time::Instant;
use tracing::{debug, info, warn};
use zone_protocol::{admission_channel, AdmissionError, AdmissionTicket, ObjectData, ObjectRef, SectorRef, ZoneRef};

pub(crate) struct PendingAdmission {
    object: ObjectRef,
    zone: ZoneRef,
    data: ObjectData,
    ticket: AdmissionTicket,
    deadline: Instant,
}

/// A spawn request that did not produce a resident object.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionFailure {
    pub object: ObjectRef,
    pub zone: ZoneRef,
    pub data: ObjectData,
    pub error: AdmissionError,
}

impl ZoneServer {
    pub fn spawn_object(&mut self, object: ObjectRef, zone: ZoneRef, data: ObjectData) -> Result<(), AdmissionError> {
        self.spawn_object_at(object, zone, data, Instant::now())
    }

    /// Asks the sector owning `zone` to admit a new object.
    ///
    /// # Arguments
    ///
    /// * `object` - Id chosen by the producer of the object
    /// * `zone` - A zone this server runs
    /// * `data` - Initial state, validated before the request is sent
    /// * `now` - Start of the admission deadline
    ///
    /// # Returns
    ///
    /// `Ok(())` once the request is in flight. Local refusals are returned
    /// directly; the sector's decision arrives through a later `run_frame`.
    pub fn spawn_object_at(
        &mut self,
        object: ObjectRef,
        zone: ZoneRef,
        data: ObjectData,
        now: Instant,
    ) -> Result<(), AdmissionError> {
        if !self.data.is_local(zone) {
            return Err(AdmissionError::ZoneNotAssigned(zone));
        }
        data.validate(object)?;

        let isector = self
            .data
            .sectors
            .get_mut(&zone.sector_id)
            .and_then(|sector| sector.isector.as_mut())
            .ok_or(AdmissionError::Disconnected)?;

        let (reply, ticket) = admission_channel();
        isector.add_object(object, zone, data.clone(), reply);
        self.pending.push(PendingAdmission {
            object,
            zone,
            data,
            ticket,
            deadline: now + self.config.admission_timeout(),
        });
        debug!("Requested admission of {} into {}", object, zone);
        Ok(())
    }

    /// Resolves pending admissions whose decision arrived or whose deadline
    /// passed.
    pub(crate) fn poll_admissions(&mut self, now: Instant) {
        if self.pending.is_empty() {
            return;
        }

        let mut still_pending = Vec::with_capacity(self.pending.len());
        for mut request in std::mem::take(&mut self.pending) {
            let result = match request.ticket.poll() {
                Some(result) => result,
                None if now >= request.deadline => Err(AdmissionError::Timeout {
                    timeout_ms: self.config.admission_timeout_ms,
                }),
                None => {
                    still_pending.push(request);
                    continue;
                }
            };

            match result {
                Ok(reply) => {
                    info!(
                        "✅ {} admitted into {} ({} objects in sector)",
                        request.object, request.zone, reply.sector_population
                    );
                    self.admit(request.object, request.zone, request.data);
                }
                Err(error) => {
                    // A late acceptance would leave the sector holding an
                    // object no zone server runs.
                    if matches!(error, AdmissionError::Timeout { .. }) {
                        self.withdraw(request.object, request.zone);
                    }
                    self.fail_admission(request.object, request.zone, request.data, error);
                }
            }
        }
        self.pending = still_pending;
    }

    /// Makes an accepted object resident. The zone may have changed hands
    /// while the request was in flight.
    fn admit(&mut self, object: ObjectRef, zone: ZoneRef, data: ObjectData) {
        match self.data.zone(zone).map(|meta| meta.owner.is_local()) {
            Some(true) => {
                self.data.objects.upsert(object, zone, data);
            }
            Some(false) => {
                self.data.objects.upsert(object, zone, data);
                self.hand_off(object, zone);
            }
            None => {
                self.withdraw(object, zone);
                self.fail_admission(object, zone, data, AdmissionError::ZoneNotAssigned(zone));
            }
        }
    }

    /// Tells the sector an object it may have admitted never became resident.
    fn withdraw(&mut self, object: ObjectRef, zone: ZoneRef) {
        if let Some(isector) = self
            .data
            .sectors
            .get_mut(&zone.sector_id)
            .and_then(|sector| sector.isector.as_mut())
        {
            isector.remove_object(object);
            debug!("Withdrew {} from {}", object, zone);
        }
    }

    fn fail_admission(&mut self, object: ObjectRef, zone: ZoneRef, data: ObjectData, error: AdmissionError) {
        warn!("❌ Admission of {} into {} failed: {}", object, zone, error);
        self.admission_failures.push(AdmissionFailure {
            object,
            zone,
            data,
            error,
        });
    }

    /// Cancels pending admissions of `object` in `sector`. The removal wins
    /// over an acceptance still in flight.
    pub(crate) fn cancel_admission(&mut self, sector: SectorRef, object: ObjectRef) -> bool {
        let (cancelled, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|request| request.object == object && request.zone.sector_id == sector.sector_id);
        self.pending = kept;
        let found = !cancelled.is_empty();
        for request in cancelled {
            self.fail_admission(request.object, request.zone, request.data, AdmissionError::Removed);
        }
        found
    }

    /// Admission requests still waiting for their sector.
    pub fn pending_admissions(&self) -> usize {
        self.pending.len()
    }

    /// Drains the spawn requests that failed since the last call.
    pub fn take_admission_failures(&mut self) -> Vec<AdmissionFailure> {
        std::mem::take(&mut self.admission_failures)
    }
}
