//! Admission policy for objects created by zone servers.

use crate::server::core::{ObjectRecord, SectorServer};
use zone_protocol::{AddObjectReply, AdmissionError, AdmissionResult, ObjectData, ObjectRef, ZoneRef};

impl SectorServer {
    /// Decides whether a newly created object may join this sector and
    /// records it when it may.
    ///
    /// Checks run in order: sector, object data, zone assignment, handoff in
    /// progress. A known id is admitted again without counting against the
    /// capacity, so a replayed request gets the same answer.
    pub fn admit_object(&mut self, object: ObjectRef, zone: ZoneRef, data: ObjectData) -> AdmissionResult {
        if zone.sector_id != self.sector.sector_id {
            return Err(AdmissionError::WrongSector {
                expected: self.sector.sector_id,
                actual: zone.sector_id,
            });
        }
        data.validate(object)?;
        if !self.zone_to_server.contains_key(&zone.coord) {
            return Err(AdmissionError::ZoneNotAssigned(zone));
        }
        if self.draining.contains_key(&zone.coord) {
            return Err(AdmissionError::ZoneDraining(zone));
        }
        let known = self.objects.contains_key(&object.object_id);
        if !known && self.objects.len() >= self.config.max_objects {
            return Err(AdmissionError::Capacity {
                limit: self.config.max_objects,
            });
        }

        self.objects.insert(object.object_id, ObjectRecord { zone, data });
        Ok(AddObjectReply {
            object,
            zone,
            sector_population: self.objects.len(),
        })
    }
}
