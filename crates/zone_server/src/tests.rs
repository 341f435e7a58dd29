// Include tests
#[cfg(test)]
mod tests {
    use crate::*;
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc::UnboundedReceiver;
    use zone_protocol::*;

    const SECTOR: SectorRef = SectorRef { sector_id: 1 };

    fn zone(x: i32, y: i32) -> ZoneRef {
        ZoneRef::new(1, ZoneCoord::new(x, y))
    }

    struct Harness {
        server: ZoneServer,
        start: Instant,
        sector_rx: UnboundedReceiver<SectorInbound>,
        view_rx: UnboundedReceiver<ViewInbound>,
    }

    /// One sector, local zone (0, 0) and view 1.
    fn harness(config: ZoneServerConfig) -> Harness {
        let start = Instant::now();
        let mut server = ZoneServer::with_start(config, start);
        let (sector_handle, sector_rx) = inbox::<SectorInbound>();
        let (view_handle, view_rx) = inbox::<ViewInbound>();

        server.update_sector_info(SECTOR, Box::new(sector_handle), SectorData { seed: 42 });
        server.update_zone_info(zone(0, 0), None, ZoneData::default());
        server.update_view_info(ViewRef::new(1), Box::new(view_handle), ViewData::default());

        Harness {
            server,
            start,
            sector_rx,
            view_rx,
        }
    }

    /// Server and sim both at 128 fps, so one frame is one sim step.
    fn lockstep_config() -> ZoneServerConfig {
        ZoneServerConfig {
            sim_fps: 128,
            ..ZoneServerConfig::default()
        }
    }

    fn tick(h: &mut Harness, frames: u32) {
        for _ in 0..frames {
            let next = h.server.time() + frame_period(h.server.fps());
            h.server.run_frame_at(next);
        }
    }

    fn place(h: &mut Harness, id: ObjectId, at: ZoneRef, data: ObjectData) -> ObjectRef {
        let object = ObjectRef::new(id);
        SectorToZoneServer::update_object(&mut h.server, object, at, data);
        object
    }

    fn moving(x: f64, y: f64, vx: f32, vy: f32) -> ObjectData {
        let mut data = ObjectData::at(Vec2d::new(x, y));
        data.orientation.velocity = Vec2f::new(vx, vy);
        data
    }

    fn sector_updates(rx: &mut UnboundedReceiver<SectorInbound>) -> Vec<(ObjectRef, ZoneRef)> {
        let mut updates = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let SectorInbound::FromZone(ZoneToSectorMessage::UpdateObject { object, zone, .. }) = message {
                updates.push((object, zone));
            }
        }
        updates
    }

    fn view_messages(rx: &mut UnboundedReceiver<ViewInbound>) -> Vec<ViewInbound> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    #[test]
    fn test_sector_registration_and_removal() {
        let mut h = harness(ZoneServerConfig::default());
        let object = place(&mut h, 7, zone(0, 0), ObjectData::default());

        assert!(h.server.has_sector(SECTOR));
        assert!(h.server.runs_zone(zone(0, 0)));
        assert!(h.server.has_object(object));
        assert_eq!(h.server.object_zone(object), Some(zone(0, 0)));

        h.server.remove_sector_info(SECTOR);

        assert!(!h.server.has_sector(SECTOR));
        assert!(h.server.zones(SECTOR).is_empty());
        assert!(!h.server.has_zone(zone(0, 0)));
        assert!(!h.server.has_object(object));
        assert_eq!(h.server.object_count(), 0);
    }

    #[test]
    fn test_zone_info_sequence_is_last_write_wins() {
        let mut h = harness(ZoneServerConfig::default());
        let fast = ZoneData { speed: 2.0 };

        h.server.update_zone_info(zone(1, 0), None, ZoneData::default());
        h.server.update_zone_info(zone(2, 0), None, ZoneData::default());
        h.server.remove_zone_info(zone(1, 0));
        h.server.update_zone_info(zone(2, 0), None, fast);
        h.server.remove_zone_info(zone(5, 5));
        h.server.update_zone_info(zone(1, 0), None, ZoneData::default());
        h.server.remove_zone_info(zone(0, 0));

        assert_eq!(h.server.zones(SECTOR), vec![ZoneCoord::new(1, 0), ZoneCoord::new(2, 0)]);
    }

    #[test]
    fn test_zone_info_for_unknown_sector_creates_it() {
        let mut h = harness(ZoneServerConfig::default());
        let other = ZoneRef::new(9, ZoneCoord::new(0, 0));
        h.server.update_zone_info(other, None, ZoneData::default());
        assert!(h.server.has_sector(SectorRef::new(9)));
        assert!(h.server.runs_zone(other));
    }

    #[test]
    fn test_update_object_replay_is_idempotent() {
        let mut h = harness(ZoneServerConfig::default());
        let data = moving(3.0, 4.0, 0.0, 0.0);

        let object = place(&mut h, 7, zone(0, 0), data.clone());
        let once = h.server.object(object).cloned();
        place(&mut h, 7, zone(0, 0), data.clone());

        assert_eq!(h.server.object(object).cloned(), once);
        assert_eq!(h.server.object(object), Some(&data));
        assert_eq!(h.server.object_count(), 1);
        assert_eq!(h.server.objects_in_zone(zone(0, 0)), vec![object]);
    }

    #[test]
    fn test_invalid_object_update_is_ignored() {
        let mut h = harness(ZoneServerConfig::default());
        let object = place(&mut h, 1, zone(0, 0), ObjectData::at(Vec2d::new(f64::NAN, 0.0)));
        assert!(!h.server.has_object(object));
    }

    #[test]
    fn test_remove_unknown_object_is_noop() {
        let mut h = harness(ZoneServerConfig::default());
        let object = place(&mut h, 1, zone(0, 0), ObjectData::default());

        SectorToZoneServer::remove_object(&mut h.server, SECTOR, ObjectRef::new(99));
        // Wrong sector for a known object.
        ZoneToZoneServer::remove_object(&mut h.server, SectorRef::new(2), object);

        assert!(h.server.has_object(object));
    }

    #[test]
    fn test_admit_then_remove_round_trip() {
        let mut h = harness(ZoneServerConfig::default());
        let object = ObjectRef::new(5);

        h.server
            .spawn_object_at(object, zone(0, 0), ObjectData::default(), h.start)
            .expect("spawn request");
        assert!(!h.server.has_object(object));
        assert_eq!(h.server.pending_admissions(), 1);

        let Ok(SectorInbound::FromZone(ZoneToSectorMessage::AddObject { object: asked, zone: at, reply, .. })) =
            h.sector_rx.try_recv()
        else {
            panic!("expected an add_object request");
        };
        assert_eq!((asked, at), (object, zone(0, 0)));
        reply.accept(AddObjectReply {
            object,
            zone: at,
            sector_population: 1,
        });

        tick(&mut h, 1);
        assert!(h.server.has_object(object));
        assert_eq!(h.server.pending_admissions(), 0);

        SectorToZoneServer::remove_object(&mut h.server, SECTOR, object);
        assert!(!h.server.has_object(object));
        assert!(h.server.take_admission_failures().is_empty());
    }

    #[test]
    fn test_rejected_admission_is_reported() {
        let mut h = harness(ZoneServerConfig::default());
        let object = ObjectRef::new(5);
        h.server
            .spawn_object_at(object, zone(0, 0), ObjectData::default(), h.start)
            .expect("spawn request");

        let Ok(SectorInbound::FromZone(ZoneToSectorMessage::AddObject { reply, .. })) = h.sector_rx.try_recv() else {
            panic!("expected an add_object request");
        };
        reply.reject(AdmissionError::Capacity { limit: 0 });

        tick(&mut h, 1);
        assert!(!h.server.has_object(object));

        let failures = h.server.take_admission_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].object, object);
        assert_eq!(failures[0].error, AdmissionError::Capacity { limit: 0 });
        assert!(h.server.take_admission_failures().is_empty());
    }

    #[test]
    fn test_admission_times_out() {
        let config = ZoneServerConfig {
            admission_timeout_ms: 10,
            ..ZoneServerConfig::default()
        };
        let mut h = harness(config);
        let object = ObjectRef::new(5);
        h.server
            .spawn_object_at(object, zone(0, 0), ObjectData::default(), h.start)
            .expect("spawn request");

        // The request sits unanswered in the sector inbox.
        h.server.run_frame_at(h.start + Duration::from_millis(5));
        assert_eq!(h.server.pending_admissions(), 1);

        h.server.run_frame_at(h.start + Duration::from_millis(12));
        assert_eq!(h.server.pending_admissions(), 0);
        assert!(!h.server.has_object(object));

        let failures = h.server.take_admission_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error, AdmissionError::Timeout { timeout_ms: 10 });
        assert!(failures[0].error.is_retryable());
    }

    fn take_add_request(h: &mut Harness) -> AdmissionReply {
        let Ok(SectorInbound::FromZone(ZoneToSectorMessage::AddObject { reply, .. })) = h.sector_rx.try_recv() else {
            panic!("expected an add_object request");
        };
        reply
    }

    fn sector_removals(rx: &mut UnboundedReceiver<SectorInbound>) -> Vec<ObjectRef> {
        let mut removals = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let SectorInbound::FromZone(ZoneToSectorMessage::RemoveObject { object }) = message {
                removals.push(object);
            }
        }
        removals
    }

    #[test]
    fn test_removal_before_admission_completes_wins() {
        let mut h = harness(ZoneServerConfig::default());
        let object = ObjectRef::new(5);
        h.server
            .spawn_object_at(object, zone(0, 0), ObjectData::default(), h.start)
            .expect("spawn request");

        // The sector accepts and retires the object before the zone's next frame.
        take_add_request(&mut h).accept(AddObjectReply {
            object,
            zone: zone(0, 0),
            sector_population: 1,
        });
        SectorToZoneServer::remove_object(&mut h.server, SECTOR, object);
        assert_eq!(h.server.pending_admissions(), 0);

        tick(&mut h, 1);
        assert!(!h.server.has_object(object));
        assert_eq!(h.server.object_count(), 0);

        let failures = h.server.take_admission_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error, AdmissionError::Removed);
        // The sector asked for the removal; nothing is sent back.
        assert!(sector_removals(&mut h.sector_rx).is_empty());
    }

    #[test]
    fn test_removal_from_other_sector_keeps_admission() {
        let mut h = harness(ZoneServerConfig::default());
        let object = ObjectRef::new(5);
        h.server
            .spawn_object_at(object, zone(0, 0), ObjectData::default(), h.start)
            .expect("spawn request");

        SectorToZoneServer::remove_object(&mut h.server, SectorRef::new(2), object);
        assert_eq!(h.server.pending_admissions(), 1);
    }

    #[test]
    fn test_timed_out_admission_is_withdrawn_from_sector() {
        let config = ZoneServerConfig {
            admission_timeout_ms: 10,
            ..ZoneServerConfig::default()
        };
        let mut h = harness(config);
        let object = ObjectRef::new(5);
        h.server
            .spawn_object_at(object, zone(0, 0), ObjectData::default(), h.start)
            .expect("spawn request");
        let reply = take_add_request(&mut h);

        h.server.run_frame_at(h.start + Duration::from_millis(12));
        assert_eq!(h.server.pending_admissions(), 0);

        // The sector decides after the zone gave up.
        reply.accept(AddObjectReply {
            object,
            zone: zone(0, 0),
            sector_population: 1,
        });
        tick(&mut h, 1);

        assert!(!h.server.has_object(object));
        assert_eq!(sector_removals(&mut h.sector_rx), vec![object]);
    }

    #[test]
    fn test_accepted_into_removed_zone_is_withdrawn_from_sector() {
        let mut h = harness(ZoneServerConfig::default());
        let object = ObjectRef::new(5);
        h.server
            .spawn_object_at(object, zone(0, 0), ObjectData::default(), h.start)
            .expect("spawn request");
        take_add_request(&mut h).accept(AddObjectReply {
            object,
            zone: zone(0, 0),
            sector_population: 1,
        });
        h.server.remove_zone_info(zone(0, 0));

        tick(&mut h, 1);
        assert!(!h.server.has_object(object));

        let failures = h.server.take_admission_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error, AdmissionError::ZoneNotAssigned(zone(0, 0)));
        assert_eq!(sector_removals(&mut h.sector_rx), vec![object]);
    }

    #[test]
    fn test_dropped_admission_is_disconnected() {
        let mut h = harness(ZoneServerConfig::default());
        let object = ObjectRef::new(5);
        h.server
            .spawn_object_at(object, zone(0, 0), ObjectData::default(), h.start)
            .expect("spawn request");
        drop(h.sector_rx.try_recv());

        tick(&mut h, 1);
        let failures = h.server.take_admission_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error, AdmissionError::Disconnected);
    }

    #[test]
    fn test_spawn_refused_locally() {
        let mut h = harness(ZoneServerConfig::default());

        let result = h.server.spawn_object(ObjectRef::new(1), zone(3, 3), ObjectData::default());
        assert_eq!(result, Err(AdmissionError::ZoneNotAssigned(zone(3, 3))));

        let result = h.server.spawn_object(
            ObjectRef::new(1),
            zone(0, 0),
            ObjectData::at(Vec2d::new(f64::INFINITY, 0.0)),
        );
        assert_eq!(result, Err(AdmissionError::InvalidObject(ObjectDataError::NonFinite)));
        assert_eq!(h.server.pending_admissions(), 0);
    }

    #[test]
    fn test_run_frame_degrades_then_recovers() {
        let mut h = harness(ZoneServerConfig::default());
        assert_eq!(h.server.fps(), 128);

        // 50ms is six frames at 128 fps: too far behind to catch up.
        let late = h.start + Duration::from_millis(50);
        let next = h.server.run_frame_at(late);

        assert_eq!(h.server.fps(), 64);
        assert_eq!(h.server.frames_run(), 0);
        assert_eq!(h.server.frames_skipped(), 6);
        assert_eq!(h.server.time(), late);
        assert_eq!(next, late + Duration::from_micros(15_625));
        assert_eq!(h.server.zone_timestamp(zone(0, 0)), Some(0));

        let after = h.server.run_frame_at(next);
        assert_eq!(h.server.fps(), 64);
        assert_eq!(h.server.frames_run(), 1);
        assert_eq!(after, next + Duration::from_micros(15_625));
        assert_eq!(h.server.zone_timestamp(zone(0, 0)), Some(15_625));
    }

    #[test]
    fn test_run_frame_catches_up_small_backlog() {
        let mut h = harness(lockstep_config());
        let period = frame_period(128);

        let next = h.server.run_frame_at(h.start + period * 2);
        assert_eq!(h.server.frames_run(), 2);
        assert_eq!(h.server.fps(), 128);
        assert_eq!(next, h.start + period * 3);
        assert_eq!(h.server.zone_timestamp(zone(0, 0)), Some(7_812 * 2));

        // Nothing elapsed: nothing runs, the same deadline comes back.
        assert_eq!(h.server.run_frame_at(h.start + period * 2), next);
        assert_eq!(h.server.frames_run(), 2);
    }

    #[test]
    fn test_zone_speed_scales_simulation() {
        let mut h = harness(lockstep_config());
        h.server.update_zone_info(zone(1, 0), None, ZoneData { speed: 2.0 });
        h.server.update_zone_info(zone(2, 0), None, ZoneData { speed: -1.0 });

        tick(&mut h, 4);
        assert_eq!(h.server.zone_timestamp(zone(0, 0)), Some(7_812 * 4));
        assert_eq!(h.server.zone_timestamp(zone(1, 0)), Some(7_812 * 8));
        assert_eq!(h.server.zone_timestamp(zone(2, 0)), Some(0));
    }

    #[test]
    fn test_moving_object_is_reported_to_sector_and_watchers() {
        let mut h = harness(lockstep_config());
        let object = place(&mut h, 3, zone(0, 0), moving(0.0, 0.0, 128.0, 0.0));
        h.server.update_watch(ViewRef::new(1), object, 50.0);
        view_messages(&mut h.view_rx);

        tick(&mut h, 2);

        let x = h.server.object(object).map(|data| data.pos.x).unwrap_or_default();
        assert!((x - 2.0 * 0.007_812 * 128.0).abs() < 1e-6);

        assert_eq!(sector_updates(&mut h.sector_rx), vec![(object, zone(0, 0)), (object, zone(0, 0))]);
        let views = view_messages(&mut h.view_rx);
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|message| matches!(
            message,
            ViewInbound::FromZone(ZoneToViewMessage::UpdateObject { object: o, .. }) if *o == object
        )));
    }

    #[test]
    fn test_resting_object_is_not_reported() {
        let mut h = harness(lockstep_config());
        place(&mut h, 3, zone(0, 0), ObjectData::default());
        tick(&mut h, 3);
        assert!(sector_updates(&mut h.sector_rx).is_empty());
    }

    #[test]
    fn test_object_crossing_into_local_zone_is_reindexed() {
        let config = ZoneServerConfig {
            zone_size: 10.0,
            ..lockstep_config()
        };
        let mut h = harness(config);
        h.server.update_zone_info(zone(1, 0), None, ZoneData::default());
        let object = place(&mut h, 3, zone(0, 0), moving(9.5, 5.0, 128.0, 0.0));

        tick(&mut h, 1);

        assert_eq!(h.server.object_zone(object), Some(zone(1, 0)));
        assert!(h.server.objects_in_zone(zone(0, 0)).is_empty());
        assert_eq!(sector_updates(&mut h.sector_rx), vec![(object, zone(1, 0))]);
    }

    #[test]
    fn test_object_crossing_into_peer_zone_is_handed_off() {
        let config = ZoneServerConfig {
            zone_size: 10.0,
            ..lockstep_config()
        };
        let mut h = harness(config);
        let (peer, mut peer_rx) = inbox::<ZoneInbound>();
        h.server.update_zone_info(zone(1, 0), Some(Box::new(peer)), ZoneData::default());
        let object = place(&mut h, 3, zone(0, 0), moving(9.5, 5.0, 128.0, 0.0));
        h.server.update_watch(ViewRef::new(1), object, 50.0);
        view_messages(&mut h.view_rx);

        tick(&mut h, 1);

        assert!(!h.server.has_object(object));
        assert!(h.server.watchers(object).is_empty());

        let Ok(ZoneInbound::FromZone(ZoneToZoneMessage::UpdateObject { object: moved, zone: to, object_data })) =
            peer_rx.try_recv()
        else {
            panic!("expected a handoff to the peer");
        };
        assert_eq!((moved, to), (object, zone(1, 0)));
        assert!(object_data.pos.x >= 10.0);

        assert_eq!(sector_updates(&mut h.sector_rx), vec![(object, zone(1, 0))]);

        // Watchers learn the new zone so they can watch it there.
        let views = view_messages(&mut h.view_rx);
        assert!(matches!(
            views.as_slice(),
            [ViewInbound::FromZone(ZoneToViewMessage::UpdateObject { zone: z, .. })] if *z == zone(1, 0)
        ));
    }

    #[test]
    fn test_object_crossing_into_unknown_zone_stays() {
        let config = ZoneServerConfig {
            zone_size: 10.0,
            ..lockstep_config()
        };
        let mut h = harness(config);
        let object = place(&mut h, 3, zone(0, 0), moving(9.5, 5.0, 128.0, 0.0));

        tick(&mut h, 2);

        assert!(h.server.has_object(object));
        assert_eq!(h.server.object_zone(object), Some(zone(0, 0)));
    }

    #[test]
    fn test_zone_given_to_peer_drains_residents() {
        let mut h = harness(ZoneServerConfig::default());
        let first = place(&mut h, 1, zone(0, 0), ObjectData::default());
        let second = place(&mut h, 2, zone(0, 0), ObjectData::default());

        let (peer, mut peer_rx) = inbox::<ZoneInbound>();
        h.server.update_zone_info(zone(0, 0), Some(Box::new(peer)), ZoneData::default());

        assert!(!h.server.runs_zone(zone(0, 0)));
        assert!(h.server.has_zone(zone(0, 0)));
        assert_eq!(h.server.object_count(), 0);

        let mut handed = Vec::new();
        while let Ok(ZoneInbound::FromZone(ZoneToZoneMessage::UpdateObject { object, .. })) = peer_rx.try_recv() {
            handed.push(object);
        }
        assert_eq!(handed, vec![first, second]);
    }

    #[test]
    fn test_object_written_into_peer_zone_is_forwarded() {
        let mut h = harness(ZoneServerConfig::default());
        let (peer, mut peer_rx) = inbox::<ZoneInbound>();
        h.server.update_zone_info(zone(1, 0), Some(Box::new(peer)), ZoneData::default());

        let object = place(&mut h, 4, zone(1, 0), ObjectData::default());

        assert!(!h.server.has_object(object));
        assert!(matches!(
            peer_rx.try_recv(),
            Ok(ZoneInbound::FromZone(ZoneToZoneMessage::UpdateObject { object: o, .. })) if o == object
        ));
    }

    #[test]
    fn test_remove_zone_info_evicts_and_notifies_watchers() {
        let mut h = harness(ZoneServerConfig::default());
        let object = place(&mut h, 1, zone(0, 0), ObjectData::default());
        h.server.update_watch(ViewRef::new(1), object, 10.0);
        view_messages(&mut h.view_rx);

        h.server.remove_zone_info(zone(0, 0));

        assert!(!h.server.has_object(object));
        assert!(h.server.watchers(object).is_empty());
        let views = view_messages(&mut h.view_rx);
        assert!(matches!(
            views.as_slice(),
            [ViewInbound::FromZone(ZoneToViewMessage::RemoveObject { object: o })] if *o == object
        ));
    }

    #[test]
    fn test_two_watchers_one_removed() {
        let mut h = harness(ZoneServerConfig::default());
        let (second_view, _second_rx) = inbox::<ViewInbound>();
        h.server.update_view_info(ViewRef::new(2), Box::new(second_view), ViewData::default());
        let object = place(&mut h, 1, zone(0, 0), ObjectData::default());

        h.server.update_watch(ViewRef::new(1), object, 10.0);
        h.server.update_watch(ViewRef::new(2), object, 20.0);
        assert_eq!(h.server.watchers(object), vec![ViewRef::new(1), ViewRef::new(2)]);

        h.server.remove_watch(ViewRef::new(1), object);
        assert_eq!(h.server.watchers(object), vec![ViewRef::new(2)]);
    }

    #[test]
    fn test_watch_sends_initial_state() {
        let mut h = harness(ZoneServerConfig::default());
        let object = place(&mut h, 1, zone(0, 0), ObjectData::at(Vec2d::new(1.0, 1.0)));

        h.server.update_watch(ViewRef::new(1), object, 10.0);

        let views = view_messages(&mut h.view_rx);
        assert!(matches!(
            views.as_slice(),
            [ViewInbound::FromZone(ZoneToViewMessage::UpdateObject { object: o, object_data, .. })]
                if *o == object && object_data.pos == Vec2d::new(1.0, 1.0)
        ));
    }

    #[test]
    fn test_invalid_watches_are_ignored() {
        let mut h = harness(ZoneServerConfig::default());
        let object = place(&mut h, 1, zone(0, 0), ObjectData::default());

        h.server.update_watch(ViewRef::new(8), object, 10.0);
        h.server.update_watch(ViewRef::new(1), object, f32::NAN);
        h.server.update_watch(ViewRef::new(1), object, 1.0e9);
        h.server.update_watch(ViewRef::new(1), ObjectRef::new(99), 10.0);

        assert!(h.server.watchers(object).is_empty());
        assert!(h.server.watchers(ObjectRef::new(99)).is_empty());
    }

    #[test]
    fn test_remove_view_info_drops_its_watches() {
        let mut h = harness(ZoneServerConfig::default());
        let object = place(&mut h, 1, zone(0, 0), ObjectData::default());
        h.server.update_watch(ViewRef::new(1), object, 10.0);

        h.server.remove_view_info(ViewRef::new(1));

        assert!(!h.server.has_view(ViewRef::new(1)));
        assert!(h.server.watchers(object).is_empty());
    }

    #[test]
    fn test_control_frames_are_validated() {
        let mut h = harness(ZoneServerConfig::default());
        let object = place(&mut h, 1, zone(0, 0), ObjectData::default());
        let view = ViewRef::new(1);
        let thrust = |timestamp| ControlFrame::new(timestamp, vec![ControlInput::new(ControlAxis::Thrust, 1.0)]);

        assert_eq!(
            h.server.accept_control(ViewRef::new(9), object, &thrust(1)),
            Err(ControlError::UnknownView(9))
        );
        assert_eq!(
            h.server.accept_control(view, ObjectRef::new(2), &thrust(1)),
            Err(ControlError::UnknownObject(ObjectRef::new(2)))
        );
        assert_eq!(
            h.server.accept_control(view, object, &ControlFrame::new(1, vec![])),
            Err(ControlError::Empty)
        );
        assert_eq!(
            h.server.accept_control(view, object, &ControlFrame::new(1, vec![ControlInput { input: 7, value: 0.0 }])),
            Err(ControlError::UnknownInput(7))
        );
        assert_eq!(
            h.server.accept_control(view, object, &ControlFrame::new(1, vec![ControlInput { input: 0, value: 2.0 }])),
            Err(ControlError::ValueOutOfRange(2.0))
        );

        assert_eq!(h.server.accept_control(view, object, &thrust(100)), Ok(()));
        assert_eq!(
            h.server.accept_control(view, object, &thrust(100)),
            Err(ControlError::OutOfOrder {
                timestamp: 100,
                last: 100
            })
        );
        assert_eq!(
            h.server.accept_control(view, object, &thrust(50)),
            Err(ControlError::OutOfOrder {
                timestamp: 50,
                last: 100
            })
        );
        assert_eq!(h.server.pending_controls(object), 1);
    }

    #[test]
    fn test_stale_control_frame_is_rejected() {
        let config = ZoneServerConfig {
            control_window_us: 10_000,
            ..lockstep_config()
        };
        let mut h = harness(config);
        let object = place(&mut h, 1, zone(0, 0), ObjectData::default());
        tick(&mut h, 3);

        let frame = ControlFrame::new(1, vec![ControlInput::new(ControlAxis::Turn, 0.5)]);
        assert_eq!(
            h.server.accept_control(ViewRef::new(1), object, &frame),
            Err(ControlError::Stale {
                timestamp: 1,
                now: 7_812 * 3
            })
        );
        assert_eq!(h.server.pending_controls(object), 0);
    }

    #[test]
    fn test_control_applies_when_due() {
        let mut h = harness(lockstep_config());
        let object = place(&mut h, 1, zone(0, 0), ObjectData::default());

        h.server.control_object(
            ViewRef::new(1),
            object,
            ControlFrame::new(7_812 * 2, vec![ControlInput::new(ControlAxis::Thrust, 1.0)]),
        );
        assert_eq!(h.server.pending_controls(object), 1);

        tick(&mut h, 1);
        assert_eq!(h.server.pending_controls(object), 1);
        assert_eq!(h.server.object(object).map(|d| d.orientation.velocity.x), Some(0.0));

        tick(&mut h, 1);
        assert_eq!(h.server.pending_controls(object), 0);
        let vx = h.server.object(object).map(|d| d.orientation.velocity.x).unwrap_or_default();
        assert!((vx - h.server.config().thrust_impulse).abs() < 1e-6);
    }

    #[test]
    fn test_rejected_control_leaves_object_untouched() {
        let mut h = harness(lockstep_config());
        let object = place(&mut h, 1, zone(0, 0), ObjectData::default());

        let garbage = ControlFrame::new(5, vec![ControlInput { input: 0, value: f32::NAN }; 40]);
        h.server.control_object(ViewRef::new(1), object, garbage);
        tick(&mut h, 2);

        assert_eq!(h.server.pending_controls(object), 0);
        assert_eq!(h.server.object(object), Some(&ObjectData::default()));
    }
}
