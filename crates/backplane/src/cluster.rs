//! Colocated cluster wiring.
//!
//! One sector, its zone servers and one view server run in the same process,
//! each as a task that owns its server and dispatches its inbox. Roles only
//! talk through channel handles, so the same servers could be split across
//! processes behind a transport.

use crate::config::AppConfig;
use crate::sink::JsonSink;
use sector_server::{SectorError, SectorServer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::{JoinError, JoinHandle};
use tokio::time;
use tracing::{debug, info, trace, warn};
use view_server::ViewServer;
use zone_protocol::{
    inbox, ObjectData, ObjectRef, SectorInbound, ShutdownState, ViewInbound, ViewRef, ViewServerLink, ZoneData,
    ZoneInbound, ZoneRef, ZoneServerLink,
};
use zone_server::{create_zone_server_with_config, ZoneServer};

/// Longest a zone task sleeps between frames.
pub const FRAME_GUARD: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("sector setup failed: {0}")]
    Sector(#[from] SectorError),
}

/// An object the zone server creates once it runs.
#[derive(Debug, Clone)]
pub struct Spawn {
    pub object: ObjectRef,
    pub zone: ZoneRef,
    pub data: ObjectData,
}

struct ZoneNode {
    server: ZoneServer,
    rx: UnboundedReceiver<ZoneInbound>,
    spawns: Vec<Spawn>,
    frames: Arc<AtomicU64>,
}

/// Servers wired together, not yet running.
pub struct Cluster {
    sector: SectorServer,
    sector_rx: UnboundedReceiver<SectorInbound>,
    zones: Vec<ZoneNode>,
    view: ViewServer,
    view_rx: UnboundedReceiver<ViewInbound>,
    views: Vec<ViewRef>,
    watch_targets: Vec<ObjectRef>,
    watch_distance: f32,
    flush_interval: Duration,
    report_interval: Duration,
}

impl Cluster {
    /// Creates every role from `config`, attaches them to the sector, deals
    /// out the zone grid and registers the views.
    pub fn build(config: &AppConfig) -> Result<Self, ClusterError> {
        config.validate().map_err(ClusterError::Config)?;

        let (sector_handle, sector_rx) = inbox::<SectorInbound>();
        let mut sector = SectorServer::new(config.sector.clone(), sector_handle.zone_to_sector_connector());
        let sector_id = sector.sector().sector_id;

        let mut zones = Vec::new();
        for _ in 0..config.cluster.zone_servers {
            let (handle, rx) = inbox::<ZoneInbound>();
            let index = sector.attach_zone_server(ZoneServerLink {
                to_zone: Box::new(handle.clone()),
                from_view: Box::new(handle.clone()),
                peer: handle.zone_to_zone_connector(),
            });
            debug!("Attached zone server {}", index);
            zones.push(ZoneNode {
                server: create_zone_server_with_config(config.zone.clone()),
                rx,
                spawns: Vec::new(),
                frames: Arc::new(AtomicU64::new(0)),
            });
        }

        let (view_handle, view_rx) = inbox::<ViewInbound>();
        let view_server = sector.attach_view_server(ViewServerLink {
            to_view: Box::new(view_handle.clone()),
            from_zone: view_handle.zone_to_view_connector(),
        });
        let mut view = ViewServer::new(config.view.clone(), Box::new(sector_handle));

        let assignments = config.cluster.assignments();
        for (coord, index) in &assignments {
            sector.assign_zone(*coord, *index, ZoneData::default())?;
        }

        let views: Vec<ViewRef> = (1..=config.cluster.views).map(ViewRef::new).collect();
        for v in &views {
            view.add_view(*v, config.view.view_data());
            sector.register_view(*v, view_server, config.view.view_data())?;
        }

        let cells: Vec<_> = assignments.iter().map(|(coord, _)| *coord).collect();
        let mut watch_targets = Vec::new();
        for i in 0..config.demo.objects {
            let Some((coord, pos, velocity)) = config.demo.placement(i, &cells, config.zone.zone_size) else {
                break;
            };
            let owner = assignments
                .iter()
                .find(|(cell, _)| *cell == coord)
                .map(|(_, index)| *index as usize)
                .unwrap_or_default();
            let mut data = ObjectData::at(pos);
            data.orientation.velocity = velocity;

            let object = ObjectRef::new(i + 1);
            if let Some(node) = zones.get_mut(owner) {
                node.spawns.push(Spawn {
                    object,
                    zone: ZoneRef::new(sector_id, coord),
                    data,
                });
                watch_targets.push(object);
            }
        }

        info!(
            "🏗️ Cluster: {} with {} zone servers, {} zones, {} views, {} demo objects",
            sector.sector(),
            zones.len(),
            assignments.len(),
            views.len(),
            watch_targets.len()
        );

        Ok(Self {
            sector,
            sector_rx,
            zones,
            view,
            view_rx,
            views,
            watch_targets,
            watch_distance: config.view.max_watch_distance,
            flush_interval: Duration::from_millis(config.cluster.flush_interval_ms),
            report_interval: Duration::from_millis(config.cluster.report_interval_ms),
        })
    }

    /// Spawns one task per role plus the frame report. Tasks stop once
    /// `shutdown` is initiated.
    pub fn spawn(self, shutdown: &ShutdownState) -> RunningCluster {
        let frame_counters: Vec<_> = self.zones.iter().map(|node| node.frames.clone()).collect();

        let sector = tokio::spawn(run_sector(self.sector, self.sector_rx, shutdown.clone()));
        let zones = self
            .zones
            .into_iter()
            .enumerate()
            .map(|(index, node)| tokio::spawn(run_zone(index, node, shutdown.clone())))
            .collect();
        let view = tokio::spawn(run_view(
            ViewTask {
                server: self.view,
                rx: self.view_rx,
                views: self.views,
                watch_targets: self.watch_targets,
                watch_distance: self.watch_distance,
                flush_interval: self.flush_interval,
            },
            shutdown.clone(),
        ));
        let report = tokio::spawn(report_frames(
            frame_counters.clone(),
            self.report_interval,
            shutdown.clone(),
        ));

        RunningCluster {
            sector,
            zones,
            view,
            report,
            frame_counters,
        }
    }
}

/// Handles of the running role tasks.
pub struct RunningCluster {
    sector: JoinHandle<SectorServer>,
    zones: Vec<JoinHandle<ZoneServer>>,
    view: JoinHandle<ViewServer>,
    report: JoinHandle<()>,
    frame_counters: Vec<Arc<AtomicU64>>,
}

/// Servers handed back by their tasks after shutdown.
pub struct StoppedCluster {
    pub sector: SectorServer,
    pub zones: Vec<ZoneServer>,
    pub view: ViewServer,
}

impl RunningCluster {
    /// Frames run per zone server since the last report.
    pub fn frame_counters(&self) -> &[Arc<AtomicU64>] {
        &self.frame_counters
    }

    /// Waits for every task. Call after initiating shutdown.
    pub async fn join(self) -> Result<StoppedCluster, JoinError> {
        self.report.await?;
        let mut zones = Vec::with_capacity(self.zones.len());
        for handle in self.zones {
            zones.push(handle.await?);
        }
        let view = self.view.await?;
        let sector = self.sector.await?;
        Ok(StoppedCluster { sector, zones, view })
    }
}

async fn run_sector(
    mut sector: SectorServer,
    mut rx: UnboundedReceiver<SectorInbound>,
    shutdown: ShutdownState,
) -> SectorServer {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            message = rx.recv() => match message {
                Some(message) => message.dispatch(&mut sector),
                None => break,
            },
        }
    }
    info!("🛑 {} stopped with {} objects", sector.sector(), sector.object_count());
    sector
}

async fn run_zone(index: usize, mut node: ZoneNode, shutdown: ShutdownState) -> ZoneServer {
    // The sector's setup messages are already queued; apply them before
    // spawning into the zones they assign.
    while let Ok(message) = node.rx.try_recv() {
        message.dispatch(&mut node.server);
    }
    for spawn in node.spawns.drain(..) {
        if let Err(e) = node.server.spawn_object(spawn.object, spawn.zone, spawn.data) {
            warn!("Zone server {} could not spawn {}: {}", index, spawn.object, e);
        }
    }

    let mut next = node.server.time();
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            message = node.rx.recv() => match message {
                Some(message) => message.dispatch(&mut node.server),
                None => break,
            },
            _ = time::sleep_until(time::Instant::from_std(next)) => {
                let before = node.server.frames_run();
                next = node.server.run_frame();
                node.frames.fetch_add(node.server.frames_run() - before, Ordering::Relaxed);

                for failure in node.server.take_admission_failures() {
                    warn!(
                        "Zone server {} dropped {} for {}: {}",
                        index, failure.object, failure.zone, failure.error
                    );
                }
                next = next.min(Instant::now() + FRAME_GUARD);
            }
        }
    }
    info!(
        "🛑 Zone server {} stopped after {} frames with {} objects",
        index,
        node.server.frames_run(),
        node.server.object_count()
    );
    node.server
}

struct ViewTask {
    server: ViewServer,
    rx: UnboundedReceiver<ViewInbound>,
    views: Vec<ViewRef>,
    watch_targets: Vec<ObjectRef>,
    watch_distance: f32,
    flush_interval: Duration,
}

async fn run_view(mut task: ViewTask, shutdown: ShutdownState) -> ViewServer {
    let mut sink = JsonSink::default();
    let mut flush = time::interval(task.flush_interval);
    flush.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            message = task.rx.recv() => match message {
                Some(message) => message.dispatch(&mut task.server),
                None => break,
            },
            _ = flush.tick() => {
                watch_unseen(&mut task);
                let flushed = task.server.flush_batch(&mut sink);
                if flushed > 0 {
                    trace!("View server flushed {} deliveries", flushed);
                }
            }
        }
    }
    info!(
        "🛑 View server stopped after {} client frames ({} failed, {} superseded before delivery)",
        sink.rendered(),
        sink.failed(),
        task.server.queue().superseded()
    );
    task.server
}

/// Watches demo objects no update has arrived for yet. A watch sent before
/// the sector admitted the object is dropped on the way, so it is repeated.
fn watch_unseen(task: &mut ViewTask) {
    for object in &task.watch_targets {
        if task.server.replica(*object).is_some() {
            continue;
        }
        for view in &task.views {
            if let Err(e) = task.server.watch(*view, *object, task.watch_distance) {
                warn!("{} cannot watch {}: {}", view, object, e);
            }
        }
    }
}

async fn report_frames(counters: Vec<Arc<AtomicU64>>, interval: Duration, shutdown: ShutdownState) {
    let mut ticker = time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {
                for (index, counter) in counters.iter().enumerate() {
                    let frames = counter.swap(0, Ordering::Relaxed);
                    info!("📊 Zone server {}: {} frames", index, frames);
                }
            }
        }
    }
}
