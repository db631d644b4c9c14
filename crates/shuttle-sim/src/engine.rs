//! Rally engine: the headless core of the visualizer.
//!
//! `RallyEngine` owns the hecs world of actors and artifacts, the loop
//! scheduler and the rally in play. Every frame it processes queued
//! commands, runs the systems with the host's `dt` and returns a
//! `RallySnapshot`. Rendering happens behind the `SceneHost` trait, so the
//! whole engine runs in tests without a renderer.

use std::collections::{BTreeMap, VecDeque};

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use shuttle_core::commands::RallyCommand;
use shuttle_core::components::{Artifact, PreviewOrdinal};
use shuttle_core::config::{BaseFormation, PlayerProfile, RallyPlan, RallyPoint};
use shuttle_core::constants::*;
use shuttle_core::enums::*;
use shuttle_core::error::RallyError;
use shuttle_core::events::RallyEvent;
use shuttle_core::scene::{SceneHost, Visual};
use shuttle_core::state::RallySnapshot;
use shuttle_core::types::{ActorId, CourtPoint, FrameTime, Point3, RallyId};
use shuttle_kinematics::flight::{flight_duration, resolve_arc_height, FlightCurve};

use crate::artifacts;
use crate::roster;
use crate::scheduler::Scheduler;
use crate::sequencer::{self, notice, ActiveRally, FlightArtifacts, SegmentFlight};
use crate::systems;

/// Engine tuning. Every field has a default, so partial JSON files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Time the first hitter takes to reach the first rally point.
    pub approach_secs: f64,
    /// Time every actor takes to walk back to base after the last segment.
    pub return_secs: f64,
    /// Walking speed (m/s) when base positions change while idle.
    pub formation_speed: f64,
    /// Segments each flight curve is divided into.
    pub flight_path_samples: usize,
    /// Lifetime of a preview highlight.
    pub highlight_secs: f64,
    /// Flight-path visibility before any rally is played.
    pub show_flight_path: bool,
    pub formation: BaseFormation,
    pub players: Vec<PlayerProfile>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            approach_secs: HITTER_APPROACH_SECS,
            return_secs: RETURN_TO_BASE_SECS,
            formation_speed: DEFAULT_ACTOR_SPEED,
            flight_path_samples: FLIGHT_PATH_SAMPLES,
            highlight_secs: HIGHLIGHT_DURATION_SECS,
            show_flight_path: true,
            formation: BaseFormation::default(),
            players: vec![
                PlayerProfile { id: 1, gender: Gender::Male },
                PlayerProfile { id: 2, gender: Gender::Female },
                PlayerProfile { id: 3, gender: Gender::Male },
                PlayerProfile { id: 4, gender: Gender::Female },
            ],
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, RallyError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Callback fired exactly once per accepted `play`.
pub type FinishHandler = Box<dyn FnMut(RallyId, RallyOutcome)>;

/// The rally engine. Owns the world, the scene host and all rally state.
pub struct RallyEngine<S: SceneHost> {
    world: World,
    scene: S,
    config: EngineConfig,
    time: FrameTime,
    match_type: MatchType,
    phase: RallyPhase,
    scheduler: Scheduler,
    rally: Option<ActiveRally>,
    flight_artifacts: FlightArtifacts,
    show_flight_path: bool,
    highlight: Option<usize>,
    next_rally_id: RallyId,
    command_queue: VecDeque<RallyCommand>,
    despawn_buffer: Vec<Entity>,
    events: Vec<RallyEvent>,
    on_finished: Option<FinishHandler>,
}

impl<S: SceneHost> RallyEngine<S> {
    /// Create an engine with an empty roster (`MatchType::None`).
    pub fn new(scene: S, config: EngineConfig) -> Self {
        Self {
            world: World::new(),
            scene,
            show_flight_path: config.show_flight_path,
            config,
            time: FrameTime::default(),
            match_type: MatchType::None,
            phase: RallyPhase::Idle,
            scheduler: Scheduler::new(),
            rally: None,
            flight_artifacts: FlightArtifacts::default(),
            highlight: None,
            next_rally_id: 0,
            command_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
            events: Vec::new(),
            on_finished: None,
        }
    }

    /// Queue a command for processing at the next frame boundary.
    pub fn queue_command(&mut self, command: RallyCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = RallyCommand>) {
        self.command_queue.extend(commands);
    }

    /// Register the completion callback, replacing any previous one.
    pub fn on_rally_finished(&mut self, handler: impl FnMut(RallyId, RallyOutcome) + 'static) {
        self.on_finished = Some(Box::new(handler));
    }

    /// Advance one frame by `dt` seconds and return the resulting snapshot.
    /// Every system in the frame sees the same `dt`.
    pub fn tick(&mut self, dt: f64) -> RallySnapshot {
        self.process_commands();

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.time.advance(dt);
        self.run_systems(dt);

        let events = std::mem::take(&mut self.events);
        systems::snapshot::build_snapshot(
            &self.world,
            &self.time,
            self.phase,
            self.match_type,
            self.rally.as_ref(),
            &self.flight_artifacts,
            &self.scheduler,
            self.highlight,
            events,
        )
    }

    // ---- Roster ----

    /// Replace the roster for `match_type`. Any rally in progress is
    /// cancelled and every transient artifact released first.
    pub fn init_roster(&mut self, match_type: MatchType) {
        self.cleanup();
        roster::despawn_roster(&mut self.world, &mut self.scene);
        self.match_type = match_type;
        self.spawn_roster();
    }

    /// Merge new base positions for the current match type. While idle the
    /// actors walk there. While actors walk home they are redirected, and
    /// the rally completes once they reach the new positions. Earlier in a
    /// rally only the return targets change.
    pub fn update_base_positions(&mut self, positions: &BTreeMap<ActorId, CourtPoint>) {
        let skipped = positions.values().filter(|p| !p.is_finite()).count();
        if skipped > 0 {
            notice(
                &mut self.events,
                self.time.frame,
                NoticeLevel::Warning,
                format!("ignored {skipped} non-finite base position(s)"),
            );
        }
        let updated = self.config.formation.update(self.match_type, positions);
        if updated.is_empty() {
            return;
        }
        if self.phase == RallyPhase::ReturningToBase {
            for id in updated {
                let base = self.config.formation.position(self.match_type, id);
                if roster::move_actor(&mut self.world, id, base, self.config.formation_speed) {
                    if let Some(rally) = self.rally.as_mut() {
                        rally.pending_return.insert(id);
                    }
                }
            }
            return;
        }
        if self.phase.is_playing() {
            log::debug!("base positions {updated:?} updated during a rally");
            return;
        }

        let mut walking = false;
        for id in updated {
            let base = self.config.formation.position(self.match_type, id);
            walking |= roster::move_actor(&mut self.world, id, base, self.config.formation_speed);
        }
        if walking {
            self.scheduler.start(LoopKind::Formation, self.time.frame, None);
        }
    }

    // ---- Rally ----

    /// Start a rally, superseding any rally in progress.
    ///
    /// Plans with fewer than two points, non-finite coordinates, or a
    /// negative speed or arc height are rejected without touching the engine. Missing segment configs are
    /// reported and flown with defaults.
    pub fn play(&mut self, plan: RallyPlan) -> Result<RallyId, RallyError> {
        plan.validate()?;

        if self.rally.is_some() {
            roster::halt_all(&mut self.world);
            self.finish_rally(RallyOutcome::Superseded);
        }
        self.clear_preview();
        if self.scheduler.cancel(LoopKind::Formation).is_some() {
            roster::halt_all(&mut self.world);
        }

        self.next_rally_id += 1;
        let id = self.next_rally_id;
        let frame = self.time.frame;
        for index in plan.missing_segments() {
            notice(
                &mut self.events,
                frame,
                NoticeLevel::Warning,
                format!("rally {id}: segment {index} has no config, flying with defaults"),
            );
        }

        self.show_flight_path = plan.show_flight_path;
        let mut rally = ActiveRally::new(id, plan);
        rally.approach_hitter = sequencer::approach_moves(
            &mut self.world,
            &rally.plan,
            &self.config.formation,
            self.match_type,
            self.config.approach_secs,
            &mut self.events,
            frame,
        );

        log::info!("rally {id}: started with {} segments", rally.segment_count());
        self.events.push(RallyEvent::RallyStarted {
            rally_id: id,
            segment_count: rally.segment_count(),
        });
        self.rally = Some(rally);
        self.scheduler.start(LoopKind::Rally, frame, None);
        self.set_phase(RallyPhase::HitterApproach);
        Ok(id)
    }

    /// Stop the rally in progress and return to idle. A no-op when idle.
    pub fn cancel(&mut self) {
        if self.rally.is_none() {
            return;
        }
        roster::halt_all(&mut self.world);
        self.finish_rally(RallyOutcome::Canceled);
    }

    /// Show or hide the flight-path line. Hiding releases it at once;
    /// showing redraws it on the next frame.
    pub fn set_flight_path_visible(&mut self, visible: bool) {
        self.show_flight_path = visible;
        if !visible {
            self.flight_artifacts
                .release_path(&mut self.world, &mut self.scene);
            if let Some(flight) = self.rally.as_mut().and_then(|r| r.flight.as_mut()) {
                flight.drawn_samples = 0;
            }
        }
    }

    // ---- Preview ----

    /// Show a static marker and ordinal label for every point. Cancels any
    /// rally in progress; an empty list just clears the markers.
    pub fn preview_points(&mut self, points: &[RallyPoint]) {
        self.cancel();
        self.clear_preview();

        for (ordinal, point) in points.iter().enumerate() {
            let position = point.position;
            if !position.is_finite() {
                notice(
                    &mut self.events,
                    self.time.frame,
                    NoticeLevel::Warning,
                    format!("preview point {ordinal} ({}) is not finite", point.name),
                );
                continue;
            }
            let label_position = Point3::new(
                position.x + MARKER_LABEL_OFFSET,
                position.y + MARKER_LABEL_OFFSET,
                position.z,
            );
            let visuals = [
                (Visual::Marker { position, ordinal }, position),
                (
                    Visual::Label {
                        position: label_position,
                        text: (ordinal + 1).to_string(),
                    },
                    label_position,
                ),
            ];
            for (visual, at) in visuals {
                self.spawn_preview(&visual, at, ordinal);
            }
        }
    }

    /// Remove every preview marker, label and highlight.
    pub fn clear_preview(&mut self) {
        systems::cleanup::run(
            &mut self.world,
            &mut self.scene,
            &mut self.despawn_buffer,
            ArtifactKind::is_preview,
        );
        self.scheduler.cancel(LoopKind::Highlight);
        self.highlight = None;
    }

    /// Briefly decorate preview marker `index`. The decoration expires on
    /// its own timer. Returns `false` when no such marker exists.
    pub fn highlight_preview_point(&mut self, index: usize) -> bool {
        let marker = self
            .world
            .query::<(&Artifact, &PreviewOrdinal, &Point3)>()
            .iter()
            .find(|(_, (artifact, ordinal, _))| {
                artifact.kind == ArtifactKind::PreviewMarker && ordinal.0 == index
            })
            .map(|(_, (_, _, position))| *position);
        let Some(position) = marker else {
            notice(
                &mut self.events,
                self.time.frame,
                NoticeLevel::Warning,
                format!("no preview marker {index} to highlight"),
            );
            return false;
        };

        self.release_highlight();
        self.spawn_preview(&Visual::Highlight { position }, position, index);
        self.scheduler.start(
            LoopKind::Highlight,
            self.time.frame,
            Some(self.config.highlight_secs),
        );
        self.highlight = Some(index);
        true
    }

    // ---- Lifecycle ----

    /// Cancel the rally, stop every loop and release every transient
    /// artifact. Actors stay where they are.
    pub fn cleanup(&mut self) {
        self.cancel();
        self.flight_artifacts
            .release(&mut self.world, &mut self.scene);
        systems::cleanup::release_all(&mut self.world, &mut self.scene, &mut self.despawn_buffer);
        if self.scheduler.cancel(LoopKind::Formation).is_some() {
            roster::halt_all(&mut self.world);
        }
        self.scheduler.cancel_all();
        self.highlight = None;
    }

    /// Cleanup, then respawn the roster at the base formation.
    pub fn reset(&mut self) {
        self.init_roster(self.match_type);
    }

    /// Cleanup and release every actor. The engine can be reused with
    /// `init_roster`.
    pub fn dispose(&mut self) {
        self.cleanup();
        let released = roster::despawn_roster(&mut self.world, &mut self.scene);
        log::debug!("disposed {released} actors");
        self.match_type = MatchType::None;
    }

    // ---- Accessors ----

    pub fn phase(&self) -> RallyPhase {
        self.phase
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    pub fn time(&self) -> FrameTime {
        self.time
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Id of the rally in progress.
    pub fn active_rally(&self) -> Option<RallyId> {
        self.rally.as_ref().map(|r| r.id)
    }

    pub fn is_loop_active(&self, kind: LoopKind) -> bool {
        self.scheduler.is_active(kind)
    }

    pub fn show_flight_path(&self) -> bool {
        self.show_flight_path
    }

    /// Number of live transient artifacts.
    pub fn artifact_count(&self) -> usize {
        artifacts::count(&self.world)
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    // ---- Frame ----

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single command.
    fn handle_command(&mut self, command: RallyCommand) {
        match command {
            RallyCommand::InitRoster { match_type } => self.init_roster(match_type),
            RallyCommand::Play { plan } => {
                if let Err(err) = self.play(plan) {
                    notice(
                        &mut self.events,
                        self.time.frame,
                        NoticeLevel::Warning,
                        format!("play rejected: {err}"),
                    );
                }
            }
            RallyCommand::Cancel => self.cancel(),
            RallyCommand::PreviewPoints { points } => self.preview_points(&points),
            RallyCommand::ClearPreview => self.clear_preview(),
            RallyCommand::HighlightPreviewPoint { index } => {
                self.highlight_preview_point(index);
            }
            RallyCommand::UpdateBasePositions { positions } => {
                self.update_base_positions(&positions)
            }
            RallyCommand::SetFlightPathVisible { visible } => self.set_flight_path_visible(visible),
            RallyCommand::Cleanup => self.cleanup(),
            RallyCommand::Reset => self.reset(),
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f64) {
        // 1. Timed loops
        for expired in self.scheduler.advance(dt) {
            if expired.kind == LoopKind::Highlight {
                self.release_highlight();
                self.highlight = None;
            }
        }
        // 2. Actor motion
        systems::motion::run(&mut self.world, &mut self.scene, dt);
        // 3. Hitter approach and shuttle flight
        if self.scheduler.is_active(LoopKind::Rally) {
            self.advance_rally(dt);
        }
        // 4. Walk back to base
        if self.scheduler.is_active(LoopKind::ReturnToBase) {
            self.advance_return();
        }
        // 5. Formation walk
        if self.scheduler.is_active(LoopKind::Formation) && roster::all_idle(&self.world) {
            self.scheduler.cancel(LoopKind::Formation);
        }
    }

    fn advance_rally(&mut self, dt: f64) {
        match self.phase {
            RallyPhase::HitterApproach => {
                let waiting = self
                    .rally
                    .as_ref()
                    .and_then(|r| r.approach_hitter)
                    .is_some_and(|hitter| roster::is_moving(&self.world, hitter));
                if !waiting {
                    self.begin_segment(0);
                }
            }
            RallyPhase::FlightInProgress => {
                let Some(flight) = self.rally.as_mut().and_then(|r| r.flight.as_mut()) else {
                    return;
                };
                let landed = systems::flight::run(
                    &mut self.world,
                    &mut self.scene,
                    flight,
                    &mut self.flight_artifacts,
                    self.show_flight_path,
                    dt,
                );
                if landed {
                    self.complete_segment();
                }
            }
            RallyPhase::Idle | RallyPhase::ReturningToBase => {}
        }
    }

    /// Put the shuttle on segment `index` and issue the moves that run
    /// alongside its flight.
    fn begin_segment(&mut self, index: usize) {
        let frame = self.time.frame;
        let Some(rally) = self.rally.as_mut() else {
            return;
        };
        let Some((start, end)) = rally.endpoints(index) else {
            return;
        };

        self.flight_artifacts
            .release(&mut self.world, &mut self.scene);

        let configured = rally.plan.segment(index).cloned();
        let config = configured.clone().unwrap_or_default();

        let resolution = resolve_arc_height(&start, &end, config.arc_height);
        if resolution.exhausted {
            let height_at_net = resolution.height_at_net.unwrap_or(start.y);
            notice(
                &mut self.events,
                frame,
                NoticeLevel::Warning,
                format!(
                    "rally {}: segment {index} cannot clear the net, flying at arc {:.2} ({height_at_net:.2} m over the net)",
                    rally.id, resolution.arc_height
                ),
            );
            self.events.push(RallyEvent::NetClearanceExhausted {
                rally_id: rally.id,
                index,
                arc_height: resolution.arc_height,
                height_at_net,
            });
        } else if resolution.adjusted {
            log::debug!(
                "rally {}: segment {index} arc raised {} -> {:.2}",
                rally.id,
                config.arc_height,
                resolution.arc_height
            );
        }

        let curve = FlightCurve::new(
            start,
            end,
            resolution.arc_height,
            self.config.flight_path_samples,
        );
        let duration_secs = flight_duration(&start, &end, config.speed);

        if let Some(segment) = configured.as_ref() {
            sequencer::segment_moves(
                &mut self.world,
                index,
                segment,
                &self.config.formation,
                self.match_type,
                duration_secs,
                &mut self.events,
                frame,
            );
        }
        sequencer::next_hitter_move(&mut self.world, &rally.plan, index, duration_secs);

        self.flight_artifacts.shuttle = artifacts::spawn_artifact(
            &mut self.world,
            &mut self.scene,
            &Visual::Shuttlecock { position: start },
            start,
        );
        if let Some(shuttle) = self.flight_artifacts.shuttle {
            artifacts::place(
                &mut self.world,
                &mut self.scene,
                shuttle,
                start,
                curve.direction_at(0.0),
            );
        }

        log::debug!(
            "rally {}: segment {index} over {duration_secs:.2}s at arc {:.2}",
            rally.id,
            resolution.arc_height
        );
        self.events.push(RallyEvent::SegmentStarted {
            rally_id: rally.id,
            index,
            duration_secs,
            arc_height: resolution.arc_height,
        });
        rally.segment_index = index;
        rally.flight = Some(SegmentFlight::new(curve, resolution, duration_secs));
        self.set_phase(RallyPhase::FlightInProgress);
    }

    fn complete_segment(&mut self) {
        let Some(rally) = self.rally.as_mut() else {
            return;
        };
        let index = rally.segment_index;
        let rally_id = rally.id;
        let has_next = index + 1 < rally.segment_count();
        rally.flight = None;

        self.flight_artifacts
            .release(&mut self.world, &mut self.scene);
        self.events.push(RallyEvent::SegmentCompleted { rally_id, index });

        if has_next {
            self.begin_segment(index + 1);
        } else {
            self.begin_return();
        }
    }

    fn begin_return(&mut self) {
        let frame = self.time.frame;
        self.scheduler.cancel(LoopKind::Rally);
        let handle = self.scheduler.start(LoopKind::ReturnToBase, frame, None);
        let pending = sequencer::return_moves(
            &mut self.world,
            &self.config.formation,
            self.match_type,
            self.config.return_secs,
        );
        if let Some(rally) = self.rally.as_mut() {
            rally.pending_return = pending;
            rally.return_loop = Some(handle.id);
        }
        self.set_phase(RallyPhase::ReturningToBase);
    }

    fn advance_return(&mut self) {
        let Some(rally) = self.rally.as_mut() else {
            self.scheduler.cancel(LoopKind::ReturnToBase);
            return;
        };
        let world = &self.world;
        rally
            .pending_return
            .retain(|&id| roster::is_moving(world, id));
        if !rally.pending_return.is_empty() {
            return;
        }
        if let Some(id) = rally.return_loop {
            self.scheduler.finish(LoopKind::ReturnToBase, id);
        }
        self.finish_rally(RallyOutcome::Completed);
    }

    /// Terminal transition: stop the rally's loops, release its artifacts,
    /// go idle and notify. Fires exactly once per rally.
    fn finish_rally(&mut self, outcome: RallyOutcome) {
        let Some(rally) = self.rally.take() else {
            return;
        };
        self.scheduler.cancel(LoopKind::Rally);
        self.scheduler.cancel(LoopKind::ReturnToBase);
        self.flight_artifacts
            .release(&mut self.world, &mut self.scene);
        self.set_phase(RallyPhase::Idle);

        log::info!("rally {}: {outcome:?}", rally.id);
        self.events.push(RallyEvent::RallyFinished {
            rally_id: rally.id,
            outcome,
        });
        if let Some(handler) = self.on_finished.as_mut() {
            handler(rally.id, outcome);
        }
    }

    fn set_phase(&mut self, to: RallyPhase) {
        if self.phase == to {
            return;
        }
        log::debug!("phase {:?} -> {to:?}", self.phase);
        self.events.push(RallyEvent::PhaseChanged {
            from: self.phase,
            to,
        });
        self.phase = to;
    }

    fn spawn_roster(&mut self) {
        let actors = roster::spawn_roster(
            &mut self.world,
            &mut self.scene,
            self.match_type,
            &self.config.formation,
            &self.config.players,
        );
        log::info!("roster for {:?}: {actors:?}", self.match_type);
        self.events.push(RallyEvent::RosterChanged {
            match_type: self.match_type,
            actors,
        });
    }

    fn spawn_preview(&mut self, visual: &Visual, position: Point3, ordinal: usize) {
        if let Some(entity) =
            artifacts::spawn_artifact(&mut self.world, &mut self.scene, visual, position)
        {
            let _ = self.world.insert_one(entity, PreviewOrdinal(ordinal));
        }
    }

    fn release_highlight(&mut self) {
        systems::cleanup::run(
            &mut self.world,
            &mut self.scene,
            &mut self.despawn_buffer,
            |kind| kind == ArtifactKind::Highlight,
        );
    }
}

impl<S: SceneHost> Drop for RallyEngine<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
