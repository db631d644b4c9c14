//! Tests for the rally engine: sequencing, cancellation, artifact lifecycle,
//! preview mode and the loop scheduler.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use shuttle_core::commands::RallyCommand;
use shuttle_core::config::{BaseFormation, RallyPlan, RallyPoint, SegmentConfig};
use shuttle_core::constants::*;
use shuttle_core::enums::*;
use shuttle_core::error::RallyError;
use shuttle_core::events::RallyEvent;
use shuttle_core::scene::Visual;
use shuttle_core::state::RallySnapshot;
use shuttle_core::types::{ActorId, CourtPoint, Point3};

use crate::engine::{EngineConfig, RallyEngine};
use crate::headless::HeadlessScene;
use crate::scheduler::Scheduler;

type Engine = RallyEngine<HeadlessScene>;

// ---- Helpers ----

fn engine_for(match_type: MatchType) -> Engine {
    let mut engine = RallyEngine::new(HeadlessScene::new(), EngineConfig::default());
    engine.init_roster(match_type);
    // Flush roster events so each test starts with an empty event stream.
    engine.tick(0.0);
    engine
}

fn base(id: ActorId) -> CourtPoint {
    BaseFormation::default()
        .position(MatchType::Doubles, id)
        .unwrap()
}

/// Alternating near/far points 6 m apart, one hitter per segment.
/// Each segment takes 1 s at 6 m/s.
fn cross_court_plan(hitters: &[ActorId]) -> RallyPlan {
    let points = (0..=hitters.len())
        .map(|i| {
            let z = if i % 2 == 0 { -3.0 } else { 3.0 };
            RallyPoint::new(format!("P{}", i + 1), Point3::new(1.0, 1.7, z))
        })
        .collect();
    let segments = hitters
        .iter()
        .enumerate()
        .map(|(i, &hitter)| {
            (
                i,
                SegmentConfig {
                    speed: 6.0,
                    hitter_id: Some(hitter),
                    hitter_return_point: Some(base(hitter)),
                    ..Default::default()
                },
            )
        })
        .collect();
    RallyPlan::new(points, segments, true)
}

fn tick_until_phase(engine: &mut Engine, phase: RallyPhase, max_frames: usize) -> RallySnapshot {
    for _ in 0..max_frames {
        let snapshot = engine.tick(FRAME_DT);
        if snapshot.phase == phase {
            return snapshot;
        }
    }
    panic!("engine never reached {phase:?} within {max_frames} frames");
}

/// Tick until the rally in progress has finished. Returns every snapshot.
fn run_to_idle(engine: &mut Engine, max_frames: usize) -> Vec<RallySnapshot> {
    let mut snapshots = Vec::new();
    for _ in 0..max_frames {
        let snapshot = engine.tick(FRAME_DT);
        let done = snapshot.phase == RallyPhase::Idle && engine.active_rally().is_none();
        snapshots.push(snapshot);
        if done {
            return snapshots;
        }
    }
    panic!("rally did not finish within {max_frames} frames");
}

fn events_of(snapshots: &[RallySnapshot]) -> Vec<RallyEvent> {
    snapshots.iter().flat_map(|s| s.events.clone()).collect()
}

fn finished(events: &[RallyEvent]) -> Vec<RallyOutcome> {
    events
        .iter()
        .filter_map(|e| match e {
            RallyEvent::RallyFinished { outcome, .. } => Some(*outcome),
            _ => None,
        })
        .collect()
}

fn actor_at(snapshot: &RallySnapshot, id: ActorId) -> Point3 {
    snapshot
        .actors
        .iter()
        .find(|a| a.id == id)
        .map(|a| a.position)
        .unwrap()
}

fn flight_artifacts_live(engine: &Engine) -> (usize, usize) {
    (
        engine.scene().live_of_kind(ArtifactKind::Shuttlecock),
        engine.scene().live_of_kind(ArtifactKind::FlightPath),
    )
}

// ---- Sequencing ----

#[test]
fn test_rally_emits_segment_events_and_one_finish() {
    let mut engine = engine_for(MatchType::Doubles);
    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&outcomes);
    engine.on_rally_finished(move |id, outcome| sink.borrow_mut().push((id, outcome)));

    let id = engine.play(cross_court_plan(&[1, 2, 3])).unwrap();
    let events = events_of(&run_to_idle(&mut engine, 2000));

    let completed: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            RallyEvent::SegmentCompleted { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(completed, vec![0, 1, 2], "4 points must produce 3 segment transitions");
    assert_eq!(finished(&events), vec![RallyOutcome::Completed]);
    assert_eq!(*outcomes.borrow(), vec![(id, RallyOutcome::Completed)]);
    assert_eq!(engine.phase(), RallyPhase::Idle);
}

#[test]
fn test_phase_sequence() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1, 2])).unwrap();
    let events = events_of(&run_to_idle(&mut engine, 2000));

    let phases: Vec<RallyPhase> = events
        .iter()
        .filter_map(|e| match e {
            RallyEvent::PhaseChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            RallyPhase::HitterApproach,
            RallyPhase::FlightInProgress,
            RallyPhase::ReturningToBase,
            RallyPhase::Idle,
        ]
    );
}

#[test]
fn test_shuttle_appears_only_after_hitter_arrives() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1, 2])).unwrap();

    let mut approach_frames = 0;
    loop {
        let snapshot = engine.tick(FRAME_DT);
        if snapshot.phase == RallyPhase::HitterApproach {
            assert!(snapshot.shuttle.is_none(), "no shuttle before the hitter arrives");
            approach_frames += 1;
            assert!(approach_frames < 200, "approach never finished");
            continue;
        }

        assert_eq!(snapshot.phase, RallyPhase::FlightInProgress);
        let hitter = actor_at(&snapshot, 1);
        assert!(
            hitter.court_point().distance_to(&CourtPoint::new(1.0, -3.0)) < 1e-9,
            "hitter must stand on the first point when the flight starts, was at {hitter:?}"
        );
        let shuttle = snapshot.shuttle.expect("shuttle must exist once flying");
        assert_eq!(shuttle.position, Point3::new(1.0, 1.7, -3.0));
        break;
    }
    // 1.118 m at 1.118 m/s takes about a second.
    assert!((55..=65).contains(&approach_frames), "approach took {approach_frames} frames");
}

#[test]
fn test_actors_return_to_base_after_rally() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1, 2, 3, 4])).unwrap();
    let snapshots = run_to_idle(&mut engine, 3000);
    let last = snapshots.last().unwrap();

    for id in 1..=4 {
        let position = actor_at(last, id);
        assert!(
            position.court_point().distance_to(&base(id)) < 1e-9,
            "actor {id} not back at base: {position:?}"
        );
    }
    assert!(last.actors.iter().all(|a| !a.is_moving));
    assert!(last.active_loops.is_empty(), "loops left: {:?}", last.active_loops);
}

#[test]
fn test_next_hitter_runs_to_landing_point() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1, 2])).unwrap();
    tick_until_phase(&mut engine, RallyPhase::FlightInProgress, 200);

    let mut landing_snapshot = None;
    for _ in 0..200 {
        let snapshot = engine.tick(FRAME_DT);
        let landed = snapshot
            .events
            .iter()
            .any(|e| matches!(e, RallyEvent::SegmentCompleted { index: 0, .. }));
        if landed {
            landing_snapshot = Some(snapshot);
            break;
        }
    }
    let snapshot = landing_snapshot.expect("segment 0 never completed");
    let receiver = actor_at(&snapshot, 2);
    assert!(
        receiver.court_point().distance_to(&CourtPoint::new(1.0, 3.0)) < 0.05,
        "actor 2 should meet the shuttle at the landing point, was at {receiver:?}"
    );
}

#[test]
fn test_next_hitter_runs_even_when_current_segment_has_no_config() {
    let mut engine = engine_for(MatchType::Doubles);
    let mut plan = cross_court_plan(&[1, 2, 3]);
    plan.segments.remove(&0);
    engine.play(plan).unwrap();

    let mut receiver = None;
    for _ in 0..400 {
        let snapshot = engine.tick(FRAME_DT);
        let landed = snapshot
            .events
            .iter()
            .any(|e| matches!(e, RallyEvent::SegmentCompleted { index: 0, .. }));
        if landed {
            receiver = Some(actor_at(&snapshot, 2));
            break;
        }
    }
    let receiver = receiver.expect("segment 0 never completed");
    assert!(
        receiver.court_point().distance_to(&CourtPoint::new(1.0, 3.0)) < 0.05,
        "actor 2 must be at the start of segment 1, was at {receiver:?}"
    );
    assert_ne!(receiver.court_point(), base(2));
}

#[test]
fn test_doubles_partner_without_points_stays_put() {
    let mut engine = engine_for(MatchType::Doubles);
    let start = actor_at(&engine.tick(0.0), 3);

    engine.play(cross_court_plan(&[1])).unwrap();
    for _ in 0..400 {
        let snapshot = engine.tick(FRAME_DT);
        if matches!(snapshot.phase, RallyPhase::ReturningToBase | RallyPhase::Idle) {
            break;
        }
        let partner = snapshot.actors.iter().find(|a| a.id == 3).unwrap();
        assert_eq!(partner.position, start, "partner without stand point must not move");
        assert!(!partner.is_moving);
    }
}

#[test]
fn test_partner_uses_stand_then_return_point() {
    let mut engine = engine_for(MatchType::Doubles);
    let mut plan = cross_court_plan(&[1]);
    let stand = CourtPoint::new(-1.0, -2.5);
    let recover = CourtPoint::new(-2.0, -3.5);
    if let Some(segment) = plan.segments.get_mut(&0) {
        segment.partner_stand_point = Some(stand);
        segment.partner_return_point = Some(recover);
    }
    engine.play(plan).unwrap();

    let at_strike = tick_until_phase(&mut engine, RallyPhase::FlightInProgress, 200);
    let partner = actor_at(&at_strike, 3).court_point();
    assert!(partner.distance_to(&stand) < 0.05, "partner at {partner:?}, expected stand point");

    let after_flight = tick_until_phase(&mut engine, RallyPhase::ReturningToBase, 200);
    let partner = actor_at(&after_flight, 3).court_point();
    assert!(partner.distance_to(&recover) < 0.05, "partner at {partner:?}, expected return point");
}

#[test]
fn test_shuttle_clears_net_during_flight() {
    let mut engine = engine_for(MatchType::None);
    let plan = RallyPlan::new(
        vec![
            RallyPoint::new("serve", Point3::new(-1.0, 1.6, -4.0)),
            RallyPoint::new("land", Point3::new(1.0, 1.7, 4.0)),
        ],
        BTreeMap::from([(0, SegmentConfig::default())]),
        true,
    );
    engine.play(plan).unwrap();

    let mut near_net = 0;
    for _ in 0..1000 {
        let snapshot = engine.tick(FRAME_DT);
        if snapshot.phase == RallyPhase::Idle && engine.active_rally().is_none() {
            break;
        }
        let Some(shuttle) = snapshot.shuttle else {
            continue;
        };
        assert!(shuttle.position.is_finite());
        if shuttle.position.z.abs() < 0.2 {
            near_net += 1;
            assert!(
                shuttle.position.y >= NET_HEIGHT + MIN_NET_CLEARANCE,
                "shuttle at {:?} is too low over the net",
                shuttle.position
            );
            assert!(shuttle.direction.z > 0.0, "shuttle must face its travel");
            let placed = engine
                .scene()
                .placements()
                .find(|(visual, _)| matches!(visual, Visual::Shuttlecock { .. }))
                .map(|(_, placement)| placement)
                .expect("shuttle placement forwarded to the scene");
            assert_eq!(placed.position, shuttle.position);
            assert!(placed.facing.is_some_and(|f| f.z > 0.0));
        }
    }
    assert!(near_net > 0, "shuttle never sampled near the net");
}

#[test]
fn test_unclearable_segment_warns_and_still_flies() {
    let mut engine = engine_for(MatchType::None);
    let plan = RallyPlan::new(
        vec![
            RallyPoint::new("a", Point3::new(0.0, 0.2, -0.2)),
            RallyPoint::new("b", Point3::new(0.0, 0.2, 0.2)),
        ],
        BTreeMap::from([(0, SegmentConfig::default())]),
        false,
    );
    engine.play(plan).unwrap();
    let events = events_of(&run_to_idle(&mut engine, 500));

    assert!(events.iter().any(|e| matches!(
        e,
        RallyEvent::NetClearanceExhausted { arc_height, .. } if *arc_height == ARC_HEIGHT_CEILING
    )));
    assert_eq!(finished(&events), vec![RallyOutcome::Completed]);
}

#[test]
fn test_missing_segment_configs_still_complete() {
    let mut engine = engine_for(MatchType::Doubles);
    let mut plan = cross_court_plan(&[1, 2]);
    plan.segments.clear();
    engine.play(plan).unwrap();

    let snapshots = run_to_idle(&mut engine, 1000);
    let events = events_of(&snapshots);
    let warnings = events
        .iter()
        .filter(|e| matches!(e, RallyEvent::Notice { level: NoticeLevel::Warning, .. }))
        .count();
    assert!(warnings >= 2, "each missing config should be reported");
    assert_eq!(finished(&events), vec![RallyOutcome::Completed]);

    for snapshot in &snapshots {
        if snapshot.phase == RallyPhase::FlightInProgress {
            assert!(
                snapshot.actors.iter().all(|a| !a.is_moving),
                "no choreography without configs"
            );
        }
    }
}

#[test]
fn test_zero_distance_segment_is_instantaneous() {
    let mut engine = engine_for(MatchType::Singles);
    let spot = Point3::new(0.0, 1.7, -2.0);
    let plan = RallyPlan::new(
        vec![RallyPoint::new("a", spot), RallyPoint::new("b", spot)],
        BTreeMap::from([(0, SegmentConfig::default())]),
        true,
    );
    engine.play(plan).unwrap();
    let events = events_of(&run_to_idle(&mut engine, 500));

    let durations: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            RallyEvent::SegmentStarted { duration_secs, .. } => Some(*duration_secs),
            _ => None,
        })
        .collect();
    assert_eq!(durations, vec![0.0]);
    assert_eq!(finished(&events), vec![RallyOutcome::Completed]);
}

#[test]
fn test_rejects_single_point_plan() {
    let mut engine = engine_for(MatchType::Doubles);
    let plan = RallyPlan::new(
        vec![RallyPoint::new("only", Point3::new(0.0, 1.7, -3.0))],
        BTreeMap::new(),
        true,
    );
    let err = engine.play(plan).unwrap_err();
    assert!(matches!(err, RallyError::TooFewPoints { count: 1 }));
    assert_eq!(engine.phase(), RallyPhase::Idle);
    assert!(engine.active_rally().is_none());

    let snapshot = engine.tick(FRAME_DT);
    assert!(snapshot.events.is_empty(), "a rejected plan must not notify");
}

// ---- Cancellation & supersession ----

#[test]
fn test_double_play_keeps_single_flight_pair() {
    let mut engine = engine_for(MatchType::Doubles);
    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&outcomes);
    engine.on_rally_finished(move |id, outcome| sink.borrow_mut().push((id, outcome)));

    let first = engine.play(cross_court_plan(&[1, 2])).unwrap();
    tick_until_phase(&mut engine, RallyPhase::FlightInProgress, 200);
    for _ in 0..10 {
        engine.tick(FRAME_DT);
    }
    assert_eq!(flight_artifacts_live(&engine), (1, 1));

    let second = engine.play(cross_court_plan(&[1, 2])).unwrap();
    assert_eq!(engine.artifact_count(), 0, "superseded flight must be released");
    assert_eq!(flight_artifacts_live(&engine), (0, 0));
    assert_eq!(*outcomes.borrow(), vec![(first, RallyOutcome::Superseded)]);

    for snapshot in run_to_idle(&mut engine, 2000) {
        let (shuttles, paths) = flight_artifacts_live(&engine);
        assert!(shuttles <= 1 && paths <= 1, "at most one flight pair");
        assert!(snapshot.artifact_count <= 2);
    }
    assert_eq!(
        *outcomes.borrow(),
        vec![
            (first, RallyOutcome::Superseded),
            (second, RallyOutcome::Completed)
        ]
    );
}

#[test]
fn test_cancel_mid_flight_releases_everything() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1, 2])).unwrap();
    tick_until_phase(&mut engine, RallyPhase::FlightInProgress, 200);
    engine.tick(FRAME_DT);

    engine.cancel();
    assert_eq!(engine.phase(), RallyPhase::Idle);
    assert_eq!(engine.artifact_count(), 0);
    assert_eq!(flight_artifacts_live(&engine), (0, 0));
    assert!(!engine.is_loop_active(LoopKind::Rally));
    assert!(!engine.is_loop_active(LoopKind::ReturnToBase));

    let snapshot = engine.tick(FRAME_DT);
    assert_eq!(finished(&snapshot.events), vec![RallyOutcome::Canceled]);
    assert!(snapshot.actors.iter().all(|a| !a.is_moving), "cancel halts actors");

    let frozen = snapshot.actors.clone();
    let later = engine.tick(FRAME_DT);
    for (before, after) in frozen.iter().zip(&later.actors) {
        assert_eq!(before.position, after.position);
    }

    engine.cancel();
    assert!(engine.tick(FRAME_DT).events.is_empty(), "second cancel is a no-op");
}

#[test]
fn test_match_type_change_cancels_rally() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1, 2])).unwrap();
    tick_until_phase(&mut engine, RallyPhase::FlightInProgress, 200);

    engine.init_roster(MatchType::Singles);
    assert_eq!(engine.phase(), RallyPhase::Idle);
    assert_eq!(engine.artifact_count(), 0);
    assert_eq!(engine.scene().live_actors(), 2);

    let snapshot = engine.tick(FRAME_DT);
    assert_eq!(finished(&snapshot.events), vec![RallyOutcome::Canceled]);
    assert_eq!(snapshot.actors.len(), 2);
    assert!(snapshot.events.iter().any(|e| matches!(
        e,
        RallyEvent::RosterChanged { match_type: MatchType::Singles, actors } if actors == &vec![1, 2]
    )));
}

#[test]
fn test_cleanup_postcondition() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1, 2])).unwrap();
    tick_until_phase(&mut engine, RallyPhase::FlightInProgress, 200);
    engine.tick(FRAME_DT);

    engine.cleanup();
    let snapshot = engine.tick(FRAME_DT);
    assert_eq!(snapshot.artifact_count, 0);
    assert!(snapshot.active_loops.is_empty());
    assert!(snapshot.shuttle.is_none() && snapshot.flight_path.is_empty());
    assert_eq!(snapshot.actors.len(), 4, "cleanup keeps the roster");
    assert_eq!(engine.scene().live_count(), 4);
    assert_eq!(engine.scene().attached_count(), 4);

    engine.preview_points(&cross_court_plan(&[1, 2]).points);
    assert!(engine.highlight_preview_point(0));
    engine.cleanup();
    assert_eq!(engine.artifact_count(), 0);
    assert!(!engine.is_loop_active(LoopKind::Highlight));

    engine.cleanup();
    assert_eq!(engine.scene().live_count(), 4, "cleanup twice is harmless");
}

#[test]
fn test_reset_and_dispose() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1, 2])).unwrap();
    tick_until_phase(&mut engine, RallyPhase::FlightInProgress, 200);
    for _ in 0..20 {
        engine.tick(FRAME_DT);
    }

    engine.reset();
    let snapshot = engine.tick(FRAME_DT);
    assert_eq!(finished(&snapshot.events), vec![RallyOutcome::Canceled]);
    for id in 1..=4 {
        assert_eq!(actor_at(&snapshot, id).court_point(), base(id));
    }

    engine.dispose();
    assert_eq!(engine.scene().live_count(), 0);
    assert_eq!(engine.scene().created_total(), engine.scene().disposed_total());
    engine.dispose();
    assert_eq!(engine.match_type(), MatchType::None);
}

// ---- Preview ----

#[test]
fn test_preview_markers_and_labels() {
    let mut engine = engine_for(MatchType::Singles);
    let points = cross_court_plan(&[1, 2]).points;
    engine.preview_points(&points);

    let snapshot = engine.tick(FRAME_DT);
    assert_eq!(snapshot.artifact_count, 6, "marker and label per point");
    let ordinals: Vec<usize> = snapshot.preview.iter().map(|m| m.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2]);

    let mut labels: Vec<(String, Point3)> = engine
        .scene()
        .visuals()
        .filter_map(|v| match v {
            Visual::Label { text, position } => Some((text.clone(), *position)),
            _ => None,
        })
        .collect();
    labels.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(labels.len(), 3);
    assert_eq!(labels[0].0, "1");
    assert_eq!(labels[2].0, "3");
    assert!((labels[0].1.x - (1.0 + MARKER_LABEL_OFFSET)).abs() < 1e-12);
    assert!((labels[0].1.y - (1.7 + MARKER_LABEL_OFFSET)).abs() < 1e-12);

    engine.preview_points(&[]);
    assert_eq!(engine.artifact_count(), 0, "empty preview clears markers");
}

#[test]
fn test_preview_cancels_playback() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1, 2])).unwrap();
    tick_until_phase(&mut engine, RallyPhase::FlightInProgress, 200);

    let points = cross_court_plan(&[1]).points;
    engine.preview_points(&points);
    assert_eq!(engine.phase(), RallyPhase::Idle);
    assert_eq!(engine.artifact_count(), 4);
    assert_eq!(flight_artifacts_live(&engine), (0, 0));

    let snapshot = engine.tick(FRAME_DT);
    assert_eq!(finished(&snapshot.events), vec![RallyOutcome::Canceled]);
}

#[test]
fn test_play_clears_preview() {
    let mut engine = engine_for(MatchType::Doubles);
    let plan = cross_court_plan(&[1, 2]);
    engine.preview_points(&plan.points);
    assert!(engine.highlight_preview_point(2));

    engine.play(plan).unwrap();
    assert_eq!(engine.artifact_count(), 0);
    assert!(!engine.is_loop_active(LoopKind::Highlight));
    assert!(engine.tick(FRAME_DT).preview.is_empty());
}

#[test]
fn test_highlight_outlives_formation_loop() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.preview_points(&cross_court_plan(&[1]).points);
    assert!(engine.highlight_preview_point(1));
    assert!(!engine.highlight_preview_point(7), "unknown marker");

    engine.update_base_positions(&BTreeMap::from([(1, CourtPoint::new(1.6, -4.0))]));
    assert!(engine.is_loop_active(LoopKind::Formation));

    for _ in 0..5 {
        engine.tick(FRAME_DT);
    }
    assert!(!engine.is_loop_active(LoopKind::Formation), "formation walk should be done");
    assert!(
        engine.is_loop_active(LoopKind::Highlight),
        "ending one loop must not cancel another"
    );
    assert_eq!(engine.scene().live_of_kind(ArtifactKind::Highlight), 1);

    let frames = (HIGHLIGHT_DURATION_SECS * FRAME_RATE as f64) as usize + 5;
    let mut snapshot = engine.tick(FRAME_DT);
    for _ in 0..frames {
        snapshot = engine.tick(FRAME_DT);
    }
    assert!(!engine.is_loop_active(LoopKind::Highlight));
    assert!(snapshot.highlight.is_none());
    assert_eq!(engine.scene().live_of_kind(ArtifactKind::Highlight), 0);
    assert_eq!(snapshot.preview.len(), 2, "markers survive the highlight");
}

// ---- Base positions ----

#[test]
fn test_formation_walk_when_idle() {
    let mut engine = engine_for(MatchType::Doubles);
    let target = CourtPoint::new(0.5, 5.0);
    engine.update_base_positions(&BTreeMap::from([(2, target)]));
    assert!(engine.is_loop_active(LoopKind::Formation));

    let mut snapshot = engine.tick(FRAME_DT);
    assert!(snapshot.actors.iter().any(|a| a.id == 2 && a.is_moving));
    for _ in 0..120 {
        snapshot = engine.tick(FRAME_DT);
    }
    assert_eq!(actor_at(&snapshot, 2).court_point(), target);
    assert!(!engine.is_loop_active(LoopKind::Formation));
}

#[test]
fn test_base_update_during_rally_only_changes_return_target() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1])).unwrap();
    let moved_base = CourtPoint::new(-2.0, -5.0);
    engine.update_base_positions(&BTreeMap::from([(3, moved_base)]));
    assert!(!engine.is_loop_active(LoopKind::Formation));

    let snapshot = engine.tick(FRAME_DT);
    assert!(snapshot.actors.iter().any(|a| a.id == 3 && !a.is_moving));

    let last = run_to_idle(&mut engine, 1000).pop().unwrap();
    assert!(actor_at(&last, 3).court_point().distance_to(&moved_base) < 1e-9);
}

#[test]
fn test_base_update_while_returning_redirects_actors() {
    let mut engine = engine_for(MatchType::Doubles);
    let mut plan = cross_court_plan(&[1]);
    // Hitter 1 stays at the strike point, so it is still walking home below.
    plan.segments.get_mut(&0).unwrap().hitter_return_point = None;
    engine.play(plan).unwrap();
    tick_until_phase(&mut engine, RallyPhase::ReturningToBase, 1000);

    // Late in the 2 s return, so the rally has to wait for the new walk.
    for _ in 0..110 {
        engine.tick(FRAME_DT);
    }
    assert_eq!(engine.phase(), RallyPhase::ReturningToBase);

    let moved_base = CourtPoint::new(-2.0, 5.5);
    engine.update_base_positions(&BTreeMap::from([(4, moved_base)]));
    assert!(!engine.is_loop_active(LoopKind::Formation));

    let snapshot = engine.tick(FRAME_DT);
    assert!(snapshot.actors.iter().any(|a| a.id == 4 && a.is_moving));
    assert_eq!(snapshot.phase, RallyPhase::ReturningToBase);

    let snapshots = run_to_idle(&mut engine, 1000);
    assert_eq!(finished(&events_of(&snapshots)), vec![RallyOutcome::Completed]);
    let last = snapshots.last().unwrap();
    assert_eq!(actor_at(last, 4).court_point(), moved_base);
}

#[test]
fn test_non_finite_base_position_is_ignored() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.update_base_positions(&BTreeMap::from([(1, CourtPoint::new(f64::NAN, 0.0))]));
    assert!(!engine.is_loop_active(LoopKind::Formation));
    assert_eq!(engine.config().formation.position(MatchType::Doubles, 1), Some(base(1)));
}

// ---- Flight path ----

#[test]
fn test_flight_path_grows_and_toggles() {
    let mut engine = engine_for(MatchType::Doubles);
    engine.play(cross_court_plan(&[1, 2])).unwrap();
    tick_until_phase(&mut engine, RallyPhase::FlightInProgress, 200);

    let mut previous = 0;
    for _ in 0..30 {
        let snapshot = engine.tick(FRAME_DT);
        assert!(snapshot.flight_path.len() >= previous, "path only grows within a segment");
        previous = snapshot.flight_path.len();
    }
    assert!(previous >= 2);
    assert_eq!(flight_artifacts_live(&engine).1, 1);

    engine.set_flight_path_visible(false);
    assert_eq!(flight_artifacts_live(&engine).1, 0);
    assert!(engine.tick(FRAME_DT).flight_path.is_empty());

    engine.set_flight_path_visible(true);
    let snapshot = engine.tick(FRAME_DT);
    assert!(snapshot.flight_path.len() > previous);
    assert_eq!(flight_artifacts_live(&engine).1, 1);
}

#[test]
fn test_hidden_flight_path_is_never_drawn() {
    let mut engine = engine_for(MatchType::Doubles);
    let mut plan = cross_court_plan(&[1, 2]);
    plan.show_flight_path = false;
    engine.play(plan).unwrap();

    for snapshot in run_to_idle(&mut engine, 2000) {
        assert!(snapshot.flight_path.is_empty());
    }
    assert_eq!(
        engine
            .scene()
            .visuals()
            .filter(|v| matches!(v, Visual::FlightPath { .. }))
            .count(),
        0
    );
}

// ---- Commands & determinism ----

#[test]
fn test_commands_are_processed_at_frame_boundary() {
    let mut engine = RallyEngine::new(HeadlessScene::new(), EngineConfig::default());
    engine.queue_commands([
        RallyCommand::InitRoster {
            match_type: MatchType::Doubles,
        },
        RallyCommand::Play {
            plan: cross_court_plan(&[1, 2]),
        },
    ]);
    assert_eq!(engine.scene().live_actors(), 0, "nothing happens before the tick");

    let snapshot = engine.tick(FRAME_DT);
    assert_eq!(snapshot.actors.len(), 4);
    assert_eq!(snapshot.phase, RallyPhase::HitterApproach);

    engine.queue_command(RallyCommand::Play {
        plan: RallyPlan::default(),
    });
    let snapshot = engine.tick(FRAME_DT);
    assert!(snapshot.events.iter().any(|e| matches!(
        e,
        RallyEvent::Notice { level: NoticeLevel::Warning, .. }
    )));
    assert_eq!(snapshot.phase, RallyPhase::HitterApproach, "rejected play leaves the rally");

    engine.queue_command(RallyCommand::Cancel);
    assert_eq!(engine.tick(FRAME_DT).phase, RallyPhase::Idle);
}

#[test]
fn test_determinism_same_plan() {
    let run = || {
        let mut engine = engine_for(MatchType::Doubles);
        engine.play(cross_court_plan(&[1, 2, 3])).unwrap();
        run_to_idle(&mut engine, 2000)
            .iter()
            .map(|s| serde_json::to_string(s).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run(), "snapshots diverged for the same plan");
}

#[test]
fn test_singles_roster_visuals() {
    let engine = engine_for(MatchType::Singles);
    let mut actors: Vec<(ActorId, u32, f64)> = engine
        .scene()
        .visuals()
        .filter_map(|v| match v {
            Visual::Actor {
                id, color, facing, ..
            } => Some((*id, *color, *facing)),
            _ => None,
        })
        .collect();
    actors.sort_by_key(|a| a.0);
    assert_eq!(actors.len(), 2);
    assert_eq!(actors[0], (1, PLAYER_COLORS[0], 0.0));
    assert_eq!(actors[1].1, PLAYER_COLORS[1]);
    assert!(
        (actors[1].2 - std::f64::consts::PI).abs() < 1e-12,
        "far side faces the net"
    );
}

// ---- Scheduler ----

#[test]
fn test_scheduler_loops_are_independent() {
    let mut scheduler = Scheduler::new();
    let rally = scheduler.start(LoopKind::Rally, 0, None);
    let highlight = scheduler.start(LoopKind::Highlight, 0, Some(0.5));

    assert!(scheduler.cancel(LoopKind::Rally).is_some());
    assert!(scheduler.is_active(LoopKind::Highlight));
    assert!(!scheduler.finish(LoopKind::Rally, rally.id), "already cancelled");

    let replacement = scheduler.start(LoopKind::Highlight, 3, Some(1.0));
    assert!(
        !scheduler.finish(LoopKind::Highlight, highlight.id),
        "stale handle must not end the replacement"
    );
    assert_eq!(scheduler.handle(LoopKind::Highlight).map(|h| h.id), Some(replacement.id));

    assert!(scheduler.advance(0.6).is_empty());
    let expired = scheduler.advance(0.5);
    assert_eq!(expired.len(), 1);
    assert!(scheduler.is_empty());
}
