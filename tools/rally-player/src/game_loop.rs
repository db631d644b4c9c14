//! Real-time loop thread: runs the rally engine at 60 Hz and streams
//! snapshots back to the caller.
//!
//! The engine is created inside this thread so the scene host never has to
//! cross threads. Commands arrive via `mpsc`; snapshots leave via `mpsc`.

use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use shuttle_core::commands::RallyCommand;
use shuttle_core::constants::{FRAME_DT, FRAME_RATE};
use shuttle_core::state::RallySnapshot;
use shuttle_sim::{EngineConfig, HeadlessScene, RallyEngine};

/// Nominal duration of one frame.
const FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000 / FRAME_RATE as u64);

/// Commands sent from the main thread to the loop thread.
#[derive(Debug)]
pub enum LoopCommand {
    /// Forward to the engine's command queue.
    Rally(RallyCommand),
    /// Stop the loop gracefully.
    Shutdown,
}

/// Spawn the loop thread. Returns the command sender and the thread handle.
pub fn spawn_game_loop(
    config: EngineConfig,
    snapshot_tx: mpsc::Sender<RallySnapshot>,
) -> (mpsc::Sender<LoopCommand>, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>();

    let handle = std::thread::Builder::new()
        .name("rally-loop".into())
        .spawn(move || {
            run_game_loop(config, cmd_rx, snapshot_tx);
        })
        .expect("Failed to spawn rally loop thread");

    (cmd_tx, handle)
}

/// The loop. Runs until Shutdown, or until either channel disconnects.
fn run_game_loop(
    config: EngineConfig,
    cmd_rx: mpsc::Receiver<LoopCommand>,
    snapshot_tx: mpsc::Sender<RallySnapshot>,
) {
    let mut engine = RallyEngine::new(HeadlessScene::new(), config);
    let mut next_frame_time = Instant::now();

    loop {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(LoopCommand::Rally(cmd)) => engine.queue_command(cmd),
                Ok(LoopCommand::Shutdown) => return,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return,
            }
        }

        // 2. Advance one frame
        let snapshot = engine.tick(FRAME_DT);

        // 3. Hand the snapshot to the consumer
        if snapshot_tx.send(snapshot).is_err() {
            return;
        }

        // 4. Sleep until the next frame
        next_frame_time += FRAME_DURATION;
        let now = Instant::now();
        if next_frame_time > now {
            std::thread::sleep(next_frame_time - now);
        } else if now - next_frame_time > FRAME_DURATION * 2 {
            // Too far behind; reset to avoid a catch-up spiral
            next_frame_time = now;
        }
    }
}
