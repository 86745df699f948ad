//! Per-frame driver for all live scenes.
//!
//! The host calls [`Director::tick`] once per display frame. A tick:
//!
//!   1. latches input,
//!   2. steps every live scene once, oldest first; scenes started during the
//!      tick are launched immediately (their Initialize runs synchronously)
//!      but only join the live set for the next tick,
//!   3. drops scenes that finished Terminate,
//!   4. renders the shared graph once if anything asked for it,
//!   5. clears the pending-resize flag.
//!
//! [`Director::start`] counts as a frame of its own: the new scene's first
//! steps run synchronously and, if they changed anything visible, the graph is
//! presented right away.
//!
//! Nothing re-schedules itself. A scene that stops returning from a phase
//! simply keeps being stepped by the director every frame.

use std::collections::VecDeque;

use crate::graph::NodeId;
use crate::host::{Host, InputPoller};
use crate::scene::{FrameIo, Phase, Scene, SceneInstance, StepOutput};
use crate::state::{Generation, ProcessState, SceneOwner};

/// What happened during one tick.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub rendered: bool,
    /// Scenes whose fade timer moved this frame.
    pub fades_advanced: Vec<Generation>,
    pub started: Vec<SceneOwner>,
    pub finished: Vec<SceneOwner>,
}

#[derive(Default)]
pub struct Director {
    live: Vec<SceneInstance>,
    frame: u64,
}

impl Director {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a scene outside of a tick (e.g. the first scene at boot).
    /// The new scene becomes active immediately and runs its Initialize.
    pub fn start(
        &mut self,
        state: &mut ProcessState,
        host: &mut Host,
        scene: Box<dyn Scene>,
    ) -> SceneOwner {
        let mut out = StepOutput::default();
        let mut launched = launch_all(state, host, 0.0, scene, &mut out);
        let owner = launched[0].owner().clone();
        if out.render_requested {
            host.surface.render(&state.graph, state.viewport());
        }
        self.live.append(&mut launched);
        owner
    }

    pub fn tick(&mut self, state: &mut ProcessState, host: &mut Host, dt: f64) -> FrameReport {
        self.frame += 1;
        host.input.update();

        let mut out = StepOutput::default();
        let mut spawned = Vec::new();

        for instance in &mut self.live {
            let mut io = FrameIo {
                state: &mut *state,
                host: &mut *host,
                dt,
                out: &mut out,
            };
            instance.step(&mut io);

            for scene in std::mem::take(&mut out.requests) {
                spawned.extend(launch_all(state, host, dt, scene, &mut out));
            }
        }

        let mut finished = Vec::new();
        self.live.retain(|instance| {
            if instance.is_done() {
                finished.push(instance.owner().clone());
                false
            } else {
                true
            }
        });
        let started = spawned.iter().map(|i| i.owner().clone()).collect();
        self.live.extend(spawned);

        if out.render_requested {
            host.surface.render(&state.graph, state.viewport());
        }
        state.clear_resize_flag();

        FrameReport {
            frame: self.frame,
            rendered: out.render_requested,
            fades_advanced: out.fades_advanced,
            started,
            finished,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_idle(&self) -> bool {
        self.live.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn phase_of(&self, generation: Generation) -> Option<Phase> {
        self.find(generation).map(SceneInstance::phase)
    }

    pub fn root_of(&self, generation: Generation) -> Option<NodeId> {
        self.find(generation).map(SceneInstance::root)
    }

    pub fn live_scenes(&self) -> impl Iterator<Item = (&SceneOwner, Phase)> {
        self.live.iter().map(|i| (i.owner(), i.phase()))
    }

    fn find(&self, generation: Generation) -> Option<&SceneInstance> {
        self.live
            .iter()
            .find(|i| i.owner().generation() == generation)
    }
}

/// Launch `first` and any scenes its Initialize (transitively) asks for.
fn launch_all(
    state: &mut ProcessState,
    host: &mut Host,
    dt: f64,
    first: Box<dyn Scene>,
    out: &mut StepOutput,
) -> Vec<SceneInstance> {
    let mut queue = VecDeque::from([first]);
    let mut launched = Vec::new();
    while let Some(scene) = queue.pop_front() {
        let mut instance = SceneInstance::new(scene, state);
        log::info!("Scene {} started", instance.owner());
        host.audio.update();

        let mut io = FrameIo {
            state: &mut *state,
            host: &mut *host,
            dt,
            out: &mut *out,
        };
        instance.step(&mut io);
        queue.extend(out.requests.drain(..));
        launched.push(instance);
    }
    launched
}
