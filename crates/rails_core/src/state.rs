//! Process-wide runtime state.
//!
//! A single [`ProcessState`] is created at startup and handed by `&mut` to the
//! director and, through [`SceneContext`](crate::scene::SceneContext), to
//! scenes. It owns the shared scene graph and repaint registry and tracks
//! which scene is active and which scene may animate a fade.
//!
//! Active-scene identity is a monotonically increasing [`Generation`]. Starting
//! a scene bumps it; a running scene compares its own generation against the
//! current one at the top of every frame to find out it has been superseded.
//!
//! The transition lock is a cooperative flag, not a mutex. Scenes join a FIFO
//! queue when they start and are granted the lock in that order; the holder
//! keeps it from its fade-in until the end of its fade-out. Nothing stops a
//! waiting scene from being stepped, it just cannot advance its fade timer.

use std::collections::VecDeque;

use crate::graph::SceneGraph;
use crate::layout::Viewport;
use crate::repaint::{DispatchStats, RepaintRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of one started scene: its generation plus its display name.
/// Ownership comparisons use the generation only, so two scenes sharing a
/// name never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneOwner {
    generation: Generation,
    name: String,
}

impl SceneOwner {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for SceneOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' {}", self.name, self.generation)
    }
}

pub struct ProcessState {
    active: Option<SceneOwner>,
    next_generation: u64,
    lock_holder: Option<Generation>,
    lock_queue: VecDeque<Generation>,
    viewport: Viewport,
    viewport_resized: bool,
    defects: Vec<String>,
    pub graph: SceneGraph,
    pub repaint: RepaintRegistry,
}

impl ProcessState {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            active: None,
            next_generation: 1,
            lock_holder: None,
            lock_queue: VecDeque::new(),
            viewport,
            viewport_resized: false,
            defects: Vec::new(),
            graph: SceneGraph::new(),
            repaint: RepaintRegistry::new(),
        }
    }

    /// Make a new scene the active one and queue it for the transition lock.
    pub fn begin_scene(&mut self, name: &str) -> SceneOwner {
        let generation = Generation(self.next_generation);
        self.next_generation += 1;
        let owner = SceneOwner {
            generation,
            name: name.to_string(),
        };
        if let Some(previous) = self.active.replace(owner.clone()) {
            log::debug!("Active scene {} superseded by {}", previous, owner);
        }
        if !self.lock_queue.is_empty() {
            log::warn!(
                "Scene {} queued behind an unfinished transition ({} waiting)",
                owner,
                self.lock_queue.len()
            );
        }
        self.lock_queue.push_back(generation);
        owner
    }

    pub fn active(&self) -> Option<&SceneOwner> {
        self.active.as_ref()
    }

    pub fn active_generation(&self) -> Option<Generation> {
        self.active.as_ref().map(SceneOwner::generation)
    }

    pub fn is_active(&self, generation: Generation) -> bool {
        self.active_generation() == Some(generation)
    }

    /// Grant the lock to `generation` if it already holds it, or if the lock
    /// is free and `generation` is next in line.
    pub fn try_acquire_transition(&mut self, generation: Generation) -> bool {
        match self.lock_holder {
            Some(holder) => holder == generation,
            None => {
                if self.lock_queue.front() != Some(&generation) {
                    return false;
                }
                self.lock_queue.pop_front();
                self.lock_holder = Some(generation);
                log::debug!("Transition lock granted to {}", generation);
                true
            }
        }
    }

    pub fn release_transition(&mut self, generation: Generation) {
        if self.lock_holder == Some(generation) {
            self.lock_holder = None;
            log::debug!("Transition lock released by {}", generation);
        } else {
            log::warn!(
                "Scene {} released a transition lock it does not hold (holder: {:?})",
                generation,
                self.lock_holder
            );
        }
    }

    pub fn transition_holder(&self) -> Option<Generation> {
        self.lock_holder
    }

    /// Leave the lock queue without ever taking the lock, e.g. a scene that
    /// neither faded in nor out. Returns whether it was queued.
    pub fn withdraw_transition(&mut self, generation: Generation) -> bool {
        let before = self.lock_queue.len();
        self.lock_queue.retain(|queued| *queued != generation);
        before != self.lock_queue.len()
    }

    /// Scenes waiting for the transition lock.
    pub fn queued_transitions(&self) -> usize {
        self.lock_queue.len()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn viewport_resized(&self) -> bool {
        self.viewport_resized
    }

    /// Record a new viewport size, raise the pending-resize flag for this
    /// frame and re-run layout for the active scene.
    pub fn notify_resize(&mut self, width: u32, height: u32) -> DispatchStats {
        self.viewport = Viewport::new(width, height);
        self.viewport_resized = true;
        self.dispatch_repaint()
    }

    pub fn dispatch_repaint(&mut self) -> DispatchStats {
        let active = self.active_generation();
        self.repaint.dispatch(&mut self.graph, self.viewport, active)
    }

    /// Log a configuration defect. It is kept so hosts can surface it.
    pub fn record_defect(&mut self, message: String) {
        log::error!("{message}");
        self.defects.push(message);
    }

    pub fn defects(&self) -> &[String] {
        &self.defects
    }

    pub(crate) fn clear_resize_flag(&mut self) {
        self.viewport_resized = false;
    }
}
