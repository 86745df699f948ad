//! Scene lifecycle.
//!
//! Every started scene walks five phases exactly once, in order:
//!
//!   Initialize → FadeIn → Run → FadeOut → Terminate → (done)
//!
//! The director steps each live scene once per frame. A phase either stays
//! (and is stepped again next frame) or completes, in which case the next
//! phase is entered and stepped in the same frame. The one exception is Run:
//! it always begins on the frame after FadeIn completes, so `update()` never
//! runs inside the call that started the scene.
//!
//! Fades animate a black overlay on top of the scene root. A scene may only
//! advance its fade timer while it holds the transition lock; it takes the
//! lock on its first fade frame and gives it back at the end of FadeOut. A
//! scene without a fade-in shows its root at once and only queues for the
//! lock when it fades out. Run is not gated by the lock. Its only exit
//! condition is noticing, as the first thing it does in a frame, that another
//! scene has become active.

use crate::graph::{Node, NodeId, NodeKind, SceneGraph};
use crate::host::{Host, InputPoller, ResourceCache};
use crate::layout::{Placement, Viewport};
use crate::repaint::RepaintToken;
use crate::state::{Generation, ProcessState, SceneOwner};

pub const OVERLAY_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Initialize,
    FadeIn,
    Run,
    FadeOut,
    Terminate,
    Done,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::FadeIn => "fade-in",
            Self::Run => "run",
            Self::FadeOut => "fade-out",
            Self::Terminate => "terminate",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned by multi-frame hooks. `Pending` means "call me again next frame".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Pending,
    Complete,
}

/// Fade configuration of one scene. Durations are in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeSettings {
    pub fade_in: bool,
    pub fade_in_frames: u32,
    pub fade_out: bool,
    pub fade_out_frames: u32,
}

impl FadeSettings {
    pub fn frames(fade_in_frames: u32, fade_out_frames: u32) -> Self {
        Self {
            fade_in: true,
            fade_in_frames,
            fade_out: true,
            fade_out_frames,
        }
    }

    /// Show and hide the root immediately, without overlays.
    pub fn instant() -> Self {
        Self {
            fade_in: false,
            fade_in_frames: 0,
            fade_out: false,
            fade_out_frames: 0,
        }
    }
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self::frames(30, 30)
    }
}

/// One logical full-screen scene.
///
/// Implementors provide the scene-specific parts; the lifecycle around them
/// (root node, fades, supersession, registry cleanup) is handled by the
/// director.
pub trait Scene {
    /// Non-empty display name. Used in logs and diagnostics.
    fn name(&self) -> &str;

    fn fade(&self) -> FadeSettings {
        FadeSettings::default()
    }

    /// Build the scene's nodes under `ctx.root()` and request resources.
    fn on_initialize(&mut self, _ctx: &mut SceneContext<'_>) -> Progress {
        Progress::Complete
    }

    /// Per-frame logic. Computation only: drawing happens once per frame
    /// after every scene has been stepped.
    fn update(&mut self, _ctx: &mut SceneContext<'_>) {}

    fn on_terminate(&mut self, _ctx: &mut SceneContext<'_>) -> Progress {
        Progress::Complete
    }
}

/// What a scene hook gets to work with during one call.
pub struct SceneContext<'a> {
    pub state: &'a mut ProcessState,
    pub input: &'a dyn InputPoller,
    pub resources: &'a mut dyn ResourceCache,
    /// Seconds since the previous frame.
    pub dt: f64,
    owner: &'a SceneOwner,
    root: NodeId,
    tokens: &'a mut Vec<RepaintToken>,
    requests: &'a mut Vec<Box<dyn Scene>>,
}

impl SceneContext<'_> {
    pub fn owner(&self) -> &SceneOwner {
        self.owner
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn graph(&mut self) -> &mut SceneGraph {
        &mut self.state.graph
    }

    pub fn viewport(&self) -> Viewport {
        self.state.viewport()
    }

    /// Create a node as the topmost child of this scene's root.
    pub fn spawn(&mut self, kind: NodeKind) -> NodeId {
        self.spawn_under(self.root, kind)
    }

    pub fn spawn_under(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let graph = &mut self.state.graph;
        let node = graph.spawn(kind);
        graph.add_child(parent, node);
        node
    }

    /// Register a resize callback owned by this scene. The token is also kept
    /// by the scene and released when it terminates.
    pub fn on_resize(
        &mut self,
        id: impl Into<String>,
        node: NodeId,
        callback: impl FnMut(&mut SceneGraph, Viewport) + 'static,
    ) -> RepaintToken {
        let token = self.state.repaint.register(id, node, self.owner, callback);
        self.tokens.push(token.clone());
        token
    }

    /// Apply `layout` to `node` now and again after every resize.
    pub fn place(
        &mut self,
        id: impl Into<String>,
        node: NodeId,
        mut layout: impl FnMut(&Node, Viewport) -> Placement + 'static,
    ) -> RepaintToken {
        let mut apply = move |graph: &mut SceneGraph, viewport: Viewport| {
            if let Some(target) = graph.get_mut(node) {
                let placement = layout(target, viewport);
                placement.apply_to(target);
            }
        };
        let viewport = self.viewport();
        apply(&mut self.state.graph, viewport);
        self.on_resize(id, node, apply)
    }

    pub fn release(&mut self, token: &RepaintToken) -> bool {
        self.tokens.retain(|t| t != token);
        self.state.repaint.release(token)
    }

    /// Start `scene` as soon as the current hook returns. The calling scene
    /// notices it was superseded on its next frame.
    pub fn switch_to(&mut self, scene: Box<dyn Scene>) {
        self.requests.push(scene);
    }
}

/// Side effects collected while stepping scenes in one frame.
#[derive(Default)]
pub(crate) struct StepOutput {
    pub render_requested: bool,
    pub fades_advanced: Vec<Generation>,
    pub requests: Vec<Box<dyn Scene>>,
}

pub(crate) struct FrameIo<'a> {
    pub state: &'a mut ProcessState,
    pub host: &'a mut Host,
    pub dt: f64,
    pub out: &'a mut StepOutput,
}

/// Phase plus the state it carries between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Initialize,
    FadeIn { timer: u32, overlay: Option<NodeId> },
    Run,
    FadeOut { timer: u32, overlay: Option<NodeId> },
    Terminate,
    Done,
}

impl Stage {
    fn phase(self) -> Phase {
        match self {
            Self::Initialize => Phase::Initialize,
            Self::FadeIn { .. } => Phase::FadeIn,
            Self::Run => Phase::Run,
            Self::FadeOut { .. } => Phase::FadeOut,
            Self::Terminate => Phase::Terminate,
            Self::Done => Phase::Done,
        }
    }
}

enum Step {
    Stay(Stage),
    Next(Stage),
}

pub(crate) struct SceneInstance {
    scene: Box<dyn Scene>,
    owner: SceneOwner,
    root: NodeId,
    fade: FadeSettings,
    stage: Stage,
    tokens: Vec<RepaintToken>,
}

impl SceneInstance {
    /// Activate the scene and attach its (hidden) root to the stage.
    pub(crate) fn new(scene: Box<dyn Scene>, state: &mut ProcessState) -> Self {
        let owner = state.begin_scene(scene.name());
        let fade = scene.fade();
        let root = state.graph.spawn(NodeKind::Container);
        state.graph.set_visible(root, false);
        let stage = state.graph.stage();
        state.graph.add_child(stage, root);
        Self {
            scene,
            owner,
            root,
            fade,
            stage: Stage::Initialize,
            tokens: Vec::new(),
        }
    }

    pub(crate) fn owner(&self) -> &SceneOwner {
        &self.owner
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn phase(&self) -> Phase {
        self.stage.phase()
    }

    pub(crate) fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Advance by one frame.
    pub(crate) fn step(&mut self, io: &mut FrameIo<'_>) {
        loop {
            let stage = std::mem::replace(&mut self.stage, Stage::Done);
            match self.run_stage(stage, io) {
                Step::Stay(stage) => {
                    self.stage = stage;
                    return;
                }
                Step::Next(next) => {
                    log::trace!(
                        "Scene {}: {} -> {}",
                        self.owner,
                        stage.phase(),
                        next.phase()
                    );
                    self.stage = next;
                    if matches!(next, Stage::Run | Stage::Done) {
                        return;
                    }
                }
            }
        }
    }

    fn run_stage(&mut self, stage: Stage, io: &mut FrameIo<'_>) -> Step {
        match stage {
            Stage::Initialize => self.initialize(io),
            Stage::FadeIn { timer, overlay } => self.fade_in(io, timer, overlay),
            Stage::Run => self.run(io),
            Stage::FadeOut { timer, overlay } => self.fade_out(io, timer, overlay),
            Stage::Terminate => self.terminate(io),
            Stage::Done => Step::Stay(Stage::Done),
        }
    }

    fn call_hook<R>(
        &mut self,
        io: &mut FrameIo<'_>,
        hook: impl FnOnce(&mut Box<dyn Scene>, &mut SceneContext<'_>) -> R,
    ) -> R {
        let host = &mut *io.host;
        let mut ctx = SceneContext {
            state: &mut *io.state,
            input: &host.input,
            resources: host.resources.as_mut(),
            dt: io.dt,
            owner: &self.owner,
            root: self.root,
            tokens: &mut self.tokens,
            requests: &mut io.out.requests,
        };
        hook(&mut self.scene, &mut ctx)
    }

    fn initialize(&mut self, io: &mut FrameIo<'_>) -> Step {
        match self.call_hook(io, |scene, ctx| scene.on_initialize(ctx)) {
            Progress::Pending => Step::Stay(Stage::Initialize),
            Progress::Complete => Step::Next(self.enter_fade_in(io)),
        }
    }

    fn enter_fade_in(&mut self, io: &mut FrameIo<'_>) -> Stage {
        if self.owner.name().trim().is_empty() {
            io.state.record_defect(format!(
                "Scene {} has no name; logs and repaint diagnostics cannot identify it",
                self.owner.generation()
            ));
        }
        let overlay = self
            .fade
            .fade_in
            .then(|| self.spawn_overlay(io.state, 1.0));
        Stage::FadeIn {
            timer: self.fade.fade_in_frames,
            overlay,
        }
    }

    fn fade_in(&mut self, io: &mut FrameIo<'_>, timer: u32, overlay: Option<NodeId>) -> Step {
        let Some(overlay) = overlay else {
            io.state.graph.set_visible(self.root, true);
            io.out.render_requested = true;
            log::info!("Scene {} shown", self.owner);
            return Step::Next(Stage::Run);
        };

        if !io.state.try_acquire_transition(self.owner.generation()) {
            // Keep presenting frames while another scene finishes its fade.
            io.out.render_requested = true;
            return Step::Stay(Stage::FadeIn {
                timer,
                overlay: Some(overlay),
            });
        }

        if timer == 0 {
            io.state.graph.destroy(overlay);
            io.state.graph.set_visible(self.root, true);
            io.out.render_requested = true;
            log::info!("Scene {} faded in", self.owner);
            return Step::Next(Stage::Run);
        }

        io.state.graph.set_visible(self.root, true);
        let timer = timer - 1;
        let alpha = timer as f32 / self.fade.fade_in_frames as f32;
        self.advance_overlay(io, overlay, alpha);
        Step::Stay(Stage::FadeIn {
            timer,
            overlay: Some(overlay),
        })
    }

    fn run(&mut self, io: &mut FrameIo<'_>) -> Step {
        if !io.state.is_active(self.owner.generation()) {
            log::info!("Scene {} superseded, leaving run loop", self.owner);
            return Step::Next(self.enter_fade_out(io));
        }

        io.host.resources.load();
        io.host.audio.update();
        io.host.animation.update();
        self.call_hook(io, |scene, ctx| scene.update(ctx));
        io.out.render_requested = true;
        Step::Stay(Stage::Run)
    }

    fn enter_fade_out(&mut self, io: &mut FrameIo<'_>) -> Stage {
        let overlay = self
            .fade
            .fade_out
            .then(|| self.spawn_overlay(io.state, 0.0));
        Stage::FadeOut { timer: 0, overlay }
    }

    fn fade_out(&mut self, io: &mut FrameIo<'_>, timer: u32, overlay: Option<NodeId>) -> Step {
        let holding = io.state.try_acquire_transition(self.owner.generation());
        let Some(overlay) = overlay else {
            return Step::Next(self.finish_fade_out(io, holding));
        };

        if !holding {
            io.out.render_requested = true;
            return Step::Stay(Stage::FadeOut {
                timer,
                overlay: Some(overlay),
            });
        }

        if timer >= self.fade.fade_out_frames {
            io.state.graph.destroy(overlay);
            return Step::Next(self.finish_fade_out(io, true));
        }

        let timer = timer + 1;
        let alpha = timer as f32 / self.fade.fade_out_frames as f32;
        self.advance_overlay(io, overlay, alpha);
        Step::Stay(Stage::FadeOut {
            timer,
            overlay: Some(overlay),
        })
    }

    fn finish_fade_out(&mut self, io: &mut FrameIo<'_>, holding: bool) -> Stage {
        io.state.graph.set_visible(self.root, false);
        if holding {
            io.state.release_transition(self.owner.generation());
        } else {
            io.state.withdraw_transition(self.owner.generation());
        }
        io.state.graph.detach(self.root);
        io.out.render_requested = true;
        log::info!("Scene {} faded out", self.owner);
        Stage::Terminate
    }

    fn terminate(&mut self, io: &mut FrameIo<'_>) -> Step {
        if self.call_hook(io, |scene, ctx| scene.on_terminate(ctx)) == Progress::Pending {
            return Step::Stay(Stage::Terminate);
        }

        let released = self
            .tokens
            .drain(..)
            .filter(|token| io.state.repaint.release(token))
            .count();
        let swept = io.state.repaint.purge_owner(self.owner.generation());
        let freed = io.state.graph.destroy(self.root);
        log::info!(
            "Scene {} terminated ({} repaint entries released, {} swept, {} nodes freed)",
            self.owner,
            released,
            swept,
            freed
        );
        Step::Next(Stage::Done)
    }

    fn spawn_overlay(&self, state: &mut ProcessState, alpha: f32) -> NodeId {
        let viewport = state.viewport();
        let graph = &mut state.graph;
        let overlay = graph.spawn(NodeKind::Fill {
            color: OVERLAY_COLOR,
        });
        if let Some(node) = graph.get_mut(overlay) {
            Placement::fill(viewport).apply_to(node);
            node.alpha = alpha;
        }
        graph.add_child(self.root, overlay);
        overlay
    }

    /// The overlay is refitted on every fade frame, so a resize that happened
    /// while the scene was waiting for the lock is picked up too.
    fn advance_overlay(&self, io: &mut FrameIo<'_>, overlay: NodeId, alpha: f32) {
        let viewport = io.state.viewport();
        if let Some(node) = io.state.graph.get_mut(overlay) {
            node.alpha = alpha;
            Placement::fill(viewport).apply_to(node);
        }
        io.out.render_requested = true;
        io.out.fades_advanced.push(self.owner.generation());
    }
}
