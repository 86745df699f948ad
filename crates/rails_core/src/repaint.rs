//! Resize repaint registry.
//!
//! Visual elements whose layout depends on the viewport register a callback
//! here. On every viewport resize [`RepaintRegistry::dispatch`] re-runs the
//! callbacks that belong to the active scene and drops the ones whose owner
//! has been superseded.
//!
//! Entries are reclaimed three ways:
//! - explicitly, by releasing the [`RepaintToken`] returned from `register`,
//! - eagerly, when the owning scene terminates (`purge_owner`),
//! - lazily, the next time `dispatch` sees an entry owned by a stale scene.
//!
//! Hidden entries are skipped without being collected, since their element
//! may become visible again later.

use std::collections::BTreeMap;

use crate::graph::{NodeId, SceneGraph};
use crate::layout::Viewport;
use crate::state::{Generation, SceneOwner};

pub type RepaintFn = Box<dyn FnMut(&mut SceneGraph, Viewport)>;

struct RepaintEntry {
    node: NodeId,
    owner: Generation,
    owner_name: String,
    serial: u64,
    callback: RepaintFn,
}

/// Proof of a registration. Releasing a token only removes the entry it was
/// issued for; if the id has since been overwritten the release is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepaintToken {
    id: String,
    serial: u64,
}

impl RepaintToken {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Outcome of one dispatch pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub invoked: usize,
    pub hidden: usize,
    pub collected: usize,
}

#[derive(Default)]
pub struct RepaintRegistry {
    entries: BTreeMap<String, RepaintEntry>,
    next_serial: u64,
}

impl RepaintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry under `id`. Ids are not namespaced per
    /// scene, so a later registration with the same id replaces the earlier one
    /// regardless of owner.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        node: NodeId,
        owner: &SceneOwner,
        callback: impl FnMut(&mut SceneGraph, Viewport) + 'static,
    ) -> RepaintToken {
        let id = id.into();
        let serial = self.next_serial;
        self.next_serial += 1;
        let previous = self.entries.insert(
            id.clone(),
            RepaintEntry {
                node,
                owner: owner.generation(),
                owner_name: owner.name().to_string(),
                serial,
                callback: Box::new(callback),
            },
        );
        if let Some(previous) = previous {
            log::debug!(
                "Repaint entry '{}' overwritten (was owned by '{}' {})",
                id,
                previous.owner_name,
                previous.owner
            );
        }
        RepaintToken { id, serial }
    }

    pub fn release(&mut self, token: &RepaintToken) -> bool {
        let matches = self
            .entries
            .get(&token.id)
            .is_some_and(|entry| entry.serial == token.serial);
        if matches {
            self.entries.remove(&token.id);
        }
        matches
    }

    /// Remove every entry owned by `owner`. Returns how many were removed.
    pub fn purge_owner(&mut self, owner: Generation) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.owner != owner);
        before - self.entries.len()
    }

    /// Run one resize pass against the current viewport.
    pub fn dispatch(
        &mut self,
        graph: &mut SceneGraph,
        viewport: Viewport,
        active: Option<Generation>,
    ) -> DispatchStats {
        let mut stats = DispatchStats::default();
        self.entries.retain(|id, entry| {
            if !graph.is_visible(entry.node) {
                stats.hidden += 1;
                return true;
            }
            if Some(entry.owner) != active {
                log::trace!(
                    "Collecting repaint entry '{}' from stale scene '{}'",
                    id,
                    entry.owner_name
                );
                stats.collected += 1;
                return false;
            }
            (entry.callback)(graph, viewport);
            stats.invoked += 1;
            true
        });
        log::debug!(
            "Repaint dispatch at {}: {} invoked, {} hidden, {} collected",
            viewport,
            stats.invoked,
            stats.hidden,
            stats.collected
        );
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn owner_of(&self, id: &str) -> Option<Generation> {
        self.entries.get(id).map(|entry| entry.owner)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use crate::state::ProcessState;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(&mut SceneGraph, Viewport) + 'static) {
        let hits = Rc::new(Cell::new(0));
        let inner = Rc::clone(&hits);
        (hits, move |_: &mut SceneGraph, _: Viewport| {
            inner.set(inner.get() + 1)
        })
    }

    fn visible_node(graph: &mut SceneGraph) -> NodeId {
        let node = graph.spawn(NodeKind::Container);
        let stage = graph.stage();
        graph.add_child(stage, node);
        node
    }

    #[test]
    fn dispatch_invokes_entries_of_active_owner() {
        let mut state = ProcessState::new(Viewport::default());
        let owner = state.begin_scene("title");
        let node = visible_node(&mut state.graph);
        let (hits, cb) = counter();
        state.repaint.register("banner", node, &owner, cb);

        let stats = state.dispatch_repaint();
        assert_eq!(hits.get(), 1);
        assert_eq!(stats.invoked, 1);
    }

    #[test]
    fn dispatch_collects_stale_entries_without_invoking() {
        let mut state = ProcessState::new(Viewport::default());
        let old = state.begin_scene("title");
        let node = visible_node(&mut state.graph);
        let (hits, cb) = counter();
        state.repaint.register("banner", node, &old, cb);

        state.begin_scene("select");
        let stats = state.dispatch_repaint();
        assert_eq!(hits.get(), 0);
        assert_eq!(stats.collected, 1);
        assert!(!state.repaint.contains("banner"));
    }

    #[test]
    fn dispatch_keeps_hidden_entries_even_when_stale() {
        let mut state = ProcessState::new(Viewport::default());
        let old = state.begin_scene("title");
        let node = visible_node(&mut state.graph);
        state.graph.set_visible(node, false);
        let (hits, cb) = counter();
        state.repaint.register("banner", node, &old, cb);

        state.begin_scene("select");
        let stats = state.dispatch_repaint();
        assert_eq!(hits.get(), 0);
        assert_eq!(stats.hidden, 1);
        assert!(state.repaint.contains("banner"));
    }

    #[test]
    fn dispatch_is_idempotent_without_scene_change() {
        let mut state = ProcessState::new(Viewport::default());
        let stale = state.begin_scene("title");
        let stale_node = visible_node(&mut state.graph);
        state.repaint.register("old", stale_node, &stale, |_, _| {});
        let owner = state.begin_scene("select");
        let node = visible_node(&mut state.graph);
        let (hits, cb) = counter();
        state.repaint.register("list", node, &owner, cb);

        state.dispatch_repaint();
        let first: Vec<String> = state.repaint.ids().map(str::to_string).collect();
        state.dispatch_repaint();
        let second: Vec<String> = state.repaint.ids().map(str::to_string).collect();

        assert_eq!(first, vec!["list".to_string()]);
        assert_eq!(first, second);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn register_overwrites_same_id_across_owners() {
        let mut state = ProcessState::new(Viewport::default());
        let a = state.begin_scene("a");
        let node = visible_node(&mut state.graph);
        let first = state.repaint.register("shared", node, &a, |_, _| {});
        let b = state.begin_scene("b");
        let second = state.repaint.register("shared", node, &b, |_, _| {});

        assert_eq!(state.repaint.len(), 1);
        assert_eq!(state.repaint.owner_of("shared"), Some(b.generation()));
        // The stale token must not remove the newer registration.
        assert!(!state.repaint.release(&first));
        assert!(state.repaint.contains("shared"));
        assert!(state.repaint.release(&second));
        assert!(state.repaint.is_empty());
    }

    #[test]
    fn purge_owner_removes_only_that_owner() {
        let mut state = ProcessState::new(Viewport::default());
        let a = state.begin_scene("a");
        let node = visible_node(&mut state.graph);
        state.repaint.register("a1", node, &a, |_, _| {});
        state.repaint.register("a2", node, &a, |_, _| {});
        let b = state.begin_scene("b");
        state.repaint.register("b1", node, &b, |_, _| {});

        assert_eq!(state.repaint.purge_owner(a.generation()), 2);
        assert_eq!(state.repaint.ids().collect::<Vec<_>>(), vec!["b1"]);
    }

    #[test]
    fn callback_receives_current_viewport() {
        let mut state = ProcessState::new(Viewport::new(640, 480));
        let owner = state.begin_scene("title");
        let node = visible_node(&mut state.graph);
        state.repaint.register("fit", node, &owner, move |graph, viewport| {
            if let Some(n) = graph.get_mut(node) {
                n.size = viewport.size();
            }
        });

        state.notify_resize(1024, 768);
        let size = state.graph.get(node).expect("node").size;
        assert_eq!(size, glam::Vec2::new(1024.0, 768.0));
    }
}
