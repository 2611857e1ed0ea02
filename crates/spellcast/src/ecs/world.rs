//! # World: The Actor Registry
//!
//! The [`World`] owns every live actor and the visual provider that draws
//! them. It is the only place actors are created or removed, which lets it
//! keep the arena and the visuals in step:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │ World                                                  │
//! │                                                        │
//! │  allocator: generational slot ids                      │
//! │  actors:    Vec<Option<Actor>>   ← indexed by slot     │
//! │  visuals:   Box<dyn VisualProvider>                    │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Removal
//!
//! Removal is immediate. An actor leaves the arena first;
//! only then is its visual taken out of the scene and disposed, once. A
//! stale or repeated handle is ignored, so removing the same actor from two
//! places in one frame disposes it once.
//!
//! Frame code never holds a borrow of the arena across a behavior call: the
//! scheduler walks a snapshot from [`live_entities`](World::live_entities)
//! and skips handles that died in the meantime.
//!
//! ## Tag Queries
//!
//! The two tag operations match differently, and the difference is
//! load-bearing:
//!
//! - [`get_by_tags`](World::get_by_tags) returns actors carrying **any** of
//!   the query tags ([`TagSet::matches_any`]).
//! - [`remove_by_tags`](World::remove_by_tags) removes actors carrying
//!   **all** of the query tags ([`TagSet::matches_all`]). An empty query
//!   therefore removes everything.

use std::any::Any;
use std::collections::BTreeSet;

use glam::Vec3;

use super::entity::{Entity, EntityAllocator};
use super::system::Behavior;
use super::tags::TagSet;
use crate::context::Context;
use crate::error::SimResult;
use crate::math::Transform;
use crate::time::TickStep;
use crate::visual::{ShapeDescriptor, VisualHandle, VisualProvider};

/// How an actor gets its visual.
#[derive(Debug, Clone, Copy, Default)]
pub enum VisualSpec {
    /// A default box from the provider.
    #[default]
    Default,
    Shape(ShapeDescriptor),
    /// A handle the caller already created. The world takes ownership and
    /// disposes it with the actor.
    Handle(VisualHandle),
}

/// Everything needed to create an actor.
///
/// ```ignore
/// let e = world.create(
///     ActorSpec::at(Vec3::new(2.0, 0.0, 0.0))
///         .named("hostile")
///         .tag(tags::HOSTILE)
///         .tick(|ctx, step, me| Ok(())),
/// );
/// ```
#[derive(Default)]
pub struct ActorSpec {
    name: Option<String>,
    position: Vec3,
    tags: TagSet,
    state: Option<Box<dyn Any>>,
    behavior: Option<Box<dyn Behavior>>,
    visual: VisualSpec,
}

impl ActorSpec {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        for tag in tags {
            self.tags.insert(tag);
        }
        self
    }

    /// Attach a typed state blob, readable through [`World::state`].
    pub fn state<T: Any>(mut self, state: T) -> Self {
        self.state = Some(Box::new(state));
        self
    }

    pub fn behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    /// Closure form of [`behavior`](Self::behavior).
    pub fn tick<F>(self, f: F) -> Self
    where
        F: FnMut(&mut Context, TickStep, Entity) -> SimResult<()> + 'static,
    {
        self.behavior(f)
    }

    pub fn shape(mut self, shape: ShapeDescriptor) -> Self {
        self.visual = VisualSpec::Shape(shape);
        self
    }

    pub fn visual(mut self, handle: VisualHandle) -> Self {
        self.visual = VisualSpec::Handle(handle);
        self
    }
}

/// One live actor.
pub struct Actor {
    entity: Entity,
    pub name: String,
    tags: TagSet,
    pub transform: Transform,
    visual: VisualHandle,
    state: Option<Box<dyn Any>>,
    behavior: Option<Box<dyn Behavior>>,
}

impl Actor {
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Tags are fixed at creation.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn visual(&self) -> VisualHandle {
        self.visual
    }

    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }
}

/// Per-frame registry churn.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityStats {
    pub alive: usize,
    pub slots: usize,
    pub spawned: u32,
    pub despawned: u32,
}

/// The registry of live actors.
pub struct World {
    allocator: EntityAllocator,
    actors: Vec<Option<Actor>>,
    visuals: Box<dyn VisualProvider>,
    /// Uniform scale given to every new actor.
    scale: f32,
    #[cfg(feature = "diagnostics")]
    spawned_this_frame: u32,
    #[cfg(feature = "diagnostics")]
    despawned_this_frame: u32,
}

impl World {
    pub fn new(visuals: impl VisualProvider + 'static, scale: f32) -> Self {
        Self {
            allocator: EntityAllocator::new(),
            actors: Vec::new(),
            visuals: Box::new(visuals),
            scale,
            #[cfg(feature = "diagnostics")]
            spawned_this_frame: 0,
            #[cfg(feature = "diagnostics")]
            despawned_this_frame: 0,
        }
    }

    // ── Create ───────────────────────────────────────────────────────

    /// Create an actor, give it a visual and put the visual in the scene.
    pub fn create(&mut self, spec: ActorSpec) -> Entity {
        let entity = self.allocator.allocate();
        let visual = match spec.visual {
            VisualSpec::Default => self.visuals.create(&ShapeDescriptor::default()),
            VisualSpec::Shape(shape) => self.visuals.create(&shape),
            VisualSpec::Handle(handle) => handle,
        };
        let transform = Transform::from_xyz(spec.position.x, spec.position.y, spec.position.z)
            .with_scale(self.scale);
        self.visuals.set_position(visual, transform.translation);
        self.visuals.set_scale(visual, transform.scale);
        self.visuals.add_to_scene(visual);

        let slot = entity.index as usize;
        if self.actors.len() <= slot {
            self.actors.resize_with(slot + 1, || None);
        }
        let name = spec.name.unwrap_or_else(|| format!("actor {entity}"));
        log::debug!("Created {name} ({entity})");
        self.actors[slot] = Some(Actor {
            entity,
            name,
            tags: spec.tags,
            transform,
            visual,
            state: spec.state,
            behavior: spec.behavior,
        });
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_frame += 1;
        }
        entity
    }

    // ── Remove ───────────────────────────────────────────────────────

    /// Remove one actor. `false` if it was already gone.
    pub fn remove(&mut self, entity: Entity) -> bool {
        self.remove_all([entity]) == 1
    }

    /// Remove every listed actor in one pass and dispose their visuals.
    /// Duplicates and stale handles are ignored. Returns how many actors
    /// were removed.
    pub fn remove_all(&mut self, entities: impl IntoIterator<Item = Entity>) -> usize {
        let doomed: BTreeSet<Entity> = entities
            .into_iter()
            .filter(|&e| self.allocator.is_alive(e))
            .collect();

        let removed: Vec<Actor> = doomed.into_iter().filter_map(|e| self.detach(e)).collect();
        for actor in &removed {
            self.visuals.remove_from_scene(actor.visual);
            self.visuals.dispose(actor.visual);
            log::debug!("Removed {} ({})", actor.name, actor.entity);
        }
        removed.len()
    }

    /// Take an actor out of the arena and free its slot.
    fn detach(&mut self, entity: Entity) -> Option<Actor> {
        let actor = self.actors.get_mut(entity.index as usize)?.take()?;
        self.allocator.deallocate(entity);
        #[cfg(feature = "diagnostics")]
        {
            self.despawned_this_frame += 1;
        }
        Some(actor)
    }

    /// Remove every actor.
    pub fn clear(&mut self) -> usize {
        let all = self.live_entities();
        self.remove_all(all)
    }

    // ── Tag queries ──────────────────────────────────────────────────

    /// Live actors carrying at least one of `query`, in arena order.
    pub fn get_by_tags<S: AsRef<str>>(&self, query: &[S]) -> Vec<Entity> {
        self.actors()
            .filter(|actor| actor.tags.matches_any(query))
            .map(|actor| actor.entity)
            .collect()
    }

    /// Remove live actors carrying every one of `query`. Returns the count.
    pub fn remove_by_tags<S: AsRef<str>>(&mut self, query: &[S]) -> usize {
        let doomed: Vec<Entity> = self
            .actors()
            .filter(|actor| actor.tags.matches_all(query))
            .map(|actor| actor.entity)
            .collect();
        self.remove_all(doomed)
    }

    // ── Access ───────────────────────────────────────────────────────

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Handles of every live actor, in arena order.
    pub fn live_entities(&self) -> Vec<Entity> {
        self.actors().map(|a| a.entity).collect()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter().flatten()
    }

    pub fn get(&self, entity: Entity) -> Option<&Actor> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.actors.get(entity.index as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut Actor> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.actors.get_mut(entity.index as usize)?.as_mut()
    }

    pub fn position(&self, entity: Entity) -> Option<Vec3> {
        self.get(entity).map(Actor::position)
    }

    pub fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform> {
        self.get_mut(entity).map(|a| &mut a.transform)
    }

    /// The actor's state blob, if it has one of type `T`.
    pub fn state<T: Any>(&self, entity: Entity) -> Option<&T> {
        self.get(entity)?.state.as_ref()?.downcast_ref()
    }

    pub fn state_mut<T: Any>(&mut self, entity: Entity) -> Option<&mut T> {
        self.get_mut(entity)?.state.as_mut()?.downcast_mut()
    }

    /// Replace the actor's state. `false` if the actor is gone.
    pub fn set_state<T: Any>(&mut self, entity: Entity, state: T) -> bool {
        match self.get_mut(entity) {
            Some(actor) => {
                actor.state = Some(Box::new(state));
                true
            }
            None => false,
        }
    }

    /// Lend the actor's behavior out for one call.
    pub(crate) fn take_behavior(&mut self, entity: Entity) -> Option<Box<dyn Behavior>> {
        self.get_mut(entity)?.behavior.take()
    }

    /// Return a lent behavior. Dropped if the actor died meanwhile or got a
    /// new behavior.
    pub(crate) fn restore_behavior(&mut self, entity: Entity, behavior: Box<dyn Behavior>) {
        if let Some(actor) = self.get_mut(entity) {
            actor.behavior.get_or_insert(behavior);
        }
    }

    /// Replace the actor's behavior. `false` if the actor is gone.
    pub fn set_behavior(&mut self, entity: Entity, behavior: impl Behavior + 'static) -> bool {
        match self.get_mut(entity) {
            Some(actor) => {
                actor.behavior = Some(Box::new(behavior));
                true
            }
            None => false,
        }
    }

    // ── Visuals ──────────────────────────────────────────────────────

    /// Push every actor's transform to its visual.
    pub fn sync_visuals(&mut self) {
        for actor in self.actors.iter().flatten() {
            let t = &actor.transform;
            self.visuals.set_position(actor.visual, t.translation);
            self.visuals.set_rotation(actor.visual, t.rotation);
            self.visuals.set_scale(actor.visual, t.scale);
        }
    }

    pub fn visuals_mut(&mut self) -> &mut dyn VisualProvider {
        self.visuals.as_mut()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Registry counters since the last call. Resets the per-frame counts.
    #[cfg(feature = "diagnostics")]
    pub fn take_stats(&mut self) -> EntityStats {
        let stats = EntityStats {
            alive: self.allocator.alive_count(),
            slots: self.allocator.capacity(),
            spawned: self.spawned_this_frame,
            despawned: self.despawned_this_frame,
        };
        self.spawned_this_frame = 0;
        self.despawned_this_frame = 0;
        stats
    }
}
