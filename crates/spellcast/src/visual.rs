//! # Visuals: the Seam to the Renderer
//!
//! The simulation owns no GPU state. Each entity holds an opaque
//! [`VisualHandle`] minted by a [`VisualProvider`]; the registry creates the
//! handle when the entity is created and disposes it exactly once when the
//! entity is removed. A [`Viewport`] answers "what is under the pointer" and
//! draws the frame.
//!
//! ```text
//!  World::create ──► provider.create(shape) ──► add_to_scene
//!  each frame    ──► set_position / set_scale / set_rotation
//!  World::remove ──► (leave live set) ──► remove_from_scene ──► dispose
//! ```
//!
//! [`HeadlessVisuals`] and [`HeadlessViewport`] implement both seams without a
//! renderer. They back the headless example and the test-suite: the provider
//! keeps a shared [`VisualLedger`] counting every create and dispose.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};

use crate::ecs::World;

/// Colors as `0xRRGGBB`.
pub mod colors {
    pub const RED: u32 = 0xFF0000;
    pub const PURPLE: u32 = 0x690069;
}

/// Opaque handle to a renderable owned by the [`VisualProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u64);

/// What to draw for an entity. The core only ever asks for boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeDescriptor {
    pub size: Vec3,
    pub color: u32,
}

impl ShapeDescriptor {
    /// A cube with the given side length.
    pub fn cube(side: f32, color: u32) -> Self {
        Self {
            size: Vec3::splat(side),
            color,
        }
    }
}

impl Default for ShapeDescriptor {
    /// Unit purple cube.
    fn default() -> Self {
        Self::cube(1.0, colors::PURPLE)
    }
}

/// Supplies and disposes renderable representations.
pub trait VisualProvider {
    fn create(&mut self, shape: &ShapeDescriptor) -> VisualHandle;
    /// Release the renderable. Called exactly once per handle.
    fn dispose(&mut self, handle: VisualHandle);
    fn add_to_scene(&mut self, handle: VisualHandle);
    fn remove_from_scene(&mut self, handle: VisualHandle);
    fn set_position(&mut self, handle: VisualHandle, position: Vec3);
    fn set_scale(&mut self, handle: VisualHandle, scale: Vec3);
    fn set_rotation(&mut self, _handle: VisualHandle, _rotation: Quat) {}
}

/// Picking and drawing.
pub trait Viewport {
    /// The point on the play plane under the pointer, given in normalized
    /// device coordinates. `None` when the pointer ray misses.
    fn pick(&mut self, pointer: Vec2) -> Option<Vec3>;
    /// Draw the current scene.
    fn render(&mut self, world: &World);
}

// ── Headless provider ───────────────────────────────────────────────────

/// Bookkeeping for [`HeadlessVisuals`]. Shared through `Rc<RefCell<_>>` so the
/// host can inspect it after handing the provider to a [`World`].
#[derive(Debug, Default)]
pub struct VisualLedger {
    next: u64,
    created: usize,
    disposed: usize,
    /// Disposals of handles that were never created or already disposed.
    invalid_disposals: usize,
    /// Disposals of handles still attached to the scene.
    disposed_in_scene: usize,
    live: HashSet<VisualHandle>,
    in_scene: HashSet<VisualHandle>,
    shapes: HashMap<VisualHandle, ShapeDescriptor>,
    positions: HashMap<VisualHandle, Vec3>,
}

impl VisualLedger {
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn disposed(&self) -> usize {
        self.disposed
    }

    pub fn invalid_disposals(&self) -> usize {
        self.invalid_disposals
    }

    pub fn disposed_in_scene(&self) -> usize {
        self.disposed_in_scene
    }

    /// Number of handles created and not yet disposed.
    pub fn live(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: VisualHandle) -> bool {
        self.live.contains(&handle)
    }

    pub fn in_scene(&self, handle: VisualHandle) -> bool {
        self.in_scene.contains(&handle)
    }

    pub fn shape(&self, handle: VisualHandle) -> Option<ShapeDescriptor> {
        self.shapes.get(&handle).copied()
    }

    /// Last position pushed for the handle.
    pub fn position(&self, handle: VisualHandle) -> Option<Vec3> {
        self.positions.get(&handle).copied()
    }
}

/// A [`VisualProvider`] that draws nothing and records everything.
#[derive(Default)]
pub struct HeadlessVisuals {
    ledger: Rc<RefCell<VisualLedger>>,
}

impl HeadlessVisuals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the bookkeeping.
    pub fn ledger(&self) -> Rc<RefCell<VisualLedger>> {
        Rc::clone(&self.ledger)
    }
}

impl VisualProvider for HeadlessVisuals {
    fn create(&mut self, shape: &ShapeDescriptor) -> VisualHandle {
        let mut ledger = self.ledger.borrow_mut();
        let handle = VisualHandle(ledger.next);
        ledger.next += 1;
        ledger.created += 1;
        ledger.live.insert(handle);
        ledger.shapes.insert(handle, *shape);
        handle
    }

    fn dispose(&mut self, handle: VisualHandle) {
        let mut ledger = self.ledger.borrow_mut();
        if !ledger.live.remove(&handle) {
            log::error!("Dispose of unknown or already disposed visual {handle:?}");
            ledger.invalid_disposals += 1;
            return;
        }
        if ledger.in_scene.remove(&handle) {
            log::error!("Visual {handle:?} disposed while still in the scene");
            ledger.disposed_in_scene += 1;
        }
        ledger.disposed += 1;
        ledger.shapes.remove(&handle);
        ledger.positions.remove(&handle);
    }

    fn add_to_scene(&mut self, handle: VisualHandle) {
        self.ledger.borrow_mut().in_scene.insert(handle);
    }

    fn remove_from_scene(&mut self, handle: VisualHandle) {
        self.ledger.borrow_mut().in_scene.remove(&handle);
    }

    fn set_position(&mut self, handle: VisualHandle, position: Vec3) {
        self.ledger.borrow_mut().positions.insert(handle, position);
    }

    fn set_scale(&mut self, _handle: VisualHandle, _scale: Vec3) {}
}

// ── Headless viewport ───────────────────────────────────────────────────

/// A perspective camera looking down `-z` at the play plane.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    /// Width / height.
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 30.0),
            fov_y: 35.0,
            aspect: 1.0,
        }
    }
}

impl Camera {
    /// World-space ray through a point in normalized device coordinates.
    /// Returns `(origin, direction)` with a unit direction.
    pub fn ray(&self, ndc: Vec2) -> (Vec3, Vec3) {
        let half = (self.fov_y.to_radians() * 0.5).tan();
        let dir = Vec3::new(ndc.x * half * self.aspect, ndc.y * half, -1.0).normalize();
        (self.position, dir)
    }

    /// Intersect the ray through `ndc` with the `z = 0` plane.
    pub fn pick_plane(&self, ndc: Vec2) -> Option<Vec3> {
        let (origin, dir) = self.ray(ndc);
        if dir.z.abs() <= f32::EPSILON {
            return None;
        }
        let t = -origin.z / dir.z;
        if t < 0.0 {
            return None;
        }
        Some((origin + dir * t).with_z(0.0))
    }
}

/// A [`Viewport`] that picks against the play plane and counts frames.
#[derive(Debug, Default)]
pub struct HeadlessViewport {
    pub camera: Camera,
    frames: u64,
}

impl HeadlessViewport {
    pub fn new(camera: Camera) -> Self {
        Self { camera, frames: 0 }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Viewport for HeadlessViewport {
    fn pick(&mut self, pointer: Vec2) -> Option<Vec3> {
        self.camera.pick_plane(pointer)
    }

    fn render(&mut self, world: &World) {
        self.frames += 1;
        log::trace!("frame {}: {} entities", self.frames, world.entity_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_counts_create_and_dispose() {
        let mut visuals = HeadlessVisuals::new();
        let ledger = visuals.ledger();
        let a = visuals.create(&ShapeDescriptor::default());
        let b = visuals.create(&ShapeDescriptor::cube(0.1, colors::RED));
        assert_ne!(a, b);
        visuals.dispose(a);
        let l = ledger.borrow();
        assert_eq!((l.created(), l.disposed(), l.live()), (2, 1, 1));
        assert!(l.is_live(b));
        assert_eq!(l.shape(b).unwrap().color, colors::RED);
    }

    #[test]
    fn double_dispose_is_recorded_not_counted() {
        let mut visuals = HeadlessVisuals::new();
        let ledger = visuals.ledger();
        let a = visuals.create(&ShapeDescriptor::default());
        visuals.dispose(a);
        visuals.dispose(a);
        assert_eq!(ledger.borrow().disposed(), 1);
        assert_eq!(ledger.borrow().invalid_disposals(), 1);
    }

    #[test]
    fn dispose_before_leaving_scene_is_recorded() {
        let mut visuals = HeadlessVisuals::new();
        let ledger = visuals.ledger();
        let a = visuals.create(&ShapeDescriptor::default());
        let b = visuals.create(&ShapeDescriptor::default());
        visuals.add_to_scene(a);
        visuals.add_to_scene(b);
        visuals.dispose(a);
        visuals.remove_from_scene(b);
        visuals.dispose(b);
        let l = ledger.borrow();
        assert_eq!((l.disposed(), l.disposed_in_scene()), (2, 1));
        assert!(!l.in_scene(a));
    }

    #[test]
    fn center_pick_hits_below_camera() {
        let camera = Camera {
            position: Vec3::new(4.0, -2.0, 30.0),
            ..Camera::default()
        };
        let hit = camera.pick_plane(Vec2::ZERO).unwrap();
        assert!(hit.distance(Vec3::new(4.0, -2.0, 0.0)) < 1e-4);
    }

    #[test]
    fn edge_pick_matches_field_of_view() {
        let camera = Camera::default();
        let hit = camera.pick_plane(Vec2::new(0.0, 1.0)).unwrap();
        let expected = 30.0 * (17.5f32).to_radians().tan();
        assert!((hit.y - expected).abs() < 1e-3);
        assert!(hit.x.abs() < 1e-5);
    }

    #[test]
    fn camera_below_plane_misses() {
        let camera = Camera {
            position: Vec3::new(0.0, 0.0, -5.0),
            ..Camera::default()
        };
        assert_eq!(camera.pick_plane(Vec2::ZERO), None);
    }
}
