//! Client-side mirrors of other players.
//!
//! Each [`RemoteEntity`] keeps two copies of its pose: the rendered one and
//! the target last received from the relay. Updates only move the target.
//! Every frame the rendered pose covers a fixed fraction of the remaining
//! distance, an exponential smoother that needs no knowledge of when updates
//! arrive.
//!
//! Updates are applied in arrival order with no sequence check, so a stale
//! `player_update` delivered late will pull the target back.

use std::collections::BTreeMap;

use blockwire_net::{AnimationState, PlayerId, PlayerInfo, PlayerState, Skin};
use glam::{DVec2, DVec3};

use crate::animation::{LimbPose, limb_pose};

/// Default fraction of the remaining distance covered per frame.
pub const DEFAULT_LERP_FACTOR: f64 = 0.2;

/// One other player, as this client sees them.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntity {
    id: PlayerId,
    name: String,
    skin: Skin,
    position: DVec3,
    rotation: DVec2,
    target_position: DVec3,
    target_rotation: DVec2,
    velocity: DVec3,
    on_ground: bool,
    animation: AnimationState,
}

impl RemoteEntity {
    /// Rendered and target pose both start at the announced spawn.
    pub fn from_info(info: PlayerInfo) -> Self {
        let position = DVec3::from(info.position);
        let rotation = DVec2::from(info.rotation);
        Self {
            id: info.id,
            name: info.name,
            skin: info.skin,
            position,
            rotation,
            target_position: position,
            target_rotation: rotation,
            velocity: DVec3::ZERO,
            on_ground: true,
            animation: AnimationState::Idle,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn skin(&self) -> &Skin {
        &self.skin
    }

    /// Rendered position.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Rendered rotation; `x` pitch, `y` yaw.
    pub fn rotation(&self) -> DVec2 {
        self.rotation
    }

    pub fn target_position(&self) -> DVec3 {
        self.target_position
    }

    pub fn target_rotation(&self) -> DVec2 {
        self.target_rotation
    }

    /// Last reported velocity.
    pub fn velocity(&self) -> DVec3 {
        self.velocity
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    /// Limb pose for the rendering side at `time_secs`.
    pub fn limb_pose(&self, time_secs: f64) -> LimbPose {
        limb_pose(self.animation, time_secs)
    }

    /// Retarget from a relay update. The rendered pose is left alone.
    pub fn apply_update(&mut self, state: &PlayerState) {
        self.target_position = state.position.into();
        self.target_rotation = state.rotation.into();
        self.velocity = state.velocity.into();
        self.on_ground = state.on_ground;
        self.animation = state.animation;
    }

    /// Move the rendered pose `factor` of the way to the target.
    pub fn step(&mut self, factor: f64) {
        self.position += (self.target_position - self.position) * factor;
        self.rotation += (self.target_rotation - self.rotation) * factor;
    }
}

/// Every remote player this client knows about, keyed by id.
#[derive(Debug, Clone)]
pub struct RemoteEntityStore {
    entities: BTreeMap<PlayerId, RemoteEntity>,
    lerp_factor: f64,
}

impl RemoteEntityStore {
    /// `lerp_factor` is clamped to `[0, 1]` so the smoother never overshoots.
    pub fn new(lerp_factor: f64) -> Self {
        let lerp_factor = if lerp_factor.is_finite() {
            lerp_factor.clamp(0.0, 1.0)
        } else {
            DEFAULT_LERP_FACTOR
        };
        Self {
            entities: BTreeMap::new(),
            lerp_factor,
        }
    }

    pub fn lerp_factor(&self) -> f64 {
        self.lerp_factor
    }

    /// Create an entity from a roster entry or join notice. Returns `false`
    /// if the id is already known, in which case nothing changes.
    pub fn spawn(&mut self, info: PlayerInfo) -> bool {
        if self.entities.contains_key(&info.id) {
            return false;
        }
        self.entities.insert(info.id, RemoteEntity::from_info(info));
        true
    }

    /// Returns `false` for an unknown id.
    pub fn apply_update(&mut self, id: PlayerId, state: &PlayerState) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.apply_update(state);
                true
            }
            None => false,
        }
    }

    /// Stop tracking an entity. Whatever the renderer attached to it is the
    /// renderer's to release.
    pub fn despawn(&mut self, id: PlayerId) -> Option<RemoteEntity> {
        self.entities.remove(&id)
    }

    /// Advance every entity by one frame.
    pub fn interpolate(&mut self) {
        for entity in self.entities.values_mut() {
            entity.step(self.lerp_factor);
        }
    }

    pub fn get(&self, id: PlayerId) -> Option<&RemoteEntity> {
        self.entities.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

impl Default for RemoteEntityStore {
    fn default() -> Self {
        Self::new(DEFAULT_LERP_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwire_net::{Rotation, Vector3};

    fn info(id: u64, x: f64) -> PlayerInfo {
        PlayerInfo {
            id: PlayerId(id),
            name: format!("p{id}"),
            skin: Skin::default(),
            position: Vector3::new(x, 70.0, 0.0),
            rotation: Rotation::new(0.0, 0.0),
        }
    }

    fn moved_to(x: f64, yaw: f64) -> PlayerState {
        PlayerState {
            position: Vector3::new(x, 70.0, 0.0),
            rotation: Rotation::new(0.0, yaw),
            animation: AnimationState::Walk,
            on_ground: true,
            ..PlayerState::default()
        }
    }

    #[test]
    fn test_spawn_starts_at_announced_pose() {
        let mut store = RemoteEntityStore::default();
        assert!(store.spawn(info(1, 12.0)));

        let entity = store.get(PlayerId(1)).unwrap();
        assert_eq!(entity.position(), DVec3::new(12.0, 70.0, 0.0));
        assert_eq!(entity.target_position(), entity.position());

        store.interpolate();
        assert_eq!(store.get(PlayerId(1)).unwrap().position().x, 12.0);
    }

    #[test]
    fn test_duplicate_spawn_is_ignored() {
        let mut store = RemoteEntityStore::default();
        store.spawn(info(1, 0.0));
        store.apply_update(PlayerId(1), &moved_to(10.0, 0.0));
        assert!(!store.spawn(info(1, 0.0)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(PlayerId(1)).unwrap().target_position().x, 10.0);
    }

    #[test]
    fn test_update_moves_target_not_rendered() {
        let mut store = RemoteEntityStore::default();
        store.spawn(info(1, 0.0));
        assert!(store.apply_update(PlayerId(1), &moved_to(10.0, 1.0)));

        let entity = store.get(PlayerId(1)).unwrap();
        assert_eq!(entity.position().x, 0.0);
        assert_eq!(entity.target_position().x, 10.0);
        assert_eq!(entity.target_rotation().y, 1.0);
        assert_eq!(entity.animation(), AnimationState::Walk);
    }

    #[test]
    fn test_update_for_unknown_id_is_ignored() {
        let mut store = RemoteEntityStore::default();
        assert!(!store.apply_update(PlayerId(9), &moved_to(1.0, 0.0)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_single_step_covers_a_fifth() {
        let mut store = RemoteEntityStore::default();
        store.spawn(info(1, 0.0));
        store.apply_update(PlayerId(1), &moved_to(10.0, 1.0));
        store.interpolate();

        let entity = store.get(PlayerId(1)).unwrap();
        assert!((entity.position().x - 2.0).abs() < 1e-12);
        assert!((entity.rotation().y - 0.2).abs() < 1e-12);
        assert_eq!(entity.position().y, 70.0);
    }

    #[test]
    fn test_converges_without_overshoot() {
        let mut store = RemoteEntityStore::default();
        store.spawn(info(1, -5.0));
        store.apply_update(PlayerId(1), &moved_to(25.0, -2.0));

        let mut previous = -5.0;
        for _ in 0..200 {
            store.interpolate();
            let x = store.get(PlayerId(1)).unwrap().position().x;
            assert!(x >= previous, "must approach monotonically");
            assert!(x <= 25.0, "must never pass the target");
            previous = x;
        }
        let entity = store.get(PlayerId(1)).unwrap();
        assert!((entity.position().x - 25.0).abs() < 1e-9);
        assert!((entity.rotation().y + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_factor_is_clamped() {
        assert_eq!(RemoteEntityStore::new(3.0).lerp_factor(), 1.0);
        assert_eq!(RemoteEntityStore::new(-1.0).lerp_factor(), 0.0);
        assert_eq!(
            RemoteEntityStore::new(f64::NAN).lerp_factor(),
            DEFAULT_LERP_FACTOR
        );

        let mut snap = RemoteEntityStore::new(1.0);
        snap.spawn(info(1, 0.0));
        snap.apply_update(PlayerId(1), &moved_to(4.0, 0.0));
        snap.interpolate();
        assert_eq!(snap.get(PlayerId(1)).unwrap().position().x, 4.0);
    }

    #[test]
    fn test_despawn_forgets_entity() {
        let mut store = RemoteEntityStore::default();
        store.spawn(info(1, 0.0));
        store.spawn(info(2, 0.0));

        let removed = store.despawn(PlayerId(1)).unwrap();
        assert_eq!(removed.name(), "p1");
        assert!(store.get(PlayerId(1)).is_none());
        assert!(store.despawn(PlayerId(1)).is_none());
        let remaining: Vec<_> = store.iter().map(RemoteEntity::id).collect();
        assert_eq!(remaining, vec![PlayerId(2)]);
    }

    #[test]
    fn test_limb_pose_follows_animation() {
        let mut store = RemoteEntityStore::default();
        store.spawn(info(1, 0.0));
        let entity = store.get(PlayerId(1)).unwrap();
        assert_eq!(entity.limb_pose(0.157), LimbPose::REST);

        store.apply_update(PlayerId(1), &moved_to(1.0, 0.0));
        let entity = store.get(PlayerId(1)).unwrap();
        assert_ne!(entity.limb_pose(0.157), LimbPose::REST);
    }
}
