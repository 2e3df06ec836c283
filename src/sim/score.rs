//! Score ledger and pickup collection

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::scene::{EntityId, SceneCommand};
use super::state::World;

/// Count of collected pickups for the current run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLedger {
    score: u32,
}

impl ScoreLedger {
    pub fn get(&self) -> u32 {
        self.score
    }

    /// Record one pickup; returns the new score
    pub fn collect(&mut self) -> u32 {
        self.score += 1;
        self.score
    }

    pub fn reset(&mut self) {
        self.score = 0;
    }
}

impl World {
    /// Zero the score (display is told through a `ScoreChanged` command)
    pub fn reset_score(&mut self) {
        self.score.reset();
        self.outbox.push(SceneCommand::ScoreChanged(0));
        log::info!("Score reset");
    }

    /// Collect every pickup within the collection radius of `player`
    ///
    /// Returns how many were collected this call.
    pub fn check_collectible_proximity(&mut self, player: Vec3) -> u32 {
        let radius = self.tuning.collection_radius;
        let in_reach: Vec<EntityId> = self
            .collectibles
            .iter()
            .filter(|c| !c.collected && c.pos.distance(player) < radius)
            .map(|c| c.id)
            .collect();
        in_reach.into_iter().filter(|&id| self.collect(id)).count() as u32
    }

    /// Collect one pickup by id
    ///
    /// Idempotent: returns false if the pickup is unknown or already taken.
    pub fn collect(&mut self, id: EntityId) -> bool {
        let Ok(index) = self.collectibles.binary_search_by_key(&id, |c| c.id) else {
            return false;
        };
        if self.collectibles[index].collected {
            return false;
        }
        let mut collectible = self.collectibles.remove(index);
        collectible.collected = true;

        let score = self.score.collect();
        self.outbox.push(SceneCommand::ScoreChanged(score));
        // Body goes now; the node stays until the collect animation ends
        self.outbox.push(SceneCommand::RemoveBody(id));

        let now = self.time_ticks;
        self.effects.spawn_sparkle(collectible.pos, now);
        self.effects
            .spawn_collect(id, collectible.pos, collectible.rotation(), now);

        log::debug!(
            "Collected {} {} (score {})",
            collectible.kind.as_str(),
            id.0,
            score
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collectible::CollectibleKind;

    #[test]
    fn test_ledger_counts_and_resets() {
        let mut ledger = ScoreLedger::default();
        assert_eq!(ledger.collect(), 1);
        assert_eq!(ledger.collect(), 2);
        ledger.reset();
        assert_eq!(ledger.get(), 0);
    }

    #[test]
    fn test_collect_is_idempotent() {
        let mut w = World::with_seed(8);
        let id = w.spawn_collectible(CollectibleKind::Coin, Vec3::new(0.0, 1.5, -4.0));
        w.drain_commands();

        assert!(w.collect(id));
        assert!(!w.collect(id));
        assert_eq!(w.score(), 1);
        assert!(w.collectibles().is_empty());

        let commands = w.drain_commands();
        assert!(commands.contains(&SceneCommand::ScoreChanged(1)));
        assert_eq!(
            commands
                .iter()
                .filter(|c| **c == SceneCommand::RemoveBody(id))
                .count(),
            1
        );
        // Node survives until the animation releases it
        assert!(!commands.contains(&SceneCommand::RemoveNode(id)));
    }

    #[test]
    fn test_proximity_collects_within_radius_only() {
        let mut w = World::with_seed(8);
        w.spawn_collectible(CollectibleKind::Coin, Vec3::new(0.0, 0.0, -1.0));
        w.spawn_collectible(CollectibleKind::Gem, Vec3::new(0.0, 1.0, -1.0));
        let far = w.spawn_collectible(CollectibleKind::Star, Vec3::new(0.0, 0.0, -5.0));

        assert_eq!(w.check_collectible_proximity(Vec3::ZERO), 2);
        assert_eq!(w.check_collectible_proximity(Vec3::ZERO), 0);
        assert_eq!(w.score(), 2);
        assert_eq!(w.collectibles().len(), 1);
        assert_eq!(w.collectibles()[0].id, far);
    }

    #[test]
    fn test_reset_score_notifies_display() {
        let mut w = World::with_seed(8);
        let id = w.spawn_collectible(CollectibleKind::Coin, Vec3::ZERO);
        w.collect(id);
        w.reset_score();
        assert_eq!(w.score(), 0);
        assert_eq!(w.drain_commands().last(), Some(&SceneCommand::ScoreChanged(0)));
    }

    #[test]
    fn test_exactly_at_radius_is_not_collected() {
        let mut w = World::with_seed(8);
        w.spawn_collectible(CollectibleKind::Coin, Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(w.check_collectible_proximity(Vec3::ZERO), 0);
    }
}
