//! Walks each player's on-screen token toward its authoritative cell,
//! one cell per tick, decoupled from polling cadence.

use crate::types::Address;
use std::collections::BTreeMap;

/// Per-player display positions plus the set of in-progress walks.
///
/// An observation that diverges from the displayed cell starts a walk
/// toward the authoritative cell; further divergence reported while a
/// walk is running is ignored until that walk completes, so a player
/// never has two competing animations.
#[derive(Debug, Default)]
pub struct Animator {
    display: BTreeMap<Address, u16>,
    targets: BTreeMap<Address, u16>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the display map from a previously persisted snapshot, so a
    /// restart resumes from the last rendered cell.
    pub fn from_saved(saved: BTreeMap<Address, u16>) -> Self {
        Animator {
            display: saved,
            targets: BTreeMap::new(),
        }
    }

    pub fn display_position(&self, player: Address) -> Option<u16> {
        self.display.get(&player).copied()
    }

    /// The full displayed-position map, as persisted per room.
    pub fn positions(&self) -> &BTreeMap<Address, u16> {
        &self.display
    }

    pub fn is_animating(&self, player: Address) -> bool {
        self.targets.contains_key(&player)
    }

    pub fn active_walks(&self) -> usize {
        self.targets.len()
    }

    /// Feed one authoritative position observation. Returns true when
    /// the display map changed (i.e. a first observation seeded it).
    pub fn observe(&mut self, player: Address, authoritative: u16) -> bool {
        let Some(shown) = self.display.get(&player).copied() else {
            // First sighting: snap, nothing to animate.
            self.display.insert(player, authoritative);
            return true;
        };
        if shown == authoritative || self.targets.contains_key(&player) {
            return false;
        }
        self.targets.insert(player, authoritative);
        false
    }

    /// One animation tick: every active walk advances a single cell
    /// toward its target, finished walks are dropped. Returns true when
    /// any display position changed.
    pub fn tick(&mut self) -> bool {
        if self.targets.is_empty() {
            return false;
        }
        let mut changed = false;
        let mut done = Vec::new();
        for (player, target) in &self.targets {
            let Some(shown) = self.display.get_mut(player) else {
                done.push(*player);
                continue;
            };
            if *shown < *target {
                *shown += 1;
            } else if *shown > *target {
                *shown -= 1;
            }
            changed = true;
            if shown == target {
                done.push(*player);
            }
        }
        for player in done {
            self.targets.remove(&player);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use proptest::prelude::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn observe__first_sighting_snaps_without_animating() {
        // given
        let mut animator = Animator::new();

        // when
        let changed = animator.observe(addr(1), 7);

        // then
        assert!(changed);
        assert_eq!(animator.display_position(addr(1)), Some(7));
        assert!(!animator.is_animating(addr(1)));
    }

    #[test]
    fn tick__walks_one_cell_per_tick_and_stops_exactly_on_target() {
        // given a token shown at 4 with authoritative position 9
        let mut animator = Animator::new();
        animator.observe(addr(1), 4);
        animator.observe(addr(1), 9);
        assert!(animator.is_animating(addr(1)));

        // when ticked five times
        for expected in [5, 6, 7, 8, 9] {
            assert!(animator.tick());
            assert_eq!(animator.display_position(addr(1)), Some(expected));
        }

        // then the walk is finished and further ticks are no-ops
        assert!(!animator.is_animating(addr(1)));
        assert!(!animator.tick());
        assert_eq!(animator.display_position(addr(1)), Some(9));
    }

    #[test]
    fn tick__walks_backwards_after_a_snake() {
        let mut animator = Animator::new();
        animator.observe(addr(1), 17);
        animator.observe(addr(1), 7);

        let mut ticks = 0;
        while animator.is_animating(addr(1)) {
            animator.tick();
            ticks += 1;
        }

        assert_eq!(ticks, 10);
        assert_eq!(animator.display_position(addr(1)), Some(7));
    }

    #[test]
    fn observe__divergence_during_a_walk_is_ignored_until_it_finishes() {
        // given a walk from 1 toward 5
        let mut animator = Animator::new();
        animator.observe(addr(1), 1);
        animator.observe(addr(1), 5);
        animator.tick();

        // when a newer authoritative position arrives mid-walk
        animator.observe(addr(1), 20);

        // then the running walk still ends at 5
        while animator.is_animating(addr(1)) {
            animator.tick();
        }
        assert_eq!(animator.display_position(addr(1)), Some(5));

        // and the next observation starts a fresh walk toward 20
        animator.observe(addr(1), 20);
        assert!(animator.is_animating(addr(1)));
    }

    #[test]
    fn tick__players_animate_independently() {
        let mut animator = Animator::new();
        animator.observe(addr(1), 1);
        animator.observe(addr(2), 10);
        animator.observe(addr(1), 3);
        animator.observe(addr(2), 8);
        assert_eq!(animator.active_walks(), 2);

        animator.tick();
        assert_eq!(animator.display_position(addr(1)), Some(2));
        assert_eq!(animator.display_position(addr(2)), Some(9));

        animator.tick();
        assert_eq!(animator.active_walks(), 0);
    }

    proptest! {
        /// A walk converges in exactly |target - start| ticks and never
        /// oversteps the target on the way.
        #[test]
        fn tick__converges_without_overshoot(start in 1u16..=100, target in 1u16..=100) {
            let mut animator = Animator::new();
            animator.observe(addr(1), start);
            animator.observe(addr(1), target);

            let span = start.abs_diff(target);
            let low = start.min(target);
            let high = start.max(target);
            for _ in 0..span {
                animator.tick();
                let shown = animator.display_position(addr(1)).unwrap();
                prop_assert!(shown >= low && shown <= high);
            }
            prop_assert_eq!(animator.display_position(addr(1)), Some(target));
            prop_assert!(!animator.is_animating(addr(1)));
        }
    }
}
