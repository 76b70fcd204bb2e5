//! Whose turn is it, and may the local player act?
//!
//! Turn advancement is never computed here; the gateway's reported
//! current player is the only source of truth.

use crate::types::{
    Address,
    Room,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnStatus {
    /// No current player reported yet (room idle, or waiting for the
    /// next sync). No player is highlighted.
    Waiting,
    Mine,
    Theirs(Address),
    Finished(Address),
}

/// Pure function of the polled room state and the connected address.
pub fn resolve(
    room: Option<&Room>,
    current_player: Option<Address>,
    me: Address,
) -> TurnStatus {
    if let Some(room) = room
        && let Some(winner) = room.winner
    {
        return TurnStatus::Finished(winner);
    }
    match current_player {
        None => TurnStatus::Waiting,
        Some(current) if current.is_zero() => TurnStatus::Waiting,
        Some(current) if current == me => TurnStatus::Mine,
        Some(current) => TurnStatus::Theirs(current),
    }
}

/// Gate for the dice control. Disabled whenever a roll is in flight,
/// regardless of turn.
pub fn dice_enabled(status: TurnStatus, roll_in_flight: bool) -> bool {
    matches!(status, TurnStatus::Mine) && !roll_in_flight
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use std::str::FromStr;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn started_room() -> Room {
        Room {
            id: 1,
            creator: addr(1),
            required_participants: 2,
            max_participants: 4,
            stake_amount: 100,
            started: true,
            game_start_time: 1000,
            winner: None,
            metadata_uri: String::new(),
        }
    }

    #[test]
    fn resolve__my_address_yields_mine() {
        let room = started_room();
        let status = resolve(Some(&room), Some(addr(1)), addr(1));
        assert_eq!(status, TurnStatus::Mine);
    }

    #[test]
    fn resolve__address_compare_ignores_hex_case() {
        let room = started_room();
        let me = Address::from_str("0xAbCdEf0102030405060708090A0B0C0D0E0F1011")
            .unwrap();
        let reported =
            Address::from_str("0xabcdef0102030405060708090a0b0c0d0e0f1011")
                .unwrap();

        let status = resolve(Some(&room), Some(reported), me);

        assert_eq!(status, TurnStatus::Mine);
    }

    #[test]
    fn resolve__zero_current_player_means_waiting() {
        let room = started_room();
        assert_eq!(
            resolve(Some(&room), Some(Address::ZERO), addr(1)),
            TurnStatus::Waiting
        );
        assert_eq!(resolve(Some(&room), None, addr(1)), TurnStatus::Waiting);
    }

    #[test]
    fn resolve__winner_takes_precedence_over_current_player() {
        let mut room = started_room();
        room.winner = Some(addr(2));
        let status = resolve(Some(&room), Some(addr(1)), addr(1));
        assert_eq!(status, TurnStatus::Finished(addr(2)));
    }

    #[test]
    fn resolve__same_inputs_always_yield_same_answer() {
        let room = started_room();
        let first = resolve(Some(&room), Some(addr(2)), addr(1));
        for _ in 0..10 {
            assert_eq!(resolve(Some(&room), Some(addr(2)), addr(1)), first);
        }
        assert_eq!(first, TurnStatus::Theirs(addr(2)));
    }

    #[test]
    fn dice_enabled__requires_my_turn_and_no_roll_in_flight() {
        assert!(dice_enabled(TurnStatus::Mine, false));
        assert!(!dice_enabled(TurnStatus::Mine, true));
        assert!(!dice_enabled(TurnStatus::Theirs(addr(2)), false));
        assert!(!dice_enabled(TurnStatus::Waiting, false));
        assert!(!dice_enabled(TurnStatus::Finished(addr(2)), false));
    }
}
