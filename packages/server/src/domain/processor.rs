//! Command processor: a pure transition function over playback state.
//!
//! `process` never touches the clock, the network, or the roster. The hub
//! passes in the caller's live role and the current server time and applies
//! the returned state itself.

use super::{
    command::Command,
    entity::PlaybackState,
    error::{ProcessorError, ValueObjectError},
    event::{Event, EventKind},
    role::Role,
    value_object::{PartyId, Position, Timestamp},
};

/// What the hub should do with a processed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Replace the state and broadcast the event to the whole roster
    Apply { state: PlaybackState, event: Event },
    /// Send the event to the requesting connection only
    Reply(Event),
    /// Unauthorized: no state change, no event
    Dropped,
}

fn internal(err: ValueObjectError) -> ProcessorError {
    ProcessorError::Internal(err.to_string())
}

/// Map `(state, role, command)` to an outcome.
///
/// # Errors
///
/// Returns `ProcessorError::Internal` when a derived position is not
/// representable. The caller must leave the state untouched in that case.
pub fn process(
    party_id: &PartyId,
    state: &PlaybackState,
    role: Role,
    command: &Command,
    now: Timestamp,
) -> Result<Outcome, ProcessorError> {
    if !role.can_issue(command.kind()) {
        return Ok(Outcome::Dropped);
    }

    let (kind, next) = match command {
        Command::SyncRequest => {
            let view = state.view_at(now).map_err(internal)?;
            return Ok(Outcome::Reply(Event::playback(
                EventKind::Sync,
                party_id.clone(),
                view,
                now,
            )));
        }
        Command::Play => (
            EventKind::Play,
            PlaybackState {
                clip_id: state.clip_id.clone(),
                position: state.effective_position(now).map_err(internal)?,
                is_playing: true,
                updated_at: now,
            },
        ),
        Command::Pause => (
            EventKind::Pause,
            PlaybackState {
                clip_id: state.clip_id.clone(),
                position: state.effective_position(now).map_err(internal)?,
                is_playing: false,
                updated_at: now,
            },
        ),
        // Seeking always pauses so every client lands on the same frame.
        Command::Seek(position) => (
            EventKind::Seek,
            PlaybackState {
                clip_id: state.clip_id.clone(),
                position: *position,
                is_playing: false,
                updated_at: now,
            },
        ),
        Command::Skip(clip_id) => (
            EventKind::Skip,
            PlaybackState {
                clip_id: Some(clip_id.clone()),
                position: Position::ZERO,
                is_playing: true,
                updated_at: now,
            },
        ),
    };

    let view = next.view_at(now).map_err(internal)?;
    Ok(Outcome::Apply {
        state: next,
        event: Event::playback(kind, party_id.clone(), view, now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::ClipId;

    fn party() -> PartyId {
        PartyId::new("party-1".to_string()).unwrap()
    }

    fn state(position: f64, is_playing: bool, updated_at: i64) -> PlaybackState {
        PlaybackState {
            clip_id: Some(ClipId::new("clip-a".to_string()).unwrap()),
            position: Position::new(position).unwrap(),
            is_playing,
            updated_at: Timestamp::new(updated_at),
        }
    }

    fn applied(outcome: Outcome) -> (PlaybackState, Event) {
        match outcome {
            Outcome::Apply { state, event } => (state, event),
            other => panic!("expected Apply, got {other:?}"),
        }
    }

    #[test]
    fn test_play_rebases_position_and_stamps_time() {
        // テスト項目: play は現在の実効位置から再生を開始し、サーバー時刻を刻む
        // given (前提条件):
        let current = state(10.0, false, 1_000);

        // when (操作):
        let outcome = process(&party(), &current, Role::Host, &Command::Play, Timestamp::new(9_000));

        // then (期待する結果):
        let (next, event) = applied(outcome.unwrap());
        assert!(next.is_playing);
        assert_eq!(next.position.seconds(), 10.0);
        assert_eq!(next.updated_at, Timestamp::new(9_000));
        assert_eq!(event.kind, EventKind::Play);
        assert_eq!(event.server_timestamp, Timestamp::new(9_000));
    }

    #[test]
    fn test_pause_freezes_effective_position() {
        // テスト項目: 再生中の pause は経過時間を反映した位置で停止する
        // given (前提条件):
        let current = state(10.0, true, 1_000);

        // when (操作):
        let outcome = process(&party(), &current, Role::CoHost, &Command::Pause, Timestamp::new(4_000));

        // then (期待する結果):
        let (next, event) = applied(outcome.unwrap());
        assert!(!next.is_playing);
        assert_eq!(next.position.seconds(), 13.0);
        assert_eq!(event.playback.unwrap().position.seconds(), 13.0);
    }

    #[test]
    fn test_pause_twice_still_emits_event() {
        // テスト項目: pause を 2 回送っても 2 回目もイベントが発行される
        // given (前提条件):
        let current = state(5.0, true, 0);
        let (after_first, _) = applied(
            process(&party(), &current, Role::Host, &Command::Pause, Timestamp::new(1_000)).unwrap(),
        );

        // when (操作):
        let (after_second, event) = applied(
            process(&party(), &after_first, Role::Host, &Command::Pause, Timestamp::new(2_000)).unwrap(),
        );

        // then (期待する結果):
        assert!(!after_second.is_playing);
        assert_eq!(after_second.position.seconds(), 6.0);
        assert_eq!(event.kind, EventKind::Pause);
    }

    #[test]
    fn test_seek_always_pauses() {
        // テスト項目: seek は常に一時停止状態にする
        // given (前提条件):
        let current = state(10.0, true, 0);

        // when (操作):
        let target = Position::new(42.0).unwrap();
        let outcome = process(&party(), &current, Role::Host, &Command::Seek(target), Timestamp::new(500));

        // then (期待する結果):
        let (next, event) = applied(outcome.unwrap());
        assert!(!next.is_playing);
        assert_eq!(next.position.seconds(), 42.0);
        assert_eq!(event.kind, EventKind::Seek);
    }

    #[test]
    fn test_skip_resets_position_and_plays() {
        // テスト項目: skip はクリップを切り替え、位置 0 から再生する
        // given (前提条件):
        let current = state(10.0, true, 0);
        let clip_b = ClipId::new("B".to_string()).unwrap();

        // when (操作):
        let outcome = process(&party(), &current, Role::CoHost, &Command::Skip(clip_b.clone()), Timestamp::new(500));

        // then (期待する結果):
        let (next, event) = applied(outcome.unwrap());
        assert_eq!(next.clip_id, Some(clip_b.clone()));
        assert_eq!(next.position, Position::ZERO);
        assert!(next.is_playing);
        let view = event.playback.unwrap();
        assert_eq!(view.clip_id, Some(clip_b));
        assert_eq!(view.position.seconds(), 0.0);
        assert!(view.is_playing);
    }

    #[test]
    fn test_viewer_mutations_are_dropped() {
        // テスト項目: viewer の再生操作は黙って破棄される
        let current = state(10.0, false, 0);
        let commands = [
            Command::Play,
            Command::Pause,
            Command::Seek(Position::new(1.0).unwrap()),
            Command::Skip(ClipId::new("B".to_string()).unwrap()),
        ];

        for command in commands {
            let outcome = process(&party(), &current, Role::Viewer, &command, Timestamp::new(1));
            assert_eq!(outcome.unwrap(), Outcome::Dropped);
        }
    }

    #[test]
    fn test_sync_request_replies_with_effective_position() {
        // テスト項目: sync-request は状態を変えずに実効位置を返信する
        // given (前提条件):
        let current = state(10.0, true, 1_000);

        // when (操作):
        let outcome = process(&party(), &current, Role::Viewer, &Command::SyncRequest, Timestamp::new(6_000));

        // then (期待する結果):
        match outcome.unwrap() {
            Outcome::Reply(event) => {
                assert_eq!(event.kind, EventKind::Sync);
                let view = event.playback.unwrap();
                assert_eq!(view.position.seconds(), 15.0);
                assert!(view.is_playing);
                assert_eq!(event.server_timestamp, Timestamp::new(6_000));
            }
            other => panic!("expected Reply, got {other:?}"),
        }
    }

    #[test]
    fn test_clock_going_backwards_never_rewinds() {
        // テスト項目: サーバー時刻が逆行しても再生位置は減らない
        let current = state(10.0, true, 5_000);

        let (next, _) = applied(
            process(&party(), &current, Role::Host, &Command::Pause, Timestamp::new(4_000)).unwrap(),
        );

        assert_eq!(next.position.seconds(), 10.0);
    }
}
