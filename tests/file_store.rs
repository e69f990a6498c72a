#![allow(non_snake_case)]
use chrono::{
    TimeDelta,
    TimeZone,
    Utc,
};
use gacha_sim::{
    FixedClock,
    GachaError,
    JsonFileStore,
    PackQuantity,
    ScriptedReels,
    Session,
    SpinGrid,
    StateStore,
    store::DEFAULT_SAVE_FILE,
};
use std::fs;
use tempdir::TempDir;

fn winning() -> SpinGrid {
    SpinGrid::from_indices([[1, 4, 2], [0, 4, 3], [5, 4, 1]])
}

#[test]
fn sut__when_saving_unchanged_state_then_bytes_are_identical() {
    // given
    let dir = TempDir::new("gacha_roundtrip").unwrap();
    let path = dir.path().join(DEFAULT_SAVE_FILE);
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 8, 8, 8, 8, 8).unwrap());
    let mut session = Session::new(JsonFileStore::new(&path), &clock, ScriptedReels::new([winning()]));
    session.spin().unwrap();
    session.purchase(PackQuantity::new(2).unwrap()).unwrap();
    let first = fs::read(&path).unwrap();

    // when
    let mut store = JsonFileStore::new(&path);
    let loaded = store.load().unwrap().unwrap();
    store.save(&loaded).unwrap();

    // then
    assert_eq!(fs::read(&path).unwrap(), first);
}

#[test]
fn sut__when_program_restarts_then_state_and_cooldown_carry_over() {
    // given
    let dir = TempDir::new("gacha_restart").unwrap();
    let path = dir.path().join(DEFAULT_SAVE_FILE);
    let start = Utc.with_ymd_and_hms(2025, 8, 8, 12, 0, 0).unwrap();
    let clock = FixedClock::new(start);
    {
        let mut first_run =
            Session::new(JsonFileStore::new(&path), &clock, ScriptedReels::new([winning()]));
        for _ in 0..10 {
            first_run.spin().unwrap();
        }
    }

    // when
    clock.advance(TimeDelta::minutes(5));
    let mut second_run = Session::new(JsonFileStore::new(&path), &clock, ScriptedReels::new([]));
    let status = second_run.status().unwrap();

    // then
    assert_eq!(status.balance, 100_000);
    assert_eq!(status.total_wins, 10);
    assert_eq!(status.attempts_left, 0);
    assert_eq!(status.next_reset_label(), "10m 0s");
    assert!(!status.reset_applied);
}

#[test]
fn sut__when_record_is_corrupt_then_session_fails_instead_of_starting_over() {
    // given
    let dir = TempDir::new("gacha_corrupt").unwrap();
    let path = dir.path().join(DEFAULT_SAVE_FILE);
    fs::write(&path, b"not json at all").unwrap();
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 8, 8, 0, 0, 0).unwrap());
    let mut session = Session::new(JsonFileStore::new(&path), &clock, ScriptedReels::new([winning()]));

    // when
    let err = session.spin().unwrap_err();

    // then
    assert!(matches!(err, GachaError::Corrupt { .. }));
    assert!(err.is_persistence());
    assert_eq!(fs::read(&path).unwrap(), b"not json at all");
}

#[test]
fn sut__when_record_uses_offset_less_timestamp_then_it_loads() {
    let dir = TempDir::new("gacha_legacy").unwrap();
    let path = dir.path().join(DEFAULT_SAVE_FILE);
    fs::write(
        &path,
        br#"{
  "balance": 10000,
  "tokens": 5,
  "attempts_left": 3,
  "last_reset_time": "2025-08-08T09:15:42.123456",
  "total_wins": 1,
  "total_losses": 6
}"#,
    )
    .unwrap();

    let state = JsonFileStore::new(&path).load().unwrap().unwrap();

    assert_eq!(state.balance, 10_000);
    assert_eq!(state.attempts_left, 3);
    assert_eq!(state.total_losses, 6);
}

#[test]
fn sut__when_reset_then_file_holds_defaults() {
    let dir = TempDir::new("gacha_reset").unwrap();
    let path = dir.path().join(DEFAULT_SAVE_FILE);
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 8, 8, 0, 0, 0).unwrap());
    let mut session = Session::new(JsonFileStore::new(&path), &clock, ScriptedReels::new([winning()]));
    session.spin().unwrap();

    session.reset().unwrap();

    let json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(json["balance"], 0);
    assert_eq!(json["attempts_left"], 10);
    assert_eq!(json["total_wins"], 0);
    assert_eq!(json["last_reset_time"], "2025-08-08T00:00:00Z");
}

#[test]
fn sut__when_parent_of_record_is_a_file_then_actions_fail_with_io_error() {
    // given
    let dir = TempDir::new("gacha_parent_file").unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();
    let path = blocker.join(DEFAULT_SAVE_FILE);
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 8, 8, 0, 0, 0).unwrap());
    let mut session = Session::new(JsonFileStore::new(&path), &clock, ScriptedReels::new([winning()]));

    // when
    let spin_err = session.spin().unwrap_err();
    let purchase_err = session.purchase(PackQuantity::new(1).unwrap()).unwrap_err();

    // then
    for err in [&spin_err, &purchase_err] {
        assert!(matches!(err, GachaError::Io { .. }), "{err:?}");
        assert!(err.is_persistence());
    }
    assert_eq!(fs::read(&blocker).unwrap(), b"not a directory");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn sut__when_save_cannot_be_written_then_action_aborts_without_record() {
    // given
    let dir = TempDir::new("gacha_save_blocked").unwrap();
    let path = dir.path().join(DEFAULT_SAVE_FILE);
    let tmp_path = dir.path().join(format!("{DEFAULT_SAVE_FILE}.tmp"));
    fs::create_dir(&tmp_path).unwrap();
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 8, 8, 0, 0, 0).unwrap());
    let mut session = Session::new(JsonFileStore::new(&path), &clock, ScriptedReels::new([winning()]));

    // when
    let spin_err = session.spin().unwrap_err();
    let purchase_err = session.purchase(PackQuantity::new(2).unwrap()).unwrap_err();

    // then
    for err in [&spin_err, &purchase_err] {
        assert!(matches!(err, GachaError::Io { .. }), "{err:?}");
        assert!(err.is_persistence());
    }
    assert!(!path.exists());
    assert!(tmp_path.is_dir());
}
