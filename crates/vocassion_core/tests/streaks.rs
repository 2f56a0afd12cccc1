use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use vocassion_core::model::profile::{NewProfile, Profile};
use vocassion_core::model::streak::{CheckInOutcome, ACTIVITY_DAILY_REFLECTION};
use vocassion_core::repo::achievement_repo::{AchievementRepository, SqliteAchievementRepository};
use vocassion_core::{open_db_in_memory, ProfileService, ProgressionService};

const ACTIVITY: &str = "daily_challenges";

fn create_profile(conn: &mut Connection) -> Profile {
    ProfileService::new(conn)
        .create_profile(
            "user_1",
            &NewProfile {
                name: "Grace".to_string(),
                ..NewProfile::default()
            },
        )
        .unwrap()
}

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + Duration::days(offset)
}

#[test]
fn first_checkin_starts_streak() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);

    let update = ProgressionService::new(&mut conn)
        .update_streak(profile.id, ACTIVITY, day(0))
        .unwrap();
    assert_eq!(update.outcome, CheckInOutcome::Started);
    assert_eq!(update.streak.current_count, 1);
    assert_eq!(update.streak.longest_count, 1);
}

#[test]
fn consecutive_days_increment_and_gaps_reset() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);
    let mut service = ProgressionService::new(&mut conn);

    service.update_streak(profile.id, ACTIVITY, day(0)).unwrap();
    service.update_streak(profile.id, ACTIVITY, day(1)).unwrap();
    let update = service.update_streak(profile.id, ACTIVITY, day(2)).unwrap();
    assert_eq!(update.outcome, CheckInOutcome::Continued);
    assert_eq!(update.streak.current_count, 3);
    assert_eq!(update.streak.longest_count, 3);

    let same_day = service.update_streak(profile.id, ACTIVITY, day(2)).unwrap();
    assert_eq!(same_day.outcome, CheckInOutcome::AlreadyCheckedIn);
    assert_eq!(same_day.streak.current_count, 3);

    let after_gap = service.update_streak(profile.id, ACTIVITY, day(4)).unwrap();
    assert_eq!(after_gap.outcome, CheckInOutcome::Reset);
    assert_eq!(after_gap.streak.current_count, 1);
    assert_eq!(after_gap.streak.longest_count, 3);
}

#[test]
fn checkin_before_last_checkin_is_a_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);
    let mut service = ProgressionService::new(&mut conn);

    service.update_streak(profile.id, ACTIVITY, day(5)).unwrap();
    let update = service.update_streak(profile.id, ACTIVITY, day(3)).unwrap();
    assert_eq!(update.outcome, CheckInOutcome::AlreadyCheckedIn);
    assert_eq!(update.streak.last_checkin, day(5));
}

#[test]
fn streaks_are_tracked_per_activity() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);
    let mut service = ProgressionService::new(&mut conn);

    service.update_streak(profile.id, ACTIVITY, day(0)).unwrap();
    service.update_streak(profile.id, ACTIVITY, day(1)).unwrap();
    service
        .update_streak(profile.id, ACTIVITY_DAILY_REFLECTION, day(1))
        .unwrap();

    let snapshot = service.snapshot(profile.id).unwrap();
    let counts: Vec<(String, u32)> = snapshot
        .streaks
        .iter()
        .map(|streak| (streak.activity.clone(), streak.current_count))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("daily_challenges".to_string(), 2),
            ("daily_reflection".to_string(), 1)
        ]
    );
}

#[test]
fn week_warrior_unlocks_once_at_seven_days() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);
    {
        let mut service = ProgressionService::new(&mut conn);
        let mut unlocked = Vec::new();
        for offset in 0..7 {
            let update = service.update_streak(profile.id, ACTIVITY, day(offset)).unwrap();
            if let Some(achievement) = update.unlocked {
                unlocked.push((offset, achievement.title));
            }
        }
        assert_eq!(unlocked, vec![(6, "Week Warrior".to_string())]);

        // Break and rebuild the streak; the achievement stays unique.
        service.update_streak(profile.id, ACTIVITY, day(10)).unwrap();
        for offset in 11..17 {
            let update = service.update_streak(profile.id, ACTIVITY, day(offset)).unwrap();
            assert!(update.unlocked.is_none());
        }
    }

    let achievements = SqliteAchievementRepository::new(&conn)
        .list_achievements(profile.id, None)
        .unwrap();
    assert_eq!(achievements.len(), 1);
    assert_eq!(achievements[0].points, 50);
}

#[test]
fn monthly_master_unlocks_at_thirty_days() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);
    {
        let mut service = ProgressionService::new(&mut conn);
        let mut unlocked = Vec::new();
        for offset in 0..31 {
            let update = service.update_streak(profile.id, ACTIVITY, day(offset)).unwrap();
            if let Some(achievement) = update.unlocked {
                unlocked.push((update.streak.current_count, achievement.title));
            }
        }
        assert_eq!(
            unlocked,
            vec![
                (7, "Week Warrior".to_string()),
                (30, "Monthly Master".to_string())
            ]
        );
        assert_eq!(service.total_points(profile.id).unwrap(), 0);
    }

    let achievements = SqliteAchievementRepository::new(&conn)
        .list_achievements(profile.id, None)
        .unwrap();
    let monthly = achievements
        .iter()
        .find(|achievement| achievement.title == "Monthly Master")
        .unwrap();
    assert_eq!(monthly.points, 200);
}

#[test]
fn record_activity_checks_in_reflection_streak_only() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);
    let mut service = ProgressionService::new(&mut conn);

    let outcome = service
        .record_activity(profile.id, "goal_progress", 15, day(0))
        .unwrap();
    assert_eq!(outcome.total_points, 15);
    assert!(outcome.streak.is_none());

    let outcome = service
        .record_activity(profile.id, ACTIVITY_DAILY_REFLECTION, 10, day(0))
        .unwrap();
    assert_eq!(outcome.total_points, 25);
    assert_eq!(outcome.streak.unwrap().streak.current_count, 1);
}
