use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use vocassion_core::model::challenge::{ChallengeKind, ChallengeStatus, NewChallenge};
use vocassion_core::model::ikigai::{IkigaiEntries, IkigaiSection};
use vocassion_core::model::profile::{NewProfile, Profile};
use vocassion_core::model::streak::CheckInOutcome;
use vocassion_core::{
    open_db_in_memory, ChallengeService, IkigaiService, ProfileService, ProgressionService,
    ServiceError, ValidationError,
};

fn create_profile(conn: &mut Connection, user_id: &str) -> Profile {
    ProfileService::new(conn)
        .create_profile(
            user_id,
            &NewProfile {
                name: "Katherine".to_string(),
                ..NewProfile::default()
            },
        )
        .unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
}

fn custom(points: i64) -> NewChallenge {
    NewChallenge {
        title: "Volunteer weekend".to_string(),
        description: "Help at the local food bank".to_string(),
        kind: ChallengeKind::Weekly,
        category: IkigaiSection::Mission,
        points,
    }
}

#[test]
fn daily_challenges_are_materialized_once_per_day() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = ChallengeService::new(&mut conn);

    let first = service.daily_challenges(profile.id, today()).unwrap();
    let second = service.daily_challenges(profile.id, today()).unwrap();
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);

    let titles: Vec<&str> = first.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Research Your Passion",
            "Network for Growth",
            "Mission Reflection",
            "Skill Development"
        ]
    );
    let points: Vec<i64> = first.iter().map(|c| c.points).collect();
    assert_eq!(points, vec![50, 30, 40, 60]);

    let tomorrow = service
        .daily_challenges(profile.id, today() + Duration::days(1))
        .unwrap();
    assert_eq!(tomorrow.len(), 4);
    assert!(tomorrow.iter().all(|c| !first.iter().any(|f| f.id == c.id)));
}

#[test]
fn daily_challenges_use_first_ikigai_entries() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    IkigaiService::new(&mut conn)
        .submit_assessment(
            profile.id,
            &IkigaiEntries {
                passion: vec!["astronomy".to_string()],
                profession: vec!["data science".to_string()],
                ..IkigaiEntries::default()
            },
        )
        .unwrap();

    let challenges = ChallengeService::new(&mut conn)
        .daily_challenges(profile.id, today())
        .unwrap();
    assert_eq!(
        challenges[0].description,
        "Research careers related to astronomy"
    );
    assert_eq!(
        challenges[1].description,
        "Connect with someone in the data science field"
    );
    assert_eq!(
        challenges[2].description,
        "Write down three ways you can help others with your skills"
    );
}

#[test]
fn completing_a_challenge_rewards_streak_and_achievement() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = ChallengeService::new(&mut conn);
    let daily = service.daily_challenges(profile.id, today()).unwrap();

    let outcome = service
        .complete_challenge(profile.id, daily[0].id, today())
        .unwrap();
    assert_eq!(outcome.challenge.status, ChallengeStatus::Completed);
    assert!(outcome.challenge.completed_at.is_some());
    assert_eq!(outcome.points_awarded, 50);
    assert_eq!(outcome.total_points, 50);
    assert_eq!(outcome.streak.outcome, CheckInOutcome::Started);
    let titles: Vec<&str> = outcome.unlocked.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Challenge Beginner"]);

    let second = service
        .complete_challenge(profile.id, daily[1].id, today())
        .unwrap();
    assert_eq!(second.total_points, 80);
    assert!(second.unlocked.is_empty());
    assert_eq!(second.streak.outcome, CheckInOutcome::AlreadyCheckedIn);

    let tasks = service.daily_tasks(profile.id, today()).unwrap();
    let completed: Vec<bool> = tasks.iter().map(|task| task.completed).collect();
    assert_eq!(completed, vec![true, true, false, false]);
}

#[test]
fn duplicate_completion_conflicts_without_double_reward() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = ChallengeService::new(&mut conn);
    let daily = service.daily_challenges(profile.id, today()).unwrap();

    service
        .complete_challenge(profile.id, daily[0].id, today())
        .unwrap();
    let err = service
        .complete_challenge(profile.id, daily[0].id, today())
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    assert_eq!(
        ProgressionService::new(&mut conn)
            .total_points(profile.id)
            .unwrap(),
        50
    );
}

#[test]
fn foreign_or_unknown_challenges_are_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_profile(&mut conn, "owner");
    let intruder = create_profile(&mut conn, "intruder");
    let mut service = ChallengeService::new(&mut conn);
    let daily = service.daily_challenges(owner.id, today()).unwrap();

    let err = service
        .complete_challenge(intruder.id, daily[0].id, today())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "challenge", .. }));

    let err = service
        .complete_challenge(owner.id, uuid::Uuid::new_v4(), today())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[test]
fn challenge_thresholds_award_exactly_once() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut unlocked_titles = Vec::new();
    {
        let mut service = ChallengeService::new(&mut conn);
        for _ in 0..5 {
            let challenge = service
                .create_challenge(profile.id, &custom(10), today())
                .unwrap();
            let outcome = service
                .complete_challenge(profile.id, challenge.id, today())
                .unwrap();
            unlocked_titles.extend(outcome.unlocked.into_iter().map(|a| a.title));
        }
    }
    assert_eq!(
        unlocked_titles,
        vec!["Challenge Beginner".to_string(), "Challenge Explorer".to_string()]
    );

    let mut progression = ProgressionService::new(&mut conn);
    assert!(progression
        .check_and_award_achievements(profile.id)
        .unwrap()
        .is_empty());
    let snapshot = progression.snapshot(profile.id).unwrap();
    assert_eq!(snapshot.achievements.len(), 2);
    // Achievements carry display points only; the ledger holds 5 x 10.
    assert_eq!(snapshot.points, 50);
}

#[test]
fn custom_challenges_validate_kind_and_points() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = ChallengeService::new(&mut conn);

    let err = service
        .create_challenge(profile.id, &custom(0), today())
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::NotPositive { .. })
    ));

    let daily = NewChallenge {
        kind: ChallengeKind::Daily,
        ..custom(10)
    };
    let err = service
        .create_challenge(profile.id, &daily, today())
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::UnknownValue { field: "kind", .. })
    ));

    let created = service
        .create_challenge(profile.id, &custom(25), today())
        .unwrap();
    assert_eq!(created.status, ChallengeStatus::Pending);
    assert_eq!(service.list_challenges(profile.id).unwrap().len(), 1);
}

#[test]
fn failure_mid_completion_rolls_back_every_write() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let daily = ChallengeService::new(&mut conn)
        .daily_challenges(profile.id, today())
        .unwrap();
    conn.execute_batch(
        "CREATE TRIGGER achievements_offline
         BEFORE INSERT ON achievements
         BEGIN
             SELECT RAISE(ABORT, 'achievements offline');
         END;",
    )
    .unwrap();

    let err = ChallengeService::new(&mut conn)
        .complete_challenge(profile.id, daily[0].id, today())
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repo(_)));

    let tasks = ChallengeService::new(&mut conn)
        .daily_tasks(profile.id, today())
        .unwrap();
    assert!(tasks.iter().all(|task| !task.completed));

    let progression = ProgressionService::new(&mut conn);
    let history = progression.ledger_history(profile.id).unwrap();
    assert!(history.rewards.is_empty());
    assert_eq!(history.audit.maintained_balance, 0);
    assert!(history.audit.is_consistent());
    let snapshot = progression.snapshot(profile.id).unwrap();
    assert!(snapshot.streaks.is_empty());
    assert!(snapshot.achievements.is_empty());

    conn.execute_batch("DROP TRIGGER achievements_offline;").unwrap();
    let outcome = ChallengeService::new(&mut conn)
        .complete_challenge(profile.id, daily[0].id, today())
        .unwrap();
    assert_eq!(outcome.total_points, 50);
}
