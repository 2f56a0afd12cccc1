use rusqlite::Connection;
use vocassion_core::model::goal::{Difficulty, GoalStatus, NewGoal};
use vocassion_core::model::MAX_POINTS;
use vocassion_core::model::ikigai::IkigaiSection;
use vocassion_core::model::profile::{NewProfile, Profile};
use vocassion_core::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use vocassion_core::{
    open_db_in_memory, GoalService, ProfileService, ProgressionService, ServiceError,
    ValidationError,
};

fn create_profile(conn: &mut Connection, user_id: &str) -> Profile {
    ProfileService::new(conn)
        .create_profile(
            user_id,
            &NewProfile {
                name: "Ada Lovelace".to_string(),
                ..NewProfile::default()
            },
        )
        .unwrap()
}

fn goal_request(cost: i64) -> NewGoal {
    NewGoal {
        title: "Learn the cello".to_string(),
        description: "Practice thirty minutes a day".to_string(),
        category: IkigaiSection::Passion,
        difficulty: Difficulty::Hard,
        points_cost: cost,
        points_reward: 0,
        deadline: None,
    }
}

#[test]
fn add_points_returns_running_total() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = ProgressionService::new(&mut conn);

    assert_eq!(service.add_points(profile.id, 50, "Points awarded").unwrap(), 50);
    assert_eq!(service.add_points(profile.id, 30, "Points awarded").unwrap(), 80);
    assert_eq!(service.total_points(profile.id).unwrap(), 80);
}

#[test]
fn non_positive_amounts_are_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = ProgressionService::new(&mut conn);

    for amount in [0, -10] {
        let err = service.add_points(profile.id, amount, "nope").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::NotPositive { .. })
        ));
    }
    assert_eq!(service.total_points(profile.id).unwrap(), 0);
}

#[test]
fn oversized_amounts_are_rejected_and_ledger_stays_usable() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = ProgressionService::new(&mut conn);

    for amount in [MAX_POINTS + 1, i64::MAX] {
        let err = service.add_points(profile.id, amount, "jackpot").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::OutOfRange {
                field: "points",
                max: MAX_POINTS,
                ..
            })
        ));
    }
    assert_eq!(service.total_points(profile.id).unwrap(), 0);

    assert_eq!(
        service.add_points(profile.id, MAX_POINTS, "Points awarded").unwrap(),
        MAX_POINTS
    );
    assert_eq!(
        service.add_points(profile.id, 5, "Points awarded").unwrap(),
        MAX_POINTS + 5
    );
    let audit = service.audit_ledger(profile.id).unwrap();
    assert!(audit.is_consistent());
}

#[test]
fn points_for_unknown_profile_are_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let err = ProgressionService::new(&mut conn)
        .add_points(uuid::Uuid::new_v4(), 10, "ghost")
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "profile", .. }));
}

#[test]
fn unlock_economy_matches_worked_example() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    {
        let mut progression = ProgressionService::new(&mut conn);
        for amount in [50, 30, 100] {
            progression.add_points(profile.id, amount, "Points awarded").unwrap();
        }
        assert_eq!(progression.total_points(profile.id).unwrap(), 180);
    }

    let mut goals = GoalService::new(&mut conn);
    let expensive = goals.create_goal(profile.id, &goal_request(200)).unwrap();
    let affordable = goals.create_goal(profile.id, &goal_request(150)).unwrap();
    assert_eq!(expensive.status, GoalStatus::Locked);

    let err = goals.unlock_goal(profile.id, expensive.id).unwrap_err();
    match err {
        ServiceError::InsufficientPoints {
            available,
            required,
        } => {
            assert_eq!(available, 180);
            assert_eq!(required, 200);
        }
        other => panic!("unexpected error: {other}"),
    }

    let outcome = goals.unlock_goal(profile.id, affordable.id).unwrap();
    assert_eq!(outcome.goal.status, GoalStatus::Active);
    assert_eq!(outcome.points_spent, 150);
    assert_eq!(outcome.total_points, 30);

    let ledger = SqliteLedgerRepository::new(&conn);
    let penalties = ledger.list_penalties(profile.id).unwrap();
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0].points_lost, 150);
    assert_eq!(ledger.balance(profile.id).unwrap(), 30);
}

#[test]
fn maintained_balance_always_matches_ledger_sum() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    {
        let ledger = SqliteLedgerRepository::new(&conn);
        for (index, amount) in [5_i64, 40, 75, 10, 60].into_iter().enumerate() {
            ledger.append_reward(profile.id, amount, "reward").unwrap();
            if index % 2 == 1 {
                ledger.append_penalty(profile.id, amount / 2, "penalty").unwrap();
            }
            let audit = ledger.audit(profile.id).unwrap();
            assert!(audit.is_consistent(), "audit drifted: {audit:?}");
        }
    }

    let history = ProgressionService::new(&mut conn)
        .ledger_history(profile.id)
        .unwrap();
    assert_eq!(history.rewards.len(), 5);
    assert_eq!(history.penalties.len(), 2);
    assert_eq!(history.audit.lifetime_earned, 190);
    assert_eq!(history.audit.ledger_total, 190 - 20 - 5);
    assert_eq!(history.audit.maintained_balance, history.audit.ledger_total);
}

#[test]
fn ledger_rows_are_append_only() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let reward = SqliteLedgerRepository::new(&conn)
        .append_reward(profile.id, 25, "reward")
        .unwrap();

    let update = conn.execute(
        "UPDATE rewards SET points = 1000 WHERE id = ?1;",
        [reward.id.to_string()],
    );
    assert!(update.is_err());
    let delete = conn.execute("DELETE FROM rewards WHERE id = ?1;", [reward.id.to_string()]);
    assert!(delete.is_err());

    assert_eq!(
        SqliteLedgerRepository::new(&conn).balance(profile.id).unwrap(),
        25
    );
}

#[test]
fn level_follows_balance() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = ProgressionService::new(&mut conn);

    assert_eq!(service.level(profile.id).unwrap(), 1);
    service.add_points(profile.id, 99, "Points awarded").unwrap();
    assert_eq!(service.level(profile.id).unwrap(), 1);
    service.add_points(profile.id, 1, "Points awarded").unwrap();
    assert_eq!(service.level(profile.id).unwrap(), 2);

    let snapshot = service.snapshot(profile.id).unwrap();
    assert_eq!(snapshot.points, 100);
    assert_eq!(snapshot.level, 2);
}
