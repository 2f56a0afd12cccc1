use rusqlite::Connection;
use vocassion_core::model::goal::{Difficulty, GoalStatus, NewGoal, NewGoalStep};
use vocassion_core::model::ikigai::IkigaiSection;
use vocassion_core::model::profile::{NewProfile, Profile};
use vocassion_core::{
    open_db_in_memory, GoalService, ProfileService, ProgressionService, ServiceError,
    ValidationError,
};

fn create_profile(conn: &mut Connection, user_id: &str) -> Profile {
    ProfileService::new(conn)
        .create_profile(
            user_id,
            &NewProfile {
                name: "Mae".to_string(),
                ..NewProfile::default()
            },
        )
        .unwrap()
}

fn goal(cost: i64, reward: i64) -> NewGoal {
    NewGoal {
        title: "Ship a side project".to_string(),
        description: "Build and launch something small".to_string(),
        category: IkigaiSection::Profession,
        difficulty: Difficulty::Medium,
        points_cost: cost,
        points_reward: reward,
        deadline: None,
    }
}

fn step(title: &str, reward: i64) -> NewGoalStep {
    NewGoalStep {
        title: title.to_string(),
        description: String::new(),
        points_reward: reward,
    }
}

#[test]
fn goals_start_locked_only_with_a_cost() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = GoalService::new(&mut conn);

    let free = service.create_goal(profile.id, &goal(0, 0)).unwrap();
    let paid = service.create_goal(profile.id, &goal(120, 0)).unwrap();
    assert_eq!(free.status, GoalStatus::Active);
    assert_eq!(paid.status, GoalStatus::Locked);

    let listed: Vec<_> = service
        .list_goals(profile.id)
        .unwrap()
        .into_iter()
        .map(|goal| goal.id)
        .collect();
    assert_eq!(listed, vec![paid.id, free.id]);
}

#[test]
fn goal_validation_rejects_short_text() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let request = NewGoal {
        title: "Go".to_string(),
        ..goal(0, 0)
    };
    let err = GoalService::new(&mut conn)
        .create_goal(profile.id, &request)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::TooShort { field: "title", .. })
    ));
}

#[test]
fn unlock_requires_locked_owned_goal() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_profile(&mut conn, "owner");
    let other = create_profile(&mut conn, "other");
    let mut service = GoalService::new(&mut conn);

    let active = service.create_goal(owner.id, &goal(0, 0)).unwrap();
    let err = service.unlock_goal(owner.id, active.id).unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let locked = service.create_goal(owner.id, &goal(10, 0)).unwrap();
    let err = service.unlock_goal(other.id, locked.id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "goal", .. }));
}

#[test]
fn unlock_debits_cost_and_writes_feedback() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    ProgressionService::new(&mut conn)
        .add_points(profile.id, 100, "Points awarded")
        .unwrap();

    let mut service = GoalService::new(&mut conn);
    let locked = service.create_goal(profile.id, &goal(100, 0)).unwrap();
    let outcome = service.unlock_goal(profile.id, locked.id).unwrap();
    assert_eq!(outcome.total_points, 0);

    let detail = service.goal_detail(profile.id, locked.id).unwrap();
    assert_eq!(detail.goal.status, GoalStatus::Active);
    assert_eq!(detail.feedback.len(), 1);
    assert_eq!(detail.feedback[0].kind, "unlock");

    let err = service.unlock_goal(profile.id, locked.id).unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn milestones_roll_up_into_goal_completion() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = GoalService::new(&mut conn);
    let target = service.create_goal(profile.id, &goal(0, 200)).unwrap();

    let first = service
        .add_sub_goal(profile.id, target.id, &step("Prototype", 20))
        .unwrap();
    let second = service
        .add_sub_goal(profile.id, target.id, &step("Launch", 0))
        .unwrap();
    assert_eq!((first.sort_order, second.sort_order), (1, 2));

    let m1 = service
        .add_milestone(profile.id, target.id, first.id, &step("Sketch", 5))
        .unwrap();
    let m2 = service
        .add_milestone(profile.id, target.id, first.id, &step("Build", 5))
        .unwrap();
    let m3 = service
        .add_milestone(profile.id, target.id, second.id, &step("Publish", 0))
        .unwrap();

    let outcome = service
        .complete_milestone(profile.id, target.id, first.id, m1.id)
        .unwrap();
    assert!(outcome.milestone.is_completed);
    assert!(!outcome.sub_goal_completed);
    assert_eq!(outcome.goal.progress, 33);
    assert_eq!(outcome.points_awarded, 5);

    let outcome = service
        .complete_milestone(profile.id, target.id, first.id, m2.id)
        .unwrap();
    assert!(outcome.sub_goal_completed);
    assert_eq!(outcome.goal.progress, 66);
    assert_eq!(outcome.points_awarded, 25);
    assert_eq!(outcome.total_points, 30);

    let err = service
        .complete_milestone(profile.id, target.id, first.id, m2.id)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let outcome = service
        .complete_milestone(profile.id, target.id, second.id, m3.id)
        .unwrap();
    assert_eq!(outcome.goal.status, GoalStatus::Completed);
    assert_eq!(outcome.goal.progress, 100);
    assert_eq!(outcome.points_awarded, 200);
    assert_eq!(outcome.total_points, 230);

    let detail = service.goal_detail(profile.id, target.id).unwrap();
    assert_eq!(detail.sub_goals.len(), 2);
    assert_eq!(detail.sub_goals[0].progress, 100);
    assert_eq!(detail.sub_goals[0].milestones.len(), 2);
    assert_eq!(detail.feedback[0].kind, "completion");
}

#[test]
fn milestones_on_locked_goals_conflict() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = GoalService::new(&mut conn);
    let locked = service.create_goal(profile.id, &goal(50, 0)).unwrap();
    let sub_goal = service
        .add_sub_goal(profile.id, locked.id, &step("Plan", 0))
        .unwrap();
    let milestone = service
        .add_milestone(profile.id, locked.id, sub_goal.id, &step("Outline", 0))
        .unwrap();

    let err = service
        .complete_milestone(profile.id, locked.id, sub_goal.id, milestone.id)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn manual_progress_is_clamped_and_monotonic() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn, "user_1");
    let mut service = GoalService::new(&mut conn);
    let target = service.create_goal(profile.id, &goal(0, 40)).unwrap();

    assert_eq!(
        service
            .set_goal_progress(profile.id, target.id, 60)
            .unwrap()
            .progress,
        60
    );
    assert_eq!(
        service
            .set_goal_progress(profile.id, target.id, 20)
            .unwrap()
            .progress,
        60
    );

    let done = service.set_goal_progress(profile.id, target.id, 250).unwrap();
    assert_eq!(done.progress, 100);
    assert_eq!(done.status, GoalStatus::Completed);

    let err = service
        .set_goal_progress(profile.id, target.id, 100)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    assert_eq!(
        ProgressionService::new(&mut conn)
            .total_points(profile.id)
            .unwrap(),
        40
    );
}
