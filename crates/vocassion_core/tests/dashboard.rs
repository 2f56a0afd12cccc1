use chrono::NaiveDate;
use rusqlite::Connection;
use vocassion_core::model::challenge::{ChallengeKind, NewChallenge};
use vocassion_core::model::goal::{Difficulty, NewGoal};
use vocassion_core::model::ikigai::IkigaiSection;
use vocassion_core::model::profile::{NewProfile, Profile};
use vocassion_core::{
    open_db_in_memory, ChallengeService, GoalService, ProfileService, ProgressionService,
};

fn create_profile(conn: &mut Connection) -> Profile {
    ProfileService::new(conn)
        .create_profile(
            "user_1",
            &NewProfile {
                name: "Mae Jemison".to_string(),
                ..NewProfile::default()
            },
        )
        .unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 3).unwrap()
}

#[test]
fn new_profile_has_an_empty_dashboard() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);

    let dashboard = ProgressionService::new(&mut conn)
        .dashboard(profile.clone())
        .unwrap();
    assert_eq!(dashboard.profile, profile);
    assert!(dashboard.ikigai_map.is_none());
    assert!(dashboard.goals.is_empty());
    assert!(dashboard.challenges.is_empty());
    assert!(dashboard.achievements.is_empty());
    assert_eq!(dashboard.stats.completed_tasks, 0);
    assert_eq!(dashboard.stats.current_points, 0);
}

#[test]
fn dashboard_caps_lists_and_counts_progress() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);
    {
        let mut goals = GoalService::new(&mut conn);
        for index in 0..6 {
            goals
                .create_goal(
                    profile.id,
                    &NewGoal {
                        title: format!("Goal number {index}"),
                        description: "Something worth doing".to_string(),
                        category: IkigaiSection::Mission,
                        difficulty: Difficulty::Easy,
                        points_cost: 0,
                        points_reward: 10,
                        deadline: None,
                    },
                )
                .unwrap();
        }
    }
    {
        let mut challenges = ChallengeService::new(&mut conn);
        let daily = challenges.daily_challenges(profile.id, today()).unwrap();
        for _ in 0..2 {
            challenges
                .create_challenge(
                    profile.id,
                    &NewChallenge {
                        title: "Mentor a newcomer".to_string(),
                        description: "Pair for an hour".to_string(),
                        kind: ChallengeKind::Special,
                        category: IkigaiSection::Mission,
                        points: 20,
                    },
                    today(),
                )
                .unwrap();
        }
        challenges
            .complete_challenge(profile.id, daily[0].id, today())
            .unwrap();
        challenges
            .complete_challenge(profile.id, daily[1].id, today())
            .unwrap();
    }

    let dashboard = ProgressionService::new(&mut conn)
        .dashboard(profile)
        .unwrap();
    assert_eq!(dashboard.goals.len(), 5);
    assert_eq!(dashboard.goals[0].title, "Goal number 5");
    assert_eq!(dashboard.challenges.len(), 5);
    assert_eq!(dashboard.achievements.len(), 1);
    assert_eq!(dashboard.stats.completed_tasks, 2);
    assert_eq!(dashboard.stats.total_achievements, 1);
    assert_eq!(dashboard.stats.streak_count, 1);
    assert_eq!(dashboard.stats.current_points, 80);
}
