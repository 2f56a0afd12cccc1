use rusqlite::Connection;
use vocassion_core::model::ikigai::{IkigaiEntries, IkigaiSection};
use vocassion_core::model::profile::{NewProfile, Profile};
use vocassion_core::{
    open_db_in_memory, IkigaiService, ProfileService, ProgressionService, ServiceError,
};

fn create_profile(conn: &mut Connection) -> Profile {
    ProfileService::new(conn)
        .create_profile(
            "user_1",
            &NewProfile {
                name: "Yuki".to_string(),
                ..NewProfile::default()
            },
        )
        .unwrap()
}

fn entries(
    passion: &[&str],
    mission: &[&str],
    profession: &[&str],
    vocation: &[&str],
) -> IkigaiEntries {
    let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect();
    IkigaiEntries {
        passion: owned(passion),
        mission: owned(mission),
        profession: owned(profession),
        vocation: owned(vocation),
    }
}

#[test]
fn first_assessment_unlocks_pioneer_and_rewards_once() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);
    let mut service = IkigaiService::new(&mut conn);

    let first = service
        .submit_assessment(profile.id, &entries(&["music"], &[], &[], &[]))
        .unwrap();
    assert_eq!(first.unlocked.as_ref().unwrap().title, "Ikigai Pioneer");
    assert_eq!(first.points_awarded, 100);
    assert_eq!(first.total_points, 100);

    let second = service
        .submit_assessment(profile.id, &entries(&["music", "  "], &["teaching"], &[], &[]))
        .unwrap();
    assert!(second.unlocked.is_none());
    assert_eq!(second.points_awarded, 0);
    assert_eq!(second.total_points, 100);
    assert_eq!(second.map.entries.passion, vec!["music".to_string()]);
    assert_eq!(second.map.entries.mission, vec!["teaching".to_string()]);

    let stored = service.get_map(profile.id).unwrap().unwrap();
    assert_eq!(stored.entries, second.map.entries);
}

#[test]
fn empty_assessment_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);
    let err = IkigaiService::new(&mut conn)
        .submit_assessment(profile.id, &entries(&[" "], &[], &[], &[]))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn section_progress_credits_points_and_unlocks_master_when_complete() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);
    let mut service = IkigaiService::new(&mut conn);
    service
        .submit_assessment(profile.id, &entries(&["art"], &["care"], &[], &[]))
        .unwrap();

    let partial = service
        .record_section_progress(profile.id, IkigaiSection::Mission)
        .unwrap();
    assert_eq!(partial.total_points, 125);
    assert!(partial.unlocked.is_none());

    service
        .submit_assessment(
            profile.id,
            &entries(&["art"], &["care"], &["design"], &["illustration"]),
        )
        .unwrap();
    let complete = service
        .record_section_progress(profile.id, IkigaiSection::Vocation)
        .unwrap();
    assert_eq!(complete.total_points, 150);
    assert_eq!(complete.unlocked.unwrap().title, "Ikigai Master");

    let again = service
        .record_section_progress(profile.id, IkigaiSection::Vocation)
        .unwrap();
    assert!(again.unlocked.is_none());

    let snapshot = ProgressionService::new(&mut conn).snapshot(profile.id).unwrap();
    let titles: Vec<&str> = snapshot
        .achievements
        .iter()
        .map(|a| a.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Ikigai Master", "Ikigai Pioneer"]);
}

#[test]
fn maps_are_looked_up_by_user_id() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = create_profile(&mut conn);

    let err = IkigaiService::new(&mut conn)
        .map_for_user("user_1")
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "ikigai map", .. }));

    IkigaiService::new(&mut conn)
        .submit_assessment(profile.id, &entries(&["music"], &[], &["audio"], &[]))
        .unwrap();
    let map = IkigaiService::new(&mut conn).map_for_user("user_1").unwrap();
    assert_eq!(map.profile_id, profile.id);
    assert_eq!(map.entries.passion, vec!["music"]);
    assert_eq!(map.entries.profession, vec!["audio"]);

    let err = IkigaiService::new(&mut conn)
        .map_for_user("stranger")
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "profile", .. }));
}
