use vocassion_core::model::ikigai::IkigaiEntries;
use vocassion_core::model::profile::NewProfile;
use vocassion_core::{
    open_db_in_memory, require_profile, IkigaiService, ProfileService, ServiceError,
};

fn request(name: &str) -> NewProfile {
    NewProfile {
        name: name.to_string(),
        email: Some(" ada@example.com ".to_string()),
        image_url: None,
    }
}

#[test]
fn create_profile_generates_username_and_slug() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = ProfileService::new(&mut conn)
        .create_profile("user_1", &request("Ada Lovelace"))
        .unwrap();

    assert_eq!(profile.user_id, "user_1");
    assert_eq!(profile.name, "Ada Lovelace");
    assert!(profile.username.starts_with("adalovelace"));
    assert_eq!(profile.username.len(), "adalovelace".len() + 6);
    assert_eq!(profile.slug, profile.username);
    assert_eq!(profile.email.as_deref(), Some("ada@example.com"));
}

#[test]
fn second_profile_for_same_user_conflicts() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = ProfileService::new(&mut conn);
    service.create_profile("user_1", &request("Ada")).unwrap();

    let err = service.create_profile("user_1", &request("Ada")).unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn blank_name_is_a_validation_error() {
    let mut conn = open_db_in_memory().unwrap();
    let err = ProfileService::new(&mut conn)
        .create_profile("user_1", &request("   "))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn unknown_user_has_no_profile() {
    let conn = open_db_in_memory().unwrap();
    let err = require_profile(&conn, "nobody").unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "profile", .. }));
}

#[test]
fn rename_updates_display_name() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = ProfileService::new(&mut conn);
    let profile = service.create_profile("user_1", &request("Ada")).unwrap();

    let renamed = service.rename_profile(profile.id, "  Countess Ada ").unwrap();
    assert_eq!(renamed.name, "Countess Ada");
    assert_eq!(renamed.username, profile.username);
    assert_eq!(service.profile_for_user("user_1").unwrap().name, "Countess Ada");
}

#[test]
fn public_profile_hides_email_and_attaches_map() {
    let mut conn = open_db_in_memory().unwrap();
    let profile = ProfileService::new(&mut conn)
        .create_profile("user_1", &request("Ada Lovelace"))
        .unwrap();

    let public = ProfileService::new(&mut conn)
        .public_profile("user_1")
        .unwrap();
    assert_eq!(public.id, profile.id);
    assert_eq!(public.username, profile.username);
    assert!(public.ikigai_map.is_none());
    let json = serde_json::to_value(&public).unwrap();
    assert!(json.get("email").is_none());
    assert!(json["ikigaiMap"].is_null());

    IkigaiService::new(&mut conn)
        .submit_assessment(
            profile.id,
            &IkigaiEntries {
                vocation: vec!["teaching".to_string()],
                ..IkigaiEntries::default()
            },
        )
        .unwrap();
    let public = ProfileService::new(&mut conn)
        .public_profile("user_1")
        .unwrap();
    assert_eq!(public.ikigai_map.unwrap().entries.vocation, vec!["teaching"]);

    let err = ProfileService::new(&mut conn)
        .public_profile("nobody")
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "profile", .. }));
}
