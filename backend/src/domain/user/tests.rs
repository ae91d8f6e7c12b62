//! Tests for user value objects and tenant resolution.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};

#[fixture]
fn member() -> User {
    User {
        id: UserId::random(),
        firebase_uid: FirebaseUid::new("uid-123").expect("valid uid"),
        email: Email::new("ada@example.com").expect("valid email"),
        display_name: DisplayName::new("Ada").expect("valid name"),
        role: Role::Member,
        organization_id: Some(OrganizationId::random()),
        created_at: Utc
            .with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

#[rstest]
#[case("ada@example.com")]
#[case("  ADA@Example.com")]
fn email_is_normalised(#[case] raw: &str) {
    assert_eq!(Email::new(raw).expect("valid").as_ref(), "ada@example.com");
}

#[rstest]
#[case("")]
#[case("ada")]
#[case("@example.com")]
#[case("ada@")]
#[case("a@b@c")]
#[case("ada lovelace@example.com")]
fn email_rejects_malformed_input(#[case] raw: &str) {
    assert_eq!(Email::new(raw), Err(UserValidationError::InvalidEmail));
}

#[rstest]
fn display_name_is_trimmed() {
    assert_eq!(DisplayName::new("  Ada  ").expect("valid").as_ref(), "Ada");
}

#[rstest]
fn display_name_rejects_long_values() {
    let long = "x".repeat(DISPLAY_NAME_MAX + 1);
    assert_eq!(
        DisplayName::new(long),
        Err(UserValidationError::DisplayNameTooLong {
            max: DISPLAY_NAME_MAX
        })
    );
}

#[rstest]
fn firebase_uid_rejects_blank_values() {
    assert_eq!(
        FirebaseUid::new("  "),
        Err(UserValidationError::EmptyFirebaseUid)
    );
}

#[rstest]
#[case("admin", Role::Admin)]
#[case("member", Role::Member)]
fn role_parses_storage_form(#[case] raw: &str, #[case] role: Role) {
    assert_eq!(raw.parse::<Role>(), Ok(role));
    assert_eq!(role.as_str(), raw);
}

#[rstest]
fn tenant_requires_an_organization(mut member: User) {
    member.organization_id = None;
    let err = member.tenant().expect_err("no organization");
    assert_eq!(err.code(), ErrorCode::NoOrganization);
}

#[rstest]
fn members_are_not_admins(member: User) {
    let tenant = member.tenant().expect("tenant");
    let err = tenant.require_admin().expect_err("member");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
fn admins_pass_the_admin_check(mut member: User) {
    member.role = Role::Admin;
    let tenant = member.tenant().expect("tenant");
    assert!(tenant.require_admin().is_ok());
}
