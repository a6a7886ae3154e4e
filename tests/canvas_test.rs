use canvasion::canvas::{dto, parse_next_link};
use chrono::{TimeZone, Utc};

#[test]
fn parse_next_link_extracts_the_next_url() {
    let header = r#"<https://canvas.example.com/api/v1/courses?page=1&per_page=100>; rel="current",<https://canvas.example.com/api/v1/courses?page=2&per_page=100>; rel="next",<https://canvas.example.com/api/v1/courses?page=1&per_page=100>; rel="first",<https://canvas.example.com/api/v1/courses?page=5&per_page=100>; rel="last""#;

    assert_eq!(
        parse_next_link(header).as_deref(),
        Some("https://canvas.example.com/api/v1/courses?page=2&per_page=100")
    );
}

#[test]
fn parse_next_link_returns_none_on_the_last_page() {
    let header = r#"<https://canvas.example.com/api/v1/courses?page=5>; rel="current",<https://canvas.example.com/api/v1/courses?page=1>; rel="first",<https://canvas.example.com/api/v1/courses?page=5>; rel="last""#;
    assert_eq!(parse_next_link(header), None);
    assert_eq!(parse_next_link(""), None);
}

#[test]
fn assignment_deserializes_with_embedded_submission() {
    let json = r#"{
        "id": 987,
        "name": "Lab Report 2",
        "due_at": "2025-11-25T23:59:00Z",
        "description": "<p>Submit your report</p>",
        "points_possible": 50,
        "updated_at": "2025-11-01T08:00:00Z",
        "html_url": "https://canvas.example.com/courses/7/assignments/987",
        "course_id": 7,
        "submission": {
            "id": 5555,
            "workflow_state": "submitted",
            "submitted_at": "2025-11-24T10:00:00Z",
            "score": 45.0,
            "attempt": 1,
            "late": false
        }
    }"#;

    let assignment: dto::Assignment = serde_json::from_str(json).unwrap();
    assert_eq!(assignment.id, 987);
    assert_eq!(
        assignment.due_at,
        Some(Utc.with_ymd_and_hms(2025, 11, 25, 23, 59, 0).unwrap())
    );
    assert_eq!(assignment.points_possible, Some(50.0));

    let submission = assignment.submission.unwrap();
    assert_eq!(submission.workflow_state, "submitted");
    assert_eq!(submission.score, Some(45.0));
}

#[test]
fn assignment_deserializes_with_nulls() {
    let json = r#"{
        "id": 988,
        "name": "Ungraded survey",
        "due_at": null,
        "description": null,
        "points_possible": null,
        "updated_at": "2025-11-01T08:00:00Z",
        "html_url": "https://canvas.example.com/courses/7/assignments/988",
        "submission": null
    }"#;

    let assignment: dto::Assignment = serde_json::from_str(json).unwrap();
    assert_eq!(assignment.due_at, None);
    assert_eq!(assignment.description, None);
    assert!(assignment.submission.is_none());
}

#[test]
fn course_activity_filter() {
    let available: dto::Course =
        serde_json::from_str(r#"{"id": 1, "name": "Bio", "workflow_state": "available"}"#).unwrap();
    let active: dto::Course =
        serde_json::from_str(r#"{"id": 2, "name": "Chem", "workflow_state": "active"}"#).unwrap();
    let completed: dto::Course =
        serde_json::from_str(r#"{"id": 3, "name": "Old", "workflow_state": "completed"}"#).unwrap();
    let stateless: dto::Course = serde_json::from_str(r#"{"id": 4}"#).unwrap();

    assert!(available.is_active());
    assert!(active.is_active());
    assert!(!completed.is_active());
    assert!(!stateless.is_active());
}

#[test]
fn course_display_name_falls_back_to_id() {
    let unnamed: dto::Course = serde_json::from_str(r#"{"id": 42}"#).unwrap();
    assert_eq!(unnamed.display_name(), "Course 42");

    let named: dto::Course = serde_json::from_str(r#"{"id": 42, "name": "Physics"}"#).unwrap();
    assert_eq!(named.display_name(), "Physics");
}
