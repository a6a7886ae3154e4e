use std::sync::Arc;

use canvasion::models::{Assignment, AssignmentStatus};
use canvasion::notion::{NotionClient, NotionConfig, NotionHttpClient};
use chrono::{TimeZone, Utc};

fn test_assignment(id: &str) -> Assignment {
    Assignment {
        id: id.to_string(),
        name: format!("Integration Test Assignment - {}", Utc::now().timestamp()),
        course_name: "Integration Test Course".to_string(),
        due_date: Some(Utc.with_ymd_and_hms(2025, 11, 25, 23, 59, 0).unwrap()),
        description: "Created by the live integration test".to_string(),
        updated_date: Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap(),
        link: "https://canvas.example.com/courses/7/assignments/101".to_string(),
        points_possible: Some(100.0),
        score: None,
        status: AssignmentStatus::Overdue,
        submitted_date: None,
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored --test-threads=1
async fn test_recreate_database_and_write_page() {
    dotenvy::dotenv().ok();

    let config = NotionConfig::new_from_env().expect("Failed to load Notion config");
    let notion = Arc::new(NotionHttpClient::new(config).expect("Failed to create Notion client"));

    // Archive whatever a previous run left behind.
    if let Some(old_id) = notion.find_database().await.expect("Failed to search parent page") {
        notion
            .archive_database(&old_id)
            .await
            .expect("Failed to archive previous database");
        println!("Archived previous database {}", old_id);
    }

    let database_id = notion
        .create_database()
        .await
        .expect("Failed to create database");
    println!("Created database {}", database_id);

    let assignment = test_assignment("900001");
    notion
        .create_page(&database_id, &assignment)
        .await
        .expect("Failed to write page");

    // Read the row back and verify it survived the trip.
    let fetched = notion
        .query_assignments(&database_id)
        .await
        .expect("Failed to query database");
    println!("Fetched {} assignments from Notion", fetched.len());

    let found = fetched
        .iter()
        .find(|a| a.id == assignment.id)
        .expect("Written assignment not found in Notion");

    assert_eq!(found.name, assignment.name, "Name mismatch");
    assert_eq!(found.status, assignment.status, "Status mismatch");
    assert_eq!(found.due_date, assignment.due_date, "Due date mismatch");
    assert_eq!(found.course_name, assignment.course_name, "Class mismatch");
    println!("✓ Assignment successfully written and verified in Notion!");
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored --test-threads=1
async fn test_find_database_sees_the_created_database() {
    dotenvy::dotenv().ok();

    let config = NotionConfig::new_from_env().expect("Failed to load Notion config");
    let notion = Arc::new(NotionHttpClient::new(config).expect("Failed to create Notion client"));

    if let Some(old_id) = notion.find_database().await.expect("Failed to search parent page") {
        notion
            .archive_database(&old_id)
            .await
            .expect("Failed to archive previous database");
    }

    let database_id = notion
        .create_database()
        .await
        .expect("Failed to create database");

    let found = notion
        .find_database()
        .await
        .expect("Failed to search parent page")
        .expect("Fresh database not found under the parent page");

    // Notion reports block ids with dashes regardless of the create response.
    let normalize = |id: &str| id.replace('-', "");
    assert_eq!(normalize(&found), normalize(&database_id));
    println!("✓ Fresh database is discoverable under the parent page!");
}
