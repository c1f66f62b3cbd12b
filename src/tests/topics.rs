use crate::db::TopicFile;
use crate::rooms::{create_topic, delete_topic, NewFile};
use crate::AppError;

use super::common::{create_member, create_owner, create_test_app, owned_room};

fn attachments() -> Vec<NewFile> {
    vec![
        NewFile {
            file_name: "notes.txt".to_string(),
            data: b"meeting notes".to_vec(),
        },
        NewFile {
            file_name: "plan.csv".to_string(),
            data: b"q1,q2\n1,2".to_vec(),
        },
    ]
}

#[tokio::test]
async fn topic_attachments_are_stored_under_generated_blob_names() {
    let app = create_test_app().await;
    let owner = create_owner(&app, "alice").await;
    let room = owned_room(&app, &owner).await;

    let topic_id = create_topic(
        &app.pool,
        &app.config.upload_dir,
        room.id,
        owner.id,
        "launch",
        "see attachments",
        attachments(),
    )
    .await
    .unwrap();

    let files: Vec<TopicFile> =
        sqlx::query_as("SELECT id, file_name, blob_name, topic_id FROM files WHERE topic_id = ?")
            .bind(topic_id)
            .fetch_all(&app.pool)
            .await
            .unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].file_name, "notes.txt");
    assert_ne!(files[0].blob_name, files[0].file_name);
    assert_ne!(files[0].blob_name, files[1].blob_name);

    for file in &files {
        let on_disk = tokio::fs::read(app.config.upload_dir.join(&file.blob_name))
            .await
            .unwrap();
        assert!(!on_disk.is_empty());
    }

    let stored = tokio::fs::read(app.config.upload_dir.join(&files[0].blob_name))
        .await
        .unwrap();
    assert_eq!(stored, b"meeting notes");
}

#[tokio::test]
async fn deleting_a_topic_removes_rows_and_blobs() {
    let app = create_test_app().await;
    let owner = create_owner(&app, "alice").await;
    let room = owned_room(&app, &owner).await;
    let topic_id = create_topic(
        &app.pool,
        &app.config.upload_dir,
        room.id,
        owner.id,
        "launch",
        "see attachments",
        attachments(),
    )
    .await
    .unwrap();

    let blobs: Vec<(String,)> =
        sqlx::query_as("SELECT blob_name FROM files WHERE topic_id = ?")
            .bind(topic_id)
            .fetch_all(&app.pool)
            .await
            .unwrap();

    delete_topic(&app.pool, &app.config.upload_dir, &owner, topic_id)
        .await
        .unwrap();

    let (topics,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics WHERE id = ?")
        .bind(topic_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(topics, 0);

    let (files,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files WHERE topic_id = ?")
        .bind(topic_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(files, 0);

    for (blob_name,) in &blobs {
        let missing = tokio::fs::metadata(app.config.upload_dir.join(blob_name)).await;
        assert!(missing.is_err());
    }
}

#[tokio::test]
async fn members_cannot_delete_topics_they_did_not_write() {
    let app = create_test_app().await;
    let owner = create_owner(&app, "alice").await;
    let member = create_member(&app, &owner, "bob@test.com").await;
    let room = owned_room(&app, &owner).await;
    let topic_id = super::common::create_topic(&app, room.id, owner.id, "announcement").await;

    let result = delete_topic(&app.pool, &app.config.upload_dir, &member, topic_id).await;
    assert!(matches!(result, Err(AppError::NotFound)));

    let (topics,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics WHERE id = ?")
        .bind(topic_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(topics, 1);
}

#[tokio::test]
async fn owners_can_delete_member_topics() {
    let app = create_test_app().await;
    let owner = create_owner(&app, "alice").await;
    let member = create_member(&app, &owner, "bob@test.com").await;
    let room = owned_room(&app, &owner).await;
    let topic_id = super::common::create_topic(&app, room.id, member.id, "question").await;

    delete_topic(&app.pool, &app.config.upload_dir, &owner, topic_id)
        .await
        .unwrap();

    let (topics,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics WHERE id = ?")
        .bind(topic_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(topics, 0);
}
