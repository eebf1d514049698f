use common::storage::object_key;
use common::upload::PART_SIZE;
use common::{CompletedPart, UploadPlan};
use sea_orm::{EntityTrait, PaginatorTrait};

use server::entity::entry;
use server::error::AppError;
use server::service::{NewEntry, NewFile, ResourceService, UploadCompletion};

use crate::common::TestApp;

const MIB: i64 = 1024 * 1024;

fn new_entry(slug: &str) -> NewEntry {
    NewEntry {
        slug: slug.into(),
        password: None,
        expires_at: None,
    }
}

fn new_file(size: i64) -> NewFile {
    NewFile {
        filename: "video.mp4".into(),
        mime_type: "video/mp4".into(),
        size,
    }
}

mod planning {
    use super::*;

    #[tokio::test]
    async fn part_size_file_gets_single_url() {
        let app = TestApp::spawn().await;
        let service = ResourceService::new(&app.db, &app.uploads);

        let (resource, plan) = service
            .create_file(new_entry("small"), new_file(PART_SIZE as i64))
            .await
            .unwrap();

        assert!(resource.as_file().unwrap().pending);
        let UploadPlan::Single { upload_url } = plan else {
            panic!("expected a single upload");
        };
        assert!(upload_url.contains(&object_key(&resource.as_file().unwrap().file_uuid)));
    }

    #[tokio::test]
    async fn one_byte_over_part_size_gets_two_parts() {
        let app = TestApp::spawn().await;
        let service = ResourceService::new(&app.db, &app.uploads);

        let (_, plan) = service
            .create_file(new_entry("big"), new_file(PART_SIZE as i64 + 1))
            .await
            .unwrap();

        let UploadPlan::Multipart { upload_id, parts } = plan else {
            panic!("expected a multipart upload");
        };
        assert!(!upload_id.is_empty());
        let numbers: Vec<u32> = parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, [1, 2]);
    }

    #[tokio::test]
    async fn planning_failure_removes_the_resource() {
        let app = TestApp::spawn().await;
        app.storage.fail_part(2);
        let service = ResourceService::new(&app.db, &app.uploads);

        let err = service
            .create_file(new_entry("doomed"), new_file(120 * MIB))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(entry::Entity::find().count(&app.db).await.unwrap(), 0);
        // Part 3 was never requested.
        assert!(!app.storage.calls().iter().any(|c| c == "part 3"));
    }

    #[tokio::test]
    async fn failed_cleanup_keeps_the_planning_error() {
        let app = TestApp::spawn().await;
        app.storage.fail_part_after_wiping_entries(2, &app.db);
        let service = ResourceService::new(&app.db, &app.uploads);

        let err = service
            .create_file(new_entry("vanished"), new_file(120 * MIB))
            .await
            .unwrap_err();

        // The cleanup delete hit a missing row; the caller still sees the storage failure.
        assert!(matches!(err, AppError::Internal(_)), "got {err:?}");
        assert_eq!(entry::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_without_storage_calls() {
        let app = TestApp::spawn().await;
        let service = ResourceService::new(&app.db, &app.uploads);

        let err = service
            .create_file(new_entry("huge"), new_file(common::upload::MAX_FILE_SIZE + 1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(app.storage.calls().is_empty());
        assert_eq!(entry::Entity::find().count(&app.db).await.unwrap(), 0);
    }
}

mod completion {
    use super::*;

    #[tokio::test]
    async fn single_upload_needs_the_object() {
        let app = TestApp::spawn().await;
        let service = ResourceService::new(&app.db, &app.uploads);

        let (resource, _) = service
            .create_file(new_entry("clip"), new_file(3 * MIB))
            .await
            .unwrap();
        let key = object_key(&resource.as_file().unwrap().file_uuid);

        let err = service
            .finish_file_upload("clip", UploadCompletion::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        app.storage.put_object(&key, 3 * MIB as u64 - 1);
        let err = service
            .finish_file_upload("clip", UploadCompletion::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        app.storage.put_object(&key, 3 * MIB as u64);
        let done = service
            .finish_file_upload("clip", UploadCompletion::Single)
            .await
            .unwrap();
        assert!(!done.as_file().unwrap().pending);

        let again = service
            .finish_file_upload("clip", UploadCompletion::Single)
            .await
            .unwrap_err();
        assert!(matches!(again, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn multipart_upload_completes_with_all_parts() {
        let app = TestApp::spawn().await;
        let service = ResourceService::new(&app.db, &app.uploads);

        let (_, plan) = service
            .create_file(new_entry("movie"), new_file(120 * MIB))
            .await
            .unwrap();
        let UploadPlan::Multipart { upload_id, parts } = plan else {
            panic!("expected a multipart upload");
        };

        let completed: Vec<CompletedPart> = parts
            .iter()
            .map(|p| CompletedPart {
                part_number: p.part_number,
                etag: format!("\"etag-{}\"", p.part_number),
            })
            .collect();

        let err = service
            .finish_file_upload(
                "movie",
                UploadCompletion::Multipart {
                    upload_id: upload_id.clone(),
                    parts: completed[1..].to_vec(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let done = service
            .finish_file_upload(
                "movie",
                UploadCompletion::Multipart {
                    upload_id,
                    parts: completed,
                },
            )
            .await
            .unwrap();
        assert!(!done.as_file().unwrap().pending);
    }

    #[tokio::test]
    async fn multipart_upload_needs_every_planned_part() {
        let app = TestApp::spawn().await;
        let service = ResourceService::new(&app.db, &app.uploads);

        let (_, plan) = service
            .create_file(new_entry("movie"), new_file(120 * MIB))
            .await
            .unwrap();
        let UploadPlan::Multipart { upload_id, .. } = plan else {
            panic!("expected a multipart upload");
        };

        let err = service
            .finish_file_upload(
                "movie",
                UploadCompletion::Multipart {
                    upload_id,
                    parts: vec![CompletedPart {
                        part_number: 1,
                        etag: "\"etag-1\"".into(),
                    }],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!app.storage.calls().iter().any(|c| c.starts_with("complete")));

        let still_pending = service.resolve("movie", None).await.unwrap_err();
        assert!(matches!(still_pending, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn completion_kind_must_match_plan() {
        let app = TestApp::spawn().await;
        let service = ResourceService::new(&app.db, &app.uploads);

        service
            .create_file(new_entry("movie"), new_file(120 * MIB))
            .await
            .unwrap();
        let err = service
            .finish_file_upload("movie", UploadCompletion::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn deleting_a_file_removes_its_object() {
        let app = TestApp::spawn().await;
        let service = ResourceService::new(&app.db, &app.uploads);

        let (resource, _) = service
            .create_file(new_entry("clip"), new_file(MIB))
            .await
            .unwrap();
        let key = object_key(&resource.as_file().unwrap().file_uuid);
        app.storage.put_object(&key, MIB as u64);

        service.delete_resource("clip").await.unwrap();

        assert!(!app.storage.has_object(&key));
        assert_eq!(entry::Entity::find().count(&app.db).await.unwrap(), 0);
    }
}
