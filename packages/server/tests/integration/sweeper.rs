use common::storage::object_key;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use server::entity::{entry, file};
use server::service::{NewEntry, NewFile, ResourceService, UploadCompletion};
use server::sweeper::sweep_stale_uploads;

use crate::common::TestApp;

fn new_entry(slug: &str) -> NewEntry {
    NewEntry {
        slug: slug.into(),
        password: None,
        expires_at: None,
    }
}

fn new_file() -> NewFile {
    NewFile {
        filename: "draft.txt".into(),
        mime_type: "text/plain".into(),
        size: 64,
    }
}

/// Pretend the entry was created a week ago.
async fn backdate(app: &TestApp, entry_id: i64) {
    let model = entry::Entity::find_by_id(entry_id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: entry::ActiveModel = model.into();
    active.created_at = Set(chrono::Utc::now() - chrono::Duration::days(7));
    active.update(&app.db).await.unwrap();
}

#[tokio::test]
async fn stale_pending_files_are_removed() {
    let app = TestApp::spawn().await;
    let service = ResourceService::new(&app.db, &app.uploads);

    let (abandoned, _) = service
        .create_file(new_entry("abandoned"), new_file())
        .await
        .unwrap();
    let (finished, _) = service
        .create_file(new_entry("finished"), new_file())
        .await
        .unwrap();
    let (fresh, _) = service
        .create_file(new_entry("fresh"), new_file())
        .await
        .unwrap();
    let link = service
        .create_link(new_entry("old-link"), "https://example.com".into())
        .await
        .unwrap();

    let abandoned_key = object_key(&abandoned.as_file().unwrap().file_uuid);
    app.storage.put_object(&abandoned_key, 10);
    app.storage
        .put_object(&object_key(&finished.as_file().unwrap().file_uuid), 64);
    service
        .finish_file_upload("finished", UploadCompletion::Single)
        .await
        .unwrap();

    for id in [abandoned.id(), finished.id(), link.id()] {
        backdate(&app, id).await;
    }

    let removed = sweep_stale_uploads(&app.db, &app.uploads, 24 * 60 * 60)
        .await
        .unwrap();
    assert_eq!(removed, 1);

    assert!(entry::Entity::find_by_id(abandoned.id()).one(&app.db).await.unwrap().is_none());
    assert!(!app.storage.has_object(&abandoned_key));
    assert!(entry::Entity::find_by_id(fresh.id()).one(&app.db).await.unwrap().is_some());
    assert_eq!(entry::Entity::find().count(&app.db).await.unwrap(), 3);
    assert_eq!(file::Entity::find().count(&app.db).await.unwrap(), 2);
}

#[tokio::test]
async fn nothing_to_sweep() {
    let app = TestApp::spawn().await;
    let removed = sweep_stale_uploads(&app.db, &app.uploads, 60).await.unwrap();
    assert_eq!(removed, 0);
}
