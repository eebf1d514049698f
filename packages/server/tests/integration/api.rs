use serde_json::json;

use crate::common::{TestApp, routes};

mod link_creation {
    use super::*;

    #[tokio::test]
    async fn created_link_resolves_publicly() {
        let app = TestApp::spawn().await;

        let body = app.create_link("docs", "https://example.com/docs", None).await;
        assert_eq!(body["slug"], "docs");
        assert_eq!(body["type"], "link");
        assert!(body["password_hash"].is_null());

        let res = app.get(&routes::resolve("docs")).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["type"], "link");
        assert_eq!(res.body["target_url"], "https://example.com/docs");
    }

    #[tokio::test]
    async fn duplicate_slug_returns_409() {
        let app = TestApp::spawn().await;
        app.create_link("docs", "https://example.com/a", None).await;

        let res = app
            .post(
                routes::LINKS,
                &json!({"slug": "docs", "target_url": "https://example.com/b"}),
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "SLUG_TAKEN");
    }

    #[tokio::test]
    async fn invalid_input_returns_400() {
        let app = TestApp::spawn().await;

        for body in [
            json!({"slug": "a/b", "target_url": "https://example.com"}),
            json!({"slug": "", "target_url": "https://example.com"}),
            json!({"slug": "ok", "target_url": "example"}),
            json!({"slug": "ok", "target_url": "https://example.com", "password": "semi;colon"}),
            json!({"slug": "ok", "target_url": "https://example.com", "expires_at": "2000-01-01T00:00:00Z"}),
        ] {
            let res = app.post(routes::LINKS, &body).await;
            assert_eq!(res.status, 400, "accepted {body}: {}", res.text);
            assert_eq!(res.code(), "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn non_ascii_slug_is_stored_escaped() {
        let app = TestApp::spawn().await;

        let body = app.create_link("café", "https://example.com", None).await;
        assert_eq!(body["slug"], "caf%C3%A9");

        let res = app.get(&routes::resolve("café")).await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn missing_json_content_type_returns_400() {
        let app = TestApp::spawn().await;
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::LINKS))
            .body(r#"{"slug":"x","target_url":"https://example.com"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 400);
    }
}

mod resolving {
    use super::*;

    #[tokio::test]
    async fn unknown_slug_returns_404() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::resolve("missing")).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn protected_link_needs_password() {
        let app = TestApp::spawn().await;
        app.create_link("secret", "https://example.com/vault", Some("open sesame"))
            .await;

        let res = app.get(&routes::resolve("secret")).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "PASSWORD_REQUIRED");

        let res = app
            .post(&routes::unlock("secret"), &json!({"password": "wrong"}))
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "INVALID_PASSWORD");

        let res = app
            .post(&routes::unlock("secret"), &json!({"password": "open sesame"}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["target_url"], "https://example.com/vault");
    }

    #[tokio::test]
    async fn unlocking_unprotected_link_ignores_password() {
        let app = TestApp::spawn().await;
        app.create_link("open", "https://example.com", None).await;

        let res = app
            .post(&routes::unlock("open"), &json!({"password": "anything"}))
            .await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn expired_resource_is_not_found() {
        let app = TestApp::spawn().await;
        let body = app.create_link("brief", "https://example.com", None).await;

        // Expiry must be in the future when set, so move it back directly.
        use sea_orm::{ActiveModelTrait, EntityTrait, Set};
        use server::entity::entry;
        let id = body["id"].as_i64().unwrap();
        let model = entry::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        let mut active: entry::ActiveModel = model.into();
        active.expires_at = Set(Some(chrono::Utc::now() - chrono::Duration::seconds(1)));
        active.update(&app.db).await.unwrap();

        let res = app.get(&routes::resolve("brief")).await;
        assert_eq!(res.status, 404);

        // Administrators still see it.
        let list = app.get(routes::RESOURCES).await;
        assert_eq!(list.body["pagination"]["total"], 1);
    }
}

mod files {
    use super::*;

    #[tokio::test]
    async fn file_lifecycle() {
        let app = TestApp::spawn().await;

        let body = app.create_file("report", 2048).await;
        assert_eq!(body["upload"]["type"], "single");
        assert_eq!(body["resource"]["file"]["pending"], true);
        let file_uuid = body["file_uuid"].as_str().unwrap().to_string();

        let res = app.get(&routes::resolve("report")).await;
        assert_eq!(res.status, 409, "pending file should not resolve");

        let res = app.post(&routes::complete_upload("report"), &json!({})).await;
        assert_eq!(res.status, 409, "object has not been uploaded");

        app.storage.put_object(&format!("files/{file_uuid}"), 2048);
        let res = app.post(&routes::complete_upload("report"), &json!({})).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["file"]["pending"], false);

        let res = app.get(&routes::resolve("report")).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["type"], "file");
        assert_eq!(res.body["filename"], "report.pdf");
        assert_eq!(res.body["size"], 2048);
        assert_eq!(res.body["url_expires_in"], 1800);
        assert!(
            res.body["download_url"]
                .as_str()
                .unwrap()
                .contains(&file_uuid)
        );
    }

    #[tokio::test]
    async fn large_file_gets_multipart_plan() {
        let app = TestApp::spawn().await;

        let body = app.create_file("archive", 120 * 1024 * 1024).await;
        assert_eq!(body["upload"]["type"], "multipart");
        assert_eq!(body["upload"]["parts"].as_array().unwrap().len(), 3);
        assert_eq!(body["upload"]["parts"][0]["part_number"], 1);
    }

    #[tokio::test]
    async fn zero_size_file_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::FILES,
                &json!({
                    "slug": "empty",
                    "filename": "empty.txt",
                    "mime_type": "text/plain",
                    "size": 0,
                }),
            )
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn bad_filename_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::FILES,
                &json!({
                    "slug": "sneaky",
                    "filename": "../etc/passwd",
                    "mime_type": "text/plain",
                    "size": 10,
                }),
            )
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn completing_a_link_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_link("go", "https://example.com", None).await;

        let res = app.post(&routes::complete_upload("go"), &json!({})).await;
        assert_eq!(res.status, 400);
    }
}

mod administration {
    use super::*;

    #[tokio::test]
    async fn listing_redacts_password_hashes() {
        let app = TestApp::spawn().await;
        app.create_link("open", "https://example.com/a", None).await;
        app.create_link("closed", "https://example.com/b", Some("pw")).await;
        app.create_file("doc", 100).await;

        let res = app.get(&format!("{}?page=1&limit=2", routes::RESOURCES)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);

        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["slug"], "open");
        assert!(data[0]["password_hash"].is_null());
        assert_eq!(data[1]["password_hash"], "REDACTED");
        assert!(!res.text.contains("$argon2id$"));

        let res = app.get(&format!("{}?page=2&limit=2", routes::RESOURCES)).await;
        assert_eq!(res.body["data"][0]["type"], "file");
    }

    #[tokio::test]
    async fn listing_rejects_out_of_range_limit() {
        let app = TestApp::spawn().await;
        let res = app.get(&format!("{}?limit=101", routes::RESOURCES)).await;
        assert_eq!(res.status, 400);
        let res = app.get(&format!("{}?page=0", routes::RESOURCES)).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn listing_rejects_page_past_any_offset() {
        let app = TestApp::spawn().await;
        let res = app
            .get(&format!("{}?page={}&limit=20", routes::RESOURCES, u64::MAX))
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.code(), "VALIDATION_ERROR");

        // The server is still answering.
        assert_eq!(app.get(routes::RESOURCES).await.status, 200);
    }

    #[tokio::test]
    async fn entry_update_renames_and_keeps_password() {
        let app = TestApp::spawn().await;
        app.create_link("old", "https://example.com", Some("pw")).await;

        let res = app
            .patch(
                &routes::entry("old"),
                &json!({"slug": "new", "update_password": false}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["slug"], "new");
        assert_eq!(res.body["password_hash"], "REDACTED");

        assert_eq!(app.get(&routes::resolve("old")).await.status, 404);
        let res = app
            .post(&routes::unlock("new"), &json!({"password": "pw"}))
            .await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn entry_update_can_remove_password() {
        let app = TestApp::spawn().await;
        app.create_link("locked", "https://example.com", Some("pw")).await;

        let res = app
            .patch(
                &routes::entry("locked"),
                &json!({"update_password": true, "password": null}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert_eq!(app.get(&routes::resolve("locked")).await.status, 200);
    }

    #[tokio::test]
    async fn entry_update_to_taken_slug_conflicts() {
        let app = TestApp::spawn().await;
        app.create_link("a", "https://example.com/a", None).await;
        app.create_link("b", "https://example.com/b", None).await;

        let res = app
            .patch(
                &routes::entry("b"),
                &json!({"slug": "a", "update_password": false}),
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "SLUG_TAKEN");
    }

    #[tokio::test]
    async fn link_target_update() {
        let app = TestApp::spawn().await;
        app.create_link("go", "https://old.example", None).await;

        let res = app
            .patch(&routes::link("go"), &json!({"target_url": "https://new.example"}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get(&routes::resolve("go")).await;
        assert_eq!(res.body["target_url"], "https://new.example");
    }

    #[tokio::test]
    async fn delete_then_resolve_is_404() {
        let app = TestApp::spawn().await;
        app.create_link("gone", "https://example.com", None).await;

        let res = app.delete(&routes::resource("gone")).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.get(&routes::resolve("gone")).await.status, 404);
        assert_eq!(app.delete(&routes::resource("gone")).await.status, 404);
    }
}
