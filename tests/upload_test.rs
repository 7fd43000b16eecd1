mod common;

use drive_backend::api::error::AppError;
use drive_backend::config::AppConfig;
use drive_backend::models::UploadItem;

#[tokio::test]
async fn test_upload_then_fetch_roundtrip() {
    let ctx = common::setup().await;
    let user = ctx.create_user("alice@example.com").await;
    let folder = ctx
        .state
        .hierarchy
        .create_folder(&user, "Docs", None)
        .await
        .unwrap();

    let file = ctx
        .state
        .uploads
        .upload_single(&user, UploadItem::new("report.pdf", "0123456789"), Some(folder.id))
        .await
        .unwrap();

    assert_eq!(file.name, "report.pdf");
    assert_eq!(file.size, 10);
    assert_eq!(file.extension, ".pdf");
    assert_eq!(file.folder_id, folder.id);
    assert!(file.blob_key.starts_with(&format!("uploads/{}/", user.user_id)));
    assert!(ctx.blobs.contains(&file.blob_key));

    let fetched = ctx.state.hierarchy.get_file(&user, file.id).await.unwrap();
    assert_eq!(fetched.name, file.name);
    assert_eq!(fetched.size, file.size);
    assert_eq!(fetched.folder_id, file.folder_id);

    let (meta, bytes) = ctx.state.uploads.download(&user, file.id).await.unwrap();
    assert_eq!(meta.id, file.id);
    assert_eq!(&bytes[..], b"0123456789");
}

#[tokio::test]
async fn test_display_name_override_keeps_uploaded_extension() {
    let ctx = common::setup().await;
    let user = ctx.create_user("alice@example.com").await;
    let folder = ctx
        .state
        .hierarchy
        .create_folder(&user, "Docs", None)
        .await
        .unwrap();

    let item = UploadItem::new("report.pdf", "x").renamed("Quarterly report");
    let file = ctx
        .state
        .uploads
        .upload_single(&user, item, Some(folder.id))
        .await
        .unwrap();

    assert_eq!(file.name, "Quarterly report");
    assert_eq!(file.extension, ".pdf");
}

#[tokio::test]
async fn test_upload_rejects_bad_input_before_storing() {
    let ctx = common::setup().await;
    let user = ctx.create_user("alice@example.com").await;
    let folder = ctx
        .state
        .hierarchy
        .create_folder(&user, "Docs", None)
        .await
        .unwrap();
    let uploads = &ctx.state.uploads;

    let res = uploads
        .upload_single(&user, UploadItem::new("empty.txt", ""), Some(folder.id))
        .await;
    assert!(matches!(res, Err(AppError::InvalidInput(_))));

    let res = uploads
        .upload_single(&user, UploadItem::new("a.txt", "data"), None)
        .await;
    assert!(matches!(res, Err(AppError::InvalidInput(_))));

    let res = uploads
        .upload_single(&user, UploadItem::new("  ", "data"), Some(folder.id))
        .await;
    assert!(matches!(res, Err(AppError::InvalidName(_))));

    assert_eq!(ctx.blobs.len(), 0);
}

#[tokio::test]
async fn test_upload_over_size_limit() {
    let config = AppConfig {
        max_file_size: 8,
        ..AppConfig::development()
    };
    let ctx = common::setup_with(config).await;
    let user = ctx.create_user("alice@example.com").await;
    let folder = ctx
        .state
        .hierarchy
        .create_folder(&user, "Docs", None)
        .await
        .unwrap();

    let res = ctx
        .state
        .uploads
        .upload_single(&user, UploadItem::new("big.bin", "123456789"), Some(folder.id))
        .await;
    assert!(matches!(res, Err(AppError::PayloadTooLarge(_))));
    assert_eq!(ctx.blobs.len(), 0);
}

#[tokio::test]
async fn test_metadata_failure_leaves_no_blob() {
    let ctx = common::setup().await;
    let user = ctx.create_user("alice@example.com").await;

    // The folder does not exist, so the record write fails after the bytes are stored.
    let res = ctx
        .state
        .uploads
        .upload_single(&user, UploadItem::new("a.txt", "hello"), Some(404))
        .await;

    assert!(matches!(res, Err(AppError::NotFound(_))));
    assert_eq!(ctx.blobs.len(), 0);
    assert!(ctx.state.reconciler.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_compensation_is_recorded_and_swept() {
    let ctx = common::setup().await;
    let user = ctx.create_user("alice@example.com").await;
    ctx.blobs.fail_delete_on("a.txt");

    let res = ctx
        .state
        .uploads
        .upload_single(&user, UploadItem::new("a.txt", "hello"), Some(404))
        .await;

    // The original error wins over the compensation failure.
    assert!(matches!(res, Err(AppError::NotFound(_))));
    assert_eq!(ctx.blobs.len(), 1);

    let pending = ctx.state.reconciler.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].blob_key.ends_with("-a.txt"));

    let report = ctx.state.reconciler.sweep().await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.still_failing, 1);
    assert_eq!(ctx.state.reconciler.pending().await.unwrap()[0].attempts, 2);

    ctx.blobs.heal();
    let report = ctx.state.reconciler.sweep().await.unwrap();
    assert_eq!(report.resolved, 1);
    assert_eq!(ctx.blobs.len(), 0);
    assert!(ctx.state.reconciler.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_upload_is_all_or_nothing() {
    let ctx = common::setup().await;
    let user = ctx.create_user("alice@example.com").await;
    let folder = ctx
        .state
        .hierarchy
        .create_folder(&user, "Docs", None)
        .await
        .unwrap();

    ctx.blobs.fail_put_on("-c.txt");
    let items = vec![
        UploadItem::new("a.txt", "aaa"),
        UploadItem::new("b.txt", "bbb"),
        UploadItem::new("c.txt", "ccc"),
    ];
    let res = ctx
        .state
        .uploads
        .upload_multiple(&user, items, Some(folder.id))
        .await;

    assert!(matches!(res, Err(AppError::Storage(_))));
    assert_eq!(ctx.blobs.len(), 0);
    assert!(
        ctx.state
            .hierarchy
            .list_files(&user, folder.id)
            .await
            .unwrap()
            .is_empty()
    );

    ctx.blobs.heal();
    let items = vec![
        UploadItem::new("a.txt", "aaa"),
        UploadItem::new("b.txt", "bbb"),
    ];
    let files = ctx
        .state
        .uploads
        .upload_multiple(&user, items, Some(folder.id))
        .await
        .unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(ctx.blobs.len(), 2);
}

#[tokio::test]
async fn test_batch_validation_happens_before_any_write() {
    let ctx = common::setup().await;
    let user = ctx.create_user("alice@example.com").await;
    let folder = ctx
        .state
        .hierarchy
        .create_folder(&user, "Docs", None)
        .await
        .unwrap();
    let uploads = &ctx.state.uploads;

    let items = vec![UploadItem::new("ok.txt", "fine"), UploadItem::new("bad.txt", "")];
    let res = uploads.upload_multiple(&user, items, Some(folder.id)).await;
    assert!(matches!(res, Err(AppError::InvalidInput(_))));

    let res = uploads.upload_multiple(&user, Vec::new(), Some(folder.id)).await;
    assert!(matches!(res, Err(AppError::InvalidInput(_))));

    let too_many = (0..6)
        .map(|i| UploadItem::new(format!("{}.txt", i), "x"))
        .collect();
    let res = uploads.upload_multiple(&user, too_many, Some(folder.id)).await;
    assert!(matches!(res, Err(AppError::InvalidInput(_))));

    assert_eq!(ctx.blobs.len(), 0);
}

#[tokio::test]
async fn test_download_of_missing_blob_is_storage_error() {
    let ctx = common::setup().await;
    let user = ctx.create_user("alice@example.com").await;
    let folder = ctx
        .state
        .hierarchy
        .create_folder(&user, "Docs", None)
        .await
        .unwrap();
    let file = ctx
        .state
        .uploads
        .upload_single(&user, UploadItem::new("a.txt", "hello"), Some(folder.id))
        .await
        .unwrap();

    ctx.blobs.fail_get_on(&file.blob_key);
    let res = ctx.state.uploads.download(&user, file.id).await;
    assert!(matches!(res, Err(AppError::Storage(_))));
}
