use anyhow::Result;
use catalog::EntryKind;
use dataset::{
    CatalogPath, Error, FileType, FormatConfig, FormatOptions, Parent, Root, TextOptions, Version,
};
use service::{CatalogService, Config};
use std::path::Path;
use tempfile::{TempDir, tempdir};

const USERS: &str = "{\"name\":\"ann\",\"age\":31}\n{\"name\":\"bob\",\"age\":42}\n{\"name\":\"cy\",\"age\":27}\n";
const COMMA: &str = "a,b,c\n1,2,3\n4,5,6\n7,8,9\n";

fn alice() -> Root {
    Root::home("alice").expect("valid root")
}

fn home() -> Parent {
    Parent::Root(alice())
}

fn at(path: &str) -> CatalogPath {
    CatalogPath::resolve(alice(), path).expect("valid path")
}

fn service(dir: &TempDir) -> CatalogService {
    let config = Config {
        user: "alice".to_string(),
        ..Config::default()
    };
    CatalogService::in_memory(dir.path(), config)
}

async fn upload(
    service: &CatalogService,
    parent: &Parent,
    name: &str,
    ext: &str,
    content: &str,
) -> Result<service::FileView> {
    let mut reader = content.as_bytes();
    let (staged, format) = service
        .stage_upload(parent, name, ext, &mut reader)
        .await?;
    let destination = parent.child(name)?;
    Ok(service.finish_upload(&staged, &format, &destination).await?)
}

#[tokio::test]
async fn test_uploaded_json_counts_runs_not_previews() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);

    let file = upload(&service, &home(), "users.json", "json", USERS).await?;
    assert_eq!(file.file_type, FileType::Json);
    assert!(file.is_queryable);
    assert_eq!(file.job_count, 0);
    assert_eq!(file.format.owner.as_deref(), Some("alice"));

    let preview = service.preview(&file.path, None).await?;
    assert_eq!(preview.row_count(), 3);
    assert_eq!(preview.column_count(), 2);
    assert_eq!(service.get_file(&file.path).await?.job_count, 0);

    let run = service.run_query(&file.path, None).await?;
    assert_eq!(run.row_count(), 3);
    assert_eq!(service.get_file(&file.path).await?.job_count, 1);

    let listing = service.get_root(&alice()).await?;
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].kind, EntryKind::File);
    assert_eq!(listing[0].job_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_header_extraction_drops_first_row() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);

    let mut reader = COMMA.as_bytes();
    let (staged, format) = service
        .stage_upload(&home(), "comma.txt", "txt", &mut reader)
        .await?;
    let staged_preview = service.preview_staged(&format).await?;
    assert_eq!(staged_preview.row_count(), 4);
    assert_eq!(staged_preview.column_count(), 3);

    let file = service
        .finish_upload(&staged, &format, &at("comma.txt"))
        .await?;
    let raw = service.preview(&file.path, None).await?;
    assert_eq!((raw.row_count(), raw.column_count()), (4, 3));

    let mut format = service.get_format(&file.path).await?;
    assert_eq!(format.version, Some(Version::INITIAL));
    format.options = FormatOptions::Text(TextOptions {
        extract_header: true,
        ..TextOptions::default()
    });
    let saved = service.save_format(&file.path, format).await?;
    assert_eq!(saved.version, Some(Version::new(1)));

    let headed = service.preview(&file.path, None).await?;
    assert_eq!(headed.row_count(), 3);
    assert_eq!(headed.columns, vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn test_folder_formats_decide_queryability() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);
    let lake = Root::source("lake")?;
    let root = Parent::Root(lake.clone());
    let folder = |name: &str| CatalogPath::resolve(lake.clone(), name);

    for name in ["folder1", "folder2", "folder3"] {
        _ = service.create_folder(&root, name).await?;
        _ = service
            .namespace()
            .add_file(&folder(name)?.child("part-0.csv")?)
            .await?;
    }

    let f1 = service
        .save_format(&folder("folder1")?, FormatConfig::new("folder1", FormatOptions::Json))
        .await?;
    let f2 = service
        .save_format(
            &folder("folder2")?,
            FormatConfig::new("folder2", FormatOptions::Text(TextOptions::default())),
        )
        .await?;
    assert_eq!(f1.version, Some(Version::INITIAL));
    assert_eq!(f2.version, Some(Version::INITIAL));

    let queryable = |entries: &[catalog::TreeEntry]| -> Vec<bool> {
        entries.iter().map(|e| e.is_queryable).collect()
    };
    let listing = service.get_root(&lake).await?;
    assert_eq!(queryable(&listing), vec![true, true, false]);
    assert!(listing.iter().all(|e| e.kind == EntryKind::Folder));

    // Without a stored format the default comes from the children
    let default = service.get_format(&folder("folder3")?).await?;
    assert_eq!(default.file_type(), FileType::Text);
    assert!(default.version.is_none());

    let stale = service
        .delete_dataset(&folder("folder1")?, Some(Version::new(4)))
        .await;
    assert!(matches!(stale, Err(Error::VersionConflict { .. })));
    let missing = service.delete_dataset(&folder("folder1")?, None).await;
    assert!(matches!(missing, Err(Error::MissingVersion(_))));

    service
        .delete_dataset(&folder("folder1")?, f1.version)
        .await?;
    let listing = service.get_root(&lake).await?;
    assert_eq!(queryable(&listing), vec![false, true, false]);

    let view = service.get_folder(&folder("folder1")?, true).await?;
    assert!(!view.is_queryable);
    assert!(view.format.is_none());
    assert_eq!(view.contents.map(|c| c.len()), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_rename_keeps_format_with_fresh_version() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);
    let file = upload(&service, &home(), "a.csv", "csv", COMMA).await?;

    let mut format = file.format.clone();
    if let FormatOptions::Text(text) = &mut format.options {
        text.extract_header = true;
    }
    let saved = service.save_format(&file.path, format).await?;
    assert_eq!(saved.version, Some(Version::new(1)));

    let renamed = service.rename_file(&file.path, "b.csv").await?;
    assert_eq!(renamed.path, at("b.csv"));
    assert_eq!(renamed.id, file.id);
    assert_eq!(renamed.version, Version::new(2));
    assert_eq!(renamed.format.options, saved.options);

    let gone = service.get_file(&at("a.csv")).await;
    assert!(matches!(gone, Err(Error::NotFound(_))));

    // The bytes did not move, so the renamed file still previews
    let preview = service.preview(&renamed.path, None).await?;
    assert_eq!(preview.row_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_delete_frees_name_for_reupload() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);

    let first = upload(&service, &home(), "users.json", "json", USERS).await?;
    let location = first.format.location.clone().expect("uploaded bytes");
    service
        .delete_dataset(&first.path, Some(first.version))
        .await?;
    assert!(!Path::new(&location).exists());

    let second = upload(&service, &home(), "users.json", "json", "{\"name\":\"dee\"}\n").await?;
    assert_eq!(second.path, at("users.json"));
    assert_eq!(second.version, Version::INITIAL);
    assert_ne!(second.id, first.id);
    assert_eq!(service.preview(&second.path, None).await?.row_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rename_frees_name_for_reupload() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);

    let original = upload(&service, &home(), "a.json", "json", USERS).await?;
    let renamed = service.rename_file(&original.path, "b.json").await?;
    assert_eq!(renamed.path, at("b.json"));

    let fresh = upload(&service, &home(), "a.json", "json", "{\"name\":\"dee\"}\n").await?;
    assert_eq!(fresh.version, Version::INITIAL);
    assert_ne!(fresh.format.location, renamed.format.location);

    assert_eq!(service.preview(&at("a.json"), None).await?.row_count(), 1);
    assert_eq!(service.preview(&at("b.json"), None).await?.row_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_rename_refuses_folders() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);
    let lake = Root::source("lake")?;
    let f = CatalogPath::resolve(lake.clone(), "f")?;

    _ = service.create_folder(&Parent::Root(lake.clone()), "f").await?;
    _ = service.namespace().add_file(&f.child("part.csv")?).await?;
    _ = service
        .save_format(&f, FormatConfig::new("f", FormatOptions::Text(TextOptions::default())))
        .await?;

    let result = service.rename_file(&f, "g").await;
    assert!(matches!(result, Err(Error::Validation { .. })));

    let view = service.get_folder(&f, true).await?;
    assert!(view.is_queryable);
    assert_eq!(view.contents.map(|c| c.len()), Some(1));
    let g = CatalogPath::resolve(lake, "g")?;
    assert!(matches!(
        service.get_folder(&g, false).await,
        Err(Error::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_format_under_missing_folder_is_refused() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);

    let result = service
        .save_format(&at("missing/x.csv"), FormatConfig::new("x.csv", FormatOptions::Json))
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(matches!(
        service.get_format(&at("missing/x.csv")).await,
        Err(Error::NotFound(_))
    ));

    let saved = service
        .save_format(&at("x.csv"), FormatConfig::new("x.csv", FormatOptions::Json))
        .await?;
    assert_eq!(saved.version, Some(Version::INITIAL));
    Ok(())
}

#[tokio::test]
async fn test_cancel_leaves_nothing_behind() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);

    let mut reader = USERS.as_bytes();
    let (staged, format) = service
        .stage_upload(&home(), "users.json", "json", &mut reader)
        .await?;
    assert!(Path::new(&staged.location).exists());

    service.cancel_upload(&staged, &format).await?;
    service.cancel_upload(&staged, &format).await?;
    assert!(!Path::new(&staged.location).exists());
    assert!(service.get_root(&alice()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_concurrent_finishes_have_one_winner() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);

    let mut first = USERS.as_bytes();
    let mut second = USERS.as_bytes();
    let (a, fa) = service
        .stage_upload(&home(), "users.json", "json", &mut first)
        .await?;
    let (b, fb) = service
        .stage_upload(&home(), "users.json", "json", &mut second)
        .await?;

    let destination = at("users.json");
    let (ra, rb) = tokio::join!(
        service.finish_upload(&a, &fa, &destination),
        service.finish_upload(&b, &fb, &destination),
    );

    let outcomes = [ra, rb];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(Error::AlreadyExists(_)))));
    Ok(())
}

#[tokio::test]
async fn test_folder_delete_cascades_to_uploads() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);

    let docs = service.create_folder(&home(), "docs").await?;
    let nested = Parent::Folder(docs.path.clone());
    let file = upload(&service, &nested, "users.json", "json", USERS).await?;
    assert_eq!(file.path, at("docs/users.json"));

    let listing = service.get_folder(&docs.path, true).await?;
    assert_eq!(listing.contents.map(|c| c.len()), Some(1));

    let wrong = service.delete_folder(&docs.path, None).await;
    assert!(matches!(wrong, Err(Error::MissingVersion(_))));

    let location = file.format.location.clone().expect("uploaded bytes");
    service.delete_folder(&docs.path, Some(docs.version)).await?;
    assert!(!Path::new(&location).exists());
    assert!(matches!(
        service.get_file(&file.path).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        service.get_folder(&docs.path, false).await,
        Err(Error::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_upload_into_missing_folder() -> Result<()> {
    let dir = tempdir()?;
    let service = service(&dir);
    let mut reader = USERS.as_bytes();
    let result = service
        .stage_upload(&Parent::Folder(at("nowhere")), "u.json", "json", &mut reader)
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_catalog_survives_reopen() -> Result<()> {
    let dir = tempdir()?;
    let config = Config::default();
    {
        let service = CatalogService::open(dir.path(), config.clone()).await?;
        _ = upload(&service, &home(), "users.json", "json", USERS).await?;
        _ = service.create_folder(&home(), "docs").await?;
        _ = service.run_query(&at("users.json"), None).await?;
    }

    let service = CatalogService::open(dir.path(), config).await?;
    let file = service.get_file(&at("users.json")).await?;
    assert_eq!(file.job_count, 1);
    assert_eq!(file.format.owner.as_deref(), Some("admin"));
    let names: Vec<String> = service
        .get_root(&alice())
        .await?
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["docs", "users.json"]);
    Ok(())
}
