use folio_core::{
    Article, ArticleDraft, ArticleRepository, FileArticleRepository, PageRequest, RepoError,
};
use std::collections::HashSet;
use std::path::Path;

fn draft(title: &str) -> ArticleDraft {
    ArticleDraft::new(title, format!("{title} body"), "2025-05-14", "cover.jpg")
}

fn seeded(dir: &Path, ids: &[i64]) -> FileArticleRepository {
    let articles: Vec<Article> = ids
        .iter()
        .map(|id| Article::from_draft(*id, draft(&format!("article {id}"))))
        .collect();
    std::fs::write(
        dir.join("articles.json"),
        serde_json::to_vec(&articles).unwrap(),
    )
    .unwrap();
    FileArticleRepository::open(dir.join("articles.json")).unwrap()
}

fn ids(articles: &[Article]) -> Vec<i64> {
    articles.iter().map(|article| article.id).collect()
}

#[test]
fn open_creates_empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileArticleRepository::open(dir.path().join("articles.json")).unwrap();

    assert!(repo.list_articles().unwrap().is_empty());
    assert!(dir.path().join("articles.json").is_file());
}

#[test]
fn insert_assigns_max_plus_one_not_count() {
    let dir = tempfile::tempdir().unwrap();
    let repo = seeded(dir.path(), &[1, 2, 5]);

    let created = repo.insert_article(draft("new")).unwrap();
    assert_eq!(created.id, 6);
    assert_eq!(ids(&repo.list_articles().unwrap()), vec![1, 2, 5, 6]);
}

#[test]
fn ids_are_not_reused_after_deleting_the_last_article() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileArticleRepository::open(dir.path().join("articles.json")).unwrap();

    repo.insert_article(draft("a")).unwrap();
    let second = repo.insert_article(draft("b")).unwrap();
    repo.delete_article(1).unwrap();
    let third = repo.insert_article(draft("c")).unwrap();

    assert_eq!(second.id, 2);
    assert_eq!(third.id, 3);
}

#[test]
fn update_keeps_id_even_when_payload_has_one() {
    let dir = tempfile::tempdir().unwrap();
    let repo = seeded(dir.path(), &[1, 2, 3]);

    let payload = ArticleDraft::from_json(
        br#"{"id": 42, "title": "Updated", "content": "New Content", "date": "2025-06-01", "image": "updated.jpg"}"#,
    )
    .unwrap();
    let updated = repo.update_article(3, payload).unwrap();

    assert_eq!(updated.id, 3);
    assert_eq!(updated.title, "Updated");
    let stored = repo.get_article(3).unwrap().unwrap();
    assert_eq!(stored, updated);
    assert!(repo.get_article(42).unwrap().is_none());
}

#[test]
fn update_missing_id_is_not_found_and_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let repo = seeded(dir.path(), &[1]);
    let before = std::fs::read(dir.path().join("articles.json")).unwrap();

    let err = repo.update_article(9, draft("x")).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(9)));
    assert_eq!(std::fs::read(dir.path().join("articles.json")).unwrap(), before);
}

#[test]
fn delete_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let repo = seeded(dir.path(), &[1, 2, 3]);

    repo.delete_article(2).unwrap();
    assert_eq!(ids(&repo.list_articles().unwrap()), vec![1, 3]);

    let err = repo.delete_article(2).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(2)));
}

#[test]
fn second_page_of_seven_has_two_items() {
    let dir = tempfile::tempdir().unwrap();
    let repo = seeded(dir.path(), &[1, 2, 3, 4, 5, 6, 7]);

    let page = repo.paginate_articles(PageRequest::new(2, 5)).unwrap();
    assert_eq!(ids(&page), vec![6, 7]);

    let beyond = repo.paginate_articles(PageRequest::new(3, 5)).unwrap();
    assert!(beyond.is_empty());

    let defaults = repo.paginate_articles(PageRequest::new(0, 0)).unwrap();
    assert_eq!(ids(&defaults), vec![1, 2, 3, 4, 5]);
}

#[test]
fn save_of_load_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let repo = seeded(dir.path(), &[4, 1, 9]);
    let path = dir.path().join("articles.json");

    let loaded = repo.load_snapshot().unwrap();
    repo.save_snapshot(&loaded).unwrap();
    let first = std::fs::read(&path).unwrap();

    repo.save_snapshot(&repo.load_snapshot().unwrap()).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), first);
    assert_eq!(repo.load_snapshot().unwrap(), loaded);
}

#[test]
fn corrupted_snapshot_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let repo = seeded(dir.path(), &[1]);
    std::fs::write(dir.path().join("articles.json"), b"{not json").unwrap();

    assert!(matches!(repo.list_articles(), Err(RepoError::Storage(_))));
    assert!(matches!(
        repo.insert_article(draft("x")),
        Err(RepoError::Storage(_))
    ));
}

#[test]
fn removed_snapshot_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let repo = seeded(dir.path(), &[1]);
    std::fs::remove_file(dir.path().join("articles.json")).unwrap();

    assert!(matches!(repo.get_article(1), Err(RepoError::Storage(_))));
}

#[test]
fn duplicate_ids_on_disk_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("articles.json"),
        br#"[{"id":1,"title":"a","content":"","date":"","image":""},{"id":1,"title":"b","content":"","date":"","image":""}]"#,
    )
    .unwrap();

    let err = FileArticleRepository::open(dir.path().join("articles.json"))
        .err()
        .expect("duplicate ids must be rejected");
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn two_concurrent_inserts_both_land() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileArticleRepository::open(dir.path().join("articles.json")).unwrap();

    std::thread::scope(|scope| {
        let first = scope.spawn(|| repo.insert_article(draft("left")).unwrap());
        let second = scope.spawn(|| repo.insert_article(draft("right")).unwrap());
        first.join().unwrap();
        second.join().unwrap();
    });

    let stored = repo.list_articles().unwrap();
    let unique: HashSet<i64> = ids(&stored).into_iter().collect();
    assert_eq!(stored.len(), 2);
    assert_eq!(unique.len(), 2);
}

#[test]
fn concurrent_mixed_mutations_lose_no_updates() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileArticleRepository::open(dir.path().join("articles.json")).unwrap();
    let threads = 8;
    let per_thread = 10;

    std::thread::scope(|scope| {
        for worker in 0..threads {
            let repo = &repo;
            scope.spawn(move || {
                for index in 0..per_thread {
                    let created = repo
                        .insert_article(draft(&format!("w{worker}-{index}")))
                        .unwrap();
                    repo.update_article(created.id, draft(&format!("w{worker}-{index}-edited")))
                        .unwrap();
                    let _ = repo.list_articles().unwrap();
                }
            });
        }
    });

    let stored = repo.list_articles().unwrap();
    assert_eq!(stored.len(), threads * per_thread);
    let unique: HashSet<i64> = ids(&stored).into_iter().collect();
    assert_eq!(unique.len(), stored.len());
    assert!(stored.iter().all(|article| article.title.ends_with("-edited")));
}

#[test]
fn repositories_opened_on_one_file_share_the_writer_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    let first = FileArticleRepository::open(&path).unwrap();
    let second = FileArticleRepository::open(dir.path().join(".").join("articles.json")).unwrap();

    std::thread::scope(|scope| {
        for (worker, repo) in [&first, &second, &first, &second].into_iter().enumerate() {
            scope.spawn(move || {
                for index in 0..10 {
                    repo.insert_article(draft(&format!("r{worker}-{index}")))
                        .unwrap();
                }
            });
        }
    });

    let stored = first.list_articles().unwrap();
    let unique: HashSet<i64> = ids(&stored).into_iter().collect();
    assert_eq!(stored.len(), 40);
    assert_eq!(unique.len(), 40);
}
