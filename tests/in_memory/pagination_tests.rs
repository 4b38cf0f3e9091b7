//! Pagination over [`BaseRepository`] backed by the in-memory store.

use std::sync::Arc;

use crate::in_memory::helpers::{TestStore, User, UserRepository, seed_users, store};
use conservatory::repository::domain::{Filter, PaginationOptions, Projection, Sort};
use eyre::{WrapErr, ensure};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_page_holds_the_remainder(store: Arc<TestStore>) -> eyre::Result<()> {
    let users = UserRepository::new(store);
    seed_users(&users, "estudiante", 15)
        .await
        .wrap_err("seeding should succeed")?;

    let page = users
        .list_by_role("estudiante", &PaginationOptions::new(2, 10))
        .await?;

    ensure!(page.documents.len() == 5, "got {} documents", page.documents.len());
    ensure!(page.pagination.page == 2);
    ensure!(page.pagination.total_count == 15);
    ensure!(page.pagination.total_pages == 2);
    ensure!(!page.pagination.has_next_page);
    ensure!(page.pagination.has_prev_page);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn default_order_is_newest_first(store: Arc<TestStore>) {
    let users = UserRepository::new(store);
    seed_users(&users, "profesor", 3)
        .await
        .expect("seeding should succeed");

    let page = users
        .list_by_role("profesor", &PaginationOptions::default())
        .await
        .expect("listing should succeed");
    let names: Vec<String> = page
        .decode::<User>()
        .expect("documents decode")
        .into_iter()
        .map(|user| user.name)
        .collect();

    assert_eq!(names, ["User 03", "User 02", "User 01"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn query_parameters_drive_sort_and_selection(store: Arc<TestStore>) {
    let users = UserRepository::new(store);
    seed_users(&users, "profesor", 4)
        .await
        .expect("seeding should succeed");
    let options = PaginationOptions::from_query(&json!({
        "page": "1",
        "limit": "2",
        "sort": "name",
        "order": "asc",
        "select": "name"
    }))
    .expect("query is valid");

    let page = users
        .base()
        .paginate(&Filter::all(), &options)
        .await
        .expect("listing should succeed");

    let first = page.documents.first().expect("page has documents");
    assert_eq!(first.get("name"), Some(&json!("User 01")));
    assert!(first.get("email").is_none());
    assert!(first.contains_key("_id"));
    assert_eq!(page.pagination.total_pages, 2);
    assert!(page.pagination.has_next_page);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn page_beyond_the_end_is_empty(store: Arc<TestStore>) {
    let users = UserRepository::new(store);
    seed_users(&users, "admin", 3)
        .await
        .expect("seeding should succeed");

    let page = users
        .base()
        .paginate(
            &Filter::all(),
            &PaginationOptions::new(5, 10).with_sort(Sort::ascending("name")),
        )
        .await
        .expect("listing should succeed");

    assert!(page.documents.is_empty());
    assert_eq!(page.pagination.total_pages, 1);
    assert!(!page.pagination.has_next_page);
    assert!(page.pagination.has_prev_page);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_collection_has_no_pages(store: Arc<TestStore>) {
    let users = UserRepository::new(store);

    let page = users
        .base()
        .paginate(
            &Filter::all(),
            &PaginationOptions::default().with_select(Projection::parse("-email")),
        )
        .await
        .expect("listing should succeed");

    assert_eq!(
        page.to_value().expect("serialisable").get("pagination"),
        Some(&json!({
            "page": 1,
            "limit": 10,
            "totalCount": 0,
            "totalPages": 0,
            "hasNextPage": false,
            "hasPrevPage": false
        }))
    );
}
