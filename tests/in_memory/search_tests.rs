//! Search over [`BaseRepository`] backed by the in-memory store.

use std::sync::Arc;

use crate::in_memory::helpers::{NewUser, TestStore, User, UserRepository, store};
use conservatory::repository::domain::{Filter, PaginationOptions, SearchOptions};
use rstest::{fixture, rstest};

#[fixture]
async fn directory(store: Arc<TestStore>) -> UserRepository {
    let users = UserRepository::new(store);
    for (name, email, active) in [
        ("Ana Torres", "ana@conservatorio.example", true),
        ("Anabel Ruiz", "ruiz@conservatorio.example", false),
        ("Mario Ana", "mario@conservatorio.example", true),
        ("Lucía Paz", "lucia.paz@conservatorio.example", true),
        ("Pedro Gil", "pedro@example.org", true),
    ] {
        users
            .create(&NewUser {
                name: name.to_owned(),
                email: email.to_owned(),
                role: "estudiante".to_owned(),
                active,
            })
            .await
            .expect("seeding should succeed");
    }
    users
}

fn names(users: Vec<User>) -> Vec<String> {
    let mut listed: Vec<String> = users.into_iter().map(|user| user.name).collect();
    listed.sort();
    listed
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn field_search_is_case_insensitive_and_filtered(#[future] directory: UserRepository) {
    let users = directory.await;

    let page = users
        .search_active("ANA", PaginationOptions::default())
        .await
        .expect("search should succeed");

    assert_eq!(
        names(page.decode().expect("documents decode")),
        ["Ana Torres", "Mario Ana"]
    );
    assert_eq!(page.pagination.total_count, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn field_search_treats_term_literally(#[future] directory: UserRepository) {
    let users = directory.await;

    let dotted = users
        .search_active("lucia.paz", PaginationOptions::default())
        .await
        .expect("search should succeed");
    let wildcard = users
        .search_active("l.cia", PaginationOptions::default())
        .await
        .expect("search should succeed");

    assert_eq!(dotted.pagination.total_count, 1);
    assert_eq!(wildcard.pagination.total_count, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_term_lists_everything_matching_the_filter(#[future] directory: UserRepository) {
    let users = directory.await;

    let page = users
        .search_active("   ", PaginationOptions::new(1, 2))
        .await
        .expect("search should succeed");

    assert_eq!(page.documents.len(), 2);
    assert_eq!(page.pagination.total_count, 4);
    assert_eq!(page.pagination.total_pages, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn text_search_spans_all_string_fields(#[future] directory: UserRepository) {
    let users = directory.await;

    let page = users
        .base()
        .search("example.org", &SearchOptions::new())
        .await
        .expect("search should succeed");
    let inactive = users
        .base()
        .search(
            "anabel",
            &SearchOptions::new().with_filter(Filter::eq("active", false)),
        )
        .await
        .expect("search should succeed");

    assert_eq!(
        names(page.decode().expect("documents decode")),
        ["Pedro Gil"]
    );
    assert_eq!(inactive.pagination.total_count, 1);
}
