//! Tests for repository domain types.

use rstest::rstest;
use serde::Deserialize;
use serde_json::{Value, json};

use super::fixtures::doc;
use crate::outcome::Failure;
use crate::repository::domain::{
    DocumentId, Filter, PageInfo, PaginatedResult, PaginationOptions, Projection, Sort,
    SortDirection, Update, decode_document,
};

#[rstest]
#[case(1, 10, 0, 0, false, false)]
#[case(1, 10, 10, 1, false, false)]
#[case(1, 10, 11, 2, true, false)]
#[case(2, 10, 15, 2, false, true)]
#[case(3, 10, 15, 2, false, true)]
#[case(2, 5, 15, 3, true, true)]
fn page_info_derives_from_count(
    #[case] page: u64,
    #[case] limit: u64,
    #[case] total: u64,
    #[case] pages: u64,
    #[case] next: bool,
    #[case] previous: bool,
) {
    let info = PageInfo::compute(page, limit, total);
    assert_eq!(info.total_pages, pages);
    assert_eq!(info.has_next_page, next);
    assert_eq!(info.has_prev_page, previous);
}

#[rstest]
fn page_info_serialises_in_camel_case() {
    let value = serde_json::to_value(PageInfo::compute(2, 10, 15)).expect("serialisable");
    assert_eq!(
        value,
        json!({
            "page": 2,
            "limit": 10,
            "totalCount": 15,
            "totalPages": 2,
            "hasNextPage": false,
            "hasPrevPage": true
        })
    );
}

#[rstest]
fn pagination_defaults() {
    let options = PaginationOptions::from_query(&json!({})).expect("defaults are valid");
    assert_eq!((options.page(), options.limit(), options.skip()), (1, 10, 0));
    assert_eq!(options.sort(), &Sort::descending("createdAt"));
    assert_eq!(PaginationOptions::from_query(&Value::Null), Ok(PaginationOptions::default()));
}

#[rstest]
fn pagination_reads_sort_order_and_select() {
    let options = PaginationOptions::from_query(&json!({
        "page": 3,
        "limit": "25",
        "sort": "lastName",
        "order": "asc",
        "select": "firstName lastName"
    }))
    .expect("query is valid");

    assert_eq!(options.skip(), 50);
    assert_eq!(options.sort(), &Sort::ascending("lastName"));
    assert_eq!(
        options.read().select,
        Some(Projection::Include(vec!["firstName".to_owned(), "lastName".to_owned()]))
    );
    let find = options.find_options();
    assert_eq!((find.skip, find.limit), (50, Some(25)));
}

#[rstest]
#[case(json!({"page": 0}), "page must be greater than or equal to 1")]
#[case(json!({"page": "-2"}), "page must be greater than or equal to 1")]
#[case(json!({"limit": 0}), "limit must be between 1 and 100")]
#[case(json!({"limit": "101"}), "limit must be between 1 and 100")]
#[case(json!({"limit": 2.5}), "limit must be an integer")]
#[case(json!({"page": true}), "page must be an integer")]
#[case(json!({"order": "up"}), "order must be one of: asc, desc")]
#[case(json!(["page"]), "query must be an object")]
fn pagination_rejects_bad_queries(#[case] query: Value, #[case] message: &str) {
    assert_eq!(
        PaginationOptions::from_query(&query),
        Err(Failure::validation(message))
    );
}

#[rstest]
#[case(0, 0, 1, 1)]
#[case(4, 500, 4, 100)]
#[case(2, 20, 2, 20)]
fn pagination_constructor_clamps(
    #[case] page: u64,
    #[case] limit: u64,
    #[case] expected_page: u64,
    #[case] expected_limit: u64,
) {
    let options = PaginationOptions::new(page, limit);
    assert_eq!((options.page(), options.limit()), (expected_page, expected_limit));
}

#[rstest]
#[case("asc", Some(SortDirection::Ascending))]
#[case("DESC", Some(SortDirection::Descending))]
#[case("-1", Some(SortDirection::Descending))]
#[case("sideways", None)]
fn sort_direction_parsing(#[case] text: &str, #[case] expected: Option<SortDirection>) {
    assert_eq!(SortDirection::parse(text), expected);
}

#[rstest]
#[case("name email", Projection::Include(vec!["name".to_owned(), "email".to_owned()]))]
#[case("name,email", Projection::Include(vec!["name".to_owned(), "email".to_owned()]))]
#[case(
    "-password -resetToken",
    Projection::Exclude(vec!["password".to_owned(), "resetToken".to_owned()])
)]
#[case("name -password", Projection::Exclude(vec!["name".to_owned(), "password".to_owned()]))]
fn projection_parsing(#[case] selection: &str, #[case] expected: Projection) {
    assert_eq!(Projection::parse(selection), expected);
}

#[rstest]
fn filter_merge_combines_non_empty_sides() {
    let role = Filter::eq("role", "profesor");
    let active = Filter::eq("active", true);

    assert_eq!(Filter::all().merge(role.clone()), role);
    assert_eq!(role.clone().merge(Filter::all()), role);
    assert_eq!(
        role.merge(active).into_value(),
        json!({"$and": [{"role": "profesor"}, {"active": true}]})
    );
}

#[rstest]
fn filter_any_of_builds_or_clause() {
    let filter = Filter::any_of([Filter::eq("a", 1), Filter::eq("b", 2)]);
    assert_eq!(filter.into_value(), json!({"$or": [{"a": 1}, {"b": 2}]}));
}

#[rstest]
fn filter_from_json() {
    assert_eq!(Filter::try_from(Value::Null), Ok(Filter::all()));
    assert_eq!(
        Filter::try_from(json!("role")),
        Err(Failure::validation("filter must be a JSON object"))
    );
}

#[rstest]
fn update_builder_groups_operators() {
    let update = Update::new()
        .set("name", "Nora")
        .set("level", 2)
        .inc("credits", 3)
        .unset("draft");
    assert_eq!(
        update.into_value(),
        json!({
            "$set": {"name": "Nora", "level": 2},
            "$inc": {"credits": 3},
            "$unset": {"draft": ""}
        })
    );
}

#[rstest]
fn document_id_is_read_from_documents() {
    let stored = doc(json!({"_id": "abc", "name": "x"}));
    assert_eq!(DocumentId::of(&stored), Some(DocumentId::new("abc")));
    assert_eq!(DocumentId::of(&doc(json!({"_id": 5}))), None);
    assert_ne!(DocumentId::generate(), DocumentId::generate());
}

#[derive(Debug, Deserialize, PartialEq)]
struct Teacher {
    #[serde(rename = "_id")]
    id: String,
    name: String,
}

#[rstest]
fn paginated_result_decodes_entities() {
    let result = PaginatedResult {
        documents: vec![doc(json!({"_id": "t1", "name": "Ada", "createdAt": "x"}))],
        pagination: PageInfo::compute(1, 10, 1),
    };
    assert_eq!(
        result.decode::<Teacher>(),
        Ok(vec![Teacher {
            id: "t1".to_owned(),
            name: "Ada".to_owned()
        }])
    );
    assert!(decode_document::<Teacher>(doc(json!({"_id": "t2"}))).is_err());
}
