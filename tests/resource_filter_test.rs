use studyvault_rs::models::ResourceType;
use studyvault_rs::repositories::resource_repository::{
    build_list_query, FolderScope, ResourceFilter, SortOption,
};
use uuid::Uuid;

fn filter() -> ResourceFilter {
    ResourceFilter::for_viewer(Uuid::new_v4())
}

#[test]
fn test_defaults_produce_newest_first_unfiltered_listing() {
    let mut query = build_list_query(&filter());
    let sql = query.sql();

    assert!(sql.starts_with("SELECT"));
    assert!(sql.contains("LEFT JOIN courses"));
    assert!(sql.contains("LEFT JOIN folders"));
    assert!(sql.ends_with("ORDER BY r.created_at DESC"));
    assert!(!sql.contains("resource_type ="));
    assert!(!sql.contains("ILIKE"));
}

#[test]
fn test_every_sort_option_maps_to_one_order_clause() {
    let cases = [
        (SortOption::Newest, "ORDER BY r.created_at DESC"),
        (SortOption::Oldest, "ORDER BY r.created_at ASC"),
        (SortOption::Name, "ORDER BY r.title ASC"),
        (SortOption::Size, "ORDER BY r.size DESC"),
    ];

    for (sort, clause) in cases {
        let mut f = filter();
        f.sort = sort;
        let mut query = build_list_query(&f);
        let sql = query.sql();
        assert!(sql.ends_with(clause), "{:?} produced: {}", sort, sql);
        assert_eq!(sql.matches("ORDER BY").count(), 1);
    }
}

#[test]
fn test_combined_filters_compose() {
    let mut f = filter();
    f.search = Some("linear algebra".to_string());
    f.resource_type = Some(ResourceType::Pdf);
    f.course_id = Some(Uuid::new_v4());
    f.folder = FolderScope::In(Uuid::new_v4());
    f.sort = SortOption::Size;

    let mut query = build_list_query(&f);
    let sql = query.sql();
    assert!(sql.contains("r.title ILIKE"));
    assert!(sql.contains("r.description ILIKE"));
    assert!(sql.contains("r.resource_type ="));
    assert!(sql.contains("r.course_id ="));
    assert!(sql.contains("r.folder_id ="));
    assert!(sql.ends_with("ORDER BY r.size DESC"));
}

#[test]
fn test_sort_options_deserialize_from_query_values() {
    for (raw, expected) in [
        ("newest", SortOption::Newest),
        ("oldest", SortOption::Oldest),
        ("name", SortOption::Name),
        ("size", SortOption::Size),
    ] {
        let parsed: SortOption = serde_json::from_value(serde_json::json!(raw)).unwrap();
        assert_eq!(parsed, expected);
    }
}
