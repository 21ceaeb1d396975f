use super::*;
use tabula_core::columns::{builtin_columns_for, EntityKind};
use tabula_core::Fields;
use tabula_store::RecordStore;

fn asset(id: &str, name: &str, status: &str) -> Record {
    let mut f = Fields::default();
    f.insert("name".to_string(), FieldValue::Text(name.to_string()));
    f.insert("code".to_string(), FieldValue::Text(name[..3].to_uppercase()));
    f.insert("precision".to_string(), FieldValue::Number(8.0));
    f.insert("status".to_string(), FieldValue::Enum(status.to_string()));
    Record::new(id, f)
}

fn snap(records: Vec<Record>) -> TableSnapshot {
    TableSnapshot { epoch: 1, records }
}

fn asset_view() -> ViewState {
    ViewState::new(builtin_columns_for(EntityKind::Asset))
}

fn crypto_snapshot() -> TableSnapshot {
    snap(vec![
        asset("1", "Bitcoin", "Active"),
        asset("2", "Ethereum", "Inactive"),
        asset("3", "Litecoin", "Active"),
        asset("4", "Ripple", "Inactive"),
        asset("5", "Cardano", "Active"),
    ])
}

#[test]
fn filter_then_search_scenario() {
    // Literal scenario from the table contract: status filter narrows to the
    // active row, then a search that misses it empties the view.
    let s = snap(vec![asset("1", "Bitcoin", "Active"), asset("2", "Ethereum", "Inactive")]);
    let mut v = asset_view();

    v.set_column_filter("status", FieldValue::Enum("Active".into()));
    let dv = v.compute_view(&s);
    assert_eq!(dv.total_filtered, 1);
    assert_eq!(dv.rows[0].id, "1");

    v.set_search_text("eth");
    let dv = v.compute_view(&s);
    assert_eq!(dv.total_filtered, 0);
    assert!(dv.rows.is_empty());
    assert_eq!(dv.page_index, 0);
}

#[test]
fn filters_and_search_never_grow_the_row_set() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    let baseline = v.compute_view(&s).total_filtered;
    assert_eq!(baseline, s.records.len());

    v.set_column_filter("status", FieldValue::Enum("Active".into()));
    let filtered = v.compute_view(&s).total_filtered;
    assert!(filtered <= baseline);

    v.set_search_text("coin");
    let searched = v.compute_view(&s).total_filtered;
    assert!(searched <= filtered);
}

#[test]
fn column_filters_are_anded() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.set_column_filter("status", FieldValue::Enum("Active".into()));
    v.set_column_filter("name", FieldValue::Text("coin".into()));
    let dv = v.compute_view(&s);
    // Bitcoin + Litecoin match both; Cardano is Active but has no "coin".
    let names: Vec<_> = dv.rows.iter().map(|r| r.field("name").unwrap().display()).collect();
    assert_eq!(dv.total_filtered, 2);
    assert!(names.contains(&"Bitcoin".to_string()));
    assert!(names.contains(&"Litecoin".to_string()));
}

#[test]
fn text_filter_is_case_insensitive_substring() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.set_column_filter("name", FieldValue::Text("RIPP".into()));
    assert_eq!(v.compute_view(&s).total_filtered, 1);
}

#[test]
fn enum_filter_is_exact_not_substring() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.set_column_filter("status", FieldValue::Enum("Act".into()));
    assert_eq!(v.compute_view(&s).total_filtered, 0);
}

#[test]
fn search_matches_projected_display_fields() {
    let cols = builtin_columns_for(EntityKind::Symbol);
    let mut store = RecordStore::with_projector(tabula_schema::projector_for(EntityKind::Symbol));
    let mut f = Fields::default();
    f.insert("name".to_string(), FieldValue::Text("Bitcoin vs Dollar".into()));
    f.insert("base_asset".to_string(), FieldValue::Text("BTC".into()));
    f.insert("quote_asset".to_string(), FieldValue::Text("USD".into()));
    store.replace_all(vec![Record::new("1", f)]);
    let s = store.freeze();

    let mut v = ViewState::new(cols);
    // "btc/usd" only exists in the projected pair string
    v.set_search_text("btc/usd");
    assert_eq!(v.compute_view(&s).total_filtered, 1);
}

#[test]
fn sorting_a_projected_column_orders_by_its_display_value() {
    let mut store = RecordStore::with_projector(tabula_schema::projector_for(EntityKind::Symbol));
    let mut zzz = Fields::default();
    zzz.insert("name".to_string(), FieldValue::Text("Last".into()));
    zzz.insert("base_asset".to_string(), FieldValue::Text("ZZZ".into()));
    zzz.insert("quote_asset".to_string(), FieldValue::Text("USD".into()));
    let mut aaa = Fields::default();
    aaa.insert("name".to_string(), FieldValue::Text("First".into()));
    aaa.insert("base_asset".to_string(), FieldValue::Text("AAA".into()));
    aaa.insert("quote_asset".to_string(), FieldValue::Text("USD".into()));
    store.replace_all(vec![Record::new("1", zzz), Record::new("2", aaa)]);
    let s = store.freeze();

    let mut v = ViewState::new(builtin_columns_for(EntityKind::Symbol));
    v.toggle_sort("pair");
    let pairs: Vec<_> = v
        .compute_view(&s)
        .rows
        .iter()
        .map(|r| r.projected_value("pair").unwrap().to_string())
        .collect();
    assert_eq!(pairs, vec!["AAA/USD", "ZZZ/USD"]);

    v.toggle_sort("pair");
    let pairs: Vec<_> = v
        .compute_view(&s)
        .rows
        .iter()
        .map(|r| r.projected_value("pair").unwrap().to_string())
        .collect();
    assert_eq!(pairs, vec!["ZZZ/USD", "AAA/USD"]);
}

#[test]
fn stale_filter_and_sort_keys_are_ignored() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.set_column_filter("removed_column", FieldValue::Text("x".into()));
    v.toggle_sort("removed_column");
    let dv = v.compute_view(&s);
    assert_eq!(dv.total_filtered, s.records.len());
    assert!(v.sort_keys().is_empty());
}

#[test]
fn actions_column_rejects_filter_and_sort() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.set_column_filter("actions", FieldValue::Text("x".into()));
    v.toggle_sort("actions");
    assert_eq!(v.active_filters(), 0);
    assert!(v.sort_keys().is_empty());
    assert_eq!(v.compute_view(&s).total_filtered, s.records.len());
}

#[test]
fn toggle_sort_cycles_asc_desc_none() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    let unsorted: Vec<_> = v.compute_view(&s).rows.iter().map(|r| r.id.clone()).collect();

    v.toggle_sort("name");
    assert_eq!(
        v.sort_keys(),
        &[SortKey { column: "name".into(), direction: SortDirection::Asc }]
    );
    let asc: Vec<_> = v
        .compute_view(&s)
        .rows
        .iter()
        .map(|r| r.field("name").unwrap().display())
        .collect();
    let mut expect = asc.clone();
    expect.sort();
    assert_eq!(asc, expect);

    v.toggle_sort("name");
    assert_eq!(v.sort_keys()[0].direction, SortDirection::Desc);
    let desc: Vec<_> = v
        .compute_view(&s)
        .rows
        .iter()
        .map(|r| r.field("name").unwrap().display())
        .collect();
    let mut expect = desc.clone();
    expect.sort();
    expect.reverse();
    assert_eq!(desc, expect);

    v.toggle_sort("name");
    assert!(v.sort_keys().is_empty());
    // with the sort cleared the view matches the unsorted filtered order
    let cleared: Vec<_> = v.compute_view(&s).rows.iter().map(|r| r.id.clone()).collect();
    assert_eq!(cleared, unsorted);
}

#[test]
fn toggling_a_new_column_replaces_the_primary_key() {
    let mut v = asset_view();
    v.toggle_sort("name");
    v.toggle_sort("precision");
    assert_eq!(
        v.sort_keys(),
        &[SortKey { column: "precision".into(), direction: SortDirection::Asc }]
    );
}

#[test]
fn multi_key_sort_applies_keys_in_sequence() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.set_sort(vec![
        SortKey { column: "status".into(), direction: SortDirection::Asc },
        SortKey { column: "name".into(), direction: SortDirection::Desc },
    ]);
    let rows = v.compute_view(&s).rows;
    let pairs: Vec<(String, String)> = rows
        .iter()
        .map(|r| (r.field("status").unwrap().display(), r.field("name").unwrap().display()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Active".to_string(), "Litecoin".to_string()),
            ("Active".to_string(), "Cardano".to_string()),
            ("Active".to_string(), "Bitcoin".to_string()),
            ("Inactive".to_string(), "Ripple".to_string()),
            ("Inactive".to_string(), "Ethereum".to_string()),
        ]
    );
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let s = snap(vec![
        asset("1", "Alpha", "Active"),
        asset("2", "Alpha", "Active"),
        asset("3", "Alpha", "Active"),
    ]);
    let mut v = asset_view();
    v.toggle_sort("name");
    let ids: Vec<_> = v.compute_view(&s).rows.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn pagination_windows_cover_the_sequence_exactly() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.toggle_sort("name");
    v.set_page_size(2);

    // widen to one page to capture the whole ordered sequence
    v.set_page_size(100);
    let full: Vec<_> = v.compute_view(&s).rows.iter().map(|r| r.id.clone()).collect();
    v.set_page_size(2);

    let mut seen: Vec<String> = Vec::new();
    let first = v.compute_view(&s);
    assert_eq!(first.page_count, 3);
    for i in 0..first.page_count {
        v.set_page(i);
        let dv = v.compute_view(&s);
        assert!(dv.rows.len() <= 2);
        seen.extend(dv.rows.iter().map(|r| r.id.clone()));
    }
    assert_eq!(seen, full);
}

#[test]
fn page_index_clamps_when_the_filtered_set_shrinks() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.set_page_size(2);
    v.compute_view(&s);
    v.set_page(2); // last page of 5 rows at size 2
    assert_eq!(v.compute_view(&s).page_index, 2);

    v.set_column_filter("status", FieldValue::Enum("Active".into()));
    // filter reset the index; force it out of range to prove the clamp
    v.set_page(usize::MAX);
    let dv = v.compute_view(&s);
    assert_eq!(dv.total_filtered, 3);
    assert_eq!(dv.page_count, 2);
    assert_eq!(dv.page_index, 1);
    assert!(!dv.rows.is_empty());
}

#[test]
fn set_page_clamps_against_the_last_computed_page_count() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.set_page_size(2);
    v.compute_view(&s);
    v.set_page(99);
    assert_eq!(v.page().index, 2);
}

#[test]
fn page_size_zero_is_rejected() {
    let mut v = asset_view();
    v.set_page_size(0);
    assert_eq!(v.page().size, DEFAULT_PAGE_SIZE);
    v.set_page_size(25);
    assert_eq!(v.page().size, 25);
    assert_eq!(v.page().index, 0);
}

#[test]
fn search_resets_page_but_sort_does_not() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.set_page_size(2);
    v.compute_view(&s);
    v.set_page(1);
    v.toggle_sort("name");
    assert_eq!(v.page().index, 1);
    v.set_search_text("coin");
    assert_eq!(v.page().index, 0);
}

#[test]
fn visibility_defaults_to_visible_and_sets_idempotently() {
    let mut v = asset_view();
    assert!(v.visibility().is_visible("code"));
    v.visibility_mut().set_visible("code", true);
    v.visibility_mut().set_visible("code", true);
    assert!(v.visibility().is_visible("code"));
    v.visibility_mut().set_visible("code", false);
    assert!(!v.visibility().is_visible("code"));
}

#[test]
fn visible_columns_keep_schema_order_and_drop_hidden() {
    let mut v = asset_view();
    v.visibility_mut().set_visible("code", false);
    let ids: Vec<_> = v.visible_columns().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["id", "name", "precision", "status", "actions"]);
}

#[test]
fn actions_column_is_never_toggleable() {
    let v = asset_view();
    let toggleable = v.visibility().toggleable_columns(v.columns());
    assert!(!toggleable.contains(&"actions"));
    assert!(toggleable.contains(&"name"));
}

#[test]
fn selection_drops_ids_missing_from_the_snapshot() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.select("1");
    v.select("404");
    v.retain_existing(&s);
    assert!(v.is_selected("1"));
    assert!(!v.is_selected("404"));
}

#[test]
fn debug_counts_track_each_stage() {
    let s = crypto_snapshot();
    let mut v = asset_view();
    v.set_column_filter("status", FieldValue::Enum("Active".into()));
    v.set_search_text("coin");
    let dv = v.compute_view(&s);
    assert_eq!(dv.debug.total, 5);
    assert_eq!(dv.debug.after_filters, 3);
    assert_eq!(dv.debug.after_search, 2);
}
