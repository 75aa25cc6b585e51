use calib_reader::{lexical_cast, tokenize_ws, ColumnsOrder, Error, LoadLog, MetaInfo};

#[test]
fn retrieves_latest_entry_at_or_before_line() {
    let mut meta = MetaInfo::new();
    meta.set("gain", "1.5", 10);
    meta.set("gain", "2.5", 20);

    assert_eq!(meta.raw_entry("gain", 15).unwrap(), ("1.5", 10));
    assert_eq!(meta.raw_entry("gain", 20).unwrap(), ("2.5", 20));
    assert_eq!(meta.raw_entry("gain", MetaInfo::ANY_LINE).unwrap(), ("2.5", 20));
}

#[test]
fn distinguishes_missing_key_from_later_definition() {
    let mut meta = MetaInfo::new();
    meta.set("gain", "1.5", 10);

    assert!(matches!(
        meta.raw_entry("offset", MetaInfo::ANY_LINE),
        Err(Error::NoMetadataEntry { .. })
    ));
    assert!(matches!(
        meta.raw_entry("gain", 5),
        Err(Error::NoCurrentMetadataEntry { .. })
    ));
}

#[test]
fn typed_get_is_stable_and_matches_raw_value() {
    let mut meta = MetaInfo::new();
    meta.set("gain", "1.5", 10);

    let first: f64 = meta.get("gain", MetaInfo::ANY_LINE).unwrap();
    let second: f64 = meta.get("gain", MetaInfo::ANY_LINE).unwrap();
    assert_eq!(first, 1.5);
    assert_eq!(first, second);

    // The typed value corresponds to the raw entry the same call resolves.
    let (raw, _) = meta.raw_entry("gain", MetaInfo::ANY_LINE).unwrap();
    assert_eq!(lexical_cast::<f64>(raw).unwrap(), first);
}

#[test]
fn typed_get_respects_line_restriction() {
    let mut meta = MetaInfo::new();
    meta.set("n", "1", 10);
    meta.set("n", "2", 20);

    assert_eq!(meta.get::<i32>("n", 10).unwrap(), 1);
    assert_eq!(meta.get::<i32>("n", 19).unwrap(), 1);
    assert_eq!(meta.get::<i32>("n", 20).unwrap(), 2);
}

#[test]
fn get_or_falls_back_only_when_absent() {
    let mut meta = MetaInfo::new();
    meta.set("n", "3", 10);

    assert_eq!(meta.get_or::<i32>("n", 7, MetaInfo::ANY_LINE).unwrap(), 3);
    assert_eq!(meta.get_or::<i32>("n", 7, 5).unwrap(), 7);
    assert_eq!(meta.get_or::<i32>("missing", 7, MetaInfo::ANY_LINE).unwrap(), 7);

    // A present but unlexable entry still fails.
    meta.set("bad", "xyz", 1);
    assert!(meta.get_or::<i32>("bad", 7, MetaInfo::ANY_LINE).is_err());
}

#[test]
fn aliases_resolve_to_canonical_names() {
    let mut meta = MetaInfo::new();
    assert!(meta.define_alias("rr", "runs"));
    meta.set("rr", "100-200", 1);

    assert!(meta.has("runs"));
    assert_eq!(meta.raw_entry("runs", MetaInfo::ANY_LINE).unwrap().0, "100-200");
    assert_eq!(meta.raw_entry("rr", MetaInfo::ANY_LINE).unwrap().0, "100-200");
}

#[test]
fn alias_definition_is_idempotent_but_rejects_rebinding() {
    let mut meta = MetaInfo::new();
    assert!(meta.define_alias("rr", "runs"));
    assert!(meta.define_alias("rr", "runs"));
    assert!(!meta.define_alias("rr", "period"));
}

#[test]
fn alias_targets_resolve_through_existing_aliases() {
    let mut meta = MetaInfo::new();
    assert!(meta.define_alias("b", "a"));
    assert!(meta.define_alias("c", "b"));
    meta.set("c", "v", 1);
    assert_eq!(meta.raw_entry("a", MetaInfo::ANY_LINE).unwrap().0, "v");
}

#[test]
fn drop_key_removes_every_definition() {
    let mut meta = MetaInfo::new();
    meta.set("x", "1", 1);
    meta.set("x", "2", 2);
    assert_eq!(meta.get::<i32>("x", MetaInfo::ANY_LINE).unwrap(), 2);

    meta.drop_key("x");
    assert!(!meta.has("x"));
    assert!(matches!(
        meta.raw_entry("x", MetaInfo::ANY_LINE),
        Err(Error::NoMetadataEntry { .. })
    ));
}

#[test]
fn clone_copies_entries_and_aliases() {
    let mut meta = MetaInfo::new();
    meta.define_alias("rr", "runs");
    meta.set("runs", "1-2", 3);
    // Warm the cache in the original; the clone lexes on its own.
    let _ = meta.get::<String>("runs", MetaInfo::ANY_LINE).unwrap();

    let copy = meta.clone();
    assert_eq!(copy.raw_entry("rr", MetaInfo::ANY_LINE).unwrap(), ("1-2", 3));
    assert_eq!(copy.get::<String>("runs", MetaInfo::ANY_LINE).unwrap(), "1-2");

    // Diverging the copy leaves the original untouched.
    let mut copy = copy;
    copy.set("runs", "5-6", 9);
    assert_eq!(meta.raw_entry("runs", MetaInfo::ANY_LINE).unwrap(), ("1-2", 3));
}

#[test]
fn json_dump_lists_entries_and_aliases() {
    let mut meta = MetaInfo::new();
    meta.define_alias("rr", "runs");
    meta.set("runs", "1-2", 3);

    let dump = meta.to_json();
    assert_eq!(dump["aliases"]["rr"], "runs");
    assert_eq!(dump["entries"]["runs"][0][0], 3);
    assert_eq!(dump["entries"]["runs"][0][1], "1-2");
}

#[test]
fn columns_order_parses_directive() {
    let columns = lexical_cast::<ColumnsOrder>("label, scale ,offset").unwrap();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns.index_of("label"), Some(0));
    assert_eq!(columns.index_of("scale"), Some(1));
    assert_eq!(columns.index_of("offset"), Some(2));
    assert_eq!(columns.index_of("other"), None);
}

#[test]
fn interprets_row_against_columns() {
    let columns = lexical_cast::<ColumnsOrder>("label,scale,offset").unwrap();
    let tokens = tokenize_ws("ch0  1.01  0.25");
    let row = columns.interpret(&tokens, None).unwrap();

    assert_eq!(row.raw("label").unwrap(), "ch0");
    assert_eq!(row.parse::<f64>("scale").unwrap(), 1.01);
    assert_eq!(row.parse::<f64>("offset").unwrap(), 0.25);
}

#[test]
fn extra_row_tokens_are_ignored() {
    let columns = lexical_cast::<ColumnsOrder>("label,scale").unwrap();
    let tokens = tokenize_ws("ch0 1.01 0.25 spurious");
    assert!(columns.interpret(&tokens, None).is_ok());
}

#[test]
fn short_row_cites_first_missing_column_and_count() {
    let columns = lexical_cast::<ColumnsOrder>("label,scale,offset").unwrap();
    let tokens = tokenize_ws("ch0 1.01");
    match columns.interpret(&tokens, None) {
        Err(Error::Parse { reason, .. }) => {
            assert!(reason.contains("columns number mismatch"), "{reason}");
            assert!(reason.contains("offset"), "{reason}");
            assert!(reason.contains("2 columns"), "{reason}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn absent_column_access_fails_and_defaults_apply() {
    let columns = lexical_cast::<ColumnsOrder>("label,scale").unwrap();
    let tokens = tokenize_ws("ch0 1.01");
    let row = columns.interpret(&tokens, None).unwrap();

    assert!(matches!(row.raw("offset"), Err(Error::MissingColumn { .. })));
    assert!(matches!(
        row.parse::<f64>("offset"),
        Err(Error::MissingColumn { .. })
    ));
    assert_eq!(row.parse_or::<f64>("offset", 0.5).unwrap(), 0.5);
    assert_eq!(row.parse_or::<f64>("scale", 0.5).unwrap(), 1.01);
}

#[test]
fn interpretation_feeds_the_load_journal() {
    let columns = lexical_cast::<ColumnsOrder>("label,scale").unwrap();
    let tokens = tokenize_ws("ch0 1.01");
    let mut journal = LoadLog::new();
    journal.set_source("doc.txt", 12);
    columns.interpret(&tokens, Some(&mut journal)).unwrap();

    assert_eq!(journal.len(), 2);
    let dump = journal.to_json();
    assert_eq!(dump[0]["srcID"], "doc.txt");
    assert_eq!(dump[0]["lineNo"], 12);
    assert_eq!(dump[0]["c"], "label");
    assert_eq!(dump[0]["v"], "ch0");
}
