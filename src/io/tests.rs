#[cfg(test)]
mod io_tests {
    use super::super::{Cache, ExportError, ImportError, csv, json};
    use crate::table::RowSet;

    const SAMPLE: &str = "name,age\na,3\nb,10\n";

    #[test]
    fn import_reads_headers_and_records() {
        let rowset = csv::import(SAMPLE).unwrap();
        assert_eq!(rowset.columns(), &["name".to_string(), "age".to_string()]);
        assert_eq!(rowset.len(), 2);
        assert_eq!(rowset.cell(1, "age"), "10");
    }

    #[test]
    fn import_skips_empty_lines() {
        let rowset = csv::import("name,age\n\na,3\n\nb,10\n").unwrap();
        assert_eq!(rowset.len(), 2);
    }

    #[test]
    fn import_rejects_ragged_rows() {
        let err = csv::import("name,age\na,3,extra\n").unwrap_err();
        assert!(matches!(err, ImportError::Malformed { .. }));
    }

    #[test]
    fn csv_round_trip_preserves_records_and_column_order() {
        let rowset = csv::import(SAMPLE).unwrap();
        let exported = csv::export(&rowset).unwrap();
        let reimported = csv::import(&exported).unwrap();
        assert_eq!(reimported, rowset);
    }

    #[test]
    fn export_rejects_empty_store() {
        let rowset = RowSet::new();
        assert!(matches!(
            csv::export(&rowset).unwrap_err(),
            ExportError::EmptyData
        ));
        assert!(matches!(
            json::export(&rowset).unwrap_err(),
            ExportError::EmptyData
        ));
    }

    #[test]
    fn json_export_uses_column_order_and_two_space_indent() {
        let rowset = csv::import(SAMPLE).unwrap();
        let exported = json::export(&rowset).unwrap();
        assert!(exported.starts_with("[\n  {\n    \"name\": \"a\""));
        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn records_from_value_coerces_scalars() {
        let value = serde_json::json!([{"x": 1, "y": null, "z": true, "s": "ok"}]);
        let (records, columns) = json::records_from_value(&value).unwrap();
        assert_eq!(
            columns,
            vec![
                "x".to_string(),
                "y".to_string(),
                "z".to_string(),
                "s".to_string()
            ]
        );
        assert_eq!(records[0]["x"], "1");
        assert_eq!(records[0]["y"], "");
        assert_eq!(records[0]["z"], "true");
        assert_eq!(records[0]["s"], "ok");
    }

    #[test]
    fn records_from_value_rejects_non_arrays() {
        assert!(json::records_from_value(&serde_json::json!({"not": "array"})).is_none());
        assert!(json::records_from_value(&serde_json::json!(["scalar"])).is_none());
    }

    #[test]
    fn cache_round_trips_through_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::at(dir.path().join("slot.json"));
        let rowset = csv::import(SAMPLE).unwrap();

        assert!(cache.load().is_none());
        cache.save(&rowset).unwrap();
        let restored = cache.load().unwrap();
        assert_eq!(restored, rowset);

        cache.clear().unwrap();
        assert!(cache.load().is_none());
        // Clearing an already-empty slot is fine.
        cache.clear().unwrap();
    }
}
