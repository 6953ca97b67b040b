//! Library-level tests for the resolve -> flatten -> clean -> layout pipeline.

use std::collections::BTreeSet;
use std::path::PathBuf;

use formgen::layout::Widget;
use formgen::{
    clean, flatten, Coordinator, FormCatalog, GenerateError, JsonParser, ParseError, SchemaNode,
    SchemaRegistry, CIRCULAR_REFERENCE,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas")
}

fn registry(values: &[Value]) -> SchemaRegistry {
    SchemaRegistry::from_values(values).unwrap()
}

fn keys_anywhere(v: &Value, out: &mut BTreeSet<String>) {
    match v {
        Value::Object(map) => {
            for (k, child) in map {
                out.insert(k.clone());
                keys_anywhere(child, out);
            }
        }
        Value::Array(items) => items.iter().for_each(|i| keys_anywhere(i, out)),
        _ => {}
    }
}

fn widget_names(canvas: &formgen::Canvas) -> Vec<String> {
    canvas.widgets().map(|(_, w)| w.name().to_string()).collect()
}

mod resolve {
    use super::*;

    #[test]
    fn local_ref_with_nothing_excluded() {
        let reg = registry(&[json!({
            "$id": "root",
            "properties": {
                "x": { "$ref": "#/properties/y" },
                "y": { "type": "string" }
            }
        })]);

        // $id is the only extra key left when nothing is excluded
        let tree = JsonParser::new(&reg)
            .excluded_keys(["$id".to_string()].into())
            .parse("root")
            .unwrap();
        assert_eq!(
            tree.to_value(),
            json!({ "x": { "type": "string" }, "y": { "type": "string" } })
        );

        let raw = JsonParser::new(&reg)
            .excluded_keys(BTreeSet::new())
            .parse("root")
            .unwrap();
        assert_eq!(raw.to_value()["x"], json!({ "type": "string" }));
    }

    #[test]
    fn nested_local_pointer_returns_subschema_exactly() {
        let bar = json!({ "type": "integer", "minimum": 1, "description": "count" });
        let reg = registry(&[json!({
            "$id": "S",
            "properties": {
                "foo": { "properties": { "bar": bar.clone() } },
                "copy": { "$ref": "#/properties/foo/properties/bar" }
            }
        })]);

        assert_eq!(reg.resolve("#/properties/foo/properties/bar", "S").to_value(), bar);

        let tree = JsonParser::new(&reg).resolve("S").unwrap();
        assert_eq!(tree.to_value()["properties"]["copy"], bar);
    }

    #[test]
    fn local_pointer_declared_in_another_document() {
        let reg = registry(&[
            json!({
                "$id": "owner",
                "properties": {
                    "code": { "type": "string", "maxLength": 4 },
                    "alias": { "$ref": "#/properties/code" }
                }
            }),
            json!({
                "$id": "user",
                "properties": { "inner": { "$ref": "owner" } }
            }),
        ]);

        let tree = JsonParser::new(&reg).parse("user").unwrap();
        assert_eq!(
            tree.to_value()["inner"]["alias"],
            json!({ "type": "string", "maxLength": 4 })
        );
    }

    #[test]
    fn mutual_cycle_terminates_with_marker() {
        let reg = registry(&[
            json!({ "$id": "A", "properties": { "b": { "$ref": "B" } } }),
            json!({ "$id": "B", "properties": { "a": { "$ref": "A" } } }),
        ]);

        let tree = JsonParser::new(&reg).resolve("A").unwrap();
        let mut reasons = Vec::new();
        tree.for_each_marker(&mut |m| reasons.push(m.error.clone().unwrap_or_default()));
        assert_eq!(reasons, [CIRCULAR_REFERENCE]);
        assert_eq!(
            tree.to_value()["properties"]["b"]["properties"]["a"],
            json!({ "$ref": "A", "error": CIRCULAR_REFERENCE })
        );
    }

    #[test]
    fn malformed_and_missing_refs_do_not_abort() {
        let reg = registry(&[json!({
            "$id": "form",
            "properties": {
                "bad": { "$ref": "a#b#c" },
                "gone": { "$ref": "elsewhere" },
                "ok": { "type": "string" }
            }
        })]);

        let tree = JsonParser::new(&reg).parse("form").unwrap();
        let value = tree.to_value();
        assert_eq!(value["ok"], json!({ "type": "string" }));
        assert_eq!(value["bad"]["$ref"], "a#b#c");
        assert!(value["bad"]["error"].is_string());
        assert_eq!(value["gone"]["error"], "unknown schema id: elsewhere");
    }

    #[test]
    fn missing_pointer_segment_is_tolerant_by_default() {
        let doc = json!({
            "$id": "t",
            "properties": { "x": { "$ref": "#/properties/nope" } }
        });

        let tolerant = registry(&[doc.clone()]);
        let tree = JsonParser::new(&tolerant).parse("t").unwrap();
        assert_eq!(tree.to_value(), json!({ "x": {} }));

        let strict = registry(&[doc]).tolerant_pointers(false);
        let tree = JsonParser::new(&strict).parse("t").unwrap();
        assert!(tree.to_value()["x"]["error"].is_string());
    }

    #[test]
    fn unknown_form_is_an_error() {
        let reg = registry(&[json!({ "$id": "a" })]);
        let result = JsonParser::new(&reg).parse("b");
        assert!(matches!(result, Err(ParseError::UnknownSchema { id }) if id == "b"));
    }
}

mod flatten_and_clean {
    use super::*;

    fn sample() -> SchemaNode {
        SchemaNode::from_value(&json!({
            "$schema": "x",
            "required": ["a"],
            "properties": {
                "a": {
                    "type": "object",
                    "required": ["b"],
                    "properties": { "b": { "type": "string", "$id": "inner" } }
                },
                "c": {
                    "allOf": [
                        { "required": ["x"] },
                        { "type": "string" }
                    ]
                }
            }
        }))
    }

    #[test]
    fn flatten_is_idempotent() {
        let once = flatten(&sample());
        assert_eq!(flatten(&once), once);
    }

    #[test]
    fn no_properties_key_after_flatten() {
        let mut keys = BTreeSet::new();
        keys_anywhere(&flatten(&sample()).to_value(), &mut keys);
        assert!(!keys.contains("properties"));
        assert!(keys.contains("b"));
    }

    #[test]
    fn clean_removes_every_excluded_key() {
        let excluded: BTreeSet<String> =
            ["$schema", "$id", "required"].iter().map(|s| s.to_string()).collect();
        let cleaned = clean(&flatten(&sample()), &excluded).to_value();

        let mut keys = BTreeSet::new();
        keys_anywhere(&cleaned, &mut keys);
        assert!(keys.is_disjoint(&excluded));

        // the allOf element made only of excluded keys is dropped
        assert_eq!(cleaned["c"]["allOf"], json!([{ "type": "string" }]));
    }
}

mod generate {
    use super::*;

    fn coordinator() -> Coordinator {
        let reg = SchemaRegistry::load_dir(&fixtures()).unwrap();
        Coordinator::new(reg, FormCatalog::builtin())
    }

    #[test]
    fn same_form_twice_never_overwrites() {
        let out = TempDir::new().unwrap();
        let c = coordinator();

        let first = c.generate("business-name-change", out.path()).unwrap();
        let second = c.generate("business-name-change", out.path()).unwrap();

        assert_eq!(first, out.path().join("business-name-change.pdf"));
        assert_eq!(second, out.path().join("business-name-change_1.pdf"));
        assert!(std::fs::read(&first).unwrap().starts_with(b"%PDF"));
        assert!(std::fs::read(&second).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn unknown_form_writes_nothing() {
        let out = TempDir::new().unwrap();
        let result = coordinator().generate("no-such-form", out.path());

        assert!(matches!(result, Err(GenerateError::SchemaUnavailable { .. })));
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn business_name_change_layout() {
        let canvas = coordinator().render("business-name-change").unwrap();
        let names = widget_names(&canvas);

        for expected in [
            "business_registration_number",
            "business_legal_name",
            "business_office_street",
            "new_name",
            "effective_date",
            "contact_phone",
            "certification_date",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected} in {names:?}");
        }

        // ten provinces -> dropdown with a blank first option
        let province = canvas
            .widgets()
            .find(|(_, w)| w.name() == "business_office_province")
            .map(|(_, w)| w.clone());
        match province {
            Some(Widget::ComboBox { options, .. }) => {
                assert_eq!(options.len(), 11);
                assert_eq!(options[0], "");
            }
            other => panic!("expected combo box, got {other:?}"),
        }

        // two choices -> radio group
        assert!(canvas.widgets().any(|(_, w)| matches!(
            w,
            Widget::RadioGroup { name, options } if name == "contact_preferred" && options.len() == 2
        )));

        let first_page = canvas.page_text(0);
        assert!(first_page.iter().any(|t| t == "Filing fee: $30.00"));
    }

    #[test]
    fn instructions_follow_the_body() {
        let canvas = coordinator().render("business-name-change").unwrap();
        let last = canvas.page_count() - 1;
        let appendix = canvas.page_text(last);

        assert!(appendix.iter().any(|t| t == "Registration Number"));
        assert!(appendix.iter().any(|t| t.contains("BN-0012345")));
        let body_pages: Vec<usize> = canvas.widgets().map(|(page, _)| page).collect();
        assert!(body_pages.iter().all(|&p| p < last));
    }

    #[test]
    fn partnership_partners_are_repeated() {
        let canvas = coordinator().render("partnership-registration").unwrap();
        let names = widget_names(&canvas);

        for i in 0..3 {
            assert!(names.contains(&format!("partners_{i}_full_name")));
            assert!(names.contains(&format!("partners_{i}_general_partner")));
        }
        assert!(names.iter().any(|n| n == "partnership_mailing_address_city"));
        assert!(canvas.widgets().any(|(_, w)| matches!(
            w,
            Widget::RadioGroup { name, .. } if name == "partnership_kind"
        )));
    }

    #[test]
    fn every_widget_stays_inside_the_margins() {
        let c = coordinator();
        let settings = formgen::LayoutSettings::default();
        for form in ["business-name-change", "partnership-registration"] {
            let canvas = c.render(form).unwrap();
            for (_, widget) in canvas.widgets() {
                for rect in widget.rects() {
                    assert!(rect.y >= settings.margin_bottom - 0.01, "{form}: {widget:?}");
                    assert!(rect.top() <= settings.top() + 0.01, "{form}: {widget:?}");
                }
            }
        }
    }

    #[test]
    fn unresolved_reference_is_drawn_not_fatal() {
        let reg = registry(&[json!({
            "$id": "loose",
            "properties": {
                "owner": { "$ref": "person" },
                "name": { "type": "string" }
            }
        })]);
        let canvas = Coordinator::new(reg, FormCatalog::new()).render("loose").unwrap();

        let text = canvas.page_text(0);
        assert!(text
            .iter()
            .any(|t| t == "owner: unresolved reference \"person\" (unknown schema id: person)"));
        assert_eq!(widget_names(&canvas), ["name"]);
    }
}
