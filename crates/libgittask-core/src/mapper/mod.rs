//! Field mapper: converts a nested external document into a flat task
//! record by dispatching on dotted field paths.

mod rules;

pub use rules::{FieldPath, FieldTransform, PathPattern, RuleTable, WildcardTransform};

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::TaskError;
use crate::types::record::value_kind;
use crate::types::Record;

type UnmappedHook<'a> = Box<dyn Fn(&FieldPath) + 'a>;

/// Maps documents with one rule table and one default record template
pub struct FieldMapper<'a> {
    rules: &'a RuleTable,
    template: Record,
    on_unmapped: Option<UnmappedHook<'a>>,
}

impl<'a> FieldMapper<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self {
            rules,
            template: Record::new(),
            on_unmapped: None,
        }
    }

    /// Every mapped record starts as a copy of `template`
    pub fn with_template(mut self, template: Record) -> Self {
        self.template = template;
        self
    }

    /// Called with the path of each field that no rule captured
    pub fn on_unmapped<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FieldPath) + 'a,
    {
        self.on_unmapped = Some(Box::new(hook));
        self
    }

    /// Map one document. A failing transform aborts the whole document.
    pub fn map(&self, source: &Value) -> Result<Record, TaskError> {
        let root = source.as_object().ok_or_else(|| TaskError::Mapping {
            path: String::new(),
            message: format!("document root is {}, expected an object", value_kind(source)),
        })?;
        let mut target = self.template.clone();
        self.map_object(&mut target, source, root, &FieldPath::root())?;
        Ok(target)
    }

    fn map_object(
        &self,
        target: &mut Record,
        source: &Value,
        node: &Map<String, Value>,
        path: &FieldPath,
    ) -> Result<(), TaskError> {
        for (key, value) in node {
            let candidate = path.child(key);

            if let Some(transform) = self.rules.exact_rule(&candidate) {
                transform(target, source).map_err(|message| TaskError::Mapping {
                    path: candidate.to_string(),
                    message,
                })?;
                continue;
            }

            if let Some(inner) = value.as_object() {
                if self.rules.has_rule_below(&candidate) {
                    self.map_object(target, source, inner, &candidate)?;
                    continue;
                }
            }

            if let Some(transform) = self.rules.wildcard_rule(path) {
                transform(target, source, key).map_err(|message| TaskError::Mapping {
                    path: candidate.to_string(),
                    message,
                })?;
                continue;
            }

            trace!(path = %candidate, "no rule for field, dropped");
            if let Some(hook) = &self.on_unmapped {
                hook(&candidate);
            }
        }
        Ok(())
    }
}

/// Map `source` with `rules`, starting from a copy of `template`
pub fn map_document(
    source: &Value,
    rules: &RuleTable,
    template: &Record,
) -> Result<Record, TaskError> {
    FieldMapper::new(rules)
        .with_template(template.clone())
        .map(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn capture_rules() -> RuleTable {
        RuleTable::new()
            .field(".fields.status", |t, doc| {
                t.insert("status", doc["fields"]["status"]["name"].clone());
                Ok(())
            })
            .unwrap()
            .wildcard(".fields.*", |t, doc, name| {
                t.insert(format!("fields_{}", name), doc["fields"][name].clone());
                Ok(())
            })
            .unwrap()
            .wildcard(".*", |t, doc, name| {
                t.insert(format!("top_{}", name), doc[name].clone());
                Ok(())
            })
            .unwrap()
    }

    #[test]
    fn test_template_fields_survive() {
        let mut template = Record::new();
        template.insert("status", "open");
        template.insert("pending", 1);
        let rules = RuleTable::new();
        let record = map_document(&json!({ "x": 1 }), &rules, &template).unwrap();
        assert_eq!(record, template);
    }

    #[test]
    fn test_exact_rule_beats_wildcard() {
        let dropped = RefCell::new(Vec::new());
        let rules = RuleTable::new()
            .field(".fields.status", |t, doc| {
                t.insert("status", doc["fields"]["status"].clone());
                Ok(())
            })
            .unwrap()
            .wildcard(".fields.*", |t, _, name| {
                t.insert(format!("w_{}", name), true);
                Ok(())
            })
            .unwrap();
        let doc = json!({ "fields": { "status": "To Do", "priority": "High" } });
        let record = FieldMapper::new(&rules)
            .on_unmapped(|p| dropped.borrow_mut().push(p.to_string()))
            .map(&doc)
            .unwrap();

        assert_eq!(record.get("status"), Some(&json!("To Do")));
        assert!(!record.contains("w_status"));
        assert_eq!(record.get("w_priority"), Some(&json!(true)));
        assert!(dropped.borrow().is_empty());
    }

    #[test]
    fn test_nested_field_without_inner_rules_is_not_recursed() {
        let dropped = RefCell::new(Vec::new());
        let rules = RuleTable::new()
            .wildcard(".*", |t, doc, name| {
                t.insert(format!("top_{}", name), doc[name].clone());
                Ok(())
            })
            .unwrap();
        let doc = json!({ "a": { "b": 1 }, "c": 2 });
        let record = FieldMapper::new(&rules)
            .on_unmapped(|p| dropped.borrow_mut().push(p.to_string()))
            .map(&doc)
            .unwrap();

        assert_eq!(record.get("top_a"), Some(&json!({ "b": 1 })));
        assert_eq!(record.get("top_c"), Some(&json!(2)));
        assert!(!record.contains("top_b"));
        assert!(dropped.borrow().is_empty());
    }

    #[test]
    fn test_prefix_names_do_not_trigger_recursion() {
        // A rule under `.statusCategory` must not pull `.status` into recursion
        let rules = RuleTable::new()
            .field(".statusCategory.name", |t, doc| {
                t.insert("category", doc["statusCategory"]["name"].clone());
                Ok(())
            })
            .unwrap()
            .wildcard(".*", |t, _, name| {
                t.insert(format!("top_{}", name), true);
                Ok(())
            })
            .unwrap();
        let doc = json!({
            "status": { "name": "ignored" },
            "statusCategory": { "name": "new", "id": 2 }
        });
        let record = map_document(&doc, &rules, &Record::new()).unwrap();
        assert_eq!(record.get("top_status"), Some(&json!(true)));
        assert_eq!(record.get("category"), Some(&json!("new")));
        assert!(!record.contains("top_statusCategory"));
        assert!(!record.contains("top_id"));
    }

    #[test]
    fn test_unmapped_fields_are_dropped_and_reported() {
        let dropped = RefCell::new(Vec::new());
        let rules = RuleTable::new()
            .field(".fields.summary", |t, doc| {
                t.insert("title", doc["fields"]["summary"].clone());
                Ok(())
            })
            .unwrap();
        let doc = json!({ "id": "1", "fields": { "summary": "S", "votes": 3 } });
        let record = FieldMapper::new(&rules)
            .on_unmapped(|p| dropped.borrow_mut().push(p.to_string()))
            .map(&doc)
            .unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(*dropped.borrow(), vec![".id".to_string(), ".fields.votes".to_string()]);
    }

    #[test]
    fn test_arrays_are_opaque() {
        let rules = capture_rules();
        let doc = json!({ "fields": { "labels": [{ "status": 1 }] } });
        let record = map_document(&doc, &rules, &Record::new()).unwrap();
        assert_eq!(record.get("fields_labels"), Some(&json!([{ "status": 1 }])));
        assert!(!record.contains("status"));
    }

    #[test]
    fn test_non_object_root_is_mapping_error() {
        let rules = capture_rules();
        let err = map_document(&json!([1, 2]), &rules, &Record::new()).unwrap_err();
        assert!(matches!(err, TaskError::Mapping { ref path, .. } if path.is_empty()));
    }

    #[test]
    fn test_failing_transform_reports_path() {
        let rules = RuleTable::new()
            .field(".fields.updated", |_, _| Err("bad timestamp".to_string()))
            .unwrap();
        let doc = json!({ "fields": { "updated": "yesterday" } });
        let err = map_document(&doc, &rules, &Record::new()).unwrap_err();
        match err {
            TaskError::Mapping { path, message } => {
                assert_eq!(path, ".fields.updated");
                assert_eq!(message, "bad timestamp");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_source_document_is_untouched() {
        let rules = capture_rules();
        let doc = json!({ "id": "7", "fields": { "status": { "name": "Done" }, "x": 1 } });
        let before = doc.clone();
        let record = map_document(&doc, &rules, &Record::new()).unwrap();
        assert_eq!(doc, before);
        assert_eq!(record.get("status"), Some(&json!("Done")));
        assert_eq!(record.get("fields_x"), Some(&json!(1)));
        assert_eq!(record.get("top_id"), Some(&json!("7")));
    }
}
