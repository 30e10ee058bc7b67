use editor_types::{FormSnapshot, SubmitBody};

use crate::dom::Document;

/// Read the current values of a form, one entry per named enabled control
pub fn form_data<D: Document>(document: &D, form: &D::Node) -> FormSnapshot {
    FormSnapshot::from_controls(&document.form_controls(form))
}

/// Entries a native submission of the form would send right now
pub fn submit_body<D: Document>(document: &D, form: &D::Node) -> SubmitBody {
    SubmitBody::from_controls(&document.form_controls(form))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use editor_types::FieldValue;

    const FORM: &str = r#"
        <form id="edit_page">
            <input type="text" name="title" value="Home">
            <input type="checkbox" name="enabled" value="1" id="enabled">
            <select name="tags" multiple>
                <option value="news" selected>News</option>
                <option value="blog">Blog</option>
                <option value="misc" selected>Misc</option>
            </select>
            <input type="radio" name="layout" value="wide">
            <input type="radio" name="layout" value="narrow">
            <textarea name="content">Hello</textarea>
            <input type="text" value="no name">
            <input type="text" name="locked" value="x" disabled>
        </form>"#;

    #[test]
    fn test_form_data_shapes() {
        let doc = MemoryDocument::with_body(FORM);
        let form = doc.element_by_id("edit_page").unwrap();
        let snapshot = form_data(&doc, &form);

        assert_eq!(snapshot.get("title"), Some(&FieldValue::Text("Home".into())));
        assert_eq!(snapshot.get("enabled"), Some(&FieldValue::Text(String::new())));
        assert_eq!(
            snapshot.get("tags"),
            Some(&FieldValue::Multiple(vec!["news".into(), "misc".into()]))
        );
        assert_eq!(snapshot.get("layout"), Some(&FieldValue::Text(String::new())));
        assert_eq!(snapshot.get("content"), Some(&FieldValue::Text("Hello".into())));
        assert!(snapshot.get("locked").is_none());
        assert_eq!(snapshot.len(), 5);
    }

    #[test]
    fn test_checked_checkbox_yields_its_value() {
        let doc = MemoryDocument::with_body(FORM);
        let form = doc.element_by_id("edit_page").unwrap();
        let enabled = doc.element_by_id("enabled").unwrap();
        doc.set_checked(&enabled, true);
        assert_eq!(
            form_data(&doc, &form).get("enabled"),
            Some(&FieldValue::Text("1".into()))
        );
    }

    #[test]
    fn test_submit_body_skips_unset_controls() {
        let doc = MemoryDocument::with_body(FORM);
        let form = doc.element_by_id("edit_page").unwrap();
        let body = submit_body(&doc, &form);
        assert_eq!(
            body.pairs(),
            vec![
                ("title", "Home"),
                ("tags", "news"),
                ("tags", "misc"),
                ("content", "Hello"),
            ]
        );
    }
}
