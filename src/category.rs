use tracing::debug;

use crate::models::{PlaybookItem, RawPlaybookItem};
use crate::ordered::CategoryMap;

/// Concatenate every category's items, category by category, tagging each
/// item with the category it came from. Both orders follow the source map.
pub fn flatten_by_category(categories: &CategoryMap<RawPlaybookItem>) -> Vec<PlaybookItem> {
    let out: Vec<PlaybookItem> = categories
        .iter()
        .flat_map(|(category, items)| items.iter().map(move |item| tag(category, item)))
        .collect();
    debug!("Playbook flattened - categories={}, items={}", categories.len(), out.len());
    out
}

fn tag(category: &str, item: &RawPlaybookItem) -> PlaybookItem {
    PlaybookItem {
        category_name: category.to_string(),
        issue: item.issue.clone(),
        severity: item.severity.clone(),
        confidence: item.confidence,
        root_cause: item.root_cause.clone(),
        impact: item.impact.clone(),
        actions: item.actions.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(issue: &str) -> RawPlaybookItem {
        RawPlaybookItem { issue: issue.into(), ..Default::default() }
    }

    #[test]
    fn test_preserves_category_and_item_order() {
        let map: CategoryMap<RawPlaybookItem> =
            vec![("A", vec![item("a1"), item("a2")]), ("B", vec![item("b1")])].into_iter().collect();

        let flat: Vec<(String, String)> = flatten_by_category(&map)
            .into_iter()
            .map(|p| (p.issue, p.category_name))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("a1".to_string(), "A".to_string()),
                ("a2".to_string(), "A".to_string()),
                ("b1".to_string(), "B".to_string()),
            ]
        );
    }

    #[test]
    fn test_json_key_order_is_kept() {
        let map: CategoryMap<RawPlaybookItem> = serde_json::from_str(
            r#"{"Staffing":[{"issue":"s1","actions":["hire","train"]}],
                "Access":[{"issue":"x1"},{"issue":"x2"}],
                "Empty":[]}"#,
        )
        .unwrap();
        let flat = flatten_by_category(&map);
        let cats: Vec<&str> = flat.iter().map(|p| p.category_name.as_str()).collect();
        assert_eq!(cats, vec!["Staffing", "Access", "Access"]);
        assert_eq!(flat[0].actions, vec!["hire", "train"]);
    }

    #[test]
    fn test_empty_map() {
        assert!(flatten_by_category(&CategoryMap::new()).is_empty());
    }
}
