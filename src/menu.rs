//! Alfred script filter output.
//!
//! A query is a handful of words typed into Alfred; each word count maps to
//! a different menu (see [`build`]).

use std::ops::ControlFlow;

use serde::Serialize;

use crate::{store::SecretStore, AuthError};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Items {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub arg: String,
    pub autocomplete: String,
}

impl Item {
    /// A default item whose `arg` doubles as its autocompletion.
    pub fn new(title: impl Into<String>, arg: impl Into<String>) -> Self {
        let arg = arg.into();
        Self {
            kind: "default".to_string(),
            title: title.into(),
            autocomplete: arg.clone(),
            arg,
        }
    }

    fn generate(key: &str) -> Self {
        Self::new(key, format!("--key {key}"))
    }

    fn delete(key: &str) -> Self {
        Self::new(format!("del {key}"), format!("del --key {key}"))
    }
}

/// Builds the menu for the words typed after `query`.
///
/// - no words: every key, selecting generates its code
/// - `add`, `add <key>`, `add <key> <secret>`: the add command being typed
/// - `del`, `del <filter>`: keys to delete
/// - `<filter>`: keys containing the filter
///
/// The first word is matched case-insensitively. Anything else yields an
/// empty menu.
pub fn build(store: &SecretStore, args: &[String]) -> Result<Items, AuthError> {
    let command = args.first().map(|a| a.to_lowercase());

    let items = match (command.as_deref(), args) {
        (None, _) => matching(store, None, Item::generate)?,
        (Some("add"), [_]) => vec![Item::new("add", "add")],
        (Some("add"), [_, key]) => vec![Item::new(
            format!("add {key}"),
            format!("add --key {key}"),
        )],
        (Some("add"), [_, key, secret]) => vec![Item::new(
            format!("add {key} {secret}"),
            format!("add --key {key} --secret {secret}"),
        )],
        (Some("del"), [_]) => matching(store, None, Item::delete)?,
        (Some("del"), [_, filter]) => matching(store, Some(filter.as_str()), Item::delete)?,
        (Some(_), [filter]) => matching(store, Some(filter.as_str()), Item::generate)?,
        _ => Vec::new(),
    };

    Ok(Items { items })
}

/// Renders one item per stored key that contains `filter`.
fn matching(
    store: &SecretStore,
    filter: Option<&str>,
    item: fn(&str) -> Item,
) -> Result<Vec<Item>, AuthError> {
    let mut items = Vec::new();
    store.for_each(|key, _| {
        if filter.map_or(true, |f| key.contains(f)) {
            items.push(item(key));
        }
        ControlFlow::Continue(())
    })?;

    Ok(items)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::{build, Item, Items};
    use crate::store::SecretStore;

    struct Fixture {
        _dir: TempDir,
        store: SecretStore,
    }

    #[fixture]
    fn populated() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = SecretStore::open(dir.path().join("config.db")).expect("open store");
        for key in ["github", "gitlab", "aws"] {
            store.put(key, "JBSWY3DPEHPK3PXP").expect("put");
        }

        Fixture { _dir: dir, store }
    }

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn titles(items: &Items) -> Vec<&str> {
        items.items.iter().map(|i| i.title.as_str()).collect()
    }

    #[rstest]
    fn no_args_lists_every_key(populated: Fixture) {
        let items = build(&populated.store, &[]).unwrap();

        assert_eq!(
            vec![
                Item::new("aws", "--key aws"),
                Item::new("github", "--key github"),
                Item::new("gitlab", "--key gitlab"),
            ],
            items.items
        );
    }

    #[rstest]
    #[case(&["git"], vec!["github", "gitlab"])]
    #[case(&["hub"], vec!["github"])]
    #[case(&["GIT"], vec![])]
    #[case(&["del"], vec!["del aws", "del github", "del gitlab"])]
    #[case(&["DEL"], vec!["del aws", "del github", "del gitlab"])]
    #[case(&["del", "lab"], vec!["del gitlab"])]
    #[case(&["add"], vec!["add"])]
    #[case(&["Add", "bank"], vec!["add bank"])]
    #[case(&["add", "bank", "MZXW6"], vec!["add bank MZXW6"])]
    #[case(&["git", "hub"], vec![])]
    #[case(&["del", "a", "b"], vec![])]
    #[case(&["add", "a", "b", "c"], vec![])]
    fn query_menus(populated: Fixture, #[case] words: &[&str], #[case] expected: Vec<&str>) {
        let items = build(&populated.store, &args(words)).unwrap();

        assert_eq!(expected, titles(&items));
    }

    #[rstest]
    fn delete_items_carry_del_command(populated: Fixture) {
        let items = build(&populated.store, &args(&["del", "aws"])).unwrap();

        assert_eq!(vec![Item::new("del aws", "del --key aws")], items.items);
    }

    #[rstest]
    fn add_item_carries_full_command(populated: Fixture) {
        let items = build(&populated.store, &args(&["add", "bank", "MZXW6"])).unwrap();

        assert_eq!(
            vec![Item::new("add bank MZXW6", "add --key bank --secret MZXW6")],
            items.items
        );
    }

    #[test]
    fn serializes_alfred_shape() {
        let items = Items {
            items: vec![Item::new("a", "--key a")],
        };

        let json = serde_json::to_string(&items).unwrap();

        assert_eq!(
            r#"{"items":[{"type":"default","title":"a","arg":"--key a","autocomplete":"--key a"}]}"#,
            json
        );
    }

    #[test]
    fn empty_menu_serializes_as_empty_list() {
        let json = serde_json::to_string(&Items::default()).unwrap();

        assert_eq!(r#"{"items":[]}"#, json);
    }
}
