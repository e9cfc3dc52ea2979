//! On-disk table store integration tests

use groupctl_store::{record, Condition, Record, StoreError, TableStore};
use tempfile::TempDir;

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    struct Base {
        #[column = "gid"]
        gid: i64,
        #[column = "disable"]
        disable: i64,
    }
}

record! {
    /// Shares the `Base` columns.
    #[derive(Debug, Clone, Default, PartialEq)]
    struct Tagged {
        #[embed]
        base: Base,
        label: String,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    struct Quote {
        #[column = "id"]
        id: i64,
        #[column = "author"]
        author: String,
        #[column = "text"]
        text: String,
    }
}

#[test]
fn database_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("control").join("plugins.db");
    let store = TableStore::open(&path).unwrap();
    store.create::<Base>("weather").unwrap();
    assert!(path.exists());
}

#[test]
fn rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plugins.db");
    {
        let store = TableStore::open(&path).unwrap();
        store.create::<Base>("weather").unwrap();
        store.insert("weather", &Base { gid: 42, disable: 1 }).unwrap();
    }

    let store = TableStore::open(&path).unwrap();
    store.create::<Base>("weather").unwrap();
    let row: Option<Base> = store.find("weather", &Condition::eq("gid", 42_i64)).unwrap();
    assert_eq!(row, Some(Base { gid: 42, disable: 1 }));
    assert_eq!(store.count("weather").unwrap(), 1);
}

#[test]
fn embedded_records_share_a_table_shape() {
    let store = TableStore::open_in_memory().unwrap();
    store.create::<Tagged>("tagged").unwrap();
    assert_eq!(store.columns("tagged").unwrap(), vec!["gid", "disable"]);

    let tagged = Tagged {
        base: Base { gid: 5, disable: 0 },
        label: "not stored".into(),
    };
    store.insert("tagged", &tagged).unwrap();

    let plain: Option<Base> = store.find("tagged", &Condition::eq("gid", 5_i64)).unwrap();
    assert_eq!(plain, Some(tagged.base.clone()));
}

#[test]
fn text_columns_round_trip() {
    let store = TableStore::open_in_memory().unwrap();
    store.create::<Quote>("quotes").unwrap();
    let quote = Quote {
        id: 1,
        author: "O'Brien".into(),
        text: "It's \"quoted\"; DROP TABLE quotes;".into(),
    };
    store.insert("quotes", &quote).unwrap();

    let found: Option<Quote> = store
        .find("quotes", &Condition::eq("author", "O'Brien".to_string()))
        .unwrap();
    assert_eq!(found, Some(quote));
    assert_eq!(store.count("quotes").unwrap(), 1);
}

#[test]
fn tables_with_different_names_are_independent() {
    let store = TableStore::open_in_memory().unwrap();
    store.create::<Base>("weather").unwrap();
    store.create::<Base>("music").unwrap();
    store.insert("weather", &Base { gid: 1, disable: 0 }).unwrap();

    assert_eq!(store.count("weather").unwrap(), 1);
    assert_eq!(store.count("music").unwrap(), 0);
}

#[test]
fn record_for_another_shape_is_rejected() {
    let store = TableStore::open_in_memory().unwrap();
    store.create::<Base>("weather").unwrap();
    let err = store
        .insert(
            "weather",
            &Quote {
                id: 1,
                author: String::new(),
                text: String::new(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::ColumnMismatch { .. }));
    assert_eq!(Quote::columns().len(), 3);
}
