#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use secsgate_core::template::TemplateStore;
use secsgate_gateway::store::FsTemplateStore;

fn store() -> FsTemplateStore {
    FsTemplateStore::new("../../templates")
}

#[test]
fn lists_sample_templates_sorted() {
    let names = store().list_names().unwrap();
    assert!(names.contains(&"S1F1_are_you_there".to_string()));
    assert!(names.contains(&"S2F41_host_command".to_string()));
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn loads_by_name_with_or_without_extension() {
    let s = store();
    let t = s.load("S2F41_host_command").unwrap();
    assert_eq!(t.as_value()["func"], 41);
    assert!(t.placeholders().contains("slots"));
    assert_eq!(s.load("S2F41_host_command.json").unwrap(), t);
}

#[test]
fn missing_template_is_not_found() {
    let err = store().load("S99F99_nope").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "NOT_FOUND");
}

#[test]
fn traversal_names_are_rejected() {
    for name in ["../secsgate", "a/b", "..", "", ".hidden", "a\\b"] {
        let err = store().load(name).expect_err(name);
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST", "name={name:?}");
    }
}

#[test]
fn missing_dir_lists_nothing() {
    let s = FsTemplateStore::new("../../does-not-exist");
    assert!(s.list_names().unwrap().is_empty());
}

#[test]
fn listed_names_are_all_loadable() {
    let dir = std::env::temp_dir().join(format!("secsgate-store-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let body = r#"{ "stream": 1, "func": 1, "items": [] }"#;
    for file in ["ok.json", ".hidden.json", "a..b.json", "notes.txt"] {
        std::fs::write(dir.join(file), body).unwrap();
    }

    let s = FsTemplateStore::new(dir.clone());
    let names = s.list_names().unwrap();
    assert_eq!(names, vec!["ok".to_string()]);
    for name in &names {
        s.load(name).unwrap();
    }

    std::fs::remove_dir_all(&dir).unwrap();
}
