use std::fs;
use std::path::Path;

use gradwatch_core::contract::{
    MockDocumentSource, MockNotifier, MockRecordStore, NewRecord, RecordPage, RemoteRecord,
};
use gradwatch_core::pipeline::{publish, refresh_ages};
use gradwatch_core::{HarvestConfig, HarvestError, Ledger};
use tempfile::tempdir;

const SWE_HEADER: &str = "## 💻 Software Engineering New Grad Roles";

fn row(company: &str, title: &str, location: &str, link: Option<&str>, age: &str) -> String {
    let link_cell = match link {
        Some(href) => format!("<a href=\"{href}\"><img src=\"apply.png\" alt=\"Apply\"></a>"),
        None => "🔒".to_string(),
    };
    format!(
        "<tr>\n<td><strong>{company}</strong></td>\n<td>{title}</td>\n<td>{location}</td>\n<td>{link_cell}</td>\n<td>{age}</td>\n</tr>"
    )
}

/// A README with one active SWE table holding `rows` and an archived table
/// that must never be harvested.
fn readme(rows: &[String]) -> String {
    format!(
        "# New Grad Positions\n\nIntro text.\n\n{SWE_HEADER}\n\n\
<table>\n<thead>\n<tr><th>Company</th><th>Role</th><th>Location</th><th>Application</th><th>Age</th></tr>\n</thead>\n\
<tbody>\n{}\n</tbody>\n</table>\n\n\
<details>\n<summary>Inactive roles</summary>\n\n\
<table><tbody>{}</tbody></table>\n</details>\n\n\
## 🤝 Contributing\n\n\
<table><tbody>{}</tbody></table>\n",
        rows.join("\n"),
        row("Archived", "SWE", "New York, NY", Some("https://archived.example/1"), "5mo"),
        row("Elsewhere", "SWE", "New York, NY", Some("https://other-section.example/1"), "1d"),
    )
}

fn source_returning(doc: String) -> MockDocumentSource {
    let mut source = MockDocumentSource::new();
    source
        .expect_fetch_document()
        .returning(move || Ok(doc.clone()));
    source
}

fn config_in(dir: &Path) -> HarvestConfig {
    HarvestConfig {
        ledger_path: dir.join("seen.json"),
        ..HarvestConfig::default()
    }
}

fn created(record: NewRecord) -> RemoteRecord {
    RemoteRecord {
        id: format!("rec-{}", record.url),
        source_link: Some(record.url),
        age: Some(record.age),
    }
}

#[tokio::test]
async fn regional_row_is_published_notified_and_recorded() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let source = source_returning(readme(&[row(
        "Acme",
        "SWE Intern",
        "New York, NY",
        Some("https://acme.example/apply"),
        "3d",
    )]));

    let mut store = MockRecordStore::new();
    store
        .expect_create_record()
        .withf(|r: &NewRecord| {
            r.title == "SWE Intern"
                && r.company == "Acme"
                && r.url == "https://acme.example/apply"
                && r.age == "3d"
                && r.location == "New York, NY"
        })
        .times(1)
        .returning(|r| Ok(created(r)));

    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .withf(|text: &str| text.starts_with("NYC job added: SWE Intern | Acme"))
        .times(1)
        .returning(|_| Ok(()));

    let report = publish(&source, &store, &notifier, &config).await.unwrap();
    assert_eq!(report.rows_checked, 1);
    assert_eq!(report.added, 1);

    let ledger = Ledger::load(&config.ledger_path).unwrap();
    assert_eq!(ledger.len(), 1);
    assert!(ledger.contains("https://acme.example/apply"));
}

#[tokio::test]
async fn out_of_region_row_creates_nothing() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let source = source_returning(readme(&[row(
        "Acme",
        "SWE Intern",
        "Austin, TX",
        Some("https://acme.example/apply"),
        "3d",
    )]));

    let mut store = MockRecordStore::new();
    store.expect_create_record().never();
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().never();

    let report = publish(&source, &store, &notifier, &config).await.unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.out_of_region, 1);
    assert!(Ledger::load(&config.ledger_path).unwrap().is_empty());
}

#[tokio::test]
async fn row_without_anchor_is_counted_but_never_tracked() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let source = source_returning(readme(&[row("Acme", "SWE Intern", "New York, NY", None, "3d")]));

    let mut store = MockRecordStore::new();
    store.expect_create_record().never();
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().never();

    let report = publish(&source, &store, &notifier, &config).await.unwrap();
    assert_eq!(report.rows_checked, 1);
    assert_eq!(report.untrackable, 1);
    assert!(Ledger::load(&config.ledger_path).unwrap().is_empty());
}

#[tokio::test]
async fn second_run_without_new_rows_publishes_nothing() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let doc = readme(&[
        row("Acme", "SWE", "Brooklyn, NY", Some("https://acme.example/1"), "1d"),
        row("Beta", "Data Engineer", "NYC", Some("https://beta.example/2"), "2w"),
    ]);

    let source = source_returning(doc);
    let mut store = MockRecordStore::new();
    store
        .expect_create_record()
        .times(2)
        .returning(|r| Ok(created(r)));
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().times(2).returning(|_| Ok(()));

    let first = publish(&source, &store, &notifier, &config).await.unwrap();
    assert_eq!(first.added, 2);

    let mut quiet_store = MockRecordStore::new();
    quiet_store.expect_create_record().never();
    let mut quiet_notifier = MockNotifier::new();
    quiet_notifier.expect_notify().never();

    let second = publish(&source, &quiet_store, &quiet_notifier, &config)
        .await
        .unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.already_seen, 2);
    assert_eq!(Ledger::load(&config.ledger_path).unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_urls_in_one_document_publish_once() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let source = source_returning(readme(&[
        row("Acme", "SWE", "NYC", Some("https://acme.example/1"), "1d"),
        row("↳", "SWE II", "Queens", Some("https://acme.example/1"), "1d"),
    ]));

    let mut store = MockRecordStore::new();
    store
        .expect_create_record()
        .times(1)
        .returning(|r| Ok(created(r)));
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().times(1).returning(|_| Ok(()));

    let report = publish(&source, &store, &notifier, &config).await.unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.already_seen, 1);
}

#[tokio::test]
async fn disqualified_titles_are_skipped() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let source = source_returning(readme(&[
        row("Acme", "PhD Research Scientist", "NYC", Some("https://acme.example/phd"), "1d"),
        row("Acme", "ML Engineer 🎓", "NYC", Some("https://acme.example/grad"), "1d"),
    ]));

    let mut store = MockRecordStore::new();
    store.expect_create_record().never();
    let notifier = MockNotifier::new();

    let report = publish(&source, &store, &notifier, &config).await.unwrap();
    assert_eq!(report.disqualified, 2);
}

#[tokio::test]
async fn notification_failure_does_not_abort_the_run() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let source = source_returning(readme(&[row(
        "Acme",
        "SWE",
        "New York, NY",
        Some("https://acme.example/1"),
        "1d",
    )]));

    let mut store = MockRecordStore::new();
    store
        .expect_create_record()
        .times(1)
        .returning(|r| Ok(created(r)));
    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .times(1)
        .returning(|_| Err("webhook down".into()));

    let report = publish(&source, &store, &notifier, &config).await.unwrap();
    assert_eq!(report.added, 1);
    assert!(Ledger::load(&config.ledger_path)
        .unwrap()
        .contains("https://acme.example/1"));
}

#[tokio::test]
async fn create_failure_surfaces_but_keeps_earlier_publications() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    fs::write(&config.ledger_path, r#"["https://already.example/0"]"#).unwrap();
    let source = source_returning(readme(&[
        row("Acme", "SWE", "NYC", Some("https://acme.example/1"), "1d"),
        row("Beta", "SWE", "NYC", Some("https://beta.example/2"), "1d"),
    ]));

    let mut store = MockRecordStore::new();
    store
        .expect_create_record()
        .withf(|r: &NewRecord| r.url == "https://acme.example/1")
        .times(1)
        .returning(|r| Ok(created(r)));
    store
        .expect_create_record()
        .withf(|r: &NewRecord| r.url == "https://beta.example/2")
        .times(1)
        .returning(|_| Err("HTTP 502".into()));
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().times(1).returning(|_| Ok(()));

    let err = publish(&source, &store, &notifier, &config)
        .await
        .unwrap_err();
    match err {
        HarvestError::Create { url, .. } => assert_eq!(url, "https://beta.example/2"),
        other => panic!("expected create error, got {other:?}"),
    }

    let ledger = Ledger::load(&config.ledger_path).unwrap();
    assert!(ledger.contains("https://already.example/0"));
    assert!(ledger.contains("https://acme.example/1"));
    assert!(!ledger.contains("https://beta.example/2"));
}

#[tokio::test]
async fn fetch_failure_is_fatal() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let mut source = MockDocumentSource::new();
    source
        .expect_fetch_document()
        .returning(|| Err("rate limited".into()));
    let mut store = MockRecordStore::new();
    store.expect_create_record().never();
    let notifier = MockNotifier::new();

    let err = publish(&source, &store, &notifier, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, HarvestError::Fetch(_)), "got {err:?}");
}

#[tokio::test]
async fn refresh_updates_matched_records_and_counts_misses() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let source = source_returning(readme(&[
        row("Acme", "SWE", "NYC", Some("https://acme.example/1"), "12d"),
        row("Beta", "SWE", "Austin, TX", Some("https://beta.example/2"), "1mo"),
        row("Gamma", "SWE", "NYC", Some("https://gamma.example/3"), "2w"),
    ]));

    let mut store = MockRecordStore::new();
    store
        .expect_query_records()
        .withf(|cursor| cursor.is_none())
        .times(1)
        .returning(|_| {
            Ok(RecordPage {
                records: vec![
                    RemoteRecord {
                        id: "r1".into(),
                        source_link: Some("https://acme.example/1".into()),
                        age: Some("3d".into()),
                    },
                    RemoteRecord {
                        id: "r2".into(),
                        source_link: Some("https://gone.example/9".into()),
                        age: Some("3d".into()),
                    },
                ],
                next_cursor: Some("c2".into()),
            })
        });
    store
        .expect_query_records()
        .withf(|cursor| cursor.as_deref() == Some("c2"))
        .times(1)
        .returning(|_| {
            Ok(RecordPage {
                records: vec![
                    RemoteRecord {
                        id: "r3".into(),
                        source_link: Some("https://beta.example/2".into()),
                        age: None,
                    },
                    RemoteRecord {
                        id: "r4".into(),
                        source_link: None,
                        age: None,
                    },
                    RemoteRecord {
                        id: "r5".into(),
                        source_link: Some("https://gamma.example/3".into()),
                        age: Some("7d".into()),
                    },
                ],
                next_cursor: None,
            })
        });
    store
        .expect_update_age()
        .withf(|id: &str, age: &str| id == "r1" && age == "12d")
        .times(1)
        .returning(|_, _| Ok(()));
    store
        .expect_update_age()
        .withf(|id: &str, age: &str| id == "r3" && age == "30d")
        .times(1)
        .returning(|_, _| Ok(()));
    store
        .expect_update_age()
        .withf(|id: &str, _age: &str| id == "r5")
        .times(1)
        .returning(|_, _| Err("HTTP 409".into()));

    let report = refresh_ages(&source, &store, &config).await.unwrap();
    assert_eq!(report.records, 5);
    assert_eq!(report.updated, 2);
    assert_eq!(report.not_found, 2);
    assert_eq!(report.errors, 1);
}

#[tokio::test]
async fn refresh_query_failure_is_fatal() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let mut source = MockDocumentSource::new();
    source.expect_fetch_document().never();
    let mut store = MockRecordStore::new();
    store
        .expect_query_records()
        .returning(|_| Err("unauthorized".into()));
    store.expect_update_age().never();

    let err = refresh_ages(&source, &store, &config).await.unwrap_err();
    assert!(matches!(err, HarvestError::Query(_)), "got {err:?}");
}
