//! End-to-end tests: in-memory mailboxes through the pool, walker and writer.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use chrono::NaiveDate;
use predicates::prelude::*;

use pst2md::config::Config;
use pst2md::error::PstError;
use pst2md::mailbox::memory::{MemoryClient, MemoryFolder, MemoryItem};
use pst2md::mailbox::MailClient;
use pst2md::model::address::EmailAddress;
use pst2md::model::attachment::Attachment;
use pst2md::model::message::Message;
use pst2md::pool::{run_all, FileOutcome};
use pst2md::progress::Progress;

fn message(subject: &str, sender: (&str, &str), day: u32) -> Message {
    Message {
        subject: subject.to_string(),
        sender: EmailAddress::new(sender.0, sender.1),
        to: vec![EmailAddress::new("Team", "team@x.com")],
        cc: Vec::new(),
        received: NaiveDate::from_ymd_opt(2024, 1, day).and_then(|d| d.and_hms_opt(10, 0, 0)),
        html_body: format!("<h2>{subject}</h2><ul><li>first</li><li>second</li></ul>"),
        text_body: String::new(),
        attachments: Vec::new(),
    }
}

fn mailbox(tag: &str) -> MemoryFolder {
    let mut with_attachment = message(&format!("{tag} report"), ("Ann Lee", "ann@x.com"), 3);
    with_attachment.attachments = vec![
        Attachment::new("report.pdf", b"%PDF".to_vec()),
        Attachment::new("data.csv", b"a,b\n1,2\n".to_vec()),
    ];

    MemoryFolder::new(format!("{tag} archive"))
        .with_message(message("Hello", ("John Smith", "j@x.com"), 1))
        .with_item(MemoryItem::Other)
        .with_subfolder(
            MemoryFolder::new("Inbox")
                .with_message(message("Hello", ("John Smith", "j@x.com"), 1))
                .with_message(with_attachment),
        )
}

/// Create empty placeholder PST files, each in its own folder.
fn pst_files(root: &Path, tags: &[&str]) -> Vec<PathBuf> {
    tags.iter()
        .map(|tag| {
            let dir = root.join(tag);
            std::fs::create_dir_all(&dir).unwrap();
            let pst = dir.join(format!("{tag}.pst"));
            std::fs::write(&pst, b"").unwrap();
            pst
        })
        .collect()
}

fn client_for(psts: &[PathBuf], tags: &[&str]) -> MemoryClient {
    let stores: HashMap<PathBuf, MemoryFolder> = psts
        .iter()
        .zip(tags)
        .map(|(p, t)| (p.clone(), mailbox(t)))
        .collect();
    MemoryClient::new(stores)
}

fn run(
    client: &MemoryClient,
    inputs: &[PathBuf],
    output: Option<&Path>,
    workers: usize,
) -> Vec<FileOutcome> {
    let client = client.clone();
    let connect = move || -> pst2md::error::Result<Box<dyn MailClient>> {
        Ok(Box::new(client.clone()))
    };
    run_all(
        inputs,
        output,
        workers,
        &Config::default(),
        &Progress::hidden(),
        &connect,
    )
}

/// Relative path → content for every file under `root`.
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else if path.extension().map(|e| e != "pst").unwrap_or(true) {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                out.insert(rel, std::fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

// ─── Layout of a single mailbox ─────────────────────────────────────

#[test]
fn test_single_mailbox_layout() {
    let temp = assert_fs::TempDir::new().unwrap();
    let psts = pst_files(temp.path(), &["alpha"]);
    let client = client_for(&psts, &["alpha"]);

    let outcomes = run(&client, &psts, None, 1);
    assert_eq!(outcomes.len(), 1);
    let stats = outcomes[0].result.as_ref().unwrap();
    assert_eq!(stats.messages, 3);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.attachments, 2);

    let out = temp.child("alpha");
    out.child("2024-01-01_John Smith_Hello.md")
        .assert(predicate::path::is_file());
    out.child("2024-01-01_John Smith_Hello_1.md")
        .assert(predicate::path::is_file());

    let folder = out.child("2024-01-03_Ann Lee_alpha report");
    folder.assert(predicate::path::is_dir());
    folder
        .child("2024-01-03_Ann Lee_alpha report.md")
        .assert(predicate::str::contains("- [report.pdf](report.pdf)"))
        .assert(predicate::str::contains("- [data.csv](data.csv)"))
        .assert(predicate::str::contains("| **CC** |  |"));
    folder.child("report.pdf").assert(predicate::path::is_file());
    folder.child("data.csv").assert("a,b\n1,2\n");

    let md = std::fs::read_to_string(out.child("2024-01-01_John Smith_Hello.md").path()).unwrap();
    assert!(md.starts_with("# Hello\n"));
    assert!(md.contains("| **To** | Team <team@x.com> |"));
    assert!(md.contains("## Hello"));
    assert!(md.contains("second"));
}

#[test]
fn test_folder_contains_one_markdown_plus_attachments() {
    let temp = assert_fs::TempDir::new().unwrap();
    let psts = pst_files(temp.path(), &["beta"]);
    let client = client_for(&psts, &["beta"]);
    run(&client, &psts, None, 1);

    let folder = temp.child("beta").child("2024-01-03_Ann Lee_beta report");
    let names: Vec<String> = std::fs::read_dir(folder.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 3);
    assert_eq!(names.iter().filter(|n| n.ends_with(".md")).count(), 1);
}

// ─── Parallel vs sequential ─────────────────────────────────────────

#[test]
fn test_parallel_output_matches_sequential() {
    let tags = ["one", "two", "three"];

    let seq_root = tempfile::tempdir().unwrap();
    let seq_psts = pst_files(seq_root.path(), &tags);
    let seq = run(&client_for(&seq_psts, &tags), &seq_psts, None, 1);

    let par_root = tempfile::tempdir().unwrap();
    let par_psts = pst_files(par_root.path(), &tags);
    let par = run(&client_for(&par_psts, &tags), &par_psts, None, 3);

    assert!(seq.iter().all(|o| o.result.is_ok()));
    assert!(par.iter().all(|o| o.result.is_ok()));

    // Outcomes come back in input order
    let order: Vec<&PathBuf> = par.iter().map(|o| &o.pst).collect();
    assert_eq!(order, par_psts.iter().collect::<Vec<_>>());

    let seq_files = snapshot(seq_root.path());
    assert_eq!(seq_files.len(), 3 * 5);
    assert_eq!(seq_files, snapshot(par_root.path()));
}

// ─── Failure isolation ──────────────────────────────────────────────

#[test]
fn test_missing_pst_fails_alone() {
    let temp = tempfile::tempdir().unwrap();
    let mut psts = pst_files(temp.path(), &["good"]);
    let client = client_for(&psts, &["good"]);
    psts.insert(0, temp.path().join("missing.pst"));

    let outcomes = run(&client, &psts, None, 2);
    assert!(matches!(outcomes[0].result, Err(PstError::FileNotFound(_))));
    assert_eq!(outcomes[1].result.as_ref().unwrap().messages, 3);
    assert!(client.open_stores().is_empty());
}

#[test]
fn test_unmountable_store_fails_alone() {
    let temp = tempfile::tempdir().unwrap();
    let psts = pst_files(temp.path(), &["known", "unknown"]);
    let client = client_for(&psts[..1], &["known"]);

    let outcomes = run(&client, &psts, None, 1);
    assert!(outcomes[0].result.is_ok());
    assert!(matches!(outcomes[1].result, Err(PstError::StoreOpen { .. })));
}

#[test]
fn test_unavailable_mail_client() {
    let temp = tempfile::tempdir().unwrap();
    let psts = pst_files(temp.path(), &["a", "b"]);
    let connect = || -> pst2md::error::Result<Box<dyn MailClient>> {
        Err(PstError::MailClientUnavailable("not installed".to_string()))
    };

    let outcomes = run_all(&psts, None, 2, &Config::default(), &Progress::hidden(), &connect);
    assert_eq!(outcomes.len(), 2);
    for outcome in &outcomes {
        let err = outcome.result.as_ref().unwrap_err();
        assert!(err.to_string().starts_with("Outlook not found"));
    }
}

// ─── Shared output directory ────────────────────────────────────────

#[test]
fn test_shared_output_directory_suffixes_across_files() {
    let temp = tempfile::tempdir().unwrap();
    let tags = ["x", "y"];
    let psts = pst_files(temp.path(), &tags);
    let client = client_for(&psts, &tags);
    let shared = temp.path().join("out");

    let outcomes = run(&client, &psts, Some(&shared), 2);
    assert!(outcomes.iter().all(|o| o.result.is_ok()));

    // Both mailboxes carry two "Hello" messages from the same sender and day
    let hello: Vec<String> = std::fs::read_dir(&shared)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("2024-01-01_John Smith_Hello"))
        .collect();
    assert_eq!(hello.len(), 4);
    for name in [
        "2024-01-01_John Smith_Hello.md",
        "2024-01-01_John Smith_Hello_1.md",
        "2024-01-01_John Smith_Hello_2.md",
        "2024-01-01_John Smith_Hello_3.md",
    ] {
        assert!(hello.contains(&name.to_string()), "missing {name}");
    }
}
