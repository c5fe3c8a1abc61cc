mod common;

use common::{FakeHost, SITE, SOURCE, USER, config};
use trebuchet::steps::{StepContext, source};

#[test]
fn first_sync_clones_then_resets() {
    let host = FakeHost::new();
    let config = config();
    let ctx = StepContext::new(&host, &config, USER, "feedface");

    source::directories(&ctx).unwrap();
    source::sync(&ctx).unwrap();

    assert_eq!(host.head(SOURCE).as_deref(), Some("feedface"));
    assert_eq!(
        host.commands(),
        vec![
            format!("mkdir -p /home/deploy/sites/{SITE}/database"),
            format!("mkdir -p /home/deploy/sites/{SITE}/static"),
            format!("mkdir -p {SOURCE}"),
            format!("mkdir -p /home/deploy/sites/{SITE}/media"),
            format!("git clone https://github.com/me/blog.git {SOURCE}"),
            format!("cd {SOURCE} && git fetch"),
            format!("cd {SOURCE} && git reset --hard feedface"),
        ]
    );
}

#[test]
fn resets_to_pinned_commit_whatever_the_prior_head() {
    let host = FakeHost::new();
    let config = config();

    for commit in ["cafe01", "beef02", "cafe01"] {
        let ctx = StepContext::new(&host, &config, USER, commit);
        source::sync(&ctx).unwrap();
        assert_eq!(host.head(SOURCE).as_deref(), Some(commit));
    }

    assert_eq!(host.count("git clone"), 1);
    assert_eq!(host.count("git reset --hard"), 3);
}

#[test]
fn directories_are_repeatable() {
    let host = FakeHost::new();
    let config = config();
    let ctx = StepContext::new(&host, &config, USER, "feedface");

    source::directories(&ctx).unwrap();
    source::directories(&ctx).unwrap();

    for sub in ["database", "static", "source", "media"] {
        assert!(host.has_dir(&format!("/home/deploy/sites/{SITE}/{sub}")));
    }
}

#[test]
fn local_commit_of_missing_repo_fails() {
    let dir = tempfile::tempdir().unwrap();

    assert!(source::local_commit(dir.path()).is_err());
}
