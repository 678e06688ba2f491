use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DESCRIPTOR: &str = r#"name: sakai
prefix: its
indexing_enabled: false
groups:
  - name: devs
    members: [alice, bob]
authorizations:
  - { path: /, principal: "@devs", mode: rw }
  - { path: /, principal: bob, mode: r }
  - { path: /docs, principal: carol, mode: r }
"#;

/// Helper function to create a repository root holding one managed repository
fn create_mock_site() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    // A directory counts as a repository when it has conf/ and format
    let repository = root.join("repos").join("its").join("sakai");
    fs::create_dir_all(repository.join("conf")).unwrap();
    fs::write(repository.join("format"), "5\n").unwrap();

    let descriptors = root.join("repos").join("yaml").join("its");
    fs::create_dir_all(&descriptors).unwrap();
    fs::write(descriptors.join("sakai.yaml"), DESCRIPTOR).unwrap();

    fs::create_dir_all(root.join("conf")).unwrap();

    temp_dir
}

/// A command running inside `dir` with every setting pointing into it
fn repoadm(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("repoadm").unwrap();
    cmd.current_dir(dir)
        .env("REPO_ROOT", "repos")
        .env("APACHE_CONF_ROOT", "conf")
        .env("MOCK_VCS", "true")
        .env("NOTIFY_GRANTS", "false")
        .env("NO_COLOR", "1")
        .env_remove("DESCRIPTOR_ROOT")
        .env_remove("TEMPLATE_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}

#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    repoadm(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Administration of Subversion repositories"))
        .stdout(predicate::str::contains("addauth"));
}

#[test]
fn test_cli_version() {
    let temp_dir = TempDir::new().unwrap();
    repoadm(temp_dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("repoadm"));
}

#[test]
fn test_lsauth() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["lsauth", "its/sakai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: sakai"))
        .stdout(predicate::str::contains("Prefix: its"))
        .stdout(predicate::str::contains("devs = alice, bob"))
        .stdout(predicate::str::contains("path: /\tuser: bob\tpermission: r"))
        .stdout(predicate::str::contains("path: /docs\tuser: carol\tpermission: r"));
}

#[test]
fn test_missing_descriptor() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["lsauth", "its/ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error loading the repository description"));
}

#[test]
fn test_addauth_writes_acl_and_descriptor() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["addauth", "/its/sakai", "/docs", "dave", "rw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added auth (/docs, dave, rw)"))
        .stdout(predicate::str::contains("Nothing to commit"));

    let authz = read(site.path(), "conf/its_sakai.authz");
    assert_eq!(
        authz,
        "[groups]\ndevs = alice, bob\n\n[/]\nbob = r\n@devs = rw\n\n[/docs]\ncarol = r\ndave = rw\n\n"
    );

    let descriptor = read(site.path(), "repos/yaml/its/sakai.yaml");
    assert!(descriptor.contains("dave"));
}

#[test]
fn test_addauth_rejections() {
    let site = create_mock_site();

    repoadm(site.path())
        .args(["addauth", "its/sakai", "/", "bob", "r"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authorization (/, bob, r) already exists"));

    repoadm(site.path())
        .args(["addauth", "its/sakai", "/", "bob", "write"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid authorization type"));

    repoadm(site.path())
        .args(["addauth", "its/sakai", "/", "@qa", "r"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Group @qa is not a valid group"));

    repoadm(site.path())
        .args(["addauth", "its/sakai", "docs", "bob", "r"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid path 'docs'"));

    // A newline would open a forged section in the authz file
    repoadm(site.path())
        .args(["addauth", "its/sakai", "/x\n[/y]", "bob", "rw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid path"));

    // Nothing was written by the failed attempts
    assert!(!site.path().join("conf/its_sakai.authz").exists());
    assert_eq!(read(site.path(), "repos/yaml/its/sakai.yaml"), DESCRIPTOR);
}

#[test]
fn test_delauth() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["delauth", "its/sakai", "/docs", "carol"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 permission for carol from sakai."));

    assert!(!read(site.path(), "conf/its_sakai.authz").contains("carol"));

    repoadm(site.path())
        .args(["delauth", "its/sakai", "/docs", "carol"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No authorizations found for carol on /docs"));
}

#[test]
fn test_deluser() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["deluser", "its/sakai", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 permission for bob"));

    // Group membership is untouched
    let authz = read(site.path(), "conf/its_sakai.authz");
    assert!(authz.contains("devs = alice, bob"));
    assert!(!authz.contains("bob = r"));

    repoadm(site.path())
        .args(["deluser", "its/sakai", "zoe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("zoe has no permissions for the repository sakai"));
}

#[test]
fn test_addgroup_strips_separators() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["addgroup", "its/sakai", "qa", "erin,", "frank:"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added group qa to sakai"));

    assert!(read(site.path(), "conf/its_sakai.authz").contains("qa = erin, frank\n"));

    repoadm(site.path())
        .args(["addgroup", "its/sakai", "qa", "george"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Group qa already exists"));
}

#[test]
fn test_delgroup_requires_confirmation() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["delgroup", "its/sakai", "devs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    repoadm(site.path())
        .args(["delgroup", "its/sakai", "devs", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed the group devs and 1 grant"));

    let authz = read(site.path(), "conf/its_sakai.authz");
    assert!(!authz.contains("devs"));
    assert!(!authz.contains("[groups]"));
}

#[test]
fn test_delgroup_members() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["delgroup", "its/sakai", "devs", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed users bob from group devs."));

    let authz = read(site.path(), "conf/its_sakai.authz");
    assert!(authz.contains("devs = alice\n"));
    assert!(authz.contains("@devs = rw"));

    repoadm(site.path())
        .args(["delgroup", "its/sakai", "devs", "zoe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("zoe is not a member of the devs group"));
}

#[test]
fn test_delgroup_warns_when_referenced_group_empties() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["delgroup", "its/sakai", "devs", "bob"])
        .assert()
        .success()
        .stderr(predicate::str::contains("has no members left").not());

    repoadm(site.path())
        .args(["delgroup", "its/sakai", "devs", "alice"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Group devs has no members left but still holds grants",
        ));
}

#[test]
fn test_info() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["info", "its/sakai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("URL: https://svn.example.com/svn/its/sakai"))
        .stdout(predicate::str::contains("Indexing: off"))
        .stdout(predicate::str::contains("Authorizations:"))
        .stdout(predicate::str::contains("Apache authz:").not());

    repoadm(site.path())
        .args(["--verbose", "info", "its/sakai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Apache authz:"))
        .stdout(predicate::str::contains("its_sakai.authz"));
}

#[test]
fn test_ls() {
    let site = create_mock_site();
    fs::create_dir_all(site.path().join("repos/its/not-a-repo")).unwrap();

    repoadm(site.path())
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("Repositories in"))
        .stdout(predicate::str::contains("sakai"))
        .stdout(predicate::str::contains("not-a-repo").not())
        .stdout(predicate::str::contains("yaml").not());

    repoadm(site.path())
        .args(["ls", "its"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sakai"));
}

#[test]
fn test_flush() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["flush", "its/sakai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote Apache conf."));

    let conf = read(site.path(), "conf/its_sakai.conf");
    assert!(conf.starts_with("<Location /svn/its/sakai>"));
    assert!(read(site.path(), "conf/its_sakai.authz").starts_with("[groups]\n"));
}

#[test]
fn test_delete_prints_steps() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["delete", "its/sakai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tar czvf sakai.tgz"))
        .stdout(predicate::str::contains("its_sakai.conf"));

    // Nothing is removed
    assert!(site.path().join("repos/yaml/its/sakai.yaml").exists());
}

#[test]
fn test_commit() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["commit", "-a", "its/sakai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to commit"));

    repoadm(site.path())
        .args(["commit", "its/ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("doesn't exist"));
}

#[test]
fn test_indexing_check() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["indexing", "its/sakai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexing is OFF for sakai"));

    repoadm(site.path())
        .args(["indexing", "its/sakai", "off"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already turned off"));
}

#[test]
fn test_create_existing_or_undescribed() {
    let site = create_mock_site();
    repoadm(site.path())
        .args(["create", "its/sakai"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    repoadm(site.path())
        .args(["create", "--indexing", "its/new"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--description"));
    assert!(!site.path().join("repos/its/new").exists());
}

#[test]
fn test_import() {
    let site = create_mock_site();
    fs::write(
        site.path().join("conf/its_web.authz"),
        "[groups]\nweb = alice, bob\n\n[/]\n@web = rw\ncarol = r\nbroken line\n\n[/docs]\n@nobody = r\n",
    )
    .unwrap();

    repoadm(site.path())
        .args(["import", "its/web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped line"))
        .stdout(predicate::str::contains("Authorizations imported: 2"))
        .stdout(predicate::str::contains("Groups imported: 1"));

    repoadm(site.path())
        .args(["lsauth", "its/web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web = alice, bob"))
        .stdout(predicate::str::contains("user: @web\tpermission: rw"));

    // A second import would overwrite the descriptor
    repoadm(site.path())
        .args(["import", "its/web"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_import_from_file() {
    let site = create_mock_site();
    let source = site.path().join("legacy.authz");
    fs::write(&source, "[/]\nalice = r\n").unwrap();

    repoadm(site.path())
        .args(["import", "web", "--from"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("Authorizations imported: 1"));

    assert!(site.path().join("repos/yaml/web.yaml").exists());
}
