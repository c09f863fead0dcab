use std::fs;

use npc_arena::console;
use npc_arena::roster::{FileNpcStore, GroupRegistry, NpcPatch, NpcStore, RosterError};

#[test]
fn missing_file_seeds_default_personas() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.json");

    let store = FileNpcStore::open(&path).unwrap();

    let names: Vec<_> = store.list().into_iter().map(|n| n.name).collect();
    assert_eq!(names.len(), 4);
    assert!(store.list().iter().all(|n| n.is_default));
    assert!(!path.exists(), "opening alone does not write");
}

#[test]
fn explicit_empty_roster_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.json");
    fs::write(&path, "[]").unwrap();

    let store = FileNpcStore::open(&path).unwrap();

    assert!(store.list().is_empty());
}

#[test]
fn mutations_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.json");
    fs::write(&path, "[]").unwrap();

    let mut store = FileNpcStore::open(&path).unwrap();
    let hume = store.add("Hume", "Scottish skeptic").unwrap();
    store
        .update(hume.id, NpcPatch { prompt: Some("Empiricist".into()), ..Default::default() })
        .unwrap();
    store.add("Spinoza", "Lens grinder").unwrap();

    let reopened = FileNpcStore::open(&path).unwrap();
    let roster = reopened.list();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].name, "Hume");
    assert_eq!(roster[0].prompt, "Empiricist");
    assert_eq!(roster[0].id, hume.id);
}

#[test]
fn deleting_unknown_npc_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.json");
    fs::write(&path, "[]").unwrap();
    let mut store = FileNpcStore::open(&path).unwrap();
    let ghost = npc_arena::roster::NpcProfile::new("Ghost", "not here");

    let err = store.delete(ghost.id).unwrap_err();

    assert!(matches!(err, RosterError::NotFound(id) if id == ghost.id));
}

#[test]
fn corrupt_file_surfaces_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.json");
    fs::write(&path, "{not json").unwrap();

    assert!(matches!(FileNpcStore::open(&path), Err(RosterError::Serialization(_))));
}

#[test]
fn removing_an_npc_drops_it_from_groups() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileNpcStore::open(dir.path().join("roster.json")).unwrap();
    let roster = store.list();
    let mut group = None;
    store
        .edit_groups(&mut |groups: &mut GroupRegistry| {
            let id = groups.add_group("Rationalists");
            groups.add_member(id, roster[0].id)?;
            groups.add_member(id, roster[1].id)?;
            group = Some(id);
            Ok(())
        })
        .unwrap();
    let group = group.unwrap();

    store.delete(roster[0].id).unwrap();

    assert_eq!(store.groups().get(group).unwrap().npc_ids, vec![roster[1].id]);
}

#[test]
fn groups_persist_next_to_the_roster() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.json");
    let mut store = FileNpcStore::open(&path).unwrap();
    let kant = store.add("Kant", "philosopher").unwrap();

    for line in ["/group add Rationalists", "/group join Rationalists: Kant", "/group rename Rationalists: Idealists"] {
        console::apply_roster_command(&mut store, &console::parse(line)).unwrap();
    }
    console::apply_roster_command(&mut store, &console::parse("/edit Kant: critical philosopher")).unwrap();

    assert!(dir.path().join("roster.groups.json").exists());
    let reopened = FileNpcStore::open(&path).unwrap();
    let group = reopened.groups().find_by_name("Idealists").expect("group persisted");
    assert_eq!(group.npc_ids, vec![kant.id]);
    assert_eq!(reopened.get(kant.id).unwrap().prompt, "critical philosopher");
}
