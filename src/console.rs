use crate::roster::{find_by_name, GroupId, GroupRegistry, NpcGroup, NpcId, NpcPatch, NpcProfile, NpcStore, RosterError};

/// Console lines starting with `/` manage the roster; everything else is chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    ListNpcs,
    AddNpc { name: String, prompt: String },
    EditNpc { name: String, prompt: String },
    RenameNpc { name: String, new_name: String },
    RemoveNpc { name: String },
    ListGroups,
    Group(GroupCommand),
    Quit,
    Help,
    Chat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCommand {
    Create { name: String },
    Rename { name: String, new_name: String },
    Delete { name: String },
    Join { group: String, npc: String },
    Leave { group: String, npc: String },
    Move { npc: String, from: String, to: String },
}

impl ConsoleCommand {
    /// Whether applying this command changes the roster the kernel sees.
    pub fn changes_roster(&self) -> bool {
        matches!(
            self,
            ConsoleCommand::AddNpc { .. }
                | ConsoleCommand::EditNpc { .. }
                | ConsoleCommand::RenameNpc { .. }
                | ConsoleCommand::RemoveNpc { .. }
        )
    }
}

pub const HELP: &str = "Commands:
  /npcs                         list NPCs
  /add <name>: <persona>        add an NPC
  /edit <name>: <persona>       change an NPC's persona
  /rename <name>: <new name>    rename an NPC
  /remove <name>                remove an NPC
  /groups                       list groups
  /group add <name>             create a group
  /group rename <name>: <new>   rename a group
  /group delete <name>          delete a group
  /group join <group>: <npc>    add an NPC to a group
  /group leave <group>: <npc>   take an NPC out of a group
  /group move <npc>: <from>: <to>
  /quit
Type \"stop\" to interrupt.";

/// Split `a: b` into two trimmed, non-empty halves.
fn pair(arg: &str) -> Option<(String, String)> {
    let (a, b) = arg.split_once(':')?;
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() {
        return None;
    }
    Some((a.to_string(), b.to_string()))
}

fn split_verb(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (text, ""),
    }
}

pub fn parse(line: &str) -> ConsoleCommand {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return ConsoleCommand::Chat(line.to_string());
    };
    let (verb, arg) = split_verb(rest);

    let command = match verb.to_ascii_lowercase().as_str() {
        "npcs" => Some(ConsoleCommand::ListNpcs),
        "groups" => Some(ConsoleCommand::ListGroups),
        "quit" | "exit" => Some(ConsoleCommand::Quit),
        "remove" if !arg.is_empty() => Some(ConsoleCommand::RemoveNpc { name: arg.to_string() }),
        "add" => pair(arg).map(|(name, prompt)| ConsoleCommand::AddNpc { name, prompt }),
        "edit" => pair(arg).map(|(name, prompt)| ConsoleCommand::EditNpc { name, prompt }),
        "rename" => pair(arg).map(|(name, new_name)| ConsoleCommand::RenameNpc { name, new_name }),
        "group" => parse_group(arg).map(ConsoleCommand::Group),
        _ => None,
    };
    command.unwrap_or(ConsoleCommand::Help)
}

fn parse_group(arg: &str) -> Option<GroupCommand> {
    let (verb, arg) = split_verb(arg);
    match verb.to_ascii_lowercase().as_str() {
        "add" if !arg.is_empty() => Some(GroupCommand::Create { name: arg.to_string() }),
        "delete" if !arg.is_empty() => Some(GroupCommand::Delete { name: arg.to_string() }),
        "rename" => pair(arg).map(|(name, new_name)| GroupCommand::Rename { name, new_name }),
        "join" => pair(arg).map(|(group, npc)| GroupCommand::Join { group, npc }),
        "leave" => pair(arg).map(|(group, npc)| GroupCommand::Leave { group, npc }),
        "move" => {
            let parts: Vec<&str> = arg.split(':').map(str::trim).collect();
            match parts.as_slice() {
                [npc, from, to] if !npc.is_empty() && !from.is_empty() && !to.is_empty() => Some(GroupCommand::Move {
                    npc: npc.to_string(),
                    from: from.to_string(),
                    to: to.to_string(),
                }),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Apply a roster command to the store. Returns a line for the user.
///
/// Unknown NPC or group names are reported back, not raised.
pub fn apply_roster_command(store: &mut dyn NpcStore, command: &ConsoleCommand) -> Result<String, RosterError> {
    let roster = store.list();
    match command {
        ConsoleCommand::ListNpcs => {
            if roster.is_empty() {
                return Ok("No NPCs yet.".to_string());
            }
            Ok(roster.iter().map(describe).collect::<Vec<_>>().join("\n"))
        }
        ConsoleCommand::AddNpc { name, prompt } => {
            let npc = store.add(name, prompt)?;
            Ok(format!("Added {}.", npc.name))
        }
        ConsoleCommand::EditNpc { name, prompt } => {
            let Some(id) = find_by_name(&roster, name).map(|n| n.id) else {
                return Ok(no_npc(name));
            };
            store.update(id, NpcPatch { prompt: Some(prompt.clone()), ..Default::default() })?;
            Ok(format!("Updated {name}."))
        }
        ConsoleCommand::RenameNpc { name, new_name } => {
            let Some(id) = find_by_name(&roster, name).map(|n| n.id) else {
                return Ok(no_npc(name));
            };
            store.update(id, NpcPatch { name: Some(new_name.clone()), ..Default::default() })?;
            Ok(format!("Renamed {name} to {new_name}."))
        }
        ConsoleCommand::RemoveNpc { name } => match find_by_name(&roster, name) {
            Some(npc) => {
                store.delete(npc.id)?;
                Ok(format!("Removed {name}."))
            }
            None => Ok(no_npc(name)),
        },
        ConsoleCommand::ListGroups => {
            let groups = store.groups().list();
            if groups.is_empty() {
                return Ok("No groups yet.".to_string());
            }
            Ok(groups.iter().map(|g| describe_group(g, &roster)).collect::<Vec<_>>().join("\n"))
        }
        ConsoleCommand::Group(group) => apply_group_command(store, &roster, group),
        _ => Ok(HELP.to_string()),
    }
}

fn apply_group_command(
    store: &mut dyn NpcStore,
    roster: &[NpcProfile],
    command: &GroupCommand,
) -> Result<String, RosterError> {
    match command {
        GroupCommand::Create { name } => {
            store.edit_groups(&mut |groups: &mut GroupRegistry| {
                groups.add_group(name);
                Ok(())
            })?;
            Ok(format!("Created group {name}."))
        }
        GroupCommand::Rename { name, new_name } => {
            let Some(id) = group_id(store, name) else { return Ok(no_group(name)) };
            store.edit_groups(&mut |groups: &mut GroupRegistry| groups.rename_group(id, new_name))?;
            Ok(format!("Renamed group {name} to {new_name}."))
        }
        GroupCommand::Delete { name } => {
            let Some(id) = group_id(store, name) else { return Ok(no_group(name)) };
            store.edit_groups(&mut |groups: &mut GroupRegistry| groups.delete_group(id))?;
            Ok(format!("Deleted group {name}."))
        }
        GroupCommand::Join { group, npc } => {
            let Some(gid) = group_id(store, group) else { return Ok(no_group(group)) };
            let Some(nid) = npc_id(roster, npc) else { return Ok(no_npc(npc)) };
            store.edit_groups(&mut |groups: &mut GroupRegistry| groups.add_member(gid, nid))?;
            Ok(format!("{npc} joined {group}."))
        }
        GroupCommand::Leave { group, npc } => {
            let Some(gid) = group_id(store, group) else { return Ok(no_group(group)) };
            let Some(nid) = npc_id(roster, npc) else { return Ok(no_npc(npc)) };
            store.edit_groups(&mut |groups: &mut GroupRegistry| groups.remove_member(gid, nid))?;
            Ok(format!("{npc} left {group}."))
        }
        GroupCommand::Move { npc, from, to } => {
            let Some(nid) = npc_id(roster, npc) else { return Ok(no_npc(npc)) };
            let Some(from_id) = group_id(store, from) else { return Ok(no_group(from)) };
            let Some(to_id) = group_id(store, to) else { return Ok(no_group(to)) };
            store.edit_groups(&mut |groups: &mut GroupRegistry| groups.move_member(nid, from_id, to_id))?;
            Ok(format!("Moved {npc} from {from} to {to}."))
        }
    }
}

fn group_id(store: &dyn NpcStore, name: &str) -> Option<GroupId> {
    store.groups().find_by_name(name).map(|g| g.id)
}

fn npc_id(roster: &[NpcProfile], name: &str) -> Option<NpcId> {
    find_by_name(roster, name).map(|n| n.id)
}

fn no_npc(name: &str) -> String {
    format!("No NPC named {name}.")
}

fn no_group(name: &str) -> String {
    format!("No group named {name}.")
}

fn describe(npc: &NpcProfile) -> String {
    let mut persona: String = npc.prompt.chars().take(60).collect();
    if npc.prompt.chars().count() > 60 {
        persona.push_str("...");
    }
    format!("  {} - {}", npc.name, persona)
}

fn describe_group(group: &NpcGroup, roster: &[NpcProfile]) -> String {
    let members: Vec<&str> = group
        .npc_ids
        .iter()
        .filter_map(|id| roster.iter().find(|n| n.id == *id))
        .map(|n| n.name.as_str())
        .collect();
    if members.is_empty() {
        format!("  {} (empty)", group.name)
    } else {
        format!("  {}: {}", group.name, members.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::InMemoryNpcStore;

    #[test]
    fn parses_commands() {
        assert_eq!(parse("/npcs"), ConsoleCommand::ListNpcs);
        assert_eq!(
            parse("/add Hume: Scottish skeptic"),
            ConsoleCommand::AddNpc { name: "Hume".into(), prompt: "Scottish skeptic".into() }
        );
        assert_eq!(parse("/remove Hume"), ConsoleCommand::RemoveNpc { name: "Hume".into() });
        assert_eq!(parse("/add Hume"), ConsoleCommand::Help);
        assert_eq!(parse("  hello  "), ConsoleCommand::Chat("hello".into()));
        assert_eq!(parse("/QUIT"), ConsoleCommand::Quit);
        assert_eq!(
            parse("/rename Hume: David Hume"),
            ConsoleCommand::RenameNpc { name: "Hume".into(), new_name: "David Hume".into() }
        );
    }

    #[test]
    fn parses_group_commands() {
        assert_eq!(parse("/group add Empiricists"), ConsoleCommand::Group(GroupCommand::Create { name: "Empiricists".into() }));
        assert_eq!(
            parse("/group join Empiricists: Hume"),
            ConsoleCommand::Group(GroupCommand::Join { group: "Empiricists".into(), npc: "Hume".into() })
        );
        assert_eq!(
            parse("/group move Hume: Empiricists: Skeptics"),
            ConsoleCommand::Group(GroupCommand::Move {
                npc: "Hume".into(),
                from: "Empiricists".into(),
                to: "Skeptics".into()
            })
        );
        assert_eq!(parse("/group move Hume: Empiricists"), ConsoleCommand::Help);
        assert_eq!(parse("/group"), ConsoleCommand::Help);
    }

    #[test]
    fn add_and_remove_round_through_store() {
        let mut store = InMemoryNpcStore::new(Vec::new());

        apply_roster_command(&mut store, &parse("/add Hume: skeptic")).unwrap();
        assert_eq!(store.list().len(), 1);

        let reply = apply_roster_command(&mut store, &parse("/remove Hume")).unwrap();
        assert_eq!(reply, "Removed Hume.");
        assert!(store.list().is_empty());

        let reply = apply_roster_command(&mut store, &parse("/remove Hume")).unwrap();
        assert_eq!(reply, "No NPC named Hume.");
    }

    #[test]
    fn edit_and_rename_update_profile() {
        let mut store = InMemoryNpcStore::new(vec![NpcProfile::new("Hume", "skeptic")]);

        apply_roster_command(&mut store, &parse("/edit Hume: empiricist")).unwrap();
        apply_roster_command(&mut store, &parse("/rename Hume: David Hume")).unwrap();

        let npc = &store.list()[0];
        assert_eq!(npc.name, "David Hume");
        assert_eq!(npc.prompt, "empiricist");
        assert!(parse("/rename Hume: x").changes_roster());
        assert!(!parse("/group add x").changes_roster());
    }

    #[test]
    fn group_commands_drive_membership() {
        let mut store = InMemoryNpcStore::new(vec![NpcProfile::new("Hume", "skeptic")]);
        for line in ["/group add Empiricists", "/group add Skeptics", "/group join Empiricists: Hume"] {
            apply_roster_command(&mut store, &parse(line)).unwrap();
        }
        let listed = apply_roster_command(&mut store, &ConsoleCommand::ListGroups).unwrap();
        assert!(listed.contains("Empiricists: Hume"));

        apply_roster_command(&mut store, &parse("/group move Hume: Empiricists: Skeptics")).unwrap();
        let listed = apply_roster_command(&mut store, &ConsoleCommand::ListGroups).unwrap();
        assert!(listed.contains("Empiricists (empty)"));
        assert!(listed.contains("Skeptics: Hume"));

        let reply = apply_roster_command(&mut store, &parse("/group join Rationalists: Hume")).unwrap();
        assert_eq!(reply, "No group named Rationalists.");
        let reply = apply_roster_command(&mut store, &parse("/group join Skeptics: Kant")).unwrap();
        assert_eq!(reply, "No NPC named Kant.");
    }
}
