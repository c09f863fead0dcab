use crate::roster::NpcProfile;

pub use crate::kernel::message::Line;

pub const ORCHESTRATOR_ROLE: &str =
    "You orchestrate a group chat between a user and several role-played characters (NPCs). \
     You answer with JSON only.";

pub const SUMMARIZER_ROLE: &str =
    "You keep a running summary of a conversation so the characters stay on the user's topics. \
     You answer with JSON only.";

fn list_profiles(out: &mut String, profiles: &[&NpcProfile]) {
    for p in profiles {
        out.push_str(&format!("- Name: {}\n  Profile: {}\n", p.name, p.prompt));
    }
}

fn list_lines(out: &mut String, lines: &[Line]) {
    for l in lines {
        out.push_str(&format!("- {}: \"{}\"\n", l.sender_name, l.text));
    }
}

pub fn leader_selection(user_message: &str, profiles: &[&NpcProfile]) -> String {
    let mut out = format!("User message: {user_message}\n\nNPC profiles:\n");
    list_profiles(&mut out, profiles);
    out.push_str(
        "\nPick the ONE NPC whose reply to this message would be most relevant and insightful.\n\
         Return a JSON object with exactly two keys: \"leadingNpc\" (the exact name of the chosen NPC) \
         and \"reasoning\" (one short sentence explaining the choice).",
    );
    out
}

/// System instruction for an in-character reply.
pub fn persona_instruction(npc_name: &str, persona: &str, summary: &str) -> String {
    let mut out = format!("You are an NPC named {npc_name}. Your personality and instructions: \"{persona}\".");
    if summary.trim().is_empty() {
        out.push_str("\n\nReply directly to the latest message, in keeping with your personality and the recent conversation.");
    } else {
        out.push_str(&format!(
            "\n\nCONVERSATION FOCUS: the user-driven topic so far is summarized as: \"{summary}\". \
             Your reply MUST acknowledge, build on, or relate directly to this focus. \
             Do not introduce unrelated topics unless the user clearly changes the subject."
        ));
    }
    out.push_str("\n\nTaking your role, the focus and the recent history into account, reply naturally and stay in character.");
    out
}

pub fn collaboration(
    user_message: &str,
    leader: &NpcProfile,
    leader_text: &str,
    others: &[&NpcProfile],
) -> String {
    let mut out = String::new();
    if user_message.trim().is_empty() {
        out.push_str("The conversation is continuing without new input from the user.\n\n");
    } else {
        out.push_str(&format!("The user said:\n\"{user_message}\"\n\n"));
    }
    out.push_str(&format!(
        "{} (profile: \"{}\") replied first:\n\"{}\"\n\nOther NPCs who may follow up:\n",
        leader.name, leader.prompt, leader_text
    ));
    list_profiles(&mut out, others);
    out.push_str(
        "\nFor each of these NPCs decide whether they have something substantive to add. \
         Only include NPCs who actually contribute.\n\
         Return a JSON object {\"contributions\": [{\"npcName\": ..., \"response\": ...}, ...]}. \
         Use an empty array when nobody has anything to add.",
    );
    out
}

pub fn continuation_selection(recent: &[Line], profiles: &[&NpcProfile]) -> String {
    let mut out = String::from("The user has gone quiet. Recent conversation:\n");
    if recent.is_empty() {
        out.push_str("(no recent messages, this is the start of a conversation segment)\n");
    } else {
        list_lines(&mut out, recent);
    }
    out.push_str("\nAvailable NPCs:\n");
    list_profiles(&mut out, profiles);
    out.push_str(
        "\nSelect ONE NPC to speak next so the conversation keeps flowing.\n\
         Return a JSON object with keys \"npcName\" (exact name from the list), \
         \"npcSystemPrompt\" (that NPC's profile text) and \"triggerUserMessage\" \
         (one brief sentence the NPC should respond to, e.g. \"What do you make of that?\").",
    );
    out
}

pub fn reengagement(profiles: &[&NpcProfile]) -> String {
    let mut out = String::from(
        "The user has been inactive for a while. Pick one NPC to say something brief and natural \
         to draw them back in, e.g. \"Still with us?\" or \"Shall we continue?\".\n\nAvailable NPCs:\n",
    );
    list_profiles(&mut out, profiles);
    out.push_str(
        "\nReturn a JSON object with keys \"npcName\" (exact name from the list) and \
         \"reengagementText\" (the short message).",
    );
    out
}

pub fn summary(previous: &str, batch: &[Line]) -> String {
    let mut out = String::from("Previous summary:\n");
    if previous.trim().is_empty() {
        out.push_str("(none yet, this is the first summary)\n");
    } else {
        out.push_str(&format!("{previous}\n"));
    }
    out.push_str("\nRecent messages to incorporate (focus on the User):\n");
    list_lines(&mut out, batch);
    out.push_str(
        "\nWrite a new one- or two-sentence summary that captures what the USER wants to discuss. \
         Drop tangents. Return a JSON object with a single key \"newSummary\".",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaboration_lists_each_follower_on_its_own_line() {
        let kant = NpcProfile::new("Kant", "philosopher");
        let hume = NpcProfile::new("Hume", "skeptic");
        let newton = NpcProfile::new("Newton", "physicist");

        let prompt = collaboration("Is causation real?", &kant, "It is a category.", &[&hume, &newton]);

        assert!(prompt.starts_with("The user said:\n\"Is causation real?\"\n\n"));
        assert!(prompt.contains("Other NPCs who may follow up:\n- Name: Hume\n  Profile: skeptic\n- Name: Newton\n"));
    }

    #[test]
    fn summary_prompt_lists_batch_lines() {
        let batch = vec![
            Line { sender_name: "User".into(), text: "tell me about optics".into() },
            Line { sender_name: "Newton".into(), text: "Light is corpuscular.".into() },
        ];

        let prompt = summary("", &batch);

        assert!(prompt.contains("(none yet, this is the first summary)\n"));
        assert!(prompt.contains("- User: \"tell me about optics\"\n- Newton: \"Light is corpuscular.\"\n"));
    }
}
