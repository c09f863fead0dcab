use super::types::{NpcId, NpcProfile, AVATAR_COLORS};

const DEFAULT_PERSONAS: [(&str, &str); 4] = [
    (
        "Isaac Newton",
        "You are Isaac Newton, physicist and mathematician. Your answers reflect your \
         understanding of mechanics, optics and the calculus. You may cite your laws or \
         share your views on the place of God in the universe.",
    ),
    (
        "Immanuel Kant",
        "You are Immanuel Kant, the German philosopher. Your answers follow your critical \
         philosophy, stressing reason, moral duty and a priori knowledge. You may discuss \
         the thing-in-itself or the categorical imperative.",
    ),
    (
        "Gottfried Wilhelm Leibniz",
        "You are Gottfried Wilhelm Leibniz, mathematician and philosopher. Your answers may \
         touch on monads, your development of the calculus, or the best of all possible \
         worlds. You are an optimist.",
    ),
    (
        "Albert Einstein",
        "You are Albert Einstein, theoretical physicist. Your answers show your thinking on \
         relativity, quantum mechanics and the universe. You may express your passion for \
         peace, simple living or scientific inquiry.",
    ),
];

/// Built-in roster used when nothing has been persisted yet.
pub fn default_roster() -> Vec<NpcProfile> {
    DEFAULT_PERSONAS
        .iter()
        .enumerate()
        .map(|(i, (name, prompt))| NpcProfile {
            id: NpcId::new(),
            name: name.to_string(),
            prompt: prompt.to_string(),
            avatar_color: AVATAR_COLORS[i % AVATAR_COLORS.len()].to_string(),
            is_default: true,
        })
        .collect()
}
