use rand::Rng;
use shared::ClassLabel;

pub const CAT_MESSAGES: [&str; 3] = [
    "That's definitely a cute kitty! 🐱 Meow!",
    "Purr-fect! It's a cat! 🐱",
    "I see whiskers and adorableness - it's a cat! 😸",
];

pub const DOG_MESSAGES: [&str; 3] = [
    "That's a good doggo right there! 🐶 Woof!",
    "Woof woof! Definitely a dog! 🐕",
    "Tail-wagging confirmed - it's a dog! 🐶",
];

pub const UNCERTAIN_MESSAGE: &str =
    "Hmm, I'm not sure about this one. Try a clearer photo of a cat or a dog! 🤔";

pub fn pool(label: ClassLabel) -> &'static [&'static str] {
    match label {
        ClassLabel::Cat => &CAT_MESSAGES,
        ClassLabel::Dog => &DOG_MESSAGES,
        ClassLabel::Uncertain => std::slice::from_ref(&UNCERTAIN_MESSAGE),
    }
}

/// Picks a message for `label`. Only the wording is random.
pub fn pick<R: Rng + ?Sized>(label: ClassLabel, rng: &mut R) -> &'static str {
    let messages = pool(label);
    messages[rng.random_range(0..messages.len())]
}
