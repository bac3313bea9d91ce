//! Deterministic username generation for synthetic accounts.
//!
//! Same seed, same usernames.

use crate::rng::SimRng;

pub struct NameGenerator;

impl NameGenerator {
    /// `first_last` in lowercase, e.g. `maria_chen`.
    pub fn generate_username(rng: &mut SimRng) -> String {
        let first = Self::pick(rng, FIRST_NAMES);
        let last = Self::pick(rng, LAST_NAMES);
        format!("{}_{}", first.to_lowercase(), last.to_lowercase())
    }

    /// Username with a two-digit suffix, for when plain names collide.
    pub fn generate_handle(rng: &mut SimRng) -> String {
        let base = Self::generate_username(rng);
        format!("{base}{:02}", rng.next_u64_below(100))
    }

    fn pick(rng: &mut SimRng, names: &'static [&'static str]) -> &'static str {
        names[rng.next_u64_below(names.len() as u64) as usize]
    }
}

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda",
    "David", "Elizabeth", "William", "Susan", "Daniel", "Jessica", "Thomas", "Sarah",
    "Nino", "Giorgi", "Ana", "Luka", "Mariam", "Levan", "Tamar", "Davit",
    "Sofia", "Mateo", "Emma", "Noah", "Olivia", "Liam", "Ava", "Lucas",
    "Maria", "Jose", "Wei", "Mei", "Arjun", "Priya", "Omar", "Layla",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Beridze", "Kapanadze", "Gelashvili", "Maisuradze", "Lomidze", "Tsiklauri",
    "Martinez", "Lopez", "Wilson", "Anderson", "Taylor", "Moore", "Lee", "Chen",
    "Nguyen", "Patel", "Kim", "Silva", "Novak", "Muller", "Rossi", "Dubois",
];
