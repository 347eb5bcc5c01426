use rand::rngs::StdRng;
use rand::Rng;

use crate::errors::Result;
use crate::generator::seeded_rng;
use crate::models::GuestIdentity;

const FEMALE_NAMES: &[&str] = &[
    "Avery", "Kiara", "Maria", "Sofia", "Hannah", "Priya", "Lena", "Chloe", "Amara", "Yuki",
];
const MALE_NAMES: &[&str] = &[
    "Jules", "Mateo", "Liam", "Omar", "Daniel", "Kenji", "Lucas", "Ethan", "Ravi", "Noah",
];
const SURNAMES: &[&str] = &[
    "Lee", "Moreno", "Patel", "Silva", "Novak", "Okafor", "Schmidt", "Tanaka", "Rossi", "Kowalski",
    "Dubois", "Haddad",
];
const MAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];

/// Plausible-looking fake guest details for the notification card.
pub struct IdentityGenerator {
    rng: StdRng,
}

impl IdentityGenerator {
    pub fn new(seed: Option<u64>) -> Result<Self> {
        // Offset so a shared seed does not mirror the booking stream.
        let seed = seed.map(|s| s.wrapping_add(0x9E37_79B9_7F4A_7C15));
        Ok(Self {
            rng: seeded_rng(seed)?,
        })
    }

    pub fn next_identity(&mut self) -> GuestIdentity {
        let (gender, first_names) = if self.rng.gen_bool(0.5) {
            ("Female", FEMALE_NAMES)
        } else {
            ("Male", MALE_NAMES)
        };
        let first = first_names[self.rng.gen_range(0..first_names.len())];
        let last = SURNAMES[self.rng.gen_range(0..SURNAMES.len())];
        let domain = MAIL_DOMAINS[self.rng.gen_range(0..MAIL_DOMAINS.len())];
        let suffix: u16 = self.rng.gen_range(1..100);

        GuestIdentity {
            name: format!("{first} {last}"),
            email: format!(
                "{}.{}{suffix}@{domain}",
                first.to_lowercase(),
                last.to_lowercase()
            ),
            phone: format!(
                "+1-{:03}-{:03}-{:04}",
                self.rng.gen_range(200..1000),
                self.rng.gen_range(200..1000),
                self.rng.gen_range(0..10_000)
            ),
            gender: gender.to_string(),
        }
    }
}
