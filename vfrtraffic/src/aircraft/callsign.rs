//! Registration and radio callsign generation.
//!
//! Registrations look like US civil registrations: `N`, three to five
//! digits, then letters, five characters after the `N`. On frequency
//! aircraft use a short form of type name plus the last three characters
//! spelled out ("Cessna-Two-Alpha-Bravo").

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::atc::phonetic;

/// Characters after the `N` prefix.
const REGISTRATION_BODY_LEN: usize = 5;

/// Characters spoken in the short form.
const SHORT_FORM_CHARS: usize = 3;

/// Letters usable in a registration suffix (no I or O).
const SUFFIX_LETTERS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Share of generated aircraft that are Pipers.
const PIPER_SHARE: f64 = 0.3;

/// Attempts before giving up on a unique callsign.
const MAX_ATTEMPTS: usize = 1000;

/// Light aircraft types flying the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AircraftType {
    #[default]
    Cessna,
    Piper,
}

impl AircraftType {
    /// Prefix used in the spoken callsign.
    pub fn prefix(&self) -> &'static str {
        match self {
            AircraftType::Cessna => "Cessna",
            AircraftType::Piper => "Piper",
        }
    }
}

impl std::fmt::Display for AircraftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// A generated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Callsign {
    /// Full registration, e.g. `N123AB`.
    pub registration: String,
    /// Radio callsign, e.g. `Cessna-Three-Alpha-Bravo`.
    pub spoken: String,
    pub aircraft_type: AircraftType,
}

/// Spoken short form of a registration.
///
/// The last three characters are spelled out, digits as capitalised words
/// and letters phonetically, joined with `-` behind the type prefix.
pub fn short_form(registration: &str, aircraft_type: AircraftType) -> String {
    let chars: Vec<char> = registration.chars().collect();
    let start = chars.len().saturating_sub(SHORT_FORM_CHARS);
    let mut parts = vec![aircraft_type.prefix().to_string()];
    parts.extend(chars[start..].iter().map(|c| spoken_char(*c)));
    parts.join("-")
}

fn spoken_char(c: char) -> String {
    let word = match c {
        '0' => "Zero",
        '1' => "One",
        '2' => "Two",
        '3' => "Three",
        '4' => "Four",
        '5' => "Five",
        '6' => "Six",
        '7' => "Seven",
        '8' => "Eight",
        '9' => "Niner",
        c if c.is_ascii_alphabetic() => phonetic(c),
        other => return other.to_string(),
    };
    word.to_string()
}

/// Produces callsigns that are unique for the generator's lifetime.
///
/// Both the registration and its spoken form are unique, so callsigns
/// can be used as keys on frequency.
pub struct CallsignGenerator {
    rng: StdRng,
    registrations: HashSet<String>,
    spoken: HashSet<String>,
}

impl CallsignGenerator {
    /// Create a generator with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            registrations: HashSet::new(),
            spoken: HashSet::new(),
        }
    }

    /// Number of callsigns handed out.
    pub fn issued(&self) -> usize {
        self.registrations.len()
    }

    /// Pick a type, Cessna most of the time.
    pub fn random_type(&mut self) -> AircraftType {
        if self.rng.random_bool(PIPER_SHARE) {
            AircraftType::Piper
        } else {
            AircraftType::Cessna
        }
    }

    /// A random registration; not checked for uniqueness.
    fn registration(&mut self) -> String {
        let digits = self.rng.random_range(3..=REGISTRATION_BODY_LEN);
        let mut body = String::with_capacity(REGISTRATION_BODY_LEN + 1);
        body.push('N');
        // no leading zero
        body.push(char::from(b'1' + self.rng.random_range(0..9u8)));
        for _ in 1..digits {
            body.push(char::from(b'0' + self.rng.random_range(0..10u8)));
        }
        for _ in digits..REGISTRATION_BODY_LEN {
            let i = self.rng.random_range(0..SUFFIX_LETTERS.len());
            body.push(char::from(SUFFIX_LETTERS[i]));
        }
        body
    }

    /// Generate a unique callsign of the given type.
    ///
    /// Returns `None` only when the space is exhausted.
    pub fn generate(&mut self, aircraft_type: AircraftType) -> Option<Callsign> {
        for _ in 0..MAX_ATTEMPTS {
            let registration = self.registration();
            let spoken = short_form(&registration, aircraft_type);
            if self.registrations.contains(&registration) || self.spoken.contains(&spoken) {
                continue;
            }
            self.registrations.insert(registration.clone());
            self.spoken.insert(spoken.clone());
            return Some(Callsign {
                registration,
                spoken,
                aircraft_type,
            });
        }
        None
    }

    /// Generate a unique callsign of a random type.
    pub fn generate_any(&mut self) -> Option<Callsign> {
        let aircraft_type = self.random_type();
        self.generate(aircraft_type)
    }
}
