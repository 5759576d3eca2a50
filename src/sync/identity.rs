//! Identity providers that name and color new participants.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::sync::types::Profile;

/// Hands out a display name and cursor color for each login.
pub trait IdentityProvider: Send + Sync {
    fn new_profile(&self) -> Profile;
}

impl<F> IdentityProvider for F
where
    F: Fn() -> Profile + Send + Sync,
{
    fn new_profile(&self) -> Profile {
        self()
    }
}

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Brian", "Claude", "Donald", "Edsger", "Frances", "Grace", "Guido",
    "Hedy", "John", "Ken", "Leslie", "Linus", "Margaret", "Niklaus", "Radia", "Robin", "Tony",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Backus", "Dijkstra", "Hamilton", "Hoare", "Hopper", "Kernighan", "Knuth", "Lamport",
    "Liskov", "Lovelace", "McCarthy", "Milner", "Perlman", "Ritchie", "Shannon", "Thompson",
    "Torvalds", "Turing", "Wirth",
];

/// Random "First Last" names and bright, readable colors.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdentities;

impl IdentityProvider for RandomIdentities {
    fn new_profile(&self) -> Profile {
        let mut rng = rand::thread_rng();
        let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Anonymous");
        let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Editor");

        let hue = rng.gen_range(0.0..360.0);
        let saturation = rng.gen_range(0.55..0.9);
        let lightness = rng.gen_range(0.4..0.6);

        Profile::new(
            format!("{first} {last}"),
            hsl_to_hex(hue, saturation, lightness),
        )
    }
}

/// Converts an HSL color (hue in degrees, the rest in 0..=1) to `#rrggbb`.
fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> String {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = (hue / 60.0).rem_euclid(6.0);
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u8 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let channel = |value: f64| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
}
