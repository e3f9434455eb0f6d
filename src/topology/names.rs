//! Name pool for topologies the user has not named yet.

use rand::Rng;
use rand::seq::SliceRandom;

const ADJECTIVES: &[&str] = &[
	"amber", "brisk", "cobalt", "dusty", "electric", "frosty", "gentle", "hollow", "ivory",
	"jolly", "lunar", "misty", "nimble", "quiet", "rapid", "silent", "tidal", "velvet",
];

const NOUNS: &[&str] = &[
	"backbone", "bridge", "canyon", "delta", "fabric", "gateway", "harbor", "island", "junction",
	"lattice", "mesh", "orbit", "prism", "relay", "spine", "switchyard", "tunnel", "uplink",
];

/// Pick a `adjective-noun` name from the pool.
pub fn generate(rng: &mut impl Rng) -> String {
	let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("quiet");
	let noun = NOUNS.choose(rng).copied().unwrap_or("fabric");
	format!("{adjective}-{noun}")
}

/// Prefix `name` with `<username>-` unless the username already appears in it.
pub fn qualify(name: &str, username: &str) -> String {
	if name.contains(username) {
		name.to_string()
	} else {
		format!("{username}-{name}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn generated_names_come_from_pool() {
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..20 {
			let name = generate(&mut rng);
			let (adjective, noun) = name.split_once('-').unwrap();
			assert!(ADJECTIVES.contains(&adjective));
			assert!(NOUNS.contains(&noun));
		}
	}

	#[test]
	fn qualify_prefixes_once() {
		assert_eq!(qualify("lab", "alice"), "alice-lab");
		assert_eq!(qualify("alice-lab", "alice"), "alice-lab");
		assert_eq!(qualify("lab-of-alice", "alice"), "lab-of-alice");
		assert_eq!(qualify("lab", ""), "lab");
	}
}
