//! Shared numeric helpers for frames and mass functions.

/// FNV-1a hash for deterministic frame fingerprints.
pub fn fnv1a_hash(data: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

/// Fingerprint an ordered list of atom names.
///
/// Names are separated by a NUL byte so that `["ab", "c"]` and `["a", "bc"]`
/// hash differently.
pub fn fingerprint_atoms<S: AsRef<str>>(atoms: &[S]) -> u64 {
    let mut bytes = Vec::new();
    for atom in atoms {
        bytes.extend_from_slice(atom.as_ref().as_bytes());
        bytes.push(0);
    }
    fnv1a_hash(&bytes)
}

/// `|a - b| <= tolerance`.
pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Clamp a computed probability into [0, 1] to absorb floating-point drift.
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
