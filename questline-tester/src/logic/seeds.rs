use anyhow::{Context, Result, bail};
use std::collections::HashSet;

/// Seed used when no seed tokens are supplied.
pub const DEFAULT_SEED: u64 = 1337;

/// Resolve a list of CLI seed arguments into distinct numeric seeds.
///
/// Supports decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hexadecimal. Duplicates keep their first position.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending: Vec<u64> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            let value = u64::from_str_radix(&hex.replace('_', ""), 16)
                .with_context(|| format!("invalid hexadecimal seed: {token}"))?;
            pending.push(value);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|seed| seen.insert(*seed));

    if pending.is_empty() {
        pending.push(DEFAULT_SEED);
    }

    Ok(pending)
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}
