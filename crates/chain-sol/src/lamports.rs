//! Lamport amounts and their display form.

/// Number of lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Lamports per displayed unit of the fourth decimal.
const LAMPORTS_PER_TICK: u128 = LAMPORTS_PER_SOL as u128 / 10_000;

/// Format a lamport amount as SOL with four decimals, e.g. `"2.5000 SOL"`.
/// Halfway values round up.
pub fn format_sol(lamports: u64) -> String {
    let ticks = (u128::from(lamports) + LAMPORTS_PER_TICK / 2) / LAMPORTS_PER_TICK;
    format!("{}.{:04} SOL", ticks / 10_000, ticks % 10_000)
}
