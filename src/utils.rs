//! Small formatting helpers shared by the converter report and the filter output.

/// Bytes in one GiB, the unit used for reported file sizes.
pub const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Format `n` with `,` between groups of three digits.
///
/// ```
/// use ironchunk::utils::group_thousands;
///
/// assert_eq!(group_thousands(0), "0");
/// assert_eq!(group_thousands(1_234_567), "1,234,567");
/// ```
#[must_use]
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Byte count as GiB with two decimals, e.g. `"1.50"`.
#[must_use]
pub fn format_gib(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let gib = bytes as f64 / BYTES_PER_GIB;
    format!("{gib:.2}")
}
