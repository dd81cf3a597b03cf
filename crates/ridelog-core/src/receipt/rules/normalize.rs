//! Receipt body normalization.
//!
//! Receipts arrive with quoted-printable residue: soft line breaks (`=` at
//! the end of a wrapped line), encoded CR/LF/space and `*` emphasis markers.
//! Patterns are matched against the single-line form produced here.

/// Soft line breaks. The wrapped halves are joined without a space.
const SOFT_BREAKS: [&str; 2] = ["=\r\n", "=\n"];

/// Tokens replaced by a space.
const NOISE_TOKENS: [&str; 4] = ["=0D", "=0A", "=20", "*"];

/// Collapse a raw receipt body into one whitespace-normalized line.
///
/// `normalize(&normalize(x)) == normalize(x)` for every input.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.to_string();

    for brk in SOFT_BREAKS {
        text = text.replace(brk, "");
    }

    for token in NOISE_TOKENS {
        text = text.replace(token, " ");
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_joins_soft_breaks() {
        assert_eq!(normalize("Dro=\r\npoff: 1 Main=\nSt"), "Dropoff: 1 MainSt");
    }

    #[test]
    fn test_replaces_noise_tokens() {
        assert_eq!(
            normalize("*Lyft ride charges:*=20$12.50=0D=0ACard ending with 1234"),
            "Lyft ride charges: $12.50 Card ending with 1234"
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  Ride\t\tcompleted \r\n\r\n on  "), "Ride completed on");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "   ",
            "plain text",
            "=2=\r\n0 split token",
            "==200 *** =0D=0A=20 a=\nb",
            "Pickup=20 10:07 AM:\r\n  1 Market St\r\n*Dropoff*: 2 Main St, USA",
            "trailing soft break=",
        ];

        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "input: {:?}", sample);
        }
    }
}
