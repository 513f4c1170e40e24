//! Checklist metadata sanitizers.
//!
//! Pure string normalizers for the checklist type and release fields.
//! Both are idempotent: applying them to already-sanitized input is a
//! no-op.

/// Normalize a checklist title to its canonical short form.
///
/// Benchmark titles arrive as long-form strings like
/// `"Windows Server 2016 Security Technical Implementation Guide"`.
/// The projection stores the short form: the long-form suffix is
/// dropped, a redundant leading "The " is stripped, and internal
/// whitespace is collapsed.
pub fn sanitize_checklist_type(raw: &str) -> String {
    const PHRASES: [&str; 3] = [
        "Security Technical Implementation Guide (STIG)",
        "Security Technical Implementation Guide",
        "(STIG)",
    ];

    // Collapse before matching so spacing variants still hit a phrase,
    // and again after each removal so the output is a fixed point.
    let mut s = collapse_whitespace(raw);

    loop {
        let mut removed = false;
        for phrase in PHRASES {
            if let Some(idx) = s.find(phrase) {
                s.replace_range(idx..idx + phrase.len(), "");
                s = collapse_whitespace(&s);
                removed = true;
            }
        }
        if !removed {
            break;
        }
    }

    while let Some(rest) = s.strip_prefix("The ") {
        s = rest.trim_start().to_string();
    }

    s
}

/// Normalize a checklist release string.
///
/// Release info arrives as `"Release: 12 Benchmark Date: 25 Oct 2019"`;
/// the benchmark date duplicates data held elsewhere and is stripped,
/// keeping the `"Release: 12"` core.
pub fn sanitize_checklist_release(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.find("Benchmark Date") {
        Some(idx) => trimmed[..idx].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_drops_long_form_suffix() {
        assert_eq!(
            sanitize_checklist_type(
                "Windows Server 2016 Security Technical Implementation Guide"
            ),
            "Windows Server 2016"
        );
        assert_eq!(
            sanitize_checklist_type(
                "The Red Hat Enterprise Linux 7 Security Technical Implementation Guide (STIG)"
            ),
            "Red Hat Enterprise Linux 7"
        );
    }

    #[test]
    fn type_passes_short_form_through() {
        assert_eq!(sanitize_checklist_type("Windows 10"), "Windows 10");
    }

    #[test]
    fn release_strips_benchmark_date() {
        assert_eq!(
            sanitize_checklist_release("Release: 12 Benchmark Date: 25 Oct 2019"),
            "Release: 12"
        );
        assert_eq!(sanitize_checklist_release("Release: 12"), "Release: 12");
        assert_eq!(sanitize_checklist_release("  Release: 3  "), "Release: 3");
    }

    #[test]
    fn sanitizers_are_idempotent() {
        let inputs = [
            "Windows Server 2016 Security Technical Implementation Guide",
            "The Apache 2.4 STIG",
            "Windows 10",
            "",
            "   spaced   out   title   ",
            "The The Windows Security  Technical Implementation Guide",
            "A Security Technical Implementation Guide Security Technical Implementation Guide B",
        ];
        for input in inputs {
            let once = sanitize_checklist_type(input);
            assert_eq!(sanitize_checklist_type(&once), once, "input: {input:?}");
        }

        let releases = [
            "Release: 12 Benchmark Date: 25 Oct 2019",
            "Release: 12",
            "",
            "  v2r4  ",
        ];
        for input in releases {
            let once = sanitize_checklist_release(input);
            assert_eq!(sanitize_checklist_release(&once), once, "input: {input:?}");
        }
    }
}
