//! Canned replies for common questions, checked before the assistant.

/// Keyword rule: any keyword (case-insensitive substring) selects the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub keywords: &'static [&'static str],
    pub reply: &'static str,
}

/// Priority order: first match wins.
pub const RULES: [Rule; 3] = [
    Rule {
        keywords: &["password", "pin"],
        reply: "Use the 'Forgot Password' option to reset your password.",
    },
    Rule {
        keywords: &["otp"],
        reply: "Check your network connection and try 'Resend OTP'.",
    },
    Rule {
        keywords: &["upload", "file"],
        reply: "Check the file format and size. Use PDF/JPG under 2MB.",
    },
];

pub fn canned_reply(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
        .map(|rule| rule.reply)
}
