//! Supported bank registry.

/// Bank codes accepted when creating or connecting accounts, with their
/// display names. Counterparty names in history records come from this table.
pub const SUPPORTED_BANKS: &[(&str, &str)] = &[
    ("004", "KB Kookmin"),
    ("011", "NH Nonghyup"),
    ("020", "Woori"),
    ("081", "Hana"),
    ("088", "Shinhan"),
    ("090", "Kakao Bank"),
    ("092", "Toss Bank"),
    ("003", "IBK"),
];

/// Display name for a bank code, `None` if the code is not recognized.
pub fn bank_name(code: &str) -> Option<&'static str> {
    SUPPORTED_BANKS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

pub fn is_supported(code: &str) -> bool {
    bank_name(code).is_some()
}
