//! Voucher programs on offer.

use std::sync::LazyLock;

use chrono::NaiveDate;

/// A promotional rule a customer can claim once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherProgram {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Leading part of every code minted for this program.
    pub code_prefix: &'static str,
    pub discount_label: &'static str,
    /// Last day the program can be claimed.
    pub expires_on: Option<NaiveDate>,
    pub active: bool,
}

impl VoucherProgram {
    /// Whether a new claim is accepted on `today`.
    #[must_use]
    pub fn is_available(&self, today: NaiveDate) -> bool {
        self.active && self.expires_on.is_none_or(|last| today <= last)
    }
}

static PROGRAMS: LazyLock<Vec<VoucherProgram>> = LazyLock::new(|| {
    vec![
        VoucherProgram {
            id: "WELCOME50K",
            title: "Quà chào mừng thành viên mới",
            description: "Giảm 50.000₫ cho đơn hàng đầu tiên từ 500.000₫",
            code_prefix: "WELCOME",
            discount_label: "50.000₫",
            expires_on: None,
            active: true,
        },
        VoucherProgram {
            id: "BLUECUT20",
            title: "Tròng lọc ánh sáng xanh",
            description: "Giảm 20% khi mua tròng lọc ánh sáng xanh kèm gọng",
            code_prefix: "BLUE",
            discount_label: "20%",
            expires_on: NaiveDate::from_ymd_opt(2026, 12, 31),
            active: true,
        },
        VoucherProgram {
            id: "TET2026",
            title: "Lì xì Tết Bính Ngọ",
            description: "Giảm 100.000₫ cho mọi đơn hàng dịp Tết",
            code_prefix: "TET",
            discount_label: "100.000₫",
            expires_on: NaiveDate::from_ymd_opt(2026, 2, 28),
            active: true,
        },
    ]
});

/// Every program, in display order.
#[must_use]
pub fn all() -> &'static [VoucherProgram] {
    &PROGRAMS
}

/// Look up a program by id, ignoring case.
#[must_use]
pub fn find(id: &str) -> Option<&'static VoucherProgram> {
    let id = id.trim();
    all().iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_find_ignores_case() {
        assert_eq!(find("welcome50k").map(|p| p.id), Some("WELCOME50K"));
        assert!(find("NOPE").is_none());
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let tet = find("TET2026").unwrap();
        assert!(tet.is_available(day(2026, 2, 28)));
        assert!(!tet.is_available(day(2026, 3, 1)));
    }

    #[test]
    fn test_open_ended_program_never_expires() {
        let welcome = find("WELCOME50K").unwrap();
        assert!(welcome.is_available(day(2099, 1, 1)));
    }

    #[test]
    fn test_prefixes_are_unique() {
        let mut prefixes: Vec<_> = all().iter().map(|p| p.code_prefix).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), all().len());
    }
}
