use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction type of a mobile-money notification.
///
/// Variants are declared in canonical order; [`Category::ALL`] preserves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Incoming Money")]
    IncomingMoney,
    #[serde(rename = "Payments to Code Holders")]
    CodeHolderPayment,
    #[serde(rename = "Transfers to Mobile Numbers")]
    MobileTransfer,
    #[serde(rename = "Bank Deposits")]
    BankDeposit,
    #[serde(rename = "Airtime Bill Payments")]
    AirtimeBill,
    #[serde(rename = "Cash Power Bill Payments")]
    CashPowerBill,
    #[serde(rename = "Transactions Initiated by Third Parties")]
    ThirdPartyTransaction,
    #[serde(rename = "Withdrawals from Agents")]
    AgentWithdrawal,
    #[serde(rename = "Bank Transfers")]
    BankTransfer,
    #[serde(rename = "Internet and Voice Bundle Purchases")]
    BundlePurchase,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::IncomingMoney,
        Category::CodeHolderPayment,
        Category::MobileTransfer,
        Category::BankDeposit,
        Category::AirtimeBill,
        Category::CashPowerBill,
        Category::ThirdPartyTransaction,
        Category::AgentWithdrawal,
        Category::BankTransfer,
        Category::BundlePurchase,
    ];

    /// The label stored in the `transaction_type` column.
    pub fn label(self) -> &'static str {
        match self {
            Category::IncomingMoney => "Incoming Money",
            Category::CodeHolderPayment => "Payments to Code Holders",
            Category::MobileTransfer => "Transfers to Mobile Numbers",
            Category::BankDeposit => "Bank Deposits",
            Category::AirtimeBill => "Airtime Bill Payments",
            Category::CashPowerBill => "Cash Power Bill Payments",
            Category::ThirdPartyTransaction => "Transactions Initiated by Third Parties",
            Category::AgentWithdrawal => "Withdrawals from Agents",
            Category::BankTransfer => "Bank Transfers",
            Category::BundlePurchase => "Internet and Voice Bundle Purchases",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    /// Accepts the stored label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown transaction type: '{wanted}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn label_roundtrip_for_every_category() {
        for c in Category::ALL {
            assert_eq!(Category::from_str(c.label()).unwrap(), c);
        }
    }

    #[test]
    fn from_str_ignores_case_and_padding() {
        assert_eq!(
            Category::from_str("  withdrawals FROM agents ").unwrap(),
            Category::AgentWithdrawal
        );
    }

    #[test]
    fn from_str_unknown_label() {
        assert!(Category::from_str("Lottery Winnings").is_err());
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&Category::BundlePurchase).unwrap();
        assert_eq!(json, "\"Internet and Voice Bundle Purchases\"");
    }

    #[test]
    fn canonical_order() {
        assert_eq!(Category::ALL[0], Category::IncomingMoney);
        assert_eq!(Category::ALL[9], Category::BundlePurchase);
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
    }
}
